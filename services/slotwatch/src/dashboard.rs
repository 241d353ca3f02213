//! Control surface: status page and JSON endpoints over the monitor handle

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use crate::engine::MonitorHandle;
use crate::model::{Mode, Phase};
use crate::state::{RunState, Severity};

#[derive(Debug, Default, Deserialize)]
struct StartRequest {
    #[serde(default)]
    mode: Option<Mode>,
    #[serde(default)]
    phase: Option<Phase>,
}

#[derive(Debug, Deserialize)]
struct ModeRequest {
    mode: Mode,
}

#[derive(Debug, Deserialize)]
struct PhaseRequest {
    phase: Phase,
}

#[derive(Debug, Deserialize)]
struct EmailRequest {
    #[serde(default)]
    email: Option<String>,
}

/// Build the dashboard axum router
pub fn build_router(handle: MonitorHandle) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/state", get(state_handler))
        .route("/api/start", post(start_handler))
        .route("/api/stop", post(stop_handler))
        .route("/api/mode", put(mode_handler))
        .route("/api/phase", put(phase_handler))
        .route("/api/email", put(email_handler))
        .route("/api/test-alert", post(test_alert_handler))
        .route("/health", get(health_handler))
        .with_state(handle)
}

fn command_response(result: crate::Result<()>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e @ crate::SlotWatchError::InvalidEmail(_)) => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::warn!("Dashboard command failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

async fn state_handler(State(handle): State<MonitorHandle>) -> impl IntoResponse {
    Json(handle.snapshot())
}

async fn start_handler(State(handle): State<MonitorHandle>, body: Bytes) -> Response {
    // an empty body starts with the current mode and phase
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        StartRequest::default()
    } else {
        match serde_json::from_slice::<StartRequest>(&body) {
            Ok(request) => request,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        }
    };
    command_response(handle.start(request.mode, request.phase).await.map(|_| ()))
}

async fn stop_handler(State(handle): State<MonitorHandle>) -> Response {
    command_response(handle.stop().await)
}

async fn mode_handler(
    State(handle): State<MonitorHandle>,
    Json(request): Json<ModeRequest>,
) -> Response {
    command_response(handle.set_mode(request.mode).await)
}

async fn phase_handler(
    State(handle): State<MonitorHandle>,
    Json(request): Json<PhaseRequest>,
) -> Response {
    command_response(handle.set_phase(request.phase).await)
}

async fn email_handler(
    State(handle): State<MonitorHandle>,
    Json(request): Json<EmailRequest>,
) -> Response {
    command_response(handle.set_email(request.email).await)
}

async fn test_alert_handler(State(handle): State<MonitorHandle>) -> Response {
    command_response(handle.test_alert().await)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "#383d41",
        Severity::Success => "#155724",
        Severity::Warning => "#856404",
        Severity::Error => "#721c24",
        Severity::Alert => "#c0392b",
    }
}

async fn index_handler(State(handle): State<MonitorHandle>) -> impl IntoResponse {
    let snapshot = handle.snapshot();

    let (state_color, state_bg) = match snapshot.state {
        RunState::Idle => ("#383d41", "#e2e3e5"),
        RunState::Checking => ("#004085", "#cce5ff"),
        RunState::Waiting => ("#155724", "#d4edda"),
    };
    let countdown = snapshot
        .next_check_in_secs
        .map(|s| format!("{}s", s))
        .unwrap_or_else(|| "-".to_string());
    let previous = if snapshot.previous_locations.is_empty() {
        "none".to_string()
    } else {
        escape_html(&snapshot.previous_locations.join(", "))
    };

    let log_rows: String = snapshot
        .logs
        .iter()
        .map(|entry| {
            format!(
                r#"<tr style="border-bottom: 1px solid #dee2e6;">
                    <td style="padding: 0.25rem 0.5rem; white-space: nowrap;">{}</td>
                    <td style="padding: 0.25rem 0.5rem; color: {};">{}</td>
                </tr>"#,
                entry.time,
                severity_color(entry.severity),
                escape_html(&entry.message)
            )
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Visa Slot Monitor</title>
    <script>
        const colors = {{
            info: '#383d41', success: '#155724', warning: '#856404',
            error: '#721c24', alert: '#c0392b',
        }};
        function esc(s) {{
            const d = document.createElement('div');
            d.textContent = s;
            return d.innerHTML;
        }}
        function refreshData() {{
            fetch('/api/state')
                .then(r => r.json())
                .then(s => {{
                    document.getElementById('run-state').textContent = s.state.toUpperCase();
                    document.getElementById('mode').textContent = s.mode;
                    document.getElementById('phase').textContent = s.phase;
                    document.getElementById('checks').textContent = s.check_count;
                    document.getElementById('last-check').textContent = s.last_check_time || '-';
                    document.getElementById('countdown').textContent =
                        s.next_check_in_secs === null ? '-' : s.next_check_in_secs + 's';
                    document.getElementById('previous').textContent =
                        s.previous_locations.length ? s.previous_locations.join(', ') : 'none';
                    document.getElementById('log-body').innerHTML = s.logs.map(e =>
                        `<tr style="border-bottom: 1px solid #dee2e6;">
                            <td style="padding: 0.25rem 0.5rem; white-space: nowrap;">${{e.time}}</td>
                            <td style="padding: 0.25rem 0.5rem; color: ${{colors[e.severity]}};">${{esc(e.message)}}</td>
                        </tr>`).join('');
                }});
        }}
        function send(method, path, body) {{
            return fetch(path, {{
                method,
                headers: {{ 'Content-Type': 'application/json' }},
                body: body === undefined ? undefined : JSON.stringify(body),
            }}).then(r => {{ refreshData(); return r; }});
        }}
        function saveEmail() {{
            const input = document.getElementById('email-input');
            const status = document.getElementById('email-status');
            const email = input.value.trim();
            if (email && !/^[^\s@]+@[^\s@]+\.[^\s@]+$/.test(email)) {{
                status.textContent = 'Invalid email';
                return;
            }}
            send('PUT', '/api/email', {{ email: email || null }}).then(r => {{
                status.textContent = r.ok ? (email ? 'Saved' : 'Cleared') : 'Invalid email';
            }});
        }}
        setInterval(refreshData, 1000);
    </script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <h1>Visa Slot Monitor</h1>
    <section>
        <span id="run-state" style="display: inline-block; padding: 0.25em 0.6em; border-radius: 0.25rem; font-weight: 600; color: {state_color}; background-color: {state_bg};">{state}</span>
        <p>Mode: <b id="mode">{mode}</b> &middot; Phase: <b id="phase">{phase}</b> &middot; Checks: <b id="checks">{checks}</b></p>
        <p>Last check: <span id="last-check">{last_check}</span> &middot; Next check in: <span id="countdown">{countdown}</span></p>
        <p>Previous locations: <span id="previous">{previous}</span></p>
        <p>
            <button onclick="send('POST', '/api/start')">Start</button>
            <button onclick="send('POST', '/api/stop')">Stop</button>
            <button onclick="send('PUT', '/api/mode', {{ mode: 'FAST' }})">Fast</button>
            <button onclick="send('PUT', '/api/mode', {{ mode: 'SLOW' }})">Slow</button>
            <button onclick="send('PUT', '/api/phase', {{ phase: 0 }})">Phase 0</button>
            <button onclick="send('PUT', '/api/phase', {{ phase: 1 }})">Phase 1</button>
            <button onclick="send('POST', '/api/test-alert')">Test alert</button>
        </p>
        <p>
            <label for="email-input">Alert email:</label>
            <input id="email-input" type="email" placeholder="you@example.com" value="{email}">
            <button onclick="saveEmail()">Save</button>
            <span id="email-status"></span>
        </p>
    </section>
    <section>
        <h2>Log</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <tbody id="log-body">{log_rows}</tbody>
        </table>
    </section>
</body>
</html>"#,
        state_color = state_color,
        state_bg = state_bg,
        state = format!("{:?}", snapshot.state).to_uppercase(),
        mode = snapshot.mode,
        phase = snapshot.phase,
        checks = snapshot.check_count,
        last_check = snapshot.last_check_time.as_deref().unwrap_or("-"),
        countdown = countdown,
        previous = previous,
        email = escape_html(snapshot.email.as_deref().unwrap_or("")),
        log_rows = log_rows,
    );

    Html(html)
}
