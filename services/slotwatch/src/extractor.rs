//! Page extraction: fetch the availability page and pull out matching rows

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::filter;
use crate::io::HttpClient;
use crate::model::{Mode, ObservedRow};

/// Text of the heading above the H-1B availability table
pub const SECTION_HEADING: &str = "Last H-1B (Regular) Availability";

/// How many following siblings of the heading are searched for the table
const SIBLING_SEARCH_LIMIT: usize = 10;

static HEADING_CANDIDATES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, div, span, p, strong")
        .expect("static heading selector")
});
static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("static table selector"));
static ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("static row selector"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("static cell selector"));

/// Result of one extraction from a reachable page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub success: bool,
    pub rows: Vec<ObservedRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Extraction {
    pub fn rows(rows: Vec<ObservedRow>) -> Self {
        Self {
            success: true,
            rows,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            rows: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Source of observed rows for the monitor loop.
///
/// `Err(Communication)` means the page could not be reached and may be
/// retried; `Err(TargetLost)` means the page is gone and the session should
/// end. A reachable page without the expected structure is an `Ok` value
/// with `success == false`.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    /// URL of the monitored page, used in alert bodies
    fn target_url(&self) -> &str;

    /// Extract rows accepted for `mode`
    async fn extract(&self, mode: Mode) -> crate::Result<Extraction>;
}

/// Extractor that downloads the page over HTTP
pub struct HttpPageExtractor {
    url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for HttpPageExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPageExtractor")
            .field("url", &self.url)
            .finish()
    }
}

impl HttpPageExtractor {
    pub fn new(url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        let url = url.into();
        tracing::debug!("Created HttpPageExtractor for {}", url);
        Self { url, http }
    }
}

#[async_trait]
impl PageExtractor for HttpPageExtractor {
    fn target_url(&self) -> &str {
        &self.url
    }

    async fn extract(&self, mode: Mode) -> crate::Result<Extraction> {
        let response = self.http.get(&self.url).await.map_err(|e| match e {
            crate::SlotWatchError::Http(msg) => crate::SlotWatchError::Communication(msg),
            other => other,
        })?;

        match response.status {
            404 | 410 => Err(crate::SlotWatchError::TargetLost(format!(
                "{} returned status {}",
                self.url, response.status
            ))),
            _ if !response.is_success() => Err(crate::SlotWatchError::Communication(format!(
                "{} returned status {}",
                self.url, response.status
            ))),
            _ => Ok(parse_availability(&response.body, mode)),
        }
    }
}

/// Parse the availability table out of a page and keep the rows accepted for `mode`
pub fn parse_availability(html: &str, mode: Mode) -> Extraction {
    let document = Html::parse_document(html);

    let Some(heading) = find_heading(&document) else {
        return Extraction::failed("H-1B section not found");
    };
    let Some(table) = find_table(&document, heading) else {
        return Extraction::failed("H-1B table not found");
    };

    let rows = table
        .select(&ROW)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&CELL).map(|c| text_of(&c)).collect();
            if cells.len() < 4 {
                return None;
            }
            let relative_time = &cells[cells.len() - 1];
            filter::accept_row(&cells[0], &cells[2], &cells[3], relative_time, mode)
        })
        .collect();

    Extraction::rows(rows)
}

fn text_of(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn find_heading(document: &Html) -> Option<ElementRef<'_>> {
    document
        .select(&HEADING_CANDIDATES)
        .find(|el| text_of(el) == SECTION_HEADING)
}

fn find_table<'a>(document: &'a Html, heading: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let from_siblings = heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take(SIBLING_SEARCH_LIMIT)
        .find_map(|sibling| {
            if sibling.value().name() == "table" {
                Some(sibling)
            } else {
                sibling.select(&TABLE).next()
            }
        });
    if from_siblings.is_some() {
        return from_siblings;
    }

    let from_parent = heading
        .parent()
        .and_then(ElementRef::wrap)
        .and_then(|parent| parent.select(&TABLE).next());
    if from_parent.is_some() {
        return from_parent;
    }

    document.select(&TABLE).find(|table| {
        let text = table.text().collect::<String>();
        text.contains("CHENNAI") || text.contains("MUMBAI")
    })
}
