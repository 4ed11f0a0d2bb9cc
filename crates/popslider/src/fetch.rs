//! SharePoint list items → slide records.

use serde::Deserialize;
use thiserror::Error;

const SELECT_FIELDS: &str = "Heading,HeadingURL,Description";
const EXPAND_FIELDS: &str = "AttachmentFiles";
const ODATA_VERBOSE: &str = "application/json;odata=verbose";

/// One carousel entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideRecord {
    pub heading: String,
    pub heading_url: String,
    pub description: String,
    /// Server-relative URL of the first attachment, if the item has any.
    pub image_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error! Status: {status}")]
    Http { status: u16 },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid list URL: {0}")]
    InvalidUrl(String),

    #[error("unexpected list response: {0}")]
    Parse(String),
}

impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(status) => FetchError::Http { status },
            other => FetchError::Transport(other.to_string()),
        }
    }
}

pub trait SlideFetcher: Send + Sync {
    fn fetch_slides(&self, site_url: &str, list_name: &str) -> Result<Vec<SlideRecord>, FetchError>;
}

/// Reads list items over the SharePoint REST API.
#[derive(Debug, Clone, Default)]
pub struct SharePointClient {
    access_token: Option<String>,
}

impl SharePointClient {
    pub fn new(access_token: Option<String>) -> Self {
        Self { access_token }
    }
}

impl SlideFetcher for SharePointClient {
    fn fetch_slides(&self, site_url: &str, list_name: &str) -> Result<Vec<SlideRecord>, FetchError> {
        let url = items_url(site_url, list_name)?;
        tracing::debug!(%url, "fetching list items");

        let mut request = ureq::get(url.as_str())
            .header("Accept", ODATA_VERBOSE)
            .header("Content-Type", ODATA_VERBOSE)
            .header("odata-version", "");
        if let Some(token) = &self.access_token {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        let mut response = request.call()?;
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let slides = parse_items(&body)?;
        tracing::debug!(count = slides.len(), "parsed list items");
        Ok(slides)
    }
}

/// Build the items endpoint for `list_name` under `site_url`.
pub fn items_url(site_url: &str, list_name: &str) -> Result<url::Url, FetchError> {
    let site = site_url.trim();
    let mut url =
        url::Url::parse(site).map_err(|e| FetchError::InvalidUrl(format!("{site}: {e}")))?;

    // OData string literals escape a quote by doubling it
    let title = format!("getbytitle('{}')", list_name.replace('\'', "''"));
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidUrl(format!("{site}: cannot hold a path")))?
        .pop_if_empty()
        .extend(["_api", "web", "lists", title.as_str(), "items"]);
    url.set_query(Some(&format!(
        "$select={SELECT_FIELDS}&$expand={EXPAND_FIELDS}"
    )));
    url.set_fragment(None);
    Ok(url)
}

#[derive(Deserialize)]
struct Envelope {
    d: Collection<ListItem>,
}

#[derive(Deserialize)]
struct Collection<T> {
    results: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListItem {
    heading: Option<String>,
    #[serde(rename = "HeadingURL")]
    heading_url: Option<LinkField>,
    description: Option<String>,
    attachment_files: Collection<AttachmentFile>,
}

/// `HeadingURL` is either a text column or a hyperlink column.
#[derive(Deserialize)]
#[serde(untagged)]
enum LinkField {
    Text(String),
    Hyperlink {
        #[serde(rename = "Url")]
        url: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttachmentFile {
    server_relative_url: String,
}

/// Map a verbose OData response body to slide records.
pub fn parse_items(body: &str) -> Result<Vec<SlideRecord>, FetchError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    envelope
        .d
        .results
        .into_iter()
        .enumerate()
        .map(|(index, item)| to_slide(index, item))
        .collect()
}

fn to_slide(index: usize, item: ListItem) -> Result<SlideRecord, FetchError> {
    let image_url = match item.attachment_files.results.into_iter().next() {
        Some(file) if file.server_relative_url.is_empty() => {
            return Err(FetchError::Parse(format!(
                "item {index}: attachment has no ServerRelativeUrl"
            )));
        }
        Some(file) => Some(file.server_relative_url),
        None => None,
    };

    let heading_url = match item.heading_url {
        Some(LinkField::Text(url)) => url,
        Some(LinkField::Hyperlink { url }) => url.unwrap_or_default(),
        None => String::new(),
    };

    Ok(SlideRecord {
        heading: item.heading.unwrap_or_default(),
        heading_url,
        description: item.description.unwrap_or_default(),
        image_url,
    })
}
