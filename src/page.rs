use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to fetch page {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
    #[error("no <{selector}> element found on page")]
    MissingElement { selector: String },
}

/// GET a wiki page and return its HTML body. Non-2xx statuses are errors.
pub async fn fetch_html(client: &Client, url: &str) -> Result<String, PageError> {
    let fetch_err = |source| PageError::Fetch {
        url: url.to_string(),
        source,
    };

    info!("Fetching wiki page: {}", url);
    let html = client
        .get(url)
        .send()
        .await
        .map_err(fetch_err)?
        .error_for_status()
        .map_err(fetch_err)?
        .text()
        .await
        .map_err(fetch_err)?;

    debug!(bytes = html.len(), "page fetched");
    Ok(html)
}

/// Text content of the first element matching `selector`, taken verbatim.
pub fn extract_query(html: &str, selector: &str) -> Result<String, PageError> {
    let sel = Selector::parse(selector).map_err(|e| PageError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })?;

    let doc = Html::parse_document(html);
    let element = doc
        .select(&sel)
        .next()
        .ok_or_else(|| PageError::MissingElement {
            selector: selector.to_string(),
        })?;

    Ok(element.text().collect())
}

/// Fetch the page and pull the query out of it.
pub async fn fetch_query(client: &Client, url: &str, selector: &str) -> Result<String, PageError> {
    let html = fetch_html(client, url).await?;
    let query = extract_query(&html, selector)?;
    info!(chars = query.chars().count(), "Extracted query from <{}>", selector);
    Ok(query)
}
