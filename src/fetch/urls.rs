// src/fetch/urls.rs
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

/// All `<a href>` targets in `html` whose href matches `pattern`,
/// resolved against `base`, in document order.
pub fn extract_links(html: &str, base: &Url, pattern: &Regex) -> Vec<Url> {
    let selector = Selector::parse("a[href]").expect("CSS selector for links should be valid");
    Html::parse_document(html)
        .select(&selector)
        .filter_map(|e| e.value().attr("href"))
        .filter(|href| pattern.is_match(href))
        .filter_map(|href| base.join(href).ok())
        .collect()
}

/// Default link pattern for a publisher file name: the name itself,
/// case-insensitively, at the end of the path (query strings allowed).
pub fn file_link_pattern(file_name: &str) -> Result<Regex> {
    Regex::new(&format!(r"(?i){}(\?.*)?$", regex::escape(file_name)))
        .context("building link pattern")
}

/// GET `url` as text, retrying transport errors and non-success statuses.
pub async fn fetch_text(
    client: &Client,
    url: &Url,
    max_retries: usize,
    retry_delay: Duration,
) -> Result<String> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result: Result<String> = match client.get(url.as_str()).send().await {
            Ok(resp) if resp.status().is_success() => resp.text().await.map_err(Into::into),
            Ok(resp) => Err(anyhow!("HTTP error: {}", resp.status())),
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(body) => return Ok(body),
            Err(e) if attempt < max_retries => {
                warn!(%url, attempt, "fetch failed: {}", e);
                sleep(retry_delay).await;
            }
            Err(e) => return Err(e.context(format!("GET {}", url))),
        }
    }
}

/// Scrape `page` for the first link matching `pattern`.
pub async fn discover_download_url(
    client: &Client,
    page: &str,
    pattern: &Regex,
    max_retries: usize,
    retry_delay: Duration,
) -> Result<Url> {
    let base = Url::parse(page).with_context(|| format!("parsing page URL {}", page))?;
    let html = fetch_text(client, &base, max_retries, retry_delay).await?;
    let links = extract_links(&html, &base, pattern);
    debug!(page, found = links.len(), "scraped download links");
    links
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no link matching `{}` on {}", pattern, page))
}
