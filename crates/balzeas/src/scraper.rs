use crate::parser::{self, ParseError};
use crate::text::slugify;
use crate::types::{Alumnus, MemberPage, Publication, ToolPage};

use reqwest::blocking::Client;
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

/// Unconditional pause between successive per-item requests (profile
/// fetches, image downloads). A politeness throttle, not a rate limiter.
pub const REQUEST_DELAY: Duration = Duration::from_millis(300);

/// Pause between paginated publication list fetches.
pub const PAGE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    base_url: String,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: crate::BASE_URL.to_string(),
        })
    }

    /// Walks the paginated publication list, following the "next page" link
    /// until absent. Titles are de-duplicated in first-seen order; the seen
    /// set lives and dies with this call.
    pub fn fetch_publications(&self) -> Result<Vec<Publication>, ScraperError> {
        let mut publications = Vec::new();
        let mut seen = HashSet::new();
        let mut url = format!("{}/publication/", self.base_url);
        let mut page = 1u32;

        loop {
            log::info!("Fetching publications page {}...", page);
            let html = self.get_html(&url)?;

            let (records, dropped) = parser::parse_publications_page(&html);
            if dropped > 0 {
                log::warn!(
                    "Dropped {} malformed publication record(s) on page {}",
                    dropped,
                    page
                );
            }
            merge_new_publications(&mut publications, &mut seen, records);

            match parser::parse_next_page_url(&html) {
                Some(next) if next != url => {
                    url = next;
                    page += 1;
                    thread::sleep(PAGE_DELAY);
                }
                Some(_) => {
                    log::warn!("Next-page link points back to page {}; stopping", page);
                    break;
                }
                None => break,
            }
        }

        Ok(publications)
    }

    /// Fetches the home page and extracts the alumni table. Returns the
    /// records together with the count of rows dropped for having the wrong
    /// shape.
    pub fn fetch_alumni(&self) -> Result<(Vec<Alumnus>, usize), ScraperError> {
        let url = format!("{}/", self.base_url);
        log::info!("Fetching alumni table from {}...", url);
        let html = self.get_html(&url)?;
        Ok(parser::parse_alumni(&html)?)
    }

    /// Fetches one member profile page, deriving the URL from the display
    /// name via slug generation.
    pub fn fetch_member_profile(&self, name: &str) -> Result<MemberPage, ScraperError> {
        let url = format!("{}/person/{}/", self.base_url, slugify(name));
        log::info!("Fetching profile {}...", url);
        let html = self.get_html(&url)?;
        Ok(parser::parse_member_profile(&html, name))
    }

    /// Fetches the home page and extracts the tool/database listing.
    pub fn fetch_tools(&self) -> Result<(Vec<ToolPage>, usize), ScraperError> {
        let url = format!("{}/", self.base_url);
        log::info!("Fetching tool listing from {}...", url);
        let html = self.get_html(&url)?;
        Ok(parser::parse_tools(&html))
    }

    /// Fetches a binary payload (an image) and returns its bytes.
    pub fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        let bytes = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .bytes()?;
        Ok(bytes.to_vec())
    }

    /// Site-relative URLs (leading slash) are resolved against the base URL.
    pub fn absolute_url(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            url.to_string()
        }
    }

    fn get_html(&self, url: &str) -> Result<String, ScraperError> {
        Ok(self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .text()?)
    }
}

/// Appends records whose title has not been seen yet, preserving first-seen
/// order across pages.
pub fn merge_new_publications(
    into: &mut Vec<Publication>,
    seen: &mut HashSet<String>,
    page: Vec<Publication>,
) {
    for publication in page {
        if seen.insert(publication.title.clone()) {
            into.push(publication);
        }
    }
}
