//! Product feed retrieval and parsing.
//!
//! The feed is an Atom-style XML document: a flat list of `<entry>`
//! elements in the default `http://www.w3.org/2005/Atom` namespace,
//! each carrying optional `<id>` and `<image_link>` child text nodes.
//! Entries missing either are skipped during parsing -- they are not
//! counted and produce no output or progress event.

use serde::Deserialize;

/// One valid feed entry: a product id plus its image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub product_id: String,
    pub image_url: String,
}

/// Errors retrieving or parsing a feed. Always job-fatal.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Feed request returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Feed is not valid XML: {0}")]
    Parse(#[from] quick_xml::DeError),
}

// ---------------------------------------------------------------------------
// XML document shape
// ---------------------------------------------------------------------------

/// Root `<feed>` element.
#[derive(Debug, Deserialize)]
struct FeedDocument {
    #[serde(rename = "entry", default)]
    entries: Vec<RawEntry>,
}

/// One `<entry>` element before validation. Both children are optional
/// in the document; validation happens in [`FeedFetcher::parse`].
#[derive(Debug, Deserialize)]
struct RawEntry {
    id: Option<String>,
    image_link: Option<String>,
}

// ---------------------------------------------------------------------------
// FeedFetcher
// ---------------------------------------------------------------------------

/// Retrieves and parses product feeds over HTTP.
pub struct FeedFetcher {
    client: reqwest::Client,
}

impl FeedFetcher {
    /// Create a fetcher sharing the given client (and its timeout).
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Retrieve `feed_url` and return its valid entries in document
    /// order. Non-success status and transport failures are errors;
    /// invalid entries are silently dropped.
    pub async fn fetch(&self, feed_url: &str) -> Result<Vec<FeedEntry>, FeedError> {
        let body = self.get_body(feed_url).await?;
        Self::parse(&body)
    }

    /// Retrieve `feed_url` and return the first entry's image URL, if
    /// any. Used by the feed-preview endpoint; unlike [`fetch`](Self::fetch)
    /// an entry without an id still counts here.
    pub async fn first_image_url(&self, feed_url: &str) -> Result<Option<String>, FeedError> {
        let body = self.get_body(feed_url).await?;
        let document: FeedDocument = quick_xml::de::from_str(&body)?;
        Ok(document
            .entries
            .into_iter()
            .find_map(|entry| entry.image_link.filter(|url| !url.trim().is_empty())))
    }

    /// Parse a feed document into its valid entries, preserving
    /// document order. An entry is valid when both `<id>` and
    /// `<image_link>` are present with non-empty text.
    pub fn parse(xml: &str) -> Result<Vec<FeedEntry>, FeedError> {
        let document: FeedDocument = quick_xml::de::from_str(xml)?;

        let entries: Vec<FeedEntry> = document
            .entries
            .into_iter()
            .filter_map(|entry| match (entry.id, entry.image_link) {
                (Some(id), Some(url)) if !id.trim().is_empty() && !url.trim().is_empty() => {
                    Some(FeedEntry {
                        product_id: id.trim().to_string(),
                        image_url: url.trim().to_string(),
                    })
                }
                _ => None,
            })
            .collect();

        tracing::debug!(count = entries.len(), "Parsed feed entries");
        Ok(entries)
    }

    async fn get_body(&self, feed_url: &str) -> Result<String, FeedError> {
        let response = self.client.get(feed_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }
        Ok(response.text().await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom">
            <entry>
                <id>sku-1</id>
                <image_link>https://img.example.com/1.jpg</image_link>
            </entry>
            <entry>
                <id>sku-2</id>
            </entry>
            <entry>
                <image_link>https://img.example.com/3.jpg</image_link>
            </entry>
            <entry>
                <id>sku-4</id>
                <image_link>https://img.example.com/4.jpg</image_link>
            </entry>
        </feed>
    "#;

    #[test]
    fn parse_keeps_only_complete_entries_in_order() {
        let entries = FeedFetcher::parse(FEED).expect("feed should parse");

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            FeedEntry {
                product_id: "sku-1".into(),
                image_url: "https://img.example.com/1.jpg".into(),
            }
        );
        assert_eq!(entries[1].product_id, "sku-4");
    }

    #[test]
    fn parse_drops_entries_with_empty_text() {
        let xml = r#"
            <feed xmlns="http://www.w3.org/2005/Atom">
                <entry>
                    <id>  </id>
                    <image_link>https://img.example.com/a.jpg</image_link>
                </entry>
                <entry>
                    <id>sku-b</id>
                    <image_link></image_link>
                </entry>
            </feed>
        "#;
        let entries = FeedFetcher::parse(xml).expect("feed should parse");
        assert!(entries.is_empty());
    }

    #[test]
    fn parse_trims_whitespace_around_values() {
        let xml = r#"
            <feed xmlns="http://www.w3.org/2005/Atom">
                <entry>
                    <id>
                        sku-1
                    </id>
                    <image_link> https://img.example.com/1.jpg </image_link>
                </entry>
            </feed>
        "#;
        let entries = FeedFetcher::parse(xml).expect("feed should parse");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].product_id, "sku-1");
        assert_eq!(entries[0].image_url, "https://img.example.com/1.jpg");
    }

    #[test]
    fn parse_empty_feed_yields_no_entries() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#;
        let entries = FeedFetcher::parse(xml).expect("feed should parse");
        assert!(entries.is_empty());
    }

    #[test]
    fn parse_rejects_non_xml_body() {
        let result = FeedFetcher::parse("{\"not\": \"xml\"}");
        assert!(matches!(result, Err(FeedError::Parse(_))));
    }

    #[test]
    fn duplicate_ids_are_kept_in_document_order() {
        // Duplicates survive parsing; the upsert layer resolves them to
        // last-write-wins.
        let xml = r#"
            <feed xmlns="http://www.w3.org/2005/Atom">
                <entry>
                    <id>sku-1</id>
                    <image_link>https://img.example.com/old.jpg</image_link>
                </entry>
                <entry>
                    <id>sku-1</id>
                    <image_link>https://img.example.com/new.jpg</image_link>
                </entry>
            </feed>
        "#;
        let entries = FeedFetcher::parse(xml).expect("feed should parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].image_url, "https://img.example.com/new.jpg");
    }
}
