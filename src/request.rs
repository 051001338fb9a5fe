use reqwest::{Client, Response};

use crate::{
    RecordId, RecordMetadata, Result, DETAIL_PATH, INTERSTITIAL_OP, INTERSTITIAL_PATH,
    LISTING_PATH,
};

/// HTTP access to the catalog's listing, detail and interstitial endpoints.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    // Client uses Arc so we can clone cheaply
    client: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Listing of a fonds; without a page it is the bare first page carrying the pager text.
    pub fn listing_url(&self, fonds: u32, page: Option<u32>) -> String {
        match page {
            Some(page) => format!("{}/{LISTING_PATH}?ID={fonds}&page={page}", self.base_url),
            None => format!("{}/{LISTING_PATH}?ID={fonds}", self.base_url),
        }
    }

    pub fn detail_url(&self, id: &RecordId) -> String {
        format!("{}/{DETAIL_PATH}?ID={id}", self.base_url)
    }

    pub fn interstitial_url(&self) -> String {
        format!("{}/{INTERSTITIAL_PATH}", self.base_url)
    }

    /// Requests a page and returns its HTML.
    pub async fn get_html(&self, url: &str) -> Result<String> {
        let res = self.client.get(url).send().await?.error_for_status()?;
        let html = res.text().await?;
        Ok(html)
    }

    /// Posts the dispatch form for a record. The response body is the record's XML.
    pub async fn post_interstitial(
        &self,
        id: &RecordId,
        metadata: &RecordMetadata,
    ) -> Result<Response> {
        let form = [
            ("op", INTERSTITIAL_OP),
            ("cnmdManos", id.as_str()),
            ("autore", metadata.author.as_str()),
            ("filename", metadata.filename.as_str()),
        ];
        let res = self
            .client
            .post(self.interstitial_url())
            .form(&form)
            .send()
            .await?
            .error_for_status()?;
        Ok(res)
    }
}
