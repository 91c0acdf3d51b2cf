use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::domain::{Limit, SearchTerm, Year};
use crate::error::ExplorerError;

pub const DEFAULT_BASE_URL: &str = "https://api.nfz.gov.pl/app-stat-api-jgp";
const API_VERSION: &str = "1.1";
const CATALOG: &str = "1a";

/// Remote access to the three JGP statistics endpoints. The pipeline only
/// sees this trait, so tests can inject canned responses.
pub trait NfzClient: Send + Sync {
    fn benefits(&self, term: &SearchTerm, limit: Limit) -> Result<Value, ExplorerError>;
    fn table_index(&self, code: &str, year: Year) -> Result<Value, ExplorerError>;
    fn diseases(&self, table_id: &str) -> Result<Value, ExplorerError>;
}

#[derive(Clone)]
pub struct NfzHttpClient {
    client: Client,
    base_url: String,
}

impl NfzHttpClient {
    pub fn new() -> Result<Self, ExplorerError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ExplorerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("nfz-icd10/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ExplorerError::NfzHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| ExplorerError::NfzHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_json(&self, url: &str) -> Result<Value, ExplorerError> {
        tracing::debug!(url, "nfz.request");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| ExplorerError::NfzHttp(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "NFZ request failed".to_string());
            return Err(ExplorerError::NfzStatus {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .map_err(|err| ExplorerError::NfzHttp(err.to_string()))
    }
}

impl NfzClient for NfzHttpClient {
    fn benefits(&self, term: &SearchTerm, limit: Limit) -> Result<Value, ExplorerError> {
        let url = format!(
            "{}/benefits?benefit={}&catalog={CATALOG}&page=1&limit={}&api-version={API_VERSION}",
            self.base_url,
            term.as_str(),
            limit.get(),
        );
        self.get_json(&url)
    }

    fn table_index(&self, code: &str, year: Year) -> Result<Value, ExplorerError> {
        let url = format!(
            "{}/index-of-tables?catalog={CATALOG}&name={code}&year={}&format=json&api-version={API_VERSION}",
            self.base_url,
            year.get(),
        );
        self.get_json(&url)
    }

    fn diseases(&self, table_id: &str) -> Result<Value, ExplorerError> {
        let url = format!(
            "{}/icd10-diseases/{table_id}?page=1&limit=25&format=json&api-version={API_VERSION}",
            self.base_url,
        );
        self.get_json(&url)
    }
}
