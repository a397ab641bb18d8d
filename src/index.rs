use crate::error::IndexError;
use crate::types::{IndexResponse, ListingPage};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_INDEX_URL: &str = "https://crust.webapi.subscan.io";
pub const PAGE_SIZE: u32 = 100;

/// Source of paginated file listings for a network address.
///
/// `page` is zero-based. No retries happen at this layer.
pub trait IndexSource: Send + Sync {
    fn fetch_files(&self, address: &str, page: u32) -> Result<ListingPage, IndexError>;
}

#[derive(Debug, Serialize)]
struct OrdersRequest<'a> {
    address: &'a str,
    all_orders: bool,
    page: u32,
    row: u32,
}

/// HTTP client for the Subscan-style orders endpoint.
pub struct IndexClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl IndexClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn orders_url(&self) -> String {
        format!("{}/api/scan/swork/member/orders", self.base_url)
    }
}

impl IndexSource for IndexClient {
    fn fetch_files(&self, address: &str, page: u32) -> Result<ListingPage, IndexError> {
        let body = OrdersRequest {
            address,
            all_orders: false,
            page,
            row: PAGE_SIZE,
        };
        debug!(address = %address, page, "fetching file listing");

        let res = self.http.post(self.orders_url()).json(&body).send()?;
        let status = res.status();
        if !status.is_success() {
            return Err(IndexError::Status(status.as_u16()));
        }

        let parsed: IndexResponse = res.json()?;
        ListingPage::try_from(parsed)
    }
}
