//! Shared query parameter types for API handlers.
//!
//! Page fields are repeated in each struct rather than flattened:
//! `serde_urlencoded` cannot deserialize numbers through `#[serde(flatten)]`.

use folio_core::pagination::PageRequest;
use folio_core::workflow::ContentStatus;
use serde::Deserialize;

/// Admin content listing (`?page=&per_page=&status=&tag=`).
#[derive(Debug, Default, Deserialize)]
pub struct AdminContentParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<ContentStatus>,
    pub tag: Option<String>,
}

impl AdminContentParams {
    pub fn page_request(&self, default_per_page: i64) -> PageRequest {
        PageRequest::new(self.page, self.per_page, default_per_page)
    }
}

/// Public listing (`?page=&per_page=&tag=`). Always restricted to published.
#[derive(Debug, Default, Deserialize)]
pub struct PublicContentParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub tag: Option<String>,
}

impl PublicContentParams {
    pub fn page_request(&self, default_per_page: i64) -> PageRequest {
        PageRequest::new(self.page, self.per_page, default_per_page)
    }
}

/// Inbox listing (`?page=&per_page=&include_spam=&unread=`).
#[derive(Debug, Default, Deserialize)]
pub struct MessageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    #[serde(default)]
    pub include_spam: bool,
    #[serde(default)]
    pub unread: bool,
}

impl MessageParams {
    pub fn page_request(&self, default_per_page: i64) -> PageRequest {
        PageRequest::new(self.page, self.per_page, default_per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_params_parse_status() {
        let params: AdminContentParams =
            serde_urlencoded_from("page=2&per_page=10&status=published&tag=rust");
        assert_eq!(params.status, Some(ContentStatus::Published));
        assert_eq!(params.page_request(5).offset(), 10);
    }

    #[test]
    fn message_flags_default_false() {
        let params: MessageParams = serde_urlencoded_from("page=1");
        assert!(!params.include_spam);
        assert!(!params.unread);
    }

    fn serde_urlencoded_from<T: serde::de::DeserializeOwned>(query: &str) -> T {
        let uri: axum::http::Uri = format!("/?{query}").parse().unwrap();
        axum::extract::Query::<T>::try_from_uri(&uri).unwrap().0
    }
}
