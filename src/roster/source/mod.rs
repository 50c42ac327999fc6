//! Page sources and the wire shapes they speak.
//!
//! [`PageSource`] is the seam to the paginated endpoint. The list controller
//! never calls it directly; a driver such as [`crate::api::ListSession`] sends
//! the controller's requests through it.

pub mod fixture;
pub mod memory;

pub use fixture::load_items;
pub use memory::MemorySource;

use crate::error::Result;
use crate::query::QueryDescriptor;
use serde::{Deserialize, Serialize};

/// Request for one page of items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub limit: usize,
    pub page: usize,
    pub sort_by_field: String,
    pub ascending: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_terms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<QueryDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub last_page: bool,
}

/// Item-count side channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

/// Abstract interface to the paginated endpoint.
pub trait PageSource<T> {
    /// Fetches one ordered page.
    fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse<T>>;

    /// Total number of records, for display only.
    fn count(&self) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Operator, QueryClass, QueryValue};

    #[test]
    fn request_wire_shape() {
        let request = PageRequest {
            limit: 20,
            page: 1,
            sort_by_field: "name".into(),
            ascending: true,
            search_terms: vec!["bob".into()],
            queries: vec![QueryDescriptor {
                class: QueryClass::Bool,
                field: "admin".into(),
                operator: Operator::Equal,
                value: QueryValue::Bool(true),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "limit": 20,
                "page": 1,
                "sortByField": "name",
                "ascending": true,
                "searchTerms": ["bob"],
                "queries": [{"class": "bool", "field": "admin", "operator": "=", "value": true}]
            })
        );
    }

    #[test]
    fn plain_request_omits_search_fields() {
        let json = serde_json::to_value(PageRequest::default()).unwrap();
        assert!(json.get("searchTerms").is_none());
        assert!(json.get("queries").is_none());
    }

    #[test]
    fn response_reads_last_page() {
        let response: PageResponse<String> =
            serde_json::from_str(r#"{"items": ["a", "b"], "last_page": true}"#).unwrap();
        assert_eq!(response.items.len(), 2);
        assert!(response.last_page);
    }
}
