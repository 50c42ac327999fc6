use super::{PageRequest, PageResponse, PageSource};
use crate::error::{Result, RosterError};
use crate::fields::FieldRegistry;
use crate::model::Item;
use crate::query::Query;
use std::cell::RefCell;
use tracing::warn;

/// In-memory page source that answers requests the way the backend does:
/// filter by terms and descriptors, sort, then cut the page window.
///
/// Uses `RefCell` for interior mutability so tests can change the data set and
/// inject failures through a shared reference.
pub struct MemorySource<T> {
    items: RefCell<Vec<T>>,
    registry: FieldRegistry<T>,
    failures: RefCell<Vec<RosterError>>,
    requests: RefCell<Vec<PageRequest>>,
}

impl<T: Item + Clone> MemorySource<T> {
    /// `registry` is the backend's view of the fields; usually every capability
    /// is enabled on it.
    pub fn new(items: Vec<T>, registry: FieldRegistry<T>) -> Self {
        Self {
            items: RefCell::new(items),
            registry,
            failures: RefCell::new(Vec::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Inserts or replaces an item by key.
    pub fn upsert(&self, item: T) {
        let mut items = self.items.borrow_mut();
        match items.iter_mut().find(|existing| existing.key() == item.key()) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        let mut items = self.items.borrow_mut();
        let before = items.len();
        items.retain(|item| item.key() != key);
        items.len() != before
    }

    /// Makes the next `fetch_page` fail with `error`. Queued failures are used
    /// in order.
    pub fn fail_next(&self, error: RosterError) {
        self.failures.borrow_mut().push(error);
    }

    /// Every request seen so far, failed ones included.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.borrow().clone()
    }

    fn matching(&self, request: &PageRequest) -> Vec<T> {
        let queries: Vec<Query<T>> = request
            .queries
            .iter()
            .filter_map(|dto| {
                let query = Query::from_dto(dto, &self.registry);
                if query.is_none() {
                    warn!(field = %dto.field, "ignoring descriptor the source cannot evaluate");
                }
                query
            })
            .collect();
        let terms: Vec<String> = request
            .search_terms
            .iter()
            .map(|term| term.to_lowercase())
            .collect();

        self.items
            .borrow()
            .iter()
            .filter(|item| terms.iter().all(|term| item.matches_search(term)))
            .filter(|item| queries.iter().all(|q| q.compare_item(item)))
            .cloned()
            .collect()
    }
}

impl<T: Item + Clone> PageSource<T> for MemorySource<T> {
    fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse<T>> {
        self.requests.borrow_mut().push(request.clone());
        if !self.failures.borrow().is_empty() {
            return Err(self.failures.borrow_mut().remove(0));
        }

        let mut items = self.matching(request);
        if let Some(field) = self.registry.get(&request.sort_by_field) {
            items.sort_by(|a, b| {
                let ordering = field.value(a).sort_cmp(&field.value(b));
                if request.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        if request.limit == 0 {
            return Ok(PageResponse {
                items,
                last_page: true,
            });
        }
        let total = items.len();
        let start = request.page.saturating_mul(request.limit).min(total);
        let end = start.saturating_add(request.limit).min(total);
        Ok(PageResponse {
            items: items.drain(start..end).collect(),
            last_page: end >= total,
        })
    }

    fn count(&self) -> Result<usize> {
        Ok(self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::QueryType;
    use crate::model::tests::{named, Named};
    use crate::model::FieldValue;
    use crate::query::{Operator, QueryClass, QueryDescriptor, QueryValue};

    fn source(n: usize) -> MemorySource<Named> {
        let registry = FieldRegistry::new().register(
            "name",
            QueryType::new("Name", "name").string(),
            |n: &Named| FieldValue::Text(n.name.clone()),
        );
        let items = (0..n)
            .map(|i| named(&format!("u{i:02}"), &format!("user {i:02}")))
            .collect();
        MemorySource::new(items, registry)
    }

    fn request(limit: usize, page: usize, ascending: bool) -> PageRequest {
        PageRequest {
            limit,
            page,
            sort_by_field: "name".into(),
            ascending,
            ..Default::default()
        }
    }

    fn keys(resp: &PageResponse<Named>) -> Vec<&str> {
        resp.items.iter().map(|n| n.key.as_str()).collect()
    }

    #[test]
    fn pages_are_cut_from_the_sorted_set() {
        let src = source(5);
        let first = src.fetch_page(&request(2, 0, true)).unwrap();
        assert_eq!(keys(&first), vec!["u00", "u01"]);
        assert!(!first.last_page);

        let last = src.fetch_page(&request(2, 2, true)).unwrap();
        assert_eq!(keys(&last), vec!["u04"]);
        assert!(last.last_page);

        let past = src.fetch_page(&request(2, 9, true)).unwrap();
        assert!(past.items.is_empty());
        assert!(past.last_page);
    }

    #[test]
    fn descending_sort() {
        let src = source(3);
        let resp = src.fetch_page(&request(10, 0, false)).unwrap();
        assert_eq!(keys(&resp), vec!["u02", "u01", "u00"]);
    }

    #[test]
    fn filters_by_terms_and_descriptors() {
        let src = source(12);
        let mut req = request(10, 0, true);
        req.search_terms = vec!["USER 1".into()];
        let resp = src.fetch_page(&req).unwrap();
        assert_eq!(keys(&resp), vec!["u10", "u11"]);

        let mut req = request(10, 0, true);
        req.queries = vec![QueryDescriptor {
            class: QueryClass::String,
            field: "name".into(),
            operator: Operator::Equal,
            value: QueryValue::Text("03".into()),
        }];
        let resp = src.fetch_page(&req).unwrap();
        assert_eq!(keys(&resp), vec!["u03"]);
    }

    #[test]
    fn injected_failures_are_used_once() {
        let src = source(3);
        src.fail_next(RosterError::Status(503));
        assert!(matches!(
            src.fetch_page(&request(2, 0, true)),
            Err(RosterError::Status(503))
        ));
        assert!(src.fetch_page(&request(2, 0, true)).is_ok());
        assert_eq!(src.requests().len(), 2);
    }

    #[test]
    fn upsert_and_remove() {
        let src = source(2);
        src.upsert(named("u00", "renamed"));
        src.upsert(named("u99", "new"));
        assert_eq!(src.len(), 3);
        assert!(src.remove("u01"));
        assert!(!src.remove("u01"));
        assert_eq!(src.count().unwrap(), 2);
    }
}
