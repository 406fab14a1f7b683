//! The controller's view of a list request, before backend translation.

use std::collections::BTreeMap;

use agentos_api::{Query, ResourceQuery, SortDirection};

use crate::resource::ResourceSpec;

/// Sort field and direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: &str, direction: SortDirection) -> Self {
        Self {
            field: field.to_string(),
            direction,
        }
    }
}

/// Applied filters, zero-based page, page size and optional sort.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    pub filters: BTreeMap<String, String>,
    pub page: u64,
    pub page_size: u64,
    pub sort: Option<Sort>,
}

impl ListQuery {
    pub fn new(page_size: u64) -> Self {
        Self {
            filters: BTreeMap::new(),
            page: 0,
            page_size,
            sort: None,
        }
    }

    /// Maps this query onto the backend's parameter names and paging convention.
    pub fn to_request(&self, spec: &ResourceSpec) -> ResourceQuery {
        let mut query = ResourceQuery {
            filters: spec.filter_params(&self.filters),
            ..ResourceQuery::for_page(self.page, self.page_size, spec.paging)
        };
        if let Some(sort) = &self.sort {
            query = query
                .with_sort_by(&sort.field)
                .with_sort_direction(sort.direction);
        }
        query
    }
}
