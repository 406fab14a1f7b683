use std::collections::BTreeMap;

use url::Url;

use super::{
    common::{PageStyle, QueryCommon},
    Query,
};

/// List query for any collection endpoint: common paging/sort fields plus
/// free-form filter parameters already translated to backend names.
#[derive(Clone, Debug, Default)]
pub struct ResourceQuery {
    pub common: QueryCommon,
    pub filters: BTreeMap<String, String>,
}

impl Query for ResourceQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = self.common.add_to_url(url);
        for (param, value) in self.filters.iter() {
            if value.is_empty() {
                continue;
            }
            url.query_pairs_mut().append_pair(param, value);
        }
        url
    }
}

impl ResourceQuery {
    /// Query for zero-based `page` of `page_size` rows, in the backend's paging convention.
    pub fn for_page(page: u64, page_size: u64, style: PageStyle) -> Self {
        ResourceQuery::default()
            .with_paging(style)
            .with_page(page)
            .with_page_size(page_size)
    }

    pub fn with_filter(mut self, param: &str, value: &str) -> Self {
        self.filters.insert(param.to_string(), value.to_string());
        self
    }

    pub fn with_filters<'a>(mut self, filters: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (param, value) in filters {
            self.filters.insert(param.to_string(), value.to_string());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use crate::query::{PageStyle, Query, ResourceQuery, SortDirection};

    #[test]
    fn test_resource_query() {
        let url = Url::parse("https://example.com/api/tasks").unwrap();

        insta::assert_yaml_snapshot!(ResourceQuery::default().add_to_url(&url).to_string());

        insta::assert_yaml_snapshot!(ResourceQuery::default()
            .with_page(2)
            .with_page_size(25)
            .with_filter("status", "running")
            .add_to_url(&url)
            .to_string());

        insta::assert_yaml_snapshot!(ResourceQuery::default()
            .with_paging(PageStyle::offset())
            .with_page(2)
            .with_page_size(25)
            .with_sort_by("created_at")
            .with_sort_direction(SortDirection::Asc)
            .add_to_url(&url)
            .to_string());
    }

    #[test]
    fn for_page_translates_zero_based_pages() {
        let url = Url::parse("https://example.com/api/skills").unwrap();
        let built = ResourceQuery::for_page(0, 10, PageStyle::zero_based()).add_to_url(&url);
        assert_eq!(built.as_str(), "https://example.com/api/skills?page=0&page_size=10");

        let built = ResourceQuery::for_page(3, 10, PageStyle::one_based()).add_to_url(&url);
        assert_eq!(built.as_str(), "https://example.com/api/skills?page=4&pageSize=10");
    }
}
