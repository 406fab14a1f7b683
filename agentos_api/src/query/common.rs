//! Shared query infrastructure: the [`Query`] trait, [`QueryCommon`] fields, [`PageStyle`] and [`SortDirection`].

use std::str::FromStr;

use url::Url;

/// Trait implemented by all query builders. Provides URL serialization and
/// shared builder methods for pagination and sorting.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;

    /// Returns a mutable reference to the common query fields.
    fn get_common(&mut self) -> &mut QueryCommon;

    /// Sets the page index (0-indexed). Translated to the backend's convention
    /// by the configured [`PageStyle`].
    fn with_page(mut self, page: u64) -> Self
    where
        Self: Sized,
    {
        self.get_common().page = page;
        self
    }

    /// Sets the number of results per page.
    fn with_page_size(mut self, page_size: u64) -> Self
    where
        Self: Sized,
    {
        self.get_common().page_size = Some(page_size);
        self
    }

    /// Sets the field to sort by.
    fn with_sort_by(mut self, field: &str) -> Self
    where
        Self: Sized,
    {
        self.get_common().sort_by = Some(field.to_string());
        self
    }

    /// Sets the sort direction (ascending or descending).
    fn with_sort_direction(mut self, sort_direction: SortDirection) -> Self
    where
        Self: Sized,
    {
        self.get_common().sort_direction = sort_direction;
        self
    }

    /// Sets how page and page size are encoded on the wire.
    fn with_paging(mut self, paging: PageStyle) -> Self
    where
        Self: Sized,
    {
        self.get_common().paging = paging;
        self
    }
}

/// Sort order for API results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (oldest/smallest first).
    Asc = 0,
    /// Descending order (newest/largest first). This is the default.
    #[default]
    Desc = 1,
}
impl FromStr for SortDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "asc" => Ok(SortDirection::Asc),
            "1" | "desc" => Ok(SortDirection::Desc),
            _ => Err(()),
        }
    }
}

/// How a backend service expects pagination parameters.
///
/// Services disagree: some count pages from 1, some from 0, and a few take
/// an offset/limit pair instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageStyle {
    OneBased {
        page_key: &'static str,
        size_key: &'static str,
    },
    ZeroBased {
        page_key: &'static str,
        size_key: &'static str,
    },
    Offset {
        offset_key: &'static str,
        limit_key: &'static str,
    },
}

impl PageStyle {
    /// `page=1&pageSize=N` style.
    pub const fn one_based() -> Self {
        PageStyle::OneBased {
            page_key: "page",
            size_key: "pageSize",
        }
    }

    /// `page=0&page_size=N` style.
    pub const fn zero_based() -> Self {
        PageStyle::ZeroBased {
            page_key: "page",
            size_key: "page_size",
        }
    }

    /// `offset=K&limit=N` style.
    pub const fn offset() -> Self {
        PageStyle::Offset {
            offset_key: "offset",
            limit_key: "limit",
        }
    }
}

impl Default for PageStyle {
    fn default() -> Self {
        PageStyle::one_based()
    }
}

/// Fields shared by all query types: pagination and sorting.
#[derive(Clone, Debug)]
pub struct QueryCommon {
    /// Page index (0-indexed). Defaults to 0.
    pub page: u64,
    /// Results per page. `None` uses the API default.
    pub page_size: Option<u64>,
    /// Field to sort by. `None` uses the API default ordering.
    pub sort_by: Option<String>,
    /// Sort direction. Defaults to descending.
    pub sort_direction: SortDirection,
    /// Wire encoding of the page parameters.
    pub paging: PageStyle,
}

impl Default for QueryCommon {
    fn default() -> QueryCommon {
        QueryCommon {
            page: 0,
            page_size: None,
            sort_by: None,
            sort_direction: SortDirection::Desc,
            paging: PageStyle::default(),
        }
    }
}

impl QueryCommon {
    /// Appends the pagination and sort parameters to the URL.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        match self.paging {
            PageStyle::OneBased { page_key, size_key } => {
                url.query_pairs_mut()
                    .append_pair(page_key, &(self.page + 1).to_string());
                if let Some(page_size) = self.page_size {
                    url.query_pairs_mut()
                        .append_pair(size_key, &page_size.to_string());
                }
            }
            PageStyle::ZeroBased { page_key, size_key } => {
                url.query_pairs_mut()
                    .append_pair(page_key, &self.page.to_string());
                if let Some(page_size) = self.page_size {
                    url.query_pairs_mut()
                        .append_pair(size_key, &page_size.to_string());
                }
            }
            PageStyle::Offset {
                offset_key,
                limit_key,
            } => {
                // Without a page size only the first page is addressable.
                if let Some(page_size) = self.page_size {
                    url.query_pairs_mut()
                        .append_pair(offset_key, &(self.page * page_size).to_string())
                        .append_pair(limit_key, &page_size.to_string());
                }
            }
        }
        if let Some(sort_by) = &self.sort_by {
            url.query_pairs_mut().append_pair(
                "sortBy",
                format!(
                    "{}{}",
                    match self.sort_direction {
                        SortDirection::Asc => "",
                        SortDirection::Desc => "-",
                    },
                    sort_by
                )
                .as_str(),
            );
        }
        url
    }
}
