mod common;
pub use self::common::{PageStyle, Query, QueryCommon, SortDirection};

mod resource;
pub use self::resource::ResourceQuery;
