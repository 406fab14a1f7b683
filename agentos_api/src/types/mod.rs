mod page;
pub use self::page::{unwrap_detail, Page};

mod row;
pub use self::row::{Row, RowID};

mod action;
pub use self::action::ActionResponse;
