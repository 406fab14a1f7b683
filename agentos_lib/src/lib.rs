//! Library layer for the AgentOS console: a reusable list-view controller
//! over a typed service boundary.
//!
//! A [`ListController`] owns the filter, pagination, load and row-interaction
//! state of one list view. It talks to the backend through a
//! [`ServiceClient`], either the HTTP one wrapping `agentos_api` or the
//! in-memory [`FixtureService`].

pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod fixture;
pub mod load_state;
pub mod notify;
pub mod pagination;
pub mod query;
pub mod record;
pub mod resource;
pub mod schedule;
pub mod service;
pub mod validation;

pub use agentos_api;
pub use agentos_api::types::{Page, Row};
pub use agentos_api::SortDirection;

pub use config::{ServiceMode, Settings};
pub use controller::{ActionOutcome, FetchOutcome, ListController, Snapshot};
pub use error::AgentOsError;
pub use fixture::FixtureService;
pub use load_state::{DetailState, ListResult, LoadState, PendingAction, ViewState};
pub use notify::{Notification, NotificationLevel, NotificationSource, Notifier};
pub use pagination::Pagination;
pub use query::{ListQuery, Sort};
pub use record::Record;
pub use resource::{ActionKind, ErrorPolicy, FilterStrategy, Registry, ResourceSpec};
pub use schedule::{Dashboard, PollHandle, Widget, WidgetReport};
pub use service::{ActionReceipt, HttpService, ServiceClient};
