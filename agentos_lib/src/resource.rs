//! Resource descriptions: one [`ResourceSpec`] per list view, collected in a [`Registry`].
//!
//! A spec carries everything that differs between list pages (endpoint,
//! columns, filter keys and their backend names, supported actions, paging
//! convention, filtering strategy) so a single controller serves all of them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use agentos_api::{PageStyle, SortDirection};
use serde::{Deserialize, Serialize};

use crate::error::AgentOsError;
use crate::query::Sort;

/// Row-level mutation offered by a list view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Enable,
    Disable,
    Approve,
    Reject,
    Delete,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Enable,
        ActionKind::Disable,
        ActionKind::Approve,
        ActionKind::Reject,
        ActionKind::Delete,
    ];

    /// Wire name, used as the action path segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Enable => "enable",
            ActionKind::Disable => "disable",
            ActionKind::Approve => "approve",
            ActionKind::Reject => "reject",
            ActionKind::Delete => "delete",
        }
    }

    /// Destructive or irreversible actions go through a confirmation step.
    pub fn requires_confirmation(&self) -> bool {
        matches!(
            self,
            ActionKind::Approve | ActionKind::Reject | ActionKind::Delete
        )
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            ActionKind::Enable => "enabled",
            ActionKind::Disable => "disabled",
            ActionKind::Approve => "approved",
            ActionKind::Reject => "rejected",
            ActionKind::Delete => "deleted",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = AgentOsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AgentOsError::InvalidInput(format!(
                    "unknown action '{}'. Valid: enable, disable, approve, reject, delete",
                    s
                ))
            })
    }
}

/// A rendered column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub title: &'static str,
}

/// A filter the view exposes. `key` is what the user edits, `param` is the
/// backend's query parameter name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterField {
    pub key: &'static str,
    pub param: &'static str,
    pub default: Option<&'static str>,
}

/// Where filtering happens for a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterStrategy {
    /// Filters and paging are sent to the backend; its `total` is authoritative.
    Server,
    /// The backend cannot filter. Up to `fetch_limit` rows are fetched once
    /// and filtered and paged locally; `total` is the filtered count.
    Client { fetch_limit: u64 },
}

/// What a failed list fetch does to the rows currently held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Keep the previous result around as stale context.
    #[default]
    KeepStale,
    /// Drop it.
    Clear,
}

/// Static description of one list view.
#[derive(Clone, Debug)]
pub struct ResourceSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub path: &'static str,
    pub columns: Vec<Column>,
    pub filters: Vec<FilterField>,
    pub actions: Vec<ActionKind>,
    pub reason_required: Vec<ActionKind>,
    pub strategy: FilterStrategy,
    pub paging: PageStyle,
    pub error_policy: ErrorPolicy,
    pub has_detail: bool,
    pub live: bool,
    pub default_sort: Option<Sort>,
    pub default_page_size: Option<u64>,
}

impl ResourceSpec {
    pub fn builder(name: &'static str, path: &'static str) -> ResourceSpecBuilder {
        ResourceSpecBuilder {
            spec: ResourceSpec {
                name,
                label: name,
                path,
                columns: Vec::new(),
                filters: Vec::new(),
                actions: Vec::new(),
                reason_required: Vec::new(),
                strategy: FilterStrategy::Server,
                paging: PageStyle::default(),
                error_policy: ErrorPolicy::default(),
                has_detail: false,
                live: false,
                default_sort: None,
                default_page_size: None,
            },
        }
    }

    pub fn supports(&self, action: ActionKind) -> bool {
        self.actions.contains(&action)
    }

    pub fn requires_reason(&self, action: ActionKind) -> bool {
        self.reason_required.contains(&action)
    }

    pub fn filter(&self, key: &str) -> Option<&FilterField> {
        self.filters.iter().find(|f| f.key == key)
    }

    /// Filter values the view starts with (and returns to on reset).
    pub fn default_filters(&self) -> BTreeMap<String, String> {
        self.filters
            .iter()
            .filter_map(|f| f.default.map(|d| (f.key.to_string(), d.to_string())))
            .collect()
    }

    /// Translates user-facing filter keys to backend parameter names.
    pub fn filter_params(&self, filters: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        filters
            .iter()
            .map(|(key, value)| {
                let param = self.filter(key).map(|f| f.param).unwrap_or(key.as_str());
                (param.to_string(), value.clone())
            })
            .collect()
    }
}

pub struct ResourceSpecBuilder {
    spec: ResourceSpec,
}

impl ResourceSpecBuilder {
    pub fn label(mut self, label: &'static str) -> Self {
        self.spec.label = label;
        self
    }

    pub fn column(mut self, key: &'static str, title: &'static str) -> Self {
        self.spec.columns.push(Column { key, title });
        self
    }

    pub fn filter(mut self, key: &'static str, param: &'static str) -> Self {
        self.spec.filters.push(FilterField {
            key,
            param,
            default: None,
        });
        self
    }

    pub fn filter_with_default(
        mut self,
        key: &'static str,
        param: &'static str,
        default: &'static str,
    ) -> Self {
        self.spec.filters.push(FilterField {
            key,
            param,
            default: Some(default),
        });
        self
    }

    pub fn actions(mut self, actions: &[ActionKind]) -> Self {
        self.spec.actions.extend_from_slice(actions);
        self
    }

    pub fn reason_required(mut self, action: ActionKind) -> Self {
        self.spec.reason_required.push(action);
        self
    }

    pub fn client_filtered(mut self, fetch_limit: u64) -> Self {
        self.spec.strategy = FilterStrategy::Client { fetch_limit };
        self
    }

    pub fn paging(mut self, paging: PageStyle) -> Self {
        self.spec.paging = paging;
        self
    }

    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.spec.error_policy = policy;
        self
    }

    pub fn with_detail(mut self) -> Self {
        self.spec.has_detail = true;
        self
    }

    pub fn live(mut self) -> Self {
        self.spec.live = true;
        self
    }

    pub fn sort(mut self, field: &str, direction: SortDirection) -> Self {
        self.spec.default_sort = Some(Sort::new(field, direction));
        self
    }

    pub fn page_size(mut self, page_size: u64) -> Self {
        self.spec.default_page_size = Some(page_size);
        self
    }

    pub fn build(self) -> ResourceSpec {
        self.spec
    }
}

/// The set of list views known to the console.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    specs: Vec<ResourceSpec>,
}

impl Registry {
    pub fn new(specs: Vec<ResourceSpec>) -> Self {
        Self { specs }
    }

    /// The AgentOS console's list views.
    pub fn builtin() -> Self {
        use ActionKind::*;

        Self::new(vec![
            ResourceSpec::builder("tasks", "/api/tasks")
                .label("Tasks")
                .column("id", "ID")
                .column("title", "Title")
                .column("status", "Status")
                .column("agent", "Agent")
                .column("created_at", "Created")
                .filter("status", "status")
                .filter("agent", "agent_id")
                .filter("search", "q")
                .sort("created_at", SortDirection::Desc)
                .with_detail()
                .build(),
            ResourceSpec::builder("agents", "/api/agents")
                .label("Agents")
                .column("id", "ID")
                .column("name", "Name")
                .column("status", "Status")
                .column("model", "Model")
                .filter("status", "status")
                .filter("search", "q")
                .actions(&[Enable, Disable])
                .with_detail()
                .build(),
            ResourceSpec::builder("skills", "/api/skills")
                .label("Skills")
                .column("id", "ID")
                .column("name", "Name")
                .column("version", "Version")
                .column("enabled", "Enabled")
                .filter("enabled", "enabled")
                .filter("search", "q")
                .actions(&[Enable, Disable])
                .client_filtered(500)
                .paging(PageStyle::zero_based())
                .build(),
            ResourceSpec::builder("extensions", "/api/extensions")
                .label("Extensions")
                .column("id", "ID")
                .column("name", "Name")
                .column("status", "Status")
                .column("enabled", "Enabled")
                .filter("status", "status")
                .filter("search", "q")
                .actions(&[Enable, Disable, Delete])
                .with_detail()
                .build(),
            ResourceSpec::builder("reviews", "/api/review-queue")
                .label("Review queue")
                .column("id", "ID")
                .column("subject", "Subject")
                .column("status", "Status")
                .column("risk", "Risk")
                .column("requested_by", "Requested by")
                .filter_with_default("status", "status", "pending")
                .filter("risk", "risk_level")
                .actions(&[Approve, Reject])
                .reason_required(Reject)
                .error_policy(ErrorPolicy::Clear)
                .with_detail()
                .build(),
            ResourceSpec::builder("governance", "/api/governance/decisions")
                .label("Governance decisions")
                .column("id", "ID")
                .column("policy", "Policy")
                .column("decision", "Decision")
                .column("status", "Status")
                .column("created_at", "Created")
                .filter("status", "status")
                .filter("policy", "policy_id")
                .actions(&[Approve, Reject])
                .reason_required(Reject)
                .paging(PageStyle::offset())
                .error_policy(ErrorPolicy::Clear)
                .with_detail()
                .build(),
            ResourceSpec::builder("events", "/api/events")
                .label("Events")
                .column("id", "ID")
                .column("type", "Type")
                .column("source", "Source")
                .column("timestamp", "Time")
                .filter("type", "type")
                .filter("source", "source")
                .filter("search", "q")
                .client_filtered(1000)
                .sort("timestamp", SortDirection::Desc)
                .page_size(50)
                .live()
                .build(),
            ResourceSpec::builder("provenance", "/api/provenance")
                .label("Provenance")
                .column("id", "ID")
                .column("artifact", "Artifact")
                .column("producer", "Producer")
                .column("created_at", "Created")
                .filter("artifact", "artifact")
                .filter("producer", "producer")
                .with_detail()
                .build(),
            ResourceSpec::builder("notifications", "/api/notifications")
                .label("Notifications")
                .column("id", "ID")
                .column("title", "Title")
                .column("severity", "Severity")
                .column("read", "Read")
                .filter("severity", "severity")
                .actions(&[Delete])
                .live()
                .build(),
        ])
    }

    pub fn get(&self, name: &str) -> Result<&ResourceSpec, AgentOsError> {
        self.specs
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AgentOsError::UnknownResource(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceSpec> {
        self.specs.iter()
    }
}
