use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::widget::WidgetInstance;

/// Unique identifier of a workspace (time-based, generated at creation)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A named, isolated collection of widget placements belonging to one user.
///
/// The widget list is the persistence snapshot; during a session the live
/// instances are owned by the widget manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub widgets: Vec<WidgetInstance>,
    pub last_modified: DateTime<Utc>,
}

impl Workspace {
    pub fn new(id: WorkspaceId, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: owner.into(),
            widgets: Vec::new(),
            last_modified: Utc::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

/// Lightweight workspace listing for switcher UIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    pub id: WorkspaceId,
    pub name: String,
    pub widget_count: usize,
    pub last_modified: DateTime<Utc>,
}

impl From<&Workspace> for WorkspaceSummary {
    fn from(ws: &Workspace) -> Self {
        Self {
            id: ws.id.clone(),
            name: ws.name.clone(),
            widget_count: ws.widgets.len(),
            last_modified: ws.last_modified,
        }
    }
}
