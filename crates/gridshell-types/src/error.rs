use std::fmt;

use crate::geometry::{CellIndex, CellSize};
use crate::widget::WidgetInstanceId;

/// Result type for gridshell operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the desktop core
#[derive(Debug)]
pub enum Error {
    /// A widget rectangle does not fit inside the grid bounds
    InvalidPlacement { cell: CellIndex, size: CellSize },

    /// A widget rectangle overlaps a cell already held by another instance
    CellOccupied {
        cell: CellIndex,
        held_by: WidgetInstanceId,
    },

    /// A widget or app instance id no longer resolves to a live instance
    InstanceNotFound(String),

    /// A catalog id does not resolve to any widget or app definition
    DefinitionNotFound(String),

    /// The sole remaining workspace cannot be deleted
    LastWorkspaceProtected,

    /// Deleting a non-empty workspace needs an explicit confirmation flag
    ConfirmationRequired { workspace: String, widgets: usize },

    /// Workspace names must be non-empty
    InvalidName(String),

    /// Unknown drawer tab name
    UnknownTab(String),

    /// Storage read/write failure; in-memory state stays authoritative
    PersistenceUnavailable(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPlacement { cell, size } => write!(
                f,
                "Invalid placement: {}x{} rectangle at cell {} crosses the grid bounds",
                size.width, size.height, cell
            ),
            Error::CellOccupied { cell, held_by } => {
                write!(f, "Cell {} is already held by widget {}", cell, held_by)
            }
            Error::InstanceNotFound(id) => write!(f, "Instance not found: {}", id),
            Error::DefinitionNotFound(id) => write!(f, "Definition not found: {}", id),
            Error::LastWorkspaceProtected => {
                write!(f, "The last remaining workspace cannot be deleted")
            }
            Error::ConfirmationRequired { workspace, widgets } => write!(
                f,
                "Workspace {} still holds {} widget(s); deletion requires confirmation",
                workspace, widgets
            ),
            Error::InvalidName(msg) => write!(f, "Invalid name: {}", msg),
            Error::UnknownTab(tab) => write!(f, "Unknown drawer tab: {}", tab),
            Error::PersistenceUnavailable(msg) => write!(f, "Persistence unavailable: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::PersistenceUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::PersistenceUnavailable(err.to_string())
    }
}
