use crate::app::{AppInstance, AppInstanceId};
use crate::catalog::{ConfigMap, DrawerTab, WidgetDefinition};
use crate::geometry::CellIndex;
use crate::widget::{WidgetInstance, WidgetInstanceId};
use crate::workspace::{WorkspaceId, WorkspaceSummary};

/// Subscription key on the event bus, one per event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    WidgetsChanged,
    GridCleared,
    WorkspaceSwitched,
    WorkspacesChanged,
    AppOpened,
    AppClosed,
    AppFocused,
    DrawerOpened,
    DrawerClosed,
    DrawerTabChanged,
    DrawerDragStart,
    DrawerDragEnd,
}

impl Topic {
    /// Wire name of the event, as surfaced to external renderers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::WidgetsChanged => "widgets:changed",
            Topic::GridCleared => "grid:cleared",
            Topic::WorkspaceSwitched => "workspace:switched",
            Topic::WorkspacesChanged => "workspaces:changed",
            Topic::AppOpened => "app:opened",
            Topic::AppClosed => "app:closed",
            Topic::AppFocused => "app:focused",
            Topic::DrawerOpened => "drawer:opened",
            Topic::DrawerClosed => "drawer:closed",
            Topic::DrawerTabChanged => "drawer:tab-changed",
            Topic::DrawerDragStart => "drawer:drag-start",
            Topic::DrawerDragEnd => "drawer:drag-end",
        }
    }
}

/// Delta carried by `widgets:changed`, precise enough for subscribers to
/// update their render model without reading manager state mid-dispatch.
#[derive(Debug, Clone)]
pub enum WidgetChange {
    Placed(WidgetInstance),
    Moved {
        id: WidgetInstanceId,
        from: CellIndex,
        to: CellIndex,
    },
    Removed(WidgetInstanceId),
    Configured {
        id: WidgetInstanceId,
        config: ConfigMap,
    },
}

/// Event payloads published on the shell bus.
#[derive(Debug, Clone)]
pub enum ShellEvent {
    WidgetsChanged {
        workspace: WorkspaceId,
        change: WidgetChange,
    },
    GridCleared,
    WorkspaceSwitched {
        workspace: WorkspaceId,
        widgets: Vec<WidgetInstance>,
    },
    /// The workspace list itself changed (create/rename/delete).
    WorkspacesChanged {
        workspaces: Vec<WorkspaceSummary>,
    },
    AppOpened {
        instance: AppInstance,
    },
    /// Carries the final snapshot of the closed instance.
    AppClosed {
        instance: AppInstance,
    },
    AppFocused {
        id: AppInstanceId,
    },
    DrawerOpened,
    DrawerClosed,
    DrawerTabChanged {
        tab: DrawerTab,
    },
    DrawerDragStart {
        definition: WidgetDefinition,
    },
    DrawerDragEnd,
}

impl ShellEvent {
    pub fn topic(&self) -> Topic {
        match self {
            ShellEvent::WidgetsChanged { .. } => Topic::WidgetsChanged,
            ShellEvent::GridCleared => Topic::GridCleared,
            ShellEvent::WorkspaceSwitched { .. } => Topic::WorkspaceSwitched,
            ShellEvent::WorkspacesChanged { .. } => Topic::WorkspacesChanged,
            ShellEvent::AppOpened { .. } => Topic::AppOpened,
            ShellEvent::AppClosed { .. } => Topic::AppClosed,
            ShellEvent::AppFocused { .. } => Topic::AppFocused,
            ShellEvent::DrawerOpened => Topic::DrawerOpened,
            ShellEvent::DrawerClosed => Topic::DrawerClosed,
            ShellEvent::DrawerTabChanged { .. } => Topic::DrawerTabChanged,
            ShellEvent::DrawerDragStart { .. } => Topic::DrawerDragStart,
            ShellEvent::DrawerDragEnd => Topic::DrawerDragEnd,
        }
    }
}
