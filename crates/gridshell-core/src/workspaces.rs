use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use gridshell_types::{
    Error, Result, ShellEvent, Topic, Workspace, WorkspaceId, WorkspaceSummary,
};
use tracing::{info, warn};

use crate::bus::{EventBus, HandlerId};
use crate::storage::{Persister, WorkspaceStore};
use crate::widgets::WidgetManager;

/// Debounce window over `widgets:changed` notifications.
///
/// Every change re-arms the timer for its workspace (trailing edge); a
/// workspace becomes due once its last change is older than the window.
pub struct AutoSaver {
    debounce: Duration,
    dirty: HashMap<WorkspaceId, DateTime<Utc>>,
}

impl AutoSaver {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            dirty: HashMap::new(),
        }
    }

    pub fn mark(&mut self, workspace: WorkspaceId, at: DateTime<Utc>) {
        self.dirty.insert(workspace, at);
    }

    pub fn discard(&mut self, workspace: &WorkspaceId) {
        self.dirty.remove(workspace);
    }

    /// Workspaces whose debounce window has elapsed, removed from the
    /// dirty set.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<WorkspaceId> {
        let due: Vec<WorkspaceId> = self
            .dirty
            .iter()
            .filter(|(_, at)| now.signed_duration_since(**at) >= self.debounce)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &due {
            self.dirty.remove(id);
        }
        due
    }

    /// Drain every dirty workspace regardless of the debounce window.
    pub fn take_all(&mut self) -> Vec<WorkspaceId> {
        self.dirty.drain().map(|(id, _)| id).collect()
    }
}

/// Owns the workspace set and the current-workspace pointer.
///
/// Switching follows a fixed protocol: persist the outgoing workspace,
/// emit `grid:cleared`, move the pointer, load the target's widgets, emit
/// `workspace:switched`. The pointer is never left dangling: a missing
/// switch target falls back to the first available workspace.
pub struct WorkspaceManager {
    bus: Rc<EventBus>,
    persister: Persister,
    widgets: Rc<RefCell<WidgetManager>>,
    workspaces: Vec<Workspace>,
    current: WorkspaceId,
    user_id: String,
    revisions: HashMap<WorkspaceId, u64>,
    autosave: Rc<RefCell<AutoSaver>>,
    autosave_sub: HandlerId,
}

impl WorkspaceManager {
    /// Load persisted workspaces and resolve the current pointer, creating
    /// a default workspace on first run.
    pub fn new(
        bus: Rc<EventBus>,
        store: Arc<dyn WorkspaceStore>,
        widgets: Rc<RefCell<WidgetManager>>,
        user_id: impl Into<String>,
        default_workspace_name: &str,
        autosave_debounce: Duration,
    ) -> Self {
        let user_id = user_id.into();
        let mut workspaces = store.load_workspaces();
        let mut first_run = false;
        if workspaces.is_empty() {
            let id = WorkspaceId::new(format!("ws-{}", Utc::now().timestamp_millis()));
            info!(workspace = %id, "no stored workspaces; creating default");
            workspaces.push(Workspace::new(id, default_workspace_name, user_id.clone()));
            first_run = true;
        }

        let current = store
            .load_current_workspace_id()
            .filter(|id| workspaces.iter().any(|w| w.id == *id))
            .unwrap_or_else(|| workspaces[0].id.clone());

        let autosave = Rc::new(RefCell::new(AutoSaver::new(autosave_debounce)));
        let sink = autosave.clone();
        let autosave_sub = bus.on(Topic::WidgetsChanged, move |event| {
            if let ShellEvent::WidgetsChanged { workspace, .. } = event {
                sink.borrow_mut().mark(workspace.clone(), Utc::now());
            }
            Ok(())
        });

        let persister = Persister::spawn(store);
        let mut manager = Self {
            bus,
            persister,
            widgets,
            workspaces,
            current: current.clone(),
            user_id,
            revisions: HashMap::new(),
            autosave,
            autosave_sub,
        };

        if first_run {
            manager.persist_workspace(&current);
            manager.persister.save_current(current.clone());
        }
        let stored = manager
            .workspace(&current)
            .map(|w| w.widgets.clone())
            .unwrap_or_default();
        manager.widgets.borrow_mut().load_workspace(&current, stored);
        manager
    }

    pub fn current(&self) -> &WorkspaceId {
        &self.current
    }

    pub fn workspace(&self, id: &WorkspaceId) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id == *id)
    }

    pub fn summaries(&self) -> Vec<WorkspaceSummary> {
        self.workspaces.iter().map(WorkspaceSummary::from).collect()
    }

    /// Emit `workspace:switched` for the current workspace. Called once by
    /// the context after all subscribers are wired, so renderers get an
    /// initial state.
    pub fn announce_current(&self) {
        let widgets = self.widgets.borrow().instances(&self.current).to_vec();
        self.bus.emit(&ShellEvent::WorkspaceSwitched {
            workspace: self.current.clone(),
            widgets,
        });
    }

    /// Switch the active workspace. Returns the workspace actually
    /// activated, which differs from `target` only when the target has
    /// vanished and the manager fell back to the first workspace.
    pub fn switch_workspace(&mut self, target: &WorkspaceId) -> Result<WorkspaceId> {
        if *target == self.current {
            return Ok(self.current.clone());
        }

        let outgoing = self.current.clone();
        self.persist_workspace(&outgoing);
        self.bus.emit(&ShellEvent::GridCleared);

        let resolved = if self.workspace(target).is_some() {
            target.clone()
        } else {
            let fallback = self.workspaces[0].id.clone();
            warn!(target = %target, fallback = %fallback, "switch target no longer exists; falling back");
            fallback
        };
        Ok(self.activate(resolved))
    }

    /// Create a workspace with a time-based id and switch to it.
    pub fn create_workspace(&mut self, name: Option<&str>) -> Result<WorkspaceId> {
        let id = self.generate_id();
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Workspace {}", self.workspaces.len() + 1),
        };
        info!(workspace = %id, name, "creating workspace");
        let workspace = Workspace::new(id.clone(), name, self.user_id.clone());
        self.workspaces.push(workspace.clone());
        let revision = self.next_revision(&id);
        self.persister.save(workspace, revision);
        self.emit_workspaces_changed();
        self.switch_workspace(&id)
    }

    /// Delete the current workspace and switch to its neighbor.
    ///
    /// The last remaining workspace is protected, and deleting a workspace
    /// that still holds widgets needs `confirmed` (the UI layer prompts).
    pub fn delete_current_workspace(&mut self, confirmed: bool) -> Result<WorkspaceId> {
        if self.workspaces.len() == 1 {
            return Err(Error::LastWorkspaceProtected);
        }
        let current = self.current.clone();
        let widget_count = self.widgets.borrow().instances(&current).len();
        if widget_count > 0 && !confirmed {
            return Err(Error::ConfirmationRequired {
                workspace: current.to_string(),
                widgets: widget_count,
            });
        }

        let index = self
            .workspaces
            .iter()
            .position(|w| w.id == current)
            .expect("current workspace in set");
        self.workspaces.remove(index);
        self.widgets.borrow_mut().unload_workspace(&current);
        self.revisions.remove(&current);
        self.autosave.borrow_mut().discard(&current);
        self.persister.delete(current.clone());
        info!(workspace = %current, "deleted workspace");

        // Prefer the neighbor before the deleted one, else the first.
        let target = if index > 0 {
            self.workspaces[index - 1].id.clone()
        } else {
            self.workspaces[0].id.clone()
        };
        self.emit_workspaces_changed();
        self.bus.emit(&ShellEvent::GridCleared);
        Ok(self.activate(target))
    }

    /// Rename a workspace. Empty names are rejected.
    pub fn rename_workspace(&mut self, id: &WorkspaceId, new_name: &str) -> Result<()> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidName(
                "workspace name must not be empty".to_string(),
            ));
        }
        let index = self
            .workspaces
            .iter()
            .position(|w| w.id == *id)
            .ok_or_else(|| Error::InstanceNotFound(id.to_string()))?;
        self.workspaces[index].name = trimmed.to_string();
        self.workspaces[index].touch();
        let record = self.workspaces[index].clone();
        let revision = self.next_revision(id);
        self.persister.save(record, revision);
        self.emit_workspaces_changed();
        Ok(())
    }

    /// Persist every workspace whose autosave debounce has elapsed.
    pub fn flush_autosave(&mut self, now: DateTime<Utc>) {
        let due = self.autosave.borrow_mut().take_due(now);
        for id in due {
            if self.workspace(&id).is_some() {
                self.persist_workspace(&id);
            }
        }
    }

    /// Block until every enqueued write has reached the store.
    pub fn flush_persistence(&self) {
        self.persister.flush();
    }

    /// Unregister the autosave subscription.
    pub fn destroy(&self) {
        self.bus.off(Topic::WidgetsChanged, self.autosave_sub);
    }

    /// Final teardown: persist everything still dirty plus the current
    /// workspace, unsubscribe, and drain the write queue.
    pub fn shutdown(&mut self) {
        self.destroy();
        let mut pending = self.autosave.borrow_mut().take_all();
        if !pending.contains(&self.current) {
            pending.push(self.current.clone());
        }
        for id in pending {
            if self.workspace(&id).is_some() {
                self.persist_workspace(&id);
            }
        }
        self.persister.flush();
    }

    /// Move the pointer, load the target's widgets, announce the switch.
    fn activate(&mut self, target: WorkspaceId) -> WorkspaceId {
        self.current = target.clone();
        self.persister.save_current(target.clone());
        let widgets = self
            .workspace(&target)
            .map(|w| w.widgets.clone())
            .unwrap_or_default();
        self.widgets
            .borrow_mut()
            .load_workspace(&target, widgets.clone());
        self.bus.emit(&ShellEvent::WorkspaceSwitched {
            workspace: target.clone(),
            widgets,
        });
        target
    }

    /// Snapshot resident instances into the workspace record and enqueue a
    /// save under the next revision.
    fn persist_workspace(&mut self, id: &WorkspaceId) {
        let snapshot = {
            let widgets = self.widgets.borrow();
            widgets.is_resident(id).then(|| widgets.instances(id).to_vec())
        };
        let Some(index) = self.workspaces.iter().position(|w| w.id == *id) else {
            return;
        };
        if let Some(instances) = snapshot {
            self.workspaces[index].widgets = instances;
        }
        self.workspaces[index].touch();
        let record = self.workspaces[index].clone();
        let revision = self.next_revision(id);
        self.persister.save(record, revision);
    }

    fn next_revision(&mut self, id: &WorkspaceId) -> u64 {
        let revision = self.revisions.entry(id.clone()).or_insert(0);
        *revision += 1;
        *revision
    }

    fn generate_id(&self) -> WorkspaceId {
        let base = format!("ws-{}", Utc::now().timestamp_millis());
        if self.workspace(&WorkspaceId::new(base.as_str())).is_none() {
            return WorkspaceId::new(base);
        }
        let mut n = 2;
        loop {
            let candidate = WorkspaceId::new(format!("{base}-{n}"));
            if self.workspace(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    fn emit_workspaces_changed(&self) {
        self.bus.emit(&ShellEvent::WorkspacesChanged {
            workspaces: self.summaries(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use gridshell_types::{CellSize, ConfigMap, GridSpec, WidgetDefinition};

    fn definition(id: &str) -> WidgetDefinition {
        WidgetDefinition {
            id: id.to_string(),
            kind: id.to_string(),
            name: id.to_string(),
            icon: String::new(),
            category: "test".to_string(),
            size: CellSize::new(1, 1),
            description: String::new(),
            default_config: ConfigMap::new(),
            app_id: None,
            header: Default::default(),
            gestures: Default::default(),
        }
    }

    struct Fixture {
        bus: Rc<EventBus>,
        store: Arc<MemoryStore>,
        widgets: Rc<RefCell<WidgetManager>>,
        manager: WorkspaceManager,
    }

    fn fixture() -> Fixture {
        fixture_with_debounce(Duration::zero())
    }

    fn fixture_with_debounce(debounce: Duration) -> Fixture {
        let bus = Rc::new(EventBus::new());
        let store = Arc::new(MemoryStore::new());
        let widgets = Rc::new(RefCell::new(WidgetManager::new(
            GridSpec::default(),
            bus.clone(),
        )));
        let manager = WorkspaceManager::new(
            bus.clone(),
            store.clone() as Arc<dyn WorkspaceStore>,
            widgets.clone(),
            "user-1",
            "Default",
            debounce,
        );
        Fixture {
            bus,
            store,
            widgets,
            manager,
        }
    }

    #[test]
    fn test_first_run_creates_default_workspace() {
        let fx = fixture();
        assert_eq!(fx.manager.summaries().len(), 1);
        assert_eq!(fx.manager.summaries()[0].name, "Default");
        fx.manager.flush_persistence();
        assert_eq!(fx.store.save_count(), 1);
        assert_eq!(
            fx.store.load_current_workspace_id().as_ref(),
            Some(fx.manager.current())
        );
    }

    #[test]
    fn test_switch_persists_outgoing_before_clearing() {
        let mut fx = fixture();
        let home = fx.manager.current().clone();
        let def = definition("clock");
        fx.widgets.borrow_mut().place_widget(&def, 0, &home).unwrap();
        fx.widgets.borrow_mut().place_widget(&def, 1, &home).unwrap();

        let events: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        for (topic, label) in [
            (Topic::GridCleared, "cleared"),
            (Topic::WorkspaceSwitched, "switched"),
        ] {
            let sink = events.clone();
            fx.bus.on(topic, move |_| {
                sink.borrow_mut().push(label);
                Ok(())
            });
        }

        let target = fx.manager.create_workspace(Some("Empty")).unwrap();
        assert_eq!(fx.manager.current(), &target);
        assert_eq!(*events.borrow(), vec!["cleared", "switched"]);
        assert!(fx.widgets.borrow().instances(&target).is_empty());

        fx.manager.flush_persistence();
        let stored = fx.store.workspace(&home).unwrap();
        assert_eq!(stored.widgets.len(), 2);
    }

    #[test]
    fn test_switch_to_current_is_a_noop() {
        let mut fx = fixture();
        let current = fx.manager.current().clone();
        let fired = Rc::new(std::cell::Cell::new(false));
        let sink = fired.clone();
        fx.bus.on(Topic::GridCleared, move |_| {
            sink.set(true);
            Ok(())
        });
        fx.manager.switch_workspace(&current).unwrap();
        assert!(!fired.get());
    }

    #[test]
    fn test_switch_to_missing_workspace_falls_back_to_first() {
        let mut fx = fixture();
        let first = fx.manager.current().clone();
        fx.manager.create_workspace(Some("Second")).unwrap();
        let landed = fx
            .manager
            .switch_workspace(&WorkspaceId::new("ws-gone"))
            .unwrap();
        assert_eq!(landed, first);
        assert_eq!(fx.manager.current(), &first);
    }

    #[test]
    fn test_create_workspace_auto_switches_and_defaults_name() {
        let mut fx = fixture();
        let id = fx.manager.create_workspace(None).unwrap();
        assert_eq!(fx.manager.current(), &id);
        assert_eq!(fx.manager.workspace(&id).unwrap().name, "Workspace 2");
    }

    #[test]
    fn test_last_workspace_cannot_be_deleted() {
        let mut fx = fixture();
        let err = fx.manager.delete_current_workspace(true).unwrap_err();
        assert!(matches!(err, Error::LastWorkspaceProtected));
        assert_eq!(fx.manager.summaries().len(), 1);
    }

    #[test]
    fn test_delete_requires_confirmation_when_widgets_present() {
        let mut fx = fixture();
        fx.manager.create_workspace(Some("Second")).unwrap();
        let current = fx.manager.current().clone();
        fx.widgets
            .borrow_mut()
            .place_widget(&definition("clock"), 0, &current)
            .unwrap();

        let err = fx.manager.delete_current_workspace(false).unwrap_err();
        assert!(matches!(err, Error::ConfirmationRequired { widgets: 1, .. }));
        assert_eq!(fx.manager.summaries().len(), 2);

        fx.manager.delete_current_workspace(true).unwrap();
        assert_eq!(fx.manager.summaries().len(), 1);
    }

    #[test]
    fn test_delete_switches_to_previous_neighbor() {
        let mut fx = fixture();
        let first = fx.manager.current().clone();
        let second = fx.manager.create_workspace(Some("Second")).unwrap();
        fx.manager.create_workspace(Some("Third")).unwrap();

        let landed = fx.manager.delete_current_workspace(false).unwrap();
        assert_eq!(landed, second);

        fx.manager.delete_current_workspace(false).unwrap();
        assert_eq!(fx.manager.current(), &first);
    }

    #[test]
    fn test_deleted_workspace_is_removed_from_store() {
        let mut fx = fixture();
        let first = fx.manager.current().clone();
        let second = fx.manager.create_workspace(Some("Second")).unwrap();
        fx.manager.flush_persistence();
        assert!(fx.store.workspace(&second).is_some());

        fx.manager.delete_current_workspace(false).unwrap();
        fx.manager.flush_persistence();
        assert!(fx.store.workspace(&second).is_none());
        assert_eq!(
            fx.store.load_current_workspace_id().as_ref(),
            Some(&first)
        );
    }

    #[test]
    fn test_rename_rejects_empty_and_persists_valid_names() {
        let mut fx = fixture();
        let id = fx.manager.current().clone();
        assert!(matches!(
            fx.manager.rename_workspace(&id, "   ").unwrap_err(),
            Error::InvalidName(_)
        ));

        fx.manager.rename_workspace(&id, "Lab Bench").unwrap();
        assert_eq!(fx.manager.workspace(&id).unwrap().name, "Lab Bench");
        fx.manager.flush_persistence();
        assert_eq!(fx.store.workspace(&id).unwrap().name, "Lab Bench");
    }

    #[test]
    fn test_autosave_waits_for_the_debounce_window() {
        let mut fx = fixture_with_debounce(Duration::seconds(5));
        let current = fx.manager.current().clone();
        fx.manager.flush_persistence();
        let baseline = fx.store.save_count();

        fx.widgets
            .borrow_mut()
            .place_widget(&definition("clock"), 0, &current)
            .unwrap();

        fx.manager.flush_autosave(Utc::now());
        fx.manager.flush_persistence();
        assert_eq!(fx.store.save_count(), baseline);

        fx.manager.flush_autosave(Utc::now() + Duration::seconds(6));
        fx.manager.flush_persistence();
        assert_eq!(fx.store.save_count(), baseline + 1);
        assert_eq!(fx.store.workspace(&current).unwrap().widgets.len(), 1);
    }

    #[test]
    fn test_destroy_stops_autosave_marking() {
        let mut fx = fixture_with_debounce(Duration::zero());
        let current = fx.manager.current().clone();
        fx.manager.flush_persistence();
        let baseline = fx.store.save_count();

        fx.manager.destroy();
        fx.widgets
            .borrow_mut()
            .place_widget(&definition("clock"), 0, &current)
            .unwrap();
        fx.manager.flush_autosave(Utc::now() + Duration::seconds(1));
        fx.manager.flush_persistence();
        assert_eq!(fx.store.save_count(), baseline);
    }
}
