mod fs;
mod persister;

pub use fs::JsonFileStore;
pub use persister::Persister;

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use gridshell_types::{Error, Result, Workspace, WorkspaceId};

/// Opaque persistence contract for workspaces and the current-workspace
/// pointer. Reads degrade gracefully: missing or corrupted data yields an
/// empty/default result, never an error.
pub trait WorkspaceStore: Send + Sync {
    /// All persisted workspaces, ordered by id (time-based ids make this
    /// creation order).
    fn load_workspaces(&self) -> Vec<Workspace>;

    fn save_workspace(&self, workspace: &Workspace) -> Result<()>;

    fn delete_workspace(&self, id: &WorkspaceId) -> Result<()>;

    fn load_current_workspace_id(&self) -> Option<WorkspaceId>;

    fn save_current_workspace_id(&self, id: &WorkspaceId) -> Result<()>;
}

/// In-memory store for tests and ephemeral shells.
#[derive(Default)]
pub struct MemoryStore {
    workspaces: Mutex<HashMap<WorkspaceId, Workspace>>,
    current: Mutex<Option<WorkspaceId>>,
    saves: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail, to exercise recovery paths.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful workspace writes.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn workspace(&self, id: &WorkspaceId) -> Option<Workspace> {
        self.workspaces.lock().unwrap().get(id).cloned()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::PersistenceUnavailable(
                "memory store writes disabled".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl WorkspaceStore for MemoryStore {
    fn load_workspaces(&self) -> Vec<Workspace> {
        let mut workspaces: Vec<Workspace> =
            self.workspaces.lock().unwrap().values().cloned().collect();
        workspaces.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        workspaces
    }

    fn save_workspace(&self, workspace: &Workspace) -> Result<()> {
        self.check_writable()?;
        self.workspaces
            .lock()
            .unwrap()
            .insert(workspace.id.clone(), workspace.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete_workspace(&self, id: &WorkspaceId) -> Result<()> {
        self.check_writable()?;
        self.workspaces.lock().unwrap().remove(id);
        Ok(())
    }

    fn load_current_workspace_id(&self) -> Option<WorkspaceId> {
        self.current.lock().unwrap().clone()
    }

    fn save_current_workspace_id(&self, id: &WorkspaceId) -> Result<()> {
        self.check_writable()?;
        *self.current.lock().unwrap() = Some(id.clone());
        Ok(())
    }
}
