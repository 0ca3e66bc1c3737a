use std::fs;
use std::path::{Path, PathBuf};

use gridshell_types::{Result, Workspace, WorkspaceId};
use tracing::warn;

use super::WorkspaceStore;

/// Filesystem store: one pretty-printed JSON file per workspace under a data
/// directory, plus a `current` marker file holding the active workspace id.
///
/// Unreadable or corrupt workspace files are skipped with a warning so a bad
/// save can never keep the shell from starting.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn workspace_path(&self, id: &WorkspaceId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn current_path(&self) -> PathBuf {
        self.dir.join("current")
    }

    fn read_workspace(path: &Path) -> Option<Workspace> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), "skipping unreadable workspace file: {err}");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(workspace) => Some(workspace),
            Err(err) => {
                warn!(path = %path.display(), "skipping corrupt workspace file: {err}");
                None
            }
        }
    }
}

impl WorkspaceStore for JsonFileStore {
    fn load_workspaces(&self) -> Vec<Workspace> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut workspaces: Vec<Workspace> = entries
            .flatten()
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|e| Self::read_workspace(&e.path()))
            .collect();
        workspaces.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        workspaces
    }

    fn save_workspace(&self, workspace: &Workspace) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(workspace)?;
        fs::write(self.workspace_path(&workspace.id), content)?;
        Ok(())
    }

    fn delete_workspace(&self, id: &WorkspaceId) -> Result<()> {
        let path = self.workspace_path(id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn load_current_workspace_id(&self) -> Option<WorkspaceId> {
        let content = fs::read_to_string(self.current_path()).ok()?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(WorkspaceId::new(trimmed))
        }
    }

    fn save_current_workspace_id(&self, id: &WorkspaceId) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.current_path(), id.as_str())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(id: &str) -> Workspace {
        Workspace::new(WorkspaceId::new(id), "Test", "user-1")
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());

        let ws = workspace("ws-100");
        store.save_workspace(&ws).unwrap();
        store.save_current_workspace_id(&ws.id).unwrap();

        let loaded = store.load_workspaces();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, ws.id);
        assert_eq!(loaded[0].name, "Test");
        assert_eq!(store.load_current_workspace_id(), Some(ws.id));
    }

    #[test]
    fn test_missing_directory_loads_empty() {
        let store = JsonFileStore::new("/nonexistent/gridshell-test");
        assert!(store.load_workspaces().is_empty());
        assert_eq!(store.load_current_workspace_id(), None);
    }

    #[test]
    fn test_corrupt_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save_workspace(&workspace("ws-100")).unwrap();
        fs::write(dir.path().join("ws-200.json"), "{not json").unwrap();

        let loaded = store.load_workspaces();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id.as_str(), "ws-100");
    }

    #[test]
    fn test_workspaces_ordered_by_id() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save_workspace(&workspace("ws-300")).unwrap();
        store.save_workspace(&workspace("ws-100")).unwrap();
        store.save_workspace(&workspace("ws-200")).unwrap();

        let loaded = store.load_workspaces();
        let ids: Vec<&str> = loaded.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["ws-100", "ws-200", "ws-300"]);
    }

    #[test]
    fn test_delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let ws = workspace("ws-100");
        store.save_workspace(&ws).unwrap();
        store.delete_workspace(&ws.id).unwrap();
        assert!(store.load_workspaces().is_empty());
        // Deleting an already-missing workspace is a no-op.
        store.delete_workspace(&ws.id).unwrap();
    }
}
