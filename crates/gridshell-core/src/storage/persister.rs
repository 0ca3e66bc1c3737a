use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{Sender, SyncSender, channel, sync_channel};
use std::thread::JoinHandle;

use gridshell_types::{Workspace, WorkspaceId};
use tracing::{debug, warn};

use super::WorkspaceStore;

enum Command {
    Save {
        workspace: Workspace,
        revision: u64,
    },
    Delete(WorkspaceId),
    SaveCurrent(WorkspaceId),
    Flush(SyncSender<()>),
    Shutdown,
}

/// Fire-and-forget persistence worker.
///
/// Managers enqueue writes and never block on storage I/O. The single FIFO
/// channel preserves per-workspace write ordering; each save additionally
/// carries a monotonic revision, and the worker drops any save older than
/// one it has already applied for the same workspace, so a stale snapshot
/// can never resurrect overwritten state. Store failures are logged and
/// recovered locally: in-memory state stays authoritative for the session.
pub struct Persister {
    tx: Sender<Command>,
    handle: Option<JoinHandle<()>>,
}

impl Persister {
    pub fn spawn(store: Arc<dyn WorkspaceStore>) -> Self {
        let (tx, rx) = channel::<Command>();
        let handle = std::thread::Builder::new()
            .name("gridshell-persister".to_string())
            .spawn(move || {
                let mut applied: HashMap<WorkspaceId, u64> = HashMap::new();
                loop {
                    match rx.recv() {
                        Ok(Command::Save {
                            workspace,
                            revision,
                        }) => {
                            if applied.get(&workspace.id).is_some_and(|&r| revision <= r) {
                                debug!(workspace = %workspace.id, revision, "skipping stale save");
                                continue;
                            }
                            applied.insert(workspace.id.clone(), revision);
                            if let Err(err) = store.save_workspace(&workspace) {
                                warn!(workspace = %workspace.id, "workspace save failed: {err}");
                            }
                        }
                        Ok(Command::Delete(id)) => {
                            applied.remove(&id);
                            if let Err(err) = store.delete_workspace(&id) {
                                warn!(workspace = %id, "workspace delete failed: {err}");
                            }
                        }
                        Ok(Command::SaveCurrent(id)) => {
                            if let Err(err) = store.save_current_workspace_id(&id) {
                                warn!(workspace = %id, "current-workspace save failed: {err}");
                            }
                        }
                        Ok(Command::Flush(ack)) => {
                            let _ = ack.send(());
                        }
                        Ok(Command::Shutdown) | Err(_) => break,
                    }
                }
            })
            .expect("spawn persister thread");

        Self {
            tx,
            handle: Some(handle),
        }
    }

    pub fn save(&self, workspace: Workspace, revision: u64) {
        self.send(Command::Save {
            workspace,
            revision,
        });
    }

    pub fn delete(&self, id: WorkspaceId) {
        self.send(Command::Delete(id));
    }

    pub fn save_current(&self, id: WorkspaceId) {
        self.send(Command::SaveCurrent(id));
    }

    /// Wait until every previously enqueued write has been applied.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = sync_channel(1);
        if self.tx.send(Command::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            warn!("persister worker is gone; dropping write");
        }
    }
}

impl Drop for Persister {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
