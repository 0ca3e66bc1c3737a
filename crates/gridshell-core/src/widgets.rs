use std::collections::HashMap;
use std::rc::Rc;

use gridshell_types::{
    CellIndex, CellRect, CellSize, ConfigMap, Error, GridSpec, Result, ShellEvent, WidgetChange,
    WidgetDefinition, WidgetInstance, WidgetInstanceId, WorkspaceId,
};
use tracing::{debug, warn};

use crate::bus::EventBus;

#[derive(Default)]
struct WorkspaceWidgets {
    /// Canonical collection, in placement order.
    instances: Vec<WidgetInstance>,
    /// Derived index, maintained alongside the instance list.
    occupancy: HashMap<CellIndex, WidgetInstanceId>,
}

impl WorkspaceWidgets {
    fn claim(&mut self, rect: &CellRect, id: WidgetInstanceId, grid: &GridSpec) {
        for cell in rect.cells(grid) {
            self.occupancy.insert(cell, id);
        }
    }

    fn release(&mut self, id: WidgetInstanceId) {
        self.occupancy.retain(|_, held_by| *held_by != id);
    }
}

/// Owns per-workspace grid occupancy and widget instance CRUD.
///
/// Validation always precedes mutation: a failed operation leaves no partial
/// state behind. Every mutation emits `widgets:changed` with a delta.
pub struct WidgetManager {
    grid: GridSpec,
    bus: Rc<EventBus>,
    workspaces: HashMap<WorkspaceId, WorkspaceWidgets>,
    locations: HashMap<WidgetInstanceId, WorkspaceId>,
}

impl WidgetManager {
    pub fn new(grid: GridSpec, bus: Rc<EventBus>) -> Self {
        Self {
            grid,
            bus,
            workspaces: HashMap::new(),
            locations: HashMap::new(),
        }
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Make a workspace's persisted instances resident.
    ///
    /// Instances whose rectangle no longer fits the grid, or which collide
    /// with an earlier instance, are dropped with a warning rather than
    /// poisoning the occupancy invariant.
    pub fn load_workspace(&mut self, workspace: &WorkspaceId, instances: Vec<WidgetInstance>) {
        self.unload_workspace(workspace);
        let mut state = WorkspaceWidgets::default();
        for instance in instances {
            let rect = instance.rect();
            if !rect.fits(&self.grid) {
                warn!(workspace = %workspace, widget = %instance.id, "dropping stored widget outside grid bounds");
                continue;
            }
            if rect.cells(&self.grid).iter().any(|c| state.occupancy.contains_key(c)) {
                warn!(workspace = %workspace, widget = %instance.id, "dropping stored widget overlapping an earlier one");
                continue;
            }
            state.claim(&rect, instance.id, &self.grid);
            self.locations.insert(instance.id, workspace.clone());
            state.instances.push(instance);
        }
        self.workspaces.insert(workspace.clone(), state);
    }

    /// Drop a workspace's resident instances (workspace deletion).
    pub fn unload_workspace(&mut self, workspace: &WorkspaceId) {
        if let Some(state) = self.workspaces.remove(workspace) {
            for instance in &state.instances {
                self.locations.remove(&instance.id);
            }
        }
    }

    /// Whether a workspace's instances are currently resident.
    pub fn is_resident(&self, workspace: &WorkspaceId) -> bool {
        self.workspaces.contains_key(workspace)
    }

    /// Resident instances of a workspace, in placement order.
    pub fn instances(&self, workspace: &WorkspaceId) -> &[WidgetInstance] {
        self.workspaces
            .get(workspace)
            .map_or(&[], |state| state.instances.as_slice())
    }

    /// Current cell-to-instance mapping for a workspace.
    pub fn occupancy(&self, workspace: &WorkspaceId) -> HashMap<CellIndex, WidgetInstanceId> {
        self.workspaces
            .get(workspace)
            .map(|state| state.occupancy.clone())
            .unwrap_or_default()
    }

    /// Validate and place a new instance of `definition` at `cell`.
    pub fn place_widget(
        &mut self,
        definition: &WidgetDefinition,
        cell: CellIndex,
        workspace: &WorkspaceId,
    ) -> Result<WidgetInstance> {
        let rect = CellRect::new(cell, definition.size);
        self.validate_rect(&rect, workspace, None)?;

        let instance = WidgetInstance::from_definition(definition, cell);
        let state = self.workspaces.entry(workspace.clone()).or_default();
        state.claim(&rect, instance.id, &self.grid);
        state.instances.push(instance.clone());
        self.locations.insert(instance.id, workspace.clone());

        debug!(workspace = %workspace, widget = %instance.id, cell, "placed widget");
        self.bus.emit(&ShellEvent::WidgetsChanged {
            workspace: workspace.clone(),
            change: WidgetChange::Placed(instance.clone()),
        });
        Ok(instance)
    }

    /// Move an instance to a new anchor cell, keeping its size.
    pub fn move_widget(&mut self, id: WidgetInstanceId, new_cell: CellIndex) -> Result<()> {
        let workspace = self.workspace_of(id)?;
        let size = self.instance(&workspace, id)?.size;
        let rect = CellRect::new(new_cell, size);
        self.validate_rect(&rect, &workspace, Some(id))?;

        let state = self.workspaces.get_mut(&workspace).expect("resident workspace");
        state.release(id);
        state.claim(&rect, id, &self.grid);
        let instance = state
            .instances
            .iter_mut()
            .find(|i| i.id == id)
            .expect("instance in canonical list");
        let from = instance.cell;
        instance.cell = new_cell;

        self.bus.emit(&ShellEvent::WidgetsChanged {
            workspace,
            change: WidgetChange::Moved {
                id,
                from,
                to: new_cell,
            },
        });
        Ok(())
    }

    /// Remove an instance, freeing its occupied cells.
    pub fn remove_widget(&mut self, id: WidgetInstanceId) -> Result<()> {
        let workspace = self.workspace_of(id)?;
        let state = self.workspaces.get_mut(&workspace).expect("resident workspace");
        state.release(id);
        state.instances.retain(|i| i.id != id);
        self.locations.remove(&id);

        debug!(workspace = %workspace, widget = %id, "removed widget");
        self.bus.emit(&ShellEvent::WidgetsChanged {
            workspace,
            change: WidgetChange::Removed(id),
        });
        Ok(())
    }

    /// Merge a configuration patch into an instance's config.
    pub fn update_config(&mut self, id: WidgetInstanceId, patch: ConfigMap) -> Result<()> {
        let workspace = self.workspace_of(id)?;
        let state = self.workspaces.get_mut(&workspace).expect("resident workspace");
        let instance = state
            .instances
            .iter_mut()
            .find(|i| i.id == id)
            .expect("instance in canonical list");
        instance.apply_config_patch(patch);
        let config = instance.config.clone();

        self.bus.emit(&ShellEvent::WidgetsChanged {
            workspace,
            change: WidgetChange::Configured { id, config },
        });
        Ok(())
    }

    /// First anchor cell whose full rectangle fits and is unoccupied,
    /// scanning row-major from cell 0. Used by drawer click-to-add.
    pub fn first_free_cell(&self, workspace: &WorkspaceId, size: CellSize) -> Option<CellIndex> {
        let occupancy = self.workspaces.get(workspace).map(|s| &s.occupancy);
        (0..self.grid.cell_count()).find(|&cell| {
            let rect = CellRect::new(cell, size);
            rect.fits(&self.grid)
                && rect.cells(&self.grid).iter().all(|c| {
                    occupancy.map_or(true, |occ| !occ.contains_key(c))
                })
        })
    }

    fn workspace_of(&self, id: WidgetInstanceId) -> Result<WorkspaceId> {
        self.locations
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::InstanceNotFound(id.to_string()))
    }

    fn instance(&self, workspace: &WorkspaceId, id: WidgetInstanceId) -> Result<&WidgetInstance> {
        self.workspaces
            .get(workspace)
            .and_then(|state| state.instances.iter().find(|i| i.id == id))
            .ok_or_else(|| Error::InstanceNotFound(id.to_string()))
    }

    /// Full-rectangle validation: bounds first, then occupancy, optionally
    /// ignoring cells held by the instance being moved.
    fn validate_rect(
        &self,
        rect: &CellRect,
        workspace: &WorkspaceId,
        ignore: Option<WidgetInstanceId>,
    ) -> Result<()> {
        if !rect.fits(&self.grid) {
            return Err(Error::InvalidPlacement {
                cell: rect.cell,
                size: rect.size,
            });
        }
        if let Some(state) = self.workspaces.get(workspace) {
            for cell in rect.cells(&self.grid) {
                if let Some(&held_by) = state.occupancy.get(&cell) {
                    if Some(held_by) != ignore {
                        return Err(Error::CellOccupied { cell, held_by });
                    }
                }
            }
        }
        Ok(())
    }
}
