use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gridshell_core::{
    DrawerManager, EventBus, JsonFileStore, WidgetManager, WorkspaceManager, WorkspaceStore,
};
use gridshell_types::{
    AppInstance, AppInstanceId, Catalog, CellIndex, ConfigMap, DrawerTab, GlobalUiState, Result,
    WidgetDefinition, WidgetInstance, WidgetInstanceId, WorkspaceId, WorkspaceSummary,
};
use tracing::info;

use crate::apps::AppUiController;
use crate::config::ShellConfig;
use crate::widget_view::{Gesture, WidgetState, WidgetUiController, WidgetView};

/// The assembled shell: one bus, one store, every manager and controller
/// wired together. The host embedding the shell drives it exclusively
/// through this type.
///
/// Single-threaded by construction; only the persistence worker runs on its
/// own thread, behind the workspace manager.
pub struct ShellContext {
    bus: Rc<EventBus>,
    catalog: Rc<Catalog>,
    widgets: Rc<RefCell<WidgetManager>>,
    workspaces: Rc<RefCell<WorkspaceManager>>,
    drawer: RefCell<DrawerManager>,
    apps: Rc<RefCell<AppUiController>>,
    widget_ui: RefCell<WidgetUiController>,
}

impl ShellContext {
    /// Wire the shell against an explicit store. Subscribers are registered
    /// before the initial `workspace:switched` announcement so every
    /// renderer sees the restored state.
    pub fn new(config: &ShellConfig, catalog: Catalog, store: Arc<dyn WorkspaceStore>) -> Self {
        let bus = Rc::new(EventBus::new());
        let catalog = Rc::new(catalog);

        let widgets = Rc::new(RefCell::new(WidgetManager::new(config.grid(), bus.clone())));
        let workspaces = Rc::new(RefCell::new(WorkspaceManager::new(
            bus.clone(),
            store,
            widgets.clone(),
            config.user_id.clone(),
            &config.default_workspace_name,
            config.autosave_debounce(),
        )));
        let drawer = RefCell::new(DrawerManager::new(
            bus.clone(),
            catalog.clone(),
            widgets.clone(),
            workspaces.clone(),
        ));
        let apps = Rc::new(RefCell::new(AppUiController::new(
            bus.clone(),
            catalog.clone(),
        )));
        let widget_ui = RefCell::new(WidgetUiController::new(
            bus.clone(),
            catalog.clone(),
            widgets.clone(),
            apps.clone(),
        ));

        info!(
            grid = %format!("{}x{}", config.grid_rows, config.grid_cols),
            widgets = catalog.widgets.len(),
            apps = catalog.apps.len(),
            "shell context assembled"
        );
        workspaces.borrow().announce_current();

        Self {
            bus,
            catalog,
            widgets,
            workspaces,
            drawer,
            apps,
            widget_ui,
        }
    }

    /// Wire the shell against the on-disk JSON store resolved from `config`.
    pub fn open(config: &ShellConfig, catalog: Catalog) -> Result<Self> {
        let store = JsonFileStore::new(config.workspaces_dir()?);
        Ok(Self::new(config, catalog, Arc::new(store)))
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ---- widgets ----

    pub fn add_widget(&self, definition_id: &str, cell: CellIndex) -> Result<WidgetInstance> {
        let definition = self
            .catalog
            .widget(definition_id)
            .ok_or_else(|| {
                gridshell_types::Error::DefinitionNotFound(definition_id.to_string())
            })?
            .clone();
        let workspace = self.workspaces.borrow().current().clone();
        self.widgets
            .borrow_mut()
            .place_widget(&definition, cell, &workspace)
    }

    pub fn move_widget(&self, id: WidgetInstanceId, cell: CellIndex) -> Result<()> {
        self.widgets.borrow_mut().move_widget(id, cell)
    }

    pub fn remove_widget(&self, id: WidgetInstanceId) -> Result<()> {
        self.widgets.borrow_mut().remove_widget(id)
    }

    pub fn update_widget_config(&self, id: WidgetInstanceId, patch: ConfigMap) -> Result<()> {
        self.widgets.borrow_mut().update_config(id, patch)
    }

    /// Live instances on the current workspace.
    pub fn current_widgets(&self) -> Vec<WidgetInstance> {
        let workspace = self.workspaces.borrow().current().clone();
        self.widgets.borrow().instances(&workspace).to_vec()
    }

    // ---- workspaces ----

    pub fn current_workspace(&self) -> WorkspaceId {
        self.workspaces.borrow().current().clone()
    }

    pub fn workspace_summaries(&self) -> Vec<WorkspaceSummary> {
        self.workspaces.borrow().summaries()
    }

    pub fn switch_workspace(&self, target: &WorkspaceId) -> Result<WorkspaceId> {
        self.workspaces.borrow_mut().switch_workspace(target)
    }

    pub fn create_workspace(&self, name: Option<&str>) -> Result<WorkspaceId> {
        self.workspaces.borrow_mut().create_workspace(name)
    }

    pub fn rename_workspace(&self, id: &WorkspaceId, new_name: &str) -> Result<()> {
        self.workspaces.borrow_mut().rename_workspace(id, new_name)
    }

    pub fn delete_current_workspace(&self, confirmed: bool) -> Result<WorkspaceId> {
        self.workspaces
            .borrow_mut()
            .delete_current_workspace(confirmed)
    }

    // ---- drawer ----

    pub fn toggle_drawer(&self) {
        self.drawer.borrow_mut().toggle();
    }

    pub fn close_drawer(&self) {
        self.drawer.borrow_mut().close();
    }

    pub fn drawer_is_open(&self) -> bool {
        self.drawer.borrow().is_open()
    }

    pub fn switch_drawer_tab(&self, tab: &str) -> Result<DrawerTab> {
        self.drawer.borrow_mut().switch_tab(tab)
    }

    pub fn drawer_drag_start(&self, definition_id: &str) -> Result<()> {
        self.drawer.borrow_mut().drag_start(definition_id)
    }

    pub fn drawer_drag_end(&self) {
        self.drawer.borrow_mut().drag_end();
    }

    /// Definition mid-drag from the drawer, for hover-target validation.
    pub fn drawer_dragging(&self) -> Option<WidgetDefinition> {
        self.drawer.borrow().dragging().cloned()
    }

    /// Click-to-add from the drawer; `None` when the grid has no room.
    pub fn add_from_catalog(&self, definition_id: &str) -> Result<Option<WidgetInstance>> {
        self.drawer.borrow_mut().add_from_catalog(definition_id)
    }

    // ---- apps ----

    pub fn open_app(&self, app_id: &str, settings: Option<ConfigMap>) -> Result<AppInstanceId> {
        self.apps.borrow_mut().open_app(app_id, settings, None)
    }

    pub fn close_app(&self, id: AppInstanceId) {
        self.apps.borrow_mut().close_app(id);
    }

    pub fn minimize_app(&self, id: AppInstanceId) -> Result<()> {
        self.apps.borrow_mut().minimize_app(id)
    }

    pub fn restore_app(&self, id: AppInstanceId) -> Result<()> {
        self.apps.borrow_mut().restore_app(id)
    }

    pub fn bring_to_front(&self, id: AppInstanceId) -> Result<()> {
        self.apps.borrow_mut().bring_to_front(id)
    }

    pub fn animation_complete(&self, id: AppInstanceId) {
        self.apps.borrow_mut().animation_complete(id);
    }

    pub fn app_instance(&self, id: AppInstanceId) -> Option<AppInstance> {
        self.apps.borrow().instance(id).cloned()
    }

    /// Open app windows in stacking order, bottom first.
    pub fn stacking_order(&self) -> Vec<AppInstance> {
        self.apps.borrow().stacking_order().into_iter().cloned().collect()
    }

    pub fn global_ui(&self) -> GlobalUiState {
        self.apps.borrow().global_ui()
    }

    // ---- widget rendering ----

    pub fn widget_view(&self, id: WidgetInstanceId) -> Option<WidgetView> {
        self.widget_ui.borrow().view(id)
    }

    pub fn widget_views(&self) -> Vec<WidgetView> {
        self.widget_ui.borrow().views()
    }

    pub fn set_widget_state(&self, id: WidgetInstanceId, state: WidgetState) -> Result<()> {
        self.widget_ui.borrow().set_widget_state(id, state)
    }

    pub fn handle_gesture(
        &self,
        id: WidgetInstanceId,
        gesture: Gesture,
    ) -> Result<Option<AppInstanceId>> {
        self.widget_ui.borrow().handle_gesture(id, gesture)
    }

    // ---- lifecycle ----

    /// Periodic tick from the host; flushes autosaves whose debounce window
    /// has elapsed.
    pub fn tick(&self, now: DateTime<Utc>) {
        self.workspaces.borrow_mut().flush_autosave(now);
    }

    /// Block until every queued write has been applied by the persistence
    /// worker.
    pub fn flush_persistence(&self) {
        self.workspaces.borrow().flush_persistence();
    }

    /// Tear down the shell: unsubscribe the controllers, persist anything
    /// still dirty, drain the write queue.
    pub fn destroy(&self) {
        self.widget_ui.borrow_mut().destroy();
        self.workspaces.borrow_mut().shutdown();
        info!("shell context destroyed");
    }
}
