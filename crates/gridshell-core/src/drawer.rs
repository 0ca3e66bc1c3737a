use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use gridshell_types::{
    AppDefinition, Catalog, DrawerTab, Error, Result, ShellEvent, WidgetDefinition, WidgetInstance,
};
use tracing::debug;

use crate::bus::EventBus;
use crate::widgets::WidgetManager;
use crate::workspaces::WorkspaceManager;

/// Tabbed catalog browser from which widgets and apps reach the desktop.
///
/// Owns drawer visibility, the active tab, and the drag-in-progress
/// definition. Placement itself goes through `WidgetManager` like any other
/// user gesture.
pub struct DrawerManager {
    bus: Rc<EventBus>,
    catalog: Rc<Catalog>,
    widgets: Rc<RefCell<WidgetManager>>,
    workspaces: Rc<RefCell<WorkspaceManager>>,
    visible: bool,
    tab: DrawerTab,
    dragging: Option<WidgetDefinition>,
}

impl DrawerManager {
    pub fn new(
        bus: Rc<EventBus>,
        catalog: Rc<Catalog>,
        widgets: Rc<RefCell<WidgetManager>>,
        workspaces: Rc<RefCell<WorkspaceManager>>,
    ) -> Self {
        Self {
            bus,
            catalog,
            widgets,
            workspaces,
            visible: false,
            tab: DrawerTab::Widgets,
            dragging: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.visible
    }

    pub fn tab(&self) -> DrawerTab {
        self.tab
    }

    pub fn open(&mut self) {
        if !self.visible {
            self.visible = true;
            self.bus.emit(&ShellEvent::DrawerOpened);
        }
    }

    pub fn close(&mut self) {
        if self.visible {
            self.visible = false;
            self.bus.emit(&ShellEvent::DrawerClosed);
        }
    }

    pub fn toggle(&mut self) {
        if self.visible {
            self.close();
        } else {
            self.open();
        }
    }

    /// Select a tab by wire name. Unknown names are rejected.
    pub fn switch_tab(&mut self, tab: &str) -> Result<DrawerTab> {
        let tab: DrawerTab = tab.parse()?;
        self.tab = tab;
        self.bus.emit(&ShellEvent::DrawerTabChanged { tab });
        Ok(tab)
    }

    /// Widget definitions grouped by category, for the widgets tab.
    pub fn widget_groups(&self) -> BTreeMap<&str, Vec<&WidgetDefinition>> {
        self.catalog.widgets_by_category()
    }

    /// App definitions grouped by category, for the apps tab.
    pub fn app_groups(&self) -> BTreeMap<&str, Vec<&AppDefinition>> {
        self.catalog.apps_by_category()
    }

    /// Begin dragging a catalog item onto the grid.
    pub fn drag_start(&mut self, definition_id: &str) -> Result<()> {
        let definition = self
            .catalog
            .widget(definition_id)
            .ok_or_else(|| Error::DefinitionNotFound(definition_id.to_string()))?
            .clone();
        self.dragging = Some(definition.clone());
        self.bus.emit(&ShellEvent::DrawerDragStart { definition });
        Ok(())
    }

    /// End the drag, whether or not it was dropped.
    pub fn drag_end(&mut self) {
        if self.dragging.take().is_some() {
            self.bus.emit(&ShellEvent::DrawerDragEnd);
        }
    }

    /// Definition currently being dragged, for hover-target validation.
    pub fn dragging(&self) -> Option<&WidgetDefinition> {
        self.dragging.as_ref()
    }

    /// Click-to-add: drop the definition onto the first free cell that fits
    /// (row-major scan from cell 0) and auto-close the drawer.
    ///
    /// Returns `None` without an error when no cell fits; the drawer stays
    /// open and nothing is placed.
    pub fn add_from_catalog(&mut self, definition_id: &str) -> Result<Option<WidgetInstance>> {
        let definition = self
            .catalog
            .widget(definition_id)
            .ok_or_else(|| Error::DefinitionNotFound(definition_id.to_string()))?
            .clone();
        let workspace = self.workspaces.borrow().current().clone();

        let target = self
            .widgets
            .borrow()
            .first_free_cell(&workspace, definition.size);
        let Some(cell) = target else {
            debug!(definition = definition_id, "no free cell fits; keeping drawer open");
            return Ok(None);
        };

        let instance = self
            .widgets
            .borrow_mut()
            .place_widget(&definition, cell, &workspace)?;
        self.close();
        Ok(Some(instance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, WorkspaceStore};
    use chrono::Duration;
    use gridshell_types::{CellSize, ConfigMap, GridSpec, Topic};
    use std::sync::Arc;

    fn definition(id: &str, width: usize, height: usize) -> WidgetDefinition {
        WidgetDefinition {
            id: id.to_string(),
            kind: id.to_string(),
            name: id.to_string(),
            icon: String::new(),
            category: "test".to_string(),
            size: CellSize::new(width, height),
            description: String::new(),
            default_config: ConfigMap::new(),
            app_id: None,
            header: Default::default(),
            gestures: Default::default(),
        }
    }

    struct Fixture {
        bus: Rc<EventBus>,
        widgets: Rc<RefCell<WidgetManager>>,
        workspaces: Rc<RefCell<WorkspaceManager>>,
        drawer: DrawerManager,
    }

    fn drawer_with_grid(grid: GridSpec) -> Fixture {
        let bus = Rc::new(EventBus::new());
        let store = Arc::new(MemoryStore::new());
        let widgets = Rc::new(RefCell::new(WidgetManager::new(grid, bus.clone())));
        let workspaces = Rc::new(RefCell::new(WorkspaceManager::new(
            bus.clone(),
            store as Arc<dyn WorkspaceStore>,
            widgets.clone(),
            "user-1",
            "Default",
            Duration::zero(),
        )));
        let catalog = Rc::new(Catalog::new(
            vec![definition("clock", 1, 1), definition("planner", 2, 2)],
            vec![],
        ));
        let drawer = DrawerManager::new(
            bus.clone(),
            catalog,
            widgets.clone(),
            workspaces.clone(),
        );
        Fixture {
            bus,
            widgets,
            workspaces,
            drawer,
        }
    }

    #[test]
    fn test_toggle_emits_transitions_only() {
        let mut fx = drawer_with_grid(GridSpec::default());
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        for (topic, label) in [
            (Topic::DrawerOpened, "opened"),
            (Topic::DrawerClosed, "closed"),
        ] {
            let sink = log.clone();
            fx.bus.on(topic, move |_| {
                sink.borrow_mut().push(label);
                Ok(())
            });
        }

        fx.drawer.open();
        fx.drawer.open();
        fx.drawer.toggle();
        assert!(!fx.drawer.is_open());
        assert_eq!(*log.borrow(), vec!["opened", "closed"]);
    }

    #[test]
    fn test_unknown_tab_is_rejected() {
        let mut fx = drawer_with_grid(GridSpec::default());
        assert!(matches!(
            fx.drawer.switch_tab("settings").unwrap_err(),
            Error::UnknownTab(_)
        ));
        assert_eq!(fx.drawer.tab(), DrawerTab::Widgets);
        assert_eq!(fx.drawer.switch_tab("apps").unwrap(), DrawerTab::Apps);
        assert_eq!(fx.drawer.tab(), DrawerTab::Apps);
    }

    #[test]
    fn test_drag_lifecycle_is_queryable() {
        let mut fx = drawer_with_grid(GridSpec::default());
        let ends = Rc::new(std::cell::Cell::new(0u32));
        let sink = ends.clone();
        fx.bus.on(Topic::DrawerDragEnd, move |_| {
            sink.set(sink.get() + 1);
            Ok(())
        });

        assert!(fx.drawer.dragging().is_none());
        fx.drawer.drag_start("clock").unwrap();
        assert_eq!(fx.drawer.dragging().unwrap().id, "clock");
        fx.drawer.drag_end();
        assert!(fx.drawer.dragging().is_none());
        // A second drag_end without a drag in progress emits nothing.
        fx.drawer.drag_end();
        assert_eq!(ends.get(), 1);
    }

    #[test]
    fn test_drag_start_rejects_unknown_definition() {
        let mut fx = drawer_with_grid(GridSpec::default());
        assert!(matches!(
            fx.drawer.drag_start("missing").unwrap_err(),
            Error::DefinitionNotFound(_)
        ));
    }

    #[test]
    fn test_click_to_add_places_first_fit_and_closes() {
        let mut fx = drawer_with_grid(GridSpec::default());
        fx.drawer.open();

        let placed = fx.drawer.add_from_catalog("clock").unwrap().unwrap();
        assert_eq!(placed.cell, 0);
        assert!(!fx.drawer.is_open());

        fx.drawer.open();
        // Cell 0 is taken; the 2x2 fits starting at cell 1.
        let planner = fx.drawer.add_from_catalog("planner").unwrap().unwrap();
        assert_eq!(planner.cell, 1);

        let workspace = fx.workspaces.borrow().current().clone();
        assert_eq!(fx.widgets.borrow().occupancy(&workspace).len(), 5);
    }

    #[test]
    fn test_click_to_add_fails_silently_when_nothing_fits() {
        let mut fx = drawer_with_grid(GridSpec::new(1, 1));
        fx.drawer.open();
        fx.drawer.add_from_catalog("clock").unwrap().unwrap();
        fx.drawer.open();

        // The grid is full; the drawer stays open, nothing is placed.
        assert!(fx.drawer.add_from_catalog("clock").unwrap().is_none());
        assert!(fx.drawer.is_open());
    }
}
