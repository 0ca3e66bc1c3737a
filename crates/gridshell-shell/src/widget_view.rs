use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gridshell_core::{EventBus, HandlerId, WidgetManager};
use gridshell_types::{
    AppInstanceId, Catalog, CellIndex, CellSize, Error, GestureAction, HeaderPolicy, Result,
    ShellEvent, Topic, WidgetChange, WidgetInstance, WidgetInstanceId,
};
use tracing::debug;

use crate::apps::AppUiController;

/// Representation chosen for a rendered widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetChrome {
    /// Single-cell app shortcut.
    Launcher,
    /// One-row widget without decorations.
    Minimal,
    /// Multi-row widget with full chrome.
    Full,
}

/// Content state overlay, independent of grid occupancy and lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetState {
    #[default]
    Active,
    Loading,
    Error,
    Inactive,
}

/// User gesture on a rendered widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Tap,
    DoubleTap,
    LongPress,
}

/// Render model for one widget instance; the headless stand-in for a DOM
/// node. One entry per instance id, replaced wholesale on re-render.
#[derive(Debug, Clone)]
pub struct WidgetView {
    pub instance_id: WidgetInstanceId,
    pub definition_id: String,
    pub kind: String,
    pub cell: CellIndex,
    pub size: CellSize,
    pub chrome: WidgetChrome,
    pub show_header: bool,
    pub state: WidgetState,
}

/// Renders widget instances into grid cells and dispatches gestures.
///
/// Keeps itself current by subscribing to the widget deltas, grid clears
/// and workspace switches published on the bus; the subscriptions touch
/// only the view map, never a manager.
pub struct WidgetUiController {
    bus: Rc<EventBus>,
    catalog: Rc<Catalog>,
    widgets: Rc<RefCell<WidgetManager>>,
    apps: Rc<RefCell<AppUiController>>,
    views: Rc<RefCell<HashMap<WidgetInstanceId, WidgetView>>>,
    subscriptions: Vec<(Topic, HandlerId)>,
}

impl WidgetUiController {
    pub fn new(
        bus: Rc<EventBus>,
        catalog: Rc<Catalog>,
        widgets: Rc<RefCell<WidgetManager>>,
        apps: Rc<RefCell<AppUiController>>,
    ) -> Self {
        let views: Rc<RefCell<HashMap<WidgetInstanceId, WidgetView>>> = Rc::default();
        let mut subscriptions = Vec::new();

        let sink = views.clone();
        let defs = catalog.clone();
        subscriptions.push((
            Topic::WidgetsChanged,
            bus.on(Topic::WidgetsChanged, move |event| {
                if let ShellEvent::WidgetsChanged { change, .. } = event {
                    apply_change(&mut sink.borrow_mut(), &defs, change);
                }
                Ok(())
            }),
        ));

        let sink = views.clone();
        subscriptions.push((
            Topic::GridCleared,
            bus.on(Topic::GridCleared, move |_| {
                sink.borrow_mut().clear();
                Ok(())
            }),
        ));

        let sink = views.clone();
        let defs = catalog.clone();
        subscriptions.push((
            Topic::WorkspaceSwitched,
            bus.on(Topic::WorkspaceSwitched, move |event| {
                if let ShellEvent::WorkspaceSwitched { widgets, .. } = event {
                    let mut views = sink.borrow_mut();
                    views.clear();
                    for instance in widgets {
                        views.insert(instance.id, build_view(&defs, instance));
                    }
                }
                Ok(())
            }),
        ));

        Self {
            bus,
            catalog,
            widgets,
            apps,
            views,
            subscriptions,
        }
    }

    /// Render (or re-render) one instance. The stale entry for the same id,
    /// if any, is replaced rather than duplicated.
    pub fn render_instance(&self, instance: &WidgetInstance) {
        self.views
            .borrow_mut()
            .insert(instance.id, build_view(&self.catalog, instance));
    }

    pub fn view(&self, id: WidgetInstanceId) -> Option<WidgetView> {
        self.views.borrow().get(&id).cloned()
    }

    /// All current views, ordered by anchor cell.
    pub fn views(&self) -> Vec<WidgetView> {
        let mut views: Vec<WidgetView> = self.views.borrow().values().cloned().collect();
        views.sort_by_key(|v| v.cell);
        views
    }

    pub fn view_count(&self) -> usize {
        self.views.borrow().len()
    }

    /// Set the content-state overlay without touching layout or occupancy.
    pub fn set_widget_state(&self, id: WidgetInstanceId, state: WidgetState) -> Result<()> {
        let mut views = self.views.borrow_mut();
        let view = views
            .get_mut(&id)
            .ok_or_else(|| Error::InstanceNotFound(id.to_string()))?;
        view.state = state;
        Ok(())
    }

    /// Dispatch a user gesture to its bound action. Returns the app
    /// instance id when the gesture launched an app.
    pub fn handle_gesture(
        &self,
        id: WidgetInstanceId,
        gesture: Gesture,
    ) -> Result<Option<AppInstanceId>> {
        let definition_id = {
            let views = self.views.borrow();
            views
                .get(&id)
                .map(|v| v.definition_id.clone())
                .ok_or_else(|| Error::InstanceNotFound(id.to_string()))?
        };
        let definition = self
            .catalog
            .widget(&definition_id)
            .ok_or_else(|| Error::DefinitionNotFound(definition_id.clone()))?;

        let action = match gesture {
            Gesture::Tap => definition
                .app_id
                .clone()
                .map(GestureAction::OpenApp)
                .unwrap_or_default(),
            Gesture::DoubleTap => definition.gestures.double_tap.clone(),
            Gesture::LongPress => definition.gestures.long_press.clone(),
        };
        debug!(widget = %id, ?gesture, ?action, "dispatching widget gesture");

        match action {
            GestureAction::None => Ok(None),
            GestureAction::OpenApp(app_id) => {
                let instance = self.apps.borrow_mut().open_app(&app_id, None, Some(id))?;
                Ok(Some(instance))
            }
            GestureAction::RemoveWidget => {
                self.widgets.borrow_mut().remove_widget(id)?;
                Ok(None)
            }
        }
    }

    /// Unregister every bus subscription.
    pub fn destroy(&mut self) {
        for (topic, id) in self.subscriptions.drain(..) {
            self.bus.off(topic, id);
        }
    }
}

fn apply_change(
    views: &mut HashMap<WidgetInstanceId, WidgetView>,
    catalog: &Catalog,
    change: &WidgetChange,
) {
    match change {
        WidgetChange::Placed(instance) => {
            views.insert(instance.id, build_view(catalog, instance));
        }
        WidgetChange::Moved { id, to, .. } => {
            if let Some(view) = views.get_mut(id) {
                view.cell = *to;
            }
        }
        WidgetChange::Removed(id) => {
            views.remove(id);
        }
        // Config is opaque to the layout; content re-reads it on its own.
        WidgetChange::Configured { .. } => {}
    }
}

/// Build the render model for an instance: chrome by size and app binding,
/// header by policy (`Auto` shows one for anything taller than a row).
fn build_view(catalog: &Catalog, instance: &WidgetInstance) -> WidgetView {
    let definition = catalog.widget(&instance.definition_id);
    let bound_to_app = definition.is_some_and(|d| d.app_id.is_some());
    let chrome = if instance.size.area() == 1 && bound_to_app {
        WidgetChrome::Launcher
    } else if instance.size.height == 1 {
        WidgetChrome::Minimal
    } else {
        WidgetChrome::Full
    };
    let policy = definition.map(|d| d.header).unwrap_or_default();
    let show_header = match policy {
        HeaderPolicy::Always => true,
        HeaderPolicy::Never | HeaderPolicy::Hover => false,
        HeaderPolicy::Auto => instance.size.height > 1,
    };
    WidgetView {
        instance_id: instance.id,
        definition_id: instance.definition_id.clone(),
        kind: instance.kind.clone(),
        cell: instance.cell,
        size: instance.size,
        chrome,
        show_header,
        state: WidgetState::default(),
    }
}
