use std::collections::HashMap;
use std::rc::Rc;

use gridshell_core::EventBus;
use gridshell_types::{
    Animation, AppInstance, AppInstanceId, AppLifecycle, Catalog, ConfigMap, DisplayMode, Error,
    GlobalUiState, Result, ShellEvent, WidgetInstanceId,
};
use tracing::{debug, info};

/// Window manager for app instances: lifecycle, z-order and the global-UI
/// suppression derived from open windows.
///
/// Owns the open-instances map and the z-index counter exclusively. App
/// instances are never persisted.
pub struct AppUiController {
    bus: Rc<EventBus>,
    catalog: Rc<Catalog>,
    open: HashMap<AppInstanceId, AppInstance>,
    z_counter: u64,
    active: Option<AppInstanceId>,
    global_ui: GlobalUiState,
}

impl AppUiController {
    pub fn new(bus: Rc<EventBus>, catalog: Rc<Catalog>) -> Self {
        Self {
            bus,
            catalog,
            open: HashMap::new(),
            z_counter: 0,
            active: None,
            global_ui: GlobalUiState::default(),
        }
    }

    /// Open an app, or focus the live instance of a single-instance app.
    ///
    /// Settings are merged over the definition defaults. The new window is
    /// created in `Opening` and becomes `Open` when the host reports the
    /// open animation finished; it is interactive either way.
    pub fn open_app(
        &mut self,
        app_id: &str,
        settings: Option<ConfigMap>,
        source_widget: Option<WidgetInstanceId>,
    ) -> Result<AppInstanceId> {
        let definition = self
            .catalog
            .app(app_id)
            .ok_or_else(|| Error::DefinitionNotFound(app_id.to_string()))?
            .clone();

        if definition.single_instance {
            if let Some(existing) = self.instance_for_app(app_id).map(|i| i.id) {
                debug!(app = app_id, instance = %existing, "single-instance app already open; focusing");
                // The live window may be minimized; un-hide it before focus
                // so the active window is always on screen.
                self.restore_app(existing)?;
                return Ok(existing);
            }
        }

        self.z_counter += 1;
        let instance = AppInstance {
            id: AppInstanceId::generate(),
            app_id: definition.id.clone(),
            display_mode: definition.display_mode,
            lifecycle: AppLifecycle::Opening,
            z_index: self.z_counter,
            is_active: true,
            source_widget,
            animation: select_animation(definition.display_mode, source_widget.is_some()),
            settings: merge_settings(&definition.default_settings, settings),
        };
        let id = instance.id;
        for other in self.open.values_mut() {
            other.is_active = false;
        }
        self.active = Some(id);
        self.open.insert(id, instance.clone());
        self.recompute_global_ui();

        info!(app = app_id, instance = %id, mode = ?instance.display_mode, "opened app");
        self.bus.emit(&ShellEvent::AppOpened { instance });
        Ok(id)
    }

    /// Close a window. Idempotent: closing an unknown or already-closed
    /// instance is a no-op.
    pub fn close_app(&mut self, id: AppInstanceId) {
        let Some(mut instance) = self.open.remove(&id) else {
            return;
        };
        instance.lifecycle = AppLifecycle::Closing;
        instance.is_active = false;
        if self.active == Some(id) {
            self.active = None;
        }
        self.recompute_global_ui();

        info!(app = %instance.app_id, instance = %id, "closed app");
        self.bus.emit(&ShellEvent::AppClosed { instance });
    }

    /// Hide a window without closing it.
    pub fn minimize_app(&mut self, id: AppInstanceId) -> Result<()> {
        let instance = self
            .open
            .get_mut(&id)
            .ok_or_else(|| Error::InstanceNotFound(id.to_string()))?;
        if instance.lifecycle == AppLifecycle::Minimized {
            return Ok(());
        }
        instance.lifecycle = AppLifecycle::Minimized;
        instance.is_active = false;
        if self.active == Some(id) {
            self.active = None;
        }
        self.recompute_global_ui();
        Ok(())
    }

    /// Bring a minimized window back and focus it.
    pub fn restore_app(&mut self, id: AppInstanceId) -> Result<()> {
        let instance = self
            .open
            .get_mut(&id)
            .ok_or_else(|| Error::InstanceNotFound(id.to_string()))?;
        if instance.lifecycle == AppLifecycle::Minimized {
            instance.lifecycle = AppLifecycle::Open;
        }
        self.recompute_global_ui();
        self.bring_to_front(id)
    }

    /// Focus a window: strictly greater z-index than every open window,
    /// exclusive active flag, `app:focused`.
    pub fn bring_to_front(&mut self, id: AppInstanceId) -> Result<()> {
        if !self.open.contains_key(&id) {
            return Err(Error::InstanceNotFound(id.to_string()));
        }
        self.z_counter += 1;
        for (other_id, other) in self.open.iter_mut() {
            other.is_active = *other_id == id;
            if *other_id == id {
                other.z_index = self.z_counter;
            }
        }
        self.active = Some(id);
        self.bus.emit(&ShellEvent::AppFocused { id });
        Ok(())
    }

    /// Host callback once an open animation finished; gates `Opening`.
    /// Stale ids (already closed) are ignored.
    pub fn animation_complete(&mut self, id: AppInstanceId) {
        if let Some(instance) = self.open.get_mut(&id) {
            if instance.lifecycle == AppLifecycle::Opening {
                instance.lifecycle = AppLifecycle::Open;
            }
        }
    }

    pub fn instance(&self, id: AppInstanceId) -> Option<&AppInstance> {
        self.open.get(&id)
    }

    /// Live instance of an app definition, if any.
    pub fn instance_for_app(&self, app_id: &str) -> Option<&AppInstance> {
        self.open.values().find(|i| i.app_id == app_id)
    }

    /// Open windows in stacking order, bottom first.
    pub fn stacking_order(&self) -> Vec<&AppInstance> {
        let mut instances: Vec<&AppInstance> = self.open.values().collect();
        instances.sort_by_key(|i| i.z_index);
        instances
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn active(&self) -> Option<AppInstanceId> {
        self.active
    }

    pub fn global_ui(&self) -> GlobalUiState {
        self.global_ui
    }

    /// Recompute chrome visibility from every window currently on screen,
    /// never toggle it. Minimized windows do not suppress anything.
    fn recompute_global_ui(&mut self) {
        self.global_ui = GlobalUiState::from_modes(
            self.open
                .values()
                .filter(|i| i.lifecycle != AppLifecycle::Minimized)
                .map(|i| &i.display_mode),
        );
    }
}

/// Definition defaults overlaid with caller overrides, last write wins.
fn merge_settings(defaults: &ConfigMap, overrides: Option<ConfigMap>) -> ConfigMap {
    let mut merged = defaults.clone();
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            merged.insert(key, value);
        }
    }
    merged
}

/// Animation class for a newly opened window. Launching from a widget wins;
/// otherwise fullscreen windows slide in and overlay windows fade.
fn select_animation(mode: DisplayMode, from_widget: bool) -> Animation {
    if from_widget {
        return Animation::ExpandFromWidget;
    }
    match mode {
        DisplayMode::Fullscreen | DisplayMode::FullscreenNoNav => Animation::SlideLeft,
        DisplayMode::FullscreenNoDock => Animation::SlideRight,
        DisplayMode::Popup | DisplayMode::Modal | DisplayMode::Embedded => Animation::Fade,
    }
}
