use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ConfigMap;
use crate::widget::WidgetInstanceId;

/// Unique identifier of a live app window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppInstanceId(Uuid);

impl AppInstanceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AppInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Global UI chrome element an app window may suppress while open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiElement {
    Dock,
    MenuBar,
    SideNav,
}

/// Chrome/layout policy applied to an open app window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Takes the whole screen; dock, menu bar and side navigation hide.
    Fullscreen,
    /// Full screen, but the dock stays visible.
    FullscreenNoNav,
    /// Full screen, but menu bar and side navigation stay visible.
    FullscreenNoDock,
    /// Overlay chrome over the desktop; nothing is suppressed.
    #[default]
    Popup,
    /// Blocking overlay chrome; nothing is suppressed.
    Modal,
    /// Rendered inline without window chrome.
    Embedded,
}

impl DisplayMode {
    /// Global UI elements this mode asks to hide while an instance is open.
    pub fn suppressed(&self) -> &'static [UiElement] {
        match self {
            DisplayMode::Fullscreen => {
                &[UiElement::Dock, UiElement::MenuBar, UiElement::SideNav]
            }
            DisplayMode::FullscreenNoNav => &[UiElement::MenuBar, UiElement::SideNav],
            DisplayMode::FullscreenNoDock => &[UiElement::Dock],
            DisplayMode::Popup | DisplayMode::Modal | DisplayMode::Embedded => &[],
        }
    }
}

/// Per-instance window lifecycle. `Opening` holds until the host reports
/// the open animation finished. `Closing` is terminal: the snapshot
/// carrying it in `app:closed` is the last word on the instance, and the
/// host plays the close animation on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppLifecycle {
    Opening,
    Open,
    Minimized,
    Closing,
}

/// Open/close animation class applied by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Animation {
    Fade,
    SlideLeft,
    SlideRight,
    ExpandFromWidget,
}

/// A live, open occurrence of an application window.
///
/// Owned by the app controller for its whole life; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInstance {
    pub id: AppInstanceId,
    pub app_id: String,
    pub display_mode: DisplayMode,
    pub lifecycle: AppLifecycle,
    pub z_index: u64,
    pub is_active: bool,
    /// Widget the window expands from, when launched from one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_widget: Option<WidgetInstanceId>,
    pub animation: Animation,
    /// Definition defaults merged with caller overrides at open time.
    #[serde(default)]
    pub settings: ConfigMap,
}

/// Visibility of the global chrome, derived from the open window set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlobalUiState {
    pub dock_suppressed: bool,
    pub menu_bar_suppressed: bool,
    pub side_nav_suppressed: bool,
}

impl GlobalUiState {
    /// Recompute from the display modes of every window currently on screen.
    pub fn from_modes<'a>(modes: impl Iterator<Item = &'a DisplayMode>) -> Self {
        let mut state = Self::default();
        for mode in modes {
            for element in mode.suppressed() {
                match element {
                    UiElement::Dock => state.dock_suppressed = true,
                    UiElement::MenuBar => state.menu_bar_suppressed = true,
                    UiElement::SideNav => state.side_nav_suppressed = true,
                }
            }
        }
        state
    }

    pub fn suppresses(&self, element: UiElement) -> bool {
        match element {
            UiElement::Dock => self.dock_suppressed,
            UiElement::MenuBar => self.menu_bar_suppressed,
            UiElement::SideNav => self.side_nav_suppressed,
        }
    }
}
