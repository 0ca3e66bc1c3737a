use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::app::DisplayMode;
use crate::error::Error;
use crate::geometry::CellSize;

/// Free-form configuration mapping attached to definitions and instances.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// Action bound to a widget gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GestureAction {
    #[default]
    None,
    /// Launch the named app, using the widget as the animation source.
    OpenApp(String),
    /// Remove the widget from its workspace.
    RemoveWidget,
}

/// Per-definition bindings for the non-tap gestures.
///
/// Single-tap is implicit: it launches the definition's bound app when one
/// exists, otherwise it does nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GestureBindings {
    #[serde(default)]
    pub double_tap: GestureAction,
    #[serde(default)]
    pub long_press: GestureAction,
}

/// Header display policy for a rendered widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPolicy {
    Always,
    Hover,
    Never,
    /// Show a header for any widget taller than one cell.
    #[default]
    Auto,
}

/// Catalog template for a widget. Created at catalog load; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetDefinition {
    pub id: String,
    /// Type tag identifying the renderable content unit.
    pub kind: String,
    pub name: String,
    pub icon: String,
    pub category: String,
    pub size: CellSize,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_config: ConfigMap,
    /// App launched on single-tap, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default)]
    pub header: HeaderPolicy,
    #[serde(default)]
    pub gestures: GestureBindings,
}

/// Catalog record for an application window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDefinition {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub category: String,
    pub display_mode: DisplayMode,
    /// When true, opening the app a second time focuses the live instance.
    #[serde(default)]
    pub single_instance: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_settings: ConfigMap,
}

/// Drawer tab selecting which catalog half is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawerTab {
    Widgets,
    Apps,
}

impl DrawerTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawerTab::Widgets => "widgets",
            DrawerTab::Apps => "apps",
        }
    }
}

impl FromStr for DrawerTab {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "widgets" => Ok(DrawerTab::Widgets),
            "apps" => Ok(DrawerTab::Apps),
            other => Err(Error::UnknownTab(other.to_string())),
        }
    }
}

/// Static definition catalog supplied at startup.
///
/// The core only relies on the structural fields (id, size, category); the
/// content behind each definition is an opaque renderable unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub widgets: Vec<WidgetDefinition>,
    pub apps: Vec<AppDefinition>,
}

impl Catalog {
    pub fn new(widgets: Vec<WidgetDefinition>, apps: Vec<AppDefinition>) -> Self {
        Self { widgets, apps }
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetDefinition> {
        self.widgets.iter().find(|d| d.id == id)
    }

    pub fn app(&self, id: &str) -> Option<&AppDefinition> {
        self.apps.iter().find(|d| d.id == id)
    }

    /// Widgets grouped by category, deterministically ordered.
    pub fn widgets_by_category(&self) -> BTreeMap<&str, Vec<&WidgetDefinition>> {
        let mut groups: BTreeMap<&str, Vec<&WidgetDefinition>> = BTreeMap::new();
        for def in &self.widgets {
            groups.entry(def.category.as_str()).or_default().push(def);
        }
        groups
    }

    /// Apps grouped by category, deterministically ordered.
    pub fn apps_by_category(&self) -> BTreeMap<&str, Vec<&AppDefinition>> {
        let mut groups: BTreeMap<&str, Vec<&AppDefinition>> = BTreeMap::new();
        for def in &self.apps {
            groups.entry(def.category.as_str()).or_default().push(def);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tab_name_is_rejected() {
        let err = "settings".parse::<DrawerTab>().unwrap_err();
        assert!(matches!(err, Error::UnknownTab(name) if name == "settings"));
        assert_eq!("widgets".parse::<DrawerTab>().unwrap(), DrawerTab::Widgets);
        assert_eq!("apps".parse::<DrawerTab>().unwrap(), DrawerTab::Apps);
    }

    #[test]
    fn test_category_grouping_is_ordered() {
        let mk = |id: &str, category: &str| WidgetDefinition {
            id: id.to_string(),
            kind: id.to_string(),
            name: id.to_string(),
            icon: String::new(),
            category: category.to_string(),
            size: CellSize::new(1, 1),
            description: String::new(),
            default_config: ConfigMap::new(),
            app_id: None,
            header: HeaderPolicy::default(),
            gestures: GestureBindings::default(),
        };
        let catalog = Catalog::new(
            vec![mk("w1", "tools"), mk("w2", "info"), mk("w3", "tools")],
            vec![],
        );
        let groups = catalog.widgets_by_category();
        let categories: Vec<&str> = groups.keys().copied().collect();
        assert_eq!(categories, vec!["info", "tools"]);
        assert_eq!(groups["tools"].len(), 2);
    }
}
