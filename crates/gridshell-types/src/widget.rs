use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{ConfigMap, WidgetDefinition};
use crate::geometry::{CellIndex, CellRect, CellSize};

/// Unique identifier of a placed widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetInstanceId(Uuid);

impl WidgetInstanceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for WidgetInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A placed, configured occurrence of a widget definition.
///
/// The size is copied from the definition at placement time and may diverge
/// from it afterwards if the instance is resized. The owning workspace is
/// implicit via containment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetInstance {
    pub id: WidgetInstanceId,
    pub definition_id: String,
    pub kind: String,
    pub cell: CellIndex,
    pub size: CellSize,
    #[serde(default)]
    pub config: ConfigMap,
}

impl WidgetInstance {
    /// Instantiate a definition at `cell`, copying size and default config.
    pub fn from_definition(definition: &WidgetDefinition, cell: CellIndex) -> Self {
        Self {
            id: WidgetInstanceId::generate(),
            definition_id: definition.id.clone(),
            kind: definition.kind.clone(),
            cell,
            size: definition.size,
            config: definition.default_config.clone(),
        }
    }

    pub fn rect(&self) -> CellRect {
        CellRect::new(self.cell, self.size)
    }

    /// Merge a configuration patch over the current config, last write wins.
    pub fn apply_config_patch(&mut self, patch: ConfigMap) {
        for (key, value) in patch {
            self.config.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GestureBindings, HeaderPolicy};

    fn clock_definition() -> WidgetDefinition {
        let mut default_config = ConfigMap::new();
        default_config.insert("format".to_string(), serde_json::json!("24h"));
        WidgetDefinition {
            id: "clock".to_string(),
            kind: "clock".to_string(),
            name: "Clock".to_string(),
            icon: "clock.svg".to_string(),
            category: "info".to_string(),
            size: CellSize::new(2, 1),
            description: String::new(),
            default_config,
            app_id: None,
            header: HeaderPolicy::default(),
            gestures: GestureBindings::default(),
        }
    }

    #[test]
    fn test_instance_copies_definition_size_and_config() {
        let instance = WidgetInstance::from_definition(&clock_definition(), 4);
        assert_eq!(instance.cell, 4);
        assert_eq!(instance.size, CellSize::new(2, 1));
        assert_eq!(instance.config["format"], serde_json::json!("24h"));
    }

    #[test]
    fn test_config_patch_overwrites_and_extends() {
        let mut instance = WidgetInstance::from_definition(&clock_definition(), 0);
        let mut patch = ConfigMap::new();
        patch.insert("format".to_string(), serde_json::json!("12h"));
        patch.insert("seconds".to_string(), serde_json::json!(true));
        instance.apply_config_patch(patch);
        assert_eq!(instance.config["format"], serde_json::json!("12h"));
        assert_eq!(instance.config["seconds"], serde_json::json!(true));
    }
}
