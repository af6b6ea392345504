use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::EdgeMode;
use crate::engine::hull::HullStyle;
use crate::engine::interaction::SearchMode;
use crate::engine::layout::PhysicsConfig;
use crate::engine::selector::EdgeFilters;
use crate::engine::sizing::SizeMetric;

pub const CONFIG_KEY: &str = "config";
pub const MAX_MIN_WEIGHT: f32 = 20.0;

/// Either let the selector pick the relation, or pin one by key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdgeModeChoice {
    #[default]
    Auto,
    Fixed(EdgeMode),
}

impl From<String> for EdgeModeChoice {
    fn from(key: String) -> Self {
        if key == "auto" {
            Self::Auto
        } else {
            Self::Fixed(EdgeMode::from_key(&key))
        }
    }
}

impl From<EdgeModeChoice> for String {
    fn from(choice: EdgeModeChoice) -> Self {
        match choice {
            EdgeModeChoice::Auto => "auto".to_owned(),
            EdgeModeChoice::Fixed(mode) => mode.key().to_owned(),
        }
    }
}

impl fmt::Display for EdgeModeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("Auto"),
            Self::Fixed(mode) => f.write_str(mode.label()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedStrategy {
    #[default]
    Rings,
    Random,
}

impl SeedStrategy {
    pub const ALL: [SeedStrategy; 2] = [SeedStrategy::Rings, SeedStrategy::Random];

    pub fn label(self) -> &'static str {
        match self {
            Self::Rings => "rings",
            Self::Random => "random",
        }
    }
}

/// User preferences persisted under [`CONFIG_KEY`]. Unknown or missing
/// fields fall back to their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub edge_mode: EdgeModeChoice,
    pub hull_style: HullStyle,
    pub min_weight: f32,
    pub include_external: bool,
    pub only_doi: bool,
    pub hide_isolated: bool,
    pub size_metric: SizeMetric,
    pub size_scale: f32,
    pub edge_opacity: f32,
    pub physics: PhysicsConfig,
    pub seed_strategy: SeedStrategy,
    pub search_mode: SearchMode,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            edge_mode: EdgeModeChoice::Auto,
            hull_style: HullStyle::Smooth,
            min_weight: 1.0,
            include_external: true,
            only_doi: false,
            hide_isolated: false,
            size_metric: SizeMetric::Auto,
            size_scale: 1.0,
            edge_opacity: 0.6,
            physics: PhysicsConfig::default(),
            seed_strategy: SeedStrategy::Rings,
            search_mode: SearchMode::Substring,
        }
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

impl ViewConfig {
    pub fn clamped(mut self) -> Self {
        let defaults = Self::default();
        self.min_weight = finite_or(self.min_weight, defaults.min_weight).clamp(1.0, MAX_MIN_WEIGHT);
        self.size_scale = finite_or(self.size_scale, defaults.size_scale).clamp(0.25, 4.0);
        self.edge_opacity = finite_or(self.edge_opacity, defaults.edge_opacity).clamp(0.05, 1.0);
        self.physics = self.physics.clamped();
        self
    }

    pub fn filters(&self) -> EdgeFilters {
        EdgeFilters {
            include_external: self.include_external,
            only_doi: self.only_doi,
            min_weight: self.min_weight,
        }
    }

    /// Whether a change from `previous` alters which edges or nodes are shown.
    pub fn topology_changed(&self, previous: &ViewConfig) -> bool {
        self.edge_mode != previous.edge_mode
            || self.min_weight != previous.min_weight
            || self.include_external != previous.include_external
            || self.only_doi != previous.only_doi
            || self.hide_isolated != previous.hide_isolated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ViewConfig =
            serde_json::from_str(r#"{ "edge_mode": "semantic", "hull_style": "convex" }"#).unwrap();
        assert_eq!(config.edge_mode, EdgeModeChoice::Fixed(EdgeMode::Semantic));
        assert_eq!(config.hull_style, HullStyle::Convex);
        assert_eq!(config.min_weight, 1.0);
        assert!(config.include_external);
    }

    #[test]
    fn edge_mode_choice_serializes_as_key() {
        let json = serde_json::to_string(&EdgeModeChoice::Fixed(EdgeMode::SharedRefs)).unwrap();
        assert_eq!(json, r#""shared_refs""#);
        let auto: EdgeModeChoice = serde_json::from_str(r#""auto""#).unwrap();
        assert_eq!(auto, EdgeModeChoice::Auto);
    }

    #[test]
    fn clamping_repairs_out_of_range_values() {
        let config = ViewConfig {
            min_weight: f32::NAN,
            size_scale: 100.0,
            edge_opacity: -1.0,
            ..ViewConfig::default()
        }
        .clamped();
        assert_eq!(config.min_weight, 1.0);
        assert_eq!(config.size_scale, 4.0);
        assert_eq!(config.edge_opacity, 0.05);
    }
}
