//! Renderer configuration, resolved once and passed down as plain data.

use serde::{Deserialize, Serialize};

use crate::components::force_graph::{LodConfig, MonitorConfig, ZoomConfig};
use crate::error::Result;

/// Force simulation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		}
	}
}

/// Canvas colours and typography.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphTheme {
	pub background: String,
	pub label_color: String,
	pub ring_color: String,
	pub font_family: String,
	pub font_px: f64,
}

impl Default for GraphTheme {
	fn default() -> Self {
		Self {
			background: "#1a1a2e".into(),
			label_color: "#FFFFFF".into(),
			ring_color: "#FFFFFF".into(),
			font_family: "sans-serif".into(),
			font_px: 11.0,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
	pub layout_seed: u32,
	/// Half-width of the square seeded positions fall in.
	pub layout_spread: f64,
	/// World units kept around the graph when framing it.
	pub fit_padding: f64,
	pub camera_debounce_ms: f64,
	pub simulation: SimulationConfig,
	pub lod: LodConfig,
	pub monitor: MonitorConfig,
	pub zoom: ZoomConfig,
	pub theme: GraphTheme,
}

impl Default for RenderConfig {
	fn default() -> Self {
		Self {
			layout_seed: crate::components::force_graph::DEFAULT_SEED,
			layout_spread: 250.0,
			fit_padding: 40.0,
			camera_debounce_ms: crate::components::force_graph::DEFAULT_DEBOUNCE_MS,
			simulation: SimulationConfig::default(),
			lod: LodConfig::default(),
			monitor: MonitorConfig::default(),
			zoom: ZoomConfig::default(),
			theme: GraphTheme::default(),
		}
	}
}

impl RenderConfig {
	/// Parse a (possibly partial) JSON config; absent fields keep defaults.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config =
			RenderConfig::from_json(r#"{"layout_seed": 7, "zoom": {"min_distance": 20.0}}"#).unwrap();
		assert_eq!(config.layout_seed, 7);
		assert_eq!(config.theme, GraphTheme::default());
		assert_eq!(config.zoom.min_distance, 20.0);
		assert_eq!(config.zoom.max_distance, ZoomConfig::default().max_distance);
	}

	#[test]
	fn malformed_json_is_an_error() {
		assert!(RenderConfig::from_json("{").is_err());
	}

	#[test]
	fn theme_fields_override_individually() {
		let config = RenderConfig::from_json(r##"{"theme": {"background": "#F8FAFC"}}"##).unwrap();
		assert_eq!(config.theme.background, "#F8FAFC");
		assert_eq!(config.theme.font_px, GraphTheme::default().font_px);
	}
}
