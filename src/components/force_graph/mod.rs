//! Adaptive canvas renderer for academic entity graphs.
//!
//! The pure pieces (layout seeding, colours, style resolution, LOD, performance
//! sampling, camera persistence, cursor zoom) live in their own modules and are
//! tested without a browser. `component` wires them to the DOM.

mod backend;
pub mod camera;
pub mod color;
mod component;
pub mod frame;
mod keyboard;
pub mod lod;
mod overlay;
pub mod perf;
mod render;
pub mod seed;
mod state;
pub mod style;
pub mod types;
pub mod zoom;

pub use backend::{GraphControls, GraphHandle};
pub use camera::{CameraState, DEFAULT_DEBOUNCE_MS};
pub use component::ForceGraphCanvas;
pub use frame::Communities;
pub use lod::{LodConfig, LodLevel};
pub use perf::{MonitorConfig, PerformanceStats};
pub use seed::{DEFAULT_SEED, SeededRandom};
pub use types::{
	DisplayMode, EdgeDirection, EntityType, GraphData, GraphEdge, GraphNode, RelationType,
};
pub use zoom::ZoomConfig;
