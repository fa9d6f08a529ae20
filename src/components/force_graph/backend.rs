//! Minimal camera capability the renderer core depends on.

use std::cell::RefCell;
use std::rc::Rc;

use super::camera::CameraState;
use super::frame::FrameSnapshot;
use super::overlay::OverlayStats;
use super::state::ForceGraphState;

/// State shared by the component's closures and every [`GraphHandle`].
pub(crate) type SharedState = Rc<RefCell<Option<ForceGraphState>>>;

pub trait GraphControls {
	fn camera_position(&self) -> CameraState;

	/// Move the camera, eased when `animate` is set.
	fn set_camera_position(&mut self, camera: CameraState, animate: bool);

	/// Frame all nodes.
	fn zoom_to_fit(&mut self);

	/// Distance bounds the controls clamp to.
	fn distance_bounds(&self) -> (f64, f64);
}

/// Shared handle given to the host through `on_graph_ready`.
///
/// Every call is a no-op once the canvas has been unmounted.
#[derive(Clone)]
pub struct GraphHandle {
	state: SharedState,
}

impl GraphHandle {
	pub(crate) fn new(state: SharedState) -> Self {
		Self { state }
	}

	fn with_state<R>(&self, f: impl FnOnce(&mut ForceGraphState) -> R) -> Option<R> {
		self.state.try_borrow_mut().ok()?.as_mut().map(f)
	}

	/// Current camera, `None` after unmount.
	pub fn camera(&self) -> Option<CameraState> {
		self.with_state(|s| s.camera_position())
	}

	pub fn zoom_to_fit(&self) {
		self.with_state(|s| s.zoom_to_fit());
	}

	pub fn set_camera(&self, camera: CameraState) {
		self.with_state(|s| s.set_camera_position(camera, true));
	}

	/// Forget the persisted camera and re-frame the graph.
	pub fn reset_camera(&self) {
		self.with_state(|s| {
			s.clear_persisted_camera();
			s.zoom_to_fit();
		});
	}
}

/// What the host hears about after a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct FrameOutcome {
	pub overlay: Option<OverlayStats>,
	pub dropped_to: Option<f64>,
}

/// Run one animation frame: step the simulation, `draw` the snapshot and
/// close the frame with the time from `clock`. The state is released before
/// returning, so callbacks fired from the outcome can use a [`GraphHandle`].
pub(crate) fn step_frame(
	state: &SharedState,
	now_ms: f64,
	clock: impl FnOnce() -> f64,
	draw: impl FnOnce(&ForceGraphState, &FrameSnapshot),
) -> FrameOutcome {
	let Ok(mut guard) = state.try_borrow_mut() else {
		return FrameOutcome::default();
	};
	let Some(s) = guard.as_mut() else {
		return FrameOutcome::default();
	};
	if s.animation_running {
		s.tick(0.016);
	}
	let snapshot = s.frame(now_ms);
	draw(s, &snapshot);
	let report = s.end_frame(clock());
	FrameOutcome {
		overlay: report.stats.map(|stats| OverlayStats {
			stats,
			ceiling: snapshot.ceiling,
			nodes: snapshot.nodes.len(),
		}),
		dropped_to: report.dropped_to,
	}
}
