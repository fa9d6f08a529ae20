//! Keyboard navigation: each key is a direct camera move.

use super::backend::GraphControls;

/// Fraction of the camera distance moved per pan key press.
const PAN_STEP: f64 = 0.1;
const ZOOM_IN: f64 = 0.8;
const ZOOM_OUT: f64 = 1.25;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyAction {
	/// Pan by a fraction of the distance along screen right/up.
	Pan { right: f64, up: f64 },
	/// Multiply the camera distance.
	Zoom(f64),
	Reset,
}

/// Arrow keys pan (zoom with Shift on Up/Down), `+`/`-` zoom, `Home`/`R`
/// reset.
pub fn key_action(key: &str, shift: bool) -> Option<KeyAction> {
	Some(match (key, shift) {
		("ArrowUp", true) => KeyAction::Zoom(ZOOM_IN),
		("ArrowDown", true) => KeyAction::Zoom(ZOOM_OUT),
		("ArrowUp", false) => KeyAction::Pan { right: 0.0, up: PAN_STEP },
		("ArrowDown", false) => KeyAction::Pan { right: 0.0, up: -PAN_STEP },
		("ArrowLeft", _) => KeyAction::Pan { right: -PAN_STEP, up: 0.0 },
		("ArrowRight", _) => KeyAction::Pan { right: PAN_STEP, up: 0.0 },
		("+" | "=", _) => KeyAction::Zoom(ZOOM_IN),
		("-" | "_", _) => KeyAction::Zoom(ZOOM_OUT),
		("Home" | "r" | "R", _) => KeyAction::Reset,
		_ => return None,
	})
}

pub fn apply_key(action: KeyAction, controls: &mut dyn GraphControls) {
	let camera = controls.camera_position();
	match action {
		KeyAction::Pan { right, up } => {
			let basis = camera.basis();
			let step = camera.distance();
			let by = basis.right * (right * step) + basis.up * (up * step);
			controls.set_camera_position(camera.translated(by), false);
		}
		KeyAction::Zoom(factor) => {
			let (min, max) = controls.distance_bounds();
			let distance = (camera.distance() * factor).clamp(min, max);
			controls.set_camera_position(camera.at_distance(distance), false);
		}
		KeyAction::Reset => controls.zoom_to_fit(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::camera::{CameraState, Vec3};

	#[derive(Default)]
	struct Fake {
		camera: CameraState,
		fitted: bool,
	}

	impl GraphControls for Fake {
		fn camera_position(&self) -> CameraState {
			self.camera
		}
		fn set_camera_position(&mut self, camera: CameraState, _: bool) {
			self.camera = camera;
		}
		fn zoom_to_fit(&mut self) {
			self.fitted = true;
		}
		fn distance_bounds(&self) -> (f64, f64) {
			(50.0, 5_000.0)
		}
	}

	#[test]
	fn key_mapping() {
		assert_eq!(key_action("+", false), Some(KeyAction::Zoom(ZOOM_IN)));
		assert_eq!(key_action("ArrowUp", true), Some(KeyAction::Zoom(ZOOM_IN)));
		assert_eq!(key_action("R", false), Some(KeyAction::Reset));
		assert_eq!(key_action("Home", false), Some(KeyAction::Reset));
		assert_eq!(key_action("x", false), None);
	}

	#[test]
	fn arrows_pan_without_changing_distance() {
		let mut fake = Fake::default();
		apply_key(KeyAction::Pan { right: PAN_STEP, up: 0.0 }, &mut fake);
		assert!((fake.camera.look_at.x - 100.0).abs() < 1e-9);
		assert!((fake.camera.distance() - 1000.0).abs() < 1e-9);
	}

	#[test]
	fn zoom_keys_clamp() {
		let mut fake = Fake::default();
		for _ in 0..100 {
			apply_key(KeyAction::Zoom(ZOOM_IN), &mut fake);
		}
		assert!((fake.camera.distance() - 50.0).abs() < 1e-9);
		assert_eq!(fake.camera.look_at, Vec3::ZERO);
	}

	#[test]
	fn reset_fits() {
		let mut fake = Fake::default();
		apply_key(KeyAction::Reset, &mut fake);
		assert!(fake.fitted);
	}
}
