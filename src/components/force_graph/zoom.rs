//! Cursor-centred wheel zoom.
//!
//! Wheel deltas accumulate between throttle ticks; each tick picks the
//! world point under the cursor, scales the camera pose about it and
//! eases the camera there.

use serde::{Deserialize, Serialize};

use super::camera::{CameraState, Ray, Vec3};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
	/// Distance change per wheel delta unit.
	pub sensitivity: f64,
	pub min_distance: f64,
	pub max_distance: f64,
	pub duration_ms: f64,
	pub throttle_ms: f64,
	/// Used when the cursor ray misses both geometry and the target plane.
	pub fallback_distance: f64,
}

impl Default for ZoomConfig {
	fn default() -> Self {
		Self {
			sensitivity: 0.001,
			min_distance: 50.0,
			max_distance: 5_000.0,
			duration_ms: 150.0,
			throttle_ms: 16.0,
			fallback_distance: 500.0,
		}
	}
}

pub fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t.clamp(0.0, 1.0)).powi(3)
}

/// Scene geometry a cursor ray can hit.
pub trait RaycastTarget {
	/// Distance along `ray` to the nearest hit.
	fn raycast(&self, ray: &Ray) -> Option<f64>;
}

/// Nodes as spheres of a shared radius.
pub struct NodeSpheres<'a> {
	pub centers: &'a [Vec3],
	pub radius: f64,
}

impl RaycastTarget for NodeSpheres<'_> {
	fn raycast(&self, ray: &Ray) -> Option<f64> {
		self.centers
			.iter()
			.filter_map(|c| ray.intersect_sphere(*c, self.radius))
			.min_by(|a, b| a.total_cmp(b))
	}
}

/// How the zoom anchor was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickKind {
	Geometry,
	TargetPlane,
	Fallback,
}

/// World point under the cursor: nearest geometry hit, else the plane
/// through the orbit target facing the camera, else a fixed distance
/// along the ray.
pub fn pick_point(
	camera: &CameraState,
	ray: &Ray,
	scene: &dyn RaycastTarget,
	fallback_distance: f64,
) -> (Vec3, PickKind) {
	if let Some(t) = scene.raycast(ray) {
		return (ray.at(t), PickKind::Geometry);
	}
	let normal = camera.basis().forward * -1.0;
	match ray.intersect_plane(camera.look_at, normal) {
		Some(t) => (ray.at(t), PickKind::TargetPlane),
		None => (ray.at(fallback_distance), PickKind::Fallback),
	}
}

/// Camera after zooming by `delta_y` about `anchor`, or `None` when the
/// gesture would push past a bound the camera already sits on.
///
/// Position and target are both scaled about the anchor, so the view
/// direction is preserved and the new camera-to-target distance is
/// exactly the clamped value.
pub fn zoom_toward(
	camera: &CameraState,
	anchor: Vec3,
	delta_y: f64,
	config: &ZoomConfig,
) -> Option<CameraState> {
	const EPS: f64 = 1e-6;
	let current = camera.distance();
	if delta_y == 0.0 || current <= EPS {
		return None;
	}
	if delta_y < 0.0 && current <= config.min_distance + EPS {
		return None;
	}
	if delta_y > 0.0 && current >= config.max_distance - EPS {
		return None;
	}

	let next = (current * (1.0 + delta_y * config.sensitivity))
		.clamp(config.min_distance, config.max_distance);
	let ratio = next / current;
	Some(CameraState {
		position: anchor + (camera.position - anchor) * ratio,
		look_at: anchor + (camera.look_at - anchor) * ratio,
		zoom: camera.zoom,
	})
}

/// Eased move between two poses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraAnimation {
	pub from: CameraState,
	pub to: CameraState,
	pub start_ms: f64,
	pub duration_ms: f64,
}

impl CameraAnimation {
	/// Pose at `now_ms` and whether the animation has finished.
	pub fn sample(&self, now_ms: f64) -> (CameraState, bool) {
		if self.duration_ms <= 0.0 {
			return (self.to, true);
		}
		let t = ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0);
		let e = ease_out_cubic(t);
		let state = CameraState {
			position: self.from.position.lerp(self.to.position, e),
			look_at: self.from.look_at.lerp(self.to.look_at, e),
			zoom: self.from.zoom + (self.to.zoom - self.from.zoom) * e,
		};
		(state, t >= 1.0)
	}
}

#[derive(Default)]
pub struct ZoomController {
	config: ZoomConfig,
	pending_delta: f64,
	cursor_ndc: (f64, f64),
	last_apply_ms: Option<f64>,
	animation: Option<CameraAnimation>,
}

impl ZoomController {
	pub fn new(config: ZoomConfig) -> Self {
		Self {
			config,
			..Self::default()
		}
	}

	pub fn config(&self) -> &ZoomConfig {
		&self.config
	}

	/// Accumulate a wheel event at a cursor in normalised device
	/// coordinates.
	pub fn on_wheel(&mut self, delta_y: f64, ndc_x: f64, ndc_y: f64) {
		if delta_y.is_finite() {
			self.pending_delta += delta_y;
			self.cursor_ndc = (ndc_x, ndc_y);
		}
	}

	pub fn is_animating(&self) -> bool {
		self.animation.is_some()
	}

	/// Pose the camera is heading to.
	pub fn destination(&self, camera: &CameraState) -> CameraState {
		self.animation.map_or(*camera, |a| a.to)
	}

	/// Ease from `from` to `to` starting now.
	pub fn animate_to(&mut self, from: CameraState, to: CameraState, now_ms: f64) {
		self.animation = Some(CameraAnimation {
			from,
			to,
			start_ms: now_ms,
			duration_ms: self.config.duration_ms,
		});
	}

	/// Drop queued input and any animation in flight.
	pub fn cancel(&mut self) {
		self.pending_delta = 0.0;
		self.animation = None;
	}

	/// Camera pose for this frame.
	pub fn update(
		&mut self,
		now_ms: f64,
		camera: &CameraState,
		aspect: f64,
		scene: &dyn RaycastTarget,
	) -> CameraState {
		let throttled = self
			.last_apply_ms
			.is_some_and(|at| now_ms - at < self.config.throttle_ms);

		if self.pending_delta != 0.0 && !throttled {
			let delta = std::mem::take(&mut self.pending_delta);
			self.last_apply_ms = Some(now_ms);

			// Start from what is on screen now, aim past the previous goal.
			let current = self.animation.map_or(*camera, |a| a.sample(now_ms).0);
			let (ndc_x, ndc_y) = self.cursor_ndc;
			let ray = current.ray_through(ndc_x, ndc_y, aspect);
			let (anchor, _) = pick_point(&current, &ray, scene, self.config.fallback_distance);
			let base = self.destination(&current);
			if let Some(target) = zoom_toward(&base, anchor, delta, &self.config) {
				self.animate_to(current, target, now_ms);
			}
		}

		match self.animation {
			Some(animation) => {
				let (state, done) = animation.sample(now_ms);
				if done {
					self.animation = None;
				}
				state
			}
			None => *camera,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Empty;

	impl RaycastTarget for Empty {
		fn raycast(&self, _: &Ray) -> Option<f64> {
			None
		}
	}

	#[test]
	fn easing_endpoints() {
		assert_eq!(ease_out_cubic(0.0), 0.0);
		assert_eq!(ease_out_cubic(1.0), 1.0);
		assert!(ease_out_cubic(0.5) > 0.5);
	}

	#[test]
	fn zoom_scales_distance_and_keeps_direction() {
		let camera = CameraState::default();
		let anchor = Vec3::new(100.0, 50.0, 0.0);
		let zoomed = zoom_toward(&camera, anchor, -100.0, &ZoomConfig::default()).unwrap();
		assert!((zoomed.distance() - 900.0).abs() < 1e-9);
		let before = (camera.position - camera.look_at).normalized();
		let after = (zoomed.position - zoomed.look_at).normalized();
		assert!((before - after).length() < 1e-12);
		// The anchor stays fixed while everything moves toward it.
		assert!(zoomed.look_at.distance(anchor) < camera.look_at.distance(anchor));
	}

	#[test]
	fn zoom_respects_bounds() {
		let config = ZoomConfig::default();
		let near = CameraState::default().at_distance(config.min_distance);
		assert!(zoom_toward(&near, Vec3::ZERO, -10.0, &config).is_none());
		assert!(zoom_toward(&near, Vec3::ZERO, 10.0, &config).is_some());

		let far = CameraState::default().at_distance(config.max_distance);
		assert!(zoom_toward(&far, Vec3::ZERO, 10.0, &config).is_none());

		let overshoot = zoom_toward(&CameraState::default(), Vec3::ZERO, -5_000.0, &config).unwrap();
		assert!((overshoot.distance() - config.min_distance).abs() < 1e-9);
	}

	#[test]
	fn repeated_wheel_in_stops_at_floor() {
		let mut controller = ZoomController::default();
		let mut camera = CameraState::default();
		let mut now = 0.0;
		let mut last = camera.distance();

		for _ in 0..400 {
			controller.on_wheel(-120.0, 0.2, -0.1);
			now += 20.0;
			camera = controller.update(now, &camera, 1.5, &Empty);
			let d = camera.distance();
			assert!(d <= last + 1e-9, "distance grew from {last} to {d}");
			assert!(d >= controller.config().min_distance - 1e-9);
			last = d;
		}
		// Let the last animation settle.
		now += 1_000.0;
		camera = controller.update(now, &camera, 1.5, &Empty);
		assert!((camera.distance() - controller.config().min_distance).abs() < 1e-6);

		controller.on_wheel(-120.0, 0.0, 0.0);
		let after = controller.update(now + 100.0, &camera, 1.5, &Empty);
		assert_eq!(after, camera);
	}

	#[test]
	fn wheel_events_within_throttle_accumulate() {
		let mut controller = ZoomController::default();
		let camera = CameraState::default();
		controller.on_wheel(-50.0, 0.0, 0.0);
		let _ = controller.update(0.0, &camera, 1.0, &Empty);
		controller.on_wheel(-50.0, 0.0, 0.0);
		controller.on_wheel(-50.0, 0.0, 0.0);
		// Inside the throttle window: nothing new applied yet.
		let _ = controller.update(5.0, &camera, 1.0, &Empty);
		let dest_before = controller.destination(&camera).distance();
		let _ = controller.update(20.0, &camera, 1.0, &Empty);
		let dest_after = controller.destination(&camera).distance();
		assert!((dest_before - 950.0).abs() < 1e-6);
		assert!((dest_after - 950.0 * 0.9).abs() < 1e-6);
	}

	#[test]
	fn animation_eases_over_duration() {
		let mut controller = ZoomController::default();
		let camera = CameraState::default();
		controller.on_wheel(-500.0, 0.0, 0.0);
		let first = controller.update(0.0, &camera, 1.0, &Empty);
		assert_eq!(first, camera);
		let mid = controller.update(75.0, &camera, 1.0, &Empty);
		assert!(mid.distance() < 1000.0 && mid.distance() > 500.0);
		let end = controller.update(150.0, &camera, 1.0, &Empty);
		assert!((end.distance() - 500.0).abs() < 1e-9);
		assert!(!controller.is_animating());
	}

	#[test]
	fn pick_prefers_geometry_then_plane() {
		let camera = CameraState::default();
		let ray = camera.ray_through(0.0, 0.0, 1.0);
		let centers = [Vec3::new(0.0, 0.0, 100.0)];
		let spheres = NodeSpheres {
			centers: &centers,
			radius: 10.0,
		};
		let (hit, kind) = pick_point(&camera, &ray, &spheres, 500.0);
		assert_eq!(kind, PickKind::Geometry);
		assert!((hit.z - 110.0).abs() < 1e-9);

		let (plane, kind) = pick_point(&camera, &ray, &Empty, 500.0);
		assert_eq!(kind, PickKind::TargetPlane);
		assert!(plane.length() < 1e-9);

		let away = Ray {
			origin: camera.position,
			direction: Vec3::new(0.0, 0.0, 1.0),
		};
		let (fallback, kind) = pick_point(&camera, &away, &Empty, 500.0);
		assert_eq!(kind, PickKind::Fallback);
		assert!((fallback.z - 1500.0).abs() < 1e-9);
	}
}
