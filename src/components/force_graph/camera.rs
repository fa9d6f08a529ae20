//! Camera state, projection and persistence.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::{Add, Mul, Sub};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Default persisted-state write debounce.
pub const DEFAULT_DEBOUNCE_MS: f64 = 300.0;

/// Vertical field of view of the perspective projection, in radians.
pub const FOV_Y: f64 = std::f64::consts::FRAC_PI_4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
	pub x: f64,
	pub y: f64,
	pub z: f64,
}

impl Vec3 {
	pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
	pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

	pub const fn new(x: f64, y: f64, z: f64) -> Self {
		Self { x, y, z }
	}

	pub fn dot(self, other: Vec3) -> f64 {
		self.x * other.x + self.y * other.y + self.z * other.z
	}

	pub fn cross(self, other: Vec3) -> Vec3 {
		Vec3::new(
			self.y * other.z - self.z * other.y,
			self.z * other.x - self.x * other.z,
			self.x * other.y - self.y * other.x,
		)
	}

	pub fn length(self) -> f64 {
		self.dot(self).sqrt()
	}

	pub fn distance(self, other: Vec3) -> f64 {
		(self - other).length()
	}

	/// Unit vector, or zero for a zero-length input.
	pub fn normalized(self) -> Vec3 {
		let len = self.length();
		if len > f64::EPSILON { self * (1.0 / len) } else { Vec3::ZERO }
	}

	pub fn lerp(self, other: Vec3, t: f64) -> Vec3 {
		self + (other - self) * t
	}

	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
	}
}

impl Add for Vec3 {
	type Output = Vec3;
	fn add(self, rhs: Vec3) -> Vec3 {
		Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
	}
}

impl Sub for Vec3 {
	type Output = Vec3;
	fn sub(self, rhs: Vec3) -> Vec3 {
		Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
	}
}

impl Mul<f64> for Vec3 {
	type Output = Vec3;
	fn mul(self, rhs: f64) -> Vec3 {
		Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
	}
}

/// A half-line from `origin` along unit `direction`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
	pub origin: Vec3,
	pub direction: Vec3,
}

impl Ray {
	pub fn at(&self, t: f64) -> Vec3 {
		self.origin + self.direction * t
	}

	/// Nearest non-negative hit distance against a sphere.
	pub fn intersect_sphere(&self, center: Vec3, radius: f64) -> Option<f64> {
		let oc = self.origin - center;
		let b = oc.dot(self.direction);
		let c = oc.dot(oc) - radius * radius;
		let disc = b * b - c;
		if disc < 0.0 {
			return None;
		}
		let sqrt = disc.sqrt();
		[-b - sqrt, -b + sqrt].into_iter().find(|t| *t >= 0.0)
	}

	/// Hit distance against the plane through `point` with `normal`.
	pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<f64> {
		let denom = normal.dot(self.direction);
		if denom.abs() < 1e-9 {
			return None;
		}
		let t = (point - self.origin).dot(normal) / denom;
		(t >= 0.0).then_some(t)
	}
}

/// Camera pose persisted between sessions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraState {
	pub position: Vec3,
	pub look_at: Vec3,
	pub zoom: f64,
}

impl Default for CameraState {
	fn default() -> Self {
		Self {
			position: Vec3::new(0.0, 0.0, 1000.0),
			look_at: Vec3::ZERO,
			zoom: 1.0,
		}
	}
}

/// Orthonormal view basis derived from a camera pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBasis {
	pub forward: Vec3,
	pub right: Vec3,
	pub up: Vec3,
}

/// Where a world point lands on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
	pub x: f64,
	pub y: f64,
	/// Screen pixels per world unit at this depth.
	pub scale: f64,
	pub depth: f64,
}

impl CameraState {
	/// Camera-to-target distance.
	pub fn distance(&self) -> f64 {
		self.position.distance(self.look_at)
	}

	/// Same view direction, new distance to the target.
	pub fn at_distance(&self, distance: f64) -> CameraState {
		let dir = (self.position - self.look_at).normalized();
		let dir = if dir == Vec3::ZERO { Vec3::new(0.0, 0.0, 1.0) } else { dir };
		CameraState {
			position: self.look_at + dir * distance,
			..*self
		}
	}

	pub fn translated(&self, by: Vec3) -> CameraState {
		CameraState {
			position: self.position + by,
			look_at: self.look_at + by,
			zoom: self.zoom,
		}
	}

	pub fn basis(&self) -> ViewBasis {
		let forward = (self.look_at - self.position).normalized();
		let mut right = forward.cross(Vec3::UP).normalized();
		if right == Vec3::ZERO {
			// Looking straight along the up axis.
			right = Vec3::new(1.0, 0.0, 0.0);
		}
		let up = right.cross(forward);
		ViewBasis { forward, right, up }
	}

	/// Ray through a cursor given in normalised device coordinates
	/// (`x`, `y` in `[-1, 1]`, `y` up).
	pub fn ray_through(&self, ndc_x: f64, ndc_y: f64, aspect: f64) -> Ray {
		let basis = self.basis();
		let half = (FOV_Y / 2.0).tan();
		let direction = (basis.forward
			+ basis.right * (ndc_x * half * aspect)
			+ basis.up * (ndc_y * half))
			.normalized();
		Ray {
			origin: self.position,
			direction,
		}
	}

	/// Perspective projection onto a `width` x `height` viewport.
	/// `None` when the point is behind the camera.
	pub fn project(&self, point: Vec3, width: f64, height: f64) -> Option<Projected> {
		let basis = self.basis();
		let rel = point - self.position;
		let depth = rel.dot(basis.forward);
		if depth <= 1e-6 {
			return None;
		}
		let half = (FOV_Y / 2.0).tan();
		let aspect = if height > 0.0 { width / height } else { 1.0 };
		let sx = rel.dot(basis.right) / (depth * half * aspect);
		let sy = rel.dot(basis.up) / (depth * half);
		Some(Projected {
			x: (sx + 1.0) * 0.5 * width,
			y: (1.0 - sy) * 0.5 * height,
			scale: height / (2.0 * depth * half),
			depth,
		})
	}

	/// Accepts only states whose numbers can drive a projection.
	pub fn is_valid(&self) -> bool {
		self.position.is_finite()
			&& self.look_at.is_finite()
			&& self.zoom.is_finite()
			&& self.zoom > 0.0
			&& self.distance() > f64::EPSILON
	}
}

/// Frame the bounding sphere of `points` with some margin, keeping the
/// current view direction. `None` for an empty point set.
pub fn zoom_to_fit(
	current: &CameraState,
	points: &[Vec3],
	padding: f64,
	min_distance: f64,
	max_distance: f64,
) -> Option<CameraState> {
	let first = *points.first()?;
	let (min, max) = points.iter().fold((first, first), |(lo, hi), p| {
		(
			Vec3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
			Vec3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
		)
	});
	let center = min.lerp(max, 0.5);
	let radius = (max - min).length() / 2.0 + padding;
	let distance = (radius / (FOV_Y / 2.0).sin()).clamp(min_distance, max_distance);

	let framed = CameraState {
		look_at: center,
		position: center + (current.position - current.look_at),
		zoom: current.zoom,
	};
	Some(framed.at_distance(distance))
}

/// Durable key-value storage for camera poses.
pub trait CameraStore {
	/// Raw value under `key`.
	fn read(&self, key: &str) -> Result<Option<String>>;

	fn write(&self, key: &str, value: &str) -> Result<()>;

	fn remove(&self, key: &str) -> Result<()>;

	/// Stored pose, or `None` when missing, unreadable or corrupt.
	fn load(&self, key: &str) -> Option<CameraState> {
		let raw = match self.read(key) {
			Ok(Some(raw)) => raw,
			Ok(None) => return None,
			Err(e) => {
				warn!("camera: cannot read {key}: {e}");
				return None;
			}
		};
		match serde_json::from_str::<CameraState>(&raw) {
			Ok(state) if state.is_valid() => Some(state),
			Ok(_) => {
				warn!("camera: ignoring degenerate state under {key}");
				None
			}
			Err(e) => {
				warn!("camera: ignoring corrupt state under {key}: {e}");
				None
			}
		}
	}

	fn save(&self, key: &str, state: &CameraState) -> Result<()> {
		let json = serde_json::to_string(state)?;
		self.write(key, &json)
	}

	fn clear(&self, key: &str) -> Result<()> {
		self.remove(key)
	}
}

/// Browser `localStorage`.
#[derive(Clone, Debug)]
pub struct LocalStorageStore {
	storage: web_sys::Storage,
}

impl LocalStorageStore {
	/// `None` when storage is disabled (private mode, sandboxed frame).
	pub fn open() -> Option<Self> {
		let storage = web_sys::window()?.local_storage().ok()??;
		Some(Self { storage })
	}
}

impl CameraStore for LocalStorageStore {
	fn read(&self, key: &str) -> Result<Option<String>> {
		self.storage
			.get_item(key)
			.map_err(|e| GraphError::Storage(format!("{e:?}")))
	}

	fn write(&self, key: &str, value: &str) -> Result<()> {
		self.storage
			.set_item(key, value)
			.map_err(|e| GraphError::Storage(format!("{e:?}")))
	}

	fn remove(&self, key: &str) -> Result<()> {
		self.storage
			.remove_item(key)
			.map_err(|e| GraphError::Storage(format!("{e:?}")))
	}
}

/// In-process store, used when `localStorage` is unavailable.
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: RefCell<HashMap<String, String>>,
}

impl CameraStore for MemoryStore {
	fn read(&self, key: &str) -> Result<Option<String>> {
		Ok(self.entries.borrow().get(key).cloned())
	}

	fn write(&self, key: &str, value: &str) -> Result<()> {
		self.entries
			.borrow_mut()
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<()> {
		self.entries.borrow_mut().remove(key);
		Ok(())
	}
}

/// Debounced writer: only the last pose scheduled within the debounce
/// window reaches the store.
pub struct CameraPersistence {
	store: Box<dyn CameraStore>,
	key: String,
	debounce_ms: f64,
	pending: Option<(CameraState, f64)>,
	last_saved: Option<CameraState>,
}

impl CameraPersistence {
	pub fn new(store: Box<dyn CameraStore>, key: impl Into<String>, debounce_ms: f64) -> Self {
		Self {
			store,
			key: key.into(),
			debounce_ms: debounce_ms.max(0.0),
			pending: None,
			last_saved: None,
		}
	}

	/// Pose to restore on mount.
	pub fn restore(&mut self) -> Option<CameraState> {
		let state = self.store.load(&self.key);
		if let Some(state) = state {
			debug!("camera: restored {:?} from {}", state.position, self.key);
		}
		self.last_saved = state;
		state
	}

	/// Queue `state`. A changed state pushes the deadline back; repeating
	/// the pending or last saved state does not.
	pub fn schedule(&mut self, state: CameraState, now_ms: f64) {
		match self.pending {
			Some((pending, _)) if pending == state => {}
			None if self.last_saved == Some(state) => {}
			_ => self.pending = Some((state, now_ms + self.debounce_ms)),
		}
	}

	/// Write the pending pose once its deadline passed. Returns whether a
	/// write happened.
	pub fn poll(&mut self, now_ms: f64) -> bool {
		match self.pending {
			Some((_, due)) if now_ms >= due => self.flush(),
			_ => false,
		}
	}

	/// Write the pending pose immediately.
	pub fn flush(&mut self) -> bool {
		let Some((state, _)) = self.pending.take() else {
			return false;
		};
		match self.store.save(&self.key, &state) {
			Ok(()) => {
				self.last_saved = Some(state);
				true
			}
			Err(e) => {
				warn!("camera: failed to persist {}: {e}", self.key);
				false
			}
		}
	}

	/// Drop any pending write without touching the store.
	pub fn cancel(&mut self) {
		self.pending = None;
	}

	/// Forget the stored pose.
	pub fn clear(&mut self) {
		self.pending = None;
		self.last_saved = None;
		if let Err(e) = self.store.clear(&self.key) {
			warn!("camera: failed to clear {}: {e}", self.key);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use super::*;

	/// Shares one map between the persistence under test and assertions.
	#[derive(Clone, Default)]
	struct SharedStore(Rc<MemoryStore>);

	impl CameraStore for SharedStore {
		fn read(&self, key: &str) -> Result<Option<String>> {
			self.0.read(key)
		}
		fn write(&self, key: &str, value: &str) -> Result<()> {
			self.0.write(key, value)
		}
		fn remove(&self, key: &str) -> Result<()> {
			self.0.remove(key)
		}
	}

	fn pose(x: f64) -> CameraState {
		CameraState {
			position: Vec3::new(x, 2.5, 300.0),
			look_at: Vec3::new(x, 0.0, 0.0),
			zoom: 1.5,
		}
	}

	#[test]
	fn save_then_load_round_trips() {
		let store = MemoryStore::default();
		store.save("graph", &pose(3.0)).unwrap();
		assert_eq!(store.load("graph"), Some(pose(3.0)));
	}

	#[test]
	fn unused_or_corrupt_keys_load_as_none() {
		let store = MemoryStore::default();
		assert_eq!(store.load("missing"), None);
		store.write("bad", "{not json").unwrap();
		assert_eq!(store.load("bad"), None);
		store
			.write(
				"degenerate",
				r#"{"position":{"x":0,"y":0,"z":0},"lookAt":{"x":0,"y":0,"z":0},"zoom":1}"#,
			)
			.unwrap();
		assert_eq!(store.load("degenerate"), None);
	}

	#[test]
	fn persisted_json_uses_camel_case() {
		let json = serde_json::to_string(&pose(1.0)).unwrap();
		assert!(json.contains("\"lookAt\""));
	}

	#[test]
	fn debounce_writes_only_last_state() {
		let shared = SharedStore::default();
		let mut persistence = CameraPersistence::new(Box::new(shared.clone()), "cam", 300.0);

		persistence.schedule(pose(1.0), 0.0);
		persistence.schedule(pose(2.0), 100.0);
		persistence.schedule(pose(3.0), 200.0);
		assert!(!persistence.poll(450.0));
		assert_eq!(shared.load("cam"), None);

		assert!(persistence.poll(500.0));
		assert_eq!(shared.load("cam"), Some(pose(3.0)));
		assert!(!persistence.flush());
	}

	#[test]
	fn resting_camera_does_not_postpone_write() {
		let shared = SharedStore::default();
		let mut persistence = CameraPersistence::new(Box::new(shared.clone()), "cam", 300.0);
		persistence.schedule(pose(1.0), 0.0);
		for frame in 1..20 {
			persistence.schedule(pose(1.0), frame as f64 * 16.0);
			persistence.poll(frame as f64 * 16.0);
		}
		assert_eq!(shared.load("cam"), Some(pose(1.0)));
	}

	#[test]
	fn flush_and_cancel() {
		let shared = SharedStore::default();
		let mut persistence = CameraPersistence::new(Box::new(shared.clone()), "cam", 300.0);
		persistence.schedule(pose(1.0), 0.0);
		assert!(persistence.flush());
		assert_eq!(shared.load("cam"), Some(pose(1.0)));

		persistence.schedule(pose(9.0), 10.0);
		persistence.cancel();
		assert!(!persistence.poll(1_000.0));
		assert_eq!(shared.load("cam"), Some(pose(1.0)));

		persistence.clear();
		assert_eq!(shared.load("cam"), None);
	}

	#[test]
	fn restore_skips_rewriting_identical_state() {
		let shared = SharedStore::default();
		shared.save("cam", &pose(4.0)).unwrap();
		let mut persistence = CameraPersistence::new(Box::new(shared), "cam", 300.0);
		assert_eq!(persistence.restore(), Some(pose(4.0)));
		persistence.schedule(pose(4.0), 0.0);
		assert!(!persistence.flush());
	}

	#[test]
	fn center_projects_to_viewport_center() {
		let camera = CameraState::default();
		let p = camera.project(Vec3::ZERO, 800.0, 600.0).unwrap();
		assert!((p.x - 400.0).abs() < 1e-9 && (p.y - 300.0).abs() < 1e-9);
		assert!(camera.project(Vec3::new(0.0, 0.0, 2000.0), 800.0, 600.0).is_none());

		// World +x is screen right, world +y is screen up.
		let q = camera.project(Vec3::new(10.0, 10.0, 0.0), 800.0, 600.0).unwrap();
		assert!(q.x > 400.0 && q.y < 300.0);
	}

	#[test]
	fn center_ray_hits_target_plane_at_distance() {
		let camera = CameraState::default();
		let ray = camera.ray_through(0.0, 0.0, 1.0);
		let t = ray.intersect_plane(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0)).unwrap();
		assert!((t - 1000.0).abs() < 1e-9);
		assert!(ray.intersect_sphere(Vec3::new(0.0, 0.0, 0.0), 5.0).is_some());
		assert!(ray.intersect_sphere(Vec3::new(50.0, 0.0, 0.0), 5.0).is_none());
	}

	#[test]
	fn zoom_to_fit_centres_on_points() {
		let points = [Vec3::new(-100.0, -50.0, 0.0), Vec3::new(100.0, 50.0, 0.0)];
		let fitted = zoom_to_fit(&CameraState::default(), &points, 10.0, 50.0, 5000.0).unwrap();
		assert_eq!(fitted.look_at, Vec3::ZERO);
		assert!(fitted.distance() > 100.0);
		assert!(zoom_to_fit(&CameraState::default(), &[], 10.0, 50.0, 5000.0).is_none());
	}
}
