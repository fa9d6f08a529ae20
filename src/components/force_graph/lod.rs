//! Level-of-detail selection.
//!
//! Each node's tier is the lower of a purely geometric tier (distance to
//! the camera) and a global ceiling driven by recent frame times.

use std::collections::VecDeque;

use log::info;
use serde::{Deserialize, Serialize};

use super::camera::Vec3;

/// Rendering quality tier, ordered `Low < Medium < High`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LodLevel {
	Low,
	Medium,
	High,
}

impl LodLevel {
	fn lower(self) -> Self {
		match self {
			LodLevel::High => LodLevel::Medium,
			_ => LodLevel::Low,
		}
	}

	fn higher(self) -> Self {
		match self {
			LodLevel::Low => LodLevel::Medium,
			_ => LodLevel::High,
		}
	}

	/// Fixed render settings for this tier.
	pub fn settings(self) -> LodSettings {
		match self {
			LodLevel::High => LodSettings {
				sphere_segments: 16,
				show_label: true,
				material: Material::Phong,
				show_highlight_ring: true,
			},
			LodLevel::Medium => LodSettings {
				sphere_segments: 8,
				show_label: true,
				material: Material::Phong,
				show_highlight_ring: false,
			},
			LodLevel::Low => LodSettings {
				sphere_segments: 4,
				show_label: false,
				material: Material::Basic,
				show_highlight_ring: false,
			},
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			LodLevel::High => "high",
			LodLevel::Medium => "medium",
			LodLevel::Low => "low",
		}
	}
}

/// Shading model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Material {
	/// Lit, shaded.
	Phong,
	/// Flat, unlit.
	Basic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LodSettings {
	pub sphere_segments: u32,
	pub show_label: bool,
	pub material: Material,
	pub show_highlight_ring: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
	/// Nodes closer than this render at [`LodLevel::High`].
	pub high_distance: f64,
	/// Nodes closer than this (and not high) render at [`LodLevel::Medium`].
	pub medium_distance: f64,
	/// Below this rolling fps the ceiling drops a tier.
	pub min_fps: f64,
	/// At or above this rolling fps the ceiling may recover.
	pub recovery_fps: f64,
	/// How long a condition must hold before the next ceiling change.
	pub cooldown_ms: f64,
	/// Frame times kept for the rolling average.
	pub window: usize,
}

impl Default for LodConfig {
	fn default() -> Self {
		Self {
			high_distance: 300.0,
			medium_distance: 800.0,
			min_fps: 30.0,
			recovery_fps: 55.0,
			cooldown_ms: 2_000.0,
			window: 60,
		}
	}
}

pub struct LodManager {
	config: LodConfig,
	frame_times: VecDeque<f64>,
	ceiling: LodLevel,
	last_change_ms: Option<f64>,
	healthy_since_ms: Option<f64>,
}

impl LodManager {
	pub fn new(config: LodConfig) -> Self {
		Self {
			frame_times: VecDeque::with_capacity(config.window.max(1)),
			config,
			ceiling: LodLevel::High,
			last_change_ms: None,
			healthy_since_ms: None,
		}
	}

	pub fn config(&self) -> &LodConfig {
		&self.config
	}

	/// Current global ceiling.
	pub fn ceiling(&self) -> LodLevel {
		self.ceiling
	}

	/// Rolling average fps, `None` until a frame is recorded.
	pub fn average_fps(&self) -> Option<f64> {
		if self.frame_times.is_empty() {
			return None;
		}
		let avg = self.frame_times.iter().sum::<f64>() / self.frame_times.len() as f64;
		(avg > 0.0).then(|| 1_000.0 / avg)
	}

	/// Feed one frame's duration and update the ceiling.
	pub fn record_frame(&mut self, frame_ms: f64, now_ms: f64) {
		if !frame_ms.is_finite() || frame_ms <= 0.0 {
			return;
		}
		self.frame_times.push_back(frame_ms);
		while self.frame_times.len() > self.config.window.max(1) {
			self.frame_times.pop_front();
		}
		let Some(fps) = self.average_fps() else {
			return;
		};

		let cooled = self
			.last_change_ms
			.is_none_or(|at| now_ms - at >= self.config.cooldown_ms);

		if fps < self.config.min_fps {
			self.healthy_since_ms = None;
			if cooled && self.ceiling != LodLevel::Low {
				self.set_ceiling(self.ceiling.lower(), now_ms, fps);
			}
		} else if fps >= self.config.recovery_fps {
			let since = *self.healthy_since_ms.get_or_insert(now_ms);
			if self.ceiling != LodLevel::High && now_ms - since >= self.config.cooldown_ms {
				self.set_ceiling(self.ceiling.higher(), now_ms, fps);
				self.healthy_since_ms = Some(now_ms);
			}
		} else {
			self.healthy_since_ms = None;
		}
	}

	fn set_ceiling(&mut self, level: LodLevel, now_ms: f64, fps: f64) {
		info!(
			"lod: ceiling {} -> {} at {:.1} fps",
			self.ceiling.as_str(),
			level.as_str(),
			fps
		);
		self.ceiling = level;
		self.last_change_ms = Some(now_ms);
	}

	/// Purely geometric tier.
	pub fn level_for_distance(&self, distance: f64) -> LodLevel {
		if distance < self.config.high_distance {
			LodLevel::High
		} else if distance < self.config.medium_distance {
			LodLevel::Medium
		} else {
			LodLevel::Low
		}
	}

	/// Effective tier for a node seen from `camera`.
	pub fn level_for(&self, node: Vec3, camera: Vec3) -> LodLevel {
		self.level_for_distance(node.distance(camera)).min(self.ceiling)
	}

	/// Forget frame history and restore the full-quality ceiling.
	pub fn reset(&mut self) {
		self.frame_times.clear();
		self.ceiling = LodLevel::High;
		self.last_change_ms = None;
		self.healthy_since_ms = None;
	}
}

impl Default for LodManager {
	fn default() -> Self {
		Self::new(LodConfig::default())
	}
}
