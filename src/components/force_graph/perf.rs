//! Rolling frame-rate sampling.

use std::collections::VecDeque;

use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PerformanceLevel {
	#[default]
	Good,
	Ok,
	Poor,
}

impl PerformanceLevel {
	pub fn from_fps(fps: f64) -> Self {
		if fps >= 55.0 {
			PerformanceLevel::Good
		} else if fps >= 30.0 {
			PerformanceLevel::Ok
		} else {
			PerformanceLevel::Poor
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			PerformanceLevel::Good => "good",
			PerformanceLevel::Ok => "ok",
			PerformanceLevel::Poor => "poor",
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerformanceStats {
	pub fps: f64,
	/// Mean interval between frame starts, in ms.
	pub avg_frame_time: f64,
	/// Mean time spent between `frame_start` and `frame_end`, in ms.
	pub avg_render_time: f64,
	/// Percentage of frames slower than twice the target frame time.
	pub jank_score: f64,
	pub level: PerformanceLevel,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
	pub target_fps: f64,
	/// Frame timestamps kept.
	pub window: usize,
	pub sample_interval_ms: f64,
}

impl Default for MonitorConfig {
	fn default() -> Self {
		Self {
			target_fps: 60.0,
			window: 120,
			sample_interval_ms: 1_000.0,
		}
	}
}

impl MonitorConfig {
	fn jank_threshold_ms(&self) -> f64 {
		2.0 * 1_000.0 / self.target_fps.max(1.0)
	}
}

pub struct PerformanceMonitor {
	config: MonitorConfig,
	enabled: bool,
	starts: VecDeque<f64>,
	render_times: VecDeque<f64>,
	open_frame: Option<f64>,
	last_sample_ms: Option<f64>,
	stats: PerformanceStats,
	in_poor: bool,
	/// Fps of the last crossing into poor, until taken.
	dropped_to: Option<f64>,
}

impl PerformanceMonitor {
	pub fn new(config: MonitorConfig) -> Self {
		Self {
			starts: VecDeque::with_capacity(config.window),
			render_times: VecDeque::with_capacity(config.window),
			config,
			enabled: true,
			open_frame: None,
			last_sample_ms: None,
			stats: PerformanceStats::default(),
			in_poor: false,
			dropped_to: None,
		}
	}

	/// Fps at the last crossing into poor. Each crossing is reported once.
	pub fn take_drop(&mut self) -> Option<f64> {
		self.dropped_to.take()
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// Disabling discards all samples.
	pub fn set_enabled(&mut self, enabled: bool) {
		if self.enabled != enabled {
			self.enabled = enabled;
			self.reset();
		}
	}

	pub fn reset(&mut self) {
		self.starts.clear();
		self.render_times.clear();
		self.open_frame = None;
		self.last_sample_ms = None;
		self.stats = PerformanceStats::default();
		self.in_poor = false;
		self.dropped_to = None;
	}

	pub fn stats(&self) -> PerformanceStats {
		self.stats
	}

	pub fn frame_start(&mut self, now_ms: f64) {
		if !self.enabled {
			return;
		}
		push_bounded(&mut self.starts, now_ms, self.config.window.max(2));
		self.open_frame = Some(now_ms);
	}

	pub fn frame_end(&mut self, now_ms: f64) {
		if let Some(start) = self.open_frame.take() {
			push_bounded(
				&mut self.render_times,
				(now_ms - start).max(0.0),
				self.config.window.max(2),
			);
		}
	}

	/// Recompute stats once per sampling interval. Returns the fresh stats
	/// when a sample was taken.
	pub fn sample(&mut self, now_ms: f64) -> Option<PerformanceStats> {
		if !self.enabled {
			return None;
		}
		let last = *self.last_sample_ms.get_or_insert(now_ms);
		if now_ms - last < self.config.sample_interval_ms {
			return None;
		}
		self.last_sample_ms = Some(now_ms);

		let (first, newest) = (*self.starts.front()?, *self.starts.back()?);
		let frames = self.starts.len() - 1;
		let elapsed = newest - first;
		if frames == 0 || elapsed <= 0.0 {
			return None;
		}

		let threshold = self.config.jank_threshold_ms();
		let slow = self
			.starts
			.iter()
			.zip(self.starts.iter().skip(1))
			.filter(|(a, b)| *b - *a > threshold)
			.count();
		let avg_render_time = if self.render_times.is_empty() {
			0.0
		} else {
			self.render_times.iter().sum::<f64>() / self.render_times.len() as f64
		};

		let fps = frames as f64 * 1_000.0 / elapsed;
		let level = PerformanceLevel::from_fps(fps);
		self.stats = PerformanceStats {
			fps,
			avg_frame_time: elapsed / frames as f64,
			avg_render_time,
			jank_score: slow as f64 * 100.0 / frames as f64,
			level,
		};

		let poor = level == PerformanceLevel::Poor;
		if poor && !self.in_poor {
			warn!("perf: dropped to {fps:.1} fps");
			self.dropped_to = Some(fps);
		}
		self.in_poor = poor;
		Some(self.stats)
	}
}

impl Default for PerformanceMonitor {
	fn default() -> Self {
		Self::new(MonitorConfig::default())
	}
}

fn push_bounded(buf: &mut VecDeque<f64>, value: f64, cap: usize) {
	buf.push_back(value);
	while buf.len() > cap {
		buf.pop_front();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Run frames at a steady interval, sampling after each.
	fn drive(monitor: &mut PerformanceMonitor, now: &mut f64, interval: f64, frames: usize) {
		for _ in 0..frames {
			monitor.frame_start(*now);
			monitor.frame_end(*now + 2.0);
			monitor.sample(*now);
			*now += interval;
		}
	}

	#[test]
	fn steady_sixty_fps_is_good() {
		let mut monitor = PerformanceMonitor::default();
		let mut now = 0.0;
		drive(&mut monitor, &mut now, 1_000.0 / 60.0, 120);
		let stats = monitor.stats();
		assert!((stats.fps - 60.0).abs() < 0.5, "fps {}", stats.fps);
		assert!((stats.avg_frame_time - 16.67).abs() < 0.1);
		assert!((stats.avg_render_time - 2.0).abs() < 1e-9);
		assert_eq!(stats.jank_score, 0.0);
		assert_eq!(stats.level, PerformanceLevel::Good);
	}

	#[test]
	fn levels_by_fps() {
		assert_eq!(PerformanceLevel::from_fps(55.0), PerformanceLevel::Good);
		assert_eq!(PerformanceLevel::from_fps(54.9), PerformanceLevel::Ok);
		assert_eq!(PerformanceLevel::from_fps(30.0), PerformanceLevel::Ok);
		assert_eq!(PerformanceLevel::from_fps(29.9), PerformanceLevel::Poor);
	}

	#[test]
	fn jank_counts_slow_frames() {
		let mut monitor = PerformanceMonitor::default();
		let mut now = 0.0;
		// Alternate 10ms and 40ms frames: half exceed the 33.3ms threshold.
		for i in 0..100 {
			monitor.frame_start(now);
			monitor.frame_end(now);
			now += if i % 2 == 0 { 10.0 } else { 40.0 };
		}
		let stats = monitor.sample(10_000.0).or_else(|| monitor.sample(20_000.0)).unwrap();
		assert!((stats.jank_score - 49.49).abs() < 1.0, "jank {}", stats.jank_score);
	}

	#[test]
	fn drop_is_reported_once_per_crossing() {
		let mut monitor = PerformanceMonitor::default();
		let mut drops = Vec::new();
		let mut now = 0.0;
		let mut run = |monitor: &mut PerformanceMonitor, now: &mut f64, interval: f64, frames: usize| {
			for _ in 0..frames {
				drive(monitor, now, interval, 1);
				drops.extend(monitor.take_drop());
			}
		};

		run(&mut monitor, &mut now, 50.0, 200);
		run(&mut monitor, &mut now, 1_000.0 / 60.0, 400);
		assert_eq!(monitor.stats().level, PerformanceLevel::Good);
		run(&mut monitor, &mut now, 50.0, 200);

		assert_eq!(drops.len(), 2);
		assert!(drops.iter().all(|&fps| fps < 30.0));
		assert_eq!(monitor.take_drop(), None);
	}

	#[test]
	fn sampling_is_interval_gated() {
		let mut monitor = PerformanceMonitor::default();
		monitor.frame_start(0.0);
		assert!(monitor.sample(0.0).is_none());
		monitor.frame_start(16.0);
		assert!(monitor.sample(500.0).is_none());
		assert!(monitor.sample(1_000.0).is_some());
	}

	#[test]
	fn disabling_discards_state() {
		let mut monitor = PerformanceMonitor::default();
		let mut now = 0.0;
		drive(&mut monitor, &mut now, 50.0, 100);
		assert_ne!(monitor.stats(), PerformanceStats::default());

		monitor.set_enabled(false);
		assert_eq!(monitor.stats(), PerformanceStats::default());
		monitor.frame_start(now);
		assert!(monitor.sample(now + 5_000.0).is_none());
		assert!(!monitor.is_enabled());
	}
}
