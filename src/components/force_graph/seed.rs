//! Reproducible initial layout.

use super::camera::Vec3;
use super::types::GraphNode;

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u32 = 42;

const MULTIPLIER: u64 = 1_103_515_245;
const INCREMENT: u64 = 12_345;
const MASK: u64 = 0x7FFF_FFFF;

/// Linear-congruential generator yielding floats in `[0, 1)`.
///
/// The recurrence is evaluated in exact 64-bit integer arithmetic, so a
/// given seed yields the same sequence on every platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeededRandom {
	state: u64,
}

impl SeededRandom {
	pub fn new(seed: u32) -> Self {
		Self {
			state: u64::from(seed) & MASK,
		}
	}

	/// Restart the sequence from `seed`.
	pub fn reseed(&mut self, seed: u32) {
		self.state = u64::from(seed) & MASK;
	}

	pub fn next_f64(&mut self) -> f64 {
		self.state = (self.state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT)) & MASK;
		// A state of exactly MASK would map to 1.0.
		(self.state as f64 / MASK as f64).min(1.0 - f64::EPSILON)
	}

	/// Uniform value in `[-half, half)`.
	pub fn centered(&mut self, half: f64) -> f64 {
		(self.next_f64() - 0.5) * 2.0 * half
	}
}

impl Default for SeededRandom {
	fn default() -> Self {
		Self::new(DEFAULT_SEED)
	}
}

impl Iterator for SeededRandom {
	type Item = f64;

	fn next(&mut self) -> Option<f64> {
		Some(self.next_f64())
	}
}

/// Initial position for every node, in input order.
///
/// Nodes carrying explicit `x`/`y` keep them and do not consume random
/// draws, so adding a pinned node does not shift the others. With
/// `three_d == false` every seeded node lies on the `z = 0` plane.
pub fn seed_positions(nodes: &[GraphNode], seed: u32, spread: f64, three_d: bool) -> Vec<Vec3> {
	let mut rng = SeededRandom::new(seed);
	nodes
		.iter()
		.map(|node| match (node.x, node.y) {
			(Some(x), Some(y)) => Vec3::new(x, y, node.z.unwrap_or(0.0)),
			_ => {
				let x = rng.centered(spread);
				let y = rng.centered(spread);
				let z = if three_d { rng.centered(spread) } else { 0.0 };
				Vec3::new(x, y, z)
			}
		})
		.collect()
}
