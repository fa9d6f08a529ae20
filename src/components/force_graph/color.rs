//! Deterministic string-to-colour derivation.
//!
//! Colours are a display aid, not an identity scheme: distinct names may
//! share a hue.

use super::types::{EntityType, RelationType};

const ENTITY_SATURATION: f64 = 65.0;
const ENTITY_LIGHTNESS: f64 = 50.0;
const RELATION_SATURATION: f64 = 75.0;
const RELATION_LIGHTNESS: f64 = 45.0;

/// djb2-style rolling hash over UTF-16 code units (`h = h * 33 ^ unit`).
pub fn hash(name: &str) -> u32 {
	name.encode_utf16()
		.fold(5381u32, |h, unit| h.wrapping_mul(33) ^ u32::from(unit))
}

pub fn hue(name: &str) -> u32 {
	hash(name) % 360
}

/// HSL (degrees, percent, percent) to an upper-case `#RRGGBB` string.
pub fn hsl_to_hex(h: f64, s: f64, l: f64) -> String {
	let (s, l) = (s.clamp(0.0, 100.0) / 100.0, l.clamp(0.0, 100.0) / 100.0);
	let a = s * l.min(1.0 - l);
	let channel = |n: f64| {
		let k = (n + h.rem_euclid(360.0) / 30.0) % 12.0;
		let c = l - a * (k - 3.0).min(9.0 - k).clamp(-1.0, 1.0);
		(c * 255.0).round().clamp(0.0, 255.0) as u8
	};
	format!("#{:02X}{:02X}{:02X}", channel(0.0), channel(8.0), channel(4.0))
}

/// Colour of any string at the given saturation and lightness tier.
pub fn hash_color(name: &str, saturation: f64, lightness: f64) -> String {
	hsl_to_hex(f64::from(hue(name)), saturation, lightness)
}

pub fn entity_color(entity_type: EntityType) -> String {
	hash_color(entity_type.as_str(), ENTITY_SATURATION, ENTITY_LIGHTNESS)
}

pub fn relation_color(relation: RelationType) -> String {
	hash_color(relation.as_str(), RELATION_SATURATION, RELATION_LIGHTNESS)
}

/// Colours for states that override type colouring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialColor {
	/// Grey used for de-emphasised and extended-index entities.
	Muted,
	/// Amber used for data-quality warnings.
	Warning,
}

impl SpecialColor {
	pub fn hex(self) -> String {
		match self {
			SpecialColor::Muted => hsl_to_hex(220.0, 9.0, 46.0),
			SpecialColor::Warning => hsl_to_hex(38.0, 92.0, 50.0),
		}
	}
}

/// `#RRGGBB` plus an opacity as a canvas `rgba(...)` string.
pub fn with_alpha(hex: &str, alpha: f64) -> String {
	let parse = |range: std::ops::Range<usize>| {
		hex.get(range)
			.and_then(|s| u8::from_str_radix(s, 16).ok())
			.unwrap_or(0)
	};
	format!(
		"rgba({}, {}, {}, {:.3})",
		parse(1..3),
		parse(3..5),
		parse(5..7),
		alpha.clamp(0.0, 1.0)
	)
}
