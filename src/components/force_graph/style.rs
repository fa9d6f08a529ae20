//! Visual encoding of nodes and edges.
//!
//! Every resolver is a pure function of type strings and interaction
//! flags; styles are rebuilt each frame and never cached per entity.

use std::collections::HashMap;

use super::color::{SpecialColor, entity_color, relation_color};
use super::types::{EdgeDirection, GraphEdge, GraphNode};

/// Dash pattern for inbound edges, as `on,off` pixels.
pub const INBOUND_DASH: [f64; 2] = [8.0, 4.0];

const EDGE_WIDTH: f64 = 1.5;
const EDGE_OPACITY: f64 = 0.6;
const HOVER_WIDTH_SCALE: f64 = 2.0;
const HOVER_OPACITY_SCALE: f64 = 1.5;
const FILTERED_WIDTH_SCALE: f64 = 0.5;
const FILTERED_OPACITY_SCALE: f64 = 0.25;

const NODE_SIZE: f64 = 5.0;
const HIGHLIGHT_SIZE_SCALE: f64 = 1.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStyle {
	Solid,
	Dashed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
	/// Filled arrowhead.
	ArrowSolid,
	/// Outlined arrowhead.
	ArrowDashed,
}

/// How an edge is currently being interacted with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeInteraction {
	#[default]
	Normal,
	Hovered,
	Filtered,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkStyle {
	pub stroke: String,
	pub stroke_width: f64,
	pub stroke_opacity: f64,
	pub line_style: LineStyle,
	pub dash: Option<[f64; 2]>,
	pub marker: Marker,
}

impl LinkStyle {
	/// SVG-style `stroke-dasharray` value.
	pub fn dash_pattern(&self) -> Option<String> {
		self.dash.map(|[on, off]| format!("{on},{off}"))
	}
}

/// Base edge style: direction picks line style, dash and marker, the
/// relation type picks the colour.
pub fn resolve_edge_style(edge: &GraphEdge) -> LinkStyle {
	let (line_style, dash, marker) = match edge.direction() {
		EdgeDirection::Outbound => (LineStyle::Solid, None, Marker::ArrowSolid),
		EdgeDirection::Inbound => (LineStyle::Dashed, Some(INBOUND_DASH), Marker::ArrowDashed),
	};
	LinkStyle {
		stroke: relation_color(edge.relation),
		stroke_width: EDGE_WIDTH,
		stroke_opacity: EDGE_OPACITY,
		line_style,
		dash,
		marker,
	}
}

/// Base style with the interaction applied to width and opacity only.
pub fn resolve_edge_style_with(edge: &GraphEdge, interaction: EdgeInteraction) -> LinkStyle {
	let base = resolve_edge_style(edge);
	match interaction {
		EdgeInteraction::Normal => base,
		EdgeInteraction::Hovered => LinkStyle {
			stroke_width: base.stroke_width * HOVER_WIDTH_SCALE,
			stroke_opacity: (base.stroke_opacity * HOVER_OPACITY_SCALE).min(1.0),
			..base
		},
		EdgeInteraction::Filtered => LinkStyle {
			stroke_width: base.stroke_width * FILTERED_WIDTH_SCALE,
			stroke_opacity: base.stroke_opacity * FILTERED_OPACITY_SCALE,
			..base
		},
	}
}

/// Border treatment derived from the two data-quality flags.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionalStyle {
	pub border_color: Option<String>,
	pub border_width: f64,
	pub border_dash: Option<[f64; 2]>,
	pub opacity: f64,
}

pub fn conditional_node_style(node: &GraphNode) -> ConditionalStyle {
	match (node.is_xpac, node.has_unverified_author) {
		(true, true) => ConditionalStyle {
			border_color: Some(SpecialColor::Warning.hex()),
			border_width: 2.0,
			border_dash: Some([4.0, 2.0]),
			opacity: 0.75,
		},
		(true, false) => ConditionalStyle {
			border_color: Some(SpecialColor::Muted.hex()),
			border_width: 1.5,
			border_dash: Some([4.0, 2.0]),
			opacity: 0.75,
		},
		(false, true) => ConditionalStyle {
			border_color: Some(SpecialColor::Warning.hex()),
			border_width: 2.5,
			border_dash: None,
			opacity: 1.0,
		},
		(false, false) => ConditionalStyle {
			border_color: None,
			border_width: 0.0,
			border_dash: None,
			opacity: 1.0,
		},
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	pub fill: String,
	pub size: f64,
	pub opacity: f64,
	pub border_color: Option<String>,
	pub border_width: f64,
	pub border_dash: Option<[f64; 2]>,
	pub highlighted: bool,
}

/// Node style. A community colour, when both the id and the palette are
/// given and the palette has an entry, replaces the entity-type colour.
pub fn resolve_node_style(
	node: &GraphNode,
	is_highlighted: bool,
	community_id: Option<usize>,
	community_colors: Option<&HashMap<usize, String>>,
) -> NodeStyle {
	let fill = community_id
		.zip(community_colors)
		.and_then(|(id, colors)| colors.get(&id).cloned())
		.unwrap_or_else(|| entity_color(node.entity_type));
	let conditional = conditional_node_style(node);
	let size = if is_highlighted {
		NODE_SIZE * HIGHLIGHT_SIZE_SCALE
	} else {
		NODE_SIZE
	};
	NodeStyle {
		fill,
		size,
		opacity: if is_highlighted { 1.0 } else { conditional.opacity },
		border_color: conditional.border_color,
		border_width: conditional.border_width,
		border_dash: conditional.border_dash,
		highlighted: is_highlighted,
	}
}

/// Dimmed copy for nodes outside the highlighted set.
pub fn dimmed(style: NodeStyle) -> NodeStyle {
	NodeStyle {
		opacity: style.opacity * 0.2,
		..style
	}
}

/// Screen-reader label: the base label followed by flag descriptions,
/// extended-index first.
pub fn accessible_label(node: &GraphNode) -> String {
	let flags: Vec<&str> = [
		(node.is_xpac, "extended research output"),
		(node.has_unverified_author, "unverified author"),
	]
	.into_iter()
	.filter_map(|(set, text)| set.then_some(text))
	.collect();

	if flags.is_empty() {
		node.label.clone()
	} else {
		format!("{} ({})", node.label, flags.join(", "))
	}
}
