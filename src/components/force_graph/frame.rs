//! One frame of the rendering pipeline as a pure function.
//!
//! The camera pose is fixed first, every node then gets a LOD tier from
//! that pose, and styles are resolved last. The resulting snapshot is all
//! the draw step needs.

use std::collections::{HashMap, HashSet};

use super::camera::{CameraState, Vec3};
use super::lod::{LodLevel, LodManager};
use super::style::{
	EdgeInteraction, LinkStyle, NodeStyle, dimmed, resolve_edge_style_with, resolve_node_style,
};
use super::types::{GraphEdge, GraphNode};

pub struct NodeView<'a> {
	pub node: &'a GraphNode,
	pub position: Vec3,
}

pub struct EdgeView<'a> {
	pub edge: &'a GraphEdge,
	pub source: usize,
	pub target: usize,
}

/// Community assignment and palette.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Communities {
	pub membership: HashMap<String, usize>,
	pub colors: HashMap<usize, String>,
}

/// Which nodes are emphasised this frame.
#[derive(Default)]
pub struct Emphasis<'a> {
	/// Node under the pointer and its neighbours, by index.
	pub hovered: Option<(usize, &'a HashSet<usize>)>,
	/// Caller-selected node ids.
	pub selected: Option<&'a HashSet<String>>,
	pub communities: Option<&'a Communities>,
}

impl Emphasis<'_> {
	fn contains(&self, index: usize, id: &str) -> Option<bool> {
		if let Some((hovered, neighbors)) = self.hovered {
			return Some(index == hovered || neighbors.contains(&index));
		}
		match self.selected {
			Some(selected) if !selected.is_empty() => Some(selected.contains(id)),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeFrame {
	pub index: usize,
	pub position: Vec3,
	pub lod: LodLevel,
	pub style: NodeStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeFrame {
	pub source: usize,
	pub target: usize,
	pub style: LinkStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameSnapshot {
	pub camera: CameraState,
	pub ceiling: LodLevel,
	pub nodes: Vec<NodeFrame>,
	pub edges: Vec<EdgeFrame>,
}

pub fn build_frame(
	camera: CameraState,
	lod: &LodManager,
	nodes: &[NodeView<'_>],
	edges: &[EdgeView<'_>],
	emphasis: &Emphasis<'_>,
) -> FrameSnapshot {
	let eye = camera.position;
	let levels: Vec<LodLevel> = nodes.iter().map(|n| lod.level_for(n.position, eye)).collect();

	// `None` when nothing is emphasised.
	let marks: Vec<Option<bool>> = nodes
		.iter()
		.enumerate()
		.map(|(i, n)| emphasis.contains(i, &n.node.id))
		.collect();

	let node_frames = nodes
		.iter()
		.enumerate()
		.map(|(i, view)| {
			let community = emphasis
				.communities
				.and_then(|c| c.membership.get(&view.node.id).copied());
			let palette = emphasis.communities.map(|c| &c.colors);
			let style = resolve_node_style(view.node, marks[i] == Some(true), community, palette);
			NodeFrame {
				index: i,
				position: view.position,
				lod: levels[i],
				style: if marks[i] == Some(false) { dimmed(style) } else { style },
			}
		})
		.collect();

	let edge_frames = edges
		.iter()
		.filter(|e| e.source < nodes.len() && e.target < nodes.len())
		.map(|e| {
			let interaction = match (marks[e.source], marks[e.target]) {
				(Some(true), Some(true)) => EdgeInteraction::Hovered,
				(Some(_), Some(_)) => EdgeInteraction::Filtered,
				_ => EdgeInteraction::Normal,
			};
			EdgeFrame {
				source: e.source,
				target: e.target,
				style: resolve_edge_style_with(e.edge, interaction),
			}
		})
		.collect();

	FrameSnapshot {
		camera,
		ceiling: lod.ceiling(),
		nodes: node_frames,
		edges: edge_frames,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::color::entity_color;
	use crate::components::force_graph::style::resolve_edge_style;
	use crate::components::force_graph::types::{EntityType, RelationType};

	fn fixture() -> (Vec<GraphNode>, Vec<GraphEdge>) {
		(
			vec![
				GraphNode::new("W1", EntityType::Works, "Paper"),
				GraphNode::new("A1", EntityType::Authors, "Ada"),
				GraphNode::new("I1", EntityType::Institutions, "Uni"),
			],
			vec![
				GraphEdge::new("W1", "A1", RelationType::Authorship),
				GraphEdge::new("A1", "I1", RelationType::Affiliation),
			],
		)
	}

	fn views<'a>(nodes: &'a [GraphNode], edges: &'a [GraphEdge]) -> (Vec<NodeView<'a>>, Vec<EdgeView<'a>>) {
		let nv = nodes
			.iter()
			.enumerate()
			.map(|(i, node)| NodeView {
				node,
				position: Vec3::new(i as f64 * 100.0, 0.0, 0.0),
			})
			.collect();
		let ev = vec![
			EdgeView { edge: &edges[0], source: 0, target: 1 },
			EdgeView { edge: &edges[1], source: 1, target: 2 },
		];
		(nv, ev)
	}

	#[test]
	fn lod_uses_the_frame_camera() {
		let (nodes, edges) = fixture();
		let (nv, ev) = views(&nodes, &edges);
		let lod = LodManager::default();

		let near = CameraState::default().at_distance(100.0);
		let far = CameraState::default().at_distance(4_000.0);
		let a = build_frame(near, &lod, &nv, &ev, &Emphasis::default());
		let b = build_frame(far, &lod, &nv, &ev, &Emphasis::default());

		assert_eq!(a.nodes[0].lod, LodLevel::High);
		assert_eq!(b.nodes[0].lod, LodLevel::Low);
		assert_eq!(a.camera, near);
	}

	#[test]
	fn no_emphasis_means_base_styles() {
		let (nodes, edges) = fixture();
		let (nv, ev) = views(&nodes, &edges);
		let frame = build_frame(CameraState::default(), &LodManager::default(), &nv, &ev, &Emphasis::default());
		assert_eq!(frame.edges[0].style, resolve_edge_style(&edges[0]));
		assert_eq!(frame.nodes[0].style.fill, entity_color(EntityType::Works));
		assert_eq!(frame.nodes[0].style.opacity, 1.0);
	}

	#[test]
	fn hover_emphasises_neighbourhood_and_dims_the_rest() {
		let (nodes, edges) = fixture();
		let (nv, ev) = views(&nodes, &edges);
		let neighbors = HashSet::from([1]);
		let emphasis = Emphasis {
			hovered: Some((0, &neighbors)),
			..Emphasis::default()
		};
		let frame = build_frame(CameraState::default(), &LodManager::default(), &nv, &ev, &emphasis);

		assert!(frame.nodes[0].style.highlighted && frame.nodes[1].style.highlighted);
		assert!(frame.nodes[2].style.opacity < 1.0);

		let base = resolve_edge_style(&edges[0]);
		assert!(frame.edges[0].style.stroke_width > base.stroke_width);
		assert!(frame.edges[1].style.stroke_opacity < resolve_edge_style(&edges[1]).stroke_opacity);
	}

	#[test]
	fn selection_applies_without_hover_and_communities_recolor() {
		let (nodes, edges) = fixture();
		let (nv, ev) = views(&nodes, &edges);
		let selected = HashSet::from(["I1".to_string()]);
		let communities = Communities {
			membership: HashMap::from([("W1".to_string(), 0)]),
			colors: HashMap::from([(0, "#ABCDEF".to_string())]),
		};
		let emphasis = Emphasis {
			selected: Some(&selected),
			communities: Some(&communities),
			..Emphasis::default()
		};
		let frame = build_frame(CameraState::default(), &LodManager::default(), &nv, &ev, &emphasis);
		assert!(frame.nodes[2].style.highlighted);
		assert!(!frame.nodes[0].style.highlighted);
		assert_eq!(frame.nodes[0].style.fill, "#ABCDEF");
	}
}
