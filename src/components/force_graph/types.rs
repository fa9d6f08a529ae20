use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of bibliographic entity a node stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
	/// A scholarly work (article, book, dataset).
	Works,
	/// A person credited on works.
	Authors,
	/// A journal, repository or conference.
	Sources,
	/// A university or research organisation.
	Institutions,
	/// A research topic.
	Topics,
	/// A legacy concept tag.
	Concepts,
	/// A publishing organisation.
	Publishers,
	/// A grant-giving body.
	Funders,
	/// A free-text keyword.
	Keywords,
}

impl EntityType {
	/// All entity types, in route order.
	pub const ALL: [EntityType; 9] = [
		EntityType::Works,
		EntityType::Authors,
		EntityType::Sources,
		EntityType::Institutions,
		EntityType::Topics,
		EntityType::Concepts,
		EntityType::Publishers,
		EntityType::Funders,
		EntityType::Keywords,
	];

	/// Stable string form, also the route segment and the colour hash input.
	pub fn as_str(self) -> &'static str {
		match self {
			EntityType::Works => "works",
			EntityType::Authors => "authors",
			EntityType::Sources => "sources",
			EntityType::Institutions => "institutions",
			EntityType::Topics => "topics",
			EntityType::Concepts => "concepts",
			EntityType::Publishers => "publishers",
			EntityType::Funders => "funders",
			EntityType::Keywords => "keywords",
		}
	}

	/// Parse a route segment such as `works`.
	pub fn from_segment(segment: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|t| t.as_str() == segment)
	}

	/// Singular, capitalised display name.
	pub fn display_name(self) -> &'static str {
		match self {
			EntityType::Works => "Work",
			EntityType::Authors => "Author",
			EntityType::Sources => "Source",
			EntityType::Institutions => "Institution",
			EntityType::Topics => "Topic",
			EntityType::Concepts => "Concept",
			EntityType::Publishers => "Publisher",
			EntityType::Funders => "Funder",
			EntityType::Keywords => "Keyword",
		}
	}
}

impl fmt::Display for EntityType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Kind of relationship an edge encodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
	/// Work -> author.
	Authorship,
	/// Author -> institution.
	Affiliation,
	/// Work -> source.
	Publication,
	/// Work -> cited work.
	Reference,
	/// Work -> topic.
	Topic,
	/// Work -> funder.
	#[serde(rename = "FUNDED_BY")]
	Funded,
	/// Source -> publisher.
	HostOrganization,
}

impl RelationType {
	/// All relation types.
	pub const ALL: [RelationType; 7] = [
		RelationType::Authorship,
		RelationType::Affiliation,
		RelationType::Publication,
		RelationType::Reference,
		RelationType::Topic,
		RelationType::Funded,
		RelationType::HostOrganization,
	];

	/// Stable string form, used as the colour hash input.
	pub fn as_str(self) -> &'static str {
		match self {
			RelationType::Authorship => "AUTHORSHIP",
			RelationType::Affiliation => "AFFILIATION",
			RelationType::Publication => "PUBLICATION",
			RelationType::Reference => "REFERENCE",
			RelationType::Topic => "TOPIC",
			RelationType::Funded => "FUNDED_BY",
			RelationType::HostOrganization => "HOST_ORGANIZATION",
		}
	}
}

/// Direction of an edge relative to the entity being viewed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
	/// The viewed entity points at the other end.
	#[default]
	Outbound,
	/// The other end points at the viewed entity.
	Inbound,
}

/// Node as supplied by the caller. Never mutated by the renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
	pub id: String,
	pub entity_type: EntityType,
	pub label: String,
	pub entity_id: String,
	#[serde(default)]
	pub x: Option<f64>,
	#[serde(default)]
	pub y: Option<f64>,
	#[serde(default)]
	pub z: Option<f64>,
	#[serde(default)]
	pub is_xpac: bool,
	#[serde(default)]
	pub has_unverified_author: bool,
}

impl GraphNode {
	/// Node without explicit position or flags.
	pub fn new(
		id: impl Into<String>,
		entity_type: EntityType,
		label: impl Into<String>,
	) -> Self {
		let id = id.into();
		Self {
			entity_id: id.clone(),
			id,
			entity_type,
			label: label.into(),
			x: None,
			y: None,
			z: None,
			is_xpac: false,
			has_unverified_author: false,
		}
	}
}

/// Edge referencing two nodes by id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
	pub id: String,
	pub source: String,
	pub target: String,
	#[serde(rename = "type")]
	pub relation: RelationType,
	#[serde(default)]
	pub direction: Option<EdgeDirection>,
}

impl GraphEdge {
	/// Edge without an explicit direction.
	pub fn new(
		source: impl Into<String>,
		target: impl Into<String>,
		relation: RelationType,
	) -> Self {
		let (source, target) = (source.into(), target.into());
		Self {
			id: format!("{source}-{}-{target}", relation.as_str()),
			source,
			target,
			relation,
			direction: None,
		}
	}

	/// Same edge with a direction set.
	pub fn with_direction(mut self, direction: EdgeDirection) -> Self {
		self.direction = Some(direction);
		self
	}

	/// Direction, defaulting to outbound when unset.
	pub fn direction(&self) -> EdgeDirection {
		self.direction.unwrap_or_default()
	}
}

/// Whether non-selected nodes are dimmed or removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
	/// Dim everything outside the highlighted set.
	#[default]
	Highlight,
	/// Drop everything outside the highlighted set.
	Filter,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	#[serde(default, alias = "links")]
	pub edges: Vec<GraphEdge>,
}

/// Counts of what [`GraphData::sanitized`] dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SanitizeReport {
	pub duplicate_nodes: usize,
	pub dangling_edges: usize,
}

impl GraphData {
	/// Copy with duplicate node ids removed (first occurrence wins) and
	/// edges to unknown nodes dropped.
	pub fn sanitized(&self) -> (GraphData, SanitizeReport) {
		let mut seen = HashSet::with_capacity(self.nodes.len());
		let mut report = SanitizeReport::default();
		let nodes: Vec<GraphNode> = self
			.nodes
			.iter()
			.filter(|node| {
				let fresh = seen.insert(node.id.as_str());
				if !fresh {
					report.duplicate_nodes += 1;
				}
				fresh
			})
			.cloned()
			.collect();

		let edges = retain_connected(&self.edges, &seen, &mut report.dangling_edges);
		(GraphData { nodes, edges }, report)
	}

	/// Apply the display mode. In filter mode with a non-empty selection,
	/// only selected nodes and the edges between them survive.
	pub fn visible(&self, mode: DisplayMode, selected: &HashSet<String>) -> GraphData {
		if mode == DisplayMode::Highlight || selected.is_empty() {
			return self.clone();
		}
		let nodes: Vec<GraphNode> = self
			.nodes
			.iter()
			.filter(|n| selected.contains(&n.id))
			.cloned()
			.collect();
		let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
		let mut dropped = 0;
		let edges = retain_connected(&self.edges, &ids, &mut dropped);
		GraphData { nodes, edges }
	}
}

fn retain_connected(edges: &[GraphEdge], ids: &HashSet<&str>, dropped: &mut usize) -> Vec<GraphEdge> {
	edges
		.iter()
		.filter(|e| {
			let keep = ids.contains(e.source.as_str()) && ids.contains(e.target.as_str());
			if !keep {
				*dropped += 1;
			}
			keep
		})
		.cloned()
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> GraphData {
		GraphData {
			nodes: vec![
				GraphNode::new("W1", EntityType::Works, "First"),
				GraphNode::new("A1", EntityType::Authors, "Ada"),
				GraphNode::new("W1", EntityType::Works, "Duplicate"),
				GraphNode::new("I1", EntityType::Institutions, "Uni"),
			],
			edges: vec![
				GraphEdge::new("W1", "A1", RelationType::Authorship),
				GraphEdge::new("A1", "I1", RelationType::Affiliation),
				GraphEdge::new("W1", "W404", RelationType::Reference),
			],
		}
	}

	#[test]
	fn sanitize_keeps_first_duplicate_and_drops_dangling_edges() {
		let (clean, report) = sample().sanitized();
		assert_eq!(clean.nodes.len(), 3);
		assert_eq!(clean.nodes[0].label, "First");
		assert_eq!(clean.edges.len(), 2);
		assert_eq!(
			report,
			SanitizeReport {
				duplicate_nodes: 1,
				dangling_edges: 1
			}
		);
	}

	#[test]
	fn filter_mode_never_leaves_dangling_edges() {
		let (clean, _) = sample().sanitized();
		let selected: HashSet<String> = ["W1", "A1"].iter().map(|s| s.to_string()).collect();
		let visible = clean.visible(DisplayMode::Filter, &selected);
		assert_eq!(visible.nodes.len(), 2);
		assert_eq!(visible.edges.len(), 1);
		assert_eq!(visible.edges[0].relation, RelationType::Authorship);

		let dimmed = clean.visible(DisplayMode::Highlight, &selected);
		assert_eq!(dimmed, clean);
	}

	#[test]
	fn edge_direction_defaults_to_outbound() {
		let edge = GraphEdge::new("a", "b", RelationType::Topic);
		assert_eq!(edge.direction(), EdgeDirection::Outbound);
		let edge = edge.with_direction(EdgeDirection::Inbound);
		assert_eq!(edge.direction(), EdgeDirection::Inbound);
	}

	#[test]
	fn deserializes_camel_case_json() {
		let json = r#"{
			"nodes": [{"id": "W1", "entityType": "works", "label": "Paper", "entityId": "W1", "isXpac": true}],
			"links": [{"id": "e", "source": "W1", "target": "W1", "type": "REFERENCE", "direction": "inbound"}]
		}"#;
		let data: GraphData = serde_json::from_str(json).unwrap();
		assert!(data.nodes[0].is_xpac);
		assert_eq!(data.edges[0].direction(), EdgeDirection::Inbound);
		assert_eq!(EntityType::from_segment("works"), Some(EntityType::Works));
	}
}
