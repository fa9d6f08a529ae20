use std::collections::HashSet;

use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_params_map;
use log::warn;

use crate::GraphContext;
use crate::components::force_graph::{
	DisplayMode, EdgeDirection, EntityType, ForceGraphCanvas, GraphData, GraphEdge,
};
use crate::error::{GraphError, Result};

/// Neighbourhood of the entity `id` of kind `segment`: the entity, every
/// node one edge away, and those edges with their direction relative to it.
pub fn resolve_entity(segment: &str, id: &str, data: &GraphData) -> Result<GraphData> {
	let kind = EntityType::from_segment(segment)
		.ok_or_else(|| GraphError::UnknownEntityType(segment.to_string()))?;
	let center = data
		.nodes
		.iter()
		.find(|n| n.entity_type == kind && (n.entity_id == id || n.id == id))
		.ok_or_else(|| GraphError::EntityNotFound {
			kind,
			id: id.to_string(),
		})?;

	let edges: Vec<GraphEdge> = data
		.edges
		.iter()
		.filter(|e| e.source == center.id || e.target == center.id)
		.map(|e| {
			let direction = if e.source == center.id {
				EdgeDirection::Outbound
			} else {
				EdgeDirection::Inbound
			};
			e.clone().with_direction(direction)
		})
		.collect();
	let ids: HashSet<&str> = edges
		.iter()
		.flat_map(|e| [e.source.as_str(), e.target.as_str()])
		.chain([center.id.as_str()])
		.collect();
	let nodes = data
		.nodes
		.iter()
		.filter(|n| ids.contains(n.id.as_str()))
		.cloned()
		.collect();

	Ok(GraphData { nodes, edges })
}

/// Graph of a single entity and its direct relations.
#[component]
pub fn EntityPage() -> impl IntoView {
	let ctx = expect_context::<GraphContext>();
	let params = use_params_map();

	move || {
		let (kind, id) = params.with(|p| {
			(
				p.get("kind").unwrap_or_default(),
				p.get("id").unwrap_or_default(),
			)
		});
		match resolve_entity(&kind, &id, &ctx.data) {
			Ok(neighbourhood) => {
				let center: HashSet<String> = neighbourhood
					.nodes
					.iter()
					.filter(|n| n.entity_id == id || n.id == id)
					.map(|n| n.id.clone())
					.collect();
				view! {
					<div class="fullscreen-graph">
						<ForceGraphCanvas
							data=neighbourhood
							fullscreen=true
							config=ctx.config.clone()
							display_mode=DisplayMode::Highlight
							highlighted=center
							camera_storage_key=format!("bibgraph.camera.{kind}.{id}")
						/>
						<div class="graph-overlay">
							<h1>{id.clone()}</h1>
							<A href="/">"Back to graph"</A>
						</div>
					</div>
				}
					.into_any()
			}
			Err(err) => {
				warn!("entity page: {err}");
				view! {
					<div class="entity-error" role="alert">
						<h1>"Entity not found"</h1>
						<p>{err.to_string()}</p>
						<A href="/">"Back to graph"</A>
					</div>
				}
					.into_any()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::{GraphNode, RelationType};

	fn data() -> GraphData {
		GraphData {
			nodes: vec![
				GraphNode::new("W1", EntityType::Works, "Paper"),
				GraphNode::new("W2", EntityType::Works, "Cited"),
				GraphNode::new("A1", EntityType::Authors, "Ada"),
				GraphNode::new("I1", EntityType::Institutions, "Lab"),
			],
			edges: vec![
				GraphEdge::new("W1", "A1", RelationType::Authorship),
				GraphEdge::new("W2", "W1", RelationType::Reference),
				GraphEdge::new("A1", "I1", RelationType::Affiliation),
			],
		}
	}

	#[test]
	fn missing_work_reports_not_found() {
		let err = resolve_entity("works", "W9999999999999", &data()).unwrap_err();
		assert!(matches!(err, GraphError::EntityNotFound { kind: EntityType::Works, .. }));
		assert_eq!(err.to_string(), "Work W9999999999999 not found");
		assert!(err.to_string().to_lowercase().contains("not found"));
	}

	#[test]
	fn unknown_segment_is_rejected() {
		let err = resolve_entity("papers", "W1", &data()).unwrap_err();
		assert!(matches!(err, GraphError::UnknownEntityType(s) if s == "papers"));
	}

	#[test]
	fn kind_must_match() {
		assert!(resolve_entity("authors", "W1", &data()).is_err());
	}

	#[test]
	fn neighbourhood_carries_directions() {
		let hood = resolve_entity("works", "W1", &data()).unwrap();
		let mut ids: Vec<&str> = hood.nodes.iter().map(|n| n.id.as_str()).collect();
		ids.sort();
		assert_eq!(ids, ["A1", "W1", "W2"]);
		assert_eq!(hood.edges.len(), 2);
		for edge in &hood.edges {
			let expected = if edge.source == "W1" {
				EdgeDirection::Outbound
			} else {
				EdgeDirection::Inbound
			};
			assert_eq!(edge.direction(), expected);
		}
	}
}
