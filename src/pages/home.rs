use leptos::prelude::*;
use leptos_router::components::A;

use crate::GraphContext;
use crate::components::force_graph::{
	EntityType, ForceGraphCanvas, GraphData, GraphEdge, GraphNode, RelationType, SeededRandom,
};

/// Generate a deterministic academic graph with `works` works.
///
/// Authors, venues and topics scale with the work count so the layout
/// keeps a similar density at any size.
pub fn sample_graph(works: usize, seed: u32) -> GraphData {
	let mut rng = SeededRandom::new(seed);
	let mut nodes = Vec::new();
	let mut edges = Vec::new();

	let pick = |rng: &mut SeededRandom, n: usize| ((rng.next_f64() * n as f64) as usize).min(n - 1);

	let publishers = 2;
	let funders = 2;
	let sources = 3 + works / 40;
	let topics = 4 + works / 25;
	let institutions = 3 + works / 30;
	let authors = (works / 2).max(1);

	for i in 0..publishers {
		nodes.push(GraphNode::new(format!("P{i}"), EntityType::Publishers, format!("Publisher {i}")));
	}
	for i in 0..funders {
		nodes.push(GraphNode::new(format!("F{i}"), EntityType::Funders, format!("Funder {i}")));
	}
	for i in 0..sources {
		nodes.push(GraphNode::new(format!("S{i}"), EntityType::Sources, format!("Journal {i}")));
		let publisher = pick(&mut rng, publishers);
		edges.push(GraphEdge::new(format!("S{i}"), format!("P{publisher}"), RelationType::HostOrganization));
	}
	for i in 0..topics {
		nodes.push(GraphNode::new(format!("T{i}"), EntityType::Topics, format!("Topic {i}")));
	}
	for i in 0..institutions {
		nodes.push(GraphNode::new(format!("I{i}"), EntityType::Institutions, format!("Institute {i}")));
	}
	for i in 0..authors {
		let mut author = GraphNode::new(format!("A{i}"), EntityType::Authors, format!("Author {i}"));
		author.is_xpac = rng.next_f64() < 0.05;
		nodes.push(author);
		let institution = pick(&mut rng, institutions);
		edges.push(GraphEdge::new(format!("A{i}"), format!("I{institution}"), RelationType::Affiliation));
	}

	for i in 0..works {
		let id = format!("W{i}");
		let mut work = GraphNode::new(id.clone(), EntityType::Works, format!("Work {i}"));
		work.has_unverified_author = rng.next_f64() < 0.1;
		work.is_xpac = rng.next_f64() < 0.1;
		nodes.push(work);

		let first = pick(&mut rng, authors);
		edges.push(GraphEdge::new(id.clone(), format!("A{first}"), RelationType::Authorship));
		let second = pick(&mut rng, authors);
		if second != first {
			edges.push(GraphEdge::new(id.clone(), format!("A{second}"), RelationType::Authorship));
		}
		edges.push(GraphEdge::new(id.clone(), format!("S{}", pick(&mut rng, sources)), RelationType::Publication));
		edges.push(GraphEdge::new(id.clone(), format!("T{}", pick(&mut rng, topics)), RelationType::Topic));
		if i > 0 && rng.next_f64() < 0.6 {
			edges.push(GraphEdge::new(id.clone(), format!("W{}", pick(&mut rng, i)), RelationType::Reference));
		}
		if rng.next_f64() < 0.15 {
			edges.push(GraphEdge::new(id, format!("F{}", pick(&mut rng, funders)), RelationType::Funded));
		}
	}

	GraphData { nodes, edges }
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let ctx = expect_context::<GraphContext>();
	let config = ctx.config.clone();
	let graph_data = Signal::derive(move || ctx.data.clone());
	let (selected, set_selected) = signal(None::<GraphNode>);

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<ForceGraphCanvas
					data=graph_data
					fullscreen=true
					config=config
					camera_storage_key="bibgraph.camera.home"
					show_performance=true
					on_node_click=Callback::new(move |node: GraphNode| set_selected.set(Some(node)))
				/>
				<div class="graph-overlay">
					<h1>"Academic Graph"</h1>
					<p class="subtitle">
						"Drag nodes to reposition. Scroll to zoom toward the cursor. Arrow keys pan, Home resets."
					</p>
					{move || {
						selected
							.get()
							.map(|node| {
								let href = format!("/{}/{}", node.entity_type.as_str(), node.entity_id);
								view! {
									<div class="graph-selection">
										<span>{node.entity_type.display_name()} ": " {node.label}</span>
										" "
										<A href=href>"Open"</A>
									</div>
								}
							})
					}}
				</div>
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sample_is_deterministic() {
		assert_eq!(sample_graph(60, 42), sample_graph(60, 42));
		assert_ne!(sample_graph(60, 42), sample_graph(60, 7));
	}

	#[test]
	fn sample_is_already_clean() {
		let data = sample_graph(120, 42);
		let (_, report) = data.sanitized();
		assert_eq!(report.duplicate_nodes, 0);
		assert_eq!(report.dangling_edges, 0);
	}

	#[test]
	fn sample_has_every_work() {
		let data = sample_graph(25, 1);
		let works = data
			.nodes
			.iter()
			.filter(|n| n.entity_type == EntityType::Works)
			.count();
		assert_eq!(works, 25);
		assert!(
			data.edges
				.iter()
				.any(|e| e.relation == RelationType::Authorship)
		);
	}
}
