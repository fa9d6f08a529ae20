//! Leptos client-side app wiring and routes.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

// Modules
pub mod components;
pub mod config;
pub mod error;
mod pages;

use crate::components::force_graph::{DEFAULT_SEED, GraphData};
use crate::config::RenderConfig;
use crate::error::Result;

// Top-Level pages
use crate::pages::entity::EntityPage;
use crate::pages::home::{Home, sample_graph};
use crate::pages::not_found::NotFound;

const SAMPLE_WORKS: usize = 120;

/// Graph and renderer settings shared by every page.
#[derive(Clone, Debug)]
pub struct GraphContext {
	pub data: GraphData,
	pub config: RenderConfig,
}

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Text of the `<script>` element with `id`, if present.
fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Parse graph JSON of the form `{ "nodes": [...], "edges": [...] }`.
pub fn parse_graph_data(json: &str) -> Result<GraphData> {
	Ok(serde_json::from_str(json)?)
}

/// Load graph data from a script element with id="graph-data".
fn load_graph_data() -> Option<GraphData> {
	let json_text = script_text("graph-data")?;
	match parse_graph_data(&json_text) {
		Ok(data) => {
			info!(
				"bibgraph: loaded {} nodes, {} edges",
				data.nodes.len(),
				data.edges.len()
			);
			Some(data)
		}
		Err(e) => {
			warn!("bibgraph: failed to parse graph data: {}", e);
			None
		}
	}
}

/// Renderer config from a script element with id="graph-config", else defaults.
fn load_config() -> RenderConfig {
	let Some(json_text) = script_text("graph-config") else {
		return RenderConfig::default();
	};
	RenderConfig::from_json(&json_text).unwrap_or_else(|e| {
		warn!("bibgraph: ignoring invalid config: {}", e);
		RenderConfig::default()
	})
}

/// An app router which renders the graph, entity pages and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	let config = load_config();
	let data = load_graph_data().unwrap_or_else(|| {
		info!("bibgraph: no graph data on the page, using sample graph");
		sample_graph(SAMPLE_WORKS, DEFAULT_SEED)
	});
	provide_context(GraphContext { data, config });

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

		// sets the document title
		<Title text="Academic Graph" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
				<Route path=path!("/:kind/:id") view=EntityPage />
			</Routes>
		</Router>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::{EdgeDirection, EntityType, RelationType};

	#[test]
	fn parses_graph_json() {
		let json = r#"{
			"nodes": [
				{"id": "W1", "entityType": "works", "label": "Paper", "entityId": "W1"},
				{"id": "A1", "entityType": "authors", "label": "Ada", "entityId": "A1", "isXpac": true}
			],
			"links": [
				{"id": "e1", "source": "W1", "target": "A1", "type": "AUTHORSHIP", "direction": "inbound"}
			]
		}"#;
		let data = parse_graph_data(json).unwrap();
		assert_eq!(data.nodes[0].entity_type, EntityType::Works);
		assert!(data.nodes[1].is_xpac);
		assert_eq!(data.edges[0].relation, RelationType::Authorship);
		assert_eq!(data.edges[0].direction(), EdgeDirection::Inbound);
	}

	#[test]
	fn bad_graph_json_is_a_serialization_error() {
		let err = parse_graph_data(r#"{"nodes": 3}"#).unwrap_err();
		assert!(matches!(err, crate::error::GraphError::Serialization(_)));
	}
}
