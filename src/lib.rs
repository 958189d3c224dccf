//! channel-graph: Interactive integration-channel graph visualization.
//!
//! This crate provides a WASM-based canvas component that renders integration
//! graphs (channels, destinations and transformers) as collapsible trees,
//! oriented hierarchies or force-directed layouts, with pan/zoom, node editing
//! and browser-side persistence.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::graph_view::{
	GraphDocument, GraphError, GraphViewCanvas, LayoutMode, Link, Node, NodeKind, Status, StorageError,
	Theme,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("channel-graph: logging initialized");
}

/// Load the seed graph from a script element with id="graph-data".
/// Expected format: JSON with { nodes: [...], links: [...] }
fn load_graph_data() -> Option<GraphDocument> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("graph-data")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match GraphDocument::from_json(&json_text) {
		Ok(data) => {
			info!(
				"channel-graph: loaded {} nodes, {} links",
				data.nodes.len(),
				data.links.len()
			);
			Some(data)
		}
		Err(e) => {
			warn!("channel-graph: failed to parse graph data: {}", e);
			None
		}
	}
}

/// Main application component.
/// Loads the seed graph from the DOM and renders the graph view.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let graph_data = load_graph_data().unwrap_or_default();
	let graph_signal = Signal::derive(move || graph_data.clone());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />
		<Title text="Integration Channel Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<GraphViewCanvas document=graph_signal fullscreen=true />
			<div class="graph-overlay">
				<h1>"Integration Channels"</h1>
				<p class="subtitle">"Click a node to select or fold it. Right-click to annotate. Scroll to zoom. Drag background to pan."</p>
			</div>
		</div>
	}
}
