//! bgplab-topology: Interactive topology editor for virtual BGP testing labs.
//!
//! This crate provides a WASM-based editor that places BGP daemons, hosts and
//! networks on a canvas, wires them together with network links, BGP peerings
//! and GRE tunnels, and reports every edit back to the hosting page.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::topology::{
	EditorConfig, InventoryItem, LinkKind, NodeKind, Position, TopologyData, TopologyEditor,
	TopologyError, TopologyGraph, TopologyLink, TopologyNode,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("bgplab-topology: logging initialized");
}

/// Parse the JSON body of the script element with the given id.
fn load_script_json<T: DeserializeOwned>(element_id: &str) -> Option<T> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(element_id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	serde_json::from_str::<T>(&json_text)
		.inspect_err(|e| warn!("bgplab-topology: failed to parse #{}: {}", element_id, e))
		.ok()
}

/// Load the topology from a script element with id="topology-data".
/// Expected format: JSON with { nodes: [...], links: [...] }
pub fn load_topology_data() -> Option<TopologyData> {
	let data: TopologyData = load_script_json("topology-data")?;
	info!(
		"bgplab-topology: loaded {} nodes, {} links",
		data.nodes.len(),
		data.links.len()
	);
	Some(data)
}

/// Load sidebar inventory from a script element with id="inventory-data".
/// Expected format: JSON array of { type: "daemon" | "host", data: {...} }
pub fn load_inventory() -> Vec<InventoryItem> {
	load_script_json("inventory-data").unwrap_or_default()
}

/// Main application component.
/// Loads the topology and inventory from the DOM and renders the editor.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let topology = load_topology_data().unwrap_or_default();
	let topology_signal = Signal::derive(move || topology.clone());
	let inventory = load_inventory();
	let inventory_signal = Signal::derive(move || inventory.clone());

	let on_node_drag_end = Callback::new(|(node_id, position): (String, Position)| {
		info!(
			"bgplab-topology: node {} moved to ({:.0}, {:.0})",
			node_id, position.x, position.y
		);
	});
	let on_arc_drag_end = Callback::new(|(link_id, arc): (String, f64)| {
		info!("bgplab-topology: link {} arc set to {:.1}", link_id, arc);
	});
	let on_change = Callback::new(|data: TopologyData| {
		info!(
			"bgplab-topology: topology now {} nodes, {} links",
			data.nodes.len(),
			data.links.len()
		);
	});

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="BGP Lab Topology" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-editor">
			<TopologyEditor
				data=topology_signal
				inventory=inventory_signal
				on_node_drag_end=on_node_drag_end
				on_arc_drag_end=on_arc_drag_end
				on_change=on_change
			/>
		</div>
	}
}
