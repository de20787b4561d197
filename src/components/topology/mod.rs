//! BGP lab topology editor.
//!
//! Renders the lab topology on an HTML canvas and lets the operator edit it:
//! - Drag daemons and hosts from the inventory sidebar onto the canvas
//! - Move nodes, and bend BGP/GRE links by dragging their arc handle
//! - Connect nodes with network links, BGP peerings or GRE tunnels
//! - Auto-layout into network, daemon and host rows
//!
//! The graph store, layout engine, drag sessions and interaction modes are
//! plain Rust and usable without a browser; only [`TopologyEditor`] and the
//! renderer touch the DOM.
//!
//! # Example
//!
//! ```ignore
//! use bgplab_topology::{TopologyData, TopologyEditor};
//!
//! let data = TopologyData::default();
//! view! {
//!     <TopologyEditor
//!         data=data
//!         on_change=Callback::new(|doc| log::info!("{} nodes", doc.nodes.len()))
//!     />
//! }
//! ```

mod component;
pub mod config;
pub mod drag;
pub mod error;
pub mod interaction;
pub mod layout;
mod render;
pub mod state;
pub mod store;
pub mod theme;
pub mod types;

pub use component::TopologyEditor;
pub use config::EditorConfig;
pub use error::TopologyError;
pub use interaction::InteractionMode;
pub use state::{EditorEvent, TopologyEditorState};
pub use store::TopologyGraph;
pub use theme::Theme;
pub use types::{
	InventoryItem, LinkKind, NodeKind, Position, TopologyData, TopologyLink, TopologyNode,
};
