//! Interaction modes and the two-click connect protocol.
//!
//! In a connect mode the first node click remembers the node, the second
//! click on a different node creates the link. The mode is sticky so several
//! links can be drawn in a row; switching modes drops a pending first pick.

use log::{debug, info};

use super::error::TopologyError;
use super::store::TopologyGraph;
use super::types::{LinkKind, LinkLabels};

/// What a node click means.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InteractionMode {
	/// Click selects, mouse-down starts a drag.
	#[default]
	Select,
	/// Connect two nodes with a network link.
	AddLink,
	/// Connect two daemons with a BGP peering.
	AddBgpNeighbor,
	/// Connect two nodes with a GRE tunnel.
	AddGreTunnel,
}

impl InteractionMode {
	/// All modes in toolbar order.
	pub const ALL: [InteractionMode; 4] = [
		InteractionMode::Select,
		InteractionMode::AddLink,
		InteractionMode::AddBgpNeighbor,
		InteractionMode::AddGreTunnel,
	];

	/// Kind of link created in this mode; `None` for select.
	pub fn link_kind(self) -> Option<LinkKind> {
		match self {
			InteractionMode::Select => None,
			InteractionMode::AddLink => Some(LinkKind::Network),
			InteractionMode::AddBgpNeighbor => Some(LinkKind::Bgp),
			InteractionMode::AddGreTunnel => Some(LinkKind::Gre),
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			InteractionMode::Select => "Select",
			InteractionMode::AddLink => "Add link",
			InteractionMode::AddBgpNeighbor => "Add BGP neighbor",
			InteractionMode::AddGreTunnel => "Add GRE tunnel",
		}
	}
}

/// Currently selected element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
	Node(String),
	Link(String),
}

/// Keyboard shortcuts of the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
	/// Delete or Backspace: remove the selection.
	DeleteSelection,
	/// Escape: drop the pending first pick and the selection.
	Cancel,
}

impl Shortcut {
	/// Map a `KeyboardEvent.key` value. Keys typed into a text field are
	/// editing, never shortcuts.
	pub fn from_key(key: &str, in_text_field: bool) -> Option<Self> {
		if in_text_field {
			return None;
		}
		match key {
			"Delete" | "Backspace" => Some(Shortcut::DeleteSelection),
			"Escape" => Some(Shortcut::Cancel),
			_ => None,
		}
	}
}

/// Outcome of a click in a connect mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectStep {
	/// First endpoint remembered.
	FirstSelected(String),
	/// Click had no effect (select mode, or the pending node clicked again).
	Ignored,
	/// Link created with this id.
	Linked(String),
}

/// Mode state machine plus selection.
#[derive(Clone, Debug, Default)]
pub struct InteractionController {
	mode: InteractionMode,
	first_selected_for_link: Option<String>,
	selection: Option<Selection>,
}

impl InteractionController {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn mode(&self) -> InteractionMode {
		self.mode
	}

	/// Switch mode. Always drops a pending first pick.
	pub fn set_mode(&mut self, mode: InteractionMode) {
		if self.mode != mode {
			debug!("interaction: mode {:?} -> {:?}", self.mode, mode);
		}
		self.mode = mode;
		self.cancel_pending();
	}

	/// Drop a pending first pick without changing mode.
	pub fn cancel_pending(&mut self) {
		self.first_selected_for_link = None;
	}

	pub fn first_selected_for_link(&self) -> Option<&str> {
		self.first_selected_for_link.as_deref()
	}

	pub fn selection(&self) -> Option<&Selection> {
		self.selection.as_ref()
	}

	pub fn select(&mut self, selection: Option<Selection>) {
		self.selection = selection;
	}

	/// Node click while in a connect mode.
	///
	/// The pending pick is cleared after the second click whether or not the
	/// link could be created.
	pub fn on_node_click_for_connection(
		&mut self,
		graph: &mut TopologyGraph,
		node_id: &str,
	) -> Result<ConnectStep, TopologyError> {
		let Some(kind) = self.mode.link_kind() else {
			return Ok(ConnectStep::Ignored);
		};
		match self.first_selected_for_link.as_deref() {
			None => {
				self.first_selected_for_link = Some(node_id.to_string());
				Ok(ConnectStep::FirstSelected(node_id.to_string()))
			}
			Some(first) if first == node_id => Ok(ConnectStep::Ignored),
			Some(_) => {
				let first = self.first_selected_for_link.take().unwrap_or_default();
				let id = graph.add_link(&first, node_id, kind, LinkLabels::default())?;
				info!("interaction: {} link {} -> {} created", kind, first, node_id);
				Ok(ConnectStep::Linked(id))
			}
		}
	}

	/// Delete whatever is selected. Removing a node also removes its links.
	pub fn delete_selected(&mut self, graph: &mut TopologyGraph) -> Option<Selection> {
		let selection = self.selection.take()?;
		let removed = match &selection {
			Selection::Node(id) => graph.remove_node(id).is_some(),
			Selection::Link(id) => graph.remove_link(id).is_some(),
		};
		if let Selection::Node(id) = &selection {
			if self.first_selected_for_link.as_deref() == Some(id.as_str()) {
				self.first_selected_for_link = None;
			}
		}
		removed.then_some(selection)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::super::types::{NodeKind, Position, TopologyNode};
	use super::*;

	fn graph() -> TopologyGraph {
		let mut g = TopologyGraph::new();
		for id in ["r1", "r2", "r3"] {
			g.add_node(TopologyNode {
				id: id.into(),
				kind: NodeKind::Daemon,
				label: id.into(),
				position: Position::default(),
				data: json!({}),
				asn: Some(65001),
				color: None,
			})
			.unwrap();
		}
		g
	}

	#[test]
	fn two_click_connect_creates_bgp_link() {
		let mut g = graph();
		let mut ctl = InteractionController::new();
		ctl.set_mode(InteractionMode::AddBgpNeighbor);

		assert_eq!(
			ctl.on_node_click_for_connection(&mut g, "r1").unwrap(),
			ConnectStep::FirstSelected("r1".into())
		);
		// Clicking the pending node again keeps it pending.
		assert_eq!(
			ctl.on_node_click_for_connection(&mut g, "r1").unwrap(),
			ConnectStep::Ignored
		);
		assert_eq!(ctl.first_selected_for_link(), Some("r1"));

		let ConnectStep::Linked(id) = ctl.on_node_click_for_connection(&mut g, "r2").unwrap() else {
			panic!("expected a link");
		};
		let link = g.find_link(&id).unwrap();
		assert_eq!((link.source.as_str(), link.target.as_str()), ("r1", "r2"));
		assert_eq!(link.kind, LinkKind::Bgp);
		assert_eq!(ctl.first_selected_for_link(), None);
		// Mode is sticky.
		assert_eq!(ctl.mode(), InteractionMode::AddBgpNeighbor);
	}

	#[test]
	fn mode_switch_clears_pending_pick() {
		let mut g = graph();
		let mut ctl = InteractionController::new();
		ctl.set_mode(InteractionMode::AddLink);
		ctl.on_node_click_for_connection(&mut g, "r1").unwrap();
		ctl.set_mode(InteractionMode::AddGreTunnel);
		assert_eq!(ctl.first_selected_for_link(), None);

		ctl.on_node_click_for_connection(&mut g, "r2").unwrap();
		ctl.on_node_click_for_connection(&mut g, "r3").unwrap();
		assert_eq!(g.links().next().unwrap().kind, LinkKind::Gre);
	}

	#[test]
	fn select_mode_ignores_connection_clicks() {
		let mut g = graph();
		let mut ctl = InteractionController::new();
		assert_eq!(
			ctl.on_node_click_for_connection(&mut g, "r1").unwrap(),
			ConnectStep::Ignored
		);
		assert_eq!(ctl.first_selected_for_link(), None);
	}

	#[test]
	fn failed_connect_clears_pending_pick() {
		let mut g = graph();
		let mut ctl = InteractionController::new();
		ctl.set_mode(InteractionMode::AddLink);
		ctl.on_node_click_for_connection(&mut g, "r1").unwrap();
		g.remove_node("r1");
		assert!(ctl.on_node_click_for_connection(&mut g, "r2").is_err());
		assert_eq!(ctl.first_selected_for_link(), None);
		assert_eq!(g.link_count(), 0);
	}

	#[test]
	fn shortcuts_are_not_taken_from_text_fields() {
		assert_eq!(Shortcut::from_key("Backspace", false), Some(Shortcut::DeleteSelection));
		assert_eq!(Shortcut::from_key("Delete", false), Some(Shortcut::DeleteSelection));
		assert_eq!(Shortcut::from_key("Escape", false), Some(Shortcut::Cancel));
		assert_eq!(Shortcut::from_key("a", false), None);
		assert_eq!(Shortcut::from_key("Backspace", true), None);
		assert_eq!(Shortcut::from_key("Delete", true), None);
		assert_eq!(Shortcut::from_key("Escape", true), None);
	}

	#[test]
	fn delete_selected_node_cascades() {
		let mut g = graph();
		g.add_link("r1", "r2", LinkKind::Bgp, LinkLabels::default())
			.unwrap();
		let mut ctl = InteractionController::new();
		ctl.select(Some(Selection::Node("r1".into())));
		assert_eq!(
			ctl.delete_selected(&mut g),
			Some(Selection::Node("r1".into()))
		);
		assert_eq!(g.link_count(), 0);
		assert_eq!(ctl.selection(), None);
		assert_eq!(ctl.delete_selected(&mut g), None);
	}
}
