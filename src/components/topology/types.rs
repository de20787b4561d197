//! Topology data structures shared by the store, layout engine and editor.
//!
//! Nodes and links reference each other by string id only. The JSON shape of
//! these types is the save/load document exchanged with the lab backend.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a placed vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
	/// A routing daemon container (FRR, GoBGP, ...).
	Daemon,
	/// An end host container.
	Host,
	/// A lab network (bridge) that daemons and hosts attach to.
	Network,
	/// A peer outside of the lab.
	ExternalNode,
	/// A network outside of the lab.
	ExternalNetwork,
}

impl NodeKind {
	/// Wire name, also used as id prefix for generated nodes.
	pub fn as_str(self) -> &'static str {
		match self {
			NodeKind::Daemon => "daemon",
			NodeKind::Host => "host",
			NodeKind::Network => "network",
			NodeKind::ExternalNode => "external_node",
			NodeKind::ExternalNetwork => "external_network",
		}
	}

	/// External nodes and networks share the right-hand column in auto-layout.
	pub fn is_external(self) -> bool {
		matches!(self, NodeKind::ExternalNode | NodeKind::ExternalNetwork)
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Kind of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
	/// Attachment of a node to a network.
	Network,
	/// A BGP peering session.
	Bgp,
	/// A GRE tunnel.
	Gre,
}

impl LinkKind {
	/// Only BGP and GRE links carry an operator-editable arc.
	pub fn has_editable_arc(self) -> bool {
		matches!(self, LinkKind::Bgp | LinkKind::Gre)
	}
}

impl fmt::Display for LinkKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			LinkKind::Network => "network",
			LinkKind::Bgp => "bgp",
			LinkKind::Gre => "gre",
		})
	}
}

/// Canvas coordinates in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// A placed vertex.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopologyNode {
	/// Unique within a graph.
	pub id: String,
	#[serde(rename = "type")]
	pub kind: NodeKind,
	pub label: String,
	pub position: Position,
	/// Opaque backend record (daemon/host/network as returned by the lab API).
	#[serde(default)]
	pub data: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub asn: Option<u32>,
	/// CSS color override.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
}

impl TopologyNode {
	/// Backend id of the attached record, if any.
	pub fn backend_id(&self) -> Option<&Value> {
		self.data.get("id").filter(|v| !v.is_null())
	}

	/// Backend name of the attached record, if any.
	pub fn backend_name(&self) -> Option<&str> {
		self.data.get("name").and_then(Value::as_str)
	}

	/// Whether `other` describes the same backend object as this node.
	///
	/// Records without an `id` or `name` have no backend identity and never
	/// collide with each other.
	pub fn same_identity(&self, other: &TopologyNode) -> bool {
		if self.kind != other.kind {
			return false;
		}
		let (id, name) = (self.backend_id(), self.backend_name());
		if id.is_none() && name.is_none() {
			return false;
		}
		id == other.backend_id() && name == other.backend_name()
	}
}

/// An edge between two nodes. Logically undirected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyLink {
	pub id: String,
	pub source: String,
	pub target: String,
	#[serde(rename = "type")]
	pub kind: LinkKind,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source_label: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target_label: Option<String>,
	/// Operator-chosen perpendicular curve offset. `None` lets the layout
	/// engine decide; `Some(0.0)` is a deliberate straight line.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub arc: Option<f64>,
}

impl TopologyLink {
	/// Whether this link connects `a` and `b`, in either direction.
	pub fn connects(&self, a: &str, b: &str) -> bool {
		(self.source == a && self.target == b) || (self.source == b && self.target == a)
	}

	pub fn touches(&self, node_id: &str) -> bool {
		self.source == node_id || self.target == node_id
	}
}

/// Optional labels attached to a new link.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkLabels {
	pub label: Option<String>,
	pub source_label: Option<String>,
	pub target_label: Option<String>,
}

/// Complete topology document: what gets loaded and saved.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyData {
	#[serde(default)]
	pub nodes: Vec<TopologyNode>,
	#[serde(default)]
	pub links: Vec<TopologyLink>,
}

/// Payload carried by a sidebar item while it is dragged onto the canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarPayload {
	pub node_type: NodeKind,
	pub node_data: Value,
}

/// A daemon or host record offered in the sidebar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
	#[serde(rename = "type")]
	pub kind: NodeKind,
	pub data: Value,
}

impl InventoryItem {
	/// Name shown in the sidebar list.
	pub fn display_name(&self) -> String {
		self.data
			.get("name")
			.and_then(Value::as_str)
			.unwrap_or("unnamed")
			.to_string()
	}

	pub fn payload(&self) -> SidebarPayload {
		SidebarPayload {
			node_type: self.kind,
			node_data: self.data.clone(),
		}
	}
}
