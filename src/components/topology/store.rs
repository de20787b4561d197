//! The graph store: node and link collections with validated mutations.
//!
//! Storage is arena-style. Nodes and links live in insertion-ordered vectors
//! with an id index next to them; all cross references are resolved by id
//! lookup. The store holds no synchronization of its own and is meant to be
//! owned by the single UI thread.

use std::collections::HashMap;

use log::{debug, warn};
use serde_json::{Value, json};
use uuid::Uuid;

use super::error::TopologyError;
use super::types::{
	LinkKind, LinkLabels, NodeKind, Position, TopologyData, TopologyLink, TopologyNode,
};

/// Generate a fresh id with a readable prefix.
pub fn generate_id(prefix: &str) -> String {
	format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Mutable node/link graph.
#[derive(Clone, Debug, Default)]
pub struct TopologyGraph {
	nodes: Vec<TopologyNode>,
	links: Vec<TopologyLink>,
	node_index: HashMap<String, usize>,
	link_index: HashMap<String, usize>,
}

impl TopologyGraph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Rebuild a graph from a saved document.
	///
	/// Entries that would violate an invariant are skipped and logged rather
	/// than failing the whole load.
	pub fn from_data(data: TopologyData) -> Self {
		let mut graph = Self::new();
		for node in data.nodes {
			if let Err(e) = graph.add_node(node) {
				warn!("topology: skipping node on load: {}", e);
			}
		}
		for link in data.links {
			if let Err(e) = graph.insert_link(link) {
				warn!("topology: skipping link on load: {}", e);
			}
		}
		graph
	}

	/// Parse and load a JSON topology document.
	pub fn from_json(text: &str) -> Result<Self, TopologyError> {
		let data: TopologyData = serde_json::from_str(text)?;
		Ok(Self::from_data(data))
	}

	/// Snapshot of the graph as a saveable document.
	pub fn to_data(&self) -> TopologyData {
		TopologyData {
			nodes: self.nodes.clone(),
			links: self.links.clone(),
		}
	}

	pub fn to_json(&self) -> Result<String, TopologyError> {
		Ok(serde_json::to_string(&self.to_data())?)
	}

	pub fn nodes(&self) -> impl Iterator<Item = &TopologyNode> {
		self.nodes.iter()
	}

	pub fn links(&self) -> impl Iterator<Item = &TopologyLink> {
		self.links.iter()
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn link_count(&self) -> usize {
		self.links.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn find_node(&self, id: &str) -> Option<&TopologyNode> {
		self.node_index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn find_link(&self, id: &str) -> Option<&TopologyLink> {
		self.link_index.get(id).map(|&i| &self.links[i])
	}

	/// Insert a node, rejecting duplicate ids and duplicate backend identities.
	pub fn add_node(&mut self, node: TopologyNode) -> Result<(), TopologyError> {
		if self.node_index.contains_key(&node.id) {
			return Err(TopologyError::DuplicateNode { id: node.id });
		}
		if self.nodes.iter().any(|n| n.same_identity(&node)) {
			return Err(TopologyError::DuplicateIdentity {
				kind: node.kind,
				name: node.backend_name().unwrap_or(&node.label).to_string(),
			});
		}
		debug!("topology: add {} node {}", node.kind, node.id);
		self.node_index.insert(node.id.clone(), self.nodes.len());
		self.nodes.push(node);
		Ok(())
	}

	/// Add a network node for the explicit "add network" action.
	pub fn add_network(&mut self, name: &str, position: Position) -> Result<String, TopologyError> {
		self.add_named(NodeKind::Network, name, position)
	}

	/// Add an external peer or network for the explicit "add external node" action.
	pub fn add_external(
		&mut self,
		kind: NodeKind,
		name: &str,
		position: Position,
	) -> Result<String, TopologyError> {
		if !kind.is_external() {
			return Err(TopologyError::InvalidPayload(format!(
				"{} is not an external node type",
				kind
			)));
		}
		self.add_named(kind, name, position)
	}

	fn add_named(
		&mut self,
		kind: NodeKind,
		name: &str,
		position: Position,
	) -> Result<String, TopologyError> {
		let id = generate_id(kind.as_str());
		self.add_node(TopologyNode {
			id: id.clone(),
			kind,
			label: name.to_string(),
			position,
			data: json!({ "name": name }),
			asn: None,
			color: None,
		})?;
		Ok(id)
	}

	/// Move a node. Unknown ids are ignored; no bounds are enforced here.
	pub fn update_node_position(&mut self, id: &str, position: Position) {
		match self.node_index.get(id) {
			Some(&i) => self.nodes[i].position = position,
			None => debug!("topology: position update for missing node {}", id),
		}
	}

	/// Remove a node and every link that references it.
	pub fn remove_node(&mut self, id: &str) -> Option<TopologyNode> {
		let index = self.node_index.remove(id)?;
		let node = self.nodes.remove(index);
		let cascaded = self.links_of(id).count();
		self.links.retain(|l| !l.touches(id));
		debug!("topology: removed node {} and {} link(s)", id, cascaded);
		self.reindex();
		Some(node)
	}

	/// Connect two nodes. Parallel links between the same pair are allowed.
	pub fn add_link(
		&mut self,
		source: &str,
		target: &str,
		kind: LinkKind,
		labels: LinkLabels,
	) -> Result<String, TopologyError> {
		let link = TopologyLink {
			id: generate_id("link"),
			source: source.to_string(),
			target: target.to_string(),
			kind,
			label: labels.label,
			source_label: labels.source_label,
			target_label: labels.target_label,
			arc: None,
		};
		let id = link.id.clone();
		self.insert_link(link)?;
		Ok(id)
	}

	/// Insert a fully formed link, keeping its id.
	pub fn insert_link(&mut self, link: TopologyLink) -> Result<(), TopologyError> {
		if self.link_index.contains_key(&link.id) {
			return Err(TopologyError::DuplicateLink { id: link.id });
		}
		for endpoint in [&link.source, &link.target] {
			if !self.node_index.contains_key(endpoint) {
				return Err(TopologyError::MissingEndpoint {
					id: endpoint.clone(),
				});
			}
		}
		if link.source == link.target {
			return Err(TopologyError::SelfLoop { id: link.source });
		}
		debug!(
			"topology: add {} link {} ({} -> {})",
			link.kind, link.id, link.source, link.target
		);
		self.link_index.insert(link.id.clone(), self.links.len());
		self.links.push(link);
		Ok(())
	}

	pub fn remove_link(&mut self, id: &str) -> Option<TopologyLink> {
		let index = self.link_index.remove(id)?;
		let link = self.links.remove(index);
		self.reindex();
		debug!("topology: removed link {}", id);
		Some(link)
	}

	/// Pin (or with `None`, release) a link's curve offset. Unknown ids are ignored.
	pub fn set_link_arc(&mut self, id: &str, arc: Option<f64>) {
		match self.link_index.get(id) {
			Some(&i) => self.links[i].arc = arc,
			None => debug!("topology: arc update for missing link {}", id),
		}
	}

	/// Links connecting `a` and `b` in either direction, in insertion order.
	pub fn links_between<'a>(
		&'a self,
		a: &'a str,
		b: &'a str,
	) -> impl Iterator<Item = &'a TopologyLink> + 'a {
		self.links.iter().filter(move |l| l.connects(a, b))
	}

	/// Links that reference `node_id`.
	pub fn links_of<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a TopologyLink> + 'a {
		self.links.iter().filter(move |l| l.touches(node_id))
	}

	/// Remove everything.
	pub fn clear(&mut self) {
		self.nodes.clear();
		self.links.clear();
		self.node_index.clear();
		self.link_index.clear();
	}

	/// Backend name of a node for display in messages.
	pub fn node_name(&self, id: &str) -> Option<&str> {
		self.find_node(id)
			.map(|n| n.data.get("name").and_then(Value::as_str).unwrap_or(&n.label))
	}

	fn reindex(&mut self) {
		self.node_index = self
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();
		self.link_index = self
			.links
			.iter()
			.enumerate()
			.map(|(i, l)| (l.id.clone(), i))
			.collect();
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	fn node(id: &str, kind: NodeKind, data: Value) -> TopologyNode {
		TopologyNode {
			id: id.into(),
			kind,
			label: id.into(),
			position: Position::new(100.0, 100.0),
			data,
			asn: None,
			color: None,
		}
	}

	fn triangle() -> TopologyGraph {
		let mut g = TopologyGraph::new();
		g.add_node(node("a", NodeKind::Daemon, json!({"id": 1, "name": "r1"})))
			.unwrap();
		g.add_node(node("b", NodeKind::Daemon, json!({"id": 2, "name": "r2"})))
			.unwrap();
		g.add_node(node("n", NodeKind::Network, json!({"name": "lan"})))
			.unwrap();
		g.add_link("a", "b", LinkKind::Bgp, LinkLabels::default())
			.unwrap();
		g.add_link("a", "n", LinkKind::Network, LinkLabels::default())
			.unwrap();
		g.add_link("n", "b", LinkKind::Network, LinkLabels::default())
			.unwrap();
		g
	}

	#[test]
	fn duplicate_id_is_rejected() {
		let mut g = TopologyGraph::new();
		g.add_node(node("a", NodeKind::Host, json!({"id": 1, "name": "h1"})))
			.unwrap();
		let err = g
			.add_node(node("a", NodeKind::Host, json!({"id": 2, "name": "h2"})))
			.unwrap_err();
		assert!(matches!(err, TopologyError::DuplicateNode { .. }));
		assert_eq!(g.node_count(), 1);
	}

	#[test]
	fn duplicate_backend_identity_is_rejected() {
		let mut g = TopologyGraph::new();
		g.add_node(node("a", NodeKind::Daemon, json!({"id": 1, "name": "r1"})))
			.unwrap();
		let err = g
			.add_node(node("b", NodeKind::Daemon, json!({"id": 1, "name": "r1"})))
			.unwrap_err();
		assert!(matches!(err, TopologyError::DuplicateIdentity { .. }));
		assert_eq!(g.node_count(), 1);

		// Same backend record under a different kind is a different node.
		g.add_node(node("c", NodeKind::Host, json!({"id": 1, "name": "r1"})))
			.unwrap();
		assert_eq!(g.node_count(), 2);
	}

	#[test]
	fn node_ids_stay_unique_over_many_inserts() {
		let mut g = TopologyGraph::new();
		for i in 0..20 {
			let _ = g.add_node(node(
				&format!("n{}", i % 7),
				NodeKind::Host,
				json!({"id": i, "name": format!("h{}", i)}),
			));
		}
		let mut ids: Vec<_> = g.nodes().map(|n| n.id.clone()).collect();
		let total = ids.len();
		ids.sort();
		ids.dedup();
		assert_eq!(ids.len(), total);
		assert_eq!(total, 7);
	}

	#[test]
	fn remove_node_cascades_links() {
		let mut g = triangle();
		assert_eq!(g.link_count(), 3);
		let removed = g.remove_node("a").unwrap();
		assert_eq!(removed.id, "a");
		assert_eq!(g.link_count(), 1);
		assert!(g.links().all(|l| !l.touches("a")));
		// Index stays consistent after removal.
		assert_eq!(g.find_node("n").unwrap().id, "n");
		assert_eq!(g.find_node("b").unwrap().id, "b");
		assert!(g.find_node("a").is_none());
	}

	#[test]
	fn self_loop_is_rejected() {
		let mut g = triangle();
		let err = g
			.add_link("a", "a", LinkKind::Network, LinkLabels::default())
			.unwrap_err();
		assert!(matches!(err, TopologyError::SelfLoop { .. }));
		assert_eq!(g.link_count(), 3);
	}

	#[test]
	fn missing_endpoint_is_rejected() {
		let mut g = triangle();
		let err = g
			.add_link("a", "ghost", LinkKind::Bgp, LinkLabels::default())
			.unwrap_err();
		assert!(matches!(err, TopologyError::MissingEndpoint { id } if id == "ghost"));
		assert_eq!(g.link_count(), 3);
	}

	#[test]
	fn parallel_links_are_allowed() {
		let mut g = triangle();
		g.add_link("b", "a", LinkKind::Bgp, LinkLabels::default())
			.unwrap();
		assert_eq!(g.links_between("a", "b").count(), 2);
	}

	#[test]
	fn position_and_arc_updates_ignore_missing_ids() {
		let mut g = triangle();
		let before = g.to_data();
		g.update_node_position("ghost", Position::new(1.0, 2.0));
		g.set_link_arc("ghost", Some(10.0));
		assert_eq!(g.to_data(), before);

		g.update_node_position("a", Position::new(1.0, 2.0));
		assert_eq!(g.find_node("a").unwrap().position, Position::new(1.0, 2.0));
	}

	#[test]
	fn remove_link_keeps_index_consistent() {
		let mut g = triangle();
		let first = g.links().next().unwrap().id.clone();
		let last = g.links().last().unwrap().id.clone();
		assert!(g.remove_link(&first).is_some());
		assert!(g.remove_link(&first).is_none());
		g.set_link_arc(&last, Some(-20.0));
		assert_eq!(g.find_link(&last).unwrap().arc, Some(-20.0));
	}

	#[test]
	fn document_round_trip_skips_invalid_links() {
		let g = triangle();
		let mut data = g.to_data();
		data.links.push(TopologyLink {
			id: "bad".into(),
			source: "a".into(),
			target: "nowhere".into(),
			kind: LinkKind::Gre,
			label: None,
			source_label: None,
			target_label: None,
			arc: None,
		});
		let text = serde_json::to_string(&data).unwrap();
		let loaded = TopologyGraph::from_json(&text).unwrap();
		assert_eq!(loaded.to_data(), g.to_data());

		let again = TopologyGraph::from_json(&loaded.to_json().unwrap()).unwrap();
		assert_eq!(again.to_data(), g.to_data());
	}

	#[test]
	fn add_external_requires_external_kind() {
		let mut g = TopologyGraph::new();
		assert!(g
			.add_external(NodeKind::Host, "peer", Position::default())
			.is_err());
		let id = g
			.add_external(NodeKind::ExternalNode, "transit", Position::default())
			.unwrap();
		assert_eq!(g.node_name(&id), Some("transit"));
		let net = g.add_network("lan", Position::default()).unwrap();
		assert_eq!(g.find_node(&net).unwrap().kind, NodeKind::Network);
	}

	#[test]
	fn clear_empties_graph() {
		let mut g = triangle();
		g.clear();
		assert!(g.is_empty());
		assert_eq!(g.link_count(), 0);
		assert!(g.find_node("a").is_none());
	}
}
