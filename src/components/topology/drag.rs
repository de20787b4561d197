//! Drag sessions: node repositioning, sidebar drops and arc editing.
//!
//! At most one session is in flight. The controller owns it as an
//! `Option<DragSession>`, so a new mouse-down is only accepted once the
//! previous session has been ended by mouse-up (or the pointer leaving the
//! canvas).

use log::{debug, warn};
use serde_json::Value;

use super::config::{CurveConfig, EditorConfig, NodeExtent};
use super::error::TopologyError;
use super::layout::{link_curve, project_on_perpendicular};
use super::store::{TopologyGraph, generate_id};
use super::theme::default_node_color;
use super::types::{NodeKind, Position, SidebarPayload, TopologyNode};

/// Top-left corner of the canvas in client (viewport) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CanvasRect {
	pub left: f64,
	pub top: f64,
}

impl CanvasRect {
	/// Convert a client point into canvas coordinates.
	pub fn to_canvas(&self, client_x: f64, client_y: f64) -> Position {
		Position::new(client_x - self.left, client_y - self.top)
	}
}

/// Keep a node's whole footprint inside a `width` x `height` canvas.
pub fn clamp_to_canvas(position: Position, extent: NodeExtent, width: f64, height: f64) -> Position {
	let max_x = (width - extent.half_width).max(extent.half_width);
	let max_y = (height - extent.half_height).max(extent.half_height);
	Position::new(
		position.x.clamp(extent.half_width, max_x),
		position.y.clamp(extent.half_height, max_y),
	)
}

/// The single in-flight drag.
#[derive(Clone, Debug, PartialEq)]
pub enum DragSession {
	/// A sidebar item is being dragged towards the canvas.
	Sidebar { kind: NodeKind },
	/// A placed node is being moved.
	Node {
		node_id: String,
		/// Pointer position minus node position at mouse-down.
		grab_offset: Position,
		/// Latest clamped position written to the store.
		last: Position,
	},
	/// A link's arc handle is being dragged.
	Arc {
		link_id: String,
		start: Position,
		initial_arc: f64,
		perp: (f64, f64),
		current: f64,
	},
}

/// Live feedback produced by a pointer move.
#[derive(Clone, Debug, PartialEq)]
pub enum DragUpdate {
	NodeMoved { node_id: String, position: Position },
	ArcChanged { link_id: String, arc: f64 },
}

/// Final result of a session, reported once on mouse-up.
#[derive(Clone, Debug, PartialEq)]
pub enum DragEnd {
	NodeDropped { node_id: String, position: Position },
	ArcReleased { link_id: String, arc: f64 },
	SidebarCancelled,
}

/// Owns the drag session and turns pointer events into store mutations.
#[derive(Clone, Debug, Default)]
pub struct DragController {
	session: Option<DragSession>,
}

impl DragController {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_active(&self) -> bool {
		self.session.is_some()
	}

	pub fn session(&self) -> Option<&DragSession> {
		self.session.as_ref()
	}

	/// Id of the node being moved, if any.
	pub fn dragged_node(&self) -> Option<&str> {
		match &self.session {
			Some(DragSession::Node { node_id, .. }) => Some(node_id),
			_ => None,
		}
	}

	pub fn is_dragging_arc(&self) -> bool {
		matches!(self.session, Some(DragSession::Arc { .. }))
	}

	/// A sidebar item started dragging.
	pub fn begin_sidebar(&mut self, kind: NodeKind) -> bool {
		if self.is_active() {
			debug!("drag: sidebar drag ignored, session active");
			return false;
		}
		self.session = Some(DragSession::Sidebar { kind });
		true
	}

	/// The sidebar drag ended without a drop on the canvas.
	pub fn cancel_sidebar(&mut self) {
		if matches!(self.session, Some(DragSession::Sidebar { .. })) {
			self.session = None;
		}
	}

	/// Mouse-down on a node in select mode.
	pub fn begin_node(&mut self, graph: &TopologyGraph, node_id: &str, pointer: Position) -> bool {
		if self.is_active() {
			debug!("drag: node drag on {} ignored, session active", node_id);
			return false;
		}
		let Some(node) = graph.find_node(node_id) else {
			return false;
		};
		self.session = Some(DragSession::Node {
			node_id: node_id.to_string(),
			grab_offset: Position::new(pointer.x - node.position.x, pointer.y - node.position.y),
			last: node.position,
		});
		true
	}

	/// Mouse-down on a link's arc handle. Returns the arc the drag starts from.
	pub fn begin_arc(
		&mut self,
		graph: &TopologyGraph,
		link_id: &str,
		pointer: Position,
		config: &CurveConfig,
	) -> Option<f64> {
		if self.is_active() {
			debug!("drag: arc drag on {} ignored, session active", link_id);
			return None;
		}
		let link = graph.find_link(link_id)?;
		if !link.kind.has_editable_arc() {
			return None;
		}
		let curve = link_curve(graph, link, config)?;
		self.session = Some(DragSession::Arc {
			link_id: link_id.to_string(),
			start: pointer,
			initial_arc: curve.offset,
			perp: curve.perp,
			current: curve.offset,
		});
		Some(curve.offset)
	}

	/// Pointer moved while a session may be active.
	pub fn pointer_move(
		&mut self,
		graph: &mut TopologyGraph,
		pointer: Position,
		width: f64,
		height: f64,
		config: &EditorConfig,
	) -> Option<DragUpdate> {
		match self.session.as_mut()? {
			DragSession::Sidebar { .. } => None,
			DragSession::Node {
				node_id,
				grab_offset,
				last,
			} => {
				let kind = graph.find_node(node_id)?.kind;
				let candidate = Position::new(pointer.x - grab_offset.x, pointer.y - grab_offset.y);
				let position =
					clamp_to_canvas(candidate, config.extents.for_kind(kind), width, height);
				graph.update_node_position(node_id, position);
				*last = position;
				Some(DragUpdate::NodeMoved {
					node_id: node_id.clone(),
					position,
				})
			}
			DragSession::Arc {
				link_id,
				start,
				initial_arc,
				perp,
				current,
			} => {
				let delta = project_on_perpendicular(*perp, pointer.x - start.x, pointer.y - start.y);
				*current = *initial_arc + delta;
				graph.set_link_arc(link_id, Some(*current));
				Some(DragUpdate::ArcChanged {
					link_id: link_id.clone(),
					arc: *current,
				})
			}
		}
	}

	/// Mouse-up (or mouse-leave). Always ends the session.
	///
	/// The reported node position is the last one this session wrote, never a
	/// fresh read from the store.
	pub fn pointer_up(&mut self) -> Option<DragEnd> {
		let end = match self.session.take()? {
			DragSession::Sidebar { .. } => DragEnd::SidebarCancelled,
			DragSession::Node { node_id, last, .. } => DragEnd::NodeDropped {
				node_id,
				position: last,
			},
			DragSession::Arc {
				link_id, current, ..
			} => DragEnd::ArcReleased {
				link_id,
				arc: current,
			},
		};
		debug!("drag: session ended: {:?}", end);
		Some(end)
	}

	/// A sidebar payload was dropped on the canvas.
	///
	/// Returns the id of the created node. On error the graph is unchanged and
	/// the message is meant for the operator.
	pub fn drop_from_sidebar(
		&mut self,
		graph: &mut TopologyGraph,
		payload: &str,
		client: Position,
		canvas: CanvasRect,
		config: &EditorConfig,
	) -> Result<String, TopologyError> {
		if matches!(
			self.session,
			Some(DragSession::Node { .. } | DragSession::Arc { .. })
		) {
			return Err(TopologyError::DragInProgress);
		}
		let dragged = match self.session.take() {
			Some(DragSession::Sidebar { kind }) => Some(kind),
			_ => None,
		};
		let payload: SidebarPayload = serde_json::from_str(payload)
			.map_err(|e| TopologyError::InvalidPayload(e.to_string()))?;
		if let Some(kind) = dragged
			&& kind != payload.node_type
		{
			return Err(TopologyError::InvalidPayload(format!(
				"dragged a {} but dropped a {}",
				kind, payload.node_type
			)));
		}
		let position = canvas.to_canvas(client.x, client.y);
		let node = node_from_payload(payload, position, config)?;
		let id = node.id.clone();
		graph.add_node(node).inspect_err(|e| warn!("drag: drop rejected: {}", e))?;
		Ok(id)
	}
}

fn string_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
	data.get(key).and_then(Value::as_str)
}

/// Parse an ASN that the backend may send as a number or a string.
fn parse_asn(value: Option<&Value>) -> Option<u32> {
	match value? {
		Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

/// Build the node a sidebar drop creates.
pub fn node_from_payload(
	payload: SidebarPayload,
	position: Position,
	config: &EditorConfig,
) -> Result<TopologyNode, TopologyError> {
	let data = payload.node_data;
	let name = string_field(&data, "name")
		.ok_or_else(|| TopologyError::InvalidPayload("record has no name".into()))?
		.to_string();

	let (label, asn, color) = match payload.node_type {
		NodeKind::Daemon => {
			let daemon_type =
				string_field(&data, "daemon_type").or_else(|| string_field(&data, "type"));
			let label = match daemon_type {
				Some(t) => format!("{} ({})", name, t),
				None => name,
			};
			let asn = parse_asn(data.get("asn")).unwrap_or(config.default_asn);
			(label, Some(asn), default_node_color(NodeKind::Daemon, daemon_type))
		}
		NodeKind::Host => (name, None, default_node_color(NodeKind::Host, None)),
		other => {
			return Err(TopologyError::InvalidPayload(format!(
				"{} cannot be dropped from the sidebar",
				other
			)));
		}
	};

	Ok(TopologyNode {
		id: generate_id(payload.node_type.as_str()),
		kind: payload.node_type,
		label,
		position,
		data,
		asn,
		color: Some(color.to_string()),
	})
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::super::types::{LinkKind, LinkLabels};
	use super::*;

	const W: f64 = 1200.0;
	const H: f64 = 800.0;

	fn graph() -> TopologyGraph {
		let mut g = TopologyGraph::new();
		for (id, kind, x) in [
			("r1", NodeKind::Daemon, 0.0),
			("r2", NodeKind::Daemon, 200.0),
			("lan", NodeKind::Network, 400.0),
		] {
			g.add_node(TopologyNode {
				id: id.into(),
				kind,
				label: id.into(),
				position: Position::new(x + 100.0, 100.0),
				data: json!({}),
				asn: None,
				color: None,
			})
			.unwrap();
		}
		g
	}

	#[test]
	fn clamp_uses_kind_footprint() {
		let config = EditorConfig::default();
		let network = config.extents.for_kind(NodeKind::Network);
		let daemon = config.extents.for_kind(NodeKind::Daemon);
		assert_eq!(
			clamp_to_canvas(Position::new(5.0, 5.0), network, W, H),
			Position::new(40.0, 20.0)
		);
		assert_eq!(
			clamp_to_canvas(Position::new(1199.0, 799.0), daemon, W, H),
			Position::new(1150.0, 765.0)
		);
	}

	#[test]
	fn node_drag_clamps_and_reports_tracked_position() {
		let config = EditorConfig::default();
		let mut g = graph();
		let mut drag = DragController::new();

		// Grab the network node 10px right of its center.
		assert!(drag.begin_node(&g, "lan", Position::new(510.0, 100.0)));
		assert_eq!(drag.dragged_node(), Some("lan"));

		let update = drag.pointer_move(&mut g, Position::new(15.0, 5.0), W, H, &config);
		assert_eq!(
			update,
			Some(DragUpdate::NodeMoved {
				node_id: "lan".into(),
				position: Position::new(40.0, 20.0),
			})
		);
		assert_eq!(g.find_node("lan").unwrap().position, Position::new(40.0, 20.0));

		drag.pointer_move(&mut g, Position::new(310.0, 300.0), W, H, &config);
		assert_eq!(
			drag.pointer_up(),
			Some(DragEnd::NodeDropped {
				node_id: "lan".into(),
				position: Position::new(300.0, 300.0),
			})
		);
		assert!(!drag.is_active());
		assert_eq!(drag.pointer_up(), None);
	}

	#[test]
	fn only_one_session_at_a_time() {
		let config = EditorConfig::default();
		let mut g = graph();
		g.add_link("r1", "r2", LinkKind::Bgp, LinkLabels::default())
			.unwrap();
		let link = g.links().next().unwrap().id.clone();
		let mut drag = DragController::new();

		assert!(drag.begin_arc(&g, &link, Position::new(200.0, 25.0), &config.curve).is_some());
		assert!(!drag.begin_node(&g, "r1", Position::new(100.0, 100.0)));
		assert!(!drag.begin_sidebar(NodeKind::Host));
		drag.pointer_up();

		assert!(drag.begin_sidebar(NodeKind::Host));
		assert!(!drag.begin_node(&g, "r1", Position::new(100.0, 100.0)));
		assert!(drag.begin_arc(&g, &link, Position::default(), &config.curve).is_none());
		drag.cancel_sidebar();

		assert!(drag.begin_node(&g, "r1", Position::new(100.0, 100.0)));
		let err = drag
			.drop_from_sidebar(
				&mut g,
				r#"{"nodeType":"host","nodeData":{"name":"h1"}}"#,
				Position::new(0.0, 0.0),
				CanvasRect::default(),
				&config,
			)
			.unwrap_err();
		assert!(matches!(err, TopologyError::DragInProgress));
		assert_eq!(g.node_count(), 3);
	}

	#[test]
	fn arc_drag_projects_onto_perpendicular() {
		let config = EditorConfig::default();
		let mut g = graph();
		let link = g
			.add_link("r1", "r2", LinkKind::Bgp, LinkLabels::default())
			.unwrap();
		let mut drag = DragController::new();

		// r1 (100,100) -> r2 (300,100); perpendicular is +y.
		assert_eq!(
			drag.begin_arc(&g, &link, Position::new(200.0, 175.0), &config.curve),
			Some(150.0)
		);
		assert!(drag.is_dragging_arc());
		// Horizontal motion does not change the arc.
		let update = drag.pointer_move(&mut g, Position::new(230.0, 195.0), W, H, &config);
		assert_eq!(
			update,
			Some(DragUpdate::ArcChanged {
				link_id: link.clone(),
				arc: 170.0,
			})
		);
		assert_eq!(g.find_link(&link).unwrap().arc, Some(170.0));
		assert_eq!(
			drag.pointer_up(),
			Some(DragEnd::ArcReleased {
				link_id: link,
				arc: 170.0,
			})
		);
	}

	#[test]
	fn network_links_have_no_arc_handle() {
		let config = EditorConfig::default();
		let mut g = graph();
		let link = g
			.add_link("r1", "lan", LinkKind::Network, LinkLabels::default())
			.unwrap();
		let mut drag = DragController::new();
		assert!(drag.begin_arc(&g, &link, Position::default(), &config.curve).is_none());
		assert!(!drag.is_active());
	}

	#[test]
	fn drop_must_match_the_dragged_kind() {
		let config = EditorConfig::default();
		let mut g = TopologyGraph::new();
		let mut drag = DragController::new();
		let daemon = r#"{"nodeType":"daemon","nodeData":{"name":"r9"}}"#;

		assert!(drag.begin_sidebar(NodeKind::Host));
		let err = drag
			.drop_from_sidebar(&mut g, daemon, Position::default(), CanvasRect::default(), &config)
			.unwrap_err();
		assert!(matches!(err, TopologyError::InvalidPayload(_)));
		assert!(!drag.is_active());
		assert_eq!(g.node_count(), 0);

		assert!(drag.begin_sidebar(NodeKind::Daemon));
		drag.drop_from_sidebar(&mut g, daemon, Position::default(), CanvasRect::default(), &config)
			.unwrap();
		assert_eq!(g.node_count(), 1);
	}

	#[test]
	fn sidebar_drop_builds_daemon_node() {
		let config = EditorConfig::default();
		let mut g = TopologyGraph::new();
		let mut drag = DragController::new();
		let canvas = CanvasRect {
			left: 200.0,
			top: 50.0,
		};
		let payload = json!({
			"nodeType": "daemon",
			"nodeData": {"id": 4, "name": "edge1", "daemon_type": "frr", "asn": "65010"},
		})
		.to_string();

		assert!(drag.begin_sidebar(NodeKind::Daemon));
		let id = drag
			.drop_from_sidebar(&mut g, &payload, Position::new(500.0, 350.0), canvas, &config)
			.unwrap();
		assert!(!drag.is_active());

		let node = g.find_node(&id).unwrap();
		assert_eq!(node.label, "edge1 (frr)");
		assert_eq!(node.asn, Some(65010));
		assert_eq!(node.position, Position::new(300.0, 300.0));
		assert_eq!(node.color.as_deref(), Some(default_node_color(NodeKind::Daemon, Some("frr"))));

		// Dropping the same record again is reported, not deduplicated.
		let err = drag
			.drop_from_sidebar(&mut g, &payload, Position::new(600.0, 350.0), canvas, &config)
			.unwrap_err();
		assert!(matches!(err, TopologyError::DuplicateIdentity { .. }));
		assert_eq!(g.node_count(), 1);
	}

	#[test]
	fn sidebar_drop_defaults_and_validation() {
		let config = EditorConfig::default();
		let position = Position::new(10.0, 10.0);

		let daemon = node_from_payload(
			SidebarPayload {
				node_type: NodeKind::Daemon,
				node_data: json!({"name": "r9"}),
			},
			position,
			&config,
		)
		.unwrap();
		assert_eq!(daemon.label, "r9");
		assert_eq!(daemon.asn, Some(65001));

		let host = node_from_payload(
			SidebarPayload {
				node_type: NodeKind::Host,
				node_data: json!({"name": "client", "asn": 1}),
			},
			position,
			&config,
		)
		.unwrap();
		assert_eq!(host.label, "client");
		assert_eq!(host.asn, None);

		assert!(node_from_payload(
			SidebarPayload {
				node_type: NodeKind::Network,
				node_data: json!({"name": "lan"}),
			},
			position,
			&config,
		)
		.is_err());

		let mut drag = DragController::new();
		let mut g = TopologyGraph::new();
		let err = drag
			.drop_from_sidebar(&mut g, "not json", position, CanvasRect::default(), &config)
			.unwrap_err();
		assert!(matches!(err, TopologyError::InvalidPayload(_)));
	}
}
