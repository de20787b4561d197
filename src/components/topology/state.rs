//! Editor state and pointer dispatch.
//!
//! Combines the graph store with the interaction and drag controllers. The
//! canvas component forwards raw pointer events here and receives back a list
//! of [`EditorEvent`]s to hand to its callbacks. Nothing in this module
//! touches the DOM.

use log::{info, warn};

use super::config::EditorConfig;
use super::drag::{CanvasRect, DragController, DragEnd, DragUpdate};
use super::error::TopologyError;
use super::interaction::{ConnectStep, InteractionController, InteractionMode, Selection, Shortcut};
use super::layout::{apply_auto_layout, link_curves};
use super::store::TopologyGraph;
use super::types::{NodeKind, Position, TopologyData};

/// Notifications for the hosting UI.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
	/// A node drag finished; persist the position.
	NodeDragEnd { node_id: String, position: Position },
	ArcDragStart { link_id: String, arc: f64 },
	ArcDrag { link_id: String, arc: f64 },
	/// An arc drag finished; persist the arc.
	ArcDragEnd { link_id: String, arc: f64 },
	/// The graph changed shape (nodes or links added or removed, layout run).
	Changed,
	/// A rejected operation the operator should be told about.
	Notice(String),
}

/// What lies under the pointer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hit {
	ArcHandle(String),
	Node(String),
	Link(String),
}

/// Whole editor state, owned by the canvas component.
pub struct TopologyEditorState {
	pub graph: TopologyGraph,
	pub interaction: InteractionController,
	pub drag: DragController,
	pub config: EditorConfig,
	pub width: f64,
	pub height: f64,
	/// Latest operator-facing message, cleared by the next successful action.
	pub notice: Option<String>,
}

impl TopologyEditorState {
	pub fn new(graph: TopologyGraph, width: f64, height: f64, config: EditorConfig) -> Self {
		Self {
			graph,
			interaction: InteractionController::new(),
			drag: DragController::new(),
			config,
			width,
			height,
			notice: None,
		}
	}

	pub fn load(&mut self, data: TopologyData) {
		self.graph = TopologyGraph::from_data(data);
		self.interaction.select(None);
		self.interaction.cancel_pending();
		info!(
			"editor: loaded {} nodes, {} links",
			self.graph.node_count(),
			self.graph.link_count()
		);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Node whose footprint contains `p`. Later nodes are drawn on top and win.
	pub fn node_at(&self, p: Position) -> Option<&str> {
		self.graph
			.nodes()
			.filter(|n| {
				let extent = self.config.extents.for_kind(n.kind);
				(p.x - n.position.x).abs() <= extent.half_width
					&& (p.y - n.position.y).abs() <= extent.half_height
			})
			.last()
			.map(|n| n.id.as_str())
	}

	/// Hit test in priority order: arc handles (select mode only), nodes, links.
	pub fn hit_test(&self, p: Position) -> Option<Hit> {
		let curves = link_curves(&self.graph, &self.config.curve);
		if self.interaction.mode() == InteractionMode::Select {
			let r = self.config.curve.handle_radius;
			let handle = curves.iter().rev().find(|c| {
				let (dx, dy) = (p.x - c.geometry.midpoint.x, p.y - c.geometry.midpoint.y);
				c.kind.has_editable_arc() && dx * dx + dy * dy <= r * r
			});
			if let Some(c) = handle {
				return Some(Hit::ArcHandle(c.link_id.clone()));
			}
		}
		if let Some(id) = self.node_at(p) {
			return Some(Hit::Node(id.to_string()));
		}
		curves
			.iter()
			.rev()
			.find(|c| c.geometry.distance_to(p) <= self.config.curve.link_hit_distance)
			.map(|c| Hit::Link(c.link_id.clone()))
	}

	/// Mouse-down on the canvas.
	pub fn pointer_down(&mut self, p: Position) -> Vec<EditorEvent> {
		if self.drag.is_active() {
			return Vec::new();
		}
		match self.hit_test(p) {
			Some(Hit::ArcHandle(link_id)) => {
				self.interaction.select(Some(Selection::Link(link_id.clone())));
				match self.drag.begin_arc(&self.graph, &link_id, p, &self.config.curve) {
					Some(arc) => vec![EditorEvent::ArcDragStart { link_id, arc }],
					None => Vec::new(),
				}
			}
			Some(Hit::Node(node_id)) => self.node_pressed(&node_id, p),
			Some(Hit::Link(link_id)) => {
				if self.interaction.mode() == InteractionMode::Select {
					self.interaction.select(Some(Selection::Link(link_id)));
				}
				Vec::new()
			}
			None => {
				self.interaction.select(None);
				Vec::new()
			}
		}
	}

	fn node_pressed(&mut self, node_id: &str, p: Position) -> Vec<EditorEvent> {
		match self.interaction.mode() {
			InteractionMode::Select => {
				self.interaction.select(Some(Selection::Node(node_id.to_string())));
				self.drag.begin_node(&self.graph, node_id, p);
				Vec::new()
			}
			InteractionMode::AddLink
			| InteractionMode::AddBgpNeighbor
			| InteractionMode::AddGreTunnel => {
				match self.interaction.on_node_click_for_connection(&mut self.graph, node_id) {
					Ok(ConnectStep::Linked(_)) => {
						self.notice = None;
						vec![EditorEvent::Changed]
					}
					Ok(_) => Vec::new(),
					Err(e) => self.reject(e),
				}
			}
		}
	}

	pub fn pointer_move(&mut self, p: Position) -> Vec<EditorEvent> {
		let update =
			self.drag
				.pointer_move(&mut self.graph, p, self.width, self.height, &self.config);
		match update {
			Some(DragUpdate::ArcChanged { link_id, arc }) => {
				vec![EditorEvent::ArcDrag { link_id, arc }]
			}
			Some(DragUpdate::NodeMoved { .. }) | None => Vec::new(),
		}
	}

	/// Mouse-up, or the pointer leaving the canvas.
	pub fn pointer_up(&mut self) -> Vec<EditorEvent> {
		match self.drag.pointer_up() {
			Some(DragEnd::NodeDropped { node_id, position }) => {
				vec![EditorEvent::NodeDragEnd { node_id, position }, EditorEvent::Changed]
			}
			Some(DragEnd::ArcReleased { link_id, arc }) => {
				vec![EditorEvent::ArcDragEnd { link_id, arc }, EditorEvent::Changed]
			}
			Some(DragEnd::SidebarCancelled) | None => Vec::new(),
		}
	}

	pub fn begin_sidebar_drag(&mut self, kind: NodeKind) -> bool {
		self.drag.begin_sidebar(kind)
	}

	pub fn end_sidebar_drag(&mut self) {
		self.drag.cancel_sidebar();
	}

	/// A sidebar payload was dropped at `client` (viewport coordinates).
	pub fn drop_payload(&mut self, payload: &str, client: Position, canvas: CanvasRect) -> Vec<EditorEvent> {
		match self
			.drag
			.drop_from_sidebar(&mut self.graph, payload, client, canvas, &self.config)
		{
			Ok(id) => {
				self.notice = None;
				self.interaction.select(Some(Selection::Node(id)));
				vec![EditorEvent::Changed]
			}
			Err(e) => self.reject(e),
		}
	}

	pub fn set_mode(&mut self, mode: InteractionMode) {
		self.interaction.set_mode(mode);
	}

	/// Add a network node on the network row.
	pub fn add_network(&mut self, name: &str) -> Vec<EditorEvent> {
		let center = Position::new(self.width / 2.0, self.config.layout.network_row_y);
		match self.graph.add_network(name, center) {
			Ok(_) => vec![EditorEvent::Changed],
			Err(e) => self.reject(e),
		}
	}

	/// Add an external node on the right-hand column.
	pub fn add_external(&mut self, kind: NodeKind, name: &str) -> Vec<EditorEvent> {
		let at = Position::new(
			self.width - self.config.layout.external_column_margin,
			self.height / 2.0,
		);
		match self.graph.add_external(kind, name, at) {
			Ok(_) => vec![EditorEvent::Changed],
			Err(e) => self.reject(e),
		}
	}

	pub fn auto_layout(&mut self) -> Vec<EditorEvent> {
		apply_auto_layout(&mut self.graph, self.width, self.height, &self.config.layout);
		vec![EditorEvent::Changed]
	}

	pub fn delete_selected(&mut self) -> Vec<EditorEvent> {
		if self.drag.is_active() {
			return Vec::new();
		}
		match self.interaction.delete_selected(&mut self.graph) {
			Some(removed) => {
				info!("editor: deleted {:?}", removed);
				vec![EditorEvent::Changed]
			}
			None => Vec::new(),
		}
	}

	pub fn shortcut(&mut self, shortcut: Shortcut) -> Vec<EditorEvent> {
		match shortcut {
			Shortcut::DeleteSelection => self.delete_selected(),
			Shortcut::Cancel => {
				self.interaction.cancel_pending();
				self.interaction.select(None);
				Vec::new()
			}
		}
	}

	/// Hand the selected link's curvature back to the layout engine.
	pub fn reset_selected_arc(&mut self) -> Vec<EditorEvent> {
		match self.interaction.selection() {
			Some(Selection::Link(id)) => {
				let id = id.clone();
				self.graph.set_link_arc(&id, None);
				vec![EditorEvent::Changed]
			}
			_ => Vec::new(),
		}
	}

	pub fn clear(&mut self) -> Vec<EditorEvent> {
		self.drag.pointer_up();
		self.graph.clear();
		self.interaction.select(None);
		self.interaction.cancel_pending();
		vec![EditorEvent::Changed]
	}

	fn reject(&mut self, error: TopologyError) -> Vec<EditorEvent> {
		warn!("editor: {}", error);
		let message = error.to_string();
		self.notice = Some(message.clone());
		vec![EditorEvent::Notice(message)]
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::super::types::{LinkKind, LinkLabels, TopologyNode};
	use super::*;

	fn editor() -> TopologyEditorState {
		let mut g = TopologyGraph::new();
		for (id, kind, x, y) in [
			("r1", NodeKind::Daemon, 200.0, 400.0),
			("r2", NodeKind::Daemon, 600.0, 400.0),
			("lan", NodeKind::Network, 400.0, 100.0),
		] {
			g.add_node(TopologyNode {
				id: id.into(),
				kind,
				label: id.into(),
				position: Position::new(x, y),
				data: json!({}),
				asn: None,
				color: None,
			})
			.unwrap();
		}
		TopologyEditorState::new(g, 1200.0, 800.0, EditorConfig::default())
	}

	#[test]
	fn select_mode_drag_reports_end_once() {
		let mut ed = editor();
		assert!(ed.pointer_down(Position::new(205.0, 410.0)).is_empty());
		assert_eq!(ed.interaction.selection(), Some(&Selection::Node("r1".into())));
		assert_eq!(ed.drag.dragged_node(), Some("r1"));

		ed.pointer_move(Position::new(255.0, 460.0));
		ed.pointer_move(Position::new(2000.0, 460.0));
		let events = ed.pointer_up();
		assert_eq!(
			events,
			vec![
				EditorEvent::NodeDragEnd {
					node_id: "r1".into(),
					position: Position::new(1150.0, 450.0),
				},
				EditorEvent::Changed,
			]
		);
		assert!(ed.pointer_up().is_empty());
	}

	#[test]
	fn connect_mode_routes_clicks_instead_of_dragging() {
		let mut ed = editor();
		ed.set_mode(InteractionMode::AddLink);
		assert!(ed.pointer_down(Position::new(200.0, 400.0)).is_empty());
		assert!(!ed.drag.is_active());
		ed.pointer_up();
		assert_eq!(
			ed.pointer_down(Position::new(400.0, 100.0)),
			vec![EditorEvent::Changed]
		);
		assert_eq!(ed.graph.link_count(), 1);
		assert_eq!(ed.graph.links().next().unwrap().kind, LinkKind::Network);
	}

	#[test]
	fn arc_handle_drag_emits_start_move_end() {
		let mut ed = editor();
		let id = ed
			.graph
			.add_link("r1", "r2", LinkKind::Bgp, LinkLabels::default())
			.unwrap();
		// r1 -> r2 is horizontal; offset 150 puts the curve midpoint at y = 475.
		assert_eq!(
			ed.hit_test(Position::new(400.0, 475.0)),
			Some(Hit::ArcHandle(id.clone()))
		);
		assert_eq!(
			ed.pointer_down(Position::new(400.0, 475.0)),
			vec![EditorEvent::ArcDragStart {
				link_id: id.clone(),
				arc: 150.0,
			}]
		);
		assert_eq!(
			ed.pointer_move(Position::new(400.0, 445.0)),
			vec![EditorEvent::ArcDrag {
				link_id: id.clone(),
				arc: 120.0,
			}]
		);
		assert_eq!(
			ed.pointer_up(),
			vec![
				EditorEvent::ArcDragEnd {
					link_id: id.clone(),
					arc: 120.0,
				},
				EditorEvent::Changed,
			]
		);

		assert_eq!(ed.reset_selected_arc(), vec![EditorEvent::Changed]);
		assert_eq!(ed.graph.find_link(&id).unwrap().arc, None);
	}

	#[test]
	fn sidebar_session_blocks_node_drag() {
		let mut ed = editor();
		assert!(ed.begin_sidebar_drag(NodeKind::Host));
		assert!(ed.pointer_down(Position::new(200.0, 400.0)).is_empty());
		assert_eq!(ed.drag.dragged_node(), None);
		ed.end_sidebar_drag();
		ed.pointer_down(Position::new(200.0, 400.0));
		assert_eq!(ed.drag.dragged_node(), Some("r1"));
	}

	#[test]
	fn rejected_drop_surfaces_notice() {
		let mut ed = editor();
		let payload = r#"{"nodeType":"host","nodeData":{"id":1,"name":"h1"}}"#;
		let canvas = CanvasRect::default();
		assert_eq!(
			ed.drop_payload(payload, Position::new(300.0, 650.0), canvas),
			vec![EditorEvent::Changed]
		);
		let events = ed.drop_payload(payload, Position::new(500.0, 650.0), canvas);
		assert!(matches!(events.as_slice(), [EditorEvent::Notice(_)]));
		assert!(ed.notice.is_some());
		assert_eq!(ed.graph.node_count(), 4);
	}

	#[test]
	fn connect_to_deleted_node_is_rejected_via_notice() {
		let mut ed = editor();
		ed.set_mode(InteractionMode::AddBgpNeighbor);
		ed.pointer_down(Position::new(200.0, 400.0));
		ed.graph.remove_node("r1");
		let events = ed.pointer_down(Position::new(600.0, 400.0));
		assert!(matches!(events.as_slice(), [EditorEvent::Notice(_)]));
		assert_eq!(ed.interaction.first_selected_for_link(), None);
	}

	#[test]
	fn backspace_while_typing_keeps_the_selection() {
		let mut ed = editor();
		ed.graph
			.add_link("r1", "lan", LinkKind::Network, LinkLabels::default())
			.unwrap();
		ed.pointer_down(Position::new(200.0, 400.0));
		ed.pointer_up();

		// Typing a name: the key is editing text, not a shortcut.
		assert_eq!(Shortcut::from_key("Backspace", true), None);
		assert_eq!(ed.graph.node_count(), 3);
		assert_eq!(ed.interaction.selection(), Some(&Selection::Node("r1".into())));

		let key = Shortcut::from_key("Backspace", false).unwrap();
		assert_eq!(ed.shortcut(key), vec![EditorEvent::Changed]);
		assert!(ed.graph.find_node("r1").is_none());
		assert_eq!(ed.graph.link_count(), 0);
	}

	#[test]
	fn escape_drops_pending_pick_and_selection() {
		let mut ed = editor();
		ed.set_mode(InteractionMode::AddBgpNeighbor);
		ed.pointer_down(Position::new(200.0, 400.0));
		assert_eq!(ed.interaction.first_selected_for_link(), Some("r1"));
		assert!(ed.shortcut(Shortcut::Cancel).is_empty());
		assert_eq!(ed.interaction.first_selected_for_link(), None);
		assert_eq!(ed.interaction.selection(), None);
	}

	#[test]
	fn delete_and_clear() {
		let mut ed = editor();
		ed.graph
			.add_link("r1", "lan", LinkKind::Network, LinkLabels::default())
			.unwrap();
		ed.pointer_down(Position::new(400.0, 100.0));
		ed.pointer_up();
		assert_eq!(ed.delete_selected(), vec![EditorEvent::Changed]);
		assert_eq!(ed.graph.node_count(), 2);
		assert_eq!(ed.graph.link_count(), 0);

		ed.clear();
		assert!(ed.graph.is_empty());
	}
}
