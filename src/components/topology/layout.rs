//! Layout engine: link curvature and one-shot node placement.
//!
//! Every link is drawn as a quadratic Bézier, even when straight, so that
//! parallel links between the same pair of nodes can be fanned apart.
//! The control point sits on the perpendicular through the straight-line
//! midpoint; its signed distance from that midpoint is the link's offset.
//!
//! Offsets come from one of two places:
//! - an operator-pinned `arc` on a BGP/GRE link, used verbatim;
//! - otherwise the sibling group (same unordered pair, same kind), spread
//!   symmetrically around zero, or the per-kind default for a lone link.

use log::debug;

use super::config::{AutoLayoutConfig, CurveConfig};
use super::store::TopologyGraph;
use super::types::{LinkKind, NodeKind, Position, TopologyLink};

/// Resolved geometry of one link's curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveGeometry {
	pub start: Position,
	pub control: Position,
	pub end: Position,
	/// Point on the curve at t = 0.5, where labels and handles are anchored.
	pub midpoint: Position,
	/// Unit perpendicular to start -> end. Zero for coincident endpoints.
	pub perp: (f64, f64),
	pub offset: f64,
}

impl CurveGeometry {
	/// Evaluate the curve at parameter `t` in `[0, 1]`.
	pub fn point_at(&self, t: f64) -> Position {
		quadratic_point(self.start, self.control, self.end, t)
	}

	/// Approximate distance from `p` to the curve.
	pub fn distance_to(&self, p: Position) -> f64 {
		const SAMPLES: usize = 24;
		let mut best = f64::INFINITY;
		let mut prev = self.start;
		for i in 1..=SAMPLES {
			let next = self.point_at(i as f64 / SAMPLES as f64);
			best = best.min(segment_distance(p, prev, next));
			prev = next;
		}
		best
	}
}

/// Geometry for a link, tagged with the link it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkCurve {
	pub link_id: String,
	pub kind: LinkKind,
	pub geometry: CurveGeometry,
}

/// Unit vector perpendicular to `from -> to`, rotated a quarter turn
/// counter-clockwise in canvas coordinates.
pub fn perpendicular(from: Position, to: Position) -> (f64, f64) {
	let (dx, dy) = (to.x - from.x, to.y - from.y);
	let len = (dx * dx + dy * dy).sqrt();
	if len < 1e-9 {
		return (0.0, 0.0);
	}
	(-dy / len, dx / len)
}

/// `B(t) = (1-t)^2 P0 + 2(1-t)t C + t^2 P2`.
pub fn quadratic_point(p0: Position, c: Position, p2: Position, t: f64) -> Position {
	let u = 1.0 - t;
	Position::new(
		u * u * p0.x + 2.0 * u * t * c.x + t * t * p2.x,
		u * u * p0.y + 2.0 * u * t * c.y + t * t * p2.y,
	)
}

/// Build the curve between two points for a given perpendicular offset.
pub fn curve_between(from: Position, to: Position, offset: f64) -> CurveGeometry {
	let perp = perpendicular(from, to);
	let mid = Position::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
	let control = Position::new(mid.x + perp.0 * offset, mid.y + perp.1 * offset);
	CurveGeometry {
		start: from,
		control,
		end: to,
		midpoint: quadratic_point(from, control, to, 0.5),
		perp,
		offset,
	}
}

/// Project a pointer delta onto the perpendicular, giving the arc change.
pub fn project_on_perpendicular(perp: (f64, f64), dx: f64, dy: f64) -> f64 {
	dx * perp.0 + dy * perp.1
}

fn pinned_arc(link: &TopologyLink) -> Option<f64> {
	if link.kind.has_editable_arc() {
		link.arc
	} else {
		None
	}
}

/// Perpendicular offset the layout engine assigns to `link`.
///
/// A pinned arc is returned as stored. Every derived offset (kind default or
/// spread) is defined in the frame of the lexically smaller endpoint id and
/// flipped for links stored the other way, so a link b -> a reports the
/// negated value of the same link drawn a -> b. The rendered curve is the same.
pub fn link_offset(graph: &TopologyGraph, link: &TopologyLink, config: &CurveConfig) -> f64 {
	if let Some(arc) = pinned_arc(link) {
		return arc;
	}
	let offset = canonical_offset(graph, link, config);
	if link.source > link.target {
		-offset
	} else {
		offset
	}
}

fn canonical_offset(graph: &TopologyGraph, link: &TopologyLink, config: &CurveConfig) -> f64 {
	let siblings: Vec<&TopologyLink> = graph
		.links_between(&link.source, &link.target)
		.filter(|l| l.kind == link.kind && pinned_arc(l).is_none())
		.collect();

	if siblings.len() <= 1 {
		return match link.kind {
			LinkKind::Bgp => config.bgp_default_arc,
			LinkKind::Gre => config.gre_default_arc,
			LinkKind::Network => 0.0,
		};
	}

	let n = siblings.len() as f64;
	let i = siblings
		.iter()
		.position(|l| l.id == link.id)
		.unwrap_or_default() as f64;
	let spacing = match link.kind {
		LinkKind::Network => config.network_spacing,
		LinkKind::Bgp | LinkKind::Gre => config.tunnel_spacing,
	};
	let offset = i * spacing - (n - 1.0) * spacing / 2.0;
	match link.kind {
		LinkKind::Gre => -offset,
		LinkKind::Network | LinkKind::Bgp => offset,
	}
}

/// Curve geometry of one link. `None` when an endpoint is missing.
pub fn link_curve(
	graph: &TopologyGraph,
	link: &TopologyLink,
	config: &CurveConfig,
) -> Option<CurveGeometry> {
	let from = graph.find_node(&link.source)?.position;
	let to = graph.find_node(&link.target)?.position;
	Some(curve_between(from, to, link_offset(graph, link, config)))
}

/// Geometry for every link, in insertion order.
pub fn link_curves(graph: &TopologyGraph, config: &CurveConfig) -> Vec<LinkCurve> {
	graph
		.links()
		.filter_map(|link| {
			link_curve(graph, link, config).map(|geometry| LinkCurve {
				link_id: link.id.clone(),
				kind: link.kind,
				geometry,
			})
		})
		.collect()
}

fn segment_distance(p: Position, a: Position, b: Position) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len_sq = dx * dx + dy * dy;
	let t = if len_sq < 1e-12 {
		0.0
	} else {
		(((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
	};
	let (cx, cy) = (a.x + t * dx - p.x, a.y + t * dy - p.y);
	(cx * cx + cy * cy).sqrt()
}

fn ids_of(graph: &TopologyGraph, pred: impl Fn(NodeKind) -> bool) -> Vec<&str> {
	graph
		.nodes()
		.filter(|n| pred(n.kind))
		.map(|n| n.id.as_str())
		.collect()
}

fn spread(count: usize, index: usize, span: f64) -> f64 {
	span * (index + 1) as f64 / (count + 1) as f64
}

/// Compute auto-layout positions without touching the graph.
///
/// Networks go on a top row, daemons across the middle, hosts along the
/// bottom and external nodes in a column at the right edge. Order within a
/// row follows insertion order, so the result depends only on the node set.
pub fn auto_layout(
	graph: &TopologyGraph,
	width: f64,
	height: f64,
	config: &AutoLayoutConfig,
) -> Vec<(String, Position)> {
	let networks = ids_of(graph, |k| k == NodeKind::Network);
	let daemons = ids_of(graph, |k| k == NodeKind::Daemon);
	let hosts = ids_of(graph, |k| k == NodeKind::Host);
	let externals = ids_of(graph, NodeKind::is_external);

	let mut placed = Vec::with_capacity(graph.node_count());
	let mut row = |ids: &[&str], y: f64| {
		for (i, id) in ids.iter().enumerate() {
			placed.push((id.to_string(), Position::new(spread(ids.len(), i, width), y)));
		}
	};
	row(&networks, config.network_row_y);
	row(&daemons, height / 2.0);
	row(&hosts, height - config.host_row_margin);

	let column_x = width - config.external_column_margin;
	for (i, id) in externals.iter().enumerate() {
		placed.push((
			id.to_string(),
			Position::new(column_x, spread(externals.len(), i, height)),
		));
	}
	placed
}

/// Run [`auto_layout`] and write the positions into the graph.
pub fn apply_auto_layout(
	graph: &mut TopologyGraph,
	width: f64,
	height: f64,
	config: &AutoLayoutConfig,
) -> usize {
	let placed = auto_layout(graph, width, height, config);
	for (id, position) in &placed {
		graph.update_node_position(id, *position);
	}
	debug!("layout: auto-placed {} node(s)", placed.len());
	placed.len()
}
