//! Geometry and placement configuration for the topology editor.
//!
//! Centralizes the constants that drive clamping, curvature and auto-layout so
//! they can be tuned in one place.
//!
//! # Node footprints
//!
//! Every node is drawn as a rectangle centered on its position. The footprint
//! is described by half-extents: a node at `(x, y)` covers
//! `x - half_width ..= x + half_width` horizontally. Network nodes are drawn
//! as flat pills and use a smaller footprint than daemons, hosts and external
//! nodes.
//!
//! # Curvature
//!
//! Links are quadratic Béziers whose control point is displaced from the
//! straight-line midpoint along the unit perpendicular. The displacement
//! ("offset" or "arc") is derived from [`CurveConfig`] unless the operator has
//! pinned it on the link.

use super::types::NodeKind;

/// Half-width and half-height of a node footprint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeExtent {
	pub half_width: f64,
	pub half_height: f64,
}

impl NodeExtent {
	pub const fn new(half_width: f64, half_height: f64) -> Self {
		Self {
			half_width,
			half_height,
		}
	}
}

/// Footprints per node kind.
#[derive(Clone, Debug)]
pub struct NodeExtentConfig {
	/// Network nodes (half-width 40, half-height 20).
	pub network: NodeExtent,
	/// Daemons, hosts and external nodes (half-width 50, half-height 35).
	pub default: NodeExtent,
}

impl NodeExtentConfig {
	pub fn for_kind(&self, kind: NodeKind) -> NodeExtent {
		match kind {
			NodeKind::Network => self.network,
			_ => self.default,
		}
	}
}

/// Constants for link curvature.
#[derive(Clone, Debug)]
pub struct CurveConfig {
	/// Offset of a lone BGP link. Positive bends "up" for a left-to-right link.
	pub bgp_default_arc: f64,
	/// Offset of a lone GRE link, opposite to BGP.
	pub gre_default_arc: f64,
	/// Offset between parallel BGP/GRE links.
	pub tunnel_spacing: f64,
	/// Offset between parallel network links.
	pub network_spacing: f64,
	/// Radius of the arc drag handle drawn at the curve midpoint.
	pub handle_radius: f64,
	/// Distance within which a click selects a link.
	pub link_hit_distance: f64,
}

/// Constants for the one-shot auto-layout.
#[derive(Clone, Debug)]
pub struct AutoLayoutConfig {
	/// Y coordinate of the network row.
	pub network_row_y: f64,
	/// Distance of the host row from the bottom edge.
	pub host_row_margin: f64,
	/// Distance of the external column from the right edge.
	pub external_column_margin: f64,
}

/// Complete editor configuration.
#[derive(Clone, Debug)]
pub struct EditorConfig {
	/// Canvas width unless the component is given an explicit one.
	pub canvas_width: f64,
	/// Canvas height unless the component is given an explicit one.
	pub canvas_height: f64,
	pub extents: NodeExtentConfig,
	pub curve: CurveConfig,
	pub layout: AutoLayoutConfig,
	/// ASN assigned to dropped daemons whose record carries none.
	pub default_asn: u32,
}

impl Default for EditorConfig {
	fn default() -> Self {
		Self {
			canvas_width: 1200.0,
			canvas_height: 800.0,
			extents: NodeExtentConfig {
				network: NodeExtent::new(40.0, 20.0),
				default: NodeExtent::new(50.0, 35.0),
			},
			curve: CurveConfig {
				bgp_default_arc: 150.0,
				gre_default_arc: -150.0,
				tunnel_spacing: 200.0,
				network_spacing: 60.0,
				handle_radius: 8.0,
				link_hit_distance: 6.0,
			},
			layout: AutoLayoutConfig {
				network_row_y: 100.0,
				host_row_margin: 150.0,
				external_column_margin: 100.0,
			},
			default_asn: 65001,
		}
	}
}
