//! Visual theming for the topology canvas.
//!
//! Holds the static color lookup tables (daemon type -> color, link kind ->
//! stroke) and the canvas chrome colors used by the renderer.

use super::types::{LinkKind, NodeKind};

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * f) as u8,
			g: (self.g as f64 * f) as u8,
			b: (self.b as f64 * f) as u8,
			a: self.a,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}

	/// Parses a CSS color string. Supports `#RRGGBB` and `rgb()`/`rgba()`;
	/// anything else falls back to mid gray.
	pub fn parse(color_str: &str) -> Self {
		if color_str.starts_with('#') && color_str.len() == 7 {
			let channel = |i: usize| {
				color_str
					.get(i..i + 2)
					.and_then(|s| u8::from_str_radix(s, 16).ok())
					.unwrap_or(128)
			};
			Color::rgb(channel(1), channel(3), channel(5))
		} else if color_str.starts_with("rgb") {
			let nums: Vec<&str> = color_str
				.trim_start_matches("rgba(")
				.trim_start_matches("rgb(")
				.trim_end_matches(')')
				.split(',')
				.collect();
			let channel = |i: usize| {
				nums.get(i)
					.and_then(|s| s.trim().parse().ok())
					.unwrap_or(128)
			};
			let a = nums
				.get(3)
				.and_then(|s| s.trim().parse().ok())
				.unwrap_or(1.0);
			Color::rgba(channel(0), channel(1), channel(2), a)
		} else {
			Color::rgb(128, 128, 128)
		}
	}
}

/// Default node color by node kind and, for daemons, daemon implementation.
pub fn default_node_color(kind: NodeKind, daemon_type: Option<&str>) -> &'static str {
	match kind {
		NodeKind::Daemon => match daemon_type.map(str::to_ascii_lowercase).as_deref() {
			Some("frr") => "#2e7d32",
			Some("gobgp") => "#1976d2",
			Some("exabgp") => "#7b1fa2",
			Some("bird") => "#c62828",
			Some("openbgpd") => "#e65100",
			_ => "#455a64",
		},
		NodeKind::Host => "#00838f",
		NodeKind::Network => "#78909c",
		NodeKind::ExternalNode => "#f57c00",
		NodeKind::ExternalNetwork => "#8d6e63",
	}
}

/// Stroke style per link kind.
#[derive(Clone, Debug)]
pub struct LinkStyle {
	pub color: Color,
	pub width: f64,
	/// Dash pattern (dash, gap). `None` draws a solid line.
	pub dash: Option<(f64, f64)>,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	pub background: Color,
	pub grid: Color,
	pub network_link: LinkStyle,
	pub bgp_link: LinkStyle,
	pub gre_link: LinkStyle,
	pub label: Color,
	pub endpoint_label: Color,
	pub selection: Color,
	/// Outline of the first node picked in a connect mode.
	pub pending: Color,
	pub handle: Color,
}

impl Theme {
	pub fn link_style(&self, kind: LinkKind) -> &LinkStyle {
		match kind {
			LinkKind::Network => &self.network_link,
			LinkKind::Bgp => &self.bgp_link,
			LinkKind::Gre => &self.gre_link,
		}
	}

	/// Fill color of a node: explicit override, else the kind default.
	pub fn node_fill(&self, kind: NodeKind, color: Option<&str>) -> Color {
		Color::parse(color.unwrap_or_else(|| default_node_color(kind, None)))
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: Color::rgb(22, 27, 34),
			grid: Color::rgba(140, 160, 180, 0.08),
			network_link: LinkStyle {
				color: Color::rgba(140, 160, 180, 0.7),
				width: 2.0,
				dash: None,
			},
			bgp_link: LinkStyle {
				color: Color::rgb(76, 175, 80),
				width: 2.0,
				dash: Some((8.0, 4.0)),
			},
			gre_link: LinkStyle {
				color: Color::rgb(255, 152, 0),
				width: 2.0,
				dash: Some((3.0, 3.0)),
			},
			label: Color::rgba(255, 255, 255, 0.9),
			endpoint_label: Color::rgba(200, 210, 220, 0.8),
			selection: Color::rgb(255, 235, 59),
			pending: Color::rgb(79, 195, 247),
			handle: Color::rgb(255, 255, 255),
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn parses_hex_and_rgb() {
		assert_eq!(Color::parse("#2e7d32"), Color::rgb(0x2e, 0x7d, 0x32));
		assert_eq!(
			Color::parse("rgba(1, 2, 3, 0.5)"),
			Color::rgba(1, 2, 3, 0.5)
		);
		assert_eq!(Color::parse("tomato"), Color::rgb(128, 128, 128));
	}

	#[test]
	fn daemon_colors_by_type() {
		assert_eq!(default_node_color(NodeKind::Daemon, Some("FRR")), "#2e7d32");
		assert_eq!(default_node_color(NodeKind::Daemon, Some("unknown")), "#455a64");
		assert_eq!(default_node_color(NodeKind::Daemon, None), "#455a64");
		assert_eq!(default_node_color(NodeKind::Host, Some("frr")), "#00838f");
	}

	#[test]
	fn css_round_trip() {
		let c = Color::rgb(0x12, 0xab, 0xff);
		assert_eq!(Color::parse(&c.to_css()), c);
		assert_eq!(c.with_alpha(0.5).to_css(), "rgba(18, 171, 255, 0.5)");
	}
}
