//! Visual encoding: depth → color, magnitude → radius, and the depth legend.

pub mod color;
pub mod legend;
pub mod marker;
pub mod scale;

pub use color::Color;
pub use legend::{build_legend, Legend, LegendEntry};
pub use marker::{compute_marker_style, popup_text, MarkerEncoder, MarkerStyle};
pub use scale::{ColorScale, InterpolationMode};
