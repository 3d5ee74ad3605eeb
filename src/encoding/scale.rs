use crate::{
    constants::{DEPTH_COLORS, DEPTH_DOMAIN},
    encoding::color::Color,
    MapError, Result,
};
use serde::{Deserialize, Serialize};

/// Color space used between anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMode {
    Rgb,
    #[default]
    Lab,
}

/// Continuous mapping from a numeric domain onto evenly spaced color anchors.
///
/// Inputs outside the domain clamp to the nearest endpoint color; NaN maps to
/// the first anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    anchors: Vec<Color>,
    domain: (f64, f64),
    mode: InterpolationMode,
}

impl ColorScale {
    pub fn new(anchors: Vec<Color>, domain: (f64, f64), mode: InterpolationMode) -> Result<Self> {
        if anchors.is_empty() {
            return Err(MapError::Config("color scale needs at least one anchor".into()));
        }
        if !(domain.0.is_finite() && domain.1.is_finite()) || domain.0 >= domain.1 {
            return Err(MapError::Config(format!(
                "color scale domain must be finite and increasing, got [{}, {}]",
                domain.0, domain.1
            )));
        }
        Ok(Self {
            anchors,
            domain,
            mode,
        })
    }

    /// Parses anchors from CSS names or hex strings
    pub fn from_names<S: AsRef<str>>(
        names: &[S],
        domain: (f64, f64),
        mode: InterpolationMode,
    ) -> Result<Self> {
        let anchors = names
            .iter()
            .map(|name| name.as_ref().parse::<Color>())
            .collect::<Result<Vec<_>>>()?;
        Self::new(anchors, domain, mode)
    }

    /// green → yellow → red over 0–180 km, interpolated in Lab
    pub fn depth() -> Self {
        Self {
            anchors: DEPTH_COLORS
                .iter()
                .filter_map(|name| Color::named(name))
                .collect(),
            domain: DEPTH_DOMAIN,
            mode: InterpolationMode::Lab,
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn anchors(&self) -> &[Color] {
        &self.anchors
    }

    pub fn mode(&self) -> InterpolationMode {
        self.mode
    }

    /// Position of `value` inside the domain, clamped to `[0, 1]`
    pub fn normalize(&self, value: f64) -> f64 {
        let (lo, hi) = self.domain;
        let t = (value - lo) / (hi - lo);
        if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, 1.0)
        }
    }

    /// Evaluates the scale at `value`
    pub fn color_at(&self, value: f64) -> Color {
        let t = self.normalize(value);
        let segments = self.anchors.len().saturating_sub(1);
        if segments == 0 {
            return self.anchors[0];
        }

        let scaled = t * segments as f64;
        let index = (scaled.floor() as usize).min(segments - 1);
        let local_t = scaled - index as f64;

        let from = &self.anchors[index];
        let to = &self.anchors[index + 1];
        match self.mode {
            InterpolationMode::Rgb => from.lerp_rgb(to, local_t),
            InterpolationMode::Lab => from.lerp_lab(to, local_t),
        }
    }
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_scale_endpoints() {
        let scale = ColorScale::depth();
        assert_eq!(scale.anchors().len(), 3);
        assert_eq!(scale.color_at(0.0).to_hex(), "#008000");
        assert_eq!(scale.color_at(90.0).to_hex(), "#ffff00");
        assert_eq!(scale.color_at(180.0).to_hex(), "#ff0000");
    }

    #[test]
    fn test_depth_scale_reference_swatches() {
        let scale = ColorScale::depth();
        assert_eq!(scale.color_at(30.0).to_hex(), "#6caa00");
        assert_eq!(scale.color_at(60.0).to_hex(), "#b5d400");
        assert_eq!(scale.color_at(120.0).to_hex(), "#ffc200");
        assert_eq!(scale.color_at(150.0).to_hex(), "#ff7f00");
    }

    #[test]
    fn test_out_of_domain_clamps() {
        let scale = ColorScale::depth();
        assert_eq!(scale.color_at(-5.0), scale.color_at(0.0));
        assert_eq!(scale.color_at(650.0), scale.color_at(180.0));
        assert_eq!(scale.color_at(f64::NAN), scale.color_at(0.0));
    }

    #[test]
    fn test_redness_never_decreases_with_depth() {
        let scale = ColorScale::depth();
        let redness = |d: f64| {
            let c = scale.color_at(d);
            c.r as i32 - c.g as i32
        };
        let mut previous = redness(0.0);
        for depth in 1..=180 {
            let current = redness(depth as f64);
            assert!(current >= previous, "redness dropped at {depth} km");
            previous = current;
        }
    }

    #[test]
    fn test_rgb_mode() {
        let scale = ColorScale::from_names(&["#000000", "#ffffff"], (0.0, 10.0), InterpolationMode::Rgb)
            .unwrap();
        assert_eq!(scale.color_at(5.0), Color::rgb(128, 128, 128));
    }

    #[test]
    fn test_single_anchor_is_constant() {
        let scale = ColorScale::from_names(&["orange"], (0.0, 1.0), InterpolationMode::Lab).unwrap();
        assert_eq!(scale.color_at(0.3), Color::rgb(255, 165, 0));
    }

    #[test]
    fn test_invalid_scales_rejected() {
        assert!(ColorScale::new(vec![], (0.0, 1.0), InterpolationMode::Lab).is_err());
        assert!(ColorScale::from_names(&["red"], (5.0, 5.0), InterpolationMode::Lab).is_err());
        assert!(ColorScale::from_names(&["not-a-color"], (0.0, 1.0), InterpolationMode::Lab).is_err());
    }
}
