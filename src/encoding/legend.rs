use crate::{
    constants::LEGEND_TITLE,
    encoding::{color::Color, scale::ColorScale},
    MapError, Result,
};
use serde::{Deserialize, Serialize};

/// One swatch of the depth legend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub threshold: f64,
    pub color: Color,
    pub label: String,
}

/// Title plus swatches, ordered top to bottom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    /// Markup for HTML-capable hosts: a bold title line followed by one
    /// swatch-and-label line per entry.
    pub fn to_html(&self) -> String {
        std::iter::once(format!("<strong>{}</strong>", self.title))
            .chain(self.entries.iter().map(|entry| {
                format!(
                    "<i style=\"background: {}\"></i> {}",
                    entry.color.to_hex(),
                    entry.label
                )
            }))
            .collect::<Vec<_>>()
            .join("<br>")
    }
}

/// Builds legend swatches for ascending depth thresholds.
///
/// Every threshold but the last is labelled `"{t} - {next} km"`; the last
/// bucket is open-ended (`"{t}+ km"`). Swatch colors come from `scale`.
pub fn build_legend(thresholds: &[f64], scale: &ColorScale) -> Result<Legend> {
    if thresholds.is_empty() {
        return Err(MapError::InvalidLegend("no thresholds".into()));
    }
    if let Some(bad) = thresholds.iter().find(|t| !t.is_finite()) {
        return Err(MapError::InvalidLegend(format!("non-finite threshold {bad}")));
    }
    if let Some(pair) = thresholds.windows(2).find(|w| w[0] >= w[1]) {
        return Err(MapError::InvalidLegend(format!(
            "thresholds must be strictly ascending ({} then {})",
            pair[0], pair[1]
        )));
    }

    let entries = thresholds
        .iter()
        .enumerate()
        .map(|(index, &threshold)| {
            let label = match thresholds.get(index + 1) {
                Some(next) => format!("{threshold} - {next} km"),
                None => format!("{threshold}+ km"),
            };
            LegendEntry {
                threshold,
                color: scale.color_at(threshold),
                label,
            }
        })
        .collect();

    Ok(Legend {
        title: LEGEND_TITLE.to_string(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LEGEND_DEPTHS;

    #[test]
    fn test_default_depth_legend() {
        let scale = ColorScale::depth();
        let legend = build_legend(&LEGEND_DEPTHS, &scale).unwrap();

        assert_eq!(legend.title, "Depth Legend");
        assert_eq!(
            legend.labels(),
            vec!["0 - 60 km", "60 - 120 km", "120 - 180 km", "180+ km"]
        );
        for entry in &legend.entries {
            assert_eq!(entry.color, scale.color_at(entry.threshold));
        }
    }

    #[test]
    fn test_single_threshold_is_open_ended() {
        let legend = build_legend(&[300.0], &ColorScale::depth()).unwrap();
        assert_eq!(legend.labels(), vec!["300+ km"]);
    }

    #[test]
    fn test_fractional_thresholds() {
        let legend = build_legend(&[0.0, 2.5], &ColorScale::depth()).unwrap();
        assert_eq!(legend.labels(), vec!["0 - 2.5 km", "2.5+ km"]);
    }

    #[test]
    fn test_invalid_thresholds() {
        let scale = ColorScale::depth();
        assert!(build_legend(&[], &scale).is_err());
        assert!(build_legend(&[60.0, 0.0], &scale).is_err());
        assert!(build_legend(&[0.0, 0.0], &scale).is_err());
        assert!(build_legend(&[0.0, f64::INFINITY], &scale).is_err());
    }

    #[test]
    fn test_html_markup() {
        let legend = build_legend(&[0.0, 180.0], &ColorScale::depth()).unwrap();
        assert_eq!(
            legend.to_html(),
            "<strong>Depth Legend</strong><br>\
             <i style=\"background: #008000\"></i> 0 - 180 km<br>\
             <i style=\"background: #ff0000\"></i> 180+ km"
        );
    }
}
