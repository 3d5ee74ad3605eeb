use crate::core::geo::LatLng;

/// A popup anchored to a geographic position. `content` holds the same
/// light markup Leaflet popups accept (`<br>` line breaks).
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    /// Id of the layer the popup belongs to
    pub source_id: String,
    pub position: LatLng,
    pub content: String,
}

impl Popup {
    pub fn new(source_id: impl Into<String>, position: LatLng, content: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            position,
            content: content.into(),
        }
    }

    /// Content for text-only backends: line breaks become newlines and any
    /// other tag is dropped
    pub fn plain_text(&self) -> String {
        strip_markup(&self.content)
    }
}

/// Turns light HTML (popup content, attributions) into plain text: line
/// breaks become newlines, `&copy;`/`&amp;` are decoded and other tags are
/// dropped
pub fn strip_markup(markup: &str) -> String {
    let normalized = markup
        .replace("<br />", "\n")
        .replace("<br/>", "\n")
        .replace("<br>", "\n")
        .replace("&copy;", "\u{a9}");

    let mut out = String::with_capacity(normalized.len());
    let mut in_tag = false;
    for ch in normalized.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.replace("&amp;", "&")
}

/// Keeps at most one popup open, like Leaflet's default `closePopupOnClick`
#[derive(Debug, Default)]
pub struct PopupManager {
    current: Option<Popup>,
}

impl PopupManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `popup`, closing the previous one
    pub fn open(&mut self, popup: Popup) -> Option<Popup> {
        self.current.replace(popup)
    }

    pub fn close(&mut self) -> Option<Popup> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&Popup> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let popup = Popup::new("q1", LatLng::new(0.0, 0.0), "Magnitude: 4.5<br>Depth: 10 km");
        assert_eq!(popup.plain_text(), "Magnitude: 4.5\nDepth: 10 km");

        let styled = Popup::new("q1", LatLng::new(0.0, 0.0), "<b>M</b> 2<br/>x");
        assert_eq!(styled.plain_text(), "M 2\nx");
    }

    #[test]
    fn test_strip_attribution_markup() {
        let attribution =
            "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";
        assert_eq!(strip_markup(attribution), "\u{a9} OpenStreetMap contributors");
    }

    #[test]
    fn test_single_open_popup() {
        let mut popups = PopupManager::new();
        assert!(popups.open(Popup::new("a", LatLng::new(1.0, 1.0), "a")).is_none());

        let previous = popups.open(Popup::new("b", LatLng::new(2.0, 2.0), "b"));
        assert_eq!(previous.map(|p| p.source_id), Some("a".to_string()));
        assert_eq!(popups.current().map(|p| p.source_id.as_str()), Some("b"));

        popups.close();
        assert!(!popups.is_open());
    }
}
