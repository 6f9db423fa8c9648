// Geometry seam between the engine and whatever renders the page.
// The engine never measures anything itself; it reads a snapshot per event.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Live layout queries answered by the presentation layer.
pub trait GeometryProvider {
    /// Current viewport size.
    fn viewport(&self) -> Size;

    /// Bounding box of `id`, or `None` when the element is not rendered.
    fn rect(&self, id: ElementId) -> Option<Rect>;
}

/// Point-in-time geometry sent from JS alongside each event.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeometrySnapshot {
    pub viewport: Size,
    #[serde(default)]
    pub elements: HashMap<ElementId, Rect>,
}

impl GeometrySnapshot {
    pub fn new(viewport: Size) -> Self {
        GeometrySnapshot {
            viewport,
            elements: HashMap::new(),
        }
    }

    pub fn with(mut self, id: ElementId, rect: Rect) -> Self {
        self.elements.insert(id, rect);
        self
    }
}

impl GeometryProvider for GeometrySnapshot {
    fn viewport(&self) -> Size {
        self.viewport
    }

    fn rect(&self, id: ElementId) -> Option<Rect> {
        self.elements.get(&id).copied()
    }
}

/// Collect the rectangles the primary control must stay clear of, in a fixed
/// order: anchor image, header, then the help control once it is revealed.
/// Elements that are not rendered are skipped.
pub fn forbidden_regions<G: GeometryProvider + ?Sized>(geometry: &G, help_revealed: bool) -> Vec<Rect> {
    let mut ids = vec![ElementId::AnchorImage, ElementId::Header];
    if help_revealed {
        ids.push(ElementId::HelpControl);
    }
    ids.into_iter().filter_map(|id| geometry.rect(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> GeometrySnapshot {
        GeometrySnapshot::new(Size::new(1024.0, 768.0))
            .with(ElementId::AnchorImage, Rect::new(50.0, 412.0, 200.0, 200.0))
            .with(ElementId::Header, Rect::new(400.0, 0.0, 1024.0, 40.0))
            .with(ElementId::HelpControl, Rect::new(700.0, 430.0, 164.0, 40.0))
    }

    #[test]
    fn help_control_excluded_until_revealed() {
        let geometry = snapshot();
        assert_eq!(forbidden_regions(&geometry, false).len(), 2);

        let revealed = forbidden_regions(&geometry, true);
        assert_eq!(revealed.len(), 3);
        assert_eq!(revealed[2], Rect::new(700.0, 430.0, 164.0, 40.0));
    }

    #[test]
    fn missing_elements_are_skipped() {
        let geometry = GeometrySnapshot::new(Size::new(800.0, 600.0))
            .with(ElementId::Header, Rect::new(300.0, 0.0, 800.0, 40.0));
        let regions = forbidden_regions(&geometry, true);
        assert_eq!(regions, vec![Rect::new(300.0, 0.0, 800.0, 40.0)]);
    }

    #[test]
    fn snapshot_parses_from_json() {
        let json = r#"{
            "viewport": {"width": 800, "height": 600},
            "elements": {
                "AnchorImage": {"top": 50, "left": 300, "width": 200, "height": 200},
                "Header": {"x": 0, "y": 400, "top": 400, "left": 0, "width": 800, "height": 40, "right": 800, "bottom": 440}
            }
        }"#;
        let geometry: GeometrySnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(geometry.viewport(), Size::new(800.0, 600.0));
        assert_eq!(geometry.rect(ElementId::AnchorImage).map(|r| r.bottom), Some(250.0));
        assert!(geometry.rect(ElementId::HelpControl).is_none());
    }
}
