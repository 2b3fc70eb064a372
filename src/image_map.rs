use crate::render::escape_xml;
use crate::viewport::{Rect, flip_for_orientation};

#[derive(Debug, Clone, PartialEq)]
pub struct ImageMapElement {
    pub rect: Rect,
    pub url: Option<String>,
}

/// Clickable rectangles of one panel, in final panel pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMap {
    elements: Vec<ImageMapElement>,
}

impl ImageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, rect: Rect, url: Option<String>) {
        self.elements.push(ImageMapElement {
            rect,
            url: url.filter(|url| !url.is_empty()),
        });
    }

    pub fn elements(&self) -> &[ImageMapElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Moves every element into the quarter-turned frame of a vertical panel.
    /// `width` is the panel width before rotation.
    pub fn flip_orientation(&mut self, width: f64) {
        for element in &mut self.elements {
            element.rect = flip_for_orientation(element.rect, width);
        }
    }

    /// HTML companion for the image at `image_src`. Elements without a link
    /// are left out.
    pub fn to_html(&self, image_src: &str) -> String {
        let mut html = String::from("<map name=\"image_map\">\n");
        for element in &self.elements {
            let Some(url) = element.url.as_deref() else {
                continue;
            };
            let r = element.rect;
            html.push_str(&format!(
                "  <area shape=\"rect\" coords=\"{},{},{},{}\" href=\"{}\"/>\n",
                r.left.round() as i64,
                r.top.round() as i64,
                r.right.round() as i64,
                r.bottom.round() as i64,
                escape_xml(url)
            ));
        }
        html.push_str("</map>\n");
        html.push_str(&format!(
            "<img src=\"{}\" usemap=\"#image_map\" border=\"0\"/>\n",
            escape_xml(image_src)
        ));
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_lists_linked_elements_only() {
        let mut map = ImageMap::new();
        map.record(Rect::new(10.0, 40.0, 30.0, 50.0), Some("http://example.org/a?x=1&y=2".into()));
        map.record(Rect::new(50.0, 40.0, 70.0, 50.0), None);
        map.record(Rect::new(80.0, 60.0, 90.0, 70.0), Some(String::new()));
        assert_eq!(map.elements().len(), 3);

        let html = map.to_html("panel.png");
        assert_eq!(html.matches("<area").count(), 1);
        assert!(html.contains("coords=\"10,40,30,50\""));
        assert!(html.contains("href=\"http://example.org/a?x=1&amp;y=2\""));
        assert!(html.contains("<img src=\"panel.png\" usemap=\"#image_map\""));
        assert!(html.starts_with("<map name=\"image_map\">"));
    }

    #[test]
    fn flip_applies_to_every_element_once() {
        let mut map = ImageMap::new();
        map.record(Rect::new(10.0, 40.0, 30.0, 50.0), Some("a".into()));
        map.record(Rect::new(0.0, 0.0, 200.0, 10.0), Some("b".into()));
        map.flip_orientation(200.0);
        assert_eq!(map.elements()[0].rect, Rect::new(40.0, 170.0, 50.0, 190.0));
        assert_eq!(map.elements()[1].rect, Rect::new(0.0, 0.0, 10.0, 200.0));
    }
}
