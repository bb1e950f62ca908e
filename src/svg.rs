//! SVG text backend.

use crate::color::Rgb;
use crate::scene::{Line, Scene, Shape, Text};

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn rgb(color: Rgb) -> String {
    let (r, g, b) = color.to_u8();
    format!("rgb({},{},{})", r, g, b)
}

fn push_line(svg: &mut String, line: &Line) {
    svg.push_str(&format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}px"/>"#,
        line.from.0,
        line.from.1,
        line.to.0,
        line.to.1,
        rgb(line.color),
        line.width
    ));
    svg.push('\n');
}

fn push_text(svg: &mut String, text: &Text) {
    let (x, y) = text.at;
    let transform = if text.rotate != 0.0 {
        format!(r#" transform="rotate({},{},{})""#, text.rotate, x, y)
    } else {
        String::new()
    };
    let italic = if text.italic { "; font-style:italic" } else { "" };
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" fill="{}"{} style="font-size:{}px; font-family:{}{}">{}</text>"#,
        x,
        y,
        rgb(text.color),
        transform,
        text.size,
        text.family,
        italic,
        escape_xml(&text.content)
    ));
    svg.push('\n');
}

/// Render the scene as a standalone SVG document.
pub fn render_svg(scene: &Scene) -> String {
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}px" height="{}px" viewBox="0 0 {} {}">
<rect width="100%" height="100%" fill="white"/>
"#,
        scene.width, scene.height, scene.width, scene.height
    ));

    for shape in &scene.shapes {
        match shape {
            Shape::Line(line) => push_line(&mut svg, line),
            Shape::Text(text) => push_text(&mut svg, text),
        }
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene {
            width: 300.0,
            height: 200.0,
            shapes: vec![
                Shape::Line(Line {
                    from: (10.0, 20.0),
                    to: (10.0, 25.0),
                    color: Rgb::new(1.0, 0.0, 0.0),
                    width: 5.0,
                }),
                Shape::Text(Text {
                    at: (4.0, 8.0),
                    content: "a<b & c".to_string(),
                    size: 13.0,
                    color: Rgb::gray(0.5),
                    rotate: 90.0,
                    italic: true,
                    family: "Times New Roman",
                }),
            ],
        }
    }

    #[test]
    fn document_has_canvas_size() {
        let svg = render_svg(&scene());
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"width="300px" height="200px" viewBox="0 0 300 200""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn lines_and_text_are_serialized() {
        let svg = render_svg(&scene());
        assert!(svg.contains(
            r#"<line x1="10" y1="20" x2="10" y2="25" stroke="rgb(255,0,0)" stroke-width="5px"/>"#
        ));
        assert!(svg.contains(r#"transform="rotate(90,4,8)""#));
        assert!(svg.contains("font-style:italic"));
        assert!(svg.contains("a&lt;b &amp; c</text>"));
        assert!(svg.contains("rgb(128,128,128)"));
    }
}
