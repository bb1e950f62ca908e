//! Drawable primitives for a laid out lineage tree.
//!
//! Backends only see lines and text; all diagram rules live here.

use crate::color::{blend, map_color, Palette, Rgb, HIGH_EXPRESSION, LOW_EXPRESSION};
use crate::error::Result;
use crate::layout::{Canvas, LayoutConfig};
use crate::topology::{self, Branch, ROOT_NAME};
use crate::tree::LineageTree;

const FONT_FAMILY: &str = "Times New Roman";
const LABEL_GRAY: f64 = 160.0 / 255.0;
const CONNECTOR_WIDTH: f64 = 2.0;
const AXIS_WIDTH: f64 = 1.0;
const AXIS_TICK: f64 = 10.0;
const LEGEND_BAR_WIDTH: f64 = 15.0;

/// Which optional elements are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOptions {
    pub labels: bool,
    pub axis: bool,
    pub brand: bool,
    pub title: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        DrawOptions {
            labels: true,
            axis: true,
            brand: true,
            title: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub color: Rgb,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub at: (f64, f64),
    pub content: String,
    pub size: f64,
    pub color: Rgb,
    /// Clockwise rotation around `at`, in degrees.
    pub rotate: f64,
    pub italic: bool,
    pub family: &'static str,
}

impl Text {
    fn new(at: (f64, f64), content: impl Into<String>, size: f64) -> Self {
        Text {
            at,
            content: content.into(),
            size,
            color: Rgb::BLACK,
            rotate: 0.0,
            italic: false,
            family: FONT_FAMILY,
        }
    }

    fn rotated(mut self, degrees: f64) -> Self {
        self.rotate = degrees;
        self
    }

    fn colored(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Line(Line),
    Text(Text),
}

/// Everything a backend needs to emit one diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub shapes: Vec<Shape>,
}

impl Scene {
    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb, width: f64) {
        self.shapes.push(Shape::Line(Line {
            from,
            to,
            color,
            width,
        }));
    }

    fn text(&mut self, text: Text) {
        self.shapes.push(Shape::Text(text));
    }

    #[cfg(test)]
    pub(crate) fn lines(&self) -> impl Iterator<Item = &Line> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Line(l) => Some(l),
            Shape::Text(_) => None,
        })
    }

    #[cfg(test)]
    pub(crate) fn texts(&self) -> impl Iterator<Item = &Text> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Text(t) => Some(t),
            Shape::Line(_) => None,
        })
    }
}

/// Inputs of [`compose`]; the reference tree must already be laid out.
pub struct SceneInput<'a> {
    pub reference: &'a LineageTree,
    pub comparison: Option<&'a LineageTree>,
    /// One palette per drawn channel, reference first.
    pub palettes: &'a [Palette],
    pub canvas: &'a Canvas,
    pub layout: &'a LayoutConfig,
    pub root: &'a str,
    pub options: DrawOptions,
    /// Input file stems, joined into the title.
    pub title: &'a [String],
}

pub fn compose(input: &SceneInput) -> Result<Scene> {
    let mut scene = Scene {
        width: input.canvas.width,
        height: input.canvas.height,
        shapes: Vec::new(),
    };

    draw_tree(&mut scene, input)?;
    if input.options.axis {
        draw_axis(&mut scene, input)?;
    }
    if input.options.brand {
        draw_brand(&mut scene, input);
    }
    if input.options.title {
        draw_title(&mut scene, input);
    }

    Ok(scene)
}

fn sample_color(input: &SceneInput, name: &str, index: usize, value: f64) -> Rgb {
    let Some(reference) = input.palettes.first() else {
        return Rgb::BLACK;
    };
    let color = map_color(value, reference, LOW_EXPRESSION, HIGH_EXPRESSION);

    let overlay = input
        .comparison
        .zip(input.palettes.get(1))
        .and_then(|(tree, palette)| {
            let v = *tree.get(name)?.series.get(index)?;
            Some(map_color(v, palette, LOW_EXPRESSION, HIGH_EXPRESSION))
        });

    match overlay {
        Some(other) => blend(color, other),
        None => color,
    }
}

fn draw_tree(scene: &mut Scene, input: &SceneInput) -> Result<()> {
    let tree = input.reference;
    let cfg = input.layout;

    for name in tree.level_order(input.root)? {
        let Some(node) = tree.get(&name) else {
            continue;
        };
        let x = node.pos_x;
        let y_start = node.pos_y;
        let mut y = y_start;

        for (i, value) in node.series.iter().enumerate() {
            let color = sample_color(input, &name, i, *value);
            scene.line((x, y), (x, y + cfg.scale), color, cfg.line_width);
            y += cfg.scale;
        }

        if let Some((left, right)) = node.children() {
            let lx = tree.get(left).map_or(x, |n| n.pos_x);
            let rx = tree.get(right).map_or(x, |n| n.pos_x);
            scene.line((lx, y), (rx, y), Rgb::BLACK, CONNECTOR_WIDTH);

            if input.options.labels && !topology::is_leader(&name) && name != input.root {
                let at = (x + cfg.line_width, y_start + cfg.scale);
                scene.text(
                    Text::new(at, name.as_str(), 13.0)
                        .colored(Rgb::gray(LABEL_GRAY))
                        .rotated(90.0),
                );
            }
        } else if input.options.labels {
            let at = (
                x - cfg.line_width,
                input.canvas.height - cfg.bottom_margin + 2.0 * cfg.scale,
            );
            scene.text(Text::new(at, name.as_str(), 10.0).rotated(45.0));
        }

        if name == input.root {
            scene.text(Text::new((x - 12.5, y_start - cfg.scale), name.as_str(), 25.0));
        } else if topology::is_leader(&name) {
            let x_label = match topology::resolve_parent(&name)? {
                Some((_, Branch::Right)) => x + 5.0,
                _ => x - 13.0 * name.chars().count() as f64,
            };
            scene.text(Text::new((x_label, y_start), name.as_str(), 18.0));
        }
    }

    Ok(())
}

fn draw_axis(scene: &mut Scene, input: &SceneInput) -> Result<()> {
    let cfg = input.layout;
    let tree = input.reference;
    let end_tp = input.canvas.end_timepoint as f64;

    let mut start_tp = tree.get(input.root).map_or(0, |n| n.start_timepoint);
    let mut y1 = cfg.top_margin;
    if start_tp == 0 {
        let first_observed = tree
            .level_order(input.root)?
            .into_iter()
            .filter_map(|name| tree.get(&name))
            .find(|node| node.start_timepoint > 0);
        if let Some(node) = first_observed {
            y1 = node.pos_y;
            start_tp = node.start_timepoint;
        }
    }
    let start_tp = start_tp as f64;

    let x1 = cfg.left_margin;
    let x2 = x1 + AXIS_TICK;
    let x0 = x1 - AXIS_TICK;
    let y4 = input.canvas.height - cfg.bottom_margin;
    let span = y4 - y1;
    let y2 = span / 3.0 + y1;
    let y3 = 2.0 * span / 3.0 + y1;
    let y5 = span / 2.0 + y1 + 50.0;

    scene.line((x1, y1), (x1, y4), Rgb::BLACK, AXIS_WIDTH);
    for y in [y1, y2, y3, y4] {
        scene.line((x1, y), (x2, y), Rgb::BLACK, AXIS_WIDTH);
    }

    let ticks = [
        (y1, start_tp),
        (y2, start_tp + (end_tp - start_tp) / 3.0),
        (y3, start_tp + (end_tp - start_tp) / 3.0 * 2.0),
        (y4, end_tp),
    ];
    for (y, tp) in ticks {
        let label = format!("{}", tp.trunc() as i64);
        scene.text(Text::new((x2 + 5.0, y + 7.0), label, 25.0));
    }

    scene.text(Text::new((x0, y5), "Timepoint", 25.0).rotated(-90.0));
    Ok(())
}

fn draw_brand(scene: &mut Scene, input: &SceneInput) {
    let cfg = input.layout;
    let Some(levels) = input.palettes.first().map(Vec::len).filter(|n| *n > 0) else {
        return;
    };

    let mut x = input.canvas.width - cfg.right_margin - cfg.brand_width + 50.0;
    let y_start = cfg.top_margin;
    let y_end = input.canvas.height - cfg.bottom_margin;
    let step = (y_end - y_start) / levels as f64;
    let y_mid = (y_end - y_start) / 2.0 + y_start - 90.0;

    for (i, palette) in input.palettes.iter().enumerate() {
        x += i as f64 * LEGEND_BAR_WIDTH;
        let mut y = y_start;
        for color in palette {
            scene.line((x, y), (x, y + step), *color, LEGEND_BAR_WIDTH);
            y += step;
        }
    }

    x += LEGEND_BAR_WIDTH;
    scene.text(Text::new((x, y_mid), "Expression Level", 25.0).rotated(90.0));
}

fn draw_title(scene: &mut Scene, input: &SceneInput) {
    let stage = input.reference.leaf_count(ROOT_NAME);
    scene.text(Text::new((10.0, 30.0), input.title.join("_"), 25.0).italic());
    scene.text(Text::new((10.0, 60.0), format!("{}-cell stage", stage), 25.0).italic());
}
