//! One invocation: tables in, diagram file out.

use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::align::align_to_reference;
use crate::color::{channel_palettes, PaletteConfig};
use crate::error::{LineageError, Result};
use crate::layout::{layout, LayoutConfig};
use crate::raster::render_png;
use crate::records::{group_by_cell, load_records};
use crate::scene::{compose, DrawOptions, SceneInput};
use crate::stage::{resolve_end_timepoint, Trim};
use crate::svg::render_svg;
use crate::topology::ROOT_NAME;
use crate::tree::LineageTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        }
    }
}

/// Everything one run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub reference: PathBuf,
    pub align: Option<PathBuf>,
    pub column: String,
    pub root: String,
    pub output_dir: PathBuf,
    pub trim: Trim,
    pub palette: PaletteConfig,
    pub layout: LayoutConfig,
    pub draw: DrawOptions,
    pub format: OutputFormat,
}

impl RunConfig {
    pub fn new(reference: impl Into<PathBuf>) -> Self {
        RunConfig {
            reference: reference.into(),
            align: None,
            column: "blot".to_string(),
            root: ROOT_NAME.to_string(),
            output_dir: PathBuf::from("results"),
            trim: Trim::Full,
            palette: PaletteConfig::default(),
            layout: LayoutConfig::default(),
            draw: DrawOptions::default(),
            format: OutputFormat::Svg,
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `{stems joined by _}_{column}_{end}t_{leaves}c_{root}.{ext}`
pub fn output_file_name(
    stems: &[String],
    column: &str,
    end_timepoint: u32,
    leaf_count: usize,
    root: &str,
    format: OutputFormat,
) -> String {
    let mut parts: Vec<String> = stems.to_vec();
    parts.push(column.to_string());
    parts.push(format!("{}t", end_timepoint));
    parts.push(format!("{}c", leaf_count));
    parts.push(root.to_string());
    format!("{}.{}", parts.join("_"), format.extension())
}

fn load_tree(path: &Path, column: &str, trim: Trim) -> Result<LineageTree> {
    let records = load_records(path, column)?;
    let end = resolve_end_timepoint(&records, trim)?;
    let tree = LineageTree::build(&group_by_cell(&records, end))?;
    info!(
        "     draw(timepoint:{}, cellstage:{})",
        crate::layout::end_timepoint(&tree),
        tree.leaf_count(ROOT_NAME)
    );
    Ok(tree)
}

/// Run the whole pipeline and return the written file.
pub fn run(config: &RunConfig) -> Result<PathBuf> {
    info!("Using '{}' column.", config.column);

    let palettes = channel_palettes(&config.palette, config.align.is_some())?;

    info!("Loading reference data...");
    let mut reference = load_tree(&config.reference, &config.column, config.trim)?;
    let mut stems = vec![file_stem(&config.reference)];

    let comparison = match &config.align {
        Some(path) => {
            info!("Loading align data...");
            let mut comparison = load_tree(path, &config.column, Trim::Full)?;
            stems.push(file_stem(path));
            let rewritten = align_to_reference(&reference, &mut comparison)?;
            info!("Aligned {} cells onto the reference", rewritten);
            Some(comparison)
        }
        None => None,
    };

    info!("Drawing tree...");
    let canvas = layout(&mut reference, &config.root, &config.layout)?;
    let scene = compose(&SceneInput {
        reference: &reference,
        comparison: comparison.as_ref(),
        palettes: &palettes,
        canvas: &canvas,
        layout: &config.layout,
        root: &config.root,
        options: config.draw,
        title: &stems,
    })?;

    fs::create_dir_all(&config.output_dir).map_err(|e| LineageError::io(&config.output_dir, e))?;
    let out = config.output_dir.join(output_file_name(
        &stems,
        &config.column,
        canvas.end_timepoint,
        reference.leaf_count(ROOT_NAME),
        &config.root,
        config.format,
    ));

    info!("Saving to {:?}...", out);
    match config.format {
        OutputFormat::Svg => {
            fs::write(&out, render_svg(&scene)).map_err(|e| LineageError::io(&out, e))?;
        }
        OutputFormat::Png => render_png(&scene).save(&out)?,
    }

    Ok(out)
}
