use clap::Parser;
use log::info;
use std::path::PathBuf;

use lineagelook::{
    DrawOptions, GradientSource, LayoutConfig, OutputFormat, PaletteConfig, RunConfig, Trim,
};

#[derive(Parser)]
#[command(name = "lineagelook")]
#[command(about = "Draw a cell lineage tree colored by expression over time.", long_about = None)]
struct Args {
    // Input / Output
    /// Reference table (CSV with cell, time and value columns).
    #[arg(long = "ref", value_name = "FILE")]
    ref_file: PathBuf,

    /// Second table overlaid on the reference after temporal alignment.
    #[arg(long = "align", value_name = "FILE")]
    align_file: Option<PathBuf>,

    /// Column to show on the tree.
    #[arg(short = 'c', long = "column", value_name = "NAME", default_value = "blot")]
    column: String,

    /// Root cell of the drawn tree.
    #[arg(short = 'r', long = "root", value_name = "CELL", default_value = "P0")]
    root: String,

    /// Output folder.
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = "results")]
    output: PathBuf,

    /// Output format.
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Svg)]
    format: OutputFormat,

    // Trimming
    /// End timepoint of the tree.
    #[arg(long = "endtp", value_name = "N", conflicts_with = "cellstage")]
    endtp: Option<u32>,

    /// Cell stage of the tree; the closest end timepoint is searched.
    #[arg(long = "cellstage", value_name = "N")]
    cellstage: Option<usize>,

    // Diagram elements
    /// Don't draw cell labels.
    #[arg(long = "nolabel")]
    no_label: bool,

    /// Don't draw the timepoint axis.
    #[arg(long = "noaxis")]
    no_axis: bool,

    /// Don't draw the color legend.
    #[arg(long = "nobrand")]
    no_brand: bool,

    /// Don't draw the title.
    #[arg(long = "notitle")]
    no_title: bool,

    // Geometry
    /// Stroke width of a cell.
    #[arg(long = "linewidth", value_name = "N", default_value_t = 5)]
    line_width: u32,

    /// Gap between neighbouring leaves.
    #[arg(long = "lineinter", value_name = "N", default_value_t = 15)]
    line_spacing: u32,

    // Colors
    /// Number of color levels to draw.
    #[arg(long = "clvl", value_name = "N", default_value_t = 10)]
    clvl: usize,

    /// Number of color levels in the full palette (0 = clvl).
    #[arg(long = "clvlmax", value_name = "N", default_value_t = 0)]
    clvlmax: usize,

    /// Start position of the low brightness part.
    #[arg(long = "clvllow", value_name = "N", default_value_t = 1)]
    clvllow: usize,

    /// Number of levels in the low brightness part.
    #[arg(long = "clvllowplus", value_name = "N", default_value_t = 1)]
    clvllowplus: usize,

    /// Start position of the high brightness part (0 = automatic).
    #[arg(long = "clvlhigh", value_name = "N", default_value_t = 0)]
    clvlhigh: usize,

    /// Swap the reference and align colors.
    #[arg(long = "revc")]
    revc: bool,

    /// Max brightness of the first color.
    #[arg(long = "cl1", value_name = "0-255", default_value_t = 255)]
    cl1: u8,

    /// Max brightness of the second color.
    #[arg(long = "cl2", value_name = "0-255", default_value_t = 255)]
    cl2: u8,

    /// Use the seaborn-like dark palette instead of a black ramp.
    #[arg(long = "seaborn")]
    seaborn: bool,

    // Logging
    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

impl Args {
    fn to_config(&self) -> RunConfig {
        let trim = match (self.endtp, self.cellstage) {
            (Some(end), _) => Trim::EndTimepoint(end),
            (None, Some(stage)) => Trim::CellStage(stage),
            (None, None) => Trim::Full,
        };

        RunConfig {
            reference: self.ref_file.clone(),
            align: self.align_file.clone(),
            column: self.column.clone(),
            root: self.root.clone(),
            output_dir: self.output.clone(),
            trim,
            palette: PaletteConfig {
                level_count: self.clvl,
                max_level_count: self.clvlmax,
                low_start: self.clvllow,
                low_width: self.clvllowplus,
                high_start: self.clvlhigh,
                reversed: self.revc,
                gradient: if self.seaborn {
                    GradientSource::Perceptual
                } else {
                    GradientSource::Linear
                },
                channel_cap1: self.cl1,
                channel_cap2: self.cl2,
            },
            layout: LayoutConfig {
                line_width: self.line_width as f64,
                line_spacing: self.line_spacing as f64,
                ..LayoutConfig::default()
            },
            draw: DrawOptions {
                labels: !self.no_label,
                axis: !self.no_axis,
                brand: !self.no_brand,
                title: !self.no_title,
            },
            format: self.format,
        }
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let config = args.to_config();
    match lineagelook::run(&config) {
        Ok(out) => info!("Done: {}", out.display()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
