//! Draw cell lineage trees annotated with per-cell expression time series.

pub mod align;
pub mod color;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod raster;
pub mod records;
pub mod scene;
pub mod stage;
pub mod svg;
pub mod topology;
pub mod tree;

pub use color::{GradientSource, PaletteConfig, Rgb};
pub use error::{LineageError, Result};
pub use layout::LayoutConfig;
pub use pipeline::{run, OutputFormat, RunConfig};
pub use scene::DrawOptions;
pub use stage::Trim;
pub use tree::{LineageTree, Node};
