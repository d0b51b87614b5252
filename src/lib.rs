//! Weather radar observations to Cloud Optimized GeoTIFFs.
//!
//! `convert` turns one HDF5 observation into a COG, `crawl` keeps a folder of
//! COGs caught up with a date partitioned archive. The TIFF codec underneath
//! (`tiff`, `geotags`, `raster`, `cog`, `encode`) has no native dependencies.

pub mod archive;
pub mod cog;
pub mod container;
pub mod convert;
pub mod crawl;
pub mod encode;
pub mod geotags;
pub mod grid;
pub mod palette;
pub mod raster;
pub mod tiff;
pub mod writer;

pub use cog::CloudTiff;
pub use convert::{ColourMode, Converter};
pub use crawl::{CrawlOptions, CrawlSummary, Crawler};
pub use grid::{GeoBounds, GeoTransform, Observation, ObservationGrid};
pub use palette::{classify, ColourGrid, Palette};
pub use writer::{RasterWriter, WriteStrategy, WriterConfig};
