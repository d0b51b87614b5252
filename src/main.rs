use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use radarcog::archive::{
    ArchiveStore, DirectoryArchive, DEFAULT_BUCKET, DEFAULT_PREFIX, DEFAULT_REGION,
};
use radarcog::cog::{self, Compression};
use radarcog::container::ObservationSource;
use radarcog::crawl::DEFAULT_STAGING_DIR;
use radarcog::{
    ColourMode, Converter, CrawlOptions, Crawler, Palette, RasterWriter, WriteStrategy,
    WriterConfig,
};
use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Convert HDF5 radar observations into Cloud Optimized GeoTIFFs
#[derive(Parser, Debug)]
#[command(name = "radarcog", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one observation file
    Convert(ConvertArgs),
    /// Convert archive files until the output folder is caught up
    Crawl(CrawlArgs),
    /// Print the tag directories and GeoTIFF keys of a TIFF
    Inspect {
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ConvertArgs {
    input: PathBuf,

    output_dir: PathBuf,

    /// Palette classified RGBA instead of the raw single band
    #[arg(long, env = "RADARCOG_COLOUR")]
    colour: bool,

    /// Output file name, defaults to radar_output_<mode>.tif
    #[arg(long)]
    name: Option<String>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    #[arg(env = "RADARCOG_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Palette classified RGBA instead of the raw single band
    #[arg(long, env = "RADARCOG_COLOUR")]
    colour: bool,

    /// Keep going past already processed files instead of stopping
    #[arg(long)]
    full_backfill: bool,

    #[arg(long, default_value = DEFAULT_BUCKET, env = "RADARCOG_BUCKET")]
    bucket: String,

    #[arg(long, default_value = DEFAULT_REGION, env = "RADARCOG_REGION")]
    region: String,

    #[arg(long, default_value = DEFAULT_PREFIX, env = "RADARCOG_PREFIX")]
    prefix: String,

    /// Folder downloads are staged in
    #[arg(long, default_value = DEFAULT_STAGING_DIR, env = "RADARCOG_STAGING")]
    staging: PathBuf,

    /// Crawl a local mirror of the archive instead of S3
    #[arg(long, env = "RADARCOG_ARCHIVE_DIR")]
    archive_dir: Option<PathBuf>,

    /// Log failed files and carry on instead of stopping
    #[arg(long)]
    isolate_failures: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// fine, coarse, or a JSON file of [low, high, r, g, b] bands
    #[arg(long, default_value = "fine", env = "RADARCOG_PALETTE")]
    palette: String,

    #[arg(long, value_enum, default_value_t = StrategyArg::Direct, env = "RADARCOG_STRATEGY")]
    strategy: StrategyArg,

    #[arg(long, value_enum, default_value_t = CompressionArg::Lzw, env = "RADARCOG_COMPRESSION")]
    compression: CompressionArg,

    /// Tile edge in pixels, a multiple of 16
    #[arg(long, default_value_t = 512, env = "RADARCOG_TILE_SIZE")]
    tile_size: u16,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Direct,
    Reencode,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CompressionArg {
    Lzw,
    Deflate,
    None,
}

impl OutputArgs {
    fn palette(&self) -> Result<Palette> {
        Ok(match self.palette.as_str() {
            "fine" => Palette::fine(),
            "coarse" => Palette::coarse(),
            path => Palette::from_file(path)?,
        })
    }

    fn writer(&self) -> RasterWriter {
        let strategy = match self.strategy {
            StrategyArg::Direct => WriteStrategy::Direct,
            StrategyArg::Reencode => WriteStrategy::Reencode,
        };
        let compression = match self.compression {
            CompressionArg::Lzw => Compression::Lzw,
            CompressionArg::Deflate => Compression::DeflateAdobe,
            CompressionArg::None => Compression::Uncompressed,
        };
        RasterWriter::new(
            WriterConfig::default()
                .with_strategy(strategy)
                .with_compression(compression)
                .with_tile_size(self.tile_size),
        )
    }

    fn converter(&self) -> Result<Converter<impl ObservationSource>> {
        Ok(Converter::new(observation_source()?)
            .with_palette(self.palette()?)
            .with_writer(self.writer()))
    }
}

#[cfg(feature = "hdf5")]
fn observation_source() -> Result<radarcog::container::Hdf5Source> {
    Ok(radarcog::container::Hdf5Source::new())
}

#[cfg(not(feature = "hdf5"))]
fn observation_source() -> Result<radarcog::container::Unsupported> {
    anyhow::bail!("radarcog was built without the hdf5 feature")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Command::Convert(args) => convert(args),
        Command::Crawl(args) => crawl(args),
        Command::Inspect { path } => inspect(path),
    }
}

fn convert(args: ConvertArgs) -> Result<()> {
    let t0 = Instant::now();
    let mode = ColourMode::from_colour_flag(args.colour);
    let path = args
        .output
        .converter()?
        .convert(&args.input, &args.output_dir, mode, args.name.as_deref())
        .with_context(|| format!("converting {}", args.input.display()))?;
    info!("Converted in {:.3}s: {}", t0.elapsed().as_secs_f64(), path.display());
    Ok(())
}

fn crawl(args: CrawlArgs) -> Result<()> {
    let archive: Box<dyn ArchiveStore> = match &args.archive_dir {
        Some(dir) => Box::new(DirectoryArchive::new(dir)),
        None => s3_archive(&args.bucket, &args.region)?,
    };

    let options = CrawlOptions::new(&args.output_dir)
        .with_mode(ColourMode::from_colour_flag(args.colour))
        .with_stop_on_catchup(!args.full_backfill)
        .with_prefix(&args.prefix)
        .with_staging_dir(&args.staging)
        .with_isolate_failures(args.isolate_failures);

    let crawler = Crawler::new(archive, args.output.converter()?, options);
    let summary = crawler.run()?;
    info!(
        "{} {} converted, {} skipped, {} failed",
        summary.message(),
        summary.converted.len(),
        summary.skipped,
        summary.failed.len()
    );
    Ok(())
}

#[cfg(feature = "s3")]
fn s3_archive(bucket: &str, region: &str) -> Result<Box<dyn ArchiveStore>> {
    info!("Crawling s3://{bucket} in {region}");
    Ok(Box::new(radarcog::archive::S3Archive::connect(bucket, region)?))
}

#[cfg(not(feature = "s3"))]
fn s3_archive(_bucket: &str, _region: &str) -> Result<Box<dyn ArchiveStore>> {
    anyhow::bail!("radarcog was built without the s3 feature, use --archive-dir")
}

fn inspect(path: PathBuf) -> Result<()> {
    let mut file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let report = cog::disect(&mut file)?;
    println!("{report}");
    Ok(())
}
