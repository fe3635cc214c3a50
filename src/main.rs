//! segprep CLI - tile datasets, color-code masks and track model revisions.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use image::DynamicImage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use segprep::image::{load_label_mask, load_rgb, save_label_mask, save_png, DEFAULT_JPEG_QUALITY};
use segprep::mask::{decode_to_image, encode_image, Colormap};
use segprep::revision::{Ledger, RevisionRecord, LEDGER_RELATIVE_PATH};
use segprep::tiling::{SplitConfig, SplitSummary, TileSplitter, DATASET_TILE_SIZE};

/// Preprocessing for semantic segmentation datasets.
#[derive(Parser, Debug)]
#[command(name = "segprep")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split ROOT/images and ROOT/masks into ROOT/tiles.
    SplitDataset {
        /// Dataset root directory.
        #[arg(long, value_name = "DIR")]
        root: PathBuf,

        #[command(flatten)]
        tiles: TileArgs,
    },

    /// Split images and their masks into paired tiles.
    SplitPaired {
        /// Directory of .tif images.
        #[arg(long, value_name = "DIR")]
        images: PathBuf,

        /// Directory of .tif masks named like the images.
        #[arg(long, value_name = "DIR")]
        masks: PathBuf,

        /// Directory receiving the tiles.
        #[arg(long, value_name = "DIR")]
        output: PathBuf,

        #[command(flatten)]
        tiles: TileArgs,
    },

    /// Split .tiff, .jpg and .png images into tiles before prediction.
    SplitPredict {
        /// Directory of input images.
        #[arg(long, value_name = "DIR")]
        input: PathBuf,

        /// Directory receiving the tiles.
        #[arg(long, value_name = "DIR")]
        output: PathBuf,

        #[command(flatten)]
        tiles: TileArgs,
    },

    /// Color a grayscale label mask with a colormap.
    DecodeMask {
        /// Grayscale label mask.
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Output PNG.
        #[arg(long, value_name = "FILE")]
        output: PathBuf,

        /// Class colors as "r,g,b;r,g,b;...".
        #[arg(long, value_name = "COLORS")]
        colormap: Colormap,

        /// Declared number of classes. Defaults to the colormap length.
        #[arg(long, value_name = "INT")]
        num_classes: Option<usize>,
    },

    /// Turn a color-coded mask into a grayscale label mask.
    EncodeMask {
        /// Color-coded mask.
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Output PNG.
        #[arg(long, value_name = "FILE")]
        output: PathBuf,

        /// Class colors as "r,g,b;r,g,b;...".
        #[arg(long, value_name = "COLORS")]
        colormap: Colormap,
    },

    /// Manage the model revision ledger.
    Revision(RevisionArgs),
}

#[derive(Args, Debug)]
struct TileArgs {
    /// Tile edge length in pixels.
    #[arg(long, default_value_t = DATASET_TILE_SIZE, value_name = "INT")]
    tile_size: u32,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value_t = DEFAULT_JPEG_QUALITY, value_name = "INT")]
    quality: u8,
}

impl TileArgs {
    fn splitter(&self) -> Result<TileSplitter> {
        let config = SplitConfig {
            tile_size: self.tile_size,
            jpeg_quality: self.quality,
        };
        TileSplitter::new(config).context("Invalid tiling options")
    }
}

#[derive(Args, Debug)]
struct RevisionArgs {
    /// Path of the revision ledger.
    #[arg(long, default_value = LEDGER_RELATIVE_PATH, value_name = "FILE")]
    ledger: PathBuf,

    #[command(subcommand)]
    command: RevisionCommand,
}

#[derive(Subcommand, Debug)]
enum RevisionCommand {
    /// Register a revision from a YAML record, merging into an existing entry.
    Register {
        /// YAML file holding one revision record.
        #[arg(long, value_name = "FILE")]
        record: PathBuf,
    },

    /// Print the record stored under a key.
    Show {
        /// Model key, e.g. unet_v1.0.0.
        #[arg(long)]
        key: String,
    },

    /// Print the build parameters stored under a key.
    BuildParams {
        /// Model key, e.g. unet_v1.0.0.
        #[arg(long)]
        key: String,
    },

    /// List all registered keys.
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("segprep={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(cli.command) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::SplitDataset { root, tiles } => {
            let splitter = tiles.splitter()?;
            let summary = splitter
                .split_paired(root.join("images"), root.join("masks"), root.join("tiles"))
                .with_context(|| format!("Failed to split dataset {}", root.display()))?;
            report(&summary);
        }
        Command::SplitPaired {
            images,
            masks,
            output,
            tiles,
        } => {
            let splitter = tiles.splitter()?;
            let summary = splitter
                .split_paired(&images, &masks, &output)
                .context("Failed to split images and masks")?;
            report(&summary);
        }
        Command::SplitPredict {
            input,
            output,
            tiles,
        } => {
            let splitter = tiles.splitter()?;
            let summary = splitter
                .split_single(&input, &output)
                .context("Failed to split prediction inputs")?;
            report(&summary);
        }
        Command::DecodeMask {
            input,
            output,
            colormap,
            num_classes,
        } => {
            let labels = load_label_mask(&input)?;
            let num_classes = num_classes.unwrap_or_else(|| colormap.len());
            let colored = decode_to_image(labels.view(), &colormap, num_classes)
                .context("Failed to decode mask")?;
            save_png(&DynamicImage::ImageRgb8(colored), &output)?;

            println!("Decoded {} -> {}", input.display(), output.display());
        }
        Command::EncodeMask {
            input,
            output,
            colormap,
        } => {
            let colored = load_rgb(&input)?;
            let labels = encode_image(&colored, &colormap).context("Failed to encode mask")?;
            save_label_mask(labels.view(), &output)?;

            println!("Encoded {} -> {}", input.display(), output.display());
        }
        Command::Revision(args) => run_revision(args)?,
    }

    Ok(())
}

fn run_revision(args: RevisionArgs) -> Result<()> {
    let ledger = Ledger::new(args.ledger);

    match args.command {
        RevisionCommand::Register { record } => {
            let content = std::fs::read_to_string(&record)
                .with_context(|| format!("Failed to read {}", record.display()))?;
            let parsed: RevisionRecord = serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid revision record {}", record.display()))?;

            let key = ledger.register_record(&parsed)?;
            println!("{key}");
        }
        RevisionCommand::Show { key } => {
            let record = ledger.load(&key)?;
            print!("{}", serde_yaml::to_string(&record)?);
        }
        RevisionCommand::BuildParams { key } => {
            let params = ledger.build_parameters(&key)?;
            print!("{}", serde_yaml::to_string(&params)?);
        }
        RevisionCommand::List => {
            for key in ledger.keys()? {
                println!("{key}");
            }
        }
    }

    Ok(())
}

fn report(summary: &SplitSummary) {
    println!(
        "Wrote {} tiles from {} images ({} already present, {} border slots dropped)",
        summary.tiles_written, summary.sources, summary.tiles_skipped, summary.slots_discarded
    );
}
