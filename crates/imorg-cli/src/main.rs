use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use imorg_core::{DiffConfig, Granularity, GroupByConfig, HashAlgorithm, RunSummary};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "imorg")]
#[command(about = "Organize image collections by content hash and capture time")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two image trees by content hash
    ///
    /// Every image ends up in exactly one of the destination
    /// subdirectories: matched/, only-in-a/ or only-in-b/.
    #[command(disable_help_flag = true)]
    Diff {
        /// First source directory
        src1: PathBuf,

        /// Second source directory
        src2: PathBuf,

        /// Destination directory
        dest: PathBuf,

        /// Hash algorithm used to match file content
        #[arg(short = 'h', long = "hasher", value_enum, default_value = "sha256")]
        hasher: HasherArg,

        /// Worker threads for hashing and copying (0 = one per CPU)
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,

        /// Print help
        #[arg(long, action = ArgAction::HelpLong)]
        help: Option<bool>,
    },

    /// Group one image tree by capture timestamp
    ///
    /// Images land under <year>[/<month>[/<day>]] depending on the
    /// configured granularity, using EXIF capture time when present and the
    /// file modification time otherwise.
    Groupby {
        /// Source directory
        src: PathBuf,

        /// Destination directory
        dest: PathBuf,

        /// Grouping resolution for capture timestamps
        #[arg(short = 'g', long = "group", value_enum, default_value = "month")]
        group: GroupArg,

        /// Worker threads for metadata reads and copying (0 = one per CPU)
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HasherArg {
    Sha256,
    Sha512,
}

impl From<HasherArg> for HashAlgorithm {
    fn from(arg: HasherArg) -> Self {
        match arg {
            HasherArg::Sha256 => HashAlgorithm::Sha256,
            HasherArg::Sha512 => HashAlgorithm::Sha512,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupArg {
    Year,
    Month,
    Day,
}

impl From<GroupArg> for Granularity {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Year => Granularity::Year,
            GroupArg::Month => Granularity::Month,
            GroupArg::Day => Granularity::Day,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    // Initialize logger
    env_logger::init();

    // Parse command line arguments
    let cli = Cli::parse();

    let (summary, json) = match cli.command {
        Commands::Diff {
            src1,
            src2,
            dest,
            hasher,
            threads,
            json,
            help: _,
        } => {
            let config = DiffConfig {
                src1,
                src2,
                dest,
                algorithm: hasher.into(),
                workers: threads,
            };

            info!("Comparing image trees with {}", config.algorithm);
            (imorg_core::run_diff(&config)?, json)
        }

        Commands::Groupby {
            src,
            dest,
            group,
            threads,
            json,
        } => {
            let config = GroupByConfig {
                src,
                dest,
                granularity: group.into(),
                workers: threads,
            };

            info!("Grouping images by {}", config.granularity);
            (imorg_core::run_groupby(&config)?, json)
        }
    };

    report(&summary, json)?;

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn report(summary: &RunSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!(
        "Copied {} of {} discovered images",
        summary.copied, summary.discovered
    );
    if summary.skipped_non_image > 0 {
        println!("Skipped {} non-image files", summary.skipped_non_image);
    }
    if summary.timestamp_fallbacks > 0 {
        println!(
            "{} files had no usable capture metadata; used file modification time",
            summary.timestamp_fallbacks
        );
    }
    if !summary.failures.is_empty() {
        eprintln!("{} files failed:", summary.failures.len());
        for failure in &summary.failures {
            eprintln!("  {}: {}", failure.path.display(), failure.reason);
        }
    }

    Ok(())
}
