//! stowage CLI - Inspect, pack and load asset bundles
//!
//! Commands:
//! - `stowage deps` - Print the dependency closure of a bundle
//! - `stowage load` - Load one asset through a bundle manager
//! - `stowage catalog` - List catalog entries
//! - `stowage new-id` - Generate asset ids
//! - `stowage pack` - Pack files into a bundle archive
//! - `stowage list` - List the contents of a bundle archive
//! - `stowage check` - Validate a stowage.toml config
//!
//! Failures caused by a [`StowageError`] exit with its error code; any other
//! failure exits with 1.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use stowage_core::StowageError;

mod catalog;
mod config;
mod deps;
mod load;
mod new_id;
mod pack;

#[derive(Parser)]
#[command(name = "stowage")]
#[command(author, version, about = "Tool for stowage asset bundles", long_about = None)]
struct Cli {
    /// Path to stowage.toml (default: ./stowage.toml when present)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Folder that contains the bundle directory
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Platform folder name (default: host platform)
    #[arg(long, global = true)]
    platform: Option<String>,

    /// Bundle server base URL
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dependency closure of a bundle
    Deps {
        /// Bundle name
        bundle: String,

        /// Package the bundle belongs to
        #[arg(short, long)]
        package: Option<String>,

        /// Read this manifest file instead of the package manifest
        #[arg(short, long)]
        manifest: Option<String>,
    },

    /// Load one asset, waiting until it is available
    Load {
        /// Bundle holding the asset
        #[arg(required_unless_present = "id")]
        bundle: Option<String>,

        /// Asset name
        #[arg(required_unless_present = "id")]
        asset: Option<String>,

        /// Catalog id of the asset instead of bundle and asset names
        #[arg(long)]
        id: Option<String>,

        /// Package the bundle belongs to
        #[arg(short, long)]
        package: Option<String>,

        /// Group to pin the bundle for
        #[arg(short, long)]
        group: Option<String>,

        /// Expected asset type
        #[arg(short = 't', long = "type")]
        type_tag: Option<String>,

        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Do not release the group afterwards
        #[arg(long)]
        keep: bool,
    },

    /// List catalog entries
    Catalog {
        /// Only this package's catalog
        #[arg(short, long)]
        package: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Generate asset ids
    NewId {
        /// How many ids to print
        #[arg(default_value_t = 1)]
        count: usize,
    },

    /// Pack files into a bundle archive
    Pack {
        /// Bundle name
        name: String,

        /// Asset to add, as NAME:TYPE:PATH (repeatable)
        #[arg(short, long = "asset")]
        assets: Vec<String>,

        /// Output path (default: <bundle directory>/<platform>/<name>)
        #[arg(short, long)]
        output: Option<String>,

        /// Record the bundle in this package's manifest
        #[arg(short, long)]
        package: Option<String>,

        /// Direct dependency recorded in the manifest (repeatable)
        #[arg(short, long = "depends")]
        depends: Vec<String>,

        /// Give every asset a catalog id
        #[arg(long)]
        catalog: bool,
    },

    /// List the contents of a bundle archive
    List {
        /// Archive path
        path: String,
    },

    /// Validate a stowage.toml config
    Check {
        /// Path to stowage.toml (default: ./stowage.toml)
        #[arg(short, long)]
        file: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit_code(&err)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = config::Overrides {
        root: cli.root,
        platform: cli.platform,
        server: cli.server,
    };

    match cli.command {
        Commands::Deps {
            bundle,
            package,
            manifest,
        } => {
            let config = config::resolve(cli.config.as_deref(), &overrides)?;
            deps::run(&config, &bundle, package, manifest)?;
        }
        Commands::Load {
            bundle,
            asset,
            id,
            package,
            group,
            type_tag,
            timeout_ms,
            keep,
        } => {
            let config = config::resolve(cli.config.as_deref(), &overrides)?;
            let target = load::AssetRef::from_args(bundle, asset, id)?;
            load::run(&config, target, package, group, type_tag, timeout_ms, keep)?;
        }
        Commands::Catalog { package, json } => {
            let config = config::resolve(cli.config.as_deref(), &overrides)?;
            catalog::run(&config, package, json)?;
        }
        Commands::NewId { count } => {
            new_id::run(count)?;
        }
        Commands::Pack {
            name,
            assets,
            output,
            package,
            depends,
            catalog,
        } => {
            let config = config::resolve(cli.config.as_deref(), &overrides)?;
            let options = pack::PackOptions {
                output,
                package,
                depends,
                catalog,
            };
            pack::run(&config, &name, &assets, options)?;
        }
        Commands::List { path } => {
            pack::list(&path)?;
        }
        Commands::Check { file } => {
            config::check(file.or(cli.config))?;
        }
    }

    Ok(())
}

/// Exit code of the first [`StowageError`] in the chain.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StowageError>())
        .and_then(|e| u8::try_from(e.error_code()).ok())
        .map_or(ExitCode::FAILURE, ExitCode::from)
}
