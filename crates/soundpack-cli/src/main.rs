//! Soundpack CLI - The `soundpack` command.
//!
//! Turns a directory of key sound clips into keyboard soundpacks.
//!
//! # Stages
//!
//! - **prepare**: concatenate the clips into `sound.wav` and write `sourcemap.json`
//! - **build**: allocate sounds to keys and write `config.<schema>.json`
//! - **pack**: zip the pack directory with one config variant
//!
//! `run` does prepare and build in one go, and packs with `--release`.

mod build;
mod config;
mod pack;
mod paths;
mod prepare;

use anyhow::{Context, Result};
use build::{run_build, BuildOptions};
use clap::{Parser, Subcommand};
use config::Config;
use pack::{pack_target, select_variant};
use soundpack_core::{parse_schema_selection, SchemaVersion};
use std::path::{Path, PathBuf};

/// Soundpack - Keyboard soundpack generator
#[derive(Parser, Debug)]
#[command(name = "soundpack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build Mechvibes v1/v2 and DX soundpacks from a folder of clips", long_about = None)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone, Default)]
struct BuildArgs {
    /// Rule file mapping file patterns to keys
    #[arg(long, value_name = "FILE")]
    rule: Option<PathBuf>,

    /// Split each timing into key-down/key-up halves (v2; dx always splits)
    #[arg(long)]
    split: bool,

    /// Schemas to build: v1|v2|dx combinations or "all"
    #[arg(long, value_name = "SCHEMA")]
    schema: Option<String>,

    /// Write "version" as a string so DX players load v1/v2 packs
    #[arg(long)]
    dx_compatible: bool,

    /// Seed for the balanced random allocation
    #[arg(long)]
    seed: Option<u64>,

    /// Pack every built schema into a zip afterwards
    #[arg(long)]
    release: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Concatenate clips into sound.wav and write sourcemap.json
    Prepare {
        /// Source folder with the clips
        #[arg(short, long, value_name = "DIR")]
        input: PathBuf,
    },

    /// Generate config.<schema>.json from sourcemap.json
    Build {
        /// Pack folder or sourcemap.json
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Zip a pack folder with one config variant
    Pack {
        /// Pack folder, source folder or sourcemap.json
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        /// Config variant stored as config.json (v1, v2 or dx)
        #[arg(long)]
        variant: Option<String>,
    },

    /// Prepare and build in one go (and pack with --release)
    Run {
        /// Source folder with the clips
        #[arg(short, long, value_name = "DIR")]
        input: PathBuf,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Write a default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the config file location
    ConfigPath,
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);
    run_command(args.command, args.config.as_deref())
}

fn config_file_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_path(),
    }
}

fn run_command(command: Commands, config_file: Option<&Path>) -> Result<()> {
    match command {
        Commands::InitConfig { force } => {
            let path = config_file_path(config_file)?;
            Config::create_default_config_file(&path, force)?;
            println!("Created config file: {}", path.display());
        }
        Commands::ConfigPath => {
            println!("{}", config_file_path(config_file)?.display());
        }
        Commands::Prepare { input } => {
            let config = Config::load(config_file)?;
            let target = paths::resolve_target_dir(&config.pack.output_root, &input);
            let sourcemap = prepare::run_prepare(&input, &target)?;
            println!("Prepare complete: {}", sourcemap.display());
        }
        Commands::Build { input, build } => {
            let config = Config::load(config_file)?;
            let sourcemap = paths::resolve_sourcemap_path(&input);
            build_and_release(&sourcemap, &build, &config)?;
        }
        Commands::Pack { input, variant } => {
            let config = Config::load(config_file)?;
            let requested = variant.as_deref().map(str::parse::<SchemaVersion>).transpose()?;
            let pack_dir = paths::resolve_pack_dir(&input, &config.pack.output_root)?;
            let variant = select_variant(&pack_dir, requested)?;
            let zip = pack_target(&pack_dir, variant)?;
            println!("Pack complete: {}", zip.display());
        }
        Commands::Run { input, build } => {
            let config = Config::load(config_file)?;
            let target = paths::resolve_target_dir(&config.pack.output_root, &input);
            let sourcemap = prepare::run_prepare(&input, &target)?;
            println!("Prepare complete: {}", sourcemap.display());
            build_and_release(&sourcemap, &build, &config)?;
        }
    }
    Ok(())
}

fn build_and_release(sourcemap: &Path, args: &BuildArgs, config: &Config) -> Result<()> {
    let options = build_options(args, config)?;
    let written = run_build(sourcemap, &options)?;
    for (_, path) in &written {
        println!("Build complete: {}", path.display());
    }

    if args.release {
        let pack_dir = sourcemap
            .parent()
            .context("Could not determine pack directory")?;
        for (version, _) in &written {
            let zip = pack_target(pack_dir, *version)?;
            println!("Pack complete: {}", zip.display());
        }
    }
    Ok(())
}

/// Merge command-line flags over config file values
fn build_options(args: &BuildArgs, config: &Config) -> Result<BuildOptions> {
    let selector = args.schema.as_deref().unwrap_or(&config.pack.schema);
    Ok(BuildOptions {
        rule: args.rule.clone(),
        split: args.split,
        schemas: parse_schema_selection(selector)?,
        dx_compatible: args.dx_compatible || config.pack.dx_compatible,
        seed: args.seed.or(config.engine.seed),
        up_policy: config.engine.up_selector_policy,
        author: config.pack.author.clone(),
        tags: config.pack.tags.clone(),
        includes_numpad: config.pack.includes_numpad,
        dx_options: config.dx.options(),
        dx_overrides: config.dx.overrides.clone(),
    })
}
