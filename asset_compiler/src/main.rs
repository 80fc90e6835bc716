use anyhow::{Context, Result};
use asset_compiler::asset_path::AssetRoot;
use asset_compiler::config::Config;
use asset_compiler::output::CompilerKind;
use asset_compiler::pipeline::{self, BuildOutcome};
use asset_compiler::puzzle::compile_puzzle;
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const EXIT_FAILED: u8 = 1;
const EXIT_NOTHING_TO_DO: u8 = 3;

/// Compiles Tiled maps and puzzle definitions into the engine's binary
/// formats and mirrors an asset tree into a build directory.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compile one `.tmx` map into a `MAP ` blob.
    CompileMap {
        map: PathBuf,
        out: PathBuf,
        /// Directory asset paths are written relative to. Defaults to the
        /// config value, then the current directory.
        #[arg(long, value_name = "DIR")]
        asset_root: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Compile one puzzle definition into a `PUZZ` blob.
    CompilePuzzle { puzzle: PathBuf, out: PathBuf },
    /// Build every asset a manifest selects into an output directory.
    Build {
        manifest: PathBuf,
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,
        #[arg(long, value_name = "DIR")]
        asset_root: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse().command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(EXIT_FAILED)
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::CompileMap {
            map,
            out,
            asset_root,
            config,
        } => {
            let config = load_config(config.as_deref(), asset_root)?;
            let root = AssetRoot::new(&config.asset_root).context("opening asset root")?;
            let bytes = CompilerKind::Map
                .compile(&map, &root)
                .with_context(|| format!("compiling {}", map.display()))?;
            write_output(&out, &bytes)?;
        }
        Commands::CompilePuzzle { puzzle, out } => {
            let mut bytes = Vec::new();
            compile_puzzle(&puzzle, &mut bytes).with_context(|| format!("compiling {}", puzzle.display()))?;
            write_output(&out, &bytes)?;
        }
        Commands::Build {
            manifest,
            output,
            asset_root,
            config,
        } => {
            let config = load_config(config.as_deref(), asset_root)?;
            let outcome = pipeline::run(&manifest, &output, &config)
                .with_context(|| format!("building {}", manifest.display()))?;
            if outcome == BuildOutcome::NothingToDo {
                eprintln!("Nothing to do: {} selects no assets", manifest.display());
                return Ok(ExitCode::from(EXIT_NOTHING_TO_DO));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// The config file if given, with `--asset-root` taking precedence.
fn load_config(path: Option<&Path>, asset_root: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(asset_root) = asset_root {
        config.asset_root = asset_root;
    }
    Ok(config)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
