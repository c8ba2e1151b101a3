use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufWriter};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use color_scheme_unit::config::Config;
use color_scheme_unit::generator;
use color_scheme_unit::runner::{self, RunOptions};
use color_scheme_unit::syntax::SyntectHost;

// init is only used by the binary
mod init;

#[derive(Parser, Debug)]
#[command(name = "color-scheme-unit")]
#[command(about = "Run conformance tests for Sublime Text color schemes")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding the Packages/ resource tree
    #[arg(long, global = true)]
    packages: Option<PathBuf>,

    /// Host build number assertions are gated against
    #[arg(long, global = true)]
    build: Option<u32>,

    /// Print the test list and per-test color scheme and syntax
    #[arg(long, default_value = "false")]
    debug: bool,

    /// Print a coverage report after a successful run
    #[arg(long, default_value = "false")]
    coverage: bool,

    /// Write the report to a file and append the UnitTesting trailer
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Package directory or fixture file to test (default: current directory)
    path: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Force overwrite existing files
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// Print caret assertions for one line of a fixture
    Generate {
        file: PathBuf,

        /// 1-based line number
        #[arg(long)]
        line: NonZeroUsize,
    },
    /// Print the scope path and style at a position of a fixture
    Scope {
        file: PathBuf,

        /// 1-based line number
        #[arg(long)]
        line: NonZeroUsize,

        /// 1-based column number
        #[arg(long)]
        column: NonZeroUsize,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// CLI flags layered over the config file.
struct Settings {
    packages_path: PathBuf,
    build: u32,
    debug: bool,
    coverage: bool,
}

impl Settings {
    fn resolve(args: &Args) -> Result<Self> {
        let config = Config::load()?;
        let Some(packages_path) = args.packages.clone().or(config.packages_path) else {
            bail!(
                "No packages directory configured. Use --packages or set packages_path in {}",
                Config::config_path().display()
            );
        };
        if !packages_path.is_dir() {
            bail!("Packages directory not found: {}", packages_path.display());
        }

        Ok(Self {
            packages_path,
            build: args.build.unwrap_or(config.build),
            debug: args.debug || config.debug,
            coverage: args.coverage || config.coverage,
        })
    }

    fn open_host(&self) -> SyntectHost {
        SyntectHost::new(&self.packages_path, self.build)
    }
}

/// Read a fixture from disk and name it as a resource when it lives under
/// the packages directory.
fn read_fixture(host: &SyntectHost, file: &Path) -> Result<(String, String)> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let resource = host
        .store()
        .resource_path(file)
        .unwrap_or_else(|| file.display().to_string());
    Ok((resource, content))
}

fn run_tests(args: &Args, settings: &Settings) -> Result<ExitCode> {
    let host = settings.open_host();
    let target = match &args.path {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let Some(suite) = runner::discover(&host, &target) else {
        eprintln!("No color scheme tests found in {}", target.display());
        eprintln!(
            "Make sure the path is inside the packages directory: {}",
            settings.packages_path.display()
        );
        return Ok(ExitCode::FAILURE);
    };

    let options = RunOptions {
        debug: settings.debug,
        coverage: settings.coverage,
        unittesting: args.output.is_some(),
    };

    let summary = match &args.output {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            runner::run_suite(&host, &suite, &options, &mut BufWriter::new(file))
        }
        None => runner::run_suite(&host, &suite, &options, &mut io::stdout().lock()),
    }
    .context("Failed to write test report")?;

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn dispatch(args: Args) -> Result<ExitCode> {
    match args.command.clone() {
        Some(Commands::Init { force }) => {
            init::run_init(force)?;
        }
        Some(Commands::Generate { file, line }) => {
            let host = Settings::resolve(&args)?.open_host();
            let (resource, content) = read_fixture(&host, &file)?;
            let assertions =
                generator::generate_assertions(&host, &resource, &content, line.get() - 1)?;
            println!("{}", assertions);
        }
        Some(Commands::Scope { file, line, column }) => {
            let host = Settings::resolve(&args)?.open_host();
            let (resource, content) = read_fixture(&host, &file)?;
            let info = generator::inspect_scope(
                &host,
                &resource,
                &content,
                line.get() - 1,
                column.get() - 1,
            )?;
            print!("{}", info);
        }
        None => {
            let settings = Settings::resolve(&args)?;
            return run_tests(&args, &settings);
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let args = Args::parse();

    // Rendering and style resolution are synchronous; keep them off the runtime.
    tokio::task::spawn_blocking(move || dispatch(args))
        .await
        .context("Test runner task failed")?
}
