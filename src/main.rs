//! htmlpp - C-style macro preprocessor and site builder for HTML templates
//!
//! # Usage
//!
//! ```bash
//! # Build the site described by ./site.toml (built-in defaults if absent)
//! htmlpp build
//!
//! # Build with an explicit config file
//! htmlpp build --config www/site.toml
//!
//! # Rebuild whenever the source tree changes
//! htmlpp watch
//!
//! # Expand a single template to stdout
//! htmlpp expand index.html
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use builder::{build_site, logging, watch, SiteConfig};
use preprocessor::{Expander, FsReader};

#[derive(Parser)]
#[command(name = "htmlpp")]
#[command(version = "0.1.0")]
#[command(about = "C-style macro preprocessor and site builder for HTML templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the whole site once
    Build {
        /// Path to the config file (defaults to ./site.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the effective configuration before building
        #[arg(short, long)]
        verbose: bool,
    },

    /// Build, then rebuild whenever the source tree changes
    Watch {
        /// Path to the config file (defaults to ./site.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Expand a single template file
    Expand {
        /// Path to the template
        file: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    logging::init_from_env();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build { config, verbose } => build_command(config, verbose),
        Commands::Watch { config } => watch_command(config),
        Commands::Expand { file, output } => expand_command(file, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn build_command(config_path: Option<PathBuf>, verbose: bool) -> Result<(), String> {
    let config = SiteConfig::load(config_path.as_deref()).map_err(|e| e.to_string())?;

    println!(
        "📦 Building {} -> {}",
        config.source_dir.display(),
        config.output_dir.display()
    );
    if verbose {
        println!("\n{}", config.summary());
    }

    let stats = build_site(&config).map_err(|e| e.to_string())?;
    println!("✓ {}", stats.summary());

    if !stats.failures.is_empty() {
        for (path, err) in &stats.failures {
            eprintln!("  {}: {}", path.display(), err);
        }
        return Err(format!("{} page(s) failed to expand", stats.failures.len()));
    }
    Ok(())
}

fn watch_command(config_path: Option<PathBuf>) -> Result<(), String> {
    let config = SiteConfig::load(config_path.as_deref()).map_err(|e| e.to_string())?;
    watch(&config).map_err(|e| e.to_string())
}

fn expand_command(file: PathBuf, output: Option<PathBuf>) -> Result<(), String> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()));
    }

    let expander = Expander::new(FsReader);
    let text = expander.expand(&file).map_err(|e| e.to_string())?;

    match output {
        Some(path) => {
            std::fs::write(&path, text)
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            println!("✓ Expanded {} -> {}", file.display(), path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
