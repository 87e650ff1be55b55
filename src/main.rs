use anyhow::{Context, Result};
use clap::Parser;
use colored::*;

use clean_py::config::Config;
use clean_py::exit_codes::exit;
use clean_py::file_processor::{self, Cleaner, DiscoveryOptions};
use clean_py::tools::ToolRegistry;

mod cli_types;

use cli_types::CleanArgs;

fn main() {
    let args = CleanArgs::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", "Config error".red().bold(), e);
            exit::tool_error();
        }
    };

    let options = DiscoveryOptions {
        py: config.py,
        ipynb: config.ipynb,
        respect_gitignore: config.respect_gitignore,
        exclude: config.exclude.clone(),
    };
    let files = match file_processor::discover_files(&args.paths, &options) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            exit::tool_error();
        }
    };

    let cleaner = match Cleaner::from_config(&config).context("Failed to start worker pool") {
        Ok(cleaner) => cleaner,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            exit::tool_error();
        }
    };

    let summary = file_processor::clean_files(&cleaner, &files, args.verbose);

    if !args.quiet {
        let noun = if summary.cleaned == 1 { "file" } else { "files" };
        println!(
            "{} {} {} ({} changed)",
            "Cleaned".green().bold(),
            summary.cleaned,
            noun,
            summary.changed
        );
    }

    if summary.has_failures() {
        let failed = summary.failed.len();
        let noun = if failed == 1 { "file" } else { "files" };
        eprintln!("{} {failed} {noun} could not be cleaned:", "Error:".red().bold());
        for (path, reason) in &summary.failed {
            eprintln!("  {} {}", path.display().to_string().bold(), reason.dimmed());
        }
        exit::files_failed();
    }

    if !args.quiet {
        println!("{}", "Cleaning completed successfully!".green());
    }
    exit::success();
}

/// Config file (explicit, discovered, or defaults) with CLI flags applied.
fn load_config(args: &CleanArgs) -> Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else if let Some(path) = &args.config {
        Config::load(path).with_context(|| format!("Unable to load {}", path.display()))?
    } else {
        let cwd = std::env::current_dir().context("Unable to determine current directory")?;
        match Config::discover(&cwd)? {
            Some((config, path)) => {
                log::debug!("Using config from {}", path.display());
                config
            }
            None => Config::default(),
        }
    };

    args.apply_to(&mut config);
    config.validate()?;

    for name in ToolRegistry::new(config.tools.clone()).unknown_overrides() {
        log::warn!("Ignoring unknown tool '{name}' in configuration");
    }

    Ok(config)
}
