// CLI module - command-line argument parsing and handlers
//
// Provides the demo flag plus subcommands for configuration management:
// - config --show: Display effective configuration
// - config --reset: Regenerate config file with defaults
// - config --edit: Open config file in $EDITOR
// - config --path: Show config file path

use crate::config::{Config, VERSION};
use clap::{Parser, Subcommand};
use std::process::Command;

/// agora - terminal client for the Agora civic engagement platform
#[derive(Parser)]
#[command(name = "agora")]
#[command(version = VERSION)]
#[command(about = "Terminal client for the Agora civic engagement platform", long_about = None)]
pub struct Cli {
    /// Run with synthetic events instead of a live backend
    #[arg(long)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Open config file in $EDITOR
        #[arg(long)]
        edit: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// What main should do after argument parsing.
pub enum CliAction {
    /// A subcommand was handled; exit.
    Exit,
    /// Start the client.
    Run { demo: bool },
}

/// Parse arguments and handle subcommands.
pub fn handle_cli() -> CliAction {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config {
            show,
            reset,
            edit,
            path,
        }) => {
            if path {
                handle_config_path();
            } else if show {
                handle_config_show();
            } else if reset {
                handle_config_reset();
            } else if edit {
                handle_config_edit();
            } else {
                // No flag provided, show usage
                println!("Usage: agora config [--show|--reset|--edit|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --reset   Reset config file to defaults");
                println!("  --edit    Open config file in $EDITOR");
                println!("  --path    Show config file path");
            }
            CliAction::Exit
        }
        None => CliAction::Run { demo: cli.demo },
    }
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => eprintln!("Could not determine config path (no home directory)"),
    }
}

fn handle_config_show() {
    let config = Config::from_env();
    print!("{}", config.to_toml());
}

fn handle_config_reset() {
    let Some(path) = Config::config_path() else {
        eprintln!("Could not determine config path (no home directory)");
        return;
    };

    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Failed to create config directory: {e}");
            return;
        }
    }

    match std::fs::write(&path, Config::default().to_toml()) {
        Ok(()) => println!("Config reset to defaults: {}", path.display()),
        Err(e) => eprintln!("Failed to write config: {e}"),
    }
}

fn handle_config_edit() {
    let Some(path) = Config::config_path() else {
        eprintln!("Could not determine config path (no home directory)");
        return;
    };

    // Make sure there is a file to edit
    Config::ensure_config_exists();

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    match Command::new(&editor).arg(&path).status() {
        Ok(status) if status.success() => {}
        Ok(status) => eprintln!("{editor} exited with {status}"),
        Err(e) => eprintln!("Failed to launch {editor}: {e}"),
    }
}
