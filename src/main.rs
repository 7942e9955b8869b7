use clap::{Parser, Subcommand};

use config::Config;
use home::home_dir;
use log::{info, LevelFilter};
use std::path::PathBuf;

use crate::backend::Backend;
use crate::controller::Controller;
use crate::http::HttpBackend;
use crate::notice::Tone;
use crate::prompt::{AssumeYes, Prompt, Terminal};
use crate::shell::Shell;

mod backend;
mod backup;
mod config;
mod controller;
mod http;
mod notice;
mod panel;
mod prompt;
mod render;
mod shell;
#[cfg(test)]
mod testing;

use anyhow::{bail, Context, Ok, Result};

/// fileadmin edits the files of a backup admin service and restores their backup versions.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode
    #[arg(short, long)]
    quiet: bool,

    #[arg(long)]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the configuration file. This can be skipped with environment variables
    Configure {
        /// Base url of the admin API, e.g. http://localhost:8080/api (FILEADMIN_API_URL)
        url: String,
        /// Editor command used by `edit` in the shell (FILEADMIN_EDITOR)
        #[arg(short, long)]
        editor: Option<String>,
        /// Request timeout in seconds (FILEADMIN_TIMEOUT)
        #[arg(short, long)]
        timeout: Option<u64>,
    },
    /// Interactive session: browse, edit, create, delete files and restore backups (default)
    Shell,
    /// List the files on the server
    List,
    /// Print the content of a file
    Show { name: String },
    /// List every backup version, grouped by file
    History,
    /// Restore a backup version over its file
    Restore {
        /// Version key as shown by `history`
        key: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.quiet && args.verbose {
        bail!("--quiet and --verbose cannot be used together");
    }
    let level = if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config_file_path = args
        .config_file.as_ref()
        .map_or_else(|| {
            let mut dir = home_dir().context("Unable to find the home directory to get the config file. You can provide the config file as argument with --config-file")?;
            dir.push(".fileadmin");
            Ok::<PathBuf>(dir.to_owned())
        }, |p| Ok(p.to_owned())
    )?;
    let config_file_path = config_file_path.as_path();

    if let Some(Commands::Configure {
        url,
        editor,
        timeout,
    }) = &args.command
    {
        let config = Config {
            api_url: url.clone(),
            editor: editor.clone(),
            timeout_secs: *timeout,
        };
        // Fail early on a url the client could not use
        HttpBackend::new(&config)?;
        config
            .save(config_file_path)
            .context("Error saving the config file")?;
        info!("New configuration saved in {}", config_file_path.display());
        return Ok(());
    }

    let config = Config::load(config_file_path)?;
    let backend = HttpBackend::new(&config)?;

    match args.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            Shell::new(Controller::new(backend, Terminal), config.editor_command()).run()
        }
        Commands::List => list(backend),
        Commands::Show { name } => show(backend, &name),
        Commands::History => history(backend),
        Commands::Restore { key, yes: true } => restore(backend, AssumeYes, &key),
        Commands::Restore { key, yes: false } => restore(backend, Terminal, &key),
        Commands::Configure { .. } => Ok(()),
    }
}

/// Turns an error notice left by the last action into a failed exit.
fn check<B: Backend, P: Prompt>(controller: &Controller<B, P>) -> Result<()> {
    let panel = controller.panel();
    for notice in [&panel.status, &panel.backup_status] {
        if let Some((text, Tone::Error)) = notice.current() {
            bail!("{}", text);
        }
    }
    Ok(())
}

fn list(backend: HttpBackend) -> Result<()> {
    let mut controller = Controller::new(backend, Terminal);
    controller.load_files();
    check(&controller)?;
    for row in &controller.panel().files.rows {
        println!("{}", row.name);
    }
    Ok(())
}

fn show(backend: HttpBackend, name: &str) -> Result<()> {
    let mut controller = Controller::new(backend, Terminal);
    controller.load_files();
    controller.select_file(name);
    check(&controller)?;
    print!("{}", controller.panel().editor.content);
    Ok(())
}

fn history(backend: HttpBackend) -> Result<()> {
    let mut controller = Controller::new(backend, Terminal);
    controller.load_backup_history();
    check(&controller)?;
    let names: Vec<String> = controller
        .panel()
        .history
        .groups()
        .iter()
        .map(|group| group.base_name.clone())
        .collect();
    for name in names {
        controller.toggle_group(&name);
    }
    render::history(&mut std::io::stdout(), controller.panel())?;
    Ok(())
}

fn restore<P: Prompt>(backend: HttpBackend, prompt: P, key: &str) -> Result<()> {
    let mut controller = Controller::new(backend, prompt);
    controller.load_backup_history();
    check(&controller)?;
    controller.restore_key(key);
    check(&controller)?;
    if let Some((text, _)) = controller.panel().backup_status.current() {
        println!("{}", text);
    }
    Ok(())
}
