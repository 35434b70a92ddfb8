//! Binary entrypoint for kbmacro.
use std::{
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use crossbeam_channel as chan;
use logging::LogArgs;
use macro_engine::{Config, Error, Key, MacroService, Result};
use ron::ser::PrettyConfig;
use tracing::{debug, error, info};

mod dump;

use crate::dump::DumpMacro;

#[derive(Parser, Debug)]
#[command(name = "kbmacro", about = "Global keyboard macro engine", version)]
/// Command-line interface for the `kbmacro` binary.
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Logging controls
    #[command(flatten)]
    log: LogArgs,

    /// Optional path to a RON engine config
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
/// Top-level CLI subcommands.
enum Command {
    /// Install the keyboard hook and log every key event until the quit key.
    Dump {
        /// Key that ends the dump (consumed)
        #[arg(long, default_value = "esc")]
        quit_key: String,
    },
    /// Load and validate a config file then exit.
    Check {
        /// Path to the config file
        path: PathBuf,

        /// Print the effective configuration as RON
        #[arg(long)]
        dump: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => Config::load(p),
        None => Ok(Config::default()),
    }
}

fn run_dump(config: Config, quit_key: &str) -> Result<()> {
    let quit = Key::from_spec(quit_key)
        .ok_or_else(|| Error::Config(format!("Unknown quit key: {}", quit_key)))?;
    let service = MacroService::new(config)?;
    let (done_tx, done_rx) = chan::bounded(1);
    service.use_macro(DumpMacro::new(quit, done_tx));
    service.start()?;
    info!(quit = %quit.to_spec(), "dumping_keys");
    let waited = done_rx.recv();
    debug!(ok = waited.is_ok(), "dump_finished");
    service.stop();
    Ok(())
}

fn run_check(path: &Path, dump: bool) -> Result<()> {
    let config = Config::load(path)?;
    if dump {
        let text = ron::ser::to_string_pretty(&config, PrettyConfig::default())
            .map_err(|e| Error::Config(e.to_string()))?;
        println!("{}", text);
    } else {
        println!("{}: ok", path.display());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let result = match &cli.command {
        Command::Dump { quit_key } => {
            load_config(cli.config.as_deref()).and_then(|cfg| run_dump(cfg, quit_key))
        }
        Command::Check { path, dump } => run_check(path, *dump),
    };
    if let Err(e) = result {
        error!(error = %e, "kbmacro_failed");
        eprintln!("kbmacro: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_dump_and_check() {
        let cli = Cli::try_parse_from(["kbmacro", "--debug", "dump", "--quit-key", "f12"]).unwrap();
        assert!(cli.log.debug);
        assert!(matches!(cli.command, Command::Dump { ref quit_key } if quit_key == "f12"));

        let cli = Cli::try_parse_from(["kbmacro", "check", "cfg.ron", "--dump"]).unwrap();
        assert!(matches!(cli.command, Command::Check { dump: true, .. }));
    }

    #[test]
    fn default_quit_key_resolves() {
        let cli = Cli::try_parse_from(["kbmacro", "dump"]).unwrap();
        let Command::Dump { quit_key } = cli.command else {
            panic!("expected dump");
        };
        assert_eq!(Key::from_spec(&quit_key), Some(Key::Escape));
    }

    #[test]
    fn missing_config_is_an_error() {
        assert!(matches!(
            run_check(Path::new("/nonexistent/kbmacro.ron"), false),
            Err(Error::Config(_))
        ));
    }
}
