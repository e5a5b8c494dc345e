//! `surfacetiles config`: inspect and edit the configuration file.

use std::io::{self, Write};
use std::path::Path;

use clap::Subcommand;
use surfacetiles::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one setting
    Get {
        /// Setting name as section.key, e.g. tiles.split_scale
        key: String,
    },

    /// Change one setting and save the file
    Set {
        /// Setting name as section.key, e.g. tiles.split_scale
        key: String,

        value: String,
    },

    /// Print every setting with its current value
    List,

    /// Print where the configuration file lives
    Path,

    /// Write a configuration file holding the defaults
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    let stdout = io::stdout();
    execute(command, &config_file_path(), &mut stdout.lock())
}

/// Run `command` against the configuration file at `path`.
fn execute(command: ConfigCommands, path: &Path, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let key = lookup(&key)?;
            writeln!(out, "{}", key.get(&read(path)?))?;
        }
        ConfigCommands::Set { key, value } => {
            let key = lookup(&key)?;
            let mut config = read(path)?;
            let previous = key.get(&config);
            key.set(&mut config, &value)?;
            config.save_to(path)?;
            writeln!(out, "{}: {} -> {}", key, previous, key.get(&config))?;
        }
        ConfigCommands::List => {
            let config = read(path)?;
            let width = ConfigKey::all().iter().map(|k| k.name().len()).max().unwrap_or(0);
            for key in ConfigKey::all() {
                writeln!(out, "{:<width$}  {}", key.name(), key.get(&config), width = width)?;
            }
        }
        ConfigCommands::Path => writeln!(out, "{}", path.display())?,
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::Config(format!(
                    "{} exists; pass --force to replace it",
                    path.display()
                )));
            }
            ConfigFile::default().save_to(path)?;
            writeln!(out, "{}", path.display())?;
        }
    }
    Ok(())
}

fn lookup(name: &str) -> Result<ConfigKey, CliError> {
    name.parse()
        .map_err(|_| CliError::Config(format!("no setting named '{}' (see `config list`)", name)))
}

/// The file at `path`, or the defaults when there is none yet.
fn read(path: &Path) -> Result<ConfigFile, CliError> {
    if path.exists() {
        Ok(ConfigFile::load_from(path)?)
    } else {
        Ok(ConfigFile::default())
    }
}
