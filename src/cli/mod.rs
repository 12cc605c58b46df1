//! Command-line interface: the web server plus user and API key administration.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// Bookmarks - a personal bookmark manager
#[derive(Parser)]
#[command(name = "bookmarks")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the search path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database URL, e.g. sqlite:data/bookmarks.db
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage login users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage API keys for the bookmarklet
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Create default config file
    Init,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user, or change the password of an existing one
    Set { username: String, password: String },
    /// Delete a user and end their sessions
    #[command(alias = "rm")]
    Delete { username: String },
    /// List users
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Create an API key and print it
    Create { name: String },
    /// List API keys
    #[command(alias = "ls")]
    List,
    /// Delete an API key by id
    #[command(alias = "rm")]
    Delete { id: i32 },
}

impl Cli {
    /// Loads the config file and applies command-line overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_path(path)?,
            None => Config::load()?,
        };

        if let Some(db) = &self.db {
            config.general.database_path.clone_from(db);
        }

        if let Some(Commands::Serve { port: Some(port) }) = &self.command {
            config.server.port = *port;
        }

        Ok(config)
    }
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::parse_from(["bookmarks", "--db", "sqlite::memory:", "user", "set", "alice", "pw"]);
        assert_eq!(cli.db.as_deref(), Some("sqlite::memory:"));
        assert!(matches!(
            cli.command,
            Some(Commands::User {
                command: UserCommands::Set { .. }
            })
        ));

        let cli = Cli::parse_from(["bookmarks", "key", "delete", "3"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Key {
                command: KeyCommands::Delete { id: 3 }
            })
        ));
    }

    #[test]
    fn no_command_means_serve() {
        let cli = Cli::parse_from(["bookmarks"]);
        assert!(cli.command.is_none());
    }
}
