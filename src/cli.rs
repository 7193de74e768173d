//! Command-line interface definition for Multichat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for serving the HTTP API and for driving the chat
//! core directly from a terminal.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Multichat - multi-provider LLM chat backend
///
/// Create sessions, attach uploaded files as context, and route messages
/// to Gemini, Claude, GPT or Llama.
#[derive(Parser, Debug, Clone)]
#[command(name = "multichat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Override the SQLite database path
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Multichat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the JSON HTTP API
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,

        /// Keep sessions and files in memory only
        #[arg(long)]
        ephemeral: bool,
    },

    /// Manage chat sessions
    Session {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// List stored sessions
    History,

    /// Send a message to a session
    Send {
        /// Target session identifier
        #[arg(short, long)]
        session: String,

        /// Provider key (gemini, claude, gpt, llama)
        #[arg(short, long)]
        provider: String,

        /// File identifier to attach as context (repeatable, order kept)
        #[arg(short, long = "file")]
        files: Vec<String>,

        /// Message text
        message: String,
    },

    /// Manage uploaded files
    Files {
        /// File subcommand
        #[command(subcommand)]
        command: FileCommand,
    },

    /// List the registered providers
    Providers,
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// Create a new empty session
    New {
        /// Owning user identifier
        #[arg(short, long)]
        user: Option<String>,

        /// Session title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Show a session and its transcript
    Show {
        /// Session identifier
        id: String,

        /// Print the raw JSON document
        #[arg(long)]
        json: bool,
    },
}

/// File management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum FileCommand {
    /// Upload a text file
    Upload {
        /// Path of the file to read
        path: PathBuf,

        /// Stored name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List uploaded files
    List,

    /// Delete an uploaded file
    Delete {
        /// File identifier
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["multichat", "serve"]).unwrap();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        match cli.command {
            Commands::Serve { bind, ephemeral } => {
                assert!(bind.is_none());
                assert!(!ephemeral);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parse_serve_with_flags() {
        let cli =
            Cli::try_parse_from(["multichat", "serve", "--bind", "0.0.0.0:8080", "--ephemeral"])
                .unwrap();
        match cli.command {
            Commands::Serve { bind, ephemeral } => {
                assert_eq!(bind, Some("0.0.0.0:8080".to_string()));
                assert!(ephemeral);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parse_send_keeps_file_order() {
        let cli = Cli::try_parse_from([
            "multichat",
            "send",
            "--session",
            "s1",
            "--provider",
            "claude",
            "--file",
            "b",
            "--file",
            "a",
            "What changed?",
        ])
        .unwrap();
        match cli.command {
            Commands::Send {
                session,
                provider,
                files,
                message,
            } => {
                assert_eq!(session, "s1");
                assert_eq!(provider, "claude");
                assert_eq!(files, vec!["b", "a"]);
                assert_eq!(message, "What changed?");
            }
            _ => panic!("Expected Send command"),
        }
    }

    #[test]
    fn test_cli_parse_send_requires_provider() {
        let result = Cli::try_parse_from(["multichat", "send", "--session", "s1", "Hi"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_session_new() {
        let cli = Cli::try_parse_from(["multichat", "session", "new", "--title", "Plans"]).unwrap();
        match cli.command {
            Commands::Session {
                command: SessionCommand::New { user, title },
            } => {
                assert!(user.is_none());
                assert_eq!(title, Some("Plans".to_string()));
            }
            _ => panic!("Expected Session New command"),
        }
    }

    #[test]
    fn test_cli_parse_session_show_json() {
        let cli = Cli::try_parse_from(["multichat", "session", "show", "abc", "--json"]).unwrap();
        match cli.command {
            Commands::Session {
                command: SessionCommand::Show { id, json },
            } => {
                assert_eq!(id, "abc");
                assert!(json);
            }
            _ => panic!("Expected Session Show command"),
        }
    }

    #[test]
    fn test_cli_parse_files_upload() {
        let cli = Cli::try_parse_from(["multichat", "files", "upload", "notes.txt", "-n", "n1"])
            .unwrap();
        match cli.command {
            Commands::Files {
                command: FileCommand::Upload { path, name },
            } => {
                assert_eq!(path, PathBuf::from("notes.txt"));
                assert_eq!(name, Some("n1".to_string()));
            }
            _ => panic!("Expected Files Upload command"),
        }
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["multichat", "history", "-v", "--json-logs", "--db", "x.db"])
                .unwrap();
        assert!(cli.verbose);
        assert!(cli.json_logs);
        assert_eq!(cli.db, Some("x.db".to_string()));
        assert!(matches!(cli.command, Commands::History));
    }

    #[test]
    fn test_cli_parse_missing_command() {
        let result = Cli::try_parse_from(["multichat"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_invalid_command() {
        let result = Cli::try_parse_from(["multichat", "invalid"]);
        assert!(result.is_err());
    }
}
