//! docstate CLI
//!
//! Operator tools for the derived-state store.
//!
//! # Commands
//!
//! - `login` / `whoami` / `logout` - Issue, check and revoke session tokens
//! - `record` - Record a document action for a user
//! - `recent` - Fetch a user's recent documents, reconciling as it reads
//! - `sweep` - Reconcile a user's lists in full
//! - `fingerprint` - Read, write and compute content fingerprints
//! - `purge` - Drop expired keys from a file store

mod commands;
mod context;
mod error;
mod settings;

use clap::{Args, Parser, Subcommand};
use context::{Options, StoreTarget};
use docstate_core::Category;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Derived-state tools: session tokens, recent activity and fingerprints.
#[derive(Parser)]
#[command(name = "docstate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Path to the file store
    #[arg(global = true, short, long, default_value = "docstate.json")]
    store: PathBuf,

    /// Redis URL to use instead of the file store
    #[arg(global = true, long, env = "DOCSTATE_REDIS_URL")]
    redis: Option<String>,

    /// Document catalog (JSON) describing the system of record
    #[arg(global = true, long)]
    catalog: Option<PathBuf>,

    /// Config file (JSON)
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    /// Token signing secret
    #[arg(global = true, long, env = "DOCSTATE_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,
}

impl GlobalArgs {
    fn options(&self) -> Options {
        let store = match &self.redis {
            Some(url) => StoreTarget::Redis(url.clone()),
            None => StoreTarget::File(self.store.clone()),
        };
        Options {
            store,
            catalog: self.catalog.clone(),
            config: self.config.clone(),
            secret: self.secret.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a session token, replacing any earlier one
    Login {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// Login e-mail
        #[arg(short, long)]
        email: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text", value_parser = commands::FORMATS)]
        format: String,
    },

    /// Validate a token and show its identity
    Whoami {
        /// Token to validate
        token: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text", value_parser = commands::FORMATS)]
        format: String,
    },

    /// Revoke the session of a user
    Logout {
        /// Login e-mail
        #[arg(short, long)]
        email: String,
    },

    /// Record a document action
    Record {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// Document ID
        #[arg(short, long)]
        doc: i64,

        /// Action category (view, edit, comment)
        #[arg(short, long, default_value = "view")]
        category: Category,

        /// File holding the served or saved body; refreshes the fingerprint
        #[arg(short, long)]
        body: Option<PathBuf>,
    },

    /// Show recent documents for a user
    Recent {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// Action category (view, edit, comment)
        #[arg(short, long, default_value = "view")]
        category: Category,

        /// Rank to start from
        #[arg(long, default_value = "0")]
        start: usize,

        /// Number of entries
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text", value_parser = commands::FORMATS)]
        format: String,
    },

    /// Remove entries for deleted documents from a user's lists
    Sweep {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// Only this category (default: all)
        #[arg(short, long)]
        category: Option<Category>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text", value_parser = commands::FORMATS)]
        format: String,
    },

    /// Content fingerprint operations
    #[command(subcommand)]
    Fingerprint(FingerprintCommand),

    /// Drop expired keys from the file store
    Purge {
        /// Dry run - show what would be done
        #[arg(long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum FingerprintCommand {
    /// Store a fingerprint for a document
    Set {
        /// Document ID
        #[arg(short, long)]
        doc: i64,

        /// Fingerprint value
        hash: String,
    },

    /// Print the stored fingerprint of a document
    Get {
        /// Document ID
        #[arg(short, long)]
        doc: i64,
    },

    /// Hash a file, storing the result when --doc is given
    Hash {
        /// File to hash
        file: PathBuf,

        /// Document ID to store the fingerprint under
        #[arg(short, long)]
        doc: Option<i64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.global.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let options = cli.global.options();

    match cli.command {
        Commands::Login {
            user,
            email,
            format,
        } => {
            let state = context::open_state(&options, false)?;
            commands::session::run_login(&state, user, &email, &format)?;
        }
        Commands::Whoami { token, format } => {
            let state = context::open_state(&options, false)?;
            commands::session::run_whoami(&state, &token, &format)?;
        }
        Commands::Logout { email } => {
            let state = context::open_state(&options, false)?;
            commands::session::run_logout(&state, &email)?;
        }
        Commands::Record {
            user,
            doc,
            category,
            body,
        } => {
            let state = context::open_state(&options, true)?;
            commands::activity::run_record(&state, user, doc, category, body.as_deref())?;
        }
        Commands::Recent {
            user,
            category,
            start,
            count,
            format,
        } => {
            let state = context::open_state(&options, true)?;
            commands::activity::run_recent(&state, user, category, start, count, &format)?;
        }
        Commands::Sweep {
            user,
            category,
            format,
        } => {
            let state = context::open_state(&options, true)?;
            commands::activity::run_sweep(&state, user, category, &format)?;
        }
        Commands::Fingerprint(FingerprintCommand::Set { doc, hash }) => {
            let state = context::open_state(&options, false)?;
            commands::fingerprint::run_set(&state, doc, &hash)?;
        }
        Commands::Fingerprint(FingerprintCommand::Get { doc }) => {
            let state = context::open_state(&options, false)?;
            commands::fingerprint::run_get(&state, doc)?;
        }
        Commands::Fingerprint(FingerprintCommand::Hash { file, doc }) => {
            let state = doc
                .map(|_| context::open_state(&options, false))
                .transpose()?;
            let hash = commands::fingerprint::hash_file(state.as_ref(), &file, doc)?;
            println!("{hash}");
        }
        Commands::Purge { dry_run } => {
            let StoreTarget::File(path) = &options.store else {
                return Err("purge only applies to the file store; Redis expires keys itself".into());
            };
            commands::purge::run(path, dry_run)?;
        }
        Commands::Version => {
            println!("docstate CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("docstate core v{}", docstate_core::VERSION);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_recent() {
        let cli = Cli::try_parse_from([
            "docstate", "recent", "--user", "4", "--category", "edit", "-n", "5", "--catalog",
            "kb.json",
        ])
        .unwrap();
        assert_eq!(cli.global.catalog, Some(PathBuf::from("kb.json")));
        match cli.command {
            Commands::Recent {
                user,
                category,
                count,
                start,
                ..
            } => {
                assert_eq!(user, 4);
                assert_eq!(category, Category::Edit);
                assert_eq!(count, 5);
                assert_eq!(start, 0);
            }
            _ => panic!("expected recent"),
        }
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["docstate", "whoami", "t", "--format", "xml"]).is_err());
    }
}
