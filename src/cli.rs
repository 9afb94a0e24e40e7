//! Command-line interface.

use clap::{Parser, Subcommand};

/// Tracktower - project tracking backend
#[derive(Parser)]
#[command(name = "tracktower")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the API server (default)
    #[command(alias = "-s")]
    Serve,

    /// Create or promote the admin account. Idempotent: an existing admin
    /// is left alone, a non-admin row with the same email gets promoted.
    SeedAdmin {
        #[arg(long, env = "ADMIN_EMAIL", default_value = "admin@example.com")]
        email: String,

        #[arg(long, env = "ADMIN_PASSWORD", default_value = "ChangeMe!23")]
        password: String,

        #[arg(long, env = "ADMIN_NAME", default_value = "Administrator")]
        name: String,
    },
}
