//! CLI argument definitions for accountdesk.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! bootstrapping and `commands.rs` on running actions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// accountdesk -- local accounts, profiles and contact messages.
#[derive(Parser)]
#[command(
    name = "accountdesk",
    version,
    about = "accountdesk -- local account desk",
    long_about = "Register with a one-time code, log in, edit your profile and avatar, \
                  browse the user directory and keep a log of contact messages. \
                  Everything is stored in a local SQLite file."
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Directory holding the database; overrides the config file and
    /// `ACCOUNTDESK_DATA_DIR`.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show who is logged in and how much is stored.
    Status,

    /// Send or browse contact messages.
    Contact {
        #[command(subcommand)]
        action: ContactAction,
    },

    /// Log in with email and password.
    Login {
        #[arg(long, short)]
        email: String,

        #[arg(long, short)]
        password: String,
    },

    /// Start a registration; prints the one-time code to confirm it with.
    Register {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long, short)]
        email: String,

        #[arg(long, short)]
        password: String,
    },

    /// Confirm the pending registration with its one-time code.
    Verify {
        /// The six digit code printed by `register`.
        code: String,
    },

    /// Overview for the logged-in user.
    Dashboard,

    /// View or edit your own profile.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Browse and manage registered users.
    Users {
        #[command(subcommand)]
        action: UserAction,
    },

    /// End the current session.
    Logout,
}

/// Actions on the contact message log.
#[derive(Debug, Subcommand)]
pub enum ContactAction {
    /// Save a new message.
    Add {
        #[arg(long, short, default_value = "")]
        title: String,

        #[arg(long, short, default_value = "")]
        description: String,
    },
    /// List saved messages, newest first.
    List,
    /// Delete every saved message.
    Clear,
}

/// Actions on the logged-in user's profile.
#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// Print the profile.
    Show,
    /// Change one or more profile fields.
    Update {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long, short)]
        email: Option<String>,

        /// New password; a blank value keeps the current one.
        #[arg(long, short)]
        password: Option<String>,
    },
    /// Upload an avatar image, or remove the current one.
    Avatar {
        /// Exactly one image file.
        #[arg(required_unless_present = "clear")]
        files: Vec<PathBuf>,

        /// Remove the current avatar.
        #[arg(long, conflicts_with = "files")]
        clear: bool,
    },
}

/// Actions on the user directory.
#[derive(Debug, Subcommand)]
pub enum UserAction {
    /// List users, optionally filtered by name.
    List {
        /// Case-insensitive match against "<first> <last>".
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Show one user by id.
    Show {
        id: String,
    },
    /// Delete every user with this email.
    Delete {
        email: String,
    },
}
