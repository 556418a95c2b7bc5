//! Subcommand handlers.
//!
//! Each invocation runs exactly one store action and prints the result.
//! User-facing refusals (bad input, missing session, wrong code) are not
//! errors: they print a message and yield [`Outcome::Refused`], which the
//! binary turns into a non-zero exit status.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use accountdesk_contact::{ContactLog, NewContactMessage};
use accountdesk_identity::{IdentityStore, NewUser, PasswordHasher, ProfileUpdate, avatar};
use accountdesk_store::{BlobStore, Database};
use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::{Commands, ContactAction, ProfileAction, UserAction};
use crate::config::AppConfig;
use crate::helpers::{avatar_label, required_raw, required_trim};

const LOGIN_REQUIRED: &str = "Please log in first.";
const INVALID_CODE: &str = "Invalid or expired code. Please try again.";
const INVALID_CREDENTIALS: &str = "Invalid email or password.";

/// How a command ended, from the user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Refused,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => ExitCode::SUCCESS,
            Outcome::Refused => ExitCode::FAILURE,
        }
    }
}

/// Print `message` and refuse.
fn refuse(out: &mut impl Write, message: &str) -> Result<Outcome> {
    writeln!(out, "{message}")?;
    Ok(Outcome::Refused)
}

/// Unwrap a validated form field or refuse with its message.
macro_rules! field {
    ($out:expr, $check:expr) => {
        match $check {
            Ok(value) => value,
            Err(message) => return refuse($out, &message),
        }
    };
}

/// Both stores plus the settings the handlers need.
pub struct Desk {
    identity: IdentityStore,
    contacts: ContactLog,
    avatar_max_bytes: u64,
}

impl Desk {
    /// Load both stores from `db` using the keys in `config`.
    pub async fn open(config: &AppConfig, db: Database) -> Self {
        let blobs = BlobStore::new(db);
        let hasher = PasswordHasher::new(config.auth.pbkdf2_iterations);
        let identity = IdentityStore::load(blobs.clone(), &config.storage.identity_key, hasher).await;
        let contacts = ContactLog::load(blobs, &config.storage.contact_key).await;

        Self {
            identity,
            contacts,
            avatar_max_bytes: config.avatar.max_bytes,
        }
    }

    /// Dispatch one subcommand.
    pub async fn run(&mut self, command: Commands, out: &mut impl Write) -> Result<Outcome> {
        match command {
            Commands::Status => self.status(out),
            Commands::Contact { action } => self.contact(action, out).await,
            Commands::Login { email, password } => self.login(&email, &password, out).await,
            Commands::Register {
                first_name,
                last_name,
                email,
                password,
            } => {
                self.register(&first_name, &last_name, &email, &password, out)
                    .await
            }
            Commands::Verify { code } => self.verify(&code, out).await,
            Commands::Logout => self.logout(out).await,
            Commands::Dashboard => self.dashboard(out),
            Commands::Profile { action } => self.profile(action, out).await,
            Commands::Users { action } => self.users(action, out).await,
        }
    }

    // -----------------------------------------------------------------------
    // Public pages
    // -----------------------------------------------------------------------

    fn status(&self, out: &mut impl Write) -> Result<Outcome> {
        match self.identity.current_user() {
            Some(user) => writeln!(out, "Logged in as {} <{}>", user.full_name(), user.email)?,
            None => writeln!(out, "Not logged in.")?,
        }
        if let Some(pending) = self.identity.pending() {
            writeln!(out, "Pending verification for {}", pending.email)?;
        }
        writeln!(out, "Users: {}", self.identity.users().len())?;
        writeln!(out, "Contact messages: {}", self.contacts.len())?;
        Ok(Outcome::Done)
    }

    async fn contact(&mut self, action: ContactAction, out: &mut impl Write) -> Result<Outcome> {
        match action {
            ContactAction::Add { title, description } => {
                let saved = self
                    .contacts
                    .add(NewContactMessage { title, description })
                    .await;
                debug!(id = %saved.id, "contact saved");
                writeln!(out, "Contact saved successfully!")?;
            }
            ContactAction::List => {
                if self.contacts.is_empty() {
                    writeln!(out, "No messages yet.")?;
                }
                for item in self.contacts.items() {
                    writeln!(
                        out,
                        "[{}] {}",
                        item.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        item.title
                    )?;
                    if !item.description.is_empty() {
                        writeln!(out, "    {}", item.description)?;
                    }
                }
            }
            ContactAction::Clear => {
                self.contacts.clear().await;
                writeln!(out, "All messages cleared.")?;
            }
        }
        Ok(Outcome::Done)
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    async fn login(&mut self, email: &str, password: &str, out: &mut impl Write) -> Result<Outcome> {
        if let Some(user) = self.identity.current_user() {
            writeln!(out, "Already logged in as {}.", user.email)?;
            return Ok(Outcome::Done);
        }

        let email = field!(out, required_trim("Email", email));
        let password = field!(out, required_raw("Password", password));

        if !self.identity.login(email, password).await {
            return refuse(out, INVALID_CREDENTIALS);
        }

        if let Some(user) = self.identity.current_user() {
            writeln!(out, "Welcome back, {}!", user.first_name)?;
        }
        Ok(Outcome::Done)
    }

    async fn register(
        &mut self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        out: &mut impl Write,
    ) -> Result<Outcome> {
        let new_user = NewUser {
            first_name: field!(out, required_trim("First name", first_name)).to_owned(),
            last_name: field!(out, required_trim("Last name", last_name)).to_owned(),
            email: field!(out, required_trim("Email", email)).to_owned(),
            password: field!(out, required_raw("Password", password)).to_owned(),
            avatar: None,
        };
        let email = new_user.email.clone();

        let code = self
            .identity
            .register(new_user)
            .await
            .context("failed to start registration")?;

        // No delivery channel: the operator sees the code directly.
        writeln!(out, "Verification code for {email}: {code}")?;
        writeln!(out, "Run `accountdesk verify <code>` to finish.")?;
        Ok(Outcome::Done)
    }

    async fn verify(&mut self, code: &str, out: &mut impl Write) -> Result<Outcome> {
        if let Some(user) = self.identity.current_user() {
            writeln!(out, "Already logged in as {}.", user.email)?;
            return Ok(Outcome::Done);
        }
        if self.identity.pending().is_none() {
            return refuse(
                out,
                "No registration is waiting for a code. Run `accountdesk register` first.",
            );
        }

        let code = field!(out, required_trim("Verification code", code));
        if !self.identity.verify_otp(code).await {
            return refuse(out, INVALID_CODE);
        }

        if let Some(user) = self.identity.current_user() {
            writeln!(out, "Account created. Welcome, {}!", user.first_name)?;
        }
        Ok(Outcome::Done)
    }

    async fn logout(&mut self, out: &mut impl Write) -> Result<Outcome> {
        self.identity.logout().await;
        writeln!(out, "Logged out.")?;
        Ok(Outcome::Done)
    }

    // -----------------------------------------------------------------------
    // Dashboard (session required)
    // -----------------------------------------------------------------------

    fn dashboard(&self, out: &mut impl Write) -> Result<Outcome> {
        let Some(user) = self.identity.current_user() else {
            return refuse(out, LOGIN_REQUIRED);
        };

        writeln!(out, "Welcome back, {}!", user.first_name)?;
        writeln!(out)?;
        writeln!(out, "Registered users: {}", self.identity.users().len())?;
        writeln!(out, "Contact messages: {}", self.contacts.len())?;
        writeln!(out)?;
        writeln!(out, "Logged in as")?;
        writeln!(out, "Name: {}", user.full_name())?;
        writeln!(out, "Email: {}", user.email)?;
        Ok(Outcome::Done)
    }

    async fn profile(&mut self, action: ProfileAction, out: &mut impl Write) -> Result<Outcome> {
        if !self.identity.is_logged_in() {
            return refuse(out, LOGIN_REQUIRED);
        }

        match action {
            ProfileAction::Show => {
                if let Some(user) = self.identity.current_user() {
                    writeln!(out, "First name: {}", user.first_name)?;
                    writeln!(out, "Last name: {}", user.last_name)?;
                    writeln!(out, "Email: {}", user.email)?;
                    writeln!(out, "Avatar: {}", avatar_label(user))?;
                }
                Ok(Outcome::Done)
            }
            ProfileAction::Update {
                first_name,
                last_name,
                email,
                password,
            } => {
                let update = ProfileUpdate {
                    first_name: match first_name.as_deref() {
                        Some(v) => Some(field!(out, required_trim("First name", v)).to_owned()),
                        None => None,
                    },
                    last_name: match last_name.as_deref() {
                        Some(v) => Some(field!(out, required_trim("Last name", v)).to_owned()),
                        None => None,
                    },
                    email: match email.as_deref() {
                        Some(v) => Some(field!(out, required_trim("Email", v)).to_owned()),
                        None => None,
                    },
                    password: password.filter(|p| !p.trim().is_empty()),
                };

                if update.is_empty() {
                    return refuse(out, "Nothing to update.");
                }

                self.identity
                    .update_profile(update)
                    .await
                    .context("failed to update profile")?;
                writeln!(out, "Profile saved.")?;
                Ok(Outcome::Done)
            }
            ProfileAction::Avatar { files, clear } => self.avatar(files, clear, out).await,
        }
    }

    async fn avatar(
        &mut self,
        files: Vec<PathBuf>,
        clear: bool,
        out: &mut impl Write,
    ) -> Result<Outcome> {
        if clear {
            self.identity.set_avatar("").await;
            writeln!(out, "Avatar removed.")?;
            return Ok(Outcome::Done);
        }

        match avatar::ingest(&files, self.avatar_max_bytes).await {
            Ok(data_url) => {
                self.identity.set_avatar(&data_url).await;
                writeln!(out, "Avatar updated.")?;
                Ok(Outcome::Done)
            }
            Err(err) => {
                info!(%err, "avatar rejected");
                refuse(out, &format!("Avatar not changed: {err}"))
            }
        }
    }

    async fn users(&mut self, action: UserAction, out: &mut impl Write) -> Result<Outcome> {
        if !self.identity.is_logged_in() {
            return refuse(out, LOGIN_REQUIRED);
        }

        match action {
            UserAction::List { search } => {
                let rows = self.identity.search(search.as_deref().unwrap_or(""));
                if rows.is_empty() {
                    writeln!(out, "No users found.")?;
                }
                for row in rows {
                    writeln!(out, "{:>3}  {}  {}  {}", row.number, row.full_name, row.email, row.id)?;
                }
                Ok(Outcome::Done)
            }
            UserAction::Show { id } => {
                let Some(user) = self.identity.find_by_id(&id) else {
                    return refuse(out, "User not found.");
                };
                writeln!(out, "User ID: {}", user.id)?;
                writeln!(out, "Name: {}", user.full_name())?;
                writeln!(out, "Email: {}", user.email)?;
                writeln!(out, "Avatar: {}", avatar_label(user))?;
                writeln!(out, "Joined: {}", user.created_at.format("%Y-%m-%d"))?;
                Ok(Outcome::Done)
            }
            UserAction::Delete { email } => {
                let before = self.identity.users().len();
                self.identity.remove_user(&email).await;
                let removed = before - self.identity.users().len();

                writeln!(out, "Removed {removed} user(s).")?;
                if !self.identity.is_logged_in() {
                    writeln!(out, "Your own account was deleted; you have been logged out.")?;
                }
                Ok(Outcome::Done)
            }
        }
    }
}

// ── tests ────────────────────────────────────────────────────────────
