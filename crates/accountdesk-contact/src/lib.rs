//! # accountdesk-contact
//!
//! Append-only log of contact form submissions, newest first, persisted
//! to its own blob.

pub mod log;

pub use log::{ContactLog, ContactMessage, ContactSchema, ContactState, NewContactMessage};
