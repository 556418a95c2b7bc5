//! Read-only user directory queries.

use crate::types::User;

/// One row of the user table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRow<'a> {
    /// 1-based display position within the filtered list.
    pub number: usize,
    pub id: &'a str,
    pub full_name: String,
    pub email: &'a str,
}

/// Filter users by full name.
///
/// Matches when `"<first> <last>"` contains the trimmed query, ignoring
/// case. An empty query matches everyone. Input order is preserved.
pub fn search<'a>(users: &'a [User], query: &str) -> Vec<DirectoryRow<'a>> {
    let needle = query.trim().to_lowercase();

    users
        .iter()
        .map(|u| (u, u.full_name()))
        .filter(|(_, full_name)| needle.is_empty() || full_name.to_lowercase().contains(&needle))
        .enumerate()
        .map(|(i, (u, full_name))| DirectoryRow {
            number: i + 1,
            id: &u.id,
            full_name,
            email: &u.email,
        })
        .collect()
}

// ── tests ────────────────────────────────────────────────────────────
