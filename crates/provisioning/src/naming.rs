//! Deriving repository names from untrusted org names.

use crate::RepositoryName;

/// Prefix of every provisioned repository's name.
pub const REPOSITORY_PREFIX: &str = "okta-terraform-";

/// Lower-cases `name`, collapses every run of characters outside
/// `[a-z0-9-]` (and every run of `-`) into a single `-`, and trims `-` from
/// both ends.
///
/// The result is empty or matches `^[a-z0-9]([a-z0-9-]*[a-z0-9])?$`, and
/// `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// The repository name provisioned for an org, or `None` when the org name
/// has no usable characters.
pub fn repository_name_for(org_name: &str) -> Option<RepositoryName> {
    let sanitized = sanitize(org_name);
    if sanitized.is_empty() {
        return None;
    }
    RepositoryName::new(format!("{REPOSITORY_PREFIX}{sanitized}"))
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
