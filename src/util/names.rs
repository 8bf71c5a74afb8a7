//! User name normalisation for file names, channel names and topics

use std::sync::OnceLock;

use regex::Regex;

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\W+").expect("valid regex"))
}

/// Replace every run of non-word characters with `replacement` and trim it
/// from both ends.
///
/// Backup files use `_` as the replacement so the `-` separators of the
/// file name stay unambiguous; private channel names use `-`.
pub fn format_username(user: &str, replacement: &str) -> String {
    let replaced = non_word().replace_all(user, replacement);
    if replacement.is_empty() {
        return replaced.into_owned();
    }
    let mut trimmed: &str = &replaced;
    while let Some(rest) = trimmed.strip_prefix(replacement) {
        trimmed = rest;
    }
    while let Some(rest) = trimmed.strip_suffix(replacement) {
        trimmed = rest;
    }
    trimmed.to_string()
}

/// Name of the private channel a user plays in for a given public channel
pub fn private_channel_name(channel_name: &str, user: &str) -> String {
    format!("byc-{}-{}", channel_name, format_username(user, "-"))
}

/// Get the user name for command-line sessions
///
/// Priority:
/// 1. BYC_USER environment variable
/// 2. OS username (USER or USERNAME environment variable)
/// 3. Fallback to "player"
pub fn default_username() -> String {
    for var in ["BYC_USER", "USER", "USERNAME"] {
        if let Ok(user) = std::env::var(var) {
            if !user.is_empty() {
                return user;
            }
        }
    }

    "player".to_string()
}
