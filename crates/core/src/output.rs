//! Interpretation of script output lines
//!
//! The scripts run by commands report progress and failures as plain text.
//! These helpers recognise the markers the commands react to.

/// Prefix of progress lines written by CI and CD store/restore.
pub const OBJECT_TYPE_MARKER: &str = "Object type";

/// Written by CI restore when no repository exists.
pub const CI_REPOSITORY_NOT_FOUND: &str = "The Continuous Integration repository is either not initialized or in an incorrect location on the file system.";

/// Reported on stdout by CD store when files are locked.
pub const IO_EXCEPTION_MARKER: &str = "System.IO.IOException";

/// Progress lines written while re-signing macros.
pub const MACRO_PROGRESS_MARKER: &str = "Processing";

/// Progress lines written by code generation.
pub const CODEGEN_PROGRESS_MARKER: &str = "Generating code files for";

/// Question asked by `dotnet new` before restoring packages.
pub const RESTORE_ACTION_PROMPT: &str = "Do you want to run this action";

const BENIGN_UNINSTALL_NOISE: [&str; 4] = [
    "no package installed",
    "is not found",
    "could not be found",
    "not currently installed",
];

/// Case-insensitive substring test.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// What an "Object type" line tells about progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// `current` of `total` object types processed
    Counter { current: u64, total: u64 },
    /// Free-form status text
    Label(String),
}

/// Parse the `"N/M: label"` counter of a progress line.
///
/// Only the part before the first `:` is considered and non-digit characters
/// around the numbers are ignored. Lines without two numbers yield `None`.
pub fn parse_counter(line: &str) -> Option<(u64, u64)> {
    let head = line.split(':').next()?;
    let mut parts = head.split('/');
    let current = digits(parts.next()?)?;
    let total = digits(parts.next()?)?;
    Some((current, total))
}

fn digits(segment: &str) -> Option<u64> {
    let digits: String = segment.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Interpret a line from CI/CD store or restore.
///
/// Lines mentioning the object type marker become counters when they carry a
/// well formed "N/M" prefix and labels otherwise. Store output only uses the
/// counters, restore output shows every line as a label.
pub fn interpret_object_type_line(line: &str) -> Option<ProgressUpdate> {
    if !contains_ignore_case(line, OBJECT_TYPE_MARKER) {
        return None;
    }

    match parse_counter(line) {
        Some((current, total)) => Some(ProgressUpdate::Counter { current, total }),
        None => Some(ProgressUpdate::Label(line.trim().to_string())),
    }
}

/// The whole trimmed line for any object type line.
pub fn object_type_label(line: &str) -> Option<String> {
    contains_ignore_case(line, OBJECT_TYPE_MARKER).then(|| line.trim().to_string())
}

/// Whether a stderr line from an uninstall script only says there was
/// nothing to uninstall.
pub fn is_benign_uninstall_noise(line: &str) -> bool {
    BENIGN_UNINSTALL_NOISE
        .iter()
        .any(|noise| contains_ignore_case(line, noise))
}
