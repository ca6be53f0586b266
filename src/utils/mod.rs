use std::sync::LazyLock;

use regex::Regex;

/// Prefix that marks a file still being written.
pub const STAGING_PREFIX: &str = ".pending-";

static UNSAFE_FOLDER_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.\- ]").expect("static regex is valid"));

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    let cleaned = filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string();

    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned
    }
}

/// Turn a playlist title into a folder name made only of `[A-Za-z0-9_.\- ]`.
/// Empty and all-dot names become `_` so the folder stays inside the root.
pub fn sanitize_collection_title(title: &str) -> String {
    let cleaned = UNSAFE_FOLDER_CHARS.replace_all(title, "_");
    if cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned.into_owned()
    }
}

/// `"{index} _ {title}"` when numbering, otherwise the plain title.
pub fn numbered_title(index: usize, title: &str, numbering: bool) -> String {
    if numbering {
        format!("{index} _ {title}")
    } else {
        title.to_string()
    }
}

pub fn final_file_name(title: &str, extension: &str) -> String {
    format!("{}.{}", sanitize_filename(title), extension)
}

pub fn staging_file_name(title: &str, extension: &str) -> String {
    format!("{STAGING_PREFIX}{}", final_file_name(title, extension))
}

/// Strip the staging prefix, if any.
pub fn final_name_from_staging(name: &str) -> &str {
    name.strip_prefix(STAGING_PREFIX).unwrap_or(name)
}
