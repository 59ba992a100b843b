//! Short display forms of strings and request targets for progress labels

use url::Url;

const ELLIPSIS: char = '…';
const MAX_DISPLAY_PATH: usize = 50;
const MAX_DISPLAY_QUERY: usize = 6;

/// Trim `s` to at most `n` characters, replacing the last kept character
/// with an ellipsis when anything was cut.
pub fn abbreviate_string(s: &str, n: usize) -> String {
    if s.chars().count() <= n {
        return s.to_string();
    }

    match n {
        0 => String::new(),
        1 => ELLIPSIS.to_string(),
        _ => s.chars().take(n - 1).chain(std::iter::once(ELLIPSIS)).collect(),
    }
}

/// Short form of a request target for the progress indicator
pub fn url_display_path(url: &Url) -> String {
    let path = abbreviate_string(url.path(), MAX_DISPLAY_PATH);
    match url.query() {
        None | Some("") => path,
        Some(query) => format!("{}?{}", path, abbreviate_string(query, MAX_DISPLAY_QUERY)),
    }
}
