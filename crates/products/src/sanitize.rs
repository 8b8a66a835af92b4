//! Plain-text sanitizing for single-line form input.
//!
//! Mirrors what storefront platforms do to a text field before persisting it:
//! markup is stripped, percent-encoded octets are removed and whitespace is
//! collapsed. The result is a plain text token, not a validated value.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // <script>/<style> elements, content included.
    static ref RAW_TEXT_ELEMENT: Regex =
        Regex::new(r"(?is)<script[^>]*?>.*?</script\s*>|<style[^>]*?>.*?</style\s*>")
            .expect("raw text element pattern");
    static ref WHITESPACE_RUN: Regex = Regex::new(r"[\r\n\t ]+").expect("whitespace pattern");
    static ref SPACE_RUN: Regex = Regex::new(r" +").expect("space pattern");
    static ref OCTET: Regex = Regex::new(r"(?i)%[a-f0-9]{2}").expect("octet pattern");
}

/// Sanitize a single-line text field.
///
/// - tags are removed (`<script>`/`<style>` together with their content),
///   a `<` that does not open a tag becomes `&lt;`
/// - runs of spaces, tabs and line breaks collapse to one space
/// - `%XX` octets are removed
/// - leading/trailing whitespace is trimmed
pub fn sanitize_text_field(input: &str) -> String {
    let mut filtered = if input.contains('<') {
        strip_tags(&RAW_TEXT_ELEMENT.replace_all(input, ""))
    } else {
        input.to_string()
    };

    filtered = WHITESPACE_RUN.replace_all(&filtered, " ").trim().to_string();

    let (without_octets, found) = remove_octets(&filtered);
    if found {
        filtered = SPACE_RUN.replace_all(&without_octets, " ").trim().to_string();
    }

    filtered
}

/// Drop every tag; a `<` that does not open one is encoded.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let opens_tag = tail[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));

        match (opens_tag, tail.find('>')) {
            (true, Some(end)) => rest = &tail[end + 1..],
            _ => {
                out.push_str("&lt;");
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Remove `%XX` octets until none remain (removal can form new ones).
fn remove_octets(input: &str) -> (String, bool) {
    let mut current = input.to_string();
    let mut found = false;

    while let Some(octet) = OCTET.find(&current).map(|m| m.as_str().to_string()) {
        current = current.replace(&octet, "");
        found = true;
    }

    (current, found)
}
