//! Key sanitization for user and consent identifiers.
//!
//! Identifiers arrive from forms and request parameters, so they are cleaned
//! the way a text field is cleaned before it is used as a lookup key:
//! markup is stripped, percent-encoded octets are dropped, control characters
//! become spaces, and whitespace is collapsed and trimmed. Two inputs that
//! sanitize to the same string address the same record.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Script/style elements are removed together with their content.
    static ref SCRIPT_STYLE: Regex =
        Regex::new(r"(?is)<script[^>]*>.*?</script\s*>|<style[^>]*>.*?</style\s*>").unwrap();
    /// A tag opener followed by anything up to `>` (or end of input when unclosed).
    /// A lone `<` before a space or digit is text, not a tag.
    static ref TAG: Regex = Regex::new(r"<[a-zA-Z/!?][^>]*(?:>|$)").unwrap();
    /// Percent-encoded octet such as `%0A` or `%3c`.
    static ref OCTET: Regex = Regex::new(r"%[a-fA-F0-9]{2}").unwrap();
}

/// Sanitize an identifier for use as a lookup key.
pub fn sanitize_key(input: &str) -> String {
    let stripped = strip_tags(input);
    let without_octets = strip_octets(&stripped);
    let spaced: String = without_octets
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    collapse_whitespace(&spaced)
}

fn strip_tags(input: &str) -> String {
    let s = SCRIPT_STYLE.replace_all(input, "");
    TAG.replace_all(&s, "").into_owned()
}

/// Removing one octet can expose another (`%%4141`), so repeat to a fixpoint.
fn strip_octets(input: &str) -> String {
    let mut current = input.to_string();
    while OCTET.is_match(&current) {
        current = OCTET.replace_all(&current, "").into_owned();
    }
    current
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
