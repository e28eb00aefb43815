//! Classification of free-form string inputs.
//!
//! Callers that receive a bare string (a form field, a JSON value) need to know
//! whether it is a data URI, a link to remote content, or just text. The
//! policy lives here and nowhere else. Surrounding whitespace is ignored,
//! the same way [`parse_data_uri`](crate::parse_data_uri) ignores it, so a
//! string classified as a data URI always reaches the URI parser. Precedence:
//!
//! 1. `data:` prefix, ASCII case-insensitive -> [`SourceClass::DataUri`]
//! 2. a well-formed absolute `http`/`https` URL with a host -> [`SourceClass::HttpUrl`]
//! 3. anything else, the empty string included -> [`SourceClass::Text`]
//!
//! ```rust
//! use decoder::{classify_source, SourceClass};
//!
//! assert_eq!(classify_source("data:,hi"), SourceClass::DataUri);
//! assert_eq!(classify_source("https://example.com/a.png"), SourceClass::HttpUrl);
//! assert_eq!(classify_source("Hello, world!"), SourceClass::Text);
//! ```
use serde::{Deserialize, Serialize};
use url::Url;

use crate::uri::has_data_scheme;

/// What a free-form string most likely is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceClass {
    DataUri,
    HttpUrl,
    Text,
}

/// Classifies `input` per the module-level precedence.
pub fn classify_source(input: &str) -> SourceClass {
    let input = input.trim();
    if has_data_scheme(input) {
        return SourceClass::DataUri;
    }
    if is_http_url(input) {
        return SourceClass::HttpUrl;
    }
    SourceClass::Text
}

fn is_http_url(input: &str) -> bool {
    // Url::parse tolerates surrounding whitespace; a text blob that merely
    // starts with a URL is still text.
    if input.is_empty() || input.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(input) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_precedence() {
        let cases = [
            ("data:text/plain;base64,SGk=", SourceClass::DataUri),
            ("Data:,x", SourceClass::DataUri),
            (" data:text/plain;base64,SGk=\n", SourceClass::DataUri),
            ("http://example.com", SourceClass::HttpUrl),
            ("HTTPS://example.com/path?q=1#frag", SourceClass::HttpUrl),
            ("  https://example.com  ", SourceClass::HttpUrl),
            ("ftp://example.com/file", SourceClass::Text),
            ("http://", SourceClass::Text),
            ("https://example.com and more words", SourceClass::Text),
            ("mailto:someone@example.com", SourceClass::Text),
            ("Hello, world!", SourceClass::Text),
            ("", SourceClass::Text),
            ("   ", SourceClass::Text),
        ];

        for (input, expected) in cases {
            assert_eq!(classify_source(input), expected, "input: {input:?}");
        }
    }
}
