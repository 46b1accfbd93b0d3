//! `data:` URLs for inline file contents

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes escaped in the data portion: everything except ASCII alphanumerics
/// and the URL characters that are unambiguous inside a data URL
const DATA_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@')
    .remove(b'/')
    .remove(b'?');

/// Encode `text` as a `data:` URL with no media type
#[must_use]
pub fn encode(text: &str) -> String {
    format!("data:,{}", utf8_percent_encode(text, DATA_ESCAPE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_unescaped() {
        assert_eq!(encode("hello"), "data:,hello");
    }

    #[test]
    fn empty_text() {
        assert_eq!(encode(""), "data:,");
    }

    #[test]
    fn whitespace_and_percent_are_escaped() {
        assert_eq!(encode("a b\n100%"), "data:,a%20b%0A100%25");
    }

    #[test]
    fn url_punctuation_is_kept() {
        assert_eq!(encode("k=v;x/y?z"), "data:,k=v;x/y?z");
    }

    #[test]
    fn non_ascii_is_utf8_escaped() {
        assert_eq!(encode("é"), "data:,%C3%A9");
    }

    #[test]
    fn hash_and_quote_are_escaped() {
        assert_eq!(encode("#\""), "data:,%23%22");
    }
}
