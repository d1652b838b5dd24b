//! Length limits and key validation for captured context values.
//!
//! # Design Decisions
//! - Limits are measured in bytes, not characters
//! - A cut that would land inside a multi-byte character backs off to the
//!   previous boundary, so the result may be a few bytes shorter than the limit
//! - Invalid keys are rejected silently; callers cannot observe the rejection

/// Maximum length of "keyword" fields (method, user fields, tag values, URL parts).
pub const KEYWORD_MAX_LEN: usize = 1024;

/// Default maximum length of free-text fields (cookie header, raw bodies).
pub const DEFAULT_TEXT_MAX_LEN: usize = KEYWORD_MAX_LEN;

/// Characters that may not appear in tag or custom context keys.
const RESERVED_KEY_CHARS: [char; 3] = ['.', '*', '"'];

/// Truncate `s` to at most `max` bytes.
pub fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Truncate an owned string in place to at most `max` bytes.
pub fn truncate_owned(mut s: String, max: usize) -> String {
    let len = truncate(&s, max).len();
    s.truncate(len);
    s
}

/// Truncate a keyword field.
pub fn truncate_keyword(s: &str) -> &str {
    truncate(s, KEYWORD_MAX_LEN)
}

/// Reports whether `key` may be used as a tag or custom context key.
pub fn valid_tag_key(key: &str) -> bool {
    !key.contains(RESERVED_KEY_CHARS)
}

/// Truncation limits applied by a [`Context`](super::Context).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Limit for free-text fields. Never smaller than [`KEYWORD_MAX_LEN`].
    pub text_max_len: usize,
}

impl Limits {
    /// Create limits with the given text limit, clamped to at least the keyword limit.
    pub fn new(text_max_len: usize) -> Self {
        Self {
            text_max_len: text_max_len.max(KEYWORD_MAX_LEN),
        }
    }

    pub fn truncate_text<'a>(&self, s: &'a str) -> &'a str {
        truncate(s, self.text_max_len)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_MAX_LEN)
    }
}
