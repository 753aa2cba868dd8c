//! Output cleanup for generated drafts.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a complete fenced code block, shortest first, across newlines.
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("Failed to compile code fence pattern"));

/// Drop fenced code blocks from a draft and trim surrounding whitespace.
///
/// The model is instructed to answer with plain email text, but fenced
/// blocks still slip through; an unterminated fence is left alone.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}
