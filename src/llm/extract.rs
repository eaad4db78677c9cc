//! Recovery of a flashcard array from free-form model output.
//!
//! Models routinely wrap the JSON they were asked for in prose
//! ("Here are your flashcards: [...] Let me know if ..."), so the decoder
//! looks for the array inside the text rather than parsing the whole reply.
//!
//! Two spans are tried, in order:
//!
//! 1. a bracket-balanced span starting at a `[` that opens an array of
//!    objects, found by tracking nesting depth and skipping string literals;
//! 2. the legacy span from the first `[` to the last `]`.
//!
//! Whatever span decodes must be a non-empty array whose every element has a
//! non-empty `question` and `answer`. A single bad element rejects the whole
//! deck.

use serde_json::Value;

use crate::card::{Flashcard, FlashcardSet};
use crate::error::{GenerateError, GenerateResult};

/// Upper bound on balanced candidates tried before falling back to the
/// legacy span.
const MAX_CANDIDATES: usize = 8;

pub fn extract_flashcards(raw: &str) -> GenerateResult<FlashcardSet> {
    let start = raw
        .find('[')
        .ok_or_else(|| failed("response contains no JSON array"))?;

    for candidate in object_array_starts(raw, start).take(MAX_CANDIDATES) {
        if let Some(end) = balanced_end(raw, candidate)
            && let Ok(set) = decode_span(&raw[candidate..=end])
        {
            return Ok(set);
        }
    }

    let end = raw
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or_else(|| failed("response has no closing bracket after the first '['"))?;

    decode_span(&raw[start..=end])
}

fn failed(reason: impl Into<String>) -> GenerateError {
    GenerateError::ExtractionFailed(reason.into())
}

/// Byte offsets of every `[` at or after `from` whose next non-whitespace
/// character is `{`.
fn object_array_starts(raw: &str, from: usize) -> impl Iterator<Item = usize> + '_ {
    raw[from..]
        .match_indices('[')
        .map(move |(offset, _)| from + offset)
        .filter(move |&idx| raw[idx + 1..].trim_start().starts_with('{'))
}

/// Index of the `]` closing the `[` at `open`, ignoring brackets inside
/// JSON string literals.
fn balanced_end(raw: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[open..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }

    None
}

fn decode_span(span: &str) -> GenerateResult<FlashcardSet> {
    let value: Value =
        serde_json::from_str(span).map_err(|e| failed(format!("invalid JSON: {e}")))?;

    let Value::Array(items) = value else {
        return Err(failed("expected a JSON array"));
    };

    if items.is_empty() {
        return Err(failed("the array holds no flashcards"));
    }

    let cards = items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value::<Flashcard>(item)
                .map_err(|e| failed(format!("flashcard {} is invalid: {e}", idx + 1)))
        })
        .collect::<GenerateResult<Vec<_>>>()?;

    Ok(FlashcardSet::new(cards))
}
