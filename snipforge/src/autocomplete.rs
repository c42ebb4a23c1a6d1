//! Tag autocomplete
//!
//! Every function here is a pure query over the input text and a tag
//! vocabulary (usually `tag_vocabulary`, sorted alphabetically). Cursor
//! positions are character indices and are clamped to the input length.

use crate::interface::{AutocompleteOptions, InlineSuggestion, QueryCompletion, TagCompletion};
use crate::tags::normalize_tag;

/// Keys that move the cursor or delete text; they never trigger completion
pub const SKIP_KEYS: [&str; 6] = [
    "Backspace",
    "Delete",
    "ArrowLeft",
    "ArrowRight",
    "ArrowUp",
    "ArrowDown",
];

const TAG_PREFIX: &str = "tag:";

/// Up to `max` vocabulary tags starting with the normalized `partial`.
/// An empty partial yields the first `max` tags in vocabulary order.
pub fn suggest_tags<S: AsRef<str>>(partial: &str, vocabulary: &[S], max: usize) -> Vec<String> {
    let wanted = normalize_tag(partial);
    vocabulary
        .iter()
        .map(|tag| normalize_tag(tag.as_ref()))
        .filter(|tag| !tag.is_empty() && tag.starts_with(&wanted))
        .take(max)
        .collect()
}

/// Best completion for `typed`, or `None` if there is none or it is already
/// fully typed.
fn best_completion<S: AsRef<str>>(typed: &str, vocabulary: &[S], max: usize) -> Option<String> {
    suggest_tags(typed, vocabulary, max.max(1))
        .into_iter()
        .next()
        .filter(|best| *best != normalize_tag(typed))
}

/// Complete the last tag of a separator-joined tag list.
///
/// `"github,docker,sys"` with `system` in the vocabulary becomes
/// `"github, docker, system, "`.
pub fn complete_tag_input<S: AsRef<str>>(
    input: &str,
    vocabulary: &[S],
    options: &AutocompleteOptions,
) -> TagCompletion {
    let unchanged = |original_last_tag: String| TagCompletion {
        completed: input.to_string(),
        was_completed: false,
        suggestion: None,
        original_last_tag,
    };

    if input.trim().is_empty() {
        return unchanged(String::new());
    }

    let sep = options.separator.as_str();
    let mut tags: Vec<&str> = if sep.is_empty() {
        vec![input.trim()]
    } else {
        input.split(sep).map(str::trim).collect()
    };
    let last_tag = tags.pop().unwrap_or_default();

    let Some(best) = best_completion(last_tag, vocabulary, options.max_suggestions) else {
        return unchanged(last_tag.to_string());
    };

    tags.push(&best);
    let joiner = format!("{sep} ");
    let mut completed = tags.join(&joiner);
    if options.add_separator_after_completion {
        completed.push_str(&joiner);
    }

    TagCompletion {
        completed,
        was_completed: true,
        original_last_tag: last_tag.to_string(),
        suggestion: Some(best),
    }
}

/// The tag being typed at `cursor`: the text between the nearest preceding
/// separator and the cursor, trimmed.
pub fn current_tag(input: &str, cursor: usize, separator: &str) -> String {
    let (before, _) = split_at_char(input, cursor);
    segment_after_last(before, separator).trim().to_string()
}

/// Full suggestion for the tag at `cursor`, if any.
pub fn tag_suggestion_at_cursor<S: AsRef<str>>(
    input: &str,
    cursor: usize,
    vocabulary: &[S],
    separator: &str,
) -> Option<String> {
    best_completion(&current_tag(input, cursor, separator), vocabulary, 1)
}

/// Ghost-text completion for the tag under the cursor.
///
/// A suggestion is only offered when the cursor sits at the end of a non-empty
/// tag, i.e. nothing but whitespace lies between the cursor and the next
/// separator (or the end of input).
pub fn complete_at_cursor<S: AsRef<str>>(
    input: &str,
    cursor: usize,
    vocabulary: &[S],
    separator: &str,
) -> InlineSuggestion {
    let (before, after) = split_at_char(input, cursor);
    let current = segment_after_last(before, separator).trim();
    let until_next = if separator.is_empty() {
        after
    } else {
        after.split(separator).next().unwrap_or_default()
    };
    let is_at_end_of_tag = until_next.trim().is_empty();

    let suggestion = if is_at_end_of_tag && !current.is_empty() {
        best_completion(current, vocabulary, 1)
    } else {
        None
    };
    let completion_text = suggestion
        .as_deref()
        .map(|s| s.chars().skip(current.chars().count()).collect::<String>());

    InlineSuggestion {
        suggestion,
        completion_text,
        before_cursor: before.to_string(),
        after_cursor: after.to_string(),
        current_tag: current.to_string(),
        is_at_end_of_tag,
    }
}

/// Complete a `tag:` clause of a structured query at `cursor`.
///
/// Applies only when the clause the cursor is in (text since the last `|`)
/// contains `tag:`. The tag after the last comma of that value is replaced by
/// the best suggestion; everything before it and everything after the cursor
/// is kept as is.
pub fn complete_search_query<S: AsRef<str>>(
    input: &str,
    cursor: usize,
    vocabulary: &[S],
) -> QueryCompletion {
    let (before, after) = split_at_char(input, cursor);
    let clause_start = before.rfind('|').map_or(0, |i| i + 1);
    if !before[clause_start..].contains(TAG_PREFIX) {
        return QueryCompletion::default();
    }
    let Some(prefix_at) = before.rfind(TAG_PREFIX) else {
        return QueryCompletion::default();
    };

    let value = &before[prefix_at + TAG_PREFIX.len()..];
    let (kept, typed) = match value.rfind(',') {
        Some(comma) => value.split_at(comma + 1),
        None => ("", value),
    };

    let Some(best) = best_completion(typed.trim(), vocabulary, 1) else {
        return QueryCompletion::default();
    };

    let completed = format!("{}{TAG_PREFIX}{kept}{best}{after}", &before[..prefix_at]);
    QueryCompletion {
        completed: Some(completed),
        was_completed: true,
        suggestion: Some(best),
    }
}

/// Whether a keystroke should run autocomplete.
pub fn should_trigger_autocomplete(input: &str, last_key: &str) -> bool {
    !SKIP_KEYS.contains(&last_key) && !input.trim().is_empty()
}

/// Split at a char index, clamped to the input length.
fn split_at_char(input: &str, cursor: usize) -> (&str, &str) {
    let byte = input.char_indices().nth(cursor).map_or(input.len(), |(i, _)| i);
    input.split_at(byte)
}

fn segment_after_last<'a>(text: &'a str, separator: &str) -> &'a str {
    if separator.is_empty() {
        return text;
    }
    text.rfind(separator).map_or(text, |i| &text[i + separator.len()..])
}
