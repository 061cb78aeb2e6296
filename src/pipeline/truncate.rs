// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Character-based token estimation and truncation of generation input.

use std::borrow::Cow;

/// Appended to text that was shortened to fit the token budget.
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated to fit the token budget ...]";

/// Truncated text never keeps fewer than this many characters.
pub const MIN_KEPT_CHARS: usize = 100;

/// Rough token estimate: one token per four characters.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Shorten `text` so its estimated token count fits `max_tokens`.
///
/// Text already within budget is returned unchanged. Otherwise the kept
/// prefix is `len * (max_tokens * 0.9 / estimated)` characters, at least
/// [`MIN_KEPT_CHARS`], followed by [`TRUNCATION_MARKER`]. A budget of zero
/// disables truncation.
pub fn truncate_to_budget(text: &str, max_tokens: usize) -> Cow<'_, str> {
    let estimated = estimate_tokens(text);
    if max_tokens == 0 || estimated <= max_tokens {
        return Cow::Borrowed(text);
    }

    let length = text.chars().count();
    // len * budget * 0.9 / estimated, in integer arithmetic
    let keep = (length as u128 * max_tokens as u128 * 9) / (estimated as u128 * 10);
    let keep = usize::try_from(keep)
        .unwrap_or(length)
        .max(MIN_KEPT_CHARS)
        .min(length);

    tracing::debug!(
        "Truncating generation input from ~{} to {} tokens ({} of {} chars kept)",
        estimated,
        max_tokens,
        keep,
        length
    );

    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    Cow::Owned(truncated)
}
