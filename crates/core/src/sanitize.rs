// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tag-value sanitization.
//!
//! The telemetry backend restricts tag values to a small alphabet. Free-text
//! values (project names, result strings used as tag values or metric names)
//! are rewritten here before they reach a record; host names, numeric
//! strings, and commit hashes are already constrained and are never passed
//! through.

/// Characters that survive sanitization unchanged.
fn is_tag_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '/'
}

/// Rewrite `input` into the tag-safe alphabet.
///
/// The URL-encoded slash `%2F` (exact case) becomes a single `-` first;
/// every remaining character outside `[A-Za-z0-9.-/]` then becomes its own
/// `-`. Runs of disallowed characters are not collapsed, so the output
/// length is predictable and the function is idempotent.
pub fn sanitize(input: &str) -> String {
    input
        .replace("%2F", "-")
        .chars()
        .map(|c| if is_tag_safe(c) { c } else { '-' })
        .collect()
}
