// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host, URL, and project-name formatting.
//!
//! Derives the bare host name from the system's base URL, the fully
//! qualified URL of a run from base URL + relative path, and the dotted
//! project name used in tags and display names.

/// Extract the bare host name from a base URL: strip one leading `http://`
/// or `https://` (scheme letters matched case-insensitively), then cut at
/// the first `:` (port) and then at the first `/` (path). Absent input
/// yields `None`, never an error.
pub fn host_name(base_url: Option<&str>) -> Option<String> {
    let url = base_url?;
    let stripped = strip_scheme(url);
    let stripped = up_to_first(stripped, ':');
    let stripped = up_to_first(stripped, '/');
    Some(stripped.to_string())
}

fn strip_scheme(url: &str) -> &str {
    // url is arbitrary external input; index by checked prefix rather than
    // byte range so multibyte characters near the scheme length are safe.
    for scheme in ["http://", "https://"] {
        if let Some(prefix) = url.get(..scheme.len()) {
            if prefix.eq_ignore_ascii_case(scheme) {
                return &url[scheme.len()..];
            }
        }
    }
    url
}

fn up_to_first(s: &str, c: char) -> &str {
    match s.find(c) {
        Some(index) => &s[..index],
        None => s,
    }
}

/// Join a base URL and a relative path with exactly one `/` between them.
/// Absent base URL degrades to the relative path unchanged.
pub fn resource_url(base_url: Option<&str>, relative_path: &str) -> String {
    match base_url {
        None => relative_path.to_string(),
        Some(base) if base.ends_with('/') => format!("{base}{relative_path}"),
        Some(base) => format!("{base}/{relative_path}"),
    }
}

/// Dotted project name: path segments joined by `.` instead of `/`.
/// An absent name renders as the literal string `"null"`.
pub fn project_name(path: Option<&str>) -> String {
    match path {
        Some(path) => path.replace('/', "."),
        None => "null".to_string(),
    }
}
