// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tag-set assembly.
//!
//! Every metric and annotation carries a tag set drawn from a fixed key
//! vocabulary. The base set identifies the system and project; the extended
//! block adds build number, commit, and optionally the plain build status.
//! The extended block is all-or-nothing: either the caller supplies
//! [`BuildExtras`] and the whole block appears, or none of its keys do.

use std::collections::BTreeMap;

use crate::sanitize::sanitize;

/// Tag set attached to a record. `BTreeMap` keeps the encoding
/// deterministic regardless of insertion order.
pub type TagSet = BTreeMap<String, String>;

/// Fixed tag-key vocabulary.
pub mod keys {
    /// Bare host name of the CI system.
    pub const HOST: &str = "host";
    /// Dotted, sanitized project name.
    pub const PROJECT: &str = "project";
    /// Build number as a decimal string.
    pub const BUILD_NUMBER: &str = "build_number";
    /// Commit identifier, carried raw.
    pub const GIT_COMMIT: &str = "git_commit";
    /// Plain (non-contextual) result string, sanitized.
    pub const BUILD_STATUS: &str = "build_status";
}

/// Extended tag block for a build. Constructed only when the triggering
/// condition is met (the record wants commit-level identity and the run has
/// a commit).
#[derive(Debug, Clone, Copy)]
pub struct BuildExtras<'a> {
    /// Build number.
    pub number: u32,
    /// Non-empty commit identifier.
    pub commit: &'a str,
    /// Plain result string, included as `build_status` when the profile
    /// enables the status tag.
    pub status: Option<&'a str>,
}

/// Assemble the tag set for a build record.
///
/// `project` is sanitized here; `host` is a bare host name and is included
/// only when known (a missing base URL narrows the set rather than failing
/// derivation). `extras` adds the extended block as a whole.
pub fn build_tags(host: Option<&str>, project: &str, extras: Option<BuildExtras<'_>>) -> TagSet {
    let mut tags = TagSet::new();
    if let Some(host) = host {
        tags.insert(keys::HOST.to_string(), host.to_string());
    }
    tags.insert(keys::PROJECT.to_string(), sanitize(project));
    if let Some(extras) = extras {
        tags.insert(keys::BUILD_NUMBER.to_string(), extras.number.to_string());
        tags.insert(keys::GIT_COMMIT.to_string(), extras.commit.to_string());
        if let Some(status) = extras.status {
            tags.insert(keys::BUILD_STATUS.to_string(), sanitize(status));
        }
    }
    tags
}

/// Single-key tag set for system metrics.
pub fn host_tag(host: &str) -> TagSet {
    let mut tags = TagSet::new();
    tags.insert(keys::HOST.to_string(), host.to_string());
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_tags() {
        let tags = build_tags(Some("ci.example.com"), "folder.app", None);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[keys::HOST], "ci.example.com");
        assert_eq!(tags[keys::PROJECT], "folder.app");
    }

    #[test]
    fn test_project_sanitized_host_not() {
        let tags = build_tags(Some("ci.example.com"), "team one/app", None);
        assert_eq!(tags[keys::PROJECT], "team-one/app");
        assert_eq!(tags[keys::HOST], "ci.example.com");
    }

    #[test]
    fn test_missing_host_narrows_set() {
        let tags = build_tags(None, "app", None);
        assert!(!tags.contains_key(keys::HOST));
        assert_eq!(tags[keys::PROJECT], "app");
    }

    #[test]
    fn test_extended_block_appears_as_a_whole() {
        let extras = BuildExtras {
            number: 42,
            commit: "abc123",
            status: Some("NOT_BUILT"),
        };
        let tags = build_tags(Some("ci.example.com"), "app", Some(extras));
        assert_eq!(tags[keys::BUILD_NUMBER], "42");
        assert_eq!(tags[keys::GIT_COMMIT], "abc123");
        assert_eq!(tags[keys::BUILD_STATUS], "NOT-BUILT");
    }

    #[test]
    fn test_status_tag_toggled_by_profile() {
        let extras = BuildExtras {
            number: 42,
            commit: "abc123",
            status: None,
        };
        let tags = build_tags(Some("ci.example.com"), "app", Some(extras));
        assert!(tags.contains_key(keys::BUILD_NUMBER));
        assert!(tags.contains_key(keys::GIT_COMMIT));
        assert!(!tags.contains_key(keys::BUILD_STATUS));
    }

    #[test]
    fn test_no_extras_means_no_extended_keys() {
        let tags = build_tags(Some("ci.example.com"), "app", None);
        for key in [keys::BUILD_NUMBER, keys::GIT_COMMIT, keys::BUILD_STATUS] {
            assert!(!tags.contains_key(key));
        }
    }

    #[test]
    fn test_host_tag() {
        let tags = host_tag("ci.example.com");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[keys::HOST], "ci.example.com");
    }
}
