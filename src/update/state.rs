//! Pinned version/hash fields inside the packaging artifact
//!
//! The artifact is treated as opaque text. Only the first
//! `version = "..."` and `sha256 = "..."` assignments are read or replaced;
//! every other byte is left untouched.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bversion\s*=\s*"([^"]+)""#).expect("valid regex"));

static SHA256_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bsha256\s*=\s*"([^"]+)""#).expect("valid regex"));

/// Field names as they appear in the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinnedField {
    Version,
    Sha256,
}

impl PinnedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinnedField::Version => "version",
            PinnedField::Sha256 => "sha256",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            PinnedField::Version => &VERSION_PATTERN,
            PinnedField::Sha256 => &SHA256_PATTERN,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("Could not find {} in the pinned artifact", .0.as_str())]
    FieldNotFound(PinnedField),
}

/// Version and hash currently recorded in the artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedState {
    pub version: String,
    pub sha256: String,
}

impl PinnedState {
    /// Reads both fields
    pub fn parse(content: &str) -> Result<Self, StateError> {
        Ok(Self {
            version: read_field(content, PinnedField::Version)?,
            sha256: read_field(content, PinnedField::Sha256)?,
        })
    }

    /// Returns `content` with both values replaced in place
    pub fn apply(&self, content: &str) -> Result<String, StateError> {
        let version_span = value_span(content, PinnedField::Version)?;
        let sha256_span = value_span(content, PinnedField::Sha256)?;

        // Splice from the back so the earlier span stays valid
        let mut edits = [
            (version_span, self.version.as_str()),
            (sha256_span, self.sha256.as_str()),
        ];
        edits.sort_by_key(|(span, _)| std::cmp::Reverse(span.start));

        let mut patched = content.to_string();
        for (span, value) in edits {
            patched.replace_range(span, value);
        }
        Ok(patched)
    }
}

/// Reads the first value assigned to `field`
pub fn read_field(content: &str, field: PinnedField) -> Result<String, StateError> {
    let span = value_span(content, field)?;
    Ok(content[span].to_string())
}

fn value_span(content: &str, field: PinnedField) -> Result<Range<usize>, StateError> {
    field
        .pattern()
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|value| value.range())
        .ok_or(StateError::FieldNotFound(field))
}
