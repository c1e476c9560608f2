//! Shared types used across all pipeline stages.
//!
//! A template compilation flows scan → assemble → synth, and every stage
//! speaks in ordered lists of [`Section`]s. Order is the only relationship
//! between sections that matters.

use serde::{Deserialize, Serialize};

/// What a run of template text is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionKind {
    /// Reproduced verbatim in the generated program's output.
    Literal,
    /// Spliced unchanged into the generated program's source.
    Code,
}

/// One run of template text, classified by the scanner.
///
/// Sections are produced append-only during a scan. The assembler may later
/// trim, merge, or drop them; the synthesizer consumes the normalized list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub text: String,
}

impl Section {
    pub fn literal(text: impl Into<String>) -> Self {
        Section {
            kind: SectionKind::Literal,
            text: text.into(),
        }
    }

    pub fn code(text: impl Into<String>) -> Self {
        Section {
            kind: SectionKind::Code,
            text: text.into(),
        }
    }

    /// True when the section holds nothing but whitespace (or nothing at all).
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
