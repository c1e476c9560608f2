//! Shared test utilities for the weft test suite.
//!
//! Template fixtures are small enough to write inline, so the helpers focus
//! on making template trees easy to set up and section lists easy to assert
//! against.

use crate::types::{Section, SectionKind};
use std::fs;
use tempfile::TempDir;

/// Write a template file under the temp root, creating parent directories.
pub fn write_template(tmp: &TempDir, relative: &str, content: &str) {
    let path = tmp.path().join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap_or_else(|err| panic!("cannot write {relative}: {err}"));
}

/// Flatten sections to `(kind, text)` pairs for compact assertions.
pub fn sections_flat(sections: &[Section]) -> Vec<(&'static str, &str)> {
    sections
        .iter()
        .map(|section| {
            let kind = match section.kind {
                SectionKind::Literal => "lit",
                SectionKind::Code => "code",
            };
            (kind, section.text.as_str())
        })
        .collect()
}
