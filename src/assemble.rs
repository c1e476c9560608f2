//! Section normalization.
//!
//! Stage 2 of the weft pipeline. Templates are typically authored with tags
//! on their own lines; scanned verbatim, every tag and include boundary would
//! leak a stray blank line into the generated program's output and the
//! synthesized source would alternate with degenerate empty emission calls.
//! This stage strips that incidental whitespace without disturbing anything
//! an author meant to emit.
//!
//! The rules apply in a fixed order and the order is observable in generated
//! output, so it is reproduced exactly:
//!
//! 1. Drop leading whitespace-only Literals, stopping at the first Code
//!    section or the first Literal with real content.
//! 2. Symmetrically, drop trailing whitespace-only Literals.
//! 3. Walking forward from just after the *first* Code section, left-trim
//!    each Literal; stop permanently at the first section that survives
//!    trimming (only a whitespace-only prefix run collapses to nothing).
//! 4. Walking backward from just before the *last* Code section, right-trim
//!    each Literal; stop at the first survivor and give it a single trailing
//!    newline, keeping a clean boundary before the closing code.
//! 5. Optionally merge each maximal run of adjacent Literals into one.
//! 6. Drop any remaining section, Literal or Code, that is all whitespace.

use crate::types::{Section, SectionKind};

/// Apply the normalization rules to a fully-scanned section list.
///
/// `merge_literals` controls rule 5; everything else is unconditional.
pub fn normalize(mut sections: Vec<Section>, merge_literals: bool) -> Vec<Section> {
    // Rules 1 and 2: blank literal runs at the extremes carry no content and
    // no boundary information — drop them outright.
    while leading_blank_literal(&sections) {
        sections.remove(0);
    }
    while trailing_blank_literal(&sections) {
        sections.pop();
    }

    let first_code = sections.iter().position(|s| s.kind == SectionKind::Code);
    let last_code = sections.iter().rposition(|s| s.kind == SectionKind::Code);

    // Rule 3: collapse the whitespace run trailing the first code section.
    if let Some(first) = first_code {
        for section in &mut sections[first + 1..] {
            if section.kind == SectionKind::Code {
                break;
            }
            section.text = section.text.trim_start().to_string();
            if !section.text.is_empty() {
                break;
            }
        }
    }

    // Rule 4: same before the last code section, walking backward; the
    // surviving literal gets one newline so the closing code starts on a
    // fresh line.
    if let Some(last) = last_code {
        for section in sections[..last].iter_mut().rev() {
            if section.kind == SectionKind::Code {
                break;
            }
            section.text = section.text.trim_end().to_string();
            if !section.text.is_empty() {
                section.text.push('\n');
                break;
            }
        }
    }

    // Rule 5.
    if merge_literals {
        sections = merge_adjacent_literals(sections);
    }

    // Rule 6: anything still blank produces either an empty emission call or
    // dead code — drop it.
    sections.retain(|section| !section.is_blank());
    sections
}

fn leading_blank_literal(sections: &[Section]) -> bool {
    sections
        .first()
        .is_some_and(|s| s.kind == SectionKind::Literal && s.is_blank())
}

fn trailing_blank_literal(sections: &[Section]) -> bool {
    sections
        .last()
        .is_some_and(|s| s.kind == SectionKind::Literal && s.is_blank())
}

fn merge_adjacent_literals(sections: Vec<Section>) -> Vec<Section> {
    let mut merged: Vec<Section> = Vec::with_capacity(sections.len());
    for section in sections {
        match merged.last_mut() {
            Some(previous)
                if previous.kind == SectionKind::Literal
                    && section.kind == SectionKind::Literal =>
            {
                previous.text.push_str(&section.text);
            }
            _ => merged.push(section),
        }
    }
    merged
}
