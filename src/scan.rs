//! Template scanning and recursive insertion.
//!
//! Stage 1 of the weft pipeline. Splits a template into ordered [`Section`]s
//! and expands `<?insert ... ?>` directives in place by recursing into child
//! templates.
//!
//! ## Tag syntax
//!
//! Three fixed delimiters, no nesting:
//!
//! ```text
//! <?code let x = 2; ?>        embedded Rust, spliced into the output source
//! <?insert header.wt ?>       child template, scanned and spliced in place
//! ?>                          the single closing delimiter for both
//! ```
//!
//! Once an opening tag matches, further opening tags are ignored until the
//! close completes — a nested tag is silently absorbed into the tag body, not
//! rejected with an error.
//!
//! ## Recursion model
//!
//! Scanning a child blocks the parent until the child finishes, so a child's
//! sections are fully known and spliced before the parent resumes past the
//! insertion point. Each call returns its own section list and the inclusion
//! stack travels as an explicit argument; nothing is shared between two
//! top-level compilations, which is what lets the driver batch them in
//! parallel.
//!
//! Relative references resolve against the directory of the template that
//! issued them, threaded through each recursive call, so a fragment behaves
//! identically at any nesting point.

use crate::pattern::Pattern;
use crate::resolve::{self, ResolveError, TemplateEntry};
use crate::types::Section;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("cannot read template {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

const OPEN_CODE: &str = "<?code";
const OPEN_INSERT: &str = "<?insert";
const CLOSE: &str = "?>";

/// Scan a top-level template into its full, insertion-expanded section list.
///
/// `site_root` anchors absolute insertion references; relative references
/// resolve against each template's own directory, starting with the directory
/// containing `template_path`.
pub fn scan(site_root: &Path, template_path: &Path) -> Result<Vec<Section>, ScanError> {
    let start_dir = template_path.parent().unwrap_or(Path::new("."));
    let entry_name = template_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| template_path.to_string_lossy().into_owned());

    let entry = TemplateEntry::resolve(site_root, start_dir, &entry_name, 0)?;
    let mut stack = Vec::new();
    scan_template(site_root, entry, &mut stack, true)
}

/// Scan one template file, recursing into its insertions.
///
/// The cycle check runs before the file is opened: the candidate entry is
/// compared by file identity against everything already on the stack.
fn scan_template(
    site_root: &Path,
    entry: TemplateEntry,
    stack: &mut Vec<TemplateEntry>,
    top_level: bool,
) -> Result<Vec<Section>, ScanError> {
    resolve::check_cycle(stack, &entry)?;

    let text = fs::read_to_string(&entry.hard_path).map_err(|source| ScanError::Read {
        path: entry.hard_path.clone(),
        source,
    })?;
    let current_dir = entry
        .hard_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    stack.push(entry);
    let result = scan_text(site_root, &current_dir, &text, stack, top_level);
    stack.pop();
    result
}

/// Which opening tag is currently unclosed.
#[derive(Clone, Copy)]
enum OpenTag {
    Code,
    Insert,
}

fn scan_text(
    site_root: &Path,
    current_dir: &Path,
    text: &str,
    stack: &mut Vec<TemplateEntry>,
    top_level: bool,
) -> Result<Vec<Section>, ScanError> {
    let mut sections = Vec::new();

    // One matcher per delimiter for the whole file. Their cursors carry over
    // from character to character — including stalled partial matches, which
    // is part of the contract (see the pattern module docs).
    let mut code_pattern = Pattern::new(OPEN_CODE);
    let mut insert_pattern = Pattern::new(OPEN_INSERT);
    let mut close_pattern = Pattern::new(CLOSE);
    let mut open: Option<OpenTag> = None;

    // Every character lands in the buffer; a completed delimiter empties it.
    // Before an opening tag the buffer holds literal text, before the close
    // it holds the tag body. All delimiters are ASCII, so truncating by their
    // byte length is safe even mid-multibyte content.
    let mut buffer = String::new();
    let mut line_index = 1usize;
    let mut at_prefix = true;

    for ch in text.chars() {
        buffer.push(ch);
        if ch == '\n' {
            line_index += 1;
        }

        match open {
            // Once a tag is open, only the close pattern advances; nested
            // opening tags are absorbed into the body.
            None => {
                let code_hit = code_pattern.next(ch);
                let insert_hit = insert_pattern.next(ch);
                let (tag, length) = if code_hit {
                    (OpenTag::Code, code_pattern.len())
                } else if insert_hit {
                    (OpenTag::Insert, insert_pattern.len())
                } else {
                    continue;
                };

                open = Some(tag);
                buffer.truncate(buffer.len() - length);
                let mut content = std::mem::take(&mut buffer);
                if at_prefix {
                    if top_level {
                        // Incidental whitespace before the first tag of the
                        // top-level template never survives.
                        content = content.trim().to_string();
                    }
                    at_prefix = false;
                }
                sections.push(Section::literal(content));
            }
            Some(tag) => {
                if !close_pattern.next(ch) {
                    continue;
                }
                buffer.truncate(buffer.len() - close_pattern.len());
                let content = std::mem::take(&mut buffer);
                match tag {
                    OpenTag::Code => sections.push(Section::code(content)),
                    OpenTag::Insert => {
                        let reference = content.trim();
                        let child = TemplateEntry::resolve(
                            site_root,
                            current_dir,
                            reference,
                            line_index,
                        )?;
                        let child_sections = scan_template(site_root, child, stack, false)?;
                        sections.extend(child_sections);
                    }
                }
                open = None;
            }
        }
    }

    // End of stream: whatever is buffered is a final literal. An unclosed
    // tag therefore degrades to literal-looking text rather than an error.
    let mut content = buffer;
    if top_level {
        content = content.trim().to_string();
    }
    sections.push(Section::literal(content));

    Ok(sections)
}
