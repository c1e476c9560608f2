//! Insertion reference resolution and cycle detection.
//!
//! An `<?insert path ?>` reference is textual; this module turns it into a
//! concrete [`TemplateEntry`] and guards the inclusion stack against cycles.
//!
//! ## Path rule
//!
//! - Absolute reference (`/shared/header.wt`) → resolved against the site
//!   root, so shared fragments can live in one place.
//! - Relative reference (`header.wt`, `../nav.wt`) → resolved against the
//!   directory of the template that *issued* the insertion, not the top-level
//!   template. A fragment behaves the same wherever it is inserted from.
//!
//! ## File identity
//!
//! Cycle detection compares [`same_file::Handle`]s (device + inode), never
//! path strings. `join` produces a lexically clean path, but two different
//! reference strings can still name the same file through a symlink or hard
//! link, and a cycle through a symlink must be caught all the same.

use same_file::Handle;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("cannot open template \"{reference}\"{}: {source}", insertion_context(*.line))]
    Missing {
        reference: String,
        /// Line in the parent template where the insertion occurred; 0 for
        /// the top-level template, which has no parent.
        line: usize,
        source: std::io::Error,
    },
    #[error("insertion cycle:\n  {}", .trace.join("\n  "))]
    Cycle { trace: Vec<String> },
}

fn insertion_context(line: usize) -> String {
    if line == 0 {
        String::new()
    } else {
        format!(" (inserted at line {line})")
    }
}

/// One template on the active inclusion path.
#[derive(Debug)]
pub struct TemplateEntry {
    /// The reference exactly as the author wrote it.
    pub site_path: String,
    /// Physical location in the file system.
    pub hard_path: PathBuf,
    /// File identity token for cycle comparison.
    pub handle: Handle,
    /// Line in the parent template where the insertion occurred; 0 for the
    /// top-level entry.
    pub insertion_line: usize,
}

impl fmt::Display for TemplateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.insertion_line == 0 {
            write!(f, "{}", self.site_path)
        } else {
            write!(f, "-> line {}: {}", self.insertion_line, self.site_path)
        }
    }
}

impl TemplateEntry {
    /// Resolve a reference to a physical file and capture its identity.
    ///
    /// Fails if the file cannot be opened (missing, unreadable), which aborts
    /// the whole top-level compilation.
    pub fn resolve(
        site_root: &Path,
        current_dir: &Path,
        reference: &str,
        insertion_line: usize,
    ) -> Result<TemplateEntry, ResolveError> {
        let hard_path = hard_path(site_root, current_dir, reference);
        let handle = Handle::from_path(&hard_path).map_err(|source| ResolveError::Missing {
            reference: reference.to_string(),
            line: insertion_line,
            source,
        })?;
        Ok(TemplateEntry {
            site_path: reference.to_string(),
            hard_path,
            handle,
            insertion_line,
        })
    }
}

/// Turn a reference into a physical path.
///
/// `PathBuf::join` replaces the base when handed an absolute path, so the
/// leading separator is stripped before joining onto the site root.
pub fn hard_path(site_root: &Path, current_dir: &Path, reference: &str) -> PathBuf {
    let reference = Path::new(reference);
    if reference.is_absolute() {
        match reference.strip_prefix("/") {
            Ok(relative) => site_root.join(relative),
            Err(_) => site_root.join(reference.components().skip(1).collect::<PathBuf>()),
        }
    } else {
        current_dir.join(reference)
    }
}

/// Reject an entry whose file is already on the inclusion stack.
///
/// The error trace runs from the matching ancestor down through the offending
/// entry, in stack order, so the author can follow the loop.
pub fn check_cycle(stack: &[TemplateEntry], entry: &TemplateEntry) -> Result<(), ResolveError> {
    for (index, ancestor) in stack.iter().enumerate() {
        if ancestor.handle == entry.handle {
            let mut trace: Vec<String> = stack[index..].iter().map(|e| e.to_string()).collect();
            trace.push(entry.to_string());
            return Err(ResolveError::Cycle { trace });
        }
    }
    Ok(())
}
