//! Source synthesis: sections in, one formatted Rust file out.
//!
//! Stage 3 of the weft pipeline. Code sections are the author's; this stage
//! never interprets them, it only reassembles them around emission calls and
//! lets the host language's own front end (`syn`) decide whether the result
//! is a program. Formatting goes through `prettyplease`, so the output is
//! canonical rustfmt-style source regardless of how the template was laid
//! out.
//!
//! ## The emission namespace
//!
//! Generated programs append output through one well-known function:
//! `print` in `weft::runtime`. How that call is spelled depends on what the
//! author already imported:
//!
//! - `use weft::runtime;` (or any `as name`) → calls use `name::print`, the
//!   first matching import wins;
//! - `use weft::runtime::*;` → calls are bare `print(...)`;
//! - `use weft::runtime as _;` runs the module but binds no name, so it does
//!   not count;
//! - nothing imported → an import is injected, preferring the name
//!   `runtime`, falling back to `runtime_0`, `runtime_1`, … when another
//!   import already took the name.
//!
//! ## Literal escaping
//!
//! Literal text is carried in raw string literals (`r"..."`), which cannot
//! contain their own `"` delimiter. Each literal is split on `"`: runs
//! between quotes become raw strings, each quote becomes the char literal
//! `'"'`, and every piece gets its own emission call in order, so
//! concatenation reconstructs the literal exactly.

use crate::types::{Section, SectionKind};
use thiserror::Error;

/// Canonical import path of the emission namespace.
pub const RUNTIME_PATH: &str = "weft::runtime";
/// Last segment of [`RUNTIME_PATH`]; the preferred local binding.
pub const RUNTIME_NAME: &str = "runtime";
/// The emission function generated calls go through.
pub const EMIT_FN: &str = "print";

#[derive(Error, Debug)]
pub enum SynthError {
    /// The concatenated code sections are not valid Rust. Carries the exact
    /// probe source so the author sees what the compiler assembled.
    #[error("cannot parse code sections: {message}\n--- generated source ---\n{generated}")]
    CodeParse { message: String, generated: String },
    /// The fully rewritten buffer failed the final parse.
    #[error("cannot parse synthesized source: {message}\n--- generated source ---\n{generated}")]
    FinalParse { message: String, generated: String },
}

/// Transform a normalized section list into one formatted Rust source file.
pub fn synthesize(sections: &[Section]) -> Result<String, SynthError> {
    // Probe: parse the user's code alone to learn its imports. Emission
    // calls are not generated yet because their spelling depends on what the
    // probe finds.
    let mut probe = String::new();
    for section in sections {
        if section.kind == SectionKind::Code {
            probe.push_str(&section.text);
            probe.push('\n');
        }
    }
    let probe_file = syn::parse_file(&probe).map_err(|err| SynthError::CodeParse {
        message: err.to_string(),
        generated: probe.clone(),
    })?;

    let namespace = resolve_emission_namespace(&probe_file);

    // Rewrite: user code passes through untouched, literals become emission
    // calls with the prefix the probe decided on.
    let generated = rewrite(sections, &namespace.call_prefix);

    let mut file = syn::parse_file(&generated).map_err(|err| SynthError::FinalParse {
        message: err.to_string(),
        generated: generated.clone(),
    })?;

    if let Some(local_name) = &namespace.inject {
        file.items.insert(0, import_item(local_name));
    }

    Ok(prettyplease::unparse(&file))
}

/// How generated emission calls reference the runtime namespace.
struct EmissionNamespace {
    /// Prepended to every emission call: `"runtime::"`, an alias form, or
    /// empty for a glob import.
    call_prefix: String,
    /// Local name to bind with an injected import, when the author didn't
    /// import the namespace themselves.
    inject: Option<String>,
}

/// One name bound by a `use` item, in declaration order.
struct ImportRecord {
    path: String,
    name: String,
}

fn resolve_emission_namespace(file: &syn::File) -> EmissionNamespace {
    let imports = collect_imports(file);

    let mut imported_as: Option<&str> = None;
    for record in &imports {
        if record.path == RUNTIME_PATH && record.name != "_" {
            imported_as = Some(&record.name);
            break;
        }
    }

    if let Some(name) = imported_as {
        let call_prefix = if name == "*" {
            // Glob import: the emission function is already in scope.
            String::new()
        } else {
            format!("{name}::")
        };
        return EmissionNamespace {
            call_prefix,
            inject: None,
        };
    }

    // Not imported: pick an unused local name, numeric suffixes on collision.
    let taken: Vec<&str> = imports.iter().map(|record| record.name.as_str()).collect();
    let mut local_name = RUNTIME_NAME.to_string();
    let mut suffix = 0usize;
    while taken.contains(&local_name.as_str()) {
        local_name = format!("{RUNTIME_NAME}_{suffix}");
        suffix += 1;
    }
    EmissionNamespace {
        call_prefix: format!("{local_name}::"),
        inject: Some(local_name),
    }
}

/// Flatten every `use` item into `(path, bound name)` records.
///
/// Globs record the name `"*"`, underscore imports the name `"_"`. Leading
/// `::` is ignored so `use ::weft::runtime` matches the canonical path.
fn collect_imports(file: &syn::File) -> Vec<ImportRecord> {
    let mut records = Vec::new();
    for item in &file.items {
        if let syn::Item::Use(item_use) = item {
            flatten_use_tree(&item_use.tree, String::new(), &mut records);
        }
    }
    records
}

fn flatten_use_tree(tree: &syn::UseTree, prefix: String, records: &mut Vec<ImportRecord>) {
    let extend = |segment: &syn::Ident| {
        if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{prefix}::{segment}")
        }
    };
    match tree {
        syn::UseTree::Path(path) => {
            let next = extend(&path.ident);
            flatten_use_tree(&path.tree, next, records);
        }
        syn::UseTree::Name(name) => records.push(ImportRecord {
            path: extend(&name.ident),
            name: name.ident.to_string(),
        }),
        syn::UseTree::Rename(rename) => records.push(ImportRecord {
            path: extend(&rename.ident),
            name: rename.rename.to_string(),
        }),
        syn::UseTree::Glob(_) => records.push(ImportRecord {
            path: prefix,
            name: "*".to_string(),
        }),
        syn::UseTree::Group(group) => {
            for item in &group.items {
                flatten_use_tree(item, prefix.clone(), records);
            }
        }
    }
}

/// Reassemble the full source: code verbatim, literals as emission calls.
///
/// Sections are separated by newlines rather than semicolons — a stray `;`
/// is a parse error at item level in Rust — and every emission statement
/// terminates itself.
pub(crate) fn rewrite(sections: &[Section], call_prefix: &str) -> String {
    let mut out = String::new();
    for section in sections {
        match section.kind {
            SectionKind::Code => {
                out.push_str(&section.text);
                out.push('\n');
            }
            SectionKind::Literal => {
                for piece in raw_pieces(&section.text) {
                    out.push_str(call_prefix);
                    out.push_str(EMIT_FN);
                    out.push('(');
                    out.push_str(&piece);
                    out.push_str(");\n");
                }
            }
        }
    }
    out
}

/// Split literal text into Rust literal tokens: raw strings for runs between
/// `"` occurrences, a char literal for each `"` itself.
pub(crate) fn raw_pieces(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut from = 0;
    for (pos, ch) in text.char_indices() {
        if ch == '"' {
            if pos != from {
                pieces.push(format!("r\"{}\"", &text[from..pos]));
            }
            pieces.push("'\"'".to_string());
            from = pos + 1;
        }
    }
    if from != text.len() {
        pieces.push(format!("r\"{}\"", &text[from..]));
    }
    pieces
}

fn import_item(local_name: &str) -> syn::Item {
    let declaration = if local_name == RUNTIME_NAME {
        format!("use {RUNTIME_PATH};")
    } else {
        format!("use {RUNTIME_PATH} as {local_name};")
    };
    // The declaration is assembled from fixed text and a vetted identifier;
    // it always parses.
    let item_use: syn::ItemUse = syn::parse_str(&declaration)
        .unwrap_or_else(|err| panic!("synthesized import {declaration:?} did not parse: {err}"));
    syn::Item::Use(item_use)
}
