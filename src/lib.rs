//! # weft
//!
//! An ahead-of-time template compiler: PHP-style "code inside markup"
//! authoring, but for Rust. Templates interleave literal markup with embedded
//! Rust code and are expanded once, at build time, into ordinary `.rs` source
//! files for `rustc` — nothing is interpreted at runtime.
//!
//! ```text
//! <?code
//! use weft::runtime;
//! fn main() { ?>
//! <h1>Hello</h1>
//! <?insert footer.wt ?>
//! <?code runtime::send_cgi(&mut std::io::stdout()).unwrap(); } ?>
//! ```
//!
//! # Architecture: Three-Stage Pipeline
//!
//! Each template compiles through three independent stages, every stage a
//! function over an ordered list of sections:
//!
//! ```text
//! 1. Scan      template.wt  →  Vec<Section>   (tags split, inserts expanded)
//! 2. Assemble  sections     →  sections       (boundary whitespace normalized)
//! 3. Synth     sections     →  String         (Rust source, parsed + formatted)
//! ```
//!
//! The stages share no mutable state: each compilation owns its section
//! list, its inclusion stack, and its namespace resolution, so a batch of
//! top-level templates can compile in parallel.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1 — splits a template into sections, recursing into `<?insert ?>` children |
//! | [`assemble`] | Stage 2 — trims, merges, and drops sections so tag boundaries don't leak blank lines |
//! | [`synth`] | Stage 3 — probes the user's imports, wraps literals in emission calls, parses and formats via syn/prettyplease |
//! | [`pattern`] | Rolling delimiter matcher used by the scanner |
//! | [`resolve`] | Insertion references → physical files; file-identity cycle detection |
//! | [`compile`] | One-call pipeline: template path in, Rust source out |
//! | [`config`] | `weft.toml` loading and defaults |
//! | [`runtime`] | Buffered output + CGI response assembly for *generated* programs |
//! | [`types`] | The `Section` list every stage speaks |
//!
//! # Design Decisions
//!
//! ## The host compiler is the validator
//!
//! weft never parses Rust itself. The user's code sections are handed to
//! [`syn`] — once alone, to discover imports, and once as part of the fully
//! rewritten file — and the result is printed by [`prettyplease`]. Syntax
//! errors come back verbatim with the exact source the compiler generated,
//! so authors debug what actually failed to parse.
//!
//! ## File identity, not path strings
//!
//! Insertion cycles are detected by comparing device+inode handles, because
//! lexically different references can name the same file through symlinks.
//! The full inclusion stack is part of the cycle diagnostic.
//!
//! ## Whitespace rules are ordered and observable
//!
//! Templates put tags on their own lines; without normalization every tag
//! boundary would emit a stray blank line. The assembler's six rules run in
//! a fixed order that generated output depends on — see [`assemble`].

pub mod assemble;
pub mod compile;
pub mod config;
pub mod pattern;
pub mod resolve;
pub mod runtime;
pub mod scan;
pub mod synth;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
