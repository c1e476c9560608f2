use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use weft::{compile, config};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Compile templates into Rust source files")]
#[command(long_about = "\
Compile templates into Rust source files

Templates interleave literal markup with embedded Rust code:

  <?code ... ?>      Rust code, spliced into the generated source
  <?insert x.wt ?>   child template, expanded in place

Each template compiles to a .rs file with the same base name, written next
to the template. Literal markup becomes runtime::print calls; the generated
program assembles a buffered CGI response via weft::runtime.

Insertion references resolve relative to the inserting template; references
starting with '/' resolve against the configured site root.

Run 'weft gen-config' to print a documented weft.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./weft.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base directory for absolute insertion references (overrides config)
    #[arg(long, global = true)]
    site_root: Option<PathBuf>,

    /// Merge adjacent literal sections into one emission call (overrides config)
    #[arg(long, global = true, overrides_with = "no_merge")]
    merge: bool,

    /// Keep every literal section as its own emission call
    #[arg(long, global = true)]
    no_merge: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Template files, or directories to walk recursively
    paths: Vec<PathBuf>,

    /// File containing one template path per line
    #[arg(long)]
    list: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Compile templates to Rust source files
    Build(InputArgs),
    /// Compile templates and discard the output (validation only)
    Check(InputArgs),
    /// Print a stock weft.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut build_config = config::load_config_or_default(cli.config.as_deref())?;
    if let Some(site_root) = &cli.site_root {
        build_config.site_root = site_root.clone();
    }
    if cli.merge {
        build_config.merge_literals = true;
    }
    if cli.no_merge {
        build_config.merge_literals = false;
    }

    match cli.command {
        Command::Build(inputs) => run_batch(&build_config, &inputs, true),
        Command::Check(inputs) => run_batch(&build_config, &inputs, false),
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(())
        }
    }
}

/// Compile every discovered template; one failure never stops the rest.
fn run_batch(
    build_config: &config::BuildConfig,
    inputs: &InputArgs,
    write_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let templates = discover_templates(build_config, inputs)?;
    if templates.is_empty() {
        return Err("no template files specified".into());
    }

    // Compilations are fully independent — own sections, own inclusion
    // stack — so the batch fans out across the rayon pool.
    let results: Vec<(PathBuf, Result<(), String>)> = templates
        .par_iter()
        .map(|template| {
            let result = compile_one(build_config, template, write_output);
            (template.clone(), result)
        })
        .collect();

    let mut failed = 0usize;
    for (template, result) in &results {
        match result {
            Ok(()) => {
                if write_output {
                    println!(
                        "{} -> {}",
                        template.display(),
                        output_path(template, &build_config.output_suffix).display()
                    );
                } else {
                    println!("{} ok", template.display());
                }
            }
            Err(message) => {
                failed += 1;
                eprintln!("{}: {message}", template.display());
            }
        }
    }

    println!("{} compiled, {} failed", results.len() - failed, failed);
    if failed > 0 {
        return Err(format!("{failed} template(s) failed").into());
    }
    Ok(())
}

fn compile_one(
    build_config: &config::BuildConfig,
    template: &Path,
    write_output: bool,
) -> Result<(), String> {
    let source = compile::compile(build_config, template).map_err(|err| err.to_string())?;
    if write_output {
        let output = output_path(template, &build_config.output_suffix);
        std::fs::write(&output, source)
            .map_err(|err| format!("cannot write {}: {err}", output.display()))?;
    }
    Ok(())
}

/// Same base name, different suffix, next to the template.
fn output_path(template: &Path, output_suffix: &str) -> PathBuf {
    template.with_extension(output_suffix)
}

/// Expand the CLI inputs into a concrete file list: files as given,
/// directories walked recursively and filtered by the template suffix, plus
/// a newline-delimited list file.
fn discover_templates(
    build_config: &config::BuildConfig,
    inputs: &InputArgs,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut templates = Vec::new();

    for path in &inputs.paths {
        if path.is_dir() {
            for entry in walkdir::WalkDir::new(path).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && has_suffix(entry.path(), build_config) {
                    templates.push(entry.path().to_path_buf());
                }
            }
        } else {
            // Explicitly named files skip the suffix filter.
            templates.push(path.clone());
        }
    }

    if let Some(list) = &inputs.list {
        let text = std::fs::read_to_string(list)
            .map_err(|err| format!("cannot read list {}: {err}", list.display()))?;
        for line in text.lines() {
            let line = line.trim();
            if !line.is_empty() {
                templates.push(PathBuf::from(line));
            }
        }
    }

    Ok(templates)
}

fn has_suffix(path: &Path, build_config: &config::BuildConfig) -> bool {
    path.extension()
        .is_some_and(|ext| ext == build_config.template_suffix.as_str())
}
