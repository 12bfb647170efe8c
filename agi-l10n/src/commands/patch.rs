//! Binary patch commands

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;
use std::path::{Path, PathBuf};

use agi_delta::{DiffOptions, PatchFile, PatchSet};
use agi_resource::fs::{replace_atomically, write_atomically};

use crate::utils::{
    add_table_row, create_spinner, create_table, format_bytes, format_patch_ratio,
};

#[derive(Subcommand)]
pub enum PatchCommands {
    /// Create a patch turning one file into another
    Create {
        /// Untouched original file
        original: PathBuf,

        /// Translated file
        modified: PathBuf,

        /// Patch file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Shortest run of bytes reused from the original
        #[arg(long, default_value_t = 8)]
        window: usize,
    },

    /// Apply a patch to a file
    Apply {
        /// File the patch was made against
        original: PathBuf,

        /// Patch file
        patch: PathBuf,

        /// Where to write the result; the original is replaced when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create patches for every changed file of a game directory
    CreateSet {
        /// Untouched game directory
        original: PathBuf,

        /// Translated game directory
        modified: PathBuf,

        /// Directory to write the .agip files to
        #[arg(short, long)]
        output: PathBuf,

        /// Shortest run of bytes reused from the original
        #[arg(long, default_value_t = 8)]
        window: usize,
    },

    /// Apply a directory of patches to a game directory
    ApplySet {
        /// Untouched game directory
        original: PathBuf,

        /// Directory holding the .agip files
        patches: PathBuf,

        /// Directory to write the patched files to
        #[arg(short, long)]
        output: PathBuf,
    },
}

pub fn execute(command: PatchCommands) -> Result<()> {
    match command {
        PatchCommands::Create {
            original,
            modified,
            output,
            window,
        } => execute_create(original, modified, output, window),
        PatchCommands::Apply {
            original,
            patch,
            output,
        } => execute_apply(original, patch, output),
        PatchCommands::CreateSet {
            original,
            modified,
            output,
            window,
        } => execute_create_set(original, modified, output, window),
        PatchCommands::ApplySet {
            original,
            patches,
            output,
        } => execute_apply_set(original, patches, output),
    }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn execute_create(
    original: PathBuf,
    modified: PathBuf,
    output: PathBuf,
    window: usize,
) -> Result<()> {
    let source = read(&original)?;
    let target = read(&modified)?;

    let patch = PatchFile::create(&source, &target, &DiffOptions::default().with_window(window))
        .with_context(|| format!("Failed to diff {}", modified.display()))?;
    let bytes = patch.to_bytes()?;
    write_atomically(&output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} {} ({} instructions, {} literal bytes, {} of the output)",
        style("✓").green(),
        style(output.display()).cyan(),
        patch.record.len(),
        patch.record.inserted_len(),
        format_patch_ratio(bytes.len() as u64, target.len() as u64)
    );
    Ok(())
}

fn execute_apply(original: PathBuf, patch: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let patch_path = patch;
    let patch = PatchFile::parse(&read(&patch_path)?)
        .with_context(|| format!("Failed to parse {}", patch_path.display()))?;

    match output {
        Some(output) => {
            let patched = patch
                .apply(&read(&original)?)
                .with_context(|| format!("Failed to patch {}", original.display()))?;
            write_atomically(&output, &patched)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{} Wrote {}", style("✓").green(), output.display());
        }
        None => {
            replace_atomically(&original, |data| -> Result<Vec<u8>> { Ok(patch.apply(data)?) })
                .with_context(|| format!("Failed to patch {}", original.display()))?;
            println!("{} Patched {}", style("✓").green(), original.display());
        }
    }
    Ok(())
}

fn execute_create_set(
    original: PathBuf,
    modified: PathBuf,
    output: PathBuf,
    window: usize,
) -> Result<()> {
    let spinner = create_spinner("Diffing game files...");
    let set = PatchSet::build_with(
        &original,
        &modified,
        &DiffOptions::default().with_window(window),
    )
    .with_context(|| {
        format!(
            "Failed to diff {} against {}",
            modified.display(),
            original.display()
        )
    });
    spinner.finish_and_clear();
    let set = set?;

    if set.is_empty() {
        println!("No differences between the two directories");
        return Ok(());
    }

    let written = set
        .write_to(&output)
        .with_context(|| format!("Failed to write patches to {}", output.display()))?;

    let mut table = create_table(&["File", "Instructions", "Literal", "Output"]);
    for entry in set.entries() {
        add_table_row(
            &mut table,
            vec![
                entry.path.display().to_string(),
                entry.patch.record.len().to_string(),
                format_bytes(entry.patch.record.inserted_len() as u64),
                format_bytes(entry.patch.record.output_len() as u64),
            ],
        );
    }
    table.printstd();

    for path in set.unmatched() {
        println!(
            "{} {} has no original and was not patched",
            style("!").yellow(),
            path.display()
        );
    }
    println!(
        "{} Wrote {} patches to {} ({} files unchanged)",
        style("✓").green(),
        written.len(),
        style(output.display()).cyan(),
        set.unchanged().len()
    );
    Ok(())
}

fn execute_apply_set(original: PathBuf, patches: PathBuf, output: PathBuf) -> Result<()> {
    let set = PatchSet::read_from(&patches)
        .with_context(|| format!("Failed to read patches from {}", patches.display()))?;
    let written = set
        .apply_to(&original, &output)
        .with_context(|| format!("Failed to patch {}", original.display()))?;
    println!(
        "{} Patched {} files into {}",
        style("✓").green(),
        written.len(),
        style(output.display()).cyan()
    );
    Ok(())
}
