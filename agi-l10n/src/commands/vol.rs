//! Volume commands

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use agi_resource::{Compression, ResourceKind};

use crate::commands::KindArg;
use crate::game::{Game, GameOptions};
use crate::utils::{add_table_row, create_progress_bar, create_table, format_bytes};

#[derive(Subcommand)]
pub enum VolCommands {
    /// Extract decompressed resources from the volumes
    Extract {
        /// Path to the game directory
        game: PathBuf,

        /// Kind of resource to extract
        #[arg(value_enum)]
        kind: KindArg,

        /// Resource number; every resource of the kind when omitted
        number: Option<usize>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Print a table of the extracted resources
        #[arg(short, long)]
        long: bool,
    },
}

pub fn execute(command: VolCommands, options: &GameOptions) -> Result<()> {
    match command {
        VolCommands::Extract {
            game,
            kind,
            number,
            output,
            long,
        } => execute_extract(game, kind.into(), number, output, long, options),
    }
}

fn execute_extract(
    path: PathBuf,
    kind: ResourceKind,
    number: Option<usize>,
    output: PathBuf,
    long: bool,
    options: &GameOptions,
) -> Result<()> {
    let game = Game::open(&path, options)?;
    let numbers: Vec<usize> = match number {
        Some(number) => vec![number],
        None => game
            .directory(kind)
            .iter_present()
            .map(|(number, _, _)| number)
            .collect(),
    };
    if numbers.is_empty() {
        println!("No {kind} resources in {}", path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let mut table = create_table(&["Resource", "Volume", "Size", "Stored", "Compression"]);
    let pb = create_progress_bar(numbers.len() as u64, "Extracting resources");
    for number in numbers {
        let Some(resource) = game.read_resource(kind, number)? else {
            pb.finish_and_clear();
            bail!("{kind} {number} is not in the directory");
        };
        let target = output.join(file_name(kind, number));
        write_payload(&target, resource.payload())?;

        add_table_row(
            &mut table,
            vec![
                format!("{kind}.{number}"),
                resource.volume().to_string(),
                format_bytes(resource.payload().len() as u64),
                format_bytes(resource.stored().len() as u64),
                compression_name(resource.compression()).to_string(),
            ],
        );
        pb.inc(1);
    }
    pb.finish_and_clear();

    if long {
        table.printstd();
    }
    println!("Extracted {} resources to {}", table.len(), output.display());
    Ok(())
}

fn file_name(kind: ResourceKind, number: usize) -> String {
    format!("{kind}.{number:03}")
}

fn write_payload(target: &Path, payload: &[u8]) -> Result<()> {
    std::fs::write(target, payload).with_context(|| format!("Failed to write {}", target.display()))
}

fn compression_name(compression: Compression) -> &'static str {
    match compression {
        Compression::None => "none",
        Compression::Lzw => "lzw",
        Compression::Picture => "picture",
    }
}
