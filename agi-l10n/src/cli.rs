//! Root CLI structure for agi-l10n

use clap::{Parser, Subcommand};

use crate::game::GameOptions;

#[derive(Parser)]
#[command(name = "agi-l10n")]
#[command(about = "Command-line tools for translating Sierra AGI games", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Code page of the game's text (any WHATWG encoding label)
    #[arg(
        long,
        global = true,
        env = "AGI_CHARSET",
        default_value = "windows-1255",
        value_name = "LABEL"
    )]
    pub charset: String,

    /// The game uses v3 resources (combined directory, prefixed volumes)
    #[arg(long, global = true)]
    pub v3: bool,

    /// Block signature of the volumes as four hex digits
    #[arg(long, global = true, default_value = "1234", value_name = "HEX")]
    pub signature: String,
}

impl Cli {
    /// Game settings shared by every resource command
    pub fn game_options(&self) -> anyhow::Result<GameOptions> {
        GameOptions::new(&self.charset, self.v3, &self.signature)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resource directory operations
    Dir {
        #[command(subcommand)]
        command: crate::commands::dir::DirCommands,
    },

    /// Volume operations
    Vol {
        #[command(subcommand)]
        command: crate::commands::vol::VolCommands,
    },

    /// Logic message operations
    Logic {
        #[command(subcommand)]
        command: crate::commands::logic::LogicCommands,
    },

    /// Inventory object operations
    Object {
        #[command(subcommand)]
        command: crate::commands::object::ObjectCommands,
    },

    /// Parser vocabulary operations
    Words {
        #[command(subcommand)]
        command: crate::commands::words::WordsCommands,
    },

    /// Inventory description operations
    View {
        #[command(subcommand)]
        command: crate::commands::view::ViewCommands,
    },

    /// Audits of translated text
    Check {
        #[command(subcommand)]
        command: crate::commands::check::CheckCommands,
    },

    /// Binary patch operations
    Patch {
        #[command(subcommand)]
        command: crate::commands::patch::PatchCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
