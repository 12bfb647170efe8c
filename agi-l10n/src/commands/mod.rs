//! Command implementations for each game file

pub mod check;
pub mod dir;
pub mod logic;
pub mod object;
pub mod patch;
pub mod view;
pub mod vol;
pub mod words;

use agi_resource::ResourceKind;
use clap::ValueEnum;

/// Resource kind as given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Logic,
    Picture,
    View,
    Sound,
}

impl From<KindArg> for ResourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Logic => ResourceKind::Logic,
            KindArg::Picture => ResourceKind::Picture,
            KindArg::View => ResourceKind::View,
            KindArg::Sound => ResourceKind::Sound,
        }
    }
}

/// The kinds selected by an optional `--kind` flag
pub fn selected_kinds(kind: Option<KindArg>) -> Vec<ResourceKind> {
    match kind {
        Some(kind) => vec![kind.into()],
        None => ResourceKind::ALL.to_vec(),
    }
}
