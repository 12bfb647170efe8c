//! End-to-end scenarios

pub mod game_directory;
