//! Level 3: Scenario Tests
//!
//! Translation workflows over game files on disk.

pub mod translate_game;
