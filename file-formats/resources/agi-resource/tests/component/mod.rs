//! Level 2: Component Tests
//!
//! Round trips and properties of each codec over generated input.

pub mod compression;
pub mod directory;
pub mod logic;
pub mod object;
pub mod volume;
pub mod words;
