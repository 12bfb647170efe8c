//! Component level tests

pub mod diff_apply;
pub mod patch_file;
