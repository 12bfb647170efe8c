//! Formatting utilities

use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Size of a patch relative to the file it produces
pub fn format_patch_ratio(patch: u64, output: u64) -> String {
    if output == 0 {
        return "N/A".to_string();
    }
    format!("{:.1}%", patch as f64 / output as f64 * 100.0)
}

/// Format a directory offset the way hex editors show it
pub fn format_offset(offset: u32) -> String {
    format!("{offset:#07X}")
}
