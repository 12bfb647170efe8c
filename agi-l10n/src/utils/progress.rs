//! Progress output on stderr, silent under `--quiet`

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";

/// `--quiet` leaves only errors enabled
fn quiet() -> bool {
    log::max_level() <= log::LevelFilter::Error
}

/// Progress bar over `total` resources
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    if quiet() {
        return ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden());
    }
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    ProgressBar::new(total)
        .with_style(style)
        .with_message(message.to_string())
}

/// Spinner for work of unknown length
pub fn create_spinner(message: &str) -> ProgressBar {
    if quiet() {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::with_template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let pb = ProgressBar::new_spinner()
        .with_style(style)
        .with_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
