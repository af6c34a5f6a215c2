use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

fn create_spinner(message: String) -> ProgressBar {
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/"])
        .template("{msg} {spinner}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(style);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Await `task` behind a spinner, clearing it once the task settles.
pub async fn with_spinner<F: Future>(message: String, task: F) -> F::Output {
    let spinner = create_spinner(message);
    let output = task.await;
    spinner.finish_and_clear();
    output
}
