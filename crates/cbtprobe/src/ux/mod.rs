mod presenter;
mod reporter;

pub use presenter::{banner, format_summary};
pub use reporter::ConsoleReporter;

use console::style;

pub fn present_error(error: anyhow::Error) {
    let error_text = style("ERROR:").red().bold();
    eprintln!("\n{error_text} {error:#}");
}
