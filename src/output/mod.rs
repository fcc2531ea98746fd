//! Output module for reporting tally results
//!
//! The core hands over a single integer; this module words it for the
//! terminal together with the selection and mode it was computed for.

mod summary;

pub use summary::RunSummary;

/// Prints a summary to stdout
///
/// # Arguments
///
/// * `summary` - The finished tally
/// * `verbose` - Whether to include crawl statistics
pub fn print_summary(summary: &RunSummary, verbose: bool) {
    print!("{}", summary.render(verbose));
}
