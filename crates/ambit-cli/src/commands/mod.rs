pub mod adaptive;
pub mod config;
pub mod directions;
pub mod explore;
pub mod status;

use anyhow::Result;
use serde::Serialize;

use ambit_explore::Candidate;

/// Print a result as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a numbered candidate list, indented under a heading.
pub fn print_candidates(candidates: &[Candidate], indent: &str) {
    if candidates.is_empty() {
        println!("{indent}(none)");
        return;
    }
    for (i, candidate) in candidates.iter().enumerate() {
        let delta = candidate
            .delta
            .map(|delta| format!(", {delta:+.3}"))
            .unwrap_or_default();
        println!(
            "{indent}{:>2}. {} (distance {:.4}{delta})",
            i + 1,
            candidate.track,
            candidate.distance
        );
    }
}
