use indexmap::IndexMap;
use rusty_mooring::{LineError, LineSummary, Units};
use std::fmt::Write;

/// Render a textual summary of a solved mooring system.
///
/// Lines appear in configuration order. Lines without an equilibrium are listed
/// with the reason so the remaining results can still be read.
#[must_use]
pub fn render_summary(
    units: Units,
    summaries: &IndexMap<String, Result<LineSummary, LineError>>,
) -> String {
    let length = units.length_symbol();
    let force = units.force_symbol();
    let mut output = String::new();

    writeln!(
        &mut output,
        "Static mooring analysis ({} line(s))",
        summaries.len()
    )
    .expect("writing to string cannot fail");

    for (name, summary) in summaries {
        match summary {
            Ok(summary) => {
                writeln!(
                    &mut output,
                    "{name}: length = {:.1} {length}, anchor = {:.1} {force}, fairlead = {:.1} {force}, max = {:.1} {force}, H = {:.1} {force} ({} iterations)",
                    summary.length,
                    summary.bottom_tension,
                    summary.top_tension,
                    summary.max_tension,
                    summary.horizontal_force,
                    summary.iterations
                )
                .expect("writing to string cannot fail");
            }
            Err(error) => {
                writeln!(&mut output, "{name}: FAILED ({error})")
                    .expect("writing to string cannot fail");
            }
        }
    }

    output
}
