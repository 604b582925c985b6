mod report;

use report::render_summary;
use rusty_mooring::MooringSystem;
use std::env;
use std::error::Error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing()?;

    let mut args = env::args().skip(1);
    let path = args
        .next()
        .ok_or("usage: rusty-mooring <config.toml> [--json]")?;
    let json = args.any(|arg| arg == "--json");

    let system = MooringSystem::from_file(&path)?;

    // The JSON dump needs every line, so it uses the fail policy.
    if json {
        let results = system.solve_static()?;
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    // The report keeps going past failed lines and lists them.
    let summaries = system.summarize();
    println!(
        "{}",
        render_summary(system.config().general().units, &summaries)
    );

    let failures = summaries.values().filter(|summary| summary.is_err()).count();
    if failures > 0 {
        return Err(format!("{failures} line(s) have no static equilibrium").into());
    }
    Ok(())
}

/// Install the stderr log subscriber, filtered by `RUST_LOG` (default `info`).
fn init_tracing() -> Result<(), Box<dyn Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
