//! Checkpoint a small simulation, resume it, and validate the result.
//!
//! Run with: cargo run --example checkpoint
//! Set `RUST_LOG=bitplist=debug` to see every diagnostic.

use bitplist::{from_str, parse_with_diagnostics, to_string_pretty, to_value, DiffOptions, Differ};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Body {
    position: f64,
    velocity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Oscillators {
    step: u32,
    dt: f64,
    bodies: Vec<Body>,
}

impl Oscillators {
    fn new(count: usize) -> Self {
        Oscillators {
            step: 0,
            dt: 0.01,
            bodies: (0..count)
                .map(|i| Body {
                    position: 1.0 + i as f64 / 10.0,
                    velocity: 0.0,
                })
                .collect(),
        }
    }

    fn advance(&mut self, steps: u32) {
        for _ in 0..steps {
            for body in &mut self.bodies {
                body.velocity -= body.position * self.dt;
                body.position += body.velocity * self.dt;
            }
            self.step += 1;
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bitplist=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run, checkpoint halfway, and keep going.
    let mut reference = Oscillators::new(8);
    reference.advance(500);
    let checkpoint = to_string_pretty(&reference)?;
    reference.advance(500);

    // Resume from the checkpoint text.
    let mut resumed: Oscillators = from_str(&checkpoint)?;
    resumed.advance(500);
    assert_eq!(reference, resumed);
    println!("Resumed run matches bit for bit at step {}", resumed.step);

    // A run with a slightly different time step drifts.
    let mut drifted = Oscillators::new(8);
    drifted.dt += 1e-15;
    drifted.advance(1000);

    let report = Differ::new(DiffOptions::new().with_verbose(true).with_max_repeats(3)).diff(
        to_value(&reference)?.as_dict().ok_or("reference is not a dict")?,
        to_value(&drifted)?.as_dict().ok_or("candidate is not a dict")?,
        &HashSet::new(),
    );
    println!(
        "Drifted run: {} issues ({} rounding noise, {} major)",
        report.issues,
        report.minor_issues(),
        report.major_issues()
    );

    // Damaged checkpoints still load what they can.
    let damaged = &checkpoint[..checkpoint.len() / 2];
    let (partial, warnings) = parse_with_diagnostics(damaged);
    println!(
        "Truncated checkpoint: {} top-level keys recovered, {} warnings",
        partial.len(),
        warnings.len()
    );

    Ok(())
}
