//! End-to-end shower simulation example.
//!
//! Demonstrates: build source and pipeline → attach an output channel →
//! population run with progress → drain records → summary. Press Ctrl-C
//! during the run to see cooperative cancellation; the signal is re-raised
//! once the workers drain.
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use cascade_bench::{reference_source, shower_list};
use cascade_engine::{CancelToken, Propagation, RunConfig};
use cascade_modules::{ChannelOutput, OutputTrigger};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let source = reference_source(42).expect("reference source");
    let (output, records) = ChannelOutput::unbounded(OutputTrigger::OnDeactivation);
    let mut list = shower_list(10.0).expect("shower pipeline").with(output);
    list.set_show_progress(true);
    list.show_modules();

    let config = RunConfig::default().with_chunk_size(50);
    let token = CancelToken::new();
    let summary = list
        .run_source(&source, 20_000, Propagation::default(), &config, &token)
        .expect("valid config");

    let mut count = 0usize;
    let mut weight = 0.0;
    let mut energy = 0.0;
    for record in records.try_iter() {
        count += 1;
        weight += record.weight;
        energy += record.weight * record.current.energy();
    }

    tracing::info!(
        completed = summary.completed,
        interrupted = summary.interrupted,
        failed = summary.failed,
        skipped = summary.skipped,
        state = ?summary.state,
        "run finished"
    );
    println!("terminal candidates: {count}");
    println!("total weight:        {weight:.3}");
    println!("weighted energy:     {energy:.3}");
}
