//! ACP Run Trace Demo CLI
//!
//! Records a simulated agent run through the `RunRecorder` and exports the
//! trace as JSON, or reads an exported trace back and validates it.
//!
//! Usage:
//!   cargo run -p demo -- record --steps 3
//!   cargo run -p demo -- record --config recorder.toml --out trace.json
//!   cargo run -p demo -- inspect trace.json

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use acp_contracts::{
    clock,
    error::{TraceError, TraceResult},
    run::{RunMeta, RunStatus},
    step::{AgentStep, Payload, StepPhase, StepStatus},
};
use acp_trace::{content_address, InMemoryTraceSink, RecorderConfig, RunRecorder, TraceLog};

// ── CLI definition ────────────────────────────────────────────────────────────

/// ACP agent run trace recorder demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "ACP run trace demo",
    long_about = "Records a simulated agent run into a JSON trace, or validates\n\
                  and summarizes a previously exported trace."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a simulated run and export its trace.
    Record {
        /// Recorder configuration (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the trace here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Number of reason/tool/observe cycles before terminating.
        #[arg(long, default_value_t = 3)]
        steps: u32,
        #[arg(long)]
        seed: Option<i64>,
        #[arg(long, default_value_t = 0.0)]
        temperature: f64,
    },
    /// Validate an exported trace and print a summary.
    Inspect {
        /// Path to a JSON trace produced by `record`.
        path: PathBuf,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for per-step output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Record {
            config,
            out,
            steps,
            seed,
            temperature,
        } => run_record(config.as_deref(), out.as_deref(), steps, seed, temperature),
        Command::Inspect { path } => run_inspect(&path),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

// ── record ────────────────────────────────────────────────────────────────────

fn run_record(
    config_path: Option<&Path>,
    out: Option<&Path>,
    cycles: u32,
    seed: Option<i64>,
    temperature: f64,
) -> TraceResult<()> {
    let config = match config_path {
        Some(path) => RecorderConfig::from_file(path)?,
        None => RecorderConfig::default(),
    };

    let mut meta = RunMeta::new(
        RunMeta::generate_run_id(),
        "demo-0.1.0",
        "mock-llm",
        clock::now_secs(),
    )?
    .with_tools(["search", "calculator"])
    .with_temperature(temperature)?;
    meta.seed = seed;

    let sink = InMemoryTraceSink::new(meta.run_id.clone());
    let recorder = RunRecorder::new(meta, Box::new(sink.clone()), config)?;

    let mut memory: Vec<Value> = Vec::new();
    for cycle in 0..cycles {
        let question = format!("what is {} + {}?", cycle, cycle + 1);

        record_step(
            &recorder,
            StepPhase::Reason,
            json!({ "prompt": question }),
            json!({ "thought": "use the calculator", "tool": "calculator" }),
            StepStatus::Ok,
            &memory,
        )?;

        // Every other cycle the first tool call fails and is retried.
        if cycle % 2 == 1 {
            record_step(
                &recorder,
                StepPhase::Tool,
                json!({ "tool": "calculator", "args": { "a": cycle, "b": cycle + 1 } }),
                json!({ "error": "timeout" }),
                StepStatus::Retry,
                &memory,
            )?;
            record_step(
                &recorder,
                StepPhase::Retry,
                json!({ "attempt": 2 }),
                json!({}),
                StepStatus::Ok,
                &memory,
            )?;
        }

        record_step(
            &recorder,
            StepPhase::Tool,
            json!({ "tool": "calculator", "args": { "a": cycle, "b": cycle + 1 } }),
            json!({ "result": 2 * cycle + 1 }),
            StepStatus::Ok,
            &memory,
        )?;

        memory.push(json!({ "question": question, "answer": 2 * cycle + 1 }));
        record_step(
            &recorder,
            StepPhase::Observe,
            json!({ "result": 2 * cycle + 1 }),
            json!({ "remembered": true }),
            StepStatus::Ok,
            &memory,
        )?;
    }

    record_step(
        &recorder,
        StepPhase::Terminate,
        json!({ "answers": memory.len() }),
        json!({ "final": "all questions answered" }),
        StepStatus::Ok,
        &memory,
    )?;

    let meta = recorder.finish(RunStatus::Success, "all questions answered")?;
    info!(run_id = %meta.run_id, step_count = meta.step_count, "simulated run complete");

    let log = match sink.finalized_log()? {
        Some(log) => log,
        None => sink.export_log(&meta)?,
    };
    let text = log.to_json_pretty()?;

    match out {
        Some(path) => {
            std::fs::write(path, text).map_err(|e| TraceError::SinkWriteFailed {
                reason: format!("failed to write '{}': {}", path.display(), e),
            })?;
            println!(
                "Recorded run {} ({} steps) to {}",
                meta.run_id,
                meta.step_count,
                path.display()
            );
        }
        None => println!("{}", text),
    }

    Ok(())
}

/// Build the next step, attach a content address of the agent memory after
/// it, and hand it to the recorder.
fn record_step(
    recorder: &RunRecorder,
    phase: StepPhase,
    input: Value,
    output: Value,
    status: StepStatus,
    memory: &[Value],
) -> TraceResult<()> {
    let step = AgentStep::new(
        recorder.next_step_id()?,
        clock::now_secs(),
        phase,
        into_payload(input),
        into_payload(output),
    )?
    .with_status(status)
    .with_state_ref(content_address(memory)?);

    recorder.record(step)
}

fn into_payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Payload::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

// ── inspect ───────────────────────────────────────────────────────────────────

fn run_inspect(path: &Path) -> TraceResult<()> {
    let text = std::fs::read_to_string(path).map_err(|e| TraceError::Serialization {
        reason: format!("failed to read '{}': {}", path.display(), e),
    })?;
    let log = TraceLog::from_json(&text)?;
    let meta = &log.meta;

    println!("Run {}", meta.run_id);
    println!("  agent:       {} on {}", meta.agent_version, meta.llm);
    println!("  tools:       {}", meta.tools.join(", "));
    println!(
        "  sampling:    temperature {}, seed {}",
        meta.temperature,
        meta.seed.map_or_else(|| "none".to_string(), |s| s.to_string())
    );
    println!(
        "  status:      {} ({})",
        meta.status,
        meta.termination_reason.as_deref().unwrap_or("-")
    );
    println!(
        "  steps:       {} recorded, {} retained{}",
        meta.step_count,
        log.steps.len(),
        if meta.truncated { ", truncated" } else { "" }
    );
    println!();

    for step in &log.steps {
        println!(
            "  #{:<4} {:<9} {:<5} {}",
            step.step_id(),
            step.phase(),
            step.status(),
            step.state_ref().unwrap_or("-")
        );
    }

    Ok(())
}
