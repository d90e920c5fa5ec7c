// src/main.rs
#![forbid(unsafe_code)]

mod rollout;

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::rollout::{NoopSink, RolloutSink, Runner, RunnerConfig, TableSink};

#[derive(Parser, Debug)]
#[command(name = "mario_cli")]
struct Args {
    // ---------------- rollout sizing ----------------
    /// Episodes to run (each on a freshly generated world).
    #[arg(long, default_value_t = 20)]
    episodes: u64,

    /// Per-episode decision-cycle cap.
    #[arg(long, default_value_t = 400)]
    max_steps: u64,

    /// Base RNG seed (episodes use base_seed + episode_id). If omitted, a
    /// fixed default is used.
    #[arg(long)]
    seed: Option<u64>,

    // ---------------- world ----------------
    /// Generated world length in tiles.
    #[arg(long, default_value_t = 160)]
    world_len: usize,

    /// Stage number reported to the agent (2 enables the stage-2 dash
    /// rules).
    #[arg(long, default_value_t = 1)]
    stage: u32,

    // ---------------- agent pacing ----------------
    /// Settle delay between actuator calls, in ms. 0 runs full speed.
    #[arg(long, default_value_t = 0)]
    settle_ms: u64,

    // ---------------- visualization ----------------
    /**
     * Render the screen window as ASCII every step; value is sleep in ms
     * (e.g. 30). Omit to disable rendering.
     */
    #[arg(long, value_name = "ms")]
    render: Option<u64>,

    // ---------------- output / reporting ----------------
    /// Verbosity: 0=silent (final summary only), 1=progress bar,
    /// 2=progress bar + periodic table.
    #[arg(long, default_value_t = 1)]
    verbosity: u8,

    /// Print a table row every N steps (only used with --verbosity 2).
    #[arg(long, default_value_t = 500)]
    report_every: u64,

    /// Write the final report (including the last status) as JSON.
    #[arg(long)]
    results: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let base_seed = args.seed.unwrap_or(12345);
    tracing::info!(
        episodes = args.episodes,
        seed = base_seed,
        stage = args.stage,
        "starting rollout"
    );

    // Rollout configuration (data only; no logic).
    let cfg = RunnerConfig {
        episodes: args.episodes,
        max_steps: args.max_steps,
        base_seed,

        world_len: args.world_len,
        stage: args.stage,

        settle_ms: args.settle_ms,

        verbosity: args.verbosity,
        report_every: args.report_every,
        render_ms: args.render,
    };

    // Reporting sink:
    // - verbosity 2 => periodic table (unless report_every == 0)
    // - otherwise   => no-op
    let sink: Box<dyn RolloutSink> = if cfg.verbosity >= 2 && cfg.report_every > 0 {
        Box::new(TableSink::new(20))
    } else {
        Box::new(NoopSink)
    };

    let mut runner = Runner::new(cfg, sink);
    let report = runner.run();

    if let Some(path) = args.results {
        let json = serde_json::to_string_pretty(&report).context("serializing results")?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    // Final one-line summary (useful for logs / grep).
    println!(
        "DONE: stage={} seed={} episodes={} steps_done={} elapsed={:.3}s steps/s={:.1} clear={} die={} timeout={} clear_rate={:.2} stalls={} avg_ep_len={:.2} max_ep_len={} avg_x={:.1} best_x={}",
        report.stage,
        report.base_seed,
        report.episodes_finished,
        report.steps_done,
        report.elapsed_s,
        report.steps_per_s,
        report.completions,
        report.deaths,
        report.timeouts,
        report.completion_rate,
        report.maneuver_stalls,
        report.avg_ep_len,
        report.max_ep_len,
        report.avg_final_x,
        report.best_x,
    );

    Ok(())
}
