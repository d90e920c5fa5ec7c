// src/rollout/runner.rs
#![forbid(unsafe_code)]

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use mario_agent::{AgentConfig, Environment, ExpertAgent, GameStatus, SimWorld};

use super::sinks::{ReportRow, RolloutSink};
use super::stats::{FinalReport, RolloutStats};

/// Fixed internal cadence for progress-bar live message updates.
/// (No CLI knob on purpose.)
const LIVE_EVERY: u64 = 50;

#[derive(Clone, Debug)]
pub struct RunnerConfig {
    // ---------------- core rollout ----------------
    /// Episodes to run; each uses base_seed + episode_id.
    pub episodes: u64,
    /// Per-episode decision-cycle cap (stuck agents otherwise run the
    /// level timer down).
    pub max_steps: u64,
    pub base_seed: u64,

    // ---------------- world ----------------
    pub world_len: usize,
    pub stage: u32,

    // ---------------- agent ----------------
    /// Settle delay between actuator calls, in ms (0 for full speed).
    pub settle_ms: u64,

    // ---------------- output ----------------
    /// 0 = final summary only
    /// 1 = progress bar
    /// 2 = progress bar + periodic table (via sink)
    pub verbosity: u8,

    /// Print a table row every N steps (only used when verbosity == 2).
    /// 0 disables table reporting.
    pub report_every: u64,

    // ---------------- rendering ----------------
    /// If Some(ms): render the window every step; sleep ms between frames.
    pub render_ms: Option<u64>,
}

pub struct Runner {
    cfg: RunnerConfig,
    sink: Box<dyn RolloutSink>,
}

impl Runner {
    pub fn new(cfg: RunnerConfig, sink: Box<dyn RolloutSink>) -> Self {
        Self { cfg, sink }
    }

    pub fn run(&mut self) -> FinalReport {
        let cfg = self.cfg.clone();

        // Progress bar is UI only; runner logic does not depend on it.
        let pb = if cfg.verbosity >= 1 {
            let pb = ProgressBar::new(cfg.episodes * cfg.max_steps);
            pb.set_style(
                ProgressStyle::with_template(
                    "{bar:40.cyan/blue} {pos:>9}/{len:<9}  {percent:>3}%  {elapsed_precise}  {msg}",
                )
                .unwrap()
                .progress_chars("=>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut stats = RolloutStats::new();
        let mut last_status = GameStatus::default();

        for episode in 0..cfg.episodes {
            let world = SimWorld::generate(
                cfg.base_seed.wrapping_add(episode),
                cfg.world_len,
                cfg.stage,
            );
            let agent_cfg = AgentConfig {
                settle: Duration::from_millis(cfg.settle_ms),
                ..AgentConfig::default()
            };
            let mut agent = ExpertAgent::with_config(world, agent_cfg);

            if cfg.render_ms.is_some() {
                println!("=== episode {episode} ===");
                print!("{}", agent.env_mut().sample_grid().render_ascii());
            }

            let mut steps_this_ep = 0u64;
            while !agent.is_over() && steps_this_ep < cfg.max_steps {
                let report = agent.step();
                stats.on_step(&report);
                steps_this_ep += 1;

                if let Some(ref pb) = pb {
                    pb.inc(1);
                }

                if let Some(ms) = cfg.render_ms {
                    println!(
                        "ep={} step={} rule={} action={}",
                        episode,
                        steps_this_ep,
                        report.rule,
                        report.action.glyph(),
                    );
                    print!("{}", agent.env_mut().sample_grid().render_ascii());
                    if ms > 0 {
                        std::thread::sleep(Duration::from_millis(ms));
                    }
                }

                // ------------------------------------------------------------
                // Periodic table report (verbosity == 2 only).
                // ------------------------------------------------------------
                if cfg.verbosity == 2
                    && cfg.report_every > 0
                    && (stats.steps_done % cfg.report_every == 0)
                {
                    let row = ReportRow {
                        episode,
                        episodes_total: cfg.episodes,
                        step: stats.steps_done,
                        sps: stats.steps_per_sec(),
                        completions: stats.completions,
                        deaths: stats.deaths,
                        stalls: stats.stalls,
                        avg_ep_len: stats.avg_ep_len(),
                        avg_final_x: stats.avg_final_x(),
                        best_x: stats.best_x,
                    };
                    self.sink.on_report_row(&row, pb.as_ref());
                }

                if cfg.verbosity >= 1 && (stats.steps_done % LIVE_EVERY == 0) {
                    if let Some(ref pb) = pb {
                        pb.set_message(stats.live_msg());
                    }
                }
            }

            let status = agent.status();
            let completed = agent.env().completed();
            stats.on_episode_end(&status, completed);
            last_status = status;

            if cfg.render_ms.is_some() {
                println!(
                    "=== episode {} done: cleared={} dead={} x={} steps={} ===",
                    episode, completed, last_status.dead, last_status.x_position, steps_this_ep,
                );
            }
        }

        if let Some(pb) = pb {
            pb.finish_with_message("done");
        }

        stats.final_report(cfg.stage, cfg.base_seed, last_status)
    }
}
