// src/rollout/stats.rs
#![forbid(unsafe_code)]

use std::time::Instant;

use serde::Serialize;

use mario_agent::{CycleReport, GameStatus, ManeuverOutcome};

#[derive(Clone, Debug)]
pub struct RolloutStats {
    pub episodes_finished: u64,
    pub ep_len: u64,
    pub episode_len_sum: u64,
    pub episode_len_max: u64,

    pub steps_done: u64,

    pub completions: u64,
    pub deaths: u64,
    pub timeouts: u64,

    pub maneuvers: u64,
    pub stalls: u64,

    /// Indexed by `Action::idx()`.
    pub action_counts: [u64; 6],

    pub sum_final_x: f64,
    pub best_x: u32,

    t0: Instant,
}

impl RolloutStats {
    pub fn new() -> Self {
        Self {
            episodes_finished: 0,
            ep_len: 0,
            episode_len_sum: 0,
            episode_len_max: 0,
            steps_done: 0,
            completions: 0,
            deaths: 0,
            timeouts: 0,
            maneuvers: 0,
            stalls: 0,
            action_counts: [0; 6],
            sum_final_x: 0.0,
            best_x: 0,
            t0: Instant::now(),
        }
    }

    /// Call once per decision cycle.
    pub fn on_step(&mut self, report: &CycleReport) {
        self.steps_done += 1;
        self.ep_len += 1;
        self.action_counts[report.action.idx() as usize] += 1;

        if let Some((_, outcome)) = report.maneuver {
            self.maneuvers += 1;
            if matches!(outcome, ManeuverOutcome::Stalled { .. }) {
                self.stalls += 1;
            }
        }
    }

    /// Call when an episode ends (cleared, died, or hit the step cap).
    pub fn on_episode_end(&mut self, status: &GameStatus, completed: bool) {
        self.episodes_finished += 1;
        self.episode_len_sum += self.ep_len;
        self.episode_len_max = self.episode_len_max.max(self.ep_len);
        self.ep_len = 0;

        if completed {
            self.completions += 1;
        } else if status.dead {
            self.deaths += 1;
        } else {
            self.timeouts += 1;
        }

        self.sum_final_x += status.x_position as f64;
        self.best_x = self.best_x.max(status.x_position);
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.t0.elapsed().as_secs_f64()
    }

    pub fn steps_per_sec(&self) -> f64 {
        let dt = self.elapsed_secs();
        if dt > 0.0 {
            self.steps_done as f64 / dt
        } else {
            0.0
        }
    }

    pub fn avg_ep_len(&self) -> f64 {
        if self.episodes_finished > 0 {
            self.episode_len_sum as f64 / self.episodes_finished as f64
        } else {
            0.0
        }
    }

    pub fn completion_rate(&self) -> f64 {
        if self.episodes_finished > 0 {
            self.completions as f64 / self.episodes_finished as f64
        } else {
            0.0
        }
    }

    pub fn avg_final_x(&self) -> f64 {
        if self.episodes_finished > 0 {
            self.sum_final_x / self.episodes_finished as f64
        } else {
            0.0
        }
    }

    pub fn live_msg(&self) -> String {
        format!(
            "sps={:.1} eps={} clear={} die={} stall={} avg_ep={:.1} avg_x={:.1} best_x={}",
            self.steps_per_sec(),
            self.episodes_finished,
            self.completions,
            self.deaths,
            self.stalls,
            self.avg_ep_len(),
            self.avg_final_x(),
            self.best_x,
        )
    }

    pub fn final_report(
        &self,
        stage: u32,
        base_seed: u64,
        final_status: GameStatus,
    ) -> FinalReport {
        FinalReport {
            stage,
            base_seed,
            steps_done: self.steps_done,
            elapsed_s: self.elapsed_secs(),
            steps_per_s: self.steps_per_sec(),
            episodes_finished: self.episodes_finished,
            completions: self.completions,
            deaths: self.deaths,
            timeouts: self.timeouts,
            completion_rate: self.completion_rate(),
            maneuvers: self.maneuvers,
            maneuver_stalls: self.stalls,
            avg_ep_len: self.avg_ep_len(),
            max_ep_len: self.episode_len_max,
            avg_final_x: self.avg_final_x(),
            best_x: self.best_x,
            action_counts: self.action_counts,
            final_status,
        }
    }
}

/// Stable end-of-run summary; also what `--results` serializes.
#[derive(Clone, Debug, Serialize)]
pub struct FinalReport {
    pub stage: u32,
    pub base_seed: u64,

    pub steps_done: u64,
    pub elapsed_s: f64,
    pub steps_per_s: f64,

    pub episodes_finished: u64,
    pub completions: u64,
    pub deaths: u64,
    pub timeouts: u64,
    pub completion_rate: f64,

    pub maneuvers: u64,
    pub maneuver_stalls: u64,

    pub avg_ep_len: f64,
    pub max_ep_len: u64,

    pub avg_final_x: f64,
    pub best_x: u32,

    pub action_counts: [u64; 6],

    /// Status sampled at the end of the last episode.
    pub final_status: GameStatus,
}
