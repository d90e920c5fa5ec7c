// agent/src/agent.rs
#![forbid(unsafe_code)]

use std::time::Duration;

use tracing::trace;

use crate::env::{Action, Environment, GameStatus};
use crate::policy::{self, maneuver, ManeuverKind, ManeuverLimits, ManeuverOutcome, PolicyState};

#[derive(Clone, Copy, Debug, Default)]
pub struct AgentConfig {
    /// Pause between actuator calls, so the emulation can settle. Zero for
    /// simulated environments.
    pub settle: Duration,
    pub maneuver: ManeuverLimits,
}

/// What one decision cycle did; returned for reporting, ignorable.
#[derive(Clone, Copy, Debug)]
pub struct CycleReport {
    pub action: Action,
    pub rule: &'static str,
    pub maneuver: Option<(ManeuverKind, ManeuverOutcome)>,
}

/// The expert controller: owns the environment handle and the policy
/// state, and turns sampled frames into button presses one cycle at a
/// time.
pub struct ExpertAgent<E: Environment> {
    env: E,
    cfg: AgentConfig,
    state: PolicyState,
}

impl<E: Environment> ExpertAgent<E> {
    pub fn new(env: E) -> Self {
        Self::with_config(env, AgentConfig::default())
    }

    pub fn with_config(env: E, cfg: AgentConfig) -> Self {
        Self {
            env,
            cfg,
            state: PolicyState::new(),
        }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn state(&self) -> &PolicyState {
        &self.state
    }

    pub fn is_over(&mut self) -> bool {
        self.env.is_over()
    }

    pub fn status(&mut self) -> GameStatus {
        self.env.sample_status()
    }

    /// One full cycle. A pending plan drains one entry and skips the rule
    /// chain entirely; only an empty queue triggers a fresh evaluation, in
    /// which a rule may load a new plan whose first entry is consumed
    /// immediately.
    pub fn step(&mut self) -> CycleReport {
        if !self.cfg.settle.is_zero() {
            std::thread::sleep(self.cfg.settle);
        }

        if !self.state.queue.is_empty() {
            let action = self.state.queue.override_or(Action::Down);
            self.env.apply(action);
            trace!(action = ?action, queued = self.state.queue.pending(), "queued cycle");
            return CycleReport {
                action,
                rule: "queued",
                maneuver: None,
            };
        }

        let grid = self.env.sample_grid();
        let status = self.env.sample_status();
        let decision = policy::choose(&grid, &status, &mut self.state);

        let maneuver = decision.maneuver.map(|kind| {
            let outcome = maneuver::run(&mut self.env, kind, &self.cfg.maneuver, self.cfg.settle);
            (kind, outcome)
        });

        let action = self.state.queue.override_or(decision.action);
        self.env.apply(action);

        trace!(rule = decision.rule, action = ?action, queued = self.state.queue.pending(), "cycle");
        CycleReport {
            action,
            rule: decision.rule,
            maneuver,
        }
    }

    /// The caller-facing cycle entrypoint: sample, decide, apply.
    pub fn decide_and_apply(&mut self) {
        let _ = self.step();
    }

    /// Drives cycles until the environment reports game over; returns the
    /// final status for persistence.
    pub fn run(&mut self) -> GameStatus {
        while !self.env.is_over() {
            self.decide_and_apply();
        }
        self.env.sample_status()
    }
}
