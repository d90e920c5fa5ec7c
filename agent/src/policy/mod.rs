// agent/src/policy/mod.rs
#![forbid(unsafe_code)]

pub mod maneuver;
mod queue;
mod rules;

/**
 * Curated policy public API.
 *
 * The rule chain is exposed as the single `choose` entrypoint plus the
 * state value it threads; maneuver execution stays a submodule because the
 * agent drives it separately.
 */
pub use maneuver::{ManeuverKind, ManeuverLimits, ManeuverOutcome};
pub use queue::{ActionQueue, PolicyState};
pub use rules::{choose, Decision};
