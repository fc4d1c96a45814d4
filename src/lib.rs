//! # artifact-solver: stochastic upgrade-decision solver
//!
//! Answers, for a randomly dropped collectible piece and a user-supplied
//! utility model: should it be upgraded, what utility and consumable cost
//! should be expected, how likely is it to clear a target score, and by how
//! much on average when it does.
//!
//! ## Pipeline overview
//!
//! | Stage | Rust module | Description |
//! |-------|-------------|-------------|
//! | Probability model | [`constants`], [`drop_mechanics`] | Published weight tables; weighted picker; constrained random generation |
//! | Enumeration | [`drop_tables`] | Every level-0 artifact with its exact probability, canonicalized and stored as a CDF |
//! | Upgrade states | [`upgrade_tables`] | All increment vectors reachable in k upgrades, packed base-64, with route counts |
//! | Decision DP | [`upgrade_solver`] | Backward induction with a self-consistent stop-or-continue rule |
//! | Cost inversion | [`gain_solver`] | Expected cost integrated over the full distribution; bisection from target cost to utility |
//!
//! ## State representation
//!
//! An upgrade state is the 4-slot increment vector (v0..v3) packed as
//! `v0 + v1·64 + v2·64² + v3·64³`, a constant-time canonical hash on the
//! additive state, valid because no slot can accumulate more than
//! 5 × 10 = 50 < 64. The DP maps are plain integer-keyed hash tables.
//!
//! ## Shared state
//!
//! The enumeration and the upgrade-state table are built lazily exactly
//! once (`OnceLock`) and are read-only afterwards; everything else is plain
//! values. A single evaluation runs in microseconds; a full cost inversion
//! integrates over every artifact and is parallelized with rayon.

pub mod constants;
pub mod drop_mechanics;
pub mod drop_tables;
pub mod gain_solver;
pub mod types;
pub mod upgrade_solver;
pub mod upgrade_tables;

pub use drop_tables::{get_all_artifacts_with_probs, get_drop, random_drop};
pub use gain_solver::{expected_dogfood_cost, find_gain, find_gain_bounded};
pub use types::{AffixKind, Artifact, ScoreMap, SetKind, SolverError, UpgradeEval};
pub use upgrade_solver::{calc, calc_rolls, evaluate_drop};
