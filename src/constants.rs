//! Game constants, probability-weight tables, and status-code indexing.
//!
//! The upgrade DP packs an increment vector (v0, v1, v2, v3) into a single
//! integer `code = v0 + v1·64 + v2·64² + v3·64³`. [`STATUS_BASE`] = 64 must
//! exceed the largest per-slot accumulation, which is
//! `MAX_UPGRADE_TIME × AFFIX_UPDATE_MAX = 50`; the packing is therefore a
//! constant-time canonical hash on the additive state.
//!
//! Weight tables are published drop-model data and are not derived here.

use crate::types::{AffixKind, SetKind};

/// Number of sub-affix slots on a fully formed artifact.
pub const AFFIX_NUM: usize = 4;

/// Smallest value a single roll can add to a sub affix.
pub const AFFIX_UPDATE_MIN: i32 = 7;

/// Largest value a single roll can add to a sub affix.
pub const AFFIX_UPDATE_MAX: i32 = 10;

/// Number of distinct roll values: |[7, 10]| = 4.
pub const ROLL_WAYS: i32 = AFFIX_UPDATE_MAX - AFFIX_UPDATE_MIN + 1;

/// Total number of upgrade steps from level 0 to a maxed artifact.
pub const MAX_UPGRADE_TIME: usize = 5;

/// Radix of the packed status code. Must exceed 50 (see module doc).
pub const STATUS_BASE: u32 = 64;

/// Number of artifact sets; set choice at drop time is uniform.
pub const SET_COUNT: usize = 5;

/// Dimensionless scale hook applied to scores inside the DP.
pub const SCORE_MULTIPLIER: f64 = 1.0;

/// Guard band for the score-bar comparison at the terminal DP layer.
pub const EPS: f64 = 1e-8;

/// Consumable cost of upgrade step i (level i -> i+1).
pub const DOGFOOD_COST: [i32; MAX_UPGRADE_TIME] = [16300, 28425, 42425, 66150, 117175];

/// Total consumable cost of taking an artifact from level 0 to level 5.
pub const SUCCESS_DOGFOOD_COST: i32 =
    DOGFOOD_COST[0] + DOGFOOD_COST[1] + DOGFOOD_COST[2] + DOGFOOD_COST[3] + DOGFOOD_COST[4];

/// Consumable refund for feeding an unupgraded artifact away.
pub const FEED_DOGFOOD: i32 = 3780;

/// Net consumable value of feeding an artifact after i upgrades:
/// the refund minus a fifth of everything sunk so far (integer division).
pub const DOGFOOD_LOSS: [i32; MAX_UPGRADE_TIME + 1] = dogfood_loss_table();

const fn dogfood_loss_table() -> [i32; MAX_UPGRADE_TIME + 1] {
    let mut table = [0i32; MAX_UPGRADE_TIME + 1];
    let mut spent = 0;
    let mut i = 0;
    while i <= MAX_UPGRADE_TIME {
        table[i] = FEED_DOGFOOD - spent / 5;
        if i < MAX_UPGRADE_TIME {
            spent += DOGFOOD_COST[i];
        }
        i += 1;
    }
    table
}

/// Extract slot `slot`'s accumulated increment from a packed status code.
#[inline(always)]
pub fn status_digit(status: u32, slot: usize) -> u32 {
    (status / STATUS_BASE.pow(slot as u32)) % STATUS_BASE
}

/// Weights for how many sub affixes a freshly dropped artifact carries.
pub const INITIAL_AFFIX_NUM_WEIGHT: [(usize, i32); 2] = [(3, 4), (4, 1)];

/// Selection weights for the ten rollable sub affixes.
pub const SUB_PROB_WEIGHT: [(AffixKind, i32); 10] = [
    (AffixKind::Hp, 6),
    (AffixKind::Atk, 6),
    (AffixKind::Def, 6),
    (AffixKind::Hpp, 4),
    (AffixKind::Atkp, 4),
    (AffixKind::Defp, 4),
    (AffixKind::Em, 4),
    (AffixKind::Er, 4),
    (AffixKind::Cr, 3),
    (AffixKind::Cd, 3),
];

const FLOWER_MAIN_WEIGHT: [(AffixKind, i32); 1] = [(AffixKind::Hp, 1)];

const PLUME_MAIN_WEIGHT: [(AffixKind, i32); 1] = [(AffixKind::Atk, 1)];

const SANDS_MAIN_WEIGHT: [(AffixKind, i32); 5] = [
    (AffixKind::Hpp, 2668),
    (AffixKind::Atkp, 2666),
    (AffixKind::Defp, 2666),
    (AffixKind::Em, 1000),
    (AffixKind::Er, 1000),
];

const GOBLET_MAIN_WEIGHT: [(AffixKind, i32); 12] = [
    (AffixKind::Hpp, 19175),
    (AffixKind::Atkp, 19175),
    (AffixKind::Defp, 19150),
    (AffixKind::Em, 2500),
    (AffixKind::PyroDb, 5000),
    (AffixKind::HydroDb, 5000),
    (AffixKind::ElectroDb, 5000),
    (AffixKind::AnemoDb, 5000),
    (AffixKind::CryoDb, 5000),
    (AffixKind::GeoDb, 5000),
    (AffixKind::PhysicalDb, 5000),
    (AffixKind::DendroDb, 5000),
];

const CIRCLET_MAIN_WEIGHT: [(AffixKind, i32); 7] = [
    (AffixKind::Hpp, 22),
    (AffixKind::Atkp, 22),
    (AffixKind::Defp, 22),
    (AffixKind::Em, 4),
    (AffixKind::Cr, 10),
    (AffixKind::Cd, 10),
    (AffixKind::Hb, 10),
];

/// Main-affix weight table for a set. Entries are in declaration order,
/// which is stable across runs.
pub fn main_weight_table(set: SetKind) -> &'static [(AffixKind, i32)] {
    match set {
        SetKind::Flower => &FLOWER_MAIN_WEIGHT,
        SetKind::Plume => &PLUME_MAIN_WEIGHT,
        SetKind::Sands => &SANDS_MAIN_WEIGHT,
        SetKind::Goblet => &GOBLET_MAIN_WEIGHT,
        SetKind::Circlet => &CIRCLET_MAIN_WEIGHT,
    }
}
