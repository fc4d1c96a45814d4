//! Drop probability model: weighted tables, distribution lookups, and
//! constrained random generation of level-0 artifacts.
//!
//! Sub selection is sequential without replacement: each slot draws from
//! the rollable-affix table restricted to affixes that are neither the main
//! affix nor already chosen, so the denominators shrink as slots fill. That
//! makes the appearance probability of an *ordered* sub tuple a product of
//! conditionals; [`artifact_appear_rate`] evaluates exactly that product.

use std::fmt::Debug;

use rand::Rng;

use crate::constants::{
    main_weight_table, AFFIX_UPDATE_MAX, AFFIX_UPDATE_MIN, INITIAL_AFFIX_NUM_WEIGHT, SET_COUNT,
    SUB_PROB_WEIGHT,
};
use crate::types::{AffixKind, Artifact, SetKind, SolverError};

/// Sum of the weights in a table.
pub fn weighted_sum<T>(table: &[(T, i32)]) -> i32 {
    table.iter().map(|(_, w)| *w).sum()
}

/// Draw a key with probability proportional to its weight.
///
/// Total for every non-empty table; fails only when the weights sum to zero.
pub fn weighted_rand<T: Copy>(rng: &mut impl Rng, table: &[(T, i32)]) -> Result<T, SolverError> {
    let sum = weighted_sum(table);
    if sum <= 0 {
        return Err(SolverError::Lookup("weighted table is empty".into()));
    }
    let mut draw = rng.random_range(0..sum);
    for &(key, weight) in table {
        if draw < weight {
            return Ok(key);
        }
        draw -= weight;
    }
    Err(SolverError::Lookup("weighted draw exhausted table".into()))
}

/// Weight of `key` in a table, failing when the key is absent. Used to
/// validate caller-supplied choices against the live distribution.
pub fn weight_of<T: Copy + PartialEq + Debug>(
    key: T,
    table: &[(T, i32)],
) -> Result<i32, SolverError> {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, w)| *w)
        .ok_or_else(|| SolverError::Lookup(format!("{key:?} not present in distribution")))
}

/// Main-affix distribution for a set, in stable order.
pub fn main_distribution(set: SetKind) -> &'static [(AffixKind, i32)] {
    main_weight_table(set)
}

/// Sub-affix distribution given the main affix and the subs already chosen.
pub fn sub_distribution(main: AffixKind, chosen: &[AffixKind]) -> Vec<(AffixKind, i32)> {
    SUB_PROB_WEIGHT
        .iter()
        .copied()
        .filter(|(affix, _)| *affix != main && !chosen.contains(affix))
        .collect()
}

/// Uniform set draw (set choice is not weighted).
pub fn random_set(rng: &mut impl Rng) -> SetKind {
    SetKind::ALL[rng.random_range(0..SET_COUNT)]
}

/// Construct a level-0 artifact, drawing every unspecified field from the
/// probability model.
///
/// Caller-supplied fields are validated instead of drawn: a main affix must
/// be legal for the set, `initial` must be 3 or 4, seeded subs must be
/// drawable in their slot with rolls in [7, 10], and there may not be more
/// seeded subs than `initial`.
pub fn random_one_artifact(
    rng: &mut impl Rng,
    set: Option<SetKind>,
    main: Option<AffixKind>,
    initial: Option<usize>,
    seeded_subs: &[(AffixKind, i32)],
) -> Result<Artifact, SolverError> {
    let set = match set {
        Some(set) => set,
        None => random_set(rng),
    };
    let main_dist = main_distribution(set);
    let main = match main {
        Some(main) => {
            weight_of(main, main_dist)?;
            main
        }
        None => weighted_rand(rng, main_dist)?,
    };
    let initial = match initial {
        Some(n) => {
            weight_of(n, &INITIAL_AFFIX_NUM_WEIGHT)?;
            n
        }
        None => weighted_rand(rng, &INITIAL_AFFIX_NUM_WEIGHT)?,
    };
    if seeded_subs.len() > initial {
        return Err(SolverError::Shape(format!(
            "{} seeded subs exceed the initial count {initial}",
            seeded_subs.len()
        )));
    }

    let mut chosen: Vec<AffixKind> = Vec::with_capacity(initial);
    for slot in 0..initial {
        let dist = sub_distribution(main, &chosen);
        if let Some(&(affix, roll)) = seeded_subs.get(slot) {
            weight_of(affix, &dist)?;
            if !(AFFIX_UPDATE_MIN..=AFFIX_UPDATE_MAX).contains(&roll) {
                return Err(SolverError::Range(format!(
                    "seeded roll {roll} outside [{AFFIX_UPDATE_MIN}, {AFFIX_UPDATE_MAX}]"
                )));
            }
            chosen.push(affix);
        } else {
            chosen.push(weighted_rand(rng, &dist)?);
        }
    }

    let mut subs: Vec<(AffixKind, i32)> = seeded_subs.to_vec();
    for &affix in chosen.iter().skip(seeded_subs.len()) {
        subs.push((affix, rng.random_range(AFFIX_UPDATE_MIN..=AFFIX_UPDATE_MAX)));
    }
    Ok(Artifact::new(set, main, subs, 0))
}

/// Unconditional probability of obtaining this exact level-0 artifact,
/// counting only the structural choices (roll values are uniform and
/// excluded). Sub order matters: the conditional denominators shrink slot by
/// slot, so the probability of a *set* of subs is the sum over orderings.
pub fn artifact_appear_rate(art: &Artifact) -> Result<f64, SolverError> {
    if art.level != 0 || !(3..=4).contains(&art.subs.len()) {
        return Err(SolverError::Shape(format!(
            "appear rate needs a level-0 artifact with 3 or 4 subs, got level {} with {}",
            art.level,
            art.subs.len()
        )));
    }

    let mut rate = 1.0 / SET_COUNT as f64;
    rate *= weight_of(art.subs.len(), &INITIAL_AFFIX_NUM_WEIGHT)? as f64
        / weighted_sum(&INITIAL_AFFIX_NUM_WEIGHT) as f64;
    let main_dist = main_distribution(art.set);
    rate *= weight_of(art.main, main_dist)? as f64 / weighted_sum(main_dist) as f64;

    let mut counted: Vec<AffixKind> = Vec::with_capacity(art.subs.len());
    for &(affix, _) in &art.subs {
        let dist = sub_distribution(art.main, &counted);
        rate *= weight_of(affix, &dist)? as f64 / weighted_sum(&dist) as f64;
        counted.push(affix);
    }
    Ok(rate)
}
