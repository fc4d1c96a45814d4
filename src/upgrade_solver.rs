//! Upgrade-decision dynamic program.
//!
//! Backward induction over the upgrade-state table, from the fully upgraded
//! layer down to the current state. The question at every state is
//! stop-or-continue: feed the piece now for its dogfood value, or pay for
//! one more upgrade and re-decide. A state's record only exists if
//! continuing beats feeding, so the expectation each predecessor reads
//! already encodes the optimal forward policy; the stopping rule is
//! self-consistent.
//!
//! ## State encoding
//!
//! A state at step i is an entry of `upgrade_routes()[i]`: the packed
//! base-64 increment vector added so far. With per-slot scores s and current
//! rolls w, the final score compared against the bar is Σ (w_j + v_j)·s_j;
//! the bar is shifted by −Σ w_j·s_j up front so each state only needs its
//! own Σ v_j·s_j.
//!
//! ## Transitions
//!
//! Each interior state has 4 × 4 = 16 equiprobable successors
//! (`code + roll·64^slot`). A successor missing from the next layer means
//! the policy stops there; the expectation then credits the feed value of
//! the piece at that depth (`DOGFOOD_LOSS`) instead of the successor's
//! record.
//!
//! Repeated calls with identical inputs are bitwise identical: the
//! induction iterates only the sorted route tables and the fixed transition
//! order; hash maps are lookup-only.

use std::collections::HashMap;

use rand::Rng;

use crate::constants::{
    AFFIX_NUM, AFFIX_UPDATE_MAX, AFFIX_UPDATE_MIN, DOGFOOD_LOSS, EPS, MAX_UPGRADE_TIME, ROLL_WAYS,
    SCORE_MULTIPLIER, STATUS_BASE, SUCCESS_DOGFOOD_COST,
};
use crate::drop_mechanics::{sub_distribution, weighted_sum};
use crate::drop_tables::get_drop;
use crate::types::{AffixKind, Artifact, ScoreMap, SolverError, UpgradeEval};
use crate::upgrade_tables::upgrade_routes;

/// Per-state record carried through the backward induction.
#[derive(Clone, Copy, Debug)]
#[allow(dead_code)]
struct StateRecord {
    routes: u32,
    status_score: f64,
    expected_gain: f64,
    expected_dogfood: f64,
    success_rate: f64,
    /// E[score above the bar | the bar is cleared].
    score_gain: f64,
}

/// Evaluate the DP on raw per-slot data: current roll values, per-slot
/// scores, remaining upgrades, score bar, and the utility of success.
///
/// Both slices must have exactly [`AFFIX_NUM`] entries; artifacts with three
/// subs go through [`calc`], which handles the fourth-slot completion.
pub fn calc_rolls(
    rolls: &[i32],
    scores: &[f64],
    upgrade_time: usize,
    score_bar: f64,
    gain: f64,
) -> Result<UpgradeEval, SolverError> {
    if rolls.len() != AFFIX_NUM || scores.len() != AFFIX_NUM {
        return Err(SolverError::Shape(format!(
            "expected {AFFIX_NUM} sub slots, got {} rolls and {} scores",
            rolls.len(),
            scores.len()
        )));
    }
    if upgrade_time > MAX_UPGRADE_TIME {
        return Err(SolverError::Shape(format!(
            "upgrade time {upgrade_time} exceeds {MAX_UPGRADE_TIME}"
        )));
    }

    let routes = upgrade_routes();
    let scaled: Vec<f64> = scores.iter().map(|s| s * SCORE_MULTIPLIER).collect();
    let mut shifted_bar = score_bar * SCORE_MULTIPLIER;
    for slot in 0..AFFIX_NUM {
        shifted_bar -= rolls[slot] as f64 * scaled[slot];
    }

    let current_upgrade = MAX_UPGRADE_TIME - upgrade_time;
    let transitions = (AFFIX_NUM as i32 * ROLL_WAYS) as f64;
    let mut next: HashMap<u32, StateRecord> = HashMap::new();

    for step in (0..=upgrade_time).rev() {
        let mut layer: HashMap<u32, StateRecord> = HashMap::with_capacity(routes[step].len());
        for &(status, count) in &routes[step] {
            let status_score = decode_score(status, &scaled);

            if step == upgrade_time {
                // Fully upgraded: success iff the bar is cleared.
                if status_score < shifted_bar - EPS {
                    continue;
                }
                layer.insert(
                    status,
                    StateRecord {
                        routes: count,
                        status_score,
                        expected_gain: gain,
                        expected_dogfood: SUCCESS_DOGFOOD_COST as f64,
                        success_rate: 1.0,
                        score_gain: status_score - shifted_bar,
                    },
                );
                continue;
            }

            let stop_credit = DOGFOOD_LOSS[current_upgrade + step + 1] as f64;
            let mut expected_gain = 0.0;
            let mut expected_dogfood = 0.0;
            let mut success_rate = 0.0;
            let mut score_gain = 0.0;
            let mut slot_base = 1u32;
            for _slot in 0..AFFIX_NUM {
                for roll in AFFIX_UPDATE_MIN..=AFFIX_UPDATE_MAX {
                    match next.get(&(status + roll as u32 * slot_base)) {
                        None => {
                            // Successor stopped: the piece is fed there.
                            expected_gain += stop_credit;
                            expected_dogfood -= stop_credit;
                        }
                        Some(target) => {
                            expected_gain += target.expected_gain;
                            expected_dogfood += target.expected_dogfood;
                            success_rate += target.success_rate;
                            score_gain += target.success_rate * target.score_gain;
                        }
                    }
                }
                slot_base *= STATUS_BASE;
            }
            expected_gain /= transitions;
            expected_dogfood /= transitions;
            success_rate /= transitions;
            if success_rate > 0.0 {
                score_gain /= transitions * success_rate;
            }

            if expected_gain > DOGFOOD_LOSS[current_upgrade + step] as f64 {
                layer.insert(
                    status,
                    StateRecord {
                        routes: count,
                        status_score,
                        expected_gain,
                        expected_dogfood,
                        success_rate,
                        score_gain,
                    },
                );
            }
        }
        next = layer;
    }

    Ok(match next.get(&0) {
        None => UpgradeEval::feed(current_upgrade),
        Some(root) => UpgradeEval {
            upgrade: true,
            expected_gain: root.expected_gain,
            expected_dogfood: root.expected_dogfood,
            success_rate: root.success_rate,
            expected_score_gain: root.score_gain / SCORE_MULTIPLIER,
        },
    })
}

fn decode_score(status: u32, scaled: &[f64]) -> f64 {
    let mut rem = status;
    let mut total = 0.0;
    for &score in scaled {
        total += (rem % STATUS_BASE) as f64 * score;
        rem /= STATUS_BASE;
    }
    total
}

/// Evaluate an artifact under a utility model. This is the recommended
/// entry point: per-slot scores come from `scores` (absent affixes score
/// zero), the remaining upgrade count comes from the level, and three-sub
/// pieces are handled by expectation over the fourth-slot completion.
pub fn calc(
    art: &Artifact,
    scores: &ScoreMap,
    score_bar: f64,
    gain: f64,
) -> Result<UpgradeEval, SolverError> {
    if art.level < 0 || art.level > MAX_UPGRADE_TIME as i32 {
        return Err(SolverError::Shape(format!(
            "artifact level {} outside [0, {MAX_UPGRADE_TIME}]",
            art.level
        )));
    }
    match art.subs.len() {
        3 => {
            if art.level != 0 {
                return Err(SolverError::Shape(format!(
                    "3-sub artifact must be level 0, got level {}",
                    art.level
                )));
            }
            calc_three_sub(art, scores, score_bar, gain)
        }
        4 => {
            let rolls: Vec<i32> = art.subs.iter().map(|&(_, roll)| roll).collect();
            let slot_scores = select_sub_scores(art, scores);
            calc_rolls(
                &rolls,
                &slot_scores,
                MAX_UPGRADE_TIME - art.level as usize,
                score_bar,
                gain,
            )
        }
        n => Err(SolverError::Shape(format!(
            "artifact has {n} subs, expected 3 or 4"
        ))),
    }
}

fn select_sub_scores(art: &Artifact, scores: &ScoreMap) -> Vec<f64> {
    art.subs
        .iter()
        .map(|(affix, _)| scores.get(affix).copied().unwrap_or(0.0))
        .collect()
}

/// Three-sub wrapper: the first upgrade both adds the fourth sub and rolls
/// it, so the value of the piece is the (affix weight × uniform roll)
/// expectation over all completions evaluated at level 1, with the
/// stop-or-continue decision re-applied on top.
fn calc_three_sub(
    art: &Artifact,
    scores: &ScoreMap,
    score_bar: f64,
    gain: f64,
) -> Result<UpgradeEval, SolverError> {
    let existing: Vec<AffixKind> = art.subs.iter().map(|&(affix, _)| affix).collect();
    let dist = sub_distribution(art.main, &existing);
    let completion_mass = (weighted_sum(&dist) * ROLL_WAYS) as f64;

    let mut augmented = art.clone();
    augmented.level += 1;

    let mut expected_gain = 0.0;
    let mut expected_dogfood = 0.0;
    let mut success_rate = 0.0;
    let mut score_gain = 0.0;
    for (affix, weight) in dist {
        for roll in AFFIX_UPDATE_MIN..=AFFIX_UPDATE_MAX {
            augmented.subs.push((affix, roll));
            let eval = calc(&augmented, scores, score_bar, gain)?;
            augmented.subs.pop();
            let w = weight as f64;
            expected_gain += eval.expected_gain * w;
            expected_dogfood += eval.expected_dogfood * w;
            success_rate += eval.success_rate * w;
            score_gain += eval.success_rate * eval.expected_score_gain * w;
        }
    }
    expected_gain /= completion_mass;
    expected_dogfood /= completion_mass;
    success_rate /= completion_mass;
    if success_rate > 0.0 {
        score_gain /= completion_mass * success_rate;
    }

    if expected_gain > DOGFOOD_LOSS[0] as f64 {
        Ok(UpgradeEval {
            upgrade: true,
            expected_gain,
            expected_dogfood,
            success_rate,
            expected_score_gain: score_gain,
        })
    } else {
        Ok(UpgradeEval::feed(0))
    }
}

/// Draw a drop (or reuse a supplied uniform value) and evaluate it.
pub fn evaluate_drop(
    scores: &ScoreMap,
    score_bar: f64,
    gain: f64,
    randnum: Option<f64>,
) -> Result<(Artifact, UpgradeEval), SolverError> {
    let u = randnum.unwrap_or_else(|| rand::rng().random());
    let art = get_drop(u);
    let eval = calc(&art, scores, score_bar, gain)?;
    Ok((art, eval))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SetKind;

    fn even_scores() -> ScoreMap {
        [
            (AffixKind::Hp, 1.0),
            (AffixKind::Atk, 1.0),
            (AffixKind::Def, 1.0),
            (AffixKind::Em, 1.0),
        ]
        .into_iter()
        .collect()
    }

    fn maxed(rolls: [i32; 4]) -> Artifact {
        Artifact::new(
            SetKind::Sands,
            AffixKind::Hpp,
            vec![
                (AffixKind::Hp, rolls[0]),
                (AffixKind::Atk, rolls[1]),
                (AffixKind::Def, rolls[2]),
                (AffixKind::Em, rolls[3]),
            ],
            5,
        )
    }

    #[test]
    fn test_shape_errors() {
        assert!(calc_rolls(&[7, 7, 7], &[1.0; 4], 5, 0.0, 0.0).is_err());
        assert!(calc_rolls(&[7; 4], &[1.0; 3], 5, 0.0, 0.0).is_err());
        assert!(calc_rolls(&[7; 4], &[1.0; 4], 6, 0.0, 0.0).is_err());

        let mut art = maxed([7, 7, 7, 7]);
        art.level = 6;
        assert!(calc(&art, &even_scores(), 0.0, 0.0).is_err());
        art.level = 0;
        art.subs.truncate(2);
        assert!(calc(&art, &even_scores(), 0.0, 0.0).is_err());

        let three = Artifact::new(
            SetKind::Flower,
            AffixKind::Hp,
            vec![(AffixKind::Atk, 7), (AffixKind::Def, 7), (AffixKind::Em, 7)],
            1,
        );
        assert!(calc(&three, &even_scores(), 0.0, 0.0).is_err());
    }

    #[test]
    fn test_maxed_artifact_above_bar() {
        // No upgrades left: the DP is a pure bar comparison.
        let eval = calc(&maxed([10, 10, 10, 10]), &even_scores(), 30.0, 5000.0).unwrap();
        assert!(eval.upgrade);
        assert_eq!(eval.expected_gain, 5000.0);
        assert_eq!(eval.expected_dogfood, SUCCESS_DOGFOOD_COST as f64);
        assert_eq!(eval.success_rate, 1.0);
        assert!((eval.expected_score_gain - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_maxed_artifact_below_bar() {
        let eval = calc(&maxed([7, 7, 7, 7]), &even_scores(), 30.0, 5000.0).unwrap();
        assert_eq!(eval, UpgradeEval::feed(5));
    }

    #[test]
    fn test_worthless_scores_never_upgrade() {
        let scores: ScoreMap = [(AffixKind::Cr, 1.0), (AffixKind::Cd, 1.0)]
            .into_iter()
            .collect();
        let art = Artifact::new(
            SetKind::Sands,
            AffixKind::Hpp,
            vec![
                (AffixKind::Hp, 10),
                (AffixKind::Atk, 10),
                (AffixKind::Def, 10),
                (AffixKind::Em, 10),
            ],
            0,
        );
        let eval = calc(&art, &scores, 10.0, 1000.0).unwrap();
        assert_eq!(eval, UpgradeEval::feed(0));
    }

    #[test]
    fn test_missing_scores_default_to_zero() {
        let art = maxed([10, 10, 10, 10]);
        let sparse: ScoreMap = [(AffixKind::Hp, 1.0)].into_iter().collect();
        let eval = calc(&art, &sparse, 5.0, 100.0).unwrap();
        // Only hp counts: final score 10 clears bar 5 by 5.
        assert!(eval.upgrade);
        assert!((eval.expected_score_gain - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_huge_gain_always_upgrades() {
        let art = Artifact::new(
            SetKind::Sands,
            AffixKind::Hpp,
            vec![
                (AffixKind::Hp, 7),
                (AffixKind::Atk, 7),
                (AffixKind::Def, 7),
                (AffixKind::Em, 7),
            ],
            0,
        );
        let eval = calc(&art, &even_scores(), 0.0, 1e6).unwrap();
        assert!(eval.upgrade);
        assert_eq!(eval.expected_gain, 1e6);
        assert_eq!(eval.success_rate, 1.0);
        assert_eq!(eval.expected_dogfood, SUCCESS_DOGFOOD_COST as f64);
    }

    #[test]
    fn test_success_rate_within_unit_interval() {
        let art = Artifact::new(
            SetKind::Sands,
            AffixKind::Hpp,
            vec![
                (AffixKind::Cr, 9),
                (AffixKind::Cd, 9),
                (AffixKind::Atk, 7),
                (AffixKind::Em, 8),
            ],
            0,
        );
        let scores: ScoreMap = [(AffixKind::Cr, 1.0), (AffixKind::Cd, 1.0)]
            .into_iter()
            .collect();
        let eval = calc(&art, &scores, 40.0, 500_000.0).unwrap();
        assert!(eval.upgrade);
        assert!(eval.success_rate > 0.0 && eval.success_rate < 1.0);
        assert!(eval.expected_score_gain >= 0.0);
    }

    #[test]
    fn test_evaluate_drop_deterministic() {
        let scores = even_scores();
        let (a1, e1) = evaluate_drop(&scores, 20.0, 50_000.0, Some(0.37)).unwrap();
        let (a2, e2) = evaluate_drop(&scores, 20.0, 50_000.0, Some(0.37)).unwrap();
        assert_eq!(a1, a2);
        assert_eq!(e1, e2);
    }
}
