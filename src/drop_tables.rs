//! Exhaustive enumeration of level-0 drops with exact probabilities.
//!
//! Every structurally distinct level-0 artifact (set × main × sub set) is
//! produced once, in closed form, with its drop probability. Because sub
//! selection is order-sensitive (see [`crate::drop_mechanics`]), the builder
//! enumerates *ordered* sub tuples, sorts each tuple into canonical affix
//! order, and coalesces adjacent equals by summing probabilities, which
//! turns path probabilities into set probabilities. Skipping that
//! normalization produces incorrect totals.
//!
//! Roll values are uniform and independent of structure, so enumerated
//! artifacts carry placeholder rolls of [`AFFIX_UPDATE_MIN`]; [`get_drop`]
//! re-derives real rolls from the residual randomness of a single uniform
//! draw via base-4 digit expansion.
//!
//! The table is built once behind a process-wide [`OnceLock`] and read-only
//! afterwards. Lists are stored in cumulative (CDF) form for binary-search
//! drawing; [`get_all_artifacts_with_probs`] hands out de-accumulated
//! copies.

use std::sync::OnceLock;

use rand::Rng;

use crate::constants::{
    AFFIX_UPDATE_MIN, INITIAL_AFFIX_NUM_WEIGHT, ROLL_WAYS, SET_COUNT,
};
use crate::drop_mechanics::{main_distribution, sub_distribution, weighted_sum};
use crate::types::{AffixKind, Artifact, SetKind};

/// Memoized enumeration output: the aggregate CDF plus one CDF per set
/// (per-set probabilities are conditional on the set, i.e. aggregate × 5).
pub struct DropTable {
    all: Vec<(Artifact, f64)>,
    by_set: [Vec<(Artifact, f64)>; SET_COUNT],
}

static DROP_TABLE: OnceLock<DropTable> = OnceLock::new();

/// The process-wide drop table, built on first use.
pub fn drop_table() -> &'static DropTable {
    DROP_TABLE.get_or_init(DropTable::build)
}

/// All ordered `count`-tuples of distinct rollable affixes (excluding
/// `main`), each with the product of its slot-conditional probabilities.
pub fn generate_all_possible_sub_orders(
    count: usize,
    main: AffixKind,
) -> Vec<(Vec<AffixKind>, f64)> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(count);
    expand_sub_orders(count, main, &mut current, 1.0, &mut out);
    out
}

fn expand_sub_orders(
    remaining: usize,
    main: AffixKind,
    current: &mut Vec<AffixKind>,
    prob: f64,
    out: &mut Vec<(Vec<AffixKind>, f64)>,
) {
    if remaining == 0 {
        out.push((current.clone(), prob));
        return;
    }
    let dist = sub_distribution(main, current);
    let total = weighted_sum(&dist) as f64;
    for (affix, weight) in dist {
        current.push(affix);
        expand_sub_orders(remaining - 1, main, current, prob * weight as f64 / total, out);
        current.pop();
    }
}

impl DropTable {
    fn build() -> Self {
        let initial_sum = weighted_sum(&INITIAL_AFFIX_NUM_WEIGHT) as f64;
        let mut all: Vec<(Artifact, f64)> = Vec::new();

        for set in SetKind::ALL {
            let main_dist = main_distribution(set);
            let main_sum = weighted_sum(main_dist) as f64;
            for &(main, main_weight) in main_dist {
                for &(initial, initial_weight) in &INITIAL_AFFIX_NUM_WEIGHT {
                    let mut orders = generate_all_possible_sub_orders(initial, main);
                    for (subs, _) in orders.iter_mut() {
                        subs.sort();
                    }
                    orders.sort_by(|a, b| a.0.cmp(&b.0));

                    let mut coalesced: Vec<(Vec<AffixKind>, f64)> = Vec::new();
                    for (subs, prob) in orders {
                        match coalesced.last_mut() {
                            Some(last) if last.0 == subs => last.1 += prob,
                            _ => coalesced.push((subs, prob)),
                        }
                    }

                    for (subs, sub_prob) in coalesced {
                        let art = Artifact::new(
                            set,
                            main,
                            subs.into_iter().map(|a| (a, AFFIX_UPDATE_MIN)).collect(),
                            0,
                        );
                        let rate = (1.0 / SET_COUNT as f64)
                            * (main_weight as f64 / main_sum)
                            * (initial_weight as f64 / initial_sum)
                            * sub_prob;
                        all.push((art, rate));
                    }
                }
            }
        }

        let mut by_set: [Vec<(Artifact, f64)>; SET_COUNT] = Default::default();
        for (art, rate) in &all {
            by_set[art.set.index()].push((art.clone(), rate * SET_COUNT as f64));
        }

        accumulate(&mut all);
        for list in by_set.iter_mut() {
            accumulate(list);
        }
        DropTable { all, by_set }
    }

    fn cdf(&self, set: Option<SetKind>) -> &[(Artifact, f64)] {
        match set {
            None => &self.all,
            Some(set) => &self.by_set[set.index()],
        }
    }
}

fn accumulate(list: &mut [(Artifact, f64)]) {
    let mut running = 0.0;
    for entry in list.iter_mut() {
        running += entry.1;
        entry.1 = running;
    }
}

/// Every possible level-0 artifact (placeholder rolls) with its probability:
/// the aggregate distribution, or the distribution conditional on `set`.
pub fn get_all_artifacts_with_probs(set: Option<SetKind>) -> Vec<(Artifact, f64)> {
    let mut out = drop_table().cdf(set).to_vec();
    let mut previous = 0.0;
    for entry in out.iter_mut() {
        let cumulative = entry.1;
        entry.1 -= previous;
        previous = cumulative;
    }
    out
}

/// Map a single uniform draw in [0, 1) to a complete drop.
///
/// The integer part of the inverse-CDF lookup selects the artifact
/// structure; the rescaled residual is expanded digit-by-digit in base 4
/// (clamped at 3 against floating-point edge cases) to assign each sub's
/// roll.
pub fn get_drop(randnum: f64) -> Artifact {
    let table = &drop_table().all;
    if randnum <= table[0].1 {
        return table[0].0.clone();
    }
    if randnum > table[table.len() - 1].1 {
        return table[table.len() - 1].0.clone();
    }

    // invariant: cdf[left] < randnum <= cdf[right]
    let (mut left, mut right) = (0, table.len() - 1);
    while left + 1 < right {
        let mid = (left + right) / 2;
        if table[mid].1 < randnum {
            left = mid;
        } else {
            right = mid;
        }
    }

    let mut art = table[right].0.clone();
    let mut residual = (randnum - table[left].1) / (table[right].1 - table[left].1);
    for (_, roll) in art.subs.iter_mut() {
        residual *= ROLL_WAYS as f64;
        let mut digit = residual as i32;
        if digit >= ROLL_WAYS {
            digit = ROLL_WAYS - 1;
        }
        residual -= digit as f64;
        *roll = digit + AFFIX_UPDATE_MIN;
    }
    art
}

/// A drop from the process RNG.
pub fn random_drop() -> Artifact {
    get_drop(rand::rng().random())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_order_probs_sum_to_one() {
        for main in [AffixKind::Hp, AffixKind::Hpp, AffixKind::PyroDb] {
            for count in [3usize, 4] {
                let orders = generate_all_possible_sub_orders(count, main);
                let total: f64 = orders.iter().map(|(_, p)| p).sum();
                assert!(
                    (total - 1.0).abs() < 1e-9,
                    "main {main:?} count {count}: total {total}"
                );
            }
        }
    }

    #[test]
    fn test_sub_order_counts() {
        // 9 candidates when the main is rollable, 10 otherwise.
        assert_eq!(
            generate_all_possible_sub_orders(3, AffixKind::Hp).len(),
            9 * 8 * 7
        );
        assert_eq!(
            generate_all_possible_sub_orders(3, AffixKind::PyroDb).len(),
            10 * 9 * 8
        );
    }

    #[test]
    fn test_aggregate_totals() {
        let all = get_all_artifacts_with_probs(None);
        assert_eq!(all.len(), 6540);
        let total: f64 = all.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9, "total {total}");
    }

    #[test]
    fn test_per_set_totals() {
        for set in SetKind::ALL {
            let arts = get_all_artifacts_with_probs(Some(set));
            let total: f64 = arts.iter().map(|(_, p)| p).sum();
            assert!((total - 1.0).abs() < 1e-9, "{set}: total {total}");
            assert!(arts.iter().all(|(a, _)| a.set == set));
        }
    }

    #[test]
    fn test_per_set_is_conditional() {
        let all = get_all_artifacts_with_probs(None);
        let flower = get_all_artifacts_with_probs(Some(SetKind::Flower));
        let first_flower = all.iter().find(|(a, _)| a.set == SetKind::Flower).unwrap();
        assert_eq!(flower[0].0, first_flower.0);
        assert!((flower[0].1 - first_flower.1 * SET_COUNT as f64).abs() < 1e-12);
    }

    #[test]
    fn test_canonical_sub_order() {
        for (art, _) in get_all_artifacts_with_probs(None) {
            for pair in art.subs.windows(2) {
                assert!(pair[0].0 < pair[1].0, "subs not canonical: {art}");
            }
        }
    }

    #[test]
    fn test_get_drop_edges() {
        let all = get_all_artifacts_with_probs(None);
        assert_eq!(get_drop(0.0), all[0].0);
        assert_eq!(
            get_drop(1.0 - 1e-12).set,
            all.last().unwrap().0.set
        );
    }
}
