//! Upgrade-state enumeration.
//!
//! An upgrade sequence of length k is k independent (slot, roll) picks:
//! slot uniform over the 4 sub slots, roll uniform over [7, 10]. Only the
//! per-slot accumulated increments matter to the score, so the 16^k
//! sequences collapse onto far fewer increment vectors. `routes[k]` lists
//! every reachable vector as a packed base-64 code together with the number
//! of sequences that produce it; `Σ count = 16^k`.
//!
//! Built once behind a process-wide [`OnceLock`]; rows are sorted by code,
//! which keeps every downstream iteration deterministic.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::constants::{
    AFFIX_NUM, AFFIX_UPDATE_MAX, AFFIX_UPDATE_MIN, MAX_UPGRADE_TIME, STATUS_BASE,
};

/// One table row set: (packed increment vector, route count), sorted by code.
pub type UpgradeRoutes = Vec<(u32, u32)>;

static UPGRADE_ROUTES: OnceLock<[UpgradeRoutes; MAX_UPGRADE_TIME + 1]> = OnceLock::new();

/// `upgrade_routes()[k]` enumerates the states reachable after k upgrades.
pub fn upgrade_routes() -> &'static [UpgradeRoutes; MAX_UPGRADE_TIME + 1] {
    UPGRADE_ROUTES.get_or_init(build_routes)
}

fn build_routes() -> [UpgradeRoutes; MAX_UPGRADE_TIME + 1] {
    std::array::from_fn(|k| {
        let mut grouped: BTreeMap<u32, u32> = BTreeMap::new();
        let mut digits = [0u32; AFFIX_NUM];
        collect_routes(k, &mut digits, &mut grouped);
        grouped.into_iter().collect()
    })
}

fn collect_routes(remaining: usize, digits: &mut [u32; AFFIX_NUM], grouped: &mut BTreeMap<u32, u32>) {
    if remaining == 0 {
        let mut code = 0u32;
        for slot in (0..AFFIX_NUM).rev() {
            code = code * STATUS_BASE + digits[slot];
        }
        *grouped.entry(code).or_insert(0) += 1;
        return;
    }
    for slot in 0..AFFIX_NUM {
        for roll in AFFIX_UPDATE_MIN..=AFFIX_UPDATE_MAX {
            digits[slot] += roll as u32;
            collect_routes(remaining - 1, digits, grouped);
            digits[slot] -= roll as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::status_digit;

    #[test]
    fn test_zero_upgrades() {
        assert_eq!(upgrade_routes()[0], vec![(0, 1)]);
    }

    #[test]
    fn test_one_upgrade() {
        let routes = &upgrade_routes()[1];
        // 4 slots x 4 rolls, every sequence its own vector.
        assert_eq!(routes.len(), 16);
        assert!(routes.iter().all(|&(_, count)| count == 1));
    }

    #[test]
    fn test_route_totals() {
        for (k, routes) in upgrade_routes().iter().enumerate() {
            let total: u64 = routes.iter().map(|&(_, count)| count as u64).sum();
            assert_eq!(total, 16u64.pow(k as u32), "k = {k}");
        }
    }

    #[test]
    fn test_digits_bounded() {
        for (k, routes) in upgrade_routes().iter().enumerate() {
            let cap = (k as u32) * AFFIX_UPDATE_MAX as u32;
            for &(code, _) in routes {
                let digit_sum: u32 = (0..AFFIX_NUM).map(|slot| status_digit(code, slot)).sum();
                assert!(digit_sum >= (k as u32) * AFFIX_UPDATE_MIN as u32);
                assert!(digit_sum <= cap);
                for slot in 0..AFFIX_NUM {
                    assert!(status_digit(code, slot) <= cap);
                }
            }
        }
    }

    #[test]
    fn test_rows_sorted() {
        for routes in upgrade_routes().iter() {
            for pair in routes.windows(2) {
                assert!(pair[0].0 < pair[1].0);
            }
        }
    }
}
