//! Sample random drops and report what the probability model produces:
//! enumeration sizes, a few formatted drops, and the observed sub-affix
//! appearance frequencies against their weights.

use std::collections::BTreeMap;
use std::time::Instant;

use rand::Rng;

use artifact_solver::constants::SUB_PROB_WEIGHT;
use artifact_solver::drop_tables::{get_all_artifacts_with_probs, get_drop};
use artifact_solver::types::SetKind;

fn main() {
    let samples: usize = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(100_000);

    let start = Instant::now();
    let all = get_all_artifacts_with_probs(None);
    println!(
        "enumerated {} artifacts in {:.1} ms",
        all.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    for set in SetKind::ALL {
        println!(
            "  {:7} {:5} artifacts",
            set.as_str(),
            get_all_artifacts_with_probs(Some(set)).len()
        );
    }

    let mut rng = rand::rng();
    println!("\nexample drops:");
    for _ in 0..5 {
        println!("  {}", get_drop(rng.random()));
    }

    let mut appearances: BTreeMap<&str, u64> = BTreeMap::new();
    let mut sub_total = 0u64;
    for _ in 0..samples {
        let art = get_drop(rng.random());
        for &(affix, _) in &art.subs {
            *appearances.entry(affix.as_str()).or_insert(0) += 1;
            sub_total += 1;
        }
    }

    println!("\nsub appearance over {samples} drops (observed vs weight share):");
    for (affix, weight) in SUB_PROB_WEIGHT {
        let observed = *appearances.get(affix.as_str()).unwrap_or(&0) as f64 / sub_total as f64;
        println!(
            "  {:4} observed {:.4}  weight {:2}/44",
            affix.as_str(),
            observed,
            weight
        );
    }
}
