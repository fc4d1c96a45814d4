//! Run the cost inversion per set for a reference scoring model and print
//! the matching utility values with wall-clock timing.

use std::time::Instant;

use artifact_solver::gain_solver::find_gain;
use artifact_solver::types::{AffixKind, ScoreMap, SetKind};

fn main() {
    let scores: ScoreMap = [
        (AffixKind::Hp, 0.16),
        (AffixKind::Atk, 0.14),
        (AffixKind::Def, 0.0),
        (AffixKind::Hpp, 0.49),
        (AffixKind::Atkp, 0.29),
        (AffixKind::Defp, 0.0),
        (AffixKind::Em, 1.0),
        (AffixKind::Er, 0.0),
        (AffixKind::Cr, 0.92),
        (AffixKind::Cd, 0.72),
    ]
    .into_iter()
    .collect();
    let score_bar = 40.0;
    let target_cost = 12_000.0;

    println!("score bar {score_bar}, target cost {target_cost}");
    for set in SetKind::ALL {
        let start = Instant::now();
        match find_gain(&scores, score_bar, target_cost, Some(set)) {
            Ok(gain) => println!(
                "  {:7} gain {:>12.1}  ({:.2}s)",
                set.as_str(),
                gain,
                start.elapsed().as_secs_f64()
            ),
            Err(err) => {
                eprintln!("{}: {err}", set.as_str());
                std::process::exit(1);
            }
        }
    }
}
