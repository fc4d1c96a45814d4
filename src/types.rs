//! Core value types: sets, affixes, artifacts, evaluation results, errors.
//!
//! [`Artifact`] carries a lossless single-line text form via `Display` /
//! `FromStr`:
//!
//! ```text
//! SET sands  |LV 0|MAIN hpp       |SUB  9,atk | 7,em  |10,cr  | 8,cd
//! ```
//!
//! The roll field is right-aligned in 2 characters, the affix left-aligned
//! in 4; an artifact with fewer than 4 subs emits a trailing `|` terminator.
//! Parsing normalizes whitespace and rejects names outside the canonical
//! tables.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{AFFIX_NUM, DOGFOOD_LOSS};

/// Fatal domain errors. The solver operates on validated inputs; none of
/// these are recoverable by retrying.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("shape error: {0}")]
    Shape(String),
    #[error("range error: {0}")]
    Range(String),
    #[error("lookup error: {0}")]
    Lookup(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// The five artifact slots. Declaration order is the canonical order used
/// for per-set indexing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetKind {
    Flower,
    Plume,
    Sands,
    Goblet,
    Circlet,
}

impl SetKind {
    pub const ALL: [SetKind; 5] = [
        SetKind::Flower,
        SetKind::Plume,
        SetKind::Sands,
        SetKind::Goblet,
        SetKind::Circlet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SetKind::Flower => "flower",
            SetKind::Plume => "plume",
            SetKind::Sands => "sands",
            SetKind::Goblet => "goblet",
            SetKind::Circlet => "circlet",
        }
    }

    /// Dense index for per-set arrays.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetKind {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, SolverError> {
        SetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SolverError::Parse(format!("unknown set name: {s:?}")))
    }
}

/// Every attribute an artifact can carry, main or sub. Declaration order is
/// the canonical lexicographic order used when sub lists are normalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AffixKind {
    #[serde(rename = "hp")]
    Hp,
    #[serde(rename = "atk")]
    Atk,
    #[serde(rename = "def")]
    Def,
    #[serde(rename = "hpp")]
    Hpp,
    #[serde(rename = "atkp")]
    Atkp,
    #[serde(rename = "defp")]
    Defp,
    #[serde(rename = "em")]
    Em,
    #[serde(rename = "er")]
    Er,
    #[serde(rename = "cr")]
    Cr,
    #[serde(rename = "cd")]
    Cd,
    #[serde(rename = "hb")]
    Hb,
    #[serde(rename = "pyroDB")]
    PyroDb,
    #[serde(rename = "hydroDB")]
    HydroDb,
    #[serde(rename = "electroDB")]
    ElectroDb,
    #[serde(rename = "anemoDB")]
    AnemoDb,
    #[serde(rename = "cryoDB")]
    CryoDb,
    #[serde(rename = "geoDB")]
    GeoDb,
    #[serde(rename = "physicalDB")]
    PhysicalDb,
    #[serde(rename = "dendroDB")]
    DendroDb,
}

impl AffixKind {
    pub const ALL: [AffixKind; 19] = [
        AffixKind::Hp,
        AffixKind::Atk,
        AffixKind::Def,
        AffixKind::Hpp,
        AffixKind::Atkp,
        AffixKind::Defp,
        AffixKind::Em,
        AffixKind::Er,
        AffixKind::Cr,
        AffixKind::Cd,
        AffixKind::Hb,
        AffixKind::PyroDb,
        AffixKind::HydroDb,
        AffixKind::ElectroDb,
        AffixKind::AnemoDb,
        AffixKind::CryoDb,
        AffixKind::GeoDb,
        AffixKind::PhysicalDb,
        AffixKind::DendroDb,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AffixKind::Hp => "hp",
            AffixKind::Atk => "atk",
            AffixKind::Def => "def",
            AffixKind::Hpp => "hpp",
            AffixKind::Atkp => "atkp",
            AffixKind::Defp => "defp",
            AffixKind::Em => "em",
            AffixKind::Er => "er",
            AffixKind::Cr => "cr",
            AffixKind::Cd => "cd",
            AffixKind::Hb => "hb",
            AffixKind::PyroDb => "pyroDB",
            AffixKind::HydroDb => "hydroDB",
            AffixKind::ElectroDb => "electroDB",
            AffixKind::AnemoDb => "anemoDB",
            AffixKind::CryoDb => "cryoDB",
            AffixKind::GeoDb => "geoDB",
            AffixKind::PhysicalDb => "physicalDB",
            AffixKind::DendroDb => "dendroDB",
        }
    }
}

impl fmt::Display for AffixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AffixKind {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, SolverError> {
        AffixKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SolverError::Parse(format!("unknown affix name: {s:?}")))
    }
}

/// Per-affix utility weights. Affixes absent from the map score zero.
pub type ScoreMap = BTreeMap<AffixKind, f64>;

/// One collectible piece. `subs` holds `(affix, accumulated value)` pairs;
/// at level 0 every value is a single roll in [7, 10], and each upgrade adds
/// a further roll to one slot. `level` counts completed upgrades (0..=5).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub set: SetKind,
    pub main: AffixKind,
    pub subs: Vec<(AffixKind, i32)>,
    pub level: i32,
}

impl Artifact {
    pub fn new(set: SetKind, main: AffixKind, subs: Vec<(AffixKind, i32)>, level: i32) -> Self {
        Self {
            set,
            main,
            subs,
            level,
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut subs = String::new();
        for &(affix, roll) in &self.subs {
            if !subs.is_empty() {
                subs.push('|');
            }
            subs.push_str(&format!("{:>2},{:<4}", roll, affix.as_str()));
        }
        if self.subs.len() < AFFIX_NUM {
            subs.push('|');
        }
        write!(
            f,
            "SET {:<7}|LV {}|MAIN {:<10}|SUB {}",
            self.set.as_str(),
            self.level,
            self.main.as_str(),
            subs
        )
    }
}

fn expect_header<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    name: &'static str,
) -> Result<(), SolverError> {
    match tokens.next() {
        Some(tok) if tok == name => Ok(()),
        other => Err(SolverError::Parse(format!(
            "expected {name} section, found {other:?}"
        ))),
    }
}

impl FromStr for Artifact {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, SolverError> {
        let normalized = s.replace('|', " ");
        let mut tokens = normalized.split_whitespace();

        expect_header(&mut tokens, "SET")?;
        let set: SetKind = tokens
            .next()
            .ok_or_else(|| SolverError::Parse("missing set name".into()))?
            .parse()?;
        expect_header(&mut tokens, "LV")?;
        let level_tok = tokens
            .next()
            .ok_or_else(|| SolverError::Parse("missing level".into()))?;
        let level: i32 = level_tok
            .parse()
            .map_err(|_| SolverError::Parse(format!("bad level: {level_tok:?}")))?;
        expect_header(&mut tokens, "MAIN")?;
        let main: AffixKind = tokens
            .next()
            .ok_or_else(|| SolverError::Parse("missing main affix".into()))?
            .parse()?;
        expect_header(&mut tokens, "SUB")?;

        let mut subs = Vec::new();
        for tok in tokens {
            let (roll_str, affix_str) = tok
                .split_once(',')
                .ok_or_else(|| SolverError::Parse(format!("malformed sub entry: {tok:?}")))?;
            let roll: i32 = roll_str
                .parse()
                .map_err(|_| SolverError::Parse(format!("bad sub roll: {roll_str:?}")))?;
            subs.push((affix_str.parse()?, roll));
        }

        Ok(Artifact {
            set,
            main,
            subs,
            level,
        })
    }
}

/// Outcome of evaluating one artifact under a utility model.
///
/// `upgrade == false` means feeding now dominates every upgrade policy; the
/// remaining fields then carry the feed value itself.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeEval {
    /// Whether continuing to upgrade beats feeding the piece away.
    pub upgrade: bool,
    /// Expected utility under the optimal stop-or-continue policy.
    pub expected_gain: f64,
    /// Expected net consumable cost of following that policy.
    pub expected_dogfood: f64,
    /// Probability the finished piece clears the score bar.
    pub success_rate: f64,
    /// Expected score above the bar, conditional on clearing it.
    pub expected_score_gain: f64,
}

impl UpgradeEval {
    /// The "feed as dogfood" terminal outcome for a piece that has already
    /// absorbed `current_upgrade` upgrade steps.
    pub fn feed(current_upgrade: usize) -> Self {
        let loss = DOGFOOD_LOSS[current_upgrade] as f64;
        Self {
            upgrade: false,
            expected_gain: loss,
            expected_dogfood: -loss,
            success_rate: 0.0,
            expected_score_gain: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Artifact {
        Artifact::new(
            SetKind::Sands,
            AffixKind::Hpp,
            vec![
                (AffixKind::Atk, 9),
                (AffixKind::Em, 7),
                (AffixKind::Cr, 10),
                (AffixKind::Cd, 8),
            ],
            0,
        )
    }

    #[test]
    fn test_display_format() {
        assert_eq!(
            sample().to_string(),
            "SET sands  |LV 0|MAIN hpp       |SUB  9,atk | 7,em  |10,cr  | 8,cd  "
        );
    }

    #[test]
    fn test_three_sub_terminator() {
        let mut art = sample();
        art.subs.pop();
        assert!(art.to_string().ends_with('|'));
    }

    #[test]
    fn test_round_trip() {
        let art = sample();
        let reparsed: Artifact = art.to_string().parse().unwrap();
        assert_eq!(reparsed, art);
    }

    #[test]
    fn test_parse_whitespace_tolerant() {
        let art: Artifact = "SET  sands | LV 2 | MAIN atkp | SUB 17,cr | 8,cd"
            .parse()
            .unwrap();
        assert_eq!(art.set, SetKind::Sands);
        assert_eq!(art.level, 2);
        assert_eq!(art.subs, vec![(AffixKind::Cr, 17), (AffixKind::Cd, 8)]);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("SET nowhere|LV 0|MAIN hp|SUB ".parse::<Artifact>().is_err());
        assert!("SET flower|LV 0|MAIN mana|SUB ".parse::<Artifact>().is_err());
        assert!("SET flower|LV x|MAIN hp|SUB ".parse::<Artifact>().is_err());
        assert!("SET flower|LV 0|MAIN hp|SUB 7-atk"
            .parse::<Artifact>()
            .is_err());
        assert!("LV 0|MAIN hp|SUB ".parse::<Artifact>().is_err());
    }

    #[test]
    fn test_feed_outcome() {
        let feed = UpgradeEval::feed(0);
        assert!(!feed.upgrade);
        assert_eq!(feed.expected_gain, 3780.0);
        assert_eq!(feed.expected_dogfood, -3780.0);
        let late = UpgradeEval::feed(5);
        assert_eq!(late.expected_gain, -50315.0);
        assert_eq!(late.expected_dogfood, 50315.0);
    }
}
