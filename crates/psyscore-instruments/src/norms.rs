//! Normative tables and demographic bin matching.

use std::collections::BTreeMap;

use psyscore_core::models::demographics::{DemographicProfile, Sex};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::convert::{ConversionTable, PercentileStep};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NormativeTable {
    pub id: String,
    pub name: String,
    pub bins: Vec<NormativeBin>,
}

/// One demographic partition of the normative sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NormativeBin {
    pub id: String,
    pub age: YearRange,
    pub education: YearRange,
    #[serde(default)]
    pub sex: SexFilter,
    pub distribution: BinDistribution,
}

/// Inclusive range of whole years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct YearRange {
    pub min: u32,
    pub max: u32,
}

impl YearRange {
    pub fn contains(&self, years: u32) -> bool {
        years >= self.min && years <= self.max
    }

    pub fn midpoint(&self) -> f64 {
        (f64::from(self.min) + f64::from(self.max)) / 2.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SexFilter {
    #[default]
    Any,
    Female,
    Male,
}

impl SexFilter {
    pub fn matches(self, sex: Sex) -> bool {
        match self {
            Self::Any => true,
            Self::Female => sex == Sex::Female,
            Self::Male => sex == Sex::Male,
        }
    }

    pub fn is_specific(self) -> bool {
        self != Self::Any
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum BinDistribution {
    /// Raw-score thresholds -> percentile.
    Percentiles { steps: Vec<PercentileStep> },
    MeanSd { mean: f64, sd: f64 },
    /// Per-scale and per-facet raw -> base rate -> percentile arrays.
    BaseRates {
        #[serde(default)]
        scales: BTreeMap<String, ConversionTable>,
        #[serde(default)]
        facets: BTreeMap<String, ConversionTable>,
    },
}

/// The bin a profile was normed against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinMatch<'a> {
    pub bin: &'a NormativeBin,
    /// The bin is the only one containing the profile on age, education
    /// and sex.
    pub exact: bool,
}

impl NormativeBin {
    pub fn contains(&self, profile: &DemographicProfile) -> bool {
        self.age.contains(profile.age)
            && self.education.contains(profile.education_years)
            && self.sex.matches(profile.sex)
    }

    /// Combined distance from the profile to the bin's age and education
    /// midpoints.
    pub fn distance(&self, profile: &DemographicProfile) -> f64 {
        (f64::from(profile.age) - self.age.midpoint()).abs()
            + (f64::from(profile.education_years) - self.education.midpoint()).abs()
    }
}

impl NormativeTable {
    pub fn match_profile(&self, profile: &DemographicProfile) -> Option<BinMatch<'_>> {
        match_bin(profile, &self.bins)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for bin in &self.bins {
            let invalid = |reason: &str| ValidationError::InvalidBin {
                bin: bin.id.clone(),
                reason: reason.to_string(),
            };
            if bin.age.min > bin.age.max {
                return Err(invalid("age range is inverted"));
            }
            if bin.education.min > bin.education.max {
                return Err(invalid("education range is inverted"));
            }
            match &bin.distribution {
                BinDistribution::Percentiles { steps } => {
                    let mut ordered = steps.clone();
                    ordered.sort_by(|a, b| a.raw.total_cmp(&b.raw));
                    if ordered.windows(2).any(|w| w[1].percentile < w[0].percentile) {
                        return Err(invalid("percentile steps are not monotonic"));
                    }
                }
                BinDistribution::MeanSd { sd, .. } => {
                    if sd.is_nan() || *sd <= 0.0 {
                        return Err(invalid("standard deviation must be positive"));
                    }
                }
                BinDistribution::BaseRates { .. } => {}
            }
        }
        Ok(())
    }
}

/// Select the bin a profile is normed against.
///
/// A single containing bin is an exact match. Otherwise the bin with the
/// smallest combined midpoint distance wins, searched among the containing
/// bins when there are several, else among sex-compatible bins, else among
/// all bins. Ties prefer sex-specific bins, then table order. An empty list
/// has no normalization.
///
/// A closer bin normed on the other sex never beats a sex-compatible one;
/// sex restricts the nearest-bin search rather than only breaking ties.
pub fn match_bin<'a>(
    profile: &DemographicProfile,
    bins: &'a [NormativeBin],
) -> Option<BinMatch<'a>> {
    let candidates: Vec<&NormativeBin> = bins.iter().filter(|b| b.contains(profile)).collect();

    if let [only] = candidates.as_slice() {
        debug!(bin = %only.id, "exact normative bin match");
        return Some(BinMatch {
            bin: *only,
            exact: true,
        });
    }

    let pool: Vec<&NormativeBin> = if candidates.is_empty() {
        let compatible: Vec<&NormativeBin> =
            bins.iter().filter(|b| b.sex.matches(profile.sex)).collect();
        if compatible.is_empty() {
            bins.iter().collect()
        } else {
            compatible
        }
    } else {
        candidates
    };

    let mut best: Option<(&NormativeBin, f64)> = None;
    for bin in pool {
        let distance = bin.distance(profile);
        let better = match best {
            None => true,
            Some((current, best_distance)) => {
                distance < best_distance
                    || (distance == best_distance
                        && bin.sex.is_specific()
                        && !current.sex.is_specific())
            }
        };
        if better {
            best = Some((bin, distance));
        }
    }

    best.map(|(bin, distance)| {
        debug!(bin = %bin.id, distance, "approximate normative bin match");
        BinMatch { bin, exact: false }
    })
}
