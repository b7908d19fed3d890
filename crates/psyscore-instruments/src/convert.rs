//! Statistical conversions: raw -> percentile / Z / T, and the two-stage
//! raw -> base rate -> percentile conversion used by multi-scale inventories.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::definition::ClassificationRange;
use crate::error::CalculationError;
use crate::interpret::classify;

/// One step of a percentile step function: scores `>= raw` rank at
/// `percentile` until the next step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PercentileStep {
    pub raw: f64,
    pub percentile: f64,
}

/// A single lookup entry, `from -> to`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LookupPoint {
    pub from: f64,
    pub to: f64,
}

/// Conversion arrays for one scale or facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConversionTable {
    pub raw_to_base_rate: Vec<LookupPoint>,
    pub base_rate_to_percentile: Vec<LookupPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScaleConversion {
    pub raw: f64,
    pub base_rate: f64,
    pub percentile: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
}

/// Percentile of the greatest threshold `<= raw`, clamped to `[0, 100]`.
/// Scores below every threshold rank at 0.
pub fn percentile(raw: f64, steps: &[PercentileStep]) -> f64 {
    steps
        .iter()
        .filter(|s| s.raw <= raw)
        .max_by(|a, b| a.raw.total_cmp(&b.raw))
        .map(|s| s.percentile)
        .unwrap_or(0.0)
        .clamp(0.0, 100.0)
}

/// `(raw - mean) / sd`, undefined for a zero SD or non-finite inputs.
pub fn z_score(raw: f64, mean: f64, sd: f64) -> Option<f64> {
    if sd == 0.0 || !raw.is_finite() || !mean.is_finite() || !sd.is_finite() {
        return None;
    }
    Some((raw - mean) / sd)
}

pub fn t_score(z: f64) -> f64 {
    (50.0 + 10.0 * z).round()
}

/// Percentile rank of `z` under the standard normal, to one decimal.
pub fn percentile_from_z(z: f64) -> f64 {
    let cdf = 0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2));
    ((cdf * 1000.0).round() / 10.0).clamp(0.0, 100.0)
}

// Abramowitz & Stegun 7.1.26, |error| < 1.5e-7.
const ERF_COEFFICIENTS: [f64; 5] = [
    0.254_829_592,
    -0.284_496_736,
    1.421_413_741,
    -1.453_152_027,
    1.061_405_429,
];

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t * ERF_COEFFICIENTS.iter().rev().fold(0.0, |acc, c| c + t * acc);
    sign * (1.0 - poly * (-x * x).exp())
}

/// Value of the entry whose key is nearest to `key`; ties go to the lower
/// key.
pub fn nearest(points: &[LookupPoint], key: f64) -> Option<f64> {
    points
        .iter()
        .min_by(|a, b| {
            let da = (a.from - key).abs();
            let db = (b.from - key).abs();
            da.total_cmp(&db).then(a.from.total_cmp(&b.from))
        })
        .map(|p| p.to)
}

/// Raw -> base rate -> percentile for a single scale.
pub fn convert_scale(
    scale: &str,
    raw: f64,
    table: &ConversionTable,
) -> Result<ScaleConversion, CalculationError> {
    let base_rate = nearest(&table.raw_to_base_rate, raw).ok_or_else(|| {
        CalculationError::EmptyConversionTable {
            scale: scale.to_string(),
            stage: "raw to base rate",
        }
    })?;
    let percentile = nearest(&table.base_rate_to_percentile, base_rate)
        .ok_or_else(|| CalculationError::EmptyConversionTable {
            scale: scale.to_string(),
            stage: "base rate to percentile",
        })?
        .clamp(0.0, 100.0);

    Ok(ScaleConversion {
        raw,
        base_rate,
        percentile,
        classification: None,
    })
}

/// Convert every scale in `raw_scores`. Each conversion only reads its own
/// table, so the order is irrelevant.
pub fn convert_scales(
    bin: &str,
    kind: &'static str,
    raw_scores: &BTreeMap<String, f64>,
    tables: &BTreeMap<String, ConversionTable>,
    bands: &[ClassificationRange],
) -> Result<BTreeMap<String, ScaleConversion>, CalculationError> {
    raw_scores
        .iter()
        .map(|(code, raw)| {
            let table = tables
                .get(code)
                .ok_or_else(|| CalculationError::MissingConversion {
                    bin: bin.to_string(),
                    kind,
                    scale: code.clone(),
                })?;
            let mut conversion = convert_scale(code, *raw, table)?;
            conversion.classification =
                classify(conversion.base_rate, bands).map(|r| r.label.clone());
            debug!(
                scale = %code,
                raw = conversion.raw,
                base_rate = conversion.base_rate,
                percentile = conversion.percentile,
                "{kind} converted"
            );
            Ok((code.clone(), conversion))
        })
        .collect()
}
