//! Classification bands, clinical alerts and interpretation text.

use psyscore_core::models::response::{ItemId, ResponseSet};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::answer::normalized_response;
use crate::definition::{ClassificationRange, TestDefinition};
use crate::error::ValidationError;
use crate::pipeline::Normalization;
use crate::rules::RawScore;

/// Largest gap tolerated between consecutive ranges (one score point).
const MAX_RANGE_GAP: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Classification {
    pub label: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl From<&ClassificationRange> for Classification {
    fn from(range: &ClassificationRange) -> Self {
        Self {
            label: range.label.clone(),
            description: range.description.clone(),
            recommendation: range.recommendation.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Alert {
    pub item: ItemId,
    pub response: f64,
    pub message: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Interpretation {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    pub alerts: Vec<Alert>,
}

/// First range containing `value`.
pub fn classify(value: f64, ranges: &[ClassificationRange]) -> Option<&ClassificationRange> {
    ranges.iter().find(|r| r.contains(value))
}

/// Ranges must be well formed and, ordered by `min`, neither overlap nor
/// leave more than one score point uncovered between neighbours.
pub fn validate_ranges(
    ranges: &[ClassificationRange],
    context: &str,
) -> Result<(), ValidationError> {
    for range in ranges {
        if range.min.is_nan() || range.max.is_nan() || range.min > range.max {
            return Err(ValidationError::InvertedRange {
                context: context.to_string(),
                label: range.label.clone(),
                min: range.min,
                max: range.max,
            });
        }
    }

    let mut ordered: Vec<&ClassificationRange> = ranges.iter().collect();
    ordered.sort_by(|a, b| a.min.total_cmp(&b.min));

    for pair in ordered.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        if second.min <= first.max {
            return Err(ValidationError::OverlappingRanges {
                context: context.to_string(),
                first: first.label.clone(),
                second: second.label.clone(),
            });
        }
        if second.min - first.max > MAX_RANGE_GAP {
            return Err(ValidationError::RangeGap {
                context: context.to_string(),
                first: first.label.clone(),
                second: second.label.clone(),
            });
        }
    }
    Ok(())
}

/// Every alert rule whose item response reaches its threshold. Alerts are
/// independent of each other and of the classification.
pub fn scan_alerts(definition: &TestDefinition, responses: &ResponseSet) -> Vec<Alert> {
    definition
        .alerts
        .iter()
        .filter_map(|rule| {
            let item = definition.item(rule.item)?;
            let response = normalized_response(definition, responses, item)?;
            (response >= rule.threshold).then(|| Alert {
                item: rule.item,
                response,
                message: rule.message.clone(),
                action: rule.action.clone(),
            })
        })
        .collect()
}

pub fn interpret(
    definition: &TestDefinition,
    raw: &RawScore,
    normalization: Option<&Normalization>,
    classification: Option<Classification>,
    alerts: Vec<Alert>,
) -> Interpretation {
    let mut text = format!("{}: raw score {}", definition.name, format_score(raw.total));

    if let Some(norm) = normalization {
        let mut normed = Vec::new();
        if let Some(p) = norm.percentile {
            normed.push(format!("percentile {}", format_score(p)));
        }
        if let Some(t) = norm.t_score {
            normed.push(format!("T {}", format_score(t)));
        }
        if !normed.is_empty() {
            text.push_str(&format!(" ({})", normed.join(", ")));
        }
        if !norm.exact_match {
            text.push_str(&format!(", normed against nearest bin '{}'", norm.bin_applied));
        }
    }
    text.push('.');

    match &classification {
        Some(c) => text.push_str(&format!(" Classification: {}. {}", c.label, c.description)),
        None if !definition.classification_ranges.is_empty() => {
            text.push_str(" No classification available.")
        }
        None => {}
    }

    if let Some(norm) = normalization {
        for (kind, conversions) in [("Scale", &norm.scales), ("Facet", &norm.facets)] {
            for (code, conversion) in conversions {
                text.push_str(&format!(
                    "\n{kind} {code}: raw {}, base rate {}, percentile {}",
                    format_score(conversion.raw),
                    format_score(conversion.base_rate),
                    format_score(conversion.percentile),
                ));
                if let Some(label) = &conversion.classification {
                    text.push_str(&format!(" ({label})"));
                }
            }
        }
    }

    if !alerts.is_empty() {
        text.push_str(&format!("\nClinical alerts: {}", alerts.len()));
        for alert in &alerts {
            text.push_str(&format!("\n- Item {}: {}", alert.item, alert.message));
        }
    }

    Interpretation {
        text,
        recommendation: classification.as_ref().and_then(|c| c.recommendation.clone()),
        classification,
        alerts,
    }
}

/// Whole numbers print without decimals; everything else to two places.
pub fn format_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
