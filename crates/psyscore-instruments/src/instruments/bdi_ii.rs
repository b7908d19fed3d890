use std::collections::BTreeMap;

use super::{band, items, scale};
use crate::definition::{AlertRule, ScoreBasis, TestDefinition};
use crate::rules::ScoringRule;
use crate::Instrument;

/// BDI-II: Beck Depression Inventory, Second Edition.
/// 21 items rated 0–3, summed. Raw score 0–63.
pub struct BdiII;

impl Instrument for BdiII {
    fn definition(&self) -> &TestDefinition {
        static DEFINITION: std::sync::LazyLock<TestDefinition> = std::sync::LazyLock::new(|| {
            let prompts = [
                "Sadness",
                "Pessimism",
                "Past Failure",
                "Loss of Pleasure",
                "Guilty Feelings",
                "Punishment Feelings",
                "Self-Dislike",
                "Self-Criticalness",
                "Suicidal Thoughts or Wishes",
                "Crying",
                "Agitation",
                "Loss of Interest",
                "Indecisiveness",
                "Worthlessness",
                "Loss of Energy",
                "Changes in Sleeping Pattern",
                "Irritability",
                "Changes in Appetite",
                "Concentration Difficulty",
                "Tiredness or Fatigue",
                "Loss of Interest in Sex",
            ];

            TestDefinition {
                id: "bdi_ii".to_string(),
                name: "BDI-II".to_string(),
                items: items(&prompts, "intensity"),
                response_scales: BTreeMap::from([(
                    "intensity".to_string(),
                    scale(&[("0", 0.0), ("1", 1.0), ("2", 2.0), ("3", 3.0)]),
                )]),
                scoring: ScoringRule::Sum {
                    excluded_items: Vec::new(),
                    scale_max: Some(3.0),
                },
                classification_basis: ScoreBasis::Raw,
                classification_ranges: vec![
                    band(0.0, 13.0, "minimal", "Minimal depressive symptoms", None),
                    band(14.0, 19.0, "mild", "Mild depressive symptoms", None),
                    band(
                        20.0,
                        28.0,
                        "moderate",
                        "Moderate depressive symptoms",
                        Some("Consider referral for psychotherapy"),
                    ),
                    band(
                        29.0,
                        63.0,
                        "severe",
                        "Severe depressive symptoms",
                        Some("Refer for psychiatric evaluation"),
                    ),
                ],
                alerts: vec![AlertRule {
                    item: 9,
                    threshold: 1.0,
                    message: "Endorsed suicidal thoughts or wishes".to_string(),
                    action: "Conduct a suicide risk assessment before the session ends".to_string(),
                }],
                weighted_tables: BTreeMap::new(),
                scale_ranges: Vec::new(),
            }
        });
        &DEFINITION
    }
}
