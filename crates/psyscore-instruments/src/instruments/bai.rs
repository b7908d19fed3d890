use std::collections::BTreeMap;

use super::{band, items, scale};
use crate::definition::{ScoreBasis, TestDefinition};
use crate::rules::ScoringRule;
use crate::Instrument;

/// BAI: Beck Anxiety Inventory.
/// 21 symptoms rated by how much they bothered the patient in the past
/// month. Raw score 0–63.
pub struct Bai;

impl Instrument for Bai {
    fn definition(&self) -> &TestDefinition {
        static DEFINITION: std::sync::LazyLock<TestDefinition> = std::sync::LazyLock::new(|| {
            let prompts = [
                "Numbness or tingling",
                "Feeling hot",
                "Wobbliness in legs",
                "Unable to relax",
                "Fear of worst happening",
                "Dizzy or lightheaded",
                "Heart pounding or racing",
                "Unsteady",
                "Terrified or afraid",
                "Nervous",
                "Feeling of choking",
                "Hands trembling",
                "Shaky or unsteady",
                "Fear of losing control",
                "Difficulty in breathing",
                "Fear of dying",
                "Scared",
                "Indigestion",
                "Faint or lightheaded",
                "Face flushed",
                "Hot or cold sweats",
            ];

            TestDefinition {
                id: "bai".to_string(),
                name: "BAI".to_string(),
                items: items(&prompts, "bother"),
                response_scales: BTreeMap::from([(
                    "bother".to_string(),
                    scale(&[
                        ("Not at all", 0.0),
                        ("Mildly", 1.0),
                        ("Moderately", 2.0),
                        ("Severely", 3.0),
                    ]),
                )]),
                scoring: ScoringRule::Sum {
                    excluded_items: Vec::new(),
                    scale_max: None,
                },
                classification_basis: ScoreBasis::Raw,
                classification_ranges: vec![
                    band(0.0, 7.0, "minimal", "Minimal anxiety", None),
                    band(8.0, 15.0, "mild", "Mild anxiety", None),
                    band(16.0, 25.0, "moderate", "Moderate anxiety", None),
                    band(
                        26.0,
                        63.0,
                        "severe",
                        "Severe anxiety",
                        Some("Evaluate for an anxiety disorder"),
                    ),
                ],
                alerts: Vec::new(),
                weighted_tables: BTreeMap::new(),
                scale_ranges: Vec::new(),
            }
        });
        &DEFINITION
    }
}
