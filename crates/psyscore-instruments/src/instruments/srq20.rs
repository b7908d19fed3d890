use std::collections::BTreeMap;

use super::{band, items, scale};
use crate::definition::{AlertRule, ScoreBasis, TestDefinition};
use crate::rules::ScoringRule;
use crate::Instrument;

/// SRQ-20: WHO Self-Reporting Questionnaire.
/// 20 yes/no items, each "yes" scoring one point. Cut-off 7/8.
pub struct Srq20;

impl Instrument for Srq20 {
    fn definition(&self) -> &TestDefinition {
        static DEFINITION: std::sync::LazyLock<TestDefinition> = std::sync::LazyLock::new(|| {
            let prompts = [
                "Do you often have headaches?",
                "Is your appetite poor?",
                "Do you sleep badly?",
                "Are you easily frightened?",
                "Do your hands shake?",
                "Do you feel nervous, tense or worried?",
                "Is your digestion poor?",
                "Do you have trouble thinking clearly?",
                "Do you feel unhappy?",
                "Do you cry more than usual?",
                "Do you find it difficult to enjoy your daily activities?",
                "Do you find it difficult to make decisions?",
                "Is your daily work suffering?",
                "Are you unable to play a useful part in life?",
                "Have you lost interest in things?",
                "Do you feel that you are a worthless person?",
                "Has the thought of ending your life been on your mind?",
                "Do you feel tired all the time?",
                "Do you have uncomfortable feelings in your stomach?",
                "Are you easily tired?",
            ];

            TestDefinition {
                id: "srq20".to_string(),
                name: "SRQ-20".to_string(),
                items: items(&prompts, "yes_no"),
                response_scales: BTreeMap::from([(
                    "yes_no".to_string(),
                    scale(&[("Yes", 1.0), ("No", 0.0)]),
                )]),
                scoring: ScoringRule::ItemSpecific,
                classification_basis: ScoreBasis::Raw,
                classification_ranges: vec![
                    band(0.0, 7.0, "negative", "Below the screening cut-off", None),
                    band(
                        8.0,
                        20.0,
                        "positive",
                        "Screening suggests a common mental disorder",
                        Some("Schedule a diagnostic interview"),
                    ),
                ],
                alerts: vec![AlertRule {
                    item: 17,
                    threshold: 1.0,
                    message: "Reported thoughts of ending their life".to_string(),
                    action: "Assess suicide risk and safety plan".to_string(),
                }],
                weighted_tables: BTreeMap::new(),
                scale_ranges: Vec::new(),
            }
        });
        &DEFINITION
    }
}
