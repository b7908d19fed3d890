#![allow(dead_code)]

use std::collections::BTreeMap;

use psyscore_core::models::demographics::{DemographicProfile, Sex};
use psyscore_core::models::response::{Answer, ItemId, ResponseSet};
use psyscore_instruments::definition::{
    ClassificationRange, Item, ResponseScale, ScaleOption, ScoreBasis, TestDefinition,
};
use psyscore_instruments::rules::ScoringRule;

/// `count` items on a single `0..=max` scale labelled by their value.
pub fn definition(count: u32, max: u32, scoring: ScoringRule) -> TestDefinition {
    let options = (0..=max)
        .map(|v| ScaleOption {
            label: v.to_string(),
            value: f64::from(v),
        })
        .collect();
    definition_with_scale(count, ResponseScale { options }, scoring)
}

pub fn definition_with_scale(count: u32, scale: ResponseScale, scoring: ScoringRule) -> TestDefinition {
    TestDefinition {
        id: "test".to_string(),
        name: "Test Inventory".to_string(),
        items: (1..=count)
            .map(|id| Item {
                id,
                prompt: format!("Item {id}"),
                response_scale: "main".to_string(),
                inverted: false,
                section: None,
            })
            .collect(),
        response_scales: BTreeMap::from([("main".to_string(), scale)]),
        scoring,
        classification_basis: ScoreBasis::Raw,
        classification_ranges: Vec::new(),
        alerts: Vec::new(),
        weighted_tables: BTreeMap::new(),
        scale_ranges: Vec::new(),
    }
}

pub fn sum() -> ScoringRule {
    ScoringRule::Sum {
        excluded_items: Vec::new(),
        scale_max: None,
    }
}

pub fn true_false() -> ResponseScale {
    ResponseScale {
        options: vec![
            ScaleOption {
                label: "V".to_string(),
                value: 1.0,
            },
            ScaleOption {
                label: "F".to_string(),
                value: 0.0,
            },
        ],
    }
}

pub fn range(min: f64, max: f64, label: &str) -> ClassificationRange {
    ClassificationRange {
        min,
        max,
        label: label.to_string(),
        description: format!("{label} range"),
        recommendation: None,
    }
}

pub fn uniform(count: u32, answer: Answer) -> ResponseSet {
    (1..=count).map(|id| (id, answer.clone())).collect()
}

pub fn responses(pairs: &[(ItemId, Answer)]) -> ResponseSet {
    pairs.iter().cloned().collect()
}

pub fn profile(age: u32, education_years: u32, sex: Sex) -> DemographicProfile {
    DemographicProfile {
        age,
        education_years,
        sex,
    }
}
