//! Built-in reference instruments.

pub mod bai;
pub mod bdi_ii;
pub mod srq20;

use crate::definition::{ClassificationRange, Item, ResponseScale, ScaleOption};

fn items(prompts: &[&str], response_scale: &str) -> Vec<Item> {
    prompts
        .iter()
        .zip(1..)
        .map(|(prompt, id)| Item {
            id,
            prompt: prompt.to_string(),
            response_scale: response_scale.to_string(),
            inverted: false,
            section: None,
        })
        .collect()
}

fn scale(options: &[(&str, f64)]) -> ResponseScale {
    ResponseScale {
        options: options
            .iter()
            .map(|(label, value)| ScaleOption {
                label: label.to_string(),
                value: *value,
            })
            .collect(),
    }
}

fn band(
    min: f64,
    max: f64,
    label: &str,
    description: &str,
    recommendation: Option<&str>,
) -> ClassificationRange {
    ClassificationRange {
        min,
        max,
        label: label.to_string(),
        description: description.to_string(),
        recommendation: recommendation.map(str::to_string),
    }
}
