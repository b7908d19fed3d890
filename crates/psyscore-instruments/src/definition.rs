use std::collections::{BTreeMap, BTreeSet};

use psyscore_core::models::response::ItemId;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::interpret::validate_ranges;
use crate::rules::ScoringRule;

/// Everything the pipeline needs to know about an instrument.
///
/// Definitions are data assets: built-in ones are constructed in
/// [`crate::instruments`], everything else arrives as versioned JSON through
/// [`crate::assets`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TestDefinition {
    pub id: String,
    pub name: String,
    pub items: Vec<Item>,
    pub response_scales: BTreeMap<String, ResponseScale>,
    pub scoring: ScoringRule,
    /// Which score the classification ranges are expressed in.
    #[serde(default)]
    pub classification_basis: ScoreBasis,
    #[serde(default)]
    pub classification_ranges: Vec<ClassificationRange>,
    #[serde(default)]
    pub alerts: Vec<AlertRule>,
    /// `scale_code -> {weighted_items, unweighted_items}` for weighted-formula
    /// instruments.
    #[serde(default)]
    pub weighted_tables: BTreeMap<String, WeightedScale>,
    /// Base-rate bands applied to every converted scale and facet.
    #[serde(default)]
    pub scale_ranges: Vec<ClassificationRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    pub id: ItemId,
    pub prompt: String,
    /// Key into [`TestDefinition::response_scales`].
    pub response_scale: String,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub section: Option<String>,
}

/// An ordered list of answer options and the value each one scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResponseScale {
    pub options: Vec<ScaleOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScaleOption {
    pub label: String,
    pub value: f64,
}

impl ResponseScale {
    pub fn max_value(&self) -> Option<f64> {
        self.options.iter().map(|o| o.value).reduce(f64::max)
    }

    /// Case-sensitive label lookup.
    pub fn value_of(&self, label: &str) -> Option<f64> {
        self.options.iter().find(|o| o.label == label).map(|o| o.value)
    }

    pub fn label_of(&self, value: f64) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ScoreBasis {
    #[default]
    Raw,
    Percentile,
    TScore,
}

/// An inclusive `[min, max]` band and how to describe a score inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClassificationRange {
    pub min: f64,
    pub max: f64,
    pub label: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl ClassificationRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Fires when the referenced item's normalized response reaches `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AlertRule {
    pub item: ItemId,
    pub threshold: f64,
    pub message: String,
    pub action: String,
}

/// Item assignment for one scale of a weighted-formula instrument.
/// Weighted items count double.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WeightedScale {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub weighted_items: Vec<ItemId>,
    #[serde(default)]
    pub unweighted_items: Vec<ItemId>,
}

impl TestDefinition {
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn scale_for(&self, item: &Item) -> Option<&ResponseScale> {
        self.response_scales.get(&item.response_scale)
    }

    /// Check the definition is internally consistent. Nothing is scored if
    /// this fails.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }

        let mut seen = BTreeSet::new();
        for item in &self.items {
            if !seen.insert(item.id) {
                return Err(ValidationError::DuplicateItem(item.id));
            }
            if !self.response_scales.contains_key(&item.response_scale) {
                return Err(ValidationError::UnknownResponseScale {
                    item: item.id,
                    scale: item.response_scale.clone(),
                });
            }
        }

        for rule in &self.alerts {
            if self.item(rule.item).is_none() {
                return Err(ValidationError::UnknownItem {
                    context: "alert rule".to_string(),
                    item: rule.item,
                });
            }
        }

        self.scoring.validate(self)?;
        validate_ranges(&self.classification_ranges, "classification ranges")?;
        validate_ranges(&self.scale_ranges, "scale ranges")?;
        Ok(())
    }
}
