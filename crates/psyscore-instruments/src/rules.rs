//! Scoring-rule descriptors and the dispatcher that executes them.

use std::collections::{BTreeMap, BTreeSet};

use psyscore_core::models::response::{Answer, ItemId, ResponseSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::answer::{label_form, normalized_response};
use crate::definition::{Item, ResponseScale, TestDefinition};
use crate::error::{CalculationError, PipelineError, ValidationError};

/// How an instrument turns responses into a raw score. One variant per
/// methodology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "method", rename_all = "snake_case")]
#[ts(export)]
pub enum ScoringRule {
    /// Sum of normalized responses. Inverted items score `max - value`.
    Sum {
        #[serde(default)]
        excluded_items: Vec<ItemId>,
        /// Overrides the maximum inferred from each item's response scale.
        #[serde(default)]
        scale_max: Option<f64>,
    },
    /// One point per item whose answer matches the key (gabarito).
    AnswerKey { key: BTreeMap<ItemId, Answer> },
    /// Sum per contiguous section; the total is the sum of subtotals.
    Sectioned {
        sections: Vec<Section>,
        #[serde(default)]
        scale_max: Option<f64>,
    },
    /// Each normalized response is the item's point value.
    ItemSpecific,
    /// Per-scale `2 * weighted + unweighted`, tables taken from
    /// [`TestDefinition::weighted_tables`].
    WeightedFormula {
        scales: Vec<String>,
        #[serde(default)]
        facets: Vec<String>,
    },
}

/// Inclusive, 1-based positions in the definition's item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Section {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RawScore {
    pub total: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scales: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facets: BTreeMap<String, f64>,
    /// Items the rule considered that were unanswered or did not match
    /// their response scale. They scored zero.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unscored_items: Vec<ItemId>,
}

/// Validate `definition` and score `responses` with its rule.
pub fn dispatch(
    definition: &TestDefinition,
    responses: &ResponseSet,
) -> Result<RawScore, PipelineError> {
    definition.validate()?;
    Ok(definition.scoring.compute(definition, responses)?)
}

impl ScoringRule {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Sum { .. } => "sum",
            Self::AnswerKey { .. } => "answer_key",
            Self::Sectioned { .. } => "sectioned",
            Self::ItemSpecific => "item_specific",
            Self::WeightedFormula { .. } => "weighted_formula",
        }
    }

    pub fn validate(&self, definition: &TestDefinition) -> Result<(), ValidationError> {
        match self {
            Self::Sum {
                excluded_items,
                scale_max,
            } => {
                for id in excluded_items {
                    require_item(definition, *id, "exclusion list")?;
                }
                let included = definition
                    .items
                    .iter()
                    .filter(|i| !excluded_items.contains(&i.id));
                require_inversion_max(definition, included, *scale_max)
            }
            Self::AnswerKey { key } => {
                if key.is_empty() {
                    return Err(ValidationError::EmptyAnswerKey);
                }
                for id in key.keys() {
                    require_item(definition, *id, "answer key")?;
                }
                Ok(())
            }
            Self::Sectioned {
                sections,
                scale_max,
            } => {
                validate_sections(sections, definition.items.len())?;
                require_inversion_max(definition, definition.items.iter(), *scale_max)
            }
            Self::ItemSpecific => Ok(()),
            Self::WeightedFormula { scales, facets } => {
                if scales.is_empty() {
                    return Err(ValidationError::NoWeightedScales);
                }
                for code in scales.iter().chain(facets) {
                    let Some(table) = definition.weighted_tables.get(code) else {
                        // Reported as a calculation error when scored.
                        continue;
                    };
                    if let Some(item) = table
                        .weighted_items
                        .iter()
                        .find(|id| table.unweighted_items.contains(id))
                    {
                        return Err(ValidationError::ConflictingWeight {
                            scale: code.clone(),
                            item: *item,
                        });
                    }
                }
                Ok(())
            }
        }
    }

    /// Score an already validated definition.
    pub(crate) fn compute(
        &self,
        definition: &TestDefinition,
        responses: &ResponseSet,
    ) -> Result<RawScore, CalculationError> {
        let scale_max = match self {
            Self::Sum { scale_max, .. } | Self::Sectioned { scale_max, .. } => *scale_max,
            _ => None,
        };
        let mut tally = Tally::new(definition, responses, scale_max);
        let mut raw = RawScore::default();

        match self {
            Self::Sum { excluded_items, .. } => {
                raw.total = definition
                    .items
                    .iter()
                    .filter(|i| !excluded_items.contains(&i.id))
                    .map(|i| tally.summed(i))
                    .sum();
            }
            Self::AnswerKey { key } => {
                let mut hits = 0u32;
                for (id, expected) in key {
                    let scale = definition.item(*id).and_then(|i| definition.scale_for(i));
                    match responses.get(id) {
                        Some(answer) => {
                            if label_form(answer, scale) == label_form(expected, scale) {
                                hits += 1;
                            }
                        }
                        None => {
                            tally.unscored.insert(*id);
                        }
                    }
                }
                raw.total = f64::from(hits);
            }
            Self::Sectioned { sections, .. } => {
                for section in sections {
                    let items = definition
                        .items
                        .get(section.start.saturating_sub(1)..section.end)
                        .unwrap_or_default();
                    let subtotal: f64 = items.iter().map(|i| tally.summed(i)).sum();
                    raw.total += subtotal;
                    raw.sections.insert(section.name.clone(), subtotal);
                }
            }
            Self::ItemSpecific => {
                raw.total = definition.items.iter().map(|i| tally.value(i.id)).sum();
            }
            Self::WeightedFormula { scales, facets } => {
                raw.scales = weighted_scores(definition, &mut tally, scales)?;
                raw.facets = weighted_scores(definition, &mut tally, facets)?;
                raw.total = definition.items.iter().map(|i| tally.value(i.id)).sum();
            }
        }

        if !raw.total.is_finite() {
            return Err(CalculationError::NonFinite("total".to_string()));
        }

        raw.unscored_items = tally.unscored.into_iter().collect();
        if !raw.unscored_items.is_empty() {
            warn!(
                instrument = %definition.id,
                items = ?raw.unscored_items,
                "items contributed no score"
            );
        }
        debug!(
            instrument = %definition.id,
            method = self.method(),
            total = raw.total,
            "raw score computed"
        );
        Ok(raw)
    }
}

/// Normalized responses, computed in a single pass over the item list.
struct Tally {
    values: BTreeMap<ItemId, Option<f64>>,
    inversion_max: BTreeMap<ItemId, f64>,
    unscored: BTreeSet<ItemId>,
}

impl Tally {
    fn new(definition: &TestDefinition, responses: &ResponseSet, scale_max: Option<f64>) -> Self {
        let values = definition
            .items
            .iter()
            .map(|i| (i.id, normalized_response(definition, responses, i)))
            .collect();
        let inversion_max = definition
            .items
            .iter()
            .filter(|i| i.inverted)
            .filter_map(|i| Some((i.id, inversion_max(definition, i, scale_max)?)))
            .collect();
        Self {
            values,
            inversion_max,
            unscored: BTreeSet::new(),
        }
    }

    fn value(&mut self, id: ItemId) -> f64 {
        match self.values.get(&id).copied().flatten() {
            Some(v) => v,
            None => {
                self.unscored.insert(id);
                0.0
            }
        }
    }

    /// Plain-sum contribution. Unanswered inverted items still score zero.
    fn summed(&mut self, item: &Item) -> f64 {
        let Some(value) = self.values.get(&item.id).copied().flatten() else {
            self.unscored.insert(item.id);
            return 0.0;
        };
        match self.inversion_max.get(&item.id) {
            Some(max) if item.inverted => max - value,
            _ => value,
        }
    }
}

fn weighted_scores(
    definition: &TestDefinition,
    tally: &mut Tally,
    codes: &[String],
) -> Result<BTreeMap<String, f64>, CalculationError> {
    let mut scores = BTreeMap::new();
    for code in codes {
        let table = definition
            .weighted_tables
            .get(code)
            .ok_or_else(|| CalculationError::MissingScaleTable {
                scale: code.clone(),
            })?;

        let mut weighted = 0.0;
        for id in &table.weighted_items {
            weighted += tally_item(definition, tally, code, *id)?;
        }
        let mut unweighted = 0.0;
        for id in &table.unweighted_items {
            unweighted += tally_item(definition, tally, code, *id)?;
        }
        scores.insert(code.clone(), 2.0 * weighted + unweighted);
    }
    Ok(scores)
}

fn tally_item(
    definition: &TestDefinition,
    tally: &mut Tally,
    scale: &str,
    id: ItemId,
) -> Result<f64, CalculationError> {
    if definition.item(id).is_none() {
        return Err(CalculationError::UnknownItem {
            scale: scale.to_string(),
            item: id,
        });
    }
    Ok(tally.value(id))
}

fn inversion_max(definition: &TestDefinition, item: &Item, explicit: Option<f64>) -> Option<f64> {
    explicit.or_else(|| definition.scale_for(item).and_then(ResponseScale::max_value))
}

fn require_item(
    definition: &TestDefinition,
    id: ItemId,
    context: &str,
) -> Result<(), ValidationError> {
    match definition.item(id) {
        Some(_) => Ok(()),
        None => Err(ValidationError::UnknownItem {
            context: context.to_string(),
            item: id,
        }),
    }
}

fn require_inversion_max<'a>(
    definition: &TestDefinition,
    items: impl Iterator<Item = &'a Item>,
    explicit: Option<f64>,
) -> Result<(), ValidationError> {
    for item in items.filter(|i| i.inverted) {
        if inversion_max(definition, item, explicit).is_none() {
            return Err(ValidationError::MissingScaleMaximum { item: item.id });
        }
    }
    Ok(())
}

/// Sections must partition the item list exactly once.
fn validate_sections(sections: &[Section], item_count: usize) -> Result<(), ValidationError> {
    if sections.is_empty() {
        return Err(ValidationError::NoSections);
    }

    let mut names = BTreeSet::new();
    for section in sections {
        if !names.insert(section.name.as_str()) {
            return Err(ValidationError::DuplicateSection(section.name.clone()));
        }
        if section.start == 0 || section.start > section.end || section.end > item_count {
            return Err(ValidationError::SectionOutOfBounds {
                section: section.name.clone(),
                start: section.start,
                end: section.end,
                item_count,
            });
        }
    }

    let mut ordered: Vec<&Section> = sections.iter().collect();
    ordered.sort_by_key(|s| (s.start, s.end));

    let mut next = 1;
    let mut previous: Option<&Section> = None;
    for section in ordered {
        if section.start < next
            && let Some(prev) = previous
        {
            return Err(ValidationError::SectionOverlap {
                first: prev.name.clone(),
                second: section.name.clone(),
            });
        }
        if section.start > next {
            return Err(ValidationError::SectionGap {
                start: next,
                end: section.start - 1,
            });
        }
        next = section.end + 1;
        previous = Some(section);
    }

    if next <= item_count {
        return Err(ValidationError::SectionGap {
            start: next,
            end: item_count,
        });
    }
    Ok(())
}
