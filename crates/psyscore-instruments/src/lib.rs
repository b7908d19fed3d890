//! psyscore-instruments
//!
//! Psychometric scoring, normalization and interpretation. Pure computation:
//! no storage, no I/O inside the pipeline. Callers supply the definition,
//! responses, demographic profile and normative table, and persist the
//! output.

pub mod answer;
pub mod assets;
pub mod convert;
pub mod definition;
pub mod error;
pub mod finalize;
pub mod instruments;
pub mod interpret;
pub mod norms;
pub mod pipeline;
pub mod rules;

use psyscore_core::models::demographics::DemographicProfile;
use psyscore_core::models::response::{ItemId, ResponseSet};

use answer::normalize;
use definition::TestDefinition;
use error::PipelineError;
use norms::NormativeTable;
use pipeline::PipelineOutput;

/// Trait implemented by each built-in instrument.
pub trait Instrument: Send + Sync {
    /// The full definition the pipeline scores against.
    fn definition(&self) -> &TestDefinition;

    /// Unique identifier for this instrument (e.g., "bdi_ii").
    fn id(&self) -> &str {
        &self.definition().id
    }

    /// Human-readable name (e.g., "BDI-II").
    fn name(&self) -> &str {
        &self.definition().name
    }

    /// Run the full pipeline against this instrument's definition.
    fn score(
        &self,
        responses: &ResponseSet,
        profile: &DemographicProfile,
        norms: Option<&NormativeTable>,
    ) -> Result<PipelineOutput, PipelineError> {
        pipeline::score_test(self.definition(), responses, profile, norms)
    }

    /// Answers that will not score: unknown items, or values that are not
    /// on the item's response scale. Useful for flagging data entry before
    /// finalizing.
    fn check_responses(&self, responses: &ResponseSet) -> Vec<ResponseIssue> {
        let definition = self.definition();
        let mut issues = Vec::new();
        for (id, answer) in responses {
            let Some(item) = definition.item(*id) else {
                issues.push(ResponseIssue {
                    item: *id,
                    message: format!("{}: item {id} does not exist", self.name()),
                });
                continue;
            };
            let scale = definition.scale_for(item);
            let on_scale = normalize(answer, scale)
                .is_some_and(|v| scale.is_some_and(|s| s.label_of(v).is_some()));
            if !on_scale {
                issues.push(ResponseIssue {
                    item: *id,
                    message: format!(
                        "{}: answer {answer:?} to item {id} is not on scale '{}'",
                        self.name(),
                        item.response_scale,
                    ),
                });
            }
        }
        issues
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseIssue {
    pub item: ItemId,
    pub message: String,
}

/// Return all registered instruments.
pub fn all_instruments() -> Vec<Box<dyn Instrument>> {
    vec![
        Box::new(instruments::bdi_ii::BdiII),
        Box::new(instruments::bai::Bai),
        Box::new(instruments::srq20::Srq20),
    ]
}

/// Look up an instrument by ID.
pub fn get_instrument(id: &str) -> Option<Box<dyn Instrument>> {
    all_instruments().into_iter().find(|i| i.id() == id)
}
