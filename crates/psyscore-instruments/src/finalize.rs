//! Applies a pipeline run to a [`TestApplication`] record.
//!
//! The caller decides when to finalize and persists the record afterwards;
//! this only drives the status transitions that go with the result.

use psyscore_core::models::application::{ApplicationStatus, TestApplication};
use tracing::{info, warn};

use crate::definition::TestDefinition;
use crate::error::{FinalizeError, PipelineError};
use crate::norms::NormativeTable;
use crate::pipeline::{score_test, PipelineOutput};

/// Score `application` and record the outcome on it.
///
/// - success: the output is stored as the result snapshot, status
///   `completo`.
/// - calculation failure: status `erro_calculo` with the reason; responses
///   are untouched so the call can simply be repeated.
/// - validation failure: checked before any transition, so the record is
///   left exactly as it was, including a previous failure reason.
pub fn finalize(
    application: &mut TestApplication,
    definition: &TestDefinition,
    norms: Option<&NormativeTable>,
    administered_on: jiff::civil::Date,
    at: jiff::Timestamp,
) -> Result<PipelineOutput, FinalizeError> {
    if application.instrument_id != definition.id {
        return Err(FinalizeError::InstrumentMismatch {
            application: application.instrument_id.clone(),
            definition: definition.id.clone(),
        });
    }

    definition.validate().map_err(PipelineError::from)?;
    if let Some(table) = norms {
        table.validate().map_err(PipelineError::from)?;
    }
    let profile = application.profile_on(administered_on)?;

    if application.status != ApplicationStatus::InProgress {
        application.start(at)?;
    }

    match score_test(definition, &application.responses, &profile, norms) {
        Ok(output) => {
            let snapshot = serde_json::to_value(&output)?;
            application.complete(snapshot, at)?;
            info!(
                application = %application.id,
                instrument = %definition.id,
                "test application finalized"
            );
            Ok(output)
        }
        Err(PipelineError::Calculation(err)) => {
            application.fail(err.to_string(), at)?;
            warn!(
                application = %application.id,
                instrument = %definition.id,
                error = %err,
                "test application calculation failed"
            );
            Err(PipelineError::Calculation(err).into())
        }
        Err(err) => Err(err.into()),
    }
}
