use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::demographics::{DemographicProfile, Sex};
use super::response::ResponseSet;
use crate::error::CoreError;

/// One administration of an instrument to a patient.
///
/// The scoring result is stored as an opaque, immutable JSON snapshot once
/// the application reaches [`ApplicationStatus::Complete`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TestApplication {
    pub id: Uuid,
    pub instrument_id: String,
    pub birth_date: jiff::civil::Date,
    pub education_years: u32,
    pub sex: Sex,
    pub responses: ResponseSet,
    pub status: ApplicationStatus,
    pub result: Option<serde_json::Value>,
    pub error_reason: Option<String>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ApplicationStatus {
    #[serde(rename = "aguardando")]
    Waiting,
    #[serde(rename = "em_andamento")]
    InProgress,
    /// Terminal.
    #[serde(rename = "completo")]
    Complete,
    /// Terminal until retried; responses are preserved.
    #[serde(rename = "erro_calculo")]
    CalculationFailed,
}

impl ApplicationStatus {
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::{CalculationFailed, Complete, InProgress, Waiting};
        matches!(
            (self, next),
            (Waiting, InProgress)
                | (InProgress, Complete)
                | (InProgress, CalculationFailed)
                | (CalculationFailed, InProgress)
        )
    }
}

impl TestApplication {
    pub fn new(
        instrument_id: impl Into<String>,
        birth_date: jiff::civil::Date,
        education_years: u32,
        sex: Sex,
        at: jiff::Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument_id: instrument_id.into(),
            birth_date,
            education_years,
            sex,
            responses: ResponseSet::new(),
            status: ApplicationStatus::Waiting,
            result: None,
            error_reason: None,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn profile_on(&self, on: jiff::civil::Date) -> Result<DemographicProfile, CoreError> {
        DemographicProfile::from_birth_date(self.birth_date, on, self.education_years, self.sex)
    }

    /// `aguardando -> em_andamento`, or the retry edge out of `erro_calculo`.
    pub fn start(&mut self, at: jiff::Timestamp) -> Result<(), CoreError> {
        self.transition(ApplicationStatus::InProgress, at)?;
        self.error_reason = None;
        Ok(())
    }

    pub fn complete(
        &mut self,
        result: serde_json::Value,
        at: jiff::Timestamp,
    ) -> Result<(), CoreError> {
        self.transition(ApplicationStatus::Complete, at)?;
        self.result = Some(result);
        self.error_reason = None;
        Ok(())
    }

    /// Record a calculation failure. The response set is left untouched so
    /// the application can be retried without re-collecting answers.
    pub fn fail(
        &mut self,
        reason: impl Into<String>,
        at: jiff::Timestamp,
    ) -> Result<(), CoreError> {
        self.transition(ApplicationStatus::CalculationFailed, at)?;
        self.error_reason = Some(reason.into());
        Ok(())
    }

    fn transition(
        &mut self,
        next: ApplicationStatus,
        at: jiff::Timestamp,
    ) -> Result<(), CoreError> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = at;
        Ok(())
    }
}
