use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Sex {
    Female,
    Male,
    /// Not recorded. Only matches wildcard normative bins.
    Unspecified,
}

/// The demographic snapshot a score is normed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DemographicProfile {
    /// Age in whole years on the date of administration.
    pub age: u32,
    pub education_years: u32,
    pub sex: Sex,
}

impl DemographicProfile {
    /// Build a profile from a stored birth date, computing age on `on`.
    pub fn from_birth_date(
        birth_date: jiff::civil::Date,
        on: jiff::civil::Date,
        education_years: u32,
        sex: Sex,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            age: age_on(birth_date, on)?,
            education_years,
            sex,
        })
    }
}

/// Completed years between `birth_date` and `on`.
pub fn age_on(birth_date: jiff::civil::Date, on: jiff::civil::Date) -> Result<u32, CoreError> {
    if birth_date > on {
        return Err(CoreError::InvalidBirthDate { birth_date, on });
    }

    let mut years = i32::from(on.year()) - i32::from(birth_date.year());
    if (on.month(), on.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    Ok(years.max(0) as u32)
}
