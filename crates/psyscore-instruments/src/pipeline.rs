//! The scoring pipeline: normalize answers, dispatch the scoring rule, norm
//! against the matched demographic bin, classify and interpret.
//!
//! Every step is a pure function of its inputs. Identical inputs always
//! serialize to identical output, so re-running after a failed finalize is
//! safe.

use std::collections::BTreeMap;

use psyscore_core::models::demographics::DemographicProfile;
use psyscore_core::models::response::ResponseSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::convert::{
    convert_scales, percentile, percentile_from_z, t_score, z_score, ScaleConversion,
};
use crate::definition::{ScoreBasis, TestDefinition};
use crate::error::PipelineError;
use crate::interpret::{classify, interpret, scan_alerts, Classification, Interpretation};
use crate::norms::{BinDistribution, NormativeTable};
use crate::rules::RawScore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Normalization {
    pub table_used: String,
    pub bin_applied: String,
    pub exact_match: bool,
    pub percentile: Option<f64>,
    pub z_score: Option<f64>,
    pub t_score: Option<f64>,
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scales: BTreeMap<String, ScaleConversion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facets: BTreeMap<String, ScaleConversion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PipelineOutput {
    pub raw_score: RawScore,
    pub normalization: Option<Normalization>,
    pub interpretation: Interpretation,
}

/// Score one set of responses end to end.
///
/// `norms` is optional: without it, or with an empty bin list, only the raw
/// score and raw-basis classification are produced.
pub fn score_test(
    definition: &TestDefinition,
    responses: &ResponseSet,
    profile: &DemographicProfile,
    norms: Option<&NormativeTable>,
) -> Result<PipelineOutput, PipelineError> {
    definition.validate()?;
    if let Some(table) = norms {
        table.validate()?;
    }

    let raw_score = definition.scoring.compute(definition, responses)?;

    let mut normalization = match norms {
        Some(table) => normalize(definition, &raw_score, profile, table)?,
        None => None,
    };

    let classification = classification_value(definition, &raw_score, normalization.as_ref())
        .and_then(|value| classify(value, &definition.classification_ranges))
        .map(Classification::from);
    if let Some(norm) = normalization.as_mut() {
        norm.classification = classification.clone();
    }

    let alerts = scan_alerts(definition, responses);
    if !alerts.is_empty() {
        warn!(instrument = %definition.id, count = alerts.len(), "clinical alerts raised");
    }

    let interpretation = interpret(
        definition,
        &raw_score,
        normalization.as_ref(),
        classification,
        alerts,
    );

    info!(
        instrument = %definition.id,
        total = raw_score.total,
        normed = normalization.is_some(),
        "test scored"
    );

    Ok(PipelineOutput {
        raw_score,
        normalization,
        interpretation,
    })
}

fn normalize(
    definition: &TestDefinition,
    raw: &RawScore,
    profile: &DemographicProfile,
    table: &NormativeTable,
) -> Result<Option<Normalization>, PipelineError> {
    let Some(matched) = table.match_profile(profile) else {
        debug!(table = %table.id, "normative table has no bins");
        return Ok(None);
    };
    let bin = matched.bin;
    if !matched.exact {
        warn!(
            table = %table.id,
            bin = %bin.id,
            age = profile.age,
            education_years = profile.education_years,
            "no exact normative bin, using nearest"
        );
    }

    let mut normalization = Normalization {
        table_used: table.id.clone(),
        bin_applied: bin.id.clone(),
        exact_match: matched.exact,
        percentile: None,
        z_score: None,
        t_score: None,
        classification: None,
        scales: BTreeMap::new(),
        facets: BTreeMap::new(),
    };

    match &bin.distribution {
        BinDistribution::Percentiles { steps } => {
            normalization.percentile = Some(percentile(raw.total, steps));
        }
        BinDistribution::MeanSd { mean, sd } => {
            let z = z_score(raw.total, *mean, *sd);
            normalization.z_score = z;
            normalization.t_score = z.map(t_score);
            normalization.percentile = z.map(percentile_from_z);
        }
        BinDistribution::BaseRates { scales, facets } => {
            if raw.scales.is_empty() && raw.facets.is_empty() {
                debug!(bin = %bin.id, "base-rate bin applied to a single-total instrument");
            }
            normalization.scales =
                convert_scales(&bin.id, "scale", &raw.scales, scales, &definition.scale_ranges)?;
            normalization.facets =
                convert_scales(&bin.id, "facet", &raw.facets, facets, &definition.scale_ranges)?;
        }
    }

    Ok(Some(normalization))
}

fn classification_value(
    definition: &TestDefinition,
    raw: &RawScore,
    normalization: Option<&Normalization>,
) -> Option<f64> {
    match definition.classification_basis {
        ScoreBasis::Raw => Some(raw.total),
        ScoreBasis::Percentile => normalization.and_then(|n| n.percentile),
        ScoreBasis::TScore => normalization.and_then(|n| n.t_score),
    }
}
