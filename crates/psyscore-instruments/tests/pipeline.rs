mod common;

use std::collections::BTreeMap;

use psyscore_core::models::demographics::Sex;
use psyscore_core::models::response::Answer;
use psyscore_instruments::convert::{ConversionTable, LookupPoint, PercentileStep};
use psyscore_instruments::definition::{ScoreBasis, WeightedScale};
use psyscore_instruments::error::{CalculationError, PipelineError, ValidationError};
use psyscore_instruments::instruments::bdi_ii::BdiII;
use psyscore_instruments::norms::{BinDistribution, NormativeBin, NormativeTable, SexFilter, YearRange};
use psyscore_instruments::pipeline::score_test;
use psyscore_instruments::rules::ScoringRule;
use psyscore_instruments::Instrument;

use common::{definition, definition_with_scale, profile, range, responses, sum, true_false, uniform};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

fn table(distribution: BinDistribution) -> NormativeTable {
    NormativeTable {
        id: "br-2024".to_string(),
        name: "Brazilian adults 2024".to_string(),
        bins: vec![NormativeBin {
            id: "18-59".to_string(),
            age: YearRange { min: 18, max: 59 },
            education: YearRange { min: 0, max: 25 },
            sex: SexFilter::Any,
            distribution,
        }],
    }
}

#[test]
fn maximum_depression_inventory_is_severe_and_raises_alert() {
    init_tracing();
    let output = BdiII
        .score(&uniform(21, Answer::Number(3.0)), &profile(34, 12, Sex::Female), None)
        .unwrap();

    assert_eq!(output.raw_score.total, 63.0);
    assert!(output.normalization.is_none());

    let classification = output.interpretation.classification.as_ref().unwrap();
    assert_eq!(classification.label, "severe");
    assert_eq!(
        output.interpretation.recommendation.as_deref(),
        Some("Refer for psychiatric evaluation")
    );

    assert_eq!(output.interpretation.alerts.len(), 1);
    assert_eq!(output.interpretation.alerts[0].item, 9);
    assert!(output.interpretation.text.starts_with("BDI-II: raw score 63."));
    assert!(output.interpretation.text.contains("Classification: severe."));
    assert!(output.interpretation.text.contains("Clinical alerts: 1"));
}

#[test]
fn minimal_depression_has_no_alert() {
    let output = BdiII
        .score(&uniform(21, Answer::label("0")), &profile(34, 12, Sex::Male), None)
        .unwrap();
    assert_eq!(output.raw_score.total, 0.0);
    assert_eq!(output.interpretation.classification.unwrap().label, "minimal");
    assert!(output.interpretation.alerts.is_empty());
}

#[test]
fn identical_inputs_produce_identical_output() {
    let def = BdiII.definition();
    let answers = responses(&[(1, 2.0.into()), (4, Answer::label("3")), (9, 1.0.into())]);
    let norms = table(BinDistribution::MeanSd { mean: 10.0, sd: 8.0 });
    let who = profile(70, 3, Sex::Female);

    let first = score_test(def, &answers, &who, Some(&norms)).unwrap();
    let second = score_test(def, &answers, &who, Some(&norms)).unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn percentile_table_normalizes_the_total() {
    let mut def = definition(10, 3, sum());
    def.classification_basis = ScoreBasis::Percentile;
    def.classification_ranges = vec![
        range(0.0, 24.0, "below average"),
        range(25.0, 75.0, "average"),
        range(76.0, 100.0, "above average"),
    ];
    let norms = table(BinDistribution::Percentiles {
        steps: vec![
            PercentileStep {
                raw: 0.0,
                percentile: 5.0,
            },
            PercentileStep {
                raw: 10.0,
                percentile: 50.0,
            },
            PercentileStep {
                raw: 20.0,
                percentile: 90.0,
            },
        ],
    });

    let output = score_test(
        &def,
        &uniform(10, Answer::Number(2.0)),
        &profile(30, 12, Sex::Male),
        Some(&norms),
    )
    .unwrap();

    let normalization = output.normalization.unwrap();
    assert_eq!(normalization.table_used, "br-2024");
    assert_eq!(normalization.bin_applied, "18-59");
    assert!(normalization.exact_match);
    assert_eq!(normalization.percentile, Some(90.0));
    assert_eq!(normalization.z_score, None);
    assert_eq!(normalization.classification.unwrap().label, "above average");
    assert_eq!(output.interpretation.classification.unwrap().label, "above average");
}

#[test]
fn mean_sd_bin_yields_z_and_t() {
    let mut def = definition(10, 3, sum());
    def.classification_basis = ScoreBasis::TScore;
    def.classification_ranges = vec![range(20.0, 59.0, "typical"), range(60.0, 100.0, "elevated")];
    let norms = table(BinDistribution::MeanSd { mean: 10.0, sd: 5.0 });

    let output = score_test(
        &def,
        &uniform(10, Answer::Number(2.0)),
        &profile(30, 12, Sex::Male),
        Some(&norms),
    )
    .unwrap();

    let normalization = output.normalization.as_ref().unwrap();
    assert_eq!(normalization.z_score, Some(2.0));
    assert_eq!(normalization.t_score, Some(70.0));
    assert_eq!(normalization.percentile, Some(97.7));
    assert_eq!(output.interpretation.classification.unwrap().label, "elevated");
    assert!(output.interpretation.text.contains("(percentile 97.70, T 70)"));
}

#[test]
fn approximate_bin_is_reported() {
    let def = definition(5, 3, sum());
    let norms = table(BinDistribution::MeanSd { mean: 5.0, sd: 2.0 });

    let output = score_test(&def, &uniform(5, Answer::Number(1.0)), &profile(80, 4, Sex::Female), Some(&norms))
        .unwrap();
    let normalization = output.normalization.unwrap();
    assert!(!normalization.exact_match);
    assert!(output.interpretation.text.contains("nearest bin '18-59'"));
}

#[test]
fn empty_normative_table_degrades_to_raw_only() {
    let def = BdiII.definition();
    let norms = NormativeTable {
        id: "empty".to_string(),
        name: "Empty".to_string(),
        bins: Vec::new(),
    };

    let output = score_test(def, &uniform(21, Answer::Number(1.0)), &profile(30, 12, Sex::Male), Some(&norms))
        .unwrap();
    assert_eq!(output.raw_score.total, 21.0);
    assert!(output.normalization.is_none());
    assert_eq!(output.interpretation.classification.unwrap().label, "moderate");

    let json = serde_json::to_value(score_test(def, &BTreeMap::new(), &profile(30, 12, Sex::Male), None).unwrap())
        .unwrap();
    assert!(json["normalization"].is_null());
}

#[test]
fn percentile_basis_without_norms_is_unclassified() {
    let mut def = definition(4, 3, sum());
    def.classification_basis = ScoreBasis::Percentile;
    def.classification_ranges = vec![range(0.0, 50.0, "low"), range(51.0, 100.0, "high")];

    let output = score_test(&def, &uniform(4, Answer::Number(3.0)), &profile(30, 12, Sex::Male), None).unwrap();
    assert!(output.interpretation.classification.is_none());
    assert!(output.interpretation.text.contains("No classification available."));
}

#[test]
fn invalid_definition_fails_before_scoring() {
    let mut def = definition(4, 3, sum());
    def.classification_ranges = vec![range(0.0, 8.0, "low"), range(5.0, 12.0, "high")];

    let err = score_test(&def, &uniform(4, Answer::Number(1.0)), &profile(30, 12, Sex::Male), None).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Validation(ValidationError::OverlappingRanges { .. })
    ));
}

fn lookup(pairs: &[(f64, f64)]) -> Vec<LookupPoint> {
    pairs.iter().map(|(from, to)| LookupPoint { from: *from, to: *to }).collect()
}

fn inventory_tables() -> ConversionTable {
    ConversionTable {
        raw_to_base_rate: lookup(&[(0.0, 0.0), (3.0, 60.0), (5.0, 75.0), (7.0, 90.0)]),
        base_rate_to_percentile: lookup(&[(0.0, 1.0), (60.0, 40.0), (75.0, 75.0), (90.0, 97.0)]),
    }
}

fn weighted_inventory() -> psyscore_instruments::definition::TestDefinition {
    let mut def = definition_with_scale(
        6,
        true_false(),
        ScoringRule::WeightedFormula {
            scales: vec!["anx".to_string(), "dep".to_string()],
            facets: vec!["anx.1".to_string()],
        },
    );
    def.weighted_tables = BTreeMap::from([
        (
            "anx".to_string(),
            WeightedScale {
                name: Some("Anxiety".to_string()),
                weighted_items: vec![1, 2],
                unweighted_items: vec![3],
            },
        ),
        (
            "dep".to_string(),
            WeightedScale {
                name: Some("Depression".to_string()),
                weighted_items: vec![4],
                unweighted_items: vec![5, 6],
            },
        ),
        (
            "anx.1".to_string(),
            WeightedScale {
                name: None,
                weighted_items: vec![1],
                unweighted_items: vec![3],
            },
        ),
    ]);
    def.scale_ranges = vec![range(0.0, 74.0, "absent"), range(75.0, 84.0, "present"), range(85.0, 115.0, "prominent")];
    def
}

#[test]
fn weighted_inventory_converts_scales_and_facets() {
    init_tracing();
    let def = weighted_inventory();
    let norms = table(BinDistribution::BaseRates {
        scales: BTreeMap::from([
            ("anx".to_string(), inventory_tables()),
            ("dep".to_string(), inventory_tables()),
        ]),
        facets: BTreeMap::from([("anx.1".to_string(), inventory_tables())]),
    });
    let answers = responses(&[
        (1, Answer::label("V")),
        (2, Answer::label("V")),
        (3, Answer::label("V")),
        (4, Answer::label("F")),
        (5, Answer::label("V")),
        (6, Answer::label("F")),
    ]);

    let output = score_test(&def, &answers, &profile(40, 11, Sex::Male), Some(&norms)).unwrap();
    assert_eq!(output.raw_score.scales["anx"], 5.0);
    assert_eq!(output.raw_score.scales["dep"], 1.0);
    assert_eq!(output.raw_score.facets["anx.1"], 3.0);

    let normalization = output.normalization.unwrap();
    let anx = &normalization.scales["anx"];
    assert_eq!((anx.base_rate, anx.percentile), (75.0, 75.0));
    assert_eq!(anx.classification.as_deref(), Some("present"));

    let dep = &normalization.scales["dep"];
    assert_eq!((dep.base_rate, dep.percentile), (0.0, 1.0));
    assert_eq!(dep.classification.as_deref(), Some("absent"));

    let facet = &normalization.facets["anx.1"];
    assert_eq!((facet.base_rate, facet.percentile), (60.0, 40.0));
    assert!(normalization.percentile.is_none());
    assert!(output.interpretation.text.contains("Scale anx: raw 5, base rate 75, percentile 75 (present)"));
}

#[test]
fn weighted_inventory_missing_conversion_is_a_calculation_error() {
    let def = weighted_inventory();
    let norms = table(BinDistribution::BaseRates {
        scales: BTreeMap::from([("anx".to_string(), inventory_tables())]),
        facets: BTreeMap::new(),
    });

    let err = score_test(&def, &BTreeMap::new(), &profile(40, 11, Sex::Male), Some(&norms)).unwrap_err();
    assert_eq!(
        err,
        PipelineError::Calculation(CalculationError::MissingConversion {
            bin: "18-59".to_string(),
            kind: "scale",
            scale: "dep".to_string(),
        })
    );
}

#[test]
fn output_serializes_in_the_documented_shape() {
    let output = BdiII
        .score(&uniform(21, Answer::Number(1.0)), &profile(30, 12, Sex::Male), None)
        .unwrap();
    let json = serde_json::to_value(&output).unwrap();

    assert_eq!(json["raw_score"]["total"], 21.0);
    assert!(json["raw_score"].get("sections").is_none());
    assert_eq!(json["interpretation"]["classification"]["label"], "moderate");
    assert_eq!(json["interpretation"]["alerts"][0]["item"], 9);
}
