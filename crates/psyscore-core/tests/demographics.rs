use jiff::civil::date;
use psyscore_core::error::CoreError;
use psyscore_core::models::demographics::{age_on, DemographicProfile, Sex};
use psyscore_core::models::response::Answer;

#[test]
fn age_counts_completed_years() {
    assert_eq!(age_on(date(1990, 5, 17), date(2026, 5, 16)).unwrap(), 35);
    assert_eq!(age_on(date(1990, 5, 17), date(2026, 5, 17)).unwrap(), 36);
    assert_eq!(age_on(date(1990, 5, 17), date(2026, 12, 1)).unwrap(), 36);
}

#[test]
fn leap_day_birthday_waits_for_march_in_common_years() {
    assert_eq!(age_on(date(2000, 2, 29), date(2025, 2, 28)).unwrap(), 24);
    assert_eq!(age_on(date(2000, 2, 29), date(2025, 3, 1)).unwrap(), 25);
}

#[test]
fn birth_after_reference_date_is_rejected() {
    let err = age_on(date(2030, 1, 1), date(2026, 1, 1)).unwrap_err();
    assert!(matches!(err, CoreError::InvalidBirthDate { .. }));
}

#[test]
fn profile_from_birth_date() {
    let profile =
        DemographicProfile::from_birth_date(date(1960, 1, 1), date(2026, 10, 14), 4, Sex::Male)
            .unwrap();
    assert_eq!(profile.age, 66);
    assert_eq!(profile.education_years, 4);
    assert_eq!(profile.sex, Sex::Male);
}

#[test]
fn answers_deserialize_from_stored_json() {
    let answers: Vec<Answer> = serde_json::from_str(r#"[true, 3, 2.5, "Sometimes"]"#).unwrap();
    assert_eq!(
        answers,
        vec![
            Answer::Bool(true),
            Answer::Number(3.0),
            Answer::Number(2.5),
            Answer::label("Sometimes"),
        ]
    );
}
