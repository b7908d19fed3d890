//! Answer normalization: stored answer -> the numeric value a rule scores.

use psyscore_core::models::response::{Answer, ResponseSet};

use crate::definition::{Item, ResponseScale, TestDefinition};

/// Map a raw answer to its numeric value on `scale`.
///
/// Numbers pass through, booleans score 1/0, labels are matched
/// case-sensitively against the scale and fall back to a numeric parse.
/// `None` means the answer contributes nothing.
pub fn normalize(answer: &Answer, scale: Option<&ResponseScale>) -> Option<f64> {
    let value = match answer {
        Answer::Number(n) => Some(*n),
        Answer::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Answer::Label(label) => scale
            .and_then(|s| s.value_of(label))
            .or_else(|| label.trim().parse::<f64>().ok()),
    };
    value.filter(|v| v.is_finite())
}

/// The answer as the label an answer key is written in.
///
/// The answer is normalized first and its value resolved to the scale label
/// carrying it, so a stored `true` matches a key of `"V"` on a scale where
/// `V = 1`, and a stored `"1"` matches a numeric key of `1`. Values the scale
/// has no option for keep their raw label or decimal form.
pub fn label_form(answer: &Answer, scale: Option<&ResponseScale>) -> String {
    let value = normalize(answer, scale);
    if let Some(label) = value.and_then(|v| scale.and_then(|s| s.label_of(v))) {
        return label.to_string();
    }
    match (answer, value) {
        (Answer::Label(label), _) => label.clone(),
        (_, Some(v)) => v.to_string(),
        (Answer::Bool(b), None) => b.to_string(),
        (Answer::Number(n), None) => n.to_string(),
    }
}

/// The normalized response for `item`, or `None` if it is unanswered or
/// does not match its scale.
pub fn normalized_response(
    definition: &TestDefinition,
    responses: &ResponseSet,
    item: &Item,
) -> Option<f64> {
    responses
        .get(&item.id)
        .and_then(|answer| normalize(answer, definition.scale_for(item)))
}
