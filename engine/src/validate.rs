//! Schema-driven validation of submitted values.
//!
//! Validation is a pure function of (schema, values). Failures are returned
//! as a per-element error map, never as `Err`.

use crate::{
    logic::{evaluate_logic, LogicOutcome},
    ElementId, ElementType, FormElement, FormSchema, FormValues, RuleKind, ValidationRule,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

pub const INVALID_EMAIL: &str = "Please enter a valid email address";
pub const INVALID_NUMBER: &str = "Please enter a valid number";

/// Outcome of validating a whole form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff `errors` is empty
    pub valid: bool,
    /// Message per failing element id
    pub errors: BTreeMap<ElementId, String>,
}

impl ValidationResult {
    fn from_errors(errors: BTreeMap<ElementId, String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Message recorded for an element, if any.
    pub fn error(&self, id: &str) -> Option<&str> {
        self.errors.get(id).map(String::as_str)
    }
}

/// Validate every element of `schema` against `values`.
///
/// Containers are checked before their children, and children are always
/// visited whatever the container's result. Values with no matching element
/// are ignored. If two elements share an id, the last one visited wins.
pub fn validate_form(schema: &FormSchema, values: &FormValues) -> ValidationResult {
    let mut errors = BTreeMap::new();
    for element in schema.walk() {
        if let Some(message) = validate_field(element, values.get(&element.id)) {
            errors.insert(element.id.clone(), message);
        }
    }
    ValidationResult::from_errors(errors)
}

/// Validate with the schema's conditional logic applied.
///
/// Hidden elements (and everything inside a hidden container) are skipped,
/// and `require` rules make their targets mandatory.
pub fn validate_form_with_logic(schema: &FormSchema, values: &FormValues) -> ValidationResult {
    let outcome = evaluate_logic(schema, values);
    let mut errors = BTreeMap::new();
    for element in &schema.elements {
        collect_visible(element, values, &outcome, &mut errors);
    }
    ValidationResult::from_errors(errors)
}

fn collect_visible(
    element: &FormElement,
    values: &FormValues,
    outcome: &LogicOutcome,
    errors: &mut BTreeMap<ElementId, String>,
) {
    if !outcome.is_visible(&element.id) {
        return;
    }

    let required = element.required || outcome.is_required(&element.id);
    if let Some(message) = check_field(element, required, values.get(&element.id)) {
        errors.insert(element.id.clone(), message);
    }

    for child in &element.elements {
        collect_visible(child, values, outcome, errors);
    }
}

/// Validate a single element's value. `None` means absent.
pub fn validate_field(element: &FormElement, value: Option<&Value>) -> Option<String> {
    check_field(element, element.required, value)
}

fn check_field(element: &FormElement, required: bool, value: Option<&Value>) -> Option<String> {
    let present = is_present(value);

    if required && !present {
        return Some(format!("{} is required", element.display_label()));
    }

    if present {
        if let Some(v) = value {
            match element.element_type {
                ElementType::Email if !EMAIL_RE.is_match(&text_of(v)) => {
                    return Some(INVALID_EMAIL.to_string());
                }
                ElementType::Number if js_number(v).is_none() => {
                    return Some(INVALID_NUMBER.to_string());
                }
                _ => {}
            }
        }
    }

    // An absent or null value has nothing to compare. Coercing it would turn
    // a skipped optional field into a length or pattern failure.
    let value = value.filter(|v| !v.is_null())?;
    element
        .validation
        .iter()
        .find_map(|rule| evaluate_rule(rule, value))
}

/// Evaluate one rule. Returns the rule's message when it fails.
///
/// Numeric comparisons against a non-numeric value or bound are skipped.
/// A bound equal to the value never fails.
pub fn evaluate_rule(rule: &ValidationRule, value: &Value) -> Option<String> {
    let failed = match rule.kind {
        RuleKind::MinLength => compare(char_len(value), bound(rule), |len, b| len < b),
        RuleKind::MaxLength => compare(char_len(value), bound(rule), |len, b| len > b),
        RuleKind::Min => compare(js_number(value), bound(rule), |n, b| n < b),
        RuleKind::Max => compare(js_number(value), bound(rule), |n, b| n > b),
        RuleKind::Pattern => {
            let pattern = rule_text(&rule.value);
            match Regex::new(&pattern) {
                Ok(re) => !re.is_match(&text_of(value)),
                Err(e) => {
                    tracing::warn!(%pattern, error = %e, "skipping invalid pattern rule");
                    false
                }
            }
        }
        RuleKind::Unknown => false,
    };

    failed.then(|| rule.message.clone())
}

fn compare(value: Option<f64>, bound: Option<f64>, fails: impl Fn(f64, f64) -> bool) -> bool {
    match (value, bound) {
        (Some(v), Some(b)) => fails(v, b),
        _ => false,
    }
}

fn bound(rule: &ValidationRule) -> Option<f64> {
    // A missing bound deserializes as null but means undefined (NaN)
    match &rule.value {
        Value::Null => None,
        value => js_number(value),
    }
}

/// Length as JavaScript reports it: UTF-16 code units.
fn char_len(value: &Value) -> Option<f64> {
    Some(text_of(value).encode_utf16().count() as f64)
}

/// A value counts as present unless it is absent, null, or an empty string.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Textual form of a value, as compared by length and pattern rules.
///
/// Integral floats render without a fraction (`1.0` is `"1"`). Magnitudes
/// of 1e21 and above are written out in full rather than in exponent form.
pub fn text_of(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => Cow::Owned(f.to_string()),
            _ => Cow::Owned(n.to_string()),
        },
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

/// Numeric form of a value with JavaScript `Number()` semantics.
///
/// `None` stands for NaN. Booleans are 0/1, null and blank strings are 0,
/// strings accept `0x`/`0o`/`0b` prefixes and `Infinity`, and an array
/// converts through its single element.
pub fn js_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_js_number(s),
        Value::Array(items) => match items.as_slice() {
            [] => Some(0.0),
            [Value::Bool(_)] | [Value::Object(_)] => None,
            [item] => js_number(item),
            _ => None,
        },
        Value::Object(_) => None,
    }
}

fn parse_js_number(raw: &str) -> Option<f64> {
    let s = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if s.is_empty() {
        return Some(0.0);
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &s[2..];
        if digits.is_empty() {
            return None;
        }
        return digits.chars().try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
        });
    }

    match s {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    // Rust also accepts "inf" and "nan"; JavaScript only plain decimals
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    s.parse::<f64>().ok()
}

pub(crate) fn rule_text(value: &Value) -> String {
    text_of(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(v: Value) -> FormValues {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn required_missing_uses_label() {
        let element = FormElement::new("name", ElementType::Text)
            .with_label("Full name")
            .required();

        assert_eq!(
            validate_field(&element, None).as_deref(),
            Some("Full name is required")
        );
        assert_eq!(
            validate_field(&element, Some(&Value::Null)).as_deref(),
            Some("Full name is required")
        );
        assert_eq!(
            validate_field(&element, Some(&json!(""))).as_deref(),
            Some("Full name is required")
        );
        assert_eq!(validate_field(&element, Some(&json!("Ada"))), None);
    }

    #[test]
    fn required_accepts_falsy_non_empty_values() {
        let element = FormElement::new("agree", ElementType::Checkbox).required();
        assert_eq!(validate_field(&element, Some(&json!(false))), None);
        assert_eq!(validate_field(&element, Some(&json!(0))), None);
    }

    #[test]
    fn email_format() {
        let element = FormElement::new("email", ElementType::Email);
        assert_eq!(validate_field(&element, Some(&json!("a@b.com"))), None);
        assert_eq!(
            validate_field(&element, Some(&json!("a@b"))).as_deref(),
            Some(INVALID_EMAIL)
        );
        assert_eq!(
            validate_field(&element, Some(&json!("a b@c.de"))).as_deref(),
            Some(INVALID_EMAIL)
        );
        // Optional and empty: no format check
        assert_eq!(validate_field(&element, Some(&json!(""))), None);
    }

    #[test]
    fn number_format() {
        let element = FormElement::new("age", ElementType::Number);
        let accepted = [
            json!(42),
            json!(" 4.5 "),
            json!(" "),
            json!(true),
            json!("0x10"),
            json!("-Infinity"),
        ];
        for ok in accepted {
            assert_eq!(validate_field(&element, Some(&ok)), None, "{ok}");
        }
        let rejected = [
            json!("forty"),
            json!("NaN"),
            json!("inf"),
            json!("1_000"),
            json!({"n": 1}),
        ];
        for bad in rejected {
            assert_eq!(
                validate_field(&element, Some(&bad)).as_deref(),
                Some(INVALID_NUMBER),
                "{bad}"
            );
        }
    }

    #[test]
    fn js_number_coercion() {
        assert_eq!(js_number(&json!("   ")), Some(0.0));
        assert_eq!(js_number(&json!("")), Some(0.0));
        assert_eq!(js_number(&json!(true)), Some(1.0));
        assert_eq!(js_number(&json!(false)), Some(0.0));
        assert_eq!(js_number(&Value::Null), Some(0.0));
        assert_eq!(js_number(&json!("0x10")), Some(16.0));
        assert_eq!(js_number(&json!("0o17")), Some(15.0));
        assert_eq!(js_number(&json!("0b101")), Some(5.0));
        assert_eq!(js_number(&json!("\n 1e3\t")), Some(1000.0));
        assert_eq!(js_number(&json!(".5")), Some(0.5));
        assert_eq!(js_number(&json!("Infinity")), Some(f64::INFINITY));
        assert_eq!(js_number(&json!([])), Some(0.0));
        assert_eq!(js_number(&json!(["7"])), Some(7.0));

        assert_eq!(js_number(&json!("inf")), None);
        assert_eq!(js_number(&json!("infinity")), None);
        assert_eq!(js_number(&json!("nan")), None);
        assert_eq!(js_number(&json!("0x")), None);
        assert_eq!(js_number(&json!("-0x10")), None);
        assert_eq!(js_number(&json!("12px")), None);
        assert_eq!(js_number(&json!([1, 2])), None);
        assert_eq!(js_number(&json!([true])), None);
    }

    #[test]
    fn min_max_compare_coerced_booleans_and_blanks() {
        assert_eq!(
            evaluate_rule(&ValidationRule::min(5.0, "low"), &json!(true)).as_deref(),
            Some("low")
        );
        assert_eq!(evaluate_rule(&ValidationRule::max(1.0, "high"), &json!(true)), None);
        assert_eq!(
            evaluate_rule(&ValidationRule::min(1.0, "low"), &json!("  ")).as_deref(),
            Some("low")
        );
        assert_eq!(
            evaluate_rule(&ValidationRule::max(10.0, "high"), &json!("0x10")).as_deref(),
            Some("high")
        );
        // A rule with no bound never fails
        let unbounded = ValidationRule::new(RuleKind::Min, Value::Null, "low");
        assert_eq!(evaluate_rule(&unbounded, &json!(-5)), None);
    }

    #[test]
    fn required_check_precedes_format_check() {
        let element = FormElement::new("email", ElementType::Email)
            .with_label("Email")
            .required()
            .with_rule(ValidationRule::min_length(50, "too short"));

        assert_eq!(
            validate_field(&element, None).as_deref(),
            Some("Email is required")
        );
        assert_eq!(
            validate_field(&element, Some(&json!("nope"))).as_deref(),
            Some(INVALID_EMAIL)
        );
        assert_eq!(
            validate_field(&element, Some(&json!("a@b.co"))).as_deref(),
            Some("too short")
        );
    }

    #[test]
    fn bounds_are_inclusive() {
        let v = json!("abc");
        assert_eq!(evaluate_rule(&ValidationRule::min_length(3, "min"), &v), None);
        assert_eq!(evaluate_rule(&ValidationRule::max_length(3, "max"), &v), None);
        assert_eq!(
            evaluate_rule(&ValidationRule::min_length(4, "min"), &v).as_deref(),
            Some("min")
        );
        assert_eq!(
            evaluate_rule(&ValidationRule::max_length(2, "max"), &v).as_deref(),
            Some("max")
        );

        let n = json!(10);
        assert_eq!(evaluate_rule(&ValidationRule::min(10.0, "low"), &n), None);
        assert_eq!(evaluate_rule(&ValidationRule::max(10.0, "high"), &n), None);
        assert_eq!(
            evaluate_rule(&ValidationRule::min(10.5, "low"), &n).as_deref(),
            Some("low")
        );
        assert_eq!(
            evaluate_rule(&ValidationRule::max(9.0, "high"), &json!("9.5")).as_deref(),
            Some("high")
        );
    }

    #[test]
    fn length_counts_utf16_units() {
        let rule = ValidationRule::max_length(3, "max");
        assert_eq!(evaluate_rule(&rule, &json!("héé")), None);

        // Astral characters take two units each
        let rule = ValidationRule::max_length(1, "max");
        assert_eq!(evaluate_rule(&rule, &json!("😀")).as_deref(), Some("max"));
    }

    #[test]
    fn integral_floats_render_without_fraction() {
        assert_eq!(text_of(&json!(1.0)), "1");
        assert_eq!(text_of(&json!(2.5)), "2.5");
        assert_eq!(text_of(&json!(-3)), "-3");

        let rule = ValidationRule::pattern("^1$", "not one");
        assert_eq!(evaluate_rule(&rule, &json!(1.0)), None);
        assert_eq!(evaluate_rule(&ValidationRule::max_length(1, "long"), &json!(7.0)), None);
    }

    #[test]
    fn non_numeric_comparisons_are_skipped() {
        let v = json!("abc");
        assert_eq!(evaluate_rule(&ValidationRule::min(5.0, "low"), &v), None);
        assert_eq!(evaluate_rule(&ValidationRule::max(0.0, "high"), &v), None);

        let bad_bound = ValidationRule::new(RuleKind::Min, "many", "low");
        assert_eq!(evaluate_rule(&bad_bound, &json!(1)), None);
    }

    #[test]
    fn pattern_rule_is_a_search() {
        let rule = ValidationRule::pattern("[0-9]{3}", "needs digits");
        assert_eq!(evaluate_rule(&rule, &json!("ab123cd")), None);
        assert_eq!(
            evaluate_rule(&rule, &json!("ab12")).as_deref(),
            Some("needs digits")
        );
    }

    #[test]
    fn invalid_pattern_never_fails() {
        let rule = ValidationRule::pattern("(unclosed", "bad");
        assert_eq!(evaluate_rule(&rule, &json!("anything")), None);
    }

    #[test]
    fn unknown_rule_is_noop() {
        let rule = ValidationRule::new(RuleKind::Unknown, 1, "never");
        assert_eq!(evaluate_rule(&rule, &json!("x")), None);
    }

    #[test]
    fn first_failing_rule_wins() {
        let element = FormElement::new("code", ElementType::Text)
            .with_rule(ValidationRule::min_length(2, "first"))
            .with_rule(ValidationRule::min_length(10, "second"))
            .with_rule(ValidationRule::pattern("^z", "third"));

        assert_eq!(
            validate_field(&element, Some(&json!("abc"))).as_deref(),
            Some("second")
        );
        assert_eq!(
            validate_field(&element, Some(&json!("a"))).as_deref(),
            Some("first")
        );
    }

    #[test]
    fn later_rules_are_not_evaluated_after_a_failure() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        use tracing_subscriber::layer::{Context, SubscriberExt};

        struct WarnCounter(Arc<AtomicUsize>);

        impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                if *event.metadata().level() == tracing::Level::WARN {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        // The trailing rule warns whenever it is evaluated
        let element = FormElement::new("code", ElementType::Text)
            .with_rule(ValidationRule::min_length(5, "short"))
            .with_rule(ValidationRule::pattern("(unclosed", "bad"));

        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber =
            tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));

        tracing::subscriber::with_default(subscriber, || {
            assert_eq!(
                validate_field(&element, Some(&json!("abc"))).as_deref(),
                Some("short")
            );
            assert_eq!(warnings.load(Ordering::SeqCst), 0);

            // Passing the first rule reaches the second
            assert_eq!(validate_field(&element, Some(&json!("abcdef"))), None);
            assert_eq!(warnings.load(Ordering::SeqCst), 1);
        });
    }

    #[test]
    fn rules_skip_absent_optional_values() {
        let element = FormElement::new("bio", ElementType::Textarea)
            .with_rule(ValidationRule::min_length(5, "short"));
        assert_eq!(validate_field(&element, None), None);
        assert_eq!(validate_field(&element, Some(&Value::Null)), None);
        // Empty strings still reach the rules
        assert_eq!(
            validate_field(&element, Some(&json!(""))).as_deref(),
            Some("short")
        );
    }

    #[test]
    fn missing_required_email_without_label_names_the_id() {
        let schema =
            FormSchema::new(vec![FormElement::new("email", ElementType::Email).required()]);

        let result = validate_form(&schema, &values(json!({})));
        assert!(!result.valid);
        assert_eq!(result.error("email"), Some("email is required"));

        let result = validate_form(&schema, &values(json!({"email": "a@b.com"})));
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn nested_errors_keyed_by_own_id() {
        let schema = FormSchema::new(vec![FormElement::container(
            "grid",
            ElementType::Grid,
            vec![FormElement::container(
                "section",
                ElementType::Section,
                vec![FormElement::new("phone", ElementType::Phone)
                    .with_label("Phone")
                    .required()],
            )],
        )]);

        let result = validate_form(&schema, &values(json!({"unrelated": 1})));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.error("phone"), Some("Phone is required"));
        assert!(result.error("grid").is_none());
        assert!(result.error("section").is_none());
    }

    #[test]
    fn duplicate_ids_last_visited_wins() {
        let schema = FormSchema::new(vec![
            FormElement::new("dup", ElementType::Text).with_label("First").required(),
            FormElement::new("dup", ElementType::Text).with_label("Second").required(),
        ]);

        let result = validate_form(&schema, &FormValues::new());
        assert_eq!(result.error("dup"), Some("Second is required"));
    }

    #[test]
    fn result_serializes_error_map() {
        let schema = FormSchema::new(vec![FormElement::new("age", ElementType::Number)]);
        let result = validate_form(&schema, &values(json!({"age": "old"})));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"valid": false, "errors": {"age": INVALID_NUMBER}})
        );
    }
}
