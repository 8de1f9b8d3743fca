//! Conditional logic: rules that show, hide, require, or navigate based on
//! the values entered so far.
//!
//! # Semantics
//!
//! Rules are evaluated in order against the current values:
//!
//! - `show` hides its target unless some `show` rule for it fires
//! - `hide` hides its target when it fires, and beats `show`
//! - `require` makes its target mandatory when it fires
//! - `navigate` names the next page; the first firing rule wins
//!
//! Hiding a container hides everything inside it.

use crate::{
    validate::{is_present, js_number, text_of},
    ElementId, FormSchema, FormValues,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Comparison applied by a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

/// A test against one field's current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Element whose value is tested
    pub field: ElementId,
    pub operator: ConditionOperator,
    /// Operand; unused by the emptiness operators
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<ElementId>, operator: ConditionOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn equals(field: impl Into<ElementId>, value: Value) -> Self {
        Self::new(field, ConditionOperator::Equals, value)
    }

    pub fn is_empty(field: impl Into<ElementId>) -> Self {
        Self::new(field, ConditionOperator::IsEmpty, Value::Null)
    }

    /// Evaluate against the current values.
    pub fn holds(&self, values: &FormValues) -> bool {
        let actual = values.get(&self.field);
        match self.operator {
            ConditionOperator::IsEmpty => is_empty(actual),
            ConditionOperator::IsNotEmpty => !is_empty(actual),
            ConditionOperator::Equals => loosely_equal(actual, &self.value),
            ConditionOperator::NotEquals => !loosely_equal(actual, &self.value),
            ConditionOperator::Contains => contains(actual, &self.value),
            ConditionOperator::NotContains => !contains(actual, &self.value),
            ConditionOperator::GreaterThan => numeric(actual, &self.value, |a, b| a > b),
            ConditionOperator::LessThan => numeric(actual, &self.value, |a, b| a < b),
        }
    }
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => items.is_empty(),
        other => !is_present(other),
    }
}

fn loosely_equal(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(a) if a == expected => true,
        Some(a) if a.is_null() || expected.is_null() => false,
        Some(a) => {
            if let (Some(x), Some(y)) = (js_number(a), js_number(expected)) {
                return x == y;
            }
            text_of(a) == text_of(expected)
        }
    }
}

fn contains(actual: Option<&Value>, needle: &Value) -> bool {
    match actual {
        Some(Value::Array(items)) => items.iter().any(|item| loosely_equal(Some(item), needle)),
        Some(Value::String(s)) => s.contains(&*text_of(needle)),
        _ => false,
    }
}

fn numeric(actual: Option<&Value>, operand: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.and_then(js_number), js_number(operand)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

/// How multiple conditions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogicMatch {
    #[default]
    All,
    Any,
}

/// Effect of a rule on its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogicAction {
    Show,
    Hide,
    Require,
    Navigate,
}

/// A conditional rule attached to a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicRule {
    pub id: String,
    pub conditions: Vec<Condition>,
    #[serde(rename = "match", default)]
    pub match_type: LogicMatch,
    pub action: LogicAction,
    /// Element (or page, for `navigate`) the action applies to
    pub target: ElementId,
}

impl LogicRule {
    pub fn new(
        id: impl Into<String>,
        conditions: Vec<Condition>,
        action: LogicAction,
        target: impl Into<ElementId>,
    ) -> Self {
        Self {
            id: id.into(),
            conditions,
            match_type: LogicMatch::All,
            action,
            target: target.into(),
        }
    }

    pub fn matching_any(mut self) -> Self {
        self.match_type = LogicMatch::Any;
        self
    }

    /// Whether the rule fires. A rule without conditions never fires.
    pub fn fires(&self, values: &FormValues) -> bool {
        if self.conditions.is_empty() {
            return false;
        }
        match self.match_type {
            LogicMatch::All => self.conditions.iter().all(|c| c.holds(values)),
            LogicMatch::Any => self.conditions.iter().any(|c| c.holds(values)),
        }
    }
}

/// Field states derived from a schema's logic for a set of values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicOutcome {
    hidden: HashSet<ElementId>,
    required: HashSet<ElementId>,
    /// Page selected by the first firing `navigate` rule
    pub navigate_to: Option<ElementId>,
}

impl LogicOutcome {
    /// Whether an element is visible. Descendants of hidden containers are
    /// reported visible here; [`crate::validate_form_with_logic`] skips the
    /// whole subtree instead.
    pub fn is_visible(&self, id: &str) -> bool {
        !self.hidden.contains(id)
    }

    /// Whether a `require` rule made the element mandatory.
    pub fn is_required(&self, id: &str) -> bool {
        self.required.contains(id)
    }
}

/// Evaluate every logic rule of `schema` against `values`.
pub fn evaluate_logic(schema: &FormSchema, values: &FormValues) -> LogicOutcome {
    let mut outcome = LogicOutcome::default();
    let mut shown = HashSet::new();
    let mut show_targets = HashSet::new();

    for rule in &schema.logic {
        let fires = rule.fires(values);
        match rule.action {
            LogicAction::Show => {
                show_targets.insert(rule.target.clone());
                if fires {
                    shown.insert(rule.target.clone());
                }
            }
            LogicAction::Hide if fires => {
                outcome.hidden.insert(rule.target.clone());
            }
            LogicAction::Require if fires => {
                outcome.required.insert(rule.target.clone());
            }
            LogicAction::Navigate if fires && outcome.navigate_to.is_none() => {
                tracing::debug!(rule = %rule.id, target = %rule.target, "navigate rule fired");
                outcome.navigate_to = Some(rule.target.clone());
            }
            _ => {}
        }
    }

    outcome
        .hidden
        .extend(show_targets.into_iter().filter(|t| !shown.contains(t)));
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{validate_form_with_logic, ElementType, FormElement};
    use serde_json::json;

    fn values(v: Value) -> FormValues {
        v.as_object().cloned().unwrap_or_default()
    }

    fn survey() -> FormSchema {
        FormSchema::new(vec![
            FormElement::new("contact", ElementType::Radio),
            FormElement::new("email", ElementType::Email)
                .with_label("Email")
                .required(),
            FormElement::new("phone", ElementType::Phone).with_label("Phone"),
            FormElement::container(
                "extra",
                ElementType::Section,
                vec![FormElement::new("company", ElementType::Text)
                    .with_label("Company")
                    .required()],
            ),
            FormElement::new("age", ElementType::Number),
        ])
        .with_logic(LogicRule::new(
            "email-only-for-email",
            vec![Condition::equals("contact", json!("email"))],
            LogicAction::Show,
            "email",
        ))
        .with_logic(LogicRule::new(
            "phone-required",
            vec![Condition::equals("contact", json!("phone"))],
            LogicAction::Require,
            "phone",
        ))
        .with_logic(LogicRule::new(
            "hide-extra",
            vec![Condition::is_empty("contact")],
            LogicAction::Hide,
            "extra",
        ))
    }

    #[test]
    fn show_rule_hides_until_it_fires() {
        let schema = survey();
        let outcome = evaluate_logic(&schema, &values(json!({"contact": "phone"})));
        assert!(!outcome.is_visible("email"));

        let outcome = evaluate_logic(&schema, &values(json!({"contact": "email"})));
        assert!(outcome.is_visible("email"));
    }

    #[test]
    fn hide_beats_show() {
        let schema = FormSchema::new(vec![
            FormElement::new("a", ElementType::Text),
            FormElement::new("b", ElementType::Text),
        ])
        .with_logic(LogicRule::new(
            "show-b",
            vec![Condition::equals("a", json!("x"))],
            LogicAction::Show,
            "b",
        ))
        .with_logic(LogicRule::new(
            "hide-b",
            vec![Condition::equals("a", json!("x"))],
            LogicAction::Hide,
            "b",
        ));

        let outcome = evaluate_logic(&schema, &values(json!({"a": "x"})));
        assert!(!outcome.is_visible("b"));
    }

    #[test]
    fn validation_skips_hidden_subtrees_and_applies_require() {
        let schema = survey();

        // Nothing chosen: email hidden by show rule, extra hidden by hide rule
        let result = validate_form_with_logic(&schema, &FormValues::new());
        assert!(result.valid, "unexpected errors: {:?}", result.errors);

        // Phone chosen: phone becomes required, company now visible and required
        let result = validate_form_with_logic(&schema, &values(json!({"contact": "phone"})));
        assert_eq!(result.error("phone"), Some("Phone is required"));
        assert_eq!(result.error("company"), Some("Company is required"));
        assert!(result.error("email").is_none());
    }

    #[test]
    fn navigate_first_firing_rule_wins() {
        let schema = FormSchema::new(vec![
            FormElement::new("age", ElementType::Number),
            FormElement::new("adult", ElementType::Page),
            FormElement::new("minor", ElementType::Page),
        ])
        .with_logic(LogicRule::new(
            "to-minor",
            vec![Condition::new("age", ConditionOperator::LessThan, json!(18))],
            LogicAction::Navigate,
            "minor",
        ))
        .with_logic(
            LogicRule::new(
                "to-adult",
                vec![
                    Condition::new("age", ConditionOperator::GreaterThan, json!(17)),
                    Condition::is_empty("age"),
                ],
                LogicAction::Navigate,
                "adult",
            )
            .matching_any(),
        );

        let outcome = evaluate_logic(&schema, &values(json!({"age": "12"})));
        assert_eq!(outcome.navigate_to.as_deref(), Some("minor"));

        let outcome = evaluate_logic(&schema, &values(json!({"age": 40})));
        assert_eq!(outcome.navigate_to.as_deref(), Some("adult"));

        let outcome = evaluate_logic(&schema, &FormValues::new());
        assert_eq!(outcome.navigate_to.as_deref(), Some("adult"));
    }

    #[test]
    fn operators() {
        let v = values(json!({
            "n": "5",
            "tags": ["red", "blue"],
            "text": "hello world",
            "empty": "",
            "none": [],
            "nothing": null,
            "flag": true
        }));

        assert!(Condition::equals("n", json!(5)).holds(&v));
        assert!(Condition::equals("n", json!("5.0")).holds(&v));
        assert!(Condition::new("n", ConditionOperator::NotEquals, json!(6)).holds(&v));
        assert!(Condition::new("tags", ConditionOperator::Contains, json!("red")).holds(&v));
        assert!(Condition::new("text", ConditionOperator::Contains, json!("world")).holds(&v));
        assert!(Condition::new("text", ConditionOperator::NotContains, json!("mars")).holds(&v));
        assert!(Condition::is_empty("empty").holds(&v));
        assert!(Condition::is_empty("none").holds(&v));
        assert!(Condition::is_empty("missing").holds(&v));
        assert!(Condition::new("tags", ConditionOperator::IsNotEmpty, Value::Null).holds(&v));
        assert!(!Condition::new("text", ConditionOperator::GreaterThan, json!(1)).holds(&v));
        assert!(Condition::equals("missing", Value::Null).holds(&v));
        assert!(!Condition::equals("nothing", json!(0)).holds(&v));
        assert!(Condition::equals("flag", json!(1)).holds(&v));
        assert!(Condition::new("flag", ConditionOperator::GreaterThan, json!(0)).holds(&v));
    }

    #[test]
    fn rule_without_conditions_never_fires() {
        let rule = LogicRule::new("noop", vec![], LogicAction::Hide, "x");
        assert!(!rule.fires(&FormValues::new()));
    }

    #[test]
    fn logic_rule_json_shape() {
        let rule: LogicRule = serde_json::from_value(json!({
            "id": "r1",
            "conditions": [{"field": "plan", "operator": "notEquals", "value": "free"}],
            "match": "any",
            "action": "require",
            "target": "card"
        }))
        .unwrap();

        assert_eq!(rule.match_type, LogicMatch::Any);
        assert_eq!(rule.action, LogicAction::Require);
        assert_eq!(rule.conditions[0].operator, ConditionOperator::NotEquals);
    }
}
