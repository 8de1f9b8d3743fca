//! Form schema definition.
//!
//! A schema is a tree of elements. Fields carry a value; layout containers
//! group other elements. Every element id must be unique across the whole
//! tree, since validation errors are keyed by id.

use crate::{error::Result, logic::LogicRule, ElementId, Error};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kinds of form elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Text,
    Textarea,
    Email,
    Number,
    Phone,
    Url,
    Date,
    Time,
    Select,
    Radio,
    Checkbox,
    Switch,
    Rating,
    File,
    Signature,
    Heading,
    Paragraph,
    Divider,
    Section,
    Grid,
    Columns,
    Page,
    /// Any kind this engine does not know about
    #[serde(other)]
    Other,
}

impl ElementType {
    /// Whether this kind groups child elements.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            ElementType::Section | ElementType::Grid | ElementType::Columns | ElementType::Page
        )
    }

    /// Whether this kind collects a value from the user.
    pub fn is_input(self) -> bool {
        !self.is_container()
            && !matches!(
                self,
                ElementType::Heading | ElementType::Paragraph | ElementType::Divider
            )
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElementType::Text => "text",
            ElementType::Textarea => "textarea",
            ElementType::Email => "email",
            ElementType::Number => "number",
            ElementType::Phone => "phone",
            ElementType::Url => "url",
            ElementType::Date => "date",
            ElementType::Time => "time",
            ElementType::Select => "select",
            ElementType::Radio => "radio",
            ElementType::Checkbox => "checkbox",
            ElementType::Switch => "switch",
            ElementType::Rating => "rating",
            ElementType::File => "file",
            ElementType::Signature => "signature",
            ElementType::Heading => "heading",
            ElementType::Paragraph => "paragraph",
            ElementType::Divider => "divider",
            ElementType::Section => "section",
            ElementType::Grid => "grid",
            ElementType::Columns => "columns",
            ElementType::Page => "page",
            ElementType::Other => "other",
        };
        f.write_str(name)
    }
}

/// Kinds of per-field validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    MinLength,
    MaxLength,
    Min,
    Max,
    Pattern,
    /// Unrecognized rule kinds never fail
    #[serde(other)]
    Unknown,
}

/// A validation rule attached to a single element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// Bound (numeric kinds) or regular expression (pattern)
    #[serde(default)]
    pub value: serde_json::Value,
    /// Message reported when the rule fails
    pub message: String,
}

impl ValidationRule {
    pub fn new(kind: RuleKind, value: impl Into<serde_json::Value>, message: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn min_length(len: u64, message: impl Into<String>) -> Self {
        Self::new(RuleKind::MinLength, len, message)
    }

    pub fn max_length(len: u64, message: impl Into<String>) -> Self {
        Self::new(RuleKind::MaxLength, len, message)
    }

    pub fn min(bound: f64, message: impl Into<String>) -> Self {
        Self::new(RuleKind::Min, bound, message)
    }

    pub fn max(bound: f64, message: impl Into<String>) -> Self {
        Self::new(RuleKind::Max, bound, message)
    }

    pub fn pattern(regex: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(RuleKind::Pattern, regex.into(), message)
    }
}

/// A node in the form tree: a field or a layout container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormElement {
    /// Unique identifier across the whole schema
    pub id: ElementId,
    /// Element kind
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// Label shown to the user and used in "required" messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,
    /// Children, for container kinds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<FormElement>,
}

impl FormElement {
    /// Create an optional element with no label.
    pub fn new(id: impl Into<ElementId>, element_type: ElementType) -> Self {
        Self {
            id: id.into(),
            element_type,
            label: None,
            required: false,
            validation: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// Create a container holding the given children.
    pub fn container(
        id: impl Into<ElementId>,
        element_type: ElementType,
        elements: Vec<FormElement>,
    ) -> Self {
        Self {
            elements,
            ..Self::new(id, element_type)
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation.push(rule);
        self
    }

    /// The label, falling back to the id when none is set.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// Iterate this element and all of its descendants, depth-first pre-order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![self],
        }
    }
}

/// Depth-first pre-order iterator over a subtree.
pub struct Walk<'a> {
    stack: Vec<&'a FormElement>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a FormElement;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        // Push children reversed so the first child is visited next
        self.stack.extend(element.elements.iter().rev());
        Some(element)
    }
}

/// One version of a form: root elements plus conditional logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub elements: Vec<FormElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logic: Vec<LogicRule>,
}

impl FormSchema {
    pub fn new(elements: Vec<FormElement>) -> Self {
        Self {
            elements,
            logic: Vec::new(),
        }
    }

    /// Builder-style method to attach a logic rule.
    pub fn with_logic(mut self, rule: LogicRule) -> Self {
        self.logic.push(rule);
        self
    }

    /// Iterate every element in the tree, depth-first pre-order.
    pub fn walk(&self) -> impl Iterator<Item = &FormElement> {
        self.elements.iter().flat_map(FormElement::walk)
    }

    /// Find an element anywhere in the tree.
    pub fn find(&self, id: &str) -> Option<&FormElement> {
        self.walk().find(|e| e.id == id)
    }

    /// Count of elements in the tree.
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Check structural invariants: unique ids, compilable patterns, and
    /// logic rules that reference existing elements.
    pub fn check(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for element in self.walk() {
            if !seen.insert(element.id.as_str()) {
                return Err(Error::DuplicateElementId(element.id.clone()));
            }

            for rule in &element.validation {
                if rule.kind != RuleKind::Pattern {
                    continue;
                }
                let pattern = crate::validate::rule_text(&rule.value);
                if let Err(e) = regex::Regex::new(&pattern) {
                    return Err(Error::InvalidPattern {
                        element: element.id.clone(),
                        pattern,
                        reason: e.to_string(),
                    });
                }
            }
        }

        for rule in &self.logic {
            let referenced = std::iter::once(&rule.target)
                .chain(rule.conditions.iter().map(|c| &c.field));
            for id in referenced {
                if !seen.contains(id.as_str()) {
                    return Err(Error::UnknownLogicReference {
                        rule: rule.id.clone(),
                        element: id.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}
