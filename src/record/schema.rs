//! Declared form schemas and record validation.
//!
//! Each document family declares a closed set of typed fields. Records are
//! validated against the schema when they enter the system (form submit,
//! CLI import, store edit); the merge engine never validates.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use super::{DataRecord, ItemRecord};
use crate::error::{Error, Result};

/// Date formats accepted for [`FieldKind::Date`] fields.
///
/// The suite's forms have historically written all three.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// The declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "choices", rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text (single or multi line)
    Text,
    /// A calendar date in one of [`DATE_FORMATS`]
    Date,
    /// A decimal number
    Number,
    /// One of a fixed list of options
    Choice(Vec<String>),
}

impl FieldKind {
    /// Build a choice kind from option labels.
    pub fn choice<S: Into<String>>(options: impl IntoIterator<Item = S>) -> Self {
        FieldKind::Choice(options.into_iter().map(Into::into).collect())
    }

    fn check(&self, field: &str, value: &str) -> Option<ValidationIssue> {
        match self {
            FieldKind::Text => None,
            FieldKind::Date => {
                if parse_date(value).is_some() {
                    None
                } else {
                    Some(ValidationIssue::BadDate {
                        field: field.to_string(),
                        value: value.to_string(),
                    })
                }
            }
            FieldKind::Number => {
                if value.trim().parse::<f64>().is_ok() {
                    None
                } else {
                    Some(ValidationIssue::NotNumeric {
                        field: field.to_string(),
                        value: value.to_string(),
                    })
                }
            }
            FieldKind::Choice(options) => {
                if options.iter().any(|o| o == value) {
                    None
                } else {
                    Some(ValidationIssue::NotAChoice {
                        field: field.to_string(),
                        value: value.to_string(),
                        options: options.clone(),
                    })
                }
            }
        }
    }
}

/// Parse a date in any accepted format.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value.trim(), fmt).ok())
}

/// A single declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Record key (also the template token name)
    pub name: String,
    /// Human-readable label
    pub label: String,
    /// Declared type
    pub kind: FieldKind,
    /// Whether a non-empty value is required
    pub required: bool,
}

impl FieldSpec {
    /// An optional text field.
    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    /// An optional field of the given kind.
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
        }
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn check(&self, value: Option<&str>, issues: &mut Vec<ValidationIssue>, prefix: &str) {
        let qualified = format!("{}{}", prefix, self.name);
        match value.map(str::trim) {
            None | Some("") => {
                if self.required {
                    issues.push(ValidationIssue::Missing(qualified));
                }
            }
            Some(v) => issues.extend(self.kind.check(&qualified, v)),
        }
    }
}

/// A declared repeating group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSpec {
    /// Record key holding the items
    pub name: String,
    /// Human-readable label
    pub label: String,
    /// Fields of each item
    pub fields: Vec<FieldSpec>,
    /// Whether at least one item is required
    pub required: bool,
}

impl GroupSpec {
    /// Declare a group.
    pub fn new(name: impl Into<String>, label: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            fields,
            required: false,
        }
    }

    /// Require at least one item.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn check_item(&self, index: usize, item: &ItemRecord, issues: &mut Vec<ValidationIssue>) {
        let prefix = format!("{}[{}].", self.name, index + 1);
        for field in &self.fields {
            field.check(item.get(&field.name), issues, &prefix);
        }
    }
}

/// A closed set of typed fields plus repeating groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    /// Scalar fields
    pub fields: Vec<FieldSpec>,
    /// Repeating groups
    pub groups: Vec<GroupSpec>,
}

impl Schema {
    /// Create a schema.
    pub fn new(fields: Vec<FieldSpec>, groups: Vec<GroupSpec>) -> Self {
        Self { fields, groups }
    }

    /// Look up a scalar field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&GroupSpec> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Collect every issue in the record without failing.
    pub fn issues(&self, record: &DataRecord) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for field in &self.fields {
            if record.group(&field.name).is_some() {
                issues.push(ValidationIssue::WrongShape(field.name.clone()));
                continue;
            }
            field.check(record.scalar(&field.name), &mut issues, "");
        }

        for group in &self.groups {
            match record.get(&group.name) {
                Some(super::Value::Group(items)) => {
                    if items.is_empty() && group.required {
                        issues.push(ValidationIssue::EmptyGroup(group.name.clone()));
                    }
                    for (i, item) in items.iter().enumerate() {
                        group.check_item(i, item, &mut issues);
                    }
                }
                Some(super::Value::Scalar(_)) => {
                    issues.push(ValidationIssue::WrongShape(group.name.clone()));
                }
                None => {
                    if group.required {
                        issues.push(ValidationIssue::EmptyGroup(group.name.clone()));
                    }
                }
            }
        }

        issues
    }

    /// Validate a record, failing with every issue found.
    pub fn validate(&self, record: &DataRecord) -> Result<()> {
        let issues = self.issues(record);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(issues))
        }
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationIssue {
    /// A required field is absent or blank
    Missing(String),
    /// A date field does not parse
    BadDate {
        /// Field name
        field: String,
        /// Offending value
        value: String,
    },
    /// A number field does not parse
    NotNumeric {
        /// Field name
        field: String,
        /// Offending value
        value: String,
    },
    /// A choice field holds a value outside its options
    NotAChoice {
        /// Field name
        field: String,
        /// Offending value
        value: String,
        /// Allowed options
        options: Vec<String>,
    },
    /// A required group has no items
    EmptyGroup(String),
    /// A scalar was given where a group is declared, or the reverse
    WrongShape(String),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Missing(field) => write!(f, "{} is required", field),
            ValidationIssue::BadDate { field, value } => {
                write!(f, "{}: '{}' is not a date", field, value)
            }
            ValidationIssue::NotNumeric { field, value } => {
                write!(f, "{}: '{}' is not a number", field, value)
            }
            ValidationIssue::NotAChoice {
                field,
                value,
                options,
            } => write!(
                f,
                "{}: '{}' is not one of [{}]",
                field,
                value,
                options.join(", ")
            ),
            ValidationIssue::EmptyGroup(group) => write!(f, "{} needs at least one entry", group),
            ValidationIssue::WrongShape(field) => write!(f, "{} has the wrong shape", field),
        }
    }
}
