use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use veritrail_core::{AppError, AppResult, NonEmptyString};

/// How many values a consumer may select from a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Exactly one value may be selected.
    Single,
    /// Any number of values may be selected.
    Multi,
}

impl SelectionMode {
    /// Returns a stable storage value for this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
        }
    }
}

impl FromStr for SelectionMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "single" => Ok(Self::Single),
            "multi" => Ok(Self::Multi),
            _ => Err(AppError::Validation(format!(
                "unknown selection mode '{value}'"
            ))),
        }
    }
}

/// A single value inside a master data list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterDataValue {
    value: String,
    label: NonEmptyString,
    sort_order: i32,
    active: bool,
}

/// Input payload used to construct a validated master data value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterDataValueInput {
    /// Stable machine value stored on referencing rows.
    pub value: String,
    /// Human-readable label.
    pub label: String,
    /// Position within the list.
    pub sort_order: i32,
    /// Whether the value is offered for new selections.
    pub active: bool,
}

impl MasterDataValue {
    /// Creates a validated master data value.
    pub fn new(input: MasterDataValueInput) -> AppResult<Self> {
        let MasterDataValueInput {
            value,
            label,
            sort_order,
            active,
        } = input;

        let value = value.trim().to_owned();
        if value.is_empty() {
            return Err(AppError::Validation(
                "master data value must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            value,
            label: NonEmptyString::new(label)?,
            sort_order,
            active,
        })
    }

    /// Returns the stable machine value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(&self) -> &NonEmptyString {
        &self.label
    }

    /// Returns the position within the list.
    #[must_use]
    pub fn sort_order(&self) -> i32 {
        self.sort_order
    }

    /// Returns whether the value is offered for new selections.
    #[must_use]
    pub fn active(&self) -> bool {
        self.active
    }
}

/// Validated named list of reference values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterDataList {
    name: String,
    display_name: NonEmptyString,
    selection_mode: SelectionMode,
    values: Vec<MasterDataValue>,
}

/// Input payload used to construct a validated master data list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterDataListInput {
    /// Stable machine name, e.g. `vendor_categories`.
    pub name: String,
    /// Human-readable list title.
    pub display_name: String,
    /// Selection cardinality for consumers.
    pub selection_mode: SelectionMode,
    /// Member values, ordered by `sort_order`.
    pub values: Vec<MasterDataValueInput>,
}

impl MasterDataList {
    /// Creates a validated master data list.
    ///
    /// Values must be unique by machine value. Members are re-sorted by
    /// `sort_order` so callers can pass them in any order.
    pub fn new(input: MasterDataListInput) -> AppResult<Self> {
        let MasterDataListInput {
            name,
            display_name,
            selection_mode,
            values,
        } = input;

        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(AppError::Validation(
                "master data list name must not be empty".to_owned(),
            ));
        }

        let valid_name = name
            .chars()
            .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_');
        if !valid_name {
            return Err(AppError::Validation(format!(
                "master data list name '{name}' must contain only lowercase letters, digits, and underscores"
            )));
        }

        let mut members = Vec::with_capacity(values.len());
        let mut seen = BTreeSet::new();
        for value in values {
            let member = MasterDataValue::new(value)?;
            if !seen.insert(member.value().to_owned()) {
                return Err(AppError::Validation(format!(
                    "master data list '{name}' contains duplicate value '{}'",
                    member.value()
                )));
            }
            members.push(member);
        }
        members.sort_by_key(MasterDataValue::sort_order);

        Ok(Self {
            name,
            display_name: NonEmptyString::new(display_name)?,
            selection_mode,
            values: members,
        })
    }

    /// Returns the stable machine name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the human-readable list title.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the selection cardinality for consumers.
    #[must_use]
    pub fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    /// Returns the member values ordered by `sort_order`.
    #[must_use]
    pub fn values(&self) -> &[MasterDataValue] {
        self.values.as_slice()
    }

    /// Returns the active machine values in list order.
    #[must_use]
    pub fn active_values(&self) -> Vec<&str> {
        self.values
            .iter()
            .filter(|member| member.active())
            .map(MasterDataValue::value)
            .collect()
    }
}
