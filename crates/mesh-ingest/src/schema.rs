//! Field table for mesh product rows
//!
//! The table fixes which columns exist, which are required, and which rule
//! coerces each one. Its order is the order errors appear in the report.

use crate::config::Vocabulary;
use crate::fields::{self, FieldError};
use crate::record::FieldValue;

/// Column names of the input file and the `mesh` table
pub mod columns {
    pub const CODENAME: &str = "codename";
    pub const TRAME: &str = "trame";
    pub const MASS_SURF: &str = "mass_surf";
    pub const IS_COMPAT_INTERIOR_WALL: &str = "is_compat_interior_wall";
    pub const MESH_HEIGHT: &str = "mesh_height";
    pub const MESH_WIDTH: &str = "mesh_width";
    pub const ROLL_PALLET: &str = "roll_pallet";
    pub const COLOR_NAMES: &str = "color_names";
}

/// Column carrying the product code
pub const KEY_FIELD: &str = columns::CODENAME;

/// Coercion applied to a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Kept as-is
    Text,
    /// Must equal one of the listed values
    Enum(Vec<String>),
    /// Finite float, zero or greater
    NonNegativeFloat,
    /// One of the true or false synonyms, any case
    Boolean {
        true_values: Vec<String>,
        false_values: Vec<String>,
    },
    /// Integer, or null when the cell is empty
    OptionalInteger,
    /// Comma-separated values, each from the listed set
    EnumList(Vec<String>),
}

/// One column of the field table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub rule: Rule,
}

impl FieldSpec {
    pub fn required(name: &'static str, rule: Rule) -> Self {
        Self {
            name,
            required: true,
            rule,
        }
    }

    pub fn optional(name: &'static str, rule: Rule) -> Self {
        Self {
            name,
            required: false,
            rule,
        }
    }

    /// Apply this column's rule to a raw cell
    pub fn coerce(&self, raw: Option<&str>) -> Result<FieldValue, FieldError> {
        let name = self.name;
        match (&self.rule, raw) {
            (Rule::OptionalInteger, raw) => Ok(fields::validate_optional_int(name, raw)?
                .map_or(FieldValue::Null, FieldValue::Integer)),
            (_, None) => Ok(FieldValue::Null),
            (Rule::Text, Some(raw)) => Ok(FieldValue::Text(raw.to_string())),
            (Rule::Enum(allowed), Some(raw)) => {
                fields::validate_enum(name, raw, allowed).map(FieldValue::Text)
            },
            (Rule::NonNegativeFloat, Some(raw)) => {
                fields::validate_non_negative_float(name, raw).map(FieldValue::Float)
            },
            (
                Rule::Boolean {
                    true_values,
                    false_values,
                },
                Some(raw),
            ) => fields::validate_bool(name, raw, true_values, false_values).map(FieldValue::Bool),
            (Rule::EnumList(allowed), Some(raw)) => {
                fields::validate_enum_list(name, raw, allowed).map(FieldValue::List)
            },
        }
    }
}

/// The mesh product field table, with allowed values taken from `vocab`
pub fn mesh_fields(vocab: &Vocabulary) -> Vec<FieldSpec> {
    use columns::*;

    vec![
        FieldSpec::required(CODENAME, Rule::Text),
        FieldSpec::required(TRAME, Rule::Enum(vocab.trames.clone())),
        FieldSpec::required(MASS_SURF, Rule::NonNegativeFloat),
        FieldSpec::required(
            IS_COMPAT_INTERIOR_WALL,
            Rule::Boolean {
                true_values: vocab.true_values.clone(),
                false_values: vocab.false_values.clone(),
            },
        ),
        FieldSpec::required(MESH_HEIGHT, Rule::NonNegativeFloat),
        FieldSpec::required(MESH_WIDTH, Rule::NonNegativeFloat),
        FieldSpec::optional(ROLL_PALLET, Rule::OptionalInteger),
        FieldSpec::required(COLOR_NAMES, Rule::EnumList(vocab.colors.clone())),
    ]
}

/// Names of the required columns in `specs`
pub fn required_columns(specs: &[FieldSpec]) -> Vec<&'static str> {
    specs.iter().filter(|s| s.required).map(|s| s.name).collect()
}
