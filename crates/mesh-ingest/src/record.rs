//! Raw input rows and coerced mesh records

use serde::{Deserialize, Serialize};

/// One data row as read from the input file.
///
/// Cells equal to a configured null token are stored as `None`. The record is
/// never modified after the reader builds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    line: usize,
    fields: Vec<(String, Option<String>)>,
}

impl RawRecord {
    /// Build a record for data row `line` (1-based, header excluded)
    pub fn new(line: usize, fields: Vec<(String, Option<String>)>) -> Self {
        Self { line, fields }
    }

    /// Convenience constructor where every listed cell is present
    pub fn from_pairs(line: usize, pairs: &[(&str, &str)]) -> Self {
        Self::new(
            line,
            pairs
                .iter()
                .map(|(name, value)| ((*name).to_string(), Some((*value).to_string())))
                .collect(),
        )
    }

    pub fn line(&self) -> usize {
        self.line
    }

    /// Value of `name`, or `None` when the column is absent or the cell is null
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Cells in column order
    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }
}

/// A coerced cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    Float(f64),
    Bool(bool),
    Integer(i64),
    List(Vec<String>),
}

/// Coerced values of one row, in field-table order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoercedRow {
    values: Vec<(&'static str, FieldValue)>,
}

impl CoercedRow {
    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        self.values.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn text(&self, name: &'static str) -> Result<String, &'static str> {
        match self.get(name) {
            Some(FieldValue::Text(value)) => Ok(value.clone()),
            _ => Err(name),
        }
    }

    fn float(&self, name: &'static str) -> Result<f64, &'static str> {
        match self.get(name) {
            Some(FieldValue::Float(value)) => Ok(*value),
            _ => Err(name),
        }
    }

    fn boolean(&self, name: &'static str) -> Result<bool, &'static str> {
        match self.get(name) {
            Some(FieldValue::Bool(value)) => Ok(*value),
            _ => Err(name),
        }
    }

    fn optional_integer(&self, name: &'static str) -> Result<Option<i64>, &'static str> {
        match self.get(name) {
            Some(FieldValue::Integer(value)) => Ok(Some(*value)),
            Some(FieldValue::Null) | None => Ok(None),
            _ => Err(name),
        }
    }

    fn list(&self, name: &'static str) -> Result<Vec<String>, &'static str> {
        match self.get(name) {
            Some(FieldValue::List(values)) => Ok(values.clone()),
            _ => Err(name),
        }
    }
}

/// A fully validated mesh product, one row of the `mesh` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshRecord {
    /// Product code, unique across the batch and the store
    pub codename: String,
    pub trame: String,
    pub mass_surf: f64,
    pub is_compat_interior_wall: bool,
    pub mesh_height: f64,
    pub mesh_width: f64,
    pub roll_pallet: Option<i64>,
    pub color_names: Vec<String>,
}

impl MeshRecord {
    /// Assemble a record from coerced values.
    ///
    /// Fails with the name of the first field that is missing or carries the
    /// wrong value type.
    pub fn from_coerced(row: &CoercedRow) -> Result<Self, &'static str> {
        use crate::schema::columns::*;

        Ok(Self {
            codename: row.text(CODENAME)?,
            trame: row.text(TRAME)?,
            mass_surf: row.float(MASS_SURF)?,
            is_compat_interior_wall: row.boolean(IS_COMPAT_INTERIOR_WALL)?,
            mesh_height: row.float(MESH_HEIGHT)?,
            mesh_width: row.float(MESH_WIDTH)?,
            roll_pallet: row.optional_integer(ROLL_PALLET)?,
            color_names: row.list(COLOR_NAMES)?,
        })
    }

    /// Colors as stored in the database
    pub fn joined_colors(&self) -> String {
        self.color_names.join(",")
    }
}
