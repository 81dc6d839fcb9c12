//! Column-oriented sample tables.
//!
//! The pipeline only needs three numeric columns; every other column is
//! carried through untouched. [`ColumnTable`] is the seam for other storage
//! backends, [`SampleTable`] the in-memory implementation used by the CLI.
use crate::error::DestripeError;
use serde::{Deserialize, Serialize};

/// Read access the pipeline needs from a tabular source.
pub trait ColumnTable {
    fn row_count(&self) -> usize;

    /// Numeric column by name, `None` entries marking missing values.
    fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>, DestripeError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

/// Ordered set of equally long named columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleTable {
    columns: Vec<Column>,
}

impl SampleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from columns, checking that all have the same length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, DestripeError> {
        let table = Self { columns };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), DestripeError> {
        let Some(first) = self.columns.first() else {
            return Ok(());
        };
        let n = first.values.len();
        for c in &self.columns {
            if c.values.len() != n {
                return Err(DestripeError::Table(format!(
                    "column '{}' has {} rows, expected {}",
                    c.name,
                    c.values.len(),
                    n
                )));
            }
        }
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Append a column, replacing an existing one with the same name in place.
    pub fn set_column(&mut self, name: &str, values: ColumnValues) -> Result<(), DestripeError> {
        if !self.columns.is_empty() && values.len() != self.row_count() {
            return Err(DestripeError::Table(format!(
                "column '{}' has {} rows, expected {}",
                name,
                values.len(),
                self.row_count()
            )));
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    pub fn with_numeric(
        mut self,
        name: &str,
        values: Vec<Option<f64>>,
    ) -> Result<Self, DestripeError> {
        self.set_column(name, ColumnValues::Numeric(values))?;
        Ok(self)
    }
}

impl ColumnTable for SampleTable {
    fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>, DestripeError> {
        match self.column(name) {
            Some(Column {
                values: ColumnValues::Numeric(v),
                ..
            }) => Ok(v.clone()),
            Some(_) => Err(DestripeError::Table(format!(
                "column '{}' is not numeric",
                name
            ))),
            None => Err(DestripeError::MissingColumn(name.to_string())),
        }
    }
}
