//! Driver-neutral query statements and result records.
//!
//! A [`Statement`] is what the view resolver and the reachability engine
//! produce; a [`Record`] is what a graph store hands back per result row.
//! Keeping both as plain data lets everything above the store adapter run
//! without a database.

use std::collections::BTreeMap;

use serde_json::Value;

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Str(String),
    Int(i64),
    Null,
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// A parametrized Cypher statement and the columns it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub cypher: String,
    pub params: BTreeMap<String, Param>,
    pub columns: Vec<String>,
}

impl Statement {
    pub fn new(cypher: impl Into<String>) -> Self {
        Self {
            cypher: cypher.into(),
            params: BTreeMap::new(),
            columns: Vec::new(),
        }
    }

    /// Declare the returned columns. Stores read exactly these from each row.
    pub fn returns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn param(mut self, key: &str, value: impl Into<Param>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

static NULL: Value = Value::Null;

/// One result row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: Value) -> Self {
        self.columns.insert(column.to_string(), value);
        self
    }

    pub fn insert(&mut self, column: &str, value: Value) {
        self.columns.insert(column.to_string(), value);
    }

    /// Column value, or `Null` when the column is absent.
    pub fn get(&self, column: &str) -> &Value {
        self.columns.get(column).unwrap_or(&NULL)
    }

    /// Build from a JSON object; anything else yields an empty record.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                columns: map.into_iter().collect(),
            },
            _ => Self::default(),
        }
    }
}
