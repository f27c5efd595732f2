//! Type-erased tabular results.
//!
//! The paging engine and the backends exchange rows as [`Record`]s so that a
//! single execution path serves every entity kind.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(i64),
    Text(String),
}

impl Value {
    /// Total order used for sorting: nulls first, then booleans, numbers and text.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::Text(_) => 3,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Value::Number(number.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One result row, keyed by column label.
pub type Record = BTreeMap<String, Value>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Table {
    Pods,
    Vmis,
    Migrations,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Pods => "pods",
            Table::Vmis => "vmis",
            Table::Migrations => "vmimigrations",
        }
    }
}

/// A stored column (`name`) and the key it is reported under (`label`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub label: &'static str,
}

impl Column {
    pub const fn new(name: &'static str, label: &'static str) -> Self {
        Self { name, label }
    }
}

/// Equality predicate on a stored column. `Value::Null` matches missing values.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub column: Column,
    pub value: Value,
}

/// A read-only selection over one table: no limit, just what and in which order.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub table: Table,
    pub columns: Vec<Column>,
    pub filters: Vec<Filter>,
    pub order_by: Vec<Column>,
}

impl Projection {
    pub fn new(table: Table, columns: &[Column]) -> Self {
        Self {
            table,
            columns: columns.to_vec(),
            filters: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn filter(mut self, column: Column, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, columns: &[Column]) -> Self {
        self.order_by.extend_from_slice(columns);
        self
    }
}

/// Row slice `[offset, offset + limit)` of a projection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub per_page: i64,
    pub total_row_count: u64,
    pub total_pages: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page {
    pub data: Vec<Record>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_cmp_orders_across_variants() {
        let mut values = vec![
            Value::from("b"),
            Value::Number(3),
            Value::Null,
            Value::from("a"),
            Value::Bool(true),
        ];

        values.sort_by(|a, b| a.sort_cmp(b));

        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Number(3),
                Value::from("a"),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn test_value_serializes_untagged() {
        let mut record = Record::new();
        record.insert("completed".to_string(), Value::Bool(true));
        record.insert("endTimestamp".to_string(), Value::Null);
        record.insert("name".to_string(), Value::from("m1"));
        record.insert("totalContainers".to_string(), Value::Number(2));

        let json = serde_json::to_string(&record).unwrap();

        assert_eq!(
            json,
            r#"{"completed":true,"endTimestamp":null,"name":"m1","totalContainers":2}"#
        );
    }
}
