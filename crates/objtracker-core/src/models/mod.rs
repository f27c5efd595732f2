mod migration;
mod pod;
mod vmi;

pub use migration::Migration;
pub use pod::Pod;
pub use vmi::{MigrationState, Vmi};

use crate::query::{Column, Record, Value};

/// Column access for backends that evaluate projections in process.
pub trait Tabular {
    /// Value stored under `column.name`, `Value::Null` for unknown columns.
    fn column_value(&self, column: &Column) -> Value;

    fn to_record(&self, columns: &[Column]) -> Record {
        columns
            .iter()
            .map(|column| (column.label.to_string(), self.column_value(column)))
            .collect()
    }
}
