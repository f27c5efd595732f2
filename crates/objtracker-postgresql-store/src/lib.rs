mod error;
mod migration;
mod pod;
mod postgresql;
mod tabular;
mod vmi;

pub use migration::MigrationRelationalPersistence;
pub use pod::PodRelationalPersistence;
pub use postgresql::{PostgresConfig, PostgresStore};
pub use tabular::RelationalTabularSource;
pub use vmi::VmiRelationalPersistence;
