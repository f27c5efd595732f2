mod deadline;
mod error;
mod persistence;

pub mod models;
pub mod query;
pub mod schema;
pub mod timestamp;

pub use deadline::with_deadline;
pub use error::{StoreError, StoreResult};
pub use persistence::{
    CreationWindow, PersistableModel, Persistence, PodPersistence, TabularSource, VmiPersistence,
};
