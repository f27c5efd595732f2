mod memory;
mod tabular;

pub use memory::{Canonicalize, MemoryPersistence};
pub use tabular::MemoryStore;
