pub mod memory;
pub mod postgres;
pub mod schema;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use schema::{Collection, FieldKind};
pub use store::{Store, StoreError};
