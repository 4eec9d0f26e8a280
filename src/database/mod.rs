pub mod manager;
pub mod repository;
pub mod statements;

pub use manager::{connect, DatabaseError};
pub use repository::{PgCatalog, Repository};
pub use statements::PgEntity;
