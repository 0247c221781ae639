pub mod connection;
pub mod errors;
pub mod queries;
pub mod sql;

pub use connection::{close_pool, get_pool, init_pool, with_retry};
pub use errors::{DatabaseError, Result};
