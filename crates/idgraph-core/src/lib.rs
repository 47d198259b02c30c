//! # Idgraph Core - Query Engine and Facade
//!
//! The query engine compiles role/attribute/name constraints into an
//! execution plan over the store's indexes; the [`IdentityManager`]
//! facade is the single entry point external callers use for
//! add/update/remove operations and for obtaining query builders.

mod manager;
mod query;

pub use manager::IdentityManager;
pub use query::QueryBuilder;
