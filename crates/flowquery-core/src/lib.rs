//! flowquery core.
//!
//! Composes filter queries over workflow entities (tasks, process
//! instances, historic process instances) through a fluent AND/OR builder,
//! validates every mutation as it happens, normalizes typed variable
//! conditions for the active storage dialect, merges saved filters with
//! caller refinements, and resolves candidate groups before handing the
//! finished query to an executor.
//!
//! # Example
//!
//! ```ignore
//! use flowquery_core::entity::TaskQuery;
//!
//! let mut query = TaskQuery::new();
//! query
//!     .task_candidate_group("accounting")?
//!     .or()?
//!     .task_name("Approve invoice")?
//!     .process_variable_value_equals("amount", 900i64)?
//!     .end_or()?;
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod filter;
pub mod operator;
pub mod query;
pub mod security;
pub mod variable;

pub use config::{Dialect, EngineConfig};
pub use error::{BoxError, QueryError, QueryResult};
pub use filter::{FilterService, SavedFilter};
pub use query::{
    EmptyReason, EntityKind, ExecutionSink, FieldValue, MemoryStore, Plan, PreparedQuery, Query,
    QueryContext, Record,
};
pub use security::{IdentityProvider, MemoryIdentityProvider};
pub use variable::{DefaultSerializers, SerializerRegistry, VariableCondition};

pub use flowquery_proto::{
    NormalizedValue, OrderDirection, QueryOperator, ValueKind, VariableScope, VariableValue,
};
