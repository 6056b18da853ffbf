//! Query composition, extension and execution.
//!
//! - [`composer`] - The AND/OR builder every entity query is built on
//! - [`field`] - Scalar filter values and descriptor tables
//! - [`entity`] - The entity abstraction and its rule tables
//! - [`extend`] - Merging a saved query with caller refinements
//! - [`compare`] - Detection of unsatisfiable filter combinations
//! - [`prepare`] - Normalization, candidate resolution and execution
//! - [`memory`] - In-memory reference executor

pub mod compare;
pub mod composer;
pub mod entity;
pub mod extend;
pub mod field;
pub mod memory;
pub mod predicate;
pub mod prepare;
pub mod sink;

pub use compare::EmptyReason;
pub use composer::{DisjunctId, Query};
pub use entity::{CandidateFields, EntityKind, ExcludedWhen, MembershipCheck, RangeCheck};
pub use field::{
    ExclusionRule, ExclusionScope, FieldDescriptor, FieldShape, FieldTest, FieldValue, MergeRule,
    SuspensionState,
};
pub use memory::{MemoryStore, Record, RecordVariable};
pub use predicate::{OrderTarget, OrderingProperty, Predicate};
pub use prepare::{Plan, PreparedQuery, QueryContext};
pub use sink::{ExecutionSink, Page};
