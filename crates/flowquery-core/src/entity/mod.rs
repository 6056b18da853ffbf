//! Entity query surfaces.
//!
//! Each entity declares its field enum and static rule tables, and adds
//! named builder methods on top of the shared [`Query`](crate::query::Query)
//! composer.

/// Generates the variable comparison methods for one variable scope.
macro_rules! variable_filters {
    (
        $scope:expr,
        $value:ident,
        $eq:ident,
        $neq:ident,
        $gt:ident,
        $gteq:ident,
        $lt:ident,
        $lteq:ident,
        $like:ident,
        $not_like:ident
    ) => {
        /// Compare a variable with an explicit operator.
        pub fn $value(
            &mut self,
            name: impl Into<String>,
            operator: $crate::QueryOperator,
            value: impl Into<$crate::VariableValue>,
        ) -> $crate::QueryResult<&mut Self> {
            self.add_variable(name, $scope, operator, value)
        }

        pub fn $eq(
            &mut self,
            name: impl Into<String>,
            value: impl Into<$crate::VariableValue>,
        ) -> $crate::QueryResult<&mut Self> {
            self.add_variable(name, $scope, $crate::QueryOperator::Equals, value)
        }

        pub fn $neq(
            &mut self,
            name: impl Into<String>,
            value: impl Into<$crate::VariableValue>,
        ) -> $crate::QueryResult<&mut Self> {
            self.add_variable(name, $scope, $crate::QueryOperator::NotEquals, value)
        }

        pub fn $gt(
            &mut self,
            name: impl Into<String>,
            value: impl Into<$crate::VariableValue>,
        ) -> $crate::QueryResult<&mut Self> {
            self.add_variable(name, $scope, $crate::QueryOperator::GreaterThan, value)
        }

        pub fn $gteq(
            &mut self,
            name: impl Into<String>,
            value: impl Into<$crate::VariableValue>,
        ) -> $crate::QueryResult<&mut Self> {
            self.add_variable(name, $scope, $crate::QueryOperator::GreaterThanOrEqual, value)
        }

        pub fn $lt(
            &mut self,
            name: impl Into<String>,
            value: impl Into<$crate::VariableValue>,
        ) -> $crate::QueryResult<&mut Self> {
            self.add_variable(name, $scope, $crate::QueryOperator::LessThan, value)
        }

        pub fn $lteq(
            &mut self,
            name: impl Into<String>,
            value: impl Into<$crate::VariableValue>,
        ) -> $crate::QueryResult<&mut Self> {
            self.add_variable(name, $scope, $crate::QueryOperator::LessThanOrEqual, value)
        }

        pub fn $like(&mut self, name: impl Into<String>, pattern: impl Into<String>) -> $crate::QueryResult<&mut Self> {
            self.add_variable(name, $scope, $crate::QueryOperator::Like, pattern.into())
        }

        pub fn $not_like(
            &mut self,
            name: impl Into<String>,
            pattern: impl Into<String>,
        ) -> $crate::QueryResult<&mut Self> {
            self.add_variable(name, $scope, $crate::QueryOperator::NotLike, pattern.into())
        }
    };
}

pub mod historic_process_instance;
pub mod process_instance;
pub mod task;

pub use historic_process_instance::{HistoricProcessInstance, HistoricProcessInstanceField, HistoricProcessInstanceQuery};
pub use process_instance::{ProcessInstance, ProcessInstanceField, ProcessInstanceQuery};
pub use task::{Task, TaskField, TaskQuery};
