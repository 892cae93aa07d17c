// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Built-in checks.

use crate::registry::Check;

pub mod finalizer_nulling;
pub mod inner_class_calls;
pub mod object_equality;
pub mod sql_injection;

pub use finalizer_nulling::FinalizerNullingCheck;
pub use inner_class_calls::InnerClassCallsCheck;
pub use object_equality::ObjectEqualityCheck;
pub use sql_injection::SqlInjectionCheck;

/// One instance of every built-in check, in rule-key order.
pub fn builtin_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(ObjectEqualityCheck::new()),
        Box::new(SqlInjectionCheck::new()),
        Box::new(FinalizerNullingCheck::new()),
        Box::new(InnerClassCallsCheck::new()),
    ]
}
