//! Logical rewrite rules and the default rule set.

pub mod type_cast;

pub use type_cast::{needs_cast, TypeCastInserter};

use crate::rule::Rule;

/// Rules the optimizer runs when none are given explicitly, in firing order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(TypeCastInserter::for_load()),
        Box::new(TypeCastInserter::for_stream()),
    ]
}
