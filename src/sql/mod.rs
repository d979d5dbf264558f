//! SQL utilities
//!
//! Provides predicate building and identifier/literal quoting.

pub mod predicate;
pub mod sanitize;

pub use predicate::{PredicateBuilder, build_query};
pub use sanitize::{
    RESERVED_WORDS, is_bare_identifier, quote_identifier, quote_literal, quote_table_ref,
    render_identifier, validate_identifier,
};
