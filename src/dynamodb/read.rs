//! Read operations.
//!
//! Each operation is a plain struct converted into a fully resolved request before it
//! is sent, and returns the SDK error verbatim.

/// Batch get item operation for retrieving many items of one table.
pub mod batch_get_item;

/// Get item operation for retrieving a single item by primary key.
pub mod get_item;

/// Query operation for retrieving items with a key condition.
pub mod query;
