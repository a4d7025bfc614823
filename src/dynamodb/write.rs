//! Write operations.
//!
//! Each operation is a plain struct converted into a fully resolved request before it
//! is sent, and returns the SDK error verbatim.

/// Common utilities and types for write operations.
pub(crate) mod common;

/// Delete item operation for removing items from tables.
pub mod delete_item;

/// Put item operation for creating or replacing items.
pub mod put_item;

/// Update item operation for modifying existing items.
pub mod update_item;
