//! Outbound calls to sibling services.

pub mod files;
