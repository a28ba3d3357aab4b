//! Cache partitions for offline data access.
//!
//! This module provides the `CacheTiers` manager for the three named
//! partitions the data layer relies on:
//!
//! - Shell: the static assets needed to boot the app offline
//! - Offline: the synthesized fallback document for HTML navigations
//! - QuizData: cacheable API responses (quiz content, reference data)
//!
//! Partition names carry a version suffix; `activate` purges every
//! directory whose name is not one of the three current partitions.

pub mod tiers;

pub use tiers::{offline_document, CacheTiers, PartitionRole, ResponseSnapshot, SHELL_MANIFEST};
