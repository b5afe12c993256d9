/// State management module
///
/// This module handles all layout state, including:
/// - Database connection and schema (library.rs)
/// - Shared data structures (data.rs)
/// - Persisted settings (config.rs)
/// - Canonical page-slot records (pages.rs)
/// - The superseded flat ordering and its migration (legacy.rs)
/// - Discovered applications (catalog.rs)
/// - In-memory pages and their mutations (layout.rs)
/// - Load / mutate / persist orchestration (reconciler.rs)
/// - Export and import bundles (bundle.rs)

pub mod bundle;
pub mod catalog;
pub mod config;
pub mod data;
pub mod layout;
pub mod legacy;
pub mod library;
pub mod pages;
pub mod reconciler;
