//! Normalization, categorization and filtering of public procurement notices.
//!
//! ```text
//!  JSON array ──▶ loader ──▶ normalize (+ categorize) ──▶ Dataset
//!                                                          │
//!                                  Selection ──▶ filter ◀──┘
//!                                                  │
//!                                     reports::summarize / output
//! ```
pub mod categorize;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;
