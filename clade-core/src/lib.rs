//! Checklist normalization engine — interpretation, insertion, graph repair
//! and verification.
//!
//! The main entry point is [`normalize::Normalizer`], which runs the
//! Insert → Repair → Sync → Verify pipeline over a [`store::GraphStore`].

pub mod config;
pub mod error;
pub mod insert;
pub mod interpret;
pub mod name;
pub mod normalize;
pub mod progress;
pub mod store;
pub mod terms;
pub mod tree;
pub mod types;
pub mod validate;
