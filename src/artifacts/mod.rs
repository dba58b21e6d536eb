//! Data structures and algorithms
//!
//! - `database`: entry types for parsed tree objects
//! - `ignore`: exclusion rules (glob matching, patterns, per-repo cache)
//! - `index`: staged index entry format
//! - `monitor`: file-change monitoring and monitored caches
//! - `objects`: object types (blob, tree, commit)

pub mod database;
pub mod ignore;
pub mod index;
pub mod monitor;
pub mod objects;
