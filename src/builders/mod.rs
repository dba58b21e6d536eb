//! Repository mutation builders
//!
//! Each builder is a staged configuration record over a borrowed repository:
//! configuration methods consume and return the builder (fallible ones
//! validate immediately and return `Result<Self>`), and a single terminal
//! method performs all side effects. Abandoning a builder before its terminal
//! method has no side effects.
//!
//! Builders are not internally thread-safe; one writer per repository is the
//! caller's responsibility.

pub mod checkout_builder;
pub mod commit_builder;
pub mod index_builder;
pub mod revision;

pub use checkout_builder::CheckoutBuilder;
pub use commit_builder::CommitBuilder;
pub use index_builder::IndexBuilder;
