//! Relational fact encoding of an [`irgraph`] program.
//!
//! A session repeatedly extracts the program into a [`database::FactStore`],
//! diffs it against the previous extraction, hands the delta to a
//! [`sink::DiffSink`] and perturbs the program with one rewrite, so that the
//! effect of each edit on the fact encoding can be observed in isolation.
//!
//! - [`database`]: relations, schemas and tuples.
//! - [`diff`]: per-relation deltas between two stores.
//! - [`extractor`]: the memoized projection of the graph into a store.
//! - [`mutation`]: rewrite rules and the deterministic search applying them.
//! - [`sink`]: persistence of per-iteration deltas.
//! - [`session`]: the driver loop.
//! - [`utils`]: errors and configuration.

pub mod database;
pub mod diff;
pub mod extractor;
pub mod mutation;
pub mod session;
pub mod sink;
pub mod utils;
