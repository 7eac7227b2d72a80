//! sw-engine - The explanation engine for sqlwhy
//!
//! Given a [`sw_core::QueryModel`] and an injected [`sw_db::ExecutionAdapter`],
//! the analyzers in this crate synthesize diagnostic sub-queries, execute
//! them in a fixed deterministic order, and post-process the rows into
//! ranked explanation records:
//!
//! - [`AggregateAnalyzer`]: per-group contribution accounting for SUM/COUNT/AVG
//! - [`JoinAnalyzer`]: join-key mismatch and fan-out detection
//! - [`PredicateAnalyzer`]: per-conjunct filtering attribution
//! - [`WhyNotAnalyzer`]: minimal-relaxation search for a missing tuple

pub mod aggregate;
pub mod error;
pub mod join;
pub mod predicate;
pub mod synth;
pub mod why_not;

pub use aggregate::AggregateAnalyzer;
pub use error::{EngineError, EngineResult};
pub use join::{JoinAnalyzer, FAN_OUT_MULTIPLIER};
pub use predicate::PredicateAnalyzer;
pub use synth::{DiagnosticQuery, Purpose, QuerySynthesizer};
pub use why_not::{TargetTuple, WhyNotAnalyzer, MAX_RELAXATION_CANDIDATES};
