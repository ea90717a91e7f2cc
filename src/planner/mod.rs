//! Chunk planning for one table of a cross-engine comparison
//!
//! The planner produces deterministic, disjoint row-range chunks that both
//! sides of a comparison can fetch in the same order under the same key.
//!
//! # Pipeline
//!
//! 1. Column metadata ([`crate::catalog::CatalogBuilder`])
//! 2. Key resolution: explicit, then discovered primary key, then synthetic rank
//! 3. Projection: SELECT list and ORDER BY-eligible list
//! 4. Chunks: one `NTILE` boundary query, ordered range predicates
//! 5. Assembly: dialect-specific base SQL
//!
//! # Degraded steps
//!
//! Introspection failures surface as [`StepOutcome`] values. Under the
//! `degrade` policy the plan continues and records a [`DegradedStep`];
//! under `fail` it aborts.

mod assembler;
mod chunks;
mod errors;
mod keys;
mod outcome;
mod planner;
mod projection;

pub use assembler::{AssembledQuery, QueryAssembler};
pub use chunks::{target_chunk_count, Chunk, ChunkPlanner, ChunkSet};
pub use errors::{ErrorCategory, PlanError, PlanErrorCode, PlanResult};
pub use keys::{unique_key_expression, KeyResolver, ResolvedKey};
pub use outcome::{DegradedStep, StepOutcome};
pub use planner::{PairedSide, PlanReport, PlanRequest, TablePlan, TablePlanner};
pub use projection::{plan_projection, Projection};
