//! chunkplan - deterministic chunk planning for cross-engine table comparison
//!
//! Splits a table into ordered, disjoint row-range chunks so that two
//! tables, possibly on different engines (Oracle, PostgreSQL, SQL Server),
//! can be fetched and compared in bounded-memory, parallelizable pieces
//! while both sides observe rows in the same order under the same key.
//!
//! ```ignore
//! use chunkplan::config::PlannerConfig;
//! use chunkplan::database::{MemoryDatabase, TableRef};
//! use chunkplan::planner::{PlanRequest, TablePlanner};
//!
//! let planner = TablePlanner::new("ORACLE", &db, PlannerConfig::default())?;
//! let report = planner.plan(&PlanRequest::new(TableRef::new("HR", "EMP")))?;
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod database;
pub mod dialect;
pub mod observability;
pub mod planner;
