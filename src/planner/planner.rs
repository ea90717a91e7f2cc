//! Table planner
//!
//! Runs the planning pipeline for one table:
//!
//! ```text
//! CatalogBuilder -> KeyResolver -> plan_projection -> ChunkPlanner -> QueryAssembler
//! ```
//!
//! The dialect is validated when the planner is built, before any query
//! is issued. Each call to [`TablePlanner::plan`] is independent and
//! returns a self-contained [`PlanReport`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{CatalogBuilder, TableMetadata};
use crate::config::{PlannerConfig, ReportType};
use crate::database::{Database, TableRef};
use crate::dialect::{Dialect, DialectKind};
use crate::observability::{log_event, Event, ObservationScope};

use super::assembler::QueryAssembler;
use super::chunks::{Chunk, ChunkPlanner};
use super::errors::PlanResult;
use super::keys::{unique_key_expression, KeyResolver, ResolvedKey};
use super::outcome::{DegradedStep, StepOutcome};
use super::projection::plan_projection;

/// What the paired side of a comparison already decided
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedSide {
    /// Comma-joined sort key
    #[serde(default)]
    pub sort_key: Option<String>,
    #[serde(default)]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub has_no_unique_key: bool,
    /// Authoritative column map for projection
    #[serde(default)]
    pub columns: Option<TableMetadata>,
}

/// One table to plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub table: TableRef,
    pub paired: Option<PairedSide>,
}

impl PlanRequest {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            paired: None,
        }
    }

    pub fn with_paired(mut self, paired: PairedSide) -> Self {
        self.paired = Some(paired);
        self
    }
}

/// Everything a fetch/compare worker needs for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePlan {
    pub plan_id: Uuid,
    pub planned_at: DateTime<Utc>,
    pub dialect: DialectKind,
    pub table: TableRef,
    /// Base SQL; append a chunk predicate to fetch one chunk
    pub sql: String,
    pub chunks: Vec<Chunk>,
    pub row_count: u64,
    pub key: ResolvedKey,
    pub sort_key: Option<String>,
    pub primary_key: Option<String>,
    pub has_no_unique_key: bool,
    /// The `key1` expression
    pub unique_key: String,
    pub columns: TableMetadata,
    pub select_columns: Vec<String>,
    pub sort_columns: Vec<String>,
    /// Steps that did not complete cleanly
    #[serde(default)]
    pub degraded: Vec<DegradedStep>,
}

impl TablePlan {
    /// Full SQL for chunk `index`
    pub fn chunk_sql(&self, index: usize) -> Option<String> {
        self.chunks
            .get(index)
            .map(|chunk| format!("{} {}", self.sql, chunk.predicate))
    }

    /// Decisions to hand to the other side of the comparison
    pub fn paired_side(&self) -> PairedSide {
        PairedSide {
            sort_key: self.sort_key.clone(),
            primary_key: self.primary_key.clone(),
            has_no_unique_key: self.has_no_unique_key,
            columns: Some(self.columns.clone()),
        }
    }
}

/// Result of planning one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "report")]
pub enum PlanReport {
    /// Row count only
    Basic { table: TableRef, row_count: u64 },
    Detail(TablePlan),
}

impl PlanReport {
    pub fn row_count(&self) -> u64 {
        match self {
            PlanReport::Basic { row_count, .. } => *row_count,
            PlanReport::Detail(plan) => plan.row_count,
        }
    }

    pub fn as_detail(&self) -> Option<&TablePlan> {
        match self {
            PlanReport::Detail(plan) => Some(plan),
            PlanReport::Basic { .. } => None,
        }
    }
}

/// Plans tables of one database under one configuration
pub struct TablePlanner<'a, D: Database + ?Sized> {
    dialect: &'static dyn Dialect,
    db: &'a D,
    config: PlannerConfig,
}

impl<'a, D: Database + ?Sized> TablePlanner<'a, D> {
    /// Fails fast on an unknown dialect or invalid configuration
    pub fn new(dialect: &str, db: &'a D, config: PlannerConfig) -> PlanResult<Self> {
        let kind: DialectKind = dialect.parse()?;
        config.validate()?;

        Ok(Self {
            dialect: kind.dialect(),
            db,
            config,
        })
    }

    pub fn dialect(&self) -> DialectKind {
        self.dialect.kind()
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans one table
    pub fn plan(&self, request: &PlanRequest) -> PlanResult<PlanReport> {
        let plan_id = Uuid::new_v4();
        let id = plan_id.to_string();
        let qualified = request.table.qualified();

        let scope = ObservationScope::with_fields(
            "PLAN",
            &[
                ("plan_id", id.as_str()),
                ("table", qualified.as_str()),
                ("dialect", self.dialect.kind().as_str()),
            ],
        );

        match self.run(plan_id, &id, request) {
            Ok(report) => {
                let rows = report.row_count().to_string();
                let chunks = report
                    .as_detail()
                    .map(|plan| plan.chunks.len())
                    .unwrap_or(0)
                    .to_string();
                scope.complete_with_fields(&[("rows", rows.as_str()), ("chunks", chunks.as_str())]);
                Ok(report)
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e)
            }
        }
    }

    fn chunk_planner<'p>(&'p self, table: &'p TableRef, plan_id: &'p str) -> ChunkPlanner<'p, D> {
        let sampling = self.config.chunk_filter().is_none();
        ChunkPlanner::new(self.db, self.dialect, table, self.config.fetch_size)
            .with_filter(self.config.filter_text(), sampling)
            .with_zero_row_policy(
                self.config
                    .zero_row_policy
                    .unwrap_or_else(|| self.dialect.default_zero_row_policy()),
            )
            .with_plan_id(plan_id)
    }

    fn run(&self, plan_id: Uuid, id: &str, request: &PlanRequest) -> PlanResult<PlanReport> {
        let table = &request.table;
        let chunk_planner = self.chunk_planner(table, id);

        if self.config.report_type == ReportType::Basic {
            let row_count = chunk_planner.count_rows()?;
            return Ok(PlanReport::Basic {
                table: table.clone(),
                row_count,
            });
        }

        let policy = self.config.introspection_policy;
        let mut degraded = Vec::new();

        let catalog = CatalogBuilder::from_config(self.dialect, &self.config)
            .with_plan_id(id)
            .introspect(self.db, table)?;
        let columns = catalog.visible;

        let key_outcome = KeyResolver::new(self.dialect).resolve(self.db, table, request.paired.as_ref());
        if let StepOutcome::Degraded { cause, .. } = &key_outcome {
            let reason = cause.to_string();
            log_event(
                Event::KeyDegraded,
                &[("plan_id", id), ("table", table.qualified().as_str()), ("reason", reason.as_str())],
            );
        }
        let key = key_outcome.accept("key_resolution", policy, &mut degraded)?;

        let sort_key = key.sort_key();
        log_event(
            Event::KeyResolved,
            &[
                ("plan_id", id),
                ("source", key.source()),
                ("sort_key", sort_key.as_deref().unwrap_or("")),
                ("primary_key", key.primary_key().unwrap_or("")),
            ],
        );

        let authoritative = request
            .paired
            .as_ref()
            .and_then(|p| p.columns.as_ref())
            .unwrap_or(&columns);
        let projection_outcome = plan_projection(authoritative, &columns, self.dialect, table);
        if let StepOutcome::Partial { skipped, .. } = &projection_outcome {
            let skipped = skipped.join(",");
            log_event(
                Event::ProjectionPartial,
                &[("plan_id", id), ("skipped", skipped.as_str())],
            );
        }
        let projection = projection_outcome.accept("projection", policy, &mut degraded)?;

        let unique_key = unique_key_expression(&key, self.dialect, &catalog.reported, &projection.sort_list());

        let row_count = chunk_planner.count_rows()?;
        let assembled = QueryAssembler::new(self.dialect, table).assemble(
            &chunk_planner,
            &key,
            &unique_key,
            &projection,
            row_count,
            id,
        )?;

        Ok(PlanReport::Detail(TablePlan {
            plan_id,
            planned_at: Utc::now(),
            dialect: self.dialect.kind(),
            table: table.clone(),
            sql: assembled.sql,
            chunks: assembled.chunks.chunks,
            row_count: assembled.chunks.row_count,
            sort_key,
            primary_key: key.primary_key().map(str::to_string),
            has_no_unique_key: key.has_no_unique_key(),
            key,
            unique_key,
            columns,
            select_columns: projection.select_columns,
            sort_columns: projection.sort_columns,
            degraded,
        }))
    }
}
