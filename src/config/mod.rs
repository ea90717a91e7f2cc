//! Planner configuration
//!
//! Loaded from a JSON file. Every field has a default except the ones that
//! only make sense when given (filter, column list).

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::planner::{PlanError, PlanResult};

/// How much work a plan does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ReportType {
    /// Full plan: metadata, keys, SQL and chunks
    #[default]
    Detail,
    /// Row count only
    Basic,
}

impl FromStr for ReportType {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detail" => Ok(ReportType::Detail),
            "basic" => Ok(ReportType::Basic),
            other => Err(PlanError::config_invalid(format!(
                "Invalid report_type: '{}'. Must be 'Detail' or 'Basic'.",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ReportType {
    type Error = PlanError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// How the configured filter is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum FilterType {
    /// Filter restricts counting only; chunk predicates ignore it
    Sample,
    /// Filter restricts every chunk
    Predicate,
}

impl FromStr for FilterType {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sample" => Ok(FilterType::Sample),
            "predicate" => Ok(FilterType::Predicate),
            other => Err(PlanError::config_invalid(format!(
                "Invalid filter_type: '{}'. Must be 'Sample' or 'Predicate'.",
                other
            ))),
        }
    }
}

impl TryFrom<String> for FilterType {
    type Error = PlanError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// What happens when key introspection fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntrospectionPolicy {
    /// Log, record the degraded step, and continue with a synthetic key
    #[default]
    Degrade,
    /// Abort the plan
    Fail,
}

/// What happens when the filtered row count is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroRowPolicy {
    /// Return a plan with no chunks
    Allow,
    /// Fail with a data error naming the table
    Fail,
}

impl fmt::Display for ZeroRowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZeroRowPolicy::Allow => write!(f, "allow"),
            ZeroRowPolicy::Fail => write!(f, "fail"),
        }
    }
}

/// Configuration recognised by the planner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Rows per chunk (must be > 0)
    #[serde(default = "default_fetch_size")]
    pub fetch_size: u64,

    /// Cap on fractional digits in decimal formats; 0 disables the cap
    #[serde(default = "default_max_decimals")]
    pub max_decimals: u32,

    /// Varchar size above which a column is treated as oversized
    #[serde(default = "default_max_text_size")]
    pub max_text_size: u32,

    #[serde(default)]
    pub report_type: ReportType,

    /// When true, `columns` is a deny list; otherwise an allow list
    #[serde(default)]
    pub ignore_columns: bool,

    /// Column names matched case-insensitively; empty admits every column
    #[serde(default)]
    pub columns: Vec<String>,

    /// Predicate text without `WHERE`
    #[serde(default)]
    pub filter: Option<String>,

    #[serde(default)]
    pub filter_type: Option<FilterType>,

    #[serde(default)]
    pub introspection_policy: IntrospectionPolicy,

    /// Overrides the dialect's default when set
    #[serde(default)]
    pub zero_row_policy: Option<ZeroRowPolicy>,
}

fn default_fetch_size() -> u64 {
    10_000
}
fn default_max_decimals() -> u32 {
    5
}
fn default_max_text_size() -> u32 {
    4000
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            fetch_size: default_fetch_size(),
            max_decimals: default_max_decimals(),
            max_text_size: default_max_text_size(),
            report_type: ReportType::default(),
            ignore_columns: false,
            columns: Vec::new(),
            filter: None,
            filter_type: None,
            introspection_policy: IntrospectionPolicy::default(),
            zero_row_policy: None,
        }
    }
}

impl PlannerConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> PlanResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| PlanError::config_invalid(format!("Failed to read config: {}", e)))?;

        let config: PlannerConfig = serde_json::from_str(&content)
            .map_err(|e| PlanError::config_invalid(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Rejects values the planner cannot work with
    pub fn validate(&self) -> PlanResult<()> {
        if self.fetch_size == 0 {
            return Err(PlanError::config_invalid("fetch_size must be > 0"));
        }
        Ok(())
    }

    pub fn with_fetch_size(mut self, fetch_size: u64) -> Self {
        self.fetch_size = fetch_size;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>, filter_type: Option<FilterType>) -> Self {
        self.filter = Some(filter.into());
        self.filter_type = filter_type;
        self
    }

    pub fn with_report_type(mut self, report_type: ReportType) -> Self {
        self.report_type = report_type;
        self
    }

    pub fn with_zero_row_policy(mut self, policy: ZeroRowPolicy) -> Self {
        self.zero_row_policy = Some(policy);
        self
    }

    pub fn with_introspection_policy(mut self, policy: IntrospectionPolicy) -> Self {
        self.introspection_policy = policy;
        self
    }

    /// Non-blank filter text, if any
    pub fn filter_text(&self) -> Option<&str> {
        self.filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    /// Filter to AND into chunk predicates; sampling filters are excluded
    pub fn chunk_filter(&self) -> Option<&str> {
        match self.filter_type {
            Some(FilterType::Sample) => None,
            _ => self.filter_text(),
        }
    }
}
