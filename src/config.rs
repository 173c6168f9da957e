//! Environment configuration for the dashboard binary
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `NORTHWIND_SOURCE` | SQLite file or parquet directory | `data/Northwind_small.sqlite` |
//! | `NORTHWIND_COUNTRIES` | comma-separated country selection | first five countries |
//! | `NORTHWIND_CATEGORIES` | comma-separated category selection | all categories |
//! | `NORTHWIND_FORMAT` | `table` or `json` | `table` |
//! | `NORTHWIND_RUNS` | render repetitions, for timing | `1` |
//! | `NORTHWIND_LOG` | tracing filter | `info` |

use std::path::PathBuf;

use crate::dashboard::SelectionRequest;
use crate::error::{DashboardError, Result};

pub const DEFAULT_SOURCE: &str = "data/Northwind_small.sqlite";
pub const LOG_ENV: &str = "NORTHWIND_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub source: PathBuf,
    pub selection: SelectionRequest,
    pub format: OutputFormat,
    pub runs: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE),
            selection: SelectionRequest::default(),
            format: OutputFormat::Table,
            runs: 1,
        }
    }
}

impl DashboardConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(source) = lookup("NORTHWIND_SOURCE").filter(|s| !s.trim().is_empty()) {
            config.source = PathBuf::from(source.trim());
        }

        config.selection.countries = lookup("NORTHWIND_COUNTRIES").map(|v| parse_list(&v));
        config.selection.categories = lookup("NORTHWIND_CATEGORIES").map(|v| parse_list(&v));

        if let Some(format) = lookup("NORTHWIND_FORMAT") {
            config.format = match format.trim().to_ascii_lowercase().as_str() {
                "table" | "" => OutputFormat::Table,
                "json" => OutputFormat::Json,
                other => {
                    return Err(DashboardError::Config(format!(
                        "NORTHWIND_FORMAT must be table or json, got {}",
                        other
                    )))
                }
            };
        }

        if let Some(runs) = lookup("NORTHWIND_RUNS") {
            config.runs = runs
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| {
                    DashboardError::Config(format!(
                        "NORTHWIND_RUNS must be a positive integer, got {}",
                        runs
                    ))
                })?;
        }

        Ok(config)
    }
}

/// Split a comma list, trimming entries and dropping empty ones
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<DashboardConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DashboardConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.source, PathBuf::from("data/Northwind_small.sqlite"));
        assert!(config.selection.countries.is_none());
    }

    #[test]
    fn test_selection_lists() {
        let config = config(&[
            ("NORTHWIND_COUNTRIES", " USA, Germany ,,France"),
            ("NORTHWIND_CATEGORIES", ""),
        ])
        .unwrap();
        assert_eq!(
            config.selection.countries,
            Some(vec!["USA".to_string(), "Germany".to_string(), "France".to_string()])
        );
        assert_eq!(config.selection.categories, Some(vec![]));
    }

    #[test]
    fn test_format_and_runs() {
        let config = config(&[
            ("NORTHWIND_FORMAT", "JSON"),
            ("NORTHWIND_RUNS", "10"),
            ("NORTHWIND_SOURCE", "/srv/northwind"),
        ])
        .unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.runs, 10);
        assert_eq!(config.source, PathBuf::from("/srv/northwind"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("NORTHWIND_FORMAT", "xml")]),
            Err(DashboardError::Config(_))
        ));
        assert!(matches!(
            config(&[("NORTHWIND_RUNS", "0")]),
            Err(DashboardError::Config(_))
        ));
    }
}
