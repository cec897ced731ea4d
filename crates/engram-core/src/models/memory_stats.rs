use serde::{Deserialize, Serialize};

/// Capacity health, derived from `total_memories / memory_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Monitor,
    Warning,
}

impl HealthStatus {
    /// Threshold mapping: below 70% healthy, below 90% monitor, else warning.
    pub fn from_usage(total: usize, limit: usize) -> Self {
        let usage_pct = if limit == 0 {
            100.0
        } else {
            (total as f64 / limit as f64) * 100.0
        };
        if usage_pct < 70.0 {
            HealthStatus::Healthy
        } else if usage_pct < 90.0 {
            HealthStatus::Monitor
        } else {
            HealthStatus::Warning
        }
    }

    /// Operator-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Monitor => "Monitor - Consider cleanup",
            HealthStatus::Warning => "Warning - Near limit",
        }
    }
}

/// A most-accessed memory in the stats report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopAccessed {
    pub content_preview: String,
    pub access_count: u32,
}

/// Aggregate store statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_memories: usize,
    pub memory_limit: usize,
    /// Per-category counts, descending by count.
    pub categories: Vec<(String, usize)>,
    /// Memories created in the last 7 days.
    pub recent_week_count: usize,
    /// Database file size in MiB, rounded to 2 decimals. 0 for in-memory.
    pub database_size_mb: f64,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    /// Top 5 by access count.
    pub top_accessed: Vec<TopAccessed>,
    pub health_status: HealthStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_thresholds() {
        assert_eq!(HealthStatus::from_usage(0, 100), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_usage(69, 100), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_usage(70, 100), HealthStatus::Monitor);
        assert_eq!(HealthStatus::from_usage(89, 100), HealthStatus::Monitor);
        assert_eq!(HealthStatus::from_usage(90, 100), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_usage(100, 100), HealthStatus::Warning);
    }
}
