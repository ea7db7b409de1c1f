//! Emergency (SOS) alerts raised by riders.

use super::Location;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    pub enum AlertType {
        Medical => "medical",
        Accident => "accident",
        Breakdown => "breakdown",
        Harassment => "harassment",
        Other => "other",
    }
}

string_enum! {
    pub enum SosStatus {
        Active => "active",
        Resolved => "resolved",
        Cancelled => "cancelled",
    }
}

impl Default for SosStatus {
    fn default() -> Self {
        SosStatus::Active
    }
}

string_enum! {
    /// Ordered from least to most urgent.
    pub enum SosPriority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

impl Default for SosPriority {
    fn default() -> Self {
        SosPriority::Medium
    }
}

impl SosPriority {
    /// Sort rank, most urgent first.
    pub fn rank(&self) -> u8 {
        match self {
            SosPriority::Critical => 1,
            SosPriority::High => 2,
            SosPriority::Medium => 3,
            SosPriority::Low => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosAlert {
    pub id: String,
    pub user_id: String,
    pub ride_id: Option<String>,
    pub location: Location,
    pub alert_type: AlertType,
    pub message: Option<String>,
    pub status: SosStatus,
    pub priority: SosPriority,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSosAlert {
    pub user_id: String,
    #[serde(default)]
    pub ride_id: Option<String>,
    pub location: Location,
    pub alert_type: AlertType,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub priority: SosPriority,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_rank_order() {
        let mut all = SosPriority::ALL.to_vec();
        all.sort_by_key(SosPriority::rank);
        assert_eq!(
            all,
            vec![
                SosPriority::Critical,
                SosPriority::High,
                SosPriority::Medium,
                SosPriority::Low
            ]
        );
    }
}
