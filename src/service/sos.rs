use super::rides::{location_from_row, location_record};
use super::{DatabaseService, FromRow, Record, by_id, insert_record, new_id, now_millis, parse_enum};
use crate::error::DbResult;
use crate::models::{NewSosAlert, Row, SosAlert, SosPriority, SosStatus};
use crate::query::{SelectBuilder, SortOrder, UpdateBuilder};
use crate::schema::tables::{SOS_ALERTS, SOS_LOCATION};
use tracing::{info, warn};

impl FromRow for SosAlert {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.get_str("id")?,
            user_id: row.get_str("user_id")?,
            ride_id: row.get_opt_str("ride_id")?,
            location: location_from_row(row, SOS_LOCATION)?,
            alert_type: parse_enum(row, "alert_type")?,
            message: row.get_opt_str("message")?,
            status: parse_enum(row, "status")?,
            priority: parse_enum(row, "priority")?,
            resolved_by: row.get_opt_str("resolved_by")?,
            resolved_at: row.get_opt_datetime("resolved_at")?,
            admin_notes: row.get_opt_str("admin_notes")?,
            created_at: row.get_datetime("created_at")?,
            updated_at: row.get_datetime("updated_at")?,
        })
    }
}

/// `CASE priority WHEN 'critical' THEN 1 ... END`, most urgent lowest.
fn priority_rank_sql() -> String {
    let arms: String = SosPriority::ALL
        .iter()
        .map(|p| format!(" WHEN '{}' THEN {}", p.as_str(), p.rank()))
        .collect();
    format!("CASE priority{} END", arms)
}

impl DatabaseService {
    pub async fn create_sos_alert(&self, input: NewSosAlert) -> DbResult<SosAlert> {
        let now = now_millis();
        let alert = SosAlert {
            id: new_id(),
            user_id: input.user_id,
            ride_id: input.ride_id,
            location: input.location,
            alert_type: input.alert_type,
            message: input.message,
            status: SosStatus::Active,
            priority: input.priority,
            resolved_by: None,
            resolved_at: None,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        };

        let mut record: Record = vec![
            ("id", alert.id.as_str().into()),
            ("user_id", alert.user_id.as_str().into()),
            ("ride_id", alert.ride_id.clone().into()),
        ];
        record.extend(location_record(SOS_LOCATION, &alert.location));
        record.extend([
            ("alert_type", alert.alert_type.into()),
            ("message", alert.message.clone().into()),
            ("status", alert.status.into()),
            ("priority", alert.priority.into()),
            ("created_at", now.into()),
            ("updated_at", now.into()),
        ]);
        insert_record(SOS_ALERTS, record).execute(self.pool()).await?;

        warn!(
            alert_id = %alert.id,
            user_id = %alert.user_id,
            alert_type = %alert.alert_type,
            priority = %alert.priority,
            "SOS alert raised"
        );
        Ok(alert)
    }

    pub async fn get_sos_alert_by_id(&self, id: &str) -> DbResult<Option<SosAlert>> {
        self.fetch_optional(&by_id(SOS_ALERTS, id)).await
    }

    /// Open alerts, most urgent first and newest first within a priority.
    pub async fn get_active_sos_alerts(&self) -> DbResult<Vec<SosAlert>> {
        let query = SelectBuilder::new()
            .from(SOS_ALERTS)
            .where_("status = ?", [SosStatus::Active])
            .order_by(priority_rank_sql(), SortOrder::Asc)
            .order_by("created_at", SortOrder::Desc);
        self.fetch_all(&query).await
    }

    /// Close an alert, recording who resolved it and when.
    pub async fn resolve_sos_alert(
        &self,
        id: &str,
        resolved_by: &str,
        notes: Option<&str>,
    ) -> DbResult<Option<SosAlert>> {
        let now = now_millis();
        let mut update = UpdateBuilder::new()
            .table(SOS_ALERTS)
            .set("status", SosStatus::Resolved)
            .set("resolved_by", resolved_by)
            .set("resolved_at", now);
        if let Some(notes) = notes {
            update = update.set("admin_notes", notes);
        }
        update
            .set("updated_at", now)
            .where_("id = ?", [id])
            .execute(self.pool())
            .await?;

        let alert = self.get_sos_alert_by_id(id).await?;
        if alert.is_some() {
            info!(alert_id = %id, resolved_by = %resolved_by, "SOS alert resolved");
        }
        Ok(alert)
    }

    pub async fn update_sos_alert_status(
        &self,
        id: &str,
        status: SosStatus,
    ) -> DbResult<Option<SosAlert>> {
        UpdateBuilder::new()
            .table(SOS_ALERTS)
            .set("status", status)
            .set("updated_at", now_millis())
            .where_("id = ?", [id])
            .execute(self.pool())
            .await?;
        self.get_sos_alert_by_id(id).await
    }

    pub async fn delete_sos_alert(&self, id: &str) -> DbResult<bool> {
        self.delete_by_id(SOS_ALERTS, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_rank_sql() {
        assert_eq!(
            priority_rank_sql(),
            "CASE priority WHEN 'low' THEN 4 WHEN 'medium' THEN 3 \
             WHEN 'high' THEN 2 WHEN 'critical' THEN 1 END"
        );
    }
}
