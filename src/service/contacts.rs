use super::{
    DatabaseService, FromRow, Record, by_id, fetch_optional_in, insert_record, new_id, now_millis,
};
use crate::db::DbTransaction;
use crate::error::{DbError, DbResult};
use crate::models::{EmergencyContact, EmergencyContactUpdate, NewEmergencyContact, Row};
use crate::query::{SelectBuilder, SortOrder, UpdateBuilder};
use crate::schema::tables::EMERGENCY_CONTACTS;
use chrono::{DateTime, Utc};
use tracing::debug;

impl FromRow for EmergencyContact {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.get_str("id")?,
            user_id: row.get_str("user_id")?,
            name: row.get_str("name")?,
            phone: row.get_str("phone")?,
            relationship: row.get_str("relationship")?,
            is_primary: row.get_bool("is_primary")?,
            created_at: row.get_datetime("created_at")?,
            updated_at: row.get_datetime("updated_at")?,
        })
    }
}

/// Clear the primary flag on every other contact of `user_id`.
async fn demote_primary(
    tx: &mut DbTransaction,
    user_id: &str,
    keep_id: &str,
    now: DateTime<Utc>,
) -> DbResult<()> {
    UpdateBuilder::new()
        .table(EMERGENCY_CONTACTS)
        .set("is_primary", false)
        .set("updated_at", now)
        .where_("user_id = ?", [user_id])
        .where_("id <> ?", [keep_id])
        .where_("is_primary = ?", [true])
        .execute_in(tx)
        .await?;
    Ok(())
}

impl DatabaseService {
    /// Add a contact. A new primary contact demotes the user's previous one.
    pub async fn create_emergency_contact(
        &self,
        input: NewEmergencyContact,
    ) -> DbResult<EmergencyContact> {
        let now = now_millis();
        let contact = EmergencyContact {
            id: new_id(),
            user_id: input.user_id,
            name: input.name,
            phone: input.phone,
            relationship: input.relationship,
            is_primary: input.is_primary,
            created_at: now,
            updated_at: now,
        };

        let record: Record = vec![
            ("id", contact.id.as_str().into()),
            ("user_id", contact.user_id.as_str().into()),
            ("name", contact.name.as_str().into()),
            ("phone", contact.phone.as_str().into()),
            ("relationship", contact.relationship.as_str().into()),
            ("is_primary", contact.is_primary.into()),
            ("created_at", now.into()),
            ("updated_at", now.into()),
        ];
        let insert = insert_record(EMERGENCY_CONTACTS, record);
        let (id, user_id, is_primary) = (contact.id.clone(), contact.user_id.clone(), contact.is_primary);

        self.pool()
            .transaction(move |tx| {
                Box::pin(async move {
                    if is_primary {
                        demote_primary(tx, &user_id, &id, now).await?;
                    }
                    insert.execute_in(tx).await?;
                    Ok::<_, DbError>(())
                })
            })
            .await?;

        debug!(contact_id = %contact.id, user_id = %contact.user_id, "Created emergency contact");
        Ok(contact)
    }

    pub async fn get_emergency_contact_by_id(&self, id: &str) -> DbResult<Option<EmergencyContact>> {
        self.fetch_optional(&by_id(EMERGENCY_CONTACTS, id)).await
    }

    /// A user's contacts, primary first.
    pub async fn get_emergency_contacts_by_user(
        &self,
        user_id: &str,
    ) -> DbResult<Vec<EmergencyContact>> {
        let query = SelectBuilder::new()
            .from(EMERGENCY_CONTACTS)
            .where_("user_id = ?", [user_id])
            .order_by("is_primary", SortOrder::Desc)
            .order_by("created_at", SortOrder::Asc);
        self.fetch_all(&query).await
    }

    pub async fn update_emergency_contact(
        &self,
        id: &str,
        changes: EmergencyContactUpdate,
    ) -> DbResult<Option<EmergencyContact>> {
        let now = now_millis();
        let mut update = UpdateBuilder::new().table(EMERGENCY_CONTACTS);
        if let Some(name) = changes.name {
            update = update.set("name", name);
        }
        if let Some(phone) = changes.phone {
            update = update.set("phone", phone);
        }
        if let Some(relationship) = changes.relationship {
            update = update.set("relationship", relationship);
        }
        if let Some(is_primary) = changes.is_primary {
            update = update.set("is_primary", is_primary);
        }
        let update = update.set("updated_at", now).where_("id = ?", [id]);
        let promote = changes.is_primary == Some(true);
        let lookup = by_id(EMERGENCY_CONTACTS, id);
        let id = id.to_string();

        self.pool()
            .transaction(move |tx| {
                Box::pin(async move {
                    let Some(existing) = fetch_optional_in::<EmergencyContact>(tx, &lookup).await?
                    else {
                        return Ok(None);
                    };
                    if promote {
                        demote_primary(tx, &existing.user_id, &id, now).await?;
                    }
                    update.execute_in(tx).await?;
                    fetch_optional_in::<EmergencyContact>(tx, &lookup).await
                })
            })
            .await
    }

    pub async fn delete_emergency_contact(&self, id: &str) -> DbResult<bool> {
        self.delete_by_id(EMERGENCY_CONTACTS, id).await
    }
}
