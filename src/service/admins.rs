use super::{
    DatabaseService, FromRow, Record, by_id, insert_record, new_id, now_millis, parse_enum,
    string_list,
};
use crate::error::DbResult;
use crate::models::{Admin, AdminUpdate, NewAdmin, QueryParam, Row};
use crate::query::{SelectBuilder, UpdateBuilder};
use crate::schema::tables::ADMINS;
use serde_json::json;
use tracing::{debug, info};

impl FromRow for Admin {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.get_str("id")?,
            email: row.get_str("email")?,
            first_name: row.get_str("first_name")?,
            last_name: row.get_str("last_name")?,
            role: parse_enum(row, "role")?,
            permissions: string_list(row, "permissions")?,
            is_active: row.get_bool("is_active")?,
            last_login: row.get_opt_datetime("last_login")?,
            created_at: row.get_datetime("created_at")?,
            updated_at: row.get_datetime("updated_at")?,
        })
    }
}

fn permissions_param(permissions: &[String]) -> QueryParam {
    QueryParam::Json(json!(permissions))
}

impl DatabaseService {
    pub async fn create_admin(&self, input: NewAdmin) -> DbResult<Admin> {
        let now = now_millis();
        let admin = Admin {
            id: new_id(),
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            role: input.role,
            permissions: input.permissions,
            is_active: input.is_active,
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        let record: Record = vec![
            ("id", admin.id.as_str().into()),
            ("email", admin.email.as_str().into()),
            ("first_name", admin.first_name.as_str().into()),
            ("last_name", admin.last_name.as_str().into()),
            ("role", admin.role.into()),
            ("permissions", permissions_param(&admin.permissions)),
            ("is_active", admin.is_active.into()),
            ("created_at", now.into()),
            ("updated_at", now.into()),
        ];
        insert_record(ADMINS, record).execute(self.pool()).await?;

        debug!(admin_id = %admin.id, role = %admin.role, "Created admin");
        Ok(admin)
    }

    pub async fn get_admin_by_id(&self, id: &str) -> DbResult<Option<Admin>> {
        self.fetch_optional(&by_id(ADMINS, id)).await
    }

    pub async fn get_admin_by_email(&self, email: &str) -> DbResult<Option<Admin>> {
        let query = SelectBuilder::new().from(ADMINS).where_("email = ?", [email]);
        self.fetch_optional(&query).await
    }

    pub async fn update_admin(&self, id: &str, changes: AdminUpdate) -> DbResult<Option<Admin>> {
        let mut update = UpdateBuilder::new().table(ADMINS);
        if let Some(email) = changes.email {
            update = update.set("email", email);
        }
        if let Some(first_name) = changes.first_name {
            update = update.set("first_name", first_name);
        }
        if let Some(last_name) = changes.last_name {
            update = update.set("last_name", last_name);
        }
        if let Some(role) = changes.role {
            update = update.set("role", role);
        }
        if let Some(permissions) = &changes.permissions {
            update = update.set("permissions", permissions_param(permissions));
        }
        if let Some(is_active) = changes.is_active {
            update = update.set("is_active", is_active);
        }

        update
            .set("updated_at", now_millis())
            .where_("id = ?", [id])
            .execute(self.pool())
            .await?;
        self.get_admin_by_id(id).await
    }

    /// Stamp `last_login`. Returns whether the admin exists.
    pub async fn record_admin_login(&self, id: &str) -> DbResult<bool> {
        let now = now_millis();
        let result = UpdateBuilder::new()
            .table(ADMINS)
            .set("last_login", now)
            .set("updated_at", now)
            .where_("id = ?", [id])
            .execute(self.pool())
            .await?;
        if result.row_count > 0 {
            info!(admin_id = %id, "Admin logged in");
        }
        Ok(result.row_count > 0)
    }

    pub async fn delete_admin(&self, id: &str) -> DbResult<bool> {
        self.delete_by_id(ADMINS, id).await
    }
}
