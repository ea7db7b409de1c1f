use super::{DatabaseService, FromRow, Record, by_id, insert_record, new_id, now_millis, parse_enum};
use crate::error::DbResult;
use crate::models::{NewUser, Row, User, UserRole, UserUpdate};
use crate::query::{SelectBuilder, SortOrder, UpdateBuilder};
use crate::schema::tables::USERS;
use tracing::debug;

impl FromRow for User {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.get_str("id")?,
            email: row.get_str("email")?,
            first_name: row.get_str("first_name")?,
            last_name: row.get_str("last_name")?,
            phone: row.get_str("phone")?,
            is_verified: row.get_bool("is_verified")?,
            is_active: row.get_bool("is_active")?,
            role: parse_enum(row, "role")?,
            profile_image: row.get_opt_str("profile_image")?,
            created_at: row.get_datetime("created_at")?,
            updated_at: row.get_datetime("updated_at")?,
        })
    }
}

impl DatabaseService {
    pub async fn create_user(&self, input: NewUser) -> DbResult<User> {
        let now = now_millis();
        let user = User {
            id: new_id(),
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            is_verified: input.is_verified,
            is_active: input.is_active,
            role: input.role,
            profile_image: input.profile_image,
            created_at: now,
            updated_at: now,
        };

        let record: Record = vec![
            ("id", user.id.as_str().into()),
            ("email", user.email.as_str().into()),
            ("first_name", user.first_name.as_str().into()),
            ("last_name", user.last_name.as_str().into()),
            ("phone", user.phone.as_str().into()),
            ("is_verified", user.is_verified.into()),
            ("is_active", user.is_active.into()),
            ("role", user.role.into()),
            ("profile_image", user.profile_image.clone().into()),
            ("created_at", now.into()),
            ("updated_at", now.into()),
        ];
        insert_record(USERS, record).execute(self.pool()).await?;

        debug!(user_id = %user.id, role = %user.role, "Created user");
        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: &str) -> DbResult<Option<User>> {
        self.fetch_optional(&by_id(USERS, id)).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let query = SelectBuilder::new().from(USERS).where_("email = ?", [email]);
        self.fetch_optional(&query).await
    }

    pub async fn get_user_by_phone(&self, phone: &str) -> DbResult<Option<User>> {
        let query = SelectBuilder::new().from(USERS).where_("phone = ?", [phone]);
        self.fetch_optional(&query).await
    }

    /// Users newest first, optionally restricted to one role.
    pub async fn list_users(
        &self,
        role: Option<UserRole>,
        limit: u64,
        offset: u64,
    ) -> DbResult<Vec<User>> {
        let mut query = SelectBuilder::new().from(USERS);
        if let Some(role) = role {
            query = query.where_("role = ?", [role]);
        }
        let query = query
            .order_by("created_at", SortOrder::Desc)
            .order_by("id", SortOrder::Asc)
            .limit(limit)
            .offset(offset);
        self.fetch_all(&query).await
    }

    pub async fn update_user(&self, id: &str, changes: UserUpdate) -> DbResult<Option<User>> {
        let mut update = UpdateBuilder::new().table(USERS);
        if let Some(email) = changes.email {
            update = update.set("email", email);
        }
        if let Some(first_name) = changes.first_name {
            update = update.set("first_name", first_name);
        }
        if let Some(last_name) = changes.last_name {
            update = update.set("last_name", last_name);
        }
        if let Some(phone) = changes.phone {
            update = update.set("phone", phone);
        }
        if let Some(role) = changes.role {
            update = update.set("role", role);
        }
        if let Some(is_verified) = changes.is_verified {
            update = update.set("is_verified", is_verified);
        }
        if let Some(is_active) = changes.is_active {
            update = update.set("is_active", is_active);
        }
        if let Some(profile_image) = changes.profile_image {
            update = update.set("profile_image", profile_image);
        }

        update
            .set("updated_at", now_millis())
            .where_("id = ?", [id])
            .execute(self.pool())
            .await?;
        self.get_user_by_id(id).await
    }

    pub async fn delete_user(&self, id: &str) -> DbResult<bool> {
        self.delete_by_id(USERS, id).await
    }
}
