//! User repository.

use super::Database;
use crate::models::{CreateUser, UpdateUser, User, UserFilter};
use crate::services::metrics::DB_QUERY_DURATION;
use erp_core::error::AppError;
use erp_core::pagination::Page;
use tracing::{info, instrument};
use uuid::Uuid;

const USER_COLUMNS: &str = "user_id, username, email, password_hash, role, language, status, \
     last_login_utc, created_utc";

/// Outcome of a user deletion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDeleteOutcome {
    Deleted,
    /// The user has order history; the account was deactivated instead.
    Deactivated,
}

impl Database {
    /// Create a new user. The password is hashed by the caller.
    #[instrument(skip(self, input, password_hash), fields(username = %input.username))]
    pub async fn create_user(
        &self,
        input: &CreateUser,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_user"])
            .start_timer();

        let user_id = Uuid::new_v4();
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (user_id, username, email, password_hash, role, language)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&input.username)
        .bind(&input.email)
        .bind(password_hash)
        .bind(input.role.as_str())
        .bind(input.language.as_deref().unwrap_or("en"))
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Username or email already in use"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create user: {}", e)),
        })?;

        timer.observe_duration();

        info!(user_id = %user.user_id, username = %user.username, "User created");

        Ok(user)
    }

    /// Get a user by ID.
    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_user"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get user: {}", e)))?;

        timer.observe_duration();

        Ok(user)
    }

    /// Count users matching a filter.
    #[instrument(skip(self, filter))]
    pub async fn count_users(&self, filter: &UserFilter) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_users"])
            .start_timer();

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE ($1::varchar IS NULL OR username ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
              AND ($2::varchar IS NULL OR role = $2)
              AND ($3::varchar IS NULL OR status = $3)
            "#,
        )
        .bind(&filter.search)
        .bind(filter.role.map(|r| r.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count users: {}", e)))?;

        timer.observe_duration();

        Ok(count)
    }

    /// List users matching a filter, windowed by `page`.
    #[instrument(skip(self, filter, page))]
    pub async fn list_users(
        &self,
        filter: &UserFilter,
        page: &Page,
    ) -> Result<Vec<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_users"])
            .start_timer();

        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::varchar IS NULL OR username ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
              AND ($2::varchar IS NULL OR role = $2)
              AND ($3::varchar IS NULL OR status = $3)
            ORDER BY username
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(&filter.search)
        .bind(filter.role.map(|r| r.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(page.page_size)
        .bind(page.offset)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list users: {}", e)))?;

        timer.observe_duration();

        Ok(users)
    }

    /// Update a user. `password_hash` is pre-hashed by the caller when a
    /// password change was requested.
    #[instrument(skip(self, input, password_hash))]
    pub async fn update_user(
        &self,
        user_id: Uuid,
        input: &UpdateUser,
        password_hash: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_user"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role),
                language = COALESCE($5, language),
                status = COALESCE($6, status)
            WHERE user_id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&input.email)
        .bind(password_hash)
        .bind(input.role.map(|r| r.as_str()))
        .bind(&input.language)
        .bind(input.status.map(|s| s.as_str()))
        .fetch_optional(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Email already in use"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update user: {}", e)),
        })?;

        timer.observe_duration();

        Ok(user)
    }

    /// Delete a user, or deactivate them when they have order history.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: Uuid) -> Result<UserDeleteOutcome, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_user"])
            .start_timer();

        let order_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT (SELECT COUNT(*) FROM sales_orders WHERE user_id = $1)
                 + (SELECT COUNT(*) FROM purchase_orders WHERE user_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count orders: {}", e)))?;

        let outcome = if order_count > 0 {
            let result = sqlx::query("UPDATE users SET status = 'inactive' WHERE user_id = $1")
                .bind(user_id)
                .execute(self.pool())
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to deactivate user: {}", e))
                })?;
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
            }
            UserDeleteOutcome::Deactivated
        } else {
            let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
                .bind(user_id)
                .execute(self.pool())
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to delete user: {}", e))
                })?;
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
            }
            UserDeleteOutcome::Deleted
        };

        timer.observe_duration();

        info!(user_id = %user_id, outcome = ?outcome, "User removed");

        Ok(outcome)
    }
}
