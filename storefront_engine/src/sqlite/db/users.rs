use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{ExternalId, Role, User, UserId};

/// Inserts the user if the external id is unknown. Returns `false` in the second parameter if the user already
/// existed, in which case the stored record (and role) is returned unchanged.
pub async fn idempotent_insert(
    external_id: ExternalId,
    role: Role,
    conn: &mut SqliteConnection,
) -> Result<(User, bool), sqlx::Error> {
    let mut inserted: Vec<User> = sqlx::query_as(
        r#"
            INSERT INTO users (external_id, role) VALUES ($1, $2)
            ON CONFLICT (external_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(external_id)
    .bind(role)
    .fetch_all(&mut *conn)
    .await?;
    match inserted.pop() {
        Some(user) => {
            debug!("🗃️ User {} registered as {} with id {}", user.external_id, user.role, user.id);
            Ok((user, true))
        },
        None => {
            let user = sqlx::query_as("SELECT * FROM users WHERE external_id = $1")
                .bind(external_id)
                .fetch_one(conn)
                .await?;
            Ok((user, false))
        },
    }
}

pub async fn fetch_user(id: UserId, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_user_by_external_id(
    external_id: ExternalId,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE external_id = $1").bind(external_id).fetch_optional(conn).await
}
