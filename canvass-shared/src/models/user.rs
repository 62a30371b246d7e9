/// User model and database operations
///
/// Every account carries exactly one role which decides what the rest of the
/// API lets it see and do. The role is assigned at creation and no update
/// path exposes it afterwards.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(150) NOT NULL UNIQUE,
///     role user_role NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     full_name VARCHAR(200) NOT NULL,
///     phone VARCHAR(15),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Account roles
///
/// One role per user; the role decides which subtree of the organizational
/// hierarchy the account can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Unrestricted access to every record
    Admin,

    /// Sees candidates, pillars and voters under its own entity
    Entity,

    /// Sees pillars and voters under its own candidacy
    Candidate,

    /// Sees and updates the voters of its own pillar only
    Pillar,
}

impl Role {
    /// Role as its wire/storage string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Entity => "entity",
            Role::Candidate => "candidate",
            Role::Pillar => "pillar",
        }
    }

    /// Can create, edit and delete entities and candidates
    pub fn can_manage_entities(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Can add candidates under its own entity
    pub fn can_add_candidates(&self) -> bool {
        matches!(self, Role::Admin | Role::Entity)
    }

    /// Can add pillars under its own candidacy
    pub fn can_add_pillars(&self) -> bool {
        matches!(self, Role::Admin | Role::Candidate)
    }

    /// Can run a spreadsheet import of voters
    pub fn can_import_voters(&self) -> bool {
        matches!(self, Role::Entity | Role::Candidate)
    }

    /// Can run a spreadsheet import of candidate accounts
    pub fn can_import_candidates(&self) -> bool {
        matches!(self, Role::Entity)
    }

    /// Can flip voting/card status of voters in its own pillar
    pub fn can_update_voter_status(&self) -> bool {
        matches!(self, Role::Pillar)
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Login name, unique across all users
    pub username: String,

    /// Account role, immutable after creation
    pub role: Role,

    /// Argon2id password hash, never plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Display name
    pub full_name: String,

    /// Optional contact phone
    pub phone: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub role: Role,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
}

impl User {
    /// Creates a new user
    ///
    /// Accepts any executor so profile creation flows can run it inside the
    /// same transaction as the dependent profile row.
    ///
    /// # Errors
    ///
    /// Returns an error on a duplicate username (unique constraint) or a
    /// failed connection.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, role, password_hash, full_name, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, role, password_hash, full_name, phone, created_at
            "#,
        )
        .bind(data.username)
        .bind(data.role)
        .bind(data.password_hash)
        .bind(data.full_name)
        .bind(data.phone)
        .fetch_one(executor)
        .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, role, password_hash, full_name, phone, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by username
    ///
    /// The login path resolves credentials through this lookup.
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, role, password_hash, full_name, phone, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Updates the display name and phone of a user
    ///
    /// The role and username are deliberately not updatable here.
    pub async fn update_contact<'e, E>(
        executor: E,
        id: Uuid,
        full_name: &str,
        phone: Option<&str>,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let result = sqlx::query("UPDATE users SET full_name = $2, phone = $3 WHERE id = $1")
            .bind(id)
            .bind(full_name)
            .bind(phone)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user by ID
    ///
    /// Cascades through the profile row and, for candidates and pillars,
    /// every descendant pillar and voter.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
