/// Pillar model and database operations
///
/// A pillar is the canvassing sub-unit that actually holds a voter roster.
/// It belongs to exactly one candidate and is backed 1:1 by a user with the
/// `pillar` role.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::{CreateUser, Role, User};
use crate::scope::Scope;

/// Pillar profile row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Pillar {
    /// Unique pillar ID
    pub id: Uuid,

    /// Backing user account
    pub user_id: Uuid,

    /// Owning candidate
    pub candidate_id: Uuid,
}

/// Input for creating a pillar together with its backing user
#[derive(Debug, Clone)]
pub struct CreatePillar {
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub candidate_id: Uuid,
}

/// Pillar joined with its user's display name and voter count
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PillarListItem {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub full_name: String,
    pub voters_count: i64,
}

impl Pillar {
    /// Creates the backing user and the pillar profile in one transaction
    pub async fn create_with_user(
        pool: &PgPool,
        data: CreatePillar,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user = User::create(
            &mut *tx,
            CreateUser {
                username: data.username,
                role: Role::Pillar,
                password_hash: data.password_hash,
                full_name: data.full_name,
                phone: data.phone,
            },
        )
        .await?;

        let pillar = sqlx::query_as::<_, Pillar>(
            r#"
            INSERT INTO pillars (user_id, candidate_id)
            VALUES ($1, $2)
            RETURNING id, user_id, candidate_id
            "#,
        )
        .bind(user.id)
        .bind(data.candidate_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(pillar)
    }

    /// Finds the pillar profile of a user
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Pillar>(
            "SELECT id, user_id, candidate_id FROM pillars WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a pillar only if it falls inside the given scope
    ///
    /// A pillar outside the caller's subtree resolves to `None`, exactly as
    /// if it didn't exist.
    pub async fn find_in_scope(
        pool: &PgPool,
        id: Uuid,
        scope: &Scope,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = match scope {
            Scope::Global => sqlx::query_as::<_, Pillar>(
                "SELECT id, user_id, candidate_id FROM pillars WHERE id = $1",
            ),
            Scope::Entity(_) => sqlx::query_as::<_, Pillar>(
                r#"
                SELECT p.id, p.user_id, p.candidate_id
                FROM pillars p
                JOIN candidates c ON p.candidate_id = c.id
                WHERE p.id = $1 AND c.entity_id = $2
                "#,
            ),
            Scope::Candidate(_) => sqlx::query_as::<_, Pillar>(
                "SELECT id, user_id, candidate_id FROM pillars WHERE id = $1 AND candidate_id = $2",
            ),
            Scope::Pillar(_) => sqlx::query_as::<_, Pillar>(
                "SELECT id, user_id, candidate_id FROM pillars WHERE id = $1 AND id = $2",
            ),
        };

        query = query.bind(id);
        if let Some(anchor) = scope.anchor() {
            query = query.bind(anchor);
        }

        query.fetch_optional(pool).await
    }

    /// Lists the pillars of one candidate with voter counts, in insertion
    /// order
    pub async fn list_by_candidate(
        pool: &PgPool,
        candidate_id: Uuid,
    ) -> Result<Vec<PillarListItem>, sqlx::Error> {
        sqlx::query_as::<_, PillarListItem>(
            r#"
            SELECT p.id, p.candidate_id, u.full_name, COUNT(v.id) AS voters_count
            FROM pillars p
            JOIN users u ON p.user_id = u.id
            LEFT JOIN voters v ON v.pillar_id = p.id
            WHERE p.candidate_id = $1
            GROUP BY p.id, p.candidate_id, u.full_name, u.created_at
            ORDER BY u.created_at
            "#,
        )
        .bind(candidate_id)
        .fetch_all(pool)
        .await
    }

    /// Lists pillars visible to a scope with voter counts, for the
    /// statistics detail view
    pub async fn list_in_scope(
        pool: &PgPool,
        scope: &Scope,
    ) -> Result<Vec<PillarListItem>, sqlx::Error> {
        let mut sql = String::from(
            r#"
            SELECT p.id, p.candidate_id, u.full_name, COUNT(v.id) AS voters_count
            FROM pillars p
            JOIN users u ON p.user_id = u.id
            JOIN candidates c ON p.candidate_id = c.id
            LEFT JOIN voters v ON v.pillar_id = p.id
            WHERE 1=1
            "#,
        );
        match scope {
            Scope::Global => {}
            Scope::Entity(_) => sql.push_str(" AND c.entity_id = $1"),
            Scope::Candidate(_) => sql.push_str(" AND p.candidate_id = $1"),
            Scope::Pillar(_) => sql.push_str(" AND p.id = $1"),
        }
        sql.push_str(
            " GROUP BY p.id, p.candidate_id, u.full_name, u.created_at ORDER BY u.created_at",
        );

        let mut query = sqlx::query_as::<_, PillarListItem>(&sql);
        if let Some(anchor) = scope.anchor() {
            query = query.bind(anchor);
        }

        query.fetch_all(pool).await
    }

    /// Total pillar count
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pillars")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
