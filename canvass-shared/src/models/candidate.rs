/// Candidate model and database operations
///
/// A candidate belongs to exactly one entity and is backed 1:1 by a user
/// with the `candidate` role. Candidates own pillars; their voters are the
/// voters of those pillars, derived by joining rather than stored twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::{CreateUser, Role, User};
use crate::pagination::{clamp_page, Page};

/// Candidate profile row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Candidate {
    /// Unique candidate ID
    pub id: Uuid,

    /// Backing user account
    pub user_id: Uuid,

    /// Owning entity
    pub entity_id: Uuid,

    /// Optional profile image URL
    pub profile_image_url: Option<String>,
}

/// Input for creating a candidate together with its backing user
#[derive(Debug, Clone)]
pub struct CreateCandidate {
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub entity_id: Uuid,
    pub profile_image_url: Option<String>,
}

/// Candidate row joined with its user, entity name and pillar count
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CandidateListItem {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub entity_id: Uuid,
    pub entity_name: String,
    pub pillars_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Candidate {
    /// Creates the backing user and the candidate profile in one transaction
    pub async fn create_with_user(
        pool: &PgPool,
        data: CreateCandidate,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user = User::create(
            &mut *tx,
            CreateUser {
                username: data.username,
                role: Role::Candidate,
                password_hash: data.password_hash,
                full_name: data.full_name,
                phone: data.phone,
            },
        )
        .await?;

        let candidate = sqlx::query_as::<_, Candidate>(
            r#"
            INSERT INTO candidates (user_id, entity_id, profile_image_url)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, entity_id, profile_image_url
            "#,
        )
        .bind(user.id)
        .bind(data.entity_id)
        .bind(data.profile_image_url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(candidate)
    }

    /// Finds a candidate by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Candidate>(
            "SELECT id, user_id, entity_id, profile_image_url FROM candidates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds the candidate profile of a user
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Candidate>(
            "SELECT id, user_id, entity_id, profile_image_url FROM candidates WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a candidate only if it belongs to the given entity
    ///
    /// An entity-scoped caller naming a candidate outside its subtree gets
    /// `None`, the same answer as for a candidate that doesn't exist.
    pub async fn find_in_entity(
        pool: &PgPool,
        id: Uuid,
        entity_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Candidate>(
            r#"
            SELECT id, user_id, entity_id, profile_image_url
            FROM candidates
            WHERE id = $1 AND entity_id = $2
            "#,
        )
        .bind(id)
        .bind(entity_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists candidates for management views
    ///
    /// `entity_id` restricts the listing to one entity's subtree; `None`
    /// lists every candidate (admin). Search matches candidate full name,
    /// username and entity name.
    pub async fn list(
        pool: &PgPool,
        entity_id: Option<Uuid>,
        search: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> Result<Page<CandidateListItem>, sqlx::Error> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut n = 0;
        if entity_id.is_some() {
            n += 1;
            where_sql.push_str(&format!(" AND c.entity_id = ${}", n));
        }
        if search.is_some() {
            n += 1;
            where_sql.push_str(&format!(
                " AND (u.full_name ILIKE ${n} OR u.username ILIKE ${n} OR e.name ILIKE ${n})",
                n = n
            ));
        }

        let pattern = search.map(|s| format!("%{}%", s));

        let count_sql = format!(
            r#"
            SELECT COUNT(*)
            FROM candidates c
            JOIN users u ON c.user_id = u.id
            JOIN entities e ON c.entity_id = e.id
            {}
            "#,
            where_sql
        );
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        if let Some(id) = entity_id {
            count_query = count_query.bind(id);
        }
        if let Some(ref p) = pattern {
            count_query = count_query.bind(p);
        }
        let (total,) = count_query.fetch_one(pool).await?;

        let (page, offset) = clamp_page(page, per_page, total);

        let list_sql = format!(
            r#"
            SELECT c.id, u.username, u.full_name, u.phone, c.entity_id, e.name AS entity_name,
                   COUNT(p.id) AS pillars_count, u.created_at
            FROM candidates c
            JOIN users u ON c.user_id = u.id
            JOIN entities e ON c.entity_id = e.id
            LEFT JOIN pillars p ON p.candidate_id = c.id
            {}
            GROUP BY c.id, u.username, u.full_name, u.phone, c.entity_id, e.name, u.created_at
            ORDER BY u.created_at DESC
            LIMIT ${} OFFSET ${}
            "#,
            where_sql,
            n + 1,
            n + 2,
        );

        let mut list_query = sqlx::query_as::<_, CandidateListItem>(&list_sql);
        if let Some(id) = entity_id {
            list_query = list_query.bind(id);
        }
        if let Some(ref p) = pattern {
            list_query = list_query.bind(p);
        }
        let items = list_query.bind(per_page).bind(offset).fetch_all(pool).await?;

        Ok(Page::new(items, page, per_page, total))
    }

    /// The most recently created candidates, for the admin dashboard
    pub async fn recent(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<CandidateListItem>, sqlx::Error> {
        sqlx::query_as::<_, CandidateListItem>(
            r#"
            SELECT c.id, u.username, u.full_name, u.phone, c.entity_id, e.name AS entity_name,
                   COUNT(p.id) AS pillars_count, u.created_at
            FROM candidates c
            JOIN users u ON c.user_id = u.id
            JOIN entities e ON c.entity_id = e.id
            LEFT JOIN pillars p ON p.candidate_id = c.id
            GROUP BY c.id, u.username, u.full_name, u.phone, c.entity_id, e.name, u.created_at
            ORDER BY u.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Moves a candidate to a different entity and updates its user's
    /// contact details, in one transaction
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        entity_id: Uuid,
        full_name: &str,
        phone: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let candidate = sqlx::query_as::<_, Candidate>(
            r#"
            UPDATE candidates SET entity_id = $2 WHERE id = $1
            RETURNING id, user_id, entity_id, profile_image_url
            "#,
        )
        .bind(id)
        .bind(entity_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(candidate) = candidate else {
            return Ok(None);
        };

        User::update_contact(&mut *tx, candidate.user_id, full_name, phone).await?;

        tx.commit().await?;

        Ok(Some(candidate))
    }

    /// Total candidate count
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM candidates")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
