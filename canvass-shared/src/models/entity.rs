/// Entity model and database operations
///
/// An entity is the top-level organizational sponsor. It is backed 1:1 by a
/// user with the `entity` role and owns zero or more candidates.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE entities (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(200) NOT NULL,
///     logo_url VARCHAR(512)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::{CreateUser, Role, User};
use crate::pagination::{clamp_page, Page};

/// Entity profile row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Entity {
    /// Unique entity ID
    pub id: Uuid,

    /// Backing user account
    pub user_id: Uuid,

    /// Display name of the entity
    pub name: String,

    /// Optional logo URL
    pub logo_url: Option<String>,
}

/// Input for creating an entity together with its backing user
#[derive(Debug, Clone)]
pub struct CreateEntity {
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub name: String,
    pub logo_url: Option<String>,
}

/// Entity row joined with its user and candidate count, for admin listings
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EntityListItem {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub candidates_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Entity {
    /// Creates the backing user and the entity profile in one transaction
    ///
    /// A failure at either step rolls back both, so no orphaned user can be
    /// left behind.
    pub async fn create_with_user(
        pool: &PgPool,
        data: CreateEntity,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user = User::create(
            &mut *tx,
            CreateUser {
                username: data.username,
                role: Role::Entity,
                password_hash: data.password_hash,
                full_name: data.full_name,
                phone: data.phone,
            },
        )
        .await?;

        let entity = sqlx::query_as::<_, Entity>(
            r#"
            INSERT INTO entities (user_id, name, logo_url)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, logo_url
            "#,
        )
        .bind(user.id)
        .bind(data.name)
        .bind(data.logo_url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(entity)
    }

    /// Finds an entity by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Entity>(
            "SELECT id, user_id, name, logo_url FROM entities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds the entity profile of a user
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Entity>(
            "SELECT id, user_id, name, logo_url FROM entities WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists entities for the admin management view
    ///
    /// Newest first, with candidate counts and an optional substring search
    /// over entity name, user full name and username.
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> Result<Page<EntityListItem>, sqlx::Error> {
        let mut where_sql = String::from(" WHERE 1=1");
        if search.is_some() {
            where_sql.push_str(
                " AND (e.name ILIKE $1 OR u.full_name ILIKE $1 OR u.username ILIKE $1)",
            );
        }

        let pattern = search.map(|s| format!("%{}%", s));

        let count_sql = format!(
            "SELECT COUNT(*) FROM entities e JOIN users u ON e.user_id = u.id{}",
            where_sql
        );
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        if let Some(ref p) = pattern {
            count_query = count_query.bind(p);
        }
        let (total,) = count_query.fetch_one(pool).await?;

        let (page, offset) = clamp_page(page, per_page, total);

        let bind_base = if pattern.is_some() { 1 } else { 0 };
        let list_sql = format!(
            r#"
            SELECT e.id, e.name, u.username, u.full_name, u.phone,
                   COUNT(c.id) AS candidates_count, u.created_at
            FROM entities e
            JOIN users u ON e.user_id = u.id
            LEFT JOIN candidates c ON c.entity_id = e.id
            {}
            GROUP BY e.id, e.name, u.username, u.full_name, u.phone, u.created_at
            ORDER BY u.created_at DESC
            LIMIT ${} OFFSET ${}
            "#,
            where_sql,
            bind_base + 1,
            bind_base + 2,
        );

        let mut list_query = sqlx::query_as::<_, EntityListItem>(&list_sql);
        if let Some(ref p) = pattern {
            list_query = list_query.bind(p);
        }
        let items = list_query.bind(per_page).bind(offset).fetch_all(pool).await?;

        Ok(Page::new(items, page, per_page, total))
    }

    /// The most recently created entities, for the admin dashboard
    pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<EntityListItem>, sqlx::Error> {
        sqlx::query_as::<_, EntityListItem>(
            r#"
            SELECT e.id, e.name, u.username, u.full_name, u.phone,
                   COUNT(c.id) AS candidates_count, u.created_at
            FROM entities e
            JOIN users u ON e.user_id = u.id
            LEFT JOIN candidates c ON c.entity_id = e.id
            GROUP BY e.id, e.name, u.username, u.full_name, u.phone, u.created_at
            ORDER BY u.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Updates the entity name and its user's contact details in one
    /// transaction
    ///
    /// Returns the refreshed entity, or `None` if the entity doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        name: &str,
        full_name: &str,
        phone: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let entity = sqlx::query_as::<_, Entity>(
            "UPDATE entities SET name = $2 WHERE id = $1 RETURNING id, user_id, name, logo_url",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(entity) = entity else {
            return Ok(None);
        };

        User::update_contact(&mut *tx, entity.user_id, full_name, phone).await?;

        tx.commit().await?;

        Ok(Some(entity))
    }

    /// Total entity count
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entities")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
