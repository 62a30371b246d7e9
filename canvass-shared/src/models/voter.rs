/// Voter model and database operations
///
/// Voters hang off exactly one pillar; the owning candidate and entity are
/// always derived by joining through pillars. Status updates are the hot
/// path on election day, so they check ownership in the same statement as
/// the write.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE voters (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     voter_number VARCHAR(50) NOT NULL UNIQUE,
///     name VARCHAR(200) NOT NULL,
///     governorate VARCHAR(100) NOT NULL,
///     district VARCHAR(100) NOT NULL,
///     sub_district VARCHAR(100) NOT NULL DEFAULT '',
///     card_status card_status NOT NULL DEFAULT 'not_updated',
///     voting_status voting_status NOT NULL DEFAULT 'not_voted',
///     center_name VARCHAR(200) NOT NULL,
///     center_number VARCHAR(50) NOT NULL,
///     station VARCHAR(100) NOT NULL,
///     phone VARCHAR(15),
///     pillar_id UUID NOT NULL REFERENCES pillars(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::pagination::{clamp_page, Page};
use crate::scope::Scope;

/// Whether a voter's registration card has been brought up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "card_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Updated,
    NotUpdated,
}

impl CardStatus {
    /// Canonical storage/wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Updated => "updated",
            CardStatus::NotUpdated => "not_updated",
        }
    }

    /// Arabic display label, as shown on canvassing sheets
    pub fn label(&self) -> &'static str {
        match self {
            CardStatus::Updated => "محدث",
            CardStatus::NotUpdated => "غير محدث",
        }
    }

    /// Parses a status token from client input or a spreadsheet cell
    ///
    /// Accepts the canonical string and the Arabic label. Unknown tokens
    /// return `None` so callers can reject them without mutating anything.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "updated" | "محدث" => Some(CardStatus::Updated),
            "not_updated" | "غير محدث" => Some(CardStatus::NotUpdated),
            _ => None,
        }
    }
}

/// Whether a voter has cast their ballot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "voting_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VotingStatus {
    Voted,
    NotVoted,
}

impl VotingStatus {
    /// Canonical storage/wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            VotingStatus::Voted => "voted",
            VotingStatus::NotVoted => "not_voted",
        }
    }

    /// Arabic display label
    pub fn label(&self) -> &'static str {
        match self {
            VotingStatus::Voted => "صوت",
            VotingStatus::NotVoted => "لم يصوت",
        }
    }

    /// Parses a status token, accepting canonical and Arabic forms
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "voted" | "صوت" => Some(VotingStatus::Voted),
            "not_voted" | "لم يصوت" => Some(VotingStatus::NotVoted),
            _ => None,
        }
    }
}

/// Voter row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Voter {
    pub id: Uuid,

    /// National voter registry number, unique across the whole table
    pub voter_number: String,

    pub name: String,
    pub governorate: String,
    pub district: String,
    pub sub_district: String,
    pub card_status: CardStatus,
    pub voting_status: VotingStatus,
    pub center_name: String,
    pub center_number: String,
    pub station: String,
    pub phone: Option<String>,

    /// Owning pillar
    pub pillar_id: Uuid,

    pub created_at: DateTime<Utc>,
}

/// Input for registering a voter
///
/// New voters always start as not having voted; only the card status can be
/// carried in, since it reflects paperwork done before registration.
#[derive(Debug, Clone)]
pub struct CreateVoter {
    pub voter_number: String,
    pub name: String,
    pub governorate: String,
    pub district: String,
    pub sub_district: String,
    pub card_status: CardStatus,
    pub center_name: String,
    pub center_number: String,
    pub station: String,
    pub phone: Option<String>,
    pub pillar_id: Uuid,
}

/// Optional filters for voter listings
///
/// `search` matches name, voter number and phone as substrings; the rest are
/// exact matches.
#[derive(Debug, Clone, Default)]
pub struct VoterFilter {
    pub search: Option<String>,
    pub governorate: Option<String>,
    pub district: Option<String>,
    pub sub_district: Option<String>,
    pub card_status: Option<CardStatus>,
    pub voting_status: Option<VotingStatus>,
}

impl Voter {
    /// Registers a voter under a pillar
    pub async fn create(pool: &PgPool, data: CreateVoter) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Voter>(
            r#"
            INSERT INTO voters (voter_number, name, governorate, district, sub_district,
                                card_status, center_name, center_number, station, phone,
                                pillar_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, voter_number, name, governorate, district, sub_district,
                      card_status, voting_status, center_name, center_number, station,
                      phone, pillar_id, created_at
            "#,
        )
        .bind(data.voter_number)
        .bind(data.name)
        .bind(data.governorate)
        .bind(data.district)
        .bind(data.sub_district)
        .bind(data.card_status)
        .bind(data.center_name)
        .bind(data.center_number)
        .bind(data.station)
        .bind(data.phone)
        .bind(data.pillar_id)
        .fetch_one(pool)
        .await
    }

    /// Lists voters inside a scope with optional filters, paginated
    ///
    /// Ordered by registration time so rosters read in the order they were
    /// loaded.
    pub async fn list(
        pool: &PgPool,
        scope: &Scope,
        filter: &VoterFilter,
        page: i64,
        per_page: i64,
    ) -> Result<Page<Voter>, sqlx::Error> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut n = 0;

        if let Some(cond) = scope.voter_condition() {
            n += 1;
            where_sql.push_str(&format!(" AND {}", cond));
        }
        if filter.search.is_some() {
            n += 1;
            where_sql.push_str(&format!(
                " AND (v.name ILIKE ${n} OR v.voter_number ILIKE ${n} OR v.phone ILIKE ${n})",
                n = n
            ));
        }
        if filter.governorate.is_some() {
            n += 1;
            where_sql.push_str(&format!(" AND v.governorate = ${}", n));
        }
        if filter.district.is_some() {
            n += 1;
            where_sql.push_str(&format!(" AND v.district = ${}", n));
        }
        if filter.sub_district.is_some() {
            n += 1;
            where_sql.push_str(&format!(" AND v.sub_district = ${}", n));
        }
        if filter.card_status.is_some() {
            n += 1;
            where_sql.push_str(&format!(" AND v.card_status = ${}", n));
        }
        if filter.voting_status.is_some() {
            n += 1;
            where_sql.push_str(&format!(" AND v.voting_status = ${}", n));
        }

        let pattern = filter.search.as_deref().map(|s| format!("%{}%", s));
        let joins = scope.voter_joins();

        // The bind order must mirror the placeholder order above.
        macro_rules! bind_filters {
            ($query:expr) => {{
                let mut q = $query;
                if let Some(anchor) = scope.anchor() {
                    q = q.bind(anchor);
                }
                if let Some(ref p) = pattern {
                    q = q.bind(p);
                }
                if let Some(ref g) = filter.governorate {
                    q = q.bind(g);
                }
                if let Some(ref d) = filter.district {
                    q = q.bind(d);
                }
                if let Some(ref s) = filter.sub_district {
                    q = q.bind(s);
                }
                if let Some(c) = filter.card_status {
                    q = q.bind(c);
                }
                if let Some(v) = filter.voting_status {
                    q = q.bind(v);
                }
                q
            }};
        }

        let count_sql = format!("SELECT COUNT(*) FROM voters v{}{}", joins, where_sql);
        let (total,) = bind_filters!(sqlx::query_as::<_, (i64,)>(&count_sql))
            .fetch_one(pool)
            .await?;

        let (page, offset) = clamp_page(page, per_page, total);

        let list_sql = format!(
            r#"
            SELECT v.id, v.voter_number, v.name, v.governorate, v.district, v.sub_district,
                   v.card_status, v.voting_status, v.center_name, v.center_number,
                   v.station, v.phone, v.pillar_id, v.created_at
            FROM voters v{}{}
            ORDER BY v.created_at, v.id
            LIMIT ${} OFFSET ${}
            "#,
            joins,
            where_sql,
            n + 1,
            n + 2,
        );
        let items = bind_filters!(sqlx::query_as::<_, Voter>(&list_sql))
            .bind(per_page)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(Page::new(items, page, per_page, total))
    }

    /// Flips the voting status of a voter owned by the given pillar
    ///
    /// Ownership is part of the WHERE clause, so a voter outside the pillar
    /// is reported as not found rather than updated.
    pub async fn update_voting_status(
        pool: &PgPool,
        id: Uuid,
        pillar_id: Uuid,
        status: VotingStatus,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE voters SET voting_status = $1 WHERE id = $2 AND pillar_id = $3")
                .bind(status)
                .bind(id)
                .bind(pillar_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flips the card status of a voter owned by the given pillar
    pub async fn update_card_status(
        pool: &PgPool,
        id: Uuid,
        pillar_id: Uuid,
        status: CardStatus,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE voters SET card_status = $1 WHERE id = $2 AND pillar_id = $3")
                .bind(status)
                .bind(id)
                .bind(pillar_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Distinct values of one geography column inside a scope, for filter
    /// dropdowns
    ///
    /// `column` is restricted to a fixed set, never interpolated from input.
    pub async fn distinct_values(
        pool: &PgPool,
        scope: &Scope,
        column: GeoColumn,
    ) -> Result<Vec<String>, sqlx::Error> {
        let col = column.as_str();
        let mut sql = format!(
            "SELECT DISTINCT v.{col} FROM voters v{} WHERE v.{col} <> ''",
            scope.voter_joins(),
            col = col
        );
        if let Some(cond) = scope.voter_condition() {
            sql.push_str(&format!(" AND {}", cond));
        }
        sql.push_str(&format!(" ORDER BY v.{}", col));

        let mut query = sqlx::query_as::<_, (String,)>(&sql);
        if let Some(anchor) = scope.anchor() {
            query = query.bind(anchor);
        }

        let rows = query.fetch_all(pool).await?;
        Ok(rows.into_iter().map(|(v,)| v).collect())
    }

    /// Total voter count
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM voters")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

/// Geography columns exposed as filter dropdowns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoColumn {
    Governorate,
    District,
    SubDistrict,
}

impl GeoColumn {
    fn as_str(&self) -> &'static str {
        match self {
            GeoColumn::Governorate => "governorate",
            GeoColumn::District => "district",
            GeoColumn::SubDistrict => "sub_district",
        }
    }
}
