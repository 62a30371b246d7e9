/// Voter statistics aggregation
///
/// All counts for one scope come back from a single `COUNT(*) FILTER` query
/// so the numbers are a consistent snapshot; separate queries could disagree
/// while election-day updates are flowing in.
///
/// Percentages are computed in Rust, not SQL: dashboards round to one
/// decimal, the admin overview to two, and an empty scope always reports
/// exactly `0.0` rather than NaN.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::scope::Scope;

/// Raw counters over the voters of one scope
#[derive(Debug, Clone, Copy, Default, Serialize, sqlx::FromRow)]
pub struct VoterTotals {
    /// Total voters in scope
    pub total: i64,

    /// Distinct polling centers
    pub centers: i64,

    /// Distinct polling stations
    pub stations: i64,

    /// Voters with an updated registration card
    pub updated: i64,

    /// Voters whose card is not updated
    pub not_updated: i64,

    /// Voters who have cast their ballot
    pub voted: i64,

    /// Voters who have not voted yet
    pub not_voted: i64,
}

/// Counters plus derived percentages, ready for a dashboard payload
#[derive(Debug, Clone, Serialize)]
pub struct ScopeStats {
    #[serde(flatten)]
    pub totals: VoterTotals,

    /// Share of voters who voted, rounded to one decimal
    pub voting_percentage: f64,

    /// Share of voters with an updated card, rounded to one decimal
    pub update_percentage: f64,
}

impl From<VoterTotals> for ScopeStats {
    fn from(totals: VoterTotals) -> Self {
        Self {
            voting_percentage: percentage(totals.voted, totals.total),
            update_percentage: percentage(totals.updated, totals.total),
            totals,
        }
    }
}

/// Per-candidate counters for the entity dashboard breakdown
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CandidateTotals {
    pub candidate_id: Uuid,
    pub full_name: String,
    pub pillars: i64,
    pub total: i64,
    pub voted: i64,
    pub updated: i64,
}

/// Share of `part` in `total` as a percentage, rounded to one decimal
///
/// An empty total reports exactly zero.
pub fn percentage(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Same as [`percentage`] but rounded to two decimals, for the admin
/// overview
pub fn percentage2(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 10000.0).round() / 100.0
}

/// Counts the voters of a scope, bucketed by status, in one query
pub async fn voter_totals(pool: &PgPool, scope: &Scope) -> Result<VoterTotals, sqlx::Error> {
    let mut sql = format!(
        r#"
        SELECT COUNT(*) AS total,
               COUNT(DISTINCT v.center_number) AS centers,
               COUNT(DISTINCT v.station) AS stations,
               COUNT(*) FILTER (WHERE v.card_status = 'updated') AS updated,
               COUNT(*) FILTER (WHERE v.card_status = 'not_updated') AS not_updated,
               COUNT(*) FILTER (WHERE v.voting_status = 'voted') AS voted,
               COUNT(*) FILTER (WHERE v.voting_status = 'not_voted') AS not_voted
        FROM voters v{}
        "#,
        scope.voter_joins()
    );
    if let Some(cond) = scope.voter_condition() {
        sql.push_str(&format!(" WHERE {}", cond));
    }

    let mut query = sqlx::query_as::<_, VoterTotals>(&sql);
    if let Some(anchor) = scope.anchor() {
        query = query.bind(anchor);
    }

    query.fetch_one(pool).await
}

/// Counts and percentages for a scope, the common dashboard payload
pub async fn scope_stats(pool: &PgPool, scope: &Scope) -> Result<ScopeStats, sqlx::Error> {
    Ok(voter_totals(pool, scope).await?.into())
}

/// Per-candidate voter counters under one entity, in insertion order
pub async fn candidate_breakdown(
    pool: &PgPool,
    entity_id: Uuid,
) -> Result<Vec<CandidateTotals>, sqlx::Error> {
    sqlx::query_as::<_, CandidateTotals>(
        r#"
        SELECT c.id AS candidate_id,
               u.full_name,
               COUNT(DISTINCT p.id) AS pillars,
               COUNT(v.id) AS total,
               COUNT(v.id) FILTER (WHERE v.voting_status = 'voted') AS voted,
               COUNT(v.id) FILTER (WHERE v.card_status = 'updated') AS updated
        FROM candidates c
        JOIN users u ON c.user_id = u.id
        LEFT JOIN pillars p ON p.candidate_id = c.id
        LEFT JOIN voters v ON v.pillar_id = p.id
        WHERE c.entity_id = $1
        GROUP BY c.id, u.full_name, u.created_at
        ORDER BY u.created_at, c.id
        "#,
    )
    .bind(entity_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(1, 2), 50.0);
        assert_eq!(percentage(7, 7), 100.0);
        assert_eq!(percentage(0, 5), 0.0);
    }

    #[test]
    fn test_percentage_empty_total() {
        // Never NaN, exactly zero
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage2(0, 0), 0.0);
    }

    #[test]
    fn test_percentage_two_decimals() {
        assert_eq!(percentage2(1, 3), 33.33);
        assert_eq!(percentage2(2, 3), 66.67);
        assert_eq!(percentage2(1, 8), 12.5);
    }

    #[test]
    fn test_scope_stats_from_totals() {
        let totals = VoterTotals {
            total: 200,
            centers: 4,
            stations: 12,
            updated: 150,
            not_updated: 50,
            voted: 80,
            not_voted: 120,
        };

        let stats = ScopeStats::from(totals);
        assert_eq!(stats.voting_percentage, 40.0);
        assert_eq!(stats.update_percentage, 75.0);
        assert_eq!(stats.totals.not_voted, 120);
    }

    #[test]
    fn test_scope_stats_empty_scope() {
        let stats = ScopeStats::from(VoterTotals::default());
        assert_eq!(stats.voting_percentage, 0.0);
        assert_eq!(stats.update_percentage, 0.0);
    }
}
