/// Integration tests for the canvass API
///
/// These tests verify the database-backed behavior end-to-end:
/// - Authentication at the router boundary
/// - Cascade deletion down the organizational tree
/// - Subtree isolation of scoped listings
/// - Pillar ownership of status updates
/// - Partial-commit spreadsheet imports
/// - Appearance theme resolution
/// - Statistics consistency invariants
///
/// The suite is gated on `DATABASE_URL`; without it every test returns
/// early.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use calamine::{DataType, Range};
use canvass_shared::models::appearance::{AppearanceSettings, Theme};
use canvass_shared::models::user::{Role, User};
use canvass_shared::models::voter::{CardStatus, Voter, VoterFilter, VotingStatus};
use canvass_shared::scope::Scope;
use canvass_shared::{import, stats};
use serde_json::json;
use tower::Service as _;
use uuid::Uuid;

/// Builds an in-memory worksheet from string cells
///
/// Empty strings become empty cells, matching what a sparse Excel sheet
/// yields.
fn sheet(rows: &[&[&str]]) -> Range<DataType> {
    let max_cols = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
    let mut range = Range::new((0, 0), (rows.len() as u32 - 1, max_cols - 1));

    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                range.set_value((r as u32, c as u32), DataType::String(cell.to_string()));
            }
        }
    }

    range
}

/// Test that protected routes refuse requests without a token
#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let Some(ctx) = common::TestContext::new().await else {
        return;
    };

    let request = Request::builder()
        .method("GET")
        .uri("/v1/voters")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}

/// Test that deleting an entity's user empties its whole subtree
#[tokio::test]
async fn test_entity_cascade_delete_empties_subtree() {
    let Some(mut ctx) = common::TestContext::new().await else {
        return;
    };

    let entity = ctx.create_entity("Cascade Bloc").await;
    let candidate = ctx.create_candidate(entity.id).await;
    let pillar = ctx.create_pillar(candidate.id).await;
    ctx.create_voter(pillar.id, &common::unique("v")).await;
    ctx.create_voter(pillar.id, &common::unique("v")).await;

    let deleted = User::delete(&ctx.db, entity.user_id).await.unwrap();
    assert!(deleted);

    let (entities,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entities WHERE id = $1")
        .bind(entity.id)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    let (candidates,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM candidates WHERE id = $1")
        .bind(candidate.id)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    let (pillars,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pillars WHERE id = $1")
        .bind(pillar.id)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    let (voters,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM voters WHERE pillar_id = $1")
        .bind(pillar.id)
        .fetch_one(&ctx.db)
        .await
        .unwrap();

    assert_eq!(entities, 0);
    assert_eq!(candidates, 0);
    assert_eq!(pillars, 0);
    assert_eq!(voters, 0);

    ctx.cleanup().await;
}

/// Test that entity-scoped listings never leak into a sibling subtree
#[tokio::test]
async fn test_entity_listings_stay_in_subtree() {
    let Some(mut ctx) = common::TestContext::new().await else {
        return;
    };

    let entity_a = ctx.create_entity("Bloc A").await;
    let candidate_a = ctx.create_candidate(entity_a.id).await;
    let pillar_a = ctx.create_pillar(candidate_a.id).await;
    let voter_a = ctx.create_voter(pillar_a.id, &common::unique("va")).await;

    let entity_b = ctx.create_entity("Bloc B").await;
    let candidate_b = ctx.create_candidate(entity_b.id).await;
    let pillar_b = ctx.create_pillar(candidate_b.id).await;
    ctx.create_voter(pillar_b.id, &common::unique("vb")).await;

    let scope = Scope::Entity(entity_a.id);

    let page = Voter::list(&ctx.db, &scope, &VoterFilter::default(), 1, 50)
        .await
        .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].id, voter_a.id);
    assert!(page.items.iter().all(|v| v.pillar_id == pillar_a.id));

    let breakdown = stats::candidate_breakdown(&ctx.db, entity_a.id).await.unwrap();
    assert_eq!(breakdown.len(), 1);
    assert_eq!(breakdown[0].candidate_id, candidate_a.id);

    ctx.cleanup().await;
}

/// Test that a pillar account can only flip statuses on its own roster
#[tokio::test]
async fn test_pillar_cannot_mutate_foreign_roster() {
    let Some(mut ctx) = common::TestContext::new().await else {
        return;
    };

    let entity = ctx.create_entity("Status Bloc").await;
    let candidate = ctx.create_candidate(entity.id).await;
    let pillar_a = ctx.create_pillar(candidate.id).await;
    let pillar_b = ctx.create_pillar(candidate.id).await;
    let own_voter = ctx.create_voter(pillar_a.id, &common::unique("own")).await;
    let foreign_voter = ctx.create_voter(pillar_b.id, &common::unique("far")).await;

    let auth = ctx.auth_header(pillar_a.user_id, Role::Pillar);

    // A foreign voter reads as nonexistent
    let request = Request::builder()
        .method("POST")
        .uri(format!("/v1/voters/{}/voting-status", foreign_voter.id))
        .header("authorization", &auth)
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": "صوت" }).to_string()))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (status,): (VotingStatus,) =
        sqlx::query_as("SELECT voting_status FROM voters WHERE id = $1")
            .bind(foreign_voter.id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(status, VotingStatus::NotVoted);

    // An unknown token mutates nothing
    let request = Request::builder()
        .method("POST")
        .uri(format!("/v1/voters/{}/voting-status", own_voter.id))
        .header("authorization", &auth)
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": "maybe" }).to_string()))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // The Arabic token persists on the pillar's own voter
    let request = Request::builder()
        .method("POST")
        .uri(format!("/v1/voters/{}/voting-status", own_voter.id))
        .header("authorization", &auth)
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": "صوت" }).to_string()))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status,): (VotingStatus,) =
        sqlx::query_as("SELECT voting_status FROM voters WHERE id = $1")
            .bind(own_voter.id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(status, VotingStatus::Voted);

    ctx.cleanup().await;
}

/// Test that a voter import commits good rows around a bad one
#[tokio::test]
async fn test_import_skips_bad_row_and_keeps_rest() {
    let Some(mut ctx) = common::TestContext::new().await else {
        return;
    };

    let entity = ctx.create_entity("Import Bloc").await;
    let candidate = ctx.create_candidate(entity.id).await;
    let pillar = ctx.create_pillar(candidate.id).await;

    let numbers: Vec<String> = (0..4).map(|_| common::unique("r")).collect();
    let worksheet = sheet(&[
        &["voter_number", "name", "governorate", "district", "sub_district", "card_status", "center_name", "center_number", "station", "phone"],
        &[numbers[0].as_str(), "Voter Two", "Baghdad", "Karkh", "", "", "Al-Amal School", "44", "3", ""],
        // Row 3 has no voter number
        &["", "Voter Three", "Baghdad", "Karkh", "", "", "Al-Amal School", "44", "3", ""],
        &[numbers[1].as_str(), "Voter Four", "Baghdad", "Karkh", "", "محدث", "Al-Amal School", "44", "3", ""],
        &[numbers[2].as_str(), "Voter Five", "Baghdad", "Rusafa", "", "", "Al-Noor School", "12", "1", ""],
        &[numbers[3].as_str(), "Voter Six", "Baghdad", "Rusafa", "", "", "Al-Noor School", "12", "2", ""],
    ]);

    let report = import::import_voters(&ctx.db, pillar.id, &worksheet)
        .await
        .unwrap();

    assert_eq!(report.created, 4);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 3);
    assert!(report.errors[0].message.contains("voter_number"));

    let (persisted,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM voters WHERE pillar_id = $1")
        .bind(pillar.id)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(persisted, 4);

    // Imported voters never start as voted
    let (voted,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM voters WHERE pillar_id = $1 AND voting_status = 'voted'",
    )
    .bind(pillar.id)
    .fetch_one(&ctx.db)
    .await
    .unwrap();
    assert_eq!(voted, 0);

    ctx.cleanup().await;
}

/// Test that a candidate sheet creates accounts under the uploading entity
#[tokio::test]
async fn test_candidate_sheet_creates_accounts_under_entity() {
    let Some(mut ctx) = common::TestContext::new().await else {
        return;
    };

    let entity = ctx.create_entity("Onboarding Bloc").await;

    let username_a = common::unique("imp");
    let username_b = common::unique("imp");
    let worksheet = sheet(&[
        &["username", "full_name", "phone", "profile_image_url"],
        &[username_a.as_str(), "Aya Karim", "07701112233", ""],
        &[username_b.as_str(), "Omar Qasim"],
        // Row 4 has no username
        &["", "Nameless Candidate"],
        // Row 5 reuses row 2's username
        &[username_a.as_str(), "Aya Karim Again"],
    ]);

    let report = import::import_candidates(&ctx.db, entity.id, "test-hash", &worksheet)
        .await
        .unwrap();

    assert_eq!(report.created, 2);
    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.errors[0].row, 4);
    assert!(report.errors[0].message.contains("username"));
    assert_eq!(report.errors[1].row, 5);
    assert_eq!(report.errors[1].message, "Duplicate username");

    let created: Vec<(Uuid, Role)> = sqlx::query_as(
        r#"
        SELECT u.id, u.role
        FROM candidates c
        JOIN users u ON c.user_id = u.id
        WHERE c.entity_id = $1
        "#,
    )
    .bind(entity.id)
    .fetch_all(&ctx.db)
    .await
    .unwrap();

    assert_eq!(created.len(), 2);
    for (user_id, role) in created {
        assert_eq!(role, Role::Candidate);
        ctx.track_user(user_id);
    }

    ctx.cleanup().await;
}

/// Test theme resolution with zero and with competing active rows
#[tokio::test]
async fn test_multiple_active_theme_rows_resolve_to_newest() {
    let Some(ctx) = common::TestContext::new().await else {
        return;
    };

    // The theme table is global, so this test owns it for its duration
    sqlx::query("DELETE FROM appearance_settings")
        .execute(&ctx.db)
        .await
        .unwrap();

    let resolved = AppearanceSettings::resolve(&ctx.db).await.unwrap();
    assert_eq!(resolved, Theme::default());

    // Two active rows, as left behind by racing activations
    sqlx::query(
        r#"
        INSERT INTO appearance_settings
            (primary_color, secondary_color, button_text_color, card_title_color,
             is_active, created_at)
        VALUES ('#111111', '#222222', '#333333', '#444444', TRUE, NOW() - INTERVAL '1 hour')
        "#,
    )
    .execute(&ctx.db)
    .await
    .unwrap();
    sqlx::query(
        r#"
        INSERT INTO appearance_settings
            (primary_color, secondary_color, button_text_color, card_title_color,
             is_active, created_at)
        VALUES ('#aaaaaa', '#bbbbbb', '#cccccc', '#dddddd', TRUE, NOW())
        "#,
    )
    .execute(&ctx.db)
    .await
    .unwrap();

    let resolved = AppearanceSettings::resolve(&ctx.db).await.unwrap();
    assert_eq!(resolved.primary_color, "#aaaaaa");

    // Resolution is stable across repeated reads
    let again = AppearanceSettings::resolve(&ctx.db).await.unwrap();
    assert_eq!(resolved, again);

    // Activating through the model collapses back to one active row
    let theme = Theme::default();
    AppearanceSettings::activate(&ctx.db, &theme).await.unwrap();

    let (active,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM appearance_settings WHERE is_active")
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(active, 1);
    assert_eq!(AppearanceSettings::resolve(&ctx.db).await.unwrap(), theme);

    sqlx::query("DELETE FROM appearance_settings")
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await;
}

/// Test that status buckets always sum to the scope's total
#[tokio::test]
async fn test_scope_totals_stay_consistent() {
    let Some(mut ctx) = common::TestContext::new().await else {
        return;
    };

    let entity = ctx.create_entity("Stats Bloc").await;
    let candidate = ctx.create_candidate(entity.id).await;
    let pillar_a = ctx.create_pillar(candidate.id).await;
    let pillar_b = ctx.create_pillar(candidate.id).await;

    let v1 = ctx.create_voter(pillar_a.id, &common::unique("s")).await;
    let v2 = ctx.create_voter(pillar_a.id, &common::unique("s")).await;
    ctx.create_voter(pillar_a.id, &common::unique("s")).await;
    ctx.create_voter(pillar_b.id, &common::unique("s")).await;

    Voter::update_voting_status(&ctx.db, v1.id, pillar_a.id, VotingStatus::Voted)
        .await
        .unwrap();
    Voter::update_voting_status(&ctx.db, v2.id, pillar_a.id, VotingStatus::Voted)
        .await
        .unwrap();
    Voter::update_card_status(&ctx.db, v1.id, pillar_a.id, CardStatus::Updated)
        .await
        .unwrap();

    for scope in [
        Scope::Entity(entity.id),
        Scope::Candidate(candidate.id),
        Scope::Pillar(pillar_a.id),
        Scope::Pillar(pillar_b.id),
    ] {
        let totals = stats::voter_totals(&ctx.db, &scope).await.unwrap();
        assert_eq!(totals.voted + totals.not_voted, totals.total);
        assert_eq!(totals.updated + totals.not_updated, totals.total);
    }

    let pillar_stats = stats::scope_stats(&ctx.db, &Scope::Pillar(pillar_a.id))
        .await
        .unwrap();
    assert_eq!(pillar_stats.totals.total, 3);
    assert_eq!(pillar_stats.totals.voted, 2);
    assert_eq!(pillar_stats.voting_percentage, 66.7);

    // A candidate with no pillars reports zeros, never NaN
    let empty_candidate = ctx.create_candidate(entity.id).await;
    let empty = stats::scope_stats(&ctx.db, &Scope::Candidate(empty_candidate.id))
        .await
        .unwrap();
    assert_eq!(empty.totals.total, 0);
    assert_eq!(empty.voting_percentage, 0.0);
    assert_eq!(empty.update_percentage, 0.0);

    ctx.cleanup().await;
}

/// Test the admin dashboard endpoint and its role gate
#[tokio::test]
async fn test_admin_dashboard_role_gate() {
    let Some(mut ctx) = common::TestContext::new().await else {
        return;
    };

    let admin = ctx.create_admin().await;
    let entity = ctx.create_entity("Gate Bloc").await;

    let request = Request::builder()
        .method("GET")
        .uri("/v1/dashboard/admin")
        .header("authorization", ctx.auth_header(admin.id, Role::Admin))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(payload["entities_count"].as_i64().unwrap() >= 1);
    assert!(payload["voting_percentage"].is_number());

    // An entity account is refused, not narrowed
    let request = Request::builder()
        .method("GET")
        .uri("/v1/dashboard/admin")
        .header("authorization", ctx.auth_header(entity.user_id, Role::Entity))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}
