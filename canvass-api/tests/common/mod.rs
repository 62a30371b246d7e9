/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Organizational tree builders (entity → candidate → pillar → voter)
/// - JWT token generation
/// - API client helpers
///
/// The suite needs a PostgreSQL instance. Every test starts with
/// `TestContext::new()`, which returns `None` when `DATABASE_URL` is not
/// set, so the tests pass as no-ops in environments without a database.

use canvass_api::app::{build_router, AppState};
use canvass_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use canvass_shared::auth::jwt::{create_token, Claims, TokenType};
use canvass_shared::db::migrations;
use canvass_shared::models::candidate::{Candidate, CreateCandidate};
use canvass_shared::models::entity::{CreateEntity, Entity};
use canvass_shared::models::pillar::{CreatePillar, Pillar};
use canvass_shared::models::user::{CreateUser, Role, User};
use canvass_shared::models::voter::{CardStatus, CreateVoter, Voter};
use sqlx::PgPool;
use uuid::Uuid;

const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    /// Backing users created by this context, deleted on cleanup
    user_ids: Vec<Uuid>,
}

impl TestContext {
    /// Creates a new test context against the `DATABASE_URL` database
    ///
    /// Returns `None` when `DATABASE_URL` is not set.
    pub async fn new() -> Option<Self> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping database-backed test");
            return None;
        };

        let db = PgPool::connect(&url).await.expect("connect to database");
        migrations::run_migrations(&db).await.expect("run migrations");

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: JWT_SECRET.to_string(),
            },
        };

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Some(TestContext {
            db,
            app,
            user_ids: Vec::new(),
        })
    }

    /// Access token for a user, signed with the test secret
    pub fn token_for(&self, user_id: Uuid, role: Role) -> String {
        let claims = Claims::new(user_id, role, TokenType::Access);
        create_token(&claims, JWT_SECRET).expect("create token")
    }

    /// Authorization header value for a user
    pub fn auth_header(&self, user_id: Uuid, role: Role) -> String {
        format!("Bearer {}", self.token_for(user_id, role))
    }

    /// Registers a user id for deletion on cleanup
    pub fn track_user(&mut self, user_id: Uuid) {
        self.user_ids.push(user_id);
    }

    /// Creates an admin account
    pub async fn create_admin(&mut self) -> User {
        let user = User::create(
            &self.db,
            CreateUser {
                username: unique("admin"),
                role: Role::Admin,
                password_hash: "test-hash".to_string(), // Never verified in tests
                full_name: "Test Admin".to_string(),
                phone: None,
            },
        )
        .await
        .expect("create admin user");

        self.track_user(user.id);
        user
    }

    /// Creates an entity with its backing user
    pub async fn create_entity(&mut self, name: &str) -> Entity {
        let entity = Entity::create_with_user(
            &self.db,
            CreateEntity {
                username: unique("entity"),
                password_hash: "test-hash".to_string(),
                full_name: format!("{} Manager", name),
                phone: None,
                name: name.to_string(),
                logo_url: None,
            },
        )
        .await
        .expect("create entity");

        self.track_user(entity.user_id);
        entity
    }

    /// Creates a candidate under an entity
    pub async fn create_candidate(&mut self, entity_id: Uuid) -> Candidate {
        let candidate = Candidate::create_with_user(
            &self.db,
            CreateCandidate {
                username: unique("candidate"),
                password_hash: "test-hash".to_string(),
                full_name: "Test Candidate".to_string(),
                phone: None,
                entity_id,
                profile_image_url: None,
            },
        )
        .await
        .expect("create candidate");

        self.track_user(candidate.user_id);
        candidate
    }

    /// Creates a pillar under a candidate
    pub async fn create_pillar(&mut self, candidate_id: Uuid) -> Pillar {
        let pillar = Pillar::create_with_user(
            &self.db,
            CreatePillar {
                username: unique("pillar"),
                password_hash: "test-hash".to_string(),
                full_name: "Test Pillar".to_string(),
                phone: None,
                candidate_id,
            },
        )
        .await
        .expect("create pillar");

        self.track_user(pillar.user_id);
        pillar
    }

    /// Registers a voter under a pillar
    ///
    /// Voters cascade away with their pillar's user, so they need no
    /// separate cleanup tracking.
    pub async fn create_voter(&mut self, pillar_id: Uuid, voter_number: &str) -> Voter {
        Voter::create(
            &self.db,
            CreateVoter {
                voter_number: voter_number.to_string(),
                name: format!("Voter {}", voter_number),
                governorate: "Baghdad".to_string(),
                district: "Karkh".to_string(),
                sub_district: "".to_string(),
                card_status: CardStatus::NotUpdated,
                center_name: "Al-Amal School".to_string(),
                center_number: "44".to_string(),
                station: "3".to_string(),
                phone: None,
                pillar_id,
            },
        )
        .await
        .expect("create voter")
    }

    /// Deletes every user this context created, cascading their subtrees
    pub async fn cleanup(self) {
        for user_id in self.user_ids {
            // Already-cascaded users report false, which is fine
            let _ = User::delete(&self.db, user_id).await;
        }
    }
}

/// A username that won't collide across concurrent test runs
pub fn unique(prefix: &str) -> String {
    format!("it-{}-{}", prefix, Uuid::new_v4())
}
