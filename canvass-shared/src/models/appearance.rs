/// Appearance settings: the soft-singleton color theme
///
/// The table keeps a history of themes; at most one row is active at a time
/// and activation of a new theme deactivates every prior row in the same
/// transaction. When no row is active the built-in default palette applies.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Stored theme row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AppearanceSettings {
    pub id: Uuid,
    pub primary_color: String,
    pub secondary_color: String,
    pub button_text_color: String,
    pub card_title_color: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// The four colors a theme consists of, as `#rrggbb` strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub primary_color: String,
    pub secondary_color: String,
    pub button_text_color: String,
    pub card_title_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: "#007bff".to_string(),
            secondary_color: "#6c757d".to_string(),
            button_text_color: "#ffffff".to_string(),
            card_title_color: "#212529".to_string(),
        }
    }
}

impl From<AppearanceSettings> for Theme {
    fn from(row: AppearanceSettings) -> Self {
        Self {
            primary_color: row.primary_color,
            secondary_color: row.secondary_color,
            button_text_color: row.button_text_color,
            card_title_color: row.card_title_color,
        }
    }
}

/// Checks that a color is a `#` followed by exactly six hex digits
pub fn is_valid_hex(color: &str) -> bool {
    let Some(rest) = color.strip_prefix('#') else {
        return false;
    };
    rest.len() == 6 && rest.chars().all(|c| c.is_ascii_hexdigit())
}

impl AppearanceSettings {
    /// The currently active theme row, if any
    ///
    /// Should duplicate activation ever leave more than one active row, the
    /// most recent one wins deterministically.
    pub async fn active(pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AppearanceSettings>(
            r#"
            SELECT id, primary_color, secondary_color, button_text_color,
                   card_title_color, is_active, created_at
            FROM appearance_settings
            WHERE is_active
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(pool)
        .await
    }

    /// The theme to render with: the active row, or the default palette
    pub async fn resolve(pool: &PgPool) -> Result<Theme, sqlx::Error> {
        Ok(Self::active(pool)
            .await?
            .map(Theme::from)
            .unwrap_or_default())
    }

    /// Stores a theme and makes it the single active one
    ///
    /// The deactivation of prior rows and the insert happen in one
    /// transaction, so readers never observe zero or two active themes from
    /// a completed activation.
    pub async fn activate(pool: &PgPool, theme: &Theme) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE appearance_settings SET is_active = FALSE WHERE is_active")
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, AppearanceSettings>(
            r#"
            INSERT INTO appearance_settings
                (primary_color, secondary_color, button_text_color, card_title_color, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING id, primary_color, secondary_color, button_text_color,
                      card_title_color, is_active, created_at
            "#,
        )
        .bind(&theme.primary_color)
        .bind(&theme.secondary_color)
        .bind(&theme.button_text_color)
        .bind(&theme.card_title_color)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row)
    }
}
