/// Appearance (theme) endpoints
///
/// # Endpoints
///
/// - `GET /v1/appearance` - The theme to render with (public)
/// - `PUT /v1/appearance` - Replace the active theme (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::HeaderMap, Json};
use canvass_shared::{
    auth::authorization::require_role,
    models::{
        appearance::{is_valid_hex, AppearanceSettings, Theme},
        user::Role,
    },
};
use serde::Deserialize;

/// Theme update request
#[derive(Debug, Deserialize)]
pub struct UpdateThemeRequest {
    pub primary_color: String,
    pub secondary_color: String,
    pub button_text_color: String,
    pub card_title_color: String,
}

/// Returns the theme to render with
///
/// Public: the login page is themed before anyone is authenticated. Falls
/// back to the default palette when no theme was ever activated.
pub async fn get_theme(State(state): State<AppState>) -> ApiResult<Json<Theme>> {
    Ok(Json(AppearanceSettings::resolve(&state.db).await?))
}

/// Replaces the active theme (admin)
///
/// Activation is atomic: readers see either the old theme or the new one,
/// never both and never none.
///
/// Authenticates from the headers itself because `GET` on the same path is
/// public and the JWT layer is applied per-router, not per-method.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid access token
/// - `403 Forbidden`: Caller is not an admin
/// - `422 Unprocessable Entity`: A color is not a `#rrggbb` string; every
///   bad field is reported and nothing is stored
pub async fn update_theme(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateThemeRequest>,
) -> ApiResult<Json<Theme>> {
    let auth = crate::app::authenticate(&state, &headers)?;
    require_role(&auth, Role::Admin)?;

    let fields = [
        ("primary_color", &req.primary_color),
        ("secondary_color", &req.secondary_color),
        ("button_text_color", &req.button_text_color),
        ("card_title_color", &req.card_title_color),
    ];

    let errors: Vec<ValidationErrorDetail> = fields
        .iter()
        .filter(|(_, value)| !is_valid_hex(value))
        .map(|(field, value)| ValidationErrorDetail {
            field: field.to_string(),
            message: format!("'{}' is not a #rrggbb color", value),
        })
        .collect();

    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    let theme = Theme {
        primary_color: req.primary_color,
        secondary_color: req.secondary_color,
        button_text_color: req.button_text_color,
        card_title_color: req.card_title_color,
    };

    let row = AppearanceSettings::activate(&state.db, &theme).await?;

    Ok(Json(Theme::from(row)))
}
