/// Spreadsheet bulk import endpoints
///
/// # Endpoints
///
/// ```text
/// POST /v1/import/voters
/// Content-Type: multipart/form-data
///
/// file:      voters.xlsx  (the spreadsheet)
/// pillar_id: <uuid>       (target pillar)
/// ```
///
/// ```text
/// POST /v1/import/candidates
/// Content-Type: multipart/form-data
///
/// file: candidates.xlsx  (the spreadsheet)
/// ```
///
/// # Response
///
/// ```json
/// {
///   "created": 9999,
///   "errors": [
///     { "row": 42, "message": "Missing required field: voter_number" }
///   ]
/// }
/// ```
///
/// Rows commit independently; a report with errors still means every listed
/// `created` record is in the database.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::voters::resolve_target_pillar,
};
use axum::{extract::Multipart, extract::State, Extension, Json};
use canvass_shared::{
    auth::{middleware::AuthContext, password},
    import::{self, ImportReport},
    models::entity::Entity,
};
use uuid::Uuid;

/// Password every imported candidate account starts with
///
/// The generated credentials are handed to the entity out of band together
/// with the created usernames.
const DEFAULT_IMPORT_PASSWORD: &str = "defaultpassword123";

/// Import handler
///
/// Open to entity and candidate accounts. The target pillar must fall in the
/// caller's scope; one outside it reads as nonexistent.
///
/// # Errors
///
/// - `400 Bad Request`: Missing parts, wrong file type or unreadable workbook
/// - `403 Forbidden`: Caller's role may not import
/// - `404 Not Found`: Pillar not in the caller's scope
pub async fn import_voters(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportReport>> {
    if !auth.role.can_import_voters() {
        return Err(ApiError::Forbidden(
            "Only entity and candidate accounts can import voters".to_string(),
        ));
    }

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut pillar_id: Option<Uuid> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .ok_or_else(|| ApiError::BadRequest("File part has no filename".to_string()))?
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
                file = Some((file_name, data.to_vec()));
            }
            Some("pillar_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
                let id = text
                    .trim()
                    .parse::<Uuid>()
                    .map_err(|_| ApiError::BadRequest("pillar_id must be a UUID".to_string()))?;
                pillar_id = Some(id);
            }
            _ => {}
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| ApiError::BadRequest("Missing file part".to_string()))?;
    let pillar_id = resolve_target_pillar(&state, &auth, pillar_id).await?;

    // Extension check and workbook parsing happen before any insert
    let sheet = import::sheet_from_bytes(&file_name, data)?;

    let report = import::import_voters(&state.db, pillar_id, &sheet).await?;

    Ok(Json(report))
}

/// Candidate account import handler
///
/// Entity accounts onboard their candidates in bulk: every sheet row creates
/// a candidate user plus profile under the caller's own entity. Created
/// accounts start with a shared default password.
///
/// # Errors
///
/// - `400 Bad Request`: Missing file part, wrong file type or unreadable
///   workbook
/// - `403 Forbidden`: Caller is not an entity account
/// - `404 Not Found`: No entity profile for this account
pub async fn import_candidates(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportReport>> {
    if !auth.role.can_import_candidates() {
        return Err(ApiError::Forbidden(
            "Only entity accounts can import candidates".to_string(),
        ));
    }

    let entity = Entity::find_by_user(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No entity profile for this account".to_string()))?;

    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let file_name = field
                .file_name()
                .ok_or_else(|| ApiError::BadRequest("File part has no filename".to_string()))?
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
            file = Some((file_name, data.to_vec()));
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| ApiError::BadRequest("Missing file part".to_string()))?;

    // Extension check and workbook parsing happen before any insert
    let sheet = import::sheet_from_bytes(&file_name, data)?;

    // One hash for the shared default password, not one per row
    let password_hash = password::hash_password(DEFAULT_IMPORT_PASSWORD)?;

    let report = import::import_candidates(&state.db, entity.id, &password_hash, &sheet).await?;

    Ok(Json(report))
}
