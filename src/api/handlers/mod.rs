use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::db::Database;
use crate::error::Error;
use crate::models::*;

/// Page size of the admin comment index.
const COMMENTS_PER_PAGE: u32 = 5;

type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

/// Map a domain error to a response.
///
/// Client errors are returned as-is. Storage failures are logged server-side
/// and clients only see a generic message to avoid leaking internal details.
fn error_response(e: Error) -> (StatusCode, String) {
    if !e.is_client_error() {
        tracing::error!("Internal error: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        );
    }

    let status = match &e {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Workflow(_) | Error::IntegrityConflict(_) => StatusCode::CONFLICT,
        Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    tracing::warn!("Request rejected: {}", e);
    (status, e.to_string())
}

fn not_found(what: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{what} not found"))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Categories
// ============================================================

pub async fn list_categories(State(db): State<Database>) -> ApiResult<Json<Vec<Category>>> {
    db.get_all_categories().map(Json).map_err(error_response)
}

pub async fn get_category(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Category>> {
    db.get_category(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Category"))
}

pub async fn create_category(
    State(db): State<Database>,
    Json(input): Json<CreateCategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    db.create_category(input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(error_response)
}

pub async fn delete_category(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if db.delete_category(id).map_err(error_response)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Category"))
    }
}

pub async fn list_sub_categories(
    State(db): State<Database>,
    Path(category_id): Path<Uuid>,
) -> ApiResult<Json<Vec<SubCategory>>> {
    db.get_category(category_id)
        .map_err(error_response)?
        .ok_or_else(|| not_found("Category"))?;

    db.get_sub_categories(category_id)
        .map(Json)
        .map_err(error_response)
}

pub async fn create_sub_category(
    State(db): State<Database>,
    Path(category_id): Path<Uuid>,
    Json(input): Json<CreateSubCategoryInput>,
) -> ApiResult<(StatusCode, Json<SubCategory>)> {
    db.create_sub_category(category_id, input)
        .map(|s| (StatusCode::CREATED, Json(s)))
        .map_err(error_response)
}

// ============================================================
// Sheets
// ============================================================

pub async fn list_sheets(
    State(db): State<Database>,
    Path(sub_category_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Sheet>>> {
    db.get_sub_category(sub_category_id)
        .map_err(error_response)?
        .ok_or_else(|| not_found("Sub-category"))?;

    db.get_sheets_by_sub_category(sub_category_id)
        .map(Json)
        .map_err(error_response)
}

pub async fn show_sheet(
    State(db): State<Database>,
    Path((slug, sub_slug, sheet_slug)): Path<(String, String, String)>,
) -> ApiResult<Json<SheetDetail>> {
    db.get_sheet_by_slugs(&slug, &sub_slug, &sheet_slug)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Sheet"))
}

pub async fn get_sheet(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SheetDetail>> {
    db.get_sheet_detail(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Sheet"))
}

pub async fn get_pending_revision(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Sheet>> {
    db.get_sheet(id)
        .map_err(error_response)?
        .ok_or_else(|| not_found("Sheet"))?;

    db.get_pending_revision(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Pending revision"))
}

pub async fn create_sheet(
    State(db): State<Database>,
    Path(sub_category_id): Path<Uuid>,
    Json(input): Json<CreateSheetInput>,
) -> ApiResult<(StatusCode, Json<SheetOutcome>)> {
    db.create_sheet(sub_category_id, input)
        .map(|o| (StatusCode::CREATED, Json(o)))
        .map_err(error_response)
}

/// Edit a sheet. Returns `201 Created` when the edit forked a new revision.
pub async fn edit_sheet(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<EditSheetInput>,
) -> ApiResult<(StatusCode, Json<EditOutcome>)> {
    let outcome = db.edit_sheet(id, input).map_err(error_response)?;
    let status = if outcome.forked {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

pub async fn delete_sheet(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteOutcome>> {
    db.delete_sheet(id).map(Json).map_err(error_response)
}

pub async fn submit_sheet(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SheetOutcome>> {
    db.submit_sheet(id).map(Json).map_err(error_response)
}

pub async fn publish_sheet(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SheetOutcome>> {
    db.publish_sheet(id).map(Json).map_err(error_response)
}

pub async fn set_front(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SheetOutcome>> {
    db.set_front(id).map(Json).map_err(error_response)
}

pub async fn edit_attachments(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<EditAttachmentsInput>,
) -> ApiResult<Json<SheetOutcome>> {
    db.edit_attachments(id, input)
        .map(Json)
        .map_err(error_response)
}

pub async fn list_sheet_comments(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Comment>>> {
    db.get_sheet(id)
        .map_err(error_response)?
        .ok_or_else(|| not_found("Sheet"))?;

    db.get_sheet_comments(id)
        .map(Json)
        .map_err(error_response)
}

/// Post a reviewer comment, sending the sheet back for correction.
pub async fn request_correction(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateCommentInput>,
) -> ApiResult<(StatusCode, Json<CorrectionOutcome>)> {
    db.request_correction(id, input)
        .map(|o| (StatusCode::CREATED, Json(o)))
        .map_err(error_response)
}

// ============================================================
// Documents
// ============================================================

pub async fn list_documents(
    State(db): State<Database>,
    Path(sub_category_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Document>>> {
    db.get_sub_category(sub_category_id)
        .map_err(error_response)?
        .ok_or_else(|| not_found("Sub-category"))?;

    db.get_documents_by_sub_category(sub_category_id)
        .map(Json)
        .map_err(error_response)
}

pub async fn create_document(
    State(db): State<Database>,
    Path(sub_category_id): Path<Uuid>,
    Json(input): Json<CreateDocumentInput>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    db.create_document(sub_category_id, input)
        .map(|d| (StatusCode::CREATED, Json(d)))
        .map_err(error_response)
}

pub async fn get_document(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Document>> {
    db.get_document(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Document"))
}

pub async fn update_document(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateDocumentInput>,
) -> ApiResult<Json<Document>> {
    db.update_document(id, input)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Document"))
}

pub async fn delete_document(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if db.delete_document(id).map_err(error_response)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Document"))
    }
}

// ============================================================
// Admin: bookings
// ============================================================

pub async fn list_bookings(
    State(db): State<Database>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Booking>>> {
    db.get_bookings_page(query.page(), DEFAULT_PER_PAGE)
        .map(Json)
        .map_err(error_response)
}

pub async fn create_booking(
    State(db): State<Database>,
    Json(input): Json<CreateBookingInput>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    db.create_booking(input)
        .map(|b| (StatusCode::CREATED, Json(b)))
        .map_err(error_response)
}

pub async fn update_booking(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateBookingInput>,
) -> ApiResult<Json<Booking>> {
    db.update_booking(id, input)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Booking"))
}

pub async fn delete_booking(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if db.delete_booking(id).map_err(error_response)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Booking"))
    }
}

// ============================================================
// Admin: comments
// ============================================================

pub async fn list_comments(
    State(db): State<Database>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Comment>>> {
    db.get_comments_page(query.page(), COMMENTS_PER_PAGE)
        .map(Json)
        .map_err(error_response)
}

pub async fn update_comment(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCommentInput>,
) -> ApiResult<Json<Comment>> {
    db.update_comment(id, input)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Comment"))
}

pub async fn delete_comment(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if db.delete_comment(id).map_err(error_response)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Comment"))
    }
}
