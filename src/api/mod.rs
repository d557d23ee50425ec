mod handlers;
pub mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;
use middleware::{admin_auth_middleware, AdminAuth};

/// Router with open admin routes.
pub fn create_router(db: Database) -> Router {
    create_router_with_auth(db, AdminAuth::disabled())
}

pub fn create_router_with_auth(db: Database, auth: AdminAuth) -> Router {
    let admin = Router::new()
        .route(
            "/bookings",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route(
            "/bookings/{id}",
            put(handlers::update_booking).delete(handlers::delete_booking),
        )
        .route("/comments", get(handlers::list_comments))
        .route(
            "/comments/{id}",
            put(handlers::update_comment).delete(handlers::delete_comment),
        )
        .route_layer(from_fn_with_state(auth, admin_auth_middleware));

    let api = Router::new()
        // Catalog
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/{id}",
            get(handlers::get_category).delete(handlers::delete_category),
        )
        .route(
            "/categories/{id}/subcategories",
            get(handlers::list_sub_categories).post(handlers::create_sub_category),
        )
        .route(
            "/subcategories/{id}/sheets",
            get(handlers::list_sheets).post(handlers::create_sheet),
        )
        .route(
            "/subcategories/{id}/documents",
            get(handlers::list_documents).post(handlers::create_document),
        )
        // Public sheet address
        .route(
            "/doc/{slug}/{sub_slug}/{sheet_slug}",
            get(handlers::show_sheet),
        )
        // Sheet workflow
        .route(
            "/sheets/{id}",
            get(handlers::get_sheet)
                .put(handlers::edit_sheet)
                .delete(handlers::delete_sheet),
        )
        .route("/sheets/{id}/submit", post(handlers::submit_sheet))
        .route("/sheets/{id}/publish", post(handlers::publish_sheet))
        .route("/sheets/{id}/front", post(handlers::set_front))
        .route("/sheets/{id}/attachments", put(handlers::edit_attachments))
        .route("/sheets/{id}/revision", get(handlers::get_pending_revision))
        .route(
            "/sheets/{id}/comments",
            get(handlers::list_sheet_comments).post(handlers::request_correction),
        )
        // Documents
        .route(
            "/documents/{id}",
            get(handlers::get_document)
                .put(handlers::update_document)
                .delete(handlers::delete_document),
        )
        .nest("/admin", admin)
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(db)
}
