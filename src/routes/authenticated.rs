use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Authenticated Router Module
///
/// Defines the routes accessible only to users who have passed the
/// authentication layer: authoring, editing, and deleting posts.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being present on the router layer above this module. This guarantees that
/// all handlers receive a validated `AuthUser` struct containing the user's
/// ID, which is then used for all Owner-Only authorization checks (edit and
/// delete compare it against the post's stored `author_id`).
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /new-post  - blank post form payload.
        // POST /new-post - create a post owned by the session user. A title
        //                  collision is rejected by the storage layer's
        //                  unique constraint and surfaces as 409.
        .route(
            "/new-post",
            get(handlers::new_post_page).post(handlers::create_post),
        )
        // GET /edit-post/{id}  - prefilled form; Owner-Only even on GET.
        // POST /edit-post/{id} - apply the edit; Owner-Only (403 on mismatch,
        //                        404 when the post does not exist).
        .route(
            "/edit-post/{id}",
            get(handlers::edit_post_page).post(handlers::edit_post),
        )
        // GET /delete/{id}
        // Deletes the session user's own post; comments cascade with it.
        .route("/delete/{id}", get(handlers::delete_post))
}
