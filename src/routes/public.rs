use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Public Router Module
///
/// Defines endpoints that are accessible to any client (anonymous or
/// logged-in): reading posts and comments, the registration/login gateway,
/// static pages, and the contact form.
///
/// The comment submission route lives here rather than behind the auth layer:
/// anonymous submissions must be redirected to the login page with a flashed
/// message, not rejected by the blanket middleware.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load
        // balancer checks.
        .route("/health", get(handlers::health))
        // GET /
        // The index page: every post, newest first.
        .route("/", get(handlers::get_all_posts))
        // GET /post/{id}  - post detail with its comments.
        // POST /post/{id} - submit a comment (session-aware; anonymous
        //                   submissions redirect to /login and persist nothing).
        .route(
            "/post/{id}",
            get(handlers::show_post).post(handlers::submit_comment),
        )
        // GET /register  - registration form page (consumes any flash).
        // POST /register - create an account; duplicate emails flash and
        //                  redirect to /login without creating a second account.
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register),
        )
        // GET /login  - login form page (consumes any flash).
        // POST /login - verify credentials; one generic rejection for both
        //               unknown email and wrong password.
        .route("/login", get(handlers::login_page).post(handlers::login))
        // GET /logout
        // Clears the session cookie. Idempotent, so no auth layer needed.
        .route("/logout", get(handlers::logout))
        // GET /about
        // Fixed-content page payload.
        .route("/about", get(handlers::about))
        // GET /contact  - contact form page (consumes the confirmation flash).
        // POST /contact - relay the submission through the SMTP mailer.
        .route(
            "/contact",
            get(handlers::contact_page).post(handlers::submit_contact),
        )
}
