use crate::{
    AppState,
    auth::{self, AuthUser},
    flash,
    models::{
        ApiMessage, CommentForm, ContactForm, FormPage, LoginForm, Post, PostForm, PostPage,
        RegisterForm, StaticPage,
    },
    repository::RepositoryError,
};
use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;
use validator::Validate;

// --- User-visible messages ---
//
// Exposed as constants so tests can assert the exact observable text.

/// The single rejection message for both unknown email and wrong password.
/// Both failure paths must emit the identical bytes so the response does not
/// leak whether the account exists.
pub const INCORRECT_CREDENTIALS: &str = "Incorrect credentials.";

/// Flashed when registration hits an already-used email.
pub const DUPLICATE_EMAIL_FLASH: &str = "An account with this email already exists.";

/// Returned with a 409 when a post title collides with an existing one.
pub const DUPLICATE_TITLE_MESSAGE: &str = "A post with this title already exists.";

/// Flashed when an anonymous visitor tries to comment.
pub const LOGIN_TO_COMMENT_FLASH: &str = "Please log in to comment.";

/// Flashed after a successful contact-form relay.
pub const CONTACT_CONFIRMATION_FLASH: &str = "Your message has been shared with us!";

// --- Small response helpers ---

/// A flashed message plus a 303 redirect: the post/redirect/get idiom used
/// everywhere a form submission ends on a different page.
fn flash_redirect(jar: CookieJar, message: &str, to: &str) -> Response {
    (flash::set_flash(jar, message), Redirect::to(to)).into_response()
}

/// Field-level validation errors, serialized as the 422 body. This is the
/// JSON analogue of re-rendering the form with per-field messages.
fn validation_failure(errors: validator::ValidationErrors) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
}

// --- Handlers: posts & comments ---

/// health
///
/// [Public Route] Liveness probe for monitoring and load balancer checks.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// get_all_posts
///
/// [Public Route] Lists every post for the index page, newest first, with
/// author names joined in.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "All posts", body = [Post]))
)]
pub async fn get_all_posts(State(state): State<AppState>) -> Json<Vec<Post>> {
    let posts = state.repo.get_posts().await;
    Json(posts)
}

/// show_post
///
/// [Public Route] Retrieves a single post's detail page: the post itself and
/// its comments in chronological order, avatars attached.
#[utoipa::path(
    get,
    path = "/post/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post with comments", body = PostPage),
        (status = 404, description = "No such post")
    )
)]
pub async fn show_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostPage>, StatusCode> {
    let post = state
        .repo
        .get_post(post_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let comments = state
        .repo
        .get_comments(post_id)
        .await
        .into_iter()
        .map(|comment| comment.with_avatar())
        .collect();

    Ok(Json(PostPage { post, comments }))
}

/// submit_comment
///
/// [Public Route, session-aware] Posts a new comment on a post.
///
/// *Authentication*: anonymous submissions persist nothing and are redirected
/// to the login page with a flashed message. The optional extractor keeps the
/// decision in this handler instead of the blanket auth layer, because the
/// flash text is specific to commenting.
#[utoipa::path(
    post,
    path = "/post/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Comment added", body = crate::models::Comment),
        (status = 303, description = "Not logged in, redirected to /login"),
        (status = 404, description = "No such post"),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn submit_comment(
    user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<CommentForm>,
) -> Response {
    let Some(user) = user else {
        return flash_redirect(jar, LOGIN_TO_COMMENT_FLASH, "/login");
    };

    if let Err(errors) = form.validate() {
        return validation_failure(errors);
    }

    // The post must still exist; commenting on a deleted post is a 404, not
    // a dangling foreign key error.
    if state.repo.get_post(post_id).await.is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }

    match state.repo.add_comment(post_id, user.id, &form.body).await {
        Ok(comment) => (StatusCode::CREATED, Json(comment.with_avatar())).into_response(),
        Err(e) => {
            tracing::error!("add_comment error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// --- Handlers: registration, login, logout ---

/// register_page
///
/// [Public Route] Form page payload for registration, consuming any pending
/// flash message.
#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Registration form page", body = FormPage))
)]
pub async fn register_page(jar: CookieJar) -> (CookieJar, Json<FormPage>) {
    let (jar, flash) = flash::take_flash(jar);
    (jar, Json(FormPage { flash }))
}

/// register
///
/// [Public Route] Creates a new account and logs it straight in.
///
/// *Duplicate emails*: checked up front for the user-visible message, and
/// enforced again by the storage layer's unique constraint in case two
/// registrations race. Both paths produce the same flash + redirect to
/// /login and never create a second account.
#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Registered and logged in (to /), or duplicate email (to /login)"),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        return validation_failure(errors);
    }

    if state.repo.get_user_by_email(&form.email).await.is_some() {
        return flash_redirect(jar, DUPLICATE_EMAIL_FLASH, "/login");
    }

    let password_hash = match auth::hash_password(&form.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("password hashing error: {:?}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let user = match state
        .repo
        .create_user(&form.name, &form.email, &password_hash)
        .await
    {
        Ok(user) => user,
        Err(RepositoryError::Duplicate(_)) => {
            // Lost the race against a concurrent registration for the same
            // email; same outcome as the pre-check.
            return flash_redirect(jar, DUPLICATE_EMAIL_FLASH, "/login");
        }
        Err(e) => {
            tracing::error!("create_user error: {:?}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    establish_session(state, jar, user.id).await
}

/// login_page
///
/// [Public Route] Form page payload for login, consuming any pending flash
/// message (e.g. the redirect-to-login notices).
#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login form page", body = FormPage))
)]
pub async fn login_page(jar: CookieJar) -> (CookieJar, Json<FormPage>) {
    let (jar, flash) = flash::take_flash(jar);
    (jar, Json(FormPage { flash }))
}

/// login
///
/// [Public Route] Verifies credentials and establishes a session.
///
/// *No account enumeration*: unknown email and wrong password collapse into
/// one branch producing the identical generic rejection.
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, redirected to /"),
        (status = 401, description = "Incorrect credentials", body = ApiMessage),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        return validation_failure(errors);
    }

    match state.repo.get_user_by_email(&form.email).await {
        Some(user) if auth::verify_password(&user.password_hash, &form.password) => {
            establish_session(state, jar, user.id).await
        }
        // Unknown email and wrong password intentionally share this branch.
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(ApiMessage::new(INCORRECT_CREDENTIALS)),
        )
            .into_response(),
    }
}

/// Issues a session token for the user and redirects to the index page.
/// Shared tail of the register and login flows.
async fn establish_session(state: AppState, jar: CookieJar, user_id: Uuid) -> Response {
    match auth::issue_session_token(user_id, &state.config.session_secret) {
        Ok(token) => (jar.add(auth::session_cookie(token)), Redirect::to("/")).into_response(),
        Err(e) => {
            tracing::error!("session token error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// logout
///
/// [Public Route] Clears the session cookie and returns to the index page.
/// Idempotent: clearing an absent session is a no-op, so no authentication
/// is required.
#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "Session cleared, redirected to /"))
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (auth::remove_session_cookie(jar), Redirect::to("/"))
}

// --- Handlers: static pages & contact ---

/// about
///
/// [Public Route] Fixed-content about page payload.
#[utoipa::path(
    get,
    path = "/about",
    responses((status = 200, description = "About page", body = StaticPage))
)]
pub async fn about() -> Json<StaticPage> {
    Json(StaticPage {
        title: "About".to_string(),
        body: "Inkpot is a small multi-user blog: read what others have written, \
               sign up to publish your own posts, and join the conversation in \
               the comments."
            .to_string(),
    })
}

/// contact_page
///
/// [Public Route] Form page payload for the contact form, consuming any
/// pending flash message (e.g. the post-submission confirmation).
#[utoipa::path(
    get,
    path = "/contact",
    responses((status = 200, description = "Contact form page", body = FormPage))
)]
pub async fn contact_page(jar: CookieJar) -> (CookieJar, Json<FormPage>) {
    let (jar, flash) = flash::take_flash(jar);
    (jar, Json(FormPage { flash }))
}

/// submit_contact
///
/// [Public Route] Relays a contact-form submission by email.
///
/// The relay call blocks this request; a relay failure surfaces as a generic
/// server error with no retry, and no flash is set.
#[utoipa::path(
    post,
    path = "/contact",
    request_body(content = ContactForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Message relayed, redirected to /contact"),
        (status = 422, description = "Validation failure"),
        (status = 500, description = "Mail relay failure")
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ContactForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        return validation_failure(errors);
    }

    match state
        .mailer
        .send_contact_message(&form.name, &form.email, &form.phone, &form.message)
        .await
    {
        Ok(()) => flash_redirect(jar, CONTACT_CONFIRMATION_FLASH, "/contact"),
        Err(e) => {
            tracing::error!("contact mail relay error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// --- Handlers: authenticated post management ---

/// new_post_page
///
/// [Authenticated Route] Empty form payload for authoring a new post.
#[utoipa::path(
    get,
    path = "/new-post",
    responses((status = 200, description = "Blank post form", body = PostForm))
)]
pub async fn new_post_page(_user: AuthUser) -> Json<PostForm> {
    Json(PostForm::default())
}

/// create_post
///
/// [Authenticated Route] Handles the submission of a new post. The author is
/// taken from the authenticated session, never from the form.
#[utoipa::path(
    post,
    path = "/new-post",
    request_body(content = PostForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created, redirected to /"),
        (status = 409, description = "Duplicate title", body = ApiMessage),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn create_post(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Form(form): Form<PostForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        return validation_failure(errors);
    }

    match state.repo.create_post(user_id, &form).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(RepositoryError::Duplicate(_)) => (
            StatusCode::CONFLICT,
            Json(ApiMessage::new(DUPLICATE_TITLE_MESSAGE)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("create_post error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// edit_post_page
///
/// [Authenticated Route] Prefilled form payload for editing an existing post.
///
/// *Authorization*: **Owner-Only**. A missing post is 404; an existing post
/// whose stored author is someone else is 403, even for a logged-in user.
/// The check runs on GET too, so non-owners cannot reach the edit form at all.
#[utoipa::path(
    get,
    path = "/edit-post/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Prefilled post form", body = PostForm),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such post")
    )
)]
pub async fn edit_post_page(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostForm>, StatusCode> {
    let post = state
        .repo
        .get_post(post_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    if post.author_id != user_id {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(Json(PostForm {
        title: post.title,
        subtitle: post.subtitle,
        img_url: post.img_url,
        body: post.body,
    }))
}

/// edit_post
///
/// [Authenticated Route] Applies an edit to the caller's own post.
///
/// *Authorization*: the same Owner-Only check as the GET, re-run here, and
/// backed up by the owner-scoped UPDATE predicate in the repository.
#[utoipa::path(
    post,
    path = "/edit-post/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body(content = PostForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated, redirected to /post/{id}"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such post"),
        (status = 409, description = "Duplicate title", body = ApiMessage),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn edit_post(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Form(form): Form<PostForm>,
) -> Response {
    let post = match state.repo.get_post(post_id).await {
        Some(post) => post,
        None => return StatusCode::NOT_FOUND.into_response(),
    };

    if post.author_id != user_id {
        return StatusCode::FORBIDDEN.into_response();
    }

    if let Err(errors) = form.validate() {
        return validation_failure(errors);
    }

    match state.repo.update_post(post_id, user_id, &form).await {
        Ok(Some(updated)) => Redirect::to(&format!("/post/{}", updated.id)).into_response(),
        // The row vanished between the ownership check and the update.
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(RepositoryError::Duplicate(_)) => (
            StatusCode::CONFLICT,
            Json(ApiMessage::new(DUPLICATE_TITLE_MESSAGE)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("update_post error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// delete_post
///
/// [Authenticated Route] Deletes the caller's own post. Dependent comments
/// are removed by the storage layer's cascade.
///
/// *Authorization*: **Owner-Only**, with the same 404/403 distinction as
/// edit, and the owner-scoped DELETE predicate underneath.
#[utoipa::path(
    get,
    path = "/delete/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 303, description = "Deleted, redirected to /"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such post")
    )
)]
pub async fn delete_post(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Response {
    let post = match state.repo.get_post(post_id).await {
        Some(post) => post,
        None => return StatusCode::NOT_FOUND.into_response(),
    };

    if post.author_id != user_id {
        return StatusCode::FORBIDDEN.into_response();
    }

    if state.repo.delete_post(post_id, user_id).await {
        Redirect::to("/").into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
