use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Represents a registered account stored in the `users` table.
/// The password hash is an Argon2id PHC string: it is written once at
/// registration and never serialized back out to clients.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    // Unique at the storage layer.
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Post
///
/// Represents a blog post record from the `posts` table.
/// This is the primary data structure for the core application logic.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    // FK to users.id (Owner). Edit/delete compare against this field.
    pub author_id: Uuid,
    // Unique at the storage layer.
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub img_url: String,

    // Timestamp handling for database integration and JSON serialization.
    // `created_at` doubles as the displayed publication date.
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,

    // This field is loaded via a JOIN with `users` in the repository query.
    #[sqlx(default)]
    pub author_name: Option<String>,
}

/// Comment
///
/// Represents a comment record from the `comments` table, augmented with
/// the author's display name (a join operation) and a derived avatar URL.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    // Using BigInt (i64) for comment ID due to the high volume potential.
    pub id: i64,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    // This field is loaded via a JOIN in the repository query.
    #[sqlx(default)]
    pub author_name: Option<String>,
    // Derived, never stored. See `with_avatar`.
    #[sqlx(default)]
    pub author_avatar: Option<String>,
}

impl Comment {
    /// with_avatar
    ///
    /// Attaches a stable, unique avatar URL seeded by the author's UUID.
    /// Uses the DiceBear API so no image data needs to be stored or proxied.
    pub fn with_avatar(mut self) -> Self {
        self.author_avatar = Some(format!(
            "https://api.dicebear.com/7.x/avataaars/svg?seed={}",
            self.author_id
        ));
        self
    }
}

// --- Form Payloads (Input Schemas) ---
//
// Each form mirrors one HTML form on the site. Field rules produce the
// field-level messages that a 422 response carries back to the client.

/// RegisterForm
///
/// Input payload for the public registration endpoint (POST /register).
/// The plaintext password only exists between form decoding and hashing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct RegisterForm {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 8, max = 16, message = "Password must be 8 to 16 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords must match"))]
    pub confirm_password: String,
}

/// LoginForm
///
/// Input payload for POST /login. Presence-only validation: credential
/// checking happens against the stored hash, never field rules.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// PostForm
///
/// Input payload for creating a post (POST /new-post) and editing one
/// (POST /edit-post/{id}). Also the prefilled body returned by the
/// corresponding GET endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct PostForm {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Subtitle is required"))]
    pub subtitle: String,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub img_url: String,
    #[validate(length(min = 1, message = "Body is required"))]
    pub body: String,
}

/// CommentForm
///
/// Input payload for posting a new comment (POST /post/{id}).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "Comment text is required"))]
    pub body: String,
}

/// ContactForm
///
/// Input payload for the public contact endpoint (POST /contact). The four
/// fields become the plaintext mail body relayed to the configured receiver.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct ContactForm {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

// --- Page Payloads (Output Schemas) ---

/// PostPage
///
/// Output schema for the post detail view (GET /post/{id}): the post plus
/// its comments in chronological order, avatars attached.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostPage {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// FormPage
///
/// Output schema for form page GETs (/register, /login, /contact). Carries
/// the one-shot flash message left behind by a previous redirect, if any.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FormPage {
    pub flash: Option<String>,
}

/// StaticPage
///
/// Output schema for fixed-content pages (GET /about).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct StaticPage {
    pub title: String,
    pub body: String,
}

/// ApiMessage
///
/// Generic single-message response body, used for rejections that carry a
/// user-visible message (incorrect credentials, duplicate title).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
