use crate::models::{Comment, Post, PostForm, User};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// RepositoryError
///
/// Persistence failures the handlers care about. `Duplicate` surfaces the
/// storage layer's unique constraints (user email, post title) so the HTTP
/// layer can turn them into user-visible messages instead of a bare 500.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("a record with this {0} already exists")]
    Duplicate(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Maps a sqlx insert/update failure, promoting unique-constraint violations
/// on the named field to `RepositoryError::Duplicate`.
fn map_constraint_error(field: &'static str, e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Duplicate(field),
        _ => RepositoryError::Database(e),
    }
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the
/// core of the Repository Abstraction pattern, allowing the handlers to
/// interact with the data layer without knowing the specific implementation
/// (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's async task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Posts ---
    // Full listing, newest first, author names joined in.
    async fn get_posts(&self) -> Vec<Post>;
    async fn get_post(&self, id: Uuid) -> Option<Post>;
    // Insert; a duplicate title is rejected by the storage constraint.
    async fn create_post(&self, author_id: Uuid, form: &PostForm) -> Result<Post, RepositoryError>;
    // Owner-Only: updates only rows whose author_id matches. Returns Ok(None)
    // when the row is missing or owned by someone else.
    async fn update_post(
        &self,
        id: Uuid,
        author_id: Uuid,
        form: &PostForm,
    ) -> Result<Option<Post>, RepositoryError>;
    // Owner-Only: returns true only if a row was actually removed.
    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> bool;

    // --- Comments ---
    async fn get_comments(&self, post_id: Uuid) -> Vec<Comment>;
    async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> Result<Comment, RepositoryError>;

    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn get_user_by_email(&self, email: &str) -> Option<User>;
    // Insert; a duplicate email is rejected by the storage constraint.
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Shared SELECT column list for post queries: the author's display name is
// always joined in for rendering.
const POST_COLUMNS: &str = r#"
    p.id, p.author_id, p.title, p.subtitle, p.body, p.img_url,
    p.created_at, p.updated_at, u.name AS author_name
"#;

#[async_trait]
impl Repository for PostgresRepository {
    /// get_posts
    ///
    /// Retrieves every post for the index page, newest first.
    async fn get_posts(&self) -> Vec<Post> {
        let query = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN users u ON p.author_id = u.id
            ORDER BY p.created_at DESC
            "#
        );

        match sqlx::query_as::<_, Post>(&query).fetch_all(&self.pool).await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::error!("get_posts error: {:?}", e);
                vec![]
            }
        }
    }

    /// get_post
    ///
    /// Retrieval of a single post by ID. Also the basis of the handler-level
    /// ownership check: the caller compares `author_id` before edit/delete.
    async fn get_post(&self, id: Uuid) -> Option<Post> {
        let query = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN users u ON p.author_id = u.id
            WHERE p.id = $1
            "#
        );

        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_post error: {:?}", e);
                None
            })
    }

    /// create_post
    ///
    /// Inserts a new post owned by `author_id`. The unique index on `title`
    /// is the final arbiter of title collisions; the violation is surfaced as
    /// `RepositoryError::Duplicate("title")`.
    async fn create_post(&self, author_id: Uuid, form: &PostForm) -> Result<Post, RepositoryError> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, author_id, title, subtitle, body, img_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING id, author_id, title, subtitle, body, img_url, created_at, updated_at
            "#,
        )
        .bind(new_id)
        .bind(author_id)
        .bind(&form.title)
        .bind(&form.subtitle)
        .bind(&form.body)
        .bind(&form.img_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error("title", e))
    }

    /// update_post
    ///
    /// Updates a post only if the provided `author_id` matches the owner.
    /// The `WHERE id AND author_id` predicate is the **Owner-Only** check at
    /// the storage layer, backing up the handler's 403 logic.
    async fn update_post(
        &self,
        id: Uuid,
        author_id: Uuid,
        form: &PostForm,
    ) -> Result<Option<Post>, RepositoryError> {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = $3,
                subtitle = $4,
                body = $5,
                img_url = $6,
                updated_at = NOW()
            WHERE id = $1 AND author_id = $2
            RETURNING id, author_id, title, subtitle, body, img_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(author_id)
        .bind(&form.title)
        .bind(&form.subtitle)
        .bind(&form.body)
        .bind(&form.img_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_constraint_error("title", e))
    }

    /// delete_post
    ///
    /// Deletes a post only if the provided `author_id` matches the owner.
    /// Dependent comments go with it via the schema's ON DELETE CASCADE.
    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> bool {
        match sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_post error: {:?}", e);
                false
            }
        }
    }

    /// get_comments
    ///
    /// Retrieves all comments for a post in chronological order, with the
    /// author's display name joined in.
    async fn get_comments(&self, post_id: Uuid) -> Vec<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.post_id, c.author_id, c.body, c.created_at, u.name AS author_name
            FROM comments c
            JOIN users u ON c.author_id = u.id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_comments error: {:?}", e);
            vec![]
        })
    }

    /// add_comment
    ///
    /// Inserts a new comment and immediately joins with `users` to return the
    /// enriched `Comment` model in one round trip (CTE insert + join).
    async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> Result<Comment, RepositoryError> {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (post_id, author_id, body)
                VALUES ($1, $2, $3)
                RETURNING id, post_id, author_id, body, created_at
            )
            SELECT i.id, i.post_id, i.author_id, i.body, i.created_at, u.name AS author_name
            FROM inserted i
            JOIN users u ON i.author_id = u.id
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::Database)
    }

    /// get_user
    ///
    /// Retrieves a user row by primary key. Used by the session extractor on
    /// every authenticated request.
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user error: {:?}", e);
            None
        })
    }

    /// get_user_by_email
    ///
    /// Retrieves a user row by login email, for login and for the
    /// registration duplicate pre-check.
    async fn get_user_by_email(&self, email: &str) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user_by_email error: {:?}", e);
            None
        })
    }

    /// create_user
    ///
    /// Inserts a new account. `password_hash` must already be a PHC string;
    /// plaintext never reaches this layer. The unique index on `email`
    /// surfaces as `RepositoryError::Duplicate("email")`.
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(new_id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error("email", e))
    }
}
