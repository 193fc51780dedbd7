use inkpot::{
    models::PostForm,
    repository::{PostgresRepository, Repository, RepositoryError},
};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// --- Test Context and Setup ---
//
// These tests exercise the real Postgres implementation and therefore need a
// live database. They skip (rather than fail) when DATABASE_URL is unset, so
// the rest of the suite runs without infrastructure.

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Option<Self> {
        dotenv::dotenv().ok();

        let Ok(db_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping repository integration test");
            return None;
        };

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        Some(DbTestContext { pool })
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// Registers a user with a unique email so repeated runs never collide.
async fn create_test_user(repo: &PostgresRepository, name: &str) -> inkpot::models::User {
    let email = format!("{}-{}@test.com", name, Uuid::new_v4());
    repo.create_user(name, &email, "$argon2id$test-hash")
        .await
        .expect("Failed to create test user")
}

fn unique_post_form(tag: &str) -> PostForm {
    PostForm {
        title: format!("{} {}", tag, Uuid::new_v4()),
        subtitle: "Integration subtitle".to_string(),
        img_url: "https://example.com/cover.jpg".to_string(),
        body: "Integration body".to_string(),
    }
}

// --- Tests ---

#[test]
async fn test_create_user_rejects_duplicate_email() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();

    let user = create_test_user(&repo, "dup-email").await;

    let second = repo
        .create_user("Impostor", &user.email, "$argon2id$other-hash")
        .await;

    assert!(matches!(second, Err(RepositoryError::Duplicate("email"))));

    // The original row is untouched.
    let fetched = repo.get_user_by_email(&user.email).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.name, "dup-email");
}

#[test]
async fn test_post_lifecycle_with_owner_scoping() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();

    let owner = create_test_user(&repo, "owner").await;
    let stranger = create_test_user(&repo, "stranger").await;

    // Create
    let form = unique_post_form("Lifecycle");
    let post = repo.create_post(owner.id, &form).await.unwrap();
    assert_eq!(post.author_id, owner.id);

    // Read back: the author name is joined in.
    let fetched = repo.get_post(post.id).await.unwrap();
    assert_eq!(fetched.author_name.as_deref(), Some("owner"));

    // Update by a stranger matches no row.
    let foreign_edit = repo
        .update_post(post.id, stranger.id, &unique_post_form("Hijack"))
        .await
        .unwrap();
    assert!(foreign_edit.is_none());

    // Update by the owner succeeds and bumps updated_at.
    let new_form = unique_post_form("Edited");
    let updated = repo
        .update_post(post.id, owner.id, &new_form)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, new_form.title);
    assert!(updated.updated_at >= updated.created_at);

    // Delete by a stranger removes nothing.
    assert!(!repo.delete_post(post.id, stranger.id).await);
    assert!(repo.get_post(post.id).await.is_some());

    // Delete by the owner removes the row.
    assert!(repo.delete_post(post.id, owner.id).await);
    assert!(repo.get_post(post.id).await.is_none());
}

#[test]
async fn test_duplicate_title_rejected_by_constraint() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();

    let author = create_test_user(&repo, "titles").await;
    let form = unique_post_form("Unique Title");

    repo.create_post(author.id, &form).await.unwrap();
    let second = repo.create_post(author.id, &form).await;

    assert!(matches!(second, Err(RepositoryError::Duplicate("title"))));
}

#[test]
async fn test_comments_join_author_and_order_chronologically() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();

    let author = create_test_user(&repo, "commenter").await;
    let post = repo
        .create_post(author.id, &unique_post_form("Commented"))
        .await
        .unwrap();

    let first = repo
        .add_comment(post.id, author.id, "first!")
        .await
        .unwrap();
    assert_eq!(first.author_name.as_deref(), Some("commenter"));

    repo.add_comment(post.id, author.id, "second").await.unwrap();

    let comments = repo.get_comments(post.id).await;
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].body, "first!");
    assert_eq!(comments[1].body, "second");
}

#[test]
async fn test_deleting_post_cascades_comments() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();

    let author = create_test_user(&repo, "cascade").await;
    let post = repo
        .create_post(author.id, &unique_post_form("Doomed"))
        .await
        .unwrap();

    repo.add_comment(post.id, author.id, "soon gone")
        .await
        .unwrap();

    assert!(repo.delete_post(post.id, author.id).await);

    // The dependent comment rows went with the post.
    assert!(repo.get_comments(post.id).await.is_empty());

    let orphan_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post.id)
            .fetch_one(&ctx.pool)
            .await
            .unwrap();
    assert_eq!(orphan_count, 0);
}
