//! Integration tests for the image asset pointer of content entities.

use folio_core::content::ContentKind;
use folio_db::models::content::ContentFields;
use folio_db::models::image_asset::UpsertImageAsset;
use folio_db::repositories::{ContentRepo, ImageAssetRepo};
use sqlx::PgPool;

async fn new_post(pool: &PgPool, slug: &str) -> i64 {
    let fields = ContentFields {
        title: slug.to_string(),
        body: "body".to_string(),
        slug: slug.to_string(),
        tags: Vec::new(),
        excerpt: String::new(),
        meta_description: String::new(),
        meta_keywords: None,
        project_url: None,
        repo_url: None,
        technologies: Vec::new(),
        is_featured: false,
        sort_order: 0,
    };
    ContentRepo::create(pool, ContentKind::Post, &fields)
        .await
        .unwrap()
        .id
}

fn asset(entity_id: i64, hash: &str) -> UpsertImageAsset {
    UpsertImageAsset {
        entity_id,
        stored_path: format!("posts/{hash}.jpg"),
        width: 1200,
        height: 800,
        content_hash: hash.to_string(),
        byte_size: 4096,
        mime_type: "image/jpeg".to_string(),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_first_replace_has_no_previous(pool: PgPool) {
    let post = new_post(&pool, "first").await;

    let (current, previous) = ImageAssetRepo::replace(&pool, &asset(post, "aaa"))
        .await
        .unwrap();
    assert!(previous.is_none());
    assert_eq!(current.stored_path, "posts/aaa.jpg");

    let found = ImageAssetRepo::find_by_entity(&pool, post).await.unwrap();
    assert_eq!(found, Some(current));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_replace_returns_displaced_asset(pool: PgPool) {
    let post = new_post(&pool, "second").await;
    ImageAssetRepo::replace(&pool, &asset(post, "old")).await.unwrap();

    let (current, previous) = ImageAssetRepo::replace(&pool, &asset(post, "new"))
        .await
        .unwrap();
    assert_eq!(previous.map(|p| p.content_hash), Some("old".to_string()));
    assert_eq!(current.content_hash, "new");

    // Still exactly one row per entity.
    let rows = ImageAssetRepo::list_for_entities(&pool, &[post]).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_is_path_shared_ignores_own_row(pool: PgPool) {
    let a = new_post(&pool, "a").await;
    let b = new_post(&pool, "b").await;
    ImageAssetRepo::replace(&pool, &asset(a, "same")).await.unwrap();

    assert!(!ImageAssetRepo::is_path_shared(&pool, "posts/same.jpg", a).await.unwrap());

    ImageAssetRepo::replace(&pool, &asset(b, "same")).await.unwrap();
    assert!(ImageAssetRepo::is_path_shared(&pool, "posts/same.jpg", a).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_zero_dimensions_rejected(pool: PgPool) {
    let post = new_post(&pool, "zero").await;
    let input = UpsertImageAsset {
        width: 0,
        ..asset(post, "zero")
    };
    let err = ImageAssetRepo::replace(&pool, &input).await.unwrap_err();
    assert_eq!(
        err.as_database_error().and_then(|e| e.constraint()),
        Some("chk_image_assets_dimensions")
    );
}
