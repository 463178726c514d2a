//! End-to-end tests exercising the full resolution path: registry, cache
//! store, resolver, lifecycle and the HTTP backend client together.

use anyhow::Result;
use tempfile::TempDir;
use translation_cache::backend::{Backend, HttpBackend, StubBackend, TranslateBackend};
use translation_cache::error::ServiceError;
use translation_cache::i18n::{LanguageRegistry, NewLanguage};
use translation_cache::keys::derive_key;
use translation_cache::lifecycle::{CreateTranslation, TranslationLifecycle};
use translation_cache::resolver::TranslationResolver;
use translation_cache::store::Database;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn setup() -> (TempDir, Database) {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("translations.db");
    let db = Database::new(db_path.to_str().expect("path")).expect("open db");
    (dir, db)
}

fn seed_languages(db: &Database) {
    let registry = LanguageRegistry::new(db.clone());
    registry
        .create(NewLanguage {
            code: "en".to_string(),
            name: "English".to_string(),
            local_name: Some("English".to_string()),
            flag: None,
            status: None,
            is_default: true,
            metadata: None,
        })
        .expect("create en");
    registry
        .create(NewLanguage {
            code: "es".to_string(),
            name: "Spanish".to_string(),
            local_name: Some("Español".to_string()),
            flag: None,
            status: None,
            is_default: false,
            metadata: None,
        })
        .expect("create es");
}

// ==================== Full Resolution Flow ====================

#[tokio::test]
async fn test_resolve_persist_and_serve_from_cache() {
    let (_dir, db) = setup();
    seed_languages(&db);
    let resolver = TranslationResolver::new(db.clone(), StubBackend);

    let miss = resolver
        .translate("Welcome", "es", None, None)
        .await
        .expect("miss");
    assert_eq!(miss.translated_text, "[ES] Welcome");
    assert!(!miss.from_cache);

    let hit = resolver
        .translate("Welcome", "es", None, None)
        .await
        .expect("hit");
    assert_eq!(hit.translated_text, "[ES] Welcome");
    assert!(hit.from_cache);

    // The persisted record starts unapproved with one recorded use.
    let record = db
        .find_by_key_and_language(&derive_key("Welcome", "es"), "es")
        .expect("find")
        .expect("record exists");
    assert!(!record.is_approved);
    assert_eq!(record.usage_count, 1);
}

#[tokio::test]
async fn test_usage_count_grows_monotonically_across_requests() {
    let (_dir, db) = setup();
    seed_languages(&db);
    let resolver = TranslationResolver::new(db.clone(), StubBackend);

    for _ in 0..5 {
        resolver
            .translate("Welcome", "es", None, None)
            .await
            .expect("resolve");
    }

    let record = db
        .find_by_key_and_language(&derive_key("Welcome", "es"), "es")
        .expect("find")
        .expect("record exists");
    assert_eq!(record.usage_count, 4);
    assert!(record.last_used_at.is_some());
}

#[tokio::test]
async fn test_same_text_different_languages_are_distinct_entries() {
    let (_dir, db) = setup();
    seed_languages(&db);
    let resolver = TranslationResolver::new(db.clone(), StubBackend);

    resolver
        .translate("Welcome", "es", None, None)
        .await
        .expect("es");
    resolver
        .translate("Welcome", "en", None, None)
        .await
        .expect("en");

    assert_eq!(db.count_by_language("es").expect("count"), 1);
    assert_eq!(db.count_by_language("en").expect("count"), 1);
    assert_ne!(derive_key("Welcome", "es"), derive_key("Welcome", "en"));
}

// ==================== Approval Lifecycle ====================

#[tokio::test]
async fn test_resolver_created_record_can_be_approved_once() {
    let (_dir, db) = setup();
    seed_languages(&db);
    let resolver = TranslationResolver::new(db.clone(), StubBackend);
    let lifecycle = TranslationLifecycle::new(db.clone());

    resolver
        .translate("Welcome", "es", None, None)
        .await
        .expect("resolve");
    let record = db
        .find_by_key_and_language(&derive_key("Welcome", "es"), "es")
        .expect("find")
        .expect("record exists");

    let approved = lifecycle
        .approve(record.id, "reviewer@example.com")
        .expect("approve");
    assert!(approved.is_approved);
    assert_eq!(approved.approved_by.as_deref(), Some("reviewer@example.com"));
    assert!(approved.approved_at.is_some());

    let err = lifecycle
        .approve(record.id, "someone-else")
        .expect_err("second approval must fail");
    assert!(matches!(err, ServiceError::BusinessRule(_)));
}

#[tokio::test]
async fn test_approved_heavily_used_record_is_protected_from_deletion() {
    let (_dir, db) = setup();
    seed_languages(&db);
    let resolver = TranslationResolver::new(db.clone(), StubBackend);
    let lifecycle = TranslationLifecycle::new(db.clone());

    resolver
        .translate("Welcome", "es", None, None)
        .await
        .expect("resolve");
    let record = db
        .find_by_key_and_language(&derive_key("Welcome", "es"), "es")
        .expect("find")
        .expect("record exists");

    lifecycle.approve(record.id, "reviewer").expect("approve");
    for _ in 0..101 {
        db.increment_usage(record.id).expect("increment");
    }

    let err = lifecycle.delete(record.id).expect_err("protected");
    assert!(matches!(err, ServiceError::BusinessRule(_)));

    // The record survives and continues to be served.
    let hit = resolver
        .translate("Welcome", "es", None, None)
        .await
        .expect("hit");
    assert!(hit.from_cache);
}

// ==================== Registry Invariants ====================

#[tokio::test]
async fn test_default_swap_keeps_exactly_one_default() {
    let (_dir, db) = setup();
    seed_languages(&db);
    let registry = LanguageRegistry::new(db.clone());

    registry
        .create(NewLanguage {
            code: "fr".to_string(),
            name: "French".to_string(),
            local_name: None,
            flag: None,
            status: None,
            is_default: true,
            metadata: None,
        })
        .expect("create fr as default");

    let default = db
        .default_language()
        .expect("query")
        .expect("one default exists");
    assert_eq!(default.code, "fr");

    let defaults: usize = registry
        .list_active()
        .expect("list")
        .iter()
        .filter(|l| l.is_default)
        .count();
    assert_eq!(defaults, 1);
}

#[tokio::test]
async fn test_language_with_cached_translations_cannot_be_deleted() {
    let (_dir, db) = setup();
    seed_languages(&db);
    let resolver = TranslationResolver::new(db.clone(), StubBackend);
    let registry = LanguageRegistry::new(db.clone());

    resolver
        .translate("Welcome", "es", None, None)
        .await
        .expect("resolve");

    let has_translations = db.count_by_language("es").expect("count") > 0;
    let err = registry
        .delete("es", has_translations)
        .expect_err("delete must be blocked");
    assert!(matches!(err, ServiceError::BusinessRule(_)));
}

// ==================== Batch Flow ====================

#[tokio::test]
async fn test_batch_mixes_cache_hits_and_backend_calls() {
    let (_dir, db) = setup();
    seed_languages(&db);
    let resolver = TranslationResolver::new(db.clone(), StubBackend);

    // Warm the cache with one of the batch items.
    resolver
        .translate("Warm", "es", None, None)
        .await
        .expect("warm");

    let texts = vec!["Warm".to_string(), "Cold".to_string()];
    let batch = resolver
        .translate_batch(&texts, "es", None)
        .await
        .expect("batch");

    assert_eq!(batch.translations.len(), 2);
    assert!(batch.translations[0].from_cache);
    assert!(!batch.translations[1].from_cache);
    assert_eq!(batch.translations[1].translated_text, "[ES] Cold");
}

#[tokio::test]
async fn test_batch_failure_isolated_with_http_backend() {
    let (_dir, db) = setup();
    seed_languages(&db);

    let server = MockServer::start().await;
    // The backend fails on the text "bad" and succeeds otherwise.
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(|req: &Request| {
            let body: serde_json::Value =
                serde_json::from_slice(&req.body).unwrap_or_default();
            if body["text"] == "bad" {
                ResponseTemplate::new(400)
            } else {
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "translated_text": format!("es:{}", body["text"].as_str().unwrap_or(""))
                }))
            }
        })
        .mount(&server)
        .await;

    let backend = HttpBackend::new(format!("{}/translate", server.uri()), None);
    let resolver = TranslationResolver::new(db, backend);

    let texts = vec!["good".to_string(), "bad".to_string(), "fine".to_string()];
    let batch = resolver
        .translate_batch(&texts, "es", None)
        .await
        .expect("batch");

    assert_eq!(batch.translations.len(), 3);
    assert_eq!(batch.translations[0].translated_text, "es:good");
    assert_eq!(batch.translations[1].translated_text, "bad");
    assert!(!batch.translations[1].from_cache);
    assert_eq!(batch.translations[2].translated_text, "es:fine");
}

// ==================== HTTP Backend Integration ====================

#[tokio::test]
async fn test_http_backend_result_is_cached() -> Result<()> {
    let (_dir, db) = setup();
    seed_languages(&db);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "translated_text": "Bienvenido" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(format!("{}/translate", server.uri()), None);
    let resolver = TranslationResolver::new(db, backend);

    let first = resolver.translate("Welcome", "es", None, None).await?;
    assert_eq!(first.translated_text, "Bienvenido");
    assert!(!first.from_cache);

    // Served from cache, so the mock's expect(1) holds.
    let second = resolver.translate("Welcome", "es", None, None).await?;
    assert_eq!(second.translated_text, "Bienvenido");
    assert!(second.from_cache);

    Ok(())
}

#[tokio::test]
async fn test_backend_failure_leaves_nothing_cached() {
    let (_dir, db) = setup();
    seed_languages(&db);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(format!("{}/translate", server.uri()), None);
    let resolver = TranslationResolver::new(db.clone(), backend);

    let err = resolver
        .translate("Welcome", "es", None, None)
        .await
        .expect_err("backend failure");
    assert!(matches!(err, ServiceError::Backend(_)));

    let cached = db
        .find_by_key_and_language(&derive_key("Welcome", "es"), "es")
        .expect("query");
    assert!(cached.is_none());
}

// ==================== Config-Selected Backend ====================

#[tokio::test]
async fn test_stub_backend_selected_without_url() {
    let config = translation_cache::config::Config {
        database_path: ":memory:".to_string(),
        backend_url: None,
        backend_api_key: None,
        port: 8080,
    };
    let backend = Backend::from_config(&config);

    let out = backend
        .translate("Hello", "auto", "es")
        .await
        .expect("stub translate");
    assert_eq!(out, "[ES] Hello");
}

// ==================== Admin Create vs Resolver ====================

#[tokio::test]
async fn test_manual_create_collides_with_resolver_entry() {
    let (_dir, db) = setup();
    seed_languages(&db);
    let resolver = TranslationResolver::new(db.clone(), StubBackend);
    let lifecycle = TranslationLifecycle::new(db);

    resolver
        .translate("Welcome", "es", None, None)
        .await
        .expect("resolve");

    // The admin path refuses to overwrite the cached entry.
    let err = lifecycle
        .create(CreateTranslation {
            original: "Welcome".to_string(),
            destination: "Bienvenido".to_string(),
            language_code: "es".to_string(),
            context: None,
        })
        .expect_err("duplicate");
    assert!(matches!(err, ServiceError::Conflict(_)));
}
