//! Translation resolver: the cache-first resolution path.
//!
//! A request moves through validation, language lookup, key derivation and a
//! cache probe. A hit bumps the usage counter and returns the cached
//! destination text; a miss calls the translate backend and persists the
//! result as a new unapproved record. Approval never gates serving: an
//! unapproved record is still a cache hit.

use crate::backend::{TranslateBackend, AUTO_SOURCE};
use crate::config::MAX_BATCH_SIZE;
use crate::error::{ServiceError, ServiceResult};
use crate::i18n::{RequestValidator, TranslationMetrics};
use crate::keys::derive_key;
use crate::store::{Database, NewTranslation, TranslationContext};
use serde::Serialize;
use tracing::debug;

/// Outcome of a single resolution.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub translated_text: String,
    pub from_cache: bool,
}

/// One item of a batch outcome, keyed back to its input text.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub text: String,
    pub translated_text: String,
    pub from_cache: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResolution {
    pub translations: Vec<BatchItem>,
}

#[derive(Clone)]
pub struct TranslationResolver<B: TranslateBackend> {
    db: Database,
    backend: B,
}

impl<B: TranslateBackend> TranslationResolver<B> {
    pub fn new(db: Database, backend: B) -> Self {
        Self { db, backend }
    }

    /// Resolve one text into the target language, cache-first.
    ///
    /// `context` is stored on newly created records for audit but never
    /// influences the cache key: the same (text, language) pair shares one
    /// cache entry across all contexts.
    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
        context: Option<TranslationContext>,
    ) -> ServiceResult<Resolution> {
        RequestValidator::validate_translate_request(text, target_language).into_result()?;

        let language = self
            .db
            .get_language(&target_language.to_lowercase())?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("language '{}' not found", target_language))
            })?;

        let key = derive_key(text, &language.code);
        let metrics = TranslationMetrics::global();

        if let Some(record) = self.db.find_by_key_and_language(&key, &language.code)? {
            self.db.increment_usage(record.id)?;
            metrics.record_cache_hit();
            debug!(key = %key, language = %language.code, "cache hit");
            return Ok(Resolution {
                translated_text: record.destination,
                from_cache: true,
            });
        }

        metrics.record_cache_miss();
        let source = source_language.unwrap_or(AUTO_SOURCE);

        metrics.record_backend_call();
        let translated = self
            .backend
            .translate(text, source, &language.code)
            .await
            .map_err(|e| {
                metrics.record_backend_failure();
                ServiceError::Backend(e)
            })?;

        // A concurrent request may have created the record between our probe
        // and this insert; the store converges both writers on one row and
        // this request still answers with the text it translated.
        self.db.create_translation(&NewTranslation {
            key,
            original: text.to_string(),
            destination: translated.clone(),
            language_code: language.code.clone(),
            context,
        })?;

        debug!(language = %language.code, "cache miss translated and persisted");
        Ok(Resolution {
            translated_text: translated,
            from_cache: false,
        })
    }

    /// Resolve a batch of texts sequentially.
    ///
    /// The whole batch is rejected up front when empty, over the cap, or
    /// when the target language is unknown. After that, a failing item
    /// degrades to echoing its original text instead of failing the batch;
    /// output order always matches input order.
    pub async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
        source_language: Option<&str>,
    ) -> ServiceResult<BatchResolution> {
        if texts.is_empty() {
            return Err(ServiceError::Validation(vec![
                "texts must not be empty".to_string(),
            ]));
        }
        if texts.len() > MAX_BATCH_SIZE {
            return Err(ServiceError::BusinessRule(format!(
                "batch size {} exceeds the maximum of {}",
                texts.len(),
                MAX_BATCH_SIZE
            )));
        }

        // Unknown target fails the whole batch before any backend call.
        self.db
            .get_language(&target_language.to_lowercase())?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("language '{}' not found", target_language))
            })?;

        let mut translations = Vec::with_capacity(texts.len());
        for text in texts {
            match self
                .translate(text, target_language, source_language, None)
                .await
            {
                Ok(resolution) => translations.push(BatchItem {
                    text: text.clone(),
                    translated_text: resolution.translated_text,
                    from_cache: resolution.from_cache,
                }),
                Err(e) => {
                    // Echo the original so one bad item never sinks the batch.
                    debug!("batch item failed, echoing original: {}", e);
                    TranslationMetrics::global().record_batch_fallback();
                    translations.push(BatchItem {
                        text: text.clone(),
                        translated_text: text.clone(),
                        from_cache: false,
                    });
                }
            }
        }

        Ok(BatchResolution { translations })
    }
}
