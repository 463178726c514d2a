//! Translation record administration: creation, patching, the approval
//! workflow and the delete protection rules.

use crate::error::{ServiceError, ServiceResult};
use crate::i18n::RequestValidator;
use crate::keys::derive_key;
use crate::store::{Database, NewTranslation, TranslationContext, TranslationRecord};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::info;

/// Approved records used more than this many times cannot be deleted.
const PROTECTED_USAGE_THRESHOLD: i64 = 100;

/// Fields for creating a translation record by hand (admin path; the
/// resolver creates its own records on cache misses).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTranslation {
    pub original: String,
    pub destination: String,
    pub language_code: String,
    #[serde(default)]
    pub context: Option<TranslationContext>,
}

/// Partial patch for an existing record. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslationPatch {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub context: Option<TranslationContext>,
}

#[derive(Clone)]
pub struct TranslationLifecycle {
    db: Database,
}

impl TranslationLifecycle {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn get(&self, id: i64) -> ServiceResult<TranslationRecord> {
        self.db
            .get_translation(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("translation {} not found", id)))
    }

    /// Create a record explicitly. Rejects a pre-existing identical
    /// (text, language) pair with a conflict.
    pub fn create(&self, request: CreateTranslation) -> ServiceResult<TranslationRecord> {
        RequestValidator::validate_translation(
            &request.original,
            &request.destination,
            &request.language_code,
        )
        .into_result()?;

        let new = NewTranslation {
            key: derive_key(&request.original, &request.language_code),
            original: request.original,
            destination: request.destination,
            language_code: request.language_code,
            context: request.context,
        };

        let (record, created) = self.db.create_translation(&new)?;
        if !created {
            return Err(ServiceError::Conflict(format!(
                "translation for this text already exists in '{}'",
                record.language_code
            )));
        }
        Ok(record)
    }

    /// Patch destination and/or context on an existing record.
    pub fn update(&self, id: i64, patch: TranslationPatch) -> ServiceResult<TranslationRecord> {
        let record = self.get(id)?;

        let destination = patch.destination.unwrap_or(record.destination);
        let context = patch.context.or(record.context);

        RequestValidator::validate_translation(&record.original, &destination, &record.language_code)
            .into_result()?;

        self.db.update_translation(id, &destination, &context)?;
        self.get(id)
    }

    /// Approve a record exactly once. A second approval is rejected as a
    /// business-rule violation.
    pub fn approve(&self, id: i64, approved_by: &str) -> ServiceResult<TranslationRecord> {
        let record = self.get(id)?;

        if record.is_approved {
            return Err(ServiceError::BusinessRule(format!(
                "translation {} is already approved",
                id
            )));
        }

        self.db.approve_translation(id, approved_by)?;
        info!(id, approved_by, "approved translation");
        self.get(id)
    }

    /// Delete a record unless it is approved and heavily used, which
    /// protects well-established translations from accidental removal.
    pub fn delete(&self, id: i64) -> ServiceResult<()> {
        let record = self.get(id)?;

        if record.is_approved && record.usage_count > PROTECTED_USAGE_THRESHOLD {
            return Err(ServiceError::BusinessRule(format!(
                "translation {} is approved and in heavy use; refusing to delete",
                id
            )));
        }

        self.db.delete_translation(id)?;
        info!(id, "deleted translation");
        Ok(())
    }

    pub fn pending_approval(&self) -> ServiceResult<Vec<TranslationRecord>> {
        self.db.find_pending_approval()
    }

    /// Advisory quality score in [0, 100]: 50 base, +30 when approved, +20
    /// when used more than 10 times, +10 when used within the last 30 days.
    pub fn quality_score(record: &TranslationRecord) -> u8 {
        let mut score: i32 = 50;

        if record.is_approved {
            score += 30;
        }
        if record.usage_count > 10 {
            score += 20;
        }
        if let Some(last_used) = &record.last_used_at {
            if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(last_used) {
                if Utc::now().signed_duration_since(ts) <= Duration::days(30) {
                    score += 10;
                }
            }
        }

        score.clamp(0, 100) as u8
    }
}
