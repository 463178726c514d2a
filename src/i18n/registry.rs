//! Language registry: the use-case layer over the languages table.
//!
//! Owns the conflict check on create, the default-language swap, and the
//! delete rules. The registry does not itself check whether translations
//! reference a language; the orchestrating layer passes that in.

use crate::error::{ServiceError, ServiceResult};
use crate::i18n::validator::RequestValidator;
use crate::store::{Database, Language, LanguageMetadata, LanguageStatus, Page, Pagination};
use serde::Deserialize;
use tracing::info;

/// Fields for registering a language.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLanguage {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub local_name: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub status: Option<LanguageStatus>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub metadata: Option<LanguageMetadata>,
}

/// Partial patch for an existing language. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguagePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub local_name: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub status: Option<LanguageStatus>,
    #[serde(default)]
    pub is_default: Option<bool>,
    #[serde(default)]
    pub metadata: Option<LanguageMetadata>,
}

#[derive(Clone)]
pub struct LanguageRegistry {
    db: Database,
}

impl LanguageRegistry {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a new language. Rejects duplicate codes with a conflict and
    /// swaps the default flag when requested.
    pub fn create(&self, new: NewLanguage) -> ServiceResult<Language> {
        RequestValidator::validate_language(&new.code, &new.name, new.local_name.as_deref())
            .into_result()?;

        let code = new.code.to_lowercase();
        if self.db.get_language(&code)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "language '{}' already registered",
                code
            )));
        }

        let language = Language {
            code: code.clone(),
            name: new.name,
            local_name: new.local_name,
            flag: new.flag,
            status: new.status.unwrap_or(LanguageStatus::Active),
            is_default: new.is_default,
            metadata: new.metadata,
        };

        self.db.insert_language(&language)?;
        info!(code = %code, is_default = language.is_default, "registered language");
        Ok(language)
    }

    pub fn get_by_code(&self, code: &str) -> ServiceResult<Language> {
        let code = code.to_lowercase();
        self.db
            .get_language(&code)?
            .ok_or_else(|| ServiceError::NotFound(format!("language '{}' not found", code)))
    }

    pub fn list_active(&self) -> ServiceResult<Vec<Language>> {
        self.db.list_active_languages()
    }

    pub fn list_paged(&self, pagination: Pagination) -> ServiceResult<Page<Language>> {
        self.db.list_languages_paged(pagination)
    }

    /// Apply a partial patch. The merged record is re-validated, and flipping
    /// `is_default` on swaps the previous default off.
    pub fn update(&self, code: &str, patch: LanguagePatch) -> ServiceResult<Language> {
        let mut language = self.get_by_code(code)?;

        if let Some(name) = patch.name {
            language.name = name;
        }
        if let Some(local_name) = patch.local_name {
            language.local_name = Some(local_name);
        }
        if let Some(flag) = patch.flag {
            language.flag = Some(flag);
        }
        if let Some(status) = patch.status {
            language.status = status;
        }
        if let Some(is_default) = patch.is_default {
            language.is_default = is_default;
        }
        if let Some(metadata) = patch.metadata {
            language.metadata = Some(metadata);
        }

        RequestValidator::validate_language(
            &language.code,
            &language.name,
            language.local_name.as_deref(),
        )
        .into_result()?;

        if !self.db.save_language(&language)? {
            return Err(ServiceError::NotFound(format!(
                "language '{}' not found",
                code
            )));
        }

        Ok(language)
    }

    /// Delete a language. The caller supplies `has_translations`; the
    /// registry refuses to drop the default language or one that is still
    /// referenced.
    pub fn delete(&self, code: &str, has_translations: bool) -> ServiceResult<()> {
        let language = self.get_by_code(code)?;

        if language.is_default {
            return Err(ServiceError::BusinessRule(
                "cannot delete the default language".to_string(),
            ));
        }
        if has_translations {
            return Err(ServiceError::BusinessRule(format!(
                "language '{}' still has translations",
                code
            )));
        }

        self.db.delete_language(&language.code)?;
        info!(code = %language.code, "deleted language");
        Ok(())
    }
}
