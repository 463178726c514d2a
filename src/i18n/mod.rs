//! Internationalization (i18n) domain module.
//!
//! - `registry`: language registration, lookup, default-language handling
//! - `validator`: structural/business validation for incoming requests
//! - `metrics`: cache/backend observability counters

mod metrics;
mod registry;
mod validator;

pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguagePatch, LanguageRegistry, NewLanguage};
pub use validator::{RequestValidator, ValidationReport};
