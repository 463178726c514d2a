pub mod backend;
pub mod config;
pub mod error;
pub mod i18n;
pub mod keys;
pub mod lifecycle;
pub mod resolver;
pub mod retry;
pub mod store;
pub mod web;
