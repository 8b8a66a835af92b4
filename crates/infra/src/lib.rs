//! Infrastructure layer: storage adapters, the admin form, scheduled jobs
//! and the stock reconciler.

pub mod admin_form;
pub mod catalog;
pub mod command_dispatcher;
pub mod config;
pub mod directives;
pub mod form_token;
pub mod jobs;
pub mod meta_store;
pub mod reconciler;

#[cfg(feature = "postgres")]
pub mod pg;
