//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

use crate::domain::StartError;

pub mod app_start;
pub mod instances;
pub mod log_tail;
pub mod staging;

#[cfg(test)]
pub(crate) mod test_support;

/// Wrap a failed API call so the message names `app` and its recent-logs command.
pub(crate) fn request_failed(
    app: &str,
    action: &'static str,
    err: &anyhow::Error,
) -> anyhow::Error {
    StartError::RequestFailed {
        app: app.to_owned(),
        action,
        reason: format!("{err:#}"),
    }
    .into()
}
