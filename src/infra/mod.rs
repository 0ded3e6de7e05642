//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: the platform API client,
//! the log stream transport, and config file access.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod cloud_controller;
pub mod config;
pub mod log_stream;
