//! Buildkite dashboard: typed clients for the Buildkite and TravisCI apis behind a proxy,
//! and the services that page through builds, show one build and fetch job
//! logs for a project.

pub mod age;
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod models;
pub mod reporting;
pub mod services;
pub mod status;
pub mod travis;
pub mod url_builder;
pub mod views;

pub use client::{BuildkiteApi, RestClient};
pub use error::{DashError, Result};
pub use services::{BuildListService, LogService, SingleBuildService};
pub use travis::{TravisCiApi, TravisClient};
