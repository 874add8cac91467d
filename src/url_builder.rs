//! Parsing of stored Buildkite api urls of the shape
//! `.../organizations/{org}/pipelines/{pipeline}/builds/{number}[/jobs/{job}/...]`.
//!
//! Only the path segments are looked at. Hosts and query strings are not
//! validated.

use serde::Serialize;

use crate::error::{DashError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BuildPath {
    pub org_slug: String,
    pub pipeline_slug: String,
    pub build_number: u64,
    pub job_id: Option<String>,
}

impl BuildPath {
    pub fn new(org_slug: &str, pipeline_slug: &str, build_number: u64) -> Self {
        BuildPath {
            org_slug: org_slug.to_string(),
            pipeline_slug: pipeline_slug.to_string(),
            build_number,
            job_id: None,
        }
    }

    pub fn with_job(mut self, job_id: &str) -> Self {
        self.job_id = Some(job_id.to_string());
        self
    }

    pub fn parse(url: &str) -> Result<Self> {
        let malformed = || DashError::MalformedUrl(url.to_string());

        let path = url.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let start = segments
            .iter()
            .position(|s| *s == "organizations")
            .ok_or_else(malformed)?;

        let rest = &segments[start..];
        match rest {
            ["organizations", org, "pipelines", pipeline, "builds", number, tail @ ..] => {
                let build_number = number.parse().map_err(|_| malformed())?;
                let job_id = match tail {
                    [] => None,
                    ["jobs", job, ..] => Some(job.to_string()),
                    ["jobs"] => return Err(malformed()),
                    _ => None,
                };
                Ok(BuildPath {
                    org_slug: org.to_string(),
                    pipeline_slug: pipeline.to_string(),
                    build_number,
                    job_id,
                })
            }
            _ => Err(malformed()),
        }
    }

    /// Path of the build itself, relative to the api root.
    pub fn build_path(&self) -> String {
        format!(
            "organizations/{}/pipelines/{}/builds/{}",
            self.org_slug, self.pipeline_slug, self.build_number
        )
    }

    pub fn rebuild_path(&self) -> String {
        format!("{}/rebuild", self.build_path())
    }

    /// Path of the job log, when this path points at a job.
    pub fn log_path(&self) -> Option<String> {
        self.job_id
            .as_ref()
            .map(|job| format!("{}/jobs/{}/log", self.build_path(), job))
    }
}
