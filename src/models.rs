use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::age::humanize;
use crate::error::Result;
use crate::status::{normalize, BuildStatus};
use crate::url_builder::BuildPath;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub repository: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub slug: String,
    pub provider: Provider,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuiltFrom {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub log_url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn status(&self) -> BuildStatus {
        normalize(self.state.as_deref())
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.command.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub id: String,
    pub number: u64,
    pub message: String,
    pub branch: String,
    pub commit: String,
    #[serde(default)]
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub rebuilt_from: Option<RebuiltFrom>,
    pub pipeline: Pipeline,
    pub url: String,
    pub web_url: String,
    #[serde(default)]
    pub jobs: Vec<JobRecord>,
}

impl BuildRecord {
    pub fn status(&self) -> BuildStatus {
        normalize(self.state.as_deref())
    }

    /// The organization comes from the stored api url, the pipeline and
    /// number from the record itself.
    pub fn identity(&self) -> Result<BuildPath> {
        let parsed = BuildPath::parse(&self.url)?;
        Ok(BuildPath {
            org_slug: parsed.org_slug,
            pipeline_slug: self.pipeline.slug.clone(),
            build_number: self.number,
            job_id: None,
        })
    }

    pub fn is_retry(&self) -> bool {
        self.rebuilt_from.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPayload {
    #[serde(default)]
    pub content: String,
    pub size: u64,
}

impl LogPayload {
    /// An empty log means the job has not produced output yet.
    pub fn is_pending(&self) -> bool {
        self.size == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub job: JobRecord,
    pub status: BuildStatus,
    pub display_name: String,
    pub elapsed: String,
}

impl JobView {
    pub fn new(job: JobRecord) -> Self {
        let elapsed = match (job.started_at, job.finished_at) {
            (started, Some(finished)) => humanize(finished - started.unwrap_or(finished)),
            (Some(_), None) => "In Progress".to_string(),
            (None, None) => "Pending".to_string(),
        };
        JobView {
            status: job.status(),
            display_name: job.display_name().to_string(),
            elapsed,
            job,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildView {
    pub build: BuildRecord,
    pub status: BuildStatus,
    pub jobs: Vec<JobView>,
}

impl BuildView {
    pub fn new(build: BuildRecord) -> Self {
        let jobs = build.jobs.iter().cloned().map(JobView::new).collect();
        BuildView {
            status: build.status(),
            build,
            jobs,
        }
    }
}
