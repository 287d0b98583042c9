//! Read-only upstream staffing API: job requirements keyed by job id, with an
//! optional Redis cache in front.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::job::detect_technical_focus;
use crate::models::{JobRequirement, SeniorityLevel};

#[derive(Debug, Error)]
pub enum JobSourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),
}

#[async_trait]
pub trait JobSource: Send + Sync {
    /// `Ok(None)` when the upstream has no such job.
    async fn job_requirement(&self, job_id: i64) -> Result<Option<JobRequirement>, JobSourceError>;
}

/// Resolves the requirement for a candidate's job, falling back to the
/// generic requirement on absence or failure.
pub async fn resolve_job(source: &dyn JobSource, job_id: Option<i64>) -> JobRequirement {
    let Some(job_id) = job_id else {
        return JobRequirement::generic();
    };
    match source.job_requirement(job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            warn!(job_id, "job not found upstream, using generic requirement");
            JobRequirement::generic()
        }
        Err(e) => {
            warn!(job_id, error = %e, "job source failed, using generic requirement");
            JobRequirement::generic()
        }
    }
}

/// Used when no upstream is configured.
pub struct NoJobSource;

#[async_trait]
impl JobSource for NoJobSource {
    async fn job_requirement(&self, _job_id: i64) -> Result<Option<JobRequirement>, JobSourceError> {
        Ok(None)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP source
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpstreamJob {
    job_id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    client_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpstreamJobSkill {
    skill_name: String,
    #[serde(default)]
    is_mandatory: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpstreamClient {
    #[serde(default)]
    client_name: Option<String>,
    #[serde(default)]
    industry: Option<String>,
}

pub struct HttpJobSource {
    client: Client,
    base_url: String,
}

impl HttpJobSource {
    pub fn new(base_url: String) -> Result<Self, JobSourceError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        query: &[(&str, i64)],
    ) -> Result<Option<T>, JobSourceError> {
        let response = self
            .client
            .get(format!("{}{endpoint}", self.base_url))
            .query(query)
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Ok(None),
            s if !s.is_success() => Err(JobSourceError::Status(s.as_u16())),
            _ => Ok(Some(response.json().await?)),
        }
    }
}

#[async_trait]
impl JobSource for HttpJobSource {
    async fn job_requirement(&self, job_id: i64) -> Result<Option<JobRequirement>, JobSourceError> {
        let Some(job) = self
            .get::<UpstreamJob>("/Job/GetJobById", &[("jobId", job_id)])
            .await?
        else {
            return Ok(None);
        };
        let skills: Vec<UpstreamJobSkill> = self
            .get("/JobSkill/GetJobSkillsByJobId", &[("jobId", job_id)])
            .await?
            .unwrap_or_default();
        let client = match job.client_id {
            Some(id) => self
                .get::<UpstreamClient>("/Client/GetClientById", &[("clientId", id)])
                .await
                .unwrap_or_else(|e| {
                    debug!(job_id, error = %e, "client lookup failed");
                    None
                }),
            None => None,
        };
        Ok(Some(to_requirement(job, &skills, client)))
    }
}

fn to_requirement(job: UpstreamJob, skills: &[UpstreamJobSkill], client: Option<UpstreamClient>) -> JobRequirement {
    let generic = JobRequirement::generic();
    let title = job
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or(generic.title);
    let description = job.description.unwrap_or_default();

    let mut mandatory_skills = std::collections::BTreeSet::new();
    let mut preferred_skills = std::collections::BTreeSet::new();
    for skill in skills {
        let name = skill.skill_name.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        if skill.is_mandatory {
            mandatory_skills.insert(name);
        } else {
            preferred_skills.insert(name);
        }
    }
    preferred_skills.retain(|s| !mandatory_skills.contains(s));

    let focus_text = format!(
        "{title} {description} {}",
        skills.iter().map(|s| s.skill_name.as_str()).collect::<Vec<_>>().join(" ")
    );
    let (company_name, industry) = match client {
        Some(c) => (c.client_name, normalize_industry(c.industry.as_deref())),
        None => (None, normalize_industry(None)),
    };

    JobRequirement {
        job_id: Some(job.job_id),
        seniority: SeniorityLevel::from_role_text(&title, &description),
        technical_focus: detect_technical_focus(&focus_text),
        title,
        company_name,
        mandatory_skills,
        preferred_skills,
        industry,
    }
}

fn normalize_industry(raw: Option<&str>) -> String {
    const TABLE: &[(&str, &[&str])] = &[
        ("healthcare", &["health", "medical", "pharma", "hospital"]),
        ("finance", &["finance", "bank", "fintech", "investment"]),
        ("education", &["education", "school", "university", "learning"]),
        ("manufacturing", &["manufacturing", "production", "industrial"]),
    ];
    let lower = raw.unwrap_or_default().to_lowercase();
    TABLE
        .iter()
        .find(|(_, terms)| terms.iter().any(|t| lower.contains(t)))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| "technology".to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Redis cache
// ────────────────────────────────────────────────────────────────────────────

/// Caches requirements as JSON with a TTL. Cache errors are logged and
/// bypassed.
pub struct CachedJobSource<S> {
    inner: S,
    redis: redis::Client,
    ttl_secs: u64,
}

impl<S: JobSource> CachedJobSource<S> {
    pub fn new(inner: S, redis: redis::Client, ttl_secs: u64) -> Self {
        Self { inner, redis, ttl_secs }
    }

    fn key(job_id: i64) -> String {
        format!("assessor:job:{job_id}")
    }

    async fn cached(&self, job_id: i64) -> Option<JobRequirement> {
        let mut conn = match self.redis.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "redis unavailable, bypassing job cache");
                return None;
            }
        };
        let raw: Option<String> = match conn.get(Self::key(job_id)).await {
            Ok(v) => v,
            Err(e) => {
                warn!(job_id, error = %e, "job cache read failed");
                return None;
            }
        };
        raw.and_then(|s| serde_json::from_str(&s).ok())
    }

    async fn store(&self, job: &JobRequirement, job_id: i64) {
        let Ok(body) = serde_json::to_string(job) else {
            return;
        };
        let result = async {
            let mut conn = self.redis.get_multiplexed_async_connection().await?;
            conn.set_ex::<_, _, ()>(Self::key(job_id), body, self.ttl_secs).await
        }
        .await;
        if let Err(e) = result {
            warn!(job_id, error = %e, "job cache write failed");
        }
    }
}

#[async_trait]
impl<S: JobSource> JobSource for CachedJobSource<S> {
    async fn job_requirement(&self, job_id: i64) -> Result<Option<JobRequirement>, JobSourceError> {
        if let Some(job) = self.cached(job_id).await {
            debug!(job_id, "job cache hit");
            return Ok(Some(job));
        }
        let job = self.inner.job_requirement(job_id).await?;
        if let Some(job) = &job {
            self.store(job, job_id).await;
        }
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl JobSource for Failing {
        async fn job_requirement(&self, _job_id: i64) -> Result<Option<JobRequirement>, JobSourceError> {
            Err(JobSourceError::Status(503))
        }
    }

    #[tokio::test]
    async fn test_resolve_job_falls_back_to_generic() {
        assert_eq!(resolve_job(&Failing, Some(7)).await, JobRequirement::generic());
        assert_eq!(resolve_job(&NoJobSource, Some(7)).await, JobRequirement::generic());
        assert_eq!(resolve_job(&Failing, None).await, JobRequirement::generic());
    }

    #[test]
    fn test_to_requirement_splits_mandatory_and_preferred() {
        let job = UpstreamJob {
            job_id: 9,
            title: Some("Senior Backend Engineer".into()),
            description: Some("Build REST APIs and microservices on Kubernetes".into()),
            client_id: Some(1),
        };
        let skills = vec![
            UpstreamJobSkill { skill_name: "Python".into(), is_mandatory: true },
            UpstreamJobSkill { skill_name: "Docker".into(), is_mandatory: false },
            UpstreamJobSkill { skill_name: "python".into(), is_mandatory: false },
        ];
        let client = UpstreamClient {
            client_name: Some("Acme Bank".into()),
            industry: Some("Banking".into()),
        };
        let req = to_requirement(job, &skills, Some(client));
        assert_eq!(req.job_id, Some(9));
        assert!(req.mandatory_skills.contains("python"));
        assert_eq!(req.preferred_skills.iter().collect::<Vec<_>>(), vec!["docker"]);
        assert_eq!(req.seniority, SeniorityLevel::Senior);
        assert_eq!(req.industry, "finance");
        assert_eq!(req.company_name.as_deref(), Some("Acme Bank"));
    }

    #[test]
    fn test_normalize_industry_defaults_to_technology() {
        assert_eq!(normalize_industry(None), "technology");
        assert_eq!(normalize_industry(Some("Regional Hospital Group")), "healthcare");
    }
}
