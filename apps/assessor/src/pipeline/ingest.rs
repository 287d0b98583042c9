//! Resume upload: bytes to text, then contact links and skills pulled from
//! the text into the candidate record.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::enrichment::fetchers::{code_hosting_username, professional_handle};
use crate::errors::AppError;
use crate::models::{CandidateRecord, DataSource};
use crate::signals::{SignalContext, SignalExtractor};

static PROFESSIONAL_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:https?://)?(?:[a-z]{2,3}\.)?linkedin\.com/in/[a-z0-9_-]+")
        .expect("professional link pattern is valid")
});

static CODE_HOSTING_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:https?://)?(?:www\.)?github\.com/[a-z0-9_-]+").expect("code-hosting link pattern is valid")
});

const ACCEPTED_TYPES: &[&str] = &["application/pdf", "application/octet-stream", "text/plain", "text/markdown"];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResumeIngest {
    pub characters: usize,
    /// Link fields that were empty and got filled from the resume.
    pub links_added: Vec<DataSource>,
    /// Skills written into an empty declared-skills list.
    pub skills_detected: Vec<String>,
}

/// PDF bytes go through `pdf-extract`, anything else must be UTF-8 text.
pub async fn extract_text(bytes: &[u8], content_type: Option<&str>) -> Result<String, AppError> {
    let content_type = content_type
        .map(|c| c.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .filter(|c| !c.is_empty());
    if let Some(ct) = &content_type {
        if !ACCEPTED_TYPES.contains(&ct.as_str()) {
            return Err(AppError::Validation(format!("Unsupported resume content type '{ct}'")));
        }
    }

    let is_pdf = content_type.as_deref() == Some("application/pdf") || bytes.starts_with(b"%PDF");
    let raw = if is_pdf {
        extract_pdf(bytes.to_vec()).await?
    } else {
        String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::Validation("Resume must be a PDF or UTF-8 text".to_string()))?
    };

    let text = normalize(&raw);
    if text.is_empty() {
        return Err(AppError::Validation("Resume contains no readable text".to_string()));
    }
    Ok(text)
}

/// Runs on the blocking pool: extraction is CPU-bound and panics on some
/// malformed files.
async fn extract_pdf(bytes: Vec<u8>) -> Result<String, AppError> {
    match tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(AppError::Validation(format!("Could not read PDF resume: {e}"))),
        Err(e) if e.is_panic() => {
            warn!("PDF extraction panicked on an uploaded resume");
            Err(AppError::Validation("Could not read PDF resume: malformed file".to_string()))
        }
        Err(e) => Err(AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}"))),
    }
}

/// Trims lines and collapses runs of blank lines left by PDF extraction.
fn normalize(raw: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim) {
        if line.is_empty() && out.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// First link in the text that parses as a profile for `source`.
pub fn find_profile_link(text: &str, source: DataSource) -> Option<String> {
    let re: &Regex = match source {
        DataSource::ProfessionalNetwork => &*PROFESSIONAL_LINK_RE,
        DataSource::CodeHosting => &*CODE_HOSTING_LINK_RE,
    };
    let valid = |link: &str| match source {
        DataSource::ProfessionalNetwork => professional_handle(link).is_ok(),
        DataSource::CodeHosting => code_hosting_username(link).is_ok(),
    };
    re.find_iter(text).map(|m| m.as_str()).find(|l| valid(l)).map(|link| {
        if link.contains("://") {
            link.to_string()
        } else {
            format!("https://{link}")
        }
    })
}

/// Replaces the resume text and fills whatever the caller left empty.
pub fn apply_resume(candidate: &mut CandidateRecord, text: String, extractor: &SignalExtractor) -> ResumeIngest {
    let mut links_added = Vec::new();
    for source in DataSource::ALL {
        if candidate.profile_url(source).is_some() {
            continue;
        }
        if let Some(link) = find_profile_link(&text, source) {
            match source {
                DataSource::ProfessionalNetwork => candidate.professional_profile_url = Some(link),
                DataSource::CodeHosting => candidate.code_hosting_url = Some(link),
            }
            links_added.push(source);
        }
    }

    let mut skills_detected = Vec::new();
    if candidate.declared_skills.iter().all(|s| s.trim().is_empty()) {
        skills_detected = extractor
            .extract(&text, SignalContext::Resume)
            .technical_terms
            .into_iter()
            .collect();
        candidate.declared_skills = skills_detected.clone();
    }

    let characters = text.chars().count();
    candidate.resume_text = text;
    ResumeIngest {
        characters,
        links_added,
        skills_detected,
    }
}
