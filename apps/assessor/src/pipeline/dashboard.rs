//! Per-job recruiter views: scored candidates ranked by fit, and a summary
//! of the whole pool.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::CandidateRecord;
use crate::scoring::{CompositeScore, FitBucket, ScoringMethod};

const HISTOGRAM_BINS: usize = 10;

/// Which buckets the ranked list shows. Without an explicit `bucket` only
/// top-fit candidates are listed, plus borderline ones when asked for.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DashboardFilter {
    #[serde(default)]
    pub include_borderline: bool,
    pub bucket: Option<FitBucket>,
}

impl DashboardFilter {
    pub fn admits(&self, bucket: FitBucket) -> bool {
        match self.bucket {
            Some(only) => bucket == only,
            None => bucket == FitBucket::Top || (self.include_borderline && bucket == FitBucket::Borderline),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedCandidate {
    /// 1-based position among every scored candidate for the job.
    pub rank: usize,
    pub candidate_id: Uuid,
    pub full_name: String,
    pub fit_score: f64,
    pub bucket: FitBucket,
    pub scoring_method: ScoringMethod,
    pub red_flag_count: usize,
    pub integrity_check_failed: bool,
    pub forced: bool,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobDashboard {
    pub job_id: i64,
    pub job_title: String,
    pub candidates: Vec<RankedCandidate>,
    pub total_count: usize,
    pub high_fit_count: usize,
    pub borderline_count: usize,
    pub unscored_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BucketCounts {
    pub top: usize,
    pub borderline: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreDistribution {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub histogram: Vec<HistogramBin>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobAnalytics {
    pub job_id: i64,
    pub total_candidates: usize,
    pub scored: usize,
    pub unscored: usize,
    pub buckets: BucketCounts,
    /// Absent until at least one candidate is scored.
    pub distribution: Option<ScoreDistribution>,
    pub forced_scores: usize,
    pub integrity_failures: usize,
    pub generated_at: DateTime<Utc>,
}

/// Highest fit first; ties go to the earlier score, then the candidate id.
fn by_fit(a: &CompositeScore, b: &CompositeScore) -> Ordering {
    b.fit_score
        .total_cmp(&a.fit_score)
        .then(a.computed_at.cmp(&b.computed_at))
        .then(a.candidate_id.cmp(&b.candidate_id))
}

pub fn build_dashboard(
    job_id: i64,
    job_title: String,
    rows: Vec<(CandidateRecord, Option<CompositeScore>)>,
    filter: DashboardFilter,
) -> JobDashboard {
    let unscored_count = rows.iter().filter(|(_, s)| s.is_none()).count();
    let mut scored: Vec<(CandidateRecord, CompositeScore)> =
        rows.into_iter().filter_map(|(c, s)| s.map(|s| (c, s))).collect();
    scored.sort_by(|(_, a), (_, b)| by_fit(a, b));

    let high_fit_count = scored.iter().filter(|(_, s)| s.bucket == FitBucket::Top).count();
    let borderline_count = scored.iter().filter(|(_, s)| s.bucket == FitBucket::Borderline).count();
    let total_count = scored.len();

    let candidates = scored
        .into_iter()
        .enumerate()
        .filter(|(_, (_, s))| filter.admits(s.bucket))
        .map(|(i, (c, s))| RankedCandidate {
            rank: i + 1,
            candidate_id: c.id,
            full_name: c.full_name,
            fit_score: s.fit_score,
            bucket: s.bucket,
            scoring_method: s.scoring_method,
            red_flag_count: s.red_flag_count,
            integrity_check_failed: s.integrity_check_failed,
            forced: s.forced,
            computed_at: s.computed_at,
        })
        .collect();

    JobDashboard {
        job_id,
        job_title,
        candidates,
        total_count,
        high_fit_count,
        borderline_count,
        unscored_count,
    }
}

pub fn analyze_pool(
    job_id: i64,
    rows: &[(CandidateRecord, Option<CompositeScore>)],
    now: DateTime<Utc>,
) -> JobAnalytics {
    let scores: Vec<&CompositeScore> = rows.iter().filter_map(|(_, s)| s.as_ref()).collect();

    let mut buckets = BucketCounts::default();
    for s in &scores {
        match s.bucket {
            FitBucket::Top => buckets.top += 1,
            FitBucket::Borderline => buckets.borderline += 1,
            FitBucket::Low => buckets.low += 1,
        }
    }

    let fits: Vec<f64> = scores.iter().map(|s| s.fit_score).collect();
    JobAnalytics {
        job_id,
        total_candidates: rows.len(),
        scored: scores.len(),
        unscored: rows.len() - scores.len(),
        buckets,
        distribution: distribution(fits),
        forced_scores: scores.iter().filter(|s| s.forced).count(),
        integrity_failures: scores.iter().filter(|s| s.integrity_check_failed).count(),
        generated_at: now,
    }
}

fn distribution(mut fits: Vec<f64>) -> Option<ScoreDistribution> {
    if fits.is_empty() {
        return None;
    }
    fits.sort_by(f64::total_cmp);
    let n = fits.len();
    let median = if n % 2 == 1 {
        fits[n / 2]
    } else {
        (fits[n / 2 - 1] + fits[n / 2]) / 2.0
    };

    let width = 1.0 / HISTOGRAM_BINS as f64;
    let mut histogram: Vec<HistogramBin> = (0..HISTOGRAM_BINS)
        .map(|i| HistogramBin {
            lower: i as f64 * width,
            upper: (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for &f in &fits {
        // 1.0 lands in the last bin.
        let idx = ((f.clamp(0.0, 1.0) / width) as usize).min(HISTOGRAM_BINS - 1);
        histogram[idx].count += 1;
    }

    Some(ScoreDistribution {
        mean: fits.iter().sum::<f64>() / n as f64,
        median,
        min: fits[0],
        max: fits[n - 1],
        histogram,
    })
}
