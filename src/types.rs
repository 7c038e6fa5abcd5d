use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::DashError;

/// `owner/name` pair identifying a repository on the forge
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches(".git");
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(RepoRef::new(owner, name))
            }
            _ => Err(DashError::Config(format!(
                "expected a repository as owner/name, got '{}'",
                s
            ))),
        }
    }
}

/// GitHub Issue
#[derive(Debug, Clone)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    pub author: String,
    pub labels: Vec<String>,
    pub comments: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => write!(f, "Open"),
            IssueState::Closed => write!(f, "Closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrState::Open => write!(f, "Open"),
            PrState::Closed => write!(f, "Closed"),
            PrState::Merged => write!(f, "Merged"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrSummary {
    pub number: u64,
    pub title: String,
    pub state: PrState,
    pub author: String,
    pub draft: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Git Commit (summary for list view)
#[derive(Debug, Clone)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: DateTime<Utc>,
}

impl Commit {
    pub fn short_sha(&self) -> &str {
        &self.sha[..7.min(self.sha.len())]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
}

impl ReviewState {
    pub fn from_api_str(s: &str) -> Self {
        match s {
            "APPROVED" => ReviewState::Approved,
            "CHANGES_REQUESTED" => ReviewState::ChangesRequested,
            "DISMISSED" => ReviewState::Dismissed,
            "PENDING" => ReviewState::Pending,
            _ => ReviewState::Commented,
        }
    }

    /// Approvals and change requests decide a review; comments do not.
    pub fn is_decisive(&self) -> bool {
        matches!(self, ReviewState::Approved | ReviewState::ChangesRequested)
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewState::Approved => write!(f, "✓ approved"),
            ReviewState::ChangesRequested => write!(f, "✗ changes"),
            ReviewState::Commented => write!(f, "💬 commented"),
            ReviewState::Dismissed => write!(f, "dismissed"),
            ReviewState::Pending => write!(f, "pending"),
        }
    }
}

/// A submitted review on a pull request
#[derive(Debug, Clone)]
pub struct Review {
    pub author: String,
    pub state: ReviewState,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Review timestamps derived from a PR's reviews
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSummary {
    pub review_count: usize,
    pub first_review_at: Option<DateTime<Utc>>,
    pub last_review_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    /// Time from PR creation to the first submitted review.
    pub wait: Option<Duration>,
    pub decision: Option<ReviewState>,
}

impl ReviewSummary {
    pub fn derive(created_at: DateTime<Utc>, reviews: &[Review]) -> Self {
        let mut submitted: Vec<&Review> = reviews
            .iter()
            .filter(|r| r.state != ReviewState::Pending && r.submitted_at.is_some())
            .collect();
        submitted.sort_by_key(|r| r.submitted_at);

        let first_review_at = submitted.first().and_then(|r| r.submitted_at);
        let last_review_at = submitted.last().and_then(|r| r.submitted_at);
        let approved_at = submitted
            .iter()
            .find(|r| r.state == ReviewState::Approved)
            .and_then(|r| r.submitted_at);
        let decision = submitted
            .iter()
            .rev()
            .find(|r| r.state.is_decisive())
            .map(|r| r.state);

        Self {
            review_count: submitted.len(),
            first_review_at,
            last_review_at,
            approved_at,
            wait: first_review_at.map(|t| t.signed_duration_since(created_at)),
            decision,
        }
    }
}

/// Incremental status of a long-running operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub current: String,
}

impl Progress {
    pub fn new(processed: usize, total: usize, current: impl Into<String>) -> Self {
        Self {
            processed,
            total,
            current: current.into(),
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.processed as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.processed, self.total)
    }
}

/// Per-repository numbers gathered by the metrics scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStats {
    pub repo: RepoRef,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub open_prs: u64,
}

/// Aggregate across all scanned repositories
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metrics {
    pub repos: Vec<RepoStats>,
    pub total_stars: u64,
    pub total_forks: u64,
    pub total_open_issues: u64,
    pub total_open_prs: u64,
}

impl Metrics {
    pub fn from_stats(repos: Vec<RepoStats>) -> Self {
        let mut metrics = Metrics::default();
        for stats in &repos {
            metrics.total_stars += stats.stars;
            metrics.total_forks += stats.forks;
            metrics.total_open_issues += stats.open_issues;
            metrics.total_open_prs += stats.open_prs;
        }
        metrics.repos = repos;
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn review(state: ReviewState, hour: Option<u32>) -> Review {
        Review {
            author: "octocat".to_string(),
            state,
            submitted_at: hour.map(at),
        }
    }

    #[test]
    fn repo_ref_parses_owner_and_name() {
        let repo: RepoRef = "rust-lang/rust".parse().unwrap();
        assert_eq!(repo, RepoRef::new("rust-lang", "rust"));
        assert_eq!(repo.to_string(), "rust-lang/rust");
    }

    #[test]
    fn repo_ref_strips_git_suffix() {
        let repo: RepoRef = "owner/repo.git".parse().unwrap();
        assert_eq!(repo.name, "repo");
    }

    #[test]
    fn repo_ref_rejects_malformed() {
        assert!("noslash".parse::<RepoRef>().is_err());
        assert!("/name".parse::<RepoRef>().is_err());
        assert!("owner/".parse::<RepoRef>().is_err());
        assert!("a/b/c".parse::<RepoRef>().is_err());
    }

    #[test]
    fn summary_of_no_reviews_is_empty() {
        let summary = ReviewSummary::derive(at(0), &[]);
        assert_eq!(summary.review_count, 0);
        assert_eq!(summary.first_review_at, None);
        assert_eq!(summary.wait, None);
        assert_eq!(summary.decision, None);
    }

    #[test]
    fn summary_orders_reviews_by_submission() {
        let reviews = vec![
            review(ReviewState::Approved, Some(9)),
            review(ReviewState::Commented, Some(3)),
            review(ReviewState::ChangesRequested, Some(5)),
            review(ReviewState::Pending, None),
        ];
        let summary = ReviewSummary::derive(at(1), &reviews);
        assert_eq!(summary.review_count, 3);
        assert_eq!(summary.first_review_at, Some(at(3)));
        assert_eq!(summary.last_review_at, Some(at(9)));
        assert_eq!(summary.approved_at, Some(at(9)));
        assert_eq!(summary.wait, Some(Duration::hours(2)));
        assert_eq!(summary.decision, Some(ReviewState::Approved));
    }

    #[test]
    fn summary_decision_ignores_trailing_comments() {
        let reviews = vec![
            review(ReviewState::ChangesRequested, Some(2)),
            review(ReviewState::Commented, Some(4)),
        ];
        let summary = ReviewSummary::derive(at(0), &reviews);
        assert_eq!(summary.decision, Some(ReviewState::ChangesRequested));
        assert_eq!(summary.approved_at, None);
    }

    #[test]
    fn progress_displays_counts() {
        let progress = Progress::new(2, 3, "owner/repo");
        assert_eq!(progress.to_string(), "2/3");
        assert!((progress.ratio() - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(Progress::default().ratio(), 0.0);
    }

    #[test]
    fn metrics_sum_per_repo_stats() {
        let stats = |name: &str, n: u64| RepoStats {
            repo: RepoRef::new("o", name),
            stars: n,
            forks: n * 2,
            open_issues: n * 3,
            open_prs: n * 4,
        };
        let metrics = Metrics::from_stats(vec![stats("a", 1), stats("b", 2)]);
        assert_eq!(metrics.total_stars, 3);
        assert_eq!(metrics.total_forks, 6);
        assert_eq!(metrics.total_open_issues, 9);
        assert_eq!(metrics.total_open_prs, 12);
        assert_eq!(metrics.repos.len(), 2);
    }
}
