use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Commit, Issue, PrSummary, RepoRef, RepoStats, Review};

/// Kind of page to link to with [`Forge::web_url`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebKind {
    Repo,
    Issue,
    PullRequest,
    Commit,
}

/// Remote repository host. Every call is independent; the app decides when to
/// make them and never calls from the update loop itself.
#[async_trait]
pub trait Forge: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;
    fn web_url(&self, repo: &RepoRef, kind: WebKind, id: &str) -> String;

    async fn get_current_user(&self) -> Result<String>;

    // Primary lists
    async fn list_issues(&self, repo: &RepoRef) -> Result<Vec<Issue>>;
    async fn list_prs(&self, repo: &RepoRef) -> Result<Vec<PrSummary>>;
    async fn list_commits(&self, repo: &RepoRef) -> Result<Vec<Commit>>;

    // Per-item detail
    async fn get_pr_reviews(&self, repo: &RepoRef, number: u64) -> Result<Vec<Review>>;

    // Raw unified diffs
    async fn get_pr_diff(&self, repo: &RepoRef, number: u64) -> Result<String>;
    async fn get_commit_diff(&self, repo: &RepoRef, sha: &str) -> Result<String>;

    async fn get_repo_stats(&self, repo: &RepoRef) -> Result<RepoStats>;
}
