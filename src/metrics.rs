use crate::error::Result;
use crate::forge::Forge;
use crate::task::ProgressReporter;
use crate::types::{Metrics, Progress, RepoRef};

/// Collect stats for every repository in turn, reporting after each one.
pub async fn scan(
    forge: &dyn Forge,
    repos: &[RepoRef],
    progress: &ProgressReporter,
) -> Result<Metrics> {
    let total = repos.len();
    let mut stats = Vec::with_capacity(total);

    for (i, repo) in repos.iter().enumerate() {
        progress.report(Progress::new(i, total, repo.to_string()));
        tracing::debug!(repo = %repo, "scanning repository");
        stats.push(forge.get_repo_stats(repo).await?);
        progress.report(Progress::new(i + 1, total, repo.to_string()));
    }

    Ok(Metrics::from_stats(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashError;
    use crate::forge::WebKind;
    use crate::task::progress_channel;
    use crate::types::{Commit, Issue, PrSummary, RepoStats, Review};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct StatsOnly {
        failing: Option<&'static str>,
    }

    #[async_trait]
    impl Forge for StatsOnly {
        fn name(&self) -> &str {
            "stats"
        }
        fn web_url(&self, _repo: &RepoRef, _kind: WebKind, _id: &str) -> String {
            String::new()
        }
        async fn get_current_user(&self) -> Result<String> {
            Ok("me".into())
        }
        async fn list_issues(&self, _repo: &RepoRef) -> Result<Vec<Issue>> {
            Ok(vec![])
        }
        async fn list_prs(&self, _repo: &RepoRef) -> Result<Vec<PrSummary>> {
            Ok(vec![])
        }
        async fn list_commits(&self, _repo: &RepoRef) -> Result<Vec<Commit>> {
            Ok(vec![])
        }
        async fn get_pr_reviews(&self, _repo: &RepoRef, _number: u64) -> Result<Vec<Review>> {
            Ok(vec![])
        }
        async fn get_pr_diff(&self, _repo: &RepoRef, _number: u64) -> Result<String> {
            Ok(String::new())
        }
        async fn get_commit_diff(&self, _repo: &RepoRef, _sha: &str) -> Result<String> {
            Ok(String::new())
        }
        async fn get_repo_stats(&self, repo: &RepoRef) -> Result<RepoStats> {
            if self.failing == Some(repo.name.as_str()) {
                return Err(DashError::Api("not found".into()));
            }
            Ok(RepoStats {
                repo: repo.clone(),
                stars: 10,
                forks: 1,
                open_issues: 2,
                open_prs: 3,
            })
        }
    }

    fn repos() -> Vec<RepoRef> {
        vec![
            RepoRef::new("o", "a"),
            RepoRef::new("o", "b"),
            RepoRef::new("o", "c"),
        ]
    }

    #[tokio::test]
    async fn scan_aggregates_every_repo() {
        let (reporter, _listener) = progress_channel();
        let metrics = scan(&StatsOnly { failing: None }, &repos(), &reporter)
            .await
            .unwrap();
        assert_eq!(metrics.repos.len(), 3);
        assert_eq!(metrics.total_stars, 30);
        assert_eq!(metrics.total_open_prs, 9);
    }

    #[tokio::test]
    async fn scan_reports_final_progress() {
        let (reporter, listener) = progress_channel();
        scan(&StatsOnly { failing: None }, &repos(), &reporter)
            .await
            .unwrap();
        drop(reporter);

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        listener.listen(&tx, |p, _| p);
        assert_eq!(rx.recv().await, Some(Progress::new(3, 3, "o/c")));
    }

    #[tokio::test]
    async fn scan_stops_on_first_failure() {
        let (reporter, _listener) = progress_channel();
        let err = scan(&StatsOnly { failing: Some("b") }, &repos(), &reporter)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API error: not found");
    }
}
