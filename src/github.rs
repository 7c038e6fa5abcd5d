use async_trait::async_trait;
use octocrab::models::IssueState as OctoIssueState;
use octocrab::Octocrab;

use crate::config::GitHubConfig;
use crate::error::{DashError, Result};
use crate::forge::{Forge, WebKind};
use crate::types::{
    Commit, Issue, IssueState, PrState, PrSummary, RepoRef, RepoStats, Review, ReviewState,
};

const PER_PAGE: u8 = 50;

pub struct GitHub {
    client: Octocrab,
    http: reqwest::Client,
    token: String,
    api_url: String,
    web_url: String,
}

impl std::fmt::Debug for GitHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHub")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl From<octocrab::Error> for DashError {
    fn from(err: octocrab::Error) -> Self {
        DashError::Api(err.to_string())
    }
}

impl GitHub {
    pub fn new(token: String, config: &GitHubConfig) -> Result<Self> {
        let api_url = config.api_url.trim_end_matches('/').to_string();
        let client = Octocrab::builder()
            .base_uri(api_url.as_str())
            .map_err(|e| DashError::Config(format!("invalid api_url: {}", e)))?
            .personal_token(token.clone())
            .build()
            .map_err(|e| DashError::Auth(e.to_string()))?;

        Ok(Self {
            client,
            http: reqwest::Client::new(),
            token,
            api_url,
            web_url: config.web_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a raw unified diff; the REST API serves it under a media type.
    async fn fetch_diff(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.diff")
            .header("User-Agent", "gitdash")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DashError::Api(format!(
                "Failed to fetch diff: {}",
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Forge for GitHub {
    fn name(&self) -> &str {
        "GitHub"
    }

    fn web_url(&self, repo: &RepoRef, kind: WebKind, id: &str) -> String {
        let base = format!("{}/{}/{}", self.web_url, repo.owner, repo.name);
        match kind {
            WebKind::Repo => base,
            WebKind::Issue => format!("{}/issues/{}", base, id),
            WebKind::PullRequest => format!("{}/pull/{}", base, id),
            WebKind::Commit => format!("{}/commit/{}", base, id),
        }
    }

    async fn get_current_user(&self) -> Result<String> {
        let user = self.client.current().user().await?;
        Ok(user.login)
    }

    async fn list_issues(&self, repo: &RepoRef) -> Result<Vec<Issue>> {
        let issues = self
            .client
            .issues(&repo.owner, &repo.name)
            .list()
            .state(octocrab::params::State::Open)
            .sort(octocrab::params::issues::Sort::Updated)
            .direction(octocrab::params::Direction::Descending)
            .per_page(PER_PAGE)
            .send()
            .await?;

        Ok(issues
            .items
            .into_iter()
            .filter(|i| i.pull_request.is_none()) // Filter out PRs
            .map(|issue| Issue {
                number: issue.number,
                title: issue.title,
                state: match issue.state {
                    OctoIssueState::Closed => IssueState::Closed,
                    _ => IssueState::Open,
                },
                author: issue.user.login,
                labels: issue.labels.into_iter().map(|l| l.name).collect(),
                comments: issue.comments,
                created_at: issue.created_at,
                updated_at: issue.updated_at,
            })
            .collect())
    }

    async fn list_prs(&self, repo: &RepoRef) -> Result<Vec<PrSummary>> {
        let prs = self
            .client
            .pulls(&repo.owner, &repo.name)
            .list()
            .state(octocrab::params::State::Open)
            .sort(octocrab::params::pulls::Sort::Updated)
            .direction(octocrab::params::Direction::Descending)
            .per_page(PER_PAGE)
            .send()
            .await?;

        Ok(prs
            .items
            .into_iter()
            .map(|pr| PrSummary {
                number: pr.number,
                title: pr.title.unwrap_or_default(),
                state: match pr.merged_at {
                    Some(_) => PrState::Merged,
                    None => match pr.state {
                        Some(OctoIssueState::Closed) => PrState::Closed,
                        _ => PrState::Open,
                    },
                },
                author: pr
                    .user
                    .map(|u| u.login)
                    .unwrap_or_else(|| "unknown".to_string()),
                draft: pr.draft.unwrap_or(false),
                created_at: pr.created_at.unwrap_or_else(chrono::Utc::now),
                updated_at: pr.updated_at.unwrap_or_else(chrono::Utc::now),
            })
            .collect())
    }

    async fn list_commits(&self, repo: &RepoRef) -> Result<Vec<Commit>> {
        let commits = self
            .client
            .repos(&repo.owner, &repo.name)
            .list_commits()
            .per_page(PER_PAGE)
            .send()
            .await?;

        Ok(commits
            .items
            .into_iter()
            .map(|c| {
                let message = c.commit.message.lines().next().unwrap_or("").to_string();
                let author = c
                    .author
                    .map(|a| a.login)
                    .or_else(|| c.commit.author.as_ref().map(|a| a.name.clone()))
                    .unwrap_or_else(|| "unknown".to_string());
                let date = c
                    .commit
                    .author
                    .and_then(|a| a.date)
                    .unwrap_or_else(chrono::Utc::now);

                Commit {
                    sha: c.sha,
                    message,
                    author,
                    date,
                }
            })
            .collect())
    }

    async fn get_pr_reviews(&self, repo: &RepoRef, number: u64) -> Result<Vec<Review>> {
        let url = format!(
            "/repos/{}/{}/pulls/{}/reviews?per_page=100",
            repo.owner, repo.name, number
        );
        let response: serde_json::Value = self.client.get(&url, None::<&()>).await?;

        let reviews = response
            .as_array()
            .map(|reviews| {
                reviews
                    .iter()
                    .filter_map(|r| {
                        Some(Review {
                            author: r
                                .get("user")
                                .and_then(|u| u.get("login"))
                                .and_then(|l| l.as_str())
                                .unwrap_or("ghost")
                                .to_string(),
                            state: ReviewState::from_api_str(r.get("state")?.as_str()?),
                            submitted_at: r
                                .get("submitted_at")
                                .and_then(|d| d.as_str())
                                .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                                .map(|d| d.with_timezone(&chrono::Utc)),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(reviews)
    }

    async fn get_pr_diff(&self, repo: &RepoRef, number: u64) -> Result<String> {
        self.fetch_diff(&format!(
            "/repos/{}/{}/pulls/{}",
            repo.owner, repo.name, number
        ))
        .await
    }

    async fn get_commit_diff(&self, repo: &RepoRef, sha: &str) -> Result<String> {
        self.fetch_diff(&format!(
            "/repos/{}/{}/commits/{}",
            repo.owner, repo.name, sha
        ))
        .await
    }

    async fn get_repo_stats(&self, repo: &RepoRef) -> Result<RepoStats> {
        let url = format!("/repos/{}/{}", repo.owner, repo.name);
        let response: serde_json::Value = self.client.get(&url, None::<&()>).await?;
        let count = |field: &str| response.get(field).and_then(|v| v.as_u64()).unwrap_or(0);

        let query = format!("repo:{} is:pr is:open", repo);
        let open_prs = self
            .client
            .search()
            .issues_and_pull_requests(&query)
            .per_page(1)
            .send()
            .await?
            .total_count
            .unwrap_or(0);

        // open_issues_count includes pull requests
        let open_issues = count("open_issues_count").saturating_sub(open_prs);

        Ok(RepoStats {
            repo: repo.clone(),
            stars: count("stargazers_count"),
            forks: count("forks_count"),
            open_issues,
            open_prs,
        })
    }
}
