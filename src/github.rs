use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw repository fields as the GitHub API returns them.
#[derive(Debug, Deserialize)]
struct RawRepo {
    id: i64,
    name: String,
    full_name: String,
    description: Option<String>,
    html_url: String,
    language: Option<String>,
    stargazers_count: i64,
    forks_count: i64,
    updated_at: Option<String>,
    created_at: Option<String>,
    private: bool,
    default_branch: Option<String>,
}

/// Repository shape served to the frontend.
#[derive(Debug, Serialize)]
pub struct RepoSummary {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    pub stars: i64,
    pub forks: i64,
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
    pub is_private: bool,
    pub default_branch: Option<String>,
}

#[derive(Debug)]
pub enum FetchError {
    /// GitHub answered with a non-success status code.
    Status(u16),
    /// The request itself failed (network, timeout, decode).
    Request(String),
}

impl FetchError {
    /// Human-readable reason shown on the public endpoint.
    pub fn public_message(&self) -> String {
        match self {
            FetchError::Status(401) => {
                "Invalid GitHub token. Please check your token in admin settings.".to_string()
            }
            FetchError::Status(404) => {
                "GitHub username not found. Please check your username.".to_string()
            }
            FetchError::Status(403) => {
                "GitHub API rate limit exceeded or access denied. Please try again later."
                    .to_string()
            }
            FetchError::Status(code) => format!("GitHub API returned status {}", code),
            FetchError::Request(e) => format!("Network error: {}", e),
        }
    }
}

/// Fetch a user's repositories, most recently updated first.
pub fn fetch_user_repos(username: &str, token: Option<&str>) -> Result<Vec<RepoSummary>, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| FetchError::Request(e.to_string()))?;

    let url = format!("https://api.github.com/users/{}/repos", username);
    let mut request = client
        .get(&url)
        .query(&[("sort", "updated"), ("direction", "desc"), ("per_page", "100")])
        // GitHub rejects requests without a User-Agent
        .header(reqwest::header::USER_AGENT, "folio-portfolio-api");

    if let Some(token) = token.filter(|t| !t.is_empty()) {
        request = request.header(reqwest::header::AUTHORIZATION, format!("token {}", token));
    }

    let response = request
        .send()
        .map_err(|e| FetchError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let repos: Vec<RawRepo> = response
        .json()
        .map_err(|e| FetchError::Request(e.to_string()))?;

    Ok(repos.into_iter().map(summarize).collect())
}

fn summarize(repo: RawRepo) -> RepoSummary {
    RepoSummary {
        id: repo.id,
        name: repo.name,
        full_name: repo.full_name,
        description: repo.description,
        html_url: repo.html_url,
        language: repo.language,
        stars: repo.stargazers_count,
        forks: repo.forks_count,
        updated_at: repo.updated_at,
        created_at: repo.created_at,
        is_private: repo.private,
        default_branch: repo.default_branch,
    }
}

/// Keep only the repositories the admin selected, matched by full_name
/// or bare name.
pub fn filter_selected(repos: Vec<RepoSummary>, selected: &[String]) -> Vec<RepoSummary> {
    repos
        .into_iter()
        .filter(|r| {
            selected.iter().any(|s| *s == r.full_name || *s == r.name)
        })
        .collect()
}
