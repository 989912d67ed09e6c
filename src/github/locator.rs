//! Pull request addressing: URL parsing, API base derivation and the
//! access token wrapper.

use std::fmt;

use url::Url;

use super::error::GatewayError;

/// API base used for pull requests hosted on github.com.
const GITHUB_API_BASE: &str = "https://api.github.com";

/// Path GitHub Enterprise Server serves its REST and GraphQL APIs under.
const ENTERPRISE_API_PATH: &str = "api/v3";

fn non_empty_segment(value: &str) -> Result<String, GatewayError> {
    if value.is_empty() {
        return Err(GatewayError::MissingPathSegments);
    }
    Ok(value.to_owned())
}

fn invalid_url(error: &dyn fmt::Display) -> GatewayError {
    GatewayError::InvalidUrl(error.to_string())
}

/// Login of the account owning a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    /// Borrow the owner login.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name within its owner's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryName(String);

impl RepositoryName {
    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Positive pull request number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PullRequestNumber(u64);

impl PullRequestNumber {
    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::str::FromStr for PullRequestNumber {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<u64>() {
            Ok(0) | Err(_) => Err(GatewayError::InvalidPullRequestNumber),
            Ok(value) => Ok(Self(value)),
        }
    }
}

/// Personal access token; `Debug` output never shows the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Trims `token` and rejects it when nothing is left.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingToken`] for a blank token.
    pub fn new(token: impl AsRef<str>) -> Result<Self, GatewayError> {
        match token.as_ref().trim() {
            "" => Err(GatewayError::MissingToken),
            trimmed => Ok(Self(trimmed.to_owned())),
        }
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("PersonalAccessToken(***)")
    }
}

/// API base serving the pull request at `url`.
///
/// github.com maps to `api.github.com`; any other host is treated as
/// GitHub Enterprise Server, keeping its scheme, host and port.
fn api_base_for(url: &Url) -> Result<Url, GatewayError> {
    let host = url
        .host_str()
        .ok_or_else(|| invalid_url(&"URL must include a host"))?;
    if host.eq_ignore_ascii_case("github.com") {
        return Url::parse(GITHUB_API_BASE).map_err(|error| invalid_url(&error));
    }

    let mut base = url.clone();
    base.set_username("")
        .and_then(|()| base.set_password(None))
        .map_err(|()| invalid_url(&"URL cannot carry credentials"))?;
    base.set_path(ENTERPRISE_API_PATH);
    base.set_query(None);
    base.set_fragment(None);
    Ok(base)
}

/// A pull request addressed by URL, with the API base serving it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PullRequestLocator {
    api_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
    number: PullRequestNumber,
}

impl PullRequestLocator {
    /// Parses `https://<host>/<owner>/<repo>/pull/<number>`.
    ///
    /// Trailing segments such as `/files` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidUrl`] when `input` is not a URL,
    /// [`GatewayError::MissingPathSegments`] when the path does not address a
    /// pull request, and [`GatewayError::InvalidPullRequestNumber`] when the
    /// number is not a positive integer.
    pub fn parse(input: &str) -> Result<Self, GatewayError> {
        let url = Url::parse(input).map_err(|error| invalid_url(&error))?;
        let segments: Vec<&str> = url
            .path_segments()
            .ok_or(GatewayError::MissingPathSegments)?
            .collect();

        let [owner_segment, repository_segment, "pull", number_segment, ..] = segments.as_slice()
        else {
            return Err(GatewayError::MissingPathSegments);
        };

        Ok(Self {
            api_base: api_base_for(&url)?,
            owner: RepositoryOwner(non_empty_segment(owner_segment)?),
            repository: RepositoryName(non_empty_segment(repository_segment)?),
            number: non_empty_segment(number_segment)?.parse()?,
        })
    }

    /// API base URL derived from the pull request host.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Pull request number.
    #[must_use]
    pub const fn number(&self) -> PullRequestNumber {
        self.number
    }
}

impl fmt::Display for PullRequestLocator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}/{}#{}",
            self.owner.as_str(),
            self.repository.as_str(),
            self.number.get()
        )
    }
}
