//! Seafile backend, over the server's `api2` REST interface.

use super::{FileStat, Storage, VersionToken};
use crate::common::{Error, Result};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

const API_PREFIX: &str = "api2/";

/// A file inside a Seafile library.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeafilePath {
    /// Library (repository) identifier
    pub repo_id: String,
    /// Absolute path inside the library
    pub path: String,
}

impl SeafilePath {
    pub fn new(repo_id: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        Self {
            repo_id: repo_id.into(),
            path,
        }
    }
}

impl fmt::Display for SeafilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.repo_id, self.path)
    }
}

/// Parses `REPO_ID/dir/file.ods`.
impl FromStr for SeafilePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((repo_id, path)) if !repo_id.is_empty() && !path.is_empty() => {
                Ok(Self::new(repo_id, path))
            },
            _ => Err(Error::InvalidPath(s.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct FileDetail {
    #[serde(default)]
    id: Option<String>,
    mtime: i64,
    #[serde(default)]
    size: u64,
}

/// A Seafile server.
///
/// Authenticate once with a password or a saved token, then use it as a
/// [`Storage`] addressed by [`SeafilePath`].
///
/// ```no_run
/// use seafform::storage::{SeafilePath, SeafileStorage, Storage};
///
/// # fn main() -> seafform::Result<()> {
/// let mut seafile = SeafileStorage::new("https://cloud.example.com/")?;
/// seafile.authenticate_password("user@example.com", "secret")?;
/// let stat = seafile.stat(&"0123-abcd/forms/party.ods".parse::<SeafilePath>()?)?;
/// println!("last changed {}", stat.modified);
/// # Ok(())
/// # }
/// ```
pub struct SeafileStorage {
    client: Client,
    api_url: String,
    email: Option<String>,
    token: Option<String>,
}

impl fmt::Debug for SeafileStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeafileStorage")
            .field("api_url", &self.api_url)
            .field("email", &self.email)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl SeafileStorage {
    /// A client for the server at `url`. No request is made yet.
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder().build()?;
        let mut api_url = url.trim_end_matches('/').to_string();
        api_url.push('/');
        api_url.push_str(API_PREFIX);
        Ok(Self {
            client,
            api_url,
            email: None,
            token: None,
        })
    }

    /// The token of the current session, to be saved for later
    /// [`authenticate_token`](Self::authenticate_token) calls.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Account the client is authenticated as.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Obtain a token with an account password.
    pub fn authenticate_password(&mut self, email: &str, password: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("auth-token/"))
            .form(&[("username", email), ("password", password)])
            .send()?;
        let response: TokenResponse = check(response)?.json()?;
        if response.token.is_empty() {
            return Err(Error::NotAuthenticated);
        }

        log::info!("Authenticated on {} as {}", self.api_url, email);
        self.email = Some(email.to_string());
        self.token = Some(response.token);
        Ok(())
    }

    /// Reuse a token from an earlier session, checking it against the server.
    pub fn authenticate_token(&mut self, email: &str, token: &str) -> Result<()> {
        let response = self
            .client
            .get(self.url("auth/ping/"))
            .header("Authorization", format!("Token {}", token))
            .send()?;
        let pong: String = match check(response) {
            Ok(response) => response.json()?,
            Err(Error::PermissionDenied(_)) | Err(Error::Backend { status: 401, .. }) => {
                return Err(Error::NotAuthenticated);
            },
            Err(e) => return Err(e),
        };
        if pong != "pong" {
            return Err(Error::NotAuthenticated);
        }

        self.email = Some(email.to_string());
        self.token = Some(token.to_string());
        Ok(())
    }

    /// Check that the server answers.
    pub fn ping(&self) -> Result<()> {
        let response = self.client.get(self.url("ping/")).send()?;
        let pong: String = check(response)?.json()?;
        if pong == "pong" {
            Ok(())
        } else {
            Err(Error::Http(format!("unexpected ping answer {:?}", pong)))
        }
    }

    fn url(&self, command: &str) -> String {
        format!("{}{}", self.api_url, command)
    }

    /// An authenticated request to an api2 command.
    fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(Error::NotAuthenticated)?;
        Ok(builder
            .header("Authorization", format!("Token {}", token))
            .header("Accept", "application/json; charset=utf-8"))
    }

    fn file_detail(&self, locator: &SeafilePath) -> Result<FileDetail> {
        let request = self
            .client
            .get(self.url(&format!("repos/{}/file/detail/", locator.repo_id)))
            .query(&[("p", locator.path.as_str())]);
        let response = self.authed(request)?.send()?;
        Ok(check_at(response, locator)?.json()?)
    }
}

/// Map an error status to the crate taxonomy.
fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().unwrap_or_default();
    Err(status_error(status, message))
}

/// Like [`check`], naming the file in locator-level errors.
fn check_at(response: Response, locator: &SeafilePath) -> Result<Response> {
    check(response).map_err(|e| match e {
        Error::NotFound(_) => Error::NotFound(locator.to_string()),
        Error::PermissionDenied(_) => Error::PermissionDenied(locator.to_string()),
        Error::InvalidPath(_) => Error::InvalidPath(locator.to_string()),
        other => other,
    })
}

fn status_error(status: StatusCode, message: String) -> Error {
    match status.as_u16() {
        400 | 440 => Error::InvalidPath(message),
        403 => Error::PermissionDenied(message),
        404 => Error::NotFound(message),
        code => Error::Backend {
            status: code,
            message,
        },
    }
}

impl Storage for SeafileStorage {
    type Locator = SeafilePath;

    fn open_read(&self, locator: &SeafilePath) -> Result<Box<dyn Read + '_>> {
        let request = self
            .client
            .get(self.url(&format!("repos/{}/file/", locator.repo_id)))
            .query(&[("p", locator.path.as_str())]);
        let response = self.authed(request)?.send()?;
        let link: String = check_at(response, locator)?.json()?;

        let download = check_at(self.client.get(link).send()?, locator)?;
        log::debug!("Downloading {}", locator);
        Ok(Box::new(download))
    }

    fn stat(&self, locator: &SeafilePath) -> Result<FileStat> {
        let detail = self.file_detail(locator)?;
        let modified = DateTime::<Utc>::from_timestamp(detail.mtime, 0).ok_or_else(|| {
            Error::Http(format!("invalid mtime {} for {}", detail.mtime, locator))
        })?;
        Ok(FileStat {
            modified,
            size: detail.size,
        })
    }

    fn write_full(&self, locator: &SeafilePath, bytes: &[u8]) -> Result<VersionToken> {
        let request = self
            .client
            .get(self.url(&format!("repos/{}/update-link/", locator.repo_id)));
        let response = self.authed(request)?.send()?;
        let link: String = check_at(response, locator)?.json()?;

        let file_name = locator
            .path
            .rsplit('/')
            .next()
            .unwrap_or(locator.path.as_str())
            .to_string();
        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .text("target_file", locator.path.clone())
            .part("file", part);

        let request = self.client.post(link).multipart(form);
        let response = self.authed(request)?.send()?;
        let file_id = check_at(response, locator)?.text()?;
        log::info!("Updated {} ({} bytes)", locator, bytes.len());

        let file_id = file_id.trim().trim_matches('"').to_string();
        if file_id.is_empty() {
            // Older servers answer with an empty body; fall back to the detail id.
            let detail = self.file_detail(locator)?;
            return Ok(VersionToken(detail.id.unwrap_or_default()));
        }
        Ok(VersionToken(file_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seafile_path() {
        let path: SeafilePath = "abcd-1234/forms/party.ods".parse().unwrap();
        assert_eq!(path.repo_id, "abcd-1234");
        assert_eq!(path.path, "/forms/party.ods");
        assert_eq!(path.to_string(), "abcd-1234/forms/party.ods");

        assert!("no-path".parse::<SeafilePath>().is_err());
        assert!("/forms/party.ods".parse::<SeafilePath>().is_err());
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (400, "InvalidPath"),
            (440, "InvalidPath"),
            (403, "PermissionDenied"),
            (404, "NotFound"),
            (441, "Backend"),
            (520, "Backend"),
        ];
        for (code, expected) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            let error = status_error(status, "msg".to_string());
            let name = match error {
                Error::InvalidPath(_) => "InvalidPath",
                Error::PermissionDenied(_) => "PermissionDenied",
                Error::NotFound(_) => "NotFound",
                Error::Backend { .. } => "Backend",
                _ => "other",
            };
            assert_eq!(name, expected, "status {}", code);
        }
    }

    #[test]
    fn test_requires_authentication() {
        let seafile = SeafileStorage::new("https://cloud.example.com").unwrap();
        assert_eq!(seafile.url("ping/"), "https://cloud.example.com/api2/ping/");
        let path = SeafilePath::new("repo", "form.ods");
        assert!(matches!(seafile.stat(&path), Err(Error::NotAuthenticated)));
    }
}
