use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use reqwest::Client;
use tracing::{debug, info};

use super::error::QbError;

/// qBittorrent WebUI client.
///
/// Authenticates once against the login endpoint and submits magnet links
/// with the resulting session cookie. Every call is a single attempt; retry
/// policy belongs to the caller.
pub struct QbClient {
    base_url: String,
    http: Client,
}

/// An authenticated WebUI session (the `SID` cookie).
#[derive(Debug, Clone)]
pub struct Session {
    sid: String,
}

impl Session {
    pub fn sid(&self) -> &str {
        &self.sid
    }

    fn cookie(&self) -> String {
        format!("SID={}", self.sid)
    }
}

/// Optional submit parameters forwarded to the add endpoint.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub category: Option<String>,
    pub save_path: Option<String>,
}

impl QbClient {
    pub fn new(host: &str, port: u16) -> Self {
        Self::with_base_url(format!("http://{host}:{port}"))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: Client::new(),
        }
    }

    /// Authenticate against the WebUI and return the session cookie.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, QbError> {
        let resp = self
            .http
            .post(format!("{}/api/v2/auth/login", self.base_url))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| QbError::Unreachable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(QbError::AuthFailed);
        }

        let sid = extract_sid(resp.headers());
        let body = resp.text().await.unwrap_or_default();
        // The login endpoint answers 200 with "Ok." or "Fails." in the body.
        if body.trim() != "Ok." {
            return Err(QbError::AuthFailed);
        }

        let session = sid.map(|sid| Session { sid }).ok_or(QbError::AuthFailed)?;
        info!("Authenticated against qBittorrent WebUI");
        Ok(session)
    }

    /// Submit a magnet link for download.
    pub async fn add_magnet(
        &self,
        session: &Session,
        magnet: &str,
        options: &AddOptions,
    ) -> Result<(), QbError> {
        let mut form: Vec<(&str, String)> = vec![("urls", magnet.to_string())];
        if let Some(ref category) = options.category {
            form.push(("category", category.clone()));
        }
        if let Some(ref save_path) = options.save_path {
            form.push(("savepath", save_path.clone()));
        }

        let resp = self
            .http
            .post(format!("{}/api/v2/torrents/add", self.base_url))
            .header(COOKIE, session.cookie())
            .form(&form)
            .send()
            .await
            .map_err(|e| QbError::Unreachable(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(QbError::Submit(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }
        if body.trim() == "Fails." {
            return Err(QbError::Submit("endpoint rejected the link".into()));
        }

        debug!("Magnet link submitted");
        Ok(())
    }

    /// Fetch the qBittorrent application version, confirming the session
    /// is usable.
    pub async fn version(&self, session: &Session) -> Result<String, QbError> {
        let resp = self
            .http
            .get(format!("{}/api/v2/app/version", self.base_url))
            .header(COOKIE, session.cookie())
            .send()
            .await
            .map_err(|e| QbError::Unreachable(e.to_string()))?;

        if resp.status().as_u16() == 403 {
            return Err(QbError::AuthFailed);
        }
        if !resp.status().is_success() {
            return Err(QbError::Unreachable(format!(
                "HTTP {}",
                resp.status().as_u16()
            )));
        }
        resp.text()
            .await
            .map_err(|e| QbError::Unreachable(e.to_string()))
    }
}

/// Pull the `SID` value out of the login response's Set-Cookie headers.
fn extract_sid(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            cookie
                .split(';')
                .next()?
                .trim()
                .strip_prefix("SID=")
                .map(str::to_string)
        })
}
