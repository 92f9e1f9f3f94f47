use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::{MirrorFailure, YtsError};
use super::types::{
    DetailsData, Envelope, ListData, ListQuery, Movie, MoviePage, RawMovie, SuggestionsData,
};

/// Mirror hostnames tried in declared order when none are configured.
pub const DEFAULT_MIRRORS: &[&str] = &[
    "https://yts.mx/api/v2",
    "https://yts.lt/api/v2",
    "https://yts.rs/api/v2",
    "https://yts.torrentbay.to/api/v2",
];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// YTS listing API client with ordered mirror fallback.
///
/// Each call walks the mirror list sequentially, one in-flight request at a
/// time, and returns on the first mirror that answers with a well-formed
/// `status == "ok"` body. There is no caching and no retry beyond the single
/// pass over the mirrors.
pub struct YtsClient {
    mirrors: Vec<String>,
    timeout: Duration,
    http: Client,
}

impl YtsClient {
    pub fn new(mirrors: Vec<String>, timeout: Duration) -> Self {
        Self {
            mirrors,
            timeout,
            http: Client::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            DEFAULT_MIRRORS.iter().map(|s| s.to_string()).collect(),
            DEFAULT_TIMEOUT,
        )
    }

    /// Fetch one page of movie summaries matching the query.
    ///
    /// Entries missing an identifier or title are dropped from the page and
    /// logged; they never abort the call. `has_more` is set when the
    /// returned page is full-sized.
    pub async fn list_movies(&self, query: &ListQuery) -> Result<MoviePage, YtsError> {
        let params = query.to_params();
        let data: ListData = self.request("list_movies.json", &params).await?;

        let raw_count = data.movies.len();
        let movies: Vec<Movie> = data
            .movies
            .into_iter()
            .filter_map(RawMovie::into_movie)
            .collect();
        if movies.len() < raw_count {
            warn!(
                dropped = raw_count - movies.len(),
                "Dropped listing entries with missing id or title"
            );
        }

        Ok(MoviePage {
            has_more: movies.len() == query.page_size as usize,
            movie_count: data.movie_count,
            movies,
        })
    }

    /// Fetch full details for one movie, or `None` when the API has no
    /// usable entry for that id.
    pub async fn movie_details(&self, movie_id: u64) -> Result<Option<Movie>, YtsError> {
        let params = [
            ("movie_id", movie_id.to_string()),
            ("with_images", "true".to_string()),
        ];
        let data: DetailsData = self.request("movie_details.json", &params).await?;
        Ok(data.movie.and_then(RawMovie::into_movie))
    }

    /// Fetch suggested movies related to the given movie.
    pub async fn suggestions(&self, movie_id: u64) -> Result<Vec<Movie>, YtsError> {
        let params = [("movie_id", movie_id.to_string())];
        let data: SuggestionsData = self.request("movie_suggestions.json", &params).await?;
        Ok(data
            .movies
            .into_iter()
            .filter_map(RawMovie::into_movie)
            .collect())
    }

    /// Issue one GET against each mirror in order until one succeeds.
    ///
    /// Success requires a 2xx status, a parseable envelope, `status == "ok"`
    /// and a present `data` field; anything else advances to the next
    /// mirror. When every mirror fails, the aggregate error carries one
    /// reason per mirror.
    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, YtsError> {
        let mut failures = Vec::with_capacity(self.mirrors.len());

        for mirror in &self.mirrors {
            let url = format!("{}/{endpoint}", mirror.trim_end_matches('/'));
            debug!(mirror = %mirror, endpoint, "Trying listing mirror");

            match self.try_mirror(&url, params).await {
                Ok(data) => {
                    if !failures.is_empty() {
                        debug!(mirror = %mirror, skipped = failures.len(), "Mirror fallback succeeded");
                    }
                    return Ok(data);
                }
                Err(reason) => {
                    warn!(mirror = %mirror, reason = %reason, endpoint, "Listing mirror failed");
                    failures.push(MirrorFailure {
                        mirror: mirror.clone(),
                        reason,
                    });
                }
            }
        }

        Err(YtsError::Unavailable(failures))
    }

    async fn try_mirror<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, String> {
        let resp = self
            .http
            .get(url)
            .query(params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| format!("malformed body: {e}"))?;

        if envelope.status != "ok" {
            return Err(format!(
                "API status {:?}: {}",
                envelope.status, envelope.status_message
            ));
        }
        envelope.data.ok_or_else(|| "missing data field".to_string())
    }
}
