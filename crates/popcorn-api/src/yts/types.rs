use serde::{Deserialize, Serialize};

/// Trackers baked into generated magnet links.
const MAGNET_TRACKERS: &[&str] = &[
    "udp://open.demonii.com:1337/announce",
    "udp://tracker.openbittorrent.com:80",
    "udp://tracker.opentrackr.org:1337/announce",
];

/// Sort key for a listing query, mapped to the API's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Trending,
    Latest,
    Rating,
    Seeds,
    Year,
    Title,
}

impl SortBy {
    pub const ALL: &[SortBy] = &[
        Self::Trending,
        Self::Latest,
        Self::Rating,
        Self::Seeds,
        Self::Year,
        Self::Title,
    ];

    /// The `sort_by` query parameter value.
    pub fn as_query_str(self) -> &'static str {
        match self {
            Self::Trending => "download_count",
            Self::Latest => "date_added",
            Self::Rating => "rating",
            Self::Seeds => "seeds",
            Self::Year => "year",
            Self::Title => "title",
        }
    }
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trending" => Ok(Self::Trending),
            "latest" => Ok(Self::Latest),
            "rating" => Ok(Self::Rating),
            "seeds" => Ok(Self::Seeds),
            "year" => Ok(Self::Year),
            "title" => Ok(Self::Title),
            other => Err(format!("unrecognized sort key: {other}")),
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Trending => "Trending",
            Self::Latest => "Latest",
            Self::Rating => "Rating",
            Self::Seeds => "Seeds",
            Self::Year => "Year",
            Self::Title => "Title",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

impl SortOrder {
    pub fn as_query_str(self) -> &'static str {
        match self {
            Self::Desc => "desc",
            Self::Asc => "asc",
        }
    }
}

/// Recognized genre filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Biography,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Family,
    Fantasy,
    FilmNoir,
    History,
    Horror,
    Music,
    Musical,
    Mystery,
    Romance,
    SciFi,
    Sport,
    Thriller,
    War,
    Western,
}

impl Genre {
    pub const ALL: &[Genre] = &[
        Self::Action,
        Self::Adventure,
        Self::Animation,
        Self::Biography,
        Self::Comedy,
        Self::Crime,
        Self::Documentary,
        Self::Drama,
        Self::Family,
        Self::Fantasy,
        Self::FilmNoir,
        Self::History,
        Self::Horror,
        Self::Music,
        Self::Musical,
        Self::Mystery,
        Self::Romance,
        Self::SciFi,
        Self::Sport,
        Self::Thriller,
        Self::War,
        Self::Western,
    ];

    /// The `genre` query parameter value.
    pub fn as_query_str(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Adventure => "adventure",
            Self::Animation => "animation",
            Self::Biography => "biography",
            Self::Comedy => "comedy",
            Self::Crime => "crime",
            Self::Documentary => "documentary",
            Self::Drama => "drama",
            Self::Family => "family",
            Self::Fantasy => "fantasy",
            Self::FilmNoir => "film-noir",
            Self::History => "history",
            Self::Horror => "horror",
            Self::Music => "music",
            Self::Musical => "musical",
            Self::Mystery => "mystery",
            Self::Romance => "romance",
            Self::SciFi => "sci-fi",
            Self::Sport => "sport",
            Self::Thriller => "thriller",
            Self::War => "war",
            Self::Western => "western",
        }
    }
}

impl std::str::FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Genre::ALL
            .iter()
            .find(|g| g.as_query_str() == lower)
            .copied()
            .ok_or_else(|| format!("unrecognized genre: {s}"))
    }
}

// Display reuses the query vocabulary; the UI layer capitalizes as needed.
impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_query_str())
    }
}

/// Parameters for one listing page request.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub search_term: Option<String>,
    pub genre: Option<Genre>,
    pub sort: SortBy,
    pub order: SortOrder,
    pub minimum_rating: u8,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search_term: None,
            genre: None,
            sort: SortBy::Trending,
            order: SortOrder::Desc,
            minimum_rating: 0,
            page: 1,
            page_size: 20,
        }
    }
}

impl ListQuery {
    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.page_size.to_string()),
            ("sort_by", self.sort.as_query_str().to_string()),
            ("order_by", self.order.as_query_str().to_string()),
            ("minimum_rating", self.minimum_rating.to_string()),
        ];
        if let Some(genre) = self.genre {
            params.push(("genre", genre.as_query_str().to_string()));
        }
        if let Some(ref term) = self.search_term {
            params.push(("query_term", term.clone()));
        }
        params
    }
}

/// One page of listing results.
#[derive(Debug, Clone)]
pub struct MoviePage {
    pub movies: Vec<Movie>,
    /// Total matching movies reported by the API.
    pub movie_count: u64,
    /// True when the page came back full-sized; callers use this to decide
    /// whether to request the next page.
    pub has_more: bool,
}

/// A movie summary as normalized from the listing API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    pub imdb_code: String,
    pub title: String,
    pub title_long: String,
    pub year: u16,
    pub rating: f32,
    pub runtime: u32,
    pub genres: Vec<String>,
    pub synopsis: String,
    pub language: String,
    pub cover_url: Option<String>,
    pub large_cover_url: Option<String>,
    pub torrents: Vec<Torrent>,
}

/// One downloadable quality/size variant of a movie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Torrent {
    pub url: String,
    pub hash: String,
    pub quality: String,
    pub kind: String,
    pub size: String,
    pub size_bytes: u64,
    pub seeds: u32,
    pub peers: u32,
}

impl Movie {
    /// Build a magnet link for the requested quality, falling back to the
    /// first available variant. `None` when the movie has no variants.
    pub fn magnet_link(&self, quality: &str) -> Option<String> {
        let torrent = self
            .torrents
            .iter()
            .find(|t| t.quality == quality)
            .or_else(|| self.torrents.first())?;

        let dn: String = url::form_urlencoded::byte_serialize(self.title.as_bytes()).collect();
        let mut magnet = format!("magnet:?xt=urn:btih:{}&dn={}", torrent.hash, dn);
        for tracker in MAGNET_TRACKERS {
            let tr: String = url::form_urlencoded::byte_serialize(tracker.as_bytes()).collect();
            magnet.push_str("&tr=");
            magnet.push_str(&tr);
        }
        Some(magnet)
    }
}

// ── Raw wire types ──────────────────────────────────────────────

/// The API's response envelope: `{"status": "ok", "status_message": ..., "data": ...}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub status_message: String,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListData {
    #[serde(default)]
    pub movie_count: u64,
    #[serde(default)]
    pub movies: Vec<RawMovie>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailsData {
    pub movie: Option<RawMovie>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SuggestionsData {
    #[serde(default)]
    pub movies: Vec<RawMovie>,
}

/// A movie entry as it appears on the wire. Every field is optional so one
/// malformed entry never aborts the page.
#[derive(Debug, Deserialize)]
pub(crate) struct RawMovie {
    pub id: Option<u64>,
    pub imdb_code: Option<String>,
    pub title: Option<String>,
    pub title_long: Option<String>,
    pub year: Option<u16>,
    pub rating: Option<f32>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub synopsis: Option<String>,
    pub language: Option<String>,
    pub medium_cover_image: Option<String>,
    pub large_cover_image: Option<String>,
    #[serde(default)]
    pub torrents: Vec<RawTorrent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTorrent {
    pub url: Option<String>,
    pub hash: Option<String>,
    pub quality: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub size: Option<String>,
    pub size_bytes: Option<u64>,
    pub seeds: Option<u32>,
    pub peers: Option<u32>,
}

impl RawMovie {
    /// Normalize into a [`Movie`], or `None` when a required field (the
    /// identifiers or the title) is missing.
    pub(crate) fn into_movie(self) -> Option<Movie> {
        let id = self.id?;
        let imdb_code = self.imdb_code.filter(|c| !c.is_empty())?;
        let title = self.title.filter(|t| !t.is_empty())?;

        let torrents = self
            .torrents
            .into_iter()
            .filter_map(RawTorrent::into_torrent)
            .collect();

        Some(Movie {
            id,
            imdb_code,
            title_long: self.title_long.unwrap_or_else(|| title.clone()),
            title,
            year: self.year.unwrap_or(0),
            rating: self.rating.unwrap_or(0.0),
            runtime: self.runtime.unwrap_or(0),
            genres: self.genres,
            synopsis: self.synopsis.unwrap_or_default(),
            language: self.language.unwrap_or_default(),
            cover_url: self.medium_cover_image,
            large_cover_url: self.large_cover_image,
            torrents,
        })
    }
}

impl RawTorrent {
    /// A variant without a hash can never produce a magnet link; drop it.
    fn into_torrent(self) -> Option<Torrent> {
        let hash = self.hash.filter(|h| !h.is_empty())?;
        Some(Torrent {
            url: self.url.unwrap_or_default(),
            hash,
            quality: self.quality.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            size: self.size.unwrap_or_default(),
            size_bytes: self.size_bytes.unwrap_or(0),
            seeds: self.seeds.unwrap_or(0),
            peers: self.peers.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_with_torrents(torrents: Vec<Torrent>) -> Movie {
        Movie {
            id: 10,
            imdb_code: "tt0133093".into(),
            title: "The Matrix".into(),
            title_long: "The Matrix (1999)".into(),
            year: 1999,
            rating: 8.7,
            runtime: 136,
            genres: vec!["Action".into(), "Sci-Fi".into()],
            synopsis: String::new(),
            language: "en".into(),
            cover_url: None,
            large_cover_url: None,
            torrents,
        }
    }

    fn torrent(quality: &str, hash: &str) -> Torrent {
        Torrent {
            url: String::new(),
            hash: hash.into(),
            quality: quality.into(),
            kind: "web".into(),
            size: "2.0 GB".into(),
            size_bytes: 2_000_000_000,
            seeds: 100,
            peers: 10,
        }
    }

    #[test]
    fn test_sort_query_mapping() {
        assert_eq!(SortBy::Trending.as_query_str(), "download_count");
        assert_eq!(SortBy::Latest.as_query_str(), "date_added");
        assert_eq!("seeds".parse::<SortBy>().unwrap(), SortBy::Seeds);
        assert!("popularity".parse::<SortBy>().is_err());
    }

    #[test]
    fn test_genre_parse() {
        assert_eq!("Sci-Fi".parse::<Genre>().unwrap(), Genre::SciFi);
        assert_eq!("film-noir".parse::<Genre>().unwrap(), Genre::FilmNoir);
        assert!("polka".parse::<Genre>().is_err());
        assert_eq!(Genre::ALL.len(), 22);
    }

    #[test]
    fn test_query_params() {
        let query = ListQuery {
            search_term: Some("matrix".into()),
            genre: Some(Genre::Action),
            sort: SortBy::Rating,
            page: 3,
            page_size: 50,
            ..Default::default()
        };
        let params = query.to_params();
        assert!(params.contains(&("page", "3".into())));
        assert!(params.contains(&("limit", "50".into())));
        assert!(params.contains(&("sort_by", "rating".into())));
        assert!(params.contains(&("genre", "action".into())));
        assert!(params.contains(&("query_term", "matrix".into())));
    }

    #[test]
    fn test_query_params_omit_optional() {
        let params = ListQuery::default().to_params();
        assert!(!params.iter().any(|(k, _)| *k == "genre"));
        assert!(!params.iter().any(|(k, _)| *k == "query_term"));
    }

    #[test]
    fn test_magnet_preferred_quality() {
        let movie = movie_with_torrents(vec![torrent("720p", "aaa"), torrent("1080p", "bbb")]);
        let magnet = movie.magnet_link("1080p").unwrap();
        assert!(magnet.starts_with("magnet:?xt=urn:btih:bbb"));
        assert!(magnet.contains("dn=The+Matrix"));
        assert!(magnet.contains("&tr="));
    }

    #[test]
    fn test_magnet_falls_back_to_first_variant() {
        let movie = movie_with_torrents(vec![torrent("720p", "aaa")]);
        let magnet = movie.magnet_link("2160p").unwrap();
        assert!(magnet.starts_with("magnet:?xt=urn:btih:aaa"));
    }

    #[test]
    fn test_magnet_none_without_variants() {
        let movie = movie_with_torrents(vec![]);
        assert!(movie.magnet_link("1080p").is_none());
    }

    #[test]
    fn test_raw_movie_requires_title_and_ids() {
        let raw: RawMovie = serde_json::from_value(serde_json::json!({
            "id": 1, "imdb_code": "tt1", "year": 2020
        }))
        .unwrap();
        assert!(raw.into_movie().is_none());

        let raw: RawMovie = serde_json::from_value(serde_json::json!({
            "id": 1, "imdb_code": "tt1", "title": "Ok Movie"
        }))
        .unwrap();
        let movie = raw.into_movie().unwrap();
        assert_eq!(movie.title, "Ok Movie");
        assert_eq!(movie.title_long, "Ok Movie");
        assert_eq!(movie.year, 0);
    }

    #[test]
    fn test_raw_torrent_without_hash_dropped() {
        let raw: RawMovie = serde_json::from_value(serde_json::json!({
            "id": 1, "imdb_code": "tt1", "title": "Movie",
            "torrents": [
                {"quality": "720p"},
                {"quality": "1080p", "hash": "abc", "size_bytes": 1}
            ]
        }))
        .unwrap();
        let movie = raw.into_movie().unwrap();
        assert_eq!(movie.torrents.len(), 1);
        assert_eq!(movie.torrents[0].hash, "abc");
    }
}
