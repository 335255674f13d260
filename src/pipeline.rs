//! Exports the [`Pipeline`], which issues the upstream requests behind each
//! reading page and assembles the results:
//!
//! * [`Pipeline::surah`] fetches one bundle holding both editions of a surah.
//! * [`Pipeline::juz`] fetches the two editions of a juz concurrently.
//! * [`Pipeline::hadith_chapter`] fetches one page of a hadith chapter.
//!
//! Every operation is all-or-nothing: if any required request fails, the
//! whole operation fails and no partial result is built. Range and collection
//! checks happen before any request is made. Nothing is retried.

use crate::collection;
use crate::fetch::Fetcher;
use crate::hadith::{self, ChapterListing, ChaptersResponse, NarrationsResponse, RawChapter};
use crate::quran::{self, Chapter, ChapterRange, Envelope, JuzEdition, RangeKind, SurahEdition};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, info, warn};
use url::Url;

/// Where the upstream services live and which editions to request.
#[derive(Clone, Debug)]
pub struct Endpoints {
    /// Base URL of the Quran text service. Should end in a slash.
    pub quran_api: Url,

    /// The edition carrying Tajweed markup.
    pub arabic_edition: String,

    /// The translation edition.
    pub translation_edition: String,

    /// Base URL of the hadith service. Should end in a slash.
    pub hadith_api: Url,

    pub hadith_api_key: Option<String>,
}

/// Fetches and assembles reading ranges through a [`Fetcher`].
pub struct Pipeline<F> {
    fetcher: F,
    endpoints: Endpoints,
}

impl<F: Fetcher> Pipeline<F> {
    pub fn new(fetcher: F, endpoints: Endpoints) -> Pipeline<F> {
        Pipeline { fetcher, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Fetches surah `number` with both editions in a single request and
    /// aligns them.
    pub async fn surah(&self, number: i32) -> Result<ChapterRange> {
        let kind = RangeKind::surah(number).ok_or(NotFound::Surah(number))?;
        let url = self.endpoints.quran_api.join(&format!(
            "surah/{}/editions/{},{}",
            kind.number(),
            self.endpoints.arabic_edition,
            self.endpoints.translation_edition,
        ))?;

        let mut editions: Vec<SurahEdition> = self.get_quran(&url).await?;
        if editions.len() < 2 {
            return Err(Failure::Incomplete {
                path: url.path().to_owned(),
                editions: editions.len(),
            }
            .into());
        }
        let translation = editions.swap_remove(1);
        let arabic = editions.swap_remove(0);

        let range = quran::align(kind, Some(arabic.chapter), arabic.ayahs, translation.ayahs);
        info!(range = %kind, verses = range.verses.len(), "assembled");
        Ok(range)
    }

    /// Fetches juz `number`. The Quran service can't bundle editions for a
    /// juz, so the two editions are requested separately and concurrently;
    /// the first failure fails the whole operation.
    pub async fn juz(&self, number: i32) -> Result<ChapterRange> {
        let kind = RangeKind::juz(number).ok_or(NotFound::Juz(number))?;
        let edition_url = |edition: &str| {
            self.endpoints
                .quran_api
                .join(&format!("juz/{}/{}", kind.number(), edition))
        };
        let arabic_url = edition_url(&self.endpoints.arabic_edition)?;
        let translation_url = edition_url(&self.endpoints.translation_edition)?;

        let (arabic, translation) = tokio::try_join!(
            self.get_quran::<JuzEdition>(&arabic_url),
            self.get_quran::<JuzEdition>(&translation_url),
        )?;

        let range = quran::align(kind, None, arabic.ayahs, translation.ayahs);
        info!(range = %kind, verses = range.verses.len(), "assembled");
        Ok(range)
    }

    /// Fetches the list of all surahs.
    pub async fn surah_index(&self) -> Result<Vec<Chapter>> {
        let url = self.endpoints.quran_api.join("surah")?;
        self.get_quran(&url).await
    }

    /// Fetches page `page` of chapter `chapter` in collection `slug`, with
    /// `page_size` narrations per page. Unknown collections are rejected
    /// without a request.
    pub async fn hadith_chapter(
        &self,
        slug: &str,
        chapter: u32,
        page: u32,
        page_size: u32,
    ) -> Result<ChapterListing> {
        let collection = collection::find(slug)
            .ok_or_else(|| NotFound::Collection(slug.to_owned()))?;
        if chapter == 0 {
            return Err(NotFound::Chapter(chapter).into());
        }
        if page == 0 || page_size == 0 {
            return Err(NotFound::Page(page).into());
        }
        let api_key = self.hadith_api_key()?;

        let mut url = self.endpoints.hadith_api.join("hadiths")?;
        url.query_pairs_mut()
            .append_pair("apiKey", api_key)
            .append_pair("bookSlug", collection.slug)
            .append_pair("chapterNumber", &chapter.to_string())
            .append_pair("page", &page.to_string())
            .append_pair("paginate", &page_size.to_string());

        let response: NarrationsResponse = self.get_json(&url).await?;
        if !hadith::body_status_ok(&response.status) {
            return Err(body_failure(&url, &response.status).into());
        }

        let listing = ChapterListing::assemble(
            collection,
            chapter,
            page,
            page_size,
            response.hadiths,
        );
        info!(
            collection = collection.slug,
            chapter,
            page = listing.pagination.current_page,
            narrations = listing.narrations.len(),
            "assembled"
        );
        Ok(listing)
    }

    /// Fetches the chapter list of collection `slug`. Unknown collections are
    /// rejected without a request.
    pub async fn hadith_chapters(&self, slug: &str) -> Result<Vec<RawChapter>> {
        let collection = collection::find(slug)
            .ok_or_else(|| NotFound::Collection(slug.to_owned()))?;
        let api_key = self.hadith_api_key()?;

        let mut url = self
            .endpoints
            .hadith_api
            .join(&format!("{}/chapters", collection.slug))?;
        url.query_pairs_mut().append_pair("apiKey", api_key);

        let response: ChaptersResponse = self.get_json(&url).await?;
        if !hadith::body_status_ok(&response.status) {
            return Err(body_failure(&url, &response.status).into());
        }
        Ok(response.chapters)
    }

    fn hadith_api_key(&self) -> Result<&str> {
        match self.endpoints.hadith_api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => {
                warn!("no hadith API key configured");
                Err(Failure::MissingApiKey.into())
            }
        }
    }

    /// Fetches a Quran service envelope and decodes its `data` as `T`. Both
    /// the HTTP status and the envelope code must report success.
    async fn get_quran<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let envelope: Envelope = self.get_json(url).await?;
        if envelope.code != 200 {
            warn!(
                path = url.path(),
                code = envelope.code,
                status = %envelope.status,
                "upstream reported failure"
            );
            return Err(Failure::Status {
                path: url.path().to_owned(),
                code: envelope.code,
            }
            .into());
        }
        serde_json::from_value(envelope.data).map_err(|err| {
            Failure::Decode {
                path: url.path().to_owned(),
                err,
            }
            .into()
        })
    }

    /// Fetches `url` and decodes the body as JSON. Only the path is logged,
    /// since the query may hold an API key.
    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        debug!(path = url.path(), "fetching");
        let reply = self.fetcher.get(url).await.map_err(|err| Failure::Transport {
            path: url.path().to_owned(),
            err,
        })?;
        if !reply.is_success() {
            warn!(path = url.path(), status = reply.status, "upstream request failed");
            return Err(Failure::Status {
                path: url.path().to_owned(),
                code: reply.status,
            }
            .into());
        }
        serde_json::from_str(&reply.body).map_err(|err| {
            Failure::Decode {
                path: url.path().to_owned(),
                err,
            }
            .into()
        })
    }
}

fn body_failure(url: &Url, status: &serde_json::Value) -> Failure {
    let code = status.as_u64().unwrap_or(0) as u16;
    warn!(path = url.path(), code, "upstream reported failure");
    Failure::Status {
        path: url.path().to_owned(),
        code,
    }
}

/// The result of a pipeline operation.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for pipeline operations.
#[derive(Debug)]
pub enum Error {
    /// Returned when the requested range, collection, chapter or page doesn't
    /// exist. No request was made.
    NotFound(NotFound),

    /// Returned when a required upstream request didn't succeed.
    UpstreamFailure(Failure),

    /// Returned when an endpoint URL can't be built from its configured base.
    Url(url::ParseError),
}

impl Error {
    /// Whether the error means "nothing to show" rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// What was not found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotFound {
    Surah(i32),
    Juz(i32),
    Collection(String),
    Chapter(u32),
    Page(u32),
}

/// Why an upstream request didn't succeed.
#[derive(Debug)]
pub enum Failure {
    /// Returned for a non-success status, either HTTP or in the body.
    Status { path: String, code: u16 },

    /// Returned when the request couldn't be completed.
    Transport { path: String, err: reqwest::Error },

    /// Returned when the body wasn't the expected JSON.
    Decode {
        path: String,
        err: serde_json::Error,
    },

    /// Returned when a bundle didn't hold both requested editions.
    Incomplete { path: String, editions: usize },

    /// Returned when the hadith service is needed but no API key is
    /// configured. No request was made.
    MissingApiKey,
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound(what) => write!(f, "{} not found", what),
            Error::UpstreamFailure(err) => write!(f, "upstream failure: {}", err),
            Error::Url(err) => err.fmt(f),
        }
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NotFound::Surah(n) => write!(f, "Surah {}", n),
            NotFound::Juz(n) => write!(f, "Juz {}", n),
            NotFound::Collection(slug) => write!(f, "Collection `{}`", slug),
            NotFound::Chapter(n) => write!(f, "Chapter {}", n),
            NotFound::Page(n) => write!(f, "Page {}", n),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Failure::Status { path, code } => {
                write!(f, "`{}` returned status {}", path, code)
            }
            Failure::Transport { path, err } => {
                write!(f, "requesting `{}`: {}", path, err)
            }
            Failure::Decode { path, err } => {
                write!(f, "decoding `{}`: {}", path, err)
            }
            Failure::Incomplete { path, editions } => write!(
                f,
                "`{}` returned {} edition(s), wanted 2",
                path, editions
            ),
            Failure::MissingApiKey => write!(f, "no hadith API key configured"),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound(_) => None,
            Error::UpstreamFailure(err) => Some(err),
            Error::Url(err) => Some(err),
        }
    }
}

impl std::error::Error for Failure {
    /// Implements the [`std::error::Error`] trait for [`Failure`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Failure::Transport { err, .. } => Some(err),
            Failure::Decode { err, .. } => Some(err),
            _ => None,
        }
    }
}

impl From<NotFound> for Error {
    fn from(what: NotFound) -> Error {
        Error::NotFound(what)
    }
}

impl From<Failure> for Error {
    fn from(err: Failure) -> Error {
        Error::UpstreamFailure(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator when joining endpoint URLs.
    fn from(err: url::ParseError) -> Error {
        Error::Url(err)
    }
}
