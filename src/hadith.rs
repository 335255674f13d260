//! Defines the narration data for hadith chapter pages. The upstream hadith
//! service is loose about its response shape: the records may come back
//! wrapped in a page envelope, as a bare array, or not at all. [`Envelope`]
//! decodes that once, at the boundary, and [`ChapterListing::assemble`] turns
//! it into a page of narrations sorted by hadith number.

use crate::collection::Collection;
use serde::de::Deserializer;
use serde::Deserialize;
use serde_json::Value;

/// A narration record as returned by the upstream service.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawNarration {
    /// Usually a number, sometimes a string, occasionally missing.
    #[serde(default)]
    pub hadith_number: Value,

    #[serde(default)]
    pub english_narrator: Option<String>,

    #[serde(default)]
    pub hadith_english: Option<String>,

    #[serde(default)]
    pub hadith_arabic: Option<String>,

    #[serde(default)]
    pub hadith_urdu: Option<String>,

    /// The grading (e.g., `Sahih`).
    #[serde(default)]
    pub status: Option<String>,

    /// Some responses nest the chapter fields in an object...
    #[serde(default)]
    pub chapter: Option<RawChapter>,

    /// ...and others inline them on the record.
    #[serde(flatten)]
    pub inline_chapter: RawChapter,
}

/// The chapter fields embedded in a narration record, and the shape of one
/// entry in a collection's chapter list.
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawChapter {
    #[serde(default, deserialize_with = "display_string")]
    pub chapter_number: Option<String>,

    #[serde(default)]
    pub chapter_english: Option<String>,

    #[serde(default)]
    pub chapter_arabic: Option<String>,

    #[serde(default)]
    pub hadith_range: Option<String>,
}

/// Deserializes a number or string field into its textual form.
fn display_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(display(&Value::deserialize(deserializer)?))
}

fn display(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses a hadith number for ordering. Anything that isn't a non-negative
/// integer orders as 0.
pub fn sequence_number(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// The paging fields the upstream service may attach to a page of records.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct PageEnvelope {
    pub data: Vec<RawNarration>,

    #[serde(default)]
    pub total: Option<u64>,

    #[serde(default)]
    pub current_page: Option<u32>,

    #[serde(default)]
    pub last_page: Option<u32>,
}

/// The record container in a hadith response.
#[derive(Clone, Debug)]
pub enum Envelope {
    /// Records with paging information.
    Paged(PageEnvelope),

    /// A bare array of records.
    Plain(Vec<RawNarration>),

    /// No records field at all (or `null`).
    Empty,
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope::Empty
    }
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D>(deserializer: D) -> Result<Envelope, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Paged(PageEnvelope),
            Plain(Vec<RawNarration>),
        }

        Ok(match Option::<Shape>::deserialize(deserializer)? {
            Some(Shape::Paged(page)) => Envelope::Paged(page),
            Some(Shape::Plain(records)) => Envelope::Plain(records),
            None => Envelope::Empty,
        })
    }
}

/// The top-level body of a narrations response.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct NarrationsResponse {
    #[serde(default)]
    pub status: Value,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub hadiths: Envelope,
}

/// The top-level body of a chapter list response.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ChaptersResponse {
    #[serde(default)]
    pub status: Value,

    #[serde(default)]
    pub chapters: Vec<RawChapter>,
}

/// Whether a body-level `status` field reports success. Bodies without a
/// numeric status are judged by their HTTP status alone.
pub fn body_status_ok(status: &Value) -> bool {
    match status.as_u64() {
        Some(code) => code == 200,
        None => true,
    }
}

/// The title of a hadith chapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChapterHeading {
    pub number: Option<String>,
    pub english: Option<String>,
    pub arabic: Option<String>,
}

impl ChapterHeading {
    /// Reads the heading from a record, preferring the nested chapter object
    /// over the inline fields.
    pub fn from_record(record: &RawNarration) -> Option<ChapterHeading> {
        let chapter = record
            .chapter
            .as_ref()
            .unwrap_or(&record.inline_chapter);
        if chapter.chapter_english.is_none() && chapter.chapter_arabic.is_none() {
            return None;
        }
        Some(ChapterHeading {
            number: chapter.chapter_number.clone(),
            english: chapter.chapter_english.clone(),
            arabic: chapter.chapter_arabic.clone(),
        })
    }
}

/// A narration ready for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Narration {
    /// The hadith number as the upstream service wrote it.
    pub number: String,

    /// The hadith number used for ordering; see [`sequence_number`].
    pub sequence: u64,

    pub narrator: Option<String>,
    pub english: Option<String>,
    pub arabic: Option<String>,
    pub urdu: Option<String>,
    pub grade: Option<String>,
}

impl From<RawNarration> for Narration {
    fn from(raw: RawNarration) -> Narration {
        Narration {
            number: display(&raw.hadith_number).unwrap_or_default(),
            sequence: sequence_number(&raw.hadith_number),
            narrator: raw.english_narrator,
            english: raw.hadith_english,
            arabic: raw.hadith_arabic,
            urdu: raw.hadith_urdu,
            grade: raw.status,
        }
    }
}

impl Narration {
    /// Case-insensitive match against the English text, narrator and number;
    /// the Urdu text is matched as written.
    fn matches(&self, lowered: &str, trimmed: &str) -> bool {
        let contains = |field: &Option<String>| {
            field
                .as_ref()
                .map_or(false, |s| s.to_lowercase().contains(lowered))
        };
        contains(&self.english)
            || contains(&self.narrator)
            || self.urdu.as_ref().map_or(false, |s| s.contains(trimmed))
            || self.number.to_lowercase().contains(lowered)
    }
}

/// Paging information for a [`ChapterListing`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub total_pages: u32,
    pub current_page: u32,
}

impl Pagination {
    /// A single page holding all `count` records.
    pub fn single(count: usize) -> Pagination {
        Pagination {
            total: count as u64,
            total_pages: 1,
            current_page: 1,
        }
    }

    pub fn prev_page(&self) -> Option<u32> {
        if self.current_page > 1 {
            Some(self.current_page - 1)
        } else {
            None
        }
    }

    pub fn next_page(&self) -> Option<u32> {
        if self.current_page < self.total_pages {
            Some(self.current_page + 1)
        } else {
            None
        }
    }
}

/// Derives paging from an upstream page envelope. Totals the service didn't
/// supply are computed from what it did; with no totals at all the records
/// are taken to be a single page.
fn paginate(page: &PageEnvelope, requested_page: u32, page_size: u32) -> Pagination {
    if page.total.is_none() && page.last_page.is_none() {
        return Pagination::single(page.data.len());
    }
    let total = page.total.unwrap_or(page.data.len() as u64);
    let computed = total.div_ceil(u64::from(page_size.max(1))) as u32;
    Pagination {
        total,
        total_pages: page.last_page.unwrap_or(computed).max(1),
        current_page: page.current_page.unwrap_or(requested_page),
    }
}

/// One page of narrations from a chapter of a collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChapterListing {
    pub collection: &'static Collection,
    pub chapter: u32,

    /// Taken from the first record's chapter fields.
    pub heading: Option<ChapterHeading>,

    /// Sorted by [`Narration::sequence`], ascending.
    pub narrations: Vec<Narration>,

    pub pagination: Pagination,
}

impl ChapterListing {
    /// Builds a listing from a decoded envelope. Records are stable-sorted by
    /// hadith number whatever order the service returned them in.
    pub fn assemble(
        collection: &'static Collection,
        chapter: u32,
        requested_page: u32,
        page_size: u32,
        envelope: Envelope,
    ) -> ChapterListing {
        let (records, pagination) = match envelope {
            Envelope::Paged(page) => {
                let pagination = paginate(&page, requested_page, page_size);
                (page.data, pagination)
            }
            Envelope::Plain(records) => {
                let pagination = Pagination::single(records.len());
                (records, pagination)
            }
            Envelope::Empty => (Vec::new(), Pagination::single(0)),
        };

        let heading = records.first().and_then(ChapterHeading::from_record);
        let mut narrations: Vec<Narration> =
            records.into_iter().map(Narration::from).collect();
        narrations.sort_by_key(|n| n.sequence);

        ChapterListing {
            collection,
            chapter,
            heading,
            narrations,
            pagination,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.narrations.is_empty()
    }

    /// Returns the narrations matching `query`, in listing order. A blank
    /// query matches everything.
    pub fn search(&self, query: &str) -> Vec<&Narration> {
        let trimmed = query.trim();
        let lowered = trimmed.to_lowercase();
        self.narrations
            .iter()
            .filter(|n| trimmed.is_empty() || n.matches(&lowered, trimmed))
            .collect()
    }
}

/// Returns the chapters matching `query` by English title, Arabic title, or
/// number. A blank query matches everything.
pub fn filter_chapters<'a>(chapters: &'a [RawChapter], query: &str) -> Vec<&'a RawChapter> {
    let trimmed = query.trim();
    let lowered = trimmed.to_lowercase();
    let lower_contains = |field: &Option<String>| {
        field
            .as_ref()
            .map_or(false, |s| s.to_lowercase().contains(&lowered))
    };
    chapters
        .iter()
        .filter(|c| {
            trimmed.is_empty()
                || lower_contains(&c.chapter_english)
                || c.chapter_arabic.as_ref().map_or(false, |s| s.contains(trimmed))
                || lower_contains(&c.chapter_number)
        })
        .collect()
}
