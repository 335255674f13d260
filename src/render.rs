//! Renders reading pages and index pages to HTML through gtmpl templates.
//! Every page is in one of three states:
//!
//! * found: there is something to show;
//! * empty: the operation succeeded but nothing matched (the active search
//!   term, if any, is echoed back);
//! * unavailable: the range wasn't found or the upstream service failed.
//!
//! The template receives an object with the fields `title`, `found`, `empty`,
//! `unavailable`, `message`, `search`, `item`, `prev` and `next`. `item`
//! always has the same fields for a given template, whatever the state.

use crate::collection::{self, COLLECTIONS};
use crate::hadith::{self, ChapterListing, RawChapter};
use crate::markup;
use crate::pipeline;
use crate::quran::{self, Chapter, ChapterRange, RangeKind, Verse, JUZ_INDEX};
use crate::value::{escape, object};
use gtmpl::{Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::io;
use url::Url;

pub const VERSES_TEMPLATE: &str = include_str!("../templates/verses.html");
pub const HADITH_TEMPLATE: &str = include_str!("../templates/hadith.html");
pub const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

const UNAVAILABLE: &str = "Not found or unavailable.";

/// How the verses of a range are laid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// One card per verse with its reference and translation.
    #[default]
    Cards,

    /// One reading flow of Arabic text with inline verse-number markers and
    /// no translation.
    Continuous,
}

/// Templates and links for every kind of page.
pub struct Renderer {
    verses: Template,
    hadith: Template,
    index: Template,

    /// The base URL for prev/next and index links.
    site_root: Url,
}

impl Renderer {
    /// Parses the given template sources.
    pub fn new(verses: &str, hadith: &str, index: &str, site_root: Url) -> Result<Renderer> {
        Ok(Renderer {
            verses: parse_template(verses)?,
            hadith: parse_template(hadith)?,
            index: parse_template(index)?,
            site_root,
        })
    }

    /// A renderer using the templates built into the binary.
    pub fn embedded(site_root: Url) -> Result<Renderer> {
        Renderer::new(VERSES_TEMPLATE, HADITH_TEMPLATE, INDEX_TEMPLATE, site_root)
    }

    /// Renders a surah or juz page. `requested` names the range for the
    /// title of an unavailable page.
    pub fn verses<W: io::Write>(
        &self,
        w: &mut W,
        requested: &str,
        outcome: &pipeline::Result<ChapterRange>,
        layout: Layout,
    ) -> Result<()> {
        let page = match outcome {
            Ok(range) => Page {
                title: match &range.chapter {
                    Some(chapter) => format!("{}: {}", range.kind, chapter.english_name),
                    None => range.kind.to_string(),
                },
                state: State::found_if(!range.is_empty()),
                message: None,
                search: None,
                item: range_item(range, layout),
                prev: range.kind.prev().map(|kind| self.range_url(kind)).transpose()?,
                next: range.kind.next().map(|kind| self.range_url(kind)).transpose()?,
            },
            Err(_) => Page::unavailable(requested, range_placeholder(layout)),
        };
        write_page(&self.verses, &page, w)
    }

    /// Renders one page of a hadith chapter, narrowed to the narrations
    /// matching `search`.
    pub fn hadith<W: io::Write>(
        &self,
        w: &mut W,
        requested: &str,
        outcome: &pipeline::Result<ChapterListing>,
        search: &str,
    ) -> Result<()> {
        let page = match outcome {
            Ok(listing) => {
                let visible = listing.search(search);
                Page {
                    title: match listing.heading.as_ref().and_then(|h| h.english.as_deref()) {
                        Some(english) => format!(
                            "{}, chapter {}: {}",
                            listing.collection.name, listing.chapter, english
                        ),
                        None => format!(
                            "{}, chapter {}",
                            listing.collection.name, listing.chapter
                        ),
                    },
                    state: State::found_if(!visible.is_empty()),
                    message: None,
                    search: Some(search),
                    item: object([
                        ("collection", Value::from(listing.collection)),
                        (
                            "heading",
                            listing.heading.as_ref().map_or(Value::Nil, Value::from),
                        ),
                        (
                            "narrations",
                            Value::Array(visible.into_iter().map(Value::from).collect()),
                        ),
                        ("pagination", Value::from(&listing.pagination)),
                    ]),
                    prev: listing
                        .pagination
                        .prev_page()
                        .map(|page| self.hadith_url(listing, page))
                        .transpose()?,
                    next: listing
                        .pagination
                        .next_page()
                        .map(|page| self.hadith_url(listing, page))
                        .transpose()?,
                }
            }
            Err(_) => Page::unavailable(
                requested,
                object([
                    ("collection", Value::Nil),
                    ("heading", Value::Nil),
                    ("narrations", Value::Array(Vec::new())),
                    ("pagination", Value::Nil),
                ]),
            ),
        };
        write_page(&self.hadith, &page, w)
    }

    /// Renders the list of surahs matching `search`.
    pub fn surah_index<W: io::Write>(
        &self,
        w: &mut W,
        outcome: &pipeline::Result<Vec<Chapter>>,
        search: &str,
    ) -> Result<()> {
        let title = "Surahs";
        let page = match outcome {
            Ok(chapters) => {
                let entries = quran::filter_chapters(chapters, search)
                    .into_iter()
                    .map(|chapter| -> Result<Value> {
                        let url = self.range_url(RangeKind::Surah(chapter.number))?;
                        Ok(with_url(Value::from(chapter), Some(&url)))
                    })
                    .collect::<Result<Vec<Value>>>()?;
                Page::listing(title, search, "surahs", entries)
            }
            Err(_) => Page::unavailable(title, index_item("surahs", Vec::new())),
        };
        write_page(&self.index, &page, w)
    }

    /// Renders the table of the thirty juz.
    pub fn juz_index<W: io::Write>(&self, w: &mut W) -> Result<()> {
        let entries = JUZ_INDEX
            .iter()
            .map(|juz| -> Result<Value> {
                let url = self.range_url(RangeKind::Juz(juz.number))?;
                Ok(with_url(Value::from(juz), Some(&url)))
            })
            .collect::<Result<Vec<Value>>>()?;
        write_page(&self.index, &Page::listing("Juz", "", "juzs", entries), w)
    }

    /// Renders the known hadith collections.
    pub fn collections<W: io::Write>(&self, w: &mut W) -> Result<()> {
        let entries = COLLECTIONS
            .iter()
            .map(|collection| -> Result<Value> {
                let url = self
                    .site_root
                    .join(&format!("hadith/{}/index.html", collection.slug))?;
                Ok(with_url(Value::from(collection), Some(&url)))
            })
            .collect::<Result<Vec<Value>>>()?;
        write_page(
            &self.index,
            &Page::listing("Hadith collections", "", "collections", entries),
            w,
        )
    }

    /// Renders the chapters of collection `slug` matching `search`.
    pub fn chapters<W: io::Write>(
        &self,
        w: &mut W,
        slug: &str,
        outcome: &pipeline::Result<Vec<RawChapter>>,
        search: &str,
    ) -> Result<()> {
        let title = match collection::find(slug) {
            Some(collection) => collection.name.to_owned(),
            None => slug.to_owned(),
        };
        let page = match outcome {
            Ok(chapters) => {
                let entries = hadith::filter_chapters(chapters, search)
                    .into_iter()
                    .map(|chapter| -> Result<Value> {
                        let url = match &chapter.chapter_number {
                            Some(number) => Some(
                                self.site_root
                                    .join(&format!("hadith/{}/{}/1.html", slug, number))?,
                            ),
                            None => None,
                        };
                        Ok(with_url(Value::from(chapter), url.as_ref()))
                    })
                    .collect::<Result<Vec<Value>>>()?;
                Page::listing(&title, search, "chapters", entries)
            }
            Err(_) => Page::unavailable(&title, index_item("chapters", Vec::new())),
        };
        write_page(&self.index, &page, w)
    }

    fn range_url(&self, kind: RangeKind) -> Result<Url> {
        let path = match kind {
            RangeKind::Surah(n) => format!("surah/{}.html", n),
            RangeKind::Juz(n) => format!("juz/{}.html", n),
        };
        Ok(self.site_root.join(&path)?)
    }

    fn hadith_url(&self, listing: &ChapterListing, page: u32) -> Result<Url> {
        Ok(self.site_root.join(&format!(
            "hadith/{}/{}/{}.html",
            listing.collection.slug, listing.chapter, page
        ))?)
    }
}

/// Joins the decoded Arabic of each verse, each followed by its verse-number
/// marker, into a single reading flow.
pub fn flow_html(verses: &[Verse]) -> String {
    verses
        .iter()
        .map(|verse| {
            format!(
                "{} {}",
                markup::to_html(&markup::decode(Some(&verse.arabic))),
                verse_marker(verse.number_in_chapter)
            )
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// A verse number in Arabic-Indic digits between ornate parentheses.
fn verse_marker(number: u32) -> String {
    let digits: String = number
        .to_string()
        .chars()
        .map(|c| {
            c.to_digit(10)
                .and_then(|d| char::from_u32(0x0660 + d))
                .unwrap_or(c)
        })
        .collect();
    format!(r#"<span class="verse-marker">﴿{}﴾</span>"#, digits)
}

fn range_item(range: &ChapterRange, layout: Layout) -> Value {
    // Juz pages cross surah boundaries, so each surah gets a header where it
    // starts. Surah pages carry the surah in the page header instead.
    let headers = matches!(range.kind, RangeKind::Juz(_));
    let verses: Vec<Value> = range
        .verses
        .iter()
        .map(|verse| {
            let mut value = Value::from(verse);
            if let Value::Object(fields) = &mut value {
                let header = match &verse.chapter_info {
                    Some(info) if headers && verse.starts_chapter => Value::from(info),
                    _ => Value::Nil,
                };
                fields.insert("header".to_owned(), header);
            }
            value
        })
        .collect();
    object([
        ("chapter", range.chapter.as_ref().map_or(Value::Nil, Value::from)),
        ("continuous", Value::Bool(layout == Layout::Continuous)),
        (
            "flow_html",
            match layout {
                Layout::Continuous => Value::String(flow_html(&range.verses)),
                Layout::Cards => Value::Nil,
            },
        ),
        ("verses", Value::Array(verses)),
    ])
}

fn range_placeholder(layout: Layout) -> Value {
    object([
        ("chapter", Value::Nil),
        ("continuous", Value::Bool(layout == Layout::Continuous)),
        ("flow_html", Value::Nil),
        ("verses", Value::Array(Vec::new())),
    ])
}

/// An index item with `entries` under `key` and nothing under the other
/// list keys.
fn index_item(key: &str, entries: Vec<Value>) -> Value {
    let mut fields: HashMap<String, Value> = ["surahs", "juzs", "collections", "chapters"]
        .iter()
        .map(|list| (list.to_string(), Value::Nil))
        .collect();
    fields.insert(key.to_owned(), Value::Array(entries));
    Value::Object(fields)
}

fn with_url(mut value: Value, url: Option<&Url>) -> Value {
    if let Value::Object(fields) = &mut value {
        fields.insert(
            "url".to_owned(),
            url.map_or(Value::Nil, |url| Value::String(url.to_string())),
        );
    }
    value
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Found,
    Empty,
    Unavailable,
}

impl State {
    fn found_if(found: bool) -> State {
        match found {
            true => State::Found,
            false => State::Empty,
        }
    }
}

/// An output HTML page. A [`Page`] can be converted to a [`Value`] and thus
/// rendered in a template via [`Page::to_value`].
struct Page<'a> {
    title: String,
    state: State,
    message: Option<&'static str>,

    /// The active search term, if the page supports one.
    search: Option<&'a str>,

    /// The main item for the page.
    item: Value,

    /// The URL for the previous page, if any.
    prev: Option<Url>,

    /// The URL for the next page, if any.
    next: Option<Url>,
}

impl<'a> Page<'a> {
    fn unavailable(requested: &str, item: Value) -> Page<'a> {
        Page {
            title: requested.to_owned(),
            state: State::Unavailable,
            message: Some(UNAVAILABLE),
            search: None,
            item,
            prev: None,
            next: None,
        }
    }

    fn listing(title: &str, search: &'a str, key: &str, entries: Vec<Value>) -> Page<'a> {
        Page {
            title: title.to_owned(),
            state: State::found_if(!entries.is_empty()),
            message: None,
            search: Some(search),
            item: index_item(key, entries),
            prev: None,
            next: None,
        }
    }

    /// Converts a [`Page`] into a [`Value::Object`]; see the module docs for
    /// its fields.
    fn to_value(&self) -> Value {
        let option_to_value = |opt: &Option<Url>| match opt {
            Some(url) => Value::String(url.to_string()),
            None => Value::Nil,
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(escape(&self.title)));
        m.insert("found".to_owned(), Value::Bool(self.state == State::Found));
        m.insert("empty".to_owned(), Value::Bool(self.state == State::Empty));
        m.insert(
            "unavailable".to_owned(),
            Value::Bool(self.state == State::Unavailable),
        );
        m.insert(
            "message".to_owned(),
            self.message.map_or(Value::Nil, |s| Value::String(escape(s))),
        );
        m.insert(
            "search".to_owned(),
            match self.search.map(str::trim) {
                Some(term) if !term.is_empty() => Value::String(escape(term)),
                _ => Value::Nil,
            },
        );
        m.insert("item".to_owned(), self.item.clone());
        m.insert("prev".to_owned(), option_to_value(&self.prev));
        m.insert("next".to_owned(), option_to_value(&self.next));
        Value::Object(m)
    }
}

fn write_page<W: io::Write>(template: &Template, page: &Page, w: &mut W) -> Result<()> {
    template.execute(w, &gtmpl::Context::from(page.to_value())?)?;
    Ok(())
}

fn parse_template(source: &str) -> Result<Template> {
    let mut template = Template::default();
    template.parse(source).map_err(Error::ParseTemplate)?;
    Ok(template)
}

/// The result of a fallible rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a rendering operation.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors parsing template sources.
    ParseTemplate(String),

    /// Returned for errors during templating.
    Template(String),

    /// Returned for errors building page links.
    Url(url::ParseError),

    /// Returned for errors writing the output.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::Url(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseTemplate(err) => write!(f, "Parsing template: {}", err),
            Error::Template(err) => err.fmt(f),
            Error::Url(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ParseTemplate(_) => None,
            Error::Template(_) => None,
            Error::Url(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hadith::{Envelope, PageEnvelope, RawNarration};
    use crate::pipeline::{Error as PipelineError, Failure, NotFound};
    use crate::quran::Ayah;

    fn renderer() -> Result<Renderer> {
        Renderer::embedded(Url::parse("https://reader.test/")?)
    }

    fn render(f: impl FnOnce(&Renderer, &mut Vec<u8>) -> Result<()>) -> Result<String> {
        let renderer = renderer()?;
        let mut out = Vec::new();
        f(&renderer, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn chapter(number: u16, english_name: &str) -> Chapter {
        Chapter {
            number,
            name: String::new(),
            english_name: english_name.to_owned(),
            english_name_translation: String::new(),
            revelation_type: None,
            number_of_ayahs: None,
        }
    }

    fn ayah(number: u32, text: &str, number_in_surah: u32, surah: Option<Chapter>) -> Ayah {
        Ayah {
            number,
            text: text.to_owned(),
            number_in_surah,
            surah,
        }
    }

    fn juz_range() -> ChapterRange {
        let falaq = chapter(113, "Al-Falaq");
        let nas = chapter(114, "An-Naas");
        quran::align(
            RangeKind::Juz(30),
            None,
            vec![
                ayah(6231, "قُلْ [q[أَ]عُوذُ", 5, Some(falaq.clone())),
                ayah(6232, "[h:2[ق]ُلْ", 1, Some(nas.clone())),
            ],
            vec![
                ayah(6231, "Say: I seek refuge", 5, Some(falaq)),
                ayah(6232, "Say: I seek refuge with the Lord", 1, Some(nas)),
            ],
        )
    }

    #[test]
    fn test_juz_cards() -> Result<()> {
        let html = render(|r, w| r.verses(w, "Juz 30", &Ok(juz_range()), Layout::Cards))?;
        assert!(html.contains("<title>Juz 30</title>"));
        assert!(html.contains(r#"<span class="tajweed-qalqalah">أَ</span>"#));
        assert!(html.contains(r#"<p class="reference">114:1</p>"#));
        assert!(html.contains("Say: I seek refuge with the Lord"));
        assert_eq!(2, html.matches(r#"<h2 class="chapter-header">"#).count());
        assert!(html.contains("An-Naas"));
        assert!(html.contains(r#"href="https://reader.test/juz/29.html""#));
        assert!(!html.contains("juz/31.html"));
        assert!(!html.contains(r#"class="empty""#));
        Ok(())
    }

    #[test]
    fn test_continuous_flow() -> Result<()> {
        let html = render(|r, w| r.verses(w, "Juz 30", &Ok(juz_range()), Layout::Continuous))?;
        assert!(html.contains(r#"<span class="verse-marker">﴿٥﴾</span>"#));
        assert!(html.contains(r#"<span class="verse-marker">﴿١﴾</span>"#));
        assert!(!html.contains("Say: I seek refuge"));
        Ok(())
    }

    #[test]
    fn test_flow_html() {
        let range = juz_range();
        assert_eq!(
            concat!(
                r#"قُلْ <span class="tajweed-qalqalah">أَ</span>عُوذُ <span class="verse-marker">﴿٥﴾</span>"#,
                " ",
                r#"<span class="tajweed-heavy">ق</span>ُلْ <span class="verse-marker">﴿١﴾</span>"#,
            ),
            flow_html(&range.verses)
        );
    }

    #[test]
    fn test_surah_has_no_chapter_headers() -> Result<()> {
        let opening = chapter(1, "Al-Faatiha");
        let range = quran::align(
            RangeKind::Surah(1),
            Some(opening),
            vec![ayah(1, "بِسْمِ", 1, None)],
            vec![ayah(1, "In the name of God", 1, None)],
        );
        let html = render(|r, w| r.verses(w, "Surah 1", &Ok(range), Layout::Cards))?;
        assert!(html.contains("<title>Surah 1: Al-Faatiha</title>"));
        assert!(!html.contains(r#"<h2 class="chapter-header">"#));
        assert!(!html.contains(r#"rel="prev""#));
        assert!(html.contains(r#"href="https://reader.test/surah/2.html""#));
        Ok(())
    }

    #[test]
    fn test_not_found_is_unavailable() -> Result<()> {
        let outcome: pipeline::Result<ChapterRange> =
            Err(PipelineError::NotFound(NotFound::Surah(115)));
        let html = render(|r, w| r.verses(w, "Surah 115", &outcome, Layout::Cards))?;
        assert!(html.contains(UNAVAILABLE));
        assert!(!html.contains(r#"class="verse-card""#));

        let outcome: pipeline::Result<ChapterListing> =
            Err(PipelineError::UpstreamFailure(Failure::MissingApiKey));
        let html = render(|r, w| r.hadith(w, "Sahih al-Bukhari", &outcome, ""))?;
        assert!(html.contains(UNAVAILABLE));
        Ok(())
    }

    fn narration(number: u64, english: &str) -> RawNarration {
        RawNarration {
            hadith_number: serde_json::Value::from(number),
            hadith_english: Some(english.to_owned()),
            ..RawNarration::default()
        }
    }

    fn listing(envelope: Envelope) -> ChapterListing {
        let bukhari = collection::find("sahih-bukhari").expect("known collection");
        ChapterListing::assemble(bukhari, 1, 2, 2, envelope)
    }

    #[test]
    fn test_hadith_pages() -> Result<()> {
        let listing = listing(Envelope::Paged(PageEnvelope {
            data: vec![narration(4, "Actions are by intentions"), narration(3, "Revelation came")],
            total: Some(6),
            current_page: Some(2),
            last_page: Some(3),
        }));
        let html = render(|r, w| r.hadith(w, "", &Ok(listing), ""))?;
        assert!(html.contains("Page 2 of 3 (6 narrations)"));
        assert!(html.contains(r#"href="https://reader.test/hadith/sahih-bukhari/1/1.html""#));
        assert!(html.contains(r#"href="https://reader.test/hadith/sahih-bukhari/1/3.html""#));
        let third = html.find("Hadith 3").unwrap_or(usize::MAX);
        let fourth = html.find("Hadith 4").unwrap_or(0);
        assert!(third < fourth);
        Ok(())
    }

    #[test]
    fn test_hadith_search_echo() -> Result<()> {
        let listing = listing(Envelope::Plain(vec![narration(1, "Actions are by intentions")]));

        let html = render(|r, w| r.hadith(w, "", &Ok(listing.clone()), "intentions"))?;
        assert!(html.contains("Hadith 1"));
        assert!(!html.contains(r#"class="empty""#));

        let html = render(|r, w| r.hadith(w, "", &Ok(listing), "<fasting>"))?;
        assert!(html.contains(r#"<p class="empty">No narrations found for &ldquo;&lt;fasting&gt;&rdquo;.</p>"#));
        assert!(!html.contains("Hadith 1"));
        Ok(())
    }

    #[test]
    fn test_surah_index_filter() -> Result<()> {
        let chapters = vec![chapter(1, "Al-Faatiha"), chapter(2, "Al-Baqara")];
        let html = render(|r, w| r.surah_index(w, &Ok(chapters.clone()), "baq"))?;
        assert!(html.contains(r#"<a href="https://reader.test/surah/2.html">2. Al-Baqara</a>"#));
        assert!(!html.contains("Al-Faatiha"));

        let html = render(|r, w| r.surah_index(w, &Ok(chapters), "nothing like this"))?;
        assert!(html.contains(r#"class="empty""#));
        Ok(())
    }

    #[test]
    fn test_static_indexes() -> Result<()> {
        let html = render(|r, w| r.juz_index(w))?;
        assert_eq!(30, html.matches("<li>").count());
        assert!(html.contains(r#"href="https://reader.test/juz/30.html""#));

        let html = render(|r, w| r.collections(w))?;
        assert_eq!(COLLECTIONS.len(), html.matches("<li>").count());
        assert!(html.contains(r#"href="https://reader.test/hadith/sahih-muslim/index.html""#));
        Ok(())
    }

    #[test]
    fn test_chapters_index() -> Result<()> {
        let chapters = vec![
            RawChapter {
                chapter_number: Some(String::from("1")),
                chapter_english: Some(String::from("Revelation")),
                ..RawChapter::default()
            },
            RawChapter {
                chapter_english: Some(String::from("Untitled")),
                ..RawChapter::default()
            },
        ];
        let html = render(|r, w| r.chapters(w, "sahih-bukhari", &Ok(chapters), ""))?;
        assert!(html.contains(r#"<a href="https://reader.test/hadith/sahih-bukhari/1/1.html">1. Revelation</a>"#));
        assert!(html.contains("<li>Untitled"));
        Ok(())
    }
}
