//! Converts domain types into template [`Value`]s. gtmpl does no escaping of
//! its own, so every text field is HTML-escaped here; fields named `*_html`
//! are already markup.

use crate::collection::Collection;
use crate::hadith::{ChapterHeading, Narration, Pagination, RawChapter};
use crate::markup::{self, Run};
use crate::quran::{Chapter, JuzBounds, Verse};
use gtmpl::Value;
use std::collections::HashMap;

/// Escapes `text` for use in HTML text or attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let _ = pulldown_cmark::escape::escape_html(&mut escaped, text);
    escaped
}

fn text(s: &str) -> Value {
    Value::String(escape(s))
}

fn optional_text(s: &Option<String>) -> Value {
    match s {
        Some(s) => text(s),
        None => Value::Nil,
    }
}

fn number(n: impl ToString) -> Value {
    Value::String(n.to_string())
}

pub(crate) fn object<const N: usize>(fields: [(&str, Value); N]) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value))
            .collect::<HashMap<String, Value>>(),
    )
}

impl From<&Run> for Value {
    fn from(run: &Run) -> Value {
        object([
            ("text", text(&run.text)),
            (
                "class",
                match run.style {
                    Some(style) => Value::String(style.class_name().to_owned()),
                    None => Value::Nil,
                },
            ),
        ])
    }
}

impl From<&Chapter> for Value {
    fn from(chapter: &Chapter) -> Value {
        object([
            ("number", number(chapter.number)),
            ("name", text(&chapter.name)),
            ("english_name", text(&chapter.english_name)),
            (
                "english_name_translation",
                text(&chapter.english_name_translation),
            ),
            ("revelation_type", optional_text(&chapter.revelation_type)),
            (
                "ayahs",
                chapter.number_of_ayahs.map_or(Value::Nil, number),
            ),
        ])
    }
}

impl From<&Verse> for Value {
    /// Decodes the verse's Tajweed markup into `arabic_html` and keeps the
    /// stripped text in `arabic`.
    fn from(verse: &Verse) -> Value {
        let runs = markup::decode(Some(&verse.arabic));
        object([
            ("reference", Value::String(verse.reference())),
            ("chapter", number(verse.chapter)),
            ("number", number(verse.number_in_chapter)),
            ("arabic", text(&markup::plain_text(&runs))),
            ("arabic_html", Value::String(markup::to_html(&runs))),
            ("translation", text(&verse.translation)),
            ("starts_chapter", Value::Bool(verse.starts_chapter)),
            (
                "chapter_info",
                verse.chapter_info.as_ref().map_or(Value::Nil, Value::from),
            ),
        ])
    }
}

impl From<&JuzBounds> for Value {
    fn from(juz: &JuzBounds) -> Value {
        object([
            ("number", number(juz.number)),
            ("start", text(juz.start)),
            ("end", text(juz.end)),
        ])
    }
}

impl From<&Collection> for Value {
    fn from(collection: &Collection) -> Value {
        object([
            ("slug", text(collection.slug)),
            ("name", text(collection.name)),
            ("arabic_name", text(collection.arabic_name)),
            ("total_hadith", number(collection.total_hadith)),
            ("total_chapters", number(collection.total_chapters)),
            ("description", text(collection.description)),
            ("author", text(collection.author)),
            ("compiled", text(collection.compiled)),
        ])
    }
}

impl From<&RawChapter> for Value {
    fn from(chapter: &RawChapter) -> Value {
        object([
            ("number", optional_text(&chapter.chapter_number)),
            ("english", optional_text(&chapter.chapter_english)),
            ("arabic", optional_text(&chapter.chapter_arabic)),
            ("range", optional_text(&chapter.hadith_range)),
        ])
    }
}

impl From<&ChapterHeading> for Value {
    fn from(heading: &ChapterHeading) -> Value {
        object([
            ("number", optional_text(&heading.number)),
            ("english", optional_text(&heading.english)),
            ("arabic", optional_text(&heading.arabic)),
        ])
    }
}

impl From<&Narration> for Value {
    fn from(narration: &Narration) -> Value {
        object([
            ("number", text(&narration.number)),
            ("narrator", optional_text(&narration.narrator)),
            ("english", optional_text(&narration.english)),
            ("arabic", optional_text(&narration.arabic)),
            ("urdu", optional_text(&narration.urdu)),
            ("grade", optional_text(&narration.grade)),
        ])
    }
}

impl From<&Pagination> for Value {
    fn from(pagination: &Pagination) -> Value {
        object([
            ("total", number(pagination.total)),
            ("total_pages", number(pagination.total_pages)),
            ("current_page", number(pagination.current_page)),
        ])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
        match value {
            Value::Object(fields) => fields.get(key),
            _ => None,
        }
    }

    fn string(value: Option<&Value>) -> Option<&str> {
        match value {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!("a &lt;b&gt; &amp; &quot;c&quot;", escape(r#"a <b> & "c""#));
    }

    #[test]
    fn test_verse_value() {
        let verse = Verse {
            chapter: 2,
            number_in_chapter: 255,
            number: 262,
            arabic: String::from("[h:1[ٱ]للَّهُ"),
            translation: String::from("God <none but He>"),
            chapter_info: None,
            starts_chapter: false,
        };
        let value = Value::from(&verse);
        assert_eq!(Some("2:255"), string(field(&value, "reference")));
        assert_eq!(Some("255"), string(field(&value, "number")));
        assert_eq!(Some("ٱللَّهُ"), string(field(&value, "arabic")));
        assert_eq!(
            Some(r#"<span class="tajweed-heavy">ٱ</span>للَّهُ"#),
            string(field(&value, "arabic_html"))
        );
        assert_eq!(
            Some("God &lt;none but He&gt;"),
            string(field(&value, "translation"))
        );
        assert!(matches!(field(&value, "chapter_info"), Some(Value::Nil)));
    }

    #[test]
    fn test_narration_value() {
        let narration = Narration {
            number: String::from("7"),
            sequence: 7,
            narrator: Some(String::from("Narrated Umar")),
            english: None,
            arabic: None,
            urdu: None,
            grade: Some(String::from("Sahih")),
        };
        let value = Value::from(&narration);
        assert_eq!(Some("7"), string(field(&value, "number")));
        assert_eq!(Some("Narrated Umar"), string(field(&value, "narrator")));
        assert!(matches!(field(&value, "english"), Some(Value::Nil)));
    }
}
