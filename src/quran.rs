//! Defines the verse-level data for surah and juz pages ([`ChapterRange`],
//! [`Verse`]) and the logic for aligning a tagged-Arabic edition with a
//! translation edition. Alignment is purely positional: the Nth verse of one
//! edition is paired with the Nth verse of the other.

use serde::Deserialize;
use std::cmp::Ordering;
use std::fmt;

/// The number of surahs in the Quran.
pub const SURAH_COUNT: u16 = 114;

/// The number of juz (thirtieth sections) in the Quran.
pub const JUZ_COUNT: u16 = 30;

/// A reading range: either a whole surah or a single juz.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RangeKind {
    Surah(u16),
    Juz(u16),
}

impl RangeKind {
    /// Returns a surah range, or `None` if `number` is outside `1..=114`.
    pub fn surah(number: i32) -> Option<RangeKind> {
        bounded(number, SURAH_COUNT).map(RangeKind::Surah)
    }

    /// Returns a juz range, or `None` if `number` is outside `1..=30`.
    pub fn juz(number: i32) -> Option<RangeKind> {
        bounded(number, JUZ_COUNT).map(RangeKind::Juz)
    }

    pub fn number(self) -> u16 {
        match self {
            RangeKind::Surah(n) | RangeKind::Juz(n) => n,
        }
    }

    /// The preceding range of the same kind, if any.
    pub fn prev(self) -> Option<RangeKind> {
        self.with_number(i32::from(self.number()) - 1)
    }

    /// The following range of the same kind, if any.
    pub fn next(self) -> Option<RangeKind> {
        self.with_number(i32::from(self.number()) + 1)
    }

    fn with_number(self, number: i32) -> Option<RangeKind> {
        match self {
            RangeKind::Surah(_) => RangeKind::surah(number),
            RangeKind::Juz(_) => RangeKind::juz(number),
        }
    }
}

impl fmt::Display for RangeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RangeKind::Surah(n) => write!(f, "Surah {}", n),
            RangeKind::Juz(n) => write!(f, "Juz {}", n),
        }
    }
}

fn bounded(number: i32, max: u16) -> Option<u16> {
    if number >= 1 && number <= i32::from(max) {
        Some(number as u16)
    } else {
        None
    }
}

/// Describes a surah. Verses fetched as part of a juz carry one of these so
/// that pages can show a header wherever a new surah begins.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub number: u16,

    /// The Arabic name.
    #[serde(default)]
    pub name: String,

    pub english_name: String,

    pub english_name_translation: String,

    /// `Meccan` or `Medinan`.
    #[serde(default)]
    pub revelation_type: Option<String>,

    #[serde(default)]
    pub number_of_ayahs: Option<u32>,
}

/// A single verse as returned by the upstream text service.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Ayah {
    /// The verse's absolute number across the whole Quran.
    pub number: u32,
    pub text: String,
    pub number_in_surah: u32,

    /// Only present on juz responses.
    #[serde(default)]
    pub surah: Option<Chapter>,
}

/// One edition of a surah, as returned by the editions endpoint.
#[derive(Deserialize, Clone, Debug)]
pub struct SurahEdition {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub ayahs: Vec<Ayah>,
}

/// One edition of a juz.
#[derive(Deserialize, Clone, Debug)]
pub struct JuzEdition {
    pub number: u16,
    pub ayahs: Vec<Ayah>,
}

/// The response envelope used by the Quran text service. `data` is left
/// undecoded because failing responses put an error message there.
#[derive(Deserialize, Debug)]
pub struct Envelope {
    pub code: u16,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub data: serde_json::Value,
}

/// An aligned verse: tagged Arabic text plus its translation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verse {
    /// The number of the surah this verse belongs to.
    pub chapter: u16,

    pub number_in_chapter: u32,

    /// The verse's absolute number across the whole Quran.
    pub number: u32,

    /// Arabic text with inline Tajweed markup (see [`crate::markup`]).
    pub arabic: String,

    pub translation: String,

    /// The owning surah, when the source supplied it per verse.
    pub chapter_info: Option<Chapter>,

    /// Whether this is the first verse of its surah within the range.
    pub starts_chapter: bool,
}

impl Verse {
    /// The `surah:verse` reference, e.g. `2:255`.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.chapter, self.number_in_chapter)
    }
}

/// Which edition had verses left over after alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Arabic,
    Translation,
}

/// Reports that the two editions differed in length. The unmatched verses
/// are not part of the range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Excess {
    pub side: Side,
    pub count: usize,
}

/// An ordered, aligned run of verses for one surah or juz.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChapterRange {
    pub kind: RangeKind,

    /// The surah header, for surah ranges.
    pub chapter: Option<Chapter>,

    pub verses: Vec<Verse>,

    /// The first and last surahs touched by the range.
    pub first_chapter: Option<u16>,
    pub last_chapter: Option<u16>,

    /// Set when the editions had different lengths.
    pub excess: Option<Excess>,
}

impl ChapterRange {
    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    /// The surah headers introduced within the range, in order.
    pub fn chapter_starts(&self) -> impl Iterator<Item = &Verse> {
        self.verses.iter().filter(|v| v.starts_chapter)
    }
}

/// Aligns `arabic` with `translation` by position. If the editions differ in
/// length the extra verses are dropped and reported in
/// [`ChapterRange::excess`].
pub fn align(
    kind: RangeKind,
    chapter: Option<Chapter>,
    arabic: Vec<Ayah>,
    translation: Vec<Ayah>,
) -> ChapterRange {
    let excess = match arabic.len().cmp(&translation.len()) {
        Ordering::Equal => None,
        Ordering::Greater => Some(Excess {
            side: Side::Arabic,
            count: arabic.len() - translation.len(),
        }),
        Ordering::Less => Some(Excess {
            side: Side::Translation,
            count: translation.len() - arabic.len(),
        }),
    };
    if let Some(excess) = &excess {
        tracing::warn!(
            range = %kind,
            side = ?excess.side,
            count = excess.count,
            "editions differ in length; unmatched verses dropped"
        );
    }

    let fallback = chapter.as_ref().map_or(1, |c| c.number);
    let verses = arabic
        .into_iter()
        .zip(translation)
        .map(|(arabic, translation)| Verse {
            chapter: arabic.surah.as_ref().map_or(fallback, |c| c.number),
            number_in_chapter: arabic.number_in_surah,
            number: arabic.number,
            arabic: arabic.text,
            translation: translation.text,
            chapter_info: arabic.surah,
            starts_chapter: false,
        })
        .collect();
    let verses = mark_chapter_starts(verses);

    ChapterRange {
        kind,
        chapter,
        first_chapter: verses.first().map(|v| v.chapter),
        last_chapter: verses.last().map(|v| v.chapter),
        verses,
        excess,
    }
}

/// Sets [`Verse::starts_chapter`] on every verse whose surah differs from the
/// previous verse's.
pub fn mark_chapter_starts(verses: Vec<Verse>) -> Vec<Verse> {
    let capacity = verses.len();
    let (_, marked) = verses.into_iter().fold(
        (None, Vec::with_capacity(capacity)),
        |(previous, mut marked): (Option<u16>, Vec<Verse>), mut verse| {
            verse.starts_chapter = previous != Some(verse.chapter);
            let chapter = verse.chapter;
            marked.push(verse);
            (Some(chapter), marked)
        },
    );
    marked
}

/// Returns the surahs matching `query` by English name, translated name,
/// Arabic name, or number. A blank query matches everything.
pub fn filter_chapters<'a>(chapters: &'a [Chapter], query: &str) -> Vec<&'a Chapter> {
    let trimmed = query.trim();
    let lowered = trimmed.to_lowercase();
    chapters
        .iter()
        .filter(|c| {
            trimmed.is_empty()
                || c.english_name.to_lowercase().contains(&lowered)
                || c.english_name_translation.to_lowercase().contains(&lowered)
                || c.name.contains(trimmed)
                || c.number.to_string().contains(&lowered)
        })
        .collect()
}

/// Where a juz begins and ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JuzBounds {
    pub number: u16,
    pub start: &'static str,
    pub end: &'static str,
}

pub const JUZ_INDEX: [JuzBounds; JUZ_COUNT as usize] = [
    JuzBounds { number: 1, start: "Al-Fatiha 1", end: "Al-Baqara 141" },
    JuzBounds { number: 2, start: "Al-Baqara 142", end: "Al-Baqara 252" },
    JuzBounds { number: 3, start: "Al-Baqara 253", end: "Al-Imran 92" },
    JuzBounds { number: 4, start: "Al-Imran 93", end: "An-Nisa 23" },
    JuzBounds { number: 5, start: "An-Nisa 24", end: "An-Nisa 147" },
    JuzBounds { number: 6, start: "An-Nisa 148", end: "Al-Ma'idah 81" },
    JuzBounds { number: 7, start: "Al-Ma'idah 82", end: "Al-An'am 110" },
    JuzBounds { number: 8, start: "Al-An'am 111", end: "Al-A'raf 87" },
    JuzBounds { number: 9, start: "Al-A'raf 88", end: "Al-Anfal 40" },
    JuzBounds { number: 10, start: "Al-Anfal 41", end: "At-Tawba 92" },
    JuzBounds { number: 11, start: "At-Tawba 93", end: "Hud 5" },
    JuzBounds { number: 12, start: "Hud 6", end: "Yusuf 52" },
    JuzBounds { number: 13, start: "Yusuf 53", end: "Ibrahim 52" },
    JuzBounds { number: 14, start: "Al-Hijr 1", end: "An-Nahl 128" },
    JuzBounds { number: 15, start: "Al-Isra 1", end: "Al-Kahf 74" },
    JuzBounds { number: 16, start: "Al-Kahf 75", end: "Ta-Ha 135" },
    JuzBounds { number: 17, start: "Al-Anbiya 1", end: "Al-Hajj 78" },
    JuzBounds { number: 18, start: "Al-Mu'minun 1", end: "Al-Furqan 20" },
    JuzBounds { number: 19, start: "Al-Furqan 21", end: "An-Naml 55" },
    JuzBounds { number: 20, start: "An-Naml 56", end: "Al-Ankabut 45" },
    JuzBounds { number: 21, start: "Al-Ankabut 46", end: "Al-Ahzab 30" },
    JuzBounds { number: 22, start: "Al-Ahzab 31", end: "Ya-Sin 27" },
    JuzBounds { number: 23, start: "Ya-Sin 28", end: "Az-Zumar 31" },
    JuzBounds { number: 24, start: "Az-Zumar 32", end: "Fussilat 46" },
    JuzBounds { number: 25, start: "Fussilat 47", end: "Al-Jathiya 37" },
    JuzBounds { number: 26, start: "Al-Ahqaf 1", end: "Adh-Dhariyat 30" },
    JuzBounds { number: 27, start: "Adh-Dhariyat 31", end: "Al-Hadid 29" },
    JuzBounds { number: 28, start: "Al-Mujadila 1", end: "At-Tahrim 12" },
    JuzBounds { number: 29, start: "Al-Mulk 1", end: "Al-Mursalat 50" },
    JuzBounds { number: 30, start: "An-Naba 1", end: "An-Nas 6" },
];

#[cfg(test)]
mod test {
    use super::*;

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

    #[test]
    fn test_range_bounds() {
        assert_eq!(None, RangeKind::surah(0));
        assert_eq!(None, RangeKind::surah(115));
        assert_eq!(None, RangeKind::surah(-1));
        assert_eq!(Some(RangeKind::Surah(114)), RangeKind::surah(114));
        assert_eq!(None, RangeKind::juz(31));
        assert_eq!(Some(RangeKind::Juz(1)), RangeKind::juz(1));
    }

    #[test]
    fn test_range_navigation() {
        assert_eq!(None, RangeKind::Surah(1).prev());
        assert_eq!(Some(RangeKind::Surah(2)), RangeKind::Surah(1).next());
        assert_eq!(None, RangeKind::Juz(30).next());
        assert_eq!(Some(RangeKind::Juz(29)), RangeKind::Juz(30).prev());
    }

    #[test]
    fn test_align_equal_lengths() {
        let arabic = vec![ayah(1, "a1", 1, None), ayah(2, "a2", 2, None), ayah(3, "a3", 3, None)];
        let english = vec![ayah(1, "e1", 1, None), ayah(2, "e2", 2, None), ayah(3, "e3", 3, None)];
        let range = align(RangeKind::Surah(1), Some(chapter(1, "Al-Faatiha")), arabic, english);

        assert_eq!(3, range.verses.len());
        for (i, verse) in range.verses.iter().enumerate() {
            assert_eq!(format!("a{}", i + 1), verse.arabic);
            assert_eq!(format!("e{}", i + 1), verse.translation);
            assert_eq!(1, verse.chapter);
        }
        assert_eq!(None, range.excess);
        assert_eq!("1:2", range.verses[1].reference());
    }

    #[test]
    fn test_align_reports_excess() {
        let arabic = vec![ayah(1, "a1", 1, None), ayah(2, "a2", 2, None)];
        let english = vec![ayah(1, "e1", 1, None)];
        let range = align(RangeKind::Surah(1), None, arabic, english);
        assert_eq!(1, range.verses.len());
        assert_eq!(
            Some(Excess {
                side: Side::Arabic,
                count: 1
            }),
            range.excess
        );
    }

    #[test]
    fn test_align_marks_chapter_starts_across_juz() {
        let baqara = chapter(2, "Al-Baqara");
        let imran = chapter(3, "Aal-i-Imraan");
        let arabic = vec![
            ayah(292, "a", 285, Some(baqara.clone())),
            ayah(293, "b", 286, Some(baqara.clone())),
            ayah(294, "c", 1, Some(imran.clone())),
            ayah(295, "d", 2, Some(imran.clone())),
        ];
        let english = arabic.clone();
        let range = align(RangeKind::Juz(3), None, arabic, english);

        let starts: Vec<bool> = range.verses.iter().map(|v| v.starts_chapter).collect();
        assert_eq!(vec![true, false, true, false], starts);
        assert_eq!(Some(2), range.first_chapter);
        assert_eq!(Some(3), range.last_chapter);
        assert_eq!(2, range.chapter_starts().count());
        assert_eq!(Some(&imran), range.verses[2].chapter_info.as_ref());
    }

    #[test]
    fn test_align_empty() {
        let range = align(RangeKind::Juz(1), None, Vec::new(), Vec::new());
        assert!(range.is_empty());
        assert_eq!(None, range.first_chapter);
    }

    #[test]
    fn test_filter_chapters() {
        let mut chapters = vec![chapter(1, "Al-Faatiha"), chapter(2, "Al-Baqara"), chapter(12, "Yusuf")];
        chapters[1].english_name_translation = String::from("The Cow");
        chapters[0].name = String::from("سُورَةُ ٱلْفَاتِحَةِ");

        let names = |query: &str| -> Vec<u16> {
            filter_chapters(&chapters, query).iter().map(|c| c.number).collect()
        };
        assert_eq!(vec![1, 2, 12], names("  "));
        assert_eq!(vec![2], names("cow"));
        assert_eq!(vec![1, 12], names("1"));
        assert_eq!(vec![1], names("ٱلْفَاتِحَةِ"));
    }

    #[test]
    fn test_decode_juz_ayah() -> serde_json::Result<()> {
        let ayah: Ayah = serde_json::from_str(
            r#"{
                "number": 1,
                "text": "بِسْمِ [h:1[ٱ]للَّهِ",
                "surah": {
                    "number": 1,
                    "name": "سُورَةُ ٱلْفَاتِحَةِ",
                    "englishName": "Al-Faatiha",
                    "englishNameTranslation": "The Opening",
                    "revelationType": "Meccan",
                    "numberOfAyahs": 7
                },
                "numberInSurah": 1,
                "juz": 1,
                "page": 1
            }"#,
        )?;
        assert_eq!(1, ayah.number_in_surah);
        assert_eq!(Some(7), ayah.surah.and_then(|s| s.number_of_ayahs));
        Ok(())
    }

    #[test]
    fn test_juz_index() {
        for (i, juz) in JUZ_INDEX.iter().enumerate() {
            assert_eq!(i as u16 + 1, juz.number);
        }
    }
}
