//! The registry of hadith collections the reader knows about. A collection
//! slug that isn't listed here is rejected before any request is made.

/// Static metadata for a hadith collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Collection {
    /// The identifier used by the upstream hadith service (e.g.,
    /// `sahih-bukhari`).
    pub slug: &'static str,
    pub name: &'static str,
    pub arabic_name: &'static str,
    pub total_hadith: u32,
    pub total_chapters: u32,
    pub description: &'static str,
    pub author: &'static str,
    pub compiled: &'static str,
}

pub const COLLECTIONS: &[Collection] = &[
    Collection {
        slug: "sahih-bukhari",
        name: "Sahih al-Bukhari",
        arabic_name: "صحيح البخاري",
        total_hadith: 7563,
        total_chapters: 97,
        description: "The most authentic collection of hadith",
        author: "Imam Muhammad al-Bukhari",
        compiled: "846 CE",
    },
    Collection {
        slug: "sahih-muslim",
        name: "Sahih Muslim",
        arabic_name: "صحيح مسلم",
        total_hadith: 7470,
        total_chapters: 56,
        description: "Second most authentic hadith collection",
        author: "Imam Muslim ibn al-Hajjaj",
        compiled: "875 CE",
    },
    Collection {
        slug: "abu-dawood",
        name: "Sunan Abi Dawud",
        arabic_name: "سنن أبي داود",
        total_hadith: 5274,
        total_chapters: 43,
        description: "Collection focused on legal hadith",
        author: "Imam Abu Dawud",
        compiled: "889 CE",
    },
    Collection {
        slug: "al-tirmidhi",
        name: "Jami` at-Tirmidhi",
        arabic_name: "جامع الترمذي",
        total_hadith: 3956,
        total_chapters: 46,
        description: "Comprehensive collection with grading",
        author: "Imam at-Tirmidhi",
        compiled: "892 CE",
    },
    Collection {
        slug: "sunan-nasai",
        name: "Sunan an-Nasa'i",
        arabic_name: "سنن النسائي",
        total_hadith: 5758,
        total_chapters: 51,
        description: "Collection with strict authentication criteria",
        author: "Imam an-Nasa'i",
        compiled: "915 CE",
    },
    Collection {
        slug: "ibn-e-majah",
        name: "Sunan Ibn Majah",
        arabic_name: "سنن ابن ماجه",
        total_hadith: 4341,
        total_chapters: 37,
        description: "Sixth book of the Kutub al-Sittah",
        author: "Imam Ibn Majah",
        compiled: "887 CE",
    },
    Collection {
        slug: "mishkat",
        name: "Mishkat al-Masabih",
        arabic_name: "مشكاة المصابيح",
        total_hadith: 5945,
        total_chapters: 29,
        description: "Collection of authentic hadiths",
        author: "Imam Wali al-Din al-Tabrizi",
        compiled: "1337 CE",
    },
    Collection {
        slug: "musnad-ahmad",
        name: "Musnad Ahmad",
        arabic_name: "مسند أحمد",
        total_hadith: 27647,
        total_chapters: 14,
        description: "Largest collection from Imam Ahmad",
        author: "Imam Ahmad ibn Hanbal",
        compiled: "855 CE",
    },
];

/// Looks up a collection by its slug.
pub fn find(slug: &str) -> Option<&'static Collection> {
    COLLECTIONS.iter().find(|c| c.slug == slug)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_find_known() {
        let collection = find("sahih-muslim").expect("registered");
        assert_eq!("Sahih Muslim", collection.name);
    }

    #[test]
    fn test_find_unknown() {
        assert_eq!(None, find("sahih-unknown"));
        assert_eq!(None, find(""));
    }

    #[test]
    fn test_slugs_are_unique() {
        use std::collections::HashSet;
        let slugs: HashSet<&str> = COLLECTIONS.iter().map(|c| c.slug).collect();
        assert_eq!(COLLECTIONS.len(), slugs.len());
    }
}
