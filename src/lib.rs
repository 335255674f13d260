//! The library code for the `tilawah` Quran and hadith reader. A page is
//! produced in two steps:
//!
//! 1. Fetching and assembling a reading range ([`crate::pipeline`])
//! 2. Rendering the range into an HTML page ([`crate::render`])
//!
//! The first step is the more involved. A surah or juz needs two editions of
//! the text, one carrying Tajweed markup and one translation, which are
//! aligned verse by verse ([`crate::quran::align`]). A hadith chapter page is
//! decoded from whichever envelope shape the hadith service returned and
//! sorted by hadith number ([`crate::hadith`]).
//!
//! Rendering decodes the Tajweed markup into styled runs ([`crate::markup`])
//! and applies a template to the result, either one card per verse or a single
//! continuous reading flow.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod collection;
pub mod config;
pub mod fetch;
pub mod generation;
pub mod hadith;
pub mod markup;
pub mod pipeline;
pub mod quran;
pub mod render;
pub mod util;
pub mod value;
