//! Decodes the bracket-tag Tajweed annotations embedded in Arabic verse text
//! into a flat sequence of [`Run`]s. An opening tag looks like `[h[` or
//! `[h:12[` (a rule letter, optionally followed by a numeric parameter), and
//! `]` closes the most recently opened tag. For example:
//!
//! ```text
//! بِسْمِ [h:1[ٱ]للَّهِ
//! ```
//!
//! Unknown or malformed tags are kept as literal text, so decoding never
//! fails. The ornamental tag (`o`) is elided: its brackets disappear but the
//! text it wraps is kept, unstyled.

use pulldown_cmark::escape::escape_html;
use std::fmt;

/// The presentation class for a span of annotated text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Style {
    /// Heavy (emphatic) letters.
    Heavy,
    /// Light letters.
    Light,
    /// Elongation (madd).
    Madd,
    /// Meem rules.
    Meem,
    /// Nasalization (ghunnah).
    Ghunnah,
    /// Silent letters.
    Silent,
    /// Echoing stop (qalqalah).
    Qalqalah,
    /// Alif rules.
    Alif,
    /// Merging (idgham).
    Idgham,
    /// Raa rules.
    Raa,
    /// Pause (waqf) rules.
    Waqf,
    /// Special rules without a dedicated class.
    Special,
    /// Any other annotated rule.
    Other,
}

impl Style {
    /// The CSS class name emitted for this style.
    pub fn class_name(self) -> &'static str {
        match self {
            Style::Heavy => "tajweed-heavy",
            Style::Light => "tajweed-light",
            Style::Madd => "tajweed-madd",
            Style::Meem => "tajweed-meem",
            Style::Ghunnah => "tajweed-ghunnah",
            Style::Silent => "tajweed-silent",
            Style::Qalqalah => "tajweed-qalqalah",
            Style::Alif => "tajweed-alif",
            Style::Idgham => "tajweed-idgham",
            Style::Raa => "tajweed-raa",
            Style::Waqf => "tajweed-waqf",
            Style::Special => "tajweed-special",
            Style::Other => "tajweed-other",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// What an opening tag does: start a styled span, or elide the tag glyphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Style(Style),
    Ornament,
}

impl Opcode {
    /// Maps a tag letter onto its opcode. Returns `None` for letters outside
    /// the known set.
    pub fn from_letter(letter: char) -> Option<Opcode> {
        Some(match letter {
            'h' => Opcode::Style(Style::Heavy),
            'l' => Opcode::Style(Style::Light),
            'p' => Opcode::Style(Style::Madd),
            'm' => Opcode::Style(Style::Meem),
            'n' => Opcode::Style(Style::Ghunnah),
            's' => Opcode::Style(Style::Silent),
            'g' | 'q' => Opcode::Style(Style::Qalqalah),
            'a' => Opcode::Style(Style::Alif),
            'i' => Opcode::Style(Style::Idgham),
            'r' => Opcode::Style(Style::Raa),
            'w' => Opcode::Style(Style::Waqf),
            'c' | 'f' => Opcode::Style(Style::Special),
            'u' => Opcode::Style(Style::Other),
            'o' => Opcode::Ornament,
            _ => return None,
        })
    }
}

/// A recognized opening tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub opcode: Opcode,

    /// The numeric parameter from the `[x:N[` form, if any. The decoder
    /// doesn't interpret it.
    pub param: Option<u32>,
}

/// A contiguous piece of decoded text with at most one style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub style: Option<Style>,
}

impl Run {
    fn plain(text: &str) -> Run {
        Run {
            text: text.to_owned(),
            style: None,
        }
    }
}

/// Decodes `raw` into runs. `None` yields no runs at all; any other input
/// yields at least one run, and text without tags comes back as a single
/// unstyled run.
pub fn decode(raw: Option<&str>) -> Vec<Run> {
    let raw = match raw {
        Some(raw) => raw,
        None => return Vec::new(),
    };

    let mut decoder = Decoder::default();
    let mut rest = raw;
    while let Some(i) = rest.find(&['[', ']'][..]) {
        decoder.push_text(&rest[..i]);
        rest = &rest[i..];
        if rest.starts_with(']') {
            if !decoder.close() {
                decoder.push_text("]");
            }
            rest = &rest[1..];
        } else if let Some((token, len)) = parse_open_tag(rest) {
            decoder.open(token);
            rest = &rest[len..];
        } else {
            decoder.push_text("[");
            rest = &rest[1..];
        }
    }
    decoder.push_text(rest);
    decoder.finish()
}

/// Concatenates the text of `runs`, dropping styles.
pub fn plain_text(runs: &[Run]) -> String {
    runs.iter().map(|run| run.text.as_str()).collect()
}

/// Renders `runs` as HTML: styled runs become `<span class="...">` elements
/// and all text is escaped.
pub fn to_html(runs: &[Run]) -> String {
    let mut out = String::new();
    for run in runs {
        match run.style {
            Some(style) => {
                out.push_str(r#"<span class=""#);
                out.push_str(style.class_name());
                out.push_str(r#"">"#);
                let _ = escape_html(&mut out, &run.text);
                out.push_str("</span>");
            }
            None => {
                let _ = escape_html(&mut out, &run.text);
            }
        }
    }
    out
}

/// Parses an opening tag at the start of `input` (which begins with `[`).
/// Returns the token and the number of bytes it spans.
fn parse_open_tag(input: &str) -> Option<(Token, usize)> {
    let bytes = input.as_bytes();
    let opcode = Opcode::from_letter(*bytes.get(1)? as char)?;
    match bytes.get(2)? {
        b'[' => Some((Token { opcode, param: None }, 3)),
        b':' => {
            let digits =
                bytes[3..].iter().take_while(|b| b.is_ascii_digit()).count();
            let end = 3 + digits;
            if *bytes.get(end)? != b'[' {
                return None;
            }
            Some((
                Token {
                    opcode,
                    param: input[3..end].parse().ok(),
                },
                end + 1,
            ))
        }
        _ => None,
    }
}

enum Frame {
    Styled(Style),
    Ornament,
}

#[derive(Default)]
struct Decoder {
    open: Vec<Frame>,
    runs: Vec<Run>,
}

impl Decoder {
    /// The innermost style in effect. Ornament frames are transparent.
    fn current_style(&self) -> Option<Style> {
        self.open.iter().rev().find_map(|frame| match frame {
            Frame::Styled(style) => Some(*style),
            Frame::Ornament => None,
        })
    }

    fn open(&mut self, token: Token) {
        self.open.push(match token.opcode {
            Opcode::Style(style) => Frame::Styled(style),
            Opcode::Ornament => Frame::Ornament,
        });
    }

    /// Closes the innermost frame. Returns `false` if nothing was open.
    fn close(&mut self) -> bool {
        self.open.pop().is_some()
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let style = self.current_style();
        match self.runs.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.runs.push(Run {
                text: text.to_owned(),
                style,
            }),
        }
    }

    fn finish(mut self) -> Vec<Run> {
        if self.runs.is_empty() {
            self.runs.push(Run::plain(""));
        }
        self.runs
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn styled(text: &str, style: Style) -> Run {
        Run {
            text: text.to_owned(),
            style: Some(style),
        }
    }

    #[test]
    fn test_plain_text_is_single_run() {
        for input in ["", "بِسْمِ ٱللَّهِ", "In the name of God"] {
            assert_eq!(vec![Run::plain(input)], decode(Some(input)));
        }
    }

    #[test]
    fn test_absent_input_is_empty() {
        assert!(decode(None).is_empty());
    }

    #[test]
    fn test_numbered_and_plain_tags() {
        let runs = decode(Some("بِسْمِ [h:1[ٱ]للَّهِ [n[ن]ا"));
        assert_eq!(
            vec![
                Run::plain("بِسْمِ "),
                styled("ٱ", Style::Heavy),
                Run::plain("للَّهِ "),
                styled("ن", Style::Ghunnah),
                Run::plain("ا"),
            ],
            runs
        );
    }

    #[test]
    fn test_letter_mapping() {
        let cases = [
            ("[l[x]", Style::Light),
            ("[p[x]", Style::Madd),
            ("[m[x]", Style::Meem),
            ("[n:3[x]", Style::Ghunnah),
            ("[s[x]", Style::Silent),
            ("[g[x]", Style::Qalqalah),
            ("[q:4[x]", Style::Qalqalah),
            ("[a:5[x]", Style::Alif),
            ("[c:6[x]", Style::Special),
            ("[f:7[x]", Style::Special),
            ("[i:8[x]", Style::Idgham),
            ("[u:9[x]", Style::Other),
            ("[r:10[x]", Style::Raa),
            ("[w:11[x]", Style::Waqf),
        ];
        for (input, style) in cases.iter() {
            assert_eq!(vec![styled("x", *style)], decode(Some(*input)), "{}", input);
        }
    }

    #[test]
    fn test_stripping_tags_preserves_text() {
        let input = "[h:9421[ٱ][l[ل]حَمْدُ [p[لِلَّهِ] رَبِّ [o[ٱ]لْعَٰلَمِينَ";
        let runs = decode(Some(input));
        assert_eq!("ٱلحَمْدُ لِلَّهِ رَبِّ ٱلْعَٰلَمِينَ", plain_text(&runs));
    }

    #[test]
    fn test_ornament_keeps_wrapped_text_unstyled() {
        assert_eq!(vec![Run::plain("hidden")], decode(Some("[o[hidden]")));
    }

    #[test]
    fn test_ornament_inside_span_inherits_style() {
        let runs = decode(Some("[h[a[o[b]c]d"));
        assert_eq!(vec![styled("abc", Style::Heavy), Run::plain("d")], runs);
    }

    #[test]
    fn test_ornament_closing_bracket_does_not_close_outer_span() {
        let runs = decode(Some("[m[x[o[y]z]"));
        assert_eq!(vec![styled("xyz", Style::Meem)], runs);
    }

    #[test]
    fn test_unknown_and_malformed_tags_stay_literal() {
        for input in ["[z[abc]", "[h:x[a", "[h", "a [ b", "[]", "[h:12"] {
            assert_eq!(input, plain_text(&decode(Some(input))), "{}", input);
        }
    }

    #[test]
    fn test_stray_close_is_literal() {
        assert_eq!(vec![Run::plain("a]b")], decode(Some("a]b")));
    }

    #[test]
    fn test_unclosed_span_runs_to_end() {
        assert_eq!(vec![styled("abc", Style::Silent)], decode(Some("[s[abc")));
    }

    #[test]
    fn test_nested_spans_use_innermost_style() {
        let runs = decode(Some("[h[a[l[b]c]"));
        assert_eq!(
            vec![
                styled("a", Style::Heavy),
                styled("b", Style::Light),
                styled("c", Style::Heavy),
            ],
            runs
        );
    }

    #[test]
    fn test_parse_open_tag_param() {
        assert_eq!(
            Some((
                Token {
                    opcode: Opcode::Style(Style::Heavy),
                    param: Some(42)
                },
                6
            )),
            parse_open_tag("[h:42[rest")
        );
        assert_eq!(None, parse_open_tag("[ٱ["));
    }

    #[test]
    fn test_to_html() {
        let html = to_html(&decode(Some("a<[h:1[b]")));
        assert_eq!(r#"a&lt;<span class="tajweed-heavy">b</span>"#, html);
    }
}
