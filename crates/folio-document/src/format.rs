// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transcript formatter — whitespace normalisation and light repair of
// recognition output, applied once before display or storage.

use std::sync::LazyLock;

use regex::Regex;

static LONG_SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {3,}").unwrap());

static LONG_NEWLINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Sentence end, a single line break, then a capital letter. Whitespace
/// other than the line break may surround it.
static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?])[^\S\n]*\n[^\S\n]*(\p{Lu})").unwrap());

/// Clean up a transcript.
///
/// 1. Line endings become `\n`, tabs become four spaces, runs of 3+ spaces
///    shrink to 2 and runs of 3+ newlines shrink to 2.
/// 2. A space is inserted after `.`, `,` or `:` sitting between a lowercase
///    letter and a letter or digit (`end.Next` → `end. Next`).
/// 3. A single line break after `.`, `!` or `?` followed by a capital letter
///    becomes a paragraph break.
/// 4. Every line is trimmed, then the whole text.
///
/// The output never contains 3+ consecutive spaces or newlines, and
/// formatting it again returns it unchanged.
pub fn format_transcript(text: &str) -> String {
    let normalised = normalise_whitespace(text);
    let spaced = repair_punctuation_spacing(&normalised);
    let paragraphs = SENTENCE_BREAK.replace_all(&spaced, "$1\n\n$2");
    trim_lines(&paragraphs)
}

fn normalise_whitespace(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n").replace('\t', "    ");
    let spaces = LONG_SPACE_RUN.replace_all(&unified, "  ");
    LONG_NEWLINE_RUN.replace_all(&spaces, "\n\n").into_owned()
}

fn repair_punctuation_spacing(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + text.len() / 16);

    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        if !matches!(c, '.' | ',' | ':') {
            continue;
        }
        let after_lower = i > 0 && chars[i - 1].is_lowercase();
        let before_word = chars.get(i + 1).is_some_and(|next| next.is_alphanumeric());
        if after_lower && before_word {
            out.push(' ');
        }
    }

    out
}

fn trim_lines(text: &str) -> String {
    let trimmed = text.split('\n').map(str::trim).collect::<Vec<_>>().join("\n");
    LONG_NEWLINE_RUN
        .replace_all(&trimmed, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "   ",
        "plain text",
        "Line one.\r\nLine two.\rThree",
        "tab\there\t\tand   spaces     everywhere",
        "a\n\n\n\n\nb",
        "a\n   \n\n \nb",
        "word.Next word,then:more",
        "e.g.this and v1.2 and 3.5 and U.S.A",
        "End of sentence.\nNew sentence! \n Another?\nYes",
        "ends.\n\u{a0}Starts",
        "  leading and trailing  \n\n  lines  ",
        "x.\n\n\nY.\nZ",
        "mixed \t \r\n\r\n\r\n tabs.And",
        "über.Änderung",
    ];

    #[test]
    fn normalises_line_endings_and_tabs() {
        assert_eq!(format_transcript("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(format_transcript("a\tb"), "a  b");
    }

    #[test]
    fn collapses_long_runs() {
        assert_eq!(format_transcript("a     b"), "a  b");
        assert_eq!(format_transcript("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(format_transcript("a\n   \n\n\nb"), "a\n\nb");
    }

    #[test]
    fn repairs_dropped_spaces_after_lowercase() {
        assert_eq!(format_transcript("end.Next"), "end. Next");
        assert_eq!(format_transcript("one,two:three"), "one, two: three");
        assert_eq!(format_transcript("page.2"), "page. 2");
    }

    #[test]
    fn leaves_numerals_and_capital_abbreviations() {
        assert_eq!(format_transcript("3.5 and U.S.A"), "3.5 and U.S.A");
        assert_eq!(format_transcript("Version 1.2,3"), "Version 1.2,3");
    }

    #[test]
    fn promotes_sentence_breaks_to_paragraphs() {
        assert_eq!(
            format_transcript("First line.\nSecond line.\nthird"),
            "First line.\n\nSecond line.\nthird"
        );
        assert_eq!(format_transcript("Really? \n  Yes"), "Really?\n\nYes");
        assert_eq!(format_transcript("no stop\nNext"), "no stop\nNext");
    }

    #[test]
    fn trims_lines_and_whole_text() {
        assert_eq!(format_transcript("  a  \n  b  \n\n"), "a\nb");
    }

    #[test]
    fn idempotent_on_samples() {
        for sample in SAMPLES {
            let once = format_transcript(sample);
            let twice = format_transcript(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn whitespace_law_on_samples() {
        for sample in SAMPLES {
            let out = format_transcript(sample);
            assert!(!out.contains("   "), "3+ spaces in {out:?}");
            assert!(!out.contains("\n\n\n"), "3+ newlines in {out:?}");
        }
    }
}
