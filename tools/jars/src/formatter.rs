use regex::Regex;
use std::sync::LazyLock;

static TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"[\w$£€/&@#+]+(?:[-'’.][\w$£€/&@#+]+)*|[^\w\s]").ok()
});

/// Transition words that must open a sentence rather than follow a comma.
pub const CONJUNCTIONS: [&str; 11] = [
    "Moreover",
    "However",
    "Further",
    "Also",
    "Besides",
    "Additionally",
    "Furthermore",
    "In addition",
    "In addition to",
    "Though",
    "On the other hand",
];

const CLEANUPS: [(&str, &str); 4] = [
    ("..", "."),
    (",.", "."),
    (".,", "."),
    ("  ", " "),
];

const ABBREVIATIONS: [&str; 9] = ["Mr", "Mrs", "Ms", "Dr", "St", "e.g", "i.e", "etc", "vs"];

/// Turns an assembled comment into publication-ready prose.
///
/// Comma-spliced conjunctions become sentence breaks, spacing and punctuation
/// artifacts are repaired, and every sentence is capitalized. Applying it to
/// its own output changes nothing.
pub fn format_comment(text: &str) -> String {
    let mut tokens = scan(text);
    split_spliced_conjunctions(&mut tokens);
    let joined = cleanup_punctuation(&join_tokens(&tokens));

    let sentences = split_sentences(&joined)
        .into_iter()
        .filter(|s| s.chars().any(char::is_alphanumeric))
        .map(capitalize_first)
        .collect::<Vec<_>>();

    let mut out = sentences.join(" ");
    if !out.is_empty() && !ends_with_terminal(&out) {
        out.push('.');
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    // Whitespace (or start of text) preceded the token in the input.
    spaced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Closer,
    Opener,
    DoubleQuote,
    SingleQuote,
    Symbol,
}

fn kind_of(text: &str) -> TokenKind {
    match text {
        "." | "," | "!" | "?" | ";" | ":" | "%" | ")" | "]" | "”" => TokenKind::Closer,
        "(" | "[" | "“" | "‘" => TokenKind::Opener,
        "\"" => TokenKind::DoubleQuote,
        "'" | "’" => TokenKind::SingleQuote,
        _ if text
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || "$£€/&@#+_".contains(c)) =>
        {
            TokenKind::Word
        }
        _ => TokenKind::Symbol,
    }
}

/// Splits text into word and punctuation tokens. Apostrophes, hyphens, inner
/// periods, slashes and currency signs stay inside words ("don't", "3.5",
/// "art/design", "$5").
pub fn tokenize(text: &str) -> Vec<String> {
    scan(text).into_iter().map(|t| t.text).collect()
}

fn scan(text: &str) -> Vec<Token> {
    let Some(re) = TOKEN.as_ref() else {
        return text
            .split_whitespace()
            .map(|w| Token {
                text: w.to_string(),
                spaced: true,
            })
            .collect();
    };
    re.find_iter(text)
        .map(|m| Token {
            text: m.as_str().to_string(),
            spaced: m.start() == 0 || text[..m.start()].ends_with(char::is_whitespace),
        })
        .collect()
}

// Rejoins tokens with single spaces. Closing punctuation hugs the previous
// token, openers hug the next one, and paired quotes hug their contents. A
// lone apostrophe or unknown symbol keeps the spacing it had in the input.
fn join_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut double_open = false;
    let mut single_open = false;
    let mut glue_next = false;
    let mut verbatim_next = false;

    for (i, token) in tokens.iter().enumerate() {
        let mut space = i > 0 && !glue_next;
        if verbatim_next {
            space = space && token.spaced;
        }
        glue_next = false;
        verbatim_next = false;

        match kind_of(&token.text) {
            TokenKind::Word => {}
            TokenKind::Closer => space = false,
            TokenKind::Opener => glue_next = true,
            TokenKind::DoubleQuote => {
                if double_open {
                    space = false;
                } else {
                    glue_next = true;
                }
                double_open = !double_open;
            }
            TokenKind::SingleQuote => {
                if single_open {
                    space = false;
                    single_open = false;
                } else if token.spaced {
                    glue_next = true;
                    single_open = true;
                } else {
                    space = false;
                    verbatim_next = true;
                }
            }
            TokenKind::Symbol => {
                space = space && token.spaced;
                verbatim_next = true;
            }
        }

        if space {
            out.push(' ');
        }
        out.push_str(&token.text);
    }
    out
}

// Walks tokens by index: a conjunction at `i` turns a preceding "," (or ", and")
// into a sentence break.
fn split_spliced_conjunctions(tokens: &mut [Token]) {
    for i in 0..tokens.len() {
        if !starts_conjunction(tokens, i) {
            continue;
        }
        if i >= 1 && tokens[i - 1].text == "," {
            tokens[i - 1].text = ".".to_string();
        } else if i >= 2 && tokens[i - 1].text == "and" && tokens[i - 2].text == "," {
            tokens[i - 2].text = ".".to_string();
            tokens[i - 1].text = ".".to_string();
        }
    }
}

fn starts_conjunction(tokens: &[Token], i: usize) -> bool {
    CONJUNCTIONS.iter().any(|phrase| {
        let words = phrase.split(' ').collect::<Vec<_>>();
        tokens.len() >= i + words.len()
            && words
                .iter()
                .zip(&tokens[i..])
                .all(|(word, token)| token.text == *word)
    })
}

fn cleanup_punctuation(text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..8 {
        let next = CLEANUPS
            .iter()
            .fold(current.clone(), |acc, (from, to)| acc.replace(from, to));
        if next == current {
            break;
        }
        current = next;
    }
    current.trim().to_string()
}

/// Sentence boundaries fall after `.`, `!` or `?` (plus closing quotes or
/// brackets) followed by whitespace, except after common abbreviations.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars = text.chars().collect::<Vec<_>>();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if matches!(chars[i], '.' | '!' | '?') {
            let mut end = i + 1;
            while end < chars.len() && matches!(chars[end], '"' | '\'' | ')' | '”' | '’') {
                end += 1;
            }
            let at_break = end >= chars.len() || chars[end].is_whitespace();
            if at_break && !(chars[i] == '.' && ends_with_abbreviation(&chars[start..i])) {
                push_sentence(&mut sentences, &chars[start..end]);
                start = end;
            }
            i = end;
            continue;
        }
        i += 1;
    }
    push_sentence(&mut sentences, &chars[start..]);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, chars: &[char]) {
    let sentence = chars.iter().collect::<String>();
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
}

fn ends_with_abbreviation(chars: &[char]) -> bool {
    let before = chars.iter().collect::<String>();
    let last_word = before
        .rsplit(|c: char| c.is_whitespace() || c == '(' || c == '"')
        .next()
        .unwrap_or_default();
    ABBREVIATIONS.contains(&last_word)
}

fn capitalize_first(sentence: String) -> String {
    let mut out = String::with_capacity(sentence.len());
    let mut done = false;
    for c in sentence.chars() {
        if !done && c.is_alphanumeric() {
            out.extend(c.to_uppercase());
            done = true;
        } else {
            out.push(c);
        }
    }
    out
}

fn ends_with_terminal(text: &str) -> bool {
    text.trim_end_matches(['"', '\'', ')', '”', '’'])
        .ends_with(['.', '!', '?'])
}

#[cfg(test)]
mod tests {
    use super::{format_comment, split_sentences, tokenize};

    #[test]
    fn tokenizer_separates_punctuation_but_keeps_contractions() {
        assert_eq!(
            tokenize("VDC's work, don't stop. Score 3.5!"),
            vec!["VDC's", "work", ",", "don't", "stop", ".", "Score", "3.5", "!"]
        );
    }

    #[test]
    fn comma_before_conjunction_becomes_period() {
        assert_eq!(
            format_comment("she reads well, However she rushes"),
            "She reads well. However she rushes."
        );
    }

    #[test]
    fn and_before_conjunction_becomes_period() {
        assert_eq!(
            format_comment("she reads well, and Moreover, she writes"),
            "She reads well. Moreover, she writes."
        );
    }

    #[test]
    fn repeated_conjunctions_are_each_handled() {
        assert_eq!(
            format_comment("a is good, However b, and However c"),
            "A is good. However b. However c."
        );
    }

    #[test]
    fn multi_word_conjunction_is_recognised() {
        assert_eq!(
            format_comment("she paints, In addition, she sculpts"),
            "She paints. In addition, she sculpts."
        );
    }

    #[test]
    fn assembler_artifacts_are_cleaned() {
        assert_eq!(
            format_comment("f0, and f1. . In addition, f2. f3, and f4.. f5"),
            "F0, and f1. In addition, f2. F3, and f4. F5."
        );
        assert_eq!(
            format_comment("great term. she reads, and  writes.. . keep it up"),
            "Great term. She reads, and writes. Keep it up."
        );
    }

    #[test]
    fn leading_and_trailing_empty_parts_disappear() {
        assert_eq!(
            format_comment(". she reads well. . "),
            "She reads well."
        );
        assert_eq!(format_comment(""), "");
        assert_eq!(format_comment(" . . "), "");
    }

    #[test]
    fn no_double_periods_even_for_ellipses() {
        let out = format_comment("she waits... then reads");
        assert!(!out.contains(".."), "{out}");
    }

    #[test]
    fn formatting_is_idempotent() {
        for input in [
            "Good job. Shows excellent understanding. Keep it up.",
            "great work, however she talks , and Besides, VDC's drawing is fine",
            "f0, and f1. , f2. Besides, f3. f4, and f5.. f6",
            "She scored 90 % ( mostly ) in art ; well done !",
            "She wrote \"Home\" and called it 'great', art/design for $5",
        ] {
            let once = format_comment(input);
            assert_eq!(format_comment(&once), once, "input: {input}");
        }
    }

    #[test]
    fn every_sentence_starts_uppercase() {
        let out = format_comment("one. two! three? \"four\" is quoted. five");
        for sentence in split_sentences(&out) {
            let first = sentence
                .chars()
                .find(|c| c.is_alphanumeric())
                .expect("alphabetic");
            assert!(first.is_uppercase(), "{sentence}");
        }
    }

    #[test]
    fn quoted_words_keep_their_quotes_tight() {
        assert_eq!(
            format_comment("She wrote \"Home\" for the project."),
            "She wrote \"Home\" for the project."
        );
        assert_eq!(
            format_comment("She called it 'great' today."),
            "She called it 'great' today."
        );
        assert_eq!(
            format_comment("he said “ well done ” to all"),
            "He said “well done” to all."
        );
    }

    #[test]
    fn slashes_currency_and_possessives_survive() {
        assert_eq!(format_comment("art/design"), "Art/design.");
        assert_eq!(format_comment("she raised $5 for the fair"), "She raised $5 for the fair.");
        assert_eq!(
            format_comment("the students' work - mostly sketches - improved"),
            "The students' work - mostly sketches - improved."
        );
    }

    #[test]
    fn stray_spaces_before_punctuation_are_removed() {
        assert_eq!(
            format_comment("She scored 90 % ( mostly ) in art ; well done !"),
            "She scored 90% (mostly) in art; well done!"
        );
    }

    #[test]
    fn abbreviations_do_not_break_sentences() {
        assert_eq!(
            split_sentences("She met Mr. Tan. Then left."),
            vec!["She met Mr. Tan.", "Then left."]
        );
    }
}
