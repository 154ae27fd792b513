//! Post-processing of raw model output into displayable markdown.
//!
//! Every rule is a standalone pure function; [`normalize`] applies them in a
//! fixed order and [`sanitize`] strips embedded markup first. Rules later in
//! the chain see the output of earlier ones.

use regex::Regex;
use std::sync::LazyLock;

/// Words that the model tends to italicize for no reason.
const COMMON_WORDS: [&str; 6] = [
    "possible",
    "related",
    "condition",
    "conditions",
    "symptoms",
    "patterns",
];

/// Characters after a closing `**` that must not get a space inserted before them.
const CLOSING_PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ';', ':'];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid formatter regex")
}

static EMPHASIS_RUN: LazyLock<Regex> = LazyLock::new(|| compile(r"\*{3,}"));
static BOLD_SPAN: LazyLock<Regex> = LazyLock::new(|| compile(r"\*\*([^*]+)\*\*"));
static NUMBERED_ITEM: LazyLock<Regex> = LazyLock::new(|| compile(r"([.!?])\n(\d+\.)"));
static BULLET_ITEM: LazyLock<Regex> = LazyLock::new(|| compile(r"([.!?])\n([-•*]\s)"));
static LOWERCASE_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"([.!?])\n([a-z])"));
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| compile(r"\n{3,}"));
static SINGLE_EMPHASIS: LazyLock<Regex> = LazyLock::new(|| compile(r"\*([a-z]+)\*"));
static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^(#+[ \t]+.+)$"));

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| compile(r"(?is)<script[^>]*>.*?</script>"));
static IFRAME_BLOCK: LazyLock<Regex> = LazyLock::new(|| compile(r"(?is)<iframe[^>]*>.*?</iframe>"));

static BOLD_MARKERS: LazyLock<Regex> = LazyLock::new(|| compile(r"\*{2,}"));
static MISSING_SENTENCE_SPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"([.!?])([A-Z])"));
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| compile(r"\s{2,}"));

static MD_BOLD: LazyLock<Regex> = LazyLock::new(|| compile(r"\*\*(.+?)\*\*"));
static MD_ITALIC: LazyLock<Regex> = LazyLock::new(|| compile(r"\*(.+?)\*"));
static MD_H3: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^### (.+)$"));
static MD_H2: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^## (.+)$"));
static MD_H1: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^# (.+)$"));
static MD_PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| compile(r"\n\n+"));

/// Removes `<script>` and `<iframe>` blocks, then normalizes.
/// Blank input yields an empty string.
pub fn sanitize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    normalize(&strip_unsafe_markup(raw))
}

/// Drops `<script>` and `<iframe>` blocks. Removing one block can splice its
/// neighbours into a new one, so passes repeat until the text stops changing.
pub fn strip_unsafe_markup(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let stripped = SCRIPT_BLOCK.replace_all(&current, "");
        let stripped = IFRAME_BLOCK.replace_all(&stripped, "").into_owned();
        // every effective pass shortens the text, so this terminates
        if stripped == current {
            return current;
        }
        current = stripped;
    }
}

pub fn normalize(raw: &str) -> String {
    let text = collapse_emphasis_runs(raw);
    let text = space_after_bold(&text);
    let text = break_before_numbered_list(&text);
    let text = break_before_bullets(&text);
    let text = break_before_lowercase_line(&text);
    let text = collapse_blank_lines(&text);
    let text = strip_common_word_emphasis(&text);
    let text = pad_headings(&text);
    text.trim().to_string()
}

/// `***x***` and longer runs become `**x**`.
pub fn collapse_emphasis_runs(text: &str) -> String {
    EMPHASIS_RUN.replace_all(text, "**").into_owned()
}

/// `**bold**word` becomes `**bold** word`.
pub fn space_after_bold(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;
    for m in BOLD_SPAN.find_iter(text) {
        out.push_str(&text[last..m.end()]);
        if let Some(next) = text[m.end()..].chars().next() {
            if !next.is_whitespace() && !CLOSING_PUNCTUATION.contains(&next) {
                out.push(' ');
            }
        }
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

pub fn break_before_numbered_list(text: &str) -> String {
    NUMBERED_ITEM.replace_all(text, "${1}\n\n${2}").into_owned()
}

pub fn break_before_bullets(text: &str) -> String {
    BULLET_ITEM.replace_all(text, "${1}\n\n${2}").into_owned()
}

/// A sentence end followed by a single newline and a lowercase letter is
/// treated as a missing paragraph break.
pub fn break_before_lowercase_line(text: &str) -> String {
    LOWERCASE_LINE.replace_all(text, "${1}\n\n${2}").into_owned()
}

pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUN.replace_all(text, "\n\n").into_owned()
}

/// `*patterns*` becomes `patterns`. Bold spans and words outside
/// [`COMMON_WORDS`] keep their markers.
pub fn strip_common_word_emphasis(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in SINGLE_EMPHASIS.captures_iter(text) {
        let (Some(whole), Some(word)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let inside_bold = text[..whole.start()].ends_with('*') || text[whole.end()..].starts_with('*');
        if inside_bold || !COMMON_WORDS.contains(&word.as_str()) {
            continue;
        }
        out.push_str(&text[last..whole.start()]);
        out.push_str(word.as_str());
        last = whole.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Puts one blank line above and below every `#` heading line.
pub fn pad_headings(text: &str) -> String {
    let padded = HEADING_LINE.replace_all(text, "\n${1}\n");
    collapse_blank_lines(&padded)
}

/// Plain-text rendition: drops bold markers and squeezes whitespace.
pub fn clean_plain_text(text: &str) -> String {
    let cleaned = BOLD_MARKERS.replace_all(text, "");
    let cleaned = MISSING_SENTENCE_SPACE.replace_all(&cleaned, "${1} ${2}");
    let cleaned = WHITESPACE_RUN.replace_all(&cleaned, " ");
    let cleaned = BLANK_RUN.replace_all(&cleaned, "\n\n");
    cleaned.trim().to_string()
}

/// Converts the markdown subset the model emits into HTML tags.
pub fn markdown_to_display(text: &str) -> String {
    let html = MD_BOLD.replace_all(text, "<strong>${1}</strong>");
    let html = MD_ITALIC.replace_all(&html, "<em>${1}</em>");
    let html = MD_H3.replace_all(&html, "<h3>${1}</h3>");
    let html = MD_H2.replace_all(&html, "<h2>${1}</h2>");
    let html = MD_H1.replace_all(&html, "<h1>${1}</h1>");
    let html = MD_PARAGRAPH_BREAK.replace_all(&html, "</p><p>");
    format!("<p>{}</p>", html).replace("<p></p>", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_emphasis_runs() {
        assert_eq!(collapse_emphasis_runs("***bold***"), "**bold**");
        assert_eq!(collapse_emphasis_runs("*****x*****"), "**x**");
        assert_eq!(collapse_emphasis_runs("**ok** *it*"), "**ok** *it*");
    }

    #[test]
    fn test_space_after_bold() {
        assert_eq!(space_after_bold("**bold**word"), "**bold** word");
        assert_eq!(space_after_bold("**bold** word"), "**bold** word");
        assert_eq!(space_after_bold("**bold**."), "**bold**.");
        assert_eq!(space_after_bold("**bold**:"), "**bold**:");
        assert_eq!(space_after_bold("end **bold**"), "end **bold**");
        assert_eq!(space_after_bold("**a** **b**c"), "**a** **b** c");
    }

    #[test]
    fn test_bold_triple_markers_repaired() {
        let out = normalize("***bold***text");
        assert!(out.contains("**bold** text"), "{}", out);
        assert!(!out.contains("***"));
    }

    #[test]
    fn test_break_before_numbered_list() {
        let out = normalize("End of sentence.\n1. First item");
        assert!(out.contains("sentence.\n\n1. First item"), "{:?}", out);
        assert_eq!(break_before_numbered_list("Note:\n1. item"), "Note:\n1. item");
    }

    #[test]
    fn test_break_before_bullets() {
        assert_eq!(break_before_bullets("Try this!\n- walk"), "Try this!\n\n- walk");
        assert_eq!(break_before_bullets("Done.\n• rest"), "Done.\n\n• rest");
        assert_eq!(break_before_bullets("Ok?\n* breathe"), "Ok?\n\n* breathe");
        assert_eq!(break_before_bullets("Ok.\n-no space"), "Ok.\n-no space");
    }

    #[test]
    fn test_break_before_lowercase_line() {
        assert_eq!(
            break_before_lowercase_line("It helps.\nand then more"),
            "It helps.\n\nand then more"
        );
        assert_eq!(
            break_before_lowercase_line("It helps.\nThen more"),
            "It helps.\nThen more"
        );
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb\n\nc"), "a\n\nb\n\nc");
    }

    #[test]
    fn test_strip_common_word_emphasis() {
        assert_eq!(
            strip_common_word_emphasis("identify *patterns* and *possible* *triggers*"),
            "identify patterns and possible *triggers*"
        );
        assert_eq!(strip_common_word_emphasis("**patterns**"), "**patterns**");
        assert_eq!(strip_common_word_emphasis("*Patterns*"), "*Patterns*");
    }

    #[test]
    fn test_pad_headings() {
        assert_eq!(pad_headings("Intro\n## Next\nBody"), "Intro\n\n## Next\n\nBody");
        assert_eq!(pad_headings("Intro\n\n## Next\n\nBody"), "Intro\n\n## Next\n\nBody");
        assert_eq!(pad_headings("#hashtag line"), "#hashtag line");
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize("  \n\nhello\n\n  "), "hello");
        assert_eq!(normalize("## Title\nbody"), "## Title\n\nbody");
    }

    #[test]
    fn test_sanitize_removes_script_any_case() {
        let out = sanitize("hi <ScRiPt>evil()</script> bye");
        let lower = out.to_lowercase();
        assert!(!lower.contains("<script"));
        assert!(!lower.contains("</script>"));
        assert_eq!(out, "hi  bye");
    }

    #[test]
    fn test_sanitize_removes_iframe_and_multiline_script() {
        let out = sanitize("a<IFRAME src=\"x\">frame</iframe>b<script type=\"t\">\nline1\nline2\n</SCRIPT>c");
        assert_eq!(out, "abc");
    }

    #[test]
    fn test_sanitize_nested_markup() {
        for raw in [
            "hi <scr<script></script>ipt>alert(1)</script> bye",
            "hi <scr<iframe></iframe>ipt>alert(1)</script> bye",
            "hi <ifr<script>x</script>ame src=\"e\"></iframe> bye",
            "hi <scr<scr<script></script>ipt></script>ipt>alert(1)</script> bye",
        ] {
            let out = sanitize(raw);
            let lower = out.to_lowercase();
            assert!(!lower.contains("<script"), "{:?} -> {:?}", raw, out);
            assert!(!lower.contains("<iframe"), "{:?} -> {:?}", raw, out);
            assert_eq!(out, "hi  bye");
        }
    }

    #[test]
    fn test_strip_unsafe_markup_leaves_clean_text() {
        assert_eq!(strip_unsafe_markup("a <b>bold</b> c"), "a <b>bold</b> c");
    }

    #[test]
    fn test_sanitize_non_greedy() {
        let out = sanitize("<script>x</script>keep<script>y</script>");
        assert_eq!(out, "keep");
    }

    #[test]
    fn test_sanitize_empty() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize(" \n\t "), "");
    }

    #[test]
    fn test_sanitize_idempotent_on_clean_text() {
        let samples = [
            "It sounds frustrating to feel like your focus keeps slipping.",
            "Hello **world**.\n\n- item one\n- item two\n\n## Next steps\n\nMore text here.",
            "# Heading\n\nParagraph one.\n\n1. First\n2. Second",
            "Some *emphasis* stays, **bold** too.",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_sanitize_full_response() {
        let raw = "***Acknowledge:***It sounds hard.\n1. Try journaling.\nthis may help with *patterns*.\n\n\n\n## Next\nTalk to someone.";
        let out = sanitize(raw);
        assert_eq!(
            out,
            "**Acknowledge:** It sounds hard.\n\n1. Try journaling.\n\nthis may help with patterns.\n\n## Next\n\nTalk to someone."
        );
    }

    #[test]
    fn test_clean_plain_text() {
        assert_eq!(
            clean_plain_text("**Note:** rest well.Then   drink water.\n\n\nBye"),
            "Note: rest well. Then drink water. Bye"
        );
    }

    #[test]
    fn test_markdown_to_display() {
        assert_eq!(
            markdown_to_display("## Title\n\nSome **bold** and *soft* text."),
            "<p><h2>Title</h2></p><p>Some <strong>bold</strong> and <em>soft</em> text.</p>"
        );
        assert_eq!(markdown_to_display(""), "");
    }
}
