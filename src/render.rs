//! Terminal rendering of conversation turns and citations
//!
//! Assistant text is stored verbatim. Rendering interprets a small markup
//! subset line by line: `**bold**` first, then `*italic*` over the result. Bullet glyphs
//! and everything else pass through literally. Citations are shown as a
//! numbered `[n]` footer under the answer, and a selected citation is shown
//! in a details panel.

use crate::conversation::{Citation, Message, Role};
use crate::session::SessionEvent;
use colored::{ColoredString, Colorize};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Text shown while an answer is pending
pub const TYPING_INDICATOR: &str = "Lexi is typing...";

/// Emphasis applied to a run of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
}

/// A run of text with uniform emphasis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

impl Span {
    fn new(text: &str, style: Style) -> Self {
        Self {
            text: text.to_string(),
            style,
        }
    }

    fn paint(&self) -> ColoredString {
        let mut painted = self.text.normal();
        if self.style.bold {
            painted = painted.bold();
        }
        if self.style.italic {
            painted = painted.italic();
        }
        painted
    }
}

fn bold_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"))
}

fn italic_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\*(.*?)\*").expect("italic pattern is valid"))
}

/// Appends a span, merging it into the previous one when the style matches
fn push_span(spans: &mut Vec<Span>, text: &str, style: Style) {
    if text.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => spans.push(Span::new(text, style)),
    }
}

/// Appends `text[range]`, split wherever it enters or leaves a bold run
fn push_piece(
    spans: &mut Vec<Span>,
    text: &str,
    range: Range<usize>,
    italic: bool,
    bold: &[Range<usize>],
) {
    let mut pos = range.start;
    while pos < range.end {
        let inside = bold.iter().find(|run| run.contains(&pos));
        let next = match inside {
            Some(run) => run.end,
            None => bold
                .iter()
                .map(|run| run.start)
                .filter(|&start| start > pos)
                .min()
                .unwrap_or(range.end),
        }
        .min(range.end);
        let style = Style {
            bold: inside.is_some(),
            italic,
        };
        push_span(spans, &text[pos..next], style);
        pos = next;
    }
}

/// Splits one line of answer text into styled spans
///
/// Two passes run over the whole line: bold markers are removed first,
/// then italic markers are matched in what remains. Both match
/// non-greedily, so `*a **b** c*` is italic throughout with `b` also bold.
/// Unpaired asterisks stay literal.
///
/// # Examples
///
/// ```
/// use lexi::render::emphasis_spans;
///
/// let spans = emphasis_spans("**Yes**, see *Dani Devi*");
/// assert_eq!(spans[0].text, "Yes");
/// assert!(spans[0].style.bold);
/// assert_eq!(spans[2].text, "Dani Devi");
/// assert!(spans[2].style.italic);
/// ```
pub fn emphasis_spans(line: &str) -> Vec<Span> {
    let mut text = String::with_capacity(line.len());
    let mut bold = Vec::new();
    let mut cursor = 0;
    for caps in bold_pattern().captures_iter(line) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        text.push_str(&line[cursor..whole.start()]);
        let start = text.len();
        text.push_str(inner.as_str());
        bold.push(start..text.len());
        cursor = whole.end();
    }
    text.push_str(&line[cursor..]);

    let mut spans = Vec::new();
    let mut cursor = 0;
    for caps in italic_pattern().captures_iter(&text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_piece(&mut spans, &text, cursor..whole.start(), false, &bold);
        push_piece(&mut spans, &text, inner.range(), true, &bold);
        cursor = whole.end();
    }
    push_piece(&mut spans, &text, cursor..text.len(), false, &bold);
    spans
}

/// Renders one line with emphasis applied
pub fn render_line(line: &str) -> String {
    emphasis_spans(line)
        .iter()
        .map(|span| span.paint().to_string())
        .collect()
}

/// Renders the `[n]` buttons for a message's citations
///
/// Returns `None` when the message has no citations.
pub fn render_citation_footer(message: &Message) -> Option<String> {
    if message.citations.is_empty() {
        return None;
    }
    let markers: Vec<String> = message
        .citations
        .markers()
        .map(|(n, _)| format!("[{}]", n).cyan().to_string())
        .collect();
    Some(format!("{} {}", "Citations:".dimmed(), markers.join(" ")))
}

/// Renders a complete conversation turn
pub fn render_message(message: &Message, show_timestamps: bool) -> String {
    let author = match message.role {
        Role::User => "You".green().bold(),
        Role::Assistant => "Lexi".cyan().bold(),
    };
    let mut out = if show_timestamps {
        format!(
            "{} {}",
            author,
            message.timestamp.format("[%H:%M:%S]").to_string().dimmed()
        )
    } else {
        author.to_string()
    };

    for line in message.text.lines() {
        out.push('\n');
        match message.role {
            Role::User => out.push_str(line),
            Role::Assistant => out.push_str(&render_line(line)),
        }
    }

    if let Some(footer) = render_citation_footer(message) {
        out.push('\n');
        out.push_str(&footer);
    }
    out
}

/// Renders the details panel for a selected citation
///
/// Fields absent from the citation are omitted.
pub fn render_citation_panel(citation: &Citation) -> String {
    let mut out = format!("{}", "Citation Details".bold().underline());
    if let Some(text) = &citation.text {
        out.push_str(&format!("\n{} {}", "Text:".bold(), text));
    }
    if let Some(source) = &citation.source {
        out.push_str(&format!("\n{} {}", "Source:".bold(), source.italic()));
    }
    if citation.is_blank() {
        out.push_str(&format!("\n{}", "(no details available)".dimmed()));
    }
    out.push_str(&format!("\n{}", "Type /close to dismiss".dimmed()));
    out
}

/// Renders every citation of a message in full
///
/// Used for one-shot output where there is no overlay to open.
pub fn render_citation_list(message: &Message) -> String {
    message
        .citations
        .markers()
        .map(|(n, citation)| {
            let source = citation.source.as_deref().unwrap_or("(unknown source)");
            let mut entry = format!("{} {}", format!("[{}]", n).cyan(), source.italic());
            if let Some(text) = &citation.text {
                entry.push_str(&format!("\n    {}", text));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the composing indicator
pub fn render_typing_indicator() -> String {
    TYPING_INDICATOR.dimmed().italic().to_string()
}

/// Renders a session event for the interactive chat
///
/// User turns are not echoed since the user just typed them. Returns `None`
/// for events with nothing to show.
pub fn render_event(event: &SessionEvent, show_timestamps: bool) -> Option<String> {
    match event {
        SessionEvent::MessageAppended(message) if message.is_user() => None,
        SessionEvent::MessageAppended(message) => {
            Some(format!("{}\n", render_message(message, show_timestamps)))
        }
        SessionEvent::ComposingChanged(true) => Some(render_typing_indicator()),
        SessionEvent::ComposingChanged(false) => None,
        SessionEvent::SubmissionRejected => Some(
            "Lexi is still answering your previous question. Please wait."
                .yellow()
                .to_string(),
        ),
        SessionEvent::CitationOpened(citation) => {
            Some(format!("{}\n", render_citation_panel(citation)))
        }
        SessionEvent::CitationClosed => Some("Citation closed.".dimmed().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::CitationStore;
    use chrono::{TimeZone, Utc};

    fn plain(text: &str) -> Span {
        Span::new(text, Style::default())
    }

    #[test]
    fn test_plain_line_is_one_span() {
        assert_eq!(emphasis_spans("no markup here"), vec![plain("no markup here")]);
        assert!(emphasis_spans("").is_empty());
    }

    #[test]
    fn test_bold_then_italic() {
        let spans = emphasis_spans("a **b** c *d* e");
        let styled: Vec<(&str, bool, bool)> = spans
            .iter()
            .map(|s| (s.text.as_str(), s.style.bold, s.style.italic))
            .collect();
        assert_eq!(
            styled,
            vec![
                ("a ", false, false),
                ("b", true, false),
                (" c ", false, false),
                ("d", false, true),
                (" e", false, false),
            ]
        );
    }

    #[test]
    fn test_bold_is_non_greedy() {
        let spans = emphasis_spans("**one** and **two**");
        let bold: Vec<&str> = spans
            .iter()
            .filter(|s| s.style.bold)
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(bold, vec!["one", "two"]);
    }

    #[test]
    fn test_italic_inside_bold() {
        let spans = emphasis_spans("**see *Dani Devi* here**");
        assert!(spans.iter().all(|s| s.style.bold));
        assert_eq!(
            spans.iter().find(|s| s.style.italic).map(|s| s.text.as_str()),
            Some("Dani Devi")
        );
    }

    #[test]
    fn test_unpaired_asterisks_stay_literal() {
        assert_eq!(emphasis_spans("5 * 3"), vec![plain("5 * 3")]);
        assert_eq!(emphasis_spans("2 * 3 = 6"), vec![plain("2 * 3 = 6")]);
    }

    #[test]
    fn test_empty_markers_are_removed() {
        assert!(emphasis_spans("****").is_empty());
        assert_eq!(emphasis_spans("x****y"), vec![plain("xy")]);
        assert_eq!(emphasis_spans("a ** b"), vec![plain("a  b")]);
    }

    #[test]
    fn test_italic_spans_across_bold() {
        let spans = emphasis_spans("*a **b** c*");
        let styled: Vec<(&str, bool, bool)> = spans
            .iter()
            .map(|s| (s.text.as_str(), s.style.bold, s.style.italic))
            .collect();
        assert_eq!(
            styled,
            vec![("a ", false, true), ("b", true, true), (" c", false, true)]
        );
    }

    #[test]
    fn test_bullets_pass_through() {
        let spans = emphasis_spans("• **Section 166**: claims");
        assert_eq!(spans[0], plain("• "));
        assert_eq!(spans[1].text, "Section 166");
    }

    #[test]
    fn test_message_lines_and_footer() {
        colored::control::set_override(false);
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let message = Message::assistant(
            2,
            "**Yes**\n• point",
            CitationStore::from(vec![Citation::new("a", "A"), Citation::new("b", "B")]),
            ts,
        );
        let rendered = render_message(&message, true);
        assert_eq!(
            rendered,
            "Lexi [09:30:00]\nYes\n• point\nCitations: [1] [2]"
        );
        assert!(!render_message(&message, false).contains("09:30"));
    }

    #[test]
    fn test_user_message_has_no_footer_or_markup() {
        colored::control::set_override(false);
        let message = Message::user(1, "why *not*", Utc::now());
        assert_eq!(render_message(&message, false), "You\nwhy *not*");
    }

    #[test]
    fn test_panel_omits_missing_fields() {
        colored::control::set_override(false);
        let source_only = Citation {
            text: None,
            source: Some("Para 7".to_string()),
        };
        let panel = render_citation_panel(&source_only);
        assert!(panel.contains("Source: Para 7"));
        assert!(!panel.contains("Text:"));

        let blank = render_citation_panel(&Citation::default());
        assert!(blank.contains("no details available"));
    }

    #[test]
    fn test_citation_list() {
        colored::control::set_override(false);
        let message = Message::assistant(
            2,
            "answer",
            CitationStore::from(vec![
                Citation::new("excerpt", "Para 7"),
                Citation {
                    text: Some("orphan".to_string()),
                    source: None,
                },
            ]),
            Utc::now(),
        );
        assert_eq!(
            render_citation_list(&message),
            "[1] Para 7\n    excerpt\n[2] (unknown source)\n    orphan"
        );
    }

    #[test]
    fn test_events_with_nothing_to_show() {
        let user = Message::user(1, "Hello", Utc::now());
        assert!(render_event(&SessionEvent::MessageAppended(user), true).is_none());
        assert!(render_event(&SessionEvent::ComposingChanged(false), true).is_none());
        assert!(render_event(&SessionEvent::ComposingChanged(true), true).is_some());
    }
}
