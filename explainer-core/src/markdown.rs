//! The narrow markdown subset understood in explanation text: `**bold**` and line breaks.
//! Lists, links and headers pass through untouched.

use regex::Regex;
use std::sync::LazyLock;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"));

pub fn parse_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    BOLD.replace_all(text, "<strong>$1</strong>")
        .replace('\n', "<br>")
}

/// Citation URLs as list items, in the order the service ranked them.
pub fn render_citations(citations: &[String]) -> String {
    citations
        .iter()
        .map(|url| format!(r#"<li><a href="{url}" target="_blank">{url}</a></li>"#))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_and_line_breaks() {
        assert_eq!(
            parse_markdown("**bold** line1\nline2"),
            "<strong>bold</strong> line1<br>line2"
        );
        assert_eq!(parse_markdown(""), "");
    }

    #[test]
    fn bold_is_non_greedy_and_stays_within_a_line() {
        assert_eq!(
            parse_markdown("**a** and **b**"),
            "<strong>a</strong> and <strong>b</strong>"
        );
        assert_eq!(parse_markdown("**open\nclose**"), "**open<br>close**");
    }

    #[test]
    fn other_markdown_is_left_alone() {
        let text = "# Title\n- item\n[link](http://x)";
        assert_eq!(parse_markdown(text), "# Title<br>- item<br>[link](http://x)");
    }

    #[test]
    fn citations_keep_their_order() {
        let citations = vec![
            "https://medlineplus.gov/lab-tests/".to_string(),
            "https://www.ncbi.nlm.nih.gov/books/".to_string(),
        ];
        assert_eq!(
            render_citations(&citations),
            "<li><a href=\"https://medlineplus.gov/lab-tests/\" target=\"_blank\">https://medlineplus.gov/lab-tests/</a></li>\
             <li><a href=\"https://www.ncbi.nlm.nih.gov/books/\" target=\"_blank\">https://www.ncbi.nlm.nih.gov/books/</a></li>"
        );
        assert_eq!(render_citations(&[]), "");
    }
}
