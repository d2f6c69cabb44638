/// Whether text would render wrongly right after an inline prefix
///
/// Block-level markdown (headings, quotes, lists, code fences, tables)
/// and leading emphasis only work at the start of a line.
pub fn starts_with_block_markup(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return false;
    };

    if matches!(first, '#' | '>' | '-' | '*' | '+' | '_' | '`' | '|' | '~') {
        return true;
    }

    // Ordered list: digits followed by `.` or `)`
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && matches!(text[digits..].chars().next(), Some('.' | ')'))
}

/// Accumulates streamed text and renders it behind the reply prefix
///
/// The separator between prefix and text is decided once, on the first
/// non-empty content, so the rendered reply never jumps between edits.
#[derive(Debug, Clone)]
pub struct ReplyBuffer {
    prefix: String,
    separator: &'static str,
    text: String,
    decided: bool,
}

impl ReplyBuffer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: "",
            text: String::new(),
            decided: false,
        }
    }

    pub fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);

        if !self.decided && !self.text.is_empty() {
            self.decided = true;
            if !self.prefix.is_empty() && starts_with_block_markup(&self.text) {
                self.separator = "\n";
            }
        }
    }

    /// `{prefix}{separator}{text}` as shown in chat
    pub fn render(&self) -> String {
        format!("{}{}{}", self.prefix, self.separator, self.text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_markup_detection() {
        for text in ["# Title", "> quote", "- item", "* item", "+ item", "_em_", "```rust", "| a |", "~~x~~", "1. one", "12) twelve"] {
            assert!(starts_with_block_markup(text), "{text}");
        }
        for text in ["Hello", "2024 was", "", " # not first", "3"] {
            assert!(!starts_with_block_markup(text), "{text}");
        }
    }

    #[test]
    fn test_line_break_inserted_once() {
        let mut reply = ReplyBuffer::new("**GPT:** ");
        reply.push("");
        reply.push("# Heading");
        reply.push("\n- item");

        assert_eq!(reply.render(), "**GPT:** \n# Heading\n- item");
        assert_eq!(reply.text(), "# Heading\n- item");
    }

    #[test]
    fn test_plain_text_no_break() {
        let mut reply = ReplyBuffer::new("**GPT:** ");
        reply.push("Hel");
        reply.push("lo");
        assert_eq!(reply.render(), "**GPT:** Hello");
    }

    #[test]
    fn test_empty_prefix_never_breaks() {
        let mut reply = ReplyBuffer::new("");
        reply.push("> quoted");
        assert_eq!(reply.render(), "> quoted");
    }

    #[test]
    fn test_decision_uses_accumulated_text() {
        // "1" alone is not a list marker, but the decision is made on the first
        // non-empty fragment and does not change afterwards
        let mut reply = ReplyBuffer::new("P: ");
        reply.push("1");
        reply.push(". item");
        assert_eq!(reply.render(), "P: 1. item");
    }
}
