// src/exec/output.rs
// Output shaping: line-count truncation, ANSI stripping, shell quoting

use std::sync::OnceLock;

use regex::Regex;

/// Keep only the last `max_lines` lines of `text`, prepending a notice line
/// that says how much was dropped. The notice is not counted against the
/// line budget. A `max_lines` of 0 disables truncation.
pub fn truncate_output(text: &str, max_lines: usize) -> String {
    if max_lines == 0 {
        return text.to_string();
    }

    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines {
        return text.to_string();
    }

    let tail = &lines[lines.len() - max_lines..];
    format!(
        "[Output truncated: showing last {} of {} lines]\n{}",
        max_lines,
        lines.len(),
        tail.join("\n")
    )
}

fn ansi_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Color/style SGR sequences only; cursor-movement escapes pass through
    PATTERN.get_or_init(|| match Regex::new(r"\x1b\[[0-9;]*m") {
        Ok(re) => re,
        Err(_) => unreachable!("static pattern"),
    })
}

/// Remove ANSI color escape sequences from tool output.
pub fn strip_ansi_codes(text: &str) -> String {
    ansi_pattern().replace_all(text, "").into_owned()
}

/// Join an argv into a copy-pasteable shell command line.
pub fn quote_command_line(command: &[String]) -> String {
    command
        .iter()
        .map(|arg| shell_words::quote(arg).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate a string to at most `max_chars` characters, appending the
/// original length when anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}... (length: {})", head, text.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_under_budget() {
        let text = "a\nb\nc";
        assert_eq!(truncate_output(text, 5), text);
        assert_eq!(truncate_output(text, 3), text);
    }

    #[test]
    fn test_truncate_keeps_tail() {
        let text = "l1\nl2\nl3\nl4\nl5";
        let out = truncate_output(text, 2);
        assert_eq!(
            out,
            "[Output truncated: showing last 2 of 5 lines]\nl4\nl5"
        );
        // Notice line is exempt from the budget
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn test_truncate_zero_disables() {
        let text = "l1\nl2\nl3";
        assert_eq!(truncate_output(text, 0), text);
    }

    #[test]
    fn test_truncate_empty() {
        assert_eq!(truncate_output("", 10), "");
    }

    #[test]
    fn test_strip_ansi_codes() {
        let colored = "\x1b[31merror\x1b[0m: \x1b[1;32mdone\x1b[m";
        assert_eq!(strip_ansi_codes(colored), "error: done");
    }

    #[test]
    fn test_strip_ansi_leaves_plain_text() {
        assert_eq!(strip_ansi_codes("plain output"), "plain output");
    }

    #[test]
    fn test_quote_command_line() {
        let command = vec![
            "/opt/sdk/hdc".to_string(),
            "shell".to_string(),
            "echo hello world".to_string(),
        ];
        assert_eq!(
            quote_command_line(&command),
            "/opt/sdk/hdc shell 'echo hello world'"
        );
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        let long = "x".repeat(250);
        let out = truncate_chars(&long, 200);
        assert!(out.starts_with(&"x".repeat(200)));
        assert!(out.ends_with("... (length: 250)"));
    }
}
