//! Tab completion for the REPL.

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;

/// REPL helper completing commands, keywords and field names.
pub struct FieldbaseHelper {
    /// Known field names.
    pub fields: Vec<String>,
}

impl FieldbaseHelper {
    /// Create a new helper with an empty field list.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Update the field list.
    pub fn set_fields(&mut self, fields: Vec<String>) {
        self.fields = fields;
    }

    fn candidates(&self, line_to_cursor: &str) -> (usize, Vec<Pair>) {
        // Dot commands at start of line
        if line_to_cursor.trim_start().starts_with('.') && !line_to_cursor.trim().contains(' ') {
            let typed = line_to_cursor.trim();
            let completions = DOT_COMMANDS
                .iter()
                .filter(|cmd| cmd.starts_with(typed))
                .map(|cmd| pair(cmd))
                .collect();
            return (line_to_cursor.len() - typed.len(), completions);
        }

        // Find the start of the current word
        let word_start = line_to_cursor
            .rfind(|c: char| c.is_whitespace() || c == '(')
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = line_to_cursor[word_start..].to_lowercase();
        if word.is_empty() {
            return (word_start, Vec::new());
        }

        let mut completions: Vec<Pair> = self
            .fields
            .iter()
            .filter(|f| f.to_lowercase().starts_with(&word))
            .map(|f| pair(f))
            .collect();
        completions.extend(
            FILTER_KEYWORDS
                .iter()
                .filter(|kw| kw.starts_with(&word))
                .map(|kw| pair(kw)),
        );

        (word_start, completions)
    }
}

impl Default for FieldbaseHelper {
    fn default() -> Self {
        Self::new()
    }
}

/// Dot-commands for completion.
const DOT_COMMANDS: &[&str] = &[
    ".status",
    ".types",
    ".type",
    ".strict",
    ".validate",
    ".analyze",
    ".format",
    ".history",
    ".clear",
    ".help",
    ".exit",
    ".quit",
];

/// Filter keywords.
const FILTER_KEYWORDS: &[&str] = &[
    "and",
    "or",
    "contains",
    "startswith",
    "endswith",
    "is",
    "not",
    "null",
    "empty",
    "true",
    "false",
];

fn pair(text: &str) -> Pair {
    Pair {
        display: text.to_string(),
        replacement: text.to_string(),
    }
}

impl Completer for FieldbaseHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.candidates(&line[..pos]))
    }
}

impl Hinter for FieldbaseHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for FieldbaseHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: rustyline::highlight::CmdKind) -> bool {
        false
    }
}

impl Validator for FieldbaseHelper {}

impl Helper for FieldbaseHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    fn replacements(helper: &FieldbaseHelper, line: &str) -> (usize, Vec<String>) {
        let (start, pairs) = helper.candidates(line);
        (start, pairs.into_iter().map(|p| p.replacement).collect())
    }

    #[test]
    fn test_dot_commands() {
        let helper = FieldbaseHelper::new();
        assert_eq!(
            replacements(&helper, ".ty"),
            (0, vec![".types".to_string(), ".type".to_string()])
        );
        assert_eq!(replacements(&helper, ".ex"), (0, vec![".exit".to_string()]));
    }

    #[test]
    fn test_fields_and_keywords() {
        let mut helper = FieldbaseHelper::new();
        helper.set_fields(vec!["status".to_string(), "start_date".to_string()]);

        let (start, words) = replacements(&helper, "(sta");
        assert_eq!(start, 1);
        assert_eq!(words, vec!["status", "start_date", "startswith"]);

        let (start, words) = replacements(&helper, "name CON");
        assert_eq!(start, 5);
        assert_eq!(words, vec!["contains"]);
    }

    #[test]
    fn test_nothing_after_space() {
        let helper = FieldbaseHelper::new();
        assert_eq!(replacements(&helper, "age > "), (6, Vec::<String>::new()));
    }
}
