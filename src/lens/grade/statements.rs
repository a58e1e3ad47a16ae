//! Splitting of submitted SQL into individual statements
//!
//! Splitting is lexical: a `;` ends a statement unless it sits inside a
//! quoted string or identifier, a comment, or the body of a
//! `CREATE TRIGGER ... BEGIN ... END` block.

use std::iter::Peekable;
use std::str::Chars;

/// Split `sql` into trimmed statements, dropping empty and comment-only ones
///
/// The terminating `;` is not included in the returned statements.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut words = StatementWords::default();
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' | '`' | '[' => {
                words.end_word();
                words.saw_code();
                let close = if ch == '[' { ']' } else { ch };
                current.push(ch);
                copy_until(&mut chars, &mut current, |c, _| c == close);
            }
            '-' if chars.peek() == Some(&'-') => {
                words.end_word();
                current.push(ch);
                copy_until(&mut chars, &mut current, |c, _| c == '\n');
            }
            '/' if chars.peek() == Some(&'*') => {
                words.end_word();
                current.push(ch);
                if let Some(star) = chars.next() {
                    current.push(star);
                }
                copy_until(&mut chars, &mut current, |c, prev| {
                    prev == Some('*') && c == '/'
                });
            }
            ';' => {
                words.end_word();
                if words.inside_trigger_body() {
                    current.push(ch);
                } else {
                    finish_statement(&mut statements, &current, &words);
                    current.clear();
                    words = StatementWords::default();
                }
            }
            _ => {
                current.push(ch);
                if ch.is_alphanumeric() || ch == '_' {
                    words.push_char(ch);
                } else {
                    words.end_word();
                    if !ch.is_whitespace() {
                        words.saw_code();
                    }
                }
            }
        }
    }

    words.end_word();
    finish_statement(&mut statements, &current, &words);
    statements
}

/// Copy characters into `out` up to and including the one matching `stop`
fn copy_until<F>(chars: &mut Peekable<Chars<'_>>, out: &mut String, stop: F)
where
    F: Fn(char, Option<char>) -> bool,
{
    let mut prev = None;
    for c in chars.by_ref() {
        out.push(c);
        if stop(c, prev) {
            return;
        }
        prev = Some(c);
    }
}

fn finish_statement(statements: &mut Vec<String>, text: &str, words: &StatementWords) {
    if words.has_code {
        statements.push(text.trim().to_string());
    }
}

/// Keyword tracking for the statement being scanned
#[derive(Debug, Default)]
struct StatementWords {
    has_code: bool,
    word: String,
    leading: Vec<String>,
    /// Open BEGIN/CASE blocks, only counted inside trigger definitions
    depth: i32,
}

impl StatementWords {
    fn push_char(&mut self, ch: char) {
        self.has_code = true;
        self.word.push(ch.to_ascii_uppercase());
    }

    fn saw_code(&mut self) {
        self.has_code = true;
    }

    fn end_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        let word = std::mem::take(&mut self.word);
        if self.leading.len() < 3 {
            self.leading.push(word.clone());
        }
        if self.is_trigger() {
            match word.as_str() {
                "BEGIN" | "CASE" => self.depth += 1,
                "END" => self.depth -= 1,
                _ => {}
            }
        }
    }

    fn is_trigger(&self) -> bool {
        match self.leading.as_slice() {
            [create, trigger, ..] if create == "CREATE" && trigger == "TRIGGER" => true,
            [create, temp, trigger]
                if create == "CREATE"
                    && (temp == "TEMP" || temp == "TEMPORARY")
                    && trigger == "TRIGGER" =>
            {
                true
            }
            _ => false,
        }
    }

    fn inside_trigger_body(&self) -> bool {
        self.is_trigger() && self.depth > 0
    }
}
