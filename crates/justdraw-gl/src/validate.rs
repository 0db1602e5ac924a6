//! Structural GLSL checks for the headless context.
//!
//! The checks catch the mistakes a driver would reject before type
//! checking: mismatched brackets, a truncated source, an `#error`
//! directive and a missing entry point. Problems are written the way
//! drivers write `getShaderInfoLog`:
//!
//! ```text
//! ERROR: 0:12: '}' : syntax error
//! ERROR: 1 compilation errors.  No code generated.
//! ```

use std::fmt;

/// A problem found in a shader source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIssue {
    /// 1-based source line.
    pub line: usize,
    /// Offending token, empty when there is none to point at.
    pub token: String,
    pub message: String,
}

impl SourceIssue {
    fn new(line: usize, token: &str, message: &str) -> Self {
        Self {
            line,
            token: token.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for SourceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERROR: 0:{}: '{}' : {}", self.line, self.token, self.message)
    }
}

/// Check a shader source. An empty result means the source compiles.
pub fn check_source(source: &str) -> Vec<SourceIssue> {
    let mut issues = Vec::new();
    let mut open: Vec<char> = Vec::new();
    let mut in_block_comment = false;
    let mut last_line = 1;
    let mut code = String::with_capacity(source.len());

    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let stripped = strip_comments(raw, &mut in_block_comment);
        let trimmed = stripped.trim();
        if trimmed.is_empty() {
            continue;
        }
        last_line = line_no;

        if let Some(directive) = trimmed.strip_prefix('#') {
            if let Some(message) = directive.trim_start().strip_prefix("error") {
                issues.push(SourceIssue::new(line_no, "#error", message.trim()));
            }
            continue;
        }

        for c in trimmed.chars() {
            match c {
                '{' | '(' | '[' => open.push(c),
                '}' | ')' | ']' => {
                    let expected = match c {
                        '}' => '{',
                        ')' => '(',
                        _ => '[',
                    };
                    if open.pop() != Some(expected) {
                        issues.push(SourceIssue::new(line_no, &c.to_string(), "syntax error"));
                        return issues;
                    }
                }
                _ => {}
            }
        }

        code.push_str(trimmed);
        code.push('\n');
    }

    if !open.is_empty() {
        issues.push(SourceIssue::new(
            last_line,
            "",
            "syntax error: unexpected end of file",
        ));
    } else if issues.is_empty() && !declares_main(&code) {
        issues.push(SourceIssue::new(last_line, "main", "missing main function"));
    }

    issues
}

/// Render issues as a driver info log.
pub fn info_log(issues: &[SourceIssue]) -> String {
    if issues.is_empty() {
        return String::new();
    }

    let mut log = String::new();
    for issue in issues {
        log.push_str(&issue.to_string());
        log.push('\n');
    }
    log.push_str(&format!(
        "ERROR: {} compilation errors.  No code generated.\n",
        issues.len()
    ));
    log
}

/// Names declared with a storage qualifier (`attribute`, `uniform`), in
/// declaration order. Array suffixes are dropped.
pub fn declared_names(source: &str, qualifier: &str) -> Vec<String> {
    let mut in_block_comment = false;
    let code: String = source
        .lines()
        .map(|line| strip_comments(line, &mut in_block_comment))
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    let mut names = Vec::new();
    for statement in code.split(|c| c == ';' || c == '{' || c == '}') {
        let mut words = statement.split_whitespace();
        if words.next() != Some(qualifier) {
            continue;
        }
        let declarators = words.collect::<Vec<_>>().join(" ");

        for (i, part) in declarators.split(',').enumerate() {
            let word = if i == 0 {
                part.split_whitespace().last()
            } else {
                part.split_whitespace().next()
            };
            if let Some(word) = word {
                let name = word.split('[').next().unwrap_or(word);
                if !name.is_empty() && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
    }
    names
}

fn strip_comments(line: &str, in_block: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if *in_block {
            if c == '*' && chars.peek().copied() == Some('/') {
                chars.next();
                *in_block = false;
            }
            continue;
        }
        match (c, chars.peek().copied()) {
            ('/', Some('/')) => break,
            ('/', Some('*')) => {
                chars.next();
                *in_block = true;
            }
            _ => out.push(c),
        }
    }
    out
}

fn declares_main(code: &str) -> bool {
    let words: Vec<&str> = code
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect();
    words.windows(2).any(|pair| pair == ["void", "main"])
}
