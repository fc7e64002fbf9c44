//! Lexer for curly-brace configs (Junos, BIG-IP tmsh).
//!
//! Statements end at `;` or at a newline, `{` opens a block and `}` closes
//! it. `#` starts a line comment when it begins a statement, `/* */` comments
//! may appear anywhere outside quotes. Quoted strings are kept verbatim,
//! quotes included.

use super::normalize::RawStatement;
use crate::errors::{DriftError, Result};
use crate::model::VendorTag;
use crate::schema::canonical::{collapse_whitespace, tokenize};
use crate::schema::VendorSchema;

struct Frame {
    head: Option<RawStatement>,
    children: Vec<RawStatement>,
    /// Offset of the opening brace
    opened_at: usize,
}

struct Scanner<'a> {
    vendor: VendorTag,
    schema: &'a VendorSchema,
    max_depth: usize,
    frames: Vec<Frame>,
    buffer: String,
    buffer_start: Option<usize>,
}

impl<'a> Scanner<'a> {
    fn error(&self, offset: usize, reason: impl Into<String>) -> DriftError {
        DriftError::Parse {
            vendor: self.vendor,
            offset,
            reason: reason.into(),
        }
    }

    fn push_char(&mut self, offset: usize, c: char) {
        if self.buffer_start.is_none() {
            if c.is_whitespace() {
                return;
            }
            self.buffer_start = Some(offset);
        }
        self.buffer.push(c);
    }

    fn take_statement(&mut self) -> Option<RawStatement> {
        let start = self.buffer_start.take()?;
        let text = collapse_whitespace(&self.buffer);
        self.buffer.clear();
        if text.is_empty() {
            None
        } else {
            Some(RawStatement::new(text, start))
        }
    }

    fn current(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn end_statement(&mut self) {
        if let Some(stmt) = self.take_statement() {
            let top_level = self.frames.len() == 1;
            if top_level && self.schema.is_ignored(&tokenize(&stmt.text)) {
                return;
            }
            self.current().children.push(stmt);
        }
    }

    fn open_block(&mut self, offset: usize) -> Result<()> {
        let head = self
            .take_statement()
            .ok_or_else(|| self.error(offset, "'{' without a statement"))?;
        if self.frames.len() > self.max_depth {
            return Err(self.error(offset, format!("nesting deeper than {} levels", self.max_depth)));
        }
        self.frames.push(Frame {
            head: Some(head),
            children: Vec::new(),
            opened_at: offset,
        });
        Ok(())
    }

    fn close_block(&mut self, offset: usize) -> Result<()> {
        self.end_statement();
        if self.frames.len() == 1 {
            return Err(self.error(offset, "unbalanced '}'"));
        }
        if let Some(frame) = self.frames.pop() {
            if let Some(mut head) = frame.head {
                head.children = frame.children;
                self.current().children.push(head);
            }
        }
        Ok(())
    }
}

/// Split a braced config into nested statements.
///
/// # Errors
///
/// `DriftError::Parse` with the byte offset of unbalanced braces,
/// unterminated quotes or comments, or nesting deeper than `max_depth`.
pub(crate) fn lex(text: &str, schema: &VendorSchema, max_depth: usize) -> Result<Vec<RawStatement>> {
    let mut scanner = Scanner {
        vendor: schema.vendor(),
        schema,
        max_depth,
        frames: vec![Frame {
            head: None,
            children: Vec::new(),
            opened_at: 0,
        }],
        buffer: String::new(),
        buffer_start: None,
    };

    let mut chars = text.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        match c {
            '"' => {
                scanner.push_char(offset, c);
                let mut escaped = false;
                let mut closed = false;
                for (_, q) in chars.by_ref() {
                    scanner.buffer.push(q);
                    if escaped {
                        escaped = false;
                    } else if q == '\\' {
                        escaped = true;
                    } else if q == '"' {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(scanner.error(offset, "unterminated quoted string"));
                }
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut prev = '\0';
                let mut closed = false;
                for (_, q) in chars.by_ref() {
                    if prev == '*' && q == '/' {
                        closed = true;
                        break;
                    }
                    prev = q;
                }
                if !closed {
                    return Err(scanner.error(offset, "unterminated block comment"));
                }
            }
            '#' if scanner.buffer_start.is_none() => {
                for (_, q) in chars.by_ref() {
                    if q == '\n' {
                        break;
                    }
                }
            }
            ';' | '\n' => scanner.end_statement(),
            '{' => scanner.open_block(offset)?,
            '}' => scanner.close_block(offset)?,
            _ => scanner.push_char(offset, c),
        }
    }

    scanner.end_statement();
    if scanner.frames.len() > 1 {
        let opened_at = scanner.current().opened_at;
        return Err(scanner.error(opened_at, "unclosed '{'"));
    }
    Ok(scanner.frames.pop().map(|f| f.children).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn junos() -> VendorSchema {
        VendorSchema::builtin(VendorTag::Junos).unwrap()
    }

    #[test]
    fn test_blocks_and_statements() {
        let text = "## Last commit: 2026-01-05\nversion 20.4R3.8;\nsystem {\n    host-name edge-1;\n    services { ssh; }\n}\n";
        let statements = lex(text, &junos(), 64).unwrap();
        assert_eq!(statements.len(), 1);
        let system = &statements[0];
        assert_eq!(system.text, "system");
        assert_eq!(system.children[0].text, "host-name edge-1");
        assert_eq!(system.children[1].text, "services");
        assert_eq!(system.children[1].children[0].text, "ssh");
    }

    #[test]
    fn test_comments_stripped_and_quotes_kept() {
        let text = "interfaces {\n  /* uplink */\n  ge-0/0/0 { description \"to  core; primary\"; }\n}\n";
        let statements = lex(text, &junos(), 64).unwrap();
        let iface = &statements[0].children[0];
        assert_eq!(iface.text, "ge-0/0/0");
        assert_eq!(iface.children[0].text, "description \"to  core; primary\"");
    }

    #[test]
    fn test_unbalanced_close_reports_offset() {
        let err = lex("system { host-name a; }\n}\n", &junos(), 64).unwrap_err();
        assert!(matches!(err, DriftError::Parse { offset: 24, .. }));
    }

    #[test]
    fn test_unclosed_block_reports_opening_brace() {
        let err = lex("system {\n host-name a;\n", &junos(), 64).unwrap_err();
        assert!(matches!(err, DriftError::Parse { offset: 7, .. }));
    }

    #[test]
    fn test_unterminated_comment_and_quote() {
        assert!(lex("system { /* never closed\n}", &junos(), 64).is_err());
        assert!(lex("system { description \"open; }", &junos(), 64).is_err());
    }

    #[test]
    fn test_depth_limit() {
        assert!(lex("a { b { c { d; } } }", &junos(), 2).is_err());
        assert!(lex("a { b { c { d; } } }", &junos(), 3).is_ok());
    }
}
