//! Lexer for indentation-nested CLI configs (IOS, EOS).

use super::normalize::RawStatement;
use crate::errors::{DriftError, Result};
use crate::model::VendorTag;
use crate::schema::canonical::tokenize;
use crate::schema::VendorSchema;

struct Line<'a> {
    offset: usize,
    indent: usize,
    content: &'a str,
}

fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let line = raw.trim_end_matches(['\n', '\r']);
        let content = line.trim_start();
        Line {
            offset: start,
            indent: line.len() - content.len(),
            content: content.trim_end(),
        }
    })
}

/// Split a config into nested statements.
///
/// # Errors
///
/// `DriftError::Parse` for an indented line with no parent, an unterminated
/// banner or nesting deeper than `max_depth`.
pub(crate) fn lex(text: &str, schema: &VendorSchema, max_depth: usize) -> Result<Vec<RawStatement>> {
    let vendor = schema.vendor();
    let mut roots: Vec<RawStatement> = Vec::new();
    // Open statements with their indentation, outermost first
    let mut open: Vec<(usize, RawStatement)> = Vec::new();
    let mut lines = lines(text);

    while let Some(line) = lines.next() {
        if line.content.is_empty() || schema.is_comment(line.content) {
            continue;
        }

        while open.last().is_some_and(|(indent, _)| *indent >= line.indent) {
            close_innermost(&mut open, &mut roots);
        }

        let tokens = tokenize(line.content);
        if open.is_empty() {
            if line.indent > 0 {
                return Err(parse_error(vendor, line.offset, "indented line has no parent statement"));
            }
            if schema.is_ignored(&tokens) {
                continue;
            }
        }
        if open.len() >= max_depth {
            return Err(parse_error(
                vendor,
                line.offset,
                &format!("nesting deeper than {} levels", max_depth),
            ));
        }

        let mut stmt = RawStatement::new(line.content, line.offset);
        if tokens.len() >= 3 && tokens[0].eq_ignore_ascii_case("banner") {
            let (head, body) = read_banner(vendor, &line, &tokens, &mut lines)?;
            stmt.text = head;
            stmt.literal = Some(body);
        }
        open.push((line.indent, stmt));
    }

    while !open.is_empty() {
        close_innermost(&mut open, &mut roots);
    }
    Ok(roots)
}

fn close_innermost(open: &mut Vec<(usize, RawStatement)>, roots: &mut Vec<RawStatement>) {
    if let Some((_, stmt)) = open.pop() {
        match open.last_mut() {
            Some((_, parent)) => parent.children.push(stmt),
            None => roots.push(stmt),
        }
    }
}

/// `banner motd ^C ... ^C`: the delimiter is `^C` or the first character
/// after the banner type; the body may span lines.
fn read_banner<'a>(
    vendor: VendorTag,
    line: &Line<'a>,
    tokens: &[&str],
    lines: &mut impl Iterator<Item = Line<'a>>,
) -> Result<(String, String)> {
    let head = format!("{} {}", tokens[0].to_lowercase(), tokens[1]);
    let type_end = line.content.find(tokens[1]).map_or(0, |i| i + tokens[1].len());
    let rest = line.content[type_end..].trim_start();
    let delimiter: String = if rest.starts_with("^C") {
        "^C".to_string()
    } else {
        rest.chars().take(1).collect()
    };
    let after_open = &rest[delimiter.len()..];

    if let Some(end) = after_open.find(delimiter.as_str()) {
        return Ok((head, after_open[..end].to_string()));
    }

    let mut body: Vec<&str> = Vec::new();
    if !after_open.is_empty() {
        body.push(after_open);
    }
    for next in lines.by_ref() {
        let raw = next.content;
        if let Some(end) = raw.find(delimiter.as_str()) {
            if end > 0 {
                body.push(&raw[..end]);
            }
            return Ok((head, body.join("\n")));
        }
        body.push(raw);
    }
    Err(parse_error(
        vendor,
        line.offset,
        &format!("unterminated banner (delimiter '{}')", delimiter),
    ))
}

fn parse_error(vendor: VendorTag, offset: usize, reason: &str) -> DriftError {
    DriftError::Parse {
        vendor,
        offset,
        reason: reason.to_string(),
    }
}
