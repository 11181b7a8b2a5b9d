//! Line-oriented directive scanner.
//!
//! Splits raw template text into literal spans and directive spans. A
//! directive is a line whose first token is `#` immediately followed by
//! a known keyword; any other line is literal content, so `#footer` in
//! a CSS block or a stray `#!` line passes through untouched.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{alpha1, alphanumeric1, char, multispace0, space0, space1},
    combinator::{all_consuming, map_opt, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};

/// Directive keywords recognized at line start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Define,
    Undef,
    Include,
    IfDef,
    IfNDef,
    Else,
    EndIf,
}

impl DirectiveKind {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "define" => Some(DirectiveKind::Define),
            "undef" => Some(DirectiveKind::Undef),
            "include" => Some(DirectiveKind::Include),
            "ifdef" => Some(DirectiveKind::IfDef),
            "ifndef" => Some(DirectiveKind::IfNDef),
            "else" => Some(DirectiveKind::Else),
            "endif" => Some(DirectiveKind::EndIf),
            _ => None,
        }
    }
}

/// A parsed directive line.
///
/// `Define` carries `rest`, the unparsed tail of the line after the
/// name and parameter list; the macro body's opening paren lives there
/// and is captured separately (and only for live spans) via
/// [`Scanner::capture_body`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Define {
        name: String,
        params: Vec<String>,
        rest: String,
    },
    Undef {
        name: String,
    },
    Include {
        path: String,
    },
    IfDef {
        name: String,
    },
    IfNDef {
        name: String,
    },
    Else,
    EndIf,
    /// A known keyword whose line does not match the grammar. Kept as a
    /// segment (rather than failing at scan time) so dead conditional
    /// branches can skip it; the driver raises `MalformedDirective`
    /// only when one is reached live.
    Malformed {
        kind: DirectiveKind,
        text: String,
    },
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::Define { .. } => DirectiveKind::Define,
            Directive::Undef { .. } => DirectiveKind::Undef,
            Directive::Include { .. } => DirectiveKind::Include,
            Directive::IfDef { .. } => DirectiveKind::IfDef,
            Directive::IfNDef { .. } => DirectiveKind::IfNDef,
            Directive::Else => DirectiveKind::Else,
            Directive::EndIf => DirectiveKind::EndIf,
            Directive::Malformed { kind, .. } => *kind,
        }
    }
}

/// One span of the input: a run of literal lines or a single directive
/// line. Lines are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal {
        text: String,
        line: usize,
    },
    Directive {
        directive: Directive,
        raw: String,
        line: usize,
    },
}

/// Failure modes of `#define` body capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyError {
    /// No opening paren after the name/parameter list on the directive line
    MissingOpenParen,
    /// End-of-file before the body's parens balance
    Unterminated,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn directive_header(input: &str) -> IResult<&str, DirectiveKind> {
    preceded(
        (space0, char('#')),
        map_opt(identifier, DirectiveKind::from_word),
    )
    .parse(input)
}

fn param_list(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(
        char('('),
        separated_list0(char(','), delimited(multispace0, identifier, multispace0)),
        preceded(multispace0, char(')')),
    )
    .parse(input)
}

fn parse_name(rest: &str) -> Option<String> {
    all_consuming(delimited(space1, identifier, space0))
        .parse(rest)
        .ok()
        .map(|(_, name)| name.to_string())
}

fn parse_bare(rest: &str) -> Option<()> {
    let result: IResult<&str, &str> = all_consuming(space0).parse(rest);
    result.ok().map(|_| ())
}

fn parse_include(rest: &str) -> Option<Directive> {
    let angle = delimited(char('<'), take_until(">"), char('>'));
    let quoted = delimited(char('"'), take_until("\""), char('"'));
    let result: IResult<&str, &str> =
        all_consuming(delimited(space0, alt((angle, quoted)), space0)).parse(rest);
    let (_, path) = result.ok()?;
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    Some(Directive::Include {
        path: path.to_string(),
    })
}

fn parse_define(rest: &str) -> Option<Directive> {
    let (after_name, name) = preceded(space1, identifier).parse(rest).ok()?;
    // A paren directly after the name is a parameter list and must
    // parse as one; a paren after whitespace opens the body.
    let (params, tail) = if after_name.starts_with('(') {
        let (after_params, params) = param_list(after_name).ok()?;
        (params.iter().map(|p| p.to_string()).collect(), after_params)
    } else {
        (Vec::new(), after_name)
    };
    Some(Directive::Define {
        name: name.to_string(),
        params,
        rest: tail.to_string(),
    })
}

/// Classify one line. `None` means literal content; `Some(Malformed)`
/// means a known keyword with an unparseable remainder.
pub(crate) fn parse_directive(line: &str) -> Option<Directive> {
    // Classification ignores a CRLF '\r'; literal lines keep theirs.
    let line = line.strip_suffix('\r').unwrap_or(line);
    let (rest, kind) = directive_header(line).ok()?;
    let parsed = match kind {
        DirectiveKind::Define => parse_define(rest),
        DirectiveKind::Undef => parse_name(rest).map(|name| Directive::Undef { name }),
        DirectiveKind::Include => parse_include(rest),
        DirectiveKind::IfDef => parse_name(rest).map(|name| Directive::IfDef { name }),
        DirectiveKind::IfNDef => parse_name(rest).map(|name| Directive::IfNDef { name }),
        DirectiveKind::Else => parse_bare(rest).map(|_| Directive::Else),
        DirectiveKind::EndIf => parse_bare(rest).map(|_| Directive::EndIf),
    };
    Some(parsed.unwrap_or_else(|| Directive::Malformed {
        kind,
        text: line.trim().to_string(),
    }))
}

/// Find the paren matching `chars[open]`, counting nesting. Returns the
/// index of the closing paren, or `None` if the slice ends first.
pub(crate) fn find_matching_paren(chars: &[char], open: usize) -> Option<usize> {
    if chars.get(open) != Some(&'(') {
        return None;
    }
    let mut depth = 0usize;
    for (i, &c) in chars.iter().enumerate().skip(open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split an argument list on top-level commas, trimming each piece.
/// Commas inside nested parens belong to the nested call. Blank input
/// is an empty list, so `m()` invokes with zero arguments.
pub(crate) fn split_args(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    args.push(current.trim().to_string());
    args
}

fn scan_for_close(text: &str, depth: &mut usize) -> Option<usize> {
    for (i, c) in text.char_indices() {
        match c {
            '(' => *depth += 1,
            ')' => {
                *depth -= 1;
                if *depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Cursor over a file's lines, producing [`Segment`]s in order.
///
/// The driver pulls segments one at a time so that liveness decisions
/// (conditional branches) can steer what happens next; in particular a
/// `#define` body is only captured when the driver asks for it.
pub struct Scanner<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    trailing_newline: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        let trailing_newline = text.ends_with('\n');
        // Split on '\n' only, not str::lines: literal lines keep a
        // trailing '\r' so CRLF input round-trips byte-for-byte.
        let mut lines: Vec<&'a str> = text.split('\n').collect();
        if trailing_newline {
            lines.pop();
        }
        Self {
            lines,
            pos: 0,
            trailing_newline,
        }
    }

    /// Next segment, or `None` at end of input. Consecutive literal
    /// lines coalesce into one span so invocations may span lines.
    pub fn next_segment(&mut self) -> Option<Segment> {
        if self.pos >= self.lines.len() {
            return None;
        }
        let line = self.pos + 1;
        if let Some(directive) = parse_directive(self.lines[self.pos]) {
            let raw = self.lines[self.pos].to_string();
            self.pos += 1;
            return Some(Segment::Directive {
                directive,
                raw,
                line,
            });
        }
        let mut text = String::new();
        while self.pos < self.lines.len() && parse_directive(self.lines[self.pos]).is_none() {
            text.push_str(self.lines[self.pos]);
            text.push('\n');
            self.pos += 1;
        }
        if self.pos >= self.lines.len() && !self.trailing_newline {
            text.pop();
        }
        Some(Segment::Literal { text, line })
    }

    /// Capture a `#define` body starting in `rest` (the directive
    /// line's tail). Consumes further lines until the parens balance;
    /// text after the closing paren on its line is discarded. The body
    /// is the text between the outer parens, trimmed.
    pub fn capture_body(&mut self, rest: &str) -> Result<String, BodyError> {
        let after_open = match rest.trim_start().strip_prefix('(') {
            Some(tail) => tail,
            None => return Err(BodyError::MissingOpenParen),
        };
        let mut depth = 1usize;
        let mut body = String::new();
        let mut current = after_open.to_string();
        loop {
            match scan_for_close(&current, &mut depth) {
                Some(i) => {
                    body.push_str(&current[..i]);
                    return Ok(body.trim().to_string());
                }
                None => {
                    body.push_str(&current);
                    if self.pos >= self.lines.len() {
                        return Err(BodyError::Unterminated);
                    }
                    body.push('\n');
                    current = self.lines[self.pos].to_string();
                    self.pos += 1;
                }
            }
        }
    }
}
