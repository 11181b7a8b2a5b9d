//! Expansion driver.
//!
//! Orchestrates one top-to-bottom pass per file: scanner -> conditional
//! filter -> macro table update / invocation expansion -> output
//! buffer. Includes recurse through the same pipeline with the shared
//! macro table and include chain; each file keeps its own conditional
//! stack.

use crate::conditionals::{CondKind, ConditionalStack};
use crate::error::{ExpansionError, SourceLocation};
use crate::macros::{MacroDefinition, MacroTable};
use crate::reader::{normalize_path, FileReader};
use crate::scanner::{
    find_matching_paren, split_args, BodyError, Directive, DirectiveKind, Scanner, Segment,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default maximum macro expansion depth
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Expand the template at `entry`, reading it and every include through
/// `reader`. One-shot form of [`Expander::expand`].
pub fn expand<R: FileReader>(
    entry: impl AsRef<Path>,
    reader: R,
) -> Result<String, ExpansionError> {
    Expander::new(reader).expand(entry)
}

/// The expansion engine.
///
/// Holds the injected reader and the depth limit; all per-request state
/// (macro table, include chain, expansion frames) lives on the call
/// stack of [`Expander::expand`], so one engine value can serve many
/// independent expansions without leaking state between them.
pub struct Expander<R: FileReader> {
    reader: R,
    max_depth: usize,
}

impl<R: FileReader> Expander<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Same engine with a custom expansion depth limit.
    pub fn with_max_depth(reader: R, max_depth: usize) -> Self {
        Self { reader, max_depth }
    }

    /// Run one full, stateless expansion of `entry`.
    pub fn expand(&self, entry: impl AsRef<Path>) -> Result<String, ExpansionError> {
        let entry = normalize_path(entry.as_ref());
        let mut table = MacroTable::new();
        let mut state = ExpansionState::new(self.max_depth);
        let out = self.expand_file(&entry, &SourceLocation::unknown(), &mut table, &mut state)?;
        debug_assert!(state.is_clean());
        Ok(out)
    }

    /// Expand one file, guarding the include chain on every exit path.
    fn expand_file(
        &self,
        path: &Path,
        at: &SourceLocation,
        table: &mut MacroTable,
        state: &mut ExpansionState,
    ) -> Result<String, ExpansionError> {
        state.push_include(path, at)?;
        let result = self.expand_file_inner(path, at, table, state);
        state.pop_include();
        result
    }

    fn expand_file_inner(
        &self,
        path: &Path,
        at: &SourceLocation,
        table: &mut MacroTable,
        state: &mut ExpansionState,
    ) -> Result<String, ExpansionError> {
        let text =
            self.reader
                .read(path)
                .map_err(|e| ExpansionError::MissingIncludeFile {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                    location: at.clone(),
                })?;
        let mut scanner = Scanner::new(&text);
        let mut conditionals = ConditionalStack::new();
        let mut out = String::new();
        while let Some(segment) = scanner.next_segment() {
            match segment {
                Segment::Literal { text, line } => {
                    if conditionals.is_live() {
                        let loc = SourceLocation::new(path, line);
                        out.push_str(&self.expand_text(&text, &loc, true, table, state)?);
                    }
                }
                Segment::Directive {
                    directive,
                    raw,
                    line,
                } => {
                    let live = conditionals.is_live();
                    let loc = SourceLocation::new(path, line);
                    match directive {
                        Directive::IfDef { name } => {
                            let defined = table.is_defined(&name);
                            conditionals.push(CondKind::IfDef, name, defined, line);
                        }
                        Directive::IfNDef { name } => {
                            let defined = table.is_defined(&name);
                            conditionals.push(CondKind::IfNDef, name, defined, line);
                        }
                        Directive::Else => conditionals.flip_else(path, line)?,
                        Directive::EndIf => conditionals.pop(path, line)?,
                        Directive::Define { name, params, rest } => {
                            if live {
                                let body = match scanner.capture_body(&rest) {
                                    Ok(body) => body,
                                    Err(BodyError::MissingOpenParen) => {
                                        return Err(ExpansionError::MalformedDirective {
                                            text: raw.trim().to_string(),
                                            location: loc,
                                        });
                                    }
                                    Err(BodyError::Unterminated) => {
                                        return Err(ExpansionError::UnterminatedMacroBody {
                                            name,
                                            location: loc,
                                        });
                                    }
                                };
                                table.define(MacroDefinition {
                                    name,
                                    params,
                                    body,
                                    source_file: path.to_path_buf(),
                                    line,
                                });
                            }
                        }
                        Directive::Undef { name } => {
                            if live {
                                table.undef(&name);
                            }
                        }
                        Directive::Include { path: target } => {
                            if live {
                                let resolved = resolve_include(path, &target);
                                out.push_str(&self.expand_file(&resolved, &loc, table, state)?);
                            }
                        }
                        Directive::Malformed { kind, text } => match kind {
                            // Dead spans still balance-track
                            // conditionals, by keyword alone.
                            DirectiveKind::IfDef => {
                                if live {
                                    return Err(ExpansionError::MalformedDirective {
                                        text,
                                        location: loc,
                                    });
                                }
                                conditionals.push(CondKind::IfDef, "", false, line);
                            }
                            DirectiveKind::IfNDef => {
                                if live {
                                    return Err(ExpansionError::MalformedDirective {
                                        text,
                                        location: loc,
                                    });
                                }
                                conditionals.push(CondKind::IfNDef, "", false, line);
                            }
                            DirectiveKind::Else => {
                                if live {
                                    return Err(ExpansionError::MalformedDirective {
                                        text,
                                        location: loc,
                                    });
                                }
                                conditionals.flip_else(path, line)?;
                            }
                            DirectiveKind::EndIf => {
                                if live {
                                    return Err(ExpansionError::MalformedDirective {
                                        text,
                                        location: loc,
                                    });
                                }
                                conditionals.pop(path, line)?;
                            }
                            _ => {
                                if live {
                                    return Err(ExpansionError::MalformedDirective {
                                        text,
                                        location: loc,
                                    });
                                }
                            }
                        },
                    }
                }
            }
        }
        conditionals.finish(path)?;
        Ok(out)
    }

    /// Expand every resolvable macro invocation in `text`.
    ///
    /// `track_lines` is set for literal spans straight from a source
    /// file, where newlines before an invocation refine its reported
    /// line; substituted bodies and argument fragments keep the
    /// invocation site they came from.
    fn expand_text(
        &self,
        text: &str,
        loc: &SourceLocation,
        track_lines: bool,
        table: &MacroTable,
        state: &mut ExpansionState,
    ) -> Result<String, ExpansionError> {
        // No parens means no invocation can start anywhere in the span.
        if !text.contains('(') {
            return Ok(text.to_string());
        }
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut line_offset = 0usize;
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if is_ident_start(c) {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                if chars.get(i) == Some(&'(') {
                    if let Some(def) = table.lookup(&name) {
                        if let Some(close) = find_matching_paren(&chars, i) {
                            let args_text: String = chars[i + 1..close].iter().collect();
                            let site = if track_lines {
                                SourceLocation::new(loc.file.clone(), loc.line + line_offset)
                            } else {
                                loc.clone()
                            };
                            out.push_str(
                                &self.expand_invocation(def, &args_text, &site, table, state)?,
                            );
                            // Keep line accounting right across
                            // multi-line argument lists.
                            line_offset +=
                                chars[i..=close].iter().filter(|&&c| c == '\n').count();
                            i = close + 1;
                            continue;
                        }
                    }
                }
                out.push_str(&name);
            } else {
                if c == '\n' {
                    line_offset += 1;
                }
                out.push(c);
                i += 1;
            }
        }
        Ok(out)
    }

    /// Bind arguments to parameters and produce the invocation's
    /// expansion: arguments first, then placeholder substitution, then
    /// a rescan of the substituted body.
    fn expand_invocation(
        &self,
        def: &MacroDefinition,
        args_text: &str,
        site: &SourceLocation,
        table: &MacroTable,
        state: &mut ExpansionState,
    ) -> Result<String, ExpansionError> {
        let raw_args = split_args(args_text);
        if raw_args.len() != def.params.len() {
            return Err(ExpansionError::ArityMismatch {
                name: def.name.clone(),
                expected: def.params.len(),
                found: raw_args.len(),
                location: site.clone(),
            });
        }
        // Arguments expand before the macro itself is entered, so a
        // macro may appear inside its own argument list: f(f(x)).
        let mut args = Vec::with_capacity(raw_args.len());
        for raw in &raw_args {
            args.push(self.expand_text(raw, site, false, table, state)?);
        }
        state.enter_expansion(&def.name, site)?;
        let substituted = substitute_placeholders(&def.body, &def.params, &args);
        let result = self.expand_text(&substituted, site, false, table, state);
        state.exit_expansion(&def.name);
        result
    }
}

/// Per-request recursion bookkeeping: the include chain for cycle
/// detection and the in-progress macro names plus depth counter for
/// self-reference defense. Entries are acquired on entry to a nested
/// expansion and released on every exit path.
#[derive(Debug)]
struct ExpansionState {
    include_chain: Vec<PathBuf>,
    expanding: Vec<String>,
    depth: usize,
    max_depth: usize,
}

impl ExpansionState {
    fn new(max_depth: usize) -> Self {
        Self {
            include_chain: Vec::new(),
            expanding: Vec::new(),
            depth: 0,
            max_depth,
        }
    }

    fn push_include(&mut self, path: &Path, at: &SourceLocation) -> Result<(), ExpansionError> {
        if self.include_chain.iter().any(|p| p == path) {
            let mut chain = self.include_chain.clone();
            chain.push(path.to_path_buf());
            return Err(ExpansionError::CyclicInclude {
                path: path.to_path_buf(),
                chain,
                location: at.clone(),
            });
        }
        self.include_chain.push(path.to_path_buf());
        Ok(())
    }

    fn pop_include(&mut self) {
        self.include_chain.pop();
    }

    fn enter_expansion(&mut self, name: &str, at: &SourceLocation) -> Result<(), ExpansionError> {
        if self.depth >= self.max_depth || self.expanding.iter().any(|n| n == name) {
            return Err(ExpansionError::ExpansionDepthExceeded {
                name: name.to_string(),
                depth: self.depth,
                max_depth: self.max_depth,
                location: at.clone(),
            });
        }
        self.depth += 1;
        self.expanding.push(name.to_string());
        Ok(())
    }

    fn exit_expansion(&mut self, name: &str) {
        if self.depth > 0 {
            self.depth -= 1;
        }
        self.expanding.retain(|n| n != name);
    }

    fn is_clean(&self) -> bool {
        self.include_chain.is_empty() && self.expanding.is_empty() && self.depth == 0
    }
}

fn resolve_include(including_file: &Path, target: &str) -> PathBuf {
    let dir = including_file.parent().unwrap_or_else(|| Path::new(""));
    normalize_path(&dir.join(target))
}

fn substitute_placeholders(body: &str, params: &[String], args: &[String]) -> String {
    if params.is_empty() || !body.contains('{') {
        return body.to_string();
    }
    // First binding wins if a parameter name repeats.
    let mut bindings: HashMap<&str, &str> = HashMap::new();
    for (param, arg) in params.iter().zip(args) {
        bindings.entry(param.as_str()).or_insert(arg.as_str());
    }
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '{' {
            let mut j = i + 1;
            while j < chars.len() && is_ident_char(chars[j]) {
                j += 1;
            }
            if j > i + 1 && chars.get(j) == Some(&'}') {
                let key: String = chars[i + 1..j].iter().collect();
                if let Some(value) = bindings.get(key.as_str()) {
                    out.push_str(value);
                    i = j + 1;
                    continue;
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
