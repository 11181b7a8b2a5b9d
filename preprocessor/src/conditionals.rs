use crate::error::{ExpansionError, SourceLocation};
use std::path::Path;

/// Which directive opened a conditional block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondKind {
    IfDef,
    IfNDef,
}

/// One open `#ifdef`/`#ifndef` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalFrame {
    pub kind: CondKind,
    pub name: String,
    /// Truth of this frame's own test, negation already applied for
    /// `#ifndef`
    condition: bool,
    /// Liveness of the surrounding context when the frame opened
    parent_live: bool,
    in_else: bool,
    /// 1-based line of the opening directive
    pub line: usize,
}

impl ConditionalFrame {
    fn live(&self) -> bool {
        let branch = if self.in_else {
            !self.condition
        } else {
            self.condition
        };
        self.parent_live && branch
    }
}

/// Stack of nested conditional blocks for one file.
///
/// Each file's stack is self-contained: includes get a fresh stack and
/// must balance their own conditionals. Liveness of the innermost frame
/// folds in its parents, so a true branch nested inside a false one
/// stays dead.
#[derive(Debug, Clone, Default)]
pub struct ConditionalStack {
    frames: Vec<ConditionalFrame>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a block. `defined` is the macro table's answer for the
    /// tested name at this point in the stream.
    pub fn push(&mut self, kind: CondKind, name: impl Into<String>, defined: bool, line: usize) {
        let condition = match kind {
            CondKind::IfDef => defined,
            CondKind::IfNDef => !defined,
        };
        let parent_live = self.is_live();
        self.frames.push(ConditionalFrame {
            kind,
            name: name.into(),
            condition,
            parent_live,
            in_else: false,
            line,
        });
    }

    /// Switch the top frame to its else branch. Fails on an empty stack
    /// or a frame whose else was already seen.
    pub fn flip_else(&mut self, file: &Path, line: usize) -> Result<(), ExpansionError> {
        match self.frames.last_mut() {
            Some(frame) if !frame.in_else => {
                frame.in_else = true;
                Ok(())
            }
            _ => Err(ExpansionError::DanglingElse {
                location: SourceLocation::new(file, line),
            }),
        }
    }

    /// Close the top frame.
    pub fn pop(&mut self, file: &Path, line: usize) -> Result<(), ExpansionError> {
        match self.frames.pop() {
            Some(_) => Ok(()),
            None => Err(ExpansionError::DanglingEndIf {
                location: SourceLocation::new(file, line),
            }),
        }
    }

    /// Whether content at the current point is emitted and expanded.
    pub fn is_live(&self) -> bool {
        self.frames.last().map_or(true, ConditionalFrame::live)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// End-of-file check: every opened block must have closed.
    pub fn finish(&self, file: &Path) -> Result<(), ExpansionError> {
        match self.frames.last() {
            Some(frame) => Err(ExpansionError::UnterminatedConditional {
                name: frame.name.clone(),
                location: SourceLocation::new(file, frame.line),
            }),
            None => Ok(()),
        }
    }
}
