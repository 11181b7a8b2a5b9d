use std::fmt;
use std::path::PathBuf;

/// A position in a source file, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: PathBuf,
    /// 1-based line number; 0 when unknown.
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// A location for errors that precede any file position (e.g. the
    /// entry file itself failing to read).
    pub fn unknown() -> Self {
        Self {
            file: PathBuf::new(),
            line: 0,
        }
    }

    pub fn is_known(&self) -> bool {
        !self.file.as_os_str().is_empty()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "{}:{}", self.file.display(), self.line)
        } else {
            write!(f, "<unknown>")
        }
    }
}

/// Errors that can occur while expanding a template file.
///
/// Every variant is terminal for the file being expanded; callers
/// processing a batch of files continue with the next file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionError {
    /// A `#define` body's parentheses never balance before end-of-file
    UnterminatedMacroBody {
        name: String,
        location: SourceLocation,
    },

    /// Wrong number of arguments passed to a macro invocation
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        location: SourceLocation,
    },

    /// Macro expansion exceeded the depth limit, or a macro re-entered
    /// itself directly or through other macros
    ExpansionDepthExceeded {
        name: String,
        depth: usize,
        max_depth: usize,
        location: SourceLocation,
    },

    /// An `#include` re-entered a file already on the include chain
    CyclicInclude {
        path: PathBuf,
        chain: Vec<PathBuf>,
        location: SourceLocation,
    },

    /// The target of an `#include` (or the entry file) cannot be read
    MissingIncludeFile {
        path: PathBuf,
        reason: String,
        location: SourceLocation,
    },

    /// `#else` with no open conditional, or a second `#else` for the
    /// same conditional
    DanglingElse { location: SourceLocation },

    /// `#endif` with no open conditional
    DanglingEndIf { location: SourceLocation },

    /// End-of-file reached with a conditional still open
    UnterminatedConditional {
        name: String,
        location: SourceLocation,
    },

    /// A directive line that does not match the directive grammar
    MalformedDirective {
        text: String,
        location: SourceLocation,
    },
}

impl ExpansionError {
    /// Get the source location for this error
    pub fn location(&self) -> &SourceLocation {
        match self {
            ExpansionError::UnterminatedMacroBody { location, .. } => location,
            ExpansionError::ArityMismatch { location, .. } => location,
            ExpansionError::ExpansionDepthExceeded { location, .. } => location,
            ExpansionError::CyclicInclude { location, .. } => location,
            ExpansionError::MissingIncludeFile { location, .. } => location,
            ExpansionError::DanglingElse { location } => location,
            ExpansionError::DanglingEndIf { location } => location,
            ExpansionError::UnterminatedConditional { location, .. } => location,
            ExpansionError::MalformedDirective { location, .. } => location,
        }
    }
}

impl fmt::Display for ExpansionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpansionError::UnterminatedMacroBody { name, .. } => {
                write!(f, "unterminated body for macro '{}'", name)
            }
            ExpansionError::ArityMismatch {
                name,
                expected,
                found,
                ..
            } => {
                write!(
                    f,
                    "macro '{}' expects {} argument(s), found {}",
                    name, expected, found
                )
            }
            ExpansionError::ExpansionDepthExceeded {
                name,
                depth,
                max_depth,
                ..
            } => {
                // Below the limit the guard can only have fired on a
                // re-entered name.
                if depth < max_depth {
                    write!(f, "macro '{}' re-entered its own expansion", name)
                } else {
                    write!(
                        f,
                        "macro '{}' exceeded the expansion depth limit of {}",
                        name, max_depth
                    )
                }
            }
            ExpansionError::CyclicInclude { chain, .. } => {
                let shown: Vec<String> = chain.iter().map(|p| p.display().to_string()).collect();
                write!(f, "circular include chain: {}", shown.join(" -> "))
            }
            ExpansionError::MissingIncludeFile { path, reason, .. } => {
                write!(f, "cannot read include file '{}': {}", path.display(), reason)
            }
            ExpansionError::DanglingElse { .. } => {
                write!(f, "#else without a matching #ifdef/#ifndef")
            }
            ExpansionError::DanglingEndIf { .. } => {
                write!(f, "#endif without a matching #ifdef/#ifndef")
            }
            ExpansionError::UnterminatedConditional { name, .. } => {
                write!(f, "conditional on '{}' is never closed with #endif", name)
            }
            ExpansionError::MalformedDirective { text, .. } => {
                write!(f, "malformed directive: {}", text)
            }
        }
    }
}

impl std::error::Error for ExpansionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_macro_name_and_counts() {
        let err = ExpansionError::ArityMismatch {
            name: "header".to_string(),
            expected: 2,
            found: 3,
            location: SourceLocation::new("index.html", 4),
        };
        assert_eq!(
            err.to_string(),
            "macro 'header' expects 2 argument(s), found 3"
        );
        assert_eq!(err.location().line, 4);
    }

    #[test]
    fn depth_display_distinguishes_reentry_from_limit() {
        let reentry = ExpansionError::ExpansionDepthExceeded {
            name: "a".to_string(),
            depth: 1,
            max_depth: 256,
            location: SourceLocation::new("page.html", 2),
        };
        assert_eq!(
            reentry.to_string(),
            "macro 'a' re-entered its own expansion"
        );
        let limit = ExpansionError::ExpansionDepthExceeded {
            name: "deep".to_string(),
            depth: 8,
            max_depth: 8,
            location: SourceLocation::new("page.html", 9),
        };
        assert_eq!(
            limit.to_string(),
            "macro 'deep' exceeded the expansion depth limit of 8"
        );
    }

    #[test]
    fn cyclic_include_display_joins_chain() {
        let err = ExpansionError::CyclicInclude {
            path: PathBuf::from("a.html"),
            chain: vec![
                PathBuf::from("a.html"),
                PathBuf::from("b.html"),
                PathBuf::from("a.html"),
            ],
            location: SourceLocation::new("b.html", 2),
        };
        assert_eq!(
            err.to_string(),
            "circular include chain: a.html -> b.html -> a.html"
        );
    }

    #[test]
    fn unknown_location_displays_placeholder() {
        assert_eq!(SourceLocation::unknown().to_string(), "<unknown>");
        assert!(!SourceLocation::unknown().is_known());
    }
}
