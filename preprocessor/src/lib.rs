//! Macro/include expansion engine for HTML-like template trees.
//!
//! Turns files containing C-preprocessor-style directives (`#define`,
//! `#include`, `#ifdef`/`#ifndef`/`#else`/`#endif`, `#undef`) into
//! fully expanded, directive-free text. File access is injected through
//! [`FileReader`], so the engine itself never touches the filesystem.
//!
//! ```
//! use preprocessor::{expand, MemoryReader};
//!
//! let mut files = MemoryReader::new();
//! files.insert("page.html", "#define greet(n) ( <b>{n}</b> )\ngreet(Hi)\n");
//! let out = expand("page.html", files);
//! assert_eq!(out.as_deref(), Ok("<b>Hi</b>\n"));
//! ```

pub mod conditionals;
pub mod error;
pub mod expander;
pub mod macros;
pub mod reader;
pub mod scanner;

pub use error::{ExpansionError, SourceLocation};
pub use expander::{expand, Expander, DEFAULT_MAX_DEPTH};
pub use macros::{MacroDefinition, MacroTable};
pub use reader::{normalize_path, FileReader, FsReader, MemoryReader};
pub use scanner::{Directive, DirectiveKind, Scanner, Segment};
