use std::collections::HashMap;
use std::path::PathBuf;

/// A registered macro definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    /// Macro name as it appears at invocation sites
    pub name: String,
    /// Parameter names, in declaration order
    pub params: Vec<String>,
    /// Body template: literal text with `{param}` placeholders and
    /// possibly further macro invocations
    pub body: String,
    /// Source file where defined
    pub source_file: PathBuf,
    /// 1-based line of the `#define`
    pub line: usize,
}

impl MacroDefinition {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// The set of macros currently in scope.
///
/// Mutated only by `#define` (insert or overwrite) and `#undef`
/// (remove). Lookups reflect the table at the point in the stream where
/// the invocation occurs: a macro used before its `#define` is simply
/// absent, single-pass style. Absence is never an error here; an
/// undefined name only matters at invocation time, where it passes
/// through as literal text.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    macros: HashMap<String, MacroDefinition>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or fully replace a definition. No arity validation
    /// happens here; arity is checked against each invocation.
    pub fn define(&mut self, def: MacroDefinition) {
        self.macros.insert(def.name.clone(), def);
    }

    /// Remove a definition; a name that was never defined is a no-op.
    pub fn undef(&mut self, name: &str) {
        self.macros.remove(name);
    }

    pub fn lookup(&self, name: &str) -> Option<&MacroDefinition> {
        self.macros.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}
