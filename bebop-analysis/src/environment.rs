use bebop_foundation::errors::{Diagnostic, DiagnosticSink, Severity};
use tracing::trace;

use crate::schema::Definition;

/// Stable handle into the environment's definition arena.
///
/// Definitions form a graph with cycles (a union and its branches point at
/// each other), so they live in an arena and reference each other by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(u32);

impl DefId {
    /// Ids are handed out in declaration order, so the resolver can assign
    /// them before the definitions themselves exist.
    pub(crate) fn new(index: usize) -> DefId {
        DefId(index.try_into().expect("too many definitions declared"))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Holds everything produced during a compilation: the definition arena and
/// all diagnostics, in the order they were discovered.
#[derive(Debug, Default)]
pub struct Environment {
    pub diagnostics: Vec<Diagnostic>,
    defs: Vec<Definition>,
}

impl Environment {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn register(&mut self, def: Definition) -> DefId {
        let id = DefId(
            self.defs
                .len()
                .try_into()
                .expect("too many definitions declared"),
        );
        trace!(name = def.name(), ?id, "registering definition");
        self.defs.push(def);
        id
    }

    pub fn get(&self, id: DefId) -> &Definition {
        &self.defs[id.index()]
    }

    pub fn defs(&self) -> impl Iterator<Item = (DefId, &'_ Definition)> {
        self.defs
            .iter()
            .enumerate()
            .map(|(index, def)| (DefId(index as u32), def))
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity >= Severity::Error)
    }
}

impl DiagnosticSink for Environment {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
