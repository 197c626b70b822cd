//! Detection of structs that would require infinite storage.
//!
//! A struct stores its fields inline, so a struct that reaches itself through
//! nothing but plain struct fields can never be laid out. Indirection of any
//! kind (an optional, an array, a map, or the length-prefixed message and
//! union framings) breaks the chain and is fine.

use bebop_foundation::errors::{Diagnostic, DiagnosticSink, Label};

use crate::{
    environment::{DefId, Environment},
    schema::{Definition, Type},
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Unvisited,
    Visiting,
    Done,
}

pub(crate) fn run(env: &mut Environment) {
    let count = env.defs().count();
    let mut state = vec![State::Unvisited; count];
    let mut diagnostics = vec![];
    for (id, def) in env.defs() {
        if matches!(def, Definition::Struct(_)) && state[id.index()] == State::Unvisited {
            visit(env, id, &mut state, &mut vec![], &mut diagnostics);
        }
    }
    for diagnostic in diagnostics {
        env.emit(diagnostic);
    }
}

fn visit(
    env: &Environment,
    id: DefId,
    state: &mut [State],
    path: &mut Vec<DefId>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    state[id.index()] = State::Visiting;
    path.push(id);

    let Definition::Struct(def) = env.get(id) else {
        unreachable!("only structs are visited");
    };
    for field in &def.fields {
        // Only a direct struct-typed field stores the target inline.
        let &Type::Defined(target) = &field.ty else {
            continue;
        };
        let Definition::Struct(_) = env.get(target) else {
            continue;
        };
        match state[target.index()] {
            State::Unvisited => visit(env, target, state, path, diagnostics),
            State::Visiting => {
                // Back edge: `path` from `target` onward is the cycle. Each
                // cycle produces exactly one back edge, so one diagnostic.
                let start = path
                    .iter()
                    .position(|&node| node == target)
                    .expect("a visiting node must be on the path");
                let chain = path[start..]
                    .iter()
                    .chain([&target])
                    .map(|&node| env.get(node).name().to_owned())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                diagnostics.push(
                    Diagnostic::error(
                        def.header.file,
                        format!(
                            "struct `{}` would require infinite storage",
                            env.get(target).name()
                        ),
                    )
                    .with_code("infinite-struct")
                    .with_label(Label::primary(
                        field.span,
                        format!("this field stores `{}` by value", env.get(target).name()),
                    ))
                    .with_note(format!("note: the cycle is {chain}"))
                    .with_note(
                        "note: break the cycle with an optional, an array, or a message",
                    ),
                );
            }
            State::Done => {}
        }
    }

    path.pop();
    state[id.index()] = State::Done;
}
