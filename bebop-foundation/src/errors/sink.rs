use crate::errors::Diagnostic;

/// Anything that collects diagnostics for later display. The parser and the
/// analysis environment both implement this, so every stage of the pipeline
/// reports problems the same way instead of returning them as errors.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}
