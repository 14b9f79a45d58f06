//! Definition of the central state shared by layout passes.

use ecow::EcoVec;
use rustc_hash::FxHashSet;

use crate::diag::{LayoutDiagnostic, Severity, Warned};

/// Collects warnings emitted while laying out text.
///
/// Layout-quality conditions (overflowing lines, fonts without a glyph for a
/// character) are not errors: they are pushed here and processing continues.
#[derive(Debug, Default, Clone)]
pub struct Sink {
    /// Warnings emitted so far.
    warnings: EcoVec<LayoutDiagnostic>,
    /// Hashes of all warning's indices and messages for deduplication.
    warnings_set: FxHashSet<u128>,
}

impl Sink {
    /// Create a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning.
    pub fn warn(&mut self, warning: LayoutDiagnostic) {
        debug_assert_eq!(warning.severity, Severity::Warning);
        tracing::warn!(index = warning.index, "{}", warning.message);

        // Check if warning is a duplicate.
        let hash = quire_utils::hash128(&(&warning.index, &warning.message));
        if self.warnings_set.insert(hash) {
            self.warnings.push(warning);
        }
    }

    /// The warnings collected so far.
    pub fn peek(&self) -> &[LayoutDiagnostic] {
        &self.warnings
    }

    /// Attach the collected warnings to an output.
    pub fn finish<T>(self, output: T) -> Warned<T> {
        Warned { output, warnings: self.warnings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::warning;

    #[test]
    fn test_sink_deduplicates() {
        let mut sink = Sink::new();
        sink.warn(warning!(4, "line overflows by {}pt", 2));
        sink.warn(warning!(4, "line overflows by {}pt", 2));
        sink.warn(warning!(9, "line overflows by {}pt", 2));
        assert_eq!(sink.peek().len(), 2);
        let warned = sink.finish(());
        assert_eq!(warned.warnings[1].index, 9);
    }
}
