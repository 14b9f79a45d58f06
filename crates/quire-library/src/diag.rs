//! Diagnostics.

use std::fmt::{self, Display, Formatter};

use ecow::EcoVec;

/// Early-return with a [`StrResult`] or [`LayoutResult`].
///
/// If called with a character index, a string and format args, returns a
/// `LayoutResult`. If called with just a string and format args, returns with
/// a `StrResult`. The index form is matched first, so literal indices work;
/// in turn, the first format argument of the string form must not be a
/// literal.
///
/// You can also emit hints with the `; hint: "..."` syntax.
///
/// ```ignore
/// bail!(index, "bailing with a {}", "layout result");
/// bail!(0, "bailing at the start");
/// bail!("bailing with a {}", kind);
/// bail!(
///     index, "bailing with a {}", "layout result";
///     hint: "hint 1"
/// );
/// ```
#[macro_export]
#[doc(hidden)]
macro_rules! __bail {
    // For bail!(index, "just a {}", "string")
    (
        $index:expr, $fmt:literal $(, $arg:expr)*
        $(; hint: $hint:literal $(, $hint_arg:expr)*)*
        $(,)?
    ) => {
        return Err($crate::diag::eco_vec![
            $crate::diag::LayoutDiagnostic::error(
                $index,
                $crate::diag::eco_format!($fmt, $($arg),*),
            ) $(.with_hint($crate::diag::eco_format!($hint, $($hint_arg),*)))*
        ])
    };

    // For bail!("just a {}", value)
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        return Err($crate::diag::eco_format!($fmt, $($arg),*).into())
    };

    // For bail!("a hinted {}", value; hint: "some hint")
    (
        $fmt:literal $(, $arg:expr)*
        $(; hint: $hint:literal $(, $hint_arg:expr)*)*
        $(,)?
    ) => {
        return Err($crate::diag::HintedString::new(
            $crate::diag::eco_format!($fmt, $($arg),*)
        ) $(.with_hint($crate::diag::eco_format!($hint, $($hint_arg),*)))*.into())
    };

    // For bail!(error!(..))
    ($error:expr) => {
        return Err($crate::diag::eco_vec![$error])
    };
}

/// Construct an [`EcoString`], [`HintedString`] or [`LayoutDiagnostic`] with
/// severity `Error`.
#[macro_export]
#[doc(hidden)]
macro_rules! __error {
    // For error!(index, ...)
    (
        $index:expr, $fmt:literal $(, $arg:expr)*
        $(; hint: $hint:literal $(, $hint_arg:expr)*)*
        $(,)?
    ) => {
        $crate::diag::LayoutDiagnostic::error(
            $index,
            $crate::diag::eco_format!($fmt, $($arg),*),
        ) $(.with_hint($crate::diag::eco_format!($hint, $($hint_arg),*)))*
    };

    // For error!("just a {}", value).
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::diag::eco_format!($fmt, $($arg),*).into()
    };

    // For error!("a hinted {}", value; hint: "some hint"; hint: "...")
    (
        $fmt:literal $(, $arg:expr)*
        $(; hint: $hint:literal $(, $hint_arg:expr)*)*
        $(,)?
    ) => {
        $crate::diag::HintedString::new(
            $crate::diag::eco_format!($fmt, $($arg),*)
        ) $(.with_hint($crate::diag::eco_format!($hint, $($hint_arg),*)))*
    };
}

/// Construct a [`LayoutDiagnostic`] with severity `Warning`.
///
/// ```ignore
/// warning!(index, "warning with a {}", "layout result");
/// warning!(
///     index, "warning with a {}", "layout result";
///     hint: "hint 1"
/// );
/// ```
#[macro_export]
#[doc(hidden)]
macro_rules! __warning {
    (
        $index:expr,
        $fmt:literal $(, $arg:expr)*
        $(; hint: $hint:literal $(, $hint_arg:expr)*)*
        $(,)?
    ) => {
        $crate::diag::LayoutDiagnostic::warning(
            $index,
            $crate::diag::eco_format!($fmt, $($arg),*),
        ) $(.with_hint($crate::diag::eco_format!($hint, $($hint_arg),*)))*
    };
}

#[rustfmt::skip]
#[doc(inline)]
pub use {
    crate::__bail as bail,
    crate::__error as error,
    crate::__warning as warning,
    ecow::{eco_format, eco_vec, EcoString},
};

/// A result that can carry multiple layout errors.
pub type LayoutResult<T> = Result<T, EcoVec<LayoutDiagnostic>>;

/// An output alongside warnings generated while producing it.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Warned<T> {
    /// The produced output.
    pub output: T,
    /// Warnings generated while producing the output.
    pub warnings: EcoVec<LayoutDiagnostic>,
}

/// An error or warning raised while laying out a run of text.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct LayoutDiagnostic {
    /// Whether the diagnostic is an error or a warning.
    pub severity: Severity,
    /// The character index in the run the problem relates to.
    pub index: usize,
    /// A diagnostic message describing the problem.
    pub message: EcoString,
    /// Additional hints indicating how this problem could be avoided or
    /// worked around.
    pub hints: EcoVec<EcoString>,
}

/// The severity of a [`LayoutDiagnostic`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Severity {
    /// A fatal error.
    Error,
    /// A non-fatal warning.
    Warning,
}

impl LayoutDiagnostic {
    /// Create a new, bare error.
    pub fn error(index: usize, message: impl Into<EcoString>) -> Self {
        Self {
            severity: Severity::Error,
            index,
            message: message.into(),
            hints: eco_vec![],
        }
    }

    /// Create a new, bare warning.
    pub fn warning(index: usize, message: impl Into<EcoString>) -> Self {
        Self {
            severity: Severity::Warning,
            index,
            message: message.into(),
            hints: eco_vec![],
        }
    }

    /// Adds a single hint to the diagnostic.
    pub fn hint(&mut self, hint: impl Into<EcoString>) {
        self.hints.push(hint.into());
    }

    /// Adds a single hint to the diagnostic.
    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hint(hint);
        self
    }
}

impl Display for LayoutDiagnostic {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.severity {
            Severity::Error => f.write_str("error: ")?,
            Severity::Warning => f.write_str("warning: ")?,
        }
        write!(f, "{} (at character {})", self.message, self.index)?;
        for hint in &self.hints {
            write!(f, "\n  hint: {hint}")?;
        }
        Ok(())
    }
}

/// A result type with a string error message.
pub type StrResult<T> = Result<T, EcoString>;

/// An error message with hints.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct HintedString {
    /// The error message.
    pub message: EcoString,
    /// Additional hints to the user.
    pub hints: EcoVec<EcoString>,
}

impl HintedString {
    /// Create a new hinted string without any hints.
    pub fn new(message: EcoString) -> Self {
        Self { message, hints: eco_vec![] }
    }

    /// Adds a single hint to the hinted string.
    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

impl<S> From<S> for HintedString
where
    S: Into<EcoString>,
{
    fn from(value: S) -> Self {
        Self::new(value.into())
    }
}

/// Convert a [`StrResult`] to a [`LayoutResult`] by
/// adding the character index the failure relates to.
pub trait At<T> {
    /// Add the index information.
    fn at(self, index: usize) -> LayoutResult<T>;
}

impl<T, S> At<T> for Result<T, S>
where
    S: Into<HintedString>,
{
    fn at(self, index: usize) -> LayoutResult<T> {
        self.map_err(|err| {
            let HintedString { message, hints } = err.into();
            let mut diagnostic = LayoutDiagnostic::error(index, message);
            diagnostic.hints = hints;
            eco_vec![diagnostic]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fails(index: usize) -> LayoutResult<()> {
        bail!(index, "side table has no entry {}", index; hint: "allocate one more slot");
    }

    fn fails_plain() -> StrResult<()> {
        bail!("plain failure");
    }

    fn fails_at_start() -> LayoutResult<()> {
        bail!(0, "nothing to lay out");
    }

    fn fails_with_args(len: usize) -> StrResult<()> {
        bail!("run of length {} is too short", len);
    }

    #[test]
    fn test_bail_with_index_and_hint() {
        let errors = fails(7).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity, Severity::Error);
        assert_eq!(errors[0].index, 7);
        assert_eq!(errors[0].message, "side table has no entry 7");
        assert_eq!(errors[0].hints.as_slice(), ["allocate one more slot"]);
    }

    #[test]
    fn test_bail_with_literal_index() {
        let errors = fails_at_start().unwrap_err();
        assert_eq!(errors[0].index, 0);
        assert_eq!(errors[0].message, "nothing to lay out");
        assert!(errors[0].hints.is_empty());
    }

    #[test]
    fn test_bail_with_string_args() {
        assert_eq!(fails_with_args(2).unwrap_err(), "run of length 2 is too short");
    }

    #[test]
    fn test_error_with_literal_index() {
        let diagnostic = error!(3, "glyph {} is missing", 'x');
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.index, 3);
        assert_eq!(diagnostic.message, "glyph x is missing");
    }

    #[test]
    fn test_at_attaches_index() {
        let errors = fails_plain().at(3).unwrap_err();
        assert_eq!(errors[0].index, 3);
        assert_eq!(errors[0].message, "plain failure");
        assert_eq!(
            errors[0].to_string(),
            "error: plain failure (at character 3)"
        );
    }
}
