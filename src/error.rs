use thiserror::Error;

use crate::model::handle::Handle;

macro_rules! structural_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Structural {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Structural {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers the failure modes of model construction, use-site rewriting, and
/// physical element removal. Annotation-resolution misses are deliberately NOT represented
/// here: a failed lookup during the recursive hierarchy walk is swallowed inside the
/// resolver and treated as "no annotation found" for that branch, because metadata
/// presence is best-effort.
///
/// # Error Categories
///
/// ## Fatal Processing Errors
/// - [`Error::Rewrite`] - An override fragment produced invalid replacement code
/// - [`Error::Structural`] - The model is inconsistent between phases
///
/// ## Model Construction Errors
/// - [`Error::DuplicateClass`] - A class name was registered twice
/// - [`Error::Fragment`] - A replacement fragment failed syntactic validation
/// - [`Error::HandleNotFound`] - A handle does not resolve to a live element
///
/// # Examples
///
/// ```rust
/// use variscope::{Error, FeatureBindings, Processor, ProcessorConfig};
/// use variscope::model::registry::ClassRegistry;
/// use std::sync::Arc;
///
/// let registry = Arc::new(ClassRegistry::new());
/// let processor = Processor::new(registry, FeatureBindings::new(), ProcessorConfig::default());
/// match processor.process() {
///     Ok(report) => println!("removed {} classes", report.removed_classes),
///     Err(Error::Rewrite { element, message }) => {
///         eprintln!("bad override on {}: {}", element, message);
///     }
///     Err(e) => eprintln!("processing failed: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An override expression produced invalid replacement code.
    ///
    /// Fatal: the whole run aborts and no output artifact is produced. The
    /// `element` names the program element whose metadata carried the bad
    /// fragment, so the author can fix the annotation.
    #[error("Invalid override on {element}: {message}")]
    Rewrite {
        /// Display name of the element whose override fragment failed
        element: String,
        /// What was wrong with the fragment
        message: String,
    },

    /// A requested member or class could not be located in the model.
    ///
    /// This indicates an inconsistency between the mark and rewrite/delete
    /// phases and is always fatal. The error includes the source location
    /// where the inconsistency was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was inconsistent
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Structural - {file}:{line}: {message}")]
    Structural {
        /// The message to be printed for the Structural error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A class with the same fully qualified name is already registered.
    #[error("Class is already registered - {0}")]
    DuplicateClass(String),

    /// A replacement source fragment failed syntactic validation.
    ///
    /// Raised by the fragment constructors in [`crate::model::body`]; the
    /// rewriter wraps it into [`Error::Rewrite`] with the offending element
    /// attached.
    #[error("Invalid replacement fragment: {0}")]
    Fragment(String),

    /// The given handle does not resolve to a live element.
    #[error("No element registered for handle {0}")]
    HandleNotFound(Handle),
}
