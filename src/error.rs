use thiserror::Error;

/// The failure kinds raised while defining classes and constructing instances.
///
/// Errors travel as `anyhow::Error`; use `downcast_ref::<ClassError>()` to get the
/// outermost kind, or walk `chain()` for the underlying cause.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassError {
    /// a computed field name or a static initializer failed while the class was being defined
    #[error("DefinitionError: {0}")]
    Definition(String),
    /// an instance field could not be installed
    #[error("ConstructionError: {0}")]
    Construction(String),
    /// structural misuse, like extending a value that is not a class
    #[error("SemanticError: {0}")]
    Semantic(String),
    #[error("ReferenceError: {0}")]
    Reference(String),
    #[error("TypeError: {0}")]
    Type(String),
    /// an exception raised by user code; carries the rendered thrown value
    #[error("Uncaught {0}")]
    Thrown(String),
}

impl ClassError {
    /// finds a `ClassError` of the given kind, looking at the outermost context first
    /// and then at the causes it wraps
    pub fn find<'a>(error: &'a anyhow::Error, kind: fn(&ClassError) -> bool) -> Option<&'a ClassError> {
        error
            .downcast_ref::<ClassError>()
            .into_iter()
            .chain(error.chain().filter_map(|e| e.downcast_ref::<ClassError>()))
            .find(|e| kind(e))
    }
}
