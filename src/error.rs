use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntrospectError {
    /// Shape category outside the set the builder understands.
    #[error("unsupported kind {kind} for {type_name}")]
    UnsupportedKind {
        kind: &'static str,
        type_name: &'static str,
    },
    /// Dispatch finished but left the descriptor incomplete; a builder bug.
    #[error("descriptor for {type_name} still pending after shape dispatch")]
    InternalInvariant { type_name: &'static str },
}
