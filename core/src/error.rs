use std::fmt;

use thiserror::Error;

use crate::element::ElementId;

/// Which per-element ray bin of a [`crate::TraceResult`] a query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinKind {
    Generated,
    Intercepted,
}

impl fmt::Display for BinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinKind::Generated => write!(f, "generated"),
            BinKind::Intercepted => write!(f, "intercepted"),
        }
    }
}

/// Errors raised while building an optical system or tracing through it.
///
/// A ray missing every surface is not an error: it ends up flagged as lost.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Element {0} is not registered in the system")]
    UnknownElement(ElementId),

    #[error("No {kind} rays were collected for element {element}")]
    NotCollected { kind: BinKind, element: ElementId },
}

impl TraceError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry(message.into())
    }

    /// True for errors caused by querying something that was never registered.
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::UnknownElement(_) | Self::NotCollected { .. })
    }
}
