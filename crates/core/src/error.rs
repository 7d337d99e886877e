//! Classified errors with operation-chain context.
//!
//! Failures are classified into a small [`Kind`] taxonomy and wrapped with
//! an operation label at each layer boundary they cross. Wrapping only adds
//! context: the root message survives unchanged at the end of the display
//! chain, and the effective [`Kind`] is the first explicit classification
//! found walking inward.

use serde::Serialize;

/// Operation label attached to an error at a layer boundary,
/// e.g. `"repository.get_product_by_id"`.
pub type Op = &'static str;

/// Result type used across the service.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// The caller supplied a missing, empty, or out-of-range value.
    InvalidArgument,
    /// The entity does not exist in the primary store.
    NotFound,
    /// A backend failed (I/O, driver, protocol).
    Internal,
    /// Nothing in the chain claimed a classification.
    Unexpected,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::InvalidArgument => "invalid_argument",
            Kind::NotFound => "not_found",
            Kind::Internal => "internal",
            Kind::Unexpected => "unexpected",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error carrying its operation chain.
#[derive(Debug, thiserror::Error)]
#[error("{op}: {source}")]
pub struct Error {
    op: Op,
    kind: Option<Kind>,
    source: Cause,
}

#[derive(Debug, thiserror::Error)]
enum Cause {
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Chain(Box<Error>),
}

impl Error {
    /// Root error with an explicit classification.
    pub fn new(op: Op, kind: Kind, message: impl Into<String>) -> Self {
        Self {
            op,
            kind: Some(kind),
            source: Cause::Message(message.into()),
        }
    }

    /// Root error with no classification; [`Error::kind`] reports
    /// [`Kind::Unexpected`] unless an outer wrap reclassifies it.
    pub fn unexpected(op: Op, message: impl Into<String>) -> Self {
        Self {
            op,
            kind: None,
            source: Cause::Message(message.into()),
        }
    }

    /// Wrap with another operation label; the classification is inherited
    /// from the chain.
    pub fn wrap(op: Op, err: Error) -> Self {
        Self {
            op,
            kind: None,
            source: Cause::Chain(Box::new(err)),
        }
    }

    /// Wrap and reclassify at a boundary; the outer kind wins.
    pub fn wrap_kind(op: Op, kind: Kind, err: Error) -> Self {
        Self {
            op,
            kind: Some(kind),
            source: Cause::Chain(Box::new(err)),
        }
    }

    pub fn invalid_argument(op: Op, message: impl Into<String>) -> Self {
        Self::new(op, Kind::InvalidArgument, message)
    }

    pub fn not_found(op: Op, message: impl Into<String>) -> Self {
        Self::new(op, Kind::NotFound, message)
    }

    /// Absorb a foreign error (driver, codec, I/O) as an internal root cause.
    pub fn internal(op: Op, cause: impl std::fmt::Display) -> Self {
        Self::new(op, Kind::Internal, cause.to_string())
    }

    /// Outermost operation label.
    pub fn op(&self) -> Op {
        self.op
    }

    /// Effective classification: the first explicit kind walking inward.
    pub fn kind(&self) -> Kind {
        if let Some(kind) = self.kind {
            return kind;
        }
        match &self.source {
            Cause::Chain(inner) => inner.kind(),
            Cause::Message(_) => Kind::Unexpected,
        }
    }

    /// Operation labels from outermost to innermost.
    pub fn ops(&self) -> Vec<Op> {
        let mut ops = vec![self.op];
        let mut source = &self.source;
        while let Cause::Chain(inner) = source {
            ops.push(inner.op);
            source = &inner.source;
        }
        ops
    }

    /// The innermost message, stripped of operation prefixes.
    pub fn root_message(&self) -> &str {
        let mut source = &self.source;
        loop {
            match source {
                Cause::Message(msg) => return msg,
                Cause::Chain(inner) => source = &inner.source,
            }
        }
    }
}
