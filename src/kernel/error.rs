use super::expr::Expr;
use super::meta::MetaId;

/// Fatal failure of a reduction. Raising one aborts the whole `whnf` / `nf`
/// call; no partial result is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypingViolation {
  /// The head of an application is neither a function nor a neutral term.
  #[error("function expected, application head is {head}")]
  NotAFunction { head: Expr },
  /// A projection index other than 1 or 2.
  #[error("bad projection index {index} in {term}")]
  BadProjection { index: usize, term: Expr },
  /// A node that weak head normalization always removes showed up after it.
  #[error("{what} survived weak head normalization: {term}")]
  EscapedWhnf { what: &'static str, term: Expr },
  /// A variable index past the end of the context.
  #[error("free bound variable at index {index} in a context of length {depth}")]
  UnboundVariable { index: usize, depth: usize },
}

pub type NormResult<T> = Result<T, TypingViolation>;

/// Misuse of the metavariable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MetaError {
  #[error("unknown metavariable {0}")]
  Unknown(MetaId),
  #[error("metavariable {0} is already solved")]
  AlreadySolved(MetaId),
}
