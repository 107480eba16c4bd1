pub mod kernel;

pub use kernel::config::ReduceConfig;
pub use kernel::context::{Context, Entry};
pub use kernel::error::{MetaError, NormResult, TypingViolation};
pub use kernel::expr::{Expr, ExprData, Name};
pub use kernel::meta::{MetaId, MetaStore};
pub use kernel::reduce::{Reducer, nf, whnf};
