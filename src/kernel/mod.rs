//! Normalizer for a dependent type theory with Π, Σ, universes, judgmental
//! and propositional equality, effect handlers and metavariables.
//!
//! `reduce` holds the two entry points, `whnf` and `nf`. The other modules are
//! the collaborators they work against: the term model and its de Bruijn
//! operations, the binder context and the metavariable store.

pub mod config;
pub mod context;
pub mod conv;
pub mod error;
pub mod expr;
pub mod meta;
pub mod reduce;
pub mod subst;
