//! The metavariable store.
//!
//! Metavariables are allocated and solved by the elaboration layer. Each
//! solution is written at most once; reduction only ever reads it.

use std::fmt;

use rustc_hash::FxHashMap;

use super::error::MetaError;
use super::expr::{Expr, MetaApp, MetaKind, Span};

/// Identity of a metavariable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetaId(pub u32);

impl fmt::Display for MetaId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "m{}", self.0)
  }
}

#[derive(Debug, Clone)]
struct MetaEntry {
  ty: Expr,
  span: Span,
  kind: MetaKind,
  solution: Option<Expr>,
}

/// Owner of every metavariable and of its write-once solution slot.
#[derive(Debug, Default)]
pub struct MetaStore {
  entries: FxHashMap<MetaId, MetaEntry>,
  next: u32,
}

impl MetaStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Allocate an unsolved metavariable and return it applied to `args`.
  pub fn fresh(
    &mut self,
    ty: Expr,
    span: Span,
    kind: MetaKind,
    args: Vec<Expr>,
  ) -> MetaApp {
    let id = MetaId(self.next);
    self.next += 1;
    self
      .entries
      .insert(id, MetaEntry { ty: ty.clone(), span, kind, solution: None });
    MetaApp { id, args, ty, span, kind }
  }

  /// Publish the solution of `id`. A solution is final: solving twice fails.
  pub fn solve(&mut self, id: MetaId, solution: Expr) -> Result<(), MetaError> {
    let entry = self.entries.get_mut(&id).ok_or(MetaError::Unknown(id))?;
    if entry.solution.is_some() {
      return Err(MetaError::AlreadySolved(id));
    }
    entry.solution = Some(solution);
    Ok(())
  }

  /// The solution of `id`, if it has one. Unknown identities read as unsolved.
  pub fn read_solution(&self, id: MetaId) -> Option<&Expr> {
    self.entries.get(&id).and_then(|e| e.solution.as_ref())
  }

  pub fn is_solved(&self, id: MetaId) -> bool {
    self.read_solution(id).is_some()
  }

  /// Ascribed type, position and kind recorded at allocation.
  pub fn info(&self, id: MetaId) -> Option<(&Expr, Span, MetaKind)> {
    self.entries.get(&id).map(|e| (&e.ty, e.span, e.kind))
  }

  /// Every metavariable still waiting for a solution, in allocation order.
  pub fn unsolved(&self) -> Vec<MetaId> {
    let mut ids: Vec<MetaId> = self
      .entries
      .iter()
      .filter(|(_, e)| e.solution.is_none())
      .map(|(id, _)| *id)
      .collect();
    ids.sort();
    ids
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fresh_term(store: &mut MetaStore) -> MetaApp {
    store.fresh(Expr::u(0), Span::default(), MetaKind::Term, vec![])
  }

  #[test]
  fn test_fresh_ids_are_distinct() {
    let mut store = MetaStore::new();
    let a = fresh_term(&mut store);
    let b = fresh_term(&mut store);
    assert_ne!(a.id, b.id);
    assert_eq!(store.len(), 2);
  }

  #[test]
  fn test_solve_once() {
    let mut store = MetaStore::new();
    let m = fresh_term(&mut store);
    assert!(!store.is_solved(m.id));
    store.solve(m.id, Expr::u(1)).unwrap();
    assert_eq!(store.read_solution(m.id), Some(&Expr::u(1)));
  }

  #[test]
  fn test_solve_twice_fails() {
    let mut store = MetaStore::new();
    let m = fresh_term(&mut store);
    store.solve(m.id, Expr::u(1)).unwrap();
    assert_eq!(
      store.solve(m.id, Expr::u(2)),
      Err(MetaError::AlreadySolved(m.id))
    );
    // the first solution stays published
    assert_eq!(store.read_solution(m.id), Some(&Expr::u(1)));
  }

  #[test]
  fn test_solve_unknown_fails() {
    let mut store = MetaStore::new();
    assert_eq!(
      store.solve(MetaId(42), Expr::u(0)),
      Err(MetaError::Unknown(MetaId(42)))
    );
    assert_eq!(store.read_solution(MetaId(42)), None);
  }

  #[test]
  fn test_unsolved_in_allocation_order() {
    let mut store = MetaStore::new();
    let a = fresh_term(&mut store);
    let b = fresh_term(&mut store);
    let c = fresh_term(&mut store);
    store.solve(b.id, Expr::u(0)).unwrap();
    assert_eq!(store.unsolved(), vec![a.id, c.id]);
  }

  #[test]
  fn test_info_records_allocation() {
    let mut store = MetaStore::new();
    let span = Span { line: 4, col: 2 };
    let m = store.fresh(Expr::u(3), span, MetaKind::Type, vec![]);
    let (ty, sp, kind) = store.info(m.id).unwrap();
    assert_eq!(*ty, Expr::u(3));
    assert_eq!(sp, span);
    assert_eq!(kind, MetaKind::Type);
  }
}
