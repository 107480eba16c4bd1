//! The binder context.
//!
//! A context is an immutable linked list where de Bruijn index `i` refers to
//! the `i`-th entry from the head. Pushing shares the tail, so a caller's
//! context is never affected by the entries a recursive call adds.

use std::rc::Rc;

use super::expr::{Expr, Name};

/// A context entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
  /// A transparent binding; weak head normalization unfolds through it.
  Definition { name: Name, ty: Expr, body: Expr },
  /// An opaque assumption; a variable resolving here is stuck.
  Parameter { name: Name, ty: Expr },
}

impl Entry {
  pub fn name(&self) -> &Name {
    match self {
      Entry::Definition { name, .. } | Entry::Parameter { name, .. } => name,
    }
  }
}

#[derive(Debug)]
enum ContextNode {
  Empty,
  Cons(Entry, Context),
}

/// A de Bruijn context. Cloning is a reference-count bump.
#[derive(Debug, Clone)]
pub struct Context {
  node: Rc<ContextNode>,
  len: usize,
}

impl Context {
  pub fn new() -> Self {
    Context { node: Rc::new(ContextNode::Empty), len: 0 }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  fn push(&self, entry: Entry) -> Self {
    Context {
      node: Rc::new(ContextNode::Cons(entry, self.clone())),
      len: self.len + 1,
    }
  }

  /// Extend with an opaque parameter. `ty` is scoped in `self`.
  pub fn push_parameter(&self, name: Name, ty: Expr) -> Self {
    self.push(Entry::Parameter { name, ty })
  }

  /// Extend with a transparent definition. `ty` and `body` are scoped in
  /// `self`.
  pub fn push_definition(&self, name: Name, ty: Expr, body: Expr) -> Self {
    self.push(Entry::Definition { name, ty, body })
  }

  /// The entry at `idx` exactly as it was pushed, scoped in the context it
  /// was pushed onto. Its type and body need a shift by `idx + 1` to be
  /// read in `self`.
  pub fn get(&self, idx: usize) -> Option<&Entry> {
    let mut current = &*self.node;
    let mut i = idx;
    loop {
      match current {
        ContextNode::Empty => return None,
        ContextNode::Cons(entry, rest) => {
          if i == 0 {
            return Some(entry);
          }
          i -= 1;
          current = &*rest.node;
        },
      }
    }
  }
}

impl Default for Context {
  fn default() -> Self {
    Self::new()
  }
}
