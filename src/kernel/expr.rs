//! Terms of the core calculus.
//!
//! Terms use de Bruijn indices and share their subterms through `Arc`, so
//! cloning an `Expr` is a reference-count bump and a node rebuilt after
//! normalizing its children can reuse every child that did not change.

use std::fmt;
use std::sync::Arc;

use super::meta::MetaId;
use super::subst::unfold_apps;

// ============================================================================
// Name
// ============================================================================

/// A binder or constant name. Names never take part in reduction.
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct Name(pub Arc<str>);

impl Name {
  pub fn new(s: &str) -> Self {
    Name(Arc::from(s))
  }
}

impl fmt::Display for Name {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ============================================================================
// Equality sorts, handlers and metavariable records
// ============================================================================

/// Distinguishes the two equality types of the calculus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EqSort {
  /// Reflected equality. Its eliminator computes without looking at the proof.
  Judgmental,
  /// Identity type. Its eliminator computes only on a reflexivity proof.
  Propositional,
}

/// One clause of an effect handler: `op params... => body`.
///
/// `body` lives under `params.len()` binders, the last parameter being
/// de Bruijn index 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Handler {
  pub op: Name,
  pub params: Vec<Name>,
  pub body: Expr,
}

/// Source position attached to a metavariable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
  pub line: u32,
  pub col: u32,
}

/// What a metavariable stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
  /// A term hole.
  Term,
  /// A type hole.
  Type,
}

/// A metavariable applied to a spine of arguments.
///
/// The solution itself lives in the [`MetaStore`](super::meta::MetaStore);
/// the record only names the metavariable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetaApp {
  pub id: MetaId,
  pub args: Vec<Expr>,
  pub ty: Expr,
  pub span: Span,
  pub kind: MetaKind,
}

impl MetaApp {
  /// The same metavariable applied to a different spine.
  pub fn with_args(&self, args: Vec<Expr>) -> Self {
    MetaApp {
      id: self.id,
      args,
      ty: self.ty.clone(),
      span: self.span,
      kind: self.kind,
    }
  }
}

/// The equality eliminator
/// `ind_eq(t, [x y p. motive], [z. refl], lhs, rhs, proof)`.
///
/// `motive` lives under the three binders `x : t`, `y : t` and
/// `p : x = y`; `refl` lives under the single binder `z : t`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndEq {
  pub sort: EqSort,
  pub ty: Expr,
  pub motive_binders: [Name; 3],
  pub motive: Expr,
  pub refl_binder: Name,
  pub refl: Expr,
  pub lhs: Expr,
  pub rhs: Expr,
  pub proof: Expr,
}

// ============================================================================
// Expr
// ============================================================================

/// A shared term node.
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct Expr(pub Arc<ExprData>);

#[derive(Debug, PartialEq, Eq, Hash)]
pub enum ExprData {
  /// Variable, as a de Bruijn index into the context.
  Var(usize),
  /// Application.
  App(Expr, Expr),
  /// Abstraction: binder, domain, body.
  Lam(Name, Expr, Expr),
  /// Dependent function type: binder, domain, codomain.
  Pi(Name, Expr, Expr),
  /// Dependent pair: first, second, and the components of its Σ-type
  /// (binder, first type, second type under the binder).
  Pair(Expr, Expr, Name, Expr, Expr),
  /// Dependent pair type: binder, first type, second type.
  Sigma(Name, Expr, Expr),
  /// Projection; only 1 and 2 are meaningful.
  Proj(usize, Expr),
  /// Equality type: sort, lhs, rhs, type.
  Eq(EqSort, Expr, Expr, Expr),
  /// Reflexivity: sort, witness, type.
  Refl(EqSort, Expr, Expr),
  /// Equality eliminator.
  IndEq(IndEq),
  /// A term under a list of effect handlers.
  Handle(Expr, Vec<Handler>),
  /// Metavariable application.
  Meta(MetaApp),
  /// Universe.
  U(u64),
  /// Primitive constant.
  Const(Name),
  /// Base type.
  Base(Name),
}

impl Expr {
  pub fn as_data(&self) -> &ExprData {
    &self.0
  }

  /// Pointer identity. Used to detect that a traversal left a node alone.
  pub fn ptr_eq(&self, other: &Expr) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }

  pub fn var(idx: usize) -> Self {
    Expr(Arc::new(ExprData::Var(idx)))
  }
  pub fn app(f: Expr, a: Expr) -> Self {
    Expr(Arc::new(ExprData::App(f, a)))
  }
  pub fn lam(x: Name, ty: Expr, body: Expr) -> Self {
    Expr(Arc::new(ExprData::Lam(x, ty, body)))
  }
  pub fn pi(x: Name, dom: Expr, cod: Expr) -> Self {
    Expr(Arc::new(ExprData::Pi(x, dom, cod)))
  }
  pub fn pair(fst: Expr, snd: Expr, x: Name, ty1: Expr, ty2: Expr) -> Self {
    Expr(Arc::new(ExprData::Pair(fst, snd, x, ty1, ty2)))
  }
  pub fn sigma(x: Name, ty1: Expr, ty2: Expr) -> Self {
    Expr(Arc::new(ExprData::Sigma(x, ty1, ty2)))
  }
  pub fn proj(idx: usize, e: Expr) -> Self {
    Expr(Arc::new(ExprData::Proj(idx, e)))
  }
  pub fn eq(sort: EqSort, lhs: Expr, rhs: Expr, ty: Expr) -> Self {
    Expr(Arc::new(ExprData::Eq(sort, lhs, rhs, ty)))
  }
  pub fn refl(sort: EqSort, witness: Expr, ty: Expr) -> Self {
    Expr(Arc::new(ExprData::Refl(sort, witness, ty)))
  }
  pub fn ind_eq(ind: IndEq) -> Self {
    Expr(Arc::new(ExprData::IndEq(ind)))
  }
  pub fn handle(e: Expr, handlers: Vec<Handler>) -> Self {
    Expr(Arc::new(ExprData::Handle(e, handlers)))
  }
  pub fn meta(m: MetaApp) -> Self {
    Expr(Arc::new(ExprData::Meta(m)))
  }
  pub fn u(level: u64) -> Self {
    Expr(Arc::new(ExprData::U(level)))
  }
  pub fn cnst(name: Name) -> Self {
    Expr(Arc::new(ExprData::Const(name)))
  }
  pub fn base(name: Name) -> Self {
    Expr(Arc::new(ExprData::Base(name)))
  }

  /// Short name of the head constructor, for logs.
  pub fn tag(&self) -> &'static str {
    match self.as_data() {
      ExprData::Var(..) => "Var",
      ExprData::App(..) => "App",
      ExprData::Lam(..) => "Lam",
      ExprData::Pi(..) => "Pi",
      ExprData::Pair(..) => "Pair",
      ExprData::Sigma(..) => "Sigma",
      ExprData::Proj(..) => "Proj",
      ExprData::Eq(..) => "Eq",
      ExprData::Refl(..) => "Refl",
      ExprData::IndEq(..) => "IndEq",
      ExprData::Handle(..) => "Handle",
      ExprData::Meta(..) => "Meta",
      ExprData::U(..) => "U",
      ExprData::Const(..) => "Const",
      ExprData::Base(..) => "Base",
    }
  }
}

/// True when every rebuilt child is the very node it replaces.
pub(crate) fn unchanged(children: &[(&Expr, &Expr)]) -> bool {
  children.iter().all(|(new, old)| new.ptr_eq(old))
}

// ============================================================================
// Printing
// ============================================================================

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write_expr(f, self, &mut Vec::new())
  }
}

fn write_binder(
  f: &mut fmt::Formatter<'_>,
  x: &Name,
  ty: &Expr,
  names: &mut Vec<Name>,
) -> fmt::Result {
  write!(f, "({x} : ")?;
  write_expr(f, ty, names)?;
  f.write_str(")")
}

fn write_under(
  f: &mut fmt::Formatter<'_>,
  binders: &[Name],
  body: &Expr,
  names: &mut Vec<Name>,
) -> fmt::Result {
  names.extend(binders.iter().cloned());
  let r = write_expr(f, body, names);
  names.truncate(names.len() - binders.len());
  r
}

fn write_expr(
  f: &mut fmt::Formatter<'_>,
  e: &Expr,
  names: &mut Vec<Name>,
) -> fmt::Result {
  match e.as_data() {
    ExprData::Var(idx) => match names.len().checked_sub(idx + 1) {
      Some(pos) => write!(f, "{}", names[pos]),
      None => write!(f, "#{idx}"),
    },
    ExprData::App(..) => {
      let (head, args) = unfold_apps(e);
      f.write_str("(")?;
      write_expr(f, &head, names)?;
      for arg in &args {
        f.write_str(" ")?;
        write_expr(f, arg, names)?;
      }
      f.write_str(")")
    },
    ExprData::Lam(x, ty, body) => {
      f.write_str("fun ")?;
      write_binder(f, x, ty, names)?;
      f.write_str(" => ")?;
      write_under(f, std::slice::from_ref(x), body, names)
    },
    ExprData::Pi(x, dom, cod) => {
      write_binder(f, x, dom, names)?;
      f.write_str(" -> ")?;
      write_under(f, std::slice::from_ref(x), cod, names)
    },
    ExprData::Pair(fst, snd, ..) => {
      f.write_str("(")?;
      write_expr(f, fst, names)?;
      f.write_str(", ")?;
      write_expr(f, snd, names)?;
      f.write_str(")")
    },
    ExprData::Sigma(x, ty1, ty2) => {
      write_binder(f, x, ty1, names)?;
      f.write_str(" * ")?;
      write_under(f, std::slice::from_ref(x), ty2, names)
    },
    ExprData::Proj(idx, e) => {
      write_expr(f, e, names)?;
      write!(f, ".{idx}")
    },
    ExprData::Eq(sort, lhs, rhs, _) => {
      f.write_str("(")?;
      write_expr(f, lhs, names)?;
      f.write_str(match sort {
        EqSort::Judgmental => " == ",
        EqSort::Propositional => " = ",
      })?;
      write_expr(f, rhs, names)?;
      f.write_str(")")
    },
    ExprData::Refl(sort, witness, _) => {
      f.write_str(match sort {
        EqSort::Judgmental => "(refl! ",
        EqSort::Propositional => "(refl ",
      })?;
      write_expr(f, witness, names)?;
      f.write_str(")")
    },
    ExprData::IndEq(ind) => {
      f.write_str("(ind_eq ")?;
      write_under(f, &ind.motive_binders, &ind.motive, names)?;
      f.write_str(" ")?;
      write_under(f, std::slice::from_ref(&ind.refl_binder), &ind.refl, names)?;
      for e in [&ind.lhs, &ind.rhs, &ind.proof] {
        f.write_str(" ")?;
        write_expr(f, e, names)?;
      }
      f.write_str(")")
    },
    ExprData::Handle(e, handlers) => {
      f.write_str("handle ")?;
      write_expr(f, e, names)?;
      f.write_str(" with")?;
      for h in handlers {
        write!(f, " | {}", h.op)?;
        for p in &h.params {
          write!(f, " {p}")?;
        }
        f.write_str(" => ")?;
        write_under(f, &h.params, &h.body, names)?;
      }
      Ok(())
    },
    ExprData::Meta(m) => {
      write!(f, "?{}", m.id)?;
      if !m.args.is_empty() {
        f.write_str("[")?;
        for (i, arg) in m.args.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          write_expr(f, arg, names)?;
        }
        f.write_str("]")?;
      }
      Ok(())
    },
    ExprData::U(level) => write!(f, "Type{level}"),
    ExprData::Const(name) | ExprData::Base(name) => write!(f, "{name}"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display_names_bound_variables() {
    let id = Expr::lam(Name::new("x"), Expr::u(0), Expr::var(0));
    assert_eq!(id.to_string(), "fun (x : Type0) => x");
  }

  #[test]
  fn test_display_free_variable_uses_index() {
    let e = Expr::app(Expr::var(2), Expr::cnst(Name::new("c")));
    assert_eq!(e.to_string(), "(#2 c)");
  }

  #[test]
  fn test_display_flattens_application_spine() {
    let f = Expr::cnst(Name::new("f"));
    let e = Expr::app(Expr::app(f, Expr::u(0)), Expr::u(1));
    assert_eq!(e.to_string(), "(f Type0 Type1)");
  }

  #[test]
  fn test_with_args_keeps_identity() {
    let m = MetaApp {
      id: MetaId(7),
      args: vec![Expr::var(0)],
      ty: Expr::u(0),
      span: Span { line: 3, col: 9 },
      kind: MetaKind::Term,
    };
    let m2 = m.with_args(vec![Expr::u(1), Expr::u(2)]);
    assert_eq!(m2.id, m.id);
    assert_eq!(m2.span, m.span);
    assert_eq!(m2.kind, m.kind);
    assert_eq!(m2.ty, m.ty);
    assert_eq!(m2.args.len(), 2);
  }

  #[test]
  fn test_structural_equality_through_sharing() {
    let a = Expr::app(Expr::var(0), Expr::u(0));
    let b = Expr::app(Expr::var(0), Expr::u(0));
    assert_eq!(a, b);
    assert!(!a.ptr_eq(&b));
    assert!(a.ptr_eq(&a.clone()));
  }
}
