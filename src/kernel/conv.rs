//! Conversion by normalization: two terms are convertible when their normal
//! forms agree up to binder names.

use super::context::Context;
use super::error::NormResult;
use super::expr::*;
use super::reduce::Reducer;

/// Structural equality ignoring binder names and metavariable positions.
///
/// Uses a conjunction work stack: every pushed pair must be equal.
pub fn alpha_eq(x: &Expr, y: &Expr) -> bool {
  let mut work: Vec<(&Expr, &Expr)> = vec![(x, y)];
  while let Some((x, y)) = work.pop() {
    if x.ptr_eq(y) {
      continue;
    }
    let same_head = match (x.as_data(), y.as_data()) {
      (ExprData::Var(i), ExprData::Var(j)) => i == j,
      (ExprData::U(i), ExprData::U(j)) => i == j,
      (ExprData::Const(a), ExprData::Const(b))
      | (ExprData::Base(a), ExprData::Base(b)) => a == b,
      (ExprData::App(f1, a1), ExprData::App(f2, a2)) => {
        work.push((f1, f2));
        work.push((a1, a2));
        true
      },
      (ExprData::Lam(_, t1, b1), ExprData::Lam(_, t2, b2))
      | (ExprData::Pi(_, t1, b1), ExprData::Pi(_, t2, b2))
      | (ExprData::Sigma(_, t1, b1), ExprData::Sigma(_, t2, b2)) => {
        work.push((t1, t2));
        work.push((b1, b2));
        true
      },
      (
        ExprData::Pair(a1, b1, _, s1, t1),
        ExprData::Pair(a2, b2, _, s2, t2),
      ) => {
        work.extend([(a1, a2), (b1, b2), (s1, s2), (t1, t2)]);
        true
      },
      (ExprData::Proj(i, p1), ExprData::Proj(j, p2)) => {
        work.push((p1, p2));
        i == j
      },
      (ExprData::Eq(s1, l1, r1, t1), ExprData::Eq(s2, l2, r2, t2)) => {
        work.extend([(l1, l2), (r1, r2), (t1, t2)]);
        s1 == s2
      },
      (ExprData::Refl(s1, w1, t1), ExprData::Refl(s2, w2, t2)) => {
        work.extend([(w1, w2), (t1, t2)]);
        s1 == s2
      },
      (ExprData::IndEq(i1), ExprData::IndEq(i2)) => {
        work.extend([
          (&i1.ty, &i2.ty),
          (&i1.motive, &i2.motive),
          (&i1.refl, &i2.refl),
          (&i1.lhs, &i2.lhs),
          (&i1.rhs, &i2.rhs),
          (&i1.proof, &i2.proof),
        ]);
        i1.sort == i2.sort
      },
      (ExprData::Handle(e1, hs1), ExprData::Handle(e2, hs2)) => {
        work.push((e1, e2));
        let heads_match = hs1.len() == hs2.len()
          && hs1.iter().zip(hs2).all(|(h1, h2)| {
            h1.op == h2.op && h1.params.len() == h2.params.len()
          });
        work.extend(hs1.iter().zip(hs2).map(|(h1, h2)| (&h1.body, &h2.body)));
        heads_match
      },
      (ExprData::Meta(m1), ExprData::Meta(m2)) => {
        work.extend(m1.args.iter().zip(&m2.args));
        m1.id == m2.id && m1.args.len() == m2.args.len()
      },
      _ => false,
    };
    if !same_head {
      return false;
    }
  }
  true
}

impl Reducer<'_> {
  /// Normalize both sides under `ctx` and compare up to binder names.
  pub fn conv(&mut self, ctx: &Context, x: &Expr, y: &Expr) -> NormResult<bool> {
    if alpha_eq(x, y) {
      return Ok(true);
    }
    let x_n = self.nf(ctx, x)?;
    let y_n = self.nf(ctx, y)?;
    Ok(alpha_eq(&x_n, &y_n))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::kernel::meta::MetaStore;

  fn n(s: &str) -> Name {
    Name::new(s)
  }

  fn base(s: &str) -> Expr {
    Expr::base(n(s))
  }

  #[test]
  fn test_alpha_eq_ignores_binder_names() {
    let a = Expr::lam(n("x"), base("A"), Expr::var(0));
    let b = Expr::lam(n("y"), base("A"), Expr::var(0));
    assert_ne!(a, b);
    assert!(alpha_eq(&a, &b));
  }

  #[test]
  fn test_alpha_eq_distinguishes_indices() {
    let a = Expr::lam(n("x"), base("A"), Expr::var(0));
    let b = Expr::lam(n("x"), base("A"), Expr::var(1));
    assert!(!alpha_eq(&a, &b));
  }

  #[test]
  fn test_alpha_eq_distinguishes_eq_sorts() {
    let a = Expr::eq(EqSort::Judgmental, base("a"), base("a"), base("A"));
    let b = Expr::eq(EqSort::Propositional, base("a"), base("a"), base("A"));
    assert!(!alpha_eq(&a, &b));
  }

  #[test]
  fn test_conv_by_beta() {
    let metas = MetaStore::new();
    let mut r = Reducer::new(&metas);
    let id = Expr::lam(n("x"), Expr::u(0), Expr::var(0));
    let e = Expr::app(id, base("A"));
    assert!(r.conv(&Context::new(), &e, &base("A")).unwrap());
    assert!(!r.conv(&Context::new(), &e, &base("B")).unwrap());
  }

  #[test]
  fn test_conv_by_delta() {
    let metas = MetaStore::new();
    let mut r = Reducer::new(&metas);
    let ctx = Context::new().push_definition(n("a"), Expr::u(0), base("A"));
    assert!(r.conv(&ctx, &Expr::var(0), &base("A")).unwrap());
  }
}
