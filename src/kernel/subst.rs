//! De Bruijn index operations: shifting and one-step substitution.
//!
//! Both operations rebuild only the spine of nodes that actually contain an
//! affected variable; every untouched subterm is returned as the same `Arc`.

use super::expr::*;

// ============================================================================
// Variable traversal
// ============================================================================

/// Rebuild `e`, replacing every loose variable `Var(k)` (that is, `k >= depth`
/// at the point of occurrence) by `on_var(k, depth)`.
fn replace_loose(
  e: &Expr,
  depth: usize,
  on_var: &dyn Fn(usize, usize) -> Expr,
) -> Expr {
  let go = |e: &Expr, d: usize| replace_loose(e, d, on_var);
  match e.as_data() {
    ExprData::Var(idx) => {
      if *idx >= depth {
        on_var(*idx, depth)
      } else {
        e.clone()
      }
    },
    ExprData::App(f, a) => {
      let (f2, a2) = (go(f, depth), go(a, depth));
      if unchanged(&[(&f2, f), (&a2, a)]) { e.clone() } else { Expr::app(f2, a2) }
    },
    ExprData::Lam(x, t, b) => {
      let (t2, b2) = (go(t, depth), go(b, depth + 1));
      if unchanged(&[(&t2, t), (&b2, b)]) {
        e.clone()
      } else {
        Expr::lam(x.clone(), t2, b2)
      }
    },
    ExprData::Pi(x, t, b) => {
      let (t2, b2) = (go(t, depth), go(b, depth + 1));
      if unchanged(&[(&t2, t), (&b2, b)]) {
        e.clone()
      } else {
        Expr::pi(x.clone(), t2, b2)
      }
    },
    ExprData::Sigma(x, t, b) => {
      let (t2, b2) = (go(t, depth), go(b, depth + 1));
      if unchanged(&[(&t2, t), (&b2, b)]) {
        e.clone()
      } else {
        Expr::sigma(x.clone(), t2, b2)
      }
    },
    ExprData::Pair(a, b, x, t1, t2) => {
      let (a2, b2) = (go(a, depth), go(b, depth));
      let (s1, s2) = (go(t1, depth), go(t2, depth + 1));
      if unchanged(&[(&a2, a), (&b2, b), (&s1, t1), (&s2, t2)]) {
        e.clone()
      } else {
        Expr::pair(a2, b2, x.clone(), s1, s2)
      }
    },
    ExprData::Proj(i, p) => {
      let p2 = go(p, depth);
      if p2.ptr_eq(p) { e.clone() } else { Expr::proj(*i, p2) }
    },
    ExprData::Eq(sort, l, r, t) => {
      let (l2, r2, t2) = (go(l, depth), go(r, depth), go(t, depth));
      if unchanged(&[(&l2, l), (&r2, r), (&t2, t)]) {
        e.clone()
      } else {
        Expr::eq(*sort, l2, r2, t2)
      }
    },
    ExprData::Refl(sort, w, t) => {
      let (w2, t2) = (go(w, depth), go(t, depth));
      if unchanged(&[(&w2, w), (&t2, t)]) {
        e.clone()
      } else {
        Expr::refl(*sort, w2, t2)
      }
    },
    ExprData::IndEq(ind) => {
      let ty = go(&ind.ty, depth);
      let motive = go(&ind.motive, depth + 3);
      let refl = go(&ind.refl, depth + 1);
      let lhs = go(&ind.lhs, depth);
      let rhs = go(&ind.rhs, depth);
      let proof = go(&ind.proof, depth);
      if unchanged(&[
        (&ty, &ind.ty),
        (&motive, &ind.motive),
        (&refl, &ind.refl),
        (&lhs, &ind.lhs),
        (&rhs, &ind.rhs),
        (&proof, &ind.proof),
      ]) {
        e.clone()
      } else {
        Expr::ind_eq(IndEq {
          sort: ind.sort,
          ty,
          motive_binders: ind.motive_binders.clone(),
          motive,
          refl_binder: ind.refl_binder.clone(),
          refl,
          lhs,
          rhs,
          proof,
        })
      }
    },
    ExprData::Handle(inner, handlers) => {
      let inner2 = go(inner, depth);
      let bodies: Vec<Expr> = handlers
        .iter()
        .map(|h| go(&h.body, depth + h.params.len()))
        .collect();
      let same = inner2.ptr_eq(inner)
        && bodies.iter().zip(handlers).all(|(b, h)| b.ptr_eq(&h.body));
      if same {
        e.clone()
      } else {
        let handlers = handlers
          .iter()
          .zip(bodies)
          .map(|(h, body)| Handler {
            op: h.op.clone(),
            params: h.params.clone(),
            body,
          })
          .collect();
        Expr::handle(inner2, handlers)
      }
    },
    ExprData::Meta(m) => {
      let args: Vec<Expr> = m.args.iter().map(|a| go(a, depth)).collect();
      let ty = go(&m.ty, depth);
      let same = ty.ptr_eq(&m.ty)
        && args.iter().zip(&m.args).all(|(new, old)| new.ptr_eq(old));
      if same {
        e.clone()
      } else {
        let mut m2 = m.with_args(args);
        m2.ty = ty;
        Expr::meta(m2)
      }
    },
    ExprData::U(..) | ExprData::Const(..) | ExprData::Base(..) => e.clone(),
  }
}

// ============================================================================
// Shift and instantiate
// ============================================================================

/// Shift every free variable of `e` up by `amount`, as needed when `e` is
/// moved under `amount` additional binders.
pub fn shift(e: &Expr, amount: usize) -> Expr {
  shift_from(e, 0, amount)
}

/// Shift variables with index `>= cutoff` up by `amount`.
pub fn shift_from(e: &Expr, cutoff: usize, amount: usize) -> Expr {
  if amount == 0 {
    return e.clone();
  }
  replace_loose(e, cutoff, &|idx, _| Expr::var(idx + amount))
}

/// One-step beta substitution: `body[0 := arg]`.
///
/// `body` lives under one binder more than `arg`. Index 0 is replaced by
/// `arg` (shifted under whatever binders it is pushed beneath) and every other
/// free variable moves down by one.
pub fn inst(body: &Expr, arg: &Expr) -> Expr {
  replace_loose(body, 0, &|idx, depth| {
    if idx == depth {
      shift(arg, depth)
    } else {
      Expr::var(idx - 1)
    }
  })
}

// ============================================================================
// Spines
// ============================================================================

/// Decompose `f a1 a2 ... an` into `(f, [a1, a2, ..., an])`.
pub fn unfold_apps(e: &Expr) -> (Expr, Vec<Expr>) {
  let mut args = Vec::new();
  let mut cursor = e.clone();
  while let ExprData::App(f, a) = cursor.as_data() {
    args.push(a.clone());
    let next = f.clone();
    cursor = next;
  }
  args.reverse();
  (cursor, args)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn x() -> Name {
    Name::new("x")
  }

  fn c(s: &str) -> Expr {
    Expr::cnst(Name::new(s))
  }

  #[test]
  fn test_inst_bvar() {
    let arg = c("a");
    assert_eq!(inst(&Expr::var(0), &arg), arg);
  }

  #[test]
  fn test_inst_lowers_other_free_variables() {
    assert_eq!(inst(&Expr::var(3), &c("a")), Expr::var(2));
  }

  #[test]
  fn test_inst_nested() {
    // fun (x : Type0) => #1  with #0 := Var(5)
    // becomes fun (x : Type0) => Var(6), the argument shifted under x
    let body = Expr::lam(x(), Expr::u(0), Expr::var(1));
    let result = inst(&body, &Expr::var(5));
    assert_eq!(result, Expr::lam(x(), Expr::u(0), Expr::var(6)));
  }

  #[test]
  fn test_inst_under_ind_eq_motive() {
    // The motive sits under three binders, so #3 there is the substituted one.
    let ind = IndEq {
      sort: EqSort::Propositional,
      ty: Expr::var(0),
      motive_binders: [x(), Name::new("y"), Name::new("p")],
      motive: Expr::var(3),
      refl_binder: Name::new("z"),
      refl: Expr::var(1),
      lhs: Expr::var(0),
      rhs: Expr::var(0),
      proof: Expr::var(1),
    };
    let result = inst(&Expr::ind_eq(ind), &c("a"));
    match result.as_data() {
      ExprData::IndEq(ind) => {
        assert_eq!(ind.ty, c("a"));
        assert_eq!(ind.motive, c("a"));
        assert_eq!(ind.refl, c("a"));
        assert_eq!(ind.lhs, c("a"));
        assert_eq!(ind.proof, Expr::var(0));
      },
      _ => panic!("Expected ind_eq"),
    }
  }

  #[test]
  fn test_shift_skips_bound_variables() {
    let e = Expr::lam(x(), Expr::var(0), Expr::app(Expr::var(0), Expr::var(1)));
    let shifted = shift(&e, 2);
    let expected =
      Expr::lam(x(), Expr::var(2), Expr::app(Expr::var(0), Expr::var(3)));
    assert_eq!(shifted, expected);
  }

  #[test]
  fn test_shift_handler_body_by_its_params() {
    let h = Handler {
      op: Name::new("get"),
      params: vec![Name::new("k"), Name::new("v")],
      body: Expr::app(Expr::var(1), Expr::var(2)),
    };
    let e = Expr::handle(Expr::var(0), vec![h]);
    match shift(&e, 1).as_data() {
      ExprData::Handle(inner, hs) => {
        assert_eq!(*inner, Expr::var(1));
        assert_eq!(hs[0].body, Expr::app(Expr::var(1), Expr::var(3)));
      },
      _ => panic!("Expected handle"),
    }
  }

  #[test]
  fn test_shift_closed_term_is_shared() {
    let e = Expr::lam(x(), Expr::u(0), Expr::var(0));
    assert!(shift(&e, 4).ptr_eq(&e));
    let arg = c("a");
    assert!(inst(&e, &arg).ptr_eq(&e));
  }

  #[test]
  fn test_unfold_apps() {
    let f = c("f");
    let e = Expr::app(Expr::app(f.clone(), c("a")), c("b"));
    let (head, args) = unfold_apps(&e);
    assert_eq!(head, f);
    assert_eq!(args, vec![c("a"), c("b")]);
  }
}
