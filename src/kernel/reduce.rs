//! Weak head and full normalization.
//!
//! `whnf` reduces only the outermost redex until the head constructor is
//! visible or stuck. `nf` runs `whnf` and then normalizes every subterm,
//! extending the context with a parameter at each binder it crosses.

use tracing::{debug, trace};

use super::config::ReduceConfig;
use super::context::{Context, Entry};
use super::error::{NormResult, TypingViolation};
use super::expr::*;
use super::meta::MetaStore;
use super::subst::{inst, shift};

/// A term that is stuck but well formed when it heads an application.
fn is_neutral(head: &Expr) -> bool {
  match head.as_data() {
    ExprData::Var(..)
    | ExprData::App(..)
    | ExprData::Proj(..)
    | ExprData::IndEq(..)
    | ExprData::Meta(..) => true,
    _ => false,
  }
}

/// The reducer. Borrows the metavariable store read-only for its lifetime.
pub struct Reducer<'m> {
  metas: &'m MetaStore,
  config: ReduceConfig,
  pub whnf_steps: u64,
}

impl<'m> Reducer<'m> {
  pub fn new(metas: &'m MetaStore) -> Self {
    Self::with_config(metas, ReduceConfig::default())
  }

  pub fn with_config(metas: &'m MetaStore, config: ReduceConfig) -> Self {
    Reducer { metas, config, whnf_steps: 0 }
  }

  // ==========================================================================
  // Entry points
  // ==========================================================================

  /// Reduce `e` to weak head normal form under `ctx`.
  pub fn whnf(&mut self, ctx: &Context, e: &Expr) -> NormResult<Expr> {
    let result = self.whnf_core(ctx, e);
    if let Err(err) = &result {
      debug!(%err, "whnf aborted");
    }
    result
  }

  /// Reduce `e` to full normal form under `ctx`.
  pub fn nf(&mut self, ctx: &Context, e: &Expr) -> NormResult<Expr> {
    debug!(depth = ctx.len(), head = e.tag(), "nf");
    let start = self.whnf_steps;
    let result = self.nf_core(ctx, e);
    match &result {
      Ok(_) => debug!(steps = self.whnf_steps - start, "nf done"),
      Err(err) => debug!(%err, "nf aborted"),
    }
    result
  }

  // ==========================================================================
  // WHNF
  // ==========================================================================

  /// Head reduction loop. Tail positions (delta, beta, projection of a pair,
  /// the equality computation rules, handler and metavariable unwrapping)
  /// continue the loop; subterms that must be inspected recurse.
  pub(crate) fn whnf_core(&mut self, ctx: &Context, e: &Expr) -> NormResult<Expr> {
    let mut cur = e.clone();
    loop {
      self.whnf_steps += 1;
      trace!(
        step = self.whnf_steps,
        depth = ctx.len(),
        head = cur.tag(),
        "whnf"
      );
      let next = match cur.as_data() {
        ExprData::Var(idx) => match ctx.get(*idx) {
          Some(Entry::Definition { body, .. }) if self.config.delta => {
            shift(body, idx + 1)
          },
          Some(_) => return Ok(cur.clone()),
          None => {
            return Err(TypingViolation::UnboundVariable {
              index: *idx,
              depth: ctx.len(),
            });
          },
        },

        ExprData::App(fun, arg) => {
          let head = self.whnf_core(ctx, fun)?;
          match head.as_data() {
            ExprData::Lam(_, _, body) => inst(body, arg),
            _ if is_neutral(&head) => {
              if head.ptr_eq(fun) {
                return Ok(cur.clone());
              }
              return Ok(Expr::app(head.clone(), arg.clone()));
            },
            _ => {
              return Err(TypingViolation::NotAFunction { head: head.clone() });
            },
          }
        },

        ExprData::Proj(idx, pair) => {
          let target = self.whnf_core(ctx, pair)?;
          match (*idx, target.as_data()) {
            (1, ExprData::Pair(fst, ..)) => fst.clone(),
            (2, ExprData::Pair(_, snd, ..)) => snd.clone(),
            (1 | 2, _) => {
              if target.ptr_eq(pair) {
                return Ok(cur.clone());
              }
              return Ok(Expr::proj(*idx, target.clone()));
            },
            (index, _) => {
              return Err(TypingViolation::BadProjection {
                index,
                term: cur.clone(),
              });
            },
          }
        },

        ExprData::IndEq(ind) => match ind.sort {
          // proof irrelevant: compute without looking at the proof
          EqSort::Judgmental => inst(&ind.refl, &ind.lhs),
          EqSort::Propositional => {
            let proof = self.whnf_core(ctx, &ind.proof)?;
            match proof.as_data() {
              ExprData::Refl(_, witness, _) => inst(&ind.refl, witness),
              _ => {
                if proof.ptr_eq(&ind.proof) {
                  return Ok(cur.clone());
                }
                let proof = proof.clone();
                return Ok(Expr::ind_eq(IndEq { proof, ..ind.clone() }));
              },
            }
          },
        },

        ExprData::Handle(inner, _) => inner.clone(),

        ExprData::Meta(m) => match self.metas.read_solution(m.id) {
          Some(solution) => solution.clone(),
          None => return Ok(cur.clone()),
        },

        ExprData::Lam(..)
        | ExprData::Pair(..)
        | ExprData::Refl(..)
        | ExprData::Pi(..)
        | ExprData::Sigma(..)
        | ExprData::Eq(..)
        | ExprData::U(..)
        | ExprData::Const(..)
        | ExprData::Base(..) => return Ok(cur.clone()),
      };
      cur = next;
    }
  }

  // ==========================================================================
  // NF
  // ==========================================================================

  /// Normalize a binder body: `body` under `ctx` extended by `x : ty`.
  fn nf_under(
    &mut self,
    ctx: &Context,
    x: &Name,
    ty: &Expr,
    body: &Expr,
  ) -> NormResult<Expr> {
    self.nf_core(&ctx.push_parameter(x.clone(), ty.clone()), body)
  }

  pub(crate) fn nf_core(&mut self, ctx: &Context, e: &Expr) -> NormResult<Expr> {
    let w = self.whnf_core(ctx, e)?;
    match w.as_data() {
      ExprData::Var(..)
      | ExprData::U(..)
      | ExprData::Const(..)
      | ExprData::Base(..) => Ok(w.clone()),

      ExprData::Lam(x, t, b) => {
        let t2 = self.nf_core(ctx, t)?;
        let b2 = self.nf_under(ctx, x, &t2, b)?;
        if unchanged(&[(&t2, t), (&b2, b)]) {
          return Ok(w.clone());
        }
        Ok(Expr::lam(x.clone(), t2, b2))
      },

      ExprData::Pi(x, t, b) => {
        let t2 = self.nf_core(ctx, t)?;
        let b2 = self.nf_under(ctx, x, &t2, b)?;
        if unchanged(&[(&t2, t), (&b2, b)]) {
          return Ok(w.clone());
        }
        Ok(Expr::pi(x.clone(), t2, b2))
      },

      ExprData::Sigma(x, t, b) => {
        let t2 = self.nf_core(ctx, t)?;
        let b2 = self.nf_under(ctx, x, &t2, b)?;
        if unchanged(&[(&t2, t), (&b2, b)]) {
          return Ok(w.clone());
        }
        Ok(Expr::sigma(x.clone(), t2, b2))
      },

      ExprData::App(f, a) => {
        let redex = matches!(f.as_data(), ExprData::Lam(..));
        if self.config.check_invariants && redex {
          return Err(TypingViolation::EscapedWhnf {
            what: "beta redex",
            term: w.clone(),
          });
        }
        let f2 = self.nf_core(ctx, f)?;
        let a2 = self.nf_core(ctx, a)?;
        if unchanged(&[(&f2, f), (&a2, a)]) {
          return Ok(w.clone());
        }
        Ok(Expr::app(f2, a2))
      },

      ExprData::Proj(idx, p) => {
        let p2 = self.nf_core(ctx, p)?;
        if p2.ptr_eq(p) {
          return Ok(w.clone());
        }
        Ok(Expr::proj(*idx, p2))
      },

      ExprData::Pair(a, b, x, t1, t2) => {
        let a2 = self.nf_core(ctx, a)?;
        let b2 = self.nf_core(ctx, b)?;
        let s1 = self.nf_core(ctx, t1)?;
        // only scoping matters for the binder, the unnormalized type will do
        let s2 = self.nf_under(ctx, x, t1, t2)?;
        if unchanged(&[(&a2, a), (&b2, b), (&s1, t1), (&s2, t2)]) {
          return Ok(w.clone());
        }
        Ok(Expr::pair(a2, b2, x.clone(), s1, s2))
      },

      ExprData::Refl(sort, witness, t) => {
        let w2 = self.nf_core(ctx, witness)?;
        let t2 = self.nf_core(ctx, t)?;
        if unchanged(&[(&w2, witness), (&t2, t)]) {
          return Ok(w.clone());
        }
        Ok(Expr::refl(*sort, w2, t2))
      },

      ExprData::Eq(sort, l, r, t) => {
        let l2 = self.nf_core(ctx, l)?;
        let r2 = self.nf_core(ctx, r)?;
        let t2 = self.nf_core(ctx, t)?;
        if unchanged(&[(&l2, l), (&r2, r), (&t2, t)]) {
          return Ok(w.clone());
        }
        Ok(Expr::eq(*sort, l2, r2, t2))
      },

      ExprData::IndEq(ind) => match ind.sort {
        EqSort::Judgmental => Err(TypingViolation::EscapedWhnf {
          what: "judgmental equality eliminator",
          term: w.clone(),
        }),
        EqSort::Propositional => self.nf_ind_eq(ctx, &w, ind),
      },

      ExprData::Handle(..) => Err(TypingViolation::EscapedWhnf {
        what: "effect handler",
        term: w.clone(),
      }),

      ExprData::Meta(m) => {
        let args = m
          .args
          .iter()
          .map(|a| self.nf_core(ctx, a))
          .collect::<NormResult<Vec<_>>>()?;
        if args.iter().zip(&m.args).all(|(new, old)| new.ptr_eq(old)) {
          return Ok(w.clone());
        }
        Ok(Expr::meta(m.with_args(args)))
      },
    }
  }

  /// Normal form of a stuck propositional eliminator.
  ///
  /// The motive is normalized under `x : t`, `y : t` and `p : x = y`, the
  /// reflexivity case under `z : t`. Each binder type is shifted by the
  /// number of binders introduced since `t` was captured.
  fn nf_ind_eq(
    &mut self,
    ctx: &Context,
    whole: &Expr,
    ind: &IndEq,
  ) -> NormResult<Expr> {
    let ty = self.nf_core(ctx, &ind.ty)?;

    let [x, y, p] = &ind.motive_binders;
    let motive_ctx = ctx
      .push_parameter(x.clone(), ty.clone())
      .push_parameter(y.clone(), shift(&ty, 1))
      .push_parameter(
        p.clone(),
        Expr::eq(ind.sort, Expr::var(1), Expr::var(0), shift(&ty, 2)),
      );
    let motive = self.nf_core(&motive_ctx, &ind.motive)?;

    let refl = self.nf_under(ctx, &ind.refl_binder, &ty, &ind.refl)?;
    let lhs = self.nf_core(ctx, &ind.lhs)?;
    let rhs = self.nf_core(ctx, &ind.rhs)?;
    let proof = self.nf_core(ctx, &ind.proof)?;

    if unchanged(&[
      (&ty, &ind.ty),
      (&motive, &ind.motive),
      (&refl, &ind.refl),
      (&lhs, &ind.lhs),
      (&rhs, &ind.rhs),
      (&proof, &ind.proof),
    ]) {
      return Ok(whole.clone());
    }
    Ok(Expr::ind_eq(IndEq {
      sort: ind.sort,
      ty,
      motive_binders: ind.motive_binders.clone(),
      motive,
      refl_binder: ind.refl_binder.clone(),
      refl,
      lhs,
      rhs,
      proof,
    }))
  }
}

/// Weak head normal form of `e` under `ctx` with the default configuration.
pub fn whnf(ctx: &Context, metas: &MetaStore, e: &Expr) -> NormResult<Expr> {
  Reducer::new(metas).whnf(ctx, e)
}

/// Full normal form of `e` under `ctx` with the default configuration.
pub fn nf(ctx: &Context, metas: &MetaStore, e: &Expr) -> NormResult<Expr> {
  Reducer::new(metas).nf(ctx, e)
}
