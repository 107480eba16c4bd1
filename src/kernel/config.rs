/// Options of a [`Reducer`](super::reduce::Reducer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceConfig {
  /// Unfold variables bound to definitions. Off gives the head form without
  /// delta steps, which conversion checking tries before unfolding.
  pub delta: bool,
  /// Reject a `Lam` at the head of an application reaching `nf`. WHNF never
  /// leaves one there, so this only fires on a reducer bug.
  pub check_invariants: bool,
}

impl Default for ReduceConfig {
  fn default() -> Self {
    ReduceConfig { delta: true, check_invariants: true }
  }
}

impl ReduceConfig {
  pub fn no_delta() -> Self {
    ReduceConfig { delta: false, ..Self::default() }
  }

  pub fn with_invariant_checks(self, check_invariants: bool) -> Self {
    ReduceConfig { check_invariants, ..self }
  }
}
