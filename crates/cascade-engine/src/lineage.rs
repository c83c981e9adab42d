//! Single-lineage propagation: drive one candidate, and optionally its
//! tree of secondaries, to a terminal state.
//!
//! Within a lineage everything is sequential and depth-first. A secondary
//! is only propagated after the `process()` call that created it has
//! returned.

use cascade_core::Candidate;

use crate::cancel::CancelToken;
use crate::error::RunError;
use crate::pipeline::ModuleList;

/// How secondaries are handled while propagating a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Propagation {
    /// Propagate secondaries at all. When `false` they are still created
    /// by modules but left unrun in the tree.
    pub recursive: bool,
    /// Propagate secondaries after every step of their parent (`true`) or
    /// only once the parent is inactive (`false`).
    pub secondaries_first: bool,
}

impl Default for Propagation {
    fn default() -> Self {
        Self {
            recursive: true,
            secondaries_first: true,
        }
    }
}

impl Propagation {
    /// Only the primary; secondaries stay unrun.
    pub const PRIMARY_ONLY: Propagation = Propagation {
        recursive: false,
        secondaries_first: false,
    };

    /// Secondaries interleaved with every parent step.
    pub const SECONDARIES_FIRST: Propagation = Propagation {
        recursive: true,
        secondaries_first: true,
    };

    /// Secondaries after the parent terminates.
    pub const SECONDARIES_LAST: Propagation = Propagation {
        recursive: true,
        secondaries_first: false,
    };
}

impl ModuleList {
    /// Propagate `candidate` until it is inactive or `token` stops.
    ///
    /// While the candidate is active and the token is running, apply the
    /// pipeline once. With `secondaries_first`, every step is followed by
    /// a pass over the secondaries; otherwise the pass happens once after
    /// the loop. Each pass walks `secondaries` by index and re-reads the
    /// length before every element, so secondaries appended during the
    /// pass are propagated in the same pass. Passes stop early when the
    /// token stops.
    ///
    /// Cancellation leaves the candidate as the last completed step left
    /// it; nothing is rolled back.
    ///
    /// While the lineage runs, `token` is the thread's
    /// [`CancelToken::current`].
    ///
    /// # Errors
    ///
    /// The first module error, from this candidate or any descendant.
    pub fn run_candidate(
        &self,
        candidate: &mut Candidate,
        policy: Propagation,
        token: &CancelToken,
    ) -> Result<(), RunError> {
        let _scope = token.enter();
        self.propagate(candidate, policy, token)
    }

    fn propagate(
        &self,
        candidate: &mut Candidate,
        policy: Propagation,
        token: &CancelToken,
    ) -> Result<(), RunError> {
        while candidate.is_active() && token.is_running() {
            self.process(candidate)?;

            if policy.recursive && policy.secondaries_first {
                self.run_secondaries(candidate, policy, token)?;
            }
        }

        if policy.recursive && !policy.secondaries_first {
            self.run_secondaries(candidate, policy, token)?;
        }
        Ok(())
    }

    fn run_secondaries(
        &self,
        candidate: &mut Candidate,
        policy: Propagation,
        token: &CancelToken,
    ) -> Result<(), RunError> {
        let mut i = 0;
        while i < candidate.secondaries.len() {
            if !token.is_running() {
                break;
            }
            self.propagate(&mut candidate.secondaries[i], policy, token)?;
            i += 1;
        }
        Ok(())
    }

    /// [`run_candidate`](ModuleList::run_candidate) with the default
    /// policy (recursive, secondaries first) and a private token.
    pub fn run(&self, candidate: &mut Candidate) -> Result<(), RunError> {
        self.run_candidate(candidate, Propagation::default(), &CancelToken::new())
    }
}

/// Whether a lineage ran to its natural end under `policy`: the candidate
/// is inactive and, if secondaries are propagated, so is every descendant.
pub(crate) fn is_settled(candidate: &Candidate, policy: Propagation) -> bool {
    !candidate.is_active()
        && (!policy.recursive || candidate.secondaries.iter().all(|c| is_settled(c, policy)))
}
