//! A module list nested inside another as a single module.

use std::sync::Arc;

use cascade_core::{Candidate, Module, ModuleError};

use crate::cancel::CancelToken;
use crate::lineage::Propagation;
use crate::pipeline::ModuleList;

/// Runs a nested [`ModuleList`] to completion on every candidate it sees.
///
/// Each call propagates the candidate through the nested list with the
/// default [`Propagation`]. The nested lineage runs under the outer
/// lineage's [`CancelToken::current`], so a stop of the outer run also
/// stops the nested one at its next step. Outside any lineage a private
/// token is used.
#[derive(Clone, Debug)]
pub struct ModuleListRunner {
    list: Arc<ModuleList>,
}

impl ModuleListRunner {
    /// Wrap `list`.
    pub fn new(list: Arc<ModuleList>) -> Self {
        Self { list }
    }

    /// The nested list.
    pub fn list(&self) -> &ModuleList {
        &self.list
    }
}

impl From<ModuleList> for ModuleListRunner {
    fn from(list: ModuleList) -> Self {
        Self::new(Arc::new(list))
    }
}

impl Module for ModuleListRunner {
    fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError> {
        let token = CancelToken::current().unwrap_or_default();
        self.list
            .run_candidate(candidate, Propagation::default(), &token)
            .map_err(|e| ModuleError::ExecutionFailed {
                reason: e.to_string(),
            })
    }

    fn description(&self) -> String {
        format!("ModuleListRunner\n{}", self.list.description())
    }
}
