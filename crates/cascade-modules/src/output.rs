//! Output sink that streams candidate records over a channel.
//!
//! The module only owns a [`Sender`]; a consumer on any thread drains the
//! matching receiver. Sends never block on an unbounded channel, so the
//! sink adds no locking of its own to the pipeline.

use cascade_core::{Candidate, Module, ModuleError, ParticleState};
use crossbeam_channel::{Receiver, Sender};

/// Property set on candidates already emitted under
/// [`OutputTrigger::OnDeactivation`].
const EMITTED: &str = "output_emitted";

/// One observed candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputRecord {
    /// State at observation time.
    pub current: ParticleState,
    /// State at creation.
    pub created: ParticleState,
    /// State of the primary at its source.
    pub source: ParticleState,
    /// Path length travelled so far.
    pub trajectory_length: f64,
    /// Importance weight.
    pub weight: f64,
}

impl From<&Candidate> for OutputRecord {
    fn from(c: &Candidate) -> Self {
        Self {
            current: c.current,
            created: c.created,
            source: c.source,
            trajectory_length: c.trajectory_length,
            weight: c.weight,
        }
    }
}

/// When [`ChannelOutput`] emits a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputTrigger {
    /// Every call on an active candidate (a trajectory).
    Every,
    /// Once per candidate, on the first call that sees it inactive.
    #[default]
    OnDeactivation,
}

/// Sends an [`OutputRecord`] per observed candidate.
#[derive(Clone, Debug)]
pub struct ChannelOutput {
    sender: Sender<OutputRecord>,
    trigger: OutputTrigger,
}

impl ChannelOutput {
    /// Emit into `sender` with the given trigger.
    pub fn new(sender: Sender<OutputRecord>, trigger: OutputTrigger) -> Self {
        Self { sender, trigger }
    }

    /// A sink on a fresh unbounded channel, plus its receiver.
    pub fn unbounded(trigger: OutputTrigger) -> (Self, Receiver<OutputRecord>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::new(tx, trigger), rx)
    }

    /// The configured trigger.
    pub fn trigger(&self) -> OutputTrigger {
        self.trigger
    }

    fn send(&self, candidate: &Candidate) -> Result<(), ModuleError> {
        self.sender
            .send(OutputRecord::from(candidate))
            .map_err(|_| ModuleError::ExecutionFailed {
                reason: "output channel disconnected".into(),
            })
    }
}

impl Module for ChannelOutput {
    fn process(&self, candidate: &mut Candidate) -> Result<(), ModuleError> {
        match self.trigger {
            OutputTrigger::Every => {
                if candidate.is_active() {
                    self.send(candidate)?;
                }
            }
            OutputTrigger::OnDeactivation => {
                if !candidate.is_active() && !candidate.has_property(EMITTED) {
                    self.send(candidate)?;
                    candidate.set_property(EMITTED, true);
                }
            }
        }
        Ok(())
    }

    fn description(&self) -> String {
        match self.trigger {
            OutputTrigger::Every => "ChannelOutput: every step".into(),
            OutputTrigger::OnDeactivation => "ChannelOutput: on deactivation".into(),
        }
    }
}
