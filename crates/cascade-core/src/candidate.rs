//! The particle data model: [`ParticleState`] snapshots and the
//! [`Candidate`] record that owns its tree of secondaries.

use indexmap::IndexMap;

use crate::vector::Vector3;

/// Snapshot of one particle's kinematic state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleState {
    id: i32,
    energy: f64,
    position: Vector3,
    direction: Vector3,
}

impl Default for ParticleState {
    fn default() -> Self {
        Self {
            id: 0,
            energy: 0.0,
            position: Vector3::zero(),
            direction: Vector3::new(-1.0, 0.0, 0.0),
        }
    }
}

impl ParticleState {
    /// A state with the given particle id and energy, at the origin,
    /// heading along `-x`.
    pub fn new(id: i32, energy: f64) -> Self {
        Self {
            id,
            energy,
            ..Self::default()
        }
    }

    /// PDG-style particle id.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Set the particle id.
    pub fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    /// Total energy.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Set the total energy.
    pub fn set_energy(&mut self, energy: f64) {
        self.energy = energy;
    }

    /// Position.
    pub fn position(&self) -> Vector3 {
        self.position
    }

    /// Set the position.
    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
    }

    /// Unit direction of motion.
    pub fn direction(&self) -> Vector3 {
        self.direction
    }

    /// Set the direction of motion. The vector is normalized.
    pub fn set_direction(&mut self, direction: Vector3) {
        self.direction = direction.normalized();
    }
}

/// A free-form value a module can attach to a candidate.
#[derive(Clone, Debug, PartialEq)]
pub enum Property {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Text.
    Text(String),
}

impl Property {
    /// The integer value, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a float, if numeric.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl From<bool> for Property {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Property {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Property {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Property {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Property {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// One simulated particle plus its owned tree of secondaries.
///
/// `current` is mutated by modules; `previous` holds the state before the
/// last step; `created` is the state at creation; `source` is the state
/// of the originating primary at its source.
///
/// Activity is one-way: once [`set_active(false)`](Candidate::set_active)
/// has been called, the candidate is terminal and stays inactive.
#[derive(Clone, Debug)]
pub struct Candidate {
    /// State being propagated.
    pub current: ParticleState,
    /// State before the most recent step.
    pub previous: ParticleState,
    /// State at creation.
    pub created: ParticleState,
    /// State of the primary at its source.
    pub source: ParticleState,
    /// Importance weight for thinning schemes. Not interpreted by the engine.
    pub weight: f64,
    /// Cosmological redshift at the current position.
    pub redshift: f64,
    /// Path length travelled so far.
    pub trajectory_length: f64,
    /// Length of the most recent step.
    pub current_step: f64,
    /// Proposed length of the next step. Modules shrink it via
    /// [`limit_next_step`](Candidate::limit_next_step).
    pub next_step: f64,
    /// Secondaries created while processing this candidate, in creation
    /// order. Exclusively owned; only ever appended to during a run.
    pub secondaries: Vec<Candidate>,
    properties: IndexMap<String, Property>,
    active: bool,
}

impl Default for Candidate {
    fn default() -> Self {
        Self::new(ParticleState::default())
    }
}

impl Candidate {
    /// A fresh, active candidate with all four snapshots set to `state`.
    pub fn new(state: ParticleState) -> Self {
        Self {
            current: state,
            previous: state,
            created: state,
            source: state,
            weight: 1.0,
            redshift: 0.0,
            trajectory_length: 0.0,
            current_step: 0.0,
            next_step: 0.0,
            secondaries: Vec::new(),
            properties: IndexMap::new(),
            active: true,
        }
    }

    /// Whether the candidate is still being propagated.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Change the activity flag.
    ///
    /// Deactivation is permanent: requests to re-activate a terminal
    /// candidate are ignored.
    pub fn set_active(&mut self, active: bool) {
        self.active = self.active && active;
    }

    /// Shrink the proposed next step to at most `step`.
    pub fn limit_next_step(&mut self, step: f64) {
        self.next_step = self.next_step.min(step);
    }

    /// Append a secondary with the given current state and this
    /// candidate's weight. Returns a mutable reference to it.
    pub fn add_secondary(&mut self, state: ParticleState) -> &mut Candidate {
        let weight = self.weight;
        self.add_secondary_weighted(state, weight)
    }

    /// Append a secondary with an explicit weight.
    ///
    /// The child inherits the parent's `source`, starts at the parent's
    /// current state (`created` and `previous`), and carries the parent's
    /// redshift and trajectory length.
    pub fn add_secondary_weighted(&mut self, state: ParticleState, weight: f64) -> &mut Candidate {
        let child = Candidate {
            current: state,
            previous: self.current,
            created: self.current,
            source: self.source,
            weight,
            redshift: self.redshift,
            trajectory_length: self.trajectory_length,
            current_step: 0.0,
            next_step: 0.0,
            secondaries: Vec::new(),
            properties: IndexMap::new(),
            active: true,
        };
        self.secondaries.push(child);
        let last = self.secondaries.len() - 1;
        &mut self.secondaries[last]
    }

    /// Number of direct secondaries.
    pub fn secondary_count(&self) -> usize {
        self.secondaries.len()
    }

    /// This candidate plus all of its descendants.
    pub fn total_candidates(&self) -> usize {
        1 + self
            .secondaries
            .iter()
            .map(Candidate::total_candidates)
            .sum::<usize>()
    }

    /// Attach or replace a property.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Property>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Look up a property.
    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    /// Whether a property is set.
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Remove a property, preserving the order of the others.
    pub fn remove_property(&mut self, key: &str) -> Option<Property> {
        self.properties.shift_remove(key)
    }

    /// All properties in insertion order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }
}
