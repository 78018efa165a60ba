//! One level of the hierarchy: a fixed-capacity roster plus the
//! population, attrition, and reporting rules that act on it.

use std::fmt;

use crate::engine::error::EngineError;
use crate::engine::individual::{Group, GroupAssigner, Individual};
use crate::engine::rng::Rng;
use crate::engine::roster::Roster;

/// A fixed-capacity level. Level 0 is the bottom of the hierarchy; the
/// chain to the level below is held by the owning
/// [Hierarchy](crate::engine::Hierarchy) as indices.
#[derive(Debug, Clone)]
pub struct Tier {
    level: usize,
    capacity: usize,
    bias: f64,
    members: Roster,
}

impl Tier {
    /// An empty tier. Callers populate it before the first round.
    pub fn new(level: usize, capacity: usize, bias: f64) -> Self {
        Self {
            level,
            capacity,
            bias,
            members: Roster::new(),
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Open slots: capacity minus current membership.
    pub fn vacancies(&self) -> usize {
        self.capacity - self.members.len()
    }

    /// Rating of the member next in line for promotion, if any.
    pub fn top_rating(&self) -> Option<f64> {
        self.members.peek_rating()
    }

    /// Fill every vacancy with a freshly drawn individual. Group labels
    /// alternate via the run's assigner; ratings carry this tier's bias.
    pub fn populate(&mut self, assigner: &mut GroupAssigner, rng: &mut Rng) {
        for _ in 0..self.vacancies() {
            let group = assigner.next_group();
            self.members.insert(Individual::draw(self.bias, group, rng));
        }
    }

    /// Independently remove each member with the given probability. Draws
    /// are i.i.d. and uncorrelated with rating; survivors are retained in
    /// rating order.
    pub fn attrite(&mut self, probability: f64, rng: &mut Rng) {
        for individual in self.members.take_all() {
            if !rng.chance(probability) {
                self.members.insert(individual);
            }
        }
    }

    /// Fraction of current members carrying `group`. An empty tier is an
    /// explicit error rather than a NaN ratio.
    pub fn group_ratio(&self, group: Group) -> Result<f64, EngineError> {
        if self.members.is_empty() {
            return Err(EngineError::EmptyTier(self.level));
        }
        Ok(self.group_count(group) as f64 / self.members.len() as f64)
    }

    /// Number of current members carrying `group`.
    pub fn group_count(&self, group: Group) -> usize {
        self.members.count_group(group)
    }

    pub(crate) fn insert(&mut self, individual: Individual) {
        self.members.insert(individual);
    }

    pub(crate) fn pop_top(&mut self) -> Option<Individual> {
        self.members.pop_top()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "level {}: {} favored, {} unfavored",
            self.level,
            self.group_count(Group::Favored),
            self.group_count(Group::Unfavored),
        )
    }
}
