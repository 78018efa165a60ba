//! Rated individuals and the alternating group-assignment helper.

use std::fmt;

use serde::Serialize;

use crate::engine::rng::Rng;

/// Which side of the binary demographic attribute an individual carries.
/// The rating bias multiplier applies to [Group::Favored] only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Favored,
    Unfavored,
}

impl Group {
    /// The other label.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Favored => Self::Unfavored,
            Self::Unfavored => Self::Favored,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Favored => "favored",
            Self::Unfavored => "unfavored",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rated entity. Owned by exactly one tier's roster at a time:
/// promotion moves it up, attrition discards it.
#[derive(Debug, Clone)]
pub struct Individual {
    pub group: Group,
    pub rating: f64,
    history: Vec<String>,
}

impl Individual {
    pub fn new(group: Group, rating: f64) -> Self {
        Self {
            group,
            rating,
            history: Vec::new(),
        }
    }

    /// Draw a fresh individual: base rating uniform over [0, 1), scaled by
    /// `bias` when the individual belongs to the favored group.
    pub fn draw(bias: f64, group: Group, rng: &mut Rng) -> Self {
        let mut rating = rng.next_unit();
        if group == Group::Favored {
            rating *= bias;
        }
        Self::new(group, rating)
    }

    /// Append a description of an event to this individual's history.
    /// The history is write-only within the engine; nothing reads it back.
    pub fn add_event(&mut self, event: impl Into<String>) {
        self.history.push(event.into());
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}

/// Alternating group assignment for newly manufactured individuals.
///
/// Replaces a process-global toggle: each simulation run owns its own
/// assigner, so concurrent runs stay isolated. Holds the last group handed
/// out and returns the opposite on every call.
#[derive(Debug, Clone)]
pub struct GroupAssigner {
    last: Group,
}

impl GroupAssigner {
    /// Assigner whose next assignment is the opposite of `group`.
    pub fn starting_after(group: Group) -> Self {
        Self { last: group }
    }

    /// Assigner with a coin-flipped starting side, so trials differ in
    /// which group leads the alternation.
    pub fn from_rng(rng: &mut Rng) -> Self {
        let last = if rng.chance(0.5) {
            Group::Favored
        } else {
            Group::Unfavored
        };
        Self { last }
    }

    /// The group for the next individual; alternates on every call.
    pub fn next_group(&mut self) -> Group {
        self.last = self.last.opposite();
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_alternates_starting_opposite() {
        let mut assigner = GroupAssigner::starting_after(Group::Favored);
        assert_eq!(assigner.next_group(), Group::Unfavored);
        assert_eq!(assigner.next_group(), Group::Favored);
        assert_eq!(assigner.next_group(), Group::Unfavored);
    }

    #[test]
    fn drawn_ratings_respect_bias_bounds() {
        let mut rng = Rng::new(3);
        let bias = 1.5;
        let mut favored_above_one = false;
        for _ in 0..1_000 {
            let favored = Individual::draw(bias, Group::Favored, &mut rng);
            let unfavored = Individual::draw(bias, Group::Unfavored, &mut rng);
            assert!((0.0..bias).contains(&favored.rating));
            assert!((0.0..1.0).contains(&unfavored.rating));
            favored_above_one |= favored.rating > 1.0;
        }
        assert!(favored_above_one, "bias never lifted a rating above 1.0");
    }

    #[test]
    fn history_appends_in_order() {
        let mut individual = Individual::new(Group::Unfavored, 0.4);
        individual.add_event("hired");
        individual.add_event("promoted");
        assert_eq!(individual.history(), ["hired", "promoted"]);
    }
}
