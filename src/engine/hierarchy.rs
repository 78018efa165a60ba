//! The tier chain and the attrition/promotion round driver.
//!
//! Tiers live in a `Vec` indexed by level (0 = lowest); the tier-to-tier
//! "level below" chain is walked by index, so no tier holds a reference
//! into its neighbor.

use crate::engine::error::EngineError;
use crate::engine::individual::{GroupAssigner, Individual};
use crate::engine::rng::Rng;
use crate::engine::tier::Tier;

/// Reject an empty or non-positive capacity schedule.
pub fn validate_schedule(capacities: &[usize]) -> Result<(), EngineError> {
    if capacities.is_empty() {
        return Err(EngineError::EmptySchedule);
    }
    if let Some(index) = capacities.iter().position(|&capacity| capacity == 0) {
        return Err(EngineError::InvalidCapacity { index });
    }
    Ok(())
}

/// Bias is a multiplicative inflation; anything below 1.0 (or NaN) is a
/// configuration error.
pub fn validate_bias(bias: f64) -> Result<(), EngineError> {
    if bias >= 1.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidBias(bias))
    }
}

/// Attrition is a probability; NaN and out-of-range values are rejected.
pub fn validate_attrition(probability: f64) -> Result<(), EngineError> {
    if (0.0..=1.0).contains(&probability) {
        Ok(())
    } else {
        Err(EngineError::InvalidAttrition(probability))
    }
}

/// An ordered stack of tiers, level 0 at the bottom. The bottom tier is a
/// self-replenishing source: when the whole chain under a vacancy is
/// empty, it manufactures fresh individuals instead of failing.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    tiers: Vec<Tier>,
    assigner: GroupAssigner,
}

impl Hierarchy {
    /// Build and fully populate a hierarchy. `capacities` is ordered from
    /// the highest tier down to the lowest; the result is indexed with
    /// level 0 as the lowest tier. Each hierarchy owns its own group
    /// assigner, started on a coin flip so runs differ in which group
    /// leads the alternation.
    pub fn build(capacities: &[usize], bias: f64, rng: &mut Rng) -> Result<Self, EngineError> {
        validate_schedule(capacities)?;
        validate_bias(bias)?;
        let mut assigner = GroupAssigner::from_rng(rng);
        let mut tiers = Vec::with_capacity(capacities.len());
        for (level, &capacity) in capacities.iter().rev().enumerate() {
            let mut tier = Tier::new(level, capacity, bias);
            tier.populate(&mut assigner, rng);
            tiers.push(tier);
        }
        Ok(Self { tiers, assigner })
    }

    /// Number of levels.
    pub fn levels(&self) -> usize {
        self.tiers.len()
    }

    /// Tiers ordered lowest to highest.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn tier(&self, level: usize) -> Option<&Tier> {
        self.tiers.get(level)
    }

    /// One full cycle: attrite every tier, then refill from the top tier
    /// down so each promotion chain cascades in a single pass. Every tier
    /// is back at capacity when this returns.
    pub fn run_round(
        &mut self,
        attrition_probability: f64,
        rng: &mut Rng,
    ) -> Result<(), EngineError> {
        validate_attrition(attrition_probability)?;
        for tier in &mut self.tiers {
            tier.attrite(attrition_probability, rng);
        }
        for level in (0..self.tiers.len()).rev() {
            self.fill_vacancies(level, rng)?;
        }
        Ok(())
    }

    /// Fill every vacancy at `level` by promoting from the level below.
    /// The bottom tier has nobody below it and hires fresh instead.
    pub fn fill_vacancies(&mut self, level: usize, rng: &mut Rng) -> Result<(), EngineError> {
        if level >= self.tiers.len() {
            return Err(EngineError::UnknownLevel(level));
        }
        if level == 0 {
            self.tiers[0].populate(&mut self.assigner, rng);
            return Ok(());
        }
        while self.tiers[level].vacancies() > 0 {
            let promoted = self.promote_member(level - 1, rng)?;
            self.tiers[level].insert(promoted);
        }
        Ok(())
    }

    /// Remove and return the highest-rated member at `level`. When the
    /// tier is empty the search walks down the chain; an empty bottom
    /// tier repopulates itself first. Capacities are validated positive,
    /// so the call always yields a member.
    pub fn promote_member(
        &mut self,
        level: usize,
        rng: &mut Rng,
    ) -> Result<Individual, EngineError> {
        if level >= self.tiers.len() {
            return Err(EngineError::UnknownLevel(level));
        }
        let mut current = level;
        loop {
            if let Some(individual) = self.tiers[current].pop_top() {
                return Ok(individual);
            }
            if current == 0 {
                // Whole chain under the vacancy is empty: emergency hiring
                // at the bottom, then retry the pop.
                self.tiers[0].populate(&mut self.assigner, rng);
            } else {
                current -= 1;
            }
        }
    }
}
