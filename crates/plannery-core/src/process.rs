//! An ordered list of crafting steps and their aggregate totals.
//!
//! Every mutation goes through a method taking the [`Catalog`], and each one
//! recomputes [`CraftingProcess::totals`] before returning. The cached bag is
//! therefore always equal to [`ItemBag::from_steps`] over the current steps.

use std::collections::BTreeMap;

use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::bag::ItemBag;
use crate::catalog::Catalog;
use crate::error::PlanError;
use crate::id::{ItemId, ProcessId, ProducerId, RecipeId, StepId};
use crate::power::PowerConsumption;
use crate::rational::Rational;
use crate::step::CraftingStep;

/// Machines of one kind across a process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildingCount {
    /// Machines in steps marked as built.
    pub placed: u32,
    pub total: u32,
}

impl BuildingCount {
    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.placed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftingProcess {
    id: ProcessId,
    pub name: String,
    #[serde(default)]
    steps: Vec<CraftingStep>,
    #[serde(default)]
    totals: ItemBag,
}

impl CraftingProcess {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProcessId::new(),
            name: name.into(),
            steps: Vec::new(),
            totals: ItemBag::new(),
        }
    }

    pub fn with_steps(catalog: &Catalog, name: impl Into<String>, steps: Vec<CraftingStep>) -> Self {
        let mut process = Self::new(name);
        process.steps = steps;
        process.recompute(catalog);
        process
    }

    /// A process whose totals are not computed yet.
    pub(crate) fn from_parts(name: String, steps: Vec<CraftingStep>) -> Self {
        Self {
            id: ProcessId::new(),
            name,
            steps,
            totals: ItemBag::new(),
        }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn steps(&self) -> &[CraftingStep] {
        &self.steps
    }

    pub fn step(&self, id: StepId) -> Option<&CraftingStep> {
        self.steps.iter().find(|step| step.id == id)
    }

    pub fn totals(&self) -> &ItemBag {
        &self.totals
    }

    /// Rebuild `totals` from the steps. Needed after deserializing, since the
    /// stored totals may predate a catalog update. Every step keeps at least
    /// one building.
    pub fn recompute(&mut self, catalog: &Catalog) {
        for step in &mut self.steps {
            step.buildings = step.buildings.max(1);
        }
        self.totals = ItemBag::from_steps(catalog, &self.steps);
        tracing::debug!(
            process = %self.id,
            steps = self.steps.len(),
            items = self.totals.counts().len(),
            "totals recomputed"
        );
    }

    fn index_of(&self, id: StepId) -> Result<usize, PlanError> {
        self.steps
            .iter()
            .position(|step| step.id == id)
            .ok_or(PlanError::UnknownStep(id))
    }

    // -----------------------------------------------------------------------
    // Adding and removing steps
    // -----------------------------------------------------------------------

    /// Append a step running `recipe` fast enough to produce `amount` of
    /// `item`: `factor = amount / recipe.production(item)`.
    pub fn add_step(
        &mut self,
        catalog: &Catalog,
        recipe: RecipeId,
        amount: &Rational,
        item: ItemId,
    ) -> Result<StepId, PlanError> {
        let production = catalog.recipe(&recipe).production(&item);
        if production == 0 {
            return Err(PlanError::ItemNotProduced { recipe, item });
        }
        let step = CraftingStep::new(recipe, item).with_factor(amount / production);
        Ok(self.push_step(catalog, step))
    }

    /// Append a step running `recipe` once per minute for `item`.
    pub fn add_step_using(
        &mut self,
        catalog: &Catalog,
        recipe: RecipeId,
        item: ItemId,
    ) -> Result<StepId, PlanError> {
        if catalog.recipe(&recipe).production(&item) == 0 {
            return Err(PlanError::ItemNotProduced { recipe, item });
        }
        Ok(self.push_step(catalog, CraftingStep::new(recipe, item)))
    }

    pub fn push_step(&mut self, catalog: &Catalog, step: CraftingStep) -> StepId {
        let id = step.id;
        self.steps.push(step);
        self.recompute(catalog);
        id
    }

    pub fn remove(&mut self, catalog: &Catalog, id: StepId) -> Result<CraftingStep, PlanError> {
        let index = self.index_of(id)?;
        let step = self.steps.remove(index);
        self.recompute(catalog);
        Ok(step)
    }

    // -----------------------------------------------------------------------
    // Reordering
    // -----------------------------------------------------------------------

    /// Whether `id` can move `offset` places and stay in bounds.
    pub fn can_move(&self, id: StepId, offset: isize) -> bool {
        self.index_of(id)
            .ok()
            .and_then(|index| index.checked_add_signed(offset))
            .is_some_and(|target| target < self.steps.len())
    }

    pub fn move_step(&mut self, catalog: &Catalog, id: StepId, offset: isize) -> Result<(), PlanError> {
        let index = self.index_of(id)?;
        let target = index
            .checked_add_signed(offset)
            .filter(|&target| target < self.steps.len())
            .ok_or(PlanError::InvalidMove { step: id, offset })?;
        let step = self.steps.remove(index);
        self.steps.insert(target, step);
        self.recompute(catalog);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Editing steps
    // -----------------------------------------------------------------------

    /// Mutate one step in place, then recompute totals. A machine count of
    /// zero is raised to one.
    pub fn update_step<R>(
        &mut self,
        catalog: &Catalog,
        id: StepId,
        edit: impl FnOnce(&mut CraftingStep) -> R,
    ) -> Result<R, PlanError> {
        let index = self.index_of(id)?;
        let step = &mut self.steps[index];
        let result = edit(step);
        self.recompute(catalog);
        Ok(result)
    }

    /// Change a step's recipe, keeping its primary output amount.
    pub fn change_recipe(
        &mut self,
        catalog: &Catalog,
        id: StepId,
        recipe: RecipeId,
    ) -> Result<(), PlanError> {
        self.update_step(catalog, id, |step| step.set_recipe(catalog, recipe))?
    }

    /// Set a step's factor so its output of `item` covers the rest of the
    /// process's demand for it. Returns the new factor.
    pub fn match_demand(
        &mut self,
        catalog: &Catalog,
        id: StepId,
        item: &ItemId,
    ) -> Result<Rational, PlanError> {
        let index = self.index_of(id)?;
        let total = self.totals.count(item);
        let factor = self.steps[index].matching_factor(catalog, item, &total)?;
        self.update_step(catalog, id, |step| step.factor = factor.clone())?;
        Ok(factor)
    }

    /// Whether [`CraftingProcess::match_demand`] would change anything.
    pub fn can_match_demand(&self, catalog: &Catalog, id: StepId, item: &ItemId) -> bool {
        self.step(id)
            .is_some_and(|step| step.can_match_demand(catalog, item, &self.totals.count(item)))
    }

    // -----------------------------------------------------------------------
    // Whole-process scaling
    // -----------------------------------------------------------------------

    /// Multiply every step's factor by `k`.
    pub fn scale(&mut self, catalog: &Catalog, k: &Rational) {
        for step in &mut self.steps {
            step.factor = &step.factor * k;
        }
        self.recompute(catalog);
    }

    /// Scale the whole process so the net real-world amount of `item`
    /// becomes `|amount|`.
    pub fn scale_to_produce(
        &mut self,
        catalog: &Catalog,
        item: &ItemId,
        amount: &Rational,
    ) -> Result<(), PlanError> {
        let count = &catalog.item(item).multiplier() * &self.totals.count(item);
        if count.is_zero() {
            return Err(PlanError::NoNetCount(item.clone()));
        }
        let k = amount.checked_div(&count)?.abs();
        self.scale(catalog, &k);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Derived metrics
    // -----------------------------------------------------------------------

    /// Machines per producer. Steps whose recipe has no single producer are
    /// skipped.
    pub fn buildings_required(&self, catalog: &Catalog) -> BTreeMap<ProducerId, BuildingCount> {
        let mut counts: BTreeMap<ProducerId, BuildingCount> = BTreeMap::new();
        for step in &self.steps {
            let recipe = catalog.recipe(&step.recipe);
            let Some(producer) = recipe.producer(catalog) else {
                continue;
            };
            let entry = counts.entry(producer.id.clone()).or_default();
            entry.total = entry.total.saturating_add(step.buildings);
            if step.is_built {
                entry.placed = entry.placed.saturating_add(step.buildings);
            }
        }
        counts
    }

    /// Sum of every step's power range.
    pub fn power_consumption(&self, catalog: &Catalog) -> PowerConsumption {
        self.steps
            .iter()
            .filter_map(|step| step.power_consumption(catalog))
            .sum()
    }
}
