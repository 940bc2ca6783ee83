//! One weighted application of a recipe within a process.

use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Item, ItemStack};
use crate::error::PlanError;
use crate::id::{ItemId, RecipeId, StepId};
use crate::power::PowerConsumption;
use crate::rational::Rational;

/// Seconds of crafting time per unit of `factor`.
const SECONDS_PER_MINUTE: i64 = 60;

/// How hard a step's machines run relative to nominal speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockState {
    /// Below 100%.
    Underclocked,
    /// Exactly 100%.
    Nominal,
    /// Above 100%, up to the 250% limit.
    Overclocked,
    /// Above 250%; more machines are needed.
    Excessive,
}

impl ClockState {
    pub fn classify(clock_speed: &Rational) -> Self {
        let one = Rational::from(1);
        if *clock_speed > overclock_limit() {
            Self::Excessive
        } else if *clock_speed > one {
            Self::Overclocked
        } else if *clock_speed == one {
            Self::Nominal
        } else {
            Self::Underclocked
        }
    }
}

fn overclock_limit() -> Rational {
    Rational::new(5, 2).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftingStep {
    pub id: StepId,
    pub recipe: RecipeId,
    /// Which product this step is "for"; disambiguates multi-product recipes.
    pub primary_output: ItemId,
    pub factor: Rational,
    pub buildings: u32,
    pub is_built: bool,
}

impl CraftingStep {
    pub fn new(recipe: RecipeId, primary_output: ItemId) -> Self {
        Self {
            id: StepId::new(),
            recipe,
            primary_output,
            factor: Rational::from(1),
            buildings: 1,
            is_built: false,
        }
    }

    pub fn with_factor(mut self, factor: Rational) -> Self {
        self.factor = factor;
        self
    }

    /// `factor * craftingTime / 60`, the machine count needed at 100% clock.
    pub fn machine_load(&self, catalog: &Catalog) -> Rational {
        &(&self.factor * &catalog.recipe(&self.recipe).crafting_time) / SECONDS_PER_MINUTE
    }

    /// Utilisation of the configured machines; 1 means exactly nominal.
    pub fn clock_speed(&self, catalog: &Catalog) -> Rational {
        &self.machine_load(catalog) / i64::from(self.buildings.max(1))
    }

    pub fn clock_state(&self, catalog: &Catalog) -> ClockState {
        ClockState::classify(&self.clock_speed(catalog))
    }

    /// Machines needed to run at or below 100% clock, at least one.
    pub fn ideal_buildings(&self, catalog: &Catalog) -> u32 {
        let needed = self.machine_load(catalog).abs().ceil();
        needed.to_u32().unwrap_or(u32::MAX).max(1)
    }

    pub fn auto_set_buildings(&mut self, catalog: &Catalog) {
        self.buildings = self.ideal_buildings(catalog);
    }

    /// Power draw of this step's machines; `None` when the recipe has no
    /// single known producer.
    pub fn power_consumption(&self, catalog: &Catalog) -> Option<PowerConsumption> {
        let recipe = catalog.recipe(&self.recipe);
        let producer = recipe.producer(catalog)?;

        let clock = self.clock_speed(catalog).abs().approximation();
        let exponent = producer.power_consumption_exponent.approximation();
        let base = f64::from(self.buildings.max(1)) * clock.powf(exponent);

        let power = if recipe.uses_variable_power(producer) {
            let constant = recipe.variable_power_consumption_constant as f64;
            let factor = recipe.variable_power_consumption_factor as f64;
            PowerConsumption::range(base * constant, base * (constant + factor))
        } else {
            PowerConsumption::fixed(base * producer.power_consumption.approximation())
        };
        Some(power)
    }

    /// Swap the recipe, rescaling `factor` so the amount of primary output
    /// stays the same. A previous recipe that did not produce the primary
    /// output (such as a placeholder) leaves `factor` untouched.
    pub fn set_recipe(&mut self, catalog: &Catalog, recipe: RecipeId) -> Result<(), PlanError> {
        let new_production = catalog.recipe(&recipe).production(&self.primary_output);
        if new_production == 0 {
            return Err(PlanError::ItemNotProduced {
                recipe,
                item: self.primary_output.clone(),
            });
        }
        let old_production = catalog.recipe(&self.recipe).production(&self.primary_output);
        if old_production != 0 {
            let ratio = Rational::new(old_production, new_production)?;
            self.factor = &self.factor * &ratio;
        }
        tracing::debug!(step = %self.id, from = %self.recipe, to = %recipe, factor = %self.factor, "recipe changed");
        self.recipe = recipe;
        Ok(())
    }

    /// Real-world amount of `stack` handled by this step:
    /// `amount * factor * multiplier`.
    pub fn scaled_amount(&self, stack: &ItemStack, item: &Item) -> Rational {
        &(&self.factor * stack.amount) * &item.multiplier()
    }

    /// The factor that makes a derived quantity `factor * multiplier` equal
    /// `amount`, keeping the sign of the current factor. A zero amount or
    /// multiplier is not solvable and returns the current factor.
    pub fn solve_factor_for(&self, amount: &Rational, multiplier: &Rational) -> Rational {
        if amount.is_zero() {
            return self.factor.clone();
        }
        match amount.checked_div(multiplier) {
            Ok(factor) => factor.matching_sign(&self.factor),
            Err(_) => self.factor.clone(),
        }
    }

    /// Net production of `item` by this step, in raw units.
    pub fn net_production(&self, catalog: &Catalog, item: &ItemId) -> Rational {
        &self.factor * catalog.recipe(&self.recipe).net_production(item)
    }

    /// The factor at which this step's output of `item` exactly cancels the
    /// rest of the process's net demand for it, given the process-wide
    /// `total` of `item` (which includes this step).
    pub fn matching_factor(
        &self,
        catalog: &Catalog,
        item: &ItemId,
        total: &Rational,
    ) -> Result<Rational, PlanError> {
        let demand = self.demand_for(catalog, item, total);
        let recipe = catalog.recipe(&self.recipe);
        let product = recipe
            .product(item)
            .filter(|stack| stack.amount != 0)
            .ok_or_else(|| PlanError::ItemNotProduced {
                recipe: self.recipe.clone(),
                item: item.clone(),
            })?;
        Ok(&demand / product.amount)
    }

    /// Whether matching demand for `item` would change anything and leave a
    /// positive factor.
    pub fn can_match_demand(&self, catalog: &Catalog, item: &ItemId, total: &Rational) -> bool {
        let demand = self.demand_for(catalog, item, total);
        demand.is_positive()
            && demand != self.net_production(catalog, item)
            && catalog.recipe(&self.recipe).production(item) != 0
    }

    /// Everyone else's net demand for `item`, plus what this step makes.
    fn demand_for(&self, catalog: &Catalog, item: &ItemId, total: &Rational) -> Rational {
        &-total + &self.net_production(catalog, item)
    }
}
