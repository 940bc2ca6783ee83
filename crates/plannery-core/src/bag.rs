//! Signed per-item ledger built by folding weighted recipe applications.

use std::collections::BTreeMap;
use std::ops::Add;

use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Item, ItemStack, Recipe};
use crate::id::ItemId;
use crate::rational::Rational;
use crate::step::CraftingStep;

/// Item id to net count. Positive counts are surpluses, negative ones are
/// deficits. Entries that reach zero are dropped, so two bags holding the
/// same net amounts compare equal however they were built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBag {
    counts: BTreeMap<ItemId, Rational>,
}

impl ItemBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold every step, in order, into a fresh bag.
    pub fn from_steps<'a>(
        catalog: &Catalog,
        steps: impl IntoIterator<Item = &'a CraftingStep>,
    ) -> Self {
        let mut bag = Self::new();
        for step in steps {
            bag.apply(catalog, step);
        }
        bag
    }

    /// `counts[item] += amount * factor`.
    pub fn add_stack(&mut self, stack: &ItemStack, factor: &Rational) {
        self.add_count(&stack.item, &(factor * stack.amount));
    }

    fn add_count(&mut self, item: &ItemId, delta: &Rational) {
        if delta.is_zero() {
            return;
        }
        let total = match self.counts.get(item) {
            Some(current) => current + delta,
            None => delta.clone(),
        };
        if total.is_zero() {
            self.counts.remove(item);
        } else {
            self.counts.insert(item.clone(), total);
        }
    }

    /// Products at `+factor`, ingredients at `-factor`.
    pub fn apply_recipe(&mut self, recipe: &Recipe, factor: &Rational) {
        for product in &recipe.products {
            self.add_stack(product, factor);
        }
        let negated = -factor;
        for ingredient in &recipe.ingredients {
            self.add_stack(ingredient, &negated);
        }
    }

    pub fn apply(&mut self, catalog: &Catalog, step: &CraftingStep) {
        self.apply_recipe(&catalog.recipe(&step.recipe), &step.factor);
    }

    /// Exact inverse of [`ItemBag::apply`].
    pub fn unapply(&mut self, catalog: &Catalog, step: &CraftingStep) {
        self.apply_recipe(&catalog.recipe(&step.recipe), &-&step.factor);
    }

    /// Net count of `item`, zero when absent.
    pub fn count(&self, item: &ItemId) -> Rational {
        self.counts.get(item).cloned().unwrap_or_default()
    }

    pub fn counts(&self) -> &BTreeMap<ItemId, Rational> {
        &self.counts
    }

    pub fn is_empty(&self) -> bool {
        self.counts.values().all(Zero::is_zero)
    }

    /// Strict deficits.
    pub fn inputs(&self) -> impl Iterator<Item = (&ItemId, &Rational)> {
        self.counts.iter().filter(|(_, count)| count.is_negative())
    }

    /// Strict surpluses.
    pub fn outputs(&self) -> impl Iterator<Item = (&ItemId, &Rational)> {
        self.counts.iter().filter(|(_, count)| count.is_positive())
    }

    /// Every count multiplied by `k`.
    pub fn scaled(&self, k: &Rational) -> Self {
        let counts = self
            .counts
            .iter()
            .map(|(item, count)| (item.clone(), count * k))
            .filter(|(_, count)| !count.is_zero())
            .collect();
        Self { counts }
    }

    /// Copy without zero entries. Only a deserialized bag can hold any.
    pub fn nonzero(&self) -> Self {
        let counts = self
            .counts
            .iter()
            .filter(|(_, count)| !count.is_zero())
            .map(|(item, count)| (item.clone(), count.clone()))
            .collect();
        Self { counts }
    }

    /// Surpluses resolved against the catalog, largest real amount first.
    pub fn sorted_outputs(&self, catalog: &Catalog) -> Vec<ResolvedStack> {
        let mut stacks: Vec<_> = self
            .outputs()
            .map(|(item, count)| ResolvedStack::resolve(catalog, item, count))
            .collect();
        stacks.sort_by(|a, b| {
            b.real_amount()
                .cmp(&a.real_amount())
                .then_with(|| a.item.name.cmp(&b.item.name))
        });
        stacks
    }

    /// Deficits resolved against the catalog, largest deficit first.
    pub fn sorted_inputs(&self, catalog: &Catalog) -> Vec<ResolvedStack> {
        let mut stacks: Vec<_> = self
            .inputs()
            .map(|(item, count)| ResolvedStack::resolve(catalog, item, count))
            .collect();
        stacks.sort_by(|a, b| {
            a.real_amount()
                .cmp(&b.real_amount())
                .then_with(|| a.item.name.cmp(&b.item.name))
        });
        stacks
    }
}

impl Add for ItemBag {
    type Output = ItemBag;

    fn add(mut self, rhs: ItemBag) -> ItemBag {
        for (item, count) in &rhs.counts {
            self.add_count(item, count);
        }
        self
    }
}

impl Add<&ItemBag> for &ItemBag {
    type Output = ItemBag;

    fn add(self, rhs: &ItemBag) -> ItemBag {
        self.clone() + rhs.clone()
    }
}

impl std::iter::Sum for ItemBag {
    fn sum<I: Iterator<Item = ItemBag>>(iter: I) -> Self {
        iter.fold(ItemBag::new(), |acc, bag| acc + bag)
    }
}

/// A bag entry joined with its catalog record.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStack {
    pub item: Item,
    pub count: Rational,
}

impl ResolvedStack {
    fn resolve(catalog: &Catalog, item: &ItemId, count: &Rational) -> Self {
        Self {
            item: catalog.item(item).into_owned(),
            count: count.clone(),
        }
    }

    /// Count in real-world units (fluids in m³).
    pub fn real_amount(&self) -> Rational {
        &self.count * &self.item.multiplier()
    }

    pub fn resource_sink_points(&self) -> Rational {
        &self.count * self.item.resource_sink_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: i64, d: i64) -> Rational {
        Rational::new(n, d).unwrap()
    }

    fn ingot_recipe() -> Recipe {
        Recipe::new("ingot", "Iron Ingot", Rational::from(2))
            .with_ingredient("ore", 1)
            .with_product("ingot", 1)
    }

    #[test]
    fn add_stack_defaults_absent_entries_to_zero() {
        let mut bag = ItemBag::new();
        bag.add_stack(&ItemStack::new("ore", 3), &r(1, 2));
        assert_eq!(bag.count(&ItemId::from("ore")), r(3, 2));
        assert_eq!(bag.count(&ItemId::from("other")), Rational::zero());
    }

    #[test]
    fn apply_recipe_signs_products_and_ingredients() {
        let mut bag = ItemBag::new();
        bag.apply_recipe(&ingot_recipe(), &Rational::from(30));
        assert_eq!(bag.count(&ItemId::from("ingot")), Rational::from(30));
        assert_eq!(bag.count(&ItemId::from("ore")), Rational::from(-30));
        assert_eq!(bag.outputs().count(), 1);
        assert_eq!(bag.inputs().count(), 1);
    }

    #[test]
    fn cancelled_entries_belong_to_neither_side() {
        let mut bag = ItemBag::new();
        bag.add_stack(&ItemStack::new("ore", 2), &Rational::from(1));
        bag.add_stack(&ItemStack::new("ore", -2), &Rational::from(1));
        assert!(bag.is_empty());
        assert_eq!(bag.inputs().count() + bag.outputs().count(), 0);
        assert_eq!(bag, ItemBag::new());
    }

    #[test]
    fn scaled_and_sum() {
        let mut a = ItemBag::new();
        a.apply_recipe(&ingot_recipe(), &Rational::from(2));
        let doubled = a.scaled(&Rational::from(2));
        assert_eq!(doubled.count(&ItemId::from("ingot")), Rational::from(4));
        assert_eq!(&a + &a, doubled);
        assert_eq!(vec![a.clone(), a.clone()].into_iter().sum::<ItemBag>(), doubled);
        assert!(a.scaled(&Rational::zero()).is_empty());
    }

    #[test]
    fn nonzero_prunes_deserialized_zeros() {
        let bag: ItemBag =
            serde_json::from_str(r#"{"counts": {"ore": [0, 1], "ingot": [3, 2]}}"#).unwrap();
        assert!(!bag.counts().is_empty());
        let pruned = bag.nonzero();
        assert_eq!(pruned.counts().len(), 1);
        assert_eq!(pruned.count(&ItemId::from("ingot")), r(3, 2));
    }

    #[test]
    fn sorted_views_resolve_multipliers() {
        let mut water = Item::new("water", "Water");
        water.is_fluid = true;
        let catalog = Catalog::builder()
            .item(water)
            .item(Item::new("ore", "Iron Ore"))
            .item(Item::new("ingot", "Iron Ingot"))
            .item(Item::new("coal", "Coal"))
            .build()
            .unwrap();

        let mut bag = ItemBag::new();
        bag.add_stack(&ItemStack::new("water", 5000), &Rational::from(1));
        bag.add_stack(&ItemStack::new("ingot", 10), &Rational::from(1));
        bag.add_stack(&ItemStack::new("ore", -4), &Rational::from(1));
        bag.add_stack(&ItemStack::new("coal", -9), &Rational::from(1));

        let outputs = bag.sorted_outputs(&catalog);
        let names: Vec<_> = outputs.iter().map(|s| s.item.name.as_str()).collect();
        assert_eq!(names, ["Iron Ingot", "Water"]);
        assert_eq!(outputs[1].real_amount(), Rational::from(5));

        let inputs = bag.sorted_inputs(&catalog);
        let names: Vec<_> = inputs.iter().map(|s| s.item.name.as_str()).collect();
        assert_eq!(names, ["Coal", "Iron Ore"]);
    }
}
