//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::{Catalog, Item, Producer, Recipe};
use crate::id::{ItemId, ProducerId, RecipeId};
use crate::rational::Rational;

// ===========================================================================
// Rational helpers
// ===========================================================================

pub fn ratio(numerator: i64, denominator: i64) -> Rational {
    Rational::new(numerator, denominator).expect("nonzero denominator")
}

pub fn int(value: i64) -> Rational {
    Rational::from(value)
}

// ===========================================================================
// Item ids
// ===========================================================================

pub fn iron_ore() -> ItemId {
    ItemId::new("Desc_OreIron_C")
}
pub fn iron_ingot() -> ItemId {
    ItemId::new("Desc_IronIngot_C")
}
pub fn iron_plate() -> ItemId {
    ItemId::new("Desc_IronPlate_C")
}
pub fn iron_rod() -> ItemId {
    ItemId::new("Desc_IronRod_C")
}
pub fn screw() -> ItemId {
    ItemId::new("Desc_IronScrew_C")
}
pub fn water() -> ItemId {
    ItemId::new("Desc_Water_C")
}
pub fn nuclear_pasta() -> ItemId {
    ItemId::new("Desc_SpaceElevatorPart_9_C")
}

// ===========================================================================
// Recipe and producer ids
// ===========================================================================

pub fn ingot_recipe() -> RecipeId {
    RecipeId::new("Recipe_IngotIron_C")
}
pub fn pure_ingot_recipe() -> RecipeId {
    RecipeId::new("Recipe_Alternate_PureIronIngot_C")
}
pub fn plate_recipe() -> RecipeId {
    RecipeId::new("Recipe_IronPlate_C")
}
pub fn rod_recipe() -> RecipeId {
    RecipeId::new("Recipe_IronRod_C")
}
pub fn screw_recipe() -> RecipeId {
    RecipeId::new("Recipe_Screw_C")
}
pub fn cast_screw_recipe() -> RecipeId {
    RecipeId::new("Recipe_Alternate_Screw_C")
}
pub fn pasta_recipe() -> RecipeId {
    RecipeId::new("Recipe_SpaceElevatorPart_9_C")
}

pub fn smelter() -> ProducerId {
    ProducerId::new("Build_SmelterMk1_C")
}
pub fn refinery() -> ProducerId {
    ProducerId::new("Build_OilRefinery_C")
}
pub fn constructor() -> ProducerId {
    ProducerId::new("Build_ConstructorMk1_C")
}
pub fn particle_accelerator() -> ProducerId {
    ProducerId::new("Build_HadronCollider_C")
}

/// Overclocking exponent shared by most machines.
pub fn power_exponent() -> Rational {
    ratio(1_321_928, 1_000_000)
}

// ===========================================================================
// Catalog
// ===========================================================================

fn item(id: ItemId, name: &str, sink_points: i64) -> Item {
    let mut item = Item::new(id.as_str(), name);
    item.resource_sink_points = sink_points;
    item
}

/// A small iron production chain with one fluid, one alternate recipe per
/// chain link and one variable-power machine.
pub fn iron_catalog() -> Catalog {
    let mut water_item = item(water(), "Water", 0);
    water_item.is_fluid = true;

    Catalog::builder()
        .item(item(iron_ore(), "Iron Ore", 1))
        .item(item(iron_ingot(), "Iron Ingot", 2))
        .item(item(iron_plate(), "Iron Plate", 6))
        .item(item(iron_rod(), "Iron Rod", 4))
        .item(item(screw(), "Screw", 2))
        .item(water_item)
        .item(item(nuclear_pasta(), "Nuclear Pasta", 538_000))
        .producer(
            Producer::new(smelter().as_str(), "Smelter", int(4)).with_exponent(power_exponent()),
        )
        .producer(
            Producer::new(refinery().as_str(), "Refinery", int(30))
                .with_exponent(power_exponent()),
        )
        .producer(
            Producer::new(constructor().as_str(), "Constructor", int(4))
                .with_exponent(power_exponent()),
        )
        .producer(
            Producer::new(particle_accelerator().as_str(), "Particle Accelerator", int(0))
                .with_exponent(power_exponent()),
        )
        .recipe(
            Recipe::new(ingot_recipe().as_str(), "Iron Ingot", int(2))
                .with_ingredient(iron_ore().as_str(), 1)
                .with_product(iron_ingot().as_str(), 1)
                .produced_in(smelter().as_str()),
        )
        .recipe(
            Recipe::new(pure_ingot_recipe().as_str(), "Alternate: Pure Iron Ingot", int(12))
                .with_ingredient(iron_ore().as_str(), 7)
                .with_ingredient(water().as_str(), 4000)
                .with_product(iron_ingot().as_str(), 13)
                .produced_in(refinery().as_str()),
        )
        .recipe(
            Recipe::new(plate_recipe().as_str(), "Iron Plate", int(6))
                .with_ingredient(iron_ingot().as_str(), 3)
                .with_product(iron_plate().as_str(), 2)
                .produced_in(constructor().as_str()),
        )
        .recipe(
            Recipe::new(rod_recipe().as_str(), "Iron Rod", int(4))
                .with_ingredient(iron_ingot().as_str(), 1)
                .with_product(iron_rod().as_str(), 1)
                .produced_in(constructor().as_str()),
        )
        .recipe(
            Recipe::new(screw_recipe().as_str(), "Screw", int(6))
                .with_ingredient(iron_rod().as_str(), 1)
                .with_product(screw().as_str(), 4)
                .produced_in(constructor().as_str()),
        )
        .recipe(
            Recipe::new(cast_screw_recipe().as_str(), "Alternate: Cast Screw", int(24))
                .with_ingredient(iron_ingot().as_str(), 5)
                .with_product(screw().as_str(), 20)
                .produced_in(constructor().as_str()),
        )
        .recipe(
            Recipe::new(pasta_recipe().as_str(), "Nuclear Pasta", int(120))
                .with_ingredient(iron_plate().as_str(), 200)
                .with_product(nuclear_pasta().as_str(), 1)
                .produced_in(particle_accelerator().as_str())
                .with_variable_power(500, 1000),
        )
        .build()
        .expect("fixture catalog is consistent")
}
