//! End-to-end planning scenarios against small catalogs.

use plannery_core::catalog::{Catalog, Item, Producer, Recipe};
use plannery_core::format::FractionFormat;
use plannery_core::id::{ItemId, RecipeId};
use plannery_core::power::PowerConsumption;
use plannery_core::process::{BuildingCount, CraftingProcess};
use plannery_core::rational::Rational;
use plannery_core::step::{ClockState, CraftingStep};
use plannery_core::test_utils::*;

// ===========================================================================
// Helpers
// ===========================================================================

/// Items `x`, `y`, `z`, `w` and one machine, plus the given recipes.
fn letters_catalog(recipes: Vec<Recipe>) -> Catalog {
    let mut builder = Catalog::builder()
        .producer(Producer::new("machine", "Machine", int(1)));
    for raw in ["x", "y", "z", "w", "other"] {
        builder.register_item(Item::new(raw, raw.to_uppercase()));
    }
    for recipe in recipes {
        builder.register_recipe(recipe.produced_in("machine"));
    }
    builder.build().unwrap()
}

fn id(raw: &str) -> ItemId {
    ItemId::from(raw)
}

// ===========================================================================
// Concrete scenarios
// ===========================================================================

#[test]
fn single_step_clock_speed_and_output() {
    let catalog = letters_catalog(vec![Recipe::new("make_x", "Make X", int(60)).with_product("x", 3)]);
    let mut process = CraftingProcess::new("one step");
    let step = process
        .push_step(&catalog, CraftingStep::new("make_x".into(), id("x")).with_factor(int(2)));

    let step = process.step(step).unwrap();
    assert_eq!(step.buildings, 1);
    assert_eq!(step.clock_speed(&catalog), int(2));
    let outputs: Vec<_> = process.totals().outputs().collect();
    assert_eq!(outputs, [(&id("x"), &int(6))]);
}

#[test]
fn two_steps_share_an_intermediate() {
    let catalog = letters_catalog(vec![
        Recipe::new("make_y", "Make Y", int(1)).with_product("y", 10),
        Recipe::new("y_to_z", "Y to Z", int(1))
            .with_ingredient("y", 4)
            .with_product("z", 4),
    ]);
    let mut process = CraftingProcess::new("chain");
    process.add_step_using(&catalog, "make_y".into(), id("y")).unwrap();
    process.add_step_using(&catalog, "y_to_z".into(), id("z")).unwrap();

    assert_eq!(process.totals().count(&id("y")), int(6));
    assert_eq!(process.totals().count(&id("z")), int(4));
}

#[test]
fn demand_matching_solves_exactly() {
    let catalog = letters_catalog(vec![
        Recipe::new("use_w", "Use W", int(1))
            .with_ingredient("w", 5)
            .with_product("other", 1),
        Recipe::new("make_w", "Make W", int(1)).with_product("w", 2),
    ]);
    let mut process = CraftingProcess::new("deficit");
    process.add_step_using(&catalog, "use_w".into(), id("other")).unwrap();
    assert_eq!(process.totals().count(&id("w")), int(-5));

    let candidate = process
        .push_step(&catalog, CraftingStep::new("make_w".into(), id("w")).with_factor(Rational::from(0)));
    let factor = process.match_demand(&catalog, candidate, &id("w")).unwrap();

    assert_eq!(factor, ratio(5, 2));
    assert_eq!(process.totals().count(&id("w")), int(0));
    assert!(process.totals().inputs().all(|(item, _)| item != &id("w")));
}

#[test]
fn changing_recipe_keeps_primary_output() {
    let catalog = letters_catalog(vec![
        Recipe::new("slow_x", "Slow X", int(1)).with_product("x", 2),
        Recipe::new("fast_x", "Fast X", int(1)).with_product("x", 5),
    ]);
    let mut process = CraftingProcess::new("swap");
    let step = process
        .add_step(&catalog, "slow_x".into(), &int(20), id("x"))
        .unwrap();
    assert_eq!(process.step(step).unwrap().factor, int(10));

    process.change_recipe(&catalog, step, "fast_x".into()).unwrap();

    assert_eq!(process.step(step).unwrap().factor, int(4));
    assert_eq!(process.totals().count(&id("x")), int(20));
}

// ===========================================================================
// Iron chain
// ===========================================================================

fn screw_process(catalog: &Catalog) -> CraftingProcess {
    let mut process = CraftingProcess::new("Screws");
    process
        .add_step(catalog, screw_recipe(), &int(40), screw())
        .unwrap();
    let rods = process
        .add_step_using(catalog, rod_recipe(), iron_rod())
        .unwrap();
    process.match_demand(catalog, rods, &iron_rod()).unwrap();
    let ingots = process
        .add_step_using(catalog, ingot_recipe(), iron_ingot())
        .unwrap();
    process.match_demand(catalog, ingots, &iron_ingot()).unwrap();
    process
}

#[test]
fn chained_demand_matching_leaves_only_ore() {
    let catalog = iron_catalog();
    let process = screw_process(&catalog);

    let totals = process.totals();
    assert_eq!(totals.count(&screw()), int(40));
    assert_eq!(totals.count(&iron_rod()), int(0));
    assert_eq!(totals.count(&iron_ingot()), int(0));
    assert_eq!(totals.count(&iron_ore()), int(-10));

    let inputs = totals.sorted_inputs(&catalog);
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].item.name, "Iron Ore");
    assert_eq!(inputs[0].resource_sink_points(), int(-10));
}

#[test]
fn buildings_and_clock_speeds() {
    let catalog = iron_catalog();
    let mut process = screw_process(&catalog);
    let ids: Vec<_> = process.steps().iter().map(|s| s.id).collect();

    // Screws: factor 10 at 6s per cycle needs exactly one constructor.
    let screws = process.step(ids[0]).unwrap();
    assert_eq!(screws.clock_speed(&catalog), int(1));
    assert_eq!(screws.clock_state(&catalog), ClockState::Nominal);

    // Rods: factor 10 at 4s per cycle runs one constructor at 2/3.
    let rods = process.step(ids[1]).unwrap();
    assert_eq!(rods.clock_speed(&catalog), ratio(2, 3));

    // Ingots: factor 10 at 2s per cycle, a third of a smelter.
    process
        .update_step(&catalog, ids[2], |step| step.is_built = true)
        .unwrap();

    let buildings = process.buildings_required(&catalog);
    assert_eq!(buildings[&constructor()], BuildingCount { placed: 0, total: 2 });
    assert_eq!(buildings[&smelter()], BuildingCount { placed: 1, total: 1 });
    assert_eq!(buildings[&smelter()].remaining(), 0);
}

#[test]
fn overclocked_steps_can_be_auto_sized() {
    let catalog = iron_catalog();
    let mut process = CraftingProcess::new("Plates");
    let plates = process
        .add_step(&catalog, plate_recipe(), &int(60), iron_plate())
        .unwrap();
    let step = process.step(plates).unwrap();
    // factor 30 at 6s per cycle is 3 machines' worth on one machine.
    assert_eq!(step.clock_speed(&catalog), int(3));
    assert_eq!(step.clock_state(&catalog), ClockState::Excessive);

    process
        .update_step(&catalog, plates, |step| step.auto_set_buildings(&catalog))
        .unwrap();
    let step = process.step(plates).unwrap();
    assert_eq!(step.buildings, 3);
    assert_eq!(step.clock_speed(&catalog), int(1));
}

#[test]
fn power_sums_fixed_and_variable_steps() {
    let catalog = iron_catalog();
    let mut process = CraftingProcess::new("Pasta");
    // Half a cycle per minute on a 120s recipe: one accelerator at 100%.
    process
        .add_step(&catalog, pasta_recipe(), &ratio(1, 2), nuclear_pasta())
        .unwrap();
    // 30 ingots per minute: one smelter at 100%.
    process
        .add_step(&catalog, ingot_recipe(), &int(30), iron_ingot())
        .unwrap();

    let power = process.power_consumption(&catalog);
    assert_eq!(power, PowerConsumption::range(504.0, 1504.0));
    assert_eq!(power.to_string(), "504 - 1504 MW");
}

#[test]
fn steps_without_producers_draw_no_power() {
    let catalog = Catalog::builder()
        .item(Item::new("x", "X"))
        .recipe(Recipe::new("hand", "By Hand", int(1)).with_product("x", 1))
        .build()
        .unwrap();
    let mut process = CraftingProcess::new("Handcrafted");
    let step = process.add_step_using(&catalog, "hand".into(), id("x")).unwrap();
    assert_eq!(process.step(step).unwrap().power_consumption(&catalog), None);
    assert_eq!(process.power_consumption(&catalog), PowerConsumption::default());
    assert!(process.buildings_required(&catalog).is_empty());
}

#[test]
fn fluid_amounts_use_real_units() {
    let catalog = iron_catalog();
    let mut process = CraftingProcess::new("Pure ingots");
    let step = process
        .add_step(&catalog, pure_ingot_recipe(), &int(65), iron_ingot())
        .unwrap();
    let step = process.step(step).unwrap();
    let recipe = catalog.recipe(&step.recipe);
    let water_item = catalog.item(&water());
    let water_stack = recipe.ingredients.iter().find(|s| s.item == water()).unwrap();

    // factor 5: 20,000 raw units of water are 20 m³.
    assert_eq!(step.scaled_amount(water_stack, &water_item), int(20));
    let inputs = process.totals().sorted_inputs(&catalog);
    let water_input = inputs.iter().find(|s| s.item.id == water()).unwrap();
    assert_eq!(water_input.real_amount(), int(-20));
}

#[test]
fn scale_to_produce_hits_requested_amount() {
    let catalog = iron_catalog();
    let mut process = screw_process(&catalog);
    process
        .scale_to_produce(&catalog, &screw(), &int(100))
        .unwrap();
    assert_eq!(process.totals().count(&screw()), int(100));
    assert_eq!(process.totals().count(&iron_ore()), int(-25));
}

#[test]
fn editing_an_ingredient_amount_solves_the_factor() {
    let catalog = iron_catalog();
    let mut process = CraftingProcess::new("Plates");
    let plates = process
        .add_step(&catalog, plate_recipe(), &int(20), iron_plate())
        .unwrap();
    let step = process.step(plates).unwrap();

    // The ingot ingredient is shown as a negative amount: -3 per unit factor.
    let multiplier = int(-3) * int(1);
    assert_eq!(&step.factor * &multiplier, int(-30));
    let factor = step.solve_factor_for(&int(-45), &multiplier);
    assert_eq!(factor, int(15));
    // Typing a positive amount keeps the factor's sign.
    assert_eq!(step.solve_factor_for(&int(45), &multiplier), int(15));

    process
        .update_step(&catalog, plates, |step| step.factor = factor)
        .unwrap();
    assert_eq!(process.totals().count(&iron_plate()), int(30));
}

// ===========================================================================
// Canonical recipes and placeholders
// ===========================================================================

#[test]
fn canonical_recipe_prefers_standard_recipes() {
    let catalog = iron_catalog();
    assert_eq!(catalog.canonical_recipe(&iron_ingot()).unwrap().id, ingot_recipe());
    assert_eq!(catalog.canonical_recipe(&screw()).unwrap().id, screw_recipe());
    assert!(catalog.canonical_recipe(&iron_ore()).is_none());
}

#[test]
fn unknown_recipes_contribute_nothing() {
    let catalog = iron_catalog();
    let mut process = CraftingProcess::new("Legacy");
    process.push_step(
        &catalog,
        CraftingStep::new(RecipeId::from("Recipe_Removed_C"), ItemId::from("Desc_Removed_C")),
    );
    assert!(process.totals().is_empty());
    assert!(process.buildings_required(&catalog).is_empty());
    assert_eq!(process.power_consumption(&catalog), PowerConsumption::default());
    assert_eq!(
        catalog.item(&ItemId::from("Desc_Removed_C")).name,
        "[Legacy] Removed"
    );
}

#[test]
fn totals_render_for_display() {
    let catalog = iron_catalog();
    let mut process = CraftingProcess::new("Rods");
    process
        .add_step(&catalog, rod_recipe(), &int(10), iron_rod())
        .unwrap();
    process.scale(&catalog, &ratio(1, 3));

    let rods = process.totals().count(&iron_rod());
    assert_eq!(FractionFormat::exact().format(&rods), "10/3");
    assert_eq!(FractionFormat::decimal().format(&rods), "3.333\u{332}");
    assert_eq!(
        FractionFormat::exact().with_sign(true).format(&rods),
        "+10/3"
    );
}
