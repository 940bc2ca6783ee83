//! Serde data file structs for catalog content.
//!
//! These structs define the on-disk format for items, recipes and producers.
//! They are deserialized from RON, JSON, or TOML data files and then resolved
//! into core catalog records by the loader.

use plannery_core::rational::Rational;
use serde::Deserialize;

/// Top-level catalog file: three lists, each optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogData {
    pub items: Vec<ItemData>,
    pub recipes: Vec<RecipeData>,
    pub producers: Vec<ProducerData>,
}

// ===========================================================================
// Items
// ===========================================================================

/// An item definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "resourceSinkPoints")]
    pub sink_points: i64,
    /// Fluid amounts are stored in thousandths.
    #[serde(default, alias = "isFluid")]
    pub fluid: bool,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe ingredient or product entry, supporting both the short tuple
/// form and the full keyed form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StackData {
    /// Short form: `("item_id", amount)`.
    Short(String, i64),
    /// Full form: `{ item = "item_id", amount = 3 }`.
    Full { item: String, amount: i64 },
}

impl StackData {
    pub fn item(&self) -> &str {
        match self {
            StackData::Short(item, _) | StackData::Full { item, .. } => item,
        }
    }

    pub fn amount(&self) -> i64 {
        match self {
            StackData::Short(_, amount) | StackData::Full { amount, .. } => *amount,
        }
    }
}

/// Linear power model for machines whose draw varies over a cycle, written
/// as a nested table. The flat recipe fields are the usual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct VariablePowerData {
    pub constant: i64,
    pub factor: i64,
}

/// A recipe definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<StackData>,
    #[serde(default)]
    pub products: Vec<StackData>,
    /// Seconds per cycle. Integers, decimals and `"N/D"` strings are accepted.
    #[serde(alias = "craftingTime")]
    pub crafting_time: Rational,
    #[serde(default, alias = "producedIn")]
    pub produced_in: Vec<String>,
    #[serde(default, alias = "variablePowerConsumptionConstant")]
    pub variable_power_consumption_constant: i64,
    #[serde(
        default = "default_variable_power_factor",
        alias = "variablePowerConsumptionFactor"
    )]
    pub variable_power_consumption_factor: i64,
    /// Takes precedence over the flat fields when present.
    #[serde(default, alias = "variablePower")]
    pub variable_power: Option<VariablePowerData>,
}

fn default_variable_power_factor() -> i64 {
    1
}

impl RecipeData {
    /// `(constant, factor)` of the recipe's variable power model.
    pub fn variable_power(&self) -> VariablePowerData {
        self.variable_power.unwrap_or(VariablePowerData {
            constant: self.variable_power_consumption_constant,
            factor: self.variable_power_consumption_factor,
        })
    }
}

// ===========================================================================
// Producers
// ===========================================================================

/// A producer (machine) definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProducerData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Megawatts at 100% clock speed.
    #[serde(alias = "powerConsumption")]
    pub power: Rational,
    #[serde(default = "default_power_exponent", alias = "powerConsumptionExponent")]
    pub power_exponent: Rational,
    #[serde(default, alias = "variablePowerConsumption")]
    pub variable_power: bool,
}

fn default_power_exponent() -> Rational {
    Rational::from(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_short_and_full_forms_agree() {
        let short: StackData = serde_json::from_str(r#"["Desc_OreIron_C", 3]"#).unwrap();
        let full: StackData =
            serde_json::from_str(r#"{"item": "Desc_OreIron_C", "amount": 3}"#).unwrap();
        assert_eq!(short.item(), full.item());
        assert_eq!(short.amount(), full.amount());
    }

    #[test]
    fn recipe_from_ron() {
        let recipe: RecipeData = ron::from_str(
            r#"(
                id: "Recipe_IronPlate_C",
                name: "Iron Plate",
                ingredients: [("Desc_IronIngot_C", 3)],
                products: [("Desc_IronPlate_C", 2)],
                crafting_time: 6,
                produced_in: ["Build_ConstructorMk1_C"],
            )"#,
        )
        .unwrap();
        assert_eq!(recipe.ingredients[0].amount(), 3);
        assert_eq!(recipe.products[0].item(), "Desc_IronPlate_C");
        assert_eq!(recipe.crafting_time, Rational::from(6));
        assert_eq!(
            recipe.variable_power(),
            VariablePowerData {
                constant: 0,
                factor: 1
            }
        );
    }

    #[test]
    fn variable_power_flat_fields() {
        let recipe: RecipeData = serde_json::from_str(
            r#"{
                "id": "Recipe_Nuclear_Pasta_C",
                "name": "Nuclear Pasta",
                "craftingTime": 120,
                "producedIn": ["Build_HadronCollider_C"],
                "variablePowerConsumptionConstant": 500,
                "variablePowerConsumptionFactor": 1000
            }"#,
        )
        .unwrap();
        assert_eq!(
            recipe.variable_power(),
            VariablePowerData {
                constant: 500,
                factor: 1000
            }
        );
    }

    #[test]
    fn nested_variable_power_overrides_flat_fields() {
        let recipe: RecipeData = toml::from_str(
            r#"
            id = "Recipe_Nuclear_Pasta_C"
            name = "Nuclear Pasta"
            crafting_time = 120
            variable_power_consumption_constant = 1
            variable_power = { constant = 250, factor = 750 }
            "#,
        )
        .unwrap();
        assert_eq!(recipe.variable_power().constant, 250);
        assert_eq!(recipe.variable_power().factor, 750);
    }

    #[test]
    fn producer_from_toml_defaults_exponent() {
        let producer: ProducerData = toml::from_str(
            r#"
            id = "Build_SmelterMk1_C"
            name = "Smelter"
            power = "4"
            "#,
        )
        .unwrap();
        assert_eq!(producer.power, Rational::from(4));
        assert_eq!(producer.power_exponent, Rational::from(1));
        assert!(!producer.variable_power);
    }

    #[test]
    fn camel_case_aliases_accepted() {
        let item: ItemData = serde_json::from_str(
            r#"{"id": "Desc_Water_C", "name": "Water", "isFluid": true, "resourceSinkPoints": 0}"#,
        )
        .unwrap();
        assert!(item.fluid);
    }
}
