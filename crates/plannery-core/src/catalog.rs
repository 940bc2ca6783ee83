//! Read-only game catalog: items, recipes and producers.
//!
//! A [`Catalog`] is assembled once through a [`CatalogBuilder`] and frozen.
//! Lookups that miss resolve to placeholder records (see [`Catalog::item`])
//! so that stale identifiers in saved processes never fail a calculation.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::{ItemId, ProducerId, RecipeId};
use crate::rational::Rational;

const RECIPE_ALTERNATE_PREFIX: &str = "Alternate:";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resource_sink_points: i64,
    #[serde(default)]
    pub is_fluid: bool,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(id),
            name: name.into(),
            description: String::new(),
            resource_sink_points: 0,
            is_fluid: false,
        }
    }

    /// Conversion from raw recipe amounts to real-world units: fluids are
    /// stored in thousandths.
    pub fn multiplier(&self) -> Rational {
        if self.is_fluid {
            Rational::new(1, 1000).unwrap_or_default()
        } else {
            Rational::from(1)
        }
    }

    pub fn placeholder(id: &ItemId) -> Self {
        Self {
            id: id.clone(),
            name: placeholder_name(id.as_str()),
            description: "This item used to exist, but is no longer part of the game.".into(),
            resource_sink_points: 0,
            is_fluid: false,
        }
    }
}

/// An item and a signed raw amount, as listed by a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemId,
    pub amount: i64,
}

impl ItemStack {
    pub fn new(item: impl Into<String>, amount: i64) -> Self {
        Self {
            item: ItemId::new(item),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<ItemStack>,
    #[serde(default)]
    pub products: Vec<ItemStack>,
    /// Seconds per cycle.
    pub crafting_time: Rational,
    #[serde(default)]
    pub produced_in: Vec<ProducerId>,
    #[serde(default)]
    pub variable_power_consumption_constant: i64,
    #[serde(default = "default_variable_power_factor")]
    pub variable_power_consumption_factor: i64,
}

fn default_variable_power_factor() -> i64 {
    1
}

impl Recipe {
    pub fn new(id: impl Into<String>, name: impl Into<String>, crafting_time: Rational) -> Self {
        Self {
            id: RecipeId::new(id),
            name: name.into(),
            ingredients: Vec::new(),
            products: Vec::new(),
            crafting_time,
            produced_in: Vec::new(),
            variable_power_consumption_constant: 0,
            variable_power_consumption_factor: 1,
        }
    }

    pub fn with_ingredient(mut self, item: impl Into<String>, amount: i64) -> Self {
        self.ingredients.push(ItemStack::new(item, amount));
        self
    }

    pub fn with_product(mut self, item: impl Into<String>, amount: i64) -> Self {
        self.products.push(ItemStack::new(item, amount));
        self
    }

    pub fn produced_in(mut self, producer: impl Into<String>) -> Self {
        self.produced_in.push(ProducerId::new(producer));
        self
    }

    pub fn with_variable_power(mut self, constant: i64, factor: i64) -> Self {
        self.variable_power_consumption_constant = constant;
        self.variable_power_consumption_factor = factor;
        self
    }

    /// Amount of `item` produced per cycle; zero when not a product.
    pub fn production(&self, item: &ItemId) -> i64 {
        amount_of(&self.products, item)
    }

    /// Amount of `item` consumed per cycle; zero when not an ingredient.
    pub fn consumption(&self, item: &ItemId) -> i64 {
        amount_of(&self.ingredients, item)
    }

    pub fn net_production(&self, item: &ItemId) -> i64 {
        self.production(item) - self.consumption(item)
    }

    pub fn produces(&self, item: &ItemId) -> bool {
        self.products.iter().any(|stack| &stack.item == item)
    }

    pub fn product(&self, item: &ItemId) -> Option<&ItemStack> {
        self.products.iter().find(|stack| &stack.item == item)
    }

    pub fn is_alternate(&self) -> bool {
        self.name.starts_with(RECIPE_ALTERNATE_PREFIX)
    }

    /// The single catalog producer able to run this recipe. `None` when no
    /// listed producer is known, or when several are.
    pub fn producer<'c>(&self, catalog: &'c Catalog) -> Option<&'c Producer> {
        let mut known = self
            .produced_in
            .iter()
            .filter_map(|id| catalog.get_producer(id));
        match (known.next(), known.next()) {
            (Some(producer), None) => Some(producer),
            _ => None,
        }
    }

    /// Whether power draw follows the recipe's variable-power model rather
    /// than the producer's fixed consumption.
    pub fn uses_variable_power(&self, producer: &Producer) -> bool {
        producer.variable_power_consumption || self.variable_power_consumption_factor > 1
    }

    pub fn placeholder(id: &RecipeId) -> Self {
        Self {
            id: id.clone(),
            name: placeholder_name(id.as_str()),
            ingredients: Vec::new(),
            products: Vec::new(),
            crafting_time: Rational::from(1),
            produced_in: Vec::new(),
            variable_power_consumption_constant: 0,
            variable_power_consumption_factor: 1,
        }
    }
}

fn amount_of(stacks: &[ItemStack], item: &ItemId) -> i64 {
    stacks
        .iter()
        .filter(|stack| &stack.item == item)
        .map(|stack| stack.amount)
        .sum()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Producer {
    pub id: ProducerId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Megawatts at 100% clock speed.
    pub power_consumption: Rational,
    /// Applied to the clock speed when scaling power draw.
    pub power_consumption_exponent: Rational,
    #[serde(default)]
    pub variable_power_consumption: bool,
}

impl Producer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, power_consumption: Rational) -> Self {
        Self {
            id: ProducerId::new(id),
            name: name.into(),
            description: String::new(),
            power_consumption,
            power_consumption_exponent: Rational::from(1),
            variable_power_consumption: false,
        }
    }

    pub fn with_exponent(mut self, exponent: Rational) -> Self {
        self.power_consumption_exponent = exponent;
        self
    }

    pub fn placeholder(id: &ProducerId) -> Self {
        Self {
            id: id.clone(),
            name: placeholder_name(id.as_str()),
            description: "This producer used to exist, but is no longer part of the game.".into(),
            power_consumption: Rational::from(0),
            power_consumption_exponent: Rational::from(1),
            variable_power_consumption: false,
        }
    }
}

/// `"[Legacy] IronPlate"` for `Desc_IronPlate_C`, otherwise the raw id.
fn placeholder_name(raw: &str) -> String {
    let name = raw
        .strip_prefix("Desc_")
        .and_then(|rest| rest.strip_suffix("_C"))
        .filter(|inner| !inner.is_empty())
        .unwrap_or(raw);
    format!("[Legacy] {name}")
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects catalog records, then validates and freezes them.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    items: Vec<Item>,
    recipes: Vec<Recipe>,
    producers: Vec<Producer>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn recipe(mut self, recipe: Recipe) -> Self {
        self.recipes.push(recipe);
        self
    }

    pub fn producer(mut self, producer: Producer) -> Self {
        self.producers.push(producer);
        self
    }

    pub fn register_item(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn register_recipe(&mut self, recipe: Recipe) {
        self.recipes.push(recipe);
    }

    pub fn register_producer(&mut self, producer: Producer) {
        self.producers.push(producer);
    }

    /// Validate and freeze. Duplicate identifiers and recipe stacks naming
    /// unknown items are rejected; unknown producers are only logged, since
    /// [`Recipe::producer`] already ignores them.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let item_index = index_by(&self.items, |item| &item.id, CatalogError::DuplicateItem)?;
        let recipe_index =
            index_by(&self.recipes, |recipe| &recipe.id, CatalogError::DuplicateRecipe)?;
        let producer_index = index_by(
            &self.producers,
            |producer| &producer.id,
            CatalogError::DuplicateProducer,
        )?;

        for recipe in &self.recipes {
            for stack in recipe.ingredients.iter().chain(recipe.products.iter()) {
                if !item_index.contains_key(&stack.item) {
                    return Err(CatalogError::UnknownItem {
                        recipe: recipe.id.clone(),
                        item: stack.item.clone(),
                    });
                }
            }
            for producer in &recipe.produced_in {
                if !producer_index.contains_key(producer) {
                    tracing::warn!(recipe = %recipe.id, %producer, "recipe lists an unknown producer");
                }
            }
        }

        tracing::debug!(
            items = self.items.len(),
            recipes = self.recipes.len(),
            producers = self.producers.len(),
            "catalog built"
        );

        Ok(Catalog {
            items: self.items,
            item_index,
            recipes: self.recipes,
            recipe_index,
            producers: self.producers,
            producer_index,
        })
    }
}

fn index_by<T, K: Clone + Eq + std::hash::Hash>(
    records: &[T],
    key: impl Fn(&T) -> &K,
    duplicate: impl Fn(K) -> CatalogError,
) -> Result<HashMap<K, usize>, CatalogError> {
    let mut index = HashMap::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        let id = key(record);
        if index.insert(id.clone(), position).is_some() {
            return Err(duplicate(id.clone()));
        }
    }
    Ok(index)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable catalog. Frozen after [`CatalogBuilder::build`]; safe to share
/// between threads for reading.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
    item_index: HashMap<ItemId, usize>,
    recipes: Vec<Recipe>,
    recipe_index: HashMap<RecipeId, usize>,
    producers: Vec<Producer>,
    producer_index: HashMap<ProducerId, usize>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    pub fn get_item(&self, id: &ItemId) -> Option<&Item> {
        self.item_index.get(id).map(|&i| &self.items[i])
    }

    pub fn get_recipe(&self, id: &RecipeId) -> Option<&Recipe> {
        self.recipe_index.get(id).map(|&i| &self.recipes[i])
    }

    pub fn get_producer(&self, id: &ProducerId) -> Option<&Producer> {
        self.producer_index.get(id).map(|&i| &self.producers[i])
    }

    /// The item record, or a placeholder when the id is unknown.
    pub fn item(&self, id: &ItemId) -> Cow<'_, Item> {
        match self.get_item(id) {
            Some(item) => Cow::Borrowed(item),
            None => {
                tracing::warn!(item = %id, "unknown item, using placeholder");
                Cow::Owned(Item::placeholder(id))
            }
        }
    }

    /// The recipe record, or a placeholder when the id is unknown.
    pub fn recipe(&self, id: &RecipeId) -> Cow<'_, Recipe> {
        match self.get_recipe(id) {
            Some(recipe) => Cow::Borrowed(recipe),
            None => {
                tracing::warn!(recipe = %id, "unknown recipe, using placeholder");
                Cow::Owned(Recipe::placeholder(id))
            }
        }
    }

    /// The producer record, or a placeholder when the id is unknown.
    pub fn producer(&self, id: &ProducerId) -> Cow<'_, Producer> {
        match self.get_producer(id) {
            Some(producer) => Cow::Borrowed(producer),
            None => {
                tracing::warn!(producer = %id, "unknown producer, using placeholder");
                Cow::Owned(Producer::placeholder(id))
            }
        }
    }

    /// Items in catalog order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Recipes in catalog order.
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Producers in catalog order.
    pub fn producers(&self) -> &[Producer] {
        &self.producers
    }

    /// Every recipe listing `item` among its products, in catalog order.
    pub fn recipes_producing<'a>(&'a self, item: &ItemId) -> impl Iterator<Item = &'a Recipe> {
        self.recipes.iter().filter(move |recipe| recipe.produces(item))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate item id: {0}")]
    DuplicateItem(ItemId),
    #[error("duplicate recipe id: {0}")]
    DuplicateRecipe(RecipeId),
    #[error("duplicate producer id: {0}")]
    DuplicateProducer(ProducerId),
    #[error("recipe {recipe} references unknown item {item}")]
    UnknownItem { recipe: RecipeId, item: ItemId },
}
