//! Deterministic choice among several recipes producing the same item.

use crate::catalog::{Catalog, Item, Recipe};
use crate::id::ItemId;

/// Narrow `candidates` through the tie-break predicates in order. A predicate
/// that would eliminate every remaining candidate is skipped. Catalog order
/// is preserved in the result.
pub fn narrow_candidates<'a>(item: &Item, candidates: &[&'a Recipe]) -> Vec<&'a Recipe> {
    let predicates: [&dyn Fn(&Recipe) -> bool; 3] = [
        &|recipe: &Recipe| recipe.name == item.name,
        &|recipe: &Recipe| !recipe.is_alternate(),
        &|recipe: &Recipe| recipe.products.len() == 1 && recipe.products[0].item == item.id,
    ];

    let mut remaining = candidates.to_vec();
    for predicate in predicates {
        let narrowed: Vec<_> = remaining.iter().copied().filter(|&recipe| predicate(recipe)).collect();
        if !narrowed.is_empty() {
            remaining = narrowed;
        }
        if remaining.len() == 1 {
            break;
        }
    }
    remaining
}

/// The preferred recipe for `item`, or `None` when nothing produces it. When
/// the tie-breaks leave several candidates the first in catalog order wins.
pub fn canonical_recipe<'c>(catalog: &'c Catalog, item: &ItemId) -> Option<&'c Recipe> {
    let candidates: Vec<&Recipe> = catalog.recipes_producing(item).collect();
    if candidates.len() <= 1 {
        return candidates.into_iter().next();
    }

    let record = catalog.item(item);
    let remaining = narrow_candidates(&record, &candidates);
    if remaining.len() > 1 {
        tracing::warn!(
            %item,
            candidates = ?remaining.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            "ambiguous canonical recipe, taking the first"
        );
    }
    remaining.into_iter().next()
}

impl Catalog {
    /// See [`canonical_recipe`].
    pub fn canonical_recipe(&self, item: &ItemId) -> Option<&Recipe> {
        canonical_recipe(self, item)
    }
}
