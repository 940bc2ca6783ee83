//! Versioned JSON documents for saved processes.
//!
//! Saved processes are wrapped in a [`Document`] envelope carrying the format
//! version. Older envelopes are upgraded through the [`MigrationRegistry`]
//! before decoding. Data saved before the envelope existed has no version at
//! all; its version is found by probing the known schemas newest first.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{Catalog, Recipe};
use crate::id::{ItemId, RecipeId};
use crate::migration::{MigrationError, MigrationRegistry};
use crate::process::CraftingProcess;
use crate::rational::Rational;
use crate::step::CraftingStep;

/// Current on-disk format of [`CraftingProcess`].
pub const PROCESS_FORMAT_VERSION: u32 = 3;

/// A value tagged with the format version it was written in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document<T> {
    pub version: u32,
    pub value: T,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document version {found} is newer than the supported version {supported}")]
    FutureVersion { found: u32, supported: u32 },
    #[error("document matches no known process format: {0}")]
    Unrecognized(serde_json::Error),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Legacy schemas
// ---------------------------------------------------------------------------

/// Version 1: each step embeds its full recipe and an integer factor.
#[derive(Debug, Deserialize)]
struct ProcessV1 {
    name: String,
    steps: Vec<StepV1>,
}

#[derive(Debug, Deserialize)]
struct StepV1 {
    recipe: Recipe,
    factor: i64,
}

/// Version 2: steps reference recipes by id and carry a primary output and a
/// rational factor, but no machine count.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessV2 {
    name: String,
    steps: Vec<StepV2>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct StepV2 {
    recipe: RecipeId,
    primary_output: ItemId,
    factor: Rational,
}

fn upgrade_v1(value: Value) -> Result<Value, MigrationError> {
    let process: ProcessV1 = serde_json::from_value(value)?;
    let steps = process
        .steps
        .into_iter()
        .map(|step| {
            let primary_output = step
                .recipe
                .products
                .first()
                .map(|stack| stack.item.clone())
                .ok_or_else(|| MigrationError::MigrationFailed {
                    from: 1,
                    reason: format!("recipe {} has no products", step.recipe.id),
                })?;
            Ok(StepV2 {
                recipe: step.recipe.id,
                primary_output,
                factor: Rational::from(step.factor),
            })
        })
        .collect::<Result<Vec<_>, MigrationError>>()?;
    Ok(serde_json::to_value(ProcessV2 {
        name: process.name,
        steps,
    })?)
}

fn upgrade_v2(value: Value) -> Result<Value, MigrationError> {
    let process: ProcessV2 = serde_json::from_value(value)?;
    let steps = process
        .steps
        .into_iter()
        .map(|step| CraftingStep::new(step.recipe, step.primary_output).with_factor(step.factor))
        .collect();
    // Totals are left empty; loading recomputes them against the catalog.
    let upgraded = CraftingProcess::from_parts(process.name, steps);
    Ok(serde_json::to_value(upgraded)?)
}

/// Upgrades for every superseded process format.
pub fn process_migrations() -> MigrationRegistry {
    MigrationRegistry::new()
        .with(1, upgrade_v1)
        .with(2, upgrade_v2)
}

type Probe = fn(&Value) -> Result<(), serde_json::Error>;

fn probe<T: DeserializeOwned>(value: &Value) -> Result<(), serde_json::Error> {
    T::deserialize(value).map(|_| ())
}

/// Superseded schemas tried, newest first, on data without a version tag
/// that does not decode as the current format.
const LEGACY_PROBES: [(u32, Probe); 2] = [(2, probe::<ProcessV2>), (1, probe::<ProcessV1>)];

fn detect_version(value: &Value) -> Result<u32, DocumentError> {
    let current_error = match probe::<CraftingProcess>(value) {
        Ok(()) => return Ok(PROCESS_FORMAT_VERSION),
        Err(err) => err,
    };
    for (version, probe) in LEGACY_PROBES {
        match probe(value) {
            Ok(()) => return Ok(version),
            Err(err) => tracing::trace!(version, %err, "schema probe failed"),
        }
    }
    Err(DocumentError::Unrecognized(current_error))
}

/// Split a `{version, value}` envelope. Anything else is handed back.
fn split_envelope(value: Value) -> Result<(u32, Value), Value> {
    let version = match &value {
        Value::Object(object) if object.contains_key("value") => object
            .get("version")
            .and_then(Value::as_u64)
            .and_then(|version| u32::try_from(version).ok()),
        _ => None,
    };
    match (version, value) {
        (Some(version), Value::Object(mut object)) => {
            let body = object.remove("value").unwrap_or(Value::Null);
            Ok((version, body))
        }
        (_, value) => Err(value),
    }
}

// ---------------------------------------------------------------------------
// Loading and saving
// ---------------------------------------------------------------------------

/// Serialize `process` inside a current-version envelope.
pub fn save_process(process: &CraftingProcess) -> Result<String, DocumentError> {
    let document = Document {
        version: PROCESS_FORMAT_VERSION,
        value: process,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Decode a saved process in any known format and recompute its totals
/// against `catalog`.
pub fn load_process(json: &str, catalog: &Catalog) -> Result<CraftingProcess, DocumentError> {
    let value: Value = serde_json::from_str(json)?;

    let (version, body) = match split_envelope(value) {
        Ok(envelope) => envelope,
        Err(value) => {
            let version = detect_version(&value)?;
            tracing::debug!(version, "untagged process document");
            (version, value)
        }
    };

    if version > PROCESS_FORMAT_VERSION {
        return Err(DocumentError::FutureVersion {
            found: version,
            supported: PROCESS_FORMAT_VERSION,
        });
    }

    let current = process_migrations().migrate(body, version, PROCESS_FORMAT_VERSION)?;
    let mut process: CraftingProcess = serde_json::from_value(current)?;
    process.recompute(catalog);
    Ok(process)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Item;
    use serde_json::json;

    fn catalog() -> Catalog {
        Catalog::builder()
            .item(Item::new("ore", "Iron Ore"))
            .item(Item::new("ingot", "Iron Ingot"))
            .recipe(
                Recipe::new("ingot", "Iron Ingot", Rational::from(2))
                    .with_ingredient("ore", 1)
                    .with_product("ingot", 1),
            )
            .build()
            .unwrap()
    }

    fn v1_process() -> Value {
        json!({
            "name": "Old",
            "steps": [{
                "recipe": {
                    "id": "ingot",
                    "name": "Iron Ingot",
                    "ingredients": [{"item": "ore", "amount": 1}],
                    "products": [{"item": "ingot", "amount": 1}],
                    "craftingTime": 2
                },
                "factor": 4
            }],
            "totals": {"counts": {"ingot": 4, "ore": -4}}
        })
    }

    fn v2_process() -> Value {
        json!({
            "name": "Middle",
            "steps": [{"recipe": "ingot", "primaryOutput": "ingot", "factor": [3, 2]}]
        })
    }

    #[test]
    fn save_then_load_keeps_steps() {
        let catalog = catalog();
        let mut process = CraftingProcess::new("Ingots");
        process
            .add_step(&catalog, "ingot".into(), &Rational::from(30), "ingot".into())
            .unwrap();
        let json = save_process(&process).unwrap();
        assert!(json.contains("\"version\": 3"));

        let loaded = load_process(&json, &catalog).unwrap();
        assert_eq!(loaded, process);
    }

    #[test]
    fn load_recomputes_stale_totals() {
        let catalog = catalog();
        let mut process = CraftingProcess::new("Ingots");
        process
            .add_step_using(&catalog, "ingot".into(), "ingot".into())
            .unwrap();
        let mut value = serde_json::to_value(Document {
            version: PROCESS_FORMAT_VERSION,
            value: &process,
        })
        .unwrap();
        value["value"]["totals"] = json!({"counts": {"ingot": [99, 1]}});

        let loaded = load_process(&value.to_string(), &catalog).unwrap();
        assert_eq!(loaded.totals().count(&"ingot".into()), Rational::from(1));
    }

    #[test]
    fn load_restores_minimum_building_count() {
        let catalog = catalog();
        let mut process = CraftingProcess::new("Ingots");
        process
            .add_step_using(&catalog, "ingot".into(), "ingot".into())
            .unwrap();
        let mut value = serde_json::to_value(Document {
            version: PROCESS_FORMAT_VERSION,
            value: &process,
        })
        .unwrap();
        value["value"]["steps"][0]["buildings"] = json!(0);
        value["value"]["steps"][0]["isBuilt"] = json!(true);

        let loaded = load_process(&value.to_string(), &catalog).unwrap();
        assert_eq!(loaded.steps()[0].buildings, 1);
    }

    #[test]
    fn tagged_v1_is_upgraded() {
        let catalog = catalog();
        let doc = json!({"version": 1, "value": v1_process()});
        let process = load_process(&doc.to_string(), &catalog).unwrap();
        assert_eq!(process.name, "Old");
        let step = &process.steps()[0];
        assert_eq!(step.primary_output.as_str(), "ingot");
        assert_eq!(step.factor, Rational::from(4));
        assert_eq!(step.buildings, 1);
        assert!(!step.is_built);
        assert_eq!(process.totals().count(&"ore".into()), Rational::from(-4));
    }

    #[test]
    fn untagged_data_is_probed_newest_first() {
        let catalog = catalog();
        assert_eq!(detect_version(&v1_process()).unwrap(), 1);
        assert_eq!(detect_version(&v2_process()).unwrap(), 2);

        let process = load_process(&v2_process().to_string(), &catalog).unwrap();
        assert_eq!(process.steps()[0].factor, Rational::new(3, 2).unwrap());

        let process = load_process(&v1_process().to_string(), &catalog).unwrap();
        assert_eq!(process.steps()[0].factor, Rational::from(4));
    }

    #[test]
    fn future_versions_are_rejected() {
        let doc = json!({"version": 9, "value": v2_process()});
        let err = load_process(&doc.to_string(), &catalog()).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::FutureVersion { found: 9, supported: 3 }
        ));
    }

    #[test]
    fn garbage_is_unrecognized() {
        let err = load_process(r#"{"hello": "world"}"#, &catalog()).unwrap_err();
        assert!(matches!(err, DocumentError::Unrecognized(_)));
        assert!(matches!(
            load_process("not json", &catalog()),
            Err(DocumentError::Json(_))
        ));
    }

    #[test]
    fn v1_recipe_without_products_fails_migration() {
        let mut value = v1_process();
        value["steps"][0]["recipe"]["products"] = json!([]);
        let doc = json!({"version": 1, "value": value});
        let err = load_process(&doc.to_string(), &catalog()).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Migration(MigrationError::MigrationFailed { from: 1, .. })
        ));
    }
}
