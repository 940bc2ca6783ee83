//! Resolution pipeline: reads data files, resolves cross-references, builds
//! the catalog.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and the
//! deserialization helpers shared by catalog and config loading.

use std::path::{Path, PathBuf};

use plannery_core::catalog::{Catalog, CatalogError, Item, Producer, Recipe};
use serde::de::DeserializeOwned;

use crate::schema::{CatalogData, ItemData, ProducerData, RecipeData};

/// Base name looked up when a catalog path points at a directory.
pub const CATALOG_BASE_NAME: &str = "catalog";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// An identifier reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate identifier was found.
    #[error("duplicate {kind} '{name}' in {file}")]
    DuplicateName {
        file: PathBuf,
        name: String,
        kind: &'static str,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize already-read content in the given format. `path` is only used
/// for error reporting.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    path: &Path,
) -> Result<T, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Catalog loading
// ===========================================================================

/// Load a catalog from a file, or from `catalog.{ron,toml,json}` when `path`
/// is a directory.
pub fn load_catalog(path: &Path) -> Result<Catalog, DataLoadError> {
    let file = if path.is_dir() {
        require_data_file(path, CATALOG_BASE_NAME)?
    } else {
        path.to_path_buf()
    };
    let data: CatalogData = deserialize_file(&file)?;
    tracing::debug!(
        file = %file.display(),
        items = data.items.len(),
        recipes = data.recipes.len(),
        producers = data.producers.len(),
        "catalog file read"
    );
    resolve_catalog(data, &file)
}

/// Convert data-file records into a validated [`Catalog`].
pub fn resolve_catalog(data: CatalogData, file: &Path) -> Result<Catalog, DataLoadError> {
    let mut builder = Catalog::builder();
    for item in data.items {
        builder.register_item(resolve_item(item));
    }
    for producer in data.producers {
        builder.register_producer(resolve_producer(producer));
    }
    for recipe in data.recipes {
        builder.register_recipe(resolve_recipe(recipe));
    }
    builder
        .build()
        .map_err(|error| catalog_error(error, file))
}

fn resolve_item(data: ItemData) -> Item {
    let mut item = Item::new(data.id, data.name);
    item.description = data.description;
    item.resource_sink_points = data.sink_points;
    item.is_fluid = data.fluid;
    item
}

fn resolve_producer(data: ProducerData) -> Producer {
    let mut producer =
        Producer::new(data.id, data.name, data.power).with_exponent(data.power_exponent);
    producer.description = data.description;
    producer.variable_power_consumption = data.variable_power;
    producer
}

fn resolve_recipe(data: RecipeData) -> Recipe {
    let power = data.variable_power();
    let mut recipe = Recipe::new(data.id, data.name, data.crafting_time);
    for stack in &data.ingredients {
        recipe = recipe.with_ingredient(stack.item(), stack.amount());
    }
    for stack in &data.products {
        recipe = recipe.with_product(stack.item(), stack.amount());
    }
    for producer in data.produced_in {
        recipe = recipe.produced_in(producer);
    }
    recipe.with_variable_power(power.constant, power.factor)
}

fn catalog_error(error: CatalogError, file: &Path) -> DataLoadError {
    let duplicate = |name: String, kind: &'static str| DataLoadError::DuplicateName {
        file: file.to_path_buf(),
        name,
        kind,
    };
    match error {
        CatalogError::DuplicateItem(id) => duplicate(id.to_string(), "item"),
        CatalogError::DuplicateRecipe(id) => duplicate(id.to_string(), "recipe"),
        CatalogError::DuplicateProducer(id) => duplicate(id.to_string(), "producer"),
        CatalogError::UnknownItem { item, .. } => DataLoadError::UnresolvedRef {
            file: file.to_path_buf(),
            name: item.to_string(),
            expected_kind: "item",
        },
    }
}
