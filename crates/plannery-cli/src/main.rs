use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use plannery_core::catalog::Catalog;
use plannery_core::document::load_process;
use plannery_core::format::FractionFormat;
use plannery_core::id::ItemId;
use plannery_core::process::CraftingProcess;
use plannery_core::rational::Rational;
use plannery_data::{PlannerConfig, load_catalog};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "plannery", version, about = "Exact production planning for factory games")]
struct Cli {
    /// Config file. Defaults to plannery.{toml,ron,json} in the working directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the totals, machines and power of a saved process.
    Report {
        #[arg(long)]
        process: PathBuf,
        /// Catalog file or directory. Overrides the config file.
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Show rounded decimals instead of exact fractions.
        #[arg(long)]
        decimal: bool,
    },
    /// List the recipes producing an item, marking the standard one.
    Recipes {
        #[arg(long)]
        item: String,
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Parse a number and print it exactly and as a decimal.
    Parse { value: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PlannerConfig::load(path),
        None => PlannerConfig::discover(Path::new(".")),
    }
    .context("loading config")?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .with_context(|| format!("invalid log filter '{}'", config.log_filter))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let output = match cli.command {
        Commands::Report {
            process,
            catalog,
            decimal,
        } => {
            let catalog = open_catalog(catalog.as_deref(), &config)?;
            let json = std::fs::read_to_string(&process)
                .with_context(|| format!("reading {}", process.display()))?;
            let process = load_process(&json, &catalog)
                .with_context(|| format!("loading process {}", process.display()))?;
            let mut format = config.fraction_format();
            format.use_decimal_format |= decimal;
            render_report(&process, &catalog, &format)
        }
        Commands::Recipes { item, catalog } => {
            let catalog = open_catalog(catalog.as_deref(), &config)?;
            render_recipes(&catalog, &ItemId::new(item))
        }
        Commands::Parse { value } => render_parse(&value, &config)?,
    };
    print!("{output}");
    Ok(())
}

fn open_catalog(flag: Option<&Path>, config: &PlannerConfig) -> Result<Catalog> {
    let Some(path) = flag.or(config.catalog.as_deref()) else {
        bail!("no catalog given: pass --catalog or set `catalog` in the config file");
    };
    let catalog =
        load_catalog(path).with_context(|| format!("loading catalog {}", path.display()))?;
    tracing::info!(
        items = catalog.items().len(),
        recipes = catalog.recipes().len(),
        "catalog loaded"
    );
    Ok(catalog)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_report(process: &CraftingProcess, catalog: &Catalog, format: &FractionFormat) -> String {
    let mut out = String::new();
    let signed = format.clone().with_sign(true);
    let _ = writeln!(out, "{} ({} steps)", process.name, process.steps().len());

    let _ = writeln!(out, "\nOutputs:");
    for stack in process.totals().sorted_outputs(catalog) {
        let _ = writeln!(out, "  {:>12}  {}", signed.format(&stack.real_amount()), stack.item.name);
    }

    let _ = writeln!(out, "\nInputs:");
    for stack in process.totals().sorted_inputs(catalog) {
        let _ = writeln!(out, "  {:>12}  {}", format.format(&stack.real_amount()), stack.item.name);
    }

    let buildings = process.buildings_required(catalog);
    if !buildings.is_empty() {
        let _ = writeln!(out, "\nBuildings:");
        for (producer, count) in &buildings {
            let name = catalog.producer(producer).name.clone();
            let _ = writeln!(
                out,
                "  {:>4} {}  ({} remaining)",
                count.total,
                name,
                count.remaining()
            );
        }
    }

    let _ = writeln!(out, "\nPower: {}", process.power_consumption(catalog));
    out
}

fn render_recipes(catalog: &Catalog, item: &ItemId) -> String {
    let canonical = catalog.canonical_recipe(item).map(|recipe| recipe.id.clone());
    let mut out = String::new();
    for recipe in catalog.recipes_producing(item) {
        let marker = if Some(&recipe.id) == canonical.as_ref() {
            "*"
        } else {
            " "
        };
        let _ = writeln!(
            out,
            "{marker} {}  [{}]  {} per cycle",
            recipe.name,
            recipe.id,
            recipe.production(item)
        );
    }
    if out.is_empty() {
        let _ = writeln!(out, "no recipe produces {}", catalog.item(item).name);
    }
    out
}

fn render_parse(value: &str, config: &PlannerConfig) -> Result<String> {
    let format = config.fraction_format();
    let parsed: Rational = format
        .parse(value)
        .with_context(|| format!("'{value}' is not a number"))?;
    let exact = FractionFormat {
        use_decimal_format: false,
        ..format.clone()
    };
    let decimal = FractionFormat {
        use_decimal_format: true,
        ..format
    };
    Ok(format!(
        "exact:   {}\ndecimal: {}\n",
        exact.format(&parsed),
        decimal.format(&parsed)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plannery_core::test_utils::*;

    fn screw_process(catalog: &Catalog) -> CraftingProcess {
        let mut process = CraftingProcess::new("Screws");
        process
            .add_step(catalog, screw_recipe(), &int(40), screw())
            .unwrap();
        process
    }

    #[test]
    fn report_lists_outputs_inputs_and_power() {
        let catalog = iron_catalog();
        let process = screw_process(&catalog);
        let report = render_report(&process, &catalog, &FractionFormat::exact());

        assert!(report.starts_with("Screws (1 steps)"));
        assert!(report.contains("+40  Screw"));
        assert!(report.contains("-10  Iron Rod"));
        assert!(report.contains("Constructor  (1 remaining)"));
        assert!(report.contains("Power: "));
    }

    #[test]
    fn recipes_marks_the_standard_recipe() {
        let catalog = iron_catalog();
        let listing = render_recipes(&catalog, &screw());
        let lines: Vec<_> = listing.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("* Screw"));
        assert!(lines[1].starts_with("  Alternate: Cast Screw"));
    }

    #[test]
    fn recipes_for_unproduced_item() {
        let catalog = iron_catalog();
        assert_eq!(
            render_recipes(&catalog, &iron_ore()),
            "no recipe produces Iron Ore\n"
        );
    }

    #[test]
    fn parse_prints_both_renderings() {
        let output = render_parse("1/3", &PlannerConfig::default()).unwrap();
        assert_eq!(output, "exact:   1/3\ndecimal: 0.3333\u{332}\n");
        assert!(render_parse("abc", &PlannerConfig::default()).is_err());
    }
}
