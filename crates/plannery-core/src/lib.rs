//! Plannery Core -- exact-rational production planning for factory games.
//!
//! Given a read-only catalog of items, recipes and producers, a process is an
//! ordered list of weighted recipe applications ("steps"). The engine keeps
//! the process-wide surplus and deficit of every item consistent after each
//! edit, and derives machine counts, clock speeds and power draw from it.
//!
//! Every quantity is an exact fraction ([`rational::Rational`]) until it is
//! deliberately formatted for display ([`format::FractionFormat`]).
//!
//! # Editing Pattern
//!
//! Mutations take the catalog and recompute totals before they return:
//!
//! ```rust,ignore
//! let step = process.add_step(&catalog, recipe, &amount, item)?;
//! process.update_step(&catalog, step, |step| step.buildings = 4)?;
//! let deficit = process.totals().count(&ore);
//! ```
//!
//! # Key Types
//!
//! - [`rational::Rational`] -- Arbitrary-precision fraction, always reduced.
//! - [`catalog::Catalog`] -- Immutable item, recipe and producer tables with
//!   placeholder fallback for unknown identifiers.
//! - [`bag::ItemBag`] -- Signed per-item ledger of surpluses and deficits.
//! - [`step::CraftingStep`] -- Recipe, primary output, factor and machines.
//! - [`process::CraftingProcess`] -- Ordered steps with cached totals.
//! - [`folder::ProcessFolder`] -- Tree of processes with aggregate totals.
//! - [`document`] -- Versioned JSON save format with migrations.

pub mod bag;
pub mod canonical;
pub mod catalog;
pub mod document;
pub mod error;
pub mod folder;
pub mod format;
pub mod id;
pub mod migration;
pub mod power;
pub mod process;
pub mod rational;
pub mod step;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
