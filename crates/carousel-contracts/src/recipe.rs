//! Product recipes: how many components a product absorbs and which
//! operation sequence finishes it.
//!
//! The catalog is built once at startup (from configuration or the standard
//! table) and never mutated for the lifetime of the run.

use serde::{Deserialize, Serialize};

use crate::error::{CarouselError, CarouselResult};
use crate::item::{Operation, ProductKind};

/// A robot may hold at most this many components of one kind; absorbing the
/// component that reaches the recipe's required count assembles a product
/// and resets the count, so the cap is only reachable for a 3-component
/// recipe one pickup away from assembly.
pub const COMPONENT_CAP: u32 = 3;

/// The immutable definition of one product kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub kind: ProductKind,
    /// Components absorbed before the product exists (1..=3).
    pub components_required: u32,
    /// Ordered operation sequence; `ops[0]` is performed at assembly when the
    /// assembling robot's primary operation matches it.
    pub ops: Vec<Operation>,
}

impl Recipe {
    /// The first operation of the sequence.
    pub fn first_op(&self) -> Operation {
        self.ops[0]
    }
}

/// The static table of all product kinds, indexed by [`ProductKind`].
///
/// Invariant (enforced at construction): kinds are contiguous `1..=K` and
/// every recipe has a non-empty op sequence and `1..=3` required components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
}

impl RecipeCatalog {
    /// Build a catalog, validating the contiguous-kind invariant.
    pub fn new(mut recipes: Vec<Recipe>) -> CarouselResult<Self> {
        if recipes.is_empty() {
            return Err(CarouselError::ConfigInvalid {
                reason: "recipe catalog is empty".to_string(),
            });
        }
        recipes.sort_by_key(|r| r.kind.0);
        for (index, recipe) in recipes.iter().enumerate() {
            if recipe.kind.index() != index {
                return Err(CarouselError::ConfigInvalid {
                    reason: format!(
                        "product kinds must be contiguous from 1; found kind {} at position {}",
                        recipe.kind.0, index
                    ),
                });
            }
            if recipe.ops.is_empty() {
                return Err(CarouselError::ConfigInvalid {
                    reason: format!("recipe for {} has no operations", recipe.kind),
                });
            }
            if recipe.components_required == 0 || recipe.components_required > COMPONENT_CAP {
                return Err(CarouselError::ConfigInvalid {
                    reason: format!(
                        "recipe for {} requires {} components (allowed: 1..={})",
                        recipe.kind, recipe.components_required, COMPONENT_CAP
                    ),
                });
            }
        }
        Ok(Self { recipes })
    }

    /// The standard four-product table of the reference line.
    pub fn standard() -> Self {
        let table = [
            (1u8, 3u32, "1235"),
            (2, 3, "2416"),
            (3, 1, "13513"),
            (4, 2, "461"),
        ];
        let recipes = table
            .iter()
            .map(|&(kind, components_required, ops)| Recipe {
                kind: ProductKind(kind),
                components_required,
                ops: ops.chars().map(Operation).collect(),
            })
            .collect();
        // The static table upholds the invariant by construction.
        Self { recipes }
    }

    /// Look up the recipe for a kind.
    pub fn get(&self, kind: ProductKind) -> CarouselResult<&Recipe> {
        self.recipes
            .get(kind.index())
            .ok_or(CarouselError::UnknownKind { kind: kind.0 })
    }

    /// Number of product kinds (K).
    pub fn kind_count(&self) -> usize {
        self.recipes.len()
    }

    /// Iterate over all recipes in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }
}
