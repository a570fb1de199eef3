use std::collections::{BTreeMap, BTreeSet};

use crate::schema::{IngredientAmount, Uuid};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngredientDiff {
    pub delete: Vec<Uuid>,
    pub insert: Vec<IngredientAmount>,
    pub update: Vec<IngredientAmount>,
}

impl IngredientDiff {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.insert.is_empty() && self.update.is_empty()
    }

    /// Rows that need an upsert: new pairs and pairs whose amount changed.
    pub fn upserts(&self) -> Vec<IngredientAmount> {
        self.insert.iter().chain(self.update.iter()).copied().collect()
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub delete: Vec<Uuid>,
    pub insert: Vec<Uuid>,
}

/// Computes the writes that turn `current` into `desired`. `desired` must not repeat an ingredient.
pub fn plan_ingredient_diff(
    current: &[IngredientAmount],
    desired: &[IngredientAmount],
) -> IngredientDiff {
    let current: BTreeMap<Uuid, i32> = current
        .iter()
        .map(|part| (part.ingredient_id, part.amount))
        .collect();
    let wanted: BTreeSet<Uuid> = desired.iter().map(|part| part.ingredient_id).collect();

    let mut diff = IngredientDiff {
        delete: current
            .keys()
            .filter(|id| !wanted.contains(id))
            .copied()
            .collect(),
        ..Default::default()
    };

    for part in desired {
        match current.get(&part.ingredient_id) {
            None => diff.insert.push(*part),
            Some(amount) if *amount != part.amount => diff.update.push(*part),
            Some(_) => {}
        }
    }

    diff
}

pub fn plan_tag_diff(current: &[Uuid], desired: &[Uuid]) -> TagDiff {
    let current: BTreeSet<Uuid> = current.iter().copied().collect();
    let desired: BTreeSet<Uuid> = desired.iter().copied().collect();

    TagDiff {
        delete: current.difference(&desired).copied().collect(),
        insert: desired.difference(&current).copied().collect(),
    }
}
