use std::collections::HashSet;

use serde::Deserialize;

use super::error::{FoodgramError, FoodgramResult};
use crate::jwt::Requester;
use crate::schema::{IngredientAmount, RecipeFilter, Uuid};

pub const NAME_MAX_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IngredientForm {
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeForm {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientForm>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipePatchForm {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientForm>,
}

/// Associations of a recipe payload after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidAssociations {
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipeForm {
    pub fn validate(&self) -> FoodgramResult<ValidAssociations> {
        validate_name(&self.name)?;
        validate_cooking_time(self.cooking_time)?;
        validate_associations(&self.tags, &self.ingredients)
    }
}

impl RecipePatchForm {
    pub fn validate(&self) -> FoodgramResult<ValidAssociations> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(cooking_time) = self.cooking_time {
            validate_cooking_time(cooking_time)?;
        }
        validate_associations(&self.tags, &self.ingredients)
    }
}

pub fn validate_name(name: &str) -> FoodgramResult<()> {
    if name.trim().is_empty() {
        return Err(FoodgramError::validation("name must not be empty"));
    }
    if name.chars().count() > NAME_MAX_LENGTH {
        return Err(FoodgramError::Validation(format!(
            "name is longer than {NAME_MAX_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_cooking_time(cooking_time: i32) -> FoodgramResult<()> {
    if cooking_time < 1 {
        return Err(FoodgramError::validation("cooking_time cannot be zero"));
    }
    Ok(())
}

pub fn validate_associations(
    tags: &[Uuid],
    ingredients: &[IngredientForm],
) -> FoodgramResult<ValidAssociations> {
    let mut seen = HashSet::new();
    let mut parts = Vec::with_capacity(ingredients.len());

    for ingredient in ingredients {
        if ingredient.amount < 1 {
            return Err(FoodgramError::Validation(format!(
                "amount of ingredient {} must be at least 1",
                ingredient.id
            )));
        }
        if !seen.insert(ingredient.id) {
            return Err(FoodgramError::Validation(format!(
                "duplicate ingredient {}",
                ingredient.id
            )));
        }
        parts.push(IngredientAmount {
            ingredient_id: ingredient.id,
            amount: ingredient.amount,
        });
    }

    // tags are a set, repeats collapse
    let mut seen = HashSet::new();
    let tags = tags.iter().copied().filter(|id| seen.insert(*id)).collect();

    Ok(ValidAssociations {
        tags,
        ingredients: parts,
    })
}

/// `recipes_limit` only applies when it parses as a positive integer.
pub fn parse_recipes_limit(value: Option<&str>) -> Option<usize> {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|limit| *limit > 0)
}

/// Builds a recipe filter from raw query pairs. `tags` may repeat; the
/// favorite and cart flags only apply to authenticated requesters.
pub fn parse_recipe_filter(
    query: &[(String, String)],
    requester: Requester,
) -> FoodgramResult<RecipeFilter> {
    let mut filter = RecipeFilter::default();

    for (key, value) in query {
        match key.as_str() {
            "author" => {
                let author = value.trim().parse::<Uuid>().map_err(|_| {
                    FoodgramError::Validation(format!("Invalid author id {value}"))
                })?;
                filter.author = Some(author);
            }
            "tags" => {
                if !filter.tags.contains(value) {
                    filter.tags.push(value.clone());
                }
            }
            "is_favorited" if is_set(value) => filter.favorited_by = requester.user_id(),
            "is_in_shopping_cart" if is_set(value) => filter.in_cart_of = requester.user_id(),
            _ => {}
        }
    }

    Ok(filter)
}

fn is_set(value: &str) -> bool {
    matches!(value.trim(), "1" | "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(id: Uuid, amount: i32) -> IngredientForm {
        IngredientForm { id, amount }
    }

    #[test]
    fn cooking_time_must_be_positive() {
        for value in [-5, -1, 0] {
            assert_eq!(
                validate_cooking_time(value),
                Err(FoodgramError::validation("cooking_time cannot be zero"))
            );
        }
        for value in [1, 2, 600] {
            assert!(validate_cooking_time(value).is_ok());
        }
    }

    #[test]
    fn amount_must_be_positive() {
        let result = validate_associations(&[], &[ingredient(1, 0)]);
        assert!(matches!(result, Err(FoodgramError::Validation(_))));

        let result = validate_associations(&[], &[ingredient(1, -3)]);
        assert!(matches!(result, Err(FoodgramError::Validation(_))));

        let result = validate_associations(&[], &[ingredient(1, 1)]);
        assert!(result.is_ok());
    }

    #[test]
    fn duplicate_ingredient_is_rejected() {
        let result = validate_associations(&[], &[ingredient(4, 1), ingredient(4, 2)]);
        assert_eq!(
            result,
            Err(FoodgramError::validation("duplicate ingredient 4"))
        );
    }

    #[test]
    fn repeated_tags_collapse_in_order() {
        let valid = validate_associations(&[3, 1, 3, 2, 1], &[ingredient(1, 1)]).unwrap();
        assert_eq!(valid.tags, vec![3, 1, 2]);
    }

    #[test]
    fn blank_or_long_names_are_rejected() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"a".repeat(NAME_MAX_LENGTH + 1)).is_err());
        assert!(validate_name("Borscht").is_ok());
    }

    #[test]
    fn recipes_limit_parsing() {
        assert_eq!(parse_recipes_limit(Some("3")), Some(3));
        assert_eq!(parse_recipes_limit(Some("0")), None);
        assert_eq!(parse_recipes_limit(Some("-2")), None);
        assert_eq!(parse_recipes_limit(Some("many")), None);
        assert_eq!(parse_recipes_limit(None), None);
    }

    fn pairs(query: &[(&str, &str)]) -> Vec<(String, String)> {
        query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn recipe_filter_from_query() {
        let query = pairs(&[
            ("author", "7"),
            ("tags", "breakfast"),
            ("tags", "lunch"),
            ("tags", "breakfast"),
            ("is_favorited", "1"),
            ("is_in_shopping_cart", "0"),
            ("page", "2"),
        ]);
        let filter = parse_recipe_filter(&query, Requester::User(3)).unwrap();

        assert_eq!(filter.author, Some(7));
        assert_eq!(filter.tags, vec!["breakfast", "lunch"]);
        assert_eq!(filter.favorited_by, Some(3));
        assert_eq!(filter.in_cart_of, None);
    }

    #[test]
    fn anonymous_list_flags_are_ignored() {
        let query = pairs(&[("is_favorited", "1"), ("is_in_shopping_cart", "1")]);
        let filter = parse_recipe_filter(&query, Requester::Anonymous).unwrap();
        assert_eq!(filter, RecipeFilter::default());
    }

    #[test]
    fn invalid_author_is_rejected() {
        let query = pairs(&[("author", "me")]);
        assert!(parse_recipe_filter(&query, Requester::Anonymous).is_err());
    }
}
