use std::collections::HashSet;

use crate::{
    error::{FoodgramError, FoodgramResult},
    form::{RecipeForm, RecipePatchForm, ValidAssociations},
    image::{decode_base64_image, ImageStorage},
    jwt::Requester,
    schema::{NewRecipe, Recipe, RecipeChanges, RecipeFilter, RecipePart, Tag, Uuid},
    store::FoodgramStore,
};

/// A recipe together with its ingredient amounts and tags.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeAggregate {
    pub recipe: Recipe,
    pub ingredients: Vec<RecipePart>,
    pub tags: Vec<Tag>,
}

impl RecipeAggregate {
    pub async fn load(id: Uuid, store: &dyn FoodgramStore) -> FoodgramResult<Self> {
        let recipe = get_recipe(id, store).await?;
        let ingredients = store.list_recipe_parts(id).await?;
        let tags = store.list_recipe_tags(id).await?;

        Ok(Self {
            recipe,
            ingredients,
            tags,
        })
    }
}

pub async fn get_recipe(id: Uuid, store: &dyn FoodgramStore) -> FoodgramResult<Recipe> {
    store
        .get_recipe(id)
        .await?
        .ok_or_else(|| FoodgramError::not_found("No recipe exists with specified id"))
}

/// Fetches a recipe the requester is allowed to modify.
pub async fn get_recipe_mut(
    id: Uuid,
    user_id: Uuid,
    store: &dyn FoodgramStore,
) -> FoodgramResult<Recipe> {
    let recipe = get_recipe(id, store).await?;

    if recipe.author_id != user_id {
        return Err(FoodgramError::PermissionDenied(String::from(
            "Only the author can modify a recipe",
        )));
    }

    Ok(recipe)
}

pub async fn list_recipes(
    filter: &RecipeFilter,
    store: &dyn FoodgramStore,
) -> FoodgramResult<Vec<RecipeAggregate>> {
    let recipes = store.list_recipes(filter).await?;

    let mut aggregates = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let ingredients = store.list_recipe_parts(recipe.id).await?;
        let tags = store.list_recipe_tags(recipe.id).await?;
        aggregates.push(RecipeAggregate {
            recipe,
            ingredients,
            tags,
        });
    }

    Ok(aggregates)
}

async fn check_references(
    associations: &ValidAssociations,
    store: &dyn FoodgramStore,
) -> FoodgramResult<()> {
    let ids: Vec<Uuid> = associations
        .ingredients
        .iter()
        .map(|part| part.ingredient_id)
        .collect();
    let found: HashSet<Uuid> = store
        .get_ingredients(&ids)
        .await?
        .into_iter()
        .map(|ingredient| ingredient.id)
        .collect();
    if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
        return Err(FoodgramError::NotFound(format!(
            "Ingredient {missing} doesn't exist"
        )));
    }

    let found: HashSet<Uuid> = store
        .get_tags(&associations.tags)
        .await?
        .into_iter()
        .map(|tag| tag.id)
        .collect();
    if let Some(missing) = associations.tags.iter().find(|id| !found.contains(id)) {
        return Err(FoodgramError::NotFound(format!("Tag {missing} doesn't exist")));
    }

    Ok(())
}

pub async fn create_recipe(
    form: RecipeForm,
    requester: Requester,
    store: &dyn FoodgramStore,
    images: &ImageStorage,
) -> FoodgramResult<RecipeAggregate> {
    let author_id = requester.require()?;
    let associations = form.validate()?;
    check_references(&associations, store).await?;

    let image = decode_base64_image(&form.image)?;
    let image = images.save(&image).await?;

    let recipe = NewRecipe {
        author_id,
        name: form.name,
        image: image.clone(),
        text: form.text,
        cooking_time: form.cooking_time,
        tags: associations.tags,
        ingredients: associations.ingredients,
    };

    let id = match store.create_recipe(recipe).await {
        Ok(id) => id,
        Err(e) => {
            images.remove(&image).await;
            return Err(e);
        }
    };

    log::info!("Recipe {id} created by user {author_id}");

    RecipeAggregate::load(id, store).await
}

pub async fn update_recipe(
    id: Uuid,
    form: RecipePatchForm,
    requester: Requester,
    store: &dyn FoodgramStore,
    images: &ImageStorage,
) -> FoodgramResult<RecipeAggregate> {
    let user_id = requester.require()?;
    get_recipe_mut(id, user_id, store).await?;
    let associations = form.validate()?;
    check_references(&associations, store).await?;

    let image = match &form.image {
        Some(payload) => {
            let image = decode_base64_image(payload)?;
            Some(images.save(&image).await?)
        }
        None => None,
    };

    let changes = RecipeChanges {
        name: form.name,
        image: image.clone(),
        text: form.text,
        cooking_time: form.cooking_time,
        tags: associations.tags,
        ingredients: associations.ingredients,
    };

    match store.update_recipe(id, changes).await {
        Ok(replaced) => {
            if let Some(replaced) = replaced {
                images.remove(&replaced).await;
            }
        }
        Err(e) => {
            if let Some(image) = &image {
                images.remove(image).await;
            }
            return Err(e);
        }
    }

    log::info!("Recipe {id} updated by user {user_id}");

    RecipeAggregate::load(id, store).await
}

pub async fn delete_recipe(
    id: Uuid,
    requester: Requester,
    store: &dyn FoodgramStore,
    images: &ImageStorage,
) -> FoodgramResult<()> {
    let user_id = requester.require()?;
    let recipe = get_recipe_mut(id, user_id, store).await?;

    if !store.delete_recipe(id).await? {
        return Err(FoodgramError::not_found("No recipe exists with specified id"));
    }
    images.remove(&recipe.image).await;

    log::info!("Recipe {id} deleted by user {user_id}");

    Ok(())
}
