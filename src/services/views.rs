//! Response shapes and the per-request fields derived from the requester.

use serde::Serialize;

use super::recipes::RecipeAggregate;
use crate::{
    error::{FoodgramError, FoodgramResult},
    image::ImageStorage,
    jwt::Requester,
    schema::{Follow, Recipe, RecipeFilter, RecipeList, RecipePart, Tag, User, Uuid},
    store::FoodgramStore,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientView {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipePart> for IngredientView {
    fn from(part: RecipePart) -> Self {
        Self {
            id: part.ingredient_id,
            name: part.name,
            measurement_unit: part.measurement_unit,
            amount: part.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeView {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<IngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeShortView {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowView {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeShortView>,
    pub recipes_count: i64,
}

async fn in_list(
    list: RecipeList,
    recipe_id: Uuid,
    requester: Requester,
    store: &dyn FoodgramStore,
) -> FoodgramResult<bool> {
    match requester.user_id() {
        Some(user_id) => store.is_in_list(list, user_id, recipe_id).await,
        None => Ok(false),
    }
}

/// False for anonymous requesters.
pub async fn is_favorited(
    recipe_id: Uuid,
    requester: Requester,
    store: &dyn FoodgramStore,
) -> FoodgramResult<bool> {
    in_list(RecipeList::Favorites, recipe_id, requester, store).await
}

/// False for anonymous requesters.
pub async fn is_in_shopping_cart(
    recipe_id: Uuid,
    requester: Requester,
    store: &dyn FoodgramStore,
) -> FoodgramResult<bool> {
    in_list(RecipeList::ShoppingCart, recipe_id, requester, store).await
}

/// Re-checks the stored relation, which may have been removed since `follow` was read.
pub async fn is_subscribed(follow: &Follow, store: &dyn FoodgramStore) -> FoodgramResult<bool> {
    store.follow_exists(follow.user_id, follow.following_id).await
}

/// Recipes of the followed author, newest first, truncated to `limit` when given.
pub async fn follow_recipes(
    follow: &Follow,
    limit: Option<usize>,
    store: &dyn FoodgramStore,
    images: &ImageStorage,
) -> FoodgramResult<Vec<RecipeShortView>> {
    let filter = RecipeFilter {
        author: Some(follow.following_id),
        ..Default::default()
    };
    let recipes = store.list_recipes(&filter).await?;

    Ok(recipes
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|recipe| short_view(recipe, images))
        .collect())
}

pub async fn recipes_count(follow: &Follow, store: &dyn FoodgramStore) -> FoodgramResult<i64> {
    store.count_recipes_by_author(follow.following_id).await
}

pub fn short_view(recipe: &Recipe, images: &ImageStorage) -> RecipeShortView {
    RecipeShortView {
        id: recipe.id,
        name: recipe.name.clone(),
        image: images.url(&recipe.image),
        cooking_time: recipe.cooking_time,
    }
}

pub async fn user_view(
    user: User,
    requester: Requester,
    store: &dyn FoodgramStore,
) -> FoodgramResult<UserView> {
    let is_subscribed = match requester.user_id() {
        Some(user_id) if user_id != user.id => store.follow_exists(user_id, user.id).await?,
        _ => false,
    };

    Ok(UserView {
        email: user.email,
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        is_subscribed,
    })
}

pub async fn get_user(id: Uuid, store: &dyn FoodgramStore) -> FoodgramResult<User> {
    store
        .get_user(id)
        .await?
        .ok_or_else(|| FoodgramError::not_found("User doesn't exist"))
}

pub async fn recipe_view(
    aggregate: RecipeAggregate,
    requester: Requester,
    store: &dyn FoodgramStore,
    images: &ImageStorage,
) -> FoodgramResult<RecipeView> {
    let RecipeAggregate {
        recipe,
        ingredients,
        tags,
    } = aggregate;

    let author = get_user(recipe.author_id, store).await?;

    Ok(RecipeView {
        id: recipe.id,
        tags,
        author: user_view(author, requester, store).await?,
        ingredients: ingredients.into_iter().map(IngredientView::from).collect(),
        is_favorited: is_favorited(recipe.id, requester, store).await?,
        is_in_shopping_cart: is_in_shopping_cart(recipe.id, requester, store).await?,
        image: images.url(&recipe.image),
        name: recipe.name,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

pub async fn follow_view(
    follow: &Follow,
    limit: Option<usize>,
    store: &dyn FoodgramStore,
    images: &ImageStorage,
) -> FoodgramResult<FollowView> {
    let following = get_user(follow.following_id, store).await?;

    Ok(FollowView {
        email: following.email,
        id: following.id,
        username: following.username,
        first_name: following.first_name,
        last_name: following.last_name,
        is_subscribed: is_subscribed(follow, store).await?,
        recipes: follow_recipes(follow, limit, store, images).await?,
        recipes_count: recipes_count(follow, store).await?,
    })
}
