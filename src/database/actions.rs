use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

pub mod follows;
pub mod ingredients;
pub mod lists;
pub mod recipes;
pub mod tags;
pub mod users;

use super::{
    error::{FoodgramError, FoodgramResult},
    store::FoodgramStore,
};
use crate::schema::{
    Follow, Ingredient, IngredientTotal, NewRecipe, Recipe, RecipeChanges, RecipeFilter,
    RecipeList, RecipePart, Tag, User, Uuid,
};

pub use ingredients::NewIngredient;

/// PostgreSQL backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> FoodgramResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> FoodgramResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| FoodgramError::Storage(format!("{e}")))
    }

    pub async fn insert_ingredients(&self, ingredients: &[NewIngredient]) -> FoodgramResult<u64> {
        ingredients::insert_ingredients(ingredients, &self.pool).await
    }
}

#[async_trait]
impl FoodgramStore for PgStore {
    async fn get_user(&self, id: Uuid) -> FoodgramResult<Option<User>> {
        users::get_user_by_id(id, &self.pool).await
    }

    async fn list_tags(&self) -> FoodgramResult<Vec<Tag>> {
        tags::list_tags(&self.pool).await
    }

    async fn get_tag(&self, id: Uuid) -> FoodgramResult<Option<Tag>> {
        tags::get_tag(id, &self.pool).await
    }

    async fn get_tags(&self, ids: &[Uuid]) -> FoodgramResult<Vec<Tag>> {
        tags::get_tags(ids, &self.pool).await
    }

    async fn list_ingredients(&self, name_prefix: Option<&str>) -> FoodgramResult<Vec<Ingredient>> {
        ingredients::list_ingredients(name_prefix, &self.pool).await
    }

    async fn get_ingredient(&self, id: Uuid) -> FoodgramResult<Option<Ingredient>> {
        ingredients::get_ingredient(id, &self.pool).await
    }

    async fn get_ingredients(&self, ids: &[Uuid]) -> FoodgramResult<Vec<Ingredient>> {
        ingredients::get_ingredients(ids, &self.pool).await
    }

    async fn create_recipe(&self, recipe: NewRecipe) -> FoodgramResult<Uuid> {
        recipes::create_recipe(recipe, &self.pool).await
    }

    async fn update_recipe(
        &self,
        id: Uuid,
        changes: RecipeChanges,
    ) -> FoodgramResult<Option<String>> {
        recipes::update_recipe(id, changes, &self.pool).await
    }

    async fn delete_recipe(&self, id: Uuid) -> FoodgramResult<bool> {
        recipes::delete_recipe(id, &self.pool).await
    }

    async fn get_recipe(&self, id: Uuid) -> FoodgramResult<Option<Recipe>> {
        recipes::get_recipe(id, &self.pool).await
    }

    async fn list_recipes(&self, filter: &RecipeFilter) -> FoodgramResult<Vec<Recipe>> {
        recipes::list_recipes(filter, &self.pool).await
    }

    async fn list_recipe_parts(&self, recipe_id: Uuid) -> FoodgramResult<Vec<RecipePart>> {
        recipes::list_recipe_parts(recipe_id, &self.pool).await
    }

    async fn list_recipe_tags(&self, recipe_id: Uuid) -> FoodgramResult<Vec<Tag>> {
        tags::list_recipe_tags(recipe_id, &self.pool).await
    }

    async fn count_recipes_by_author(&self, author_id: Uuid) -> FoodgramResult<i64> {
        recipes::count_recipes_by_author(author_id, &self.pool).await
    }

    async fn add_to_list(
        &self,
        list: RecipeList,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> FoodgramResult<bool> {
        lists::add_to_list(list, user_id, recipe_id, &self.pool).await
    }

    async fn remove_from_list(
        &self,
        list: RecipeList,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> FoodgramResult<bool> {
        lists::remove_from_list(list, user_id, recipe_id, &self.pool).await
    }

    async fn is_in_list(
        &self,
        list: RecipeList,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> FoodgramResult<bool> {
        lists::is_in_list(list, user_id, recipe_id, &self.pool).await
    }

    async fn shopping_cart_totals(&self, user_id: Uuid) -> FoodgramResult<Vec<IngredientTotal>> {
        lists::shopping_cart_totals(user_id, &self.pool).await
    }

    async fn create_follow(
        &self,
        user_id: Uuid,
        following_id: Uuid,
    ) -> FoodgramResult<Option<Follow>> {
        follows::create_follow(user_id, following_id, &self.pool).await
    }

    async fn delete_follow(&self, user_id: Uuid, following_id: Uuid) -> FoodgramResult<bool> {
        follows::delete_follow(user_id, following_id, &self.pool).await
    }

    async fn follow_exists(&self, user_id: Uuid, following_id: Uuid) -> FoodgramResult<bool> {
        follows::follow_exists(user_id, following_id, &self.pool).await
    }

    async fn list_follows(&self, user_id: Uuid) -> FoodgramResult<Vec<Follow>> {
        follows::list_follows(user_id, &self.pool).await
    }
}
