use async_trait::async_trait;

use super::error::FoodgramResult;
use crate::schema::{
    Follow, Ingredient, IngredientTotal, NewRecipe, Recipe, RecipeChanges, RecipeFilter,
    RecipeList, RecipePart, Tag, User, Uuid,
};

/// Persistence seam of the service layer.
///
/// Every write method is atomic: it either applies completely or leaves storage untouched.
/// Implementations enforce the relational constraints (foreign keys, unique pairs, positive
/// amounts and cooking times, no self-follow) independently of service-level validation.
#[async_trait]
pub trait FoodgramStore: Send + Sync {
    async fn get_user(&self, id: Uuid) -> FoodgramResult<Option<User>>;

    async fn list_tags(&self) -> FoodgramResult<Vec<Tag>>;
    async fn get_tag(&self, id: Uuid) -> FoodgramResult<Option<Tag>>;
    async fn get_tags(&self, ids: &[Uuid]) -> FoodgramResult<Vec<Tag>>;

    async fn list_ingredients(&self, name_prefix: Option<&str>) -> FoodgramResult<Vec<Ingredient>>;
    async fn get_ingredient(&self, id: Uuid) -> FoodgramResult<Option<Ingredient>>;
    async fn get_ingredients(&self, ids: &[Uuid]) -> FoodgramResult<Vec<Ingredient>>;

    /// Inserts the recipe row and all of its associations, returning the new id.
    async fn create_recipe(&self, recipe: NewRecipe) -> FoodgramResult<Uuid>;
    /// Applies scalar changes and replaces both association sets by diff.
    /// Returns the image path that was replaced, read under the same lock as the write.
    async fn update_recipe(&self, id: Uuid, changes: RecipeChanges)
        -> FoodgramResult<Option<String>>;
    async fn delete_recipe(&self, id: Uuid) -> FoodgramResult<bool>;
    async fn get_recipe(&self, id: Uuid) -> FoodgramResult<Option<Recipe>>;
    /// Newest first.
    async fn list_recipes(&self, filter: &RecipeFilter) -> FoodgramResult<Vec<Recipe>>;
    async fn list_recipe_parts(&self, recipe_id: Uuid) -> FoodgramResult<Vec<RecipePart>>;
    async fn list_recipe_tags(&self, recipe_id: Uuid) -> FoodgramResult<Vec<Tag>>;
    async fn count_recipes_by_author(&self, author_id: Uuid) -> FoodgramResult<i64>;

    /// Returns false when the pair already existed.
    async fn add_to_list(&self, list: RecipeList, user_id: Uuid, recipe_id: Uuid)
        -> FoodgramResult<bool>;
    /// Returns false when there was nothing to remove.
    async fn remove_from_list(
        &self,
        list: RecipeList,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> FoodgramResult<bool>;
    async fn is_in_list(&self, list: RecipeList, user_id: Uuid, recipe_id: Uuid)
        -> FoodgramResult<bool>;
    /// Ingredient amounts summed over the user's shopping cart, ordered by name.
    async fn shopping_cart_totals(&self, user_id: Uuid) -> FoodgramResult<Vec<IngredientTotal>>;

    /// Returns `None` when the pair already existed.
    async fn create_follow(&self, user_id: Uuid, following_id: Uuid)
        -> FoodgramResult<Option<Follow>>;
    async fn delete_follow(&self, user_id: Uuid, following_id: Uuid) -> FoodgramResult<bool>;
    async fn follow_exists(&self, user_id: Uuid, following_id: Uuid) -> FoodgramResult<bool>;
    async fn list_follows(&self, user_id: Uuid) -> FoodgramResult<Vec<Follow>>;
}
