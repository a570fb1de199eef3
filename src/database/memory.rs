use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    error::{FoodgramError, FoodgramResult},
    store::FoodgramStore,
};
use crate::{
    diff::{plan_ingredient_diff, plan_tag_diff},
    schema::{
        Follow, Ingredient, IngredientAmount, IngredientTotal, NewRecipe, Recipe, RecipeChanges,
        RecipeFilter, RecipeList, RecipePart, Tag, User, Uuid,
    },
};

#[derive(Debug, Clone, Copy)]
struct RecipeIngredientRow {
    id: Uuid,
    recipe_id: Uuid,
    ingredient_id: Uuid,
    amount: i32,
}

#[derive(Default)]
struct State {
    next_id: Uuid,
    users: BTreeMap<Uuid, User>,
    tags: BTreeMap<Uuid, Tag>,
    ingredients: BTreeMap<Uuid, Ingredient>,
    recipes: BTreeMap<Uuid, Recipe>,
    recipe_ingredients: Vec<RecipeIngredientRow>,
    recipe_tags: BTreeSet<(Uuid, Uuid)>,
    favorites: BTreeSet<(Uuid, Uuid)>,
    shopping_lists: BTreeSet<(Uuid, Uuid)>,
    follows: Vec<Follow>,
}

impl State {
    fn next_id(&mut self) -> Uuid {
        self.next_id += 1;
        self.next_id
    }

    fn list(&self, list: RecipeList) -> &BTreeSet<(Uuid, Uuid)> {
        match list {
            RecipeList::Favorites => &self.favorites,
            RecipeList::ShoppingCart => &self.shopping_lists,
        }
    }

    fn list_mut(&mut self, list: RecipeList) -> &mut BTreeSet<(Uuid, Uuid)> {
        match list {
            RecipeList::Favorites => &mut self.favorites,
            RecipeList::ShoppingCart => &mut self.shopping_lists,
        }
    }

    fn parts_of(&self, recipe_id: Uuid) -> Vec<IngredientAmount> {
        self.recipe_ingredients
            .iter()
            .filter(|row| row.recipe_id == recipe_id)
            .map(|row| IngredientAmount {
                ingredient_id: row.ingredient_id,
                amount: row.amount,
            })
            .collect()
    }

    fn tags_of(&self, recipe_id: Uuid) -> Vec<Uuid> {
        self.recipe_tags
            .iter()
            .filter(|(recipe, _)| *recipe == recipe_id)
            .map(|(_, tag)| *tag)
            .collect()
    }

    // Mirrors the foreign key, unique and check constraints of the SQL schema.
    fn check_associations(
        &self,
        tags: &[Uuid],
        ingredients: &[IngredientAmount],
    ) -> FoodgramResult<()> {
        let mut seen = HashSet::new();
        for part in ingredients {
            if !self.ingredients.contains_key(&part.ingredient_id) {
                return Err(FoodgramError::not_found(
                    "Referenced object doesn't exist (recipe_ingredients_ingredient_id_fkey)",
                ));
            }
            if part.amount < 1 {
                return Err(FoodgramError::validation(
                    "Constraint violated (recipe_ingredient_amount_positive)",
                ));
            }
            if !seen.insert(part.ingredient_id) {
                return Err(FoodgramError::validation(
                    "Duplicate entry (unique_ingredient)",
                ));
            }
        }

        if tags.iter().any(|id| !self.tags.contains_key(id)) {
            return Err(FoodgramError::not_found(
                "Referenced object doesn't exist (recipe_tags_tag_id_fkey)",
            ));
        }

        Ok(())
    }

    fn insert_parts(&mut self, recipe_id: Uuid, parts: &[IngredientAmount]) {
        for part in parts {
            let id = self.next_id();
            self.recipe_ingredients.push(RecipeIngredientRow {
                id,
                recipe_id,
                ingredient_id: part.ingredient_id,
                amount: part.amount,
            });
        }
    }
}

fn check_cooking_time(cooking_time: i32) -> FoodgramResult<()> {
    if cooking_time < 1 {
        return Err(FoodgramError::validation(
            "Constraint violated (recipe_cooking_time_positive)",
        ));
    }
    Ok(())
}

/// In-process store holding every table behind one lock, so each call is atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(
        &self,
        email: &str,
        username: &str,
        first_name: &str,
        last_name: &str,
    ) -> User {
        let mut state = self.state.lock().await;
        let user = User {
            id: state.next_id(),
            email: email.to_string(),
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        state.users.insert(user.id, user.clone());
        user
    }

    pub async fn insert_tag(&self, name: &str, color: &str, slug: &str) -> Tag {
        let mut state = self.state.lock().await;
        let tag = Tag {
            id: state.next_id(),
            name: name.to_string(),
            color: color.to_string(),
            slug: slug.to_string(),
        };
        state.tags.insert(tag.id, tag.clone());
        tag
    }

    pub async fn insert_ingredient(&self, name: &str, measurement_unit: &str) -> Ingredient {
        let mut state = self.state.lock().await;
        let ingredient = Ingredient {
            id: state.next_id(),
            name: name.to_string(),
            measurement_unit: measurement_unit.to_string(),
        };
        state.ingredients.insert(ingredient.id, ingredient.clone());
        ingredient
    }
}

#[async_trait]
impl FoodgramStore for MemoryStore {
    async fn get_user(&self, id: Uuid) -> FoodgramResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn list_tags(&self) -> FoodgramResult<Vec<Tag>> {
        Ok(self.state.lock().await.tags.values().cloned().collect())
    }

    async fn get_tag(&self, id: Uuid) -> FoodgramResult<Option<Tag>> {
        Ok(self.state.lock().await.tags.get(&id).cloned())
    }

    async fn get_tags(&self, ids: &[Uuid]) -> FoodgramResult<Vec<Tag>> {
        let state = self.state.lock().await;
        Ok(state
            .tags
            .values()
            .filter(|tag| ids.contains(&tag.id))
            .cloned()
            .collect())
    }

    async fn list_ingredients(&self, name_prefix: Option<&str>) -> FoodgramResult<Vec<Ingredient>> {
        let state = self.state.lock().await;
        let prefix = name_prefix.map(|prefix| prefix.to_lowercase());

        let mut rows: Vec<Ingredient> = state
            .ingredients
            .values()
            .filter(|ingredient| match &prefix {
                Some(prefix) => ingredient.name.to_lowercase().starts_with(prefix.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(rows)
    }

    async fn get_ingredient(&self, id: Uuid) -> FoodgramResult<Option<Ingredient>> {
        Ok(self.state.lock().await.ingredients.get(&id).cloned())
    }

    async fn get_ingredients(&self, ids: &[Uuid]) -> FoodgramResult<Vec<Ingredient>> {
        let state = self.state.lock().await;
        Ok(state
            .ingredients
            .values()
            .filter(|ingredient| ids.contains(&ingredient.id))
            .cloned()
            .collect())
    }

    async fn create_recipe(&self, recipe: NewRecipe) -> FoodgramResult<Uuid> {
        let mut state = self.state.lock().await;

        if !state.users.contains_key(&recipe.author_id) {
            return Err(FoodgramError::not_found(
                "Referenced object doesn't exist (recipes_author_id_fkey)",
            ));
        }
        check_cooking_time(recipe.cooking_time)?;
        state.check_associations(&recipe.tags, &recipe.ingredients)?;

        let id = state.next_id();
        state.recipes.insert(
            id,
            Recipe {
                id,
                author_id: recipe.author_id,
                name: recipe.name,
                image: recipe.image,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            },
        );
        state.insert_parts(id, &recipe.ingredients);
        for tag_id in recipe.tags {
            state.recipe_tags.insert((id, tag_id));
        }

        Ok(id)
    }

    async fn update_recipe(
        &self,
        id: Uuid,
        changes: RecipeChanges,
    ) -> FoodgramResult<Option<String>> {
        let mut state = self.state.lock().await;

        if !state.recipes.contains_key(&id) {
            return Err(FoodgramError::not_found("No recipe exists with specified id"));
        }
        if let Some(cooking_time) = changes.cooking_time {
            check_cooking_time(cooking_time)?;
        }
        state.check_associations(&changes.tags, &changes.ingredients)?;

        let parts = plan_ingredient_diff(&state.parts_of(id), &changes.ingredients);
        let tags = plan_tag_diff(&state.tags_of(id), &changes.tags);

        let mut replaced_image = None;
        if let Some(recipe) = state.recipes.get_mut(&id) {
            if let Some(name) = changes.name {
                recipe.name = name;
            }
            if let Some(image) = changes.image {
                replaced_image = Some(std::mem::replace(&mut recipe.image, image));
            }
            if let Some(text) = changes.text {
                recipe.text = text;
            }
            if let Some(cooking_time) = changes.cooking_time {
                recipe.cooking_time = cooking_time;
            }
        }

        state
            .recipe_ingredients
            .retain(|row| row.recipe_id != id || !parts.delete.contains(&row.ingredient_id));
        for part in &parts.update {
            if let Some(row) = state
                .recipe_ingredients
                .iter_mut()
                .find(|row| row.recipe_id == id && row.ingredient_id == part.ingredient_id)
            {
                row.amount = part.amount;
            }
        }
        state.insert_parts(id, &parts.insert);

        for tag_id in tags.delete {
            state.recipe_tags.remove(&(id, tag_id));
        }
        for tag_id in tags.insert {
            state.recipe_tags.insert((id, tag_id));
        }

        Ok(replaced_image)
    }

    async fn delete_recipe(&self, id: Uuid) -> FoodgramResult<bool> {
        let mut state = self.state.lock().await;

        if state.recipes.remove(&id).is_none() {
            return Ok(false);
        }
        state.recipe_ingredients.retain(|row| row.recipe_id != id);
        state.recipe_tags.retain(|(recipe, _)| *recipe != id);
        state.favorites.retain(|(_, recipe)| *recipe != id);
        state.shopping_lists.retain(|(_, recipe)| *recipe != id);

        Ok(true)
    }

    async fn get_recipe(&self, id: Uuid) -> FoodgramResult<Option<Recipe>> {
        Ok(self.state.lock().await.recipes.get(&id).cloned())
    }

    async fn list_recipes(&self, filter: &RecipeFilter) -> FoodgramResult<Vec<Recipe>> {
        let state = self.state.lock().await;

        let tag_ids: HashSet<Uuid> = state
            .tags
            .values()
            .filter(|tag| filter.tags.contains(&tag.slug))
            .map(|tag| tag.id)
            .collect();

        Ok(state
            .recipes
            .values()
            .rev()
            .filter(|recipe| filter.author.map_or(true, |author| recipe.author_id == author))
            .filter(|recipe| {
                filter.tags.is_empty()
                    || state
                        .tags_of(recipe.id)
                        .iter()
                        .any(|tag| tag_ids.contains(tag))
            })
            .filter(|recipe| {
                filter
                    .favorited_by
                    .map_or(true, |user| state.favorites.contains(&(user, recipe.id)))
            })
            .filter(|recipe| {
                filter
                    .in_cart_of
                    .map_or(true, |user| state.shopping_lists.contains(&(user, recipe.id)))
            })
            .cloned()
            .collect())
    }

    async fn list_recipe_parts(&self, recipe_id: Uuid) -> FoodgramResult<Vec<RecipePart>> {
        let state = self.state.lock().await;

        let mut rows: Vec<&RecipeIngredientRow> = state
            .recipe_ingredients
            .iter()
            .filter(|row| row.recipe_id == recipe_id)
            .collect();
        rows.sort_by_key(|row| row.id);

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                state
                    .ingredients
                    .get(&row.ingredient_id)
                    .map(|ingredient| RecipePart {
                        recipe_id,
                        ingredient_id: ingredient.id,
                        name: ingredient.name.clone(),
                        measurement_unit: ingredient.measurement_unit.clone(),
                        amount: row.amount,
                    })
            })
            .collect())
    }

    async fn list_recipe_tags(&self, recipe_id: Uuid) -> FoodgramResult<Vec<Tag>> {
        let state = self.state.lock().await;
        Ok(state
            .tags_of(recipe_id)
            .iter()
            .filter_map(|id| state.tags.get(id).cloned())
            .collect())
    }

    async fn count_recipes_by_author(&self, author_id: Uuid) -> FoodgramResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .recipes
            .values()
            .filter(|recipe| recipe.author_id == author_id)
            .count() as i64)
    }

    async fn add_to_list(
        &self,
        list: RecipeList,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> FoodgramResult<bool> {
        let mut state = self.state.lock().await;

        if !state.users.contains_key(&user_id) || !state.recipes.contains_key(&recipe_id) {
            return Err(FoodgramError::NotFound(format!(
                "Referenced object doesn't exist ({}_recipe_id_fkey)",
                list.table()
            )));
        }

        Ok(state.list_mut(list).insert((user_id, recipe_id)))
    }

    async fn remove_from_list(
        &self,
        list: RecipeList,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> FoodgramResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .list_mut(list)
            .remove(&(user_id, recipe_id)))
    }

    async fn is_in_list(
        &self,
        list: RecipeList,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> FoodgramResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .list(list)
            .contains(&(user_id, recipe_id)))
    }

    async fn shopping_cart_totals(&self, user_id: Uuid) -> FoodgramResult<Vec<IngredientTotal>> {
        let state = self.state.lock().await;

        let mut totals: BTreeMap<Uuid, i64> = BTreeMap::new();
        for (_, recipe_id) in state.shopping_lists.iter().filter(|(user, _)| *user == user_id) {
            for row in state
                .recipe_ingredients
                .iter()
                .filter(|row| row.recipe_id == *recipe_id)
            {
                *totals.entry(row.ingredient_id).or_insert(0) += i64::from(row.amount);
            }
        }

        let mut rows: Vec<IngredientTotal> = totals
            .into_iter()
            .filter_map(|(id, total)| {
                state.ingredients.get(&id).map(|ingredient| IngredientTotal {
                    name: ingredient.name.clone(),
                    measurement_unit: ingredient.measurement_unit.clone(),
                    total,
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then(a.measurement_unit.cmp(&b.measurement_unit))
        });

        Ok(rows)
    }

    async fn create_follow(
        &self,
        user_id: Uuid,
        following_id: Uuid,
    ) -> FoodgramResult<Option<Follow>> {
        let mut state = self.state.lock().await;

        if !state.users.contains_key(&user_id) || !state.users.contains_key(&following_id) {
            return Err(FoodgramError::not_found(
                "Referenced object doesn't exist (follows_following_id_fkey)",
            ));
        }
        if user_id == following_id {
            return Err(FoodgramError::validation(
                "Constraint violated (prevent_self_follow)",
            ));
        }
        if state
            .follows
            .iter()
            .any(|follow| follow.user_id == user_id && follow.following_id == following_id)
        {
            return Ok(None);
        }

        let follow = Follow {
            id: state.next_id(),
            user_id,
            following_id,
        };
        state.follows.push(follow);

        Ok(Some(follow))
    }

    async fn delete_follow(&self, user_id: Uuid, following_id: Uuid) -> FoodgramResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.follows.len();
        state
            .follows
            .retain(|follow| !(follow.user_id == user_id && follow.following_id == following_id));

        Ok(state.follows.len() < before)
    }

    async fn follow_exists(&self, user_id: Uuid, following_id: Uuid) -> FoodgramResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .follows
            .iter()
            .any(|follow| follow.user_id == user_id && follow.following_id == following_id))
    }

    async fn list_follows(&self, user_id: Uuid) -> FoodgramResult<Vec<Follow>> {
        Ok(self
            .state
            .lock()
            .await
            .follows
            .iter()
            .filter(|follow| follow.user_id == user_id)
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryStore, User, Ingredient, Ingredient, Tag) {
        let store = MemoryStore::new();
        let author = store.insert_user("a@example.com", "author", "A", "Author").await;
        let salt = store.insert_ingredient("salt", "g").await;
        let milk = store.insert_ingredient("milk", "ml").await;
        let tag = store.insert_tag("Breakfast", "#E26C2D", "breakfast").await;
        (store, author, salt, milk, tag)
    }

    fn new_recipe(author: Uuid, tags: Vec<Uuid>, ingredients: Vec<(Uuid, i32)>) -> NewRecipe {
        NewRecipe {
            author_id: author,
            name: String::from("Porridge"),
            image: String::from("recipes/images/porridge.png"),
            text: String::from("Boil it."),
            cooking_time: 10,
            tags,
            ingredients: ingredients
                .into_iter()
                .map(|(ingredient_id, amount)| IngredientAmount {
                    ingredient_id,
                    amount,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn duplicate_pair_is_rejected_without_partial_writes() {
        let (store, author, salt, _, tag) = seeded().await;

        let result = store
            .create_recipe(new_recipe(author.id, vec![tag.id], vec![(salt.id, 1), (salt.id, 2)]))
            .await;

        assert!(matches!(result, Err(FoodgramError::Validation(_))));
        assert!(store
            .list_recipes(&RecipeFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn unknown_ingredient_is_not_found() {
        let (store, author, _, _, _) = seeded().await;

        let result = store
            .create_recipe(new_recipe(author.id, vec![], vec![(999, 1)]))
            .await;

        assert!(matches!(result, Err(FoodgramError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_keeps_row_identity_of_unchanged_parts() {
        let (store, author, salt, milk, tag) = seeded().await;
        let id = store
            .create_recipe(new_recipe(author.id, vec![tag.id], vec![(salt.id, 2), (milk.id, 1)]))
            .await
            .unwrap();

        let replaced = store
            .update_recipe(
                id,
                RecipeChanges {
                    tags: vec![],
                    ingredients: vec![
                        IngredientAmount {
                            ingredient_id: milk.id,
                            amount: 3,
                        },
                        IngredientAmount {
                            ingredient_id: salt.id,
                            amount: 2,
                        },
                    ],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let parts = store.list_recipe_parts(id).await.unwrap();
        let amounts: Vec<(Uuid, i32)> = parts.iter().map(|p| (p.ingredient_id, p.amount)).collect();
        assert_eq!(amounts, vec![(salt.id, 2), (milk.id, 3)]);
        assert!(store.list_recipe_tags(id).await.unwrap().is_empty());
        assert_eq!(replaced, None);
    }

    #[tokio::test]
    async fn update_reports_the_replaced_image() {
        let (store, author, salt, _, _) = seeded().await;
        let id = store
            .create_recipe(new_recipe(author.id, vec![], vec![(salt.id, 1)]))
            .await
            .unwrap();
        let original = store.get_recipe(id).await.unwrap().unwrap().image;

        let changes = |image: &str| RecipeChanges {
            image: Some(image.to_string()),
            ingredients: vec![IngredientAmount {
                ingredient_id: salt.id,
                amount: 1,
            }],
            ..Default::default()
        };

        let first = store.update_recipe(id, changes("recipes/images/a.png")).await.unwrap();
        let second = store.update_recipe(id, changes("recipes/images/b.png")).await.unwrap();

        assert_eq!(first, Some(original));
        assert_eq!(second.as_deref(), Some("recipes/images/a.png"));
    }

    #[tokio::test]
    async fn self_follow_violates_constraint() {
        let (store, author, _, _, _) = seeded().await;

        let result = store.create_follow(author.id, author.id).await;

        assert!(matches!(result, Err(FoodgramError::Validation(_))));
    }
}
