use std::fmt::Write;

use super::recipes::get_recipe;
use crate::{
    error::{FoodgramError, FoodgramResult},
    jwt::Requester,
    schema::{Recipe, RecipeList, Uuid},
    store::FoodgramStore,
};

pub async fn add_to_list(
    list: RecipeList,
    recipe_id: Uuid,
    requester: Requester,
    store: &dyn FoodgramStore,
) -> FoodgramResult<Recipe> {
    let user_id = requester.require()?;
    let recipe = get_recipe(recipe_id, store).await?;

    if !store.add_to_list(list, user_id, recipe_id).await? {
        return Err(FoodgramError::Validation(format!(
            "Recipe is already in {}",
            list.label()
        )));
    }

    log::info!("Recipe {recipe_id} added to {} of user {user_id}", list.label());

    Ok(recipe)
}

pub async fn remove_from_list(
    list: RecipeList,
    recipe_id: Uuid,
    requester: Requester,
    store: &dyn FoodgramStore,
) -> FoodgramResult<()> {
    let user_id = requester.require()?;
    get_recipe(recipe_id, store).await?;

    if !store.remove_from_list(list, user_id, recipe_id).await? {
        return Err(FoodgramError::Validation(format!(
            "Recipe is not in {}",
            list.label()
        )));
    }

    log::info!("Recipe {recipe_id} removed from {} of user {user_id}", list.label());

    Ok(())
}

/// Plain text shopping list, one `name (unit): total` line per ingredient.
pub async fn shopping_cart_text(
    requester: Requester,
    store: &dyn FoodgramStore,
) -> FoodgramResult<String> {
    let user_id = requester.require()?;
    let totals = store.shopping_cart_totals(user_id).await?;

    let mut text = String::new();
    for total in totals {
        // writing into a String cannot fail
        let _ = writeln!(
            text,
            "{} ({}): {}",
            total.name, total.measurement_unit, total.total
        );
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{memory::MemoryStore, schema::IngredientAmount, schema::NewRecipe};

    async fn recipe(store: &MemoryStore, author: Uuid, parts: &[(Uuid, i32)]) -> Uuid {
        let recipe = NewRecipe {
            author_id: author,
            name: String::from("Soup"),
            image: String::from("recipes/images/soup.png"),
            text: String::from("Boil."),
            cooking_time: 30,
            tags: vec![],
            ingredients: parts
                .iter()
                .map(|(ingredient_id, amount)| IngredientAmount {
                    ingredient_id: *ingredient_id,
                    amount: *amount,
                })
                .collect(),
        };
        store.create_recipe(recipe).await.unwrap()
    }

    #[tokio::test]
    async fn favorite_toggle_round_trip() {
        let store = MemoryStore::new();
        let user = store.insert_user("u@example.com", "user", "Uma", "User").await;
        let id = recipe(&store, user.id, &[]).await;
        let requester = Requester::User(user.id);

        add_to_list(RecipeList::Favorites, id, requester, &store).await.unwrap();
        assert_eq!(
            add_to_list(RecipeList::Favorites, id, requester, &store)
                .await
                .map(|recipe| recipe.id),
            Err(FoodgramError::validation("Recipe is already in favorites"))
        );

        remove_from_list(RecipeList::Favorites, id, requester, &store)
            .await
            .unwrap();
        assert_eq!(
            remove_from_list(RecipeList::Favorites, id, requester, &store).await,
            Err(FoodgramError::validation("Recipe is not in favorites"))
        );
    }

    #[tokio::test]
    async fn lists_require_a_known_recipe_and_user() {
        let store = MemoryStore::new();
        let user = store.insert_user("u@example.com", "user", "Uma", "User").await;

        let result = add_to_list(RecipeList::ShoppingCart, 404, Requester::User(user.id), &store).await;
        assert!(matches!(result, Err(FoodgramError::NotFound(_))));

        let id = recipe(&store, user.id, &[]).await;
        let result = add_to_list(RecipeList::ShoppingCart, id, Requester::Anonymous, &store).await;
        assert!(matches!(result, Err(FoodgramError::RequestContext)));
    }

    #[tokio::test]
    async fn shopping_cart_sums_amounts_by_ingredient() {
        let store = MemoryStore::new();
        let user = store.insert_user("u@example.com", "user", "Uma", "User").await;
        let salt = store.insert_ingredient("salt", "g").await;
        let carrot = store.insert_ingredient("carrot", "pcs").await;
        let requester = Requester::User(user.id);

        let soup = recipe(&store, user.id, &[(salt.id, 5), (carrot.id, 2)]).await;
        let stew = recipe(&store, user.id, &[(salt.id, 10)]).await;
        recipe(&store, user.id, &[(salt.id, 100)]).await;

        add_to_list(RecipeList::ShoppingCart, soup, requester, &store).await.unwrap();
        add_to_list(RecipeList::ShoppingCart, stew, requester, &store).await.unwrap();

        let text = shopping_cart_text(requester, &store).await.unwrap();
        assert_eq!(text, "carrot (pcs): 2\nsalt (g): 15\n");
    }
}
