//! Runs the SQL store against a live database. Opt in with
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use sqlx::PgPool;

use foodgram::{
    actions::PgStore,
    error::FoodgramError,
    schema::{IngredientAmount, NewRecipe, RecipeChanges, RecipeFilter, RecipeList, Uuid},
    store::FoodgramStore,
};

async fn insert_user(username: &str, pool: &PgPool) -> Uuid {
    let id: (Uuid,) = sqlx::query_as(
        "INSERT INTO users (email, username, first_name, last_name) VALUES ($1, $2, '', '') RETURNING id",
    )
    .bind(format!("{username}@example.com"))
    .bind(username)
    .fetch_one(pool)
    .await
    .unwrap();
    id.0
}

async fn insert_ingredient(name: &str, unit: &str, pool: &PgPool) -> Uuid {
    let id: (Uuid,) = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(unit)
    .fetch_one(pool)
    .await
    .unwrap();
    id.0
}

async fn insert_tag(slug: &str, pool: &PgPool) -> Uuid {
    let id: (Uuid,) =
        sqlx::query_as("INSERT INTO tags (name, color, slug) VALUES ($1, '#000000', $1) RETURNING id")
            .bind(slug)
            .fetch_one(pool)
            .await
            .unwrap();
    id.0
}

fn amounts(parts: &[(Uuid, i32)]) -> Vec<IngredientAmount> {
    parts
        .iter()
        .map(|(ingredient_id, amount)| IngredientAmount {
            ingredient_id: *ingredient_id,
            amount: *amount,
        })
        .collect()
}

fn new_recipe(author_id: Uuid, tags: Vec<Uuid>, parts: &[(Uuid, i32)]) -> NewRecipe {
    NewRecipe {
        author_id,
        name: String::from("Porridge"),
        image: String::from("recipes/images/porridge.png"),
        text: String::from("Boil it."),
        cooking_time: 10,
        tags,
        ingredients: amounts(parts),
    }
}

async fn join_row_ids(recipe_id: Uuid, pool: &PgPool) -> Vec<(Uuid, Uuid)> {
    sqlx::query_as(
        "SELECT ingredient_id, id FROM recipe_ingredients WHERE recipe_id = $1 ORDER BY id",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn update_applies_ingredient_and_tag_diff(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let author = insert_user("author", &pool).await;
    let salt = insert_ingredient("salt", "g", &pool).await;
    let milk = insert_ingredient("milk", "ml", &pool).await;
    let eggs = insert_ingredient("eggs", "pcs", &pool).await;
    let breakfast = insert_tag("breakfast", &pool).await;
    let dinner = insert_tag("dinner", &pool).await;

    let id = store
        .create_recipe(new_recipe(author, vec![breakfast], &[(salt, 2), (milk, 1)]))
        .await
        .unwrap();
    let before = join_row_ids(id, &pool).await;

    let replaced = store
        .update_recipe(
            id,
            RecipeChanges {
                image: Some(String::from("recipes/images/new.png")),
                tags: vec![dinner],
                ingredients: amounts(&[(milk, 3), (eggs, 1)]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(replaced.as_deref(), Some("recipes/images/porridge.png"));

    let parts: Vec<(Uuid, i32)> = store
        .list_recipe_parts(id)
        .await
        .unwrap()
        .iter()
        .map(|part| (part.ingredient_id, part.amount))
        .collect();
    assert_eq!(parts, vec![(milk, 3), (eggs, 1)]);

    let after = join_row_ids(id, &pool).await;
    assert_eq!(after[0], before[1]);

    let tags = store.list_recipe_tags(id).await.unwrap();
    assert_eq!(tags.iter().map(|tag| tag.id).collect::<Vec<_>>(), vec![dinner]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn failed_update_rolls_back(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let author = insert_user("author", &pool).await;
    let salt = insert_ingredient("salt", "g", &pool).await;
    let milk = insert_ingredient("milk", "ml", &pool).await;

    let id = store
        .create_recipe(new_recipe(author, vec![], &[(salt, 2)]))
        .await
        .unwrap();

    let result = store
        .update_recipe(
            id,
            RecipeChanges {
                cooking_time: Some(0),
                ingredients: amounts(&[(milk, 1)]),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(FoodgramError::Validation(_))));

    let parts = store.list_recipe_parts(id).await.unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].ingredient_id, salt);
    assert_eq!(store.get_recipe(id).await.unwrap().unwrap().cooking_time, 10);

    let result = store
        .update_recipe(404_404, RecipeChanges::default())
        .await;
    assert!(matches!(result, Err(FoodgramError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn lists_filters_and_totals(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let author = insert_user("author", &pool).await;
    let reader = insert_user("reader", &pool).await;
    let salt = insert_ingredient("salt", "g", &pool).await;
    let breakfast = insert_tag("breakfast", &pool).await;

    let soup = store
        .create_recipe(new_recipe(author, vec![breakfast], &[(salt, 5)]))
        .await
        .unwrap();
    let stew = store
        .create_recipe(new_recipe(author, vec![], &[(salt, 10)]))
        .await
        .unwrap();

    let all = store.list_recipes(&RecipeFilter::default()).await.unwrap();
    assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![stew, soup]);

    let tagged = RecipeFilter {
        tags: vec![String::from("breakfast")],
        ..Default::default()
    };
    let tagged = store.list_recipes(&tagged).await.unwrap();
    assert_eq!(tagged.iter().map(|r| r.id).collect::<Vec<_>>(), vec![soup]);

    for id in [soup, stew] {
        assert!(store
            .add_to_list(RecipeList::ShoppingCart, reader, id)
            .await
            .unwrap());
    }
    assert!(!store
        .add_to_list(RecipeList::ShoppingCart, reader, soup)
        .await
        .unwrap());

    let totals = store.shopping_cart_totals(reader).await.unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].total, 15);

    assert!(store.create_follow(reader, author).await.unwrap().is_some());
    assert!(store.create_follow(reader, author).await.unwrap().is_none());
    assert_eq!(store.count_recipes_by_author(author).await.unwrap(), 2);
}
