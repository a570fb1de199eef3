use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    diff::{plan_ingredient_diff, plan_tag_diff},
    error::{FoodgramError, FoodgramResult},
    schema::{IngredientAmount, NewRecipe, Recipe, RecipeChanges, RecipeFilter, RecipePart, Uuid},
};

pub async fn create_recipe(recipe: NewRecipe, pool: &Pool<Postgres>) -> FoodgramResult<Uuid> {
    let mut tx = pool.begin().await?;

    let id: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(recipe.author_id)
    .bind(&recipe.name)
    .bind(&recipe.image)
    .bind(&recipe.text)
    .bind(recipe.cooking_time)
    .fetch_one(&mut *tx)
    .await?;

    insert_recipe_parts(id.0, &recipe.ingredients, false, &mut tx).await?;
    insert_recipe_tags(id.0, &recipe.tags, &mut tx).await?;

    tx.commit().await?;

    Ok(id.0)
}

pub async fn update_recipe(
    id: Uuid,
    changes: RecipeChanges,
    pool: &Pool<Postgres>,
) -> FoodgramResult<Option<String>> {
    let mut tx = pool.begin().await?;

    // row lock serializes concurrent updates of the same recipe
    let locked: Option<(String,)> =
        sqlx::query_as("SELECT image FROM recipes WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some((previous_image,)) = locked else {
        return Err(FoodgramError::not_found("No recipe exists with specified id"));
    };
    let replaced_image = changes.image.as_ref().map(|_| previous_image);

    sqlx::query(
        "
        UPDATE recipes SET
        name = COALESCE($2, name),
        image = COALESCE($3, image),
        text = COALESCE($4, text),
        cooking_time = COALESCE($5, cooking_time)
        WHERE id = $1
    ",
    )
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.image)
    .bind(&changes.text)
    .bind(changes.cooking_time)
    .execute(&mut *tx)
    .await?;

    let current: Vec<(Uuid, i32)> = sqlx::query_as(
        "SELECT ingredient_id, amount FROM recipe_ingredients WHERE recipe_id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;
    let current: Vec<IngredientAmount> = current
        .into_iter()
        .map(|(ingredient_id, amount)| IngredientAmount {
            ingredient_id,
            amount,
        })
        .collect();

    let parts = plan_ingredient_diff(&current, &changes.ingredients);
    if !parts.delete.is_empty() {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1 AND ingredient_id = ANY($2)")
            .bind(id)
            .bind(parts.delete.as_slice())
            .execute(&mut *tx)
            .await?;
    }
    insert_recipe_parts(id, &parts.upserts(), true, &mut tx).await?;

    let current: Vec<(Uuid,)> =
        sqlx::query_as("SELECT tag_id FROM recipe_tags WHERE recipe_id = $1 FOR UPDATE")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
    let current: Vec<Uuid> = current.into_iter().map(|row| row.0).collect();

    let tags = plan_tag_diff(&current, &changes.tags);
    if !tags.delete.is_empty() {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1 AND tag_id = ANY($2)")
            .bind(id)
            .bind(tags.delete.as_slice())
            .execute(&mut *tx)
            .await?;
    }
    insert_recipe_tags(id, &tags.insert, &mut tx).await?;

    tx.commit().await?;

    log::trace!(
        "> Recipe {id}: -{} +{} ~{} ingredients, -{} +{} tags",
        parts.delete.len(),
        parts.insert.len(),
        parts.update.len(),
        tags.delete.len(),
        tags.insert.len()
    );

    Ok(replaced_image)
}

async fn insert_recipe_parts(
    recipe_id: Uuid,
    parts: &[IngredientAmount],
    upsert: bool,
    conn: &mut PgConnection,
) -> FoodgramResult<()> {
    if parts.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");

    query_builder.push_values(parts.iter(), |mut b, part| {
        b.push_bind(recipe_id)
            .push_bind(part.ingredient_id)
            .push_bind(part.amount);
    });

    if upsert {
        query_builder
            .push(" ON CONFLICT (recipe_id, ingredient_id) DO UPDATE SET amount = EXCLUDED.amount");
    }

    query_builder.build().execute(&mut *conn).await?;

    Ok(())
}

async fn insert_recipe_tags(
    recipe_id: Uuid,
    tags: &[Uuid],
    conn: &mut PgConnection,
) -> FoodgramResult<()> {
    if tags.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");

    query_builder.push_values(tags.iter(), |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(*tag_id);
    });
    query_builder.push(" ON CONFLICT DO NOTHING");

    query_builder.build().execute(&mut *conn).await?;

    Ok(())
}

pub async fn delete_recipe(id: Uuid, pool: &Pool<Postgres>) -> FoodgramResult<bool> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> FoodgramResult<Option<Recipe>> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn list_recipes(
    filter: &RecipeFilter,
    pool: &Pool<Postgres>,
) -> FoodgramResult<Vec<Recipe>> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.* FROM recipes r WHERE TRUE");

    if let Some(author) = filter.author {
        query_builder.push(" AND r.author_id = ").push_bind(author);
    }
    if !filter.tags.is_empty() {
        query_builder
            .push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id \
                 WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }
    if let Some(user_id) = filter.favorited_by {
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
            .push_bind(user_id)
            .push(")");
    }
    if let Some(user_id) = filter.in_cart_of {
        query_builder
            .push(
                " AND EXISTS (SELECT 1 FROM shopping_lists s WHERE s.recipe_id = r.id AND s.user_id = ",
            )
            .push_bind(user_id)
            .push(")");
    }
    query_builder.push(" ORDER BY r.id DESC");

    let rows: Vec<Recipe> = query_builder.build_query_as().fetch_all(pool).await?;

    Ok(rows)
}

pub async fn list_recipe_parts(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> FoodgramResult<Vec<RecipePart>> {
    let rows: Vec<RecipePart> = sqlx::query_as("
        SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY ri.id
    ")
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count_recipes_by_author(author_id: Uuid, pool: &Pool<Postgres>) -> FoodgramResult<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await?;

    Ok(count.0)
}
