use sqlx::{Pool, Postgres};

use crate::{
    error::FoodgramResult,
    schema::{Follow, Uuid},
};

pub async fn create_follow(
    user_id: Uuid,
    following_id: Uuid,
    pool: &Pool<Postgres>,
) -> FoodgramResult<Option<Follow>> {
    let row: Option<Follow> = sqlx::query_as(
        "
        INSERT INTO follows (user_id, following_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING RETURNING *
    ",
    )
    .bind(user_id)
    .bind(following_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn delete_follow(
    user_id: Uuid,
    following_id: Uuid,
    pool: &Pool<Postgres>,
) -> FoodgramResult<bool> {
    let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND following_id = $2")
        .bind(user_id)
        .bind(following_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn follow_exists(
    user_id: Uuid,
    following_id: Uuid,
    pool: &Pool<Postgres>,
) -> FoodgramResult<bool> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM follows WHERE user_id = $1 AND following_id = $2")
            .bind(user_id)
            .bind(following_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}

pub async fn list_follows(user_id: Uuid, pool: &Pool<Postgres>) -> FoodgramResult<Vec<Follow>> {
    let rows: Vec<Follow> = sqlx::query_as("SELECT * FROM follows WHERE user_id = $1 ORDER BY id")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
