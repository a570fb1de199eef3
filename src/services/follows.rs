use crate::{
    error::{FoodgramError, FoodgramResult},
    schema::{Follow, Uuid},
    store::FoodgramStore,
};

use super::views::get_user;

pub async fn create_follow(
    user_id: Uuid,
    following_id: Uuid,
    store: &dyn FoodgramStore,
) -> FoodgramResult<Follow> {
    if user_id == following_id {
        return Err(FoodgramError::validation("self-follow not allowed"));
    }
    get_user(following_id, store).await?;

    if store.follow_exists(user_id, following_id).await? {
        return Err(FoodgramError::validation("already following"));
    }

    // a concurrent request may have inserted the pair after the check above
    let follow = store
        .create_follow(user_id, following_id)
        .await?
        .ok_or_else(|| FoodgramError::validation("already following"))?;

    log::info!("User {user_id} now follows user {following_id}");

    Ok(follow)
}

pub async fn delete_follow(
    user_id: Uuid,
    following_id: Uuid,
    store: &dyn FoodgramStore,
) -> FoodgramResult<()> {
    get_user(following_id, store).await?;

    if !store.delete_follow(user_id, following_id).await? {
        return Err(FoodgramError::validation("not following"));
    }

    log::info!("User {user_id} unfollowed user {following_id}");

    Ok(())
}
