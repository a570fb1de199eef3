use std::collections::HashMap;

use warp::{
    http::{header, StatusCode},
    reject::Rejection,
    reply, Reply,
};

use super::AppState;
use crate::{
    error::FoodgramError,
    form::{parse_recipe_filter, parse_recipes_limit, RecipeForm, RecipePatchForm},
    jwt::Requester,
    schema::{RecipeList, Uuid},
    services::{follows, lists, recipes, views},
    RECIPES_LIMIT_PARAM, SHOPPING_CART_FILENAME,
};

pub async fn list_tags(state: AppState) -> Result<impl Reply, Rejection> {
    let tags = state.store.list_tags().await?;
    Ok(reply::json(&tags))
}

pub async fn get_tag(id: Uuid, state: AppState) -> Result<impl Reply, Rejection> {
    let tag = state
        .store
        .get_tag(id)
        .await?
        .ok_or_else(|| FoodgramError::not_found("No tag exists with specified id"))?;
    Ok(reply::json(&tag))
}

pub async fn list_ingredients(
    query: HashMap<String, String>,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let name = query.get("name").map(|name| name.trim()).filter(|name| !name.is_empty());
    let ingredients = state.store.list_ingredients(name).await?;
    Ok(reply::json(&ingredients))
}

pub async fn get_ingredient(id: Uuid, state: AppState) -> Result<impl Reply, Rejection> {
    let ingredient = state
        .store
        .get_ingredient(id)
        .await?
        .ok_or_else(|| FoodgramError::not_found("No ingredient exists with specified id"))?;
    Ok(reply::json(&ingredient))
}

pub async fn list_recipes(
    query: Vec<(String, String)>,
    requester: Requester,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let filter = parse_recipe_filter(&query, requester)?;
    let store = state.store.as_ref();

    let mut body = Vec::new();
    for aggregate in recipes::list_recipes(&filter, store).await? {
        body.push(views::recipe_view(aggregate, requester, store, &state.images).await?);
    }

    Ok(reply::json(&body))
}

pub async fn create_recipe(
    requester: Requester,
    form: RecipeForm,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let store = state.store.as_ref();
    let aggregate = recipes::create_recipe(form, requester, store, &state.images).await?;
    let view = views::recipe_view(aggregate, requester, store, &state.images).await?;

    Ok(reply::with_status(reply::json(&view), StatusCode::CREATED))
}

pub async fn get_recipe(
    id: Uuid,
    requester: Requester,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let store = state.store.as_ref();
    let aggregate = recipes::RecipeAggregate::load(id, store).await?;
    let view = views::recipe_view(aggregate, requester, store, &state.images).await?;

    Ok(reply::json(&view))
}

pub async fn update_recipe(
    id: Uuid,
    requester: Requester,
    form: RecipePatchForm,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let store = state.store.as_ref();
    let aggregate = recipes::update_recipe(id, form, requester, store, &state.images).await?;
    let view = views::recipe_view(aggregate, requester, store, &state.images).await?;

    Ok(reply::json(&view))
}

pub async fn delete_recipe(
    id: Uuid,
    requester: Requester,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    recipes::delete_recipe(id, requester, state.store.as_ref(), &state.images).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_to_list(
    id: Uuid,
    list: RecipeList,
    requester: Requester,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let recipe = lists::add_to_list(list, id, requester, state.store.as_ref()).await?;
    let view = views::short_view(&recipe, &state.images);

    Ok(reply::with_status(reply::json(&view), StatusCode::CREATED))
}

pub async fn remove_from_list(
    id: Uuid,
    list: RecipeList,
    requester: Requester,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    lists::remove_from_list(list, id, requester, state.store.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_shopping_cart(
    requester: Requester,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let text = lists::shopping_cart_text(requester, state.store.as_ref()).await?;

    let response = reply::with_header(text, header::CONTENT_TYPE, "text/plain; charset=utf-8");
    Ok(reply::with_header(
        response,
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{SHOPPING_CART_FILENAME}\""),
    ))
}

pub async fn get_me(requester: Requester, state: AppState) -> Result<impl Reply, Rejection> {
    let user_id = requester.require()?;
    let store = state.store.as_ref();
    let user = views::get_user(user_id, store).await?;

    Ok(reply::json(&views::user_view(user, requester, store).await?))
}

pub async fn get_user(
    id: Uuid,
    requester: Requester,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let store = state.store.as_ref();
    let user = views::get_user(id, store).await?;

    Ok(reply::json(&views::user_view(user, requester, store).await?))
}

pub async fn list_subscriptions(
    query: HashMap<String, String>,
    requester: Requester,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user_id = requester.require()?;
    let limit = parse_recipes_limit(query.get(RECIPES_LIMIT_PARAM).map(String::as_str));
    let store = state.store.as_ref();

    let mut body = Vec::new();
    for follow in store.list_follows(user_id).await? {
        body.push(views::follow_view(&follow, limit, store, &state.images).await?);
    }

    Ok(reply::json(&body))
}

pub async fn subscribe(
    id: Uuid,
    query: HashMap<String, String>,
    requester: Requester,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user_id = requester.require()?;
    let limit = parse_recipes_limit(query.get(RECIPES_LIMIT_PARAM).map(String::as_str));
    let store = state.store.as_ref();

    let follow = follows::create_follow(user_id, id, store).await?;
    let view = views::follow_view(&follow, limit, store, &state.images).await?;

    Ok(reply::with_status(reply::json(&view), StatusCode::CREATED))
}

pub async fn unsubscribe(
    id: Uuid,
    requester: Requester,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user_id = requester.require()?;
    follows::delete_follow(user_id, id, state.store.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
