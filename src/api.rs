use std::{collections::HashMap, convert::Infallible, sync::Arc};

use serde::Serialize;
use warp::{http::StatusCode, reject::Rejection, Filter, Reply};

use crate::{
    error::FoodgramError, image::ImageStorage, jwt::Requester, middleware::with_requester,
    schema::{RecipeList, Uuid},
    store::FoodgramStore,
};

mod handlers;

/// Shared dependencies of every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FoodgramStore>,
    pub images: ImageStorage,
    pub secret: Arc<[u8]>,
}

impl AppState {
    pub fn new(store: Arc<dyn FoodgramStore>, images: ImageStorage, secret: &[u8]) -> Self {
        Self {
            store,
            images,
            secret: Arc::from(secret),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn requester(state: &AppState) -> impl Filter<Extract = (Requester,), Error = Rejection> + Clone {
    with_requester(state.secret.clone())
}

/// Full route tree, including media files and rejection recovery.
pub fn routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let media = warp::get()
        .and(warp::path(state.images.mount_segment()))
        .and(warp::fs::dir(state.images.root().to_path_buf()));

    tag_routes(state.clone())
        .or(ingredient_routes(state.clone()))
        .or(recipe_routes(state.clone()))
        .or(list_routes(state.clone()))
        .or(user_routes(state))
        .or(media)
        .recover(handle_rejection)
        .with(warp::log("foodgram::api"))
}

fn tag_routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("tags")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::list_tags);

    let detail = warp::path!("tags" / Uuid)
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::get_tag);

    list.or(detail)
}

fn ingredient_routes(
    state: AppState,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("ingredients")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state(state.clone()))
        .and_then(handlers::list_ingredients);

    let detail = warp::path!("ingredients" / Uuid)
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::get_ingredient);

    list.or(detail)
}

fn recipe_routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("recipes")
        .and(warp::get())
        .and(warp::query::<Vec<(String, String)>>())
        .and(requester(&state))
        .and(with_state(state.clone()))
        .and_then(handlers::list_recipes);

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(requester(&state))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handlers::create_recipe);

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(requester(&state))
        .and(with_state(state.clone()))
        .and_then(handlers::download_shopping_cart);

    let detail = warp::path!("recipes" / Uuid)
        .and(warp::get())
        .and(requester(&state))
        .and(with_state(state.clone()))
        .and_then(handlers::get_recipe);

    let update = warp::path!("recipes" / Uuid)
        .and(warp::patch())
        .and(requester(&state))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handlers::update_recipe);

    let delete = warp::path!("recipes" / Uuid)
        .and(warp::delete())
        .and(requester(&state))
        .and(with_state(state))
        .and_then(handlers::delete_recipe);

    list.or(create)
        .or(download)
        .or(detail)
        .or(update)
        .or(delete)
}

fn list_routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("recipes" / Uuid / String)
        .and_then(|id: Uuid, segment: String| async move {
            match segment.as_str() {
                "favorite" => Ok((id, RecipeList::Favorites)),
                "shopping_cart" => Ok((id, RecipeList::ShoppingCart)),
                _ => Err(warp::reject::not_found()),
            }
        })
        .untuple_one();

    let add = list
        .clone()
        .and(warp::post())
        .and(requester(&state))
        .and(with_state(state.clone()))
        .and_then(handlers::add_to_list);

    let remove = list
        .and(warp::delete())
        .and(requester(&state))
        .and(with_state(state))
        .and_then(handlers::remove_from_list);

    add.or(remove)
}

fn user_routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(requester(&state))
        .and(with_state(state.clone()))
        .and_then(handlers::get_me);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(requester(&state))
        .and(with_state(state.clone()))
        .and_then(handlers::list_subscriptions);

    let detail = warp::path!("users" / Uuid)
        .and(warp::get())
        .and(requester(&state))
        .and(with_state(state.clone()))
        .and_then(handlers::get_user);

    let subscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::post())
        .and(warp::query::<HashMap<String, String>>())
        .and(requester(&state))
        .and(with_state(state.clone()))
        .and_then(handlers::subscribe);

    let unsubscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::delete())
        .and(requester(&state))
        .and(with_state(state))
        .and_then(handlers::unsubscribe);

    me.or(subscriptions)
        .or(detail)
        .or(subscribe)
        .or(unsubscribe)
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(e) = err.find::<FoodgramError>() {
        match e {
            FoodgramError::Session(_) | FoodgramError::Storage(_) => {
                log::error!("Request failed: {e}")
            }
            _ => log::warn!("Request rejected: {e}"),
        }
        (e.status(), e.to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {e}"))
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, String::from("Invalid query string"))
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            String::from("Unsupported media type"),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            String::from("Method not allowed"),
        )
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Not found"))
    } else {
        log::error!("Unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Internal server error"),
        )
    };

    let body = ErrorBody { detail: &message };
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
