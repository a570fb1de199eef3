mod database {
    pub mod actions;
    pub mod diff;
    pub mod error;
    pub mod form;
    pub mod memory;
    pub mod schema;
    pub mod store;
}
mod authentication {
    pub mod jwt;
    pub mod middleware;
}
mod constants;

pub mod services {
    pub mod follows;
    pub mod lists;
    pub mod recipes;
    pub mod views;
}

pub mod api;
pub mod config;
pub mod image;

pub use authentication::*;
pub use constants::*;
pub use database::*;
