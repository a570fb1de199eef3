pub const SESSION_COOKIE: &str = "session";
pub const SESSION_LIFETIME_HOURS: i64 = 24;

pub const RECIPES_LIMIT_PARAM: &str = "recipes_limit";

pub const RECIPE_IMAGE_DIR: &str = "recipes/images";
pub const SHOPPING_CART_FILENAME: &str = "shopping_cart.txt";

pub const IMAGE_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/gif",
    "image/webp",
];

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";
pub const DEFAULT_MEDIA_ROOT: &str = "media";
pub const DEFAULT_MEDIA_URL: &str = "/media/";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
