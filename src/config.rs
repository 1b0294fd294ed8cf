//! Support for library configuration options

use std::sync::{Arc, Mutex};
use once_cell::sync::Lazy;

/// The application name, sent as a `User-Agent` to the planner service.
/// Feel free to override it when initing this library.
pub static APP_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("StudentLifeToolkit".to_string())));

/// How many days a page of the planner shows
pub const DAYS_PER_PAGE: usize = 8;

/// Environment variable that holds the base URL of the planner service (e.g. `https://api.example.com/`)
pub const API_URL_ENV_VAR: &str = "PLANNER_API_URL";
/// Environment variable that holds the bearer token sent to the planner service (usually an ID token from the identity provider)
pub const API_TOKEN_ENV_VAR: &str = "PLANNER_API_TOKEN";

/// The current value of [`APP_NAME`]
pub fn app_name() -> String {
    match APP_NAME.lock() {
        Ok(name) => name.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}
