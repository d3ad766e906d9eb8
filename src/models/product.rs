use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use url::Url;

use crate::utils::error::AppError;

/// One monitored product, as declared in the products file. Immutable for
/// the duration of a poll cycle; the file is reloaded every cycle so edits
/// take effect without a restart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Loads and validates the products file (a JSON array of products).
///
/// Ids must be unique and URLs must parse; a file that fails validation is
/// rejected as a whole so a half-broken list never silently shrinks the
/// monitored set.
pub fn load_products(path: &Path) -> Result<Vec<Product>, AppError> {
    let raw = fs::read_to_string(path).map_err(|e| AppError::ProductList {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let products: Vec<Product> =
        serde_json::from_str(&raw).map_err(|e| AppError::ProductList {
            path: path.display().to_string(),
            message: format!("invalid JSON: {}", e),
        })?;

    let mut seen = HashSet::new();
    for product in &products {
        if product.id.trim().is_empty() {
            return Err(AppError::ProductList {
                path: path.display().to_string(),
                message: format!("product \"{}\" has an empty id", product.name),
            });
        }
        if !seen.insert(product.id.as_str()) {
            return Err(AppError::ProductList {
                path: path.display().to_string(),
                message: format!("duplicate product id \"{}\"", product.id),
            });
        }
        if Url::parse(&product.url).is_err() {
            return Err(AppError::ProductList {
                path: path.display().to_string(),
                message: format!("invalid URL for product \"{}\": {}", product.id, product.url),
            });
        }
    }

    Ok(products)
}
