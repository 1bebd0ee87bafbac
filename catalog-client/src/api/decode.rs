//! Strict decoding of catalog API responses
//!
//! Bodies may arrive bare or wrapped in a `data`, `products` or `product`
//! envelope, and product identifiers may be spelled `id` or `_id`. Anything
//! that does not decode into a complete, well-formed product is rejected.

use catalog_core::{AuthToken, CatalogError, CatalogResult, ErrorContext, Product, ProductCategory};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

const ENVELOPE_KEYS: [&str; 3] = ["data", "products", "product"];
const MAX_ENVELOPE_DEPTH: usize = 3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProduct {
    #[serde(alias = "_id")]
    id: String,
    name: String,
    description: String,
    price: f64,
    category: ProductCategory,
    stock: u32,
    image: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WireProduct> for Product {
    type Error = String;

    fn try_from(wire: WireProduct) -> Result<Self, Self::Error> {
        if wire.id.trim().is_empty() {
            return Err("product id must not be empty".to_string());
        }
        if !wire.price.is_finite() || wire.price < 0.0 {
            return Err(format!("product {} has invalid price {}", wire.id, wire.price));
        }

        Ok(Product {
            id: wire.id,
            name: wire.name,
            description: wire.description,
            price: wire.price,
            category: wire.category,
            stock: wire.stock,
            image: wire.image,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

fn decode_error(message: impl Into<String>, operation: &str) -> CatalogError {
    CatalogError::Decode {
        message: message.into(),
        context: ErrorContext::new("response_decoder")
            .with_operation(operation)
            .with_suggestion("Check that api.base_url points at a compatible catalog API"),
    }
}

fn parse_body(body: &str, operation: &str) -> CatalogResult<Value> {
    serde_json::from_str(body)
        .map_err(|e| decode_error(format!("Response is not valid JSON: {}", e), operation))
}

/// Strip envelope objects until the payload itself is reached
///
/// An object that carries a `name` field is treated as a product, not an
/// envelope, even if it happens to have a `data` key.
fn unwrap_envelope(mut value: Value) -> Value {
    for _ in 0..MAX_ENVELOPE_DEPTH {
        let inner = match &mut value {
            Value::Object(map) if !map.contains_key("name") => ENVELOPE_KEYS
                .iter()
                .find_map(|key| map.remove(*key)),
            _ => None,
        };
        match inner {
            Some(inner) => value = inner,
            None => break,
        }
    }
    value
}

fn product_from_value(value: Value, operation: &str) -> CatalogResult<Product> {
    if !value.is_object() {
        return Err(decode_error("Expected a product object", operation));
    }

    let wire: WireProduct = serde_json::from_value(value)
        .map_err(|e| decode_error(format!("Malformed product: {}", e), operation))?;

    Product::try_from(wire).map_err(|e| decode_error(e, operation))
}

/// Decode the full product collection
pub fn decode_products(body: &str) -> CatalogResult<Vec<Product>> {
    let operation = "decode_products";
    match unwrap_envelope(parse_body(body, operation)?) {
        Value::Array(items) => items
            .into_iter()
            .map(|item| product_from_value(item, operation))
            .collect(),
        other => Err(decode_error(
            format!("Expected a product list, got {}", kind(&other)),
            operation,
        )),
    }
}

/// Decode a single product record
pub fn decode_product(body: &str) -> CatalogResult<Product> {
    let operation = "decode_product";
    product_from_value(unwrap_envelope(parse_body(body, operation)?), operation)
}

/// Decode the bearer token from a login response
pub fn decode_token(body: &str) -> CatalogResult<AuthToken> {
    let operation = "decode_token";
    let value = parse_body(body, operation)?;

    let token = value
        .get("token")
        .or_else(|| value.get("data").and_then(|data| data.get("token")))
        .and_then(Value::as_str)
        .ok_or_else(|| decode_error("Login response carries no token", operation))?;

    AuthToken::new(token).ok_or_else(|| decode_error("Login response carries an empty token", operation))
}

/// The `message` field of an error body, when there is one
pub fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
