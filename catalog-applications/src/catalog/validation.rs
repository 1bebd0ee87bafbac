//! Field validation for product forms and sign-in credentials

use catalog_core::{Credentials, Product, ProductCategory, ProductInput};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NAME_LENGTH: (usize, usize) = (2, 100);
pub const DESCRIPTION_LENGTH: (usize, usize) = (10, 500);
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Every field rejected by one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldViolation> {
        self.violations.iter()
    }

    /// First violation reported for `field`
    pub fn field(&self, field: &str) -> Option<&FieldViolation> {
        self.violations.iter().find(|v| v.field == field)
    }

    pub fn has(&self, field: &str) -> bool {
        self.field(field).is_some()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Raw, unvalidated product form input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub stock: i64,
    pub image: String,
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category.as_str().to_string(),
            stock: i64::from(product.stock),
            image: product.image.clone(),
        }
    }
}

fn check_length(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: &str,
    (min, max): (usize, usize),
) {
    let length = value.chars().count();
    if length < min {
        errors.push(field, format!("{} must be at least {} characters", label, min));
    } else if length > max {
        errors.push(field, format!("{} must be at most {} characters", label, max));
    }
}

impl ProductDraft {
    /// Check every field and produce the typed input, or all violations
    ///
    /// Text fields are trimmed before their length is checked.
    pub fn validate(&self) -> Result<ProductInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.trim();
        let description = self.description.trim();
        let image = self.image.trim();

        check_length(&mut errors, "name", "Name", name, NAME_LENGTH);
        check_length(
            &mut errors,
            "description",
            "Description",
            description,
            DESCRIPTION_LENGTH,
        );

        if !self.price.is_finite() || self.price <= 0.0 {
            errors.push("price", "Price must be a positive number");
        }

        let stock = match u32::try_from(self.stock) {
            Ok(stock) => Some(stock),
            Err(_) if self.stock < 0 => {
                errors.push("stock", "Stock cannot be negative");
                None
            }
            Err(_) => {
                errors.push("stock", format!("Stock must be at most {}", u32::MAX));
                None
            }
        };

        let category = match self.category.parse::<ProductCategory>() {
            Ok(category) => Some(category),
            Err(_) => {
                errors.push("category", "Please select a valid category");
                None
            }
        };

        if url::Url::parse(image).is_err() {
            errors.push("image", "Please enter a valid URL");
        }

        match (stock, category) {
            (Some(stock), Some(category)) => errors.into_result(|| ProductInput {
                name: name.to_string(),
                description: description.to_string(),
                price: self.price,
                category,
                stock,
                image: image.to_string(),
            }),
            _ => Err(errors),
        }
    }
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map_or(false, |(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

/// Sign-in form rules: address-shaped email and a minimum password length
pub fn validate_credentials(credentials: &Credentials) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if !is_email(credentials.email.trim()) {
        errors.push("email", "Please enter a valid email address");
    }
    if credentials.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        );
    }

    errors.into_result(|| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Desk Lamp".to_string(),
            description: "Adjustable lamp with warm light.".to_string(),
            price: 49.99,
            category: "home".to_string(),
            stock: 30,
            image: "https://example.com/lamp.jpg".to_string(),
        }
    }

    #[test]
    fn valid_draft_produces_input() {
        let input = draft().validate().unwrap();
        assert_eq!(input.category, ProductCategory::Home);
        assert_eq!(input.stock, 30);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let mut d = draft();
        d.name = "ab".to_string();
        d.description = "x".repeat(10);
        d.stock = 0;
        assert!(d.validate().is_ok());

        d.name = "n".repeat(100);
        d.description = "x".repeat(500);
        assert!(d.validate().is_ok());

        d.name = "n".repeat(101);
        d.description = "x".repeat(9);
        let errors = d.validate().unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("description"));
    }

    #[test]
    fn every_violation_is_reported() {
        let d = ProductDraft {
            name: " a ".to_string(),
            description: "short".to_string(),
            price: -5.0,
            category: "garden".to_string(),
            stock: -1,
            image: "not a url".to_string(),
        };

        let errors = d.validate().unwrap_err();
        assert_eq!(errors.len(), 6);
        for field in ["name", "description", "price", "category", "stock", "image"] {
            assert!(errors.has(field), "missing {}", field);
        }
    }

    #[test]
    fn price_must_be_finite_and_positive() {
        for price in [0.0, -0.01, f64::NAN, f64::INFINITY] {
            let mut d = draft();
            d.price = price;
            assert!(d.validate().unwrap_err().has("price"), "{}", price);
        }
    }

    #[test]
    fn stock_above_u32_is_rejected() {
        let mut d = draft();
        d.stock = i64::from(u32::MAX) + 1;
        assert!(d.validate().unwrap_err().has("stock"));
    }

    #[test]
    fn relative_image_is_rejected() {
        let mut d = draft();
        d.image = "/images/lamp.jpg".to_string();
        assert!(d.validate().unwrap_err().has("image"));
    }

    #[test]
    fn credentials_rules() {
        assert!(validate_credentials(&Credentials::new("user@example.com", "password123")).is_ok());

        let errors = validate_credentials(&Credentials::new("user@example", "12345")).unwrap_err();
        assert!(errors.has("email"));
        assert!(errors.has("password"));

        assert!(validate_credentials(&Credentials::new("a b@example.com", "secret1")).is_err());
        assert!(validate_credentials(&Credentials::new("@example.com", "secret1")).is_err());
    }

    #[test]
    fn display_lists_fields() {
        let mut errors = ValidationErrors::single("price", "Price must be a positive number");
        errors.push("stock", "Stock cannot be negative");
        assert_eq!(
            errors.to_string(),
            "price: Price must be a positive number; stock: Stock cannot be negative"
        );
    }
}
