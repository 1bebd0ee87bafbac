//! Dashboard figures derived from the cached catalog

use catalog_core::{Product, ProductCategory};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_products: usize,
    /// Size of the fixed category set
    pub total_categories: usize,
    /// Entries with stock strictly below the threshold
    pub low_stock: usize,
    /// Sum of price x stock
    pub total_value: f64,
}

impl CatalogStats {
    pub fn compute(products: &[Product], low_stock_threshold: u32) -> Self {
        Self {
            total_products: products.len(),
            total_categories: ProductCategory::ALL.len(),
            low_stock: products
                .iter()
                .filter(|p| p.stock < low_stock_threshold)
                .count(),
            total_value: products.iter().map(Product::inventory_value).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(price: f64, stock: u32) -> Product {
        Product {
            id: format!("{}-{}", price, stock),
            name: "Item".to_string(),
            description: "An item in stock.".to_string(),
            price,
            category: ProductCategory::Books,
            stock,
            image: "https://example.com/i.jpg".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_is_strictly_below_threshold() {
        let products = vec![product(1.0, 19), product(1.0, 20), product(1.0, 0)];
        let stats = CatalogStats::compute(&products, 20);
        assert_eq!(stats.low_stock, 2);
        assert_eq!(stats.total_products, 3);
        assert_eq!(stats.total_categories, 5);
    }

    #[test]
    fn total_value_sums_price_times_stock() {
        let products = vec![product(2.5, 4), product(10.0, 3)];
        let stats = CatalogStats::compute(&products, 20);
        assert!((stats.total_value - 40.0).abs() < 1e-9);
    }

    #[test]
    fn empty_catalog() {
        let stats = CatalogStats::compute(&[], 20);
        assert_eq!(stats.total_products, 0);
        assert_eq!(stats.total_value, 0.0);
    }
}
