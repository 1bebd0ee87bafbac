//! Search and category filtering of the catalog view

use catalog_core::{Product, ProductCategory};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category selection of the catalog view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(ProductCategory),
}

impl CategoryFilter {
    pub fn matches(&self, category: ProductCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(category) => fmt::Display::fmt(category, f),
        }
    }
}

impl From<ProductCategory> for CategoryFilter {
    fn from(category: ProductCategory) -> Self {
        CategoryFilter::Only(category)
    }
}

/// Products whose name or description contains `search` (case-insensitive)
/// and whose category matches, in their original order
pub fn filter_products(
    products: &[Product],
    search: &str,
    category: CategoryFilter,
) -> Vec<Product> {
    let needle = search.to_lowercase();

    products
        .iter()
        .filter(|p| category.matches(p.category))
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
