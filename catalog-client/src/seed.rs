//! Built-in catalog used by the mock backend

use catalog_core::{Product, ProductCategory};
use chrono::{DateTime, TimeZone, Utc};

const IMAGE_PARAMS: &str = "?auto=format&fit=crop&w=1000&q=80";

fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn unsplash(photo: &str) -> String {
    format!("https://images.unsplash.com/{}{}", photo, IMAGE_PARAMS)
}

#[allow(clippy::too_many_arguments)]
fn entry(
    id: &str,
    name: &str,
    description: &str,
    price: f64,
    category: ProductCategory,
    stock: u32,
    photo: &str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        price,
        category,
        stock,
        image: unsplash(photo),
        created_at,
        updated_at,
    }
}

/// The eight products the mock backend starts with
pub fn seed_products() -> Vec<Product> {
    vec![
        entry(
            "1",
            "Premium Noise-Cancelling Headphones",
            "High-quality wireless headphones with active noise cancellation for an immersive audio experience.",
            299.99,
            ProductCategory::Electronics,
            25,
            "photo-1505740420928-5e560c06d30e",
            day(2023, 1, 15),
            day(2023, 3, 10),
        ),
        entry(
            "2",
            "Slim Fit Cotton T-Shirt",
            "Comfortable and stylish everyday t-shirt made from 100% organic cotton.",
            29.99,
            ProductCategory::Clothing,
            100,
            "photo-1521572163474-6864f9cf17ab",
            day(2023, 2, 20),
            day(2023, 2, 20),
        ),
        entry(
            "3",
            "Minimalist Desk Lamp",
            "Elegant desk lamp with adjustable brightness and color temperature.",
            49.99,
            ProductCategory::Home,
            30,
            "photo-1507473885765-e6ed057f782c",
            day(2023, 3, 5),
            day(2023, 4, 2),
        ),
        entry(
            "4",
            "Modern Philosophy Collection",
            "A curated collection of essential modern philosophy texts from the 20th century.",
            89.99,
            ProductCategory::Books,
            15,
            "photo-1512820790803-83ca734da794",
            day(2023, 4, 10),
            day(2023, 4, 10),
        ),
        entry(
            "5",
            "Organic Face Serum",
            "Revitalizing face serum made with natural ingredients for a healthy, glowing complexion.",
            59.99,
            ProductCategory::Beauty,
            40,
            "photo-1571781926291-c477ebfd024b",
            day(2023, 5, 15),
            day(2023, 6, 1),
        ),
        entry(
            "6",
            "Ultra-Thin Tablet",
            "Powerful tablet with a stunning display and all-day battery life.",
            449.99,
            ProductCategory::Electronics,
            20,
            "photo-1544244015-0df4b3ffc6b0",
            day(2023, 6, 20),
            day(2023, 6, 20),
        ),
        entry(
            "7",
            "Wool Blend Cardigan",
            "Cozy and versatile cardigan perfect for layering in any season.",
            79.99,
            ProductCategory::Clothing,
            35,
            "photo-1434389677669-e08b4cac3105",
            day(2023, 7, 5),
            day(2023, 7, 5),
        ),
        entry(
            "8",
            "Handcrafted Ceramic Vase",
            "Unique, artisanal vase perfect for displaying fresh or dried flowers.",
            39.99,
            ProductCategory::Home,
            25,
            "photo-1612196808214-b40b3db821ca",
            day(2023, 8, 10),
            day(2023, 8, 15),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_ids_are_unique() {
        let products = seed_products();
        let ids: HashSet<_> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(products.len(), 8);
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn seed_has_one_low_stock_entry() {
        let low = seed_products().iter().filter(|p| p.stock < 20).count();
        assert_eq!(low, 1);
    }

    #[test]
    fn seed_timestamps_are_ordered() {
        for product in seed_products() {
            assert!(product.created_at <= product.updated_at, "{}", product.id);
            assert!(product.created_at > DateTime::<Utc>::default());
        }
    }
}
