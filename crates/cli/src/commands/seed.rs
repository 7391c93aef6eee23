//! Seed the catalog from a YAML file.
//!
//! Categories are upserted by slug. Products are matched by name within their
//! category: a match is updated in place, anything else is inserted. The file
//! is validated before the database is touched and all writes share one
//! transaction.
//!
//! ```yaml
//! categories:
//!   - name: Lawn Collection
//!     slug: lawn
//! products:
//!   - name: Embroidered Lawn Suit
//!     category: lawn
//!     price: "4500.00"
//!     stock_quantity: 12
//!     is_featured: true
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalog file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A catalog file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySeed {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub name: String,
    /// Category slug.
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub is_featured: bool,
}

/// Totals reported after a seed run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products_inserted: usize,
    pub products_updated: usize,
}

/// Read, parse and validate a catalog file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid YAML for a
/// catalog, or fails validation.
pub async fn load(path: &Path) -> Result<Catalog, SeedError> {
    info!(path = %path.display(), "Loading catalog from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let catalog: Catalog = serde_yaml::from_str(&content)?;

    let errors = validate(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Catalog validated"
    );
    Ok(catalog)
}

/// Check a catalog for problems that would fail or corrupt the seed.
#[must_use]
pub fn validate(catalog: &Catalog) -> Vec<String> {
    let mut errors = Vec::new();
    let mut slugs = HashSet::new();

    for category in &catalog.categories {
        if category.name.trim().is_empty() {
            errors.push(format!("category '{}' has an empty name", category.slug));
        }
        if !is_slug(&category.slug) {
            errors.push(format!("category slug '{}' is not a valid slug", category.slug));
        }
        if !slugs.insert(category.slug.as_str()) {
            errors.push(format!("category slug '{}' appears twice", category.slug));
        }
    }

    let mut names = HashSet::new();
    for product in &catalog.products {
        if product.name.trim().is_empty() {
            errors.push("product with an empty name".to_owned());
        }
        if !slugs.contains(product.category.as_str()) {
            errors.push(format!(
                "product '{}' references unknown category '{}'",
                product.name, product.category
            ));
        }
        if product.price.is_sign_negative() {
            errors.push(format!("product '{}' has a negative price", product.name));
        }
        if product.stock_quantity < 0 {
            errors.push(format!("product '{}' has negative stock", product.name));
        }
        if !names.insert((product.category.as_str(), product.name.as_str())) {
            errors.push(format!(
                "product '{}' appears twice in category '{}'",
                product.name, product.category
            ));
        }
    }

    errors
}

fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Write a validated catalog to the database.
///
/// # Errors
///
/// Returns an error if any write fails; nothing is committed in that case.
pub async fn apply(pool: &PgPool, catalog: &Catalog) -> Result<SeedSummary, SeedError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();
    let mut category_ids: HashMap<&str, i32> = HashMap::new();

    for category in &catalog.categories {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO categories (name, slug)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(category.name.trim())
        .bind(&category.slug)
        .fetch_one(&mut *tx)
        .await?;
        category_ids.insert(category.slug.as_str(), id);
        summary.categories += 1;
    }

    for product in &catalog.products {
        // validate() guarantees every product's category is in the file
        let Some(&category_id) = category_ids.get(product.category.as_str()) else {
            continue;
        };

        let updated: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE products
            SET description = $3, price = $4, image_url = $5,
                stock_quantity = $6, is_featured = $7, updated_at = NOW()
            WHERE name = $1 AND category_id = $2
            RETURNING id
            ",
        )
        .bind(product.name.trim())
        .bind(category_id)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image_url)
        .bind(product.stock_quantity)
        .bind(product.is_featured)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_some() {
            summary.products_updated += 1;
            continue;
        }

        sqlx::query(
            r"
            INSERT INTO products
                (name, category_id, description, price, image_url, stock_quantity, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(product.name.trim())
        .bind(category_id)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image_url)
        .bind(product.stock_quantity)
        .bind(product.is_featured)
        .execute(&mut *tx)
        .await?;
        summary.products_inserted += 1;
    }

    tx.commit().await?;

    info!("Seeding complete!");
    info!("  Categories upserted: {}", summary.categories);
    info!("  Products inserted: {}", summary.products_inserted);
    info!("  Products updated: {}", summary.products_updated);

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"
categories:
  - name: Lawn Collection
    slug: lawn
  - name: Bridal
    slug: bridal
products:
  - name: Embroidered Lawn Suit
    category: lawn
    price: "4500.00"
    stock_quantity: 12
    is_featured: true
  - name: Dupatta
    category: lawn
    price: 1200
"#;

    #[test]
    fn parses_and_validates_sample() {
        let catalog: Catalog = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(catalog.categories.len(), 2);
        assert_eq!(catalog.products.len(), 2);
        assert_eq!(catalog.products[0].price, Decimal::new(450_000, 2));
        assert_eq!(catalog.products[1].stock_quantity, 0);
        assert!(!catalog.products[1].is_featured);
        assert!(validate(&catalog).is_empty());
    }

    #[test]
    fn reports_every_problem() {
        let yaml = r"
categories:
  - name: Lawn
    slug: lawn
  - name: Lawn again
    slug: lawn
  - name: Bad
    slug: Not A Slug
products:
  - name: Orphan
    category: missing
    price: 10
  - name: Cheap
    category: lawn
    price: -1
    stock_quantity: -3
";
        let catalog: Catalog = serde_yaml::from_str(yaml).unwrap();
        let errors = validate(&catalog);
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("appears twice")));
        assert!(errors.iter().any(|e| e.contains("unknown category 'missing'")));
        assert!(errors.iter().any(|e| e.contains("negative price")));
    }

    #[test]
    fn rejects_unknown_keys() {
        let yaml = "categories: []\nproducts: []\nbanners: []\n";
        assert!(serde_yaml::from_str::<Catalog>(yaml).is_err());
    }

    #[tokio::test]
    async fn load_reads_and_validates_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let catalog = load(file.path()).await.unwrap();
        assert_eq!(catalog.products.len(), 2);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        bad.write_all(b"products:\n  - name: X\n    category: none\n    price: 1\n")
            .unwrap();
        assert!(matches!(load(bad.path()).await, Err(SeedError::Invalid(1))));
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(&dir.path().join("nope.yaml")).await;
        assert!(matches!(result, Err(SeedError::Read { .. })));
    }
}
