//! Category and product repository.

use sqlx::{PgPool, Postgres, QueryBuilder};

use zahra_core::ProductId;

use super::{RepositoryError, map_constraint};
use crate::models::{Category, NewProduct, Product, ProductChanges, ProductFilter};

/// Product columns plus the joined category name and slug.
///
/// Expects the product relation aliased `p` and categories aliased `c`.
macro_rules! product_columns {
    () => {
        "p.id, p.name, p.description, p.price, p.category_id, p.image_url, \
         p.stock_quantity, p.is_featured, p.created_at, p.updated_at, \
         c.name AS category_name, c.slug AS category_slug"
    };
}

const SELECT_PRODUCTS: &str = concat!(
    "SELECT ",
    product_columns!(),
    " FROM products p LEFT JOIN categories c ON c.id = p.category_id"
);

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, created_at FROM categories ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// List products matching a filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_PRODUCTS);
        query.push(" WHERE TRUE");
        if let Some(slug) = &filter.category {
            query.push(" AND c.slug = ").push_bind(slug.clone());
        }
        if filter.featured {
            query.push(" AND p.is_featured");
        }
        query.push(" ORDER BY p.created_at DESC, p.id DESC");
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit);
        }

        let products = query
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(concat!(
            "SELECT ",
            product_columns!(),
            " FROM products p LEFT JOIN categories c ON c.id = p.category_id WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let created = sqlx::query_as::<_, Product>(concat!(
            "WITH p AS (
                INSERT INTO products
                    (name, description, price, category_id, image_url, stock_quantity, is_featured)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT ",
            product_columns!(),
            " FROM p LEFT JOIN categories c ON c.id = p.category_id"
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.category_id)
        .bind(&product.image_url)
        .bind(product.stock_quantity)
        .bind(product.is_featured)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint(e, "product already exists"))?;
        Ok(created)
    }

    /// Update the supplied fields of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a new category does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_product(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new("WITH p AS (UPDATE products SET ");
        let mut set = query.separated(", ");
        if let Some(name) = &changes.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(description) = &changes.description {
            set.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(price) = changes.price {
            set.push("price = ").push_bind_unseparated(price);
        }
        if let Some(category_id) = changes.category_id {
            set.push("category_id = ").push_bind_unseparated(category_id);
        }
        if let Some(image_url) = &changes.image_url {
            set.push("image_url = ").push_bind_unseparated(image_url.clone());
        }
        if let Some(stock) = changes.stock_quantity {
            set.push("stock_quantity = ").push_bind_unseparated(stock);
        }
        set.push("is_featured = ")
            .push_bind_unseparated(changes.is_featured);
        set.push("updated_at = NOW()");
        query.push(" WHERE id = ").push_bind(id);
        query.push(concat!(
            " RETURNING *) SELECT ",
            product_columns!(),
            " FROM p LEFT JOIN categories c ON c.id = p.category_id"
        ));

        let updated = query
            .build_query_as::<Product>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| map_constraint(e, "product already exists"))?;
        Ok(updated)
    }

    /// Hard-delete a product.
    ///
    /// Order items keep their snapshot with `product_id` set to NULL; cart
    /// lines for the product are removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
