//! Catalog browsing and staff product management.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use zahra_core::{CategoryId, ProductId};

use crate::db::{RepositoryError, Store};
use crate::models::{Category, NewProduct, Product, ProductChanges, ProductFilter};
use crate::services::uploads::{UploadError, UploadStorage};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
    #[error("Product not found")]
    ProductNotFound,
    #[error("Category not found")]
    CategoryNotFound,
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Text fields of the staff product form, as submitted.
///
/// Every field is optional here; which ones are required depends on whether
/// the form creates or updates a product.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category_id: Option<String>,
    pub stock_quantity: Option<String>,
    pub is_featured: Option<String>,
}

/// An image attached to the product form.
#[derive(Debug, Clone, Copy)]
pub struct ProductImage<'a> {
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

/// Catalog service scoped to a store and upload directory.
pub struct CatalogService<'a, S> {
    store: &'a S,
    uploads: &'a UploadStorage,
}

impl<'a, S: Store> CatalogService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, uploads: &'a UploadStorage) -> Self {
        Self { store, uploads }
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.store.list_categories().await?)
    }

    /// Products matching a filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidField` for a negative limit.
    pub async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        if filter.limit.is_some_and(|limit| limit < 0) {
            return Err(CatalogError::InvalidField {
                field: "limit",
                reason: "must not be negative".to_owned(),
            });
        }
        Ok(self.store.list_products(filter).await?)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if it does not exist.
    pub async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.store
            .get_product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound)
    }

    /// Create a product from the staff form.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::MissingField` or `CatalogError::InvalidField`
    /// for bad input and `CatalogError::CategoryNotFound` for an unknown
    /// category.
    pub async fn create(
        &self,
        form: ProductForm,
        image: Option<ProductImage<'_>>,
    ) -> Result<Product, CatalogError> {
        let name = present(form.name).ok_or(CatalogError::MissingField("name"))?;
        let price = parse_field::<Decimal>("price", present(form.price))?
            .ok_or(CatalogError::MissingField("price"))?;
        let category_id = parse_field::<CategoryId>("categoryId", present(form.category_id))?
            .ok_or(CatalogError::MissingField("categoryId"))?;
        check_price(price)?;
        let stock_quantity =
            check_stock(parse_field("stockQuantity", present(form.stock_quantity))?)?
                .unwrap_or(0);

        let image_url = self.store_image(image).await?;
        let created = self
            .store
            .create_product(&NewProduct {
                name,
                description: present(form.description),
                price,
                category_id,
                image_url: image_url.clone(),
                stock_quantity,
                is_featured: is_checked(form.is_featured.as_deref()),
            })
            .await;
        let product = match created {
            Ok(product) => product,
            Err(e) => {
                self.discard_image(image_url.as_deref()).await;
                return Err(category_missing(e));
            }
        };

        info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Apply the staff form to an existing product.
    ///
    /// Only fields present in the form change, except the featured flag which
    /// the form always carries.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::MissingField` without a product id,
    /// `CatalogError::ProductNotFound` for an unknown product and
    /// `CatalogError::CategoryNotFound` for an unknown category.
    pub async fn update(
        &self,
        form: ProductForm,
        image: Option<ProductImage<'_>>,
    ) -> Result<Product, CatalogError> {
        let id = parse_field::<ProductId>("productId", present(form.product_id))?
            .ok_or(CatalogError::MissingField("productId"))?;
        let price = parse_field::<Decimal>("price", present(form.price))?;
        if let Some(price) = price {
            check_price(price)?;
        }
        let changes = ProductChanges {
            name: present(form.name),
            description: present(form.description),
            price,
            category_id: parse_field("categoryId", present(form.category_id))?,
            image_url: None,
            stock_quantity: check_stock(parse_field(
                "stockQuantity",
                present(form.stock_quantity),
            )?)?,
            is_featured: is_checked(form.is_featured.as_deref()),
        };
        if self.store.get_product(id).await?.is_none() {
            return Err(CatalogError::ProductNotFound);
        }

        let changes = ProductChanges {
            image_url: self.store_image(image).await?,
            ..changes
        };
        let product = match self.store.update_product(id, &changes).await {
            Ok(Some(product)) => product,
            outcome => {
                self.discard_image(changes.image_url.as_deref()).await;
                return Err(match outcome {
                    Err(e) => category_missing(e),
                    Ok(_) => CatalogError::ProductNotFound,
                });
            }
        };

        info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Hard-delete a product. Order history keeps its snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if it does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        if !self.store.delete_product(id).await? {
            return Err(CatalogError::ProductNotFound);
        }
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn store_image(
        &self,
        image: Option<ProductImage<'_>>,
    ) -> Result<Option<String>, CatalogError> {
        match image {
            Some(image) => Ok(Some(
                self.uploads.store(image.content_type, image.data).await?,
            )),
            None => Ok(None),
        }
    }

    async fn discard_image(&self, image_url: Option<&str>) {
        if let Some(url) = image_url {
            self.uploads.discard(url).await;
        }
    }
}

fn category_missing(e: RepositoryError) -> CatalogError {
    match e {
        RepositoryError::NotFound => CatalogError::CategoryNotFound,
        other => CatalogError::Repository(other),
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn is_checked(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim() == "true")
}

fn parse_field<T>(field: &'static str, value: Option<String>) -> Result<Option<T>, CatalogError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.parse::<T>().map_err(|e| CatalogError::InvalidField {
                field,
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn check_price(price: Decimal) -> Result<(), CatalogError> {
    if price.is_sign_negative() {
        return Err(CatalogError::InvalidField {
            field: "price",
            reason: "must not be negative".to_owned(),
        });
    }
    Ok(())
}

fn check_stock(stock: Option<i32>) -> Result<Option<i32>, CatalogError> {
    if stock.is_some_and(|s| s < 0) {
        return Err(CatalogError::InvalidField {
            field: "stockQuantity",
            reason: "must not be negative".to_owned(),
        });
    }
    Ok(stock)
}
