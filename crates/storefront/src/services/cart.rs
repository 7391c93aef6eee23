//! Cart operations for one shopper.

use thiserror::Error;

use zahra_core::{CartItemId, CartOwner, ProductId};

use crate::db::{RepositoryError, Store};
use crate::models::CartView;

/// Largest quantity a single add or update may set.
pub const MAX_LINE_QUANTITY: i32 = 999;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Quantity must be between 1 and {MAX_LINE_QUANTITY}")]
    InvalidQuantity,
    #[error("Product not found")]
    ProductNotFound,
    #[error("Cart item not found")]
    LineNotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Cart service scoped to a store.
pub struct CartService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> CartService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The owner's cart with its running total.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the lines cannot be read.
    pub async fn view(&self, owner: &CartOwner) -> Result<CartView, CartError> {
        let lines = self.store.cart_lines(&owner.key()).await?;
        Ok(CartView::new(lines))
    }

    /// Add a product, incrementing the existing line if there is one. The
    /// line never grows past `MAX_LINE_QUANTITY`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for quantities outside
    /// `1..=MAX_LINE_QUANTITY` and `CartError::ProductNotFound` for unknown
    /// products.
    pub async fn add(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), CartError> {
        if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
            return Err(CartError::InvalidQuantity);
        }
        self.store
            .add_cart_item(&owner.key(), product_id, quantity, MAX_LINE_QUANTITY)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ProductNotFound,
                other => CartError::Repository(other),
            })
    }

    /// Set a line's quantity; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the owner has no such line.
    pub async fn set_quantity(
        &self,
        owner: &CartOwner,
        id: CartItemId,
        quantity: i32,
    ) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove(owner, id).await;
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity);
        }
        if self
            .store
            .set_cart_quantity(&owner.key(), id, quantity)
            .await?
        {
            Ok(())
        } else {
            Err(CartError::LineNotFound)
        }
    }

    /// Remove one of the owner's lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the owner has no such line.
    pub async fn remove(&self, owner: &CartOwner, id: CartItemId) -> Result<(), CartError> {
        if self.store.remove_cart_item(&owner.key(), id).await? {
            Ok(())
        } else {
            Err(CartError::LineNotFound)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;
    use zahra_core::{GuestToken, UserId};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewProduct;

    async fn store_with_product() -> (MemoryStore, ProductId) {
        let store = MemoryStore::new();
        let category = store.add_category("Lawn", "lawn");
        let product = store
            .create_product(&NewProduct {
                name: "Embroidered lawn suit".to_owned(),
                description: None,
                price: Decimal::from(1000),
                category_id: category.id,
                image_url: None,
                stock_quantity: 10,
                is_featured: true,
            })
            .await
            .unwrap();
        (store, product.id)
    }

    #[tokio::test]
    async fn adding_twice_sums_quantities() {
        let (store, product) = store_with_product().await;
        let cart = CartService::new(&store);
        let owner = CartOwner::Guest(GuestToken::generate());

        cart.add(&owner, product, 2).await.unwrap();
        cart.add(&owner, product, 3).await.unwrap();

        let view = cart.view(&owner).await.unwrap();
        assert_eq!(view.count, 1);
        assert_eq!(view.cart_items[0].quantity, 5);
        assert_eq!(view.total, Decimal::from(5000));
    }

    #[tokio::test]
    async fn zero_or_negative_quantity_removes_the_line() {
        let (store, product) = store_with_product().await;
        let cart = CartService::new(&store);
        let owner = CartOwner::Authenticated(UserId::new(7));

        for quantity in [0, -3] {
            cart.add(&owner, product, 1).await.unwrap();
            let line = cart.view(&owner).await.unwrap().cart_items[0].id;
            cart.set_quantity(&owner, line, quantity).await.unwrap();
            assert!(cart.view(&owner).await.unwrap().cart_items.is_empty());
        }
    }

    #[tokio::test]
    async fn another_owner_cannot_touch_a_line() {
        let (store, product) = store_with_product().await;
        let cart = CartService::new(&store);
        let alice = CartOwner::Guest(GuestToken::generate());
        let mallory = CartOwner::Guest(GuestToken::generate());

        cart.add(&alice, product, 1).await.unwrap();
        let line = cart.view(&alice).await.unwrap().cart_items[0].id;

        assert!(matches!(
            cart.set_quantity(&mallory, line, 50).await,
            Err(CartError::LineNotFound)
        ));
        assert!(matches!(
            cart.remove(&mallory, line).await,
            Err(CartError::LineNotFound)
        ));
        assert_eq!(cart.view(&alice).await.unwrap().cart_items[0].quantity, 1);
    }

    #[tokio::test]
    async fn rejects_unknown_products_and_bad_quantities() {
        let (store, product) = store_with_product().await;
        let cart = CartService::new(&store);
        let owner = CartOwner::Guest(GuestToken::generate());

        assert!(matches!(
            cart.add(&owner, ProductId::new(9999), 1).await,
            Err(CartError::ProductNotFound)
        ));
        assert!(matches!(
            cart.add(&owner, product, 0).await,
            Err(CartError::InvalidQuantity)
        ));
        assert!(matches!(
            cart.add(&owner, product, MAX_LINE_QUANTITY + 1).await,
            Err(CartError::InvalidQuantity)
        ));
    }

    #[tokio::test]
    async fn repeated_adds_stop_at_the_line_limit() {
        let (store, product) = store_with_product().await;
        let cart = CartService::new(&store);
        let owner = CartOwner::Guest(GuestToken::generate());

        cart.add(&owner, product, MAX_LINE_QUANTITY).await.unwrap();
        cart.add(&owner, product, 5).await.unwrap();

        let view = cart.view(&owner).await.unwrap();
        assert_eq!(view.count, 1);
        assert_eq!(view.cart_items[0].quantity, MAX_LINE_QUANTITY);
    }
}
