//! In-process [`Store`] used by tests.
//!
//! Mirrors the Postgres constraints the services rely on: unique order
//! numbers and emails, one cart line per (owner, product), foreign keys
//! reported as `NotFound`, and all-or-nothing multi-row writes. A failure can
//! be injected into order creation to exercise the rollback path.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;

use zahra_core::{
    CartItemId, CategoryId, Email, OrderId, OrderItemId, OrderNumber, OrderStatus,
    PaymentProofId, PaymentStatus, ProductId, UserId, VerificationStatus,
};

use super::{RepositoryError, Store};
use crate::models::{
    CartLine, Category, DashboardStats, NewOrder, NewProduct, Order, OrderItem, OrderSummary,
    OrderUpdate, PaymentProof, Product, ProductChanges, ProductFilter, ProofVerification, User,
};

#[derive(Debug, Clone)]
struct CartRecord {
    id: CartItemId,
    owner_key: String,
    product_id: ProductId,
    quantity: i32,
}

#[derive(Debug, Default)]
struct Tables {
    next_id: i32,
    categories: Vec<Category>,
    products: Vec<Product>,
    cart_items: Vec<CartRecord>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    payment_proofs: Vec<PaymentProof>,
    users: Vec<(User, String)>,
    /// Zero-based index of the item insert that fails in the next order.
    fail_order_item_at: Option<usize>,
    /// Status written by a simulated concurrent writer just before the next
    /// order update.
    interleaved_status: Option<OrderStatus>,
    /// Fail the next payment proof insert.
    fail_proof_attach: bool,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn product_mut(&mut self, id: ProductId) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    fn order_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id == id)
    }

    fn join_category(&self, product: &mut Product) {
        let category = product.category_id.and_then(|id| self.category(id));
        product.category_name = category.map(|c| c.name.clone());
        product.category_slug = category.map(|c| c.slug.clone());
    }
}

/// Thread-safe in-memory store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a category (categories are seeded, not managed through the API).
    pub fn add_category(&self, name: &str, slug: &str) -> Category {
        let mut tables = self.lock();
        let category = Category {
            id: CategoryId::new(tables.next_id()),
            name: name.to_owned(),
            slug: slug.to_owned(),
            created_at: Utc::now(),
        };
        tables.categories.push(category.clone());
        category
    }

    /// Make the `index`-th (zero-based) item insert of the next order fail.
    pub fn fail_order_item_insert(&self, index: usize) {
        self.lock().fail_order_item_at = Some(index);
    }

    /// Make the next payment proof insert fail.
    pub fn fail_proof_attach(&self) {
        self.lock().fail_proof_attach = true;
    }

    /// Have another writer set the order status just before the next order
    /// update is applied.
    pub fn interleave_order_status(&self, status: OrderStatus) {
        self.lock().interleaved_status = Some(status);
    }

    /// Number of order rows.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    /// Number of order item rows across all orders.
    #[must_use]
    pub fn order_item_count(&self) -> usize {
        self.lock().order_items.len()
    }
}

impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories = self.lock().categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.lock();
        let limit = filter
            .limit
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(0));
        let products = tables
            .products
            .iter()
            .rev()
            .filter(|p| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|slug| p.category_slug.as_ref() == Some(slug))
            })
            .filter(|p| !filter.featured || p.is_featured)
            .take(limit)
            .cloned()
            .collect();
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.lock().product(id).cloned())
    }

    async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.lock();
        if tables.category(new.category_id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        let now = Utc::now();
        let mut product = Product {
            id: ProductId::new(tables.next_id()),
            name: new.name.clone(),
            description: new.description.clone(),
            price: new.price,
            category_id: Some(new.category_id),
            image_url: new.image_url.clone(),
            stock_quantity: new.stock_quantity,
            is_featured: new.is_featured,
            created_at: now,
            updated_at: now,
            category_name: None,
            category_slug: None,
        };
        tables.join_category(&mut product);
        tables.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.lock();
        if let Some(category_id) = changes.category_id
            && tables.category(category_id).is_none()
        {
            return Err(RepositoryError::NotFound);
        }
        let Some(mut product) = tables.product(id).cloned() else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            product.name.clone_from(name);
        }
        if let Some(description) = &changes.description {
            product.description = Some(description.clone());
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(category_id) = changes.category_id {
            product.category_id = Some(category_id);
        }
        if let Some(image_url) = &changes.image_url {
            product.image_url = Some(image_url.clone());
        }
        if let Some(stock) = changes.stock_quantity {
            product.stock_quantity = stock;
        }
        product.is_featured = changes.is_featured;
        product.updated_at = Utc::now();
        tables.join_category(&mut product);

        if let Some(slot) = tables.product_mut(id) {
            *slot = product.clone();
        }
        Ok(Some(product))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        if tables.products.len() == before {
            return Ok(false);
        }
        tables.cart_items.retain(|line| line.product_id != id);
        for item in &mut tables.order_items {
            if item.product_id == Some(id) {
                item.product_id = None;
            }
        }
        Ok(true)
    }

    async fn cart_lines(&self, owner_key: &str) -> Result<Vec<CartLine>, RepositoryError> {
        let tables = self.lock();
        let lines = tables
            .cart_items
            .iter()
            .rev()
            .filter(|line| line.owner_key == owner_key)
            .filter_map(|line| {
                tables.product(line.product_id).map(|p| CartLine {
                    id: line.id,
                    quantity: line.quantity,
                    product_id: p.id,
                    name: p.name.clone(),
                    price: p.price,
                    image_url: p.image_url.clone(),
                    stock_quantity: p.stock_quantity,
                })
            })
            .collect();
        Ok(lines)
    }

    async fn add_cart_item(
        &self,
        owner_key: &str,
        product_id: ProductId,
        quantity: i32,
        max_quantity: i32,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if tables.product(product_id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        if let Some(line) = tables
            .cart_items
            .iter_mut()
            .find(|line| line.owner_key == owner_key && line.product_id == product_id)
        {
            line.quantity = line.quantity.saturating_add(quantity).min(max_quantity);
            return Ok(());
        }
        let id = CartItemId::new(tables.next_id());
        tables.cart_items.push(CartRecord {
            id,
            owner_key: owner_key.to_owned(),
            product_id,
            quantity,
        });
        Ok(())
    }

    async fn set_cart_quantity(
        &self,
        owner_key: &str,
        id: CartItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        let line = tables
            .cart_items
            .iter_mut()
            .find(|line| line.id == id && line.owner_key == owner_key);
        match line {
            Some(line) => {
                line.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_cart_item(
        &self,
        owner_key: &str,
        id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        let before = tables.cart_items.len();
        tables
            .cart_items
            .retain(|line| !(line.id == id && line.owner_key == owner_key));
        Ok(tables.cart_items.len() < before)
    }

    async fn insert_order(&self, new: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.lock();
        let fail_at = tables.fail_order_item_at.take();
        if tables
            .orders
            .iter()
            .any(|o| o.order_number == new.order_number)
        {
            return Err(RepositoryError::Conflict(
                "order number already exists".to_owned(),
            ));
        }

        // Stage every row before touching the tables.
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(tables.next_id()),
            order_number: new.order_number.clone(),
            customer_name: new.customer_name.clone(),
            customer_phone: new.customer_phone.clone(),
            customer_email: new.customer_email.clone(),
            delivery_address: new.delivery_address.clone(),
            city: new.city.clone(),
            postal_code: new.postal_code.clone(),
            total_amount: new.total_amount,
            payment_method: new.payment_method,
            order_status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            notes: new.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        let mut items = Vec::with_capacity(new.items.len());
        for (index, item) in new.items.iter().enumerate() {
            if fail_at == Some(index) {
                return Err(RepositoryError::Database(sqlx::Error::Protocol(
                    "injected order item failure".to_owned(),
                )));
            }
            if let Some(product_id) = item.product_id
                && tables.product(product_id).is_none()
            {
                return Err(RepositoryError::NotFound);
            }
            items.push(OrderItem {
                id: OrderItemId::new(tables.next_id()),
                order_id: order.id,
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                product_price: item.product_price,
                quantity: item.quantity,
                subtotal: item.subtotal,
            });
        }

        tables.orders.push(order.clone());
        tables.order_items.extend(items);
        Ok(order)
    }

    async fn find_order_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        let tables = self.lock();
        Ok(tables
            .orders
            .iter()
            .find(|o| &o.order_number == number)
            .cloned())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let tables = self.lock();
        Ok(tables
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let tables = self.lock();
        let orders = tables
            .orders
            .iter()
            .rev()
            .filter(|o| status.is_none_or(|s| o.order_status == s))
            .map(|o| OrderSummary {
                order: o.clone(),
                item_count: tables
                    .order_items
                    .iter()
                    .filter(|item| item.order_id == o.id)
                    .count()
                    .try_into()
                    .unwrap_or(i64::MAX),
            })
            .collect();
        Ok(orders)
    }

    async fn update_order(
        &self,
        id: OrderId,
        update: OrderUpdate,
        observed: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tables = self.lock();
        let interleaved = tables.interleaved_status.take();
        let Some(order) = tables.order_mut(id) else {
            return Ok(None);
        };
        if let Some(status) = interleaved {
            order.order_status = status;
        }
        if order.order_status != observed {
            return Ok(None);
        }
        if let Some(status) = update.order_status {
            order.order_status = status;
        }
        if let Some(status) = update.payment_status {
            order.payment_status = status;
        }
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn latest_payment_proof(
        &self,
        order_id: OrderId,
    ) -> Result<Option<PaymentProof>, RepositoryError> {
        let tables = self.lock();
        Ok(tables
            .payment_proofs
            .iter()
            .rev()
            .find(|p| p.order_id == order_id)
            .cloned())
    }

    async fn attach_payment_proof(
        &self,
        order_id: OrderId,
        image_url: &str,
    ) -> Result<PaymentProof, RepositoryError> {
        let mut tables = self.lock();
        if std::mem::take(&mut tables.fail_proof_attach) {
            return Err(RepositoryError::Database(sqlx::Error::Protocol(
                "injected payment proof failure".to_owned(),
            )));
        }
        let id = PaymentProofId::new(tables.next_id());
        let now = Utc::now();
        let order = tables.order_mut(order_id).ok_or(RepositoryError::NotFound)?;
        order.payment_status = PaymentStatus::ProofUploaded;
        order.updated_at = now;

        let proof = PaymentProof {
            id,
            order_id,
            proof_image_url: image_url.to_owned(),
            verification_status: VerificationStatus::Pending,
            verified_by: None,
            verified_at: None,
            created_at: now,
        };
        tables.payment_proofs.push(proof.clone());
        Ok(proof)
    }

    async fn get_payment_proof(
        &self,
        id: PaymentProofId,
    ) -> Result<Option<PaymentProof>, RepositoryError> {
        Ok(self
            .lock()
            .payment_proofs
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn record_proof_decision(
        &self,
        id: PaymentProofId,
        verification: &ProofVerification,
    ) -> Result<Option<PaymentProof>, RepositoryError> {
        let mut tables = self.lock();
        let Some(proof) = tables.payment_proofs.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if proof.verification_status.is_decided() {
            return Err(RepositoryError::Conflict(
                "payment proof has already been reviewed".to_owned(),
            ));
        }
        proof.verification_status = verification.decision.into();
        proof.verified_by = verification
            .verified_by
            .as_ref()
            .map(|email| email.as_str().to_owned());
        proof.verified_at = Some(verification.verified_at);
        let proof = proof.clone();

        if proof.verification_status == VerificationStatus::Approved
            && let Some(order) = tables.order_mut(proof.order_id)
        {
            order.payment_status = PaymentStatus::Confirmed;
            order.updated_at = Utc::now();
        }
        Ok(Some(proof))
    }

    async fn create_user(&self, email: &Email, password_hash: &str) -> Result<User, RepositoryError> {
        let mut tables = self.lock();
        if tables.users.iter().any(|(user, _)| &user.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let now = Utc::now();
        let user = User {
            id: UserId::new(tables.next_id()),
            email: email.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.push((user.clone(), password_hash.to_owned()));
        Ok(user)
    }

    async fn find_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.lock();
        Ok(tables
            .users
            .iter()
            .find(|(user, _)| &user.email == email)
            .cloned())
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, RepositoryError> {
        let tables = self.lock();
        let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        Ok(DashboardStats {
            total_orders: count(tables.orders.len()),
            pending_orders: count(
                tables
                    .orders
                    .iter()
                    .filter(|o| o.order_status == OrderStatus::Pending)
                    .count(),
            ),
            total_revenue: tables.orders.iter().map(|o| o.total_amount).sum::<Decimal>(),
            product_count: count(tables.products.len()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use zahra_core::PaymentMethod;

    use super::*;
    use crate::models::NewOrderItem;

    fn new_product(category_id: CategoryId, name: &str) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: None,
            price: Decimal::from(1000),
            category_id,
            image_url: None,
            stock_quantity: 5,
            is_featured: false,
        }
    }

    fn new_order(number: &str, product_id: ProductId, lines: usize) -> NewOrder {
        NewOrder {
            order_number: OrderNumber::parse(number).unwrap(),
            customer_name: "Ayesha Khan".to_owned(),
            customer_phone: "03001234567".to_owned(),
            customer_email: None,
            delivery_address: "House 12, Street 4".to_owned(),
            city: Some("Lahore".to_owned()),
            postal_code: None,
            total_amount: Decimal::from(2200),
            payment_method: PaymentMethod::Cod,
            notes: None,
            items: (0..lines)
                .map(|_| NewOrderItem {
                    product_id: Some(product_id),
                    product_name: "Lawn suit".to_owned(),
                    product_price: Decimal::from(1000),
                    quantity: 2,
                    subtotal: Decimal::from(2000),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn cart_lines_are_scoped_to_their_owner() {
        let store = MemoryStore::new();
        let category = store.add_category("Lawn", "lawn");
        let product = store
            .create_product(&new_product(category.id, "Lawn suit"))
            .await
            .unwrap();

        store.add_cart_item("guest_a", product.id, 1, 999).await.unwrap();
        let line = store.cart_lines("guest_a").await.unwrap()[0].id;

        assert!(!store.set_cart_quantity("guest_b", line, 9).await.unwrap());
        assert!(!store.remove_cart_item("guest_b", line).await.unwrap());
        assert_eq!(store.cart_lines("guest_a").await.unwrap()[0].quantity, 1);
        assert!(store.cart_lines("guest_b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_item_failure_writes_nothing() {
        let store = MemoryStore::new();
        let category = store.add_category("Lawn", "lawn");
        let product = store
            .create_product(&new_product(category.id, "Lawn suit"))
            .await
            .unwrap();

        store.fail_order_item_insert(2);
        let result = store
            .insert_order(&new_order("ORD-1-AAAAA", product.id, 3))
            .await;
        assert!(matches!(result, Err(RepositoryError::Database(_))));
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.order_item_count(), 0);

        // The injection is one-shot.
        store
            .insert_order(&new_order("ORD-1-AAAAA", product.id, 3))
            .await
            .unwrap();
        assert_eq!(store.order_count(), 1);
        assert_eq!(store.order_item_count(), 3);
    }

    #[tokio::test]
    async fn duplicate_order_numbers_conflict() {
        let store = MemoryStore::new();
        let category = store.add_category("Lawn", "lawn");
        let product = store
            .create_product(&new_product(category.id, "Lawn suit"))
            .await
            .unwrap();

        store
            .insert_order(&new_order("ORD-1-AAAAA", product.id, 1))
            .await
            .unwrap();
        let again = store
            .insert_order(&new_order("ORD-1-AAAAA", product.id, 1))
            .await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn deleting_a_product_keeps_order_snapshots() {
        let store = MemoryStore::new();
        let category = store.add_category("Lawn", "lawn");
        let product = store
            .create_product(&new_product(category.id, "Lawn suit"))
            .await
            .unwrap();
        store.add_cart_item("user_1", product.id, 1, 999).await.unwrap();
        let order = store
            .insert_order(&new_order("ORD-1-AAAAA", product.id, 1))
            .await
            .unwrap();

        assert!(store.delete_product(product.id).await.unwrap());
        assert!(store.cart_lines("user_1").await.unwrap().is_empty());
        let items = store.order_items(order.id).await.unwrap();
        assert_eq!(items[0].product_id, None);
        assert_eq!(items[0].product_name, "Lawn suit");
    }
}
