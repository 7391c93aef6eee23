//! Checkout and order management.
//!
//! Checkout turns a client-side cart snapshot into an order. Line names and
//! prices come from the request and are stored as a snapshot; the total is
//! recomputed here and must agree with the one the client displayed.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use zahra_core::{
    OrderId, OrderNumber, OrderStatus, PaymentMethod, ProductId, ShippingPolicy, line_subtotal,
};

use crate::db::{RepositoryError, Store};
use crate::models::{NewOrder, NewOrderItem, Order, OrderDetail, OrderSummary, OrderUpdate};

/// Attempts at finding an unused order number before giving up.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Attempts at a status update while other writers keep changing the order.
const STATUS_UPDATE_ATTEMPTS: usize = 3;

/// Errors from checkout and order management.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Invalid cart item: {0}")]
    InvalidItem(String),
    #[error("Invalid payment method: {0}")]
    InvalidPaymentMethod(String),
    #[error("Order total does not match cart (expected {expected})")]
    TotalMismatch { expected: Decimal },
    #[error("Product not found")]
    UnknownProduct,
    #[error("Order number is required")]
    MissingOrderNumber,
    #[error("Order not found")]
    NotFound,
    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("No fields to update")]
    NoChanges,
    #[error("Order is being updated by another request, try again")]
    ConcurrentUpdate,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A line of the cart snapshot submitted at checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    #[serde(default, alias = "productId")]
    pub product_id: Option<ProductId>,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

/// The `POST /orders` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    pub customer_email: Option<String>,
    #[serde(default)]
    pub delivery_address: String,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub cart_items: Vec<OrderLineInput>,
    pub total_amount: Option<Decimal>,
}

/// Order service scoped to a store.
pub struct OrderService<'a, S> {
    store: &'a S,
    shipping: ShippingPolicy,
}

impl<'a, S: Store> OrderService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, shipping: ShippingPolicy) -> Self {
        Self { store, shipping }
    }

    /// Validate a checkout request and write the order with all its items.
    ///
    /// # Errors
    ///
    /// Returns a validation variant for incomplete or inconsistent requests,
    /// `OrderError::UnknownProduct` if an item references a missing product,
    /// and `OrderError::Repository` if the order could not be written.
    pub async fn place_order(&self, request: CheckoutRequest) -> Result<Order, OrderError> {
        self.place_order_with(request, || OrderNumber::generate(Utc::now(), &mut rand::rng()))
            .await
    }

    /// [`Self::place_order`] with a caller-supplied order number source.
    ///
    /// # Errors
    ///
    /// See [`Self::place_order`].
    pub async fn place_order_with(
        &self,
        request: CheckoutRequest,
        mut next_number: impl FnMut() -> OrderNumber + Send,
    ) -> Result<Order, OrderError> {
        let mut new_order = self.validate(request)?;

        let mut attempt = 1;
        loop {
            new_order.order_number = next_number();
            match self.store.insert_order(&new_order).await {
                Ok(order) => {
                    info!(
                        order_number = %order.order_number,
                        items = new_order.items.len(),
                        total = %order.total_amount,
                        "Order placed"
                    );
                    return Ok(order);
                }
                Err(RepositoryError::Conflict(_)) if attempt < ORDER_NUMBER_ATTEMPTS => {
                    warn!(
                        order_number = %new_order.order_number,
                        attempt,
                        "Order number collision, regenerating"
                    );
                    attempt += 1;
                }
                Err(RepositoryError::NotFound) => return Err(OrderError::UnknownProduct),
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn validate(&self, request: CheckoutRequest) -> Result<NewOrder, OrderError> {
        let customer_name = required(request.customer_name);
        let customer_phone = required(request.customer_phone);
        let delivery_address = required(request.delivery_address);
        let payment_method = request.payment_method.and_then(required);

        let (Some(customer_name), Some(customer_phone), Some(delivery_address), Some(method)) =
            (customer_name, customer_phone, delivery_address, payment_method)
        else {
            return Err(OrderError::MissingFields);
        };
        let payment_method = method
            .parse::<PaymentMethod>()
            .map_err(|_| OrderError::InvalidPaymentMethod(method))?;

        if request.cart_items.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let items = request
            .cart_items
            .into_iter()
            .map(|line| {
                let Some(product_name) = required(line.name) else {
                    return Err(OrderError::InvalidItem("name is required".to_owned()));
                };
                if line.quantity < 1 {
                    return Err(OrderError::InvalidItem(format!(
                        "{product_name}: quantity must be at least 1"
                    )));
                }
                if line.price.is_sign_negative() {
                    return Err(OrderError::InvalidItem(format!(
                        "{product_name}: price cannot be negative"
                    )));
                }
                Ok(NewOrderItem {
                    product_id: line.product_id,
                    subtotal: line_subtotal(line.price, line.quantity),
                    product_name,
                    product_price: line.price,
                    quantity: line.quantity,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let subtotal: Decimal = items.iter().map(|item| item.subtotal).sum();
        let expected = self.shipping.total_for(subtotal);
        // Clients may send the total as a float; compare at storage precision.
        if let Some(submitted) = request.total_amount
            && submitted.round_dp(2) != expected
        {
            return Err(OrderError::TotalMismatch { expected });
        }

        Ok(NewOrder {
            // Replaced on every insert attempt.
            order_number: OrderNumber::from_stored(String::new()),
            customer_name,
            customer_phone,
            customer_email: request.customer_email.and_then(required),
            delivery_address,
            city: request.city.and_then(required),
            postal_code: request.postal_code.and_then(required),
            total_amount: expected,
            payment_method,
            notes: request.notes.and_then(required),
            items,
        })
    }

    /// Look up an order with its items and latest payment proof.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::MissingOrderNumber` for a blank number and
    /// `OrderError::NotFound` for a malformed or unknown one.
    pub async fn order_detail(&self, order_number: &str) -> Result<OrderDetail, OrderError> {
        if order_number.trim().is_empty() {
            return Err(OrderError::MissingOrderNumber);
        }
        let number = OrderNumber::parse(order_number).map_err(|_| OrderError::NotFound)?;
        let order = self
            .store
            .find_order_by_number(&number)
            .await?
            .ok_or(OrderError::NotFound)?;
        let items = self.store.order_items(order.id).await?;
        let payment_proof = self.store.latest_payment_proof(order.id).await?;
        Ok(OrderDetail {
            order,
            items,
            payment_proof,
        })
    }

    /// All orders newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the listing fails.
    pub async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<OrderSummary>, OrderError> {
        Ok(self.store.list_orders(status).await?)
    }

    /// Apply a staff status update.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NoChanges` for an empty update,
    /// `OrderError::NotFound` for an unknown order and
    /// `OrderError::InvalidTransition` when the order status would leave the
    /// lifecycle and `OrderError::ConcurrentUpdate` if the order kept changing
    /// underneath the update.
    pub async fn update_status(&self, id: OrderId, update: OrderUpdate) -> Result<Order, OrderError> {
        if update.is_empty() {
            return Err(OrderError::NoChanges);
        }

        for _ in 0..STATUS_UPDATE_ATTEMPTS {
            let current = self.store.get_order(id).await?.ok_or(OrderError::NotFound)?;
            if let Some(next) = update.order_status
                && !current.order_status.can_transition_to(next)
            {
                return Err(OrderError::InvalidTransition {
                    from: current.order_status,
                    to: next,
                });
            }

            // Only applies while the order still has the status checked above.
            if let Some(order) = self
                .store
                .update_order(id, update, current.order_status)
                .await?
            {
                info!(
                    order_number = %order.order_number,
                    order_status = %order.order_status,
                    payment_status = %order.payment_status,
                    "Order updated"
                );
                return Ok(order);
            }
            warn!(order_id = %id, "Order status changed concurrently, re-checking");
        }

        Err(OrderError::ConcurrentUpdate)
    }
}

/// Trimmed value, or `None` when blank.
fn required(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use zahra_core::PaymentStatus;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewProduct;

    fn line(name: &str, price: i64, quantity: i32) -> OrderLineInput {
        OrderLineInput {
            product_id: None,
            name: name.to_owned(),
            price: Decimal::from(price),
            quantity,
        }
    }

    fn request(items: Vec<OrderLineInput>) -> CheckoutRequest {
        CheckoutRequest {
            customer_name: "Ayesha Khan".to_owned(),
            customer_phone: "03001234567".to_owned(),
            delivery_address: "12 Mall Road".to_owned(),
            city: Some("Lahore".to_owned()),
            payment_method: Some("jazzcash".to_owned()),
            cart_items: items,
            ..CheckoutRequest::default()
        }
    }

    fn fixed_numbers(numbers: &[&str]) -> impl FnMut() -> OrderNumber + Send + use<> {
        let mut numbers: Vec<OrderNumber> = numbers
            .iter()
            .rev()
            .map(|n| OrderNumber::parse(n).unwrap())
            .collect();
        move || numbers.pop().unwrap()
    }

    #[tokio::test]
    async fn adds_shipping_below_threshold() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());

        let mut req = request(vec![line("Lawn suit", 1000, 2)]);
        req.total_amount = Some(Decimal::from(2200));
        let order = orders.place_order(req).await.unwrap();

        assert_eq!(order.total_amount, Decimal::from(2200));
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.order_status, OrderStatus::Pending);

        let detail = orders.order_detail(order.order_number.as_str()).await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].subtotal, Decimal::from(2000));
        assert!(detail.payment_proof.is_none());
    }

    #[tokio::test]
    async fn free_shipping_at_threshold() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());

        let order = orders
            .place_order(request(vec![line("Chiffon", 1500, 2)]))
            .await
            .unwrap();
        assert_eq!(order.total_amount, Decimal::from(3000));
    }

    #[tokio::test]
    async fn rejects_mismatched_total() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());

        let mut req = request(vec![line("Lawn suit", 1000, 2)]);
        req.total_amount = Some(Decimal::from(10));
        let err = orders.place_order(req).await.unwrap_err();

        assert!(matches!(err, OrderError::TotalMismatch { expected } if expected == Decimal::from(2200)));
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn accepts_float_totals_from_the_checkout_page() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());

        // 16.08 + 200.0 is 216.07999999999998 in f64
        let req: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "customerName": "Ayesha Khan",
            "customerPhone": "03001234567",
            "deliveryAddress": "12 Mall Road",
            "paymentMethod": "cod",
            "cartItems": [{ "productId": null, "name": "Hair tie", "price": "16.08", "quantity": 1 }],
            "totalAmount": 16.08_f64 + 200.0,
        }))
        .unwrap();
        let order = orders.place_order(req).await.unwrap();

        assert_eq!(order.total_amount, Decimal::new(21_608, 2));
    }

    #[tokio::test]
    async fn rejects_incomplete_requests_without_writing() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());

        let err = orders.place_order(request(Vec::new())).await.unwrap_err();
        assert!(matches!(err, OrderError::EmptyCart));

        let mut no_phone = request(vec![line("Lawn suit", 1000, 1)]);
        no_phone.customer_phone = "   ".to_owned();
        let err = orders.place_order(no_phone).await.unwrap_err();
        assert!(matches!(err, OrderError::MissingFields));

        let mut no_method = request(vec![line("Lawn suit", 1000, 1)]);
        no_method.payment_method = None;
        let err = orders.place_order(no_method).await.unwrap_err();
        assert!(matches!(err, OrderError::MissingFields));

        let mut bad_method = request(vec![line("Lawn suit", 1000, 1)]);
        bad_method.payment_method = Some("bitcoin".to_owned());
        let err = orders.place_order(bad_method).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidPaymentMethod(_)));

        let err = orders
            .place_order(request(vec![line("Lawn suit", 1000, 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidItem(_)));

        assert_eq!(store.order_count(), 0);
        assert_eq!(store.order_item_count(), 0);
    }

    #[tokio::test]
    async fn failed_item_insert_leaves_nothing_behind() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());
        store.fail_order_item_insert(2);

        let items = vec![
            line("Lawn suit", 1000, 1),
            line("Dupatta", 500, 1),
            line("Kurta", 2500, 1),
        ];
        let err = orders.place_order(request(items)).await.unwrap_err();

        assert!(matches!(err, OrderError::Repository(RepositoryError::Database(_))));
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.order_item_count(), 0);
    }

    #[tokio::test]
    async fn writes_one_item_row_per_line() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());

        let items = vec![
            line("Lawn suit", 1000, 1),
            line("Dupatta", 500, 3),
            line("Kurta", 2500, 1),
        ];
        orders.place_order(request(items)).await.unwrap();

        assert_eq!(store.order_count(), 1);
        assert_eq!(store.order_item_count(), 3);
    }

    #[tokio::test]
    async fn retries_on_order_number_collision() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());

        let first = orders
            .place_order_with(
                request(vec![line("Lawn suit", 1000, 1)]),
                fixed_numbers(&["ORD-AAA-11111"]),
            )
            .await
            .unwrap();
        let second = orders
            .place_order_with(
                request(vec![line("Lawn suit", 1000, 1)]),
                fixed_numbers(&["ORD-AAA-11111", "ORD-AAA-22222"]),
            )
            .await
            .unwrap();

        assert_eq!(first.order_number.as_str(), "ORD-AAA-11111");
        assert_eq!(second.order_number.as_str(), "ORD-AAA-22222");
    }

    #[tokio::test]
    async fn gives_up_after_repeated_collisions() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());
        orders
            .place_order_with(
                request(vec![line("Lawn suit", 1000, 1)]),
                fixed_numbers(&["ORD-AAA-11111"]),
            )
            .await
            .unwrap();

        let err = orders
            .place_order_with(
                request(vec![line("Lawn suit", 1000, 1)]),
                fixed_numbers(&["ORD-AAA-11111"; ORDER_NUMBER_ATTEMPTS]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Repository(RepositoryError::Conflict(_))));
        assert_eq!(store.order_count(), 1);
    }

    #[tokio::test]
    async fn unknown_product_reference_is_rejected() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());

        let mut item = line("Ghost", 1000, 1);
        item.product_id = Some(ProductId::new(404));
        let err = orders.place_order(request(vec![item])).await.unwrap_err();
        assert!(matches!(err, OrderError::UnknownProduct));
    }

    #[tokio::test]
    async fn snapshot_survives_product_changes() {
        let store = MemoryStore::new();
        let category = store.add_category("Lawn", "lawn");
        let product = store
            .create_product(&NewProduct {
                name: "Printed lawn".to_owned(),
                description: None,
                price: Decimal::from(1000),
                category_id: category.id,
                image_url: None,
                stock_quantity: 5,
                is_featured: false,
            })
            .await
            .unwrap();
        let orders = OrderService::new(&store, ShippingPolicy::default());

        let mut item = line("Printed lawn", 1000, 2);
        item.product_id = Some(product.id);
        let order = orders.place_order(request(vec![item])).await.unwrap();
        store.delete_product(product.id).await.unwrap();

        let detail = orders.order_detail(order.order_number.as_str()).await.unwrap();
        assert_eq!(detail.items[0].product_id, None);
        assert_eq!(detail.items[0].product_name, "Printed lawn");
        assert_eq!(detail.items[0].product_price, Decimal::from(1000));
    }

    #[tokio::test]
    async fn detail_lookup_errors() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());

        assert!(matches!(
            orders.order_detail("  ").await,
            Err(OrderError::MissingOrderNumber)
        ));
        assert!(matches!(
            orders.order_detail("not-an-order").await,
            Err(OrderError::NotFound)
        ));
        assert!(matches!(
            orders.order_detail("ORD-ZZZ-00000").await,
            Err(OrderError::NotFound)
        ));
    }

    #[tokio::test]
    async fn status_updates_follow_the_lifecycle() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());
        let order = orders
            .place_order(request(vec![line("Lawn suit", 1000, 1)]))
            .await
            .unwrap();

        let err = orders
            .update_status(order.id, OrderUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NoChanges));

        let to = |status| OrderUpdate {
            order_status: Some(status),
            payment_status: None,
        };
        let err = orders
            .update_status(order.id, to(OrderStatus::Delivered))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));

        let updated = orders
            .update_status(order.id, to(OrderStatus::Processing))
            .await
            .unwrap();
        assert_eq!(updated.order_status, OrderStatus::Processing);
        assert!(updated.updated_at >= order.updated_at);

        let updated = orders
            .update_status(
                order.id,
                OrderUpdate {
                    order_status: None,
                    payment_status: Some(PaymentStatus::Confirmed),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.order_status, OrderStatus::Processing);
        assert_eq!(updated.payment_status, PaymentStatus::Confirmed);

        assert!(matches!(
            orders.update_status(OrderId::new(9999), to(OrderStatus::Cancelled)).await,
            Err(OrderError::NotFound)
        ));
    }

    #[tokio::test]
    async fn status_update_rechecks_after_a_concurrent_write() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());
        let order = orders
            .place_order(request(vec![line("Lawn suit", 1000, 1)]))
            .await
            .unwrap();
        let to = |status| OrderUpdate {
            order_status: Some(status),
            payment_status: None,
        };

        // Another reviewer cancels between our read and our write.
        store.interleave_order_status(OrderStatus::Cancelled);
        let err = orders
            .update_status(order.id, to(OrderStatus::Processing))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Processing,
            }
        ));
        let current = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(current.order_status, OrderStatus::Cancelled);

        let other = orders
            .place_order(request(vec![line("Dupatta", 500, 1)]))
            .await
            .unwrap();
        // A compatible concurrent write is re-checked and then built upon.
        store.interleave_order_status(OrderStatus::Processing);
        let updated = orders
            .update_status(other.id, to(OrderStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(updated.order_status, OrderStatus::Cancelled);
    }
}
