//! Cart lines as shown to the shopper.

use rust_decimal::Decimal;
use serde::Serialize;

use zahra_core::{CartItemId, ProductId, line_subtotal};

/// One cart line joined with the product's current name, price and stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub quantity: i32,
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
}

/// The `GET /cart` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart_items: Vec<CartLine>,
    /// Sum of price times quantity over all lines, two decimal places.
    pub total: Decimal,
    /// Number of distinct lines.
    pub count: usize,
}

impl CartView {
    /// Build the view from lines, newest first.
    #[must_use]
    pub fn new(cart_items: Vec<CartLine>) -> Self {
        let mut total: Decimal = cart_items
            .iter()
            .map(|line| line_subtotal(line.price, line.quantity))
            .sum();
        total.rescale(2);
        Self {
            count: cart_items.len(),
            cart_items,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, price: Decimal, quantity: i32) -> CartLine {
        CartLine {
            id: CartItemId::new(id),
            quantity,
            product_id: ProductId::new(id),
            name: format!("Lawn suit {id}"),
            price,
            image_url: None,
            stock_quantity: 10,
        }
    }

    #[test]
    fn totals_every_line() {
        let view = CartView::new(vec![
            line(1, Decimal::from(1000), 2),
            line(2, Decimal::new(49_950, 2), 1),
        ]);
        assert_eq!(view.count, 2);
        assert_eq!(view.total, Decimal::new(249_950, 2));
    }

    #[test]
    fn empty_cart_serializes_with_two_decimal_total() {
        let view = CartView::new(Vec::new());
        let json = serde_json::to_value(&view).unwrap_or_default();
        assert_eq!(json["total"], "0.00");
        assert_eq!(json["count"], 0);
        assert!(json["cartItems"].as_array().is_some_and(Vec::is_empty));
    }
}
