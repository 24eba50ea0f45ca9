//! Price level with FIFO queue
//!
//! A price level holds all resting orders at one price point. Orders are
//! kept in arrival order to enforce time priority; the matching loop mutates
//! the front order in place as fills accrue.

use std::collections::VecDeque;
use types::ids::{OrderId, UserId};
use types::order::Order;

/// Resting orders at a single price, oldest first
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<Order>,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
        }
    }

    /// Insert an order at the back of the queue (time priority)
    pub fn push_back(&mut self, order: Order) {
        self.orders.push_back(order);
    }

    /// Peek at the front order without removing it
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Mutable access to the front order (matching decrements it in place)
    pub fn front_mut(&mut self) -> Option<&mut Order> {
        self.orders.front_mut()
    }

    /// Pop the front order from the queue
    pub fn pop_front(&mut self) -> Option<Order> {
        self.orders.pop_front()
    }

    /// Remove an order from the queue by id, preserving the order of the rest
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let position = self.orders.iter().position(|o| &o.order_id == order_id)?;
        self.orders.remove(position)
    }

    /// Remove every order owned by `user_id`, preserving the order of the rest
    pub fn remove_by_user(&mut self, user_id: &UserId) -> Vec<Order> {
        let mut removed = Vec::new();
        let mut kept = VecDeque::with_capacity(self.orders.len());
        for order in self.orders.drain(..) {
            if &order.user_id == user_id {
                removed.push(order);
            } else {
                kept.push_back(order);
            }
        }
        self.orders = kept;
        removed
    }

    /// Total remaining quantity at this level
    pub fn total_quantity(&self) -> i64 {
        self.orders.iter().map(|o| o.quantity).sum()
    }

    /// Check if the price level is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Number of orders at this level
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Iterate resting orders in time priority
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::Ticker;
    use types::order::{Side, TimeInForce};
    use types::price::Price;

    fn order_for(user_id: UserId, quantity: i64) -> Order {
        Order::new(
            user_id,
            Ticker::new("FUN"),
            Side::Buy,
            Price::from_u64(100),
            quantity,
            TimeInForce::GTC,
        )
    }

    #[test]
    fn test_fifo_order() {
        let mut level = PriceLevel::new();
        let first = order_for(UserId::new(), 1);
        let first_id = first.order_id;

        level.push_back(first);
        level.push_back(order_for(UserId::new(), 2));
        level.push_back(order_for(UserId::new(), 3));

        assert_eq!(level.front().unwrap().order_id, first_id);
        assert_eq!(level.order_count(), 3);
        assert_eq!(level.total_quantity(), 6);
    }

    #[test]
    fn test_remove_by_id() {
        let mut level = PriceLevel::new();
        let a = order_for(UserId::new(), 1);
        let b = order_for(UserId::new(), 2);
        let b_id = b.order_id;

        level.push_back(a);
        level.push_back(b);

        let removed = level.remove(&b_id).unwrap();
        assert_eq!(removed.order_id, b_id);
        assert_eq!(level.order_count(), 1);
        assert!(level.remove(&b_id).is_none());
    }

    #[test]
    fn test_remove_by_user() {
        let mut level = PriceLevel::new();
        let target = UserId::new();
        let other = UserId::new();

        level.push_back(order_for(target, 1));
        level.push_back(order_for(other, 2));
        level.push_back(order_for(target, 3));

        let removed = level.remove_by_user(&target);
        assert_eq!(removed.len(), 2);
        assert_eq!(level.order_count(), 1);
        assert_eq!(level.front().unwrap().user_id, other);
    }

    #[test]
    fn test_front_mut_decrement() {
        let mut level = PriceLevel::new();
        level.push_back(order_for(UserId::new(), 10));

        level.front_mut().unwrap().fill(4);
        assert_eq!(level.total_quantity(), 6);
    }
}
