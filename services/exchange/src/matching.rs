//! Price-time priority matching
//!
//! [`match_order`] runs one incoming order against the contra side of the
//! book: fills print at the resting order's price, quantities are
//! decremented in place, and the remainder rests or is cancelled per the
//! caller's disposal flag. Matching never touches cash or holdings; the
//! exchange settles afterwards from the returned trades.

use crate::book::OrderBook;
use types::order::{Order, OrderStatus, Side};
use types::price::Price;
use types::trade::Trade;

/// Result of one matching pass
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Trades produced, in fill order
    pub trades: Vec<Trade>,
    /// Post-fill snapshots of every resting order that matched
    pub touched_resting: Vec<Order>,
}

/// Check if an incoming order at `incoming_price` crosses a resting order
/// at `resting_price`
pub fn crosses(incoming_side: Side, incoming_price: Price, resting_price: Price) -> bool {
    match incoming_side {
        Side::Buy => incoming_price >= resting_price,
        Side::Sell => incoming_price <= resting_price,
    }
}

/// Maximum quantity an order could fill right now without mutating the book
///
/// Walks the contra side in priority order, stopping at the first
/// non-crossing level. Used for the fill-or-kill pre-check.
pub fn fillable_quantity(book: &OrderBook, side: Side, limit: Price) -> i64 {
    book.depth(side.opposite())
        .into_iter()
        .take_while(|(price, _)| crosses(side, limit, *price))
        .map(|(_, quantity)| quantity)
        .sum()
}

/// Match `incoming` against the book, mutating both in place
///
/// Fills print at the resting price (price improvement accrues to the
/// aggressor). If quantity remains and `add_remainder_to_book` is set, the
/// remainder rests as OPEN (no fills) or PARTIAL; otherwise it is marked
/// CANCELLED. `now` stamps the produced trades.
pub fn match_order(
    book: &mut OrderBook,
    incoming: &mut Order,
    add_remainder_to_book: bool,
    now: i64,
) -> MatchOutcome {
    let contra = incoming.side.opposite();
    let mut trades = Vec::new();
    let mut touched_resting = Vec::new();

    while incoming.quantity > 0 {
        let Some(resting_price) = book.best_price(contra) else {
            break;
        };
        if !crosses(incoming.side, incoming.price, resting_price) {
            break;
        }

        let ticker = book.ticker().clone();
        let (snapshot, resting_filled) = {
            let resting = book
                .front_mut(contra)
                .expect("level with a best price is non-empty");

            let fill_quantity = incoming.quantity.min(resting.quantity);
            resting.fill(fill_quantity);
            incoming.fill(fill_quantity);

            let (buyer_id, seller_id, buy_order_id, sell_order_id) = match incoming.side {
                Side::Buy => (
                    incoming.user_id,
                    resting.user_id,
                    incoming.order_id,
                    resting.order_id,
                ),
                Side::Sell => (
                    resting.user_id,
                    incoming.user_id,
                    resting.order_id,
                    incoming.order_id,
                ),
            };

            trades.push(Trade::new(
                ticker,
                resting_price,
                fill_quantity,
                buyer_id,
                seller_id,
                buy_order_id,
                sell_order_id,
                now,
            ));

            (resting.clone(), resting.is_filled())
        };

        touched_resting.push(snapshot);
        if resting_filled {
            book.pop_front(contra);
        }
    }

    if incoming.quantity > 0 {
        if add_remainder_to_book {
            incoming.status = if incoming.has_fills() {
                OrderStatus::Partial
            } else {
                OrderStatus::Open
            };
            book.add(incoming.clone());
        } else {
            incoming.status = OrderStatus::Cancelled;
        }
    }

    MatchOutcome {
        trades,
        touched_resting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{Ticker, UserId};
    use types::order::TimeInForce;

    fn order(side: Side, price: u64, quantity: i64) -> Order {
        Order::new(
            UserId::new(),
            Ticker::new("FUN"),
            side,
            Price::from_u64(price),
            quantity,
            TimeInForce::GTC,
        )
    }

    fn book() -> OrderBook {
        OrderBook::new(Ticker::new("FUN"))
    }

    #[test]
    fn test_crosses() {
        let p100 = Price::from_u64(100);
        let p105 = Price::from_u64(105);

        assert!(crosses(Side::Buy, p105, p100));
        assert!(crosses(Side::Buy, p100, p100));
        assert!(!crosses(Side::Buy, p100, p105));

        assert!(crosses(Side::Sell, p100, p105));
        assert!(crosses(Side::Sell, p100, p100));
        assert!(!crosses(Side::Sell, p105, p100));
    }

    #[test]
    fn test_full_match_at_resting_price() {
        let mut book = book();
        book.add(order(Side::Sell, 100, 10));

        let mut incoming = order(Side::Buy, 105, 10);
        let outcome = match_order(&mut book, &mut incoming, true, 1);

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].price, Price::from_u64(100));
        assert_eq!(outcome.trades[0].quantity, 10);
        assert_eq!(incoming.status, OrderStatus::Filled);
        assert!(book.is_empty());
    }

    #[test]
    fn test_partial_fill_rests_remainder() {
        let mut book = book();
        book.add(order(Side::Sell, 100, 5));

        let mut incoming = order(Side::Buy, 100, 10);
        let outcome = match_order(&mut book, &mut incoming, true, 1);

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].quantity, 5);
        assert_eq!(incoming.quantity, 5);
        assert_eq!(incoming.status, OrderStatus::Partial);
        assert_eq!(book.best_bid(), Some(Price::from_u64(100)));
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn test_remainder_not_added_is_cancelled() {
        let mut book = book();
        book.add(order(Side::Sell, 100, 5));

        let mut incoming = order(Side::Buy, 100, 10);
        let outcome = match_order(&mut book, &mut incoming, false, 1);

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(incoming.status, OrderStatus::Cancelled);
        assert!(book.best_bid().is_none(), "remainder must not rest");
    }

    #[test]
    fn test_no_cross_rests_whole_order() {
        let mut book = book();
        book.add(order(Side::Sell, 105, 10));

        let mut incoming = order(Side::Buy, 100, 10);
        let outcome = match_order(&mut book, &mut incoming, true, 1);

        assert!(outcome.trades.is_empty());
        assert_eq!(incoming.status, OrderStatus::Open);
        assert_eq!(book.best_bid(), Some(Price::from_u64(100)));
        assert_eq!(book.best_ask(), Some(Price::from_u64(105)));
    }

    #[test]
    fn test_walks_levels_in_price_order() {
        let mut book = book();
        book.add(order(Side::Sell, 101, 5));
        book.add(order(Side::Sell, 100, 5));

        let mut incoming = order(Side::Buy, 101, 10);
        let outcome = match_order(&mut book, &mut incoming, true, 1);

        assert_eq!(outcome.trades.len(), 2);
        assert_eq!(outcome.trades[0].price, Price::from_u64(100));
        assert_eq!(outcome.trades[1].price, Price::from_u64(101));
        assert!(incoming.is_filled());
    }

    #[test]
    fn test_fifo_within_level() {
        let mut book = book();
        let first = order(Side::Sell, 100, 5);
        let first_id = first.order_id;
        book.add(first);
        book.add(order(Side::Sell, 100, 5));

        let mut incoming = order(Side::Buy, 100, 5);
        let outcome = match_order(&mut book, &mut incoming, true, 1);

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].sell_order_id, first_id);
        assert_eq!(book.depth(Side::Sell), vec![(Price::from_u64(100), 5)]);
    }

    #[test]
    fn test_touched_resting_snapshots() {
        let mut book = book();
        book.add(order(Side::Sell, 100, 5));
        book.add(order(Side::Sell, 100, 10));

        let mut incoming = order(Side::Buy, 100, 8);
        let outcome = match_order(&mut book, &mut incoming, true, 1);

        assert_eq!(outcome.touched_resting.len(), 2);
        assert_eq!(outcome.touched_resting[0].status, OrderStatus::Filled);
        assert_eq!(outcome.touched_resting[0].quantity, 0);
        assert_eq!(outcome.touched_resting[1].status, OrderStatus::Partial);
        assert_eq!(outcome.touched_resting[1].quantity, 7);
    }

    #[test]
    fn test_buyer_seller_resolution_for_sell_aggressor() {
        let mut book = book();
        let resting = order(Side::Buy, 100, 5);
        let resting_user = resting.user_id;
        let resting_id = resting.order_id;
        book.add(resting);

        let mut incoming = order(Side::Sell, 100, 5);
        let outcome = match_order(&mut book, &mut incoming, true, 1);

        let trade = &outcome.trades[0];
        assert_eq!(trade.buyer_id, resting_user);
        assert_eq!(trade.seller_id, incoming.user_id);
        assert_eq!(trade.buy_order_id, resting_id);
        assert_eq!(trade.sell_order_id, incoming.order_id);
    }

    #[test]
    fn test_fillable_quantity_respects_limit() {
        let mut book = book();
        book.add(order(Side::Sell, 100, 5));
        book.add(order(Side::Sell, 101, 7));
        book.add(order(Side::Sell, 110, 100));

        assert_eq!(fillable_quantity(&book, Side::Buy, Price::from_u64(101)), 12);
        assert_eq!(fillable_quantity(&book, Side::Buy, Price::from_u64(100)), 5);
        assert_eq!(fillable_quantity(&book, Side::Buy, Price::from_u64(99)), 0);
    }

    #[test]
    fn test_fillable_quantity_does_not_mutate() {
        let mut book = book();
        book.add(order(Side::Sell, 100, 5));

        fillable_quantity(&book, Side::Buy, Price::from_u64(100));
        assert_eq!(book.order_count(Side::Sell), 1);
        assert_eq!(book.depth(Side::Sell), vec![(Price::from_u64(100), 5)]);
    }
}
