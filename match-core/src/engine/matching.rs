use crate::prelude::*;
use tracing::trace;

/// Runs the price-time priority matching kernel for one incoming order
/// against `book`, then rests, cancels, or rejects the remainder per the
/// order's time-in-force and post-only flag.
///
/// Returns the final order (status/filled_quantity set to their terminal
/// values for this call — note this is a snapshot: if the order was rested,
/// the book's own copy is the live one from here on) together with the
/// fills produced, in pairs (aggressor, then passive), in sweep order (best
/// opposite price first, then FIFO within a level). The caller is
/// responsible for indexing the order (or not) based on its final status.
pub fn add_order(book: &mut Book, mut order: Order) -> (Order, Vec<Fill>) {
    let opposite = order.side.opposite();

    if order.post_only && crosses(book, &order, opposite) {
        order.status = OrderStatus::Rejected;
        return (order, Vec::new());
    }

    let mut fills = Vec::new();

    while order.remaining() > 0 && crosses(book, &order, opposite) {
        let head_id = book
            .best_level_head(opposite)
            .expect("a crossing level must have a resting head order");
        let price = book
            .best_price(opposite)
            .expect("a crossing level must have a best price");

        let traded = {
            let maker = book
                .get_mut(head_id)
                .expect("head order id must be present in the arena");
            let traded = order.remaining().min(maker.remaining());
            maker.filled_quantity += traded;
            maker.status = if maker.is_filled() {
                OrderStatus::Filled
            } else {
                OrderStatus::Partial
            };
            traded
        };
        order.filled_quantity += traded;
        book.last_trade_price = Some(price);

        let maker = book.get(head_id).expect("maker still present");
        fills.push(Fill {
            order_id: order.id,
            user_id: order.user_id,
            instrument_id: order.instrument_id,
            side: order.side,
            price,
            quantity: traded,
            timestamp: order.timestamp,
        });
        fills.push(Fill {
            order_id: maker.id,
            user_id: maker.user_id,
            instrument_id: maker.instrument_id,
            side: maker.side,
            price,
            quantity: traded,
            timestamp: order.timestamp,
        });

        if book.get(head_id).expect("maker still present").is_filled() {
            book.remove_filled_head(opposite, price);
        }

        trace!(
            instrument_id = order.instrument_id,
            price,
            quantity = traded,
            aggressor = order.id,
            passive = head_id,
            "matched"
        );
    }

    if order.is_filled() {
        order.status = OrderStatus::Filled;
        (order, fills)
    } else if order.tif == TimeInForce::Ioc {
        order.status = OrderStatus::Cancelled;
        (order, fills)
    } else {
        order.status = if order.filled_quantity > 0 {
            OrderStatus::Partial
        } else {
            OrderStatus::Pending
        };
        let snapshot = order.clone();
        book.insert_resting(order);
        (snapshot, fills)
    }
}

/// Whether `order` would cross the opposite side's current best price.
fn crosses(book: &Book, order: &Order, opposite: Side) -> bool {
    let Some(best) = book.best_price(opposite) else {
        return false;
    };
    match order.side {
        Side::Buy => order.limit_price >= best,
        Side::Sell => order.limit_price <= best,
    }
}

/// Cancels a resting order, returning the removed order (status set to
/// `Cancelled`) or `None` if it wasn't live in this book.
pub fn cancel_order(book: &mut Book, order_id: OrderId) -> Option<Order> {
    let mut order = book.remove(order_id)?;
    order.status = OrderStatus::Cancelled;
    Some(order)
}
