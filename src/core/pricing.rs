//! Price calculations over orderdetails and their price steps.

use crate::{
    entities::{Orderdetail, orderdetail, pricedetail},
    errors::Result,
};
use sea_orm::prelude::*;

/// An orderdetail together with its price steps
pub type OrderdetailPrices = (orderdetail::Model, Vec<pricedetail::Model>);

/// Price of one part in a price step
#[must_use]
pub fn unit_price(detail: &pricedetail::Model) -> f64 {
    let quantity = if detail.price_related_quantity > 0.0 {
        detail.price_related_quantity
    } else {
        1.0
    };
    detail.price / quantity
}

/// Finds the price step that applies when ordering `amount` parts: the one
/// with the largest minimum quantity not above `amount`.
#[must_use]
pub fn find_price_step(pricedetails: &[pricedetail::Model], amount: f64) -> Option<&pricedetail::Model> {
    pricedetails
        .iter()
        .filter(|detail| detail.min_discount_quantity <= amount)
        .max_by(|a, b| a.min_discount_quantity.total_cmp(&b.min_discount_quantity))
}

/// Unit price when ordering `amount` parts, None when `amount` is below every step.
#[must_use]
pub fn price_for_amount(pricedetails: &[pricedetail::Model], amount: f64) -> Option<f64> {
    find_price_step(pricedetails, amount).map(unit_price)
}

fn active(orderdetails: &[OrderdetailPrices]) -> impl Iterator<Item = &OrderdetailPrices> {
    orderdetails.iter().filter(|(detail, _)| !detail.obsolete)
}

/// Smallest amount any supplier sells.
#[must_use]
pub fn min_order_amount(orderdetails: &[OrderdetailPrices]) -> Option<f64> {
    active(orderdetails)
        .flat_map(|(_, prices)| prices.iter().map(|p| p.min_discount_quantity))
        .min_by(f64::total_cmp)
}

/// Largest amount that still gets a better price step.
#[must_use]
pub fn max_discount_amount(orderdetails: &[OrderdetailPrices]) -> Option<f64> {
    active(orderdetails)
        .flat_map(|(_, prices)| prices.iter().map(|p| p.min_discount_quantity))
        .max_by(f64::total_cmp)
}

/// Mean unit price over all suppliers offering a price for `amount` parts.
/// Without an amount the minimum order amount is used. Obsolete orderdetails
/// are ignored; None when nobody offers a price.
#[must_use]
pub fn average_unit_price(orderdetails: &[OrderdetailPrices], amount: Option<f64>) -> Option<f64> {
    let amount = amount.or_else(|| min_order_amount(orderdetails))?;
    let prices: Vec<f64> = active(orderdetails)
        .filter_map(|(_, steps)| price_for_amount(steps, amount))
        .collect();

    if prices.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = prices.len() as f64;
    Some(prices.iter().sum::<f64>() / count)
}

/// Loads the orderdetails of a part with their price steps.
pub async fn get_part_prices<C: ConnectionTrait>(db: &C, part_id: i64) -> Result<Vec<OrderdetailPrices>> {
    Orderdetail::find()
        .filter(orderdetail::Column::PartId.eq(part_id))
        .find_with_related(pricedetail::Entity)
        .all(db)
        .await
        .map_err(Into::into)
}
