//! Part overview command.

use super::{CliContext, to_json};
use crate::{
    core::{
        log::{TargetType, repository},
        part, pricing,
        structural::{self, PATH_DELIMITER},
    },
    errors::{Error, Result},
};
use chrono::Utc;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Serialize)]
struct LotView {
    id: i64,
    description: String,
    amount: Option<f64>,
    expired: bool,
}

#[derive(Debug, Serialize)]
struct PartView {
    id: i64,
    name: String,
    category: String,
    total_stock: f64,
    min_amount: f64,
    not_enough_instock: bool,
    lots: Vec<LotView>,
    average_unit_price: Option<f64>,
    created_by: Option<String>,
    last_edited_by: Option<String>,
}

/// Shows a part with its lots, stock and average price.
pub async fn show(ctx: &CliContext, id: i64) -> Result<String> {
    let db = &ctx.database;
    let found = part::get_part_by_id(db, id)
        .await?
        .ok_or(Error::NotFound { entity: "Part", id })?;

    let now = Utc::now();
    let lots = part::get_lots_for_part(db, id).await?;
    let categories = structural::get_all_categories(db).await?;
    let prices = pricing::get_part_prices(db, id).await?;

    let view = PartView {
        id,
        category: structural::full_path(&categories, found.category_id, PATH_DELIMITER).unwrap_or_default(),
        total_stock: part::amount_sum(&lots, now),
        min_amount: found.min_amount,
        not_enough_instock: part::is_not_enough_instock(&found, &lots, now),
        lots: lots
            .iter()
            .map(|lot| LotView {
                id: lot.id,
                description: lot.description.clone(),
                amount: (!lot.instock_unknown).then_some(lot.amount),
                expired: lot.expiration_date.is_some_and(|date| date <= now),
            })
            .collect(),
        average_unit_price: pricing::average_unit_price(&prices, None),
        created_by: repository::creating_username(db, TargetType::Part, id).await?,
        last_edited_by: repository::last_editing_username(db, TargetType::Part, id).await?,
        name: found.name,
    };

    if ctx.json {
        return to_json(&view);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{} (#{})", view.name, view.id);
    let _ = writeln!(output, "Category: {}", view.category);
    let _ = writeln!(output, "Stock: {} (minimum {})", view.total_stock, view.min_amount);
    if view.not_enough_instock {
        let _ = writeln!(output, "Not enough in stock");
    }
    for lot in &view.lots {
        let amount = lot.amount.map_or_else(|| "?".to_string(), |a| a.to_string());
        let expired = if lot.expired { " (expired)" } else { "" };
        let _ = writeln!(output, "  Lot #{}: {amount} {}{expired}", lot.id, lot.description);
    }
    if let Some(price) = view.average_unit_price {
        let _ = writeln!(output, "Average unit price: {price:.4}");
    }
    if let Some(user) = &view.created_by {
        let _ = writeln!(output, "Created by: {user}");
    }
    if let Some(user) = &view.last_edited_by {
        let _ = writeln!(output, "Last edited by: {user}");
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::cli::tests::test_context;
    use crate::core::{log::LogContext, part::NewLot};
    use crate::test_utils::{
        create_test_category, create_test_orderdetail, create_test_part, create_test_pricedetail,
    };

    #[tokio::test]
    async fn test_show_part() -> Result<()> {
        let ctx = test_context().await?;
        let db = &ctx.database;
        let category = create_test_category(db, "Resistors").await?;
        let resistor = create_test_part(db, "10k", category.id).await?;
        let lot = NewLot {
            description: "Drawer 3".into(),
            amount: 25.0,
            ..NewLot::default()
        };
        part::add_lot(db, &ctx.logger, &LogContext::cli(), resistor.id, lot).await?;
        let detail = create_test_orderdetail(db, resistor.id).await?;
        create_test_pricedetail(db, detail.id, 1.0, 0.02).await?;

        let output = show(&ctx, resistor.id).await?;
        assert!(output.starts_with("10k (#"));
        assert!(output.contains("Category: Resistors"));
        assert!(output.contains("Stock: 25 (minimum 0)"));
        assert!(output.contains("Lot #1: 25 Drawer 3"));
        assert!(output.contains("Average unit price: 0.0200"));
        assert!(output.contains("Created by: cli"));

        assert!(matches!(show(&ctx, 404).await, Err(Error::NotFound { .. })));
        Ok(())
    }
}
