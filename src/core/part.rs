//! Part business logic - parts, their lots and stock changes.
//!
//! Stock is kept in part lots. Withdrawing, adding and moving stock always
//! happens on a lot and is recorded as a `PartStockChanged` log entry on that
//! lot, together with the part's total stock before the change.

use crate::{
    core::{
        attachments::submit,
        log::{EventLogger, LogContext, LogEvent, StockAction, TargetType},
    },
    entities::{Category, Part, PartLot, StorageLocation, orderdetail, part, part_lot, pricedetail},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

/// Data for a new part
#[derive(Debug, Clone, Default)]
pub struct NewPart {
    pub name: String,
    pub description: String,
    pub category_id: i64,
    pub footprint_id: Option<i64>,
    pub manufacturer_id: Option<i64>,
    pub manufacturer_product_number: String,
    pub ipn: Option<String>,
    pub tags: String,
    pub min_amount: f64,
}

/// Changes to a part; None leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct PartUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub comment: Option<String>,
    pub category_id: Option<i64>,
    pub footprint_id: Option<Option<i64>>,
    pub manufacturer_id: Option<Option<i64>>,
    pub manufacturer_product_number: Option<String>,
    pub tags: Option<String>,
    pub min_amount: Option<f64>,
    pub favorite: Option<bool>,
    pub needs_review: Option<bool>,
}

/// Data for a new part lot
#[derive(Debug, Clone, Default)]
pub struct NewLot {
    pub storage_location_id: Option<i64>,
    pub description: String,
    pub amount: f64,
    pub instock_unknown: bool,
    pub expiration_date: Option<DateTime<Utc>>,
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Part name cannot be empty".to_string(),
        });
    }
    Ok(name.to_string())
}

fn validate_min_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Stock changes must be positive and finite
fn validate_stock_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

async fn ensure_category_exists<C: ConnectionTrait>(db: &C, category_id: i64) -> Result<()> {
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Category",
            id: category_id,
        })?;
    Ok(())
}

async fn ensure_ipn_unique<C: ConnectionTrait>(db: &C, ipn: &str, exclude: Option<i64>) -> Result<()> {
    let mut query = Part::find().filter(part::Column::Ipn.eq(ipn));
    if let Some(id) = exclude {
        query = query.filter(part::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(Error::Validation {
            message: format!("IPN '{ipn}' is already used by another part"),
        });
    }
    Ok(())
}

/// Whether a lot counts towards the available stock at `now`
#[must_use]
pub fn is_lot_available(lot: &part_lot::Model, now: DateTime<Utc>) -> bool {
    !lot.instock_unknown && lot.expiration_date.is_none_or(|date| date > now)
}

/// Sum of the stock in all lots, ignoring lots with unknown stock and expired lots.
#[must_use]
pub fn amount_sum(lots: &[part_lot::Model], now: DateTime<Utc>) -> f64 {
    lots.iter()
        .filter(|lot| is_lot_available(lot, now))
        .map(|lot| lot.amount)
        .sum()
}

/// Whether the part has less stock than its minimum amount.
#[must_use]
pub fn is_not_enough_instock(part: &part::Model, lots: &[part_lot::Model], now: DateTime<Utc>) -> bool {
    amount_sum(lots, now) < part.min_amount
}

/// Finds a part by ID.
pub async fn get_part_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<part::Model>> {
    Part::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Retrieves all parts of a category ordered by name.
pub async fn get_parts_in_category<C: ConnectionTrait>(db: &C, category_id: i64) -> Result<Vec<part::Model>> {
    Part::find()
        .filter(part::Column::CategoryId.eq(category_id))
        .order_by_asc(part::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the lots of a part.
pub async fn get_lots_for_part<C: ConnectionTrait>(db: &C, part_id: i64) -> Result<Vec<part_lot::Model>> {
    PartLot::find()
        .filter(part_lot::Column::PartId.eq(part_id))
        .order_by_asc(part_lot::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Total available stock of a part.
pub async fn get_total_stock<C: ConnectionTrait>(db: &C, part_id: i64) -> Result<f64> {
    Ok(amount_sum(&get_lots_for_part(db, part_id).await?, Utc::now()))
}

/// Creates a part and logs its creation.
#[instrument(skip(db, logger, context, data), fields(name = %data.name))]
pub async fn create_part(
    db: &DatabaseConnection,
    logger: &EventLogger,
    context: &LogContext,
    data: NewPart,
) -> Result<part::Model> {
    let name = validate_name(&data.name)?;
    validate_min_amount(data.min_amount)?;
    let ipn = data.ipn.map(|i| i.trim().to_string()).filter(|i| !i.is_empty());

    let txn = db.begin().await?;
    ensure_category_exists(&txn, data.category_id).await?;
    if let Some(ipn) = &ipn {
        ensure_ipn_unique(&txn, ipn, None).await?;
    }

    let now = Utc::now();
    let created = part::ActiveModel {
        name: Set(name),
        description: Set(data.description),
        comment: Set(String::new()),
        category_id: Set(data.category_id),
        footprint_id: Set(data.footprint_id),
        manufacturer_id: Set(data.manufacturer_id),
        manufacturer_product_number: Set(data.manufacturer_product_number),
        manufacturer_product_url: Set(String::new()),
        manufacturing_status: Set(None),
        ipn: Set(ipn),
        tags: Set(data.tags),
        min_amount: Set(data.min_amount),
        favorite: Set(false),
        needs_review: Set(false),
        mass: Set(None),
        master_picture_attachment_id: Set(None),
        created_at: Set(Some(now)),
        last_modified: Set(Some(now)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    logger
        .log_created(&txn, context, TargetType::Part, created.id, None)
        .await?;
    txn.commit().await?;

    info!(id = created.id, "Part created");
    Ok(created)
}

/// Applies changes to a part and logs the changed fields.
pub async fn update_part(
    db: &DatabaseConnection,
    logger: &EventLogger,
    context: &LogContext,
    id: i64,
    update: PartUpdate,
) -> Result<part::Model> {
    let txn = db.begin().await?;
    let old = get_part_by_id(&txn, id)
        .await?
        .ok_or(Error::NotFound { entity: "Part", id })?;

    let mut active: part::ActiveModel = old.clone().into();
    if let Some(name) = update.name {
        active.name = Set(validate_name(&name)?);
    }
    if let Some(category_id) = update.category_id {
        ensure_category_exists(&txn, category_id).await?;
        active.category_id = Set(category_id);
    }
    if let Some(min_amount) = update.min_amount {
        validate_min_amount(min_amount)?;
        active.min_amount = Set(min_amount);
    }
    if let Some(description) = update.description {
        active.description = Set(description);
    }
    if let Some(comment) = update.comment {
        active.comment = Set(comment);
    }
    if let Some(footprint_id) = update.footprint_id {
        active.footprint_id = Set(footprint_id);
    }
    if let Some(manufacturer_id) = update.manufacturer_id {
        active.manufacturer_id = Set(manufacturer_id);
    }
    if let Some(mpn) = update.manufacturer_product_number {
        active.manufacturer_product_number = Set(mpn);
    }
    if let Some(tags) = update.tags {
        active.tags = Set(tags);
    }
    if let Some(favorite) = update.favorite {
        active.favorite = Set(favorite);
    }
    if let Some(needs_review) = update.needs_review {
        active.needs_review = Set(needs_review);
    }
    active.last_modified = Set(Some(Utc::now()));

    let updated = active.update(&txn).await?;
    logger
        .log_edited(&txn, context, TargetType::Part, id, &old, &updated, None)
        .await?;
    txn.commit().await?;
    Ok(updated)
}

/// Logs that `member` left the `collection` of `owner`, together with its
/// last state.
#[allow(clippy::too_many_arguments)]
async fn log_member_removed<C, M>(
    db: &C,
    logger: &EventLogger,
    context: &LogContext,
    owner: (TargetType, i64),
    collection: &str,
    (member, member_id): (TargetType, i64),
    name: &str,
    model: &M,
) -> Result<()>
where
    C: ConnectionTrait,
    M: Serialize,
{
    logger
        .log_collection_element_deleted(db, context, owner, collection, (member, member_id), name)
        .await?;
    logger
        .log_deleted(db, context, member, member_id, name, model)
        .await?;
    Ok(())
}

async fn remove_lot<C: ConnectionTrait>(
    db: &C,
    logger: &EventLogger,
    context: &LogContext,
    lot: &part_lot::Model,
) -> Result<()> {
    PartLot::delete_by_id(lot.id).exec(db).await?;
    let name = if lot.description.is_empty() {
        format!("Lot #{}", lot.id)
    } else {
        lot.description.clone()
    };
    log_member_removed(
        db,
        logger,
        context,
        (TargetType::Part, lot.part_id),
        "part_lots",
        (TargetType::PartLot, lot.id),
        &name,
        lot,
    )
    .await
}

/// Deletes an orderdetail with its price steps.
async fn remove_orderdetail<C: ConnectionTrait>(
    db: &C,
    logger: &EventLogger,
    context: &LogContext,
    detail: &orderdetail::Model,
) -> Result<()> {
    let prices = pricedetail::Entity::find()
        .filter(pricedetail::Column::OrderdetailId.eq(detail.id))
        .all(db)
        .await?;
    for price in &prices {
        pricedetail::Entity::delete_by_id(price.id).exec(db).await?;
        log_member_removed(
            db,
            logger,
            context,
            (TargetType::Orderdetail, detail.id),
            "pricedetails",
            (TargetType::Pricedetail, price.id),
            &format!("Price from {}", price.min_discount_quantity),
            price,
        )
        .await?;
    }

    orderdetail::Entity::delete_by_id(detail.id).exec(db).await?;
    let name = if detail.supplier_part_nr.is_empty() {
        format!("Orderdetail #{}", detail.id)
    } else {
        detail.supplier_part_nr.clone()
    };
    log_member_removed(
        db,
        logger,
        context,
        (TargetType::Part, detail.part_id),
        "orderdetails",
        (TargetType::Orderdetail, detail.id),
        &name,
        detail,
    )
    .await
}

/// Deletes a part together with its lots, purchase information and
/// attachments. Every removed element gets its own deletion entry.
#[instrument(skip(db, logger, context))]
pub async fn delete_part(
    db: &DatabaseConnection,
    logger: &EventLogger,
    context: &LogContext,
    id: i64,
) -> Result<()> {
    let txn = db.begin().await?;
    let part = get_part_by_id(&txn, id)
        .await?
        .ok_or(Error::NotFound { entity: "Part", id })?;

    for lot in get_lots_for_part(&txn, id).await? {
        remove_lot(&txn, logger, context, &lot).await?;
    }

    let orderdetails = orderdetail::Entity::find()
        .filter(orderdetail::Column::PartId.eq(id))
        .all(&txn)
        .await?;
    for detail in &orderdetails {
        remove_orderdetail(&txn, logger, context, detail).await?;
    }

    Part::delete_by_id(id).exec(&txn).await?;
    submit::remove_attachments_of(&txn, logger, context, (TargetType::Part, id)).await?;
    logger
        .log_deleted(&txn, context, TargetType::Part, id, &part.name, &part)
        .await?;
    txn.commit().await?;

    info!(id, name = %part.name, "Part deleted");
    Ok(())
}

/// Adds a lot to a part. Full storage locations and single-part locations
/// already holding another part are rejected.
pub async fn add_lot(
    db: &DatabaseConnection,
    logger: &EventLogger,
    context: &LogContext,
    part_id: i64,
    data: NewLot,
) -> Result<part_lot::Model> {
    validate_min_amount(data.amount)?;

    let txn = db.begin().await?;
    get_part_by_id(&txn, part_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Part",
            id: part_id,
        })?;

    if let Some(location_id) = data.storage_location_id {
        let location = StorageLocation::find_by_id(location_id)
            .one(&txn)
            .await?
            .ok_or(Error::NotFound {
                entity: "Storage location",
                id: location_id,
            })?;
        if location.is_full {
            return Err(Error::Validation {
                message: format!("Storage location '{}' is full", location.name),
            });
        }
        if location.only_single_part {
            let other_part = PartLot::find()
                .filter(part_lot::Column::StorageLocationId.eq(location_id))
                .filter(part_lot::Column::PartId.ne(part_id))
                .one(&txn)
                .await?;
            if other_part.is_some() {
                return Err(Error::Validation {
                    message: format!("Storage location '{}' can only hold one part", location.name),
                });
            }
        }
    }

    let now = Utc::now();
    let lot = part_lot::ActiveModel {
        part_id: Set(part_id),
        storage_location_id: Set(data.storage_location_id),
        description: Set(data.description),
        comment: Set(String::new()),
        amount: Set(if data.instock_unknown { 0.0 } else { data.amount }),
        instock_unknown: Set(data.instock_unknown),
        needs_refill: Set(false),
        expiration_date: Set(data.expiration_date),
        created_at: Set(Some(now)),
        last_modified: Set(Some(now)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let instock = (!lot.instock_unknown).then_some(lot.amount);
    logger
        .log_created(&txn, context, TargetType::PartLot, lot.id, instock)
        .await?;
    txn.commit().await?;
    Ok(lot)
}

/// Deletes a lot and records its removal on the part.
pub async fn delete_lot(
    db: &DatabaseConnection,
    logger: &EventLogger,
    context: &LogContext,
    lot_id: i64,
) -> Result<()> {
    let txn = db.begin().await?;
    let lot = find_lot(&txn, lot_id).await?;
    remove_lot(&txn, logger, context, &lot).await?;
    txn.commit().await?;
    Ok(())
}

async fn find_lot<C: ConnectionTrait>(db: &C, lot_id: i64) -> Result<part_lot::Model> {
    PartLot::find_by_id(lot_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Part lot",
            id: lot_id,
        })
}

fn ensure_known_stock(lot: &part_lot::Model) -> Result<()> {
    if lot.instock_unknown {
        return Err(Error::Validation {
            message: format!("Stock of lot {} is unknown", lot.id),
        });
    }
    Ok(())
}

async fn set_lot_amount<C: ConnectionTrait>(db: &C, lot: part_lot::Model, amount: f64) -> Result<part_lot::Model> {
    let mut active: part_lot::ActiveModel = lot.into();
    active.amount = Set(amount);
    active.last_modified = Set(Some(Utc::now()));
    Ok(active.update(db).await?)
}

#[allow(clippy::too_many_arguments)]
async fn log_stock_change<C: ConnectionTrait>(
    db: &C,
    logger: &EventLogger,
    context: &LogContext,
    lot_id: i64,
    action: StockAction,
    (old_stock, new_stock): (f64, f64),
    old_total: f64,
    move_target: Option<i64>,
    comment: &str,
) -> Result<()> {
    let event = LogEvent::PartStockChanged {
        action,
        comment: comment.to_string(),
        old_stock,
        new_stock,
        old_total,
        move_target,
    };
    logger
        .log(db, context, Some((TargetType::PartLot, lot_id)), event)
        .await?;
    Ok(())
}

/// Takes stock out of a lot.
#[instrument(skip(db, logger, context))]
pub async fn withdraw(
    db: &DatabaseConnection,
    logger: &EventLogger,
    context: &LogContext,
    lot_id: i64,
    amount: f64,
    comment: &str,
) -> Result<part_lot::Model> {
    validate_stock_amount(amount)?;

    let txn = db.begin().await?;
    let lot = find_lot(&txn, lot_id).await?;
    ensure_known_stock(&lot)?;
    if amount > lot.amount {
        return Err(Error::InsufficientStock {
            available: lot.amount,
            requested: amount,
        });
    }

    let old_total = get_total_stock(&txn, lot.part_id).await?;
    let old_stock = lot.amount;
    let updated = set_lot_amount(&txn, lot, old_stock - amount).await?;
    log_stock_change(
        &txn,
        logger,
        context,
        lot_id,
        StockAction::Withdraw,
        (old_stock, updated.amount),
        old_total,
        None,
        comment,
    )
    .await?;
    txn.commit().await?;
    Ok(updated)
}

/// Puts stock into a lot.
#[instrument(skip(db, logger, context))]
pub async fn add_stock(
    db: &DatabaseConnection,
    logger: &EventLogger,
    context: &LogContext,
    lot_id: i64,
    amount: f64,
    comment: &str,
) -> Result<part_lot::Model> {
    validate_stock_amount(amount)?;

    let txn = db.begin().await?;
    let lot = find_lot(&txn, lot_id).await?;
    ensure_known_stock(&lot)?;

    let old_total = get_total_stock(&txn, lot.part_id).await?;
    let old_stock = lot.amount;
    let updated = set_lot_amount(&txn, lot, old_stock + amount).await?;
    log_stock_change(
        &txn,
        logger,
        context,
        lot_id,
        StockAction::Add,
        (old_stock, updated.amount),
        old_total,
        None,
        comment,
    )
    .await?;
    txn.commit().await?;
    Ok(updated)
}

/// Moves stock from one lot to another lot of the same part.
#[instrument(skip(db, logger, context))]
pub async fn move_stock(
    db: &DatabaseConnection,
    logger: &EventLogger,
    context: &LogContext,
    (from_lot_id, to_lot_id): (i64, i64),
    amount: f64,
    comment: &str,
) -> Result<(part_lot::Model, part_lot::Model)> {
    validate_stock_amount(amount)?;
    if from_lot_id == to_lot_id {
        return Err(Error::Validation {
            message: "Source and target lot must differ".into(),
        });
    }

    let txn = db.begin().await?;
    let from = find_lot(&txn, from_lot_id).await?;
    let to = find_lot(&txn, to_lot_id).await?;
    ensure_known_stock(&from)?;
    ensure_known_stock(&to)?;
    if from.part_id != to.part_id {
        return Err(Error::Validation {
            message: "Stock can only be moved between lots of the same part".into(),
        });
    }
    if amount > from.amount {
        return Err(Error::InsufficientStock {
            available: from.amount,
            requested: amount,
        });
    }

    let old_total = get_total_stock(&txn, from.part_id).await?;
    let old_stock = from.amount;
    let target_amount = to.amount;
    let from = set_lot_amount(&txn, from, old_stock - amount).await?;
    let to = set_lot_amount(&txn, to, target_amount + amount).await?;
    log_stock_change(
        &txn,
        logger,
        context,
        from_lot_id,
        StockAction::Move,
        (old_stock, from.amount),
        old_total,
        Some(to_lot_id),
        comment,
    )
    .await?;
    txn.commit().await?;
    Ok((from, to))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::log::{LogEntryType, formatter, repository};
    use crate::entities::{Attachment, attachment};
    use crate::test_utils::{
        create_test_attachment_type, create_test_category, create_test_link, create_test_orderdetail,
        create_test_part, create_test_pricedetail, setup_test_db,
    };
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, PaginatorTrait};

    fn lot(amount: f64, instock_unknown: bool, expiration_date: Option<DateTime<Utc>>) -> part_lot::Model {
        part_lot::Model {
            id: 1,
            part_id: 1,
            storage_location_id: None,
            description: String::new(),
            comment: String::new(),
            amount,
            instock_unknown,
            needs_refill: false,
            expiration_date,
            created_at: None,
            last_modified: None,
        }
    }

    #[test]
    fn test_amount_sum_ignores_unknown_and_expired() {
        let now = Utc::now();
        let lots = vec![
            lot(10.0, false, None),
            lot(5.0, false, Some(now + Duration::days(1))),
            lot(100.0, true, None),
            lot(7.0, false, Some(now - Duration::days(1))),
        ];
        assert_eq!(amount_sum(&lots, now), 15.0);
    }

    #[tokio::test]
    async fn test_create_part_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let logger = EventLogger::default();

        let empty_name = create_part(&db, &logger, &LogContext::cli(), NewPart::default()).await;
        assert!(matches!(empty_name, Err(Error::Validation { .. })));

        let negative = NewPart {
            name: "BC547".into(),
            min_amount: -1.0,
            ..NewPart::default()
        };
        let result = create_part(&db, &logger, &LogContext::cli(), negative).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_part_requires_category() -> Result<()> {
        let db = setup_test_db().await?;
        let data = NewPart {
            name: "BC547".into(),
            category_id: 99,
            ..NewPart::default()
        };
        let result = create_part(&db, &EventLogger::default(), &LogContext::cli(), data).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Category", id: 99 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_ipn_must_be_unique() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Transistors").await?;
        let logger = EventLogger::default();
        let data = NewPart {
            name: "BC547".into(),
            category_id: category.id,
            ipn: Some("TR-001".into()),
            ..NewPart::default()
        };
        create_part(&db, &logger, &LogContext::cli(), data.clone()).await?;
        let duplicate = create_part(&db, &logger, &LogContext::cli(), data).await;
        assert!(matches!(duplicate, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_part_logs_changes() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let category = create_test_category(&db, "Transistors").await?;
        let part = create_test_part(&db, "BC547", category.id).await?;

        let update = PartUpdate {
            name: Some("BC547B".into()),
            min_amount: Some(10.0),
            ..PartUpdate::default()
        };
        let updated = update_part(&db, &logger, &LogContext::cli(), part.id, update).await?;
        assert_eq!(updated.name, "BC547B");

        let history = repository::element_history(&db, TargetType::Part, part.id, None, 0).await?;
        let event = formatter::decode_event(&history[0])?;
        let LogEvent::ElementEdited { changed_fields, old_data, .. } = event else {
            panic!("expected an edit entry");
        };
        assert!(changed_fields.contains(&"name".to_string()));
        assert!(changed_fields.contains(&"min_amount".to_string()));
        assert_eq!(old_data.unwrap()["name"], "BC547");

        // Nothing changed, nothing logged
        update_part(&db, &logger, &LogContext::cli(), part.id, PartUpdate::default()).await?;
        let history_after = repository::element_history(&db, TargetType::Part, part.id, None, 0).await?;
        assert_eq!(history_after.len(), history.len());
        Ok(())
    }

    #[tokio::test]
    async fn test_stock_operations() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let context = LogContext::cli();
        let category = create_test_category(&db, "Resistors").await?;
        let part = create_test_part(&db, "10k", category.id).await?;

        let first = add_lot(&db, &logger, &context, part.id, NewLot { amount: 10.0, ..NewLot::default() }).await?;
        let second = add_lot(&db, &logger, &context, part.id, NewLot { amount: 2.0, ..NewLot::default() }).await?;
        assert_eq!(get_total_stock(&db, part.id).await?, 12.0);

        let first = withdraw(&db, &logger, &context, first.id, 3.0, "Prototype").await?;
        assert_eq!(first.amount, 7.0);

        let too_much = withdraw(&db, &logger, &context, first.id, 8.0, "").await;
        assert!(matches!(too_much, Err(Error::InsufficientStock { .. })));
        let negative = add_stock(&db, &logger, &context, first.id, -1.0, "").await;
        assert!(matches!(negative, Err(Error::InvalidAmount { .. })));

        add_stock(&db, &logger, &context, second.id, 5.0, "Order arrived").await?;
        let (from, to) = move_stock(&db, &logger, &context, (first.id, second.id), 4.0, "").await?;
        assert_eq!(from.amount, 3.0);
        assert_eq!(to.amount, 11.0);
        assert_eq!(get_total_stock(&db, part.id).await?, 14.0);

        let history = repository::element_history(&db, TargetType::PartLot, first.id, None, 0).await?;
        let moved = formatter::decode_event(&history[0])?;
        assert_eq!(
            moved,
            LogEvent::PartStockChanged {
                action: StockAction::Move,
                comment: String::new(),
                old_stock: 7.0,
                new_stock: 3.0,
                old_total: 14.0,
                move_target: Some(second.id),
            }
        );
        let withdrawn = formatter::decode_event(&history[1])?;
        assert!(matches!(
            withdrawn,
            LogEvent::PartStockChanged { action: StockAction::Withdraw, old_total, .. } if old_total == 12.0
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_stock_lots_are_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let category = create_test_category(&db, "Misc").await?;
        let part = create_test_part(&db, "Screws", category.id).await?;
        let lot = add_lot(
            &db,
            &logger,
            &LogContext::cli(),
            part.id,
            NewLot {
                amount: 50.0,
                instock_unknown: true,
                ..NewLot::default()
            },
        )
        .await?;
        assert_eq!(lot.amount, 0.0);

        let result = withdraw(&db, &logger, &LogContext::cli(), lot.id, 1.0, "").await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(is_not_enough_instock(
            &part::Model { min_amount: 1.0, ..part },
            &[lot],
            Utc::now()
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_part_logs_lot_removal() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let context = LogContext::cli();
        let category = create_test_category(&db, "Capacitors").await?;
        let part = create_test_part(&db, "100nF", category.id).await?;
        let lot = add_lot(&db, &logger, &context, part.id, NewLot { amount: 100.0, ..NewLot::default() }).await?;

        delete_part(&db, &logger, &context, part.id).await?;
        assert!(get_part_by_id(&db, part.id).await?.is_none());
        assert!(get_lots_for_part(&db, part.id).await?.is_empty());

        let history = repository::element_history(&db, TargetType::Part, part.id, None, 0).await?;
        let types: Vec<i16> = history.iter().map(|e| e.entry_type).collect();
        assert!(types.contains(&(LogEntryType::ElementDeleted as i16)));
        assert!(types.contains(&(LogEntryType::CollectionElementDeleted as i16)));

        let lot_deletion = repository::undelete_data(&db, TargetType::PartLot, lot.id).await?;
        assert_eq!(lot_deletion.target_id, lot.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_part_removes_purchase_data_and_attachments() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let context = LogContext::cli();
        let category = create_test_category(&db, "ICs").await?;
        let part = create_test_part(&db, "NE555", category.id).await?;
        let datasheets = create_test_attachment_type(&db, "Datasheets", "").await?;
        let link = create_test_link(&db, (TargetType::Part, part.id), datasheets.id, "https://example.com/ne555.pdf").await?;
        let detail = create_test_orderdetail(&db, part.id).await?;
        let price = create_test_pricedetail(&db, detail.id, 10.0, 0.25).await?;

        delete_part(&db, &logger, &context, part.id).await?;

        let remaining = Attachment::find()
            .filter(attachment::Column::ElementType.eq(TargetType::Part as i16))
            .filter(attachment::Column::ElementId.eq(part.id))
            .count(&db)
            .await?;
        assert_eq!(remaining, 0);
        assert!(orderdetail::Entity::find_by_id(detail.id).one(&db).await?.is_none());
        assert!(pricedetail::Entity::find_by_id(price.id).one(&db).await?.is_none());

        let part_history = repository::element_history(&db, TargetType::Part, part.id, None, 0).await?;
        let removed_collections: Vec<String> = part_history
            .iter()
            .filter_map(|entry| match formatter::decode_event(entry) {
                Ok(LogEvent::CollectionElementDeleted { collection, .. }) => Some(collection),
                _ => None,
            })
            .collect();
        assert_eq!(removed_collections, vec!["orderdetails".to_string()]);

        let detail_history = repository::element_history(&db, TargetType::Orderdetail, detail.id, None, 0).await?;
        let types: Vec<i16> = detail_history.iter().map(|e| e.entry_type).collect();
        assert!(types.contains(&(LogEntryType::ElementDeleted as i16)));
        assert!(types.contains(&(LogEntryType::CollectionElementDeleted as i16)));

        repository::undelete_data(&db, TargetType::Pricedetail, price.id).await?;
        repository::undelete_data(&db, TargetType::Attachment, link.id).await?;
        Ok(())
    }
}
