//! Structural element business logic - trees of categories, storage locations,
//! footprints, manufacturers, suppliers, attachment types and groups.
//!
//! The tree helpers work on a flat slice of all nodes of one table, which is
//! how the tables are loaded anyway. Parent loops in the data are tolerated:
//! walks stop at the first repeated node.

use crate::{
    core::{
        attachments::submit,
        log::{EventLogger, LogContext, TargetType},
    },
    entities::{
        Category, PartColumn, PartLotColumn, StorageLocation, attachment_type, category,
        footprint, group, manufacturer, part, part_lot, storage_location, supplier,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument};

/// Default delimiter of [`full_path`]
pub const PATH_DELIMITER: &str = " → ";

/// An element that is part of a parent/child tree
pub trait StructuralElement {
    /// Kind of element, used for logging
    const TARGET: TargetType;

    fn id(&self) -> i64;
    fn parent_id(&self) -> Option<i64>;
    fn name(&self) -> &str;
}

macro_rules! impl_structural_element {
    ($($module:ident => $target:expr),* $(,)?) => {
        $(
            impl StructuralElement for $module::Model {
                const TARGET: TargetType = $target;

                fn id(&self) -> i64 {
                    self.id
                }

                fn parent_id(&self) -> Option<i64> {
                    self.parent_id
                }

                fn name(&self) -> &str {
                    &self.name
                }
            }
        )*
    };
}

impl_structural_element!(
    category => TargetType::Category,
    footprint => TargetType::Footprint,
    manufacturer => TargetType::Manufacturer,
    supplier => TargetType::Supplier,
    storage_location => TargetType::StorageLocation,
    attachment_type => TargetType::AttachmentType,
    group => TargetType::Group,
);

fn index<N: StructuralElement>(nodes: &[N]) -> HashMap<i64, &N> {
    nodes.iter().map(|n| (n.id(), n)).collect()
}

/// IDs from the element up to its root, starting with the element itself.
fn ancestors_inclusive<N: StructuralElement>(nodes: &[N], id: i64) -> Option<Vec<i64>> {
    let by_id = index(nodes);
    let mut current = by_id.get(&id)?;
    let mut chain = vec![id];
    let mut seen = HashSet::from([id]);

    while let Some(parent_id) = current.parent_id() {
        if !seen.insert(parent_id) {
            break;
        }
        let Some(parent) = by_id.get(&parent_id) else {
            break;
        };
        chain.push(parent_id);
        current = parent;
    }
    Some(chain)
}

/// Names from the root down to the element, joined with `delimiter`.
#[must_use]
pub fn full_path<N: StructuralElement>(nodes: &[N], id: i64, delimiter: &str) -> Option<String> {
    let by_id = index(nodes);
    let chain = ancestors_inclusive(nodes, id)?;
    let names: Vec<&str> = chain
        .iter()
        .rev()
        .filter_map(|i| by_id.get(i).map(|n| n.name()))
        .collect();
    Some(names.join(delimiter))
}

/// Depth of an element; root elements have level 0.
#[must_use]
pub fn level<N: StructuralElement>(nodes: &[N], id: i64) -> Option<usize> {
    ancestors_inclusive(nodes, id).map(|chain| chain.len() - 1)
}

/// Whether `id` lies below `ancestor_id` in the tree.
#[must_use]
pub fn is_child_of<N: StructuralElement>(nodes: &[N], id: i64, ancestor_id: i64) -> bool {
    id != ancestor_id
        && ancestors_inclusive(nodes, id).is_some_and(|chain| chain.contains(&ancestor_id))
}

/// IDs of all elements below `id`, breadth first.
#[must_use]
pub fn subelement_ids<N: StructuralElement>(nodes: &[N], id: i64) -> Vec<i64> {
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for node in nodes {
        if let Some(parent) = node.parent_id() {
            children.entry(parent).or_default().push(node.id());
        }
    }

    let mut result = Vec::new();
    let mut seen = HashSet::from([id]);
    let mut queue = std::collections::VecDeque::from([id]);
    while let Some(current) = queue.pop_front() {
        for child in children.get(&current).into_iter().flatten() {
            if seen.insert(*child) {
                result.push(*child);
                queue.push_back(*child);
            }
        }
    }
    result
}

/// Checks that `new_parent` can become the parent of `id`: it must exist and
/// must be neither the element itself nor one of its descendants.
///
/// # Errors
/// Returns `Error::Validation` for self-parenting, cycles and unknown parents.
pub fn validate_parent<N: StructuralElement>(nodes: &[N], id: Option<i64>, new_parent: Option<i64>) -> Result<()> {
    let Some(parent) = new_parent else {
        return Ok(());
    };
    if !nodes.iter().any(|n| n.id() == parent) {
        return Err(Error::Validation {
            message: format!("Parent {parent} does not exist"),
        });
    }
    let Some(id) = id else {
        return Ok(());
    };
    if parent == id {
        return Err(Error::Validation {
            message: "An element can not be its own parent".into(),
        });
    }
    if is_child_of(nodes, parent, id) {
        return Err(Error::Validation {
            message: "An element can not be moved below one of its children".into(),
        });
    }
    Ok(())
}

/// Node of a nested tree representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub id: i64,
    pub name: String,
    pub children: Vec<TreeNode>,
}

/// Builds the nested tree of all elements, siblings sorted by name.
/// Elements whose parent is missing become roots.
#[must_use]
pub fn build_tree<N: StructuralElement>(nodes: &[N]) -> Vec<TreeNode> {
    fn build<N: StructuralElement>(
        parent: Option<i64>,
        children: &HashMap<Option<i64>, Vec<&N>>,
        seen: &mut HashSet<i64>,
    ) -> Vec<TreeNode> {
        let mut level: Vec<&N> = children.get(&parent).cloned().unwrap_or_default();
        level.sort_by(|a, b| a.name().cmp(b.name()));
        let mut nodes = Vec::with_capacity(level.len());
        for n in level {
            if seen.insert(n.id()) {
                nodes.push(TreeNode {
                    id: n.id(),
                    name: n.name().to_string(),
                    children: build(Some(n.id()), children, seen),
                });
            }
        }
        nodes
    }

    let ids: HashSet<i64> = nodes.iter().map(StructuralElement::id).collect();
    let mut children: HashMap<Option<i64>, Vec<&N>> = HashMap::new();
    for node in nodes {
        let parent = node.parent_id().filter(|p| ids.contains(p) && *p != node.id());
        children.entry(parent).or_default().push(node);
    }

    build(None, &children, &mut HashSet::new())
}

fn check_name<N: StructuralElement>(nodes: &[N], name: &str, parent: Option<i64>, exclude: Option<i64>) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: format!("{} name cannot be empty", N::TARGET),
        });
    }
    let taken = nodes.iter().any(|n| {
        Some(n.id()) != exclude && n.parent_id() == parent && n.name().eq_ignore_ascii_case(name)
    });
    if taken {
        return Err(Error::Validation {
            message: format!("{} '{name}' already exists at this level", N::TARGET),
        });
    }
    Ok(name.to_string())
}

fn refuse_if_has_children<N: StructuralElement>(nodes: &[N], id: i64) -> Result<()> {
    if nodes.iter().any(|n| n.parent_id() == Some(id)) {
        return Err(Error::Validation {
            message: format!("{} {id} still has children and can not be deleted", N::TARGET),
        });
    }
    Ok(())
}

/// Looks up `id` among the loaded nodes of one table.
fn find_node<N: StructuralElement + Clone>(nodes: &[N], id: i64) -> Result<N> {
    nodes.iter().find(|n| n.id() == id).cloned().ok_or(Error::NotFound {
        entity: N::TARGET.entity_name(),
        id,
    })
}

/// Validates the parent and name of a new (`id` None) or changed node and
/// returns the trimmed name.
fn check_placement<N: StructuralElement>(
    nodes: &[N],
    id: Option<i64>,
    name: &str,
    parent: Option<i64>,
) -> Result<String> {
    validate_parent(nodes, id, parent)?;
    check_name(nodes, name, parent, id)
}

/// Logs the removal of a node whose row is already deleted and drops the
/// attachments it owned.
async fn finish_delete<C, N>(db: &C, logger: &EventLogger, context: &LogContext, node: &N) -> Result<()>
where
    C: ConnectionTrait,
    N: StructuralElement + Serialize,
{
    submit::remove_attachments_of(db, logger, context, (N::TARGET, node.id())).await?;
    logger
        .log_deleted(db, context, N::TARGET, node.id(), node.name(), node)
        .await?;
    info!(id = node.id(), name = %node.name(), "{} deleted", N::TARGET);
    Ok(())
}

/// Generates the rename, move and delete operations of one structural table.
/// `$ensure_unused` refuses deleting nodes that are still referenced.
macro_rules! structural_table {
    (
        $module:ident, $entity:ident,
        load: $load:ident,
        update: $update:ident,
        rename: $rename:ident,
        move_to: $move_to:ident,
        delete: $delete:ident,
        ensure_unused: $ensure_unused:ident $(,)?
    ) => {
        async fn $update(
            db: &DatabaseConnection,
            logger: &EventLogger,
            context: &LogContext,
            id: i64,
            name: Option<&str>,
            parent_id: Option<Option<i64>>,
        ) -> Result<$module::Model> {
            let txn = db.begin().await?;
            let all = $load(&txn).await?;
            let old = find_node(&all, id)?;
            let new_parent = parent_id.unwrap_or(old.parent_id);
            let new_name = check_placement(&all, Some(id), name.unwrap_or(&old.name), new_parent)?;

            let mut active: $module::ActiveModel = old.clone().into();
            active.name = Set(new_name);
            active.parent_id = Set(new_parent);
            active.last_modified = Set(Some(Utc::now()));
            let updated = active.update(&txn).await?;

            logger
                .log_edited(&txn, context, <$module::Model as StructuralElement>::TARGET, id, &old, &updated, None)
                .await?;
            txn.commit().await?;
            Ok(updated)
        }

        /// Renames the element. The name must stay unique among its siblings.
        pub async fn $rename(
            db: &DatabaseConnection,
            logger: &EventLogger,
            context: &LogContext,
            id: i64,
            name: &str,
        ) -> Result<$module::Model> {
            $update(db, logger, context, id, Some(name), None).await
        }

        /// Moves the element below another one (None makes it a root).
        pub async fn $move_to(
            db: &DatabaseConnection,
            logger: &EventLogger,
            context: &LogContext,
            id: i64,
            new_parent: Option<i64>,
        ) -> Result<$module::Model> {
            $update(db, logger, context, id, None, Some(new_parent)).await
        }

        /// Deletes an element without children that nothing refers to.
        pub async fn $delete(
            db: &DatabaseConnection,
            logger: &EventLogger,
            context: &LogContext,
            id: i64,
        ) -> Result<()> {
            let txn = db.begin().await?;
            let all = $load(&txn).await?;
            let node = find_node(&all, id)?;
            refuse_if_has_children(&all, id)?;
            $ensure_unused(&txn, id).await?;

            $entity::delete_by_id(id).exec(&txn).await?;
            finish_delete(&txn, logger, context, &node).await?;
            txn.commit().await?;
            Ok(())
        }
    };
}

/// Retrieves all categories ordered by name.
pub async fn get_all_categories<C: ConnectionTrait>(db: &C) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a category by ID.
pub async fn get_category_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<category::Model>> {
    Category::find_by_id(id).one(db).await.map_err(Into::into)
}

async fn ensure_category_unused<C: ConnectionTrait>(db: &C, id: i64) -> Result<()> {
    let parts = part::Entity::find()
        .filter(PartColumn::CategoryId.eq(id))
        .count(db)
        .await?;
    if parts > 0 {
        return Err(Error::Validation {
            message: format!("Category {id} still contains {parts} parts"),
        });
    }
    Ok(())
}

/// Creates a category below `parent_id` (or as root).
#[instrument(skip(db, logger, context))]
pub async fn create_category(
    db: &DatabaseConnection,
    logger: &EventLogger,
    context: &LogContext,
    name: &str,
    parent_id: Option<i64>,
) -> Result<category::Model> {
    let txn = db.begin().await?;
    let all = get_all_categories(&txn).await?;
    let name = check_placement(&all, None, name, parent_id)?;

    let now = Utc::now();
    let created = category::ActiveModel {
        name: Set(name),
        comment: Set(String::new()),
        parent_id: Set(parent_id),
        not_selectable: Set(false),
        partname_hint: Set(String::new()),
        partname_regex: Set(String::new()),
        disable_footprints: Set(false),
        disable_manufacturers: Set(false),
        default_description: Set(String::new()),
        default_comment: Set(String::new()),
        created_at: Set(Some(now)),
        last_modified: Set(Some(now)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    logger
        .log_created(&txn, context, TargetType::Category, created.id, None)
        .await?;
    txn.commit().await?;

    info!(id = created.id, name = %created.name, "Category created");
    Ok(created)
}

structural_table!(
    category, Category,
    load: get_all_categories,
    update: update_category,
    rename: rename_category,
    move_to: move_category,
    delete: delete_category,
    ensure_unused: ensure_category_unused,
);

/// Retrieves all storage locations ordered by name.
pub async fn get_all_storage_locations<C: ConnectionTrait>(db: &C) -> Result<Vec<storage_location::Model>> {
    StorageLocation::find()
        .order_by_asc(storage_location::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a storage location by ID.
pub async fn get_storage_location_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<storage_location::Model>> {
    StorageLocation::find_by_id(id).one(db).await.map_err(Into::into)
}

async fn ensure_storage_location_unused<C: ConnectionTrait>(db: &C, id: i64) -> Result<()> {
    let lots = part_lot::Entity::find()
        .filter(PartLotColumn::StorageLocationId.eq(id))
        .count(db)
        .await?;
    if lots > 0 {
        return Err(Error::Validation {
            message: format!("Storage location {id} still holds {lots} part lots"),
        });
    }
    Ok(())
}

/// Creates a storage location below `parent_id` (or as root).
#[instrument(skip(db, logger, context))]
pub async fn create_storage_location(
    db: &DatabaseConnection,
    logger: &EventLogger,
    context: &LogContext,
    name: &str,
    parent_id: Option<i64>,
) -> Result<storage_location::Model> {
    let txn = db.begin().await?;
    let all = get_all_storage_locations(&txn).await?;
    let name = check_placement(&all, None, name, parent_id)?;

    let now = Utc::now();
    let created = storage_location::ActiveModel {
        name: Set(name),
        comment: Set(String::new()),
        parent_id: Set(parent_id),
        not_selectable: Set(false),
        is_full: Set(false),
        only_single_part: Set(false),
        limit_to_existing_parts: Set(false),
        created_at: Set(Some(now)),
        last_modified: Set(Some(now)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    logger
        .log_created(&txn, context, TargetType::StorageLocation, created.id, None)
        .await?;
    txn.commit().await?;

    info!(id = created.id, name = %created.name, "Storage location created");
    Ok(created)
}

structural_table!(
    storage_location, StorageLocation,
    load: get_all_storage_locations,
    update: update_storage_location,
    rename: rename_storage_location,
    move_to: move_storage_location,
    delete: delete_storage_location,
    ensure_unused: ensure_storage_location_unused,
);

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::log::{LogEntryType, repository};
    use crate::entities::Attachment;
    use crate::test_utils::{
        create_test_attachment_type, create_test_category, create_test_link, create_test_part, setup_test_db,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn node(id: i64, parent_id: Option<i64>, name: &str) -> category::Model {
        category::Model {
            id,
            name: name.into(),
            comment: String::new(),
            parent_id,
            not_selectable: false,
            partname_hint: String::new(),
            partname_regex: String::new(),
            disable_footprints: false,
            disable_manufacturers: false,
            default_description: String::new(),
            default_comment: String::new(),
            created_at: None,
            last_modified: None,
        }
    }

    fn sample_tree() -> Vec<category::Model> {
        vec![
            node(1, None, "Passive"),
            node(2, Some(1), "Resistors"),
            node(3, Some(1), "Capacitors"),
            node(4, Some(3), "Ceramic"),
            node(5, None, "Active"),
        ]
    }

    #[test]
    fn test_full_path_and_level() {
        let nodes = sample_tree();
        assert_eq!(
            full_path(&nodes, 4, PATH_DELIMITER).as_deref(),
            Some("Passive → Capacitors → Ceramic")
        );
        assert_eq!(full_path(&nodes, 5, "/").as_deref(), Some("Active"));
        assert!(full_path(&nodes, 42, "/").is_none());
        assert_eq!(level(&nodes, 1), Some(0));
        assert_eq!(level(&nodes, 4), Some(2));
    }

    #[test]
    fn test_relationships() {
        let nodes = sample_tree();
        assert!(is_child_of(&nodes, 4, 1));
        assert!(!is_child_of(&nodes, 1, 4));
        assert!(!is_child_of(&nodes, 1, 1));
        assert_eq!(subelement_ids(&nodes, 1), vec![2, 3, 4]);
        assert!(subelement_ids(&nodes, 5).is_empty());
    }

    #[test]
    fn test_validate_parent() {
        let nodes = sample_tree();
        assert!(validate_parent(&nodes, Some(4), Some(5)).is_ok());
        assert!(validate_parent(&nodes, Some(4), None).is_ok());
        assert!(validate_parent(&nodes, Some(1), Some(1)).is_err());
        // Moving a node below its own grandchild would create a cycle
        assert!(validate_parent(&nodes, Some(1), Some(4)).is_err());
        assert!(validate_parent(&nodes, None, Some(99)).is_err());
    }

    #[test]
    fn test_cyclic_data_does_not_hang() {
        let nodes = vec![node(1, Some(2), "A"), node(2, Some(1), "B")];
        assert_eq!(full_path(&nodes, 1, "/").as_deref(), Some("B/A"));
        assert_eq!(subelement_ids(&nodes, 1), vec![2]);
        assert!(build_tree(&nodes).is_empty());
    }

    #[test]
    fn test_build_tree_sorts_by_name() {
        let tree = build_tree(&sample_tree());
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "Active");
        assert_eq!(tree[1].name, "Passive");
        let names: Vec<&str> = tree[1].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Capacitors", "Resistors"]);
        assert_eq!(tree[1].children[0].children[0].name, "Ceramic");
    }

    #[tokio::test]
    async fn test_create_category_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<category::Model>::new()])
            .into_connection();
        let result = create_category(&db, &EventLogger::default(), &LogContext::cli(), "  ", None).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_category_crud_with_logging() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let context = LogContext::cli();

        let root = create_category(&db, &logger, &context, "Passive", None).await?;
        let child = create_category(&db, &logger, &context, "Resistors", Some(root.id)).await?;

        let duplicate = create_category(&db, &logger, &context, "resistors", Some(root.id)).await;
        assert!(matches!(duplicate, Err(Error::Validation { .. })));
        // Same name at another level is fine
        create_category(&db, &logger, &context, "Resistors", None).await?;

        let renamed = rename_category(&db, &logger, &context, child.id, "Resistors THT").await?;
        assert_eq!(renamed.name, "Resistors THT");

        let cycle = move_category(&db, &logger, &context, root.id, Some(child.id)).await;
        assert!(matches!(cycle, Err(Error::Validation { .. })));

        let history = repository::element_history(&db, TargetType::Category, child.id, None, 0).await?;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].entry_type, LogEntryType::ElementEdited as i16);

        let refused = delete_category(&db, &logger, &context, root.id).await;
        assert!(matches!(refused, Err(Error::Validation { .. })));

        create_test_part(&db, "1k", child.id).await?;
        let refused = delete_category(&db, &logger, &context, child.id).await;
        assert!(matches!(refused, Err(Error::Validation { .. })));

        let empty = create_test_category(&db, "Empty").await?;
        delete_category(&db, &logger, &context, empty.id).await?;
        assert!(get_category_by_id(&db, empty.id).await?.is_none());
        let deletion = repository::undelete_data(&db, TargetType::Category, empty.id).await?;
        assert_eq!(deletion.entry_type, LogEntryType::ElementDeleted as i16);

        Ok(())
    }

    #[tokio::test]
    async fn test_storage_location_crud() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let context = LogContext::cli();

        let shelf = create_storage_location(&db, &logger, &context, "Shelf A", None).await?;
        let drawer = create_storage_location(&db, &logger, &context, "Drawer 1", Some(shelf.id)).await?;
        let other = create_storage_location(&db, &logger, &context, "Shelf B", None).await?;

        let moved = move_storage_location(&db, &logger, &context, drawer.id, Some(other.id)).await?;
        assert_eq!(moved.parent_id, Some(other.id));

        let all = get_all_storage_locations(&db).await?;
        assert_eq!(
            full_path(&all, drawer.id, PATH_DELIMITER).as_deref(),
            Some("Shelf B → Drawer 1")
        );

        delete_storage_location(&db, &logger, &context, shelf.id).await?;
        assert!(get_storage_location_by_id(&db, shelf.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_removes_owned_attachments() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let context = LogContext::cli();
        let pictures = create_test_attachment_type(&db, "Pictures", "image/*").await?;

        let category = create_test_category(&db, "Connectors").await?;
        let link = create_test_link(&db, (TargetType::Category, category.id), pictures.id, "https://example.com/jst.png").await?;
        let shelf = create_storage_location(&db, &logger, &context, "Shelf C", None).await?;
        create_test_link(&db, (TargetType::StorageLocation, shelf.id), pictures.id, "https://example.com/shelf.jpg").await?;

        delete_category(&db, &logger, &context, category.id).await?;
        delete_storage_location(&db, &logger, &context, shelf.id).await?;
        assert_eq!(Attachment::find().count(&db).await?, 0);

        let deletion = repository::undelete_data(&db, TargetType::Attachment, link.id).await?;
        assert_eq!(deletion.target_id, link.id);

        let missing = delete_storage_location(&db, &logger, &context, shelf.id).await;
        assert!(matches!(
            missing,
            Err(Error::NotFound {
                entity: "Storage location",
                ..
            })
        ));
        Ok(())
    }
}
