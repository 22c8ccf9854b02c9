use async_trait::async_trait;
use core_model::{
    HashIdCodec, Lifecycle, LifecycleEvent, RequestContext, SaveOp, Trashed, now_utc,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{CategoryError, CategoryResult};
use crate::models::{Category, CategoryPageFilter, ChildrenStrategy, NewCategory, UpdateCategory};
use crate::tree::{self, Move, Slot};

/// Persistence of category trees.
///
/// Ids are internal keys; [`CategoryRepository::decode_id`] maps the hashed
/// form clients send and every returned [`Category`] carries its hashed ids.
/// Structural writes (`create`, `reorder`, `delete`, `restore`) lock the
/// channel's live rows for their whole duration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Internal key of a hashed id; undecodable tokens are `NotFound`
    fn decode_id(&self, hashed: &str) -> CategoryResult<i64>;

    async fn find(&self, id: i64, trashed: Trashed) -> CategoryResult<Option<Category>>;

    /// Live categories of a channel
    async fn list_channel(&self, channel: &str) -> CategoryResult<Vec<Category>>;

    /// Live children of `parent` (roots when `None`) ordered by position
    async fn children_of(
        &self,
        channel: &str,
        parent: Option<i64>,
    ) -> CategoryResult<Vec<Category>>;

    /// One page ordered by id plus the total number of matches
    async fn paginate(&self, filter: CategoryPageFilter) -> CategoryResult<(Vec<Category>, u64)>;

    async fn slug_taken(
        &self,
        channel: &str,
        slug: &str,
        except: Option<i64>,
    ) -> CategoryResult<bool>;

    /// Insert as the last sibling of its group
    async fn create(&self, ctx: &RequestContext, input: NewCategory) -> CategoryResult<Category>;

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateCategory,
    ) -> CategoryResult<Category>;

    async fn reorder(
        &self,
        ctx: &RequestContext,
        channel: &str,
        parent: Option<i64>,
        siblings: Vec<i64>,
    ) -> CategoryResult<()>;

    /// Soft delete; returns every trashed key
    async fn delete(
        &self,
        ctx: &RequestContext,
        id: i64,
        strategy: ChildrenStrategy,
    ) -> CategoryResult<Vec<i64>>;

    /// Bring a trashed category back as the last sibling of its group
    async fn restore(&self, ctx: &RequestContext, id: i64) -> CategoryResult<Category>;
}

pub(crate) fn decode(codec: &HashIdCodec, hashed: &str) -> CategoryResult<i64> {
    codec
        .decode(hashed)
        .map_err(|_| CategoryError::NotFound(hashed.to_string()))
}

/// Point `category` at the parent and position of `step`
pub(crate) fn relocate(category: &mut Category, step: &Move, codec: &HashIdCodec) {
    category.parent_key = step.parent;
    category.parent_id = step.parent.map(|p| codec.encode(p));
    category.position = step.position;
    category.touch();
}

/// Save hooks for a write committed with the surrounding batch
pub(crate) fn fire_save(
    lifecycle: &Lifecycle<Category>,
    op: SaveOp,
    category: &mut Category,
    ctx: &RequestContext,
) -> CategoryResult<()> {
    lifecycle.before_save(op, category, ctx)?;
    lifecycle.after_save(op, category, ctx)?;
    Ok(())
}

/// Draft of a category about to be inserted
pub(crate) fn draft(input: NewCategory, position: i32, codec: &HashIdCodec) -> Category {
    let now = now_utc();
    Category {
        key: 0,
        id: String::new(),
        name: input.name,
        slug: input.slug,
        parent_key: input.parent,
        parent_id: input.parent.map(|p| codec.encode(p)),
        position,
        channel: input.channel,
        audit: Default::default(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

#[derive(Debug, Default)]
struct Store {
    rows: BTreeMap<i64, Category>,
    last_id: i64,
}

impl Store {
    fn live_slots(&self, channel: &str) -> Vec<Slot> {
        self.rows
            .values()
            .filter(|c| !c.is_trashed() && c.channel == channel)
            .map(Slot::from)
            .collect()
    }

    fn slug_taken(&self, channel: &str, slug: &str, except: Option<i64>) -> bool {
        self.rows.values().any(|c| {
            !c.is_trashed() && c.channel == channel && c.slug == slug && Some(c.key) != except
        })
    }

    fn live(&self, id: i64) -> CategoryResult<&Category> {
        self.rows
            .get(&id)
            .filter(|c| !c.is_trashed())
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))
    }
}

/// In-memory implementation of CategoryRepository (for development/testing)
///
/// A single write lock serializes structural changes, and changes are staged
/// and committed only once every hook has passed.
#[derive(Debug, Clone)]
pub struct InMemoryCategoryRepository {
    store: Arc<RwLock<Store>>,
    codec: HashIdCodec,
    lifecycle: Lifecycle<Category>,
    position_base: i32,
}

impl InMemoryCategoryRepository {
    pub fn new(codec: HashIdCodec) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            codec,
            lifecycle: Lifecycle::audited(),
            position_base: 0,
        }
    }

    pub fn with_position_base(mut self, base: i32) -> Self {
        self.position_base = base;
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle<Category>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    fn apply_moves(
        &self,
        store: &Store,
        moves: &[Move],
        ctx: &RequestContext,
        staged: &mut BTreeMap<i64, Category>,
    ) -> CategoryResult<()> {
        for step in moves {
            let mut category = match staged.remove(&step.id) {
                Some(c) => c,
                None => store.live(step.id)?.clone(),
            };
            relocate(&mut category, step, &self.codec);
            fire_save(&self.lifecycle, SaveOp::Update, &mut category, ctx)?;
            staged.insert(category.key, category);
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    fn decode_id(&self, hashed: &str) -> CategoryResult<i64> {
        decode(&self.codec, hashed)
    }

    async fn find(&self, id: i64, trashed: Trashed) -> CategoryResult<Option<Category>> {
        let store = self.store.read().await;
        Ok(store
            .rows
            .get(&id)
            .filter(|c| trashed.admits(c.deleted_at.as_ref()))
            .cloned())
    }

    async fn list_channel(&self, channel: &str) -> CategoryResult<Vec<Category>> {
        let store = self.store.read().await;
        Ok(store
            .rows
            .values()
            .filter(|c| !c.is_trashed() && c.channel == channel)
            .cloned()
            .collect())
    }

    async fn children_of(
        &self,
        channel: &str,
        parent: Option<i64>,
    ) -> CategoryResult<Vec<Category>> {
        let store = self.store.read().await;
        let mut children: Vec<Category> = store
            .rows
            .values()
            .filter(|c| !c.is_trashed() && c.channel == channel && c.parent_key == parent)
            .cloned()
            .collect();
        children.sort_by_key(|c| (c.position, c.key));
        Ok(children)
    }

    async fn paginate(&self, filter: CategoryPageFilter) -> CategoryResult<(Vec<Category>, u64)> {
        let store = self.store.read().await;
        let matches: Vec<&Category> = store
            .rows
            .values()
            .filter(|c| filter.trashed.admits(c.deleted_at.as_ref()))
            .filter(|c| filter.ids.as_ref().is_none_or(|ids| ids.contains(&c.key)))
            .collect();

        let total = matches.len() as u64;
        let page = matches
            .into_iter()
            .skip(filter.page.offset() as usize)
            .take(filter.page.limit() as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn slug_taken(
        &self,
        channel: &str,
        slug: &str,
        except: Option<i64>,
    ) -> CategoryResult<bool> {
        Ok(self.store.read().await.slug_taken(channel, slug, except))
    }

    async fn create(&self, ctx: &RequestContext, input: NewCategory) -> CategoryResult<Category> {
        let mut store = self.store.write().await;

        if let Some(parent) = input.parent {
            if store.live(parent)?.channel != input.channel {
                return Err(CategoryError::Unprocessable(
                    "parent belongs to another channel".to_string(),
                ));
            }
        }
        if store.slug_taken(&input.channel, &input.slug, None) {
            return Err(CategoryError::DuplicateSlug(input.slug));
        }

        let slots = store.live_slots(&input.channel);
        let position = tree::next_position(&slots, input.parent, self.position_base);
        let key = store.last_id + 1;

        let mut category = draft(input, position, &self.codec);
        category.key = key;
        category.id = self.codec.encode(key);
        fire_save(&self.lifecycle, SaveOp::Create, &mut category, ctx)?;

        store.last_id = key;
        store.rows.insert(key, category.clone());

        tracing::info!(category_id = %category.id, channel = %category.channel, position, "Created category");
        Ok(category)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateCategory,
    ) -> CategoryResult<Category> {
        let mut store = self.store.write().await;
        let mut category = store.live(id)?.clone();

        if let Some(slug) = input.slug.as_ref() {
            if store.slug_taken(&category.channel, slug, Some(id)) {
                return Err(CategoryError::DuplicateSlug(slug.clone()));
            }
        }

        category.apply_update(input);
        fire_save(&self.lifecycle, SaveOp::Update, &mut category, ctx)?;
        store.rows.insert(id, category.clone());

        tracing::info!(category_id = %category.id, "Updated category");
        Ok(category)
    }

    async fn reorder(
        &self,
        ctx: &RequestContext,
        channel: &str,
        parent: Option<i64>,
        siblings: Vec<i64>,
    ) -> CategoryResult<()> {
        let mut store = self.store.write().await;
        let slots = store.live_slots(channel);
        let moves = tree::plan_reorder(&slots, parent, &siblings, self.position_base)?;

        let mut staged = BTreeMap::new();
        self.apply_moves(&store, &moves, ctx, &mut staged)?;
        store.rows.extend(staged);

        tracing::info!(channel, moved = moves.len(), "Reordered categories");
        Ok(())
    }

    async fn delete(
        &self,
        ctx: &RequestContext,
        id: i64,
        strategy: ChildrenStrategy,
    ) -> CategoryResult<Vec<i64>> {
        let mut store = self.store.write().await;
        let channel = store.live(id)?.channel.clone();
        let slots = store.live_slots(&channel);
        let plan = tree::plan_delete(&slots, id, strategy, self.position_base)?;

        let mut staged = BTreeMap::new();
        for key in &plan.trash {
            let mut category = store.live(*key)?.clone();
            self.lifecycle.fire(LifecycleEvent::Deleting, &mut category, ctx)?;
            category.deleted_at = Some(now_utc());
            category.touch();
            self.lifecycle.fire(LifecycleEvent::Deleted, &mut category, ctx)?;
            staged.insert(*key, category);
        }
        self.apply_moves(&store, &plan.moves, ctx, &mut staged)?;
        store.rows.extend(staged);

        tracing::info!(category_id = id, %strategy, trashed = plan.trash.len(), "Deleted category");
        Ok(plan.trash)
    }

    async fn restore(&self, ctx: &RequestContext, id: i64) -> CategoryResult<Category> {
        let mut store = self.store.write().await;
        let mut category = store
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))?;

        if !category.is_trashed() {
            return Err(CategoryError::Unprocessable("Category is not trashed".to_string()));
        }
        if let Some(parent) = category.parent_key {
            if store.live(parent).is_err() {
                return Err(CategoryError::Unprocessable(
                    "Restore the parent category first".to_string(),
                ));
            }
        }
        if store.slug_taken(&category.channel, &category.slug, Some(id)) {
            return Err(CategoryError::DuplicateSlug(category.slug));
        }

        let slots = store.live_slots(&category.channel);
        let position = tree::next_position(&slots, category.parent_key, self.position_base);

        self.lifecycle.fire(LifecycleEvent::Restoring, &mut category, ctx)?;
        category.deleted_at = None;
        category.position = position;
        category.touch();
        fire_save(&self.lifecycle, SaveOp::Update, &mut category, ctx)?;
        self.lifecycle.fire(LifecycleEvent::Restored, &mut category, ctx)?;
        store.rows.insert(id, category.clone());

        tracing::info!(category_id = %category.id, position, "Restored category");
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::LifecycleError;

    fn repo() -> InMemoryCategoryRepository {
        InMemoryCategoryRepository::new(HashIdCodec::new("test", 8))
    }

    fn ctx() -> RequestContext {
        RequestContext::default().with_user(3).with_ip("10.1.1.1")
    }

    fn input(slug: &str, parent: Option<i64>) -> NewCategory {
        NewCategory {
            name: BTreeMap::from([("en".to_string(), slug.to_string())]),
            slug: slug.to_string(),
            parent,
            channel: "webstore".to_string(),
        }
    }

    async fn positions(repo: &InMemoryCategoryRepository, parent: Option<i64>) -> Vec<(String, i32)> {
        repo.children_of("webstore", parent)
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.slug, c.position))
            .collect()
    }

    #[tokio::test]
    async fn create_appends_and_stamps_audit() {
        let repo = repo();
        let first = repo.create(&ctx(), input("a", None)).await.unwrap();
        let second = repo.create(&ctx(), input("b", None)).await.unwrap();

        assert_eq!(first.position, 0);
        assert_eq!(second.position, 1);
        assert_eq!(second.audit.created_by, Some(3));
        assert_eq!(second.audit.created_ip.as_deref(), Some("10.1.1.1"));
        assert_eq!(repo.decode_id(&second.id).unwrap(), second.key);
    }

    #[tokio::test]
    async fn position_base_one() {
        let repo = repo().with_position_base(1);
        let root = repo.create(&ctx(), input("a", None)).await.unwrap();
        let child = repo.create(&ctx(), input("b", Some(root.key))).await.unwrap();
        assert_eq!(root.position, 1);
        assert_eq!(child.position, 1);
        assert_eq!(child.parent_id.as_deref(), Some(root.id.as_str()));
    }

    #[tokio::test]
    async fn duplicate_slug_in_channel_conflicts() {
        let repo = repo();
        repo.create(&ctx(), input("a", None)).await.unwrap();
        let err = repo.create(&ctx(), input("a", None)).await.unwrap_err();
        assert!(matches!(err, CategoryError::DuplicateSlug(_)));
    }

    #[tokio::test]
    async fn reorder_then_trash_and_restore() {
        let repo = repo();
        let a = repo.create(&ctx(), input("a", None)).await.unwrap();
        let b = repo.create(&ctx(), input("b", None)).await.unwrap();
        let c = repo.create(&ctx(), input("c", None)).await.unwrap();

        repo.reorder(&ctx(), "webstore", None, vec![c.key]).await.unwrap();
        assert_eq!(
            positions(&repo, None).await,
            vec![("c".into(), 0), ("a".into(), 1), ("b".into(), 2)]
        );

        let trashed = repo.delete(&ctx(), a.key, ChildrenStrategy::Forbid).await.unwrap();
        assert_eq!(trashed, vec![a.key]);
        assert_eq!(positions(&repo, None).await, vec![("c".into(), 0), ("b".into(), 1)]);
        assert!(repo.find(a.key, Trashed::Without).await.unwrap().is_none());
        assert!(repo.find(a.key, Trashed::Only).await.unwrap().is_some());

        let restored = repo.restore(&ctx(), a.key).await.unwrap();
        assert_eq!(restored.position, 2);
        assert!(restored.deleted_at.is_none());
        assert!(repo.find(b.key, Trashed::Without).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn restore_needs_live_parent() {
        let repo = repo();
        repo.create(&ctx(), input("root", None)).await.unwrap();
        let parent = repo.create(&ctx(), input("p", None)).await.unwrap();
        let child = repo.create(&ctx(), input("c", Some(parent.key))).await.unwrap();

        repo.delete(&ctx(), parent.key, ChildrenStrategy::Cascade).await.unwrap();
        let err = repo.restore(&ctx(), child.key).await.unwrap_err();
        assert!(matches!(err, CategoryError::Unprocessable(_)));

        repo.restore(&ctx(), parent.key).await.unwrap();
        repo.restore(&ctx(), child.key).await.unwrap();
    }

    #[tokio::test]
    async fn rejecting_hook_leaves_store_untouched() {
        let veto = |_: LifecycleEvent, c: &mut Category, _: &RequestContext| -> Result<(), LifecycleError> {
            if c.slug == "blocked" {
                return Err(LifecycleError::new(LifecycleEvent::Saving, "blocked slug"));
            }
            Ok(())
        };
        let repo = repo().with_lifecycle(Lifecycle::audited().on(LifecycleEvent::Saving, veto));

        let err = repo.create(&ctx(), input("blocked", None)).await.unwrap_err();
        assert!(matches!(err, CategoryError::Unprocessable(_)));
        assert!(repo.list_channel("webstore").await.unwrap().is_empty());

        let ok = repo.create(&ctx(), input("fine", None)).await.unwrap();
        assert_eq!(ok.key, 1);
    }

    #[tokio::test]
    async fn concurrent_reorders_keep_groups_dense() {
        let repo = repo();
        let mut keys = Vec::new();
        for slug in ["a", "b", "c", "d", "e"] {
            keys.push(repo.create(&ctx(), input(slug, None)).await.unwrap().key);
        }

        let mut handles = Vec::new();
        for i in 0..keys.len() {
            let repo = repo.clone();
            let mut order = keys.clone();
            order.rotate_left(i);
            handles.push(tokio::spawn(async move {
                repo.reorder(&RequestContext::system(), "webstore", None, order).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let slots: Vec<Slot> = repo
            .list_channel("webstore")
            .await
            .unwrap()
            .iter()
            .map(Slot::from)
            .collect();
        let mut positions: Vec<i32> = slots.iter().map(|s| s.position).collect();
        positions.sort();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn paginate_filters_ids_and_trashed() {
        let repo = repo();
        let mut keys = Vec::new();
        for slug in ["a", "b", "c"] {
            keys.push(repo.create(&ctx(), input(slug, None)).await.unwrap().key);
        }
        repo.delete(&ctx(), keys[1], ChildrenStrategy::Forbid).await.unwrap();

        let (page, total) = repo.paginate(CategoryPageFilter::default()).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(page.len(), 2);

        let (page, total) = repo
            .paginate(CategoryPageFilter {
                ids: Some(vec![keys[1], keys[2]]),
                trashed: Trashed::With,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(page[0].key, keys[1]);
    }
}
