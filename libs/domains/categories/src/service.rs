use core_config::catalog::CatalogConfig;
use core_model::{Localize, LocalizedText, Paginated, RequestContext, Trashed, unsupported_locales};
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

use crate::error::{CategoryError, CategoryResult};
use crate::models::{
    Category, CategoryListQuery, CategoryNode, CategoryPageFilter, ChildrenStrategy,
    CreateCategory, NestedCategory, NewCategory, ReorderCategories, ReorderStatus, UpdateCategory,
};
use crate::repository::CategoryRepository;
use crate::tree::{self, TreeError};

/// Service layer for category tree business logic
#[derive(Clone)]
pub struct CategoryService<R: CategoryRepository> {
    repository: Arc<R>,
    settings: CatalogConfig,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repository: R, settings: CatalogConfig) -> Self {
        Self {
            repository: Arc::new(repository),
            settings,
        }
    }

    fn channel(&self, requested: Option<String>) -> String {
        requested.unwrap_or_else(|| self.settings.default_channel.clone())
    }

    fn present<T: Localize>(&self, ctx: &RequestContext, value: T) -> T {
        value.localize(&ctx.timezone_or(self.settings.app_timezone))
    }

    fn check_locales(&self, name: &LocalizedText) -> CategoryResult<()> {
        let unknown = unsupported_locales(name, &self.settings.supported_locales);
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(CategoryError::InvalidLanguage(unknown))
        }
    }

    /// Live category behind a hashed id
    async fn live(&self, hashed: &str) -> CategoryResult<Category> {
        let key = self.repository.decode_id(hashed)?;
        self.repository
            .find(key, Trashed::Without)
            .await?
            .ok_or_else(|| CategoryError::NotFound(hashed.to_string()))
    }

    /// Nested tree of a channel, siblings ordered by position
    pub async fn get_category_tree(
        &self,
        ctx: &RequestContext,
        channel: Option<String>,
    ) -> CategoryResult<Vec<CategoryNode>> {
        let categories = self.repository.list_channel(&self.channel(channel)).await?;
        Ok(self.present(ctx, tree::build_tree(categories)))
    }

    /// Depth-first flattening of [`Self::get_category_tree`]
    pub async fn get_nested_list(
        &self,
        ctx: &RequestContext,
        channel: Option<String>,
    ) -> CategoryResult<Vec<NestedCategory>> {
        let categories = self.repository.list_channel(&self.channel(channel)).await?;
        Ok(self.present(ctx, tree::flatten_nested(tree::build_tree(categories))))
    }

    /// Children of `parent`, or the roots of `channel` when no parent is given
    pub async fn get_by_parent_id(
        &self,
        ctx: &RequestContext,
        parent: Option<&str>,
        channel: Option<String>,
    ) -> CategoryResult<Vec<Category>> {
        let children = match parent {
            Some(hashed) => {
                let parent = self.live(hashed).await?;
                self.repository
                    .children_of(&parent.channel, Some(parent.key))
                    .await?
            }
            None => {
                self.repository
                    .children_of(&self.channel(channel), None)
                    .await?
            }
        };
        Ok(self.present(ctx, children))
    }

    /// Page of categories ordered by id. Tokens that do not decode match nothing.
    pub async fn get_paginated(
        &self,
        ctx: &RequestContext,
        query: &CategoryListQuery,
    ) -> CategoryResult<Paginated<Category>> {
        let tokens = query.id_tokens();
        let ids = (!tokens.is_empty()).then(|| {
            tokens
                .iter()
                .filter_map(|token| self.repository.decode_id(token).ok())
                .collect::<Vec<_>>()
        });

        let page = query.page();
        let filter = CategoryPageFilter {
            ids,
            trashed: query.trashed,
            page,
        };
        let (rows, total) = self.repository.paginate(filter).await?;
        Ok(Paginated::new(self.present(ctx, rows), total, page))
    }

    pub async fn get_by_hashed_id(
        &self,
        ctx: &RequestContext,
        id: &str,
        trashed: Trashed,
    ) -> CategoryResult<Category> {
        let key = self.repository.decode_id(id)?;
        let category = self
            .repository
            .find(key, trashed)
            .await?
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))?;
        Ok(self.present(ctx, category))
    }

    /// Create a category as the last sibling of its group
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateCategory,
    ) -> CategoryResult<Category> {
        input
            .validate()
            .map_err(|e| CategoryError::Validation(e.to_string()))?;
        self.check_locales(&input.name)?;

        let (parent, channel) = match input.parent_id.as_deref() {
            Some(hashed) => {
                let parent = self.live(hashed).await?;
                if input.channel.as_ref().is_some_and(|c| *c != parent.channel) {
                    return Err(CategoryError::Unprocessable(
                        "parent belongs to another channel".to_string(),
                    ));
                }
                (Some(parent.key), parent.channel)
            }
            None => (None, self.channel(input.channel)),
        };

        if self.repository.slug_taken(&channel, &input.slug, None).await? {
            return Err(CategoryError::DuplicateSlug(input.slug));
        }

        let category = self
            .repository
            .create(
                ctx,
                NewCategory {
                    name: input.name,
                    slug: input.slug,
                    parent,
                    channel,
                },
            )
            .await?;
        Ok(self.present(ctx, category))
    }

    /// Rewrite one sibling group in a single atomic step
    pub async fn reorder(
        &self,
        ctx: &RequestContext,
        input: ReorderCategories,
    ) -> CategoryResult<ReorderStatus> {
        if input.siblings.is_empty() {
            return Err(TreeError::EmptySiblings.into());
        }
        let mut seen = HashSet::new();
        if !input.siblings.iter().all(|s| seen.insert(s.as_str())) {
            return Err(TreeError::DuplicateSibling.into());
        }

        let mut keys = Vec::with_capacity(input.siblings.len());
        let mut channel: Option<String> = None;
        for hashed in &input.siblings {
            let sibling = self.live(hashed).await?;
            match channel.as_deref() {
                Some(c) if c != sibling.channel => {
                    return Err(CategoryError::Unprocessable(
                        "siblings belong to different channels".to_string(),
                    ));
                }
                Some(_) => {}
                None => channel = Some(sibling.channel.clone()),
            }
            keys.push(sibling.key);
        }
        let channel = channel.unwrap_or_else(|| self.settings.default_channel.clone());

        let parent = match input.parent_id.as_deref() {
            Some(hashed) => {
                let parent = self.live(hashed).await?;
                if parent.channel != channel {
                    return Err(CategoryError::Unprocessable(
                        "parent belongs to another channel".to_string(),
                    ));
                }
                Some(parent.key)
            }
            None => None,
        };

        self.repository.reorder(ctx, &channel, parent, keys).await?;
        Ok(ReorderStatus {
            status: "success".to_string(),
        })
    }

    /// Merge the given fields over the stored category
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: UpdateCategory,
    ) -> CategoryResult<Category> {
        input
            .validate()
            .map_err(|e| CategoryError::Validation(e.to_string()))?;
        if let Some(name) = input.name.as_ref() {
            self.check_locales(name)?;
        }

        let current = self.live(id).await?;
        let category = self.repository.update(ctx, current.key, input).await?;
        Ok(self.present(ctx, category))
    }

    /// Soft delete; returns how many categories were trashed
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: &str,
        strategy: ChildrenStrategy,
    ) -> CategoryResult<usize> {
        let key = self.repository.decode_id(id)?;
        let trashed = self.repository.delete(ctx, key, strategy).await?;
        Ok(trashed.len())
    }

    pub async fn restore(&self, ctx: &RequestContext, id: &str) -> CategoryResult<Category> {
        let key = self.repository.decode_id(id)?;
        let category = self.repository.restore(ctx, key).await?;
        Ok(self.present(ctx, category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockCategoryRepository;
    use core_model::{AuditFields, now_utc};
    use mockall::predicate::{always, eq};
    use std::collections::BTreeMap;

    fn category(key: i64, channel: &str, parent: Option<i64>) -> Category {
        Category {
            key,
            id: format!("h{}", key),
            name: BTreeMap::from([("en".to_string(), format!("c{}", key))]),
            slug: format!("c{}", key),
            parent_key: parent,
            parent_id: parent.map(|p| format!("h{}", p)),
            position: 0,
            channel: channel.to_string(),
            audit: AuditFields::default(),
            created_at: now_utc(),
            updated_at: now_utc(),
            deleted_at: None,
        }
    }

    /// Decodes `h<key>` tokens and serves `rows` from `find`
    fn mock_with(rows: Vec<Category>) -> MockCategoryRepository {
        let mut mock = MockCategoryRepository::new();
        mock.expect_decode_id().returning(|hashed| {
            hashed
                .strip_prefix('h')
                .and_then(|k| k.parse().ok())
                .ok_or_else(|| CategoryError::NotFound(hashed.to_string()))
        });
        mock.expect_find().returning(move |key, _| {
            Ok(rows.iter().find(|c| c.key == key).cloned())
        });
        mock
    }

    fn service(mock: MockCategoryRepository) -> CategoryService<MockCategoryRepository> {
        let settings = CatalogConfig {
            supported_locales: vec!["en".to_string(), "fr".to_string()],
            ..CatalogConfig::default()
        };
        CategoryService::new(mock, settings)
    }

    fn create_input(parent: Option<&str>, channel: Option<&str>) -> CreateCategory {
        CreateCategory {
            name: BTreeMap::from([("en".to_string(), "Boots".to_string())]),
            slug: "boots".to_string(),
            parent_id: parent.map(String::from),
            channel: channel.map(String::from),
        }
    }

    #[tokio::test]
    async fn create_rejects_unsupported_locales() {
        let service = service(MockCategoryRepository::new());
        let mut input = create_input(None, None);
        input.name.insert("de".to_string(), "Stiefel".to_string());

        let err = service.create(&RequestContext::system(), input).await.unwrap_err();
        assert!(matches!(err, CategoryError::InvalidLanguage(ref l) if l == &vec!["de".to_string()]));
    }

    #[tokio::test]
    async fn create_inherits_the_parent_channel() {
        let mut mock = mock_with(vec![category(4, "outlet", None)]);
        mock.expect_slug_taken()
            .with(eq("outlet"), eq("boots"), eq(None::<i64>))
            .returning(|_, _, _| Ok(false));
        mock.expect_create()
            .withf(|_, input| input.channel == "outlet" && input.parent == Some(4))
            .returning(|_, input| {
                let mut created = category(9, &input.channel, input.parent);
                created.slug = input.slug;
                Ok(created)
            });

        let created = service(mock)
            .create(&RequestContext::system(), create_input(Some("h4"), None))
            .await
            .unwrap();
        assert_eq!(created.parent_id.as_deref(), Some("h4"));
        assert_eq!(created.channel, "outlet");
    }

    #[tokio::test]
    async fn create_rejects_conflicting_channel() {
        let mock = mock_with(vec![category(4, "outlet", None)]);
        let err = service(mock)
            .create(&RequestContext::system(), create_input(Some("h4"), Some("webstore")))
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::Unprocessable(_)));
    }

    #[tokio::test]
    async fn create_with_unknown_parent_is_not_found() {
        let mock = mock_with(vec![]);
        let err = service(mock)
            .create(&RequestContext::system(), create_input(Some("nope"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_reports_duplicate_slug() {
        let mut mock = MockCategoryRepository::new();
        mock.expect_slug_taken().returning(|_, _, _| Ok(true));
        mock.expect_create().never();

        let err = service(mock)
            .create(&RequestContext::system(), create_input(None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::DuplicateSlug(_)));
    }

    #[tokio::test]
    async fn reorder_rejects_empty_and_duplicate_siblings() {
        let service = service(MockCategoryRepository::new());
        let ctx = RequestContext::system();

        let empty = ReorderCategories {
            parent_id: None,
            siblings: vec![],
        };
        assert!(matches!(
            service.reorder(&ctx, empty).await.unwrap_err(),
            CategoryError::Unprocessable(_)
        ));

        let twice = ReorderCategories {
            parent_id: None,
            siblings: vec!["h1".to_string(), "h1".to_string()],
        };
        assert!(matches!(
            service.reorder(&ctx, twice).await.unwrap_err(),
            CategoryError::Unprocessable(_)
        ));
    }

    #[tokio::test]
    async fn reorder_rejects_mixed_channels() {
        let mut mock = mock_with(vec![category(1, "webstore", None), category(2, "outlet", None)]);
        mock.expect_reorder().never();

        let err = service(mock)
            .reorder(
                &RequestContext::system(),
                ReorderCategories {
                    parent_id: None,
                    siblings: vec!["h1".to_string(), "h2".to_string()],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::Unprocessable(_)));
    }

    #[tokio::test]
    async fn reorder_passes_decoded_keys_in_order() {
        let mut mock = mock_with(vec![
            category(1, "webstore", None),
            category(2, "webstore", None),
            category(3, "webstore", None),
        ]);
        mock.expect_reorder()
            .with(always(), eq("webstore"), eq(Some(3)), eq(vec![2, 1]))
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let status = service(mock)
            .reorder(
                &RequestContext::system(),
                ReorderCategories {
                    parent_id: Some("h3".to_string()),
                    siblings: vec!["h2".to_string(), "h1".to_string()],
                },
            )
            .await
            .unwrap();
        assert_eq!(status.status, "success");
    }

    #[tokio::test]
    async fn tree_is_presented_in_the_callers_timezone() {
        let mut mock = MockCategoryRepository::new();
        mock.expect_list_channel()
            .with(eq("webstore"))
            .returning(|_| Ok(vec![category(1, "webstore", None), category(2, "webstore", Some(1))]));

        let ctx = RequestContext::system().with_timezone(chrono_tz::Asia::Tokyo);
        let tree = service(mock).get_category_tree(&ctx, None).await.unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].category.created_at.offset().local_minus_utc(), 9 * 3600);
    }

    #[tokio::test]
    async fn paginate_drops_undecodable_ids() {
        let mut mock = mock_with(vec![]);
        mock.expect_paginate()
            .withf(|filter| filter.ids == Some(vec![5]))
            .returning(|_| Ok((vec![category(5, "webstore", None)], 1)));

        let query = CategoryListQuery {
            ids: Some("h5,garbage".to_string()),
            ..Default::default()
        };
        let page = service(mock)
            .get_paginated(&RequestContext::system(), &query)
            .await
            .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.meta.pagination.total, 1);
    }

    #[tokio::test]
    async fn update_of_trashed_category_is_not_found() {
        let mut mock = MockCategoryRepository::new();
        mock.expect_decode_id().returning(|_| Ok(7));
        mock.expect_find()
            .with(eq(7), eq(Trashed::Without))
            .returning(|_, _| Ok(None));
        mock.expect_update().never();

        let err = service(mock)
            .update(&RequestContext::system(), "h7", UpdateCategory::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::NotFound(_)));
    }
}
