//! CRUD actions over a bound resource.
//!
//! [`CollectionView`] runs one [`ViewAction`] for one request and returns a
//! [`ViewOutput`] the HTTP layer serialises. The method-to-action mapping
//! comes from [`action_table`].

use http::{Method, StatusCode};
use ramify_core::{Collection, Entity, QueryParams, SearchHits, ViewError, ViewResult};
use ramify_router::{ActionTable, Depth, ViewAction};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::base::BaseView;
use crate::registry::ViewKind;

/// The result of a view action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ViewOutput {
    /// A page of entities.
    Collection(Collection),
    /// Raw search-index documents.
    Documents(SearchHits),
    /// A single entity.
    Item(Entity),
    /// A newly created entity and its URL.
    Created {
        /// The saved entity.
        entity: Entity,
        /// URL of the entity's item route.
        location: String,
    },
    /// A bare JSON value.
    Value(Value),
    /// Number of entities a bulk action touched.
    Count(u64),
    /// Nothing to return.
    NoContent,
    /// Methods allowed on the route.
    Allowed(Vec<String>),
}

impl ViewOutput {
    /// Returns the HTTP status for the output.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Created { .. } => StatusCode::CREATED,
            Self::NoContent => StatusCode::NO_CONTENT,
            _ => StatusCode::OK,
        }
    }

    /// Returns the `Allow` header value for options output.
    #[must_use]
    pub fn allow_header(&self) -> Option<String> {
        match self {
            Self::Allowed(methods) => Some(methods.join(", ")),
            _ => None,
        }
    }
}

/// Returns the method table for a view kind at a depth.
///
/// Item-attribute views only list and append at the collection level.
#[must_use]
pub fn action_table(kind: ViewKind, depth: Depth) -> ActionTable {
    match (kind, depth) {
        (ViewKind::ItemAttribute, Depth::Collection) => ActionTable::new()
            .get(ViewAction::Index)
            .head(ViewAction::Index)
            .post(ViewAction::Create)
            .options(ViewAction::CollectionOptions),
        (ViewKind::ItemAttribute, Depth::Item) => {
            ActionTable::new().options(ViewAction::ItemOptions)
        }
        (_, depth) => ActionTable::for_depth(depth),
    }
}

/// Runs CRUD actions for one request.
#[derive(Debug)]
pub struct CollectionView<'r> {
    base: BaseView<'r>,
}

impl<'r> CollectionView<'r> {
    /// Wraps a base view.
    #[must_use]
    pub const fn new(base: BaseView<'r>) -> Self {
        Self { base }
    }

    /// Returns the base view.
    #[must_use]
    pub const fn base(&self) -> &BaseView<'r> {
        &self.base
    }

    /// Returns the base view mutably.
    pub fn base_mut(&mut self) -> &mut BaseView<'r> {
        &mut self.base
    }

    /// Runs `action`.
    pub async fn run(&mut self, action: ViewAction) -> ViewResult<ViewOutput> {
        debug!(
            resource = self.base.node().uid(),
            action = action.as_str(),
            "running view action"
        );
        match action {
            ViewAction::Index => self.index().await,
            ViewAction::Show => self.show().await,
            ViewAction::Create => self.create().await,
            ViewAction::Update => self.update().await,
            ViewAction::Replace => self.replace().await,
            ViewAction::Delete => self.delete().await,
            ViewAction::UpdateMany => self.update_many().await,
            ViewAction::DeleteMany => self.delete_many().await,
            ViewAction::CollectionOptions => Ok(self.options(Depth::Collection)),
            ViewAction::ItemOptions => Ok(self.options(Depth::Item)),
        }
    }

    /// Lists the (scoped) collection.
    pub async fn index(&mut self) -> ViewResult<ViewOutput> {
        match self.base.binding().kind() {
            ViewKind::ItemAttribute => Ok(ViewOutput::Value(self.base.attribute_index().await?)),
            _ if self.reads_search_index() => {
                let hits = self.base.get_collection_es(&QueryParams::new()).await?;
                self.wrap_hits(hits)
            }
            _ => Ok(ViewOutput::Collection(
                self.base.get_collection(&QueryParams::new()).await?,
            )),
        }
    }

    /// Returns the addressed item.
    pub async fn show(&mut self) -> ViewResult<ViewOutput> {
        let entity = if self.reads_search_index() {
            self.base.get_item_es().await?
        } else {
            self.base.get_item().await?
        };
        Ok(ViewOutput::Item(entity))
    }

    /// Builds an entity from the body, assigns its ACL and saves it.
    pub async fn create(&mut self) -> ViewResult<ViewOutput> {
        if self.base.binding().kind() == ViewKind::ItemAttribute {
            return Ok(ViewOutput::Value(self.base.attribute_create().await?));
        }

        let model = self.base.model();
        let mut entity = model.build(self.base.request().body().clone())?;
        self.base.set_object_acl(&mut entity);
        let entity = model.save(entity, self.base.request()).await?;
        let location = self.base.location(&entity)?;
        Ok(ViewOutput::Created { entity, location })
    }

    /// Applies the body to the addressed item.
    pub async fn update(&mut self) -> ViewResult<ViewOutput> {
        let entity = self.base.get_item().await?;
        let request = self.base.request();
        let fields = request.body().clone();
        let updated = self.base.model().update(entity, fields, request).await?;
        Ok(ViewOutput::Item(updated))
    }

    /// Same as [`update`](Self::update).
    pub async fn replace(&mut self) -> ViewResult<ViewOutput> {
        self.update().await
    }

    /// Deletes the addressed item.
    pub async fn delete(&mut self) -> ViewResult<ViewOutput> {
        let entity = self.base.get_item().await?;
        self.base.model().delete(entity, self.base.request()).await?;
        Ok(ViewOutput::NoContent)
    }

    /// Applies the body to every entity of the (scoped) collection.
    pub async fn update_many(&mut self) -> ViewResult<ViewOutput> {
        let collection = self.base.get_collection(&QueryParams::new()).await?;
        let request = self.base.request();
        let count = self
            .base
            .model()
            .update_many(collection, request.body(), request)
            .await?;
        Ok(ViewOutput::Count(count))
    }

    /// Deletes every entity of the (scoped) collection.
    pub async fn delete_many(&mut self) -> ViewResult<ViewOutput> {
        let collection = self.base.get_collection(&QueryParams::new()).await?;
        let count = self
            .base
            .model()
            .delete_many(collection, self.base.request())
            .await?;
        Ok(ViewOutput::Count(count))
    }

    fn options(&self, depth: Depth) -> ViewOutput {
        let methods = action_table(self.base.binding().kind(), depth)
            .allowed_methods()
            .iter()
            .map(Method::to_string)
            .collect();
        ViewOutput::Allowed(methods)
    }

    fn reads_search_index(&self) -> bool {
        let binding = self.base.binding();
        binding.kind() == ViewKind::SearchIndexed
            && binding.index().is_some()
            && self.base.registry.search_config().enabled
    }

    fn wrap_hits(&self, hits: SearchHits) -> ViewResult<ViewOutput> {
        if self.base.registry.settings().raw_search_results {
            return Ok(ViewOutput::Documents(hits));
        }
        let kind = self.base.model().name();
        let items = hits
            .documents
            .into_iter()
            .map(|document| {
                Entity::from_value(kind, document).ok_or_else(|| {
                    ViewError::search_index(format!(
                        "search index returned a non-object {kind} document"
                    ))
                })
            })
            .collect::<ViewResult<Vec<Entity>>>()?;
        let collection = Collection::new(items);
        Ok(ViewOutput::Collection(match hits.total {
            Some(total) => collection.with_total(total),
            None => collection,
        }))
    }
}
