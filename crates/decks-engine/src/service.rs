//! Deck entity service: the `decks.*` action table
//!
//! Each action call is a logging boundary:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Read actions go through the action cache. Every successful mutation
//! clears the deck cache (mesh-wide broadcast plus local purge) and then
//! hands the stored record to the entity hooks.

use async_trait::async_trait;
use decks_core::errors::{DecksError, ExError, FieldError};
use decks_core::model::{new_deck_id, Card, CardColor, Deck};
use decks_core::query::{self, Page, ReadOptions};
use decks_core::rules::validation::{as_object, require_id};
use decks_core::rules::{validate_create, validate_update};
use decks_core::{log_op_end, log_op_error, log_op_start, DeckChange, DeckEvent};
use decks_core_types::topics::{
    ACTION_COUNT, ACTION_CREATE, ACTION_FIND, ACTION_GET, ACTION_HEALTH, ACTION_LIST,
    ACTION_REMOVE, ACTION_UPDATE, CACHE_CLEAN_DECKS, CACHE_PATTERN_DECKS,
};
use decks_core_types::RequestContext;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use crate::broker::EventBroker;
use crate::cache::ActionCache;
use crate::collaborators::CardsService;
use crate::runtime::NodeRuntime;
use crate::store::{DeckStore, Result};

/// Every action name the service answers to
pub const ACTIONS: &[&str] = &[
    ACTION_CREATE,
    ACTION_LIST,
    ACTION_FIND,
    ACTION_COUNT,
    ACTION_GET,
    ACTION_UPDATE,
    ACTION_REMOVE,
    ACTION_HEALTH,
];

/// Observer of completed mutations
#[async_trait]
pub trait EntityHooks: Send + Sync {
    async fn entity_changed(&self, event: &DeckEvent, ctx: &RequestContext) -> Result<()>;
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ExError::from(DecksError::from(e)))
}

/// Target of a `decks.get` call
#[derive(Debug, Clone, PartialEq, Eq)]
enum IdSelector {
    One(String),
    Many(Vec<String>),
}

fn parse_get(params: &Value) -> std::result::Result<(IdSelector, bool), DecksError> {
    let object = as_object(params)?;
    let mapping = object
        .get("mapping")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let selector = match object.get("id") {
        Some(Value::Array(items)) => IdSelector::Many(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    Value::Number(n) => Ok(n.to_string()),
                    _ => Err(DecksError::Validation {
                        errors: vec![FieldError::new("id", "must contain only strings")],
                    }),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?,
        ),
        _ => IdSelector::One(require_id(params)?),
    };

    Ok((selector, mapping))
}

pub struct DeckService {
    store: DeckStore,
    cards: Arc<dyn CardsService>,
    broker: Arc<dyn EventBroker>,
    cache: Arc<ActionCache>,
    runtime: Arc<NodeRuntime>,
    hooks: Arc<dyn EntityHooks>,
}

impl DeckService {
    pub fn new(
        store: DeckStore,
        cards: Arc<dyn CardsService>,
        broker: Arc<dyn EventBroker>,
        cache: Arc<ActionCache>,
        runtime: Arc<NodeRuntime>,
        hooks: Arc<dyn EntityHooks>,
    ) -> Self {
        Self {
            store,
            cards,
            broker,
            cache,
            runtime,
            hooks,
        }
    }

    pub fn cache(&self) -> &Arc<ActionCache> {
        &self.cache
    }

    /// Invoke one action
    ///
    /// # Errors
    ///
    /// `NotImplemented` for unknown actions; otherwise the action's own
    /// failure, tagged with the caller's request id.
    pub async fn call(&self, action: &str, params: Value, ctx: &RequestContext) -> Result<Value> {
        log_op_start!(action, request_id = %ctx.request_id);
        let start = std::time::Instant::now();

        let result = self.call_impl(action, params, ctx).await.map_err(|e| {
            let e = e.with_request_id(ctx.request_id.clone());
            match &ctx.trace_id {
                Some(trace_id) => e.with_trace_id(trace_id.clone()),
                None => e,
            }
        });

        match &result {
            Ok(_) => {
                log_op_end!(
                    action,
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = %ctx.request_id
                );
            }
            Err(e) => {
                log_op_error!(
                    action,
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = %ctx.request_id
                );
            }
        }

        result
    }

    async fn call_impl(&self, action: &str, params: Value, ctx: &RequestContext) -> Result<Value> {
        match action {
            ACTION_CREATE => self.create(params, ctx).await,
            ACTION_UPDATE => self.update(params, ctx).await,
            ACTION_REMOVE => self.remove(params, ctx).await,
            ACTION_FIND => self.cached(action, params, |p| self.find(p)).await,
            ACTION_LIST => self.cached(action, params, |p| self.list(p)).await,
            ACTION_COUNT => self.cached(action, params, |p| self.count(p)).await,
            ACTION_GET => self.cached(action, params, |p| self.get(p)).await,
            ACTION_HEALTH => self.health(),
            other => Err(DecksError::ActionNotFound {
                action: other.to_string(),
            }
            .into()),
        }
    }

    /// `decks.health`: the runtime health, unchanged
    pub fn health(&self) -> Result<Value> {
        to_value(&self.runtime.health())
    }

    async fn cached<F, Fut>(&self, action: &str, params: Value, load: F) -> Result<Value>
    where
        F: FnOnce(Value) -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let key = ActionCache::key(action, &params);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(action, "action cache hit");
            return Ok(hit);
        }

        // A mutation committed while loading invalidates this result
        let generation = self.cache.generation();
        let value = load(params).await?;
        if !self.cache.set_if_current(key, value.clone(), generation) {
            tracing::debug!(action, "cache invalidated during load, result not cached");
        }
        Ok(value)
    }

    // ---- reads ----

    async fn find(&self, params: Value) -> Result<Value> {
        let (find, read) = query::parse_find(&params)?;
        let decks = self.store.find(find).await?;
        Ok(Value::Array(self.render(decks, &read).await?))
    }

    async fn list(&self, params: Value) -> Result<Value> {
        let (page, find, read) = query::parse_list(&params)?;
        let total = self.store.count(find.filter.clone()).await?;
        let decks = self.store.find(find).await?;
        let rows = self.render(decks, &read).await?;
        to_value(&Page::new(rows, total, page))
    }

    async fn count(&self, params: Value) -> Result<Value> {
        let filter = query::parse_filter(&params)?;
        Ok(Value::from(self.store.count(filter).await?))
    }

    async fn get(&self, params: Value) -> Result<Value> {
        let (selector, mapping) = parse_get(&params)?;
        let read = query::parse_read_options(&params)?;

        let (decks, single) = match selector {
            IdSelector::One(id) => {
                let deck = self
                    .store
                    .get(id.clone())
                    .await?
                    .ok_or(DecksError::DeckNotFound { deck_id: id })?;
                (vec![deck], true)
            }
            // Unknown ids are skipped rather than failing the batch
            IdSelector::Many(ids) => (self.store.get_many(ids).await?, false),
        };

        let keys: Vec<String> = decks.iter().map(|d| d.id.clone()).collect();
        let mut rendered = self.render(decks, &read).await?;

        if mapping {
            return Ok(Value::Object(keys.into_iter().zip(rendered).collect()));
        }
        if single {
            return Ok(rendered.pop().unwrap_or(Value::Null));
        }
        Ok(Value::Array(rendered))
    }

    /// Serialize records, expanding populated card lists and applying `fields`
    async fn render(&self, decks: Vec<Deck>, read: &ReadOptions) -> Result<Vec<Value>> {
        let cards = self.populate_cards(&decks, &read.populate).await?;

        decks
            .iter()
            .map(|deck| {
                let mut value = to_value(deck)?;
                for color in &read.populate {
                    let populated = deck
                        .cards(*color)
                        .iter()
                        .filter_map(|id| cards.get(id))
                        .map(to_value)
                        .collect::<Result<Vec<_>>>()?;
                    value[color.deck_field()] = Value::Array(populated);
                }
                Ok(match &read.fields {
                    Some(fields) => query::project(value, fields),
                    None => value,
                })
            })
            .collect()
    }

    /// One `cards.get` for every distinct id the response will embed
    async fn populate_cards(
        &self,
        decks: &[Deck],
        colors: &[CardColor],
    ) -> Result<HashMap<String, Card>> {
        if colors.is_empty() {
            return Ok(HashMap::new());
        }

        let mut seen = HashSet::new();
        let ids: Vec<String> = decks
            .iter()
            .flat_map(|deck| colors.iter().flat_map(move |c| deck.cards(*c)))
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();

        self.cards.get_many(&ids).await
    }

    // ---- mutations ----

    async fn create(&self, params: Value, ctx: &RequestContext) -> Result<Value> {
        let deck = validate_create(&params)?.into_deck(new_deck_id());
        let stored = self.store.insert(deck).await?;
        self.after_mutation(DeckChange::Created, &stored, ctx).await;
        to_value(&stored)
    }

    async fn update(&self, params: Value, ctx: &RequestContext) -> Result<Value> {
        let (id, patch) = validate_update(&params)?;
        let stored = self
            .store
            .update(id.clone(), patch)
            .await?
            .ok_or(DecksError::DeckNotFound { deck_id: id })?;
        self.after_mutation(DeckChange::Updated, &stored, ctx).await;
        to_value(&stored)
    }

    async fn remove(&self, params: Value, ctx: &RequestContext) -> Result<Value> {
        let id = require_id(&params)?;
        let removed = self
            .store
            .remove(id.clone())
            .await?
            .ok_or(DecksError::DeckNotFound { deck_id: id })?;
        self.after_mutation(DeckChange::Removed, &removed, ctx).await;
        to_value(&removed)
    }

    /// Cache invalidation, then the lifecycle hook
    ///
    /// The mutation is already committed, so failures here are logged and
    /// do not fail the action.
    async fn after_mutation(&self, change: DeckChange, deck: &Deck, ctx: &RequestContext) {
        if let Err(e) = clear_deck_cache(self.broker.as_ref(), &self.cache).await {
            tracing::warn!(deck_id = %deck.id, error = %e, "cache invalidation failed");
        }

        let event = DeckEvent::new(change, deck.clone());
        if let Err(e) = self.hooks.entity_changed(&event, ctx).await {
            tracing::warn!(deck_id = %deck.id, topic = event.topic(), error = %e, "entity hook failed");
        }
    }
}

/// Tell every node to drop cached deck results, and drop ours now
pub async fn clear_deck_cache(broker: &dyn EventBroker, cache: &ActionCache) -> Result<()> {
    cache.clean(CACHE_PATTERN_DECKS);
    broker.broadcast(CACHE_CLEAN_DECKS, Value::Null).await
}
