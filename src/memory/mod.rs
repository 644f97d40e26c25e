//! InMemoryConnection - in-process search backend for testing and development.
//!
//! Mimics a search engine's near-real-time behaviour: writes land in the
//! primary store and become visible to searches, counts and delete-by-query
//! only once the collection is refreshed.

mod matcher;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{json, Value};

use crate::condition::NativeQuery;
use crate::connection::{BackendError, Command, Connection, WriteOptions};
use crate::document::{Document, DocumentId, Fields};
use crate::query::SearchRequest;

/// Documents of one collection, ordered by id. Document types are not
/// stored: every type in a collection shares one id space, as with `_doc`.
type Collection = BTreeMap<String, Fields>;

#[derive(Default)]
struct State {
    primary: HashMap<String, Collection>,
    searchable: HashMap<String, Collection>,
    pending_failure: Option<BackendError>,
    calls: usize,
    searches: Vec<SearchRequest>,
    last_write_options: Option<WriteOptions>,
}

impl State {
    /// Count the round trip and surface an injected failure, if any.
    fn begin(&mut self) -> Result<(), BackendError> {
        self.calls += 1;
        match self.pending_failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn refresh_all(&mut self) {
        self.searchable = self.primary.clone();
    }

    fn refresh(&mut self, collection: &str) {
        match self.primary.get(collection) {
            Some(docs) => {
                self.searchable.insert(collection.to_string(), docs.clone());
            }
            None => {
                self.searchable.remove(collection);
            }
        }
    }

    /// Copy single documents from the primary store into the searchable one.
    fn sync(&mut self, collection: &str, ids: &[String]) {
        let primary = self.primary.get(collection);
        let searchable = self.searchable.entry(collection.to_string()).or_default();
        for id in ids {
            match primary.and_then(|docs| docs.get(id)) {
                Some(fields) => {
                    searchable.insert(id.clone(), fields.clone());
                }
                None => {
                    searchable.remove(id);
                }
            }
        }
    }

    fn searchable(&self, collection: &str) -> impl Iterator<Item = (&String, &Fields)> {
        self.searchable.get(collection).into_iter().flatten()
    }
}

/// In-memory search backend.
///
/// Clone-friendly via Arc: clones share the same documents.
#[derive(Clone)]
pub struct InMemoryConnection {
    state: Arc<RwLock<State>>,
    auto_refresh: bool,
}

impl Default for InMemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConnection {
    /// Backend that refreshes after every write, so reads see writes immediately.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            auto_refresh: true,
        }
    }

    /// Backend where writes stay invisible to reads until [`refresh`](Self::refresh)
    /// or a write requesting `refresh`.
    pub fn with_manual_refresh() -> Self {
        Self {
            auto_refresh: false,
            ..Self::new()
        }
    }

    /// Make every write so far visible to reads.
    pub fn refresh(&self) -> Result<(), BackendError> {
        self.write()?.refresh_all();
        Ok(())
    }

    /// Fail the next backend call with `err`.
    pub fn fail_next(&self, err: BackendError) -> Result<(), BackendError> {
        self.write()?.pending_failure = Some(err);
        Ok(())
    }

    /// Number of backend round trips served so far.
    pub fn calls(&self) -> usize {
        self.read().map(|s| s.calls).unwrap_or(0)
    }

    /// Every search request received, oldest first.
    pub fn searches(&self) -> Vec<SearchRequest> {
        self.read().map(|s| s.searches.clone()).unwrap_or_default()
    }

    pub fn last_write_options(&self) -> Option<WriteOptions> {
        self.read().ok().and_then(|s| s.last_write_options.clone())
    }

    /// Documents stored in `collection`, refreshed or not.
    pub fn stored_count(&self, collection: &str) -> usize {
        self.read()
            .map(|s| s.primary.get(collection).map(BTreeMap::len).unwrap_or(0))
            .unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, BackendError> {
        self.state
            .read()
            .map_err(|_| BackendError::Other("lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, BackendError> {
        self.state
            .write()
            .map_err(|_| BackendError::Other("lock poisoned".into()))
    }

    /// `written` lists the ids touched by the write. With auto refresh the
    /// searchable store already mirrors everything else, so only those move.
    fn after_write(
        &self,
        state: &mut State,
        collection: &str,
        written: &[String],
        options: Option<&WriteOptions>,
    ) {
        if let Some(options) = options {
            state.last_write_options = Some(options.clone());
        }
        if self.auto_refresh {
            state.sync(collection, written);
        } else if options.map(refresh_requested).unwrap_or(false) {
            state.refresh(collection);
        }
    }
}

fn refresh_requested(options: &WriteOptions) -> bool {
    match options.get("refresh") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(policy)) => policy == "true" || policy == "wait_for",
        _ => false,
    }
}

impl Connection for InMemoryConnection {
    fn create_command(&self) -> Box<dyn Command + '_> {
        Box::new(InMemoryCommand { connection: self })
    }

    fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, BackendError> {
        let mut state = self.write()?;
        state.begin()?;
        state.searches.push(request.clone());

        let mut hits = Vec::new();
        for (id, fields) in state.searchable(&request.collection) {
            if matcher::matches(request.query.as_value(), id, fields)? {
                hits.push((id, fields));
            }
        }
        if !request.sort.is_empty() {
            hits.sort_by(|(_, a), (_, b)| matcher::compare_by(&request.sort, a, b));
        }

        let offset = request.offset.unwrap_or(0);
        let limit = request.limit.unwrap_or(usize::MAX);
        let documents = hits
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(id, fields)| {
                let fields = match &request.source {
                    Some(selected) => fields
                        .iter()
                        .filter(|(k, _)| selected.iter().any(|s| s == *k))
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                    None => fields.clone(),
                };
                Document::from_parts(Some(DocumentId::from(id.as_str())), fields)
            })
            .collect();
        Ok(documents)
    }

    fn count(&self, collection: &str, query: &NativeQuery) -> Result<u64, BackendError> {
        let mut state = self.write()?;
        state.begin()?;
        let mut total = 0;
        for (id, fields) in state.searchable(collection) {
            if matcher::matches(query.as_value(), id, fields)? {
                total += 1;
            }
        }
        Ok(total)
    }
}

struct InMemoryCommand<'a> {
    connection: &'a InMemoryConnection,
}

impl Command for InMemoryCommand<'_> {
    fn insert(
        &self,
        collection: &str,
        _document_type: &str,
        fields: &Fields,
        id: Option<&DocumentId>,
        options: &WriteOptions,
    ) -> Result<DocumentId, BackendError> {
        let mut state = self.connection.write()?;
        state.begin()?;
        let id = id
            .cloned()
            .unwrap_or_else(|| DocumentId::new(uuid::Uuid::new_v4().simple().to_string()));
        state
            .primary
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields.clone());
        self.connection.after_write(&mut state, collection, &[id.to_string()], Some(options));
        Ok(id)
    }

    fn update(
        &self,
        collection: &str,
        _document_type: &str,
        id: &DocumentId,
        fields: &Fields,
        options: &WriteOptions,
    ) -> Result<(), BackendError> {
        let mut state = self.connection.write()?;
        state.begin()?;
        let stored = state
            .primary
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id.as_str()))
            .ok_or_else(|| not_found(collection, id))?;
        for (field, value) in fields {
            stored.insert(field.clone(), value.clone());
        }
        self.connection.after_write(&mut state, collection, &[id.to_string()], Some(options));
        Ok(())
    }

    fn delete(
        &self,
        collection: &str,
        _document_type: &str,
        id: &DocumentId,
        options: &WriteOptions,
    ) -> Result<(), BackendError> {
        let mut state = self.connection.write()?;
        state.begin()?;
        state
            .primary
            .get_mut(collection)
            .and_then(|docs| docs.remove(id.as_str()))
            .ok_or_else(|| not_found(collection, id))?;
        self.connection.after_write(&mut state, collection, &[id.to_string()], Some(options));
        Ok(())
    }

    fn delete_by_query(
        &self,
        collection: &str,
        _document_type: &str,
        body: &Value,
    ) -> Result<Value, BackendError> {
        let mut state = self.connection.write()?;
        state.begin()?;
        let query = body.get("query").ok_or_else(|| {
            BackendError::MalformedQuery("delete_by_query requires a query".into())
        })?;

        // matches come from the searchable snapshot, not the primary store
        let mut doomed = Vec::new();
        for (id, fields) in state.searchable(collection) {
            if matcher::matches(query, id, fields)? {
                doomed.push(id.clone());
            }
        }

        // snapshot hits already gone from the primary store are not counted
        let mut deleted = Vec::with_capacity(doomed.len());
        if let Some(docs) = state.primary.get_mut(collection) {
            for id in doomed {
                if docs.remove(&id).is_some() {
                    deleted.push(id);
                }
            }
        }
        self.connection.after_write(&mut state, collection, &deleted, None);
        let total = deleted.len();
        Ok(json!({ "total": total, "deleted": total, "failures": [] }))
    }
}

fn not_found(collection: &str, id: &DocumentId) -> BackendError {
    BackendError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}
