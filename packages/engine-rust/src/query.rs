//! Enumeration over a model's collection list.
//!
//! A [`QueryHandle`] freezes the list length when it is created; every read
//! it issues afterwards is a bounded range over the live list, computed from
//! that frozen count. Page ranges are inclusive on both ends, so a page of
//! `limit` holds up to `limit + 1` identifiers and consecutive pages share
//! their boundary identifier.

use std::collections::{HashSet, VecDeque};
use std::marker::PhantomData;

use futures_util::stream::Stream;
use hashmodel_core::{Model, RecordId};

use crate::engine::Engine;
use crate::error::EngineError;

/// Inclusive list range `(start, stop)` of 1-indexed `page`.
fn page_bounds(page: u64, limit: u64) -> Result<(i64, i64), EngineError> {
    if page == 0 || limit == 0 {
        return Err(EngineError::InvalidPage { page, limit });
    }
    let start = (page - 1).saturating_mul(limit);
    let stop = start.saturating_add(limit);
    Ok((
        i64::try_from(start).unwrap_or(i64::MAX),
        i64::try_from(stop).unwrap_or(i64::MAX),
    ))
}

/// View over every record of model `M`, as of the moment it was opened.
pub struct QueryHandle<M> {
    engine: Engine,
    model: String,
    key: String,
    count: u64,
    _marker: PhantomData<fn() -> M>,
}

impl<M> Clone for QueryHandle<M> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            model: self.model.clone(),
            key: self.key.clone(),
            count: self.count,
            _marker: PhantomData,
        }
    }
}

impl<M: Model> QueryHandle<M> {
    pub(crate) fn new(engine: Engine, model: String, key: String, count: u64) -> Self {
        Self {
            engine,
            model,
            key,
            count,
            _marker: PhantomData,
        }
    }

    /// Collection size when the handle was opened. Not refreshed.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Model name this query covers.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Every record, in list order.
    ///
    /// Reads the range `0..=count`. Identifiers whose hash no longer exists
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first store or mapping error; records are fetched
    /// sequentially.
    pub async fn get_all(&self) -> Result<Vec<M>, EngineError> {
        let stop = i64::try_from(self.count).unwrap_or(i64::MAX);
        let ids = self.range_ids(0, stop).await?;
        self.resolve(ids).await
    }

    /// Records of 1-indexed `page`, `limit` per page plus the shared boundary.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidPage`] if `page` or `limit` is 0
    /// - the first store or mapping error
    pub async fn get_page(&self, page: u64, limit: u64) -> Result<Vec<M>, EngineError> {
        let ids = self.page_ids(page, limit).await?;
        self.resolve(ids).await
    }

    /// Number of pages of `limit` covering the frozen count.
    #[must_use]
    pub fn page_count(&self, limit: u64) -> u64 {
        if limit == 0 {
            return 0;
        }
        self.count.div_ceil(limit)
    }

    /// Lazily streams every record, one [`get_page`](Self::get_page) at a time.
    ///
    /// Yields exactly what consecutive pages hold, so a record on the boundary
    /// of two pages is yielded twice. Calling `each` again starts a new pass
    /// from the first page.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPage`] if `limit` is 0.
    pub fn each(&self, limit: u64) -> Result<RecordStream<M>, EngineError> {
        page_bounds(1, limit)?;
        Ok(RecordStream::new(self.clone(), limit, false))
    }

    /// Like [`each`](Self::each), but a page starting with the identifier
    /// that ended the previous page skips it, so boundary records are
    /// yielded once.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPage`] if `limit` is 0.
    pub fn each_distinct(&self, limit: u64) -> Result<RecordStream<M>, EngineError> {
        page_bounds(1, limit)?;
        Ok(RecordStream::new(self.clone(), limit, true))
    }

    /// Identifiers of every page, boundary duplicates removed, in list order.
    pub(crate) async fn snapshot_ids(&self, limit: u64) -> Result<Vec<RecordId>, EngineError> {
        page_bounds(1, limit)?;
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for page in 1..=self.page_count(limit) {
            for id in self.page_ids(page, limit).await? {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    async fn page_ids(&self, page: u64, limit: u64) -> Result<Vec<RecordId>, EngineError> {
        let (start, stop) = page_bounds(page, limit)?;
        self.range_ids(start, stop).await
    }

    async fn range_ids(&self, start: i64, stop: i64) -> Result<Vec<RecordId>, EngineError> {
        let raw = self.engine.store().list_range(&self.key, start, stop).await?;
        Ok(raw
            .into_iter()
            .filter_map(|entry| match RecordId::parse(entry) {
                Ok(id) => Some(id),
                Err(_) => {
                    tracing::warn!(model = %self.model, "skipping empty identifier in collection list");
                    None
                }
            })
            .collect())
    }

    async fn resolve(&self, ids: Vec<RecordId>) -> Result<Vec<M>, EngineError> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.engine.get_as::<M>(&self.model, &id).await? {
                Some(record) => records.push(record),
                None => {
                    tracing::warn!(
                        model = %self.model,
                        id = %id,
                        "collection list references a missing record"
                    );
                }
            }
        }
        Ok(records)
    }
}

/// Lazy, finite pass over a [`QueryHandle`], one page read at a time.
///
/// Pages are those of [`QueryHandle::get_page`]. Only a stream opened with
/// [`QueryHandle::each_distinct`] drops the boundary record a page shares
/// with the previous one. After an error the pass ends.
/// [`restart`](Self::restart) rewinds to the first page.
pub struct RecordStream<M> {
    query: QueryHandle<M>,
    limit: u64,
    distinct: bool,
    pages: u64,
    next_page: u64,
    boundary: Option<RecordId>,
    buffer: VecDeque<M>,
}

impl<M: Model> RecordStream<M> {
    fn new(query: QueryHandle<M>, limit: u64, distinct: bool) -> Self {
        let pages = query.page_count(limit);
        Self {
            query,
            limit,
            distinct,
            pages,
            next_page: 1,
            boundary: None,
            buffer: VecDeque::new(),
        }
    }

    /// Next record, or `None` once every page has been read.
    pub async fn next(&mut self) -> Option<Result<M, EngineError>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }
            if self.next_page > self.pages {
                return None;
            }
            let page = self.next_page;
            self.next_page += 1;
            if let Err(err) = self.load(page).await {
                self.next_page = self.pages + 1;
                return Some(Err(err));
            }
        }
    }

    /// Rewinds to the first page, dropping anything buffered.
    pub fn restart(&mut self) {
        self.next_page = 1;
        self.boundary = None;
        self.buffer.clear();
    }

    /// Adapts the pass into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<M, EngineError>> {
        futures_util::stream::unfold(self, |mut stream| async move {
            let item = stream.next().await?;
            Some((item, stream))
        })
    }

    async fn load(&mut self, page: u64) -> Result<(), EngineError> {
        let mut ids = self.query.page_ids(page, self.limit).await?;
        if self.distinct {
            if ids.first().is_some() && ids.first() == self.boundary.as_ref() {
                ids.remove(0);
            }
            if let Some(last) = ids.last() {
                self.boundary = Some(last.clone());
            }
        }
        self.buffer.extend(self.query.resolve(ids).await?);
        Ok(())
    }
}
