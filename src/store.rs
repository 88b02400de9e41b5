//! Single-flight cache of parsed locale data
//!
//! The map mutex only guards slot creation. Parsing runs inside the slot's
//! `OnceCell`, so concurrent requests for one id wait for a single parse
//! while requests for other ids proceed in parallel. A failed fetch or parse
//! drops the empty slot, so misses leave nothing behind and the next
//! request retries.

use crate::error::{LocaleError, LocaleResult};
use crate::loader::LocaleLoader;
use crate::locale::LocaleData;
use crate::locale_id::LocaleId;
use log::debug;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

type Slot = Arc<OnceCell<Arc<LocaleData>>>;

/// Loads each locale at most once and shares the result
pub struct LocaleDataStore {
    loader: Arc<dyn LocaleLoader>,
    slots: Mutex<HashMap<LocaleId, Slot>>,
    root: Arc<LocaleData>,
}

impl LocaleDataStore {
    pub fn new(loader: Arc<dyn LocaleLoader>) -> Self {
        Self {
            loader,
            slots: Mutex::new(HashMap::new()),
            root: Arc::new(LocaleData::root()),
        }
    }

    pub fn loader(&self) -> &Arc<dyn LocaleLoader> {
        &self.loader
    }

    /// The embedded root locale data
    pub fn root(&self) -> Arc<LocaleData> {
        Arc::clone(&self.root)
    }

    /// Parsed data for exactly `id`, fetching and validating it on first use
    pub fn get(&self, id: &LocaleId) -> LocaleResult<Arc<LocaleData>> {
        if id.is_root() {
            return Ok(self.root());
        }

        let slot = self.slot(id);
        if let Some(data) = slot.get() {
            debug!("Locale cache hit: {}", id);
            return Ok(Arc::clone(data));
        }

        let result = slot.get_or_try_init(|| {
            debug!("Locale cache miss, parsing: {}", id);
            let raw = self.loader.fetch(id)?;
            let data = LocaleData::from_raw(id.clone(), raw)
                .map_err(|e| LocaleError::load(id.as_str(), e))?;
            Ok::<_, LocaleError>(Arc::new(data))
        });

        match result {
            Ok(data) => Ok(Arc::clone(data)),
            Err(e) => {
                self.discard_empty(id, &slot);
                Err(e)
            }
        }
    }

    fn slot(&self, id: &LocaleId) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(id.clone()).or_default())
    }

    /// Remove `slot` if it is still `id`'s entry, still empty, and no other
    /// caller holds it. A caller still waiting on it removes it on failure.
    fn discard_empty(&self, id: &LocaleId, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let removable = slots.get(id).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && current.get().is_none() && Arc::strong_count(slot) <= 2
        });
        if removable {
            slots.remove(id);
        }
    }

    /// Ids with parsed data in the cache, sorted
    pub fn cached(&self) -> Vec<LocaleId> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<LocaleId> = slots
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Drop every cached entry; issued handles keep their data
    pub fn clear(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("Clearing {} cached locale slot(s)", slots.len());
        slots.clear();
    }
}

impl std::fmt::Debug for LocaleDataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleDataStore")
            .field("cached", &self.cached())
            .finish_non_exhaustive()
    }
}
