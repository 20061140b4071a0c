//! The annotation model collaborator and an in-memory implementation

use super::{Annotation, AnnotationId, AnnotationModelEvent, ListenerId, Position};
use crate::error::RulerError;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Callback receiving model change events.
///
/// Listeners may be invoked on any thread.
pub type ModelListener = Box<dyn Fn(&AnnotationModelEvent) + Send + Sync>;

/// Snapshot iterator over annotations
pub type AnnotationIter = std::vec::IntoIter<Arc<Annotation>>;

/// Source of annotations and their positions.
pub trait AnnotationModel: Send + Sync {
    /// All live annotations, in insertion order
    fn annotation_iter(&self) -> AnnotationIter;

    /// Annotations whose positions relate to the region `offset..offset + length`.
    ///
    /// - `can_start_before && can_end_after`: the position overlaps the region
    /// - `can_start_before` only: the position's last offset lies inside the region
    /// - `can_end_after` only: the position's first offset lies inside the region
    /// - neither: the position lies entirely inside the region
    fn annotations_in_range(
        &self,
        offset: usize,
        length: usize,
        can_start_before: bool,
        can_end_after: bool,
    ) -> AnnotationIter {
        let region = Position::new(offset, length);
        self.annotation_iter()
            .filter(|annotation| {
                self.position(annotation.id()).is_some_and(|p| {
                    within_region(&region, &p, can_start_before, can_end_after)
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Current position of an annotation, re-fetched on every call
    fn position(&self, id: AnnotationId) -> Option<Position>;

    fn document_length(&self) -> usize;

    /// Register a change listener. Duplicate ids are rejected.
    fn add_listener(&self, id: ListenerId, listener: ModelListener) -> Result<(), RulerError>;

    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Changes on every delivered model change
    fn modification_stamp(&self) -> u64;
}

fn within_region(
    region: &Position,
    position: &Position,
    can_start_before: bool,
    can_end_after: bool,
) -> bool {
    let start = position.offset;
    let last = position.end() - usize::from(position.length > 0);
    let region_includes = |offset: usize| {
        region.includes(offset) || (region.is_empty() && offset == region.offset)
    };
    match (can_start_before, can_end_after) {
        (true, true) => position.overlaps(region.offset, region.end()),
        (true, false) => region_includes(last),
        (false, true) => region_includes(start),
        (false, false) => region_includes(start) && region_includes(last),
    }
}

#[derive(Debug)]
struct Entry {
    annotation: Arc<Annotation>,
    position: Position,
}

#[derive(Default)]
struct ModelState {
    /// Keyed by id; ids are handed out in increasing order so this is also
    /// insertion order for annotations created through `next_id`
    entries: BTreeMap<AnnotationId, Entry>,
    document_length: usize,
    pending: AnnotationModelEvent,
    next_id: u64,
}

/// Thread-safe in-memory annotation model.
///
/// Mutations accumulate into a pending event which is delivered to all
/// listeners by [`SimpleAnnotationModel::fire_model_changed`]. The public
/// mutators fire immediately unless they run inside [`SimpleAnnotationModel::batch`].
pub struct SimpleAnnotationModel {
    state: RwLock<ModelState>,
    listeners: Mutex<Vec<(ListenerId, Arc<dyn Fn(&AnnotationModelEvent) + Send + Sync>)>>,
    stamp: std::sync::atomic::AtomicU64,
    batch_depth: std::sync::atomic::AtomicUsize,
}

impl SimpleAnnotationModel {
    pub fn new(document_length: usize) -> Self {
        Self {
            state: RwLock::new(ModelState {
                document_length,
                ..ModelState::default()
            }),
            listeners: Mutex::new(Vec::new()),
            stamp: std::sync::atomic::AtomicU64::new(0),
            batch_depth: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ModelState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ModelState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(
        &self,
    ) -> MutexGuard<'_, Vec<(ListenerId, Arc<dyn Fn(&AnnotationModelEvent) + Send + Sync>)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a fresh annotation identity
    pub fn next_id(&self) -> AnnotationId {
        let mut state = self.write();
        state.next_id += 1;
        AnnotationId(state.next_id)
    }

    /// Convenience: create an annotation of `kind` with a fresh id and add it
    pub fn annotate(
        &self,
        kind: &str,
        position: Position,
    ) -> Result<Arc<Annotation>, RulerError> {
        let annotation = Arc::new(Annotation::new(self.next_id(), kind));
        self.add_annotation(Arc::clone(&annotation), position)?;
        Ok(annotation)
    }

    /// Add an annotation at `position`.
    pub fn add_annotation(
        &self,
        annotation: Arc<Annotation>,
        position: Position,
    ) -> Result<(), RulerError> {
        {
            let mut state = self.write();
            Self::insert(&mut state, annotation, position)?;
        }
        self.fire_unless_batching();
        Ok(())
    }

    fn insert(
        state: &mut ModelState,
        annotation: Arc<Annotation>,
        position: Position,
    ) -> Result<(), RulerError> {
        let id = annotation.id();
        if state.entries.contains_key(&id) {
            return Err(RulerError::DuplicateAnnotation(id));
        }
        if position.end() > state.document_length {
            return Err(RulerError::bad_location(
                position.offset,
                position.length,
                state.document_length,
            ));
        }
        state.next_id = state.next_id.max(id.0);
        state.pending.annotation_added(Arc::clone(&annotation));
        state.entries.insert(
            id,
            Entry {
                annotation,
                position,
            },
        );
        Ok(())
    }

    /// Remove an annotation. Unknown ids are ignored.
    pub fn remove_annotation(&self, id: AnnotationId) {
        {
            let mut state = self.write();
            Self::remove(&mut state, id);
        }
        self.fire_unless_batching();
    }

    fn remove(state: &mut ModelState, id: AnnotationId) {
        if let Some(entry) = state.entries.remove(&id) {
            entry.annotation.mark_deleted();
            state
                .pending
                .annotation_removed(entry.annotation, Some(entry.position));
        }
    }

    pub fn remove_all_annotations(&self) {
        {
            let mut state = self.write();
            let ids: Vec<AnnotationId> = state.entries.keys().copied().collect();
            for id in ids {
                Self::remove(&mut state, id);
            }
        }
        self.fire_unless_batching();
    }

    /// Remove `to_remove`, add `to_add`, and deliver a single event.
    ///
    /// On error nothing after the failing addition is applied; the removals
    /// and earlier additions stay and are still reported.
    pub fn replace_annotations(
        &self,
        to_remove: &[AnnotationId],
        to_add: Vec<(Arc<Annotation>, Position)>,
    ) -> Result<(), RulerError> {
        let result = {
            let mut state = self.write();
            for id in to_remove {
                Self::remove(&mut state, *id);
            }
            to_add
                .into_iter()
                .try_for_each(|(annotation, position)| {
                    Self::insert(&mut state, annotation, position)
                })
        };
        self.fire_unless_batching();
        result
    }

    /// Move an annotation. `None` removes it; an unknown annotation is added.
    pub fn modify_annotation_position(
        &self,
        annotation: &Arc<Annotation>,
        position: Option<Position>,
    ) -> Result<(), RulerError> {
        let Some(position) = position else {
            self.remove_annotation(annotation.id());
            return Ok(());
        };

        let result = {
            let mut guard = self.write();
            let state = &mut *guard;
            let document_length = state.document_length;
            match state.entries.get_mut(&annotation.id()) {
                Some(entry) => {
                    if position.end() > document_length {
                        Err(RulerError::bad_location(
                            position.offset,
                            position.length,
                            document_length,
                        ))
                    } else {
                        entry.position.offset = position.offset;
                        entry.position.length = position.length;
                        let changed = Arc::clone(&entry.annotation);
                        state.pending.annotation_changed(changed);
                        Ok(())
                    }
                }
                None => Self::insert(state, Arc::clone(annotation), position),
            }
        };
        self.fire_unless_batching();
        result
    }

    /// Report an annotation as changed (e.g. its text) without moving it
    pub fn modify_annotation(&self, id: AnnotationId) {
        {
            let mut guard = self.write();
            let state = &mut *guard;
            if let Some(entry) = state.entries.get(&id) {
                let changed = Arc::clone(&entry.annotation);
                state.pending.annotation_changed(changed);
            }
        }
        self.fire_unless_batching();
    }

    /// Apply a document edit: update every position in place, then remove
    /// the annotations whose text disappeared.
    pub fn apply_edit(
        &self,
        offset: usize,
        deleted_len: usize,
        inserted_len: usize,
    ) -> Result<(), RulerError> {
        {
            let mut state = self.write();
            if offset + deleted_len > state.document_length {
                return Err(RulerError::bad_location(
                    offset,
                    deleted_len,
                    state.document_length,
                ));
            }
            state.document_length = state.document_length - deleted_len + inserted_len;
            for entry in state.entries.values_mut() {
                entry.position.apply_edit(offset, deleted_len, inserted_len);
            }
            Self::cleanup(&mut state);
        }
        self.fire_unless_batching();
        Ok(())
    }

    /// Replace the whole document. Positions that no longer fit are deleted
    /// and listeners get a world-change event.
    pub fn set_document_length(&self, document_length: usize) {
        {
            let mut state = self.write();
            state.document_length = document_length;
            for entry in state.entries.values_mut() {
                if entry.position.end() > document_length {
                    entry.position.deleted = true;
                }
            }
            Self::cleanup(&mut state);
            state.pending = AnnotationModelEvent::world_change();
        }
        self.fire_unless_batching();
    }

    /// Remove all annotations whose positions have been deleted
    fn cleanup(state: &mut ModelState) {
        let deleted: Vec<AnnotationId> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.position.deleted)
            .map(|(id, _)| *id)
            .collect();
        for id in deleted {
            Self::remove(state, id);
        }
    }

    /// Run `f` and deliver everything it changed as one event
    pub fn batch<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        use std::sync::atomic::Ordering;
        self.batch_depth.fetch_add(1, Ordering::AcqRel);
        let result = f(self);
        if self.batch_depth.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.fire_model_changed();
        }
        result
    }

    fn fire_unless_batching(&self) {
        if self.batch_depth.load(std::sync::atomic::Ordering::Acquire) == 0 {
            self.fire_model_changed();
        }
    }

    /// Seal the pending event and deliver it to every listener.
    ///
    /// Empty events are dropped. Listeners run without any model lock held,
    /// so they may call back into the model.
    pub fn fire_model_changed(&self) {
        let event = {
            let mut state = self.write();
            std::mem::take(&mut state.pending)
        };
        if event.is_empty() {
            return;
        }
        self.stamp
            .fetch_add(1, std::sync::atomic::Ordering::AcqRel);

        let listeners: Vec<_> = self
            .listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        tracing::trace!(
            added = event.added.len(),
            removed = event.removed.len(),
            changed = event.changed.len(),
            world_change = event.world_change,
            listeners = listeners.len(),
            "annotation model changed"
        );
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }
}

impl AnnotationModel for SimpleAnnotationModel {
    fn annotation_iter(&self) -> AnnotationIter {
        self.read()
            .entries
            .values()
            .filter(|entry| !entry.position.deleted && !entry.annotation.is_deleted())
            .map(|entry| Arc::clone(&entry.annotation))
            .collect::<Vec<_>>()
            .into_iter()
    }

    fn position(&self, id: AnnotationId) -> Option<Position> {
        self.read().entries.get(&id).map(|entry| entry.position)
    }

    fn document_length(&self) -> usize {
        self.read().document_length
    }

    /// Registers the listener and immediately delivers a world-change event
    /// to it, so it can build its initial state.
    fn add_listener(&self, id: ListenerId, listener: ModelListener) -> Result<(), RulerError> {
        let listener: Arc<dyn Fn(&AnnotationModelEvent) + Send + Sync> = Arc::from(listener);
        {
            let mut listeners = self.listeners();
            if listeners.iter().any(|(existing, _)| *existing == id) {
                return Err(RulerError::DuplicateListener(id));
            }
            listeners.push((id, Arc::clone(&listener)));
        }
        listener(&AnnotationModelEvent::world_change());
        Ok(())
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn modification_stamp(&self) -> u64 {
        self.stamp.load(std::sync::atomic::Ordering::Acquire)
    }
}
