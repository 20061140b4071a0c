//! Incrementally synchronized decorations
//!
//! # Design
//! - **Two pools**: decorations drawn with a draw call ("plain") and
//!   decorations merged into the text style ("styled") live in separate maps,
//!   keyed by annotation id, so at most one entry exists per annotation.
//! - **Copy, then swap**: a sync clones the current pools, applies the model
//!   event to the copy, and publishes it with a single atomic store. Readers
//!   holding a snapshot never see a half-applied event.
//! - **Dirty tracking**: every sync reports the document range whose
//!   appearance changed, and folds it into a cumulative range that survives
//!   until the host reports a full redraw.
//!
//! Positions are owned by the model and move as the document is edited, so
//! queries re-fetch each position instead of trusting the snapshot taken at
//! sync time.

use super::decoration::{Decoration, DirtyRange, PaintStrategy, Rgb, StrategyKind, DEFAULT_LAYER};
use super::decoration_registry::DecorationRegistry;
use crate::config::{AnnotationTypeConfig, RulerConfig};
use crate::error::RulerError;
use crate::model::{Annotation, AnnotationId, AnnotationModel, AnnotationModelEvent, Position};
use arc_swap::ArcSwap;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

/// The two decoration pools, published together
#[derive(Debug, Clone, Default)]
pub struct DecorationPools {
    /// Drawn with a draw call over the text
    pub plain: BTreeMap<AnnotationId, Decoration>,
    /// Merged into the text presentation
    pub styled: BTreeMap<AnnotationId, Decoration>,
}

impl DecorationPools {
    pub fn get(&self, id: AnnotationId) -> Option<&Decoration> {
        self.plain.get(&id).or_else(|| self.styled.get(&id))
    }

    pub fn len(&self) -> usize {
        self.plain.len() + self.styled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plain.is_empty() && self.styled.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decoration> {
        self.plain.values().chain(self.styled.values())
    }

    fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Decoration> {
        match self.plain.get_mut(&id) {
            Some(decoration) => Some(decoration),
            None => self.styled.get_mut(&id),
        }
    }

    fn insert(&mut self, decoration: Decoration) {
        match decoration.kind() {
            StrategyKind::Draw => self.plain.insert(decoration.id(), decoration),
            StrategyKind::Style => self.styled.insert(decoration.id(), decoration),
        };
    }
}

/// Decorations derived from an annotation model.
///
/// Owned by the render thread; see `services::model_events` for getting model
/// notifications there.
pub struct DecorationCache {
    model: Option<Arc<dyn AnnotationModel>>,
    registry: DecorationRegistry,
    pools: ArcSwap<DecorationPools>,
    /// Plain decorations dropped since the last paint; the painter erases them
    pending_erasures: Vec<Decoration>,
    last_dirty: DirtyRange,
    cumulative_dirty: DirtyRange,
}

impl DecorationCache {
    pub fn new(registry: DecorationRegistry) -> Self {
        Self {
            model: None,
            registry,
            pools: ArcSwap::from_pointee(DecorationPools::default()),
            pending_erasures: Vec::new(),
            last_dirty: DirtyRange::empty(),
            cumulative_dirty: DirtyRange::empty(),
        }
    }

    pub fn from_config(config: &RulerConfig) -> Self {
        Self::new(DecorationRegistry::from_config(config))
    }

    pub fn model(&self) -> Option<&Arc<dyn AnnotationModel>> {
        self.model.as_ref()
    }

    /// Attach a different model (or none) and rebuild from scratch
    pub fn set_model(&mut self, model: Option<Arc<dyn AnnotationModel>>) -> DirtyRange {
        self.model = model;
        if self.model.is_some() {
            self.sync(Some(&AnnotationModelEvent::world_change()))
        } else {
            self.sync(None)
        }
    }

    pub fn registry(&self) -> &DecorationRegistry {
        &self.registry
    }

    /// Change the type tables, then resynchronize against them
    pub fn configure(&mut self, f: impl FnOnce(&mut DecorationRegistry)) -> DirtyRange {
        f(&mut self.registry);
        self.sync(None)
    }

    pub fn register_type(
        &mut self,
        kind: &str,
        config: &AnnotationTypeConfig,
    ) -> Result<DirtyRange, RulerError> {
        self.registry.register_type(kind, config)?;
        Ok(self.sync(None))
    }

    pub fn set_strategy(&mut self, kind: &str, strategy: Option<PaintStrategy>) -> DirtyRange {
        self.configure(|registry| registry.set_strategy(kind, strategy))
    }

    pub fn set_color(&mut self, kind: &str, color: Option<Rgb>) -> DirtyRange {
        self.configure(|registry| registry.set_color(kind, color))
    }

    pub fn set_layer(&mut self, kind: &str, layer: Option<i32>) -> DirtyRange {
        self.configure(|registry| registry.set_layer(kind, layer))
    }

    pub fn set_supertype(&mut self, kind: &str, supertype: Option<&str>) -> DirtyRange {
        self.configure(|registry| registry.set_supertype(kind, supertype))
    }

    /// Bring the pools up to date with the model.
    ///
    /// `None` resynchronizes against the current model state without an
    /// explicit event; it only reports what actually changed, so a second
    /// call with nothing in between returns an empty range. A world-change
    /// event discards everything and dirties the whole document.
    pub fn sync(&mut self, event: Option<&AnnotationModelEvent>) -> DirtyRange {
        let _span = tracing::trace_span!("decoration_sync").entered();

        let Some(model) = self.model.clone() else {
            return self.clear_without_model();
        };

        let previous = self.pools.load_full();
        let mut dirty = DirtyRange::empty();
        let next = match event {
            Some(event) if !event.world_change => {
                let mut next = (*previous).clone();
                self.apply_event(model.as_ref(), event, &mut next, &mut dirty);
                next
            }
            Some(_) => self.rebuild_after_world_change(model.as_ref(), &previous, &mut dirty),
            None => self.resync(model.as_ref(), &previous, &mut dirty),
        };

        tracing::trace!(
            plain = next.plain.len(),
            styled = next.styled.len(),
            erasures = self.pending_erasures.len(),
            "decoration pools updated"
        );
        self.pools.store(Arc::new(next));

        let document_length = model.document_length();
        let dirty = dirty.clamp(document_length);
        let world_change = event.is_some_and(|e| e.world_change);
        self.cumulative_dirty = if world_change {
            dirty
        } else {
            self.cumulative_dirty.union(dirty).clamp(document_length)
        };
        self.last_dirty = dirty;
        dirty
    }

    fn clear_without_model(&mut self) -> DirtyRange {
        let previous = self.pools.swap(Arc::new(DecorationPools::default()));
        let mut dirty = DirtyRange::empty();
        for decoration in previous.iter() {
            dirty.include(&decoration.position);
        }
        self.pending_erasures.extend(previous.plain.values().cloned());
        if !previous.is_empty() {
            tracing::debug!(dropped = previous.len(), "no annotation model, decorations cleared");
        }
        self.cumulative_dirty = self.cumulative_dirty.union(dirty);
        self.last_dirty = dirty;
        dirty
    }

    fn apply_event(
        &mut self,
        model: &dyn AnnotationModel,
        event: &AnnotationModelEvent,
        next: &mut DecorationPools,
        dirty: &mut DirtyRange,
    ) {
        for (annotation, position) in &event.removed {
            if let Some(position) = position.filter(|p| !p.deleted) {
                dirty.include(&position);
            }
            self.drop_decoration(model, annotation.id(), next, dirty);
        }
        for annotation in &event.changed {
            // The strategy may have flipped between plain and styled, so the
            // old entry always goes and the new one lands in whichever pool
            // its strategy selects.
            self.drop_decoration(model, annotation.id(), next, dirty);
            self.add_decoration(model, annotation, next, dirty);
        }
        for annotation in &event.added {
            self.drop_decoration(model, annotation.id(), next, dirty);
            self.add_decoration(model, annotation, next, dirty);
        }
    }

    /// Drop the decoration for `id`, dirtying both where it was last painted
    /// and where the model puts it now. Plain decorations are erased at the
    /// place they were last painted.
    fn drop_decoration(
        &mut self,
        model: &dyn AnnotationModel,
        id: AnnotationId,
        next: &mut DecorationPools,
        dirty: &mut DirtyRange,
    ) {
        let dropped = match next.plain.remove(&id) {
            Some(old) => {
                self.pending_erasures.push(old.clone());
                old
            }
            None => match next.styled.remove(&id) {
                Some(old) => old,
                None => return,
            },
        };
        dirty.include(&dropped.position);
        if let Some(current) = model.position(id).filter(|p| !p.deleted) {
            dirty.include(&current);
        }
    }

    fn add_decoration(
        &mut self,
        model: &dyn AnnotationModel,
        annotation: &Arc<Annotation>,
        next: &mut DecorationPools,
        dirty: &mut DirtyRange,
    ) {
        if let Some(decoration) = self.decorate(model, annotation) {
            dirty.include(&decoration.position);
            next.insert(decoration);
        }
    }

    /// Decorations for every live annotation in the model
    fn build_all(&mut self, model: &dyn AnnotationModel) -> DecorationPools {
        let mut pools = DecorationPools::default();
        for annotation in model.annotation_iter() {
            if let Some(decoration) = self.decorate(model, &annotation) {
                pools.insert(decoration);
            }
        }
        pools
    }

    fn rebuild_after_world_change(
        &mut self,
        model: &dyn AnnotationModel,
        previous: &DecorationPools,
        dirty: &mut DirtyRange,
    ) -> DecorationPools {
        self.pending_erasures.extend(previous.plain.values().cloned());
        let next = self.build_all(model);
        if !previous.is_empty() || !next.is_empty() {
            *dirty = DirtyRange::new(0, model.document_length());
        }
        tracing::debug!(
            before = previous.len(),
            after = next.len(),
            "world change, decorations rebuilt"
        );
        next
    }

    /// Rebuild from the model and dirty only what differs from `previous`
    fn resync(
        &mut self,
        model: &dyn AnnotationModel,
        previous: &DecorationPools,
        dirty: &mut DirtyRange,
    ) -> DecorationPools {
        let next = self.build_all(model);

        for old in previous.iter() {
            let unchanged = next.get(old.id()).is_some_and(|new| new.looks_like(old));
            if !unchanged {
                dirty.include(&old.position);
                if old.kind() == StrategyKind::Draw {
                    self.pending_erasures.push(old.clone());
                }
            }
        }
        for new in next.iter() {
            let unchanged = previous.get(new.id()).is_some_and(|old| old.looks_like(new));
            if !unchanged {
                dirty.include(&new.position);
            }
        }
        next
    }

    /// Build the decoration for one annotation.
    ///
    /// `None` when the annotation is deleted, its type has no paint strategy
    /// or no color, or the model has no live position for it.
    fn decorate(
        &mut self,
        model: &dyn AnnotationModel,
        annotation: &Arc<Annotation>,
    ) -> Option<Decoration> {
        if annotation.is_deleted() {
            return None;
        }
        let capabilities = self.registry.resolve(annotation.kind())?;
        let strategy = capabilities.strategy.filter(|s| s.kind().is_some())?;
        let color = capabilities.color?;
        if !capabilities.show_in_overview && !capabilities.show_inline {
            return None;
        }
        let Some(position) = model.position(annotation.id()).filter(|p| !p.deleted) else {
            tracing::trace!(id = %annotation.id(), "annotation without live position skipped");
            return None;
        };
        Some(Decoration {
            annotation: Arc::clone(annotation),
            position,
            color,
            layer: annotation
                .layer()
                .or(capabilities.layer)
                .unwrap_or(DEFAULT_LAYER),
            strategy,
            show_in_overview: capabilities.show_in_overview,
            show_inline: capabilities.show_inline,
        })
    }

    /// Decorations overlapping `range`, sorted by ascending layer.
    ///
    /// Each decoration carries the position the model reports now, and that
    /// position is stored back so later invalidation and erasure target the
    /// place it was painted. Annotations deleted since the last sync are left
    /// out.
    pub fn decorations_overlapping(&self, range: Range<usize>) -> Vec<Decoration> {
        let pools = self.pools.load_full();
        let mut moved = Vec::new();
        let mut result: Vec<Decoration> = pools
            .iter()
            .filter_map(|decoration| {
                let position = self.current_position(decoration)?;
                if !position.overlaps(range.start, range.end) {
                    return None;
                }
                if position != decoration.position {
                    moved.push((decoration.id(), position));
                }
                Some(Decoration {
                    position,
                    ..decoration.clone()
                })
            })
            .collect();
        if !moved.is_empty() {
            self.store_positions(&pools, &moved);
        }
        result.sort_by_key(|d| (d.layer, d.id()));
        result
    }

    /// Publish `pools` with the given positions replaced
    fn store_positions(&self, pools: &DecorationPools, moved: &[(AnnotationId, Position)]) {
        let mut next = pools.clone();
        for (id, position) in moved {
            if let Some(decoration) = next.get_mut(*id) {
                decoration.position = *position;
            }
        }
        tracing::trace!(moved = moved.len(), "decoration positions refreshed");
        self.pools.store(Arc::new(next));
    }

    fn current_position(&self, decoration: &Decoration) -> Option<Position> {
        if decoration.annotation.is_deleted() {
            return None;
        }
        match &self.model {
            Some(model) => model.position(decoration.id()).filter(|p| !p.deleted),
            None => Some(decoration.position),
        }
    }

    /// Current pools; the snapshot stays consistent while it is held
    pub fn snapshot(&self) -> Arc<DecorationPools> {
        self.pools.load_full()
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.pools.load().get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.pools.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.load().is_empty()
    }

    /// Plain decorations that were dropped and must be erased from the screen
    pub fn take_erasures(&mut self) -> Vec<Decoration> {
        std::mem::take(&mut self.pending_erasures)
    }

    /// Dirty range of the most recent sync
    pub fn last_dirty(&self) -> DirtyRange {
        self.last_dirty
    }

    /// Union of dirty ranges since the last full redraw
    pub fn cumulative_dirty(&self) -> DirtyRange {
        self.cumulative_dirty
    }

    /// The host repainted everything; forget accumulated damage
    pub fn mark_redrawn(&mut self) -> DirtyRange {
        std::mem::take(&mut self.cumulative_dirty)
    }
}
