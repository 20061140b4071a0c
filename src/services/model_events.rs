//! Getting annotation model notifications onto the render thread
//!
//! The model may notify from any thread, but only the render thread touches
//! decorations. [`ModelEventReceiver`] is the listener registered with the
//! model; it never syncs anything itself and only posts to the
//! [`RenderQueue`], which the render thread pumps.
//!
//! - On the render thread, events are queued as they are.
//! - Off the render thread, a burst of events collapses into one pending
//!   resync; a flag keeps a second one from being posted until it starts.
//!   A notification arriving while a pump runs posts a new resync, which the
//!   same pump picks up.
//! - The initial event a model delivers while [`ModelEventReceiver::attach`]
//!   registers the listener is dropped when attaching off the render thread.

use crate::error::RulerError;
use crate::model::{AnnotationModel, AnnotationModelEvent, ListenerId, ModelListener};
use crate::view::{DecorationCache, DirtyRange, RulerPainter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Anything that can apply a model event and report what became dirty
pub trait SyncTarget {
    fn sync(&mut self, event: Option<&AnnotationModelEvent>) -> DirtyRange;
}

impl SyncTarget for DecorationCache {
    fn sync(&mut self, event: Option<&AnnotationModelEvent>) -> DirtyRange {
        DecorationCache::sync(self, event)
    }
}

impl SyncTarget for RulerPainter {
    fn sync(&mut self, event: Option<&AnnotationModelEvent>) -> DirtyRange {
        RulerPainter::sync(self, event)
    }
}

/// Work posted to the render thread
#[derive(Debug, Clone)]
pub enum Delivery {
    /// An event delivered on the render thread
    Event(AnnotationModelEvent),
    /// Resynchronize against the current model state
    Resync,
}

/// Called whenever a delivery is posted, so the host can schedule a pump
pub type WakeFn = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Flags {
    resync_scheduled: AtomicBool,
    attaching: AtomicBool,
}

/// Model listener side. Thread-safe; share it through the `Arc` returned by
/// [`render_channel`].
pub struct ModelEventReceiver {
    sender: Sender<Delivery>,
    render_thread: ThreadId,
    flags: Arc<Flags>,
    wake: Option<WakeFn>,
}

/// Render thread side
pub struct RenderQueue {
    receiver: Receiver<Delivery>,
    flags: Arc<Flags>,
}

/// Create both ends. The calling thread becomes the render thread.
pub fn render_channel(wake: Option<WakeFn>) -> (Arc<ModelEventReceiver>, RenderQueue) {
    let (sender, receiver) = mpsc::channel();
    let flags = Arc::new(Flags::default());
    let receiver_side = ModelEventReceiver {
        sender,
        render_thread: thread::current().id(),
        flags: Arc::clone(&flags),
        wake,
    };
    (Arc::new(receiver_side), RenderQueue { receiver, flags })
}

impl ModelEventReceiver {
    pub fn is_render_thread(&self) -> bool {
        thread::current().id() == self.render_thread
    }

    /// Handle one model notification
    pub fn notify(&self, event: &AnnotationModelEvent) {
        if self.is_render_thread() {
            self.post(Delivery::Event(event.clone()));
            return;
        }
        if self.flags.attaching.load(Ordering::Acquire) {
            tracing::trace!("off-thread model event ignored while attaching");
            return;
        }
        if self.flags.resync_scheduled.swap(true, Ordering::AcqRel) {
            tracing::trace!("off-thread model event coalesced into pending resync");
            return;
        }
        self.post(Delivery::Resync);
    }

    fn post(&self, delivery: Delivery) {
        if self.sender.send(delivery).is_err() {
            // The render queue is gone; the ruler is being torn down
            tracing::trace!("render queue dropped, model event discarded");
            return;
        }
        if let Some(wake) = &self.wake {
            wake();
        }
    }

    /// Listener closure to register with a model
    pub fn listener(self: &Arc<Self>) -> ModelListener {
        let receiver = Arc::clone(self);
        Box::new(move |event| receiver.notify(event))
    }

    /// Register with `model`.
    ///
    /// Models deliver an initial event while registering; it is queued when
    /// attaching on the render thread and dropped otherwise.
    pub fn attach(
        self: &Arc<Self>,
        model: &dyn AnnotationModel,
        id: ListenerId,
    ) -> Result<(), RulerError> {
        self.flags.attaching.store(true, Ordering::Release);
        let result = model.add_listener(id, self.listener());
        self.flags.attaching.store(false, Ordering::Release);
        result
    }

    pub fn detach(&self, model: &dyn AnnotationModel, id: ListenerId) -> bool {
        model.remove_listener(id)
    }
}

impl RenderQueue {
    /// Apply everything posted so far, including what gets posted while
    /// pumping, and return the union of the dirty ranges.
    pub fn pump(&mut self, target: &mut dyn SyncTarget) -> DirtyRange {
        let mut dirty = DirtyRange::empty();
        let mut applied = 0usize;
        while let Ok(delivery) = self.receiver.try_recv() {
            applied += 1;
            let batch = match delivery {
                Delivery::Event(event) => target.sync(Some(&event)),
                Delivery::Resync => {
                    // Cleared before reading the model so that a change made
                    // during the resync schedules another one
                    self.flags.resync_scheduled.store(false, Ordering::Release);
                    target.sync(None)
                }
            };
            dirty = dirty.union(batch);
        }
        if applied > 0 {
            tracing::trace!(applied, "render queue pumped");
        }
        dirty
    }

    /// Whether an off-thread resync is waiting for the next pump
    pub fn resync_pending(&self) -> bool {
        self.flags.resync_scheduled.load(Ordering::Acquire)
    }
}
