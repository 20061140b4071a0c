pub mod model_events;

pub use model_events::{render_channel, Delivery, ModelEventReceiver, RenderQueue, SyncTarget};
