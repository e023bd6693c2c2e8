pub mod controller;
pub mod model_lifecycle;
pub mod pipeline;
pub mod playback;
pub mod staging;

pub use controller::{AppController, Components};
pub use model_lifecycle::ModelLifecycle;
pub use pipeline::TranscriptionPipeline;
pub use playback::{PlaybackController, PreparedSignal};
pub use staging::{StagedFile, Stager};
