pub mod assets;
pub mod config;
pub mod engine;
pub mod output;
pub mod source;

pub use assets::ModelAssets;
pub use config::ConfigStore;
pub use engine::InferenceEngine;
pub use output::{AudioOutput, AudioOutputFactory, OutputEvent, OutputEventSender};
pub use source::SourceReader;
