pub mod asset_dir;
pub mod audio_cpal;
pub mod config_store;
pub mod file_source;
pub mod wav;
pub mod whisper_cpp;

pub use asset_dir::DirModelAssets;
pub use audio_cpal::{CpalAudioOutput, CpalOutputFactory};
pub use config_store::TomlConfigStore;
pub use file_source::FileSourceReader;
pub use whisper_cpp::WhisperCppEngine;
