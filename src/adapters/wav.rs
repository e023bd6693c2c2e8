use std::io::Read;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use tracing::debug;

use crate::domain::audio::downmix;
use crate::domain::PcmAudio;

/// Decode a WAV stream into mono f32 PCM at its native sample rate.
pub fn decode_wav<R: Read>(reader: R) -> Result<PcmAudio, hound::Error> {
    let reader = WavReader::new(reader)?;
    let spec = reader.spec();
    debug!(
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        format = ?spec.sample_format,
        "Decoding WAV"
    );

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_val))
                .collect::<Result<_, _>>()?
        }
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
    };

    let mono = downmix(&interleaved, spec.channels as usize);
    Ok(PcmAudio::new(mono, spec.sample_rate))
}

pub fn decode_wav_file(path: &Path) -> Result<PcmAudio, hound::Error> {
    let file = std::fs::File::open(path)?;
    decode_wav(std::io::BufReader::new(file))
}
