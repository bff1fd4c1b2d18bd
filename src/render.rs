//! Offline rendering: runs a WAV file through the same engine and output clip
//! as the live path, block by block.

use std::path::Path;

use crate::clip::resample;
use crate::config::EngineSettings;
use crate::engine::effects::EffectKind;
use crate::engine::graph::{clip_output, EffectEngine, OUTPUT_LIMIT};
use crate::engine::soundpad::DEFAULT_VOLUME;
use crate::engine::state::SharedState;
use crate::error::{ConfigError, RenderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub samples: usize,
    pub blocks: usize,
    pub sample_rate: u32,
}

/// Processes `input` (mono, engine rate) with `effect`. The last partial block
/// is zero-padded for processing and truncated in the result.
pub fn render_samples(input: &[f32], effect: EffectKind, settings: EngineSettings) -> Result<Vec<f32>, ConfigError> {
    let shared = SharedState::new(effect, DEFAULT_VOLUME);
    let mut engine = EffectEngine::new(settings, shared)?;
    let mut out = Vec::with_capacity(input.len());
    let mut block = vec![0.0f32; settings.block_size];
    for chunk in input.chunks(settings.block_size) {
        block[..chunk.len()].copy_from_slice(chunk);
        block[chunk.len()..].fill(0.0);
        engine.process(&mut block);
        clip_output(&mut block, OUTPUT_LIMIT);
        out.extend_from_slice(&block[..chunk.len()]);
    }
    Ok(out)
}

/// Reads a WAV file as mono f32 along with its sample rate.
pub fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32), RenderError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;
    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, bits @ 8..=32) => {
            let scale = (1u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
        (format, bits) => return Err(RenderError::Format { bits, format }),
    };
    let mono = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

/// Renders `input` through `effect` into a 32-bit float mono WAV at the engine rate.
pub fn render_file(input: &Path, output: &Path, effect: EffectKind, settings: EngineSettings) -> Result<RenderSummary, RenderError> {
    let (samples, rate) = read_wav_mono(input)?;
    if samples.is_empty() {
        return Err(RenderError::Empty);
    }
    let samples = if rate == settings.sample_rate {
        samples
    } else {
        log::info!("Resampling {} from {}Hz to {}Hz", input.display(), rate, settings.sample_rate);
        resample(&samples, rate, settings.sample_rate)
    };

    let rendered = render_samples(&samples, effect, settings)?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: settings.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(output, spec)?;
    for &s in &rendered {
        writer.write_sample(s)?;
    }
    writer.finalize()?;

    let summary = RenderSummary {
        samples: rendered.len(),
        blocks: rendered.len().div_ceil(settings.block_size),
        sample_rate: settings.sample_rate,
    };
    log::info!("Rendered {} with {} to {} ({} samples)", input.display(), effect, output.display(), summary.samples);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(len: usize, rate: u32) -> Vec<f32> {
        (0..len).map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / rate as f32).sin()).collect()
    }

    #[test]
    fn test_render_samples_keeps_length_and_limit() {
        let settings = EngineSettings::new(44_100, 512).unwrap();
        for kind in EffectKind::ALL {
            let out = render_samples(&sine(1300, 44_100), kind, settings).unwrap();
            assert_eq!(out.len(), 1300);
            assert!(out.iter().all(|x| x.abs() <= OUTPUT_LIMIT));
        }
    }

    #[test]
    fn test_render_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("voice.wav");
        let output = dir.path().join("voice_radio.wav");

        let spec = hound::WavSpec { channels: 2, sample_rate: 22_050, bits_per_sample: 16, sample_format: hound::SampleFormat::Int };
        let mut w = hound::WavWriter::create(&input, spec).unwrap();
        for s in sine(2205, 22_050) {
            let v = (s * 32767.0) as i16;
            w.write_sample(v).unwrap();
            w.write_sample(v).unwrap();
        }
        w.finalize().unwrap();

        let settings = EngineSettings::new(44_100, 1024).unwrap();
        let summary = render_file(&input, &output, EffectKind::Radio, settings).unwrap();
        assert_eq!(summary.samples, 4410);
        assert_eq!(summary.blocks, 5);

        let reader = hound::WavReader::open(&output).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 44_100);
        assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
        assert_eq!(reader.len(), 4410);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.wav");
        let spec = hound::WavSpec { channels: 1, sample_rate: 44_100, bits_per_sample: 16, sample_format: hound::SampleFormat::Int };
        hound::WavWriter::create(&input, spec).unwrap().finalize().unwrap();
        let err = render_file(&input, &dir.path().join("out.wav"), EffectKind::None, EngineSettings::default()).unwrap_err();
        assert!(matches!(err, RenderError::Empty));
    }

    #[test]
    fn test_missing_input_is_a_wav_error() {
        let err = render_file(Path::new("/no/such.wav"), Path::new("/tmp/x.wav"), EffectKind::None, EngineSettings::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::Wav(_)));
    }
}
