//! Soundpad clip loading: decode a file to mono f32, resample it to the engine
//! rate, and look clips up by id in the sounds directory.

use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{ClipError, ClipResult};

/// Extensions tried, in order, when resolving a sound id.
pub const SOUND_EXTENSIONS: [&str; 5] = ["wav", "mp3", "ogg", "m4a", "flac"];

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClip {
    /// Mono samples in [-1, 1]
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Decodes the first audio track of `path` and averages its channels to mono.
pub fn decode_file(path: &Path) -> ClipResult<DecodedClip> {
    let file = File::open(path).map_err(|source| ClipError::Open { path: path.to_path_buf(), source })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| ClipError::Unsupported(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ClipError::Unsupported("no decodable audio track".into()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| ClipError::Unsupported(e.to_string()))?;

    let mut samples = Vec::new();
    let mut buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            // end of stream
            Err(Error::IoError(_)) | Err(Error::ResetRequired) => break,
            Err(e) => return Err(ClipError::Decode(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(Error::DecodeError(e)) => {
                log::warn!("Skipping corrupt packet in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => return Err(ClipError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        let channels = spec.channels.count().max(1);
        if buf.as_ref().map_or(true, |sb| sb.capacity() < decoded.capacity() * channels) {
            buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        let Some(sb) = buf.as_mut() else { continue };
        sb.copy_interleaved_ref(decoded);
        samples.extend(sb.samples().chunks_exact(channels).map(|frame| frame.iter().sum::<f32>() / channels as f32));
    }

    if samples.is_empty() {
        return Err(ClipError::Empty);
    }
    if sample_rate == 0 {
        return Err(ClipError::Unsupported("unknown sample rate".into()));
    }
    log::debug!("Decoded {} ({} samples at {}Hz)", path.display(), samples.len(), sample_rate);
    Ok(DecodedClip { samples, sample_rate })
}

/// Linear-interpolation resampling to `floor(len * to / from)` samples.
pub fn resample(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || samples.is_empty() || from == 0 || to == 0 {
        return samples.to_vec();
    }
    let out_len = (samples.len() as u64 * to as u64 / from as u64) as usize;
    let step = from as f64 / to as f64;
    let last = samples.len() - 1;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = pos.floor() as usize;
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx.min(last)];
            let b = samples[(idx + 1).min(last)];
            a + (b - a) * frac
        })
        .collect()
}

/// Sound files addressed by id (file stem) inside one directory.
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    dir: PathBuf,
}

impl SoundLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First `<id>.<ext>` that exists, trying [`SOUND_EXTENSIONS`] in order.
    pub fn resolve(&self, id: &str) -> ClipResult<PathBuf> {
        // ids are bare names, never paths
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(ClipError::NotFound(id.to_string()));
        }
        SOUND_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{id}.{ext}")))
            .find(|p| p.is_file())
            .ok_or_else(|| ClipError::NotFound(id.to_string()))
    }

    /// Ids of every playable file in the directory, sorted.
    pub fn list(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut ids: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| SOUND_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            })
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn load(&self, id: &str) -> ClipResult<DecodedClip> {
        decode_file(&self.resolve(id)?)
    }
}
