use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioDecodeError, AudioNormalizer};
use crate::domain::{AudioFormat, NormalizedAudio, SanitizedFilename, TARGET_SAMPLE_RATE};

/// Decodes uploads through a temporary file in `temp_dir`.
///
/// The temporary file is owned by the blocking decode task and removed when
/// that task finishes, whether decoding succeeded, failed, or the request
/// that started it has already gone away.
pub struct SymphoniaAudioNormalizer {
    temp_dir: PathBuf,
}

impl SymphoniaAudioNormalizer {
    pub fn new(temp_dir: PathBuf) -> Result<Self, AudioDecodeError> {
        std::fs::create_dir_all(&temp_dir)?;
        Ok(Self { temp_dir })
    }

    pub fn temp_dir(&self) -> &PathBuf {
        &self.temp_dir
    }
}

#[async_trait]
impl AudioNormalizer for SymphoniaAudioNormalizer {
    async fn normalize(
        &self,
        data: Bytes,
        format: AudioFormat,
        filename: &SanitizedFilename,
    ) -> Result<NormalizedAudio, AudioDecodeError> {
        let temp_dir = self.temp_dir.clone();
        let suffix = format!("-{}", filename.as_str());

        let samples = tokio::task::spawn_blocking(move || -> Result<Vec<f32>, AudioDecodeError> {
            let mut staged = tempfile::Builder::new()
                .prefix("upload-")
                .suffix(&suffix)
                .tempfile_in(&temp_dir)?;
            staged.write_all(&data)?;
            staged.flush()?;

            tracing::debug!(path = %staged.path().display(), bytes = data.len(), "Upload staged for decoding");

            let file = staged.reopen()?;
            decode_to_mono_16k(file, format)
        })
        .await
        .map_err(|e| AudioDecodeError::DecodingFailed(format!("decode task: {}", e)))??;

        Ok(NormalizedAudio::new(samples))
    }
}

fn decode_to_mono_16k(file: File, format: AudioFormat) -> Result<Vec<f32>, AudioDecodeError> {
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioDecodeError::UnsupportedFormat(format!("probe: {}", e)))?;

    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or_else(|| AudioDecodeError::DecodingFailed("no audio track found".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| AudioDecodeError::DecodingFailed("unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AudioDecodeError::UnsupportedFormat(format!("codec: {}", e)))?;

    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(AudioDecodeError::DecodingFailed(format!("packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => {
                return Err(AudioDecodeError::DecodingFailed(format!("decode: {}", e)));
            }
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();
        if num_frames == 0 {
            continue;
        }
        let channels = spec.channels.count().max(1);

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        let samples = sample_buf.samples();

        if channels > 1 {
            for frame in samples.chunks(channels) {
                mono.push(frame.iter().sum::<f32>() / channels as f32);
            }
        } else {
            mono.extend_from_slice(samples);
        }
    }

    if mono.is_empty() {
        return Err(AudioDecodeError::NoSamples);
    }

    if source_rate != TARGET_SAMPLE_RATE {
        mono = resample(&mono, source_rate, TARGET_SAMPLE_RATE)?;
    }

    tracing::debug!(
        source_rate = source_rate,
        samples = mono.len(),
        duration_secs = mono.len() as f32 / TARGET_SAMPLE_RATE as f32,
        "Audio normalized to 16kHz mono PCM"
    );

    Ok(mono)
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioDecodeError> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let chunk_size = 1024;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| AudioDecodeError::ResamplingFailed(format!("init: {}", e)))?;

    let expected_len = (samples.len() as f64 * ratio) as usize;
    // The sinc filter emits `delay` frames of lead-in before the first real
    // output frame; feed trailing silence until the real tail is flushed.
    let delay = resampler.output_delay();
    let needed = delay + expected_len;
    let mut output = Vec::with_capacity(needed + chunk_size);
    let mut chunks = samples.chunks(chunk_size);

    loop {
        let input = match chunks.next() {
            Some(chunk) => {
                let mut input = chunk.to_vec();
                input.resize(chunk_size, 0.0);
                input
            }
            None if output.len() < needed => vec![0.0; chunk_size],
            None => break,
        };

        let result = resampler
            .process(&[input], None)
            .map_err(|e| AudioDecodeError::ResamplingFailed(e.to_string()))?;

        match result.first() {
            Some(channel) if !channel.is_empty() => output.extend_from_slice(channel),
            _ => {
                return Err(AudioDecodeError::ResamplingFailed(
                    "resampler produced no output".to_string(),
                ));
            }
        }
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected_len);

    Ok(output)
}
