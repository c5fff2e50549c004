//! Decoders for the three input paths.
//!
//! - [`decode_file`]: uploaded files, normalized floats at the native rate
//! - [`decode_container`]: in-memory containers, integer-scaled samples
//! - [`decode_f32le`]: raw little-endian float buffers from the socket

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::ConvertibleSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use super::{DecodeError, Waveform};

/// Bit depth assumed when a codec does not report one (lossy formats)
const DEFAULT_BITS_PER_SAMPLE: u32 = 16;

/// Decode an audio file at its native sample rate.
///
/// Samples are normalized to [-1, 1] and downmixed to mono. WAV files go
/// through hound; everything else is probed by symphonia.
pub fn decode_file(path: &Path) -> Result<Waveform, DecodeError> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);

    if is_wav {
        return decode_wav(path);
    }

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let decoded = decode_stream::<f32>(mss, &hint)?;
    Waveform::from_interleaved(decoded.samples, decoded.channels, decoded.sample_rate)
}

/// Decode an in-memory container of any supported format.
///
/// Samples keep the stream's integer scale (e.g. +/-32768 for 16-bit audio)
/// and are cast to f32 without normalization.
pub fn decode_container(bytes: &[u8]) -> Result<Waveform, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let source = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let decoded = decode_stream::<i32>(mss, &Hint::new())?;

    // SampleBuffer<i32> is full-scale 32-bit; shift back to the native width
    let bits = decoded
        .bits_per_sample
        .unwrap_or(DEFAULT_BITS_PER_SAMPLE)
        .clamp(1, 32);
    let shift = 32 - bits;

    let samples = decoded
        .samples
        .into_iter()
        .map(|s| (s >> shift) as f32)
        .collect();

    Waveform::from_interleaved(samples, decoded.channels, decoded.sample_rate)
}

/// Interpret a byte buffer as little-endian f32 samples at a fixed rate
pub fn decode_f32le(bytes: &[u8], sample_rate: u32) -> Result<Waveform, DecodeError> {
    if bytes.len() % 4 != 0 {
        return Err(DecodeError::MisalignedBuffer(bytes.len()));
    }

    let samples = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Waveform::new(samples, sample_rate)
}

fn decode_wav(path: &Path) -> Result<Waveform, DecodeError> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_value))
                .collect::<Result<_, _>>()?
        }
    };

    debug!(
        "Decoded WAV: {} samples, {} Hz, {} channels",
        samples.len(),
        spec.sample_rate,
        spec.channels
    );

    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }

    Waveform::from_interleaved(samples, spec.channels as usize, spec.sample_rate)
}

/// Interleaved samples from a symphonia stream
struct DecodedStream<S> {
    samples: Vec<S>,
    sample_rate: u32,
    channels: usize,
    bits_per_sample: Option<u32>,
}

fn decode_stream<S: ConvertibleSample>(
    mss: MediaSourceStream,
    hint: &Hint,
) -> Result<DecodedStream<S>, DecodeError> {
    let probed = symphonia::default::get_probe()
        .format(hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::UnknownSampleRate)?;
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);
    let bits_per_sample = track.codec_params.bits_per_sample;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    let mut samples: Vec<S> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<S>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(e) if is_end_of_stream(&e) => break,
            Err(e) => return Err(DecodeError::Corrupt(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(DecodeError::UnsupportedFormat(e.to_string())),
        };

        // The decoder may report a channel layout the container omitted
        let spec = *decoded.spec();
        channels = spec.channels.count();

        let buf = ensure_capacity(&mut sample_buf, decoded.capacity(), spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }

    debug!(
        "Decoded stream: {} samples, {} Hz, {} channels",
        samples.len(),
        sample_rate,
        channels
    );

    Ok(DecodedStream {
        samples,
        sample_rate,
        channels,
        bits_per_sample,
    })
}

/// Whether a packet read error means the stream ended rather than broke
fn is_end_of_stream(err: &SymphoniaError) -> bool {
    match err {
        SymphoniaError::IoError(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
        SymphoniaError::ResetRequired => true,
        _ => false,
    }
}

/// Sample buffer able to hold `frames` frames of `spec`.
///
/// Packets may grow or gain channels mid-stream, so the buffer sized for
/// the first packet is replaced whenever it is too small.
fn ensure_capacity<S: ConvertibleSample>(
    buf: &mut Option<SampleBuffer<S>>,
    frames: usize,
    spec: SignalSpec,
) -> &mut SampleBuffer<S> {
    let needed = frames * spec.channels.count();
    if !buf.as_ref().is_some_and(|b| b.capacity() >= needed) {
        *buf = Some(SampleBuffer::new(frames as u64, spec));
    }
    buf.get_or_insert_with(|| SampleBuffer::new(frames as u64, spec))
}
