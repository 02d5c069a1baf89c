//! Audio file I/O
//!
//! WAV import/export through `hound`. Audio keeps its native sample rate;
//! the audio context is created at whatever rate the media element carries.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::error::{DissectError, Result};

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// Bit depth: 16, 24, or 32 (32 = float)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat { bit_depth: 32 }
    }
}

impl ExportFormat {
    /// 16-bit integer PCM
    pub fn pcm16() -> Self {
        ExportFormat { bit_depth: 16 }
    }
}

/// Import a WAV file
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is not a valid WAV file or holds no samples
/// * `UnsupportedFormat` - If the audio has more than 2 channels
pub fn import_audio(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(DissectError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let reader = WavReader::open(path).map_err(|e| DissectError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;

    let layout = ChannelLayout::from_count(channels).ok_or_else(|| {
        DissectError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", channels),
        }
    })?;

    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    let buffer = AudioBuffer::from_interleaved(&samples, layout, spec.sample_rate)?;

    if buffer.is_empty() {
        return Err(DissectError::InvalidAudio {
            reason: "Audio contains no samples".to_string(),
            source: None,
        });
    }

    log::debug!(
        "Imported {}: {} ch, {} Hz, {:.2}s",
        path.display(),
        channels,
        spec.sample_rate,
        buffer.duration_secs()
    );

    Ok(buffer)
}

/// Export an AudioBuffer to a WAV file at its own sample rate
pub fn export_audio(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format: if format.bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let interleaved = buffer.to_interleaved();
    let mut writer = WavWriter::create(path, spec)?;

    match format.bit_depth {
        16 => {
            for sample in interleaved {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled)?;
            }
        }
        24 => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled)?;
            }
        }
        32 => {
            for sample in interleaved {
                writer.write_sample(sample)?;
            }
        }
        _ => {
            return Err(DissectError::UnsupportedFormat {
                format: format!(
                    "{}-bit audio (only 16, 24, 32 supported)",
                    format.bit_depth
                ),
            });
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Generate a mono sine test tone
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> AudioBuffer {
    generate_multitone(&[frequency], duration_secs, sample_rate)
}

/// Generate a mono sum of equal-amplitude sines, normalized to a peak of 1
///
/// Handy for exercising band isolation: one partial per band.
pub fn generate_multitone(frequencies: &[f32], duration_secs: f32, sample_rate: u32) -> AudioBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let mut buffer = AudioBuffer::new(num_samples, ChannelLayout::Mono, sample_rate);
    if frequencies.is_empty() {
        return buffer;
    }

    let scale = 1.0 / frequencies.len() as f32;
    let omegas: Vec<f32> = frequencies
        .iter()
        .map(|f| 2.0 * std::f32::consts::PI * f / sample_rate as f32)
        .collect();

    for (i, sample) in buffer.samples[0].iter_mut().enumerate() {
        *sample = omegas.iter().map(|w| (w * i as f32).sin()).sum::<f32>() * scale;
    }

    buffer
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let read_failed = |e: hound::Error| DissectError::InvalidAudio {
        reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
        source: Some(Box::new(e)),
    };

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(read_failed),
        SampleFormat::Int => {
            let scale = match bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                _ => {
                    return Err(DissectError::UnsupportedFormat {
                        format: format!("{}-bit integer audio", bits_per_sample),
                    })
                }
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(read_failed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    #[test]
    fn test_export_import_float() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let tone = generate_test_tone(440.0, 0.25, 44100);

        export_audio(&tone, &path, ExportFormat::default()).unwrap();
        let imported = import_audio(&path).unwrap();

        assert_eq!(imported.sample_rate, 44100);
        assert_eq!(imported.num_channels(), 1);
        assert_eq!(imported.num_samples(), tone.num_samples());
        assert_relative_eq!(imported.channel(0)[100], tone.channel(0)[100], epsilon = 1e-6);
    }

    #[test]
    fn test_export_import_pcm16_is_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone16.wav");
        let tone = generate_test_tone(1000.0, 0.1, 48000);

        export_audio(&tone, &path, ExportFormat::pcm16()).unwrap();
        let imported = import_audio(&path).unwrap();

        for (a, b) in imported.channel(0).iter().zip(tone.channel(0)) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_import_missing_file() {
        let err = import_audio(Path::new("/nonexistent/file.wav")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_export_rejects_odd_bit_depth() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.wav");
        let tone = generate_test_tone(440.0, 0.1, 48000);
        let result = export_audio(&tone, &path, ExportFormat { bit_depth: 12 });
        assert!(result.is_err());
    }

    #[test]
    fn test_multitone_peak_is_bounded() {
        let tone = generate_multitone(&[100.0, 1000.0, 9000.0], 0.1, 48000);
        assert!(tone.channel(0).iter().all(|s| s.abs() <= 1.0));
    }
}
