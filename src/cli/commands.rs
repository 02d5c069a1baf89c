//! CLI Command Implementations
//!
//! Each command runs a real session over an imported WAV file.

use std::path::Path;

use log::{info, warn};

use crate::config::DissectConfig;
use crate::engine::{export_audio, import_audio, ExportFormat, MediaElement};
use crate::error::{DissectError, Result};
use crate::graph::{BandId, BANDS};
use crate::host::NativeBackend;
use crate::looping::format_time;
use crate::messaging::ContentEndpoint;
use crate::session::{DissectSession, Status};

/// Print the band table.
pub fn list_bands() -> Result<()> {
    println!("{:<10} {:<9} {:>8} {:>5}  label", "id", "type", "freq", "Q");
    for band in &BANDS {
        println!(
            "{:<10} {:<9} {:>6}Hz {:>5.1}  {}",
            band.id,
            band.filter_type.as_str(),
            band.frequency,
            band.q,
            band.label
        );
    }
    Ok(())
}

/// Render a file through the graph with a band soloed.
pub fn solo(config: DissectConfig, input: &Path, band: &str, output: &Path) -> Result<()> {
    let band = parse_band(band)?;
    info!("Rendering {} with {} soloed", input.display(), band.map_or("nothing", |b| b.as_str()));

    let mut session = open_session(config, input)?;
    if let Some(id) = band {
        session.click_solo(id);
    }

    let rendered = play_and_record(&mut session, None)?;
    export_audio(&rendered, output, ExportFormat::default())?;

    println!(
        "Wrote {} ({:.2}s, RMS {:.1} dB)",
        output.display(),
        rendered.duration_secs(),
        rendered.rms_db(0)
    );
    Ok(())
}

/// Run the analyser up to a position and report the spectrum.
pub fn spectrum(
    mut config: DissectConfig,
    input: &Path,
    at: f64,
    width: Option<u32>,
    height: Option<u32>,
    output: Option<&Path>,
) -> Result<()> {
    if let Some(width) = width {
        config.canvas_width = width;
    }
    if let Some(height) = height {
        config.canvas_height = height;
    }
    let fft_size = config.fft_size;

    let mut session = open_session(config, input)?;
    let sample_rate = session.media().map_or(0, MediaElement::sample_rate);
    play_and_record(&mut session, Some(at))?;

    let bins = session.visualizer().last_bins();
    if bins.is_empty() {
        warn!("No frame was drawn before {:.2}s", at);
    }

    let mut peaks: Vec<(usize, u8)> = bins.iter().copied().enumerate().collect();
    peaks.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    println!("Spectrum at {} ({} bins)", format_time(at), bins.len());
    for (bin, value) in peaks.iter().take(5).filter(|(_, v)| *v > 0) {
        let hz = *bin as f64 * sample_rate as f64 / fft_size as f64;
        let bar = "#".repeat(*value as usize / 8);
        println!("  {:>8.1} Hz {:>3} {}", hz, value, bar);
    }

    if let Some(path) = output {
        if let Some(panel) = session.panel() {
            panel.canvas().write_ppm(path)?;
            println!("Canvas written to {}", path.display());
        }
    }
    Ok(())
}

/// Loop a range for a while and print every jump back.
pub fn run_loop(
    config: DissectConfig,
    input: &Path,
    start: f64,
    end: f64,
    run: f64,
    output: Option<&Path>,
) -> Result<()> {
    let poll_ms = config.loop_poll_ms;
    let mut session = open_session(config, input)?;
    session.engage_loop(start, end)?;
    session.start_recording();

    println!("Looping {} - {}", format_time(start), format_time(end));

    let total_ms = run.max(0.0) * 1000.0;
    let mut seen = 0;
    while session.now_ms() < total_ms {
        let step = poll_ms.min(total_ms - session.now_ms());
        session.advance(step);

        let seek_backs = session.looper().seek_backs();
        if seek_backs > seen {
            seen = seek_backs;
            println!(
                "  [{:>7.1}s] back to {}",
                session.now_ms() / 1000.0,
                format_time(start)
            );
        }
        if !session.looper().is_looping() {
            println!("Loop stopped at {:.1}s", session.now_ms() / 1000.0);
            break;
        }
    }

    println!("{} jumps in {:.1}s", seen, session.now_ms() / 1000.0);

    if let Some(path) = output {
        let rendered = session
            .take_recording()
            .ok_or(DissectError::GraphNotInitialized)?;
        export_audio(&rendered, path, ExportFormat::default())?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Feed JSON requests to a session, one per line.
pub fn run_script(config: DissectConfig, input: &Path, script: &Path) -> Result<()> {
    let text = std::fs::read_to_string(script).map_err(|e| DissectError::FileNotFound {
        path: script.display().to_string(),
        source: Some(e),
    })?;

    let media = MediaElement::with_metadata(import_audio(input)?);
    let mut session = DissectSession::try_new(config, Box::new(NativeBackend), Some(media))?;

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match session.handle_json(line)? {
            Some(reply) => println!("{} -> {}", line, reply),
            None => println!("{} -> (no response)", line),
        }
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_band(text: &str) -> Result<Option<BandId>> {
    match text {
        "none" => Ok(None),
        other => other.parse().map(Some),
    }
}

/// Import a file into an activated session
fn open_session(config: DissectConfig, input: &Path) -> Result<DissectSession> {
    let media = MediaElement::with_metadata(import_audio(input)?);
    let mut session = DissectSession::try_new(config, Box::new(NativeBackend), Some(media))?;

    if session.activate() != Status::Active {
        return Err(DissectError::GraphNotInitialized);
    }
    Ok(session)
}

/// Play from the start for `seconds` (or the whole file) and return the
/// rendered audio
fn play_and_record(
    session: &mut DissectSession,
    seconds: Option<f64>,
) -> Result<crate::engine::AudioBuffer> {
    let media = session.media_mut().ok_or(DissectError::MediaElementMissing)?;
    let duration = media.duration().unwrap_or(0.0);
    let frames = media.sample_rate() as f64 * duration;
    media.play();

    session.start_recording();
    let run = seconds.unwrap_or(duration).clamp(0.0, duration);
    session.advance(run * 1000.0);

    let rendered = session
        .take_recording()
        .ok_or(DissectError::GraphNotInitialized)?;
    Ok(rendered.slice(0, (frames.round() as usize).min(rendered.num_samples())))
}
