//! Spectrum visualizer
//!
//! Once per display refresh, pulls byte frequency data from the analyser tap
//! and draws one bar per bin. The frame chain is self-cancelling: a frame
//! that finds the mode inactive, or the analyser or canvas missing, stops
//! without requesting another.

use log::debug;

use crate::dsp::Analyser;
use crate::host::{hsl_to_rgb, Canvas2d, Scheduler, TaskHandle, TaskId, BACKGROUND};

/// Ratio of bar width to the per-bin share of the canvas
const BAR_WIDTH_SCALE: f64 = 2.5;

/// Horizontal gap between bars in pixels
const BAR_GAP: f64 = 1.0;

/// Draw one frame of bars for `bins` (byte magnitudes)
pub fn draw_spectrum<C: Canvas2d + ?Sized>(canvas: &mut C, bins: &[u8]) {
    let width = canvas.width() as f64;
    let height = canvas.height() as f64;

    canvas.clear_rect(0.0, 0.0, width, height);
    canvas.fill_rect(0.0, 0.0, width, height, BACKGROUND);

    if bins.is_empty() {
        return;
    }

    let count = bins.len() as f64;
    let bar_width = width / count * BAR_WIDTH_SCALE;
    let mut x = 0.0;

    for (i, &value) in bins.iter().enumerate() {
        let bar_height = value as f64 / 255.0 * height;
        let color = hsl_to_rgb((i as f64 / count * 360.0) as f32, 1.0, 0.5);
        canvas.fill_rect(x, height - bar_height, bar_width, bar_height, color);
        x += bar_width + BAR_GAP;
    }
}

/// Per-frame spectrum renderer
#[derive(Debug, Default)]
pub struct Visualizer {
    frame: Option<TaskHandle>,
    bins: Vec<u8>,
    frames_drawn: u64,
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the first frame; does nothing if a frame is already pending
    pub fn start<T: Copy + std::fmt::Debug>(&mut self, scheduler: &mut Scheduler<T>, tag: T) {
        if self.is_running() {
            return;
        }
        self.frame = Some(scheduler.request_frame(tag));
        debug!("[VIS] Started");
    }

    /// Cancel the pending frame
    pub fn stop(&mut self) {
        if let Some(frame) = self.frame.take() {
            frame.cancel();
            debug!("[VIS] Stopped after {} frames", self.frames_drawn);
        }
    }

    pub fn is_running(&self) -> bool {
        self.frame.as_ref().is_some_and(TaskHandle::is_live)
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Handle a due frame callback
    ///
    /// Returns `true` if a frame was drawn. A callback for a frame that is no
    /// longer the pending one is ignored.
    pub fn on_frame<T, C>(
        &mut self,
        fired: TaskId,
        active: bool,
        analyser: Option<&mut Analyser>,
        canvas: Option<&mut C>,
        scheduler: &mut Scheduler<T>,
        tag: T,
    ) -> bool
    where
        T: Copy + std::fmt::Debug,
        C: Canvas2d + ?Sized,
    {
        let current = self
            .frame
            .as_ref()
            .is_some_and(|frame| frame.is_live() && frame.id() == fired);
        if !current {
            return false;
        }

        let (true, Some(analyser), Some(canvas)) = (active, analyser, canvas) else {
            self.stop();
            return false;
        };

        self.frame = Some(scheduler.request_frame(tag));

        self.bins.resize(analyser.frequency_bin_count(), 0);
        analyser.get_byte_frequency_data(&mut self.bins);
        draw_spectrum(canvas, &self.bins);
        self.frames_drawn += 1;
        true
    }

    /// Byte magnitudes of the last drawn frame
    pub fn last_bins(&self) -> &[u8] {
        &self.bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::AnalyserSettings;
    use crate::engine::generate_test_tone;
    use crate::host::{RasterCanvas, Rgb};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Frame;

    #[test]
    fn test_draw_fills_background_then_bars() {
        let mut canvas = RasterCanvas::new(300, 100);
        let bins = vec![0u8; 1024];
        draw_spectrum(&mut canvas, &bins);

        assert_eq!(canvas.fill_calls(), 1 + 1024);
        assert_eq!(canvas.count_color(BACKGROUND), 300 * 100);
    }

    #[test]
    fn test_full_bar_reaches_top() {
        let mut canvas = RasterCanvas::new(40, 10);
        draw_spectrum(&mut canvas, &[255, 0, 0, 0]);

        // First bin is hue 0; bar width 40 / 4 * 2.5 = 25
        let red = Rgb::new(255, 0, 0);
        assert_eq!(canvas.pixel(0, 0), Some(red));
        assert_eq!(canvas.pixel(24, 9), Some(red));
        assert_eq!(canvas.pixel(25, 9), Some(BACKGROUND));
    }

    #[test]
    fn test_half_bar_height() {
        let mut canvas = RasterCanvas::new(10, 100);
        draw_spectrum(&mut canvas, &[128]);
        let red = Rgb::new(255, 0, 0);
        // 128 / 255 * 100 = 50.2, so the bar starts inside row 49
        assert_eq!(canvas.pixel(0, 48), Some(BACKGROUND));
        assert_eq!(canvas.pixel(0, 49), Some(red));
    }

    #[test]
    fn test_frame_chain_continues_while_active() {
        let mut scheduler = Scheduler::new(10.0);
        let mut analyser = Analyser::new(AnalyserSettings::default()).unwrap();
        analyser.push(&generate_test_tone(1500.0, 0.1, 48000));
        let mut canvas = RasterCanvas::new(300, 100);
        let mut vis = Visualizer::new();

        vis.start(&mut scheduler, Frame);
        for _ in 0..3 {
            let fired = scheduler.pop_due(f64::MAX).unwrap();
            assert!(vis.on_frame(fired.id, true, Some(&mut analyser), Some(&mut canvas), &mut scheduler, Frame));
        }
        assert_eq!(vis.frames_drawn(), 3);
        assert!(vis.is_running());
        assert!(vis.last_bins().iter().any(|&b| b > 0));
    }

    #[test]
    fn test_frame_chain_stops_when_inactive() {
        let mut scheduler = Scheduler::new(10.0);
        let mut analyser = Analyser::new(AnalyserSettings::default()).unwrap();
        let mut canvas = RasterCanvas::new(300, 100);
        let mut vis = Visualizer::new();

        vis.start(&mut scheduler, Frame);
        let fired = scheduler.pop_due(f64::MAX).unwrap();
        assert!(!vis.on_frame(fired.id, false, Some(&mut analyser), Some(&mut canvas), &mut scheduler, Frame));

        assert!(!vis.is_running());
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(canvas.fill_calls(), 0);
    }

    #[test]
    fn test_frame_chain_stops_without_analyser() {
        let mut scheduler = Scheduler::new(10.0);
        let mut canvas = RasterCanvas::new(300, 100);
        let mut vis = Visualizer::new();

        vis.start(&mut scheduler, Frame);
        let fired = scheduler.pop_due(f64::MAX).unwrap();
        assert!(!vis.on_frame(fired.id, true, None, Some(&mut canvas), &mut scheduler, Frame));
        assert!(!vis.is_running());
    }

    #[test]
    fn test_stale_frame_is_ignored() {
        let mut scheduler = Scheduler::new(10.0);
        let mut analyser = Analyser::new(AnalyserSettings::default()).unwrap();
        let mut canvas = RasterCanvas::new(300, 100);
        let mut vis = Visualizer::new();

        vis.start(&mut scheduler, Frame);
        let fired = scheduler.pop_due(f64::MAX).unwrap();
        vis.stop();
        vis.start(&mut scheduler, Frame);

        assert!(!vis.on_frame(fired.id, true, Some(&mut analyser), Some(&mut canvas), &mut scheduler, Frame));
        assert_eq!(vis.frames_drawn(), 0);
    }
}
