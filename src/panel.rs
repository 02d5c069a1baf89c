//! Control panel
//!
//! The overlay the page shows while dissect mode is active: a close
//! control, the spectrum canvas, BPM/key placeholders, one solo button per
//! band, the loop sliders with their time labels, and the loop buttons.
//! Elements are addressed by [`PanelElement`] rather than by string ids.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};

use crate::graph::{Band, BandId};
use crate::host::{Canvas2d, RasterCanvas, Rgb};
use crate::looping::{format_time, LoopController, IDLE_COLOR, IDLE_LABEL};

/// Panel heading
pub const PANEL_TITLE: &str = "Dissect-A-Song";

/// Placeholder shown in the BPM and key fields
pub const PLACEHOLDER: &str = "--";

/// Addressable panel elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PanelElement {
    Close,
    Canvas,
    BpmField,
    KeyField,
    Solo(BandId),
    UnsoloAll,
    LoopStartTime,
    LoopStartSlider,
    LoopEndSlider,
    LoopEndTime,
    LoopToggle,
    LoopReset,
}

/// User interaction with the panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelEvent {
    Click(PanelElement),
    /// Slider moved to a value in seconds
    Input(PanelElement, f64),
}

/// A push button
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub label: String,
    /// Highlighted (solo buttons)
    pub active: bool,
    pub color: Option<Rgb>,
}

impl Button {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            active: false,
            color: None,
        }
    }
}

/// A range slider in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeInput {
    pub min: f64,
    pub max: f64,
    pub value: f64,
}

/// A titled group of elements
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: &'static str,
    pub elements: Vec<PanelElement>,
}

// ============================================================================
// Builder
// ============================================================================

/// Builds a [`Panel`] section by section
#[derive(Debug)]
pub struct PanelBuilder {
    sections: Vec<Section>,
    canvas: RasterCanvas,
    buttons: BTreeMap<PanelElement, Button>,
    ranges: BTreeMap<PanelElement, RangeInput>,
    texts: BTreeMap<PanelElement, String>,
    band_labels: BTreeMap<BandId, &'static str>,
}

impl PanelBuilder {
    pub fn new() -> Self {
        let mut buttons = BTreeMap::new();
        buttons.insert(PanelElement::Close, Button::new("\u{d7}"));
        Self {
            sections: Vec::new(),
            canvas: RasterCanvas::new(0, 0),
            buttons,
            ranges: BTreeMap::new(),
            texts: BTreeMap::new(),
            band_labels: BTreeMap::new(),
        }
    }

    /// Spectrum canvas
    pub fn visuals(mut self, width: u32, height: u32) -> Self {
        self.canvas = RasterCanvas::new(width, height);
        self.sections.push(Section {
            title: "Visuals",
            elements: vec![PanelElement::Canvas],
        });
        self
    }

    /// BPM and key placeholders
    pub fn insights(mut self) -> Self {
        self.texts.insert(PanelElement::BpmField, PLACEHOLDER.to_string());
        self.texts.insert(PanelElement::KeyField, PLACEHOLDER.to_string());
        self.sections.push(Section {
            title: "Insights",
            elements: vec![PanelElement::BpmField, PanelElement::KeyField],
        });
        self
    }

    /// One solo button per band plus "Unsolo All"
    pub fn isolation(mut self, bands: &[Band]) -> Self {
        let mut elements = Vec::with_capacity(bands.len() + 1);
        for band in bands {
            let element = PanelElement::Solo(band.id);
            self.buttons.insert(element, Button::new("Solo"));
            self.band_labels.insert(band.id, band.label);
            elements.push(element);
        }
        self.buttons
            .insert(PanelElement::UnsoloAll, Button::new("Unsolo All"));
        elements.push(PanelElement::UnsoloAll);

        self.sections.push(Section {
            title: "Isolation",
            elements,
        });
        self
    }

    /// Loop sliders, time labels and buttons
    pub fn looping(mut self) -> Self {
        self.ranges
            .insert(PanelElement::LoopStartSlider, RangeInput::default());
        self.ranges
            .insert(PanelElement::LoopEndSlider, RangeInput::default());
        self.texts
            .insert(PanelElement::LoopStartTime, format_time(0.0));
        self.texts.insert(PanelElement::LoopEndTime, format_time(0.0));

        let mut toggle = Button::new(IDLE_LABEL);
        toggle.color = Some(IDLE_COLOR);
        self.buttons.insert(PanelElement::LoopToggle, toggle);
        self.buttons
            .insert(PanelElement::LoopReset, Button::new("Reset Loop"));

        self.sections.push(Section {
            title: "Looping",
            elements: vec![
                PanelElement::LoopStartTime,
                PanelElement::LoopStartSlider,
                PanelElement::LoopEndSlider,
                PanelElement::LoopEndTime,
                PanelElement::LoopToggle,
                PanelElement::LoopReset,
            ],
        });
        self
    }

    /// Finish the panel; it starts hidden
    pub fn build(self) -> Panel {
        debug!("[PANEL] Built with {} sections", self.sections.len());
        Panel {
            visible: false,
            sections: self.sections,
            canvas: self.canvas,
            buttons: self.buttons,
            ranges: self.ranges,
            texts: self.texts,
            band_labels: self.band_labels,
            notices: Vec::new(),
        }
    }
}

impl Default for PanelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Panel
// ============================================================================

/// The control panel
#[derive(Debug)]
pub struct Panel {
    visible: bool,
    sections: Vec<Section>,
    canvas: RasterCanvas,
    buttons: BTreeMap<PanelElement, Button>,
    ranges: BTreeMap<PanelElement, RangeInput>,
    texts: BTreeMap<PanelElement, String>,
    band_labels: BTreeMap<BandId, &'static str>,
    notices: Vec<String>,
}

impl Panel {
    /// The full panel with every section
    pub fn standard(bands: &[Band], canvas_width: u32, canvas_height: u32) -> Self {
        PanelBuilder::new()
            .visuals(canvas_width, canvas_height)
            .insights()
            .isolation(bands)
            .looping()
            .build()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Whether the element exists on this panel
    pub fn contains(&self, element: PanelElement) -> bool {
        self.sections
            .iter()
            .any(|s| s.elements.contains(&element))
            || element == PanelElement::Close
    }

    pub fn canvas(&self) -> &RasterCanvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut RasterCanvas {
        &mut self.canvas
    }

    pub fn button(&self, element: PanelElement) -> Option<&Button> {
        self.buttons.get(&element)
    }

    pub fn range(&self, element: PanelElement) -> Option<&RangeInput> {
        self.ranges.get(&element)
    }

    pub fn text(&self, element: PanelElement) -> Option<&str> {
        self.texts.get(&element).map(String::as_str)
    }

    /// Highlight exactly the given band's solo button, or none
    pub fn highlight_solo(&mut self, soloed: Option<BandId>) {
        for (element, button) in self.buttons.iter_mut() {
            if let PanelElement::Solo(id) = element {
                button.active = soloed == Some(*id);
            } else if *element == PanelElement::UnsoloAll {
                button.active = false;
            }
        }
    }

    /// Solo button currently highlighted
    pub fn highlighted_solo(&self) -> Option<BandId> {
        self.buttons.iter().find_map(|(element, button)| match element {
            PanelElement::Solo(id) if button.active => Some(*id),
            _ => None,
        })
    }

    /// Mirror the loop controller into the sliders, labels and loop button
    pub fn sync_loop(&mut self, looper: &LoopController) {
        let range = looper.range();
        let max = looper.max();

        if let Some(slider) = self.ranges.get_mut(&PanelElement::LoopStartSlider) {
            *slider = RangeInput {
                min: 0.0,
                max,
                value: range.start,
            };
        }
        if let Some(slider) = self.ranges.get_mut(&PanelElement::LoopEndSlider) {
            *slider = RangeInput {
                min: 0.0,
                max,
                value: range.end,
            };
        }
        self.texts
            .insert(PanelElement::LoopStartTime, looper.start_label());
        self.texts
            .insert(PanelElement::LoopEndTime, looper.end_label());

        if let Some(button) = self.buttons.get_mut(&PanelElement::LoopToggle) {
            button.label = looper.button_label().to_string();
            button.color = Some(looper.button_color());
        }
    }

    /// Show a blocking notice to the user
    pub fn alert(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("[PANEL] Alert: {}", message);
        self.notices.push(message);
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Dismiss and return all notices
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    fn describe(&self, element: PanelElement) -> String {
        match element {
            PanelElement::Canvas => format!("[canvas {}x{}]", self.canvas.width(), self.canvas.height()),
            PanelElement::BpmField => format!("BPM: {}", self.text(element).unwrap_or(PLACEHOLDER)),
            PanelElement::KeyField => format!("Key: {}", self.text(element).unwrap_or(PLACEHOLDER)),
            PanelElement::Solo(id) => {
                let label = self.band_labels.get(&id).copied().unwrap_or(id.as_str());
                let marker = if self.button(element).is_some_and(|b| b.active) {
                    "*"
                } else {
                    " "
                };
                format!("{} [{}Solo]", label, marker)
            }
            PanelElement::LoopStartSlider | PanelElement::LoopEndSlider => {
                let slider = self.range(element).copied().unwrap_or_default();
                format!("<{:.1} / {:.1}>", slider.value, slider.max)
            }
            PanelElement::LoopStartTime | PanelElement::LoopEndTime => {
                self.text(element).unwrap_or_default().to_string()
            }
            _ => match self.button(element) {
                Some(button) => format!("[{}]", button.label),
                None => String::new(),
            },
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visibility = if self.visible { "" } else { " (hidden)" };
        writeln!(f, "{}{}", PANEL_TITLE, visibility)?;
        for section in &self.sections {
            writeln!(f, "  {}", section.title)?;
            for &element in &section.elements {
                writeln!(f, "    {}", self.describe(element))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::BANDS;
    use pretty_assertions::assert_eq;

    fn panel() -> Panel {
        Panel::standard(&BANDS, 300, 100)
    }

    #[test]
    fn test_panel_starts_hidden() {
        let mut panel = panel();
        assert!(!panel.is_visible());
        panel.show();
        assert!(panel.is_visible());
    }

    #[test]
    fn test_standard_layout() {
        let panel = panel();
        let titles: Vec<&str> = panel.sections().iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Visuals", "Insights", "Isolation", "Looping"]);

        for id in BandId::ALL {
            assert!(panel.contains(PanelElement::Solo(id)));
        }
        assert!(panel.contains(PanelElement::Close));
        assert_eq!(panel.text(PanelElement::BpmField), Some("--"));
        assert_eq!(panel.text(PanelElement::KeyField), Some("--"));
        assert_eq!(
            panel.button(PanelElement::LoopToggle).map(|b| b.label.as_str()),
            Some("Set Loop & Play")
        );
    }

    #[test]
    fn test_highlight_is_exclusive() {
        let mut panel = panel();
        panel.highlight_solo(Some(BandId::Mid));
        assert_eq!(panel.highlighted_solo(), Some(BandId::Mid));

        panel.highlight_solo(Some(BandId::High));
        let active = BandId::ALL
            .iter()
            .filter(|&&id| panel.button(PanelElement::Solo(id)).is_some_and(|b| b.active))
            .count();
        assert_eq!(active, 1);

        panel.highlight_solo(None);
        assert_eq!(panel.highlighted_solo(), None);
    }

    #[test]
    fn test_sync_loop_updates_labels() {
        let mut panel = panel();
        let mut looper = LoopController::new(100.0);
        looper.on_duration_known(125.0);
        looper.set_start(65.0);
        panel.sync_loop(&looper);

        assert_eq!(panel.text(PanelElement::LoopStartTime), Some("1:05"));
        assert_eq!(panel.text(PanelElement::LoopEndTime), Some("2:05"));
        assert_eq!(
            panel.range(PanelElement::LoopEndSlider),
            Some(&RangeInput {
                min: 0.0,
                max: 125.0,
                value: 125.0
            })
        );
    }

    #[test]
    fn test_alerts_are_collected() {
        let mut panel = panel();
        panel.alert("End time must be greater than start time for looping.");
        assert_eq!(panel.take_notices().len(), 1);
        assert!(panel.notices().is_empty());
    }

    #[test]
    fn test_display_lists_bands() {
        let mut panel = panel();
        panel.highlight_solo(Some(BandId::Low));
        let text = panel.to_string();
        assert!(text.starts_with("Dissect-A-Song (hidden)"));
        assert!(text.contains("Lows (<200Hz) [*Solo]"));
        assert!(text.contains("Highs (>8kHz) [ Solo]"));
    }
}
