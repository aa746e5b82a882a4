//! Hardware adapter — sensors and the LED strip behind port traits.
//!
//! This is the only module that would touch real peripherals.  On
//! non-espidf targets both halves run as simulations: the light sensor
//! oscillates through its ADC range so a demo crosses the threshold on
//! its own, and the strip keeps an inspectable framebuffer.

#[cfg(not(target_os = "espidf"))]
use log::debug;

use crate::app::ports::{RenderPort, SensorPort};
use crate::metric::{Category, Room};

// ───────────────────────────────────────────────────────────────
// Sensors (source role)
// ───────────────────────────────────────────────────────────────

const ADC_MAX: u16 = 4095;

/// LDR + optional humidity sensor.
pub struct HouseSensors {
    humidity: Option<f32>,
    #[cfg(not(target_os = "espidf"))]
    sim_step: u16,
}

impl HouseSensors {
    /// No humidity sensor fitted (the common deployment).
    pub fn new() -> Self {
        Self {
            humidity: None,
            #[cfg(not(target_os = "espidf"))]
            sim_step: 0,
        }
    }

    /// With a humidity sensor reporting around `rh` %RH.
    pub fn with_humidity(rh: f32) -> Self {
        Self {
            humidity: Some(rh),
            ..Self::new()
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_read_light(&mut self) -> u16 {
        // ESP-IDF oneshot ADC read of the LDR divider.
        //
        // The full wiring requires:
        // 1. AdcDriver::new(peripherals.adc1)
        // 2. AdcChannelDriver::new(&adc, peripherals.pins.gpio4, &config)
        // 3. adc.read(&mut channel)
        //
        // Threaded in from main.rs once peripheral wiring lands.
        ADC_MAX / 2
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_read_light(&mut self) -> u16 {
        // Triangle wave over the full ADC range so a host demo crosses the
        // bright threshold periodically.
        self.sim_step = self.sim_step.wrapping_add(64);
        let phase = self.sim_step % (2 * ADC_MAX);
        if phase > ADC_MAX {
            2 * ADC_MAX - phase
        } else {
            phase
        }
    }
}

impl Default for HouseSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for HouseSensors {
    fn read_light_adc(&mut self) -> u16 {
        self.platform_read_light()
    }

    fn read_humidity(&mut self) -> Option<f32> {
        self.humidity
    }
}

// ───────────────────────────────────────────────────────────────
// LED strip (sink role)
// ───────────────────────────────────────────────────────────────

/// 8-bit RGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

const LED_COUNT: usize = 16;
const STUBE_RANGE: core::ops::Range<usize> = 0..8;
const WC_RANGE: core::ops::Range<usize> = 8..16;

const OFFLINE_GRAY: Rgb = Rgb(10, 10, 10);
const BRIGHT_YELLOW: Rgb = Rgb(255, 255, 0);
const DARK_OFF: Rgb = Rgb(0, 0, 0);
const WET_BLUE: Rgb = Rgb(0, 0, 255);
const DRY_ORANGE: Rgb = Rgb(255, 165, 0);

/// One strip spanning both rooms, addressed by range.
pub struct LedStrip {
    pixels: [Rgb; LED_COUNT],
}

impl LedStrip {
    pub fn new() -> Self {
        Self {
            pixels: [DARK_OFF; LED_COUNT],
        }
    }

    /// Framebuffer view, for tests and the host demo.
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    fn fill(&mut self, range: core::ops::Range<usize>, color: Rgb) {
        for pixel in &mut self.pixels[range] {
            *pixel = color;
        }
        self.platform_flush();
    }

    #[cfg(target_os = "espidf")]
    fn platform_flush(&mut self) {
        // WS2812 output over RMT.
        //
        // The full wiring requires:
        // 1. TxRmtDriver::new(peripherals.rmt.channel0, peripherals.pins.gpio8, &config)
        // 2. encode self.pixels as GRB pulse trains
        // 3. driver.start_blocking(&signal)
        //
        // Threaded in from main.rs once peripheral wiring lands.
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_flush(&mut self) {
        debug!("led(sim): {:?}", self.pixels);
    }
}

impl Default for LedStrip {
    fn default() -> Self {
        Self::new()
    }
}

fn room_range(room: Room) -> core::ops::Range<usize> {
    match room {
        Room::Stube => STUBE_RANGE,
        Room::Wc => WC_RANGE,
    }
}

fn category_color(category: Category) -> Rgb {
    match category {
        Category::Bright => BRIGHT_YELLOW,
        Category::Dark => DARK_OFF,
        Category::Wet => WET_BLUE,
        Category::Dry => DRY_ORANGE,
    }
}

impl RenderPort for LedStrip {
    fn apply(&mut self, room: Room, category: Category) {
        self.fill(room_range(room), category_color(category));
    }

    fn offline(&mut self) {
        self.fill(0..LED_COUNT, OFFLINE_GRAY);
    }
}
