//! ESP32 clock implementation using the ESP-IDF timer.

use crate::traits::Clock;

/// ESP32 clock using the hardware timer.
///
/// Provides millisecond-resolution timing using the ESP-IDF `esp_timer_get_time()`
/// function, which returns microseconds since boot. The control thread paces
/// its ticks against it.
///
/// # Example
///
/// ```ignore
/// use rs_twinmotor::hal::esp32::Esp32Clock;
/// use rs_twinmotor::traits::Clock;
/// use rs_twinmotor::TICK_PERIOD_MS;
///
/// let clock = Esp32Clock::new();
/// let mut next_tick = clock.now_ms() + u64::from(TICK_PERIOD_MS);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates a new ESP32 clock instance.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        // Plain read of the boot-relative microsecond timer
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        (micros / 1000) as u64
    }
}
