//! Interrupt-driven software quadrature decoder for ESP32.
//!
//! The ESP32-C3 has no pulse counter peripheral, so both encoder channels
//! raise a GPIO interrupt on every edge and the handler decodes the A/B state
//! change into a free-running 16-bit counter that wraps like a hardware timer
//! in encoder mode.
//!
//! No thread is involved: the control loop reads the count through a
//! cloneable [`Esp32CounterHandle`]. Two edges closer together than the GPIO
//! interrupt latency (a few microseconds) read as one invalid double step and
//! count as 0, so the maximum edge rate is the inverse of that latency, in the
//! order of 100k edges per second per encoder.

use alloc::sync::Arc;
use core::ffi::c_void;
use core::sync::atomic::{AtomicI16, AtomicU8, Ordering};

use crate::traits::QuadratureCounter;
use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver, Pull};
use esp_idf_hal::sys::{
    esp, esp_err_t, gpio_get_level, gpio_install_isr_service, gpio_int_type_t_GPIO_INTR_ANYEDGE,
    gpio_intr_enable, gpio_isr_handler_add, gpio_isr_handler_remove, gpio_set_intr_type,
    EspError, ESP_ERR_INVALID_STATE,
};

/// Count change for each (previous AB, current AB) pair, indexed by
/// `(prev << 2) | curr`. Invalid double transitions count as 0.
const TRANSITIONS: [i8; 16] = [0, 1, -1, 0, -1, 0, 0, 1, 1, 0, 0, -1, 0, -1, 1, 0];

/// State shared between the edge interrupt and the readers.
struct Channels {
    pin_a: i32,
    pin_b: i32,
    last_state: AtomicU8,
    count: AtomicI16,
}

impl Channels {
    fn read_state(&self) -> u8 {
        // SAFETY: level reads only touch the GPIO input register
        let (a, b) = unsafe { (gpio_get_level(self.pin_a), gpio_get_level(self.pin_b)) };
        (u8::from(a != 0) << 1) | u8::from(b != 0)
    }

    fn on_edge(&self) {
        let state = self.read_state();
        let last = self.last_state.swap(state, Ordering::Relaxed);
        let step = TRANSITIONS[usize::from((last << 2) | state)];
        if step != 0 {
            // Single writer: GPIO interrupts are serviced one at a time
            let count = self.count.load(Ordering::Relaxed);
            self.count
                .store(count.wrapping_add(i16::from(step)), Ordering::Relaxed);
        }
    }
}

unsafe extern "C" fn edge_isr(arg: *mut c_void) {
    // SAFETY: `arg` is the reference leaked in `Esp32Quadrature::new`, released
    // only after both handlers are removed
    let channels = &*(arg as *const Channels);
    channels.on_edge();
}

/// Quadrature decoder over two GPIO inputs.
///
/// Decoding runs for as long as this value is alive; dropping it detaches the
/// interrupt handlers.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::gpio::IOPin;
/// use rs_twinmotor::hal::esp32::Esp32Quadrature;
///
/// let decoder = Esp32Quadrature::new(
///     peripherals.pins.gpio0.downgrade(),
///     peripherals.pins.gpio1.downgrade(),
/// )?;
/// let counter = decoder.handle();
/// ```
pub struct Esp32Quadrature<'d> {
    _a: PinDriver<'d, AnyIOPin, Input>,
    _b: PinDriver<'d, AnyIOPin, Input>,
    channels: Arc<Channels>,
}

impl<'d> Esp32Quadrature<'d> {
    /// Configures both channels with pull-ups and attaches the edge handlers.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO or interrupt setup fails.
    pub fn new(a: AnyIOPin, b: AnyIOPin) -> Result<Self, EspError> {
        let mut a = PinDriver::input(a)?;
        let mut b = PinDriver::input(b)?;
        a.set_pull(Pull::Up)?;
        b.set_pull(Pull::Up)?;

        let channels = Arc::new(Channels {
            pin_a: a.pin(),
            pin_b: b.pin(),
            last_state: AtomicU8::new(0),
            count: AtomicI16::new(0),
        });
        channels
            .last_state
            .store(channels.read_state(), Ordering::Relaxed);

        // Shared with any other driver that already installed it
        // SAFETY: plain FFI call with no pointer arguments
        let installed: esp_err_t = unsafe { gpio_install_isr_service(0) };
        if installed != ESP_ERR_INVALID_STATE as esp_err_t {
            esp!(installed)?;
        }

        // One strong reference for both handlers; returned in `drop`
        let arg = Arc::into_raw(Arc::clone(&channels)) as *mut c_void;
        let decoder = Self {
            _a: a,
            _b: b,
            channels,
        };

        for pin in [decoder.channels.pin_a, decoder.channels.pin_b] {
            // SAFETY: `arg` outlives the handler, see `drop`
            unsafe {
                esp!(gpio_set_intr_type(pin, gpio_int_type_t_GPIO_INTR_ANYEDGE))?;
                esp!(gpio_isr_handler_add(pin, Some(edge_isr), arg))?;
                esp!(gpio_intr_enable(pin))?;
            }
        }

        Ok(decoder)
    }

    /// A reader for the control loop.
    pub fn handle(&self) -> Esp32CounterHandle {
        Esp32CounterHandle {
            channels: Arc::clone(&self.channels),
        }
    }
}

impl Drop for Esp32Quadrature<'_> {
    fn drop(&mut self) {
        for pin in [self.channels.pin_a, self.channels.pin_b] {
            // SAFETY: removing a handler that was never added is a no-op error
            unsafe {
                gpio_isr_handler_remove(pin);
            }
        }
        // SAFETY: no handler holds the leaked reference any more
        unsafe { Arc::decrement_strong_count(Arc::as_ptr(&self.channels)) };
    }
}

/// Read side of an [`Esp32Quadrature`].
#[derive(Clone)]
pub struct Esp32CounterHandle {
    channels: Arc<Channels>,
}

impl QuadratureCounter for Esp32CounterHandle {
    fn raw_count(&mut self) -> i16 {
        self.channels.count.load(Ordering::Relaxed)
    }
}
