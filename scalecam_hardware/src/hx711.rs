use std::time::Duration;

use rppal::gpio::{Gpio, InputPin, OutputPin};
use scalecam_traits::{BoxError, LoadCellAdc};
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::wait_until_ready;

/// HX711 bridge amplifier on two GPIO lines.
///
/// `is_ready` is a single level check. `read_raw` waits for DT to drop,
/// since averaged reads ask for several conversions back to back.
pub struct Hx711 {
    dt: InputPin,
    sck: OutputPin,
    gain_pulses: u8, // 25, 26, 27 based on gain/channel
}

// At 10 SPS a conversion takes ~100 ms.
const DATA_READY_TIMEOUT: Duration = Duration::from_millis(150);

impl Hx711 {
    pub fn open(dt_pin: u8, sck_pin: u8, gain_pulses: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let dt = gpio
            .get(dt_pin)
            .map_err(|e| HwError::Gpio(format!("open hx711 dt pin {dt_pin}: {e}")))?
            .into_input();
        let mut sck = gpio
            .get(sck_pin)
            .map_err(|e| HwError::Gpio(format!("open hx711 sck pin {sck_pin}: {e}")))?
            .into_output();
        sck.set_low(); // clock idle low
        Ok(Self {
            dt,
            sck,
            gain_pulses,
        })
    }

    fn clock_in(&mut self) -> i32 {
        let mut value: i32 = 0;
        for _ in 0..24 {
            self.sck.set_high();
            spin_delay_100ns();
            value = (value << 1) | i32::from(self.dt.is_high());
            self.sck.set_low();
            spin_delay_100ns();
        }

        // Extra pulses select gain/channel for the next conversion.
        for _ in 0..self.gain_pulses.saturating_sub(24) {
            self.sck.set_high();
            spin_delay_100ns();
            self.sck.set_low();
            spin_delay_100ns();
        }

        if (value & 0x80_0000) != 0 {
            value |= !0xFF_FFFF;
        }
        value
    }
}

impl LoadCellAdc for Hx711 {
    fn is_ready(&mut self) -> bool {
        self.dt.is_low()
    }

    fn read_raw(&mut self) -> std::result::Result<i32, BoxError> {
        let dt = &self.dt;
        wait_until_ready(
            || dt.is_low(),
            DATA_READY_TIMEOUT,
            Duration::from_micros(500),
        )?;
        let raw = self.clock_in();
        trace!(raw, "hx711 raw read");
        Ok(raw)
    }
}

#[inline(always)]
fn spin_delay_100ns() {
    std::hint::spin_loop();
}
