//! Sweep an SG90-style servo on GPIO 2 back and forth.
//!
//! Demonstrates both motion modes: a timer-driven sweep that returns
//! immediately while the pool lends a channel, and a blocking sweep that
//! holds the calling task for the travel.
//!
//! Build from an ESP-IDF environment, e.g.:
//!
//! ```bash
//! cargo build -p strophe-esp32 --example sweep --features esp32
//! ```

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::FromValueType;
use esp_idf_svc::log::EspLogger;

use strophe_core::calibration::Calibration;
use strophe_core::pool::TimerPool;
use strophe_core::servo::Servo;
use strophe_esp32::{EspTimers, LedcPwm};

static POOL: TimerPool = TimerPool::new();

fn main() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    let peripherals = Peripherals::take()?;
    let timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default()
            .frequency(50.Hz())
            .resolution(Resolution::Bits10),
    )?;
    let channel = LedcDriver::new(peripherals.ledc.channel0, &timer, peripherals.pins.gpio2)?;

    let timers: &'static EspTimers = Box::leak(Box::new(EspTimers::new()?));
    let servo: &'static Servo<_, _> = Box::leak(Box::new(Servo::new(
        LedcPwm::new(channel, 50),
        Calibration::default(),
        0,
        &POOL,
        timers,
    )));

    // Timer-driven sweep: returns immediately.
    servo.sweep(180, 60).expect("no free timer channel");
    while !servo.goal_reached() {
        FreeRtos::delay_ms(100);
    }
    log::info!("reached {}", servo.current_angle());

    // Blocking sweep back at twice the speed.
    let mut delay = FreeRtos;
    servo
        .sweep_blocking(0, 120, &mut delay)
        .expect("target within calibration");
    log::info!("reached {}", servo.current_angle());

    servo.stop();
    Ok(())
}
