//! FM Radio Clock Main Application
//!
//! Entry point for the STM32G474-based FM clock firmware.
//! Brings up the tuner and display, then spawns the input, interrupt,
//! timer and event-loop tasks around one shared [`Clock`].

#![no_std]
#![no_main]

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Blocking;
use embassy_stm32::time::Hertz;
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Duration, Instant, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use fm_clock::alarm::{UptimeClock, WallClock};
use fm_clock::drivers::display::Display;
use fm_clock::drivers::encoder::{Button, Encoder};
use fm_clock::input::ButtonKind;
use fm_clock::persist::MemoryStore;
use fm_clock::prelude::*;
use fm_clock::radio::Radio;
use fm_clock::tuner::si4703::{self, Si4703};

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    I2C2_EV => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C2>;
    I2C2_ER => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C2>;
});

/// Tuner bus: blocking, so a whole register cycle runs without yielding
type TunerBus = I2c<'static, Blocking>;

/// Shared device state
type SharedClock = Mutex<CriticalSectionRawMutex, Clock<TunerBus>>;

/// Wall-clock reading at power-up
const BOOT_TIME: ClockTime = ClockTime::new(0, 12, 0, 0);

static EVENTS: EventQueue = EventQueue::new();
static TIMERS: TimerRequests = TimerRequests::new();
static WALL: UptimeClock = UptimeClock::new(BOOT_TIME);
static CLOCK: StaticCell<SharedClock> = StaticCell::new();

fn outbox() -> Outbox<'static> {
    Outbox::new(&EVENTS, &TIMERS)
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("FM Clock Firmware v{}", env!("CARGO_PKG_VERSION"));

    let config = embassy_stm32::Config::default();
    let mut p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    let led = Output::new(p.PA5, Level::Low, Speed::Low);

    // Select the tuner's 2-wire mode before I2C1 claims SDIO. The reset
    // pin stays driven high for the rest of the run.
    let mut tuner_reset = Output::new(p.PB7, Level::High, Speed::Low);
    {
        let mut sdio = Output::new(&mut p.PB9, Level::Low, Speed::Low);
        if si4703::reset(&mut tuner_reset, &mut sdio, &mut Delay).is_err() {
            warn!("tuner reset failed");
        }
    }

    let tuner_bus = I2c::new_blocking(p.I2C1, p.PB8, p.PB9, Hertz(I2C_FREQUENCY_HZ), Default::default());
    let mut tuner = Si4703::new(tuner_bus);
    match tuner.init(&mut Delay) {
        Ok(()) => info!("Si4703 initialized"),
        Err(e) => error!("Si4703 init failed: {}", e),
    }

    let display_bus = I2c::new(
        p.I2C2,
        p.PA9, // SCL
        p.PA8, // SDA
        Irqs,
        p.DMA1_CH1,
        p.DMA1_CH2,
        Hertz(400_000),
        Default::default(),
    );
    let mut display = Display::new(display_bus);
    if let Err(e) = display.init().await {
        error!("display init failed: {}", e);
    }

    let mut store = MemoryStore::new();
    let mut state = Clock::new(Radio::new(tuner));
    state.load(&mut store);
    let clock: &'static SharedClock = CLOCK.init(Mutex::new(state));

    let encoder = Encoder::new(
        ExtiInput::new(p.PA0, p.EXTI0, Pull::Up),
        Input::new(p.PA1, Pull::Up),
    );
    let rotary_button = Button::new(ExtiInput::new(p.PA2, p.EXTI2, Pull::Up), ButtonKind::Rotary);
    let side_button = Button::new(ExtiInput::new(p.PA3, p.EXTI3, Pull::Up), ButtonKind::Side);
    let tuner_irq = ExtiInput::new(p.PB6, p.EXTI6, Pull::Up);

    spawner.spawn(heartbeat_task(led)).unwrap();
    spawner.spawn(encoder_task(encoder)).unwrap();
    spawner.spawn(button_task(rotary_button)).unwrap();
    spawner.spawn(side_button_task(side_button)).unwrap();
    spawner.spawn(tuner_irq_task(tuner_irq, clock)).unwrap();
    spawner.spawn(alarm_task(clock)).unwrap();
    spawner.spawn(label_wait_task(clock)).unwrap();
    spawner.spawn(sleep_off_task(clock)).unwrap();
    spawner.spawn(ramp_task(clock)).unwrap();

    info!("Tasks spawned, entering event loop");
    event_loop(clock, display, store).await
}

/// Drain the event queue, redrawing after each event that changed the
/// screen and at least once a second for the clock
async fn event_loop(clock: &'static SharedClock, mut display: Display<'static>, mut store: MemoryStore) -> ! {
    loop {
        let event = match select(EVENTS.next(), Timer::after(Duration::from_secs(1))).await {
            Either::First(event) => Some(event),
            Either::Second(()) => None,
        };
        let now = WALL.now();
        let mut state = clock.lock().await;
        match event {
            Some(event) => {
                if let Err(e) = state.handle_event(event, outbox(), now, &mut store) {
                    error!("event dropped: {}", e);
                }
            }
            None => state.invalidate(),
        }
        if state.needs_redraw() {
            state.render(display.surface(), outbox(), now);
            drop(state);
            if let Err(e) = display.flush().await {
                warn!("display flush failed: {}", e);
            }
        }
    }
}

/// Encoder A edges to rotation events
#[embassy_executor::task]
async fn encoder_task(mut encoder: Encoder<'static>) {
    loop {
        let event = encoder.next_event().await;
        outbox().push(event);
    }
}

/// Rotary push button edges to push/release events
#[embassy_executor::task]
async fn button_task(mut button: Button<'static>) {
    loop {
        let event = button.next_event().await;
        outbox().push(event);
    }
}

/// Side button edges to push/release events
#[embassy_executor::task]
async fn side_button_task(mut button: Button<'static>) {
    loop {
        let event = button.next_event().await;
        outbox().push(event);
    }
}

/// Tuner GPIO2 line: refresh status and decode under the lock
#[embassy_executor::task]
async fn tuner_irq_task(mut irq: ExtiInput<'static>, clock: &'static SharedClock) {
    loop {
        irq.wait_for_falling_edge().await;
        if let Err(e) = clock.lock().await.handle_interrupt(outbox()) {
            error!("tuner interrupt: {}", e);
        }
    }
}

/// Alarm poll on each wall-clock second boundary
#[embassy_executor::task]
async fn alarm_task(clock: &'static SharedClock) {
    loop {
        Timer::at(Instant::from_secs(Instant::now().as_secs() + 1)).await;
        let now = WALL.now();
        match clock.lock().await.tick(&now, outbox()) {
            Ok(fired) => {
                for index in fired {
                    info!("alarm {} fired", index);
                }
            }
            Err(e) => error!("alarm poll: {}", e),
        }
    }
}

/// Label-wait timeouts; a newer request restarts the wait
#[embassy_executor::task]
async fn label_wait_task(clock: &'static SharedClock) {
    loop {
        let mut ticket = TIMERS.label_wait().await;
        loop {
            match select(Timer::after(Duration::from_millis(LABEL_WAIT_MS)), TIMERS.label_wait()).await {
                Either::First(()) => break,
                Either::Second(newer) => ticket = newer,
            }
        }
        if let Err(e) = clock.lock().await.label_timeout(ticket, outbox()) {
            error!("label timeout: {}", e);
        }
    }
}

/// Sleep-off countdown; a newer request restarts it
#[embassy_executor::task]
async fn sleep_off_task(clock: &'static SharedClock) {
    loop {
        let (mut ticket, mut minutes) = TIMERS.sleep_off().await;
        loop {
            let countdown = Timer::after(Duration::from_secs(u64::from(minutes) * 60));
            match select(countdown, TIMERS.sleep_off()).await {
                Either::First(()) => break,
                Either::Second((newer, newer_minutes)) => {
                    ticket = newer;
                    minutes = newer_minutes;
                }
            }
        }
        let mut state = clock.lock().await;
        if let Err(e) = state.sleep_expired(ticket) {
            error!("sleep off: {}", e);
        }
    }
}

/// Volume ramp steps until the radio reports the ramp finished
#[embassy_executor::task]
async fn ramp_task(clock: &'static SharedClock) {
    loop {
        let mut ticket = TIMERS.ramp().await;
        loop {
            match select(Timer::after(Duration::from_millis(RAMP_STEP_MS)), TIMERS.ramp()).await {
                Either::First(()) => match clock.lock().await.ramp_step(ticket) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        error!("ramp: {}", e);
                        break;
                    }
                },
                Either::Second(newer) => ticket = newer,
            }
        }
    }
}

/// Heartbeat task - blinks LED to show system is running
#[embassy_executor::task]
async fn heartbeat_task(mut led: Output<'static>) {
    loop {
        led.set_high();
        Timer::after(Duration::from_millis(100)).await;
        led.set_low();
        Timer::after(Duration::from_millis(900)).await;
    }
}
