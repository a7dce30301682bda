//! Control loop of the hexapod.
//!
//! Drains link commands, decides whether the operator is still connected, ticks the
//! gait engine and hands the resulting frame to the servo task.
use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::{
    blocking_mutex::{raw::CriticalSectionRawMutex, Mutex},
    channel::Receiver,
    signal::Signal,
};
use embassy_time::{Duration, Instant, Ticker};
use log::{info, warn};

use crate::config::{LINKCMD_CHANNEL_SIZE, TELEMETRY_LOG_PERIOD_MS, TICK_PERIOD_MS};
use crate::motion::GaitEngine;
use crate::robot::{
    calibration::OffsetStore,
    commands::{LinkCommand, ServoFrame},
    config::EngineConfig,
    flash::FlashStore,
    link::LinkMonitor,
    state::Telemetry,
};

/// Latest frame for the servo task; a newer frame replaces an unread one.
pub static SERVO_FRAME: Signal<CriticalSectionRawMutex, ServoFrame> = Signal::new();

/// Last published telemetry snapshot, read by the link for status replies.
pub static TELEMETRY: Mutex<CriticalSectionRawMutex, Cell<Option<Telemetry>>> =
    Mutex::new(Cell::new(None));

/// Lines the link could not parse.
pub static LINK_FRAME_ERRORS: AtomicU32 = AtomicU32::new(0);

pub fn telemetry() -> Option<Telemetry> {
    TELEMETRY.lock(|cell| cell.get())
}

#[embassy_executor::task]
pub async fn motion_task(
    link_receiver: Receiver<'static, CriticalSectionRawMutex, LinkCommand, LINKCMD_CHANNEL_SIZE>,
    store: FlashStore,
) {
    let mut engine = GaitEngine::new(EngineConfig::default(), store)
        .expect("[MOTION_TASK] invalid gait table");
    let mut link = LinkMonitor::default();
    let mut ticker = Ticker::every(Duration::from_millis(TICK_PERIOD_MS));
    let mut last_tick = Instant::now();
    let mut last_log = last_tick;
    info!("[MOTION_TASK] running at {} ms per tick", TICK_PERIOD_MS);

    loop {
        while let Ok(cmd) = link_receiver.try_receive() {
            handle_command(&mut engine, &mut link, cmd);
        }

        let now = Instant::now();
        let dt = (now - last_tick).as_micros() as f32 / 1_000_000.0;
        last_tick = now;

        let frame = engine.tick(&link.current(now.as_millis()), dt);
        SERVO_FRAME.signal(frame);

        let telemetry = Telemetry {
            link_frame_errors: LINK_FRAME_ERRORS.load(Ordering::Relaxed),
            ..engine.telemetry()
        };
        TELEMETRY.lock(|cell| cell.set(Some(telemetry)));
        if now - last_log >= Duration::from_millis(TELEMETRY_LOG_PERIOD_MS) {
            info!("[MOTION_TASK] {telemetry}");
            last_log = now;
        }

        ticker.next().await;
    }
}

fn handle_command<S: OffsetStore>(
    engine: &mut GaitEngine<S>,
    link: &mut LinkMonitor,
    cmd: LinkCommand,
) {
    let stamp = "[MOTION_TASK] received";
    match cmd {
        LinkCommand::Intent(intent) => link.receive(intent, Instant::now().as_millis()),
        LinkCommand::AdjustOffset { leg, joint, delta } => {
            match engine.adjust_offset(leg, joint, delta) {
                Ok(offset) => info!("{stamp} offset {leg} {joint} -> {offset:.1}"),
                Err(e) => warn!("{stamp} offset {leg} {joint} rejected: {e}"),
            }
        }
        LinkCommand::ResetOffsets => match engine.reset_offsets() {
            Ok(()) => info!("{stamp} offsets reset"),
            Err(e) => warn!("{stamp} offset reset rejected: {e}"),
        },
        LinkCommand::Quit => {
            info!("{stamp} link closed");
            link.close();
        }
        // answered by the link from the published snapshot
        LinkCommand::Status => {}
    }
}
