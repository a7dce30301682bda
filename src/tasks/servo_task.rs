//! Servo output: turns engine frames into PCA9685 pulse widths.
//!
//! Legs 0-4 sit on the first board (I2C0), leg 5 on the second (I2C1). Every write is
//! bounded by a timeout and failures are only logged; the next frame retries.
use embassy_time::{with_timeout, Duration};
use esp_hal::{i2c::master::I2c, Async};
use log::{error, info};
use pwm_pca9685::{Channel, Pca9685};

use super::motion_task::SERVO_FRAME;
use crate::config::{I2C_TIMEOUT_MS, PCA_PRESCALE};
use crate::kinematics::conversion::{angle_to_ticks, servo_channel};
use crate::robot::{
    commands::{ServoFrame, Torque},
    joint::Joint,
    leg::Leg,
};

pub type ServoBoard = Pca9685<I2c<'static, Async>>;

static SERVO_CHANNEL_MAP: [Channel; 16] = [
    Channel::C0,
    Channel::C1,
    Channel::C2,
    Channel::C3,
    Channel::C4,
    Channel::C5,
    Channel::C6,
    Channel::C7,
    Channel::C8,
    Channel::C9,
    Channel::C10,
    Channel::C11,
    Channel::C12,
    Channel::C13,
    Channel::C14,
    Channel::C15,
];

/// Both boards plus the last tick value written on each channel.
/// `None` means the channel is not driven.
struct ServoBus {
    boards: [ServoBoard; 2],
    written: [[Option<u16>; 16]; 2],
}

impl ServoBus {
    async fn apply(&mut self, frame: &ServoFrame) {
        match frame.torque {
            Torque::Hold => self.write(frame).await,
            Torque::Release => self.release().await,
        }
    }

    async fn write(&mut self, frame: &ServoFrame) {
        let timeout = Duration::from_millis(I2C_TIMEOUT_MS);
        for leg in Leg::ALL {
            for joint in Joint::ALL {
                let ticks = angle_to_ticks(frame.angles[leg][joint]);
                let (board, channel) = servo_channel(leg, joint);
                let slot = &mut self.written[board][channel as usize];
                if *slot == Some(ticks) {
                    continue;
                }
                let pwm = &mut self.boards[board];
                let result = with_timeout(
                    timeout,
                    pwm.set_channel_on_off(SERVO_CHANNEL_MAP[channel as usize], 0, ticks),
                )
                .await;
                match result {
                    Ok(Ok(())) => *slot = Some(ticks),
                    Ok(Err(e)) => error!("[SERVO_TASK] {leg} {joint} write failed: {e:?}"),
                    Err(_) => error!("[SERVO_TASK] {leg} {joint} write timed out"),
                }
            }
        }
    }

    async fn release(&mut self) {
        let timeout = Duration::from_millis(I2C_TIMEOUT_MS);
        for (board, pwm) in self.boards.iter_mut().enumerate() {
            if self.written[board].iter().all(Option::is_none) {
                continue;
            }
            match with_timeout(timeout, pwm.set_channel_full_off(Channel::All)).await {
                Ok(Ok(())) => {
                    info!("[SERVO_TASK] board {board} released");
                    self.written[board] = [None; 16];
                }
                Ok(Err(e)) => error!("[SERVO_TASK] board {board} release failed: {e:?}"),
                Err(_) => error!("[SERVO_TASK] board {board} release timed out"),
            }
        }
    }
}

#[embassy_executor::task]
pub async fn servo_task(mut first: ServoBoard, mut second: ServoBoard) {
    for pwm in [&mut first, &mut second] {
        pwm.set_prescale(PCA_PRESCALE)
            .await
            .expect("Fail configurating pca driver");
        pwm.enable().await.expect("Fail enabling the pca driver");
    }
    info!("[SERVO_TASK] servo boards ready");

    let mut bus = ServoBus {
        boards: [first, second],
        written: [[None; 16]; 2],
    };
    loop {
        let frame = SERVO_FRAME.wait().await;
        bus.apply(&frame).await;
    }
}
