#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

extern crate alloc;

use alloc::boxed::Box;
use core::future::pending;
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, StackResources};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use hexapod_robot::config::{I2C_FREQUENCY_KHZ, LINKCMD_CHANNEL_SIZE};
use hexapod_robot::robot::{commands::LinkCommand, flash::FlashStore};
use hexapod_robot::tasks::motion_task::motion_task;
use hexapod_robot::tasks::net_task::{configurate_and_start_wifi, net_task, runner_task};
use hexapod_robot::tasks::servo_task::servo_task;
use log::info;
use pwm_pca9685::Pca9685;

esp_bootloader_esp_idf::esp_app_desc!();

// I2C0: SDA 21, SCL 22 -> PCA9685 0x40 (legs 0-4)
// I2C1: SDA 18, SCL 19 -> PCA9685 0x41 (leg 5)

static LINK_CHANNEL: Channel<CriticalSectionRawMutex, LinkCommand, LINKCMD_CHANNEL_SIZE> =
    Channel::new();

macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        STATIC_CELL.init_with(|| $val)
    }};
}

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger_from_env();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let p = esp_hal::init(config);

    esp_alloc::heap_allocator!(size: 32 * 1024);
    esp_alloc::heap_allocator!(#[unsafe(link_section = ".dram2_uninit")] size: 96 * 1024);

    let timer0 = TimerGroup::new(p.TIMG1);
    esp_hal_embassy::init(timer0.timer0);

    // servo boards
    let i2c_config = I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ));
    let i2c0 = I2c::new(p.I2C0, i2c_config)
        .expect("Failed to initialize I2C0")
        .with_sda(p.GPIO21)
        .with_scl(p.GPIO22)
        .into_async();
    let i2c1 = I2c::new(p.I2C1, i2c_config)
        .expect("Failed to initialize I2C1")
        .with_sda(p.GPIO18)
        .with_scl(p.GPIO19)
        .into_async();
    let first_board = Pca9685::new(i2c0, (false, false, false, false, false, false))
        .expect("Failed to create the first pca driver");
    let second_board = Pca9685::new(i2c1, (false, false, false, false, false, true))
        .expect("Failed to create the second pca driver");

    // take important peripherals
    let mut rng = esp_hal::rng::Rng::new(p.RNG);
    let timer1 = TimerGroup::new(p.TIMG0);
    let wifi_init = esp_wifi::init(timer1.timer0, rng, p.RADIO_CLK)
        .expect("Failed to initialize WIFI controller");
    let wifi_init = Box::leak(Box::new(wifi_init));
    let (mut wifi_controller, interfaces) =
        esp_wifi::wifi::new(wifi_init, p.WIFI).expect("Failed to initialize WIFI controller");

    // Get the embassy net stack up and working.
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;
    let config = NetConfig::dhcpv4(Default::default());
    let device = interfaces.sta;
    let (stack, runner) = embassy_net::new(
        device,
        config,
        mk_static!(StackResources<3>, StackResources::new()),
        seed,
    );

    info!("Starting hexapod...");
    spawner
        .spawn(servo_task(first_board, second_board))
        .expect("Fail spawning servo task");
    spawner
        .spawn(motion_task(LINK_CHANNEL.receiver(), FlashStore::new()))
        .expect("Fail spawning motion task");

    configurate_and_start_wifi(&mut wifi_controller).await;
    spawner
        .spawn(runner_task(runner))
        .expect("Fail spawning runner task");
    spawner
        .spawn(net_task(stack, LINK_CHANNEL.sender()))
        .expect("Fail spawning net task");

    loop {
        pending::<()>().await;
    }
}
