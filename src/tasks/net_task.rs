//! Networking and TCP command link task.
//!
//! Manages the WiFi connection, listens for one operator at a time, assembles
//! newline terminated commands, parses them, and forwards them to the motion task.
//! Status requests are answered here from the published telemetry.
extern crate alloc;

use alloc::string::String;
use core::fmt::Write as _;
use core::sync::atomic::Ordering;

use embassy_net::{tcp::TcpSocket, IpListenEndpoint, Stack};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Sender};
use embassy_time::Timer;
use embedded_io_async::Write;
use esp_wifi::wifi::{ClientConfiguration, WifiController, WifiDevice};
use heapless::Vec;
use log::{error, info, warn};

use super::motion_task::{telemetry, LINK_FRAME_ERRORS};
use crate::config::{LINKCMD_CHANNEL_SIZE, MAX_LINE_LEN, PORT, RX_BUF_SIZE, TX_BUF_SIZE};
use crate::robot::commands::{LinkCommand, ParseCommandError};

pub type LinkSender = Sender<'static, CriticalSectionRawMutex, LinkCommand, LINKCMD_CHANNEL_SIZE>;

#[embassy_executor::task]
pub async fn runner_task(mut runner: embassy_net::Runner<'static, WifiDevice<'static>>) {
    runner.run().await;
}

#[embassy_executor::task]
pub async fn net_task(stack: Stack<'static>, cmd_sender: LinkSender) {
    let mut rx_buf = [0u8; RX_BUF_SIZE];
    let mut tx_buf = [0u8; TX_BUF_SIZE];

    while !stack.is_link_up() {
        Timer::after_millis(500).await;
    }
    stack.wait_config_up().await;

    if let Some(config) = stack.config_v4() {
        info!(
            "[NET_TASK] TCP server listening at address {}:{}",
            config.address, PORT
        );
    }

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buf, &mut tx_buf);

        match socket
            .accept(IpListenEndpoint {
                port: PORT,
                addr: None,
            })
            .await
        {
            Ok(_) => {
                info!("[NET_TASK] client connected");
                handle_connection(&mut socket, &cmd_sender).await;
                // the motion task treats the intent as stale from now on
                cmd_sender.send(LinkCommand::Quit).await;
                socket.close();
                info!("[NET_TASK] client disconnected");
            }
            Err(e) => {
                error!("[NET_TASK] accept failed: {:?}", e);
                Timer::after_millis(500).await; // Backoff delay
                continue;
            }
        }
    }
}

pub async fn handle_connection(socket: &mut TcpSocket<'_>, cmd_sender: &LinkSender) {
    let mut rx_buf = [0u8; RX_BUF_SIZE];
    let mut line: Vec<u8, MAX_LINE_LEN> = Vec::new();
    let mut overflowed = false;

    loop {
        let n = match socket.read(&mut rx_buf).await {
            Ok(0) => return,
            Ok(n) => n,
            Err(e) => {
                error!("[NET_TASK] read error: {:?}", e);
                return;
            }
        };

        for &byte in &rx_buf[..n] {
            if byte != b'\n' {
                if line.push(byte).is_err() {
                    overflowed = true;
                }
                continue;
            }
            if overflowed {
                warn!("[NET_TASK] line longer than {MAX_LINE_LEN} bytes dropped");
                LINK_FRAME_ERRORS.fetch_add(1, Ordering::Relaxed);
            } else if !handle_line(socket, cmd_sender, &line).await {
                return;
            }
            line.clear();
            overflowed = false;
        }
    }
}

/// Returns `false` once the connection should be closed.
async fn handle_line(socket: &mut TcpSocket<'_>, cmd_sender: &LinkSender, line: &[u8]) -> bool {
    match LinkCommand::try_from(line) {
        Ok(LinkCommand::Quit) => false,
        Ok(LinkCommand::Status) => {
            let mut reply: heapless::String<160> = heapless::String::new();
            let written = match telemetry() {
                Some(snapshot) => writeln!(reply, "{snapshot}"),
                None => writeln!(reply, "mode=starting"),
            };
            if written.is_err() {
                warn!("[NET_TASK] status reply truncated");
            }
            if let Err(e) = socket.write_all(reply.as_bytes()).await {
                error!("[NET_TASK] write error: {:?}", e);
                return false;
            }
            true
        }
        Ok(cmd) => {
            cmd_sender.send(cmd).await;
            true
        }
        Err(ParseCommandError::Empty) => true,
        Err(e) => {
            warn!("[NET_TASK] rejected line {:?}: {e}", line.escape_ascii());
            LINK_FRAME_ERRORS.fetch_add(1, Ordering::Relaxed);
            true
        }
    }
}

pub async fn configurate_and_start_wifi(wifi_controller: &mut WifiController<'_>) {
    let ssid = env!("WIFI_SSID");
    let password = env!("WIFI_PASS");
    let config = esp_wifi::wifi::Configuration::Client(ClientConfiguration {
        ssid: String::from(ssid),
        password: String::from(password),
        ..Default::default()
    });

    info!("[NET_TASK] connecting to wifi: {ssid}");
    wifi_controller
        .set_configuration(&config)
        .expect("fail setting configuration of wifi controller");

    wifi_controller
        .set_power_saving(esp_wifi::config::PowerSaveMode::None)
        .expect("Fail setting wifi power mode");

    wifi_controller
        .start()
        .expect("fail starting wifi controller");
    wifi_controller
        .connect_async()
        .await
        .inspect_err(|e| error!("[NET_TASK] an error occured trying to connect to wifi: {e:?}"))
        .expect("fail connecting to wifi");

    if let Ok(rssi) = wifi_controller.rssi() {
        info!("[NET_TASK] wifi connected! signal: {}", rssi)
    }
}
