//! Host build of the robot firmware: the drive controller runs against a
//! logging motor output and the WebSocket server listens on a TAP device.

use std::convert::Infallible;

use clap::Parser;
use embassy_executor::{Executor, Spawner};
use embassy_net::{Config, Ipv4Address, Ipv4Cidr, Runner, StackResources};
use embassy_net_tuntap::TunTapDevice;
use heapless::Vec;
use omni_core::{
    mk_static,
    utils::{
        controllers::{
            hbridge::{DirectionLevel, MotorOutput},
            mapper::PhysicalMotor,
            store::MemoryStore,
        },
        wss, DriveController,
    },
};
use rand_core::{OsRng, RngCore};
use static_cell::StaticCell;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// TAP device name
    #[clap(long, default_value = "tap0")]
    tap: String,
    /// use a static IP instead of DHCP
    #[clap(long)]
    static_ip: bool,
    /// WebSocket server port
    #[clap(long, default_value_t = 8000)]
    port: u16,
}

/// Motor output that prints every channel write.
struct LoggingOutput;

impl MotorOutput for LoggingOutput {
    type Error = Infallible;

    fn apply(
        &mut self,
        motor: PhysicalMotor,
        direction: DirectionLevel,
        duty: u8,
    ) -> Result<(), Self::Error> {
        info!(motor = motor.id(), ?direction, duty, "motor");
        Ok(())
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, TunTapDevice>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn drive_task(mut ctrl: DriveController<LoggingOutput, MemoryStore>) -> ! {
    ctrl.drive_ch().await
}

#[embassy_executor::task]
async fn main_task(
    spawner: Spawner,
    opts: Opts,
) {
    let ctrl = DriveController::new(LoggingOutput, MemoryStore::new());
    if let Err(e) = spawner.spawn(drive_task(ctrl)) {
        error!("failed to spawn drive task: {:?}", e);
        return;
    }

    let device = match TunTapDevice::new(&opts.tap) {
        Ok(device) => device,
        Err(e) => {
            error!("failed to open TAP device {}: {}", opts.tap, e);
            return;
        }
    };
    let config = if opts.static_ip {
        Config::ipv4_static(embassy_net::StaticConfigV4 {
            address: Ipv4Cidr::new(Ipv4Address::new(192, 168, 69, 2), 24),
            dns_servers: Vec::new(),
            gateway: Some(Ipv4Address::new(192, 168, 69, 1)),
        })
    } else {
        Config::dhcpv4(Default::default())
    };
    let seed = OsRng.next_u64();

    let resources = mk_static!(StackResources<4>, StackResources::new());
    let (stack, runner) = embassy_net::new(device, config, resources, seed);
    if let Err(e) = spawner.spawn(net_task(runner)) {
        error!("failed to spawn network task: {:?}", e);
        return;
    }

    info!("Waiting for network link...");
    stack.wait_config_up().await;

    info!("Starting WebSocket server on port {}", opts.port);
    wss(0, opts.port, stack, None).await;
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let opts = Opts::parse();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        if let Err(e) = spawner.spawn(main_task(spawner, opts)) {
            error!("failed to spawn main task: {:?}", e);
        }
    });
}
