//! Sign node firmware
//!
//! Associates with WiFi, then reports simulated telemetry to the sign server
//! and polls it for display commands from a single state machine driven loop.

#![no_std]
#![no_main]

extern crate alloc;

use embassy_net::{Config, Runner, Stack, StackResources};
use embassy_time::{Duration, Instant, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use esp_hal_embassy::Executor;
use esp_wifi::wifi::{self, WifiDevice};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use static_cell::StaticCell;

use lightsup_sign::config;
use lightsup_sign::http::ServerAddress;
use lightsup_sign::sign_client::SignClient;
use lightsup_sign::state_machine::{Action, SystemEvent, SystemStateMachine};
use lightsup_sign::telemetry::SimulatedSensors;
use lightsup_sign::transport::TcpTransport;
use lightsup_sign::wifi::WiFiManager;

// Add app descriptor for espflash compatibility
esp_bootloader_esp_idf::esp_app_desc!();

static WIFI_INIT_CELL: StaticCell<esp_wifi::EspWifiController<'static>> = StaticCell::new();
static STACK_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
static EXECUTOR: StaticCell<Executor> = StaticCell::new();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    esp_println::println!("[MAIN] Panic: {}", info);
    loop {}
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

// Embassy task to run the network stack
#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

// State machine driven sign task
#[embassy_executor::task]
async fn sign_task(
    mut wifi_manager: WiFiManager<'static>,
    mut client: SignClient<TcpTransport<'static>>,
    mut sensors: SimulatedSensors<SmallRng>,
) -> ! {
    let mut state_machine = SystemStateMachine::new();
    state_machine.handle_event(SystemEvent::SystemStarted, now_ms());

    loop {
        let state = state_machine.get_current_state();

        for action in state_machine.update(now_ms()) {
            match action {
                Action::StartWiFiConnection => {
                    let event = match wifi_manager
                        .connect(config::WIFI_SSID, config::WIFI_PASSWORD)
                        .await
                    {
                        Ok(()) => SystemEvent::WiFiConnected,
                        Err(_) => SystemEvent::WiFiConnectionFailed,
                    };
                    state_machine.handle_event(event, now_ms());
                }
                Action::MonitorConnection => {
                    if !wifi_manager.monitor_connection() {
                        state_machine.handle_event(SystemEvent::WiFiDisconnected, now_ms());
                    }
                }
                Action::RefreshSensors => {
                    sensors.refresh(now_ms());
                }
                Action::SendStatus => {
                    // Result already logged by the client; no retry
                    client.send_status(&sensors.sample()).await.ok();
                }
                Action::PollCommand => {
                    if let Ok(Some(command)) = client.poll_command().await {
                        // Display intent only; the LED matrix runs its own program
                        log::info!("[COMMAND] Display intent: {:?}", command);
                    }
                }
                Action::LogError(error_state) => {
                    log::error!("[STATE] Error logged: {:?}", error_state);
                }
                Action::Restart => {
                    log::error!("[MAIN] Restarting...");
                    Timer::after(Duration::from_millis(100)).await;
                    esp_hal::system::software_reset();
                }
            }

            // Remaining actions belong to the old state
            if state_machine.get_current_state() != state {
                break;
            }
        }

        Timer::after(Duration::from_millis(config::LOOP_PERIOD_MS)).await;
    }
}

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    // Heap for the WiFi driver
    esp_alloc::heap_allocator!(size: 72 * 1024);

    log::info!("Enschede LightsUp Sign v{}", lightsup_sign::VERSION);
    log::info!("================================");

    let server = match ServerAddress::parse(config::SERVER_URL) {
        Ok(server) => server,
        Err(e) => panic!("SIGN_SERVER_URL '{}' rejected: {}", config::SERVER_URL, e),
    };

    // Initialize embassy time system
    let timer_group0 = TimerGroup::new(peripherals.TIMG0);
    esp_hal_embassy::init(timer_group0.timer0);

    // Seeds are drawn before the RNG is handed to the WiFi driver
    let mut rng = Rng::new(peripherals.RNG);
    let sensor_seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());
    let net_seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());

    let timer_group1 = TimerGroup::new(peripherals.TIMG1);
    let wifi_init = match esp_wifi::init(timer_group1.timer0, rng, peripherals.RADIO_CLK) {
        Ok(wifi_init) => wifi_init,
        Err(e) => panic!("WiFi driver init failed: {:?}", e),
    };
    let wifi_init = WIFI_INIT_CELL.init(wifi_init);

    let (wifi_controller, wifi_interfaces) = match wifi::new(wifi_init, peripherals.WIFI) {
        Ok(parts) => parts,
        Err(e) => panic!("WiFi controller init failed: {:?}", e),
    };

    let (stack, runner): (Stack<'static>, _) = embassy_net::new(
        wifi_interfaces.sta,
        Config::dhcpv4(Default::default()),
        STACK_RESOURCES.init(StackResources::new()),
        net_seed,
    );
    log::info!("[WIFI] Network stack created with DHCP configuration");

    let wifi_manager = WiFiManager::new(wifi_controller, stack);
    let client = match SignClient::new(TcpTransport::new(stack), server, config::SIGN_ID) {
        Ok(client) => client,
        Err(e) => panic!("SIGN_ID '{}' rejected: {}", config::SIGN_ID, e),
    };
    let sensors = SimulatedSensors::new(SmallRng::seed_from_u64(sensor_seed), now_ms());

    log::info!("[MAIN] Sign {} reporting to {}", client.sign_id(), config::SERVER_URL);

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(net_task(runner)).ok();
        if let Err(e) = spawner.spawn(sign_task(wifi_manager, client, sensors)) {
            log::error!("[MAIN] Failed to spawn sign task: {:?}", e);
        }
    });
}
