// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Heap Allocator (WiFi braucht dynamischen Speicher)
extern crate alloc;

// Embassy Async Runtime
use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, StackResources};
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Timer};
use static_cell::StaticCell;

// ESP32-C6 HAL
use esp_hal::clock::CpuClock;
use esp_hal::rmt::PulseCode;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use esp_hal_smartled::smart_led_buffer;
use esp_storage::FlashStorage;

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

use wakeup_core::{AlarmScheduler, HeartbeatAnimator, HeartbeatConfig, LightDriver, WakeUpLight};

// Projekt-Module und Konfiguration
use wakeup_light::config::{
    EXTRA_HEAP_SIZE, HTTP_TASK_COUNT, RMT_CLOCK_MHZ, STATUS_PIXEL, WIFI_HEAP_SIZE,
};
use wakeup_light::hal::{FlashConfigStorage, LED_BUFFER_SIZE, LED_WIRE_WORDS, RmtPixelSink};
use wakeup_light::tasks::{
    alarm_task, command_task, connection_task, dhcp_task, heartbeat_task, http_server_task,
    mqtt_task, net_task, sequence_task, time_sync_task,
};
use wakeup_light::{
    AppClock, AppContext, AppHeartbeat, AppLight, AppScheduler, CommandChannel, StatusSignal,
};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
// Ohne diesen schlägt das Flashen mit "ESP-IDF App Descriptor missing" fehl
esp_bootloader_esp_idf::esp_app_desc!();

/// Main Entry Point
///
/// Initialisiert Hardware, baut die Core-Komponenten in statischem Speicher
/// auf und spawnt die Tasks. Danach schläft main() - alle Arbeit läuft in Tasks.
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    // ESP32-C6 Konfiguration: CPU auf maximale Taktfrequenz (160 MHz)
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Heap Allocator initialisieren (WiFi braucht dynamischen Speicher!)
    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);

    // Embassy Runtime initialisieren (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    // ------------------------------------------------------------------------
    // Licht: RMT Pixel-Sink, LightDriver, Heartbeat
    // ------------------------------------------------------------------------
    static RMT_BUFFER: StaticCell<[PulseCode; LED_BUFFER_SIZE]> = StaticCell::new();
    let rmt_buffer = RMT_BUFFER.init(smart_led_buffer!(LED_WIRE_WORDS));

    let sink = RmtPixelSink::new(peripherals.GPIO8, peripherals.RMT, RMT_CLOCK_MHZ, rmt_buffer)
        .expect("Failed to initialize RMT for the LED strip");

    static LIGHT: StaticCell<AppLight> = StaticCell::new();
    let light = &*LIGHT.init(LightDriver::new(sink, STATUS_PIXEL));
    if let Err(e) = light.turn_off().await {
        warn!("LIGHT: initial clear failed: {}", e);
    }

    static HEARTBEAT: StaticCell<AppHeartbeat> = StaticCell::new();
    let heartbeat = &*HEARTBEAT.init(HeartbeatAnimator::new(light, HeartbeatConfig::default()));
    if STATUS_PIXEL {
        heartbeat.start();
    }

    // ------------------------------------------------------------------------
    // Wecker: Konfiguration aus dem Flash, Uhr, Kanäle
    // ------------------------------------------------------------------------
    let storage = FlashConfigStorage::new(FlashStorage::new(peripherals.FLASH));

    static SCHEDULER: StaticCell<AppScheduler> = StaticCell::new();
    let scheduler = &*SCHEDULER.init(Mutex::new(AlarmScheduler::restore(
        light.sequences(),
        storage,
    )));

    static CLOCK: StaticCell<AppClock> = StaticCell::new();
    let clock = &*CLOCK.init(AppClock::new());

    static STATUS: StaticCell<StatusSignal> = StaticCell::new();
    let status = &*STATUS.init(StatusSignal::new());

    static COMMANDS: StaticCell<CommandChannel> = StaticCell::new();
    let commands = &*COMMANDS.init(CommandChannel::new());

    let context = AppContext {
        app: WakeUpLight {
            light,
            heartbeat,
            scheduler,
            clock,
        },
        commands: commands.sender(),
        status,
    };

    // ------------------------------------------------------------------------
    // WiFi und Netzwerk-Stack
    // ------------------------------------------------------------------------
    static RADIO_INIT: StaticCell<esp_radio::Controller> = StaticCell::new();
    let radio_init =
        RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

    let (wifi_controller, wifi_interface) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi");

    // Random seed für TCP/IP Stack (von Hardware RNG)
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    // Sockets: MQTT + HTTP (2) + World-Time TCP + SNTP UDP + DNS + DHCP
    static RESOURCES: StaticCell<StackResources<8>> = StaticCell::new();
    let resources = RESOURCES.init(StackResources::new());

    let (stack, runner) = embassy_net::new(
        wifi_interface.sta,
        NetConfig::dhcpv4(Default::default()),
        resources,
        seed,
    );

    // ------------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------------
    // Licht und Wecker laufen auch ohne Netzwerk
    spawner.spawn(sequence_task(light)).unwrap();
    spawner.spawn(heartbeat_task(heartbeat)).unwrap();
    spawner.spawn(alarm_task(scheduler, clock, status)).unwrap();
    spawner
        .spawn(command_task(context.app, commands.receiver(), status))
        .unwrap();

    spawner.spawn(connection_task(wifi_controller)).unwrap();
    spawner.spawn(net_task(runner)).unwrap();
    spawner.spawn(dhcp_task(stack)).unwrap();

    spawner
        .spawn(time_sync_task(stack, scheduler, clock, status))
        .unwrap();
    spawner.spawn(mqtt_task(stack, context)).unwrap();
    for task_id in 0..HTTP_TASK_COUNT {
        spawner
            .spawn(http_server_task(task_id, stack, context))
            .unwrap();
    }

    info!("Wakeup light running");

    // Main-Loop: schläft (alle Arbeit läuft in Tasks)
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
