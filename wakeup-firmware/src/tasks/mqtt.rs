// MQTT Task - empfängt Befehle und veröffentlicht den Status
use core::fmt::{Display, Write as _};

use defmt::{Debug2Format, error, info, warn};
use embassy_futures::select::{Either3, select3};
use embassy_net::{Stack, tcp::TcpSocket};
use embassy_time::{Duration, Timer};
use heapless::String;

use rust_mqtt::client::client::MqttClient;
use rust_mqtt::client::client_config::{ClientConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::utils::rng_generator::CountingRng;
use rust_mqtt::utils::types::EncodedString;

use wakeup_core::{Color, Command, LocalTime, StatusSnapshot};

use crate::AppContext;
use crate::config::*;
use crate::net::{DnsError, resolve_hostname, wait_for_network};

type Topic = String<MQTT_TOPIC_CAPACITY>;
type Client<'a, 's> = MqttClient<'a, TcpSocket<'s>, 5, CountingRng>;

/// MQTT Task - läuft parallel zu anderen Tasks
///
/// - Wartet auf Netzwerk-Verbindung
/// - Abonniert `<prefix>/<befehl>` für alle Befehle
/// - Schickt empfangene Befehle an den Command Task
/// - Veröffentlicht den Status bei Änderung und alle
///   `STATUS_PUBLISH_INTERVAL_SECS`
/// - Automatisches Reconnect bei Fehlern
#[embassy_executor::task]
pub async fn mqtt_task(stack: Stack<'static>, context: AppContext) {
    info!("MQTT: Task started, waiting for network...");
    wait_for_network(stack).await;
    info!("MQTT: Network ready");

    loop {
        match mqtt_session(stack, context).await {
            Ok(_) => warn!("MQTT: Connection closed normally"),
            Err(e) => error!("MQTT: Error: {}", e),
        }
        info!("MQTT: Reconnecting in {}s...", MQTT_RECONNECT_DELAY_SECS);
        Timer::after(Duration::from_secs(MQTT_RECONNECT_DELAY_SECS)).await;
    }
}

/// Ereignis aus der Session-Schleife
enum SessionEvent {
    Command(Command),
    Publish,
}

/// Eine Broker-Session: Connect, Subscribe, dann Empfangs-/Publish-Loop
///
/// Bei jedem Fehler wird die Funktion beendet und der Haupt-Loop
/// startet automatisch einen Reconnect-Versuch.
async fn mqtt_session(stack: Stack<'static>, context: AppContext) -> Result<(), MqttError> {
    // DNS Lookup
    info!("MQTT: Resolving '{}'...", MQTT_BROKER);
    let broker_ip = resolve_hostname(stack, MQTT_BROKER)
        .await
        .map_err(MqttError::Dns)?;
    info!("MQTT: Resolved to {}", Debug2Format(&broker_ip));

    // TCP Connect
    let mut rx_buffer = [0u8; 4096];
    let mut tx_buffer = [0u8; 4096];
    let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(STATUS_PUBLISH_INTERVAL_SECS * 2)));

    socket
        .connect((broker_ip, MQTT_PORT))
        .await
        .map_err(|_| MqttError::ConnectionFailed)?;
    info!("MQTT: TCP connected");

    // MQTT Client Configuration
    let rng = CountingRng(20000);
    let mut config = ClientConfig::<5, _>::new(MqttVersion::MQTTv5, rng);
    config.client_id = EncodedString {
        string: MQTT_CLIENT_ID,
        len: MQTT_CLIENT_ID.len() as u16,
    };
    // Status-Publish alle 60 s hält die Verbindung am Leben
    config.keep_alive = (STATUS_PUBLISH_INTERVAL_SECS * 3 / 2) as u16;
    config.max_packet_size = MQTT_BUFFER_SIZE as u32;

    let mut send_buffer = [0u8; MQTT_BUFFER_SIZE];
    let mut recv_buffer = [0u8; MQTT_BUFFER_SIZE];

    let mut client = MqttClient::<_, 5, _>::new(
        socket,
        &mut send_buffer,
        MQTT_BUFFER_SIZE,
        &mut recv_buffer,
        MQTT_BUFFER_SIZE,
        config,
    );

    client
        .connect_to_broker()
        .await
        .map_err(|_| MqttError::ProtocolError)?;
    info!("MQTT: Connected to broker");

    for name in Command::TOPICS {
        let topic = topic(name)?;
        client
            .subscribe_to_topic(&topic)
            .await
            .map_err(|_| MqttError::SubscribeFailed)?;
    }
    info!("MQTT: Subscribed to {} command topics", Command::TOPICS.len());

    publish_status(&mut client, &context.app.status().await).await?;

    loop {
        // Gewinnt Signal oder Timer, geht ein halb gelesenes Paket verloren.
        // Der folgende Receive-Fehler beendet die Session (Reconnect).
        let event = match select3(
            client.receive_message(),
            context.status.wait(),
            Timer::after(Duration::from_secs(STATUS_PUBLISH_INTERVAL_SECS)),
        )
        .await
        {
            Either3::First(Ok((topic, payload))) => {
                match core::str::from_utf8(payload)
                    .ok()
                    .and_then(|payload| Command::parse(topic, payload).ok())
                {
                    Some(command) => SessionEvent::Command(command),
                    None => {
                        warn!("MQTT: Ignoring malformed message on '{}'", topic);
                        continue;
                    }
                }
            }
            Either3::First(Err(_)) => return Err(MqttError::ReceiveFailed),
            Either3::Second(()) | Either3::Third(()) => SessionEvent::Publish,
        };

        match event {
            SessionEvent::Command(command) => context.commands.send(command).await,
            SessionEvent::Publish => {
                publish_status(&mut client, &context.app.status().await).await?;
            }
        }
    }
}

/// `<prefix>/<name>`
fn topic(name: &str) -> Result<Topic, MqttError> {
    let mut topic = Topic::new();
    write!(topic, "{}/{}", MQTT_TOPIC_PREFIX, name).map_err(|_| MqttError::TopicTooLong)?;
    Ok(topic)
}

/// Veröffentlicht jedes Status-Feld auf `<prefix>/<feld>` (retained)
async fn publish_status(
    client: &mut Client<'_, '_>,
    status: &StatusSnapshot,
) -> Result<(), MqttError> {
    publish_field(client, "light_on", u8::from(status.light_on)).await?;
    publish_field(client, "current_color", ColorText(status.current_color)).await?;
    publish_field(client, "brightness", status.brightness).await?;
    publish_field(client, "alarm_on", u8::from(status.alarm_on)).await?;
    publish_field(client, "alarm_hour", status.alarm_hour).await?;
    publish_field(client, "alarm_minute", status.alarm_minute).await?;
    publish_field(client, "alarm_delay", status.alarm_delay).await?;
    publish_field(client, "alarm_running", u8::from(status.alarm_running)).await?;
    publish_field(client, "sequence_active", u8::from(status.sequence_active)).await?;
    publish_field(client, "heartbeat_on", u8::from(status.heartbeat_on)).await?;
    publish_field(client, "current_time", TimeText(status.current_time)).await?;
    publish_field(client, "utc_offset", status.utc_offset / 3600).await?;
    publish_field(client, "dst_offset", status.dst_offset / 3600).await?;

    info!("MQTT: Published status");
    Ok(())
}

async fn publish_field(
    client: &mut Client<'_, '_>,
    name: &str,
    value: impl Display,
) -> Result<(), MqttError> {
    let topic = topic(name)?;
    let mut payload: String<32> = String::new();
    write!(payload, "{}", value).map_err(|_| MqttError::PublishFailed)?;

    client
        .send_message(&topic, payload.as_bytes(), QualityOfService::QoS0, true)
        .await
        .map_err(|_| MqttError::PublishFailed)
}

/// `r,g,b,w` wie beim Befehl `set_rgbw`
struct ColorText(Color);

impl Display for ColorText {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{},{},{},{}", self.0.r, self.0.g, self.0.b, self.0.w)
    }
}

/// `HH:MM:SS` oder `unsynced`
struct TimeText(Option<LocalTime>);

impl Display for TimeText {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            Some(time) => write!(f, "{:02}:{:02}:{:02}", time.hour, time.minute, time.second),
            None => f.write_str("unsynced"),
        }
    }
}

/// MQTT Fehler-Typen
#[derive(Debug)]
enum MqttError {
    Dns(DnsError),
    ConnectionFailed,
    ProtocolError,
    SubscribeFailed,
    ReceiveFailed,
    PublishFailed,
    TopicTooLong,
}

impl defmt::Format for MqttError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            MqttError::Dns(error) => defmt::write!(fmt, "{}", error),
            MqttError::ConnectionFailed => defmt::write!(fmt, "Connection failed"),
            MqttError::ProtocolError => defmt::write!(fmt, "Protocol error"),
            MqttError::SubscribeFailed => defmt::write!(fmt, "Subscribe failed"),
            MqttError::ReceiveFailed => defmt::write!(fmt, "Receive failed"),
            MqttError::PublishFailed => defmt::write!(fmt, "Publish failed"),
            MqttError::TopicTooLong => defmt::write!(fmt, "Topic too long"),
        }
    }
}
