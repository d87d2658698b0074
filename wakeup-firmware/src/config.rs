// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen
//
// Der SK6812 RGBW Strip hängt an GPIO8 (siehe `RmtPixelSink::new`).

// ============================================================================
// LED Konfiguration
// ============================================================================

/// RMT Taktfrequenz in MHz
/// 80 MHz ist optimal für WS2812/SK6812 Timing
pub const RMT_CLOCK_MHZ: u32 = 80;

/// Anzahl der LEDs im Strip (inklusive Status-Pixel)
pub const LED_COUNT: usize = 30;

/// Erstes Pixel (Index 0) als Status-Pixel für den Heartbeat reservieren
pub const STATUS_PIXEL: bool = true;

// ============================================================================
// WiFi Konfiguration
// ============================================================================

/// WiFi SSID (Netzwerk-Name)
/// Wird zur Build-Zeit aus der Environment Variable WIFI_SSID geladen
/// Setze diese in .env file (siehe .env.example)
pub const WIFI_SSID: &str = env!(
    "WIFI_SSID",
    "WiFi SSID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// WiFi Passwort
/// Wird zur Build-Zeit aus der Environment Variable WIFI_PASSWORD geladen
pub const WIFI_PASSWORD: &str = env!(
    "WIFI_PASSWORD",
    "WiFi Password nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Heap-Größe für WiFi (Bytes)
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 36864; // 36 KB

// ============================================================================
// MQTT Konfiguration
// ============================================================================

/// MQTT Broker Hostname oder IP-Adresse
pub const MQTT_BROKER: &str = env!(
    "MQTT_BROKER",
    "MQTT Broker nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// MQTT Broker Port
/// Standard: 1883 (unverschlüsselt)
pub const MQTT_PORT: u16 = 1883;

/// MQTT Client ID
pub const MQTT_CLIENT_ID: &str = env!(
    "MQTT_CLIENT_ID",
    "MQTT Client ID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Topic-Präfix für Befehle und Status
///
/// Befehle kommen auf `<prefix>/<befehl>` (z.B. `wakeuplight/sunrise`),
/// Status-Felder gehen auf `<prefix>/<feld>` (z.B. `wakeuplight/alarm_on`).
pub const MQTT_TOPIC_PREFIX: &str = env!(
    "MQTT_TOPIC_PREFIX",
    "MQTT Topic Prefix nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// MQTT Reconnect Delay in Sekunden
pub const MQTT_RECONNECT_DELAY_SECS: u64 = 5;

/// MQTT Buffer-Größe in Bytes
pub const MQTT_BUFFER_SIZE: usize = 1024;

/// Maximale Topic-Länge (Präfix + Befehl/Feld)
pub const MQTT_TOPIC_CAPACITY: usize = 64;

/// Intervall für periodische Status-Veröffentlichung (und MQTT Keep-Alive)
pub const STATUS_PUBLISH_INTERVAL_SECS: u64 = 60;

/// DNS Query Timeout in Sekunden
pub const DNS_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Zeit-Synchronisation
// ============================================================================

/// World-Time HTTP API (primäre Zeitquelle, liefert auch Offsets)
pub const TIME_API_HOST: &str = "worldtimeapi.org";

/// Pfad der World-Time API (Zeitzone anhand der öffentlichen IP)
pub const TIME_API_PATH: &str = "/api/ip";

/// SNTP Server (Fallback-Zeitquelle, nur UTC)
pub const NTP_SERVER: &str = "pool.ntp.org";

/// Standard NTP Port
pub const NTP_PORT: u16 = 123;

/// Intervall zwischen zwei Zeit-Synchronisationen
pub const TIME_SYNC_INTERVAL_SECS: u64 = 300;

/// Wartezeit bis zum nächsten Versuch, solange die Uhr noch nie gestellt wurde
pub const TIME_SYNC_RETRY_SECS: u64 = 30;

/// Buffer für die HTTP-Antwort der World-Time API
pub const TIME_API_BUFFER_SIZE: usize = 1536;

// ============================================================================
// Wecker
// ============================================================================

/// Prüf-Intervall des Weckers in Millisekunden
pub const ALARM_CHECK_INTERVAL_MS: u64 = 500;

/// Flash-Offset des Konfigurations-Records (4 KB Sektor, NVS-Partition)
pub const CONFIG_FLASH_OFFSET: u32 = 0x9000;

/// Sektor-Größe des SPI-Flash
pub const FLASH_SECTOR_SIZE: u32 = 4096;

// ============================================================================
// HTTP Server Konfiguration
// ============================================================================

/// HTTP Buffer-Größe in Bytes
/// Für HTTP Request/Response Headers und Body
pub const HTTP_BUFFER_SIZE: usize = 1024;

/// TCP RX Buffer-Größe in Bytes
pub const TCP_RX_BUFFER_SIZE: usize = 1024;

/// TCP TX Buffer-Größe in Bytes
pub const TCP_TX_BUFFER_SIZE: usize = 1024;

/// JSON Serialisierungs-Buffer für `/status`
pub const JSON_STATUS_BUFFER_SIZE: usize = 512;

/// Anzahl paralleler HTTP-Server-Tasks
pub const HTTP_TASK_COUNT: usize = 2;

/// Kapazität des Befehls-Channels (HTTP + MQTT → Command Task)
pub const COMMAND_QUEUE_SIZE: usize = 4;
