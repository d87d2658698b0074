// Command Task - einziger Konsument des Befehls-Channels
//
// HTTP und MQTT dekodieren nur und schicken `Command`s hierher; damit
// werden alle Befehle in Eingangsreihenfolge angewendet.
use defmt::{info, warn};

use crate::{App, CommandReceiver, StatusSignal};

#[embassy_executor::task]
pub async fn command_task(app: App, commands: CommandReceiver, status: &'static StatusSignal) {
    info!("CMD: task started");

    loop {
        let command = commands.receive().await;
        info!("CMD: {}", defmt::Debug2Format(&command));

        match app.handle(command).await {
            Ok(true) => status.signal(()),
            Ok(false) => {}
            Err(error) => warn!("CMD: command rejected: {}", error),
        }
    }
}
