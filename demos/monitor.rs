use std::env;

use tiko_cloud::{TikoClient, TikoCoordinator};

#[tokio::main]
async fn main() -> tiko_cloud::Result<()> {
    tracing_subscriber::fmt::init();

    let email = env::var("TIKO_EMAIL").expect("set TIKO_EMAIL");
    let password = env::var("TIKO_PASSWORD").expect("set TIKO_PASSWORD");

    let client = TikoClient::builder(email, password).build();
    let mut coordinator = TikoCoordinator::builder(client)
        .on_event(|event| {
            println!("{event:?}");
        })
        .build();

    println!("Polling every {:?}...", coordinator.scan_interval());
    loop {
        match coordinator.refresh().await {
            Ok(()) => {
                for climate in coordinator.climates() {
                    println!(
                        "[{}] {} -> {} | mode: {:?} | action: {:?}{}",
                        climate.name(),
                        climate
                            .current_temperature()
                            .map(|t| format!("{t:.1}\u{00b0}C"))
                            .unwrap_or_else(|| "?".to_string()),
                        climate
                            .target_temperature()
                            .map(|t| format!("{t:.1}\u{00b0}C"))
                            .unwrap_or_else(|| "?".to_string()),
                        climate.heating_mode(),
                        climate.hvac_action(),
                        if climate.available() { "" } else { " | UNAVAILABLE" },
                    );
                }
            }
            Err(e) => eprintln!("Poll error: {e}"),
        }
        tokio::time::sleep(coordinator.scan_interval()).await;
    }
}
