use chrono::{Duration, Local};
use tracing::info;

use untis_client::{ClientConfig, UntisClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting WebUntis client example");

    // Load configuration (in a real app, you'd load from a config file or secret store)
    let base_url = std::env::var("UNTIS_BASE_URL")
        .unwrap_or_else(|_| "https://mese.webuntis.com/WebUntis".to_string());
    let school = std::env::var("UNTIS_SCHOOL")?;
    let username = std::env::var("UNTIS_USER")?;
    let password = std::env::var("UNTIS_PASSWORD")?;

    let mut client = UntisClient::init(ClientConfig::new(base_url))?;
    client.authenticate(&school, &username, &password).await?;

    let school_year = client.get_current_schoolyear().await?;
    println!("{}", serde_json::to_string_pretty(&school_year)?);

    let today = Local::now().date_naive();
    let timetable = client.get_timetable_week(today).await?;
    println!("{}", serde_json::to_string_pretty(&timetable)?);

    let absences = client
        .get_absences(today - Duration::days(30), today)
        .await?;
    println!("{}", serde_json::to_string_pretty(&absences)?);

    Ok(())
}
