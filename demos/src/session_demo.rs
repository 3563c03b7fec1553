use anyhow::Context;
use dotenv::dotenv;
use std::env;
use uuid::Uuid;
use vetdesk::pets::CreatePetParams;
use vetdesk::VetDesk;
use vetdesk_schedule::ReservationDate;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load VETDESK_* variables from .env
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vetdesk_auth=info".parse()?),
        )
        .init();

    let email = env::var("VETDESK_EMAIL").context("VETDESK_EMAIL must be set")?;
    let password = env::var("VETDESK_PASSWORD").context("VETDESK_PASSWORD must be set")?;

    let vetdesk = VetDesk::from_env()?;

    println!("Logging in as {}", email);
    let user = vetdesk.auth().login(&email, &password).await?;
    println!("Logged in: {} {} ({:?})", user.name, user.surname, user.role);

    let me = vetdesk.users().me().await?;
    println!("Profile from server: {:?}", me);

    println!("\nReservations");
    for record in vetdesk.reservations().list().await? {
        let reservation = &record.reservation;
        println!(
            "  {} {} {} {} for {}",
            reservation.reservation_number,
            reservation.date,
            reservation.time,
            reservation.status,
            record.pet.name
        );
    }

    let today = ReservationDate::today(chrono::Utc::now());
    println!("\nFree slots on {}", today);
    for slot in vetdesk.reservations().available_slots(&today).await? {
        println!("  {}", slot);
    }

    // Unique name so the demo can be run repeatedly
    let pet_name = format!("demo-{}", &Uuid::new_v4().to_string()[..8]);
    let pet = vetdesk
        .pets()
        .create(&CreatePetParams {
            name: pet_name,
            owner_id: Some(user.id),
            specie: "cat".to_string(),
            metadata: serde_json::Map::new(),
        })
        .await?;
    println!("\nCreated pet {} (#{})", pet.name, pet.id);
    vetdesk.pets().delete(pet.id).await?;
    println!("Deleted pet #{}", pet.id);

    vetdesk.auth().logout().await?;
    println!("\nLogged out, state: {:?}", vetdesk.auth().state());

    Ok(())
}
