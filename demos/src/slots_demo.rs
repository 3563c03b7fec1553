use std::env;

use vetdesk_schedule::{canonical_slots, parse_time_slot, validate_date, SlotGrid};

/// Prints the clinic grid, then checks `day/month/year` and `HH:MM-HH:MM`
/// arguments against it.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let grid = SlotGrid::default();
    println!("Clinic slots ({} to {}):", grid.open(), grid.close());
    for slot in canonical_slots() {
        println!("  {}", slot);
    }

    for arg in env::args().skip(1) {
        if arg.contains(':') {
            match parse_time_slot(&arg) {
                Ok(slot) if grid.contains(&slot) => println!("{}: bookable slot", arg),
                Ok(slot) if grid.aligns(&slot) => println!("{}: spans several slots", arg),
                Ok(_) => println!("{}: not on the grid", arg),
                Err(err) => println!("{}: {}", arg, err),
            }
            continue;
        }

        let parts: Vec<&str> = arg.split('/').collect();
        let [day, month, year] = parts.as_slice() else {
            println!("{}: expected day/month/year", arg);
            continue;
        };
        match (day.parse(), month.parse(), year.parse()) {
            (Ok(day), Ok(month), Ok(year)) => {
                let verdict = if validate_date(day, month, year) {
                    "valid date"
                } else {
                    "no such day"
                };
                println!("{}: {}", arg, verdict);
            }
            _ => println!("{}: expected numbers", arg),
        }
    }

    Ok(())
}
