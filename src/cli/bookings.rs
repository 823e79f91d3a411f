//! CLI `bookings` commands: operate on the booking table directly.

use anyhow::{Context, Result};
use rusqlite::Connection;

use restobot::booking::{store, BookingKey, BookingTable, NewBooking};
use restobot::config::RestobotConfig;
use restobot::db;

fn open(config: &RestobotConfig) -> Result<(Connection, BookingTable)> {
    let conn = db::open_database(config.resolved_db_path())?;
    let table = BookingTable::new(config.storage.table_name.clone())
        .context("invalid storage.table_name")?;
    store::ensure_table(&conn, &table)?;
    Ok((conn, table))
}

/// Print one page of bookings and the token for the next page.
pub fn list(config: &RestobotConfig, limit: usize, token: Option<&str>) -> Result<()> {
    let (conn, table) = open(config)?;
    let page = store::scan_bookings(&conn, &table, limit, token)?;

    if page.items.is_empty() {
        println!("No bookings.");
        return Ok(());
    }

    println!(
        "{:<10} {:<24} {:<12} {:<6} {:<20} {}",
        "ID", "Restaurant", "Date", "Hour", "Guest", "Guests"
    );
    for b in &page.items {
        println!(
            "{:<10} {:<24} {:<12} {:<6} {:<20} {}",
            b.booking_id, b.restaurant_name, b.date, b.hour, b.guest_name, b.num_guests
        );
    }
    if let Some(next) = page.next_token {
        println!();
        println!("More results: restobot bookings list --token {next}");
    }
    Ok(())
}

pub fn show(config: &RestobotConfig, booking_id: &str, restaurant_name: &str) -> Result<()> {
    let (conn, table) = open(config)?;
    let key = BookingKey::new(booking_id, restaurant_name);
    match store::get_booking(&conn, &table, &key)? {
        Some(booking) => println!("{}", serde_json::to_string_pretty(&booking)?),
        None => println!("No booking found with ID {booking_id}"),
    }
    Ok(())
}

pub fn create(config: &RestobotConfig, new: NewBooking) -> Result<()> {
    let (mut conn, table) = open(config)?;
    let booking = store::create_booking(&mut conn, &table, &new)?;
    println!("Booking created with ID {}", booking.booking_id);
    Ok(())
}

pub fn delete(config: &RestobotConfig, booking_id: &str, restaurant_name: &str) -> Result<()> {
    let (mut conn, table) = open(config)?;
    let key = BookingKey::new(booking_id, restaurant_name);
    if store::delete_booking(&mut conn, &table, &key)? {
        println!("Booking with ID {booking_id} deleted successfully");
    } else {
        println!("Failed to delete booking with ID {booking_id}");
    }
    Ok(())
}
