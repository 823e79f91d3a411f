//! Booking table operations: get, put, delete, scan.
//!
//! Every write runs inside a transaction together with its `booking_log`
//! audit row. Identifiers are random 8-character strings; [`create_booking`]
//! regenerates on collision so a new id is never one already in the table.

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use super::types::{Booking, BookingError, BookingKey, BookingTable, NewBooking, ScanPage};

/// Length of generated booking identifiers.
pub const BOOKING_ID_LEN: usize = 8;

const MAX_ID_ATTEMPTS: usize = 5;

/// Upper bound on the page size accepted by [`scan_bookings`].
pub const MAX_PAGE_SIZE: usize = 1000;

/// Create the booking table if it does not exist.
pub fn ensure_table(conn: &Connection, table: &BookingTable) -> Result<(), BookingError> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {t} (
            booking_id TEXT NOT NULL,
            restaurant_name TEXT NOT NULL,
            date TEXT NOT NULL,
            hour TEXT NOT NULL,
            guest_name TEXT NOT NULL,
            num_guests INTEGER NOT NULL CHECK(num_guests > 0),
            created_at TEXT NOT NULL,
            PRIMARY KEY (booking_id, restaurant_name)
        );
        CREATE INDEX IF NOT EXISTS \"idx_{name}_restaurant\" ON {t}(restaurant_name);",
        t = table.quoted(),
        name = table.name()
    ))?;
    Ok(())
}

/// Generate a fresh random booking identifier.
pub fn new_booking_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(BOOKING_ID_LEN);
    id
}

/// Insert a new booking under a freshly generated identifier.
pub fn create_booking(
    conn: &mut Connection,
    table: &BookingTable,
    new: &NewBooking,
) -> Result<Booking, BookingError> {
    create_booking_with(conn, table, new, new_booking_id)
}

/// Insert a new booking, drawing candidate identifiers from `next_id` until
/// one is free. Gives up with [`BookingError::IdExhausted`] after
/// `MAX_ID_ATTEMPTS` collisions.
pub fn create_booking_with(
    conn: &mut Connection,
    table: &BookingTable,
    new: &NewBooking,
    mut next_id: impl FnMut() -> String,
) -> Result<Booking, BookingError> {
    new.validate()?;

    let tx = conn.transaction()?;

    let mut booking_id = None;
    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = next_id();
        if !id_exists(&tx, table, &candidate)? {
            booking_id = Some(candidate);
            break;
        }
        tracing::debug!(booking_id = %candidate, "booking id collision, regenerating");
    }
    let booking_id = booking_id.ok_or(BookingError::IdExhausted(MAX_ID_ATTEMPTS))?;

    let now = chrono::Utc::now().to_rfc3339();
    tx.execute(
        &format!(
            "INSERT INTO {} \
             (booking_id, restaurant_name, date, hour, guest_name, num_guests, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            table.quoted()
        ),
        params![
            booking_id,
            new.restaurant_name,
            new.date,
            new.hour,
            new.guest_name,
            new.num_guests,
            now,
        ],
    )?;

    write_audit_log(&tx, "create", &booking_id, &new.restaurant_name)?;
    tx.commit()?;

    Ok(Booking {
        booking_id,
        restaurant_name: new.restaurant_name.clone(),
        date: new.date.clone(),
        hour: new.hour.clone(),
        guest_name: new.guest_name.clone(),
        num_guests: new.num_guests,
    })
}

/// Look up a booking by its compound key.
pub fn get_booking(
    conn: &Connection,
    table: &BookingTable,
    key: &BookingKey,
) -> Result<Option<Booking>, BookingError> {
    let booking = conn
        .query_row(
            &format!(
                "SELECT booking_id, restaurant_name, date, hour, guest_name, num_guests \
                 FROM {} WHERE booking_id = ?1 AND restaurant_name = ?2",
                table.quoted()
            ),
            params![key.booking_id, key.restaurant_name],
            row_to_booking,
        )
        .optional()?;
    Ok(booking)
}

/// Delete a booking. Returns `false` if no row matched the key.
pub fn delete_booking(
    conn: &mut Connection,
    table: &BookingTable,
    key: &BookingKey,
) -> Result<bool, BookingError> {
    let tx = conn.transaction()?;

    let removed = tx.execute(
        &format!(
            "DELETE FROM {} WHERE booking_id = ?1 AND restaurant_name = ?2",
            table.quoted()
        ),
        params![key.booking_id, key.restaurant_name],
    )?;

    if removed > 0 {
        write_audit_log(&tx, "delete", &key.booking_id, &key.restaurant_name)?;
    }
    tx.commit()?;

    Ok(removed > 0)
}

/// Read up to `limit` bookings in insertion order, starting after `start_token`.
/// `limit` is clamped to `1..=MAX_PAGE_SIZE`.
///
/// The token is opaque to callers; pass back `next_token` from the previous
/// page to continue.
pub fn scan_bookings(
    conn: &Connection,
    table: &BookingTable,
    limit: usize,
    start_token: Option<&str>,
) -> Result<ScanPage, BookingError> {
    let after: i64 = match start_token {
        Some(token) => token
            .parse()
            .map_err(|_| BookingError::InvalidToken(token.to_string()))?,
        None => 0,
    };
    let limit = limit.clamp(1, MAX_PAGE_SIZE);

    let mut stmt = conn.prepare(&format!(
        "SELECT booking_id, restaurant_name, date, hour, guest_name, num_guests, rowid \
         FROM {} WHERE rowid > ?1 ORDER BY rowid LIMIT ?2",
        table.quoted()
    ))?;

    // Fetch one extra row to learn whether another page exists.
    let mut rows: Vec<(Booking, i64)> = stmt
        .query_map(params![after, (limit + 1) as i64], |row| {
            Ok((row_to_booking(row)?, row.get::<_, i64>(6)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let next_token = if rows.len() > limit {
        rows.truncate(limit);
        rows.last().map(|(_, rowid)| rowid.to_string())
    } else {
        None
    };

    Ok(ScanPage {
        items: rows.into_iter().map(|(booking, _)| booking).collect(),
        next_token,
    })
}

fn id_exists(
    tx: &Transaction,
    table: &BookingTable,
    booking_id: &str,
) -> Result<bool, BookingError> {
    let exists = tx.query_row(
        &format!("SELECT COUNT(*) > 0 FROM {} WHERE booking_id = ?1", table.quoted()),
        params![booking_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn row_to_booking(row: &Row<'_>) -> rusqlite::Result<Booking> {
    Ok(Booking {
        booking_id: row.get(0)?,
        restaurant_name: row.get(1)?,
        date: row.get(2)?,
        hour: row.get(3)?,
        guest_name: row.get(4)?,
        num_guests: row.get(5)?,
    })
}

fn write_audit_log(
    tx: &Transaction,
    operation: &str,
    booking_id: &str,
    restaurant_name: &str,
) -> Result<(), BookingError> {
    tx.execute(
        "INSERT INTO booking_log (operation, booking_id, restaurant_name, created_at) \
         VALUES (?1, ?2, ?3, ?4)",
        params![operation, booking_id, restaurant_name, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (Connection, BookingTable) {
        let conn = crate::db::open_memory_database().unwrap();
        let table = BookingTable::default();
        ensure_table(&conn, &table).unwrap();
        (conn, table)
    }

    fn rice_and_spice() -> NewBooking {
        NewBooking {
            date: "2025-12-01".into(),
            hour: "20:00".into(),
            restaurant_name: "Rice & Spice".into(),
            guest_name: "Anna".into(),
            num_guests: 4,
        }
    }

    fn log_count(conn: &Connection, operation: &str) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM booking_log WHERE operation = ?1",
            [operation],
            |row| row.get(0),
        )
        .unwrap()
    }

    fn row_count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_new_booking_id_shape() {
        let id = new_booking_id();
        assert_eq!(id.len(), BOOKING_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(new_booking_id(), new_booking_id());
    }

    #[test]
    fn test_create_then_get() {
        let (mut conn, table) = test_db();

        let created = create_booking(&mut conn, &table, &rice_and_spice()).unwrap();
        assert_eq!(created.booking_id.len(), 8);

        let fetched = get_booking(&conn, &table, &created.key()).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.date, "2025-12-01");
        assert_eq!(fetched.hour, "20:00");
        assert_eq!(fetched.guest_name, "Anna");
        assert_eq!(fetched.num_guests, 4);
        assert_eq!(log_count(&conn, "create"), 1);
    }

    #[test]
    fn test_get_requires_matching_restaurant() {
        let (mut conn, table) = test_db();
        let created = create_booking(&mut conn, &table, &rice_and_spice()).unwrap();

        let other = BookingKey::new(&created.booking_id, "Nonna's");
        assert!(get_booking(&conn, &table, &other).unwrap().is_none());
    }

    #[test]
    fn test_get_missing_is_none() {
        let (conn, table) = test_db();
        let key = BookingKey::new("deadbeef", "Rice & Spice");
        assert!(get_booking(&conn, &table, &key).unwrap().is_none());
    }

    #[test]
    fn test_same_slot_can_be_booked_twice() {
        let (mut conn, table) = test_db();
        let a = create_booking(&mut conn, &table, &rice_and_spice()).unwrap();
        let b = create_booking(&mut conn, &table, &rice_and_spice()).unwrap();
        assert_ne!(a.booking_id, b.booking_id);
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let (mut conn, table) = test_db();
        let mut bad = rice_and_spice();
        bad.date = String::new();

        let err = create_booking(&mut conn, &table, &bad).unwrap_err();
        assert!(matches!(err, BookingError::Invalid(_)));
        assert_eq!(log_count(&conn, "create"), 0);
    }

    #[test]
    fn test_delete_existing_and_missing() {
        let (mut conn, table) = test_db();
        let created = create_booking(&mut conn, &table, &rice_and_spice()).unwrap();

        assert!(delete_booking(&mut conn, &table, &created.key()).unwrap());
        assert!(get_booking(&conn, &table, &created.key()).unwrap().is_none());
        assert_eq!(log_count(&conn, "delete"), 1);

        // Second delete finds nothing and writes no audit row
        assert!(!delete_booking(&mut conn, &table, &created.key()).unwrap());
        assert_eq!(log_count(&conn, "delete"), 1);
    }

    #[test]
    fn test_scan_paginates() {
        let (mut conn, table) = test_db();
        let mut ids = Vec::new();
        for i in 0..5 {
            let mut new = rice_and_spice();
            new.guest_name = format!("Guest {i}");
            ids.push(create_booking(&mut conn, &table, &new).unwrap().booking_id);
        }

        let first = scan_bookings(&conn, &table, 2, None).unwrap();
        assert_eq!(first.items.len(), 2);
        let token = first.next_token.clone().unwrap();

        let second = scan_bookings(&conn, &table, 2, Some(&token)).unwrap();
        assert_eq!(second.items.len(), 2);

        let third = scan_bookings(&conn, &table, 2, second.next_token.as_deref()).unwrap();
        assert_eq!(third.items.len(), 1);
        assert!(third.next_token.is_none());

        let scanned: Vec<String> = first
            .items
            .iter()
            .chain(&second.items)
            .chain(&third.items)
            .map(|b| b.booking_id.clone())
            .collect();
        assert_eq!(scanned, ids);
    }

    #[test]
    fn test_scan_exact_page_has_no_token() {
        let (mut conn, table) = test_db();
        create_booking(&mut conn, &table, &rice_and_spice()).unwrap();
        create_booking(&mut conn, &table, &rice_and_spice()).unwrap();

        let page = scan_bookings(&conn, &table, 2, None).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_scan_rejects_bad_token() {
        let (conn, table) = test_db();
        let err = scan_bookings(&conn, &table, 10, Some("not-a-token")).unwrap_err();
        assert!(matches!(err, BookingError::InvalidToken(_)));
    }

    #[test]
    fn test_custom_table_name() {
        let mut conn = crate::db::open_memory_database().unwrap();
        let table = BookingTable::new("restaurant_bookings").unwrap();
        ensure_table(&conn, &table).unwrap();
        ensure_table(&conn, &table).unwrap();

        let created = create_booking(&mut conn, &table, &rice_and_spice()).unwrap();
        assert_eq!(row_count(&conn, "restaurant_bookings"), 1);
        assert!(get_booking(&conn, &table, &created.key()).unwrap().is_some());
    }

    #[test]
    fn test_keyword_table_name() {
        let mut conn = crate::db::open_memory_database().unwrap();
        let table = BookingTable::new("order").unwrap();
        ensure_table(&conn, &table).unwrap();

        let created = create_booking(&mut conn, &table, &rice_and_spice()).unwrap();
        assert_eq!(row_count(&conn, "\"order\""), 1);
        assert!(get_booking(&conn, &table, &created.key()).unwrap().is_some());
        assert_eq!(scan_bookings(&conn, &table, 10, None).unwrap().items.len(), 1);
        assert!(delete_booking(&mut conn, &table, &created.key()).unwrap());
    }

    #[test]
    fn test_scan_huge_limit_is_clamped() {
        let (mut conn, table) = test_db();
        create_booking(&mut conn, &table, &rice_and_spice()).unwrap();
        create_booking(&mut conn, &table, &rice_and_spice()).unwrap();

        let page = scan_bookings(&conn, &table, usize::MAX, None).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_scan_page_size_is_capped() {
        let (mut conn, table) = test_db();
        for _ in 0..MAX_PAGE_SIZE + 1 {
            create_booking(&mut conn, &table, &rice_and_spice()).unwrap();
        }

        let page = scan_bookings(&conn, &table, usize::MAX, None).unwrap();
        assert_eq!(page.items.len(), MAX_PAGE_SIZE);
        assert!(page.next_token.is_some());
    }

    #[test]
    fn test_create_regenerates_colliding_id() {
        let (mut conn, table) = test_db();
        let existing = create_booking(&mut conn, &table, &rice_and_spice()).unwrap();

        let mut candidates = vec![existing.booking_id.clone(), "fresh001".to_string()].into_iter();
        let created = create_booking_with(&mut conn, &table, &rice_and_spice(), || {
            candidates.next().unwrap()
        })
        .unwrap();

        assert_eq!(created.booking_id, "fresh001");
        assert_eq!(log_count(&conn, "create"), 2);
        assert_eq!(row_count(&conn, "bookings"), 2);
    }

    #[test]
    fn test_create_gives_up_after_repeated_collisions() {
        let (mut conn, table) = test_db();
        let existing = create_booking(&mut conn, &table, &rice_and_spice()).unwrap();

        let mut calls = 0;
        let err = create_booking_with(&mut conn, &table, &rice_and_spice(), || {
            calls += 1;
            existing.booking_id.clone()
        })
        .unwrap_err();

        assert!(matches!(err, BookingError::IdExhausted(5)));
        assert_eq!(calls, MAX_ID_ATTEMPTS);
        assert_eq!(log_count(&conn, "create"), 1);
        assert_eq!(row_count(&conn, "bookings"), 1);
    }
}
