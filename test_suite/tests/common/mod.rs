use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database, DatabaseConnection, Schema};
use sea_orm_migration::prelude::*;

pub mod airline_entity;
pub mod airport_entity;
pub mod city_entity;
pub mod region_entity;

// Helper function to get database URL from environment or default to SQLite
fn get_test_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Empty travel schema.
#[allow(dead_code)]
pub async fn setup_empty_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(get_test_database_url()).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Travel schema with the fixture rows of [`seed_travel_data`].
#[allow(dead_code)]
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = setup_empty_db().await?;
    seed_travel_data(&db).await?;
    Ok(db)
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateTravelTables)]
    }
}

pub struct CreateTravelTables;

impl MigrationName for CreateTravelTables {
    fn name(&self) -> &str {
        "m20250101_000001_create_travel_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateTravelTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        manager
            .create_table(schema.create_table_from_entity(region_entity::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(city_entity::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(airport_entity::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(airline_entity::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(flight_entity::Entity))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(flight_entity::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(airline_entity::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(airport_entity::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(city_entity::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(region_entity::Entity).to_owned())
            .await?;
        Ok(())
    }
}

#[allow(dead_code)]
pub fn day(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("valid fixture date")
}

#[allow(dead_code)]
pub fn at(year: i32, month: u32, date: u32, hour: u32, minute: u32) -> NaiveDateTime {
    day(year, month, date) + TimeDelta::hours(i64::from(hour)) + TimeDelta::minutes(i64::from(minute))
}

/// Number of flights in the fixture
#[allow(dead_code)]
pub const FLIGHT_COUNT: i64 = 25;

/// Flight ids that are cancelled in the fixture
#[allow(dead_code)]
pub const CANCELLED_FLIGHTS: [i64; 3] = [7, 14, 21];

/// Seed the travel fixture:
///
/// | id | airport               | code | elevation | intl  | opened     | city      |
/// |----|-----------------------|------|-----------|-------|------------|-----------|
/// | 1  | Milano Malpensa       | MXP  | 234       | yes   | 1948-11-21 | Milan     |
/// | 2  | Milano Linate         | LIN  | 107       | yes   | 1937-10-01 | Milan     |
/// | 3  | Bergamo Orio al Serio | BGY  | 237       | yes   | 1937-10-01 | Bergamo   |
/// | 4  | Roma Fiumicino        | FCO  | 4         | yes   | 1961-01-15 | Rome      |
/// | 5  | Roma Ciampino         | CIA  | 130       | no    | 1916-01-01 | Rome      |
/// | 6  | Barcelona El Prat     | BCN  | 4         | yes   | 1918-01-01 | Barcelona |
/// | 7  | Bresso Airfield       | -    | -         | no    | -          | Milan     |
/// | 8  | Lake_Side Strip       | -    | 12        | no    | -          | Barcelona |
pub async fn seed_travel_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    for (id, name, code) in [
        (1, "Lombardy", "LOM"),
        (2, "Lazio", "LAZ"),
        (3, "Catalonia", "CAT"),
    ] {
        region_entity::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            code: Set(code.to_string()),
        }
        .insert(db)
        .await?;
    }

    for (id, name, population, region_id) in [
        (1, "Milan", 1_371_000, 1),
        (2, "Bergamo", 120_000, 1),
        (3, "Rome", 2_873_000, 2),
        (4, "Barcelona", 1_620_000, 3),
    ] {
        city_entity::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            population: Set(population),
            region_id: Set(region_id),
        }
        .insert(db)
        .await?;
    }

    let airports = [
        (1, "Milano Malpensa", Some("MXP"), Some(234.0), true, Some(day(1948, 11, 21)), 1),
        (2, "Milano Linate", Some("LIN"), Some(107.0), true, Some(day(1937, 10, 1)), 1),
        (3, "Bergamo Orio al Serio", Some("BGY"), Some(237.0), true, Some(day(1937, 10, 1)), 2),
        (4, "Roma Fiumicino", Some("FCO"), Some(4.0), true, Some(day(1961, 1, 15)), 3),
        (5, "Roma Ciampino", Some("CIA"), Some(130.0), false, Some(day(1916, 1, 1)), 3),
        (6, "Barcelona El Prat", Some("BCN"), Some(4.0), true, Some(day(1918, 1, 1)), 4),
        (7, "Bresso Airfield", None, None, false, None, 1),
        (8, "Lake_Side Strip", None, Some(12.0), false, None, 4),
    ];
    for (id, name, code, elevation, international, opened_on, city_id) in airports {
        airport_entity::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            code: Set(code.map(str::to_string)),
            elevation: Set(elevation),
            international: Set(international),
            opened_on: Set(opened_on),
            city_id: Set(city_id),
        }
        .insert(db)
        .await?;
    }

    for (id, name, iata_code) in [
        (1, "ITA Airways", "AZ"),
        (2, "Vueling", "VY"),
        (3, "Ryanair", "FR"),
    ] {
        airline_entity::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            iata_code: Set(iata_code.to_string()),
        }
        .insert(db)
        .await?;
    }

    // One departure per hour from 2024-05-01 06:00, cycling through routes
    let routes = [(1, 4), (4, 6), (2, 4), (6, 1), (3, 5)];
    for id in 1..=FLIGHT_COUNT {
        let index = usize::try_from(id).expect("positive flight id") % routes.len();
        let (origin, destination) = routes[index];
        flight_entity::ActiveModel {
            id: Set(id),
            number: Set(format!("FL{:03}", 100 + id)),
            airline_id: Set(id % 3 + 1),
            origin_airport_id: Set(origin),
            destination_airport_id: Set(destination),
            departure_at: Set(at(2024, 5, 1, 6, 0) + TimeDelta::hours(id)),
            price: Set(f64::from(<u32 as std::convert::TryFrom<_>>::try_from(id * 37 % 200).expect("small price")) + 50.0),
            cancelled: Set(CANCELLED_FLIGHTS.contains(&id)),
        }
        .insert(db)
        .await?;
    }

    Ok(())
}
