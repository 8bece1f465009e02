use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use spendlog::{PasswordHash, initialize_db};

/// A utility for creating a test database for the Spendlog server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
///
/// The database gets one user (test/test) and a handful of expenses spread
/// over the last few months.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let password_hash = PasswordHash::new("test", PasswordHash::DEFAULT_COST)?;

    conn.execute(
        "INSERT INTO user (username, email, password) VALUES (?1, ?2, ?3)",
        ("test", "test@example.com", password_hash.to_string()),
    )?;
    let user_id = conn.last_insert_rowid();

    println!("Creating test expenses...");

    let today = time::OffsetDateTime::now_utc().date();
    let expenses = [
        (14.50, "food", "Lunch at the corner cafe", 0),
        (3.80, "transportation", "Bus fare", 1),
        (52.00, "bills", "Power bill", 5),
        (19.99, "entertainment", "Movie ticket", 12),
        (87.30, "food", "Weekly groceries", 20),
        (230.00, "travel", "Weekend trip accommodation", 35),
        (27.45, "shopping", "New t-shirt", 48),
        (45.00, "healthcare", "GP visit", 70),
    ];

    for (amount, category, description, days_ago) in expenses {
        let date = today - time::Duration::days(days_ago);

        conn.execute(
            "INSERT INTO expense (user_id, amount, category, description, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (user_id, amount, category, description, date.to_string()),
        )?;
    }

    println!("Success!");

    Ok(())
}
