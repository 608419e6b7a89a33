use std::sync::Arc;

use minidb::*;

fn main() -> Result<()> {
    println!("minidb Demo\n");

    // In-memory backend, nothing is written to disk
    let db = QueryExecutor::new(Arc::new(MemoryStorage::new()));

    db.execute(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(20) NOT NULL, age INTEGER)",
    )?;
    println!("Created table 'users'");

    println!("Inserting data...");
    db.execute("INSERT INTO users (id, name, age) VALUES (1, 'Alice', 30)")?;
    db.execute("INSERT INTO users (id, name) VALUES (2, 'Bob')")?; // Bob's age is unknown
    db.execute("INSERT INTO users (id, name, age) VALUES (3, 'Charlie', 25)")?;
    println!("Inserted 3 rows\n");

    // Constraints reject bad rows without touching the table
    if let Err(e) = db.execute("INSERT INTO users (id, name) VALUES (1, 'Impostor')") {
        println!("Rejected: {e}\n");
    }

    println!("Reading data:");
    println!("{:<5} {:<10} {:<5}", "ID", "NAME", "AGE");
    println!("{}", "-".repeat(25));

    let result = db.execute("SELECT * FROM users")?;
    for row in result.rows().unwrap_or_default() {
        println!(
            "{:<5} {:<10} {:<5}",
            row.value("id").to_string(),
            row.value("name").to_string(),
            row.value("age").to_string()
        );
    }
    println!("{}\n", result.message());

    db.execute("CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER, item VARCHAR(20))")?;
    db.execute("INSERT INTO orders (id, user_id, item) VALUES (10, 1, 'Book')")?;
    db.execute("INSERT INTO orders (id, user_id, item) VALUES (11, 3, 'Lamp')")?;

    let joined = db.execute(
        "SELECT users.name, orders.item FROM users INNER JOIN orders ON users.id = orders.user_id",
    )?;
    println!("Orders per user:");
    println!("{}\n", serde_json::to_string_pretty(&joined)?);

    println!("{}", db.execute("UPDATE users SET age = 31 WHERE name = 'Alice'")?.message());
    println!("{}\n", db.execute("DELETE FROM users WHERE age < 30")?.message());

    println!("Tables in database:");
    for table_name in db.list_tables()? {
        println!("  - {}", table_name);
    }

    Ok(())
}
