//! Utility to re-derive feeding calories after a food's label was corrected
//! Usage: cargo run --bin recalculate_intakes -- <dog_id> [date]

use snacktrack::db::{self, migrations, Database};
use snacktrack::models::{timestamp, Dog, FoodIntake};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let dog_id: i64 = match args.get(1).map(|s| s.parse()) {
        Some(Ok(id)) => id,
        _ => {
            eprintln!("Usage: recalculate_intakes <dog_id> [YYYY-MM-DD]");
            std::process::exit(2);
        }
    };
    let date = args.get(2).cloned().unwrap_or_else(timestamp::today);
    timestamp::parse_date(&date)?;

    let db_path = db::database_path();
    println!("Database: {}", db_path.display());

    let database = Database::new(&db_path)?;

    database.with_conn_mut(|conn| {
        migrations::run_migrations(conn)?;

        let Some(dog) = Dog::get_by_id(conn, dog_id)? else {
            println!("No dog with id {}", dog_id);
            return Ok(());
        };

        let before = FoodIntake::list_for_day(conn, dog_id, &date)?;
        println!("Found {} feedings for {} on {}", before.len(), dog.name, date);

        let updated = FoodIntake::recalculate_for_day(conn, dog_id, &date)?;
        for intake in &updated {
            let old = before
                .iter()
                .find(|i| i.id == intake.id)
                .map(|i| i.calories)
                .unwrap_or(intake.calories);
            println!(
                "  #{} {} ({:.0} g): {} -> {} kcal",
                intake.id, intake.food_name, intake.amount_grams, old, intake.calories
            );
        }

        let total = FoodIntake::total_calories_for_day(conn, dog_id, &date)?;
        println!("Recalculated {} feedings, day total {} kcal", updated.len(), total);
        Ok(())
    })?;

    Ok(())
}
