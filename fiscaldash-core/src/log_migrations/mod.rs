//! Log database migrations - embedded SQL files
//!
//! Each migration is a (file name, sql) pair compiled in with `include_str!`
//! and applied in order. `000_migrations.sql` creates the tracking table and
//! must stay first.

pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_sorted_and_tracking_first() {
        assert_eq!(LOG_MIGRATIONS[0].0, "000_migrations.sql");
        let names: Vec<&str> = LOG_MIGRATIONS.iter().map(|(n, _)| *n).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
