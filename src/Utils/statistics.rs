use log::info;
use tabled::{builder::Builder, settings::Style};

/// render key-value pairs as a rounded table, in insertion order
pub fn statistics_table(rows: &[(String, String)]) -> String {
    let mut builder = Builder::default();
    builder.push_record(vec!["parameter".to_string(), "value".to_string()]);
    for (key, value) in rows {
        builder.push_record(vec![key.clone(), value.clone()]);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

/// log a titled statistics table at info level
pub fn log_statistics(title: &str, rows: &[(String, String)]) {
    info!("\n \n {} \n \n {}", title, statistics_table(rows));
}

/// table with one row per method for batch runs (solve_all, integrate_all)
pub fn comparison_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(header.iter().map(|h| h.to_string()).collect::<Vec<String>>());
    for row in rows {
        builder.push_record(row.clone());
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}
