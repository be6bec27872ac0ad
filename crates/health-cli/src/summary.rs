use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use health_cli::types::{ConvertResult, SourceStatus, SourceSummary};

pub fn print_summary(result: &ConvertResult) {
    match &result.output {
        Some(path) => println!("Output: {}", path.display()),
        None => println!("Output: (dry run, nothing written)"),
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("Path"),
        header_cell("Status"),
        header_cell("Added"),
        header_cell("Details"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    for summary in &result.sources {
        table.add_row(vec![
            Cell::new(summary.kind.label())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(summary.path.display()),
            status_cell(&summary.status),
            added_cell(summary),
            detail_cell(summary),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(result.total_records).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");

    if !result.type_counts.is_empty() {
        let mut tally = Table::new();
        tally.set_header(vec![header_cell("Type"), header_cell("Records")]);
        apply_table_style(&mut tally);
        align_column(&mut tally, 1, CellAlignment::Right);
        for (record_type, count) in &result.type_counts {
            tally.add_row(vec![Cell::new(record_type), Cell::new(count)]);
        }
        println!();
        println!("Records by type:");
        println!("{tally}");
    }

    let failures: Vec<&SourceSummary> = result.failed_sources().collect();
    if !failures.is_empty() {
        eprintln!("Errors:");
        for summary in failures {
            eprintln!("- {}: {}", summary.kind, summary.status);
        }
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn status_cell(status: &SourceStatus) -> Cell {
    match status {
        SourceStatus::Processed => Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        SourceStatus::Truncated => Cell::new(status.label()).fg(Color::Yellow),
        SourceStatus::Missing | SourceStatus::Skipped => dim_cell(status.label()),
        SourceStatus::Failed(_) => Cell::new(status.label())
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
    }
}

fn added_cell(summary: &SourceSummary) -> Cell {
    match summary.status {
        SourceStatus::Missing | SourceStatus::Skipped => dim_cell("-"),
        _ => Cell::new(summary.added),
    }
}

fn detail_cell(summary: &SourceSummary) -> Cell {
    match (&summary.status, &summary.detail) {
        (SourceStatus::Failed(message), _) => Cell::new(message).fg(Color::Red),
        (_, Some(detail)) => Cell::new(detail),
        (_, None) => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
