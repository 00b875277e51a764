use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use chart_model::{AuxiliaryElement, Channel, Phase, VisualizationResult};

pub fn print_summary(result: &VisualizationResult) {
    println!(
        "Pattern: {} ({})",
        result.pattern,
        result.pattern.description()
    );
    println!("Template: {}", result.template_id);
    if !result.auxiliary.is_empty() {
        let names: Vec<&str> = result
            .auxiliary
            .iter()
            .copied()
            .map(AuxiliaryElement::as_str)
            .collect();
        println!("Auxiliary: {}", names.join(", "));
    }
    if !result.operations_applied.is_empty() {
        println!("Operations: {}", result.operations_applied.join(" -> "));
    }
    println!("{}", rows_line(result));
    println!("{}", mapping_table(result));
    println!("{}", timing_table(result));
    if !result.warnings.is_empty() {
        eprintln!("Warnings:");
        for warning in &result.warnings {
            eprintln!("- {warning}");
        }
    }
}

fn rows_line(result: &VisualizationResult) -> String {
    let stats = &result.stats;
    if stats.sampled {
        format!(
            "Rows: {} x {} (sampled from {})",
            stats.rows, stats.cols, stats.original_rows
        )
    } else {
        format!("Rows: {} x {}", stats.rows, stats.cols)
    }
}

pub fn mapping_table(result: &VisualizationResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Channel"), header_cell("Column")]);
    apply_table_style(&mut table);
    for channel in Channel::ALL {
        if let Some(column) = result.mapping.get(channel) {
            table.add_row(vec![channel_cell(channel), Cell::new(column)]);
        }
    }
    table
}

pub fn timing_table(result: &VisualizationResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Phase"), header_cell("ms")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for phase in Phase::ALL {
        match result.timings.get(phase) {
            Some(ms) => table.add_row(vec![Cell::new(phase), Cell::new(ms)]),
            None => table.add_row(vec![dim_cell(phase), dim_cell("-")]),
        };
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(result.timings.total_ms).add_attribute(Attribute::Bold),
    ]);
    table
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
        .set_width(80);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn channel_cell(channel: Channel) -> Cell {
    Cell::new(channel)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn dim_cell(value: impl ToString) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
