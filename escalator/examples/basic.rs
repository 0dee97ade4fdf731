// Example: a headless grid with frozen columns, a spacer and scroll-to helpers.
use escalator::{
    Escalator, EscalatorError, EscalatorOptions, FlyweightCell, FlyweightRow, HeadlessSurface,
    RowContainer, RowUpdater, ScrollDestination, Section,
};

struct Printer;

impl RowUpdater for Printer {
    fn update(&mut self, row: &FlyweightRow, cells: &[FlyweightCell]) {
        if row.row() % 250 == 0 {
            println!("render row {} ({} cells)", row.row(), cells.len());
        }
    }
}

fn main() -> Result<(), EscalatorError> {
    let options = EscalatorOptions::new(400.0, 300.0).with_row_height(24.0);
    let mut escalator = Escalator::new(HeadlessSurface::new(), options);

    escalator.insert_columns(0, 8)?;
    escalator.set_frozen_column_count(1)?;
    escalator.body().set_updater(Box::new(Printer));
    escalator.attach();

    escalator.header().insert_rows(0, 1)?;
    escalator.body().insert_rows(0, 1_000_000)?;
    escalator.body().set_spacer(10, 120.0)?;

    println!(
        "body_height={} capacity={} content={}",
        escalator.body_height(),
        escalator.max_visible_row_count(),
        escalator.body().content_height()
    );
    println!("visible_rows={}", escalator.visible_row_range());

    escalator.scroll_to_row(500_000, ScrollDestination::Middle, 0.0)?;
    println!(
        "after scroll_to_row: top={} visible_rows={}",
        escalator.scroll_top(),
        escalator.visible_row_range()
    );

    escalator.scroll_to_column(6, ScrollDestination::Any, 0.0)?;
    println!("after scroll_to_column: left={}", escalator.scroll_left());

    let children = escalator.surface().children(Section::Body).len();
    println!("body elements={children} (rows are reused, not created)");
    Ok(())
}
