// Example: delivering animation frames so the body rows get their physical order back.
use escalator::{Escalator, EscalatorError, EscalatorOptions, HeadlessSurface, RowContainer};

fn main() -> Result<(), EscalatorError> {
    let options = EscalatorOptions::new(300.0, 200.0).with_row_height(20.0);
    let mut escalator = Escalator::new(HeadlessSurface::new(), options);
    escalator.insert_columns(0, 2)?;
    escalator.attach();
    escalator.body().insert_rows(0, 10_000)?;

    // Each scroll rotates rows and (re)schedules the sort.
    for top in [100.0, 250.0, 4_000.0] {
        escalator.set_scroll_top(top);
    }

    let mut now_ms = 0u64;
    while escalator.is_work_pending() {
        for ticket in escalator.surface_mut().take_frame_requests() {
            escalator.on_animation_frame(ticket, now_ms);
        }
        println!("t={now_ms} pending={}", escalator.is_work_pending());
        now_ms += 16;
    }
    println!("sorted rows={}", escalator.visible_row_range());
    Ok(())
}
