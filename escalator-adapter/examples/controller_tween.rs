use escalator::{
    EscalatorError, EscalatorOptions, HeadlessSurface, RowContainer, ScrollDestination,
};
use escalator_adapter::{Controller, Easing, TouchPoint};

fn main() -> Result<(), EscalatorError> {
    // Example: a controller driving tween and inertia scrolling without holding any UI objects.
    //
    // An adapter would:
    // - forward wheel/touch events and start tweens for "scroll to row" commands
    // - call tick(now_ms) in a frame loop / timer
    // - apply the returned scroll state to the real scroll container (if any)
    let options = EscalatorOptions::new(300.0, 200.0).with_row_height(20.0);
    let mut c = Controller::new(HeadlessSurface::new(), options);
    c.escalator_mut().insert_columns(0, 3)?;
    c.escalator_mut().attach();
    c.escalator_mut().body().insert_rows(0, 10_000)?;

    let target = c.start_tween_to_row(
        2_000,
        ScrollDestination::Middle,
        0.0,
        0,
        240,
        Easing::SmoothStep,
    )?;
    println!("target_top={target}");

    let mut now_ms = 0u64;
    while let Some(state) = c.tick(now_ms) {
        if now_ms % 80 == 0 {
            println!(
                "t={now_ms} top={} visible={}",
                state.scroll_top,
                c.escalator().visible_row_range()
            );
        }
        now_ms += 16;
    }

    // A quick upward fling: 40px every 10ms.
    c.on_touch_start(1, TouchPoint::new(50.0, 400.0), now_ms);
    for step in 1..=4u64 {
        let y = 400.0 - 40.0 * step as f64;
        c.on_touch_move(TouchPoint::new(50.0, y), now_ms + 10 * step);
    }
    now_ms += 40;
    println!("inertia={}", c.on_touch_end(now_ms));
    while let Some(state) = c.tick(now_ms) {
        now_ms += 16;
        if !c.is_animating() {
            println!("rest at top={} after t={now_ms}", state.scroll_top);
        }
    }
    Ok(())
}
