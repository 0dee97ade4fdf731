use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use escalator::{
    ElementId, Escalator, EscalatorOptions, FlyweightCell, FlyweightRow, HeadlessSurface, Range,
    RowContainer, RowUpdater, ScrollDestination, Section, get_scroll_pos,
};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    /// Insert at `at` (a fraction of the row count) `count` rows.
    Insert(f64, usize),
    Remove(f64, usize),
    Scroll(f64),
    Spacer(f64, f64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0.0..=1.0f64, 1usize..40).prop_map(|(at, n)| Op::Insert(at, n)),
        (0.0..1.0f64, 1usize..40).prop_map(|(at, n)| Op::Remove(at, n)),
        (0.0..=1.0f64).prop_map(Op::Scroll),
        (0.0..1.0f64, 0.0..80.0f64).prop_map(|(at, h)| Op::Spacer(at, h)),
    ]
}

/// Data ids in logical row order, and the id each row element last rendered.
#[derive(Clone, Default)]
struct Data(Arc<Mutex<DataState>>);

#[derive(Default)]
struct DataState {
    ids: Vec<u64>,
    next_id: u64,
    rendered: HashMap<ElementId, u64>,
}

impl Data {
    fn insert(&self, index: usize, count: usize) {
        let mut state = self.0.lock().unwrap();
        let first = state.next_id;
        state.next_id += count as u64;
        state.ids.splice(index..index, first..first + count as u64);
    }

    fn remove(&self, index: usize, count: usize) {
        self.0.lock().unwrap().ids.drain(index..index + count);
    }

    fn id(&self, row: usize) -> u64 {
        self.0.lock().unwrap().ids[row]
    }

    fn rendered(&self, element: ElementId) -> Option<u64> {
        self.0.lock().unwrap().rendered.get(&element).copied()
    }
}

impl RowUpdater for Data {
    fn update(&mut self, row: &FlyweightRow, _cells: &[FlyweightCell]) {
        let mut state = self.0.lock().unwrap();
        let id = state.ids[row.row()];
        state.rendered.insert(row.element().unwrap(), id);
    }

    fn post_detach(&mut self, row: &FlyweightRow, _cells: &[FlyweightCell]) {
        let element = row.element().unwrap();
        self.0.lock().unwrap().rendered.remove(&element);
    }
}

fn grid(rows: usize) -> (Escalator<HeadlessSurface>, Data) {
    let data = Data::default();
    let options = EscalatorOptions::new(300.0, 200.0).with_row_height(20.0);
    let mut escalator = Escalator::new(HeadlessSurface::new(), options);
    escalator.insert_columns(0, 2).unwrap();
    escalator.body().set_updater(Box::new(data.clone()));
    escalator.attach();
    if rows > 0 {
        data.insert(0, rows);
        escalator.body().insert_rows(0, rows).unwrap();
    }
    (escalator, data)
}

fn apply(escalator: &mut Escalator<HeadlessSurface>, data: &Data, op: &Op) {
    let rows = escalator.row_count(Section::Body);
    let index = |at: f64, limit: usize| ((at * limit as f64) as usize).min(limit);
    match *op {
        Op::Insert(at, count) => {
            let at = index(at, rows);
            data.insert(at, count);
            escalator.body().insert_rows(at, count).unwrap();
        }
        Op::Remove(at, count) if rows > 0 => {
            let start = index(at, rows - 1);
            let count = count.min(rows - start);
            data.remove(start, count);
            escalator.body().remove_rows(start, count).unwrap();
        }
        Op::Spacer(at, height) if rows > 0 => {
            let row = index(at, rows - 1) as isize;
            escalator.body().set_spacer(row, height).unwrap();
        }
        Op::Scroll(at) | Op::Remove(at, _) | Op::Spacer(at, _) => {
            let max = escalator.vertical_scrollbar().max_scroll_pos();
            escalator.set_scroll_top(at * max);
        }
    }
}

fn check_pool(escalator: &mut Escalator<HeadlessSurface>, data: &Data) -> Result<(), TestCaseError> {
    let rows = escalator.row_count(Section::Body);
    let visible = escalator.visible_row_range();
    prop_assert!(visible.end() <= rows);
    prop_assert_eq!(
        visible.len(),
        escalator.max_visible_row_count().min(rows)
    );
    prop_assert_eq!(escalator.body().dom_row_count(), visible.len());
    let children = escalator.surface().children(Section::Body).len();
    prop_assert!(children >= visible.len());

    let mut previous = None;
    for row in visible {
        let element = escalator.body().row_element(row).unwrap();
        prop_assert_eq!(data.rendered(element), Some(data.id(row)), "content of row {}", row);
        let y = escalator.surface().position(element).unwrap().1;
        let top = escalator.body().row_top(row);
        prop_assert!((y - top).abs() < 1e-6, "row {} at {}, expected {}", row, y, top);
        if let Some(previous) = previous {
            prop_assert!(y > previous);
        }
        previous = Some(y);
    }

    let content = escalator.body().content_height();
    let expected = rows as f64 * 20.0 + escalator.body().spacer_heights_sum();
    prop_assert_eq!(content, expected);

    if !visible.is_empty() {
        let scroll_top = escalator.scroll_top();
        let viewport_bottom = (scroll_top + escalator.body_height()).min(content);
        let body = escalator.body();
        let first = visible.start();
        let last = visible.end() - 1;
        let top = body.row_top(first) - body.spacer_height(first as isize - 1).unwrap_or(0.0);
        let bottom = body.row_top(last) + 20.0 + body.spacer_height(last as isize).unwrap_or(0.0);
        prop_assert!(top <= scroll_top + 1e-6, "gap above row {}", first);
        prop_assert!(bottom + 1e-6 >= viewport_bottom, "gap below row {}", last);
    }
    Ok(())
}

proptest! {
    #[test]
    fn partition_is_contiguous_and_covers_self(
        start in 0usize..100,
        len in 0usize..100,
        other_start in 0usize..200,
        other_len in 0usize..100,
    ) {
        let range = Range::with_length(start, len);
        let other = Range::with_length(other_start, other_len);
        let [before, inside, after] = range.partition_with(&other);

        prop_assert_eq!(before.start(), range.start());
        prop_assert_eq!(before.end(), inside.start());
        prop_assert_eq!(inside.end(), after.start());
        prop_assert_eq!(after.end(), range.end());
        prop_assert_eq!(before.len() + inside.len() + after.len(), range.len());
        prop_assert!(inside.is_subset_of(&other) || inside.is_empty());
    }

    #[test]
    fn any_destination_is_a_no_op_for_visible_targets(
        viewport_start in 0.0..10_000.0f64,
        viewport_len in 50.0..1_000.0f64,
        offset in 0.0..1.0f64,
        len in 0.0..50.0f64,
    ) {
        let viewport_end = viewport_start + viewport_len;
        let start = viewport_start + offset * (viewport_len - len);
        let pos = get_scroll_pos(
            ScrollDestination::Any,
            start,
            start + len,
            viewport_start,
            viewport_end,
            0.0,
        ).unwrap();
        prop_assert_eq!(pos, viewport_start);
    }

    #[test]
    fn start_and_end_destinations_align_the_target(
        start in 0.0..10_000.0f64,
        len in 1.0..100.0f64,
        viewport_len in 100.0..1_000.0f64,
        padding in 0.0..20.0f64,
    ) {
        let top = get_scroll_pos(ScrollDestination::Start, start, start + len, 0.0, viewport_len, padding).unwrap();
        prop_assert_eq!(top, start - padding);
        let bottom = get_scroll_pos(ScrollDestination::End, start, start + len, 0.0, viewport_len, padding).unwrap();
        prop_assert_eq!(bottom + viewport_len, start + len + padding);
    }

    #[test]
    fn body_pool_stays_consistent_under_edits(
        rows in 0usize..300,
        ops in prop::collection::vec(op(), 1..40),
    ) {
        let (mut escalator, data) = grid(rows);
        check_pool(&mut escalator, &data)?;
        for op in &ops {
            apply(&mut escalator, &data, op);
            check_pool(&mut escalator, &data)?;
        }
    }

    #[test]
    fn the_deferred_sort_restores_physical_order(
        rows in 20usize..500,
        scrolls in prop::collection::vec(0.0..=1.0f64, 1..10),
    ) {
        let (mut escalator, _) = grid(rows);
        for at in scrolls {
            let max = escalator.vertical_scrollbar().max_scroll_pos();
            escalator.set_scroll_top(at * max);
        }

        let mut now = 0;
        while escalator.is_work_pending() {
            let tickets = escalator.surface_mut().take_frame_requests();
            prop_assert!(!tickets.is_empty());
            for ticket in tickets {
                escalator.on_animation_frame(ticket, now);
            }
            now += 16;
            prop_assert!(now < 10_000);
        }

        let expected: Vec<_> = escalator
            .visible_row_range()
            .into_iter()
            .map(|row| escalator.body().row_element(row).unwrap())
            .collect();
        prop_assert_eq!(escalator.surface().children(Section::Body), &expected[..]);
    }

    #[test]
    fn column_widths_sum_to_the_row_width(
        widths in prop::collection::vec(0.0..300.0f64, 1..12),
    ) {
        let (mut escalator, _) = grid(10);
        let count = escalator.columns().column_count();
        escalator.insert_columns(count, widths.len()).unwrap();
        let assignments: Vec<(usize, f64)> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| (count + i, *w))
            .collect();
        escalator.set_column_widths(&assignments).unwrap();

        let columns = escalator.columns();
        let sum: f64 = (0..columns.column_count())
            .map(|i| columns.column_width_actual(i).unwrap())
            .sum();
        prop_assert!((sum - columns.row_width()).abs() < 1e-6);

        let row = escalator.body().row_element(0).unwrap();
        prop_assert_eq!(escalator.surface().cells_of(row).len(), escalator.columns().column_count());
    }
}
