use crate::*;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        debug_assert!(start < end_exclusive);
        let span = (end_exclusive - start) as u64;
        start + (self.next_u64() % span) as usize
    }
}

/// Data ids of the body rows in logical order; inserted rows get fresh ids.
#[derive(Clone, Default)]
struct Model(Arc<Mutex<ModelData>>);

#[derive(Default)]
struct ModelData {
    ids: Vec<u64>,
    next_id: u64,
}

impl Model {
    fn insert(&self, index: usize, count: usize) {
        let mut data = self.0.lock().unwrap();
        let first = data.next_id;
        data.next_id += count as u64;
        data.ids.splice(index..index, first..first + count as u64);
    }

    fn remove(&self, index: usize, count: usize) {
        self.0.lock().unwrap().ids.drain(index..index + count);
    }

    fn id(&self, row: usize) -> u64 {
        self.0.lock().unwrap().ids[row]
    }
}

/// Element -> data id, as last rendered by the updater.
#[derive(Clone, Default)]
struct Bindings(Arc<Mutex<HashMap<ElementId, u64>>>);

impl Bindings {
    fn get(&self, element: ElementId) -> Option<u64> {
        self.0.lock().unwrap().get(&element).copied()
    }

    fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

#[derive(Clone, Default)]
struct Recorder {
    model: Model,
    bindings: Bindings,
    attached: Arc<Mutex<usize>>,
    detached: Arc<Mutex<usize>>,
}

impl Recorder {
    fn insert_rows(&self, escalator: &mut Escalator<HeadlessSurface>, index: usize, count: usize) {
        self.model.insert(index, count);
        escalator.body().insert_rows(index, count).unwrap();
    }

    fn remove_rows(&self, escalator: &mut Escalator<HeadlessSurface>, index: usize, count: usize) {
        self.model.remove(index, count);
        escalator.body().remove_rows(index, count).unwrap();
    }
}

impl RowUpdater for Recorder {
    fn post_attach(&mut self, _row: &FlyweightRow, _cells: &[FlyweightCell]) {
        *self.attached.lock().unwrap() += 1;
    }

    fn update(&mut self, row: &FlyweightRow, _cells: &[FlyweightCell]) {
        let element = row.element().unwrap();
        let id = self.model.id(row.row());
        self.bindings.0.lock().unwrap().insert(element, id);
    }

    fn post_detach(&mut self, row: &FlyweightRow, _cells: &[FlyweightCell]) {
        let element = row.element().unwrap();
        self.bindings.0.lock().unwrap().remove(&element);
        *self.detached.lock().unwrap() += 1;
    }
}

fn options() -> EscalatorOptions {
    EscalatorOptions::new(300.0, 200.0).with_row_height(20.0)
}

/// An attached 300x200 escalator with `columns` columns and `rows` body rows.
fn grid(rows: usize, columns: usize) -> Escalator<HeadlessSurface> {
    let mut escalator = Escalator::new(HeadlessSurface::new(), options());
    escalator.insert_columns(0, columns).unwrap();
    escalator.attach();
    if rows > 0 {
        escalator.body().insert_rows(0, rows).unwrap();
    }
    escalator
}

/// Like [`grid`], with rows rendered from a [`Model`] whose initial ids equal the row indexes.
fn recorded_grid(rows: usize, columns: usize) -> (Escalator<HeadlessSurface>, Recorder) {
    let recorder = Recorder::default();
    let mut escalator = Escalator::new(HeadlessSurface::new(), options());
    escalator.insert_columns(0, columns).unwrap();
    escalator.body().set_updater(Box::new(recorder.clone()));
    escalator.attach();
    if rows > 0 {
        recorder.insert_rows(&mut escalator, 0, rows);
    }
    (escalator, recorder)
}

fn body_row_y(escalator: &mut Escalator<HeadlessSurface>, row: usize) -> f64 {
    let element = escalator.body().row_element(row).unwrap();
    escalator.surface().position(element).unwrap().1
}

/// Pool size, row content, row placement and viewport coverage agree with the model.
fn assert_pool_consistent(escalator: &mut Escalator<HeadlessSurface>, recorder: &Recorder) {
    let rows = escalator.row_count(Section::Body);
    let expected = escalator.max_visible_row_count().min(rows);
    assert_eq!(escalator.body().dom_row_count(), expected);
    assert_eq!(recorder.bindings.len(), expected);

    let visible = escalator.visible_row_range();
    assert!(visible.is_subset_of(&Range::with_length(0, rows)), "{visible} beyond {rows}");
    for logical in visible {
        let element = escalator.body().row_element(logical).unwrap();
        assert_eq!(
            recorder.bindings.get(element),
            Some(recorder.model.id(logical)),
            "content of row {logical} (rendered {visible})"
        );
        let y = body_row_y(escalator, logical);
        assert_eq!(y, escalator.body().row_top(logical), "row {logical}");
    }
    assert_viewport_covered(escalator);
}

/// No blank gap between the viewport edges and the rendered rows and spacers.
fn assert_viewport_covered(escalator: &mut Escalator<HeadlessSurface>) {
    let visible = escalator.visible_row_range();
    if visible.is_empty() {
        return;
    }
    let scroll_top = escalator.scroll_top();
    let viewport_bottom = scroll_top + escalator.body_height();
    let row_height = escalator.default_row_height(Section::Body);
    let body = escalator.body();
    let content_bottom = body.content_height();

    let first = visible.start();
    let spacer_above = body.spacer_height(first as isize - 1).unwrap_or(0.0);
    let covered_top = body.row_top(first) - spacer_above;
    assert!(
        covered_top <= scroll_top + 1e-6,
        "gap above row {first}: rows start at {covered_top}, viewport at {scroll_top}"
    );

    let last = visible.end() - 1;
    let spacer_below = body.spacer_height(last as isize).unwrap_or(0.0);
    let covered_bottom = body.row_top(last) + row_height + spacer_below;
    assert!(
        covered_bottom + 1e-6 >= viewport_bottom.min(content_bottom),
        "gap below row {last}: rows end at {covered_bottom}, viewport at {viewport_bottom}"
    );
}

#[test]
fn range_partition_covers_self() {
    let range = Range::between(5, 15);
    let [before, inside, after] = range.partition_with(&Range::between(8, 20));
    assert_eq!(before, Range::between(5, 8));
    assert_eq!(inside, Range::between(8, 15));
    assert!(after.is_empty());
    assert_eq!(before.len() + inside.len() + after.len(), range.len());

    let [before, inside, after] = range.partition_with(&Range::between(0, 3));
    assert!(before.is_empty());
    assert!(inside.is_empty());
    assert_eq!(after, range);
}

#[test]
fn range_combine_restrict_and_offset() {
    let a = Range::with_length(10, 5);
    let b = Range::between(20, 22);
    assert_eq!(a.combine_with(&b), Range::between(10, 22));
    assert_eq!(Range::empty().combine_with(&b), b);
    assert_eq!(a.restrict_to(&Range::between(12, 100)), Range::between(12, 15));
    assert!(a.restrict_to(&b).is_empty());
    assert_eq!(a.offset_by(-10), Range::between(0, 5));
    assert!(a.intersects(&Range::with_only(14)));
    assert!(!a.intersects(&Range::with_only(15)));
    assert_eq!(a.to_string(), "[10..15)");
}

#[test]
fn position_tracker_records_shifts_and_resets() {
    let mut surface = HeadlessSurface::new();
    let mut positions = PositionTracker::new();
    let element = ElementId(7);

    assert_eq!(
        positions.top(element),
        Err(EscalatorError::UnknownElement(element))
    );
    positions.set(&mut surface, element, 10.0, 40.0);
    positions.shift(&mut surface, element, 5.0, -20.0).unwrap();
    assert_eq!(positions.get(element), Ok((15.0, 20.0)));
    assert_eq!(surface.position(element), Some((15.0, 20.0)));

    positions.reset(&mut surface, element);
    assert!(!positions.contains(element));
    assert_eq!(surface.position(element), None);
}

#[test]
fn scroll_pos_for_each_destination() {
    let pos = |d, padding| get_scroll_pos(d, 300.0, 320.0, 100.0, 300.0, padding).unwrap();
    assert_eq!(pos(ScrollDestination::Any, 0.0), 120.0);
    assert_eq!(pos(ScrollDestination::Start, 0.0), 300.0);
    assert_eq!(pos(ScrollDestination::Start, 10.0), 290.0);
    assert_eq!(pos(ScrollDestination::End, 5.0), 125.0);
    assert_eq!(pos(ScrollDestination::Middle, 0.0), 210.0);

    // Already fully visible: stay.
    let stay = get_scroll_pos(ScrollDestination::Any, 150.0, 170.0, 100.0, 300.0, 0.0).unwrap();
    assert_eq!(stay, 100.0);
    // Above the viewport: align the start.
    let up = get_scroll_pos(ScrollDestination::Any, 40.0, 60.0, 100.0, 300.0, 0.0).unwrap();
    assert_eq!(up, 40.0);
}

#[test]
fn middle_destination_rejects_padding() {
    let err = get_scroll_pos(ScrollDestination::Middle, 0.0, 20.0, 0.0, 100.0, 4.0).unwrap_err();
    assert!(matches!(err, EscalatorError::InvalidArgument(_)));
}

#[test]
fn snap_deltas_drops_the_minor_axis() {
    assert_eq!(snap_deltas(10.0, 1.0, 0.3), (10.0, 0.0));
    assert_eq!(snap_deltas(-1.0, -10.0, 0.3), (0.0, -10.0));
    assert_eq!(snap_deltas(10.0, 8.0, 0.3), (10.0, 8.0));
    assert_eq!(snap_deltas(0.0, 8.0, 0.3), (0.0, 8.0));
}

#[test]
fn scrollbar_clamps_truncates_and_locks() {
    let mut bar = ScrollbarBundle::new(Direction::Vertical, 15.0);
    bar.set_offset_size(200.0);
    bar.set_scroll_size(1000.0);
    assert!(bar.shows_scroll_handle());
    assert_eq!(bar.max_scroll_pos(), 800.0);

    bar.set_scroll_pos(123.9);
    assert_eq!(bar.scroll_pos(), 123.0);
    assert!(bar.is_work_pending());
    bar.set_scroll_pos(5000.0);
    assert_eq!(bar.scroll_pos(), 800.0);
    bar.set_scroll_pos(-5.0);
    assert_eq!(bar.scroll_pos(), 0.0);

    bar.set_locked(true);
    bar.set_scroll_pos(50.0);
    assert_eq!(bar.scroll_pos(), 0.0);
    bar.set_locked(false);

    bar.set_scroll_pos(400.0);
    bar.set_scroll_size(100.0);
    assert!(!bar.shows_scroll_handle());
    assert_eq!(bar.scroll_pos(), 0.0);
}

#[test]
fn body_materializes_only_the_viewport_capacity() {
    let escalator = grid(1000, 1);
    // 200px viewport of 20px rows, plus one row of overscan.
    assert_eq!(escalator.max_visible_row_count(), 11);
    assert_eq!(escalator.visible_row_range(), Range::with_length(0, 11));

    let small = grid(5, 1);
    assert_eq!(small.visible_row_range(), Range::with_length(0, 5));
    assert!(!small.vertical_scrollbar().shows_scroll_handle());
}

#[test]
fn scroll_to_row_start_rebinds_the_pool() {
    let (mut escalator, recorder) = recorded_grid(1000, 1);
    escalator
        .scroll_to_row(500, ScrollDestination::Start, 0.0)
        .unwrap();

    assert_eq!(escalator.body().top_row_index(), 500);
    assert_eq!(escalator.scroll_top(), 10_000.0);
    assert_eq!(escalator.surface().scroll_offset(Section::Body), (0.0, 10_000.0));
    assert_eq!(body_row_y(&mut escalator, 500), 10_000.0);
    assert_pool_consistent(&mut escalator, &recorder);
}

#[test]
fn spacer_insertion_shifts_following_rows_only() {
    let mut escalator = grid(100, 1);
    let before: Vec<f64> = (0..11).map(|r| body_row_y(&mut escalator, r)).collect();
    let scroll_size = escalator.vertical_scrollbar().scroll_size();

    escalator.body().set_spacer(5, 50.0).unwrap();

    assert_eq!(escalator.vertical_scrollbar().scroll_size(), scroll_size + 50.0);
    for row in 0..=5 {
        assert_eq!(body_row_y(&mut escalator, row), before[row], "row {row}");
    }
    for row in 6..11 {
        assert_eq!(body_row_y(&mut escalator, row), before[row] + 50.0, "row {row}");
    }
    let handle = escalator.body().spacer(5).unwrap();
    assert_eq!(handle.height, 50.0);
    assert_eq!(escalator.surface().position(handle.root), Some((0.0, 120.0)));
}

#[test]
fn removing_rows_at_the_top_rebinds_instead_of_destroying() {
    let (mut escalator, recorder) = recorded_grid(100, 1);
    let first_three: Vec<ElementId> = (0..3)
        .map(|r| escalator.body().row_element(r).unwrap())
        .collect();
    let live = escalator.surface().live_elements();

    recorder.remove_rows(&mut escalator, 0, 3);

    assert_eq!(escalator.body().top_row_index(), 0);
    assert_eq!(escalator.surface().live_elements(), live);
    assert_eq!(*recorder.detached.lock().unwrap(), 0);
    // Rebound to the data of former rows 11..14, now logical rows 8..11.
    for (offset, element) in first_three.iter().enumerate() {
        assert_eq!(recorder.bindings.get(*element), Some(11 + offset as u64));
        assert_eq!(escalator.body().row_element(8 + offset).unwrap(), *element);
    }
    assert_pool_consistent(&mut escalator, &recorder);
}

#[test]
fn pending_column_measurement_resolves_on_attach() {
    let mut escalator = Escalator::new(HeadlessSurface::new(), options());
    escalator.insert_columns(0, 3).unwrap();
    escalator.set_column_widths(&[(2, -1.0)]).unwrap();
    assert_eq!(escalator.columns().column_width_actual(2), Ok(-1.0));

    escalator.header().insert_rows(0, 1).unwrap();
    escalator.body().insert_rows(0, 5).unwrap();
    escalator.footer().insert_rows(0, 1).unwrap();
    let surface = escalator.surface_mut();
    surface.set_content_width(Section::Header, 2, 80.0);
    surface.set_content_width(Section::Body, 2, 150.0);
    surface.set_content_width(Section::Footer, 2, 60.0);

    escalator.attach();

    assert_eq!(escalator.columns().column_width_actual(2), Ok(150.0));
    assert_eq!(escalator.columns().column_width(2), Ok(-1.0));
    let row = escalator.body().row_element(0).unwrap();
    let cell = escalator.surface().cells_of(row)[2];
    assert_eq!(escalator.surface().width(cell), Some(150.0));
}

#[test]
fn scrolling_to_a_frozen_column_fails_without_scrolling() {
    let mut escalator = grid(10, 5);
    escalator.set_frozen_column_count(1).unwrap();
    escalator.set_scroll_left(40.0);
    assert_eq!(escalator.scroll_left(), 40.0);

    let err = escalator
        .scroll_to_column(0, ScrollDestination::Any, 0.0)
        .unwrap_err();
    assert!(matches!(err, EscalatorError::InvalidArgument(_)));
    assert_eq!(escalator.scroll_left(), 40.0);

    let err = escalator
        .scroll_to_column(9, ScrollDestination::Any, 0.0)
        .unwrap_err();
    assert!(matches!(err, EscalatorError::IndexOutOfBounds { index: 9, .. }));
}

#[test]
fn scroll_to_column_accounts_for_frozen_width() {
    let mut escalator = grid(5, 5);
    escalator.set_frozen_column_count(1).unwrap();
    // Column 4 spans 300..400 of the unfrozen content; 200px of it are visible.
    escalator
        .scroll_to_column(4, ScrollDestination::End, 0.0)
        .unwrap();
    assert_eq!(escalator.scroll_left(), 200.0);
    escalator
        .scroll_to_column(1, ScrollDestination::Start, 0.0)
        .unwrap();
    assert_eq!(escalator.scroll_left(), 0.0);
}

#[test]
fn invalid_row_operations_leave_state_untouched() {
    let mut escalator = grid(10, 1);
    let visible = escalator.visible_row_range();

    let err = escalator.body().insert_rows(0, 0).unwrap_err();
    assert!(matches!(err, EscalatorError::InvalidArgument(_)));
    let err = escalator.body().insert_rows(11, 1).unwrap_err();
    assert!(matches!(err, EscalatorError::IndexOutOfBounds { index: 11, .. }));
    let err = escalator.body().remove_rows(8, 3).unwrap_err();
    assert!(matches!(err, EscalatorError::IndexOutOfBounds { .. }));
    let err = escalator.header().refresh_rows(0, 1).unwrap_err();
    assert!(matches!(err, EscalatorError::IndexOutOfBounds { .. }));
    let err = escalator.body().set_default_row_height(0.5).unwrap_err();
    assert!(matches!(err, EscalatorError::InvalidArgument(_)));
    let err = escalator.set_column_width(3, 10.0).unwrap_err();
    assert!(matches!(err, EscalatorError::InvalidArgument(_)));

    assert_eq!(escalator.row_count(Section::Body), 10);
    assert_eq!(escalator.visible_row_range(), visible);
    assert_eq!(escalator.body().default_row_height(), 20.0);
}

#[test]
fn row_element_of_an_unrendered_row_is_an_illegal_state() {
    let mut escalator = grid(1000, 1);
    let err = escalator.body().row_element(500).unwrap_err();
    assert!(matches!(err, EscalatorError::IllegalState(_)));

    let mut detached = Escalator::new(HeadlessSurface::new(), options());
    detached.insert_columns(0, 1).unwrap();
    detached.header().insert_rows(0, 2).unwrap();
    let err = detached.header().row_element(1).unwrap_err();
    assert!(matches!(err, EscalatorError::IllegalState(_)));
}

#[test]
fn removing_every_row_empties_the_pool() {
    let (mut escalator, recorder) = recorded_grid(100, 1);
    escalator.set_scroll_top(500.0);
    recorder.remove_rows(&mut escalator, 0, 100);

    assert_eq!(escalator.body().dom_row_count(), 0);
    assert!(escalator.visible_row_range().is_empty());
    assert_eq!(*recorder.detached.lock().unwrap(), 11);
    assert_eq!(escalator.scroll_top(), 0.0);
}

#[test]
fn removing_below_capacity_compacts_the_pool() {
    let (mut escalator, recorder) = recorded_grid(12, 1);
    recorder.remove_rows(&mut escalator, 2, 6);

    assert_eq!(escalator.row_count(Section::Body), 6);
    assert_eq!(escalator.visible_row_range(), Range::with_length(0, 6));
    assert_pool_consistent(&mut escalator, &recorder);
}

#[test]
fn inserting_above_the_viewport_keeps_the_content_in_place() {
    let (mut escalator, recorder) = recorded_grid(100, 1);
    escalator.set_scroll_top(400.0);
    let element = escalator.body().row_element(25).unwrap();

    recorder.insert_rows(&mut escalator, 3, 4);

    assert_eq!(escalator.scroll_top(), 480.0);
    assert_eq!(escalator.body().row_element(29).unwrap(), element);
    // Content moved along with the data; the row was not re-rendered.
    assert_eq!(recorder.bindings.get(element), Some(25));
    assert_pool_consistent(&mut escalator, &recorder);
}

#[test]
fn inserting_into_rows_pushed_below_the_viewport_by_a_spacer_renders_them() {
    let (mut escalator, recorder) = recorded_grid(100, 1);
    escalator.body().set_spacer(3, 100.0).unwrap();
    // Row 8 is rendered at 260, below the 200px viewport.
    assert_eq!(body_row_y(&mut escalator, 8), 260.0);

    recorder.insert_rows(&mut escalator, 8, 1);

    assert_eq!(escalator.visible_row_range(), Range::with_length(0, 11));
    let element = escalator.body().row_element(8).unwrap();
    assert_eq!(recorder.bindings.get(element), Some(100));
    assert_pool_consistent(&mut escalator, &recorder);

    escalator.set_scroll_top(100.0);
    assert_eq!(escalator.visible_row_range(), Range::with_length(4, 11));
    assert_pool_consistent(&mut escalator, &recorder);
}

#[test]
fn jumping_to_the_end_past_spacers_rebinds_the_whole_pool() {
    let (mut escalator, recorder) = recorded_grid(100, 1);
    escalator.body().set_spacer(95, 60.0).unwrap();
    escalator.body().set_spacer(97, 60.0).unwrap();

    escalator
        .scroll_to_row(99, ScrollDestination::End, 0.0)
        .unwrap();

    assert_eq!(escalator.scroll_top(), 1920.0);
    assert_eq!(escalator.visible_row_range(), Range::with_length(89, 11));
    assert_eq!(body_row_y(&mut escalator, 90), 1800.0);
    assert_pool_consistent(&mut escalator, &recorder);

    for top in [1500.0, 1850.0, 1990.0, 0.0] {
        escalator.set_scroll_top(top);
        assert_pool_consistent(&mut escalator, &recorder);
    }
}

type SpacerSnapshot = Vec<(isize, f64, Option<(f64, f64)>)>;

fn spacer_snapshot(escalator: &mut Escalator<HeadlessSurface>, rows: &[isize]) -> SpacerSnapshot {
    rows.iter()
        .map(|&row| {
            let handle = escalator.body().spacer(row).unwrap();
            (row, handle.height, escalator.surface().position(handle.root))
        })
        .collect()
}

#[test]
fn inserting_then_removing_rows_restores_rows_and_spacers() {
    let spacer_rows = [2, 20, 40];
    for scroll_top in [0.0, 400.0, 1000.0] {
        for index in [10, 50] {
            let (mut escalator, recorder) = recorded_grid(100, 1);
            for (row, height) in spacer_rows.iter().zip([30.0, 50.0, 25.0]) {
                escalator.body().set_spacer(*row, height).unwrap();
            }
            escalator.set_scroll_top(scroll_top);
            let spacers = spacer_snapshot(&mut escalator, &spacer_rows);
            let content = escalator.body().content_height();
            let visible = escalator.visible_row_range();

            recorder.insert_rows(&mut escalator, index, 3);
            assert_pool_consistent(&mut escalator, &recorder);
            recorder.remove_rows(&mut escalator, index, 3);

            let context = format!("scroll {scroll_top}, index {index}");
            assert_eq!(escalator.row_count(Section::Body), 100, "{context}");
            assert_eq!(escalator.scroll_top(), scroll_top, "{context}");
            assert_eq!(escalator.visible_row_range(), visible, "{context}");
            assert_eq!(escalator.body().content_height(), content, "{context}");
            assert_eq!(spacer_snapshot(&mut escalator, &spacer_rows), spacers, "{context}");
            assert_pool_consistent(&mut escalator, &recorder);
        }
    }
}

#[test]
fn resizing_to_the_same_size_leaves_the_pool_alone() {
    let (mut escalator, recorder) = recorded_grid(1000, 1);
    escalator.set_scroll_top(5_000.0);

    for (height, rendered) in [(400.0, 21), (200.0, 11)] {
        escalator.set_size(300.0, height);
        assert_eq!(escalator.body().dom_row_count(), rendered);
        assert_pool_consistent(&mut escalator, &recorder);

        let attached = *recorder.attached.lock().unwrap();
        let detached = *recorder.detached.lock().unwrap();
        let live = escalator.surface().live_elements();
        let visible = escalator.visible_row_range();

        escalator.set_size(300.0, height);

        assert_eq!(*recorder.attached.lock().unwrap(), attached);
        assert_eq!(*recorder.detached.lock().unwrap(), detached);
        assert_eq!(escalator.surface().live_elements(), live);
        assert_eq!(escalator.visible_row_range(), visible);
        assert_pool_consistent(&mut escalator, &recorder);
    }
}

#[test]
fn spacer_sums_follow_pixel_positions() {
    let mut escalator = grid(100, 1);
    escalator.body().set_spacer(2, 30.0).unwrap();
    escalator.body().set_spacer(5, 40.0).unwrap();

    let body = escalator.body();
    assert!(body.spacer_exists(2));
    assert_eq!(body.spacer_heights_sum(), 70.0);
    assert_eq!(body.spacer_heights_sum_until_index(5), 30.0);
    assert_eq!(body.spacer_heights_sum_until_index(6), 70.0);
    // Spacer 2 covers 60..90, spacer 5 covers 150..190.
    assert_eq!(body.spacer_heights_sum_until_px(100.0), 30.0);
    assert_eq!(body.spacer_heights_sum_until_px(160.0), 40.0);
    assert_eq!(
        body.spacer_heights_sum_between_px(
            70.0,
            SpacerInclusion::Complete,
            160.0,
            SpacerInclusion::None
        ),
        30.0
    );
    assert_eq!(body.spacers_after_px(70.0, SpacerInclusion::Partial), vec![2, 5]);
    assert_eq!(body.spacers_after_px(70.0, SpacerInclusion::None), vec![5]);
    assert_eq!(body.row_top(6), 150.0 + 40.0);
}

#[test]
fn negative_spacer_height_removes_the_spacer() {
    let mut escalator = grid(100, 1);
    escalator.body().set_spacer(5, 50.0).unwrap();
    let handle = escalator.body().spacer(5).unwrap();

    escalator.body().set_spacer(5, -1.0).unwrap();

    assert!(!escalator.body().spacer_exists(5));
    assert_eq!(escalator.vertical_scrollbar().scroll_size(), 2000.0);
    assert_eq!(escalator.surface().kind(handle.root), None);
    assert_eq!(body_row_y(&mut escalator, 6), 120.0);

    let err = escalator.body().set_spacer(100, 10.0).unwrap_err();
    assert!(matches!(err, EscalatorError::InvalidArgument(_)));
}

#[test]
fn spacers_move_with_inserted_and_removed_rows() {
    let mut escalator = grid(100, 1);
    escalator.body().set_spacer(5, 50.0).unwrap();

    escalator.body().insert_rows(0, 2).unwrap();
    assert!(escalator.body().spacer_exists(7));
    assert!(!escalator.body().spacer_exists(5));

    escalator.body().remove_rows(6, 2).unwrap();
    assert!(!escalator.body().spacer_exists(7));
    assert_eq!(escalator.body().spacer_heights_sum(), 0.0);
}

#[test]
fn scroll_to_row_and_spacer_targets_both() {
    let mut escalator = grid(100, 1);
    escalator.body().set_spacer(10, 100.0).unwrap();

    // Row 10 spans 200..220, its spacer 220..320.
    escalator
        .scroll_to_row_and_spacer(10, ScrollDestination::End, 0.0)
        .unwrap();
    assert_eq!(escalator.scroll_top(), 120.0);

    escalator
        .scroll_to_spacer(10, ScrollDestination::Start, 0.0)
        .unwrap();
    assert_eq!(escalator.scroll_top(), 220.0);

    let err = escalator
        .scroll_to_row_and_spacer(-1, ScrollDestination::Any, 0.0)
        .unwrap_err();
    assert!(matches!(err, EscalatorError::InvalidArgument(_)));
    let err = escalator
        .scroll_to_row_and_spacer(-2, ScrollDestination::Any, 0.0)
        .unwrap_err();
    assert!(matches!(err, EscalatorError::IndexOutOfBounds { index: -2, .. }));
    let err = escalator
        .scroll_to_row(3, ScrollDestination::Middle, 2.0)
        .unwrap_err();
    assert!(matches!(err, EscalatorError::InvalidArgument(_)));
}

#[test]
fn detach_destroys_elements_and_attach_restores_them() {
    let mut escalator = grid(100, 2);
    escalator.header().insert_rows(0, 1).unwrap();
    escalator.body().set_spacer(3, 25.0).unwrap();
    assert!(escalator.surface().live_elements() > 0);

    escalator.detach();
    assert!(!escalator.is_attached());
    assert_eq!(escalator.surface().live_elements(), 0);
    assert!(escalator.body().spacer_exists(3));
    assert_eq!(escalator.body().spacer_height(3), Some(25.0));

    escalator.body().insert_rows(0, 1).unwrap();
    escalator.attach();
    assert_eq!(escalator.body().spacer_height(4), Some(25.0));
    assert!(escalator.body().spacer(4).is_some());
    assert_eq!(escalator.surface().children(Section::Header).len(), 1);
    assert_eq!(escalator.visible_row_range(), Range::with_length(0, 11));
}

#[test]
fn row_hooks_pair_up_over_the_lifecycle() {
    let (mut escalator, recorder) = recorded_grid(30, 1);
    assert_eq!(*recorder.attached.lock().unwrap(), 11);
    escalator.detach();
    assert_eq!(*recorder.detached.lock().unwrap(), 11);
    assert_eq!(recorder.bindings.len(), 0);
}

#[test]
fn row_height_mode_sizes_to_the_rows() {
    let mut escalator = Escalator::new(
        HeadlessSurface::new(),
        options()
            .with_height_mode(HeightMode::Row)
            .with_height_by_rows(5.0),
    );
    escalator.insert_columns(0, 1).unwrap();
    escalator.header().insert_rows(0, 1).unwrap();
    escalator.footer().insert_rows(0, 1).unwrap();
    escalator.body().insert_rows(0, 50).unwrap();
    escalator.attach();

    assert_eq!(escalator.height(), 20.0 + 5.0 * 20.0 + 20.0);
    assert_eq!(escalator.body_height(), 100.0);

    escalator.set_height_by_rows(2.5).unwrap();
    assert_eq!(escalator.height(), 90.0);

    escalator.set_height_mode(HeightMode::Css);
    assert_eq!(escalator.height(), 200.0);

    for rows in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = escalator.set_height_by_rows(rows).unwrap_err();
        assert!(matches!(err, EscalatorError::InvalidArgument(_)));
    }
    assert_eq!(escalator.height_by_rows(), 2.5);
}

#[test]
fn wheel_scrolls_by_lines_and_reports_whether_it_was_used() {
    let mut escalator = grid(100, 1);
    assert!(escalator.on_wheel(0.0, 3.0, WheelDeltaMode::Line));
    assert_eq!(escalator.scroll_top(), 60.0);
    assert!(escalator.on_wheel(0.0, -25.0, WheelDeltaMode::Pixel));
    assert_eq!(escalator.scroll_top(), 35.0);
    // No horizontal overflow.
    assert!(!escalator.on_wheel(10.0, 0.0, WheelDeltaMode::Pixel));

    let mut small = grid(3, 1);
    assert!(!small.on_wheel(0.0, 50.0, WheelDeltaMode::Pixel));
    assert_eq!(small.scroll_top(), 0.0);
}

#[test]
fn locked_scrollbars_ignore_input() {
    let mut escalator = grid(100, 1);
    escalator.set_scroll_locked(Direction::Vertical, true);
    assert!(escalator.is_scroll_locked(Direction::Vertical));
    escalator.on_wheel(0.0, 100.0, WheelDeltaMode::Pixel);
    escalator.set_scroll_top(300.0);
    assert_eq!(escalator.scroll_top(), 0.0);

    escalator.set_scroll_locked(Direction::Vertical, false);
    escalator.set_scroll_top(300.0);
    assert_eq!(escalator.scroll_top(), 300.0);
}

#[test]
fn frozen_cells_follow_horizontal_scroll() {
    let mut escalator = grid(100, 5);
    escalator.header().insert_rows(0, 1).unwrap();
    escalator.set_frozen_column_count(2).unwrap();
    escalator.set_scroll_left(50.0);

    let header = escalator.header().row_element(0).unwrap();
    let body = escalator.body().row_element(0).unwrap();
    let surface = escalator.surface();
    for row in [header, body] {
        let cells = surface.cells_of(row);
        assert_eq!(surface.position(cells[0]), Some((50.0, 0.0)));
        assert_eq!(surface.position(cells[1]), Some((50.0, 0.0)));
        assert!(surface.has_class(cells[1], "last-frozen"));
        assert!(!surface.has_class(cells[0], "last-frozen"));
        assert!(!surface.has_class(cells[2], "frozen"));
    }
    assert_eq!(surface.scroll_offset(Section::Header), (50.0, 0.0));

    escalator.set_frozen_column_count(0).unwrap();
    let surface = escalator.surface();
    let cells = surface.cells_of(body);
    assert!(!surface.has_class(cells[0], "frozen"));
    assert_eq!(surface.position(cells[0]), None);
}

#[test]
fn columns_inserted_left_of_the_viewport_push_the_scroll_position() {
    let mut escalator = grid(100, 5);
    escalator.set_scroll_left(150.0);
    escalator.insert_columns(0, 1).unwrap();
    assert_eq!(escalator.scroll_left(), 250.0);
    assert_eq!(escalator.columns().row_width(), 600.0);

    let row = escalator.body().row_element(0).unwrap();
    assert_eq!(escalator.surface().cells_of(row).len(), 6);
    assert_eq!(escalator.surface().width(row), Some(600.0));

    escalator.remove_columns(0, 2).unwrap();
    assert_eq!(escalator.scroll_left(), 50.0);
    assert_eq!(escalator.surface().cells_of(row).len(), 4);
}

#[test]
fn frozen_block_grows_with_inserted_columns() {
    let mut escalator = grid(10, 4);
    escalator.set_frozen_column_count(2).unwrap();
    escalator.insert_columns(1, 2).unwrap();
    assert_eq!(escalator.columns().frozen_column_count(), 4);
    assert_eq!(escalator.columns().frozen_width(), 400.0);

    escalator.remove_columns(2, 4).unwrap();
    assert_eq!(escalator.columns().frozen_column_count(), 2);
    let row = escalator.body().row_element(0).unwrap();
    let cells = escalator.surface().cells_of(row).to_vec();
    assert!(escalator.surface().has_class(cells[1], "last-frozen"));

    let err = escalator.set_frozen_column_count(3).unwrap_err();
    assert!(matches!(err, EscalatorError::InvalidArgument(_)));
}

#[test]
fn deferred_sort_waits_for_frames_and_time() {
    let mut escalator = grid(100, 1);
    escalator.surface_mut().take_frame_requests();

    escalator.set_scroll_top(100.0);
    let tickets = escalator.surface_mut().take_frame_requests();
    let ticket = *tickets.last().unwrap();
    assert!(escalator.is_work_pending());

    let expected: Vec<ElementId> = (5..16)
        .map(|r| escalator.body().row_element(r).unwrap())
        .collect();
    assert_ne!(escalator.surface().children(Section::Body), expected.as_slice());

    escalator.on_animation_frame(ticket, 1_000);
    escalator.on_animation_frame(ticket, 1_016);
    assert!(escalator.is_work_pending());
    escalator.on_animation_frame(ticket, 1_032);
    // Enough frames, not enough time.
    assert!(escalator.is_work_pending());
    escalator.on_animation_frame(ticket, 1_060);

    assert!(!escalator.is_work_pending());
    assert_eq!(escalator.surface().children(Section::Body), expected.as_slice());
}

#[test]
fn rescheduling_invalidates_older_tickets() {
    let mut escalator = grid(100, 1);
    escalator.set_scroll_top(100.0);
    let old = *escalator.surface_mut().take_frame_requests().last().unwrap();
    escalator.set_scroll_top(300.0);
    let new = *escalator.surface_mut().take_frame_requests().last().unwrap();
    assert_ne!(old, new);

    escalator.on_animation_frame(old, 0);
    assert!(escalator.surface_mut().take_frame_requests().is_empty());
    escalator.on_animation_frame(new, 0);
    assert_eq!(escalator.surface_mut().take_frame_requests(), vec![new]);
}

#[test]
fn touch_holds_the_sort_until_released() {
    let mut escalator = grid(100, 1);
    escalator.set_touch_active(true);
    escalator.set_scroll_top(100.0);
    let ticket = *escalator.surface_mut().take_frame_requests().last().unwrap();
    for t in 0..10 {
        escalator.on_animation_frame(ticket, t * 100);
    }
    assert!(escalator.is_work_pending());

    escalator.set_touch_active(false);
    let ticket = *escalator.surface_mut().take_frame_requests().last().unwrap();
    for t in 0..4 {
        escalator.on_animation_frame(ticket, t * 20);
    }
    assert!(!escalator.is_work_pending());
}

#[test]
fn visibility_callback_reports_the_rendered_rows() {
    let events: Arc<Mutex<Vec<RowVisibility>>> = Arc::default();
    let sink = events.clone();
    let mut escalator = Escalator::new(
        HeadlessSurface::new(),
        options().with_on_row_visibility_change(Some(move |v| sink.lock().unwrap().push(v))),
    );
    escalator.insert_columns(0, 1).unwrap();
    escalator.attach();
    escalator.body().insert_rows(0, 100).unwrap();
    escalator.set_scroll_top(100.0);

    let last = *events.lock().unwrap().last().unwrap();
    assert_eq!(
        last,
        RowVisibility {
            first_visible_row: 5,
            visible_row_count: 11,
        }
    );
}

#[test]
fn default_row_height_change_repositions_and_resizes_the_pool() {
    let (mut escalator, recorder) = recorded_grid(100, 1);
    escalator.body().set_default_row_height(30.0).unwrap();

    assert_eq!(escalator.max_visible_row_count(), 8);
    assert_eq!(escalator.vertical_scrollbar().scroll_size(), 3000.0);
    assert_eq!(body_row_y(&mut escalator, 2), 60.0);
    assert_pool_consistent(&mut escalator, &recorder);
}

#[test]
fn cells_are_found_by_element() {
    let mut escalator = grid(100, 3);
    escalator.footer().insert_rows(0, 1).unwrap();
    escalator.set_scroll_top(200.0);

    let row = escalator.body().row_element(12).unwrap();
    let cell = escalator.surface().cells_of(row)[1];
    assert_eq!(
        escalator.cell_for(cell),
        Some(CellRef {
            section: Section::Body,
            row: 12,
            column: 1,
            element: cell,
        })
    );
    let footer = escalator.footer().row_element(0).unwrap();
    assert_eq!(escalator.find_section(footer), Some(Section::Footer));
    assert_eq!(escalator.cell_for(ElementId(u64::MAX)), None);
}

#[test]
fn style_name_is_applied_to_new_and_existing_elements() {
    let mut escalator = grid(5, 1);
    let row = escalator.body().row_element(0).unwrap();
    assert_eq!(escalator.surface().style_name(row), Some("v-escalator-row"));

    escalator.set_style_name("grid");
    assert_eq!(escalator.style_name(), "grid");
    assert_eq!(escalator.surface().style_name(row), Some("grid-row"));
    let cell = escalator.surface().cells_of(row)[0];
    assert_eq!(escalator.surface().style_name(cell), Some("grid-cell"));
}

#[test]
fn scrolling_rebinds_every_moved_row() {
    let (mut escalator, recorder) = recorded_grid(1000, 1);
    for top in [100.0, 130.0, 990.0, 19_800.0, 5_000.0, 0.0, 7.0] {
        escalator.set_scroll_top(top);
        assert_pool_consistent(&mut escalator, &recorder);
    }
    assert_eq!(escalator.visible_row_range(), Range::with_length(0, 11));
}

#[test]
fn random_edits_spacers_and_scrolls_keep_the_pool_consistent() {
    let mut rng = Lcg::new(0x5eed);
    let (mut escalator, recorder) = recorded_grid(200, 2);

    for _ in 0..300 {
        let rows = escalator.row_count(Section::Body);
        match rng.gen_range_usize(0, 5) {
            0 => {
                let index = rng.gen_range_usize(0, rows + 1);
                let count = rng.gen_range_usize(1, 20);
                recorder.insert_rows(&mut escalator, index, count);
            }
            1 if rows > 0 => {
                let index = rng.gen_range_usize(0, rows);
                let count = rng.gen_range_usize(1, (rows - index).min(15) + 1);
                recorder.remove_rows(&mut escalator, index, count);
            }
            2 if rows > 0 => {
                let row = rng.gen_range_usize(0, rows) as isize;
                let height = match rng.gen_range_usize(0, 4) {
                    0 => -1.0,
                    h => (h * 25) as f64,
                };
                escalator.body().set_spacer(row, height).unwrap();
            }
            _ => {
                let max = escalator.vertical_scrollbar().max_scroll_pos() as usize;
                let top = rng.gen_range_usize(0, max + 1);
                escalator.set_scroll_top(top as f64);
            }
        }
        assert_pool_consistent(&mut escalator, &recorder);
    }
}
