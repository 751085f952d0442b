//! Single-column scroll wheel bound to one [`Field`].
//!
//! The widget never owns the option list: every call that needs it borrows
//! the slice computed by the picker. It reconciles three sources of scroll
//! movement, the user's gesture, the settle/snap after the gesture and the
//! programmatic moves that follow a canonical value change, using an
//! explicit [`WheelPhase`] plus the orthogonal [`SyncGuard`].

use std::time::{Duration, Instant};

use tracing::trace;

use crate::calendar::Field;
use crate::timer::{SettleTimers, TimerToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelOption {
    pub value: i32,
    pub label: String,
}

impl WheelOption {
    pub fn new(value: i32, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelConfig {
    pub item_height: f32,
    /// Sentinel rows rendered above and below the options.
    pub padding: usize,
    /// Debounce after the pointer is released, absorbs momentum scrolling.
    pub interaction_settle_delay: Duration,
    /// Debounce after free scrolling (mouse wheel) with no pointer held.
    pub scroll_idle_delay: Duration,
    /// Offsets closer than this to an item boundary are not snapped.
    pub snap_tolerance: f32,
}

impl WheelConfig {
    pub fn visible_rows(&self) -> usize {
        self.padding * 2 + 1
    }

    pub fn viewport_height(&self) -> f32 {
        self.visible_rows() as f32 * self.item_height
    }
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            item_height: 50.0,
            padding: 1,
            interaction_settle_delay: Duration::from_millis(250),
            scroll_idle_delay: Duration::from_millis(150),
            snap_tolerance: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelPhase {
    /// Position matches the committed value and no timer is pending.
    Idle,
    /// Pointer or touch is held on the wheel.
    Dragging,
    /// Interaction ended; waiting for the settle timer before snapping.
    Settling { token: TimerToken<Field> },
}

/// Set while the widget is moving its own scroll position. Scroll events that
/// arrive while engaged are echoes of that move and are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncGuard {
    Released,
    Engaged { target: f32 },
}

/// Scroll position the host should apply to the wheel's viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub offset: f32,
    pub animate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WheelRow<'a> {
    /// Unselectable filler that lets the first and last option reach the
    /// centre of the viewport.
    Sentinel,
    Item {
        index: usize,
        option: &'a WheelOption,
        selected: bool,
    },
}

#[derive(Debug, Clone)]
pub struct WheelWidget {
    field: Field,
    config: WheelConfig,
    offset: f32,
    phase: WheelPhase,
    sync: SyncGuard,
    committed: Option<i32>,
    pending_scroll: Option<ScrollRequest>,
}

impl WheelWidget {
    pub fn new(field: Field, config: WheelConfig) -> Self {
        Self {
            field,
            config,
            offset: 0.0,
            phase: WheelPhase::Idle,
            sync: SyncGuard::Released,
            committed: None,
            pending_scroll: None,
        }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    pub fn phase(&self) -> WheelPhase {
        self.phase
    }

    pub fn sync_guard(&self) -> SyncGuard {
        self.sync
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn committed(&self) -> Option<i32> {
        self.committed
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == WheelPhase::Dragging
    }

    pub fn offset_for_index(&self, index: usize) -> f32 {
        index as f32 * self.config.item_height
    }

    /// Nearest option index for a raw offset, clamped to the option range.
    pub fn resolve_index(&self, offset: f32, option_count: usize) -> Option<usize> {
        if option_count == 0 {
            return None;
        }
        let raw = (offset / self.config.item_height).round();
        if !raw.is_finite() || raw <= 0.0 {
            return Some(0);
        }
        Some((raw as usize).min(option_count - 1))
    }

    /// Hands the host the scroll position it still has to apply, if any.
    pub fn take_scroll_request(&mut self) -> Option<ScrollRequest> {
        self.pending_scroll.take()
    }

    pub fn rows<'a>(&self, options: &'a [WheelOption]) -> Vec<WheelRow<'a>> {
        let mut rows = Vec::with_capacity(options.len() + self.config.padding * 2);
        rows.extend((0..self.config.padding).map(|_| WheelRow::Sentinel));
        rows.extend(
            options
                .iter()
                .enumerate()
                .map(|(index, option)| WheelRow::Item {
                    index,
                    option,
                    selected: self.committed == Some(option.value),
                }),
        );
        rows.extend((0..self.config.padding).map(|_| WheelRow::Sentinel));
        rows
    }

    pub fn pointer_down(&mut self, timers: &mut SettleTimers<Field>) {
        timers.cancel(self.field);
        self.sync = SyncGuard::Released;
        self.pending_scroll = None;
        self.phase = WheelPhase::Dragging;
        trace!(field = ?self.field, "wheel drag started");
    }

    /// Pointer up, touch end or cancel, or the pointer leaving the wheel.
    pub fn pointer_up(&mut self, timers: &mut SettleTimers<Field>, now: Instant) {
        if self.phase != WheelPhase::Dragging {
            return;
        }
        let token = timers.debounce(self.field, self.config.interaction_settle_delay, now);
        self.phase = WheelPhase::Settling { token };
        trace!(field = ?self.field, "wheel settling");
    }

    /// Reports the viewport's current offset. Returns a value to commit when
    /// the centred option changed.
    pub fn scrolled(
        &mut self,
        offset: f32,
        options: &[WheelOption],
        timers: &mut SettleTimers<Field>,
        now: Instant,
    ) -> Option<i32> {
        if !offset.is_finite() {
            return None;
        }
        if let SyncGuard::Engaged { target } = self.sync {
            if (offset - target).abs() <= self.config.snap_tolerance {
                self.sync = SyncGuard::Released;
                self.offset = offset;
                trace!(field = ?self.field, offset, "programmatic scroll landed");
            }
            return None;
        }
        if (offset - self.offset).abs() < f32::EPSILON {
            return None;
        }

        self.offset = offset;
        let index = self.resolve_index(offset, options.len())?;
        let commit = self.commit_option(&options[index]);
        if self.phase != WheelPhase::Dragging {
            let token = timers.debounce(self.field, self.config.scroll_idle_delay, now);
            self.phase = WheelPhase::Settling { token };
        }
        commit
    }

    /// Delivers a fired settle timer. Stale tokens are ignored.
    pub fn settle(&mut self, token: &TimerToken<Field>, options: &[WheelOption]) -> Option<i32> {
        let WheelPhase::Settling { token: pending } = self.phase else {
            return None;
        };
        if pending != *token {
            return None;
        }
        self.phase = WheelPhase::Idle;
        let index = self.resolve_index(self.offset, options.len())?;
        self.request_scroll(self.offset_for_index(index), true);
        trace!(field = ?self.field, index, "wheel snapped");
        self.commit_option(&options[index])
    }

    /// A click on a real option row.
    pub fn tapped(
        &mut self,
        index: usize,
        options: &[WheelOption],
        timers: &mut SettleTimers<Field>,
    ) -> Option<i32> {
        let option = options.get(index)?;
        timers.cancel(self.field);
        self.phase = WheelPhase::Idle;
        self.request_scroll(self.offset_for_index(index), true);
        self.commit_option(option)
    }

    /// Aligns the wheel with the canonical value after it changed elsewhere.
    ///
    /// Ignored mid-gesture. A value equal to this wheel's own pending commit
    /// leaves a running settle alone; anything else cancels it.
    pub fn sync_value(
        &mut self,
        value: i32,
        options: &[WheelOption],
        timers: &mut SettleTimers<Field>,
    ) {
        match self.phase {
            WheelPhase::Dragging => return,
            WheelPhase::Settling { .. } if self.committed == Some(value) => return,
            WheelPhase::Settling { .. } => timers.cancel(self.field),
            WheelPhase::Idle => {}
        }
        self.phase = WheelPhase::Idle;
        self.committed = Some(value);
        if let Some(index) = nearest_index(options, value) {
            self.request_scroll(self.offset_for_index(index), false);
        }
    }

    pub fn reset(&mut self) {
        self.phase = WheelPhase::Idle;
        self.sync = SyncGuard::Released;
        self.pending_scroll = None;
    }

    fn commit_option(&mut self, option: &WheelOption) -> Option<i32> {
        if self.committed == Some(option.value) {
            return None;
        }
        self.committed = Some(option.value);
        Some(option.value)
    }

    fn request_scroll(&mut self, target: f32, animate: bool) {
        if (self.offset - target).abs() <= self.config.snap_tolerance {
            return;
        }
        self.sync = SyncGuard::Engaged { target };
        self.offset = target;
        self.pending_scroll = Some(ScrollRequest {
            offset: target,
            animate,
        });
    }
}

/// Index of the option closest to `value`; the boundary when it lies outside.
pub fn nearest_index(options: &[WheelOption], value: i32) -> Option<usize> {
    options
        .iter()
        .enumerate()
        .min_by_key(|(_, option)| (i64::from(option.value) - i64::from(value)).abs())
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(range: std::ops::RangeInclusive<i32>) -> Vec<WheelOption> {
        range
            .map(|value| WheelOption::new(value, format!("{value:02}")))
            .collect()
    }

    fn wheel() -> (WheelWidget, SettleTimers<Field>) {
        (
            WheelWidget::new(Field::Day, WheelConfig::default()),
            SettleTimers::new(),
        )
    }

    #[test]
    fn offsets_and_indices_round_trip() {
        let (wheel, _) = wheel();
        for count in [1usize, 7, 31, 60] {
            for index in 0..count {
                let offset = wheel.offset_for_index(index);
                assert_eq!(wheel.resolve_index(offset, count), Some(index));
            }
        }
    }

    #[test]
    fn resolution_clamps_to_the_option_range() {
        let (wheel, _) = wheel();
        assert_eq!(wheel.resolve_index(-80.0, 5), Some(0));
        assert_eq!(wheel.resolve_index(74.0, 5), Some(1));
        assert_eq!(wheel.resolve_index(76.0, 5), Some(2));
        assert_eq!(wheel.resolve_index(10_000.0, 5), Some(4));
        assert_eq!(wheel.resolve_index(100.0, 0), None);
    }

    #[test]
    fn sentinel_rows_pad_both_ends() {
        let (mut wheel, mut timers) = wheel();
        let options = numbered(1..=3);
        wheel.sync_value(2, &options, &mut timers);
        let rows = wheel.rows(&options);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], WheelRow::Sentinel);
        assert_eq!(rows[4], WheelRow::Sentinel);
        assert!(matches!(
            rows[2],
            WheelRow::Item {
                index: 1,
                selected: true,
                ..
            }
        ));
    }

    #[test]
    fn dragging_commits_live_and_snaps_after_release() {
        let start = Instant::now();
        let (mut wheel, mut timers) = wheel();
        let options = numbered(1..=31);
        wheel.sync_value(1, &options, &mut timers);
        assert_eq!(wheel.take_scroll_request(), None);

        wheel.pointer_down(&mut timers);
        assert_eq!(wheel.scrolled(40.0, &options, &mut timers, start), Some(2));
        assert_eq!(wheel.scrolled(62.0, &options, &mut timers, start), None);
        assert_eq!(wheel.scrolled(113.0, &options, &mut timers, start), Some(3));
        assert_eq!(wheel.take_scroll_request(), None, "no snap mid-drag");

        wheel.pointer_up(&mut timers, start);
        assert!(matches!(wheel.phase(), WheelPhase::Settling { .. }));
        assert!(timers
            .drain_ready(start + Duration::from_millis(100))
            .is_empty());

        let fired = timers.drain_ready(start + Duration::from_millis(250));
        assert_eq!(fired.len(), 1);
        assert_eq!(wheel.settle(&fired[0], &options), None);
        assert_eq!(wheel.phase(), WheelPhase::Idle);
        assert_eq!(
            wheel.take_scroll_request(),
            Some(ScrollRequest {
                offset: 100.0,
                animate: true
            })
        );
    }

    #[test]
    fn new_drag_cancels_pending_settle() {
        let start = Instant::now();
        let (mut wheel, mut timers) = wheel();
        let options = numbered(1..=31);
        wheel.sync_value(1, &options, &mut timers);

        wheel.pointer_down(&mut timers);
        wheel.scrolled(130.0, &options, &mut timers, start);
        wheel.pointer_up(&mut timers, start);
        let WheelPhase::Settling { token: stale } = wheel.phase() else {
            panic!("expected settling");
        };

        wheel.pointer_down(&mut timers);
        assert!(wheel.is_dragging());
        assert!(timers.drain_ready(start + Duration::from_secs(1)).is_empty());
        assert_eq!(wheel.settle(&stale, &options), None);
        assert!(wheel.is_dragging());
        assert_eq!(wheel.take_scroll_request(), None);
    }

    #[test]
    fn programmatic_scroll_echoes_are_ignored() {
        let start = Instant::now();
        let (mut wheel, mut timers) = wheel();
        let options = numbered(1..=31);
        wheel.sync_value(8, &options, &mut timers);

        let request = wheel.take_scroll_request().expect("scroll request");
        assert_eq!(request.offset, 350.0);
        assert!(!request.animate);
        assert!(matches!(wheel.sync_guard(), SyncGuard::Engaged { .. }));

        assert_eq!(wheel.scrolled(120.0, &options, &mut timers, start), None);
        assert_eq!(wheel.scrolled(350.0, &options, &mut timers, start), None);
        assert_eq!(wheel.sync_guard(), SyncGuard::Released);
        assert_eq!(timers.pending_count(), 0);
        assert_eq!(wheel.phase(), WheelPhase::Idle);

        assert_eq!(wheel.scrolled(400.0, &options, &mut timers, start), Some(9));
    }

    #[test]
    fn free_scrolling_settles_after_idle_delay() {
        let start = Instant::now();
        let (mut wheel, mut timers) = wheel();
        let options = numbered(0..=23);
        wheel.sync_value(0, &options, &mut timers);

        assert_eq!(wheel.scrolled(95.0, &options, &mut timers, start), Some(2));
        assert!(timers
            .drain_ready(start + Duration::from_millis(100))
            .is_empty());
        let fired = timers.drain_ready(start + Duration::from_millis(150));
        assert_eq!(fired.len(), 1);

        // the canonical echo of our own commit must not cancel the settle
        wheel.sync_value(2, &options, &mut timers);
        assert!(matches!(wheel.phase(), WheelPhase::Settling { .. }));

        assert_eq!(wheel.settle(&fired[0], &options), None);
        assert_eq!(wheel.offset(), 100.0);
    }

    #[test]
    fn external_change_while_dragging_is_deferred() {
        let start = Instant::now();
        let (mut wheel, mut timers) = wheel();
        let options = numbered(1..=31);
        wheel.sync_value(1, &options, &mut timers);
        wheel.pointer_down(&mut timers);
        wheel.scrolled(200.0, &options, &mut timers, start);

        wheel.sync_value(12, &options, &mut timers);
        assert_eq!(wheel.take_scroll_request(), None);
        assert_eq!(wheel.committed(), Some(5));
    }

    #[test]
    fn clamped_commit_is_pulled_back() {
        let start = Instant::now();
        let (mut wheel, mut timers) = wheel();
        let options = numbered(1..=2);
        wheel.sync_value(1, &options, &mut timers);
        assert_eq!(wheel.scrolled(50.0, &options, &mut timers, start), Some(2));

        wheel.sync_value(1, &options, &mut timers);
        assert_eq!(wheel.phase(), WheelPhase::Idle);
        assert_eq!(timers.pending_count(), 0);
        assert_eq!(
            wheel.take_scroll_request(),
            Some(ScrollRequest {
                offset: 0.0,
                animate: false
            })
        );
    }

    #[test]
    fn missing_value_resolves_to_nearest_boundary() {
        let (mut wheel, mut timers) = wheel();
        let options = numbered(1..=28);
        wheel.sync_value(31, &options, &mut timers);
        assert_eq!(wheel.take_scroll_request().map(|r| r.offset), Some(1350.0));

        let empty: Vec<WheelOption> = Vec::new();
        let mut other = WheelWidget::new(Field::Hour, WheelConfig::default());
        other.sync_value(4, &empty, &mut timers);
        assert_eq!(other.take_scroll_request(), None);
        assert_eq!(nearest_index(&empty, 4), None);
    }

    #[test]
    fn tapping_an_option_commits_and_animates() {
        let (mut wheel, mut timers) = wheel();
        let options = numbered(0..=59);
        wheel.sync_value(0, &options, &mut timers);
        assert_eq!(wheel.tapped(3, &options, &mut timers), Some(3));
        assert_eq!(
            wheel.take_scroll_request(),
            Some(ScrollRequest {
                offset: 150.0,
                animate: true
            })
        );
        assert_eq!(wheel.tapped(99, &options, &mut timers), None);
    }
}
