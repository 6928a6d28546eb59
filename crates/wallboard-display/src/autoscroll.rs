use std::time::Duration;

use serde::Serialize;
use wallboard_core::PanelKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Down,
    Up,
}

/// Published scroll position of the visible panel surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollState {
    pub panel: PanelKey,
    pub page: usize,
    pub offset: f64,
    pub extent: f64,
    pub direction: ScrollDirection,
    pub paused: bool,
}

/// Ping-pong auto-scroll for one panel surface.
///
/// Position moves by `speed * elapsed` per tick. At either extreme it holds for
/// `pause`, then reverses. Nothing here touches rotation.
#[derive(Debug, Clone)]
pub struct AutoScroll {
    panel: PanelKey,
    page: usize,
    offset: f64,
    extent: f64,
    direction: ScrollDirection,
    pause_left: Duration,
    speed: f64,
    pause: Duration,
}

impl AutoScroll {
    pub fn new(panel: PanelKey, speed: f64, pause: Duration) -> Self {
        Self {
            panel,
            page: 0,
            offset: 0.0,
            extent: 0.0,
            direction: ScrollDirection::Down,
            pause_left: pause,
            speed,
            pause,
        }
    }

    /// Start over at the top for a new panel/page. A reset to the same key
    /// only updates speed and pause.
    pub fn reset(&mut self, panel: PanelKey, page: usize, speed: f64, pause: Duration) {
        self.speed = speed;
        self.pause = pause;
        if self.panel == panel && self.page == page {
            return;
        }
        self.panel = panel;
        self.page = page;
        self.offset = 0.0;
        self.extent = 0.0;
        self.direction = ScrollDirection::Down;
        self.pause_left = pause;
    }

    /// Scrollable extent reported by the display client for `panel`.
    /// Reports for any other panel are ignored.
    pub fn set_extent(&mut self, panel: PanelKey, extent: f64) -> bool {
        if panel != self.panel || !extent.is_finite() {
            return false;
        }
        self.extent = extent.max(0.0);
        self.offset = self.offset.min(self.extent);
        true
    }

    pub fn tick(&mut self, elapsed: Duration) -> ScrollState {
        if self.extent <= 0.0 {
            self.offset = 0.0;
            return self.state();
        }
        if !self.pause_left.is_zero() {
            self.pause_left = self.pause_left.saturating_sub(elapsed);
            return self.state();
        }

        let delta = self.speed * elapsed.as_secs_f64();
        match self.direction {
            ScrollDirection::Down => {
                self.offset += delta;
                if self.offset >= self.extent {
                    self.offset = self.extent;
                    self.turn(ScrollDirection::Up);
                }
            }
            ScrollDirection::Up => {
                self.offset -= delta;
                if self.offset <= 0.0 {
                    self.offset = 0.0;
                    self.turn(ScrollDirection::Down);
                }
            }
        }
        self.state()
    }

    fn turn(&mut self, direction: ScrollDirection) {
        self.direction = direction;
        self.pause_left = self.pause;
    }

    pub fn state(&self) -> ScrollState {
        ScrollState {
            panel: self.panel,
            page: self.page,
            offset: self.offset,
            extent: self.extent,
            direction: self.direction,
            paused: !self.pause_left.is_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    fn run(s: &mut AutoScroll, ticks: usize) -> ScrollState {
        let mut last = s.state();
        for _ in 0..ticks {
            last = s.tick(TICK);
        }
        last
    }

    #[test]
    fn no_extent_no_motion() {
        let mut s = AutoScroll::new(PanelKey::Crew, 40.0, Duration::ZERO);
        assert_eq!(run(&mut s, 20).offset, 0.0);
    }

    #[test]
    fn ping_pong_with_pause() {
        let mut s = AutoScroll::new(PanelKey::Crew, 100.0, Duration::from_millis(500));
        assert!(s.set_extent(PanelKey::Crew, 45.0));

        // Initial hold at the top.
        let st = run(&mut s, 5);
        assert_eq!(st.offset, 0.0);
        assert!(!st.paused);

        // 10px per tick: the fifth tick overshoots, clamps and turns.
        let st = run(&mut s, 5);
        assert_eq!(st.offset, 45.0);
        assert_eq!(st.direction, ScrollDirection::Up);
        assert!(st.paused);

        let st = run(&mut s, 5);
        assert_eq!(st.offset, 45.0);
        let st = run(&mut s, 2);
        assert!((st.offset - 25.0).abs() < 1e-9);
    }

    #[test]
    fn reset_on_new_page_only() {
        let mut s = AutoScroll::new(PanelKey::Logistics, 100.0, Duration::ZERO);
        s.set_extent(PanelKey::Logistics, 500.0);
        run(&mut s, 3);
        assert!(s.state().offset > 0.0);

        s.reset(PanelKey::Logistics, 0, 50.0, Duration::ZERO);
        assert!(s.state().offset > 0.0);

        s.reset(PanelKey::Logistics, 1, 50.0, Duration::ZERO);
        assert_eq!(s.state().offset, 0.0);
        assert_eq!(s.state().extent, 0.0);
    }

    #[test]
    fn extent_for_other_panel_is_ignored() {
        let mut s = AutoScroll::new(PanelKey::Pending, 40.0, Duration::ZERO);
        assert!(!s.set_extent(PanelKey::Crew, 300.0));
        assert_eq!(s.state().extent, 0.0);
    }
}
