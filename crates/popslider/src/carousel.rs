use std::time::{Duration, Instant};

pub const DEFAULT_AUTOPLAY_DELAY_MS: u64 = 3000;
pub const DEFAULT_TRANSITION_SPEED_MS: u64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselOptions {
    pub autoplay_delay: Duration,
    pub transition_speed: Duration,
    pub loop_slides: bool,
}

impl Default for CarouselOptions {
    fn default() -> Self {
        Self {
            autoplay_delay: Duration::from_millis(DEFAULT_AUTOPLAY_DELAY_MS),
            transition_speed: Duration::from_millis(DEFAULT_TRANSITION_SPEED_MS),
            loop_slides: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideTransition {
    pub from: usize,
    pub to: usize,
    pub direction: Direction,
    start: Instant,
}

impl SlideTransition {
    /// Eased progress in `0.0..=1.0`.
    pub fn progress(&self, now: Instant, speed: Duration) -> f32 {
        if speed.is_zero() {
            return 1.0;
        }
        let raw = now.saturating_duration_since(self.start).as_secs_f32() / speed.as_secs_f32();
        ease_in_out(raw.clamp(0.0, 1.0))
    }
}

/// One-slide-at-a-time pager with autoplay.
#[derive(Debug, Clone)]
pub struct Carousel {
    options: CarouselOptions,
    current: usize,
    len: usize,
    transition: Option<SlideTransition>,
    /// When the autoplay countdown last restarted
    timer_start: Instant,
}

impl Carousel {
    pub fn new(options: CarouselOptions, now: Instant) -> Self {
        Self {
            options,
            current: 0,
            len: 0,
            transition: None,
            timer_start: now,
        }
    }

    pub fn options(&self) -> &CarouselOptions {
        &self.options
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn transition(&self) -> Option<&SlideTransition> {
        self.transition.as_ref()
    }

    /// Track the slide count after a (re)load; keeps the index in range.
    pub fn sync_len(&mut self, len: usize, now: Instant) {
        if len == self.len {
            return;
        }
        let was_empty = self.len == 0;
        self.len = len;
        self.transition = None;
        if self.current >= len {
            self.current = 0;
        }
        if was_empty {
            self.timer_start = now;
        }
    }

    pub fn next(&mut self, now: Instant) -> bool {
        match self.neighbor(Direction::Forward) {
            Some(to) => self.begin(to, Direction::Forward, now),
            None => false,
        }
    }

    pub fn prev(&mut self, now: Instant) -> bool {
        match self.neighbor(Direction::Backward) {
            Some(to) => self.begin(to, Direction::Backward, now),
            None => false,
        }
    }

    /// Jump to `index` (pagination dots).
    pub fn go_to(&mut self, index: usize, now: Instant) -> bool {
        if index >= self.len || index == self.current {
            return false;
        }
        let direction = if index > self.current {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.begin(index, direction, now)
    }

    /// Advance time: finish a running transition and fire autoplay when due.
    pub fn tick(&mut self, now: Instant) {
        if let Some(t) = self.transition {
            if now.saturating_duration_since(t.start) >= self.options.transition_speed {
                self.current = t.to;
                self.transition = None;
                self.timer_start = now;
            }
            return;
        }

        let due = now.saturating_duration_since(self.timer_start) >= self.options.autoplay_delay;
        // A non-looping carousel parks on its last slide
        if self.len > 1 && due && !self.next(now) {
            self.timer_start = now;
        }
    }

    /// Time until `tick` has something to do, for repaint scheduling.
    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        if self.transition.is_some() {
            return Some(Duration::ZERO);
        }
        if self.len <= 1 || self.neighbor(Direction::Forward).is_none() {
            return None;
        }
        let due = self.timer_start + self.options.autoplay_delay;
        Some(due.saturating_duration_since(now))
    }

    fn neighbor(&self, direction: Direction) -> Option<usize> {
        if self.len < 2 {
            return None;
        }
        let last = self.len - 1;
        match (direction, self.options.loop_slides) {
            (Direction::Forward, _) if self.current < last => Some(self.current + 1),
            (Direction::Forward, true) => Some(0),
            (Direction::Backward, _) if self.current > 0 => Some(self.current - 1),
            (Direction::Backward, true) => Some(last),
            _ => None,
        }
    }

    fn begin(&mut self, to: usize, direction: Direction, now: Instant) -> bool {
        if self.transition.is_some() {
            return false;
        }
        self.timer_start = now;
        if self.options.transition_speed.is_zero() {
            self.current = to;
            return true;
        }
        self.transition = Some(SlideTransition {
            from: self.current,
            to,
            direction,
            start: now,
        });
        true
    }
}

pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn carousel(len: usize, loop_slides: bool, start: Instant) -> Carousel {
        let mut c = Carousel::new(
            CarouselOptions {
                autoplay_delay: ms(3000),
                transition_speed: ms(1500),
                loop_slides,
            },
            start,
        );
        c.sync_len(len, start);
        c
    }

    /// Run a started transition to completion.
    fn settle(c: &mut Carousel, now: Instant) -> Instant {
        let done = now + ms(1500);
        c.tick(done);
        assert!(c.transition().is_none());
        done
    }

    #[test]
    fn test_next_wraps_when_looping() {
        let t0 = Instant::now();
        let mut c = carousel(3, true, t0);
        let mut now = t0;
        for expected in [1, 2, 0, 1] {
            assert!(c.next(now));
            now = settle(&mut c, now);
            assert_eq!(c.current(), expected);
        }
    }

    #[test]
    fn test_prev_wraps_to_last_when_looping() {
        let t0 = Instant::now();
        let mut c = carousel(3, true, t0);
        assert!(c.prev(t0));
        settle(&mut c, t0);
        assert_eq!(c.current(), 2);
    }

    #[test]
    fn test_no_wrap_without_loop() {
        let t0 = Instant::now();
        let mut c = carousel(2, false, t0);
        assert!(!c.prev(t0));
        assert!(c.next(t0));
        let now = settle(&mut c, t0);
        assert_eq!(c.current(), 1);
        assert!(!c.next(now));
        assert_eq!(c.next_wakeup(now), None);
    }

    #[test]
    fn test_autoplay_advances_after_delay() {
        let t0 = Instant::now();
        let mut c = carousel(3, true, t0);
        c.tick(t0 + ms(2999));
        assert!(c.transition().is_none());
        c.tick(t0 + ms(3000));
        let t = c.transition().copied().unwrap();
        assert_eq!((t.from, t.to, t.direction), (0, 1, Direction::Forward));
        c.tick(t0 + ms(4500));
        assert_eq!(c.current(), 1);
        assert!(c.transition().is_none());
    }

    #[test]
    fn test_autoplay_stops_on_last_slide_without_loop() {
        let t0 = Instant::now();
        let mut c = carousel(2, false, t0);
        c.tick(t0 + ms(3000));
        c.tick(t0 + ms(4500));
        assert_eq!(c.current(), 1);
        c.tick(t0 + ms(60_000));
        assert_eq!(c.current(), 1);
        assert!(c.transition().is_none());
    }

    #[test]
    fn test_manual_paging_restarts_autoplay_timer() {
        let t0 = Instant::now();
        let mut c = carousel(3, true, t0);
        assert!(c.next(t0 + ms(2000)));
        let now = settle(&mut c, t0 + ms(2000));
        assert_eq!(c.current(), 1);
        c.tick(now + ms(2999));
        assert!(c.transition().is_none());
        c.tick(now + ms(3000));
        assert!(c.transition().is_some());
    }

    #[test]
    fn test_navigation_ignored_mid_transition() {
        let t0 = Instant::now();
        let mut c = carousel(3, true, t0);
        assert!(c.next(t0));
        assert!(!c.next(t0 + ms(100)));
        assert!(!c.go_to(2, t0 + ms(100)));
        settle(&mut c, t0);
        assert_eq!(c.current(), 1);
    }

    #[test]
    fn test_go_to() {
        let t0 = Instant::now();
        let mut c = carousel(4, true, t0);
        assert!(!c.go_to(0, t0));
        assert!(!c.go_to(4, t0));
        assert!(c.go_to(3, t0));
        assert_eq!(c.transition().unwrap().direction, Direction::Forward);
        settle(&mut c, t0);
        assert_eq!(c.current(), 3);
    }

    #[test]
    fn test_single_or_empty_never_moves() {
        let t0 = Instant::now();
        for len in [0, 1] {
            let mut c = carousel(len, true, t0);
            assert!(!c.next(t0));
            assert!(!c.prev(t0));
            c.tick(t0 + ms(10_000));
            assert_eq!(c.current(), 0);
            assert_eq!(c.next_wakeup(t0), None);
        }
    }

    #[test]
    fn test_sync_len_clamps_index() {
        let t0 = Instant::now();
        let mut c = carousel(5, true, t0);
        assert!(c.go_to(4, t0));
        settle(&mut c, t0);
        c.sync_len(2, t0);
        assert_eq!(c.current(), 0);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_zero_speed_switches_immediately() {
        let t0 = Instant::now();
        let mut c = Carousel::new(
            CarouselOptions {
                transition_speed: Duration::ZERO,
                ..CarouselOptions::default()
            },
            t0,
        );
        c.sync_len(2, t0);
        assert!(c.next(t0));
        assert_eq!(c.current(), 1);
        assert!(c.transition().is_none());
    }

    #[test]
    fn test_next_wakeup_counts_down() {
        let t0 = Instant::now();
        let c = carousel(2, true, t0);
        assert_eq!(c.next_wakeup(t0 + ms(1000)), Some(ms(2000)));
        assert_eq!(c.next_wakeup(t0 + ms(5000)), Some(Duration::ZERO));
    }

    #[test]
    fn test_ease_in_out_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
    }
}
