//! Unit tests for kn-sim.
//!
//! Simulators and adapters share one `ManualClock` so every tick and query
//! runs at a known instant.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use kn_core::{ManualClock, Mode, MotionConfig, MotionPoint, PointId, Timestamp};
    use kn_index::IndexAdapter;

    use crate::{MotionSimulator, SharedIndex};

    pub const T0: Timestamp = Timestamp(1_700_000_000_000);

    pub fn config() -> MotionConfig {
        MotionConfig { seed: Some(7), bucket_capacity: 4, ..MotionConfig::default() }
    }

    /// A shared index in `mode` holding exactly `points`, ids in order.
    pub fn shared_with(mode: Mode, points: &[MotionPoint]) -> (SharedIndex, ManualClock, Vec<PointId>) {
        let clock = ManualClock::new(T0);
        let mut adapter = IndexAdapter::new(config(), Arc::new(clock.clone())).unwrap();
        adapter.seed(0, mode).unwrap();
        let ids = points.iter().map(|p| adapter.add(*p).unwrap()).collect();
        (SharedIndex::new(adapter), clock, ids)
    }

    pub fn seeded(mode: Mode, count: i64) -> (SharedIndex, ManualClock) {
        let clock = ManualClock::new(T0);
        let mut adapter = IndexAdapter::new(config(), Arc::new(clock.clone())).unwrap();
        adapter.seed(count, mode).unwrap();
        (SharedIndex::new(adapter), clock)
    }

    pub fn simulator(clock: &ManualClock) -> MotionSimulator {
        MotionSimulator::new(&config(), Arc::new(clock.clone()))
    }
}

// ── MotionSimulator ───────────────────────────────────────────────────────────

#[cfg(test)]
mod simulator {
    use kn_core::{Mode, MotionPoint, Point2D, PointId, Timestamp};

    use super::helpers::{T0, seeded, shared_with, simulator};
    use crate::simulator::bounce_velocity;
    use crate::{NoopObserver, SharedIndex, TickObserver, TickOutcome};

    #[test]
    fn point_past_right_edge_heads_back_inside() {
        let p = MotionPoint::moving(0.95, 0.5, 0.1, 0.0, T0);
        let (shared, clock, ids) = shared_with(Mode::VelocityAugmented, &[p]);
        let mut sim = simulator(&clock);

        let now = clock.advance(1);
        let outcome = sim.tick(&shared, now, &mut NoopObserver);
        assert_eq!(outcome, TickOutcome::Completed { moved: 1, regenerated: false });

        let index = shared.lock();
        let after = index.get(ids[0]).copied().unwrap();
        assert!(after.vx < 0.0);
        assert_eq!(after.vy, 0.0);
        assert!((after.vx.abs() - index.config().inbound_speed()).abs() < 1e-15);
        assert!((after.x - 1.05).abs() < 1e-12);
        assert_eq!(after.origin_time, now);
    }

    #[test]
    fn bounce_is_radial_toward_centre() {
        let (vx, vy) = bounce_velocity(Point2D::new(1.5, 1.5), 1.0).unwrap();
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert!((vx + h).abs() < 1e-12 && (vy + h).abs() < 1e-12);
        assert!(bounce_velocity(Point2D::CENTER, 1.0).is_none());
    }

    #[test]
    fn interior_point_keeps_position_and_gets_fresh_velocity() {
        let p = MotionPoint::moving(0.2, 0.3, 0.0005, 0.0, T0);
        let (shared, clock, ids) = shared_with(Mode::VelocityAugmented, &[p]);
        let mut sim = simulator(&clock);

        let now = clock.advance(200);
        sim.tick(&shared, now, &mut NoopObserver);

        let after = shared.lock().get(ids[0]).copied().unwrap();
        let max_speed = 0.5 / super::helpers::config().speed_resolution_ms;
        assert!((after.x - 0.3).abs() < 1e-12);
        assert!((after.y - 0.3).abs() < 1e-12);
        assert!(after.vx.abs() <= max_speed && after.vy.abs() <= max_speed);
        assert_eq!(after.origin_time, now);
    }

    #[test]
    fn overflowing_extrapolation_recentres() {
        let (_, clock) = seeded(Mode::VelocityAugmented, 0);
        let mut sim = simulator(&clock);
        let runaway = MotionPoint::moving(0.5, 0.5, f64::MAX, 0.0, T0);
        let next = sim.next_state(&runaway, Timestamp(T0.0 + 1_000));
        assert_eq!(next, MotionPoint::centered(Timestamp(T0.0 + 1_000)));
    }

    #[test]
    fn static_index_is_skipped() {
        let (shared, clock) = seeded(Mode::Static, 10);
        let mut sim = simulator(&clock);
        let before = shared.lock().export();

        assert_eq!(sim.tick(&shared, clock.advance(1_000), &mut NoopObserver), TickOutcome::Skipped);
        assert_eq!(shared.lock().export(), before);
        assert_eq!(shared.lock().removal_count(), 0);
    }

    #[test]
    fn live_count_is_stable_and_rebuild_fires_on_third_tick() {
        let (shared, clock) = seeded(Mode::VelocityAugmented, 20);
        let mut sim = simulator(&clock);

        for tick in 1..=2 {
            let outcome = sim.tick(&shared, clock.advance(1_000), &mut NoopObserver);
            assert_eq!(outcome, TickOutcome::Completed { moved: 20, regenerated: false });
            let index = shared.lock();
            assert_eq!(index.live_count(), 20);
            assert_eq!(index.removal_count(), 20 * tick);
        }

        let outcome = sim.tick(&shared, clock.advance(1_000), &mut NoopObserver);
        assert_eq!(outcome, TickOutcome::Completed { moved: 20, regenerated: true });
        let index = shared.lock();
        assert_eq!(index.live_count(), 20);
        assert_eq!(index.removal_count(), 0);
    }

    #[test]
    fn tick_keeps_ids_and_preserves_positions() {
        let (shared, clock) = seeded(Mode::VelocityAugmented, 30);
        let mut sim = simulator(&clock);
        let now = clock.advance(500);
        let expected: Vec<_> = shared
            .lock()
            .export()
            .into_iter()
            .map(|(id, p)| (id, p.position_at(now)))
            .collect();

        sim.tick(&shared, now, &mut NoopObserver);

        let after = shared.lock().export();
        assert_eq!(after.len(), expected.len());
        for ((id, p), (eid, pos)) in after.iter().zip(&expected) {
            assert_eq!(id, eid);
            assert!((p.x - pos.x).abs() < 1e-12 && (p.y - pos.y).abs() < 1e-12);
        }
    }

    /// Replaces the index as soon as the tick has taken its snapshot.
    struct Reseeder {
        shared: SharedIndex,
    }

    impl TickObserver for Reseeder {
        fn on_tick_start(&mut self, _now: Timestamp, _points: usize) {
            self.shared.lock().seed(5, Mode::VelocityAugmented).unwrap();
        }
    }

    #[test]
    fn reseed_mid_tick_abandons_remaining_work() {
        let (shared, clock) = seeded(Mode::VelocityAugmented, 10);
        let mut sim = simulator(&clock);
        let mut observer = Reseeder { shared: shared.clone() };

        let outcome = sim.tick(&shared, clock.advance(1_000), &mut observer);
        assert_eq!(outcome, TickOutcome::Abandoned { moved: 0 });

        let index = shared.lock();
        assert_eq!(index.live_count(), 5);
        assert_eq!(index.removal_count(), 0);
        assert!(index.export().iter().all(|(_, p)| p.origin_time == T0 + 1_000));
    }

    /// Replaces the index once `after` points have been written back.
    struct ReseedAfter {
        shared: SharedIndex,
        after:  usize,
        seen:   usize,
        fresh:  Vec<(PointId, MotionPoint)>,
    }

    impl TickObserver for ReseedAfter {
        fn on_point_moved(&mut self, _id: PointId, _state: &MotionPoint) {
            self.seen += 1;
            if self.seen == self.after {
                let mut index = self.shared.lock();
                index.seed(8, Mode::VelocityAugmented).unwrap();
                self.fresh = index.export();
            }
        }
    }

    #[test]
    fn reseed_after_partial_progress_keeps_new_index_untouched() {
        let (shared, clock) = seeded(Mode::VelocityAugmented, 10);
        let mut sim = simulator(&clock);
        let mut observer = ReseedAfter { shared: shared.clone(), after: 3, seen: 0, fresh: Vec::new() };

        let outcome = sim.tick(&shared, clock.advance(1_000), &mut observer);
        assert_eq!(outcome, TickOutcome::Abandoned { moved: 3 });
        assert_eq!(observer.seen, 3);

        let index = shared.lock();
        assert_eq!(index.live_count(), 8);
        assert_eq!(index.removal_count(), 0);
        assert_eq!(index.export(), observer.fresh);
    }

    #[derive(Default)]
    struct Recorder {
        starts:      usize,
        regenerates: Vec<(usize, usize)>,
        outcomes:    Vec<TickOutcome>,
    }

    impl TickObserver for Recorder {
        fn on_tick_start(&mut self, _now: Timestamp, _points: usize) {
            self.starts += 1;
        }
        fn on_regenerate(&mut self, removed: usize, live: usize) {
            self.regenerates.push((removed, live));
        }
        fn on_tick_end(&mut self, _now: Timestamp, outcome: &TickOutcome) {
            self.outcomes.push(*outcome);
        }
    }

    #[test]
    fn observer_sees_every_phase() {
        let (shared, clock) = seeded(Mode::VelocityAugmented, 4);
        let mut sim = simulator(&clock);
        let mut rec = Recorder::default();

        for _ in 0..3 {
            sim.tick(&shared, clock.advance(1_000), &mut rec);
        }
        shared.lock().switch_mode(Mode::Static).unwrap();
        sim.tick(&shared, clock.advance(1_000), &mut rec);

        assert_eq!(rec.starts, 3);
        assert_eq!(rec.regenerates, vec![(12, 4)]);
        assert_eq!(rec.outcomes.len(), 4);
        assert_eq!(rec.outcomes[3], TickOutcome::Skipped);
    }
}

// ── QueryEngine ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod query {
    use kn_core::{Mode, MotionPoint, Point2D};

    use super::helpers::{T0, seeded, shared_with};
    use crate::QueryEngine;

    fn diagonal() -> Vec<MotionPoint> {
        vec![
            MotionPoint::stationary(0.1, 0.1),
            MotionPoint::stationary(0.5, 0.5),
            MotionPoint::stationary(0.9, 0.9),
        ]
    }

    #[test]
    fn single_nearest_unbounded() {
        let (shared, _, ids) = shared_with(Mode::Static, &diagonal());
        let index = shared.lock();
        let r = QueryEngine::query(&index, Point2D::new(0.5, 0.5), 1, -1.0, T0);

        assert_eq!(r.matched.len(), 1);
        assert_eq!(r.matched[0].id, ids[1]);
        let unmatched: Vec<_> = r.unmatched.iter().map(|d| d.id).collect();
        assert_eq!(unmatched, vec![ids[0], ids[2]]);
    }

    #[test]
    fn zero_neighbours_matches_nothing() {
        let (shared, _, _) = shared_with(Mode::Static, &diagonal());
        let r = QueryEngine::query(&shared.lock(), Point2D::new(0.5, 0.5), 0, -1.0, T0);
        assert!(r.matched.is_empty());
        assert_eq!(r.unmatched.len(), 3);
    }

    #[test]
    fn threshold_limits_matches() {
        let (shared, _, ids) = shared_with(Mode::Static, &diagonal());
        let r = QueryEngine::query(&shared.lock(), Point2D::new(0.5, 0.5), 3, 0.1, T0);
        assert_eq!(r.matched.len(), 1);
        assert_eq!(r.matched[0].id, ids[1]);
        assert_eq!(r.unmatched.len(), 2);
    }

    #[test]
    fn nan_threshold_is_unbounded() {
        let (shared, _, _) = shared_with(Mode::Static, &diagonal());
        let r = QueryEngine::query(&shared.lock(), Point2D::new(0.5, 0.5), 3, f64::NAN, T0);
        assert_eq!(r.matched.len(), 3);
        assert!(r.unmatched.is_empty());
    }

    #[test]
    fn matched_is_nearest_first() {
        let (shared, _, ids) = shared_with(Mode::Static, &diagonal());
        let r = QueryEngine::query(&shared.lock(), Point2D::new(0.0, 0.0), 3, -1.0, T0);
        let order: Vec<_> = r.matched.iter().map(|d| d.id).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn off_domain_points_are_hidden_from_both_partitions() {
        let points = [
            MotionPoint::moving(0.9, 0.5, 0.001, 0.0, T0),
            MotionPoint::moving(0.4, 0.5, 0.0, 0.0, T0),
        ];
        let (shared, clock, ids) = shared_with(Mode::VelocityAugmented, &points);
        let now = clock.advance(200);
        let index = shared.lock();
        assert_eq!(index.live_count(), 2);

        let r = QueryEngine::query(&index, Point2D::new(1.0, 0.5), 2, -1.0, now);
        assert_eq!(r.visible(), 1);
        assert_eq!(r.matched[0].id, ids[1]);
        assert!(r.unmatched.is_empty());
    }

    #[test]
    fn moving_points_are_displayed_where_they_are_now() {
        let points = [MotionPoint::moving(0.2, 0.2, 0.001, 0.0, T0)];
        let (shared, clock, _) = shared_with(Mode::VelocityAugmented, &points);
        let now = clock.advance(300);
        let r = QueryEngine::query(&shared.lock(), Point2D::new(0.5, 0.2), 1, 0.01, now);

        assert_eq!(r.matched.len(), 1);
        let pos = r.matched[0].position;
        assert!((pos.x - 0.5).abs() < 1e-12 && (pos.y - 0.2).abs() < 1e-12);
    }

    #[test]
    fn partitions_cover_every_visible_point_once() {
        let (shared, _) = seeded(Mode::Static, 200);
        let r = QueryEngine::query(&shared.lock(), Point2D::new(0.3, 0.7), 15, 0.2, T0);
        assert!(r.matched.len() <= 15);
        assert_eq!(r.visible(), 200);
        for m in &r.matched {
            assert!(r.unmatched.iter().all(|u| u.id != m.id));
            let (dx, dy) = (m.position.x - 0.3, m.position.y - 0.7);
            assert!(dx * dx + dy * dy <= 0.04 + 1e-12);
        }
    }
}

// ── Frames and overlay ────────────────────────────────────────────────────────

#[cfg(test)]
mod frame {
    use kn_core::{Mode, Point2D};

    use super::helpers::{T0, seeded};
    use crate::{Canvas, PaletteColor, QueryEngine, QueryParams, grid_overlay};

    #[test]
    fn palette_cycles_in_order() {
        let colors: Vec<_> = (0..5).map(PaletteColor::for_index).collect();
        assert_eq!(
            colors,
            vec![
                PaletteColor::Purple,
                PaletteColor::Brown,
                PaletteColor::Black,
                PaletteColor::Purple,
                PaletteColor::Brown,
            ]
        );
    }

    #[test]
    fn overlay_follows_pre_order_node_list() {
        let (shared, _) = seeded(Mode::Static, 64);
        let index = shared.lock();
        let rects = index.node_rects(T0);
        let overlay = grid_overlay(&index, T0);

        assert_eq!(overlay.len(), rects.len());
        assert!(overlay.len() > 1);
        assert_eq!(overlay[0].depth, 0);
        for (i, (o, r)) in overlay.iter().zip(&rects).enumerate() {
            assert_eq!(o.color, PaletteColor::for_index(i));
            assert_eq!((o.min, o.max), (r.min, r.max));
        }
    }

    #[test]
    fn frame_carries_overlay_only_when_asked() {
        let (shared, _) = seeded(Mode::Static, 20);
        let params = QueryParams::default();
        let canvas = Canvas::new(500.0, 500.0);
        let reference = Point2D::CENTER;

        let plain = QueryEngine::frame(&shared, &params, &canvas, reference, false);
        assert!(plain.overlay.is_none());
        assert_eq!(plain.mode, Mode::Static);
        assert_eq!(plain.now, T0);
        assert!((plain.threshold - 0.1).abs() < 1e-12);

        let gridded = QueryEngine::frame(&shared, &params, &canvas, reference, true);
        assert!(gridded.overlay.is_some_and(|o| !o.is_empty()));
        assert_eq!(gridded.result, plain.result);
    }
}

// ── QueryParams and Canvas ────────────────────────────────────────────────────

#[cfg(test)]
mod params {
    use kn_core::Point2D;

    use crate::{Canvas, QueryParams};

    #[test]
    fn valid_text_replaces_both_values() {
        let mut p = QueryParams::default();
        let v = p.update_from_text(" 4 ", "-1");
        assert!(v.all_ok());
        assert_eq!(p.num_neighbours, 4);
        assert_eq!(p.distance_threshold, -1.0);
    }

    #[test]
    fn invalid_text_keeps_last_good_value() {
        let mut p = QueryParams::default();
        p.update_from_text("7", "25");

        let v = p.update_from_text("seven", "NaN");
        assert!(!v.num_neighbours_ok && !v.distance_threshold_ok);
        assert_eq!(p, QueryParams { num_neighbours: 7, distance_threshold: 25.0 });

        let v = p.update_from_text("-3", "12.5");
        assert!(!v.num_neighbours_ok && v.distance_threshold_ok);
        assert_eq!(p.num_neighbours, 7);
        assert_eq!(p.distance_threshold, 12.5);
    }

    #[test]
    fn threshold_normalises_by_width_and_keeps_sign() {
        let p = QueryParams { num_neighbours: 1, distance_threshold: 80.0 };
        assert_eq!(p.normalized_threshold(800.0), 0.1);
        let unbounded = QueryParams { num_neighbours: 1, distance_threshold: -1.0 };
        assert!(unbounded.normalized_threshold(800.0) < 0.0);
    }

    #[test]
    fn canvas_maps_pixels_both_ways() {
        let c = Canvas::new(400.0, 200.0);
        assert_eq!(c.normalize(100.0, 50.0), Point2D::new(0.25, 0.25));
        assert_eq!(c.denormalize(Point2D::new(0.5, 0.5)), (200.0, 100.0));
        assert_eq!(Canvas::new(0.0, f64::NAN), Canvas::new(1.0, 1.0));
    }
}

// ── MotionLoop ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scheduler {
    use std::sync::mpsc::{self, Sender};
    use std::thread;
    use std::time::{Duration, Instant};

    use kn_core::{Mode, Timestamp};

    use super::helpers::{seeded, simulator};
    use crate::{MotionLoop, NoopObserver, TickObserver, TickOutcome};

    struct Forward(Sender<TickOutcome>);

    impl TickObserver for Forward {
        fn on_tick_end(&mut self, _now: Timestamp, outcome: &TickOutcome) {
            let _ = self.0.send(*outcome);
        }
    }

    #[test]
    fn ticks_until_index_goes_static() {
        let (shared, clock) = seeded(Mode::VelocityAugmented, 10);
        let (tx, rx) = mpsc::channel();
        let motion = MotionLoop::spawn(shared.clone(), simulator(&clock), Duration::from_millis(1), Forward(tx)).unwrap();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, TickOutcome::Completed { moved: 10, .. }));

        shared.lock().switch_mode(Mode::Static).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while motion.is_active() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(!motion.is_active());
        assert!(motion.stop().unwrap() >= 1);
    }

    #[test]
    fn stop_wakes_a_waiting_loop() {
        let (shared, clock) = seeded(Mode::VelocityAugmented, 10);
        let motion = MotionLoop::spawn(shared.clone(), simulator(&clock), Duration::from_secs(3_600), NoopObserver).unwrap();
        assert!(motion.is_active());

        let started = Instant::now();
        assert_eq!(motion.stop().unwrap(), 0);
        assert!(started.elapsed() < Duration::from_secs(60));
        assert_eq!(shared.lock().removal_count(), 0);
    }
}

// ── Scene ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scene {
    use std::sync::Arc;

    use kn_core::{ManualClock, Mode, MotionConfig, Point2D};

    use super::helpers::T0;
    use crate::{Canvas, Frame, FrameSink, Scene, SimError};

    #[derive(Default)]
    struct Collect(Vec<Frame>);

    impl FrameSink for Collect {
        fn on_frame(&mut self, frame: &Frame) {
            self.0.push(frame.clone());
        }
    }

    fn scene() -> Scene {
        let config = MotionConfig { seed: Some(3), tick_interval_ms: 3_600_000, ..MotionConfig::default() };
        Scene::new(config, Arc::new(ManualClock::new(T0)), Canvas::new(800.0, 600.0)).unwrap()
    }

    #[test]
    fn reseed_keeps_current_mode() {
        let mut s = scene();
        s.reseed(50).unwrap();
        assert_eq!(s.mode(), Mode::Static);
        assert_eq!(s.shared().lock().live_count(), 50);

        s.start_motion().unwrap();
        s.reseed(30).unwrap();
        assert_eq!(s.mode(), Mode::VelocityAugmented);
        assert_eq!(s.shared().lock().live_count(), 30);
        s.stop_motion().unwrap();
    }

    #[test]
    fn bad_count_is_reported_and_index_kept() {
        let mut s = scene();
        s.reseed(10).unwrap();
        assert!(matches!(s.reseed(-5), Err(SimError::Index(_))));
        assert_eq!(s.shared().lock().live_count(), 10);
    }

    #[test]
    fn toggle_motion_round_trip() {
        let mut s = scene();
        s.reseed(20).unwrap();

        assert!(s.toggle_motion().unwrap());
        assert_eq!(s.mode(), Mode::VelocityAugmented);
        assert!(s.is_moving());

        assert!(!s.toggle_motion().unwrap());
        assert_eq!(s.mode(), Mode::Static);
        assert!(!s.is_moving());
        assert_eq!(s.shared().lock().live_count(), 20);
    }

    #[test]
    fn render_uses_pointer_params_and_grid() {
        let mut s = scene();
        s.reseed(40).unwrap();
        s.set_pointer_px(400.0, 300.0);
        s.update_params("5", "-1");
        assert!(s.toggle_grid());

        let mut sink = Collect::default();
        s.render(&mut sink).unwrap();
        let frame = &sink.0[0];
        assert_eq!(frame.reference, Point2D::new(0.5, 0.5));
        assert_eq!(frame.result.matched.len(), 5);
        assert_eq!(frame.result.visible(), 40);
        assert!(frame.overlay.is_some());

        assert!(!s.toggle_grid());
        s.render(&mut sink).unwrap();
        assert!(sink.0[1].overlay.is_none());
    }
}
