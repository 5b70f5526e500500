pub mod animation;
pub mod controller;
pub mod input;
pub mod jump;
pub mod motion;
pub mod pose;

use std::rc::Rc;

use self::controller::{AnimationController, Tick, TickStats};
use self::input::{InputSource, InputTracker, ListenerId, Rect};
use self::jump::RandomSource;
use self::pose::VisualState;
use crate::config::CatTuning;

/// The cat overlay: input tracking plus the animation loop, attached to a
/// page-wide input source for its lifetime.
pub struct CatWidget<R: RandomSource = fastrand::Rng> {
    tracker: Rc<InputTracker>,
    controller: AnimationController<R>,
    subscription: Option<ListenerId>,
}

impl<R: RandomSource> CatWidget<R> {
    pub fn new(bounds: Rect, tuning: CatTuning, rng: R) -> Self {
        Self {
            tracker: Rc::new(InputTracker::new(bounds)),
            controller: AnimationController::new(tuning, rng),
            subscription: None,
        }
    }

    /// Subscribe to pointer input and start the animation loop.
    pub fn on_attach(&mut self, source: &mut dyn InputSource) {
        if self.subscription.is_some() {
            log::warn!("Cat widget attached twice, ignoring");
            return;
        }
        let tracker = Rc::clone(&self.tracker);
        let id = source.subscribe(Box::new(move |event| tracker.handle(event)));
        self.subscription = Some(id);
        self.controller.start();
        log::info!("Cat attached ({:?})", id);
    }

    /// Unsubscribe from pointer input and cancel the animation loop.
    pub fn on_detach(&mut self, source: &mut dyn InputSource) {
        if let Some(id) = self.subscription.take() {
            source.unsubscribe(id);
            log::info!("Cat detached ({:?})", id);
        }
        self.controller.stop();
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Whether the host should keep scheduling frames.
    pub fn is_animating(&self) -> bool {
        self.controller.is_running()
    }

    /// Widget moved or resized.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.tracker.set_bounds(bounds);
    }

    pub fn bounds(&self) -> Rect {
        self.tracker.bounds()
    }

    /// Run one frame of the animation loop.
    pub fn frame(&mut self, now_ms: f64) -> Tick {
        self.controller.tick(now_ms, &self.tracker)
    }

    pub fn visual(&self) -> &VisualState {
        self.controller.state()
    }

    pub fn pointer(&self) -> Option<glam::Vec2> {
        self.tracker.position()
    }

    pub fn stats(&self) -> TickStats {
        self.controller.stats()
    }

    /// Pointer events accepted since creation.
    pub fn input_events(&self) -> u64 {
        self.tracker.accepted_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cat::input::{PageInput, PointerEvent};
    use crate::cat::pose::{Facing, Stance};
    use glam::Vec2;

    fn widget() -> CatWidget {
        CatWidget::new(
            Rect::from_size(1000.0, 800.0),
            CatTuning::default(),
            fastrand::Rng::with_seed(1),
        )
    }

    #[test]
    fn attached_widget_follows_page_input() {
        let mut page = PageInput::new();
        let mut cat = widget();
        cat.on_attach(&mut page);
        assert!(cat.is_attached());
        assert_eq!(page.listener_count(), 1);

        assert_eq!(cat.frame(0.0), Tick::NoInput);
        page.dispatch(&PointerEvent::Move { client: Vec2::new(800.0, 750.0) });
        assert_eq!(cat.frame(16.0), Tick::Evaluated);
        assert_eq!(cat.visual().facing, Some(Facing::Right));
        assert_eq!(cat.visual().stance, Stance::Walking);
    }

    #[test]
    fn detach_unsubscribes_and_stops_loop() {
        let mut page = PageInput::new();
        let mut cat = widget();
        cat.on_attach(&mut page);
        cat.on_detach(&mut page);

        assert!(!cat.is_attached());
        assert!(!cat.is_animating());
        assert_eq!(page.listener_count(), 0);

        page.dispatch(&PointerEvent::Move { client: Vec2::new(800.0, 750.0) });
        assert_eq!(cat.pointer(), None);
        assert_eq!(cat.frame(500.0), Tick::Stopped);
    }

    #[test]
    fn double_attach_keeps_one_subscription() {
        let mut page = PageInput::new();
        let mut cat = widget();
        cat.on_attach(&mut page);
        cat.on_attach(&mut page);
        assert_eq!(page.listener_count(), 1);
    }

    #[test]
    fn pointer_is_relative_to_widget_bounds() {
        let mut page = PageInput::new();
        let mut cat = widget();
        cat.set_bounds(Rect::new(Vec2::new(100.0, 50.0), Vec2::new(900.0, 750.0)));
        cat.on_attach(&mut page);
        page.dispatch(&PointerEvent::TouchMove { touches: vec![Vec2::new(150.0, 60.0)] });
        assert_eq!(cat.pointer(), Some(Vec2::new(50.0, 10.0)));
    }
}
