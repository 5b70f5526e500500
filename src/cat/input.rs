use std::cell::Cell;

use glam::Vec2;

/// Raw pointer input in client (window) pixels, as delivered by the page-wide source.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    /// Mouse/pen moved.
    Move { client: Vec2 },
    /// Touch points moved. First entry is the primary touch.
    TouchMove { touches: Vec<Vec2> },
}

/// Handle returned by [`InputSource::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&PointerEvent)>;

/// A page-wide stream of pointer events. Widgets subscribe on attach and
/// unsubscribe on detach; nothing reaches for it through globals.
pub trait InputSource {
    fn subscribe(&mut self, listener: Listener) -> ListenerId;
    /// Returns false if the id was not subscribed.
    fn unsubscribe(&mut self, id: ListenerId) -> bool;
}

/// Fan-out of pointer events to every subscribed listener.
pub struct PageInput {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl PageInput {
    pub fn new() -> Self {
        Self {
            listeners: Vec::with_capacity(2),
            next_id: 1,
        }
    }

    /// Deliver one event to all listeners, in subscription order.
    pub fn dispatch(&mut self, event: &PointerEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl InputSource for PageInput {
    fn subscribe(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }
}

/// Axis-aligned rectangle in client pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    pub fn height(&self) -> f32 {
        self.size.y
    }
}

/// Latest pointer target relative to the widget's bounding box.
///
/// Shared between the input listener and the animation controller through an
/// `Rc`. Everything runs on the event-loop thread, so `Cell` is enough.
pub struct InputTracker {
    bounds: Cell<Rect>,
    position: Cell<Option<Vec2>>,
    /// Set by every accepted event, consumed by the controller to re-arm walking.
    moved: Cell<bool>,
    accepted: Cell<u64>,
}

impl InputTracker {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds: Cell::new(bounds),
            position: Cell::new(None),
            moved: Cell::new(false),
            accepted: Cell::new(0),
        }
    }

    /// Apply one pointer event. Touch moves without a touch point are ignored.
    pub fn handle(&self, event: &PointerEvent) {
        let client = match event {
            PointerEvent::Move { client } => *client,
            PointerEvent::TouchMove { touches } => match touches.first() {
                Some(first) => *first,
                None => return,
            },
        };
        let local = client - self.bounds.get().min;
        self.position.set(Some(local));
        self.moved.set(true);
        self.accepted.set(self.accepted.get() + 1);
    }

    pub fn position(&self) -> Option<Vec2> {
        self.position.get()
    }

    pub fn bounds(&self) -> Rect {
        self.bounds.get()
    }

    pub fn set_bounds(&self, bounds: Rect) {
        self.bounds.set(bounds);
    }

    /// True once per burst of input since the last call.
    pub fn take_moved(&self) -> bool {
        self.moved.replace(false)
    }

    /// Number of events that updated the position.
    pub fn accepted_events(&self) -> u64 {
        self.accepted.get()
    }
}

/// Active touch points keyed by finger id, in the order they went down.
///
/// winit reports touches one finger at a time; this rebuilds the
/// "all current touches" list a touch-move event carries.
pub struct TouchPoints {
    points: Vec<(u64, Vec2)>,
}

impl TouchPoints {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(4),
        }
    }

    pub fn start(&mut self, id: u64, pos: Vec2) {
        match self.points.iter_mut().find(|(pid, _)| *pid == id) {
            Some(point) => point.1 = pos,
            None => self.points.push((id, pos)),
        }
    }

    /// Update a finger and return the resulting touch-move event.
    pub fn moved(&mut self, id: u64, pos: Vec2) -> PointerEvent {
        self.start(id, pos);
        PointerEvent::TouchMove {
            touches: self.points.iter().map(|(_, p)| *p).collect(),
        }
    }

    pub fn end(&mut self, id: u64) {
        self.points.retain(|(pid, _)| *pid != id);
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn mouse_move_is_stored_relative_to_bounds() {
        let tracker = InputTracker::new(Rect::new(Vec2::new(10.0, 20.0), Vec2::new(800.0, 600.0)));
        assert_eq!(tracker.position(), None);

        tracker.handle(&PointerEvent::Move { client: Vec2::new(110.0, 220.0) });
        assert_eq!(tracker.position(), Some(Vec2::new(100.0, 200.0)));
        assert!(tracker.take_moved());
        assert!(!tracker.take_moved());
    }

    #[test]
    fn out_of_bounds_coordinates_are_accepted() {
        let tracker = InputTracker::new(Rect::new(Vec2::new(50.0, 50.0), Vec2::new(100.0, 100.0)));
        tracker.handle(&PointerEvent::Move { client: Vec2::new(0.0, 500.0) });
        assert_eq!(tracker.position(), Some(Vec2::new(-50.0, 450.0)));
    }

    #[test]
    fn empty_touch_move_is_ignored() {
        let tracker = InputTracker::new(Rect::from_size(800.0, 600.0));
        tracker.handle(&PointerEvent::Move { client: Vec2::new(5.0, 6.0) });
        tracker.take_moved();

        tracker.handle(&PointerEvent::TouchMove { touches: Vec::new() });
        assert_eq!(tracker.position(), Some(Vec2::new(5.0, 6.0)));
        assert!(!tracker.take_moved());
        assert_eq!(tracker.accepted_events(), 1);
    }

    #[test]
    fn touch_move_uses_first_touch() {
        let tracker = InputTracker::new(Rect::from_size(800.0, 600.0));
        tracker.handle(&PointerEvent::TouchMove {
            touches: vec![Vec2::new(30.0, 40.0), Vec2::new(300.0, 400.0)],
        });
        assert_eq!(tracker.position(), Some(Vec2::new(30.0, 40.0)));
    }

    #[test]
    fn touch_points_keep_start_order() {
        let mut touches = TouchPoints::new();
        touches.start(7, Vec2::new(1.0, 1.0));
        touches.start(3, Vec2::new(2.0, 2.0));

        let event = touches.moved(3, Vec2::new(9.0, 9.0));
        assert_eq!(
            event,
            PointerEvent::TouchMove { touches: vec![Vec2::new(1.0, 1.0), Vec2::new(9.0, 9.0)] }
        );

        touches.end(7);
        touches.end(3);
        assert!(touches.is_empty());
    }

    #[test]
    fn unsubscribed_listener_stops_receiving() {
        let mut page = PageInput::new();
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        let id = page.subscribe(Box::new(move |_| *counter.borrow_mut() += 1));

        page.dispatch(&PointerEvent::Move { client: Vec2::ZERO });
        assert!(page.unsubscribe(id));
        assert!(!page.unsubscribe(id));
        page.dispatch(&PointerEvent::Move { client: Vec2::ZERO });

        assert_eq!(*seen.borrow(), 1);
        assert_eq!(page.listener_count(), 0);
    }
}
