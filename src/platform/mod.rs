#[cfg(windows)]
pub mod win32;

use glam::Vec2;

/// Map a polled screen-space cursor into logical client pixels.
///
/// Returns `None` when the cursor couldn't be read or hasn't moved since
/// `last`, so a failed poll never reads as a move to the origin.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn cursor_to_client(
    screen: Option<(f32, f32)>,
    window_origin: Vec2,
    scale_factor: f32,
    last: Option<Vec2>,
) -> Option<Vec2> {
    let (x, y) = screen?;
    let client = (Vec2::new(x, y) - window_origin) / scale_factor;
    (last != Some(client)).then_some(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_cursor_is_not_a_move() {
        assert_eq!(cursor_to_client(None, Vec2::ZERO, 1.0, None), None);
        assert_eq!(
            cursor_to_client(None, Vec2::ZERO, 1.0, Some(Vec2::new(300.0, 200.0))),
            None
        );
    }

    #[test]
    fn cursor_is_relative_to_window_and_scaled() {
        let client = cursor_to_client(Some((500.0, 300.0)), Vec2::new(100.0, 100.0), 2.0, None);
        assert_eq!(client, Some(Vec2::new(200.0, 100.0)));
    }

    #[test]
    fn unchanged_cursor_is_not_redispatched() {
        let last = Some(Vec2::new(40.0, 60.0));
        assert_eq!(cursor_to_client(Some((40.0, 60.0)), Vec2::ZERO, 1.0, last), None);
        assert_eq!(
            cursor_to_client(Some((41.0, 60.0)), Vec2::ZERO, 1.0, last),
            Some(Vec2::new(41.0, 60.0))
        );
    }
}
