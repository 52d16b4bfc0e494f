//! Keyboard and touch decoding
//!
//! Pure functions from raw event data to commands, so they can be tested
//! without a browser.

use glam::Vec2;

use crate::sim::{Direction, GameInput};

/// Minimum swipe travel (px) before a touch counts as a move
pub const SWIPE_THRESHOLD: f32 = 10.0;

/// Decoded user command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Game(GameInput),
    ToggleMute,
}

/// Map a `KeyboardEvent.key` value to a command
pub fn decode_key(key: &str) -> Option<Command> {
    let input = match key {
        "ArrowUp" | "w" | "W" | "k" | "K" => GameInput::Move(Direction::Up),
        "ArrowRight" | "d" | "D" | "l" | "L" => GameInput::Move(Direction::Right),
        "ArrowDown" | "s" | "S" | "j" | "J" => GameInput::Move(Direction::Down),
        "ArrowLeft" | "a" | "A" | "h" | "H" => GameInput::Move(Direction::Left),
        "u" | "U" | "z" | "Z" => GameInput::Undo,
        "r" | "R" => GameInput::Restart,
        "x" | "X" => GameInput::ExchangeToggle,
        "b" | "B" | "Delete" => GameInput::RemoveToggle,
        "c" | "C" => GameInput::KeepPlaying,
        "m" | "M" => return Some(Command::ToggleMute),
        _ => return None,
    };
    Some(Command::Game(input))
}

/// Direction of a swipe along its dominant axis, if it travelled far enough
pub fn swipe_direction(delta: Vec2) -> Option<Direction> {
    let (ax, ay) = (delta.x.abs(), delta.y.abs());
    if ax.max(ay) <= SWIPE_THRESHOLD {
        return None;
    }
    Some(if ax > ay {
        if delta.x > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if delta.y > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    })
}

/// Tracks a single touch from start to end
#[derive(Debug, Clone, Copy, Default)]
pub struct SwipeTracker {
    start: Option<Vec2>,
}

impl SwipeTracker {
    pub fn begin(&mut self, pos: Vec2) {
        self.start = Some(pos);
    }

    /// Finish the gesture. A second `end` without `begin` yields nothing.
    pub fn end(&mut self, pos: Vec2) -> Option<Direction> {
        let start = self.start.take()?;
        swipe_direction(pos - start)
    }

    pub fn cancel(&mut self) {
        self.start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_keys() {
        for (keys, dir) in [
            (["ArrowUp", "w", "k"], Direction::Up),
            (["ArrowRight", "d", "l"], Direction::Right),
            (["ArrowDown", "s", "j"], Direction::Down),
            (["ArrowLeft", "a", "h"], Direction::Left),
        ] {
            for key in keys {
                assert_eq!(decode_key(key), Some(Command::Game(GameInput::Move(dir))), "{key}");
            }
        }
    }

    #[test]
    fn test_action_keys() {
        assert_eq!(decode_key("u"), Some(Command::Game(GameInput::Undo)));
        assert_eq!(decode_key("Z"), Some(Command::Game(GameInput::Undo)));
        assert_eq!(decode_key("r"), Some(Command::Game(GameInput::Restart)));
        assert_eq!(decode_key("x"), Some(Command::Game(GameInput::ExchangeToggle)));
        assert_eq!(decode_key("Delete"), Some(Command::Game(GameInput::RemoveToggle)));
        assert_eq!(decode_key("m"), Some(Command::ToggleMute));
        assert_eq!(decode_key("Enter"), None);
        assert_eq!(decode_key("q"), None);
    }

    #[test]
    fn test_swipe_threshold() {
        assert_eq!(swipe_direction(Vec2::new(10.0, 0.0)), None);
        assert_eq!(swipe_direction(Vec2::new(10.5, 0.0)), Some(Direction::Right));
        assert_eq!(swipe_direction(Vec2::new(-3.0, -40.0)), Some(Direction::Up));
        assert_eq!(swipe_direction(Vec2::new(-30.0, 20.0)), Some(Direction::Left));
        assert_eq!(swipe_direction(Vec2::new(5.0, 25.0)), Some(Direction::Down));
    }

    #[test]
    fn test_tracker_consumes_start() {
        let mut tracker = SwipeTracker::default();
        tracker.begin(Vec2::new(100.0, 100.0));
        assert_eq!(tracker.end(Vec2::new(160.0, 110.0)), Some(Direction::Right));
        assert_eq!(tracker.end(Vec2::new(300.0, 110.0)), None);

        tracker.begin(Vec2::ZERO);
        tracker.cancel();
        assert_eq!(tracker.end(Vec2::new(0.0, 50.0)), None);
    }
}
