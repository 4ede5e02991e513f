use serde::{Deserialize, Serialize};

/// Logical key identity handed to the game modes. Physical keys are mapped
/// to fingers so that modes never care about the keyboard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finger {
    LeftPinky,
    LeftRing,
    LeftMiddle,
    LeftIndex,
    Thumbs,
    RightIndex,
    RightMiddle,
    RightRing,
    RightPinky,
    LeftButton,
    RightButton,
}

/// Physical keys and buttons the front-ends can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    A,
    C,
    D,
    F,
    J,
    K,
    L,
    S,
    V,
    X,
    Z,
    Space,
    Semicolon,
    MouseLeft,
    MouseRight,
    Other,
}

/// Maps a physical key to a finger, `None` for keys the game ignores.
///
/// The bottom row serves the standard modes, the middle row the
/// many-column ones. Both rows share fingers.
pub fn translate_key(key: Key) -> Option<Finger> {
    let finger = match key {
        Key::Z => Finger::LeftMiddle,
        Key::X => Finger::LeftIndex,
        Key::C => Finger::RightIndex,
        Key::V => Finger::RightMiddle,
        Key::A => Finger::LeftPinky,
        Key::S => Finger::LeftRing,
        Key::D => Finger::LeftMiddle,
        Key::F => Finger::LeftIndex,
        Key::Space => Finger::Thumbs,
        Key::J => Finger::RightIndex,
        Key::K => Finger::RightMiddle,
        Key::L => Finger::RightRing,
        Key::Semicolon => Finger::RightPinky,
        Key::MouseLeft => Finger::LeftButton,
        Key::MouseRight => Finger::RightButton,
        Key::Other => return None,
    };
    Some(finger)
}

/// Physical key for a typed character, as seen by terminal front-ends.
pub fn key_for_char(c: char) -> Key {
    match c.to_ascii_lowercase() {
        'a' => Key::A,
        'c' => Key::C,
        'd' => Key::D,
        'f' => Key::F,
        'j' => Key::J,
        'k' => Key::K,
        'l' => Key::L,
        's' => Key::S,
        'v' => Key::V,
        'x' => Key::X,
        'z' => Key::Z,
        ' ' => Key::Space,
        ';' => Key::Semicolon,
        _ => Key::Other,
    }
}

/// Shortcut for `translate_key(key_for_char(c))`.
pub fn translate_char(c: char) -> Option<Finger> {
    translate_key(key_for_char(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_share_fingers() {
        assert_eq!(translate_key(Key::Z), translate_key(Key::D));
        assert_eq!(translate_key(Key::X), Some(Finger::LeftIndex));
        assert_eq!(translate_key(Key::Space), Some(Finger::Thumbs));
    }

    #[test]
    fn unknown_keys_are_dropped() {
        assert_eq!(translate_key(Key::Other), None);
        assert_eq!(translate_char('q'), None);
        assert_eq!(translate_char('K'), Some(Finger::RightMiddle));
    }
}
