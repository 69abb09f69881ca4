//! Standard controller: an 8-bit shift register behind $4016/$4017.

use emu_core::logging::{log, LogCategory, LogLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub(crate) fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    /// Bit of the button in the report; A is shifted out first.
    pub const fn mask(self) -> u8 {
        match self {
            Button::A => 0x80,
            Button::B => 0x40,
            Button::Select => 0x20,
            Button::Start => 0x10,
            Button::Up => 0x08,
            Button::Down => 0x04,
            Button::Left => 0x02,
            Button::Right => 0x01,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Joystick {
    buttons: u8,
    strobe: bool,
    /// Bits already shifted out since the last reload.
    shifted: u8,
}

impl Joystick {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, button: Button) {
        self.buttons |= button.mask();
    }

    pub fn release(&mut self, button: Button) {
        self.buttons &= !button.mask();
    }

    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    /// $4016 write: bit 0 is the strobe line.
    pub fn write(&mut self, data: u8) {
        self.strobe = data & 0x01 != 0;
        self.shifted = 0;
        log(LogCategory::Input, LogLevel::Trace, || {
            format!("strobe {}", if self.strobe { "high" } else { "low" })
        });
    }

    /// Next report bit. A while strobe is high, 1 once all eight are out.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            return (self.buttons >> 7) & 0x01;
        }
        if self.shifted >= 8 {
            return 0x01;
        }
        let bit = (self.buttons >> (7 - self.shifted)) & 0x01;
        self.shifted += 1;
        bit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latched(buttons: &[Button]) -> Joystick {
        let mut pad = Joystick::new();
        for &b in buttons {
            pad.press(b);
        }
        pad.write(1);
        pad.write(0);
        pad
    }

    #[test]
    fn reports_buttons_in_order() {
        let mut pad = latched(&[Button::A, Button::Start, Button::Right]);
        let bits: Vec<u8> = (0..8).map(|_| pad.read()).collect();
        assert_eq!(bits, vec![1, 0, 0, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn reads_past_eight_return_one() {
        let mut pad = latched(&[]);
        for _ in 0..8 {
            assert_eq!(pad.read(), 0);
        }
        assert_eq!(pad.read(), 1);
        assert_eq!(pad.read(), 1);
    }

    #[test]
    fn strobe_high_keeps_returning_a() {
        let mut pad = Joystick::new();
        pad.press(Button::A);
        pad.write(1);
        for _ in 0..10 {
            assert_eq!(pad.read(), 1);
        }
        pad.release(Button::A);
        assert_eq!(pad.read(), 0);
    }

    #[test]
    fn rewrite_restarts_sequence() {
        let mut pad = latched(&[Button::A]);
        assert_eq!(pad.read(), 1);
        assert_eq!(pad.read(), 0);
        pad.write(0);
        assert_eq!(pad.read(), 1);
    }

    #[test]
    fn press_and_release_track_mask() {
        let mut pad = Joystick::new();
        pad.press(Button::Up);
        pad.press(Button::B);
        assert_eq!(pad.buttons(), 0x48);
        pad.release(Button::Up);
        assert_eq!(pad.buttons(), 0x40);
    }
}
