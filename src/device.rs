use serde::{Deserialize, Serialize};

/// Xbox 360 Wireless Receiver for Windows.
pub const VENDOR_ID: u16 = 0x045E;
pub const PRODUCT_ID: u16 = 0x02A9;

/// Controllers multiplexed over one receiver.
pub const MAX_CONTROLLERS: usize = 4;

// The receiver exposes 8 interfaces; the even ones carry controller data.
const INTERFACES: [u8; MAX_CONTROLLERS] = [0, 2, 4, 6];
const ENDPOINTS_IN: [u8; MAX_CONTROLLERS] = [0x81, 0x83, 0x85, 0x87];
const ENDPOINTS_OUT: [u8; MAX_CONTROLLERS] = [0x01, 0x03, 0x05, 0x07];

/// Bit assignments of the 16-bit button word in a data report.
pub mod buttons {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_BUMPER: u16 = 0x0100;
    pub const RIGHT_BUMPER: u16 = 0x0200;
    pub const GUIDE: u16 = 0x0400;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;

    /// Every bit that maps to a flag. 0x0800 is unused by the hardware.
    pub const ALL: u16 = 0xF7FF;
}

/// One of the four controller slots on the receiver.
///
/// Built from any integer; out-of-range indices are clamped to slot 0 or 3
/// instead of being rejected, matching the receiver API this driver replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel(u8);

impl Channel {
    pub const ALL: [Channel; MAX_CONTROLLERS] = [Channel(0), Channel(1), Channel(2), Channel(3)];

    pub fn clamped(index: i64) -> Self {
        Channel(index.clamp(0, MAX_CONTROLLERS as i64 - 1) as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn interface(self) -> u8 {
        INTERFACES[self.index()]
    }

    pub fn endpoint_in(self) -> u8 {
        ENDPOINTS_IN[self.index()]
    }

    pub fn endpoint_out(self) -> u8 {
        ENDPOINTS_OUT[self.index()]
    }
}

impl From<i32> for Channel {
    fn from(index: i32) -> Self {
        Channel::clamped(index.into())
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "controller {}", self.0 + 1)
    }
}

/// Ring-of-light patterns understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum LedSetting {
    OffAll = 0,
    BlinkAll = 1,
    /// Blink quadrant 1, then leave it lit.
    Blink1On = 2,
    Blink2On = 3,
    Blink3On = 4,
    Blink4On = 5,
    On1 = 6,
    On2 = 7,
    On3 = 8,
    On4 = 9,
    Rotate = 10,
    Blink = 11,
    BlinkSlow = 12,
    Alternate = 13,
    BlinkSlowAll = 14,
    BlinkOnce = 15,
}

impl LedSetting {
    /// The "blink then stay on" pattern that identifies `channel`.
    pub fn blink_for(channel: Channel) -> Self {
        match channel.index() {
            0 => LedSetting::Blink1On,
            1 => LedSetting::Blink2On,
            2 => LedSetting::Blink3On,
            _ => LedSetting::Blink4On,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Snapshot of one controller.
///
/// All-zero (and disconnected) until the first button frame is decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub start: bool,
    pub back: bool,
    pub left_thumb: bool,
    pub right_thumb: bool,
    pub left_bumper: bool,
    pub right_bumper: bool,
    pub guide: bool,
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
    pub connected: bool,
}

impl ControllerState {
    /// Rebuild the raw button word from the individual flags.
    pub fn buttons(&self) -> u16 {
        [
            (self.up, buttons::DPAD_UP),
            (self.down, buttons::DPAD_DOWN),
            (self.left, buttons::DPAD_LEFT),
            (self.right, buttons::DPAD_RIGHT),
            (self.start, buttons::START),
            (self.back, buttons::BACK),
            (self.left_thumb, buttons::LEFT_THUMB),
            (self.right_thumb, buttons::RIGHT_THUMB),
            (self.left_bumper, buttons::LEFT_BUMPER),
            (self.right_bumper, buttons::RIGHT_BUMPER),
            (self.guide, buttons::GUIDE),
            (self.a, buttons::A),
            (self.b, buttons::B),
            (self.x, buttons::X),
            (self.y, buttons::Y),
        ]
        .iter()
        .filter(|(pressed, _)| *pressed)
        .fold(0u16, |mask, &(_, bit)| mask | bit)
    }
}
