//! Wire format of the receiver's interrupt reports.
//!
//! # Input report (32 bytes)
//! | Offset | Size | Field                                           |
//! |--------|------|-------------------------------------------------|
//! | 0      | u8   | report type: 0x00 data, 0x08 connection         |
//! | 1      | u8   | connection: 0x80 present; data: 0x01 signature  |
//! | 3      | u8   | data signature 0xF0                             |
//! | 5      | u8   | data signature 0x13 (button/analog frame)       |
//! | 6–7    | u16  | buttons, LE                                     |
//! | 8      | u8   | left trigger                                    |
//! | 9      | u8   | right trigger                                   |
//! | 10–17  | 4×i16| sticks LX, LY, RX, RY, LE                       |
//!
//! # Output report (12 bytes)
//! All bytes not listed are zero.
//! - LED: `[2]=0x08, [3]=0x40|code`
//! - rumble: `[1]=0x01, [2]=0x0F, [3]=0xC0, [5]=big, [6]=small`
//! - ready/acknowledge: `[2]=0x02, [3]=0x80`

use crate::device::{buttons, ControllerState, LedSetting};

pub const INPUT_REPORT_LEN: usize = 32;
pub const OUTPUT_REPORT_LEN: usize = 12;

pub type RawInputReport = [u8; INPUT_REPORT_LEN];
pub type RawOutputReport = [u8; OUTPUT_REPORT_LEN];

const TYPE_DATA: u8 = 0x00;
const TYPE_CONNECTION: u8 = 0x08;
const CONNECTION_PRESENT: u8 = 0x80;
const BUTTON_FRAME_SIGNATURE: [(usize, u8); 3] = [(1, 0x01), (3, 0xF0), (5, 0x13)];
const PAYLOAD_OFFSET: usize = 6;

/// Button and analog payload of a data report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonFrame {
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
}

impl ButtonFrame {
    fn from_payload(p: &[u8; 12]) -> Self {
        Self {
            buttons: u16::from_le_bytes([p[0], p[1]]),
            left_trigger: p[2],
            right_trigger: p[3],
            thumb_lx: i16::from_le_bytes([p[4], p[5]]),
            thumb_ly: i16::from_le_bytes([p[6], p[7]]),
            thumb_rx: i16::from_le_bytes([p[8], p[9]]),
            thumb_ry: i16::from_le_bytes([p[10], p[11]]),
        }
    }

    /// Overwrite the digital and analog fields of `state`. `connected` is left alone.
    pub fn apply(&self, state: &mut ControllerState) {
        let pressed = |bit: u16| self.buttons & bit != 0;
        state.up = pressed(buttons::DPAD_UP);
        state.down = pressed(buttons::DPAD_DOWN);
        state.left = pressed(buttons::DPAD_LEFT);
        state.right = pressed(buttons::DPAD_RIGHT);
        state.start = pressed(buttons::START);
        state.back = pressed(buttons::BACK);
        state.left_thumb = pressed(buttons::LEFT_THUMB);
        state.right_thumb = pressed(buttons::RIGHT_THUMB);
        state.left_bumper = pressed(buttons::LEFT_BUMPER);
        state.right_bumper = pressed(buttons::RIGHT_BUMPER);
        state.guide = pressed(buttons::GUIDE);
        state.a = pressed(buttons::A);
        state.b = pressed(buttons::B);
        state.x = pressed(buttons::X);
        state.y = pressed(buttons::Y);
        state.left_trigger = self.left_trigger;
        state.right_trigger = self.right_trigger;
        state.thumb_lx = self.thumb_lx;
        state.thumb_ly = self.thumb_ly;
        state.thumb_rx = self.thumb_rx;
        state.thumb_ry = self.thumb_ry;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputReport {
    /// A controller joined (`present`) or left its slot.
    Connection { present: bool },
    Buttons(ButtonFrame),
    /// Anything else the receiver sends (battery, headset, ...). Not an error.
    Ignored,
}

pub fn decode(raw: &RawInputReport) -> InputReport {
    match raw[0] {
        TYPE_CONNECTION => InputReport::Connection {
            present: raw[1] == CONNECTION_PRESENT,
        },
        TYPE_DATA if is_button_frame(raw) => {
            let mut payload = [0u8; 12];
            payload.copy_from_slice(&raw[PAYLOAD_OFFSET..PAYLOAD_OFFSET + 12]);
            InputReport::Buttons(ButtonFrame::from_payload(&payload))
        }
        _ => InputReport::Ignored,
    }
}

fn is_button_frame(raw: &RawInputReport) -> bool {
    BUTTON_FRAME_SIGNATURE
        .iter()
        .all(|&(offset, value)| raw[offset] == value)
}

pub fn encode_led(setting: LedSetting) -> RawOutputReport {
    let mut out = [0u8; OUTPUT_REPORT_LEN];
    out[2] = 0x08;
    out[3] = 0x40 | setting.code();
    out
}

/// Absolute motor weights; 0 stops a motor.
pub fn encode_rumble(big: u8, small: u8) -> RawOutputReport {
    let mut out = [0u8; OUTPUT_REPORT_LEN];
    out[1] = 0x01;
    out[2] = 0x0F;
    out[3] = 0xC0;
    out[5] = big;
    out[6] = small;
    out
}

pub fn encode_ready() -> RawOutputReport {
    let mut out = [0u8; OUTPUT_REPORT_LEN];
    out[2] = 0x02;
    out[3] = 0x80;
    out
}
