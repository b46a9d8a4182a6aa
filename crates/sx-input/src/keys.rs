// SPDX-License-Identifier: MIT
//
// Key codes delivered to the host.
//
// Printable keys are their uppercase ASCII code. Keys with no ASCII
// spelling live above 0x80 in the classic id-software numbering, which is
// what game engines built on that lineage expect from their platform layer.

/// A key code. ASCII below 0x80, named keys above.
pub type KeyCode = u8;

pub const RIGHT_ARROW: KeyCode = 0xae;
pub const LEFT_ARROW: KeyCode = 0xac;
pub const UP_ARROW: KeyCode = 0xad;
pub const DOWN_ARROW: KeyCode = 0xaf;
pub const STRAFE_L: KeyCode = 0xa0;
pub const STRAFE_R: KeyCode = 0xa1;
pub const USE: KeyCode = 0xa2;
pub const FIRE: KeyCode = 0xa3;
pub const ESCAPE: KeyCode = 27;
pub const ENTER: KeyCode = 13;
pub const TAB: KeyCode = 9;
pub const BACKSPACE: KeyCode = 0x7f;
pub const PAUSE: KeyCode = 0xff;
pub const EQUALS: KeyCode = 0x3d;
pub const MINUS: KeyCode = 0x2d;

pub const RSHIFT: KeyCode = 0x80 + 0x36;
pub const RCTRL: KeyCode = 0x80 + 0x1d;
pub const RALT: KeyCode = 0x80 + 0x38;
pub const LALT: KeyCode = RALT;

pub const CAPSLOCK: KeyCode = 0x80 + 0x3a;
pub const NUMLOCK: KeyCode = 0x80 + 0x45;
pub const SCRLCK: KeyCode = 0x80 + 0x46;
pub const PRTSCR: KeyCode = 0x80 + 0x59;

pub const HOME: KeyCode = 0x80 + 0x47;
pub const END: KeyCode = 0x80 + 0x4f;
pub const PGUP: KeyCode = 0x80 + 0x49;
pub const PGDN: KeyCode = 0x80 + 0x51;
pub const INS: KeyCode = 0x80 + 0x52;
pub const DEL: KeyCode = 0x80 + 0x53;

pub const F1: KeyCode = 0x80 + 0x3b;
pub const F2: KeyCode = 0x80 + 0x3c;
pub const F3: KeyCode = 0x80 + 0x3d;
pub const F4: KeyCode = 0x80 + 0x3e;
pub const F5: KeyCode = 0x80 + 0x3f;
pub const F6: KeyCode = 0x80 + 0x40;
pub const F7: KeyCode = 0x80 + 0x41;
pub const F8: KeyCode = 0x80 + 0x42;
pub const F9: KeyCode = 0x80 + 0x43;
pub const F10: KeyCode = 0x80 + 0x44;
pub const F11: KeyCode = 0x80 + 0x57;
pub const F12: KeyCode = 0x80 + 0x58;

/// Name of a named key, for logs. `None` for plain ASCII characters.
#[must_use]
pub const fn key_name(code: KeyCode) -> Option<&'static str> {
    Some(match code {
        RIGHT_ARROW => "RIGHT_ARROW",
        LEFT_ARROW => "LEFT_ARROW",
        UP_ARROW => "UP_ARROW",
        DOWN_ARROW => "DOWN_ARROW",
        STRAFE_L => "STRAFE_L",
        STRAFE_R => "STRAFE_R",
        USE => "USE",
        FIRE => "FIRE",
        ESCAPE => "ESCAPE",
        ENTER => "ENTER",
        TAB => "TAB",
        BACKSPACE => "BACKSPACE",
        PAUSE => "PAUSE",
        EQUALS => "EQUALS",
        MINUS => "MINUS",
        RSHIFT => "RSHIFT",
        RCTRL => "RCTRL",
        RALT => "ALT",
        CAPSLOCK => "CAPSLOCK",
        NUMLOCK => "NUMLOCK",
        SCRLCK => "SCRLCK",
        PRTSCR => "PRTSCR",
        HOME => "HOME",
        END => "END",
        PGUP => "PGUP",
        PGDN => "PGDN",
        INS => "INS",
        DEL => "DEL",
        F1 => "F1",
        F2 => "F2",
        F3 => "F3",
        F4 => "F4",
        F5 => "F5",
        F6 => "F6",
        F7 => "F7",
        F8 => "F8",
        F9 => "F9",
        F10 => "F10",
        F11 => "F11",
        F12 => "F12",
        _ => return None,
    })
}

/// A printable rendering of any key code, for logs.
#[must_use]
pub fn describe(code: KeyCode) -> String {
    match key_name(code) {
        Some(name) => name.to_owned(),
        None if code.is_ascii_graphic() => char::from(code).to_string(),
        None => format!("0x{code:02x}"),
    }
}
