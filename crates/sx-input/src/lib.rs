// SPDX-License-Identifier: MIT
//
// sx-input: key events from a terminal that only reports presses.
//
// The decoder turns non-blocking stdin bytes (plain characters and CSI
// arrow sequences, possibly split across reads) into presses. The repeat
// engine watches the timing of those presses, learns the keyboard's repeat
// delay and rate, and synthesizes the release events a terminal never
// sends. Both feed a bounded queue the host drains one event at a time.

pub mod decoder;
pub mod engine;
pub mod keys;
pub mod queue;
pub mod repeat;

pub use decoder::{Decoder, Press};
pub use engine::InputEngine;
pub use keys::KeyCode;
pub use queue::{EventQueue, KeyEvent, KeyEventKind};
pub use repeat::{KeyState, RepeatEngine, RepeatTiming};
