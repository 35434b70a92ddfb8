//! `SendInput` backed poster.

use std::mem;

use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, SendInput, VIRTUAL_KEY,
};

use crate::{Poster, Result, Stroke};

/// Posts strokes to the system input stream.
pub(crate) struct SendInputPoster;

fn to_input(s: &Stroke) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(u16::from(s.key.virtual_code())),
                wScan: s.scan_code(),
                dwFlags: KEYBD_EVENT_FLAGS(s.flags().bits()),
                time: 0,
                dwExtraInfo: s.extra_info(),
            },
        },
    }
}

impl Poster for SendInputPoster {
    fn post(&self, strokes: &[Stroke]) -> Result<usize> {
        let inputs: Vec<INPUT> = strokes.iter().map(to_input).collect();
        // SendInput inserts the batch serially without interleaving other input.
        let sent = unsafe { SendInput(&inputs, mem::size_of::<INPUT>() as i32) };
        Ok(sent as usize)
    }
}
