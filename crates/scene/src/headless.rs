use crate::host::FrameHost;
use explorer_input::{InputState, Key};
use explorer_render::RecordingDevice;

/// A [`FrameHost`] with scripted input over a [`RecordingDevice`]. Drives
/// the game in tests and in the CLI replay.
#[derive(Debug)]
pub struct HeadlessHost {
    device: RecordingDevice,
    input: InputState,
    elapsed: f32,
    size: (u32, u32),
    focused: bool,
    cursor_grabbed: bool,
    frames_presented: u64,
}

impl HeadlessHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_device(RecordingDevice::new(), width, height)
    }

    pub fn with_device(device: RecordingDevice, width: u32, height: u32) -> Self {
        Self {
            device,
            input: InputState::new(),
            elapsed: 1.0 / 60.0,
            size: (width, height),
            focused: true,
            cursor_grabbed: false,
            frames_presented: 0,
        }
    }

    pub fn set_elapsed(&mut self, seconds: f32) {
        self.elapsed = seconds;
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    /// Key goes down and stays down.
    pub fn hold(&mut self, key: Key) {
        self.input.key_event(key, true);
    }

    pub fn release(&mut self, key: Key) {
        self.input.key_event(key, false);
    }

    /// Press and release within one frame: pressed edge, not held.
    pub fn tap(&mut self, key: Key) {
        self.input.key_event(key, true);
        self.input.key_event(key, false);
    }

    pub fn mouse_motion(&mut self, dx: f32, dy: f32) {
        self.input.mouse_motion(dx, dy);
    }

    pub fn cursor_grabbed(&self) -> bool {
        self.cursor_grabbed
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn recording(&self) -> &RecordingDevice {
        &self.device
    }

    pub fn recording_mut(&mut self) -> &mut RecordingDevice {
        &mut self.device
    }
}

impl FrameHost for HeadlessHost {
    type Device = RecordingDevice;

    fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn input(&self) -> &InputState {
        &self.input
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_cursor_grabbed(&mut self, grabbed: bool) {
        self.cursor_grabbed = grabbed;
    }

    fn device(&mut self) -> &mut RecordingDevice {
        &mut self.device
    }

    fn swap_buffers(&mut self) {
        self.frames_presented += 1;
        self.input.begin_frame();
    }
}
