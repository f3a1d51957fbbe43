use explorer_input::InputState;
use explorer_render::RenderDevice;

/// What the frame loop needs from a window backend: time, input, size, a
/// device to draw with, cursor mode and buffer presentation.
pub trait FrameHost {
    type Device: RenderDevice;

    /// Seconds since the previous frame.
    fn elapsed(&self) -> f32;

    /// Unfocused hosts still render but skip simulation.
    fn is_focused(&self) -> bool {
        true
    }

    fn input(&self) -> &InputState;

    /// Client area in physical pixels.
    fn size(&self) -> (u32, u32);

    fn set_cursor_grabbed(&mut self, grabbed: bool);

    fn device(&mut self) -> &mut Self::Device;

    /// Present the frame. Hosts clear per-frame input edges here.
    fn swap_buffers(&mut self);
}
