use alloc::vec::Vec;

use uefi::boot::{self, ScopedProtocol};
use uefi::proto::console::gop::{BltOp, BltPixel, BltRegion, GraphicsOutput, Mode};

use crate::error::{Error, Result};
use crate::gui::gop::{best_mode, BlitTarget};

/// The Graphics Output Protocol as a blit target.
pub struct GopTarget {
    gop: ScopedProtocol<GraphicsOutput>,
    width: usize,
    height: usize,
}

impl GopTarget {
    /// Opens the first graphics device and switches it to the largest mode
    /// no bigger than `max`.
    pub fn open(max: (usize, usize)) -> Result<Self> {
        let handle = boot::get_handle_for_protocol::<GraphicsOutput>()
            .map_err(|_| Error::NoGraphicsDevice)?;
        let mut gop = boot::open_protocol_exclusive::<GraphicsOutput>(handle)?;

        let modes: Vec<Mode> = gop.modes().collect();
        if let Some(index) = best_mode(modes.iter().map(|m| m.info().resolution()), max) {
            let mode = &modes[index];
            if let Err(e) = gop.set_mode(mode) {
                log::warn!("cannot switch to mode {:?}: {:?}", mode.info().resolution(), e.status());
            }
        }

        let (width, height) = gop.current_mode_info().resolution();
        Ok(Self { gop, width, height })
    }
}

impl BlitTarget for GopTarget {
    fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn blit_buffer_to_video(
        &mut self,
        buffer: &[BltPixel],
        src: (usize, usize),
        dest: (usize, usize),
        dims: (usize, usize),
        px_stride: usize,
    ) -> Result<()> {
        self.gop.blt(BltOp::BufferToVideo {
            buffer,
            src: BltRegion::SubRectangle {
                coords: src,
                px_stride,
            },
            dest,
            dims,
        })?;
        Ok(())
    }
}
