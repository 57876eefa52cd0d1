use std::ffi::c_int;
use std::ptr::{null_mut, NonNull};
use std::slice;

use libwebp_sys::{WebPDecodeRGBA, WebPEncodeLosslessRGBA, WebPFree};

use crate::ReferenceImage;

#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    #[error("error decoding")]
    Decode,

    #[error("error encoding")]
    Encode,

    #[error("image dimensions too large")]
    TooLarge,
}

/// A buffer allocated by libwebp.
struct WebPBuffer {
    ptr: NonNull<u8>,
    len: usize,
}

pub fn decode(data: &[u8]) -> Result<ReferenceImage, Error> {
    let (mut width, mut height): (c_int, c_int) = (0, 0);
    let ptr = unsafe { WebPDecodeRGBA(data.as_ptr(), data.len(), &mut width, &mut height) };
    let (width, height) = (width as u32, height as u32);
    let buffer = WebPBuffer::new(ptr, width as usize * height as usize * 4).ok_or(Error::Decode)?;
    Ok(ReferenceImage { width, height, data: buffer.as_slice().to_vec() })
}

pub fn encode_lossless(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>, Error> {
    let stride = width.checked_mul(4).ok_or(Error::TooLarge)?;
    let (width, height, stride) = (
        c_int::try_from(width).map_err(|_| Error::TooLarge)?,
        c_int::try_from(height).map_err(|_| Error::TooLarge)?,
        c_int::try_from(stride).map_err(|_| Error::TooLarge)?,
    );
    assert_eq!(rgba.len(), stride as usize * height as usize);
    let mut output = null_mut();
    let len = unsafe { WebPEncodeLosslessRGBA(rgba.as_ptr(), width, height, stride, &mut output) };
    let buffer = WebPBuffer::new(output, len).ok_or(Error::Encode)?;
    Ok(buffer.as_slice().to_vec())
}

impl WebPBuffer {
    fn new(ptr: *mut u8, len: usize) -> Option<Self> {
        let ptr = NonNull::new(ptr)?;
        if len == 0 {
            unsafe { WebPFree(ptr.as_ptr().cast()) };
            return None;
        }
        Some(Self { ptr, len })
    }

    fn as_slice(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for WebPBuffer {
    fn drop(&mut self) {
        unsafe { WebPFree(self.ptr.as_ptr().cast()) };
    }
}
