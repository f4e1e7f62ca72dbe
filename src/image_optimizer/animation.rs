//! Multi-frame sources (animated GIF and WebP)
//!
//! Frames are decoded as full-canvas RGBA buffers. Only WebP output keeps
//! the animation; still formats are produced from the first frame.

use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Frame, ImageFormat, RgbaImage};

use super::encoder::{EncodedImage, EncoderQuality};
use super::error::ImageError;
use super::params::OutputFormat;

/// Browsers show zero-delay GIF frames at roughly this rate
const ZERO_DELAY_FALLBACK_MS: u32 = 100;

/// One decoded animation frame
#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub image: RgbaImage,
    pub delay_ms: u32,
}

impl AnimationFrame {
    fn from_frame(frame: Frame) -> Self {
        let (numer, denom) = frame.delay().numer_denom_ms();
        let delay_ms = match numer / denom.max(1) {
            0 => ZERO_DELAY_FALLBACK_MS,
            ms => ms,
        };
        Self {
            image: frame.into_buffer(),
            delay_ms,
        }
    }
}

/// Decode every frame of an animated source
///
/// Returns `None` for still images, single-frame animations and anything
/// the frame decoders reject; those go through the still-image path, which
/// reports decode errors itself.
pub fn decode_frames(data: &[u8]) -> Option<Vec<AnimationFrame>> {
    let frames = match image::guess_format(data).ok()? {
        ImageFormat::Gif => GifDecoder::new(Cursor::new(data))
            .ok()?
            .into_frames()
            .collect_frames(),
        ImageFormat::WebP => WebPDecoder::new(Cursor::new(data))
            .ok()?
            .into_frames()
            .collect_frames(),
        _ => return None,
    }
    .ok()?;

    if frames.len() < 2 {
        return None;
    }

    Some(frames.into_iter().map(AnimationFrame::from_frame).collect())
}

/// Encode frames as an animated lossy WebP
///
/// All frames must share the first frame's dimensions.
pub fn encode_webp(
    frames: &[AnimationFrame],
    quality: EncoderQuality,
) -> Result<EncodedImage, ImageError> {
    let first = frames
        .first()
        .ok_or_else(|| ImageError::encode_failed("webp", "animation has no frames"))?;
    let (width, height) = first.image.dimensions();

    if let Some(frame) = frames.iter().find(|f| f.image.dimensions() != (width, height)) {
        return Err(ImageError::encode_failed(
            "webp",
            format!(
                "frame size {:?} differs from canvas {}x{}",
                frame.image.dimensions(),
                width,
                height
            ),
        ));
    }

    let mut config = webp::WebPConfig::new()
        .map_err(|_| ImageError::encode_failed("webp", "failed to initialise encoder config"))?;
    config.lossless = 0;
    config.quality = f32::from(quality.quality);

    let mut encoder = webp::AnimEncoder::new(width, height, &config);
    let mut timestamp_ms: i32 = 0;
    for frame in frames {
        encoder.add_frame(webp::AnimFrame::from_rgba(
            frame.image.as_raw(),
            width,
            height,
            timestamp_ms,
        ));
        let delay = i32::try_from(frame.delay_ms).unwrap_or(i32::MAX);
        timestamp_ms = timestamp_ms.saturating_add(delay);
    }

    Ok(EncodedImage::new(encoder.encode().to_vec(), OutputFormat::WebP))
}
