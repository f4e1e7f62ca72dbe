//! Image processing implementation
//!
//! Two halves: [`configure_pipeline`] turns a decoded [`OperationMap`] into
//! calls on a [`TransformPipeline`], and [`ImagePipeline`] records those calls
//! and later runs decode → resize → encode.

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::DynamicImage;
use std::io::Cursor;
use std::num::NonZeroU32;

use super::animation::{self, AnimationFrame};
use super::encoder::{EncodedImage, EncoderFactory, EncoderQuality};
use super::error::ImageError;
use super::params::{ContentDescriptor, Operation, OperationMap, OutputFormat};
use crate::constants::{MAX_HEIGHT, MAX_QUALITY, MAX_WIDTH, MIN_HEIGHT, MIN_QUALITY, MIN_WIDTH};

/// Target dimensions; a missing side is derived from the aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResizeOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Sink for transform steps
#[cfg_attr(test, mockall::automock)]
pub trait TransformPipeline {
    /// Resize to the given dimensions
    fn resize(&mut self, options: ResizeOptions);

    /// Convert to `format`; `quality` is only given for lossy formats
    fn to_format(&mut self, format: OutputFormat, quality: Option<u8>);
}

/// Configure `pipeline` from a decoded operation map
///
/// Resize is requested only when width or height is present, format
/// conversion only when format is present. Quality rides along with the
/// format only if the descriptor is lossy.
///
/// Values must fall inside the bounds the edge tier emits. Paths can reach
/// the origin without passing the edge normalizer, so an out-of-range
/// dimension is rejected here rather than allocated.
pub fn configure_pipeline<P>(
    pipeline: &mut P,
    operations: &OperationMap,
    descriptor: &ContentDescriptor,
) -> Result<(), ImageError>
where
    P: TransformPipeline + ?Sized,
{
    let width = parse_bounded(operations, Operation::Width, MIN_WIDTH, MAX_WIDTH)?;
    let height = parse_bounded(operations, Operation::Height, MIN_HEIGHT, MAX_HEIGHT)?;

    if width.is_some() || height.is_some() {
        pipeline.resize(ResizeOptions { width, height });
    }

    if let Some(token) = operations.value(Operation::Format) {
        let format = OutputFormat::from_canonical(token)
            .ok_or_else(|| ImageError::unsupported_format(token))?;

        let quality = if descriptor.is_lossy {
            parse_bounded(operations, Operation::Quality, MIN_QUALITY, MAX_QUALITY)?
                .map(|quality| quality as u8)
        } else {
            None
        };

        pipeline.to_format(format, quality);
    }

    Ok(())
}

fn parse_bounded(
    operations: &OperationMap,
    operation: Operation,
    min: u32,
    max: u32,
) -> Result<Option<u32>, ImageError> {
    let Some(raw) = operations.value(operation) else {
        return Ok(None);
    };

    let value = raw.parse::<u32>().map_err(|_| {
        ImageError::invalid_param(operation.as_str(), format!("'{}' is not a valid value", raw))
    })?;

    if !(min..=max).contains(&value) {
        return Err(ImageError::invalid_param(
            operation.as_str(),
            format!("{} is outside {}..={}", value, min, max),
        ));
    }

    Ok(Some(value))
}

/// Recorded transform steps, executed against source bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagePipeline {
    resize: Option<ResizeOptions>,
    format: Option<OutputFormat>,
    quality: Option<u8>,
}

impl TransformPipeline for ImagePipeline {
    fn resize(&mut self, options: ResizeOptions) {
        self.resize = Some(options);
    }

    fn to_format(&mut self, format: OutputFormat, quality: Option<u8>) {
        self.format = Some(format);
        self.quality = quality;
    }
}

impl ImagePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resize_options(&self) -> Option<ResizeOptions> {
        self.resize
    }

    pub fn output_format(&self) -> Option<OutputFormat> {
        self.format
    }

    pub fn quality(&self) -> Option<u8> {
        self.quality
    }

    /// Decode `data`, apply the recorded steps and encode the result
    ///
    /// Without a recorded format the source format is kept. Animated sources
    /// keep every frame when the output is WebP. CPU bound; run it on a
    /// blocking thread from async code.
    pub fn execute(&self, data: &[u8]) -> Result<EncodedImage, ImageError> {
        let output_format = self.format.unwrap_or_else(|| detect_format(data));
        let quality = self
            .quality
            .map(EncoderQuality::with_quality)
            .unwrap_or_default();

        if let Some(frames) = animation::decode_frames(data) {
            return self.execute_animated(frames, output_format, quality);
        }

        let img = self.apply_resize(decode_image(data)?)?;
        encode_still(img, output_format, quality)
    }

    fn execute_animated(
        &self,
        frames: Vec<AnimationFrame>,
        output_format: OutputFormat,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        if output_format != OutputFormat::WebP {
            let first = frames
                .into_iter()
                .next()
                .ok_or_else(|| ImageError::decode_failed("animation has no frames"))?;
            let img = self.apply_resize(DynamicImage::ImageRgba8(first.image))?;
            return encode_still(img, output_format, quality);
        }

        let frames = frames
            .into_iter()
            .map(|frame| {
                let img = self.apply_resize(DynamicImage::ImageRgba8(frame.image))?;
                Ok(AnimationFrame {
                    image: img.into_rgba8(),
                    delay_ms: frame.delay_ms,
                })
            })
            .collect::<Result<Vec<_>, ImageError>>()?;

        animation::encode_webp(&frames, quality)
    }

    fn apply_resize(&self, img: DynamicImage) -> Result<DynamicImage, ImageError> {
        let Some(options) = self.resize else {
            return Ok(img);
        };

        let (target_w, target_h) = calculate_dimensions(img.width(), img.height(), options);
        if target_w != img.width() || target_h != img.height() {
            resize_image(&img, target_w, target_h)
        } else {
            Ok(img)
        }
    }
}

fn encode_still(
    img: DynamicImage,
    format: OutputFormat,
    quality: EncoderQuality,
) -> Result<EncodedImage, ImageError> {
    let (width, height) = (img.width(), img.height());
    let rgba_data = img.into_rgba8().into_raw();

    EncoderFactory::create(format).encode(&rgba_data, width, height, quality)
}

/// Decode image data into a DynamicImage (first frame for animations)
fn decode_image(data: &[u8]) -> Result<DynamicImage, ImageError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?
        .decode()
        .map_err(|e| ImageError::decode_failed(e.to_string()))
}

/// Detect image format from data, falling back to JPEG
fn detect_format(data: &[u8]) -> OutputFormat {
    match image::guess_format(data) {
        Ok(image::ImageFormat::Png) => OutputFormat::Png,
        Ok(image::ImageFormat::WebP) => OutputFormat::WebP,
        _ => OutputFormat::Jpeg,
    }
}

/// Resolve the output size; one missing side keeps the aspect ratio
fn calculate_dimensions(src_width: u32, src_height: u32, options: ResizeOptions) -> (u32, u32) {
    let scale = |value: u32, num: u32, den: u32| -> u32 {
        ((value as f64 * num as f64 / den.max(1) as f64).round() as u32).max(1)
    };

    match (options.width, options.height) {
        (Some(w), Some(h)) => (w.max(1), h.max(1)),
        (Some(w), None) => (w.max(1), scale(src_height, w, src_width)),
        (None, Some(h)) => (scale(src_width, h, src_height), h.max(1)),
        (None, None) => (src_width, src_height),
    }
}

/// Resize using fast-image-resize with Lanczos3
///
/// The source is centre-cropped to the target aspect ratio first, so the
/// output covers the whole target box.
fn resize_image(img: &DynamicImage, target_w: u32, target_h: u32) -> Result<DynamicImage, ImageError> {
    let src_width =
        NonZeroU32::new(img.width()).ok_or_else(|| ImageError::resize_failed("Source width is 0"))?;
    let src_height = NonZeroU32::new(img.height())
        .ok_or_else(|| ImageError::resize_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| ImageError::resize_failed("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| ImageError::resize_failed("Target height is 0"))?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| ImageError::resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let mut src_view = src_image.view();
    src_view.set_crop_box_to_fit_dst_size(dst_width, dst_height, Some((0.5, 0.5)));

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);
    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));

    resizer
        .resize(&src_view, &mut dst_image.view_mut())
        .map_err(|e| ImageError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    let rgba_image = image::RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| ImageError::resize_failed("Failed to create output image buffer"))?;

    Ok(DynamicImage::ImageRgba8(rgba_image))
}
