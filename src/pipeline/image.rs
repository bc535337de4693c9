//! Image → PDF via img2pdf.
//!
//! img2pdf embeds JPEG and PNG data losslessly but refuses images with an
//! alpha channel. Before handing a file over we decode it with the `image`
//! crate; transparent images are composited onto white and re-encoded as an
//! opaque PNG. Decoding is CPU-bound, so it runs in `spawn_blocking`.

use crate::error::FileError;
use crate::pipeline::dispatch::{Converter, Job};
use crate::pipeline::tool::ToolRun;
use async_trait::async_trait;
use image::{ImageFormat, ImageReader, Rgb, RgbImage, RgbaImage};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub struct ImageConverter {
    program: PathBuf,
    timeout: Duration,
}

impl ImageConverter {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

/// Composite an RGBA image onto a white background.
pub fn flatten_onto_white(rgba: &RgbaImage) -> RgbImage {
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    rgb
}

/// Return the file img2pdf should embed: the input itself, or an opaque
/// copy written to `out_dir/<stem>.opaque.png`.
fn prepare_blocking(input: &Path, out_dir: &Path, name: &str) -> Result<PathBuf, FileError> {
    let rejected = |detail: String| FileError::ImageRejected {
        filename: name.to_string(),
        detail,
    };

    let img = ImageReader::open(input)
        .map_err(|e| rejected(format!("cannot open image: {e}")))?
        .with_guessed_format()
        .map_err(|e| rejected(format!("cannot read image: {e}")))?
        .decode()
        .map_err(|e| rejected(format!("not a valid image: {e}")))?;

    if !img.color().has_alpha() {
        return Ok(input.to_path_buf());
    }

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let opaque = out_dir.join(format!("{stem}.opaque.png"));
    flatten_onto_white(&img.to_rgba8())
        .save_with_format(&opaque, ImageFormat::Png)
        .map_err(|e| rejected(format!("failed to flatten transparency: {e}")))?;
    debug!("Flattened alpha channel of {} into {}", name, opaque.display());
    Ok(opaque)
}

#[async_trait]
impl Converter for ImageConverter {
    fn name(&self) -> &'static str {
        "img2pdf"
    }

    async fn convert(&self, job: &Job<'_>) -> Result<PathBuf, FileError> {
        let input = job.input.to_path_buf();
        let out_dir = job.out_dir.to_path_buf();
        let name = job.name.to_string();
        let source = tokio::task::spawn_blocking(move || prepare_blocking(&input, &out_dir, &name))
            .await
            .map_err(|e| FileError::ImageRejected {
                filename: job.name.to_string(),
                detail: format!("image task panicked: {e}"),
            })??;

        let output = job.output_path();
        let run = ToolRun {
            tool: self.name(),
            program: &self.program,
            filename: job.name,
            timeout: self.timeout,
        };
        run.run([source.as_os_str(), OsStr::new("-o"), output.as_os_str()])
            .await?;
        run.expect_output(&output).await?;
        Ok(output)
    }
}
