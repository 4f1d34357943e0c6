//! Shared helpers for integration tests: a recording model and scan fixtures.

#![allow(dead_code)]

use archive_assistant::{LanguageModel, ModelError};
use async_trait::async_trait;
use edgequake_llm::ImageData;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Answers OCR with a fixed text and records every text prompt.
///
/// Generation answers `"{prefix}{n}"`, or fails when `fail_generate` is set.
pub struct RecordingModel {
    pub ocr_text: String,
    pub prefix: String,
    pub fail_generate: bool,
    /// Added before every generation reply.
    pub generate_delay: Duration,
    image_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl RecordingModel {
    pub fn new(ocr_text: &str) -> Self {
        Self {
            ocr_text: ocr_text.to_string(),
            prefix: "model reply #".to_string(),
            fail_generate: false,
            generate_delay: Duration::ZERO,
            image_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_generation(ocr_text: &str) -> Self {
        Self {
            fail_generate: true,
            ..Self::new(ocr_text)
        }
    }

    pub fn slow_generation(ocr_text: &str, delay: Duration) -> Self {
        Self {
            generate_delay: delay,
            ..Self::new(ocr_text)
        }
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for RecordingModel {
    async fn read_image(&self, _instruction: &str, _image: ImageData) -> Result<String, ModelError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.ocr_text.clone())
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let n = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };
        if !self.generate_delay.is_zero() {
            tokio::time::sleep(self.generate_delay).await;
        }
        if self.fail_generate {
            return Err(ModelError::Api("service unavailable".into()));
        }
        Ok(format!("{}{}", self.prefix, n))
    }
}

/// A small PNG whose pixel colour makes each scan's bytes unique.
pub fn scan_png(shade: u8) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([shade, shade, shade, 255])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encode");
    buf
}
