//! Barcode labels for sample identifiers.
//!
//! A key is encoded as Code 128, stretched to a fixed
//! 200x200 grayscale raster and written out as PNG. Every step is a pure
//! function of the key, so the same key always yields the same bytes.
//!
//! ```
//! let png = barcode::render_png("S-000123").unwrap();
//! assert_eq!(&png[1..4], b"PNG");
//! assert_eq!(png, barcode::render_png("S-000123").unwrap());
//! ```

use barcoders::sym::code128::Code128;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma};
use thiserror::Error;
use tracing::debug;

/// Label edge length in pixels.
pub const LABEL_SIZE: u32 = 200;

/// Code 128 set selectors understood by `barcoders`: B is printable ASCII,
/// C packs two digits into one symbol.
const CODE_SET_B: char = 'Ɓ';
const CODE_SET_C: char = 'Ć';

const BAR: Luma<u8> = Luma([0]);
const SPACE: Luma<u8> = Luma([255]);

pub type BarcodeResult<T> = Result<T, BarcodeError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BarcodeError {
    #[error("cannot encode {key:?} as code 128: {reason}")]
    Encode { key: String, reason: String },

    #[error("barcode is {modules} modules wide, cannot fit in {width} pixels")]
    TooWide { modules: u32, width: u32 },

    #[error("png encoding failed: {0}")]
    Png(String),
}

/// Encode `key` into bar modules: `true` is a bar, `false` a space.
///
/// Digit runs go through code set C, everything else through set B.
pub fn encode(key: &str) -> BarcodeResult<Vec<bool>> {
    let symbol = Code128::new(with_code_sets(key)).map_err(|err| BarcodeError::Encode {
        key: key.to_string(),
        reason: err.to_string(),
    })?;
    Ok(symbol.encode().into_iter().map(|module| module == 1).collect())
}

/// Prefix `key` with set selectors.
///
/// Set C is entered when the next four characters are digits and kept while
/// the next two are; a trailing odd digit falls back to set B.
fn with_code_sets(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let digits_ahead =
        |at: usize, n: usize| chars.len() >= at + n && chars[at..at + n].iter().all(char::is_ascii_digit);

    let mut out = String::with_capacity(key.len() + 2);
    let mut current = None;
    let mut i = 0;
    while i < chars.len() {
        let use_c = if current == Some(CODE_SET_C) {
            digits_ahead(i, 2)
        } else {
            digits_ahead(i, 4)
        };
        let set = if use_c { CODE_SET_C } else { CODE_SET_B };
        if current != Some(set) {
            out.push(set);
            current = Some(set);
        }
        let step = if use_c { 2 } else { 1 };
        out.extend(&chars[i..i + step]);
        i += step;
    }
    if current.is_none() {
        out.push(CODE_SET_B);
    }
    out
}

/// Stretch modules to `width` x `height`.
///
/// Each module becomes `width / modules` pixels wide (integer factor) and
/// the result is centered horizontally with white margins.
pub fn rasterize(modules: &[bool], width: u32, height: u32) -> BarcodeResult<GrayImage> {
    let count = modules.len() as u32;
    let factor = if count == 0 { 0 } else { width / count };
    if factor == 0 {
        return Err(BarcodeError::TooWide {
            modules: count,
            width,
        });
    }
    let offset = (width - count * factor) / 2;

    Ok(GrayImage::from_fn(width, height, |x, _| {
        if x < offset {
            return SPACE;
        }
        match modules.get(((x - offset) / factor) as usize) {
            Some(true) => BAR,
            _ => SPACE,
        }
    }))
}

/// Full pipeline: encode, rasterize to [`LABEL_SIZE`] square, PNG-encode.
pub fn render_png(key: &str) -> BarcodeResult<Vec<u8>> {
    let modules = encode(key)?;
    let raster = rasterize(&modules, LABEL_SIZE, LABEL_SIZE)?;

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(
            raster.as_raw(),
            raster.width(),
            raster.height(),
            ExtendedColorType::L8,
        )
        .map_err(|err| BarcodeError::Png(err.to_string()))?;
    debug!(key, modules = modules.len(), bytes = png.len(), "barcode_rendered");
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(encode("ABC-123").unwrap(), encode("ABC-123").unwrap());
        assert_ne!(encode("ABC-123").unwrap(), encode("ABC-124").unwrap());
    }

    #[test]
    fn symbol_starts_with_bar_and_ends_with_stop_bar() {
        let modules = encode("42").unwrap();
        assert!(modules[0]);
        assert!(*modules.last().unwrap());
    }

    #[test]
    fn raster_is_centered_and_full_height() {
        let modules = vec![true, false, true];
        let img = rasterize(&modules, 10, 4).unwrap();

        assert_eq!(img.dimensions(), (10, 4));
        // factor 3, offset 0: bar on 0..3, space on 3..6, bar on 6..9, margin at 9
        assert_eq!(img.get_pixel(0, 0), &BAR);
        assert_eq!(img.get_pixel(4, 3), &SPACE);
        assert_eq!(img.get_pixel(8, 2), &BAR);
        assert_eq!(img.get_pixel(9, 1), &SPACE);
    }

    #[test]
    fn too_many_modules_for_width_is_rejected() {
        let modules = vec![true; 300];
        assert_eq!(
            rasterize(&modules, LABEL_SIZE, LABEL_SIZE).unwrap_err(),
            BarcodeError::TooWide {
                modules: 300,
                width: LABEL_SIZE
            }
        );
    }

    #[test]
    fn long_keys_do_not_fit_a_label() {
        let key = "X".repeat(40);
        assert!(matches!(
            render_png(&key),
            Err(BarcodeError::TooWide { .. })
        ));
    }

    #[test]
    fn digit_runs_switch_to_code_set_c() {
        assert_eq!(with_code_sets("123"), "Ɓ123");
        assert_eq!(with_code_sets("1234"), "Ć1234");
        assert_eq!(with_code_sets("12345"), "Ć1234Ɓ5");
        assert_eq!(with_code_sets("S-000123"), "ƁS-Ć000123");
        assert_eq!(with_code_sets("AB12CD"), "ƁAB12CD");
    }

    #[test]
    fn numeric_keys_pack_two_digits_per_symbol() {
        assert!(encode("1234").unwrap().len() < encode("ABCD").unwrap().len());
    }

    #[test]
    fn long_numeric_sample_ids_fit_a_label() {
        for key in ["1234567890123456", "12345678901234567890"] {
            let png = render_png(key).unwrap();
            assert_eq!(&png[1..4], b"PNG", "{key}");
        }
    }

    #[test]
    fn non_ascii_key_fails_to_encode() {
        assert!(matches!(encode("é"), Err(BarcodeError::Encode { .. })));
    }
}
