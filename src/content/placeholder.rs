use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};

const MAX_CAPTION_WORDS: usize = 6;
const ELLIPSE_OPACITY: f32 = 0.4;
const GLYPH_SIZE: u32 = 8;
const TEXT_MARGIN: u32 = 8;
const LINE_SPACING: u32 = 4;
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Draws a deterministic stand-in image for `prompt`.
///
/// Two colors derived from an md5 digest of the prompt form a vertical gradient,
/// which is overlaid with a digest-seeded set of translucent ellipses and the
/// first few words of the prompt.
pub fn draw(prompt: &str, width: u32, height: u32) -> RgbImage {
    let digest = md5::compute(prompt.as_bytes());
    let top = Rgb([digest[0], digest[1], digest[2]]);
    let bottom = Rgb([digest[3], digest[4], digest[5]]);

    let mut image = RgbImage::from_fn(width, height, |_, y| gradient_color(top, bottom, y, height));

    let ellipse_count = 5 + u32::from(digest[6] % 10);
    for i in 0..ellipse_count {
        let seed = md5::compute(format!("{prompt}{i}"));
        let center_x = u32::from_le_bytes([seed[0], seed[1], seed[2], seed[3]]) % width;
        let center_y = u32::from_le_bytes([seed[4], seed[5], seed[6], seed[7]]) % height;
        let size = 20 + u32::from(seed[8]) % 40;
        let color = Rgb([
            shift_channel(top[0], i * 30),
            shift_channel(top[1], i * 40),
            shift_channel(top[2], i * 50),
        ]);
        blend_ellipse(&mut image, center_x, center_y, size / 2, color);
    }

    draw_caption(&mut image, prompt);
    image
}

/// Color of row `y` in a gradient that starts at `top` and approaches `bottom`.
fn gradient_color(top: Rgb<u8>, bottom: Rgb<u8>, y: u32, height: u32) -> Rgb<u8> {
    let ratio = y as f32 / height as f32;
    let channel = |i: usize| (f32::from(top[i]) * (1.0 - ratio) + f32::from(bottom[i]) * ratio) as u8;
    Rgb([channel(0), channel(1), channel(2)])
}

fn shift_channel(value: u8, offset: u32) -> u8 {
    ((u32::from(value) + offset) % 255) as u8
}

fn blend_ellipse(image: &mut RgbImage, center_x: u32, center_y: u32, radius: u32, color: Rgb<u8>) {
    let radius = i64::from(radius.max(1));
    let (center_x, center_y) = (i64::from(center_x), i64::from(center_y));
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));

    for y in (center_y - radius).max(0)..(center_y + radius + 1).min(height) {
        for x in (center_x - radius).max(0)..(center_x + radius + 1).min(width) {
            let (dx, dy) = (x - center_x, y - center_y);
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let pixel = image.get_pixel_mut(x as u32, y as u32);
            for channel in 0..3 {
                let blended = f32::from(pixel[channel]) * (1.0 - ELLIPSE_OPACITY)
                    + f32::from(color[channel]) * ELLIPSE_OPACITY;
                pixel[channel] = blended as u8;
            }
        }
    }
}

/// Writes the first words of `prompt` centered on the image in white with a black outline.
fn draw_caption(image: &mut RgbImage, prompt: &str) {
    let scale = (image.width().min(image.height()) / 256).max(1);
    let glyph_size = GLYPH_SIZE * scale;
    let line_height = glyph_size + LINE_SPACING * scale;

    let chars_per_line = (image.width().saturating_sub(2 * TEXT_MARGIN) / glyph_size) as usize;
    let max_lines = (image.height().saturating_sub(2 * TEXT_MARGIN) / line_height) as usize;
    let lines = wrap_caption(prompt, chars_per_line, max_lines);
    if lines.is_empty() {
        return;
    }

    let block_height = lines.len() as u32 * line_height - LINE_SPACING * scale;
    let top = (image.height() - block_height) / 2;
    for (row, line) in lines.iter().enumerate() {
        let line_width = line.chars().count() as u32 * glyph_size;
        let left = (image.width() - line_width) / 2;
        let y = top + row as u32 * line_height;

        // Outline first so the fill is drawn over it
        for (dx, dy) in [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)] {
            draw_text(image, line, i64::from(left) + dx, i64::from(y) + dy, scale, BLACK);
        }
        draw_text(image, line, i64::from(left), i64::from(y), scale, WHITE);
    }
}

/// Greedily wraps the first words of `prompt` into lines of at most `chars_per_line`
/// characters. Words that are too long on their own are truncated and lines
/// past `max_lines` are dropped.
fn wrap_caption(prompt: &str, chars_per_line: usize, max_lines: usize) -> Vec<String> {
    if chars_per_line == 0 {
        return Vec::new();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in prompt.split_whitespace().take(MAX_CAPTION_WORDS) {
        let word: String = word.chars().take(chars_per_line).collect();
        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word.chars().count() > chars_per_line {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.truncate(max_lines);
    lines
}

fn draw_text(image: &mut RgbImage, text: &str, left: i64, top: i64, scale: u32, color: Rgb<u8>) {
    let glyph_size = i64::from(GLYPH_SIZE * scale);
    for (index, character) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(character)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or_default();
        let glyph_left = left + index as i64 * glyph_size;
        for (row, bits) in glyph.iter().enumerate() {
            for column in 0..GLYPH_SIZE {
                if bits & (1 << column) == 0 {
                    continue;
                }
                let x = glyph_left + i64::from(column * scale);
                let y = top + row as i64 * i64::from(scale);
                fill_square(image, x, y, scale, color);
            }
        }
    }
}

fn fill_square(image: &mut RgbImage, left: i64, top: i64, size: u32, color: Rgb<u8>) {
    for y in top..top + i64::from(size) {
        for x in left..left + i64::from(size) {
            if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y))
                && x < image.width()
                && y < image.height()
            {
                image.put_pixel(x, y, color);
            }
        }
    }
}
