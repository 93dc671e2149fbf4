/// Axis-aligned pixel rectangle, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Largest size with the aspect ratio of `size` that fits inside `max`.
pub fn fit_within(size: (f32, f32), max: (f32, f32)) -> (f32, f32) {
    let (w, h) = size;
    if w <= 0.0 || h <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (max.0 / w).min(max.1 / h).max(0.0);
    (w * scale, h * scale)
}

/// Map a pointer position inside a widget showing the whole image, scaled to
/// `widget_size`, to integer image coordinates clamped to the image.
pub fn widget_to_image(
    pos: (f32, f32),
    widget_size: (f32, f32),
    image_size: (usize, usize),
) -> Option<(usize, usize)> {
    let (iw, ih) = image_size;
    if iw == 0 || ih == 0 || widget_size.0 <= 0.0 || widget_size.1 <= 0.0 {
        return None;
    }
    let x = (pos.0 / widget_size.0 * iw as f32).floor().clamp(0.0, (iw - 1) as f32);
    let y = (pos.1 / widget_size.1 * ih as f32).floor().clamp(0.0, (ih - 1) as f32);
    Some((x as usize, y as usize))
}

/// `size` x `size` square centred on `center`, intersected with the image.
pub fn viewfinder_rect(
    center: (usize, usize),
    size: usize,
    image_width: usize,
    image_height: usize,
) -> Option<PixelRect> {
    let half = (size / 2) as i64;
    let x0 = (center.0 as i64 - half).max(0);
    let y0 = (center.1 as i64 - half).max(0);
    let x1 = (center.0 as i64 - half + size as i64).min(image_width as i64);
    let y1 = (center.1 as i64 - half + size as i64).min(image_height as i64);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(PixelRect {
        x: x0 as usize,
        y: y0 as usize,
        width: (x1 - x0) as usize,
        height: (y1 - y0) as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_preserves_aspect() {
        assert_eq!(fit_within((400.0, 200.0), (100.0, 100.0)), (100.0, 50.0));
        assert_eq!(fit_within((100.0, 200.0), (300.0, 300.0)), (150.0, 300.0));
        assert_eq!(fit_within((0.0, 10.0), (100.0, 100.0)), (0.0, 0.0));
    }

    #[test]
    fn pointer_maps_to_pixels() {
        assert_eq!(widget_to_image((50.0, 25.0), (100.0, 50.0), (1000, 500)), Some((500, 250)));
        assert_eq!(widget_to_image((100.0, 50.0), (100.0, 50.0), (1000, 500)), Some((999, 499)));
        assert_eq!(widget_to_image((-3.0, 0.0), (100.0, 50.0), (10, 5)), Some((0, 0)));
        assert_eq!(widget_to_image((1.0, 1.0), (0.0, 50.0), (10, 5)), None);
    }

    #[test]
    fn viewfinder_is_clipped_at_edges() {
        let r = viewfinder_rect((500, 500), 200, 1000, 1000).unwrap();
        assert_eq!(r, PixelRect { x: 400, y: 400, width: 200, height: 200 });
        let r = viewfinder_rect((10, 990), 200, 1000, 1000).unwrap();
        assert_eq!(r, PixelRect { x: 0, y: 890, width: 110, height: 110 });
        assert_eq!(viewfinder_rect((0, 0), 0, 10, 10), None);
    }
}
