mod common;

use anyhow::Result;
use common::Value;
use fitsview::model::header;
use fitsview::model::{
    render_image, save_plane, FitsImage, ImageLayout, ModelError, Plane, SampleKind, Stretch,
};
use tempfile::TempDir;

#[test]
fn loads_int16_image_with_headers() -> Result<()> {
    let dir = TempDir::new()?;
    let path = common::write_image(
        &dir.path().join("frame.fits"),
        16,
        &[3, 2],
        &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        &[("OBJECT", Value::Str("M42")), ("EXPTIME", Value::Int(30))],
    );

    let img = FitsImage::load(&path)?;
    assert_eq!((img.width, img.height, img.planes), (3, 2, 1));
    assert_eq!(img.data, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(img.layout(), ImageLayout::Gray);
    assert_eq!(img.data_type(), "int16");
    assert_eq!(img.file_name(), "frame.fits");
    assert_eq!(header::find(&img.headers, "OBJECT"), Some("M42"));
    assert_eq!(header::find_int(&img.headers, "EXPTIME"), Some(30));

    let text = img.header_text();
    assert!(text.starts_with("SIMPLE: T"));
    assert!(text.contains("OBJECT: M42"));
    assert!(!text.contains("END"));
    Ok(())
}

#[test]
fn three_float_planes_render_as_rgb() -> Result<()> {
    let dir = TempDir::new()?;
    let data: Vec<f64> = (0..12).map(|v| v as f64 * 0.5).collect();
    let path = common::write_image(&dir.path().join("rgb.fits"), -32, &[2, 2, 3], &data, &[]);

    let img = FitsImage::load(&path)?;
    assert_eq!(img.layout(), ImageLayout::Rgb);
    assert_eq!(img.data_type(), "float32");
    assert_eq!(img.plane(2)?.data, vec![4.0, 4.5, 5.0, 5.5]);
    assert!(matches!(img.plane(3), Err(ModelError::PlaneOutOfRange { index: 3, planes: 3 })));

    let display = render_image(&img, Stretch::Linear);
    assert_eq!((display.width, display.height, display.channels), (2, 2, 3));
    assert_eq!(&display.pixels[..3], &[0, 0, 0]);
    assert_eq!(&display.pixels[9..], &[255, 255, 255]);
    Ok(())
}

#[test]
fn header_only_file_has_no_image_data() -> Result<()> {
    let dir = TempDir::new()?;
    let path = common::write_image(&dir.path().join("empty.fits"), 8, &[], &[], &[]);
    assert!(matches!(FitsImage::load(&path), Err(ModelError::NoImageData(_))));
    Ok(())
}

#[test]
fn one_dimensional_data_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = common::write_image(&dir.path().join("line.fits"), 16, &[5], &[0.0; 5], &[]);
    assert!(matches!(FitsImage::load(&path), Err(ModelError::UnsupportedShape(_))));
    Ok(())
}

#[test]
fn image_in_extension_is_found() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("ext.fits");
    let mut bytes = common::hdu(("SIMPLE", Value::Logical(true)), 8, &[], &[], &[]);
    bytes.extend(common::hdu(
        ("XTENSION", Value::Str("IMAGE")),
        16,
        &[4, 1],
        &[("EXTNAME", Value::Str("SCI"))],
        &[7.0, 8.0, 9.0, 10.0],
    ));
    std::fs::write(&path, bytes)?;

    let img = FitsImage::load(&path)?;
    assert_eq!((img.width, img.height), (4, 1));
    assert_eq!(img.data, vec![7.0, 8.0, 9.0, 10.0]);
    assert_eq!(header::find(&img.headers, "EXTNAME"), Some("SCI"));
    assert_eq!(header::find(&img.headers, "XTENSION"), Some("IMAGE"));
    Ok(())
}

#[test]
fn saved_planes_load_back() -> Result<()> {
    let dir = TempDir::new()?;
    let plane = Plane::new(3, 2, vec![-1.5, 0.0, 2.25, 40000.0, -40000.0, 7.0])?;

    let float_path = dir.path().join("float.fits");
    save_plane(&float_path, &plane, SampleKind::Float)?;
    let img = FitsImage::load(&float_path)?;
    assert_eq!((img.width, img.height), (3, 2));
    assert_eq!(img.data, plane.data);
    assert_eq!(img.data_type(), "float32");
    assert_eq!(header::find(&img.headers, "CREATOR"), Some("fitsview"));

    let short_path = dir.path().join("short.fits");
    save_plane(&short_path, &plane, SampleKind::Short)?;
    let img = FitsImage::load(&short_path)?;
    assert_eq!(img.data_type(), "int16");
    assert_eq!(img.data, vec![-1.0, 0.0, 2.0, 32767.0, -32768.0, 7.0]);

    // overwrite in place
    save_plane(&short_path, &Plane::zeros(1, 1), SampleKind::Short)?;
    assert_eq!(FitsImage::load(&short_path)?.data, vec![0.0]);
    Ok(())
}

#[test]
fn display_png_is_written() -> Result<()> {
    let dir = TempDir::new()?;
    let path = common::write_rows(&dir.path().join("a.fits"), 4, 3, |x| x as f64);
    let display = render_image(&FitsImage::load(&path)?, Stretch::Auto);

    let png = dir.path().join("a.png");
    display.save_png(&png)?;
    let bytes = std::fs::read(&png)?;
    assert_eq!(&bytes[1..4], b"PNG");
    Ok(())
}
