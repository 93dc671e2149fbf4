use super::error::{ModelError, Result};
use super::header::{self, HeaderCard};
use fitsio::hdu::HduInfo;
use fitsio::images::{ImageDescription, ImageType};
use fitsio::FitsFile;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// A single 2-D plane of float pixels, row-major with a top-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl Plane {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != width * height {
            return Err(ModelError::SizeMismatch(format!(
                "{} pixels for a {width}x{height} plane",
                data.len()
            )));
        }
        Ok(Plane { width, height, data })
    }

    pub fn zeros(width: usize, height: usize) -> Self {
        Plane { width, height, data: vec![0.0; width * height] }
    }

    pub fn row(&self, y: usize) -> &[f32] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        &mut self.data[y * self.width..(y + 1) * self.width]
    }
}

/// How the planes of an image are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    Gray,
    /// Three colour planes; a fourth (alpha) plane is ignored.
    Rgb,
    /// Any other plane count: only the first band is displayed.
    Multispectral(usize),
}

/// Storage type used when writing a plane back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Float,
    Short,
}

/// Pixels and header cards from the first image HDU of a FITS file.
///
/// Data is planar: `planes` planes of `width * height` values, indexed as
/// `data[plane * width * height + row * width + col]`. FITS stores the first
/// row at the bottom of the image; rows are kept in file order here, so the
/// first row is drawn at the top.
#[derive(Debug, Clone)]
pub struct FitsImage {
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub planes: usize,
    pub data: Vec<f32>,
    pub headers: Vec<HeaderCard>,
    pub bitpix: i32,
}

impl FitsImage {
    pub fn load(path: &Path) -> Result<Self> {
        let mut fits = FitsFile::open(path)?;

        let hdu_count = fits.iter().count();
        let mut image_hdu = None;
        for i in 0..hdu_count {
            let hdu = fits.hdu(i)?;
            if let HduInfo::ImageInfo { ref shape, .. } = hdu.info {
                if !shape.is_empty() && shape.iter().product::<usize>() > 0 {
                    image_hdu = Some(i);
                    break;
                }
            }
        }
        let idx = image_hdu.ok_or_else(|| ModelError::NoImageData(path.to_path_buf()))?;

        let file = std::fs::File::open(path)?;
        let headers = header::read_headers(&mut BufReader::new(file), idx)?;

        let naxis = header::find_int(&headers, "NAXIS").unwrap_or(0);
        let axis = |n: usize| {
            header::find_int(&headers, &format!("NAXIS{n}"))
                .filter(|&v| v > 0)
                .map(|v| v as usize)
                .ok_or_else(|| ModelError::UnsupportedShape(format!("missing NAXIS{n}")))
        };
        let (width, height, planes) = match naxis {
            2 => (axis(1)?, axis(2)?, 1),
            3 => (axis(1)?, axis(2)?, axis(3)?),
            n => return Err(ModelError::UnsupportedShape(format!("NAXIS = {n}"))),
        };
        let bitpix = header::find_int(&headers, "BITPIX").unwrap_or(0) as i32;

        let hdu = fits.hdu(idx)?;
        let data: Vec<f32> = hdu.read_image(&mut fits)?;
        if data.len() != width * height * planes {
            return Err(ModelError::SizeMismatch(format!(
                "read {} pixels, header declares {width}x{height}x{planes}",
                data.len()
            )));
        }

        tracing::debug!(path = %path.display(), hdu = idx, width, height, planes, bitpix, "loaded FITS image");
        Ok(FitsImage {
            path: path.to_path_buf(),
            width,
            height,
            planes,
            data,
            headers,
            bitpix,
        })
    }

    pub fn layout(&self) -> ImageLayout {
        match self.planes {
            1 => ImageLayout::Gray,
            3 | 4 => ImageLayout::Rgb,
            n => ImageLayout::Multispectral(n),
        }
    }

    /// Copy out one plane (one tap of a multi-plane readout).
    pub fn plane(&self, index: usize) -> Result<Plane> {
        if index >= self.planes {
            return Err(ModelError::PlaneOutOfRange { index, planes: self.planes });
        }
        let npix = self.width * self.height;
        Ok(Plane {
            width: self.width,
            height: self.height,
            data: self.data[index * npix..(index + 1) * npix].to_vec(),
        })
    }

    pub fn plane_slice(&self, index: usize) -> &[f32] {
        let npix = self.width * self.height;
        let index = index.min(self.planes - 1);
        &self.data[index * npix..(index + 1) * npix]
    }

    pub fn header_text(&self) -> String {
        header::header_text(&self.headers)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Human-readable sample type, from `BITPIX`.
    pub fn data_type(&self) -> &'static str {
        match self.bitpix {
            8 => "uint8",
            16 => "int16",
            32 => "int32",
            64 => "int64",
            -32 => "float32",
            -64 => "float64",
            _ => "unknown",
        }
    }
}

/// Write `plane` as the primary HDU of a new FITS file, replacing any
/// existing file at `path`.
pub fn save_plane(path: &Path, plane: &Plane, kind: SampleKind) -> Result<()> {
    let description = ImageDescription {
        data_type: match kind {
            SampleKind::Float => ImageType::Float,
            SampleKind::Short => ImageType::Short,
        },
        dimensions: &[plane.height, plane.width],
    };
    let mut fits = FitsFile::create(path)
        .with_custom_primary(&description)
        .overwrite()
        .open()?;
    let hdu = fits.primary_hdu()?;
    match kind {
        SampleKind::Float => hdu.write_image(&mut fits, &plane.data)?,
        SampleKind::Short => {
            let shorts: Vec<i16> = plane
                .data
                .iter()
                .map(|&v| v.clamp(i16::MIN as f32, i16::MAX as f32) as i16)
                .collect();
            hdu.write_image(&mut fits, &shorts)?
        }
    }
    hdu.write_key(&mut fits, "CREATOR", String::from("fitsview"))?;
    tracing::info!(path = %path.display(), width = plane.width, height = plane.height, "wrote FITS plane");
    Ok(())
}
