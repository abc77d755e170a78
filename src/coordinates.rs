use std::path::Path;

use astro::angle::{deg_frm_dms, deg_frm_hms};
use fitrs::{Fits, HeaderValue};
use log::warn;

use crate::telescope_config::TelescopeConfig;

/// Approximate pointing coordinates for one image. `Unknown` selects a
/// blind solve; later pipeline stages match on it rather than on errors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageCoordinates {
    Known {
        // Degrees.
        ra_deg: f64,
        dec_deg: f64,
        radius_deg: f64,
    },
    Unknown,
}

#[derive(Clone, Copy)]
enum CoordinateStyle {
    HourAngle,
    Degrees,
}

/// Reads the approximate coordinates from the image's FITS header using
/// the profile's configured keys. Any problem (unreadable file, missing
/// key, unparsable value) logs one warning and yields `Unknown`; a batch
/// never aborts because an image lacks pointing information.
pub fn extract(image_path: &Path, config: &TelescopeConfig) -> ImageCoordinates {
    match read_header_coordinates(image_path, config) {
        Some((ra_deg, dec_deg)) => ImageCoordinates::Known{
            ra_deg, dec_deg, radius_deg: config.default_radius_deg,
        },
        None => {
            warn!("No usable {}/{} coordinates in {:?}; will solve blind",
                  config.ra_key, config.dec_key, image_path);
            ImageCoordinates::Unknown
        },
    }
}

fn read_header_coordinates(image_path: &Path, config: &TelescopeConfig)
                           -> Option<(f64, f64)> {
    let fits = Fits::open(image_path).ok()?;
    let hdu = fits.get(0)?;
    let ra_deg = coordinate_degrees(hdu.value(&config.ra_key)?,
                                    CoordinateStyle::HourAngle)?;
    let dec_deg = coordinate_degrees(hdu.value(&config.dec_key)?,
                                     CoordinateStyle::Degrees)?;
    Some((ra_deg, dec_deg))
}

// Headers usually carry the coordinates as sexagesimal strings, but some
// acquisition software writes them numerically (RA in hours, DEC in
// degrees).
fn coordinate_degrees(value: &HeaderValue, style: CoordinateStyle)
                      -> Option<f64> {
    match value {
        HeaderValue::CharacterString(s) => parse_sexagesimal(s, style),
        HeaderValue::RealFloatingNumber(v) => Some(numeric_degrees(*v, style)),
        HeaderValue::IntegerNumber(v) => Some(numeric_degrees(*v as f64, style)),
        _ => None,
    }
}

fn numeric_degrees(value: f64, style: CoordinateStyle) -> f64 {
    match style {
        CoordinateStyle::HourAngle => value * 15.0,
        CoordinateStyle::Degrees => value,
    }
}

/// Parses "[+-]HH:MM:SS.S" (hour-angle) or "[+-]DD:MM:SS.S" (degrees)
/// into decimal degrees. The sign is handled here so "-00:30:00" keeps
/// its sign through the zero degrees field.
fn parse_sexagesimal(text: &str, style: CoordinateStyle) -> Option<f64> {
    let trimmed = text.trim();
    let (sign, magnitude) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let mut fields = magnitude.split(':');
    let whole: i64 = fields.next()?.trim().parse().ok()?;
    let minutes: i64 = fields.next()?.trim().parse().ok()?;
    let seconds: f64 = match fields.next() {
        Some(s) => s.trim().parse().ok()?,
        None => 0.0,
    };
    if fields.next().is_some() || whole < 0 || !(0..60).contains(&minutes) ||
        !(0.0..60.0).contains(&seconds) {
        return None;
    }
    let degrees = match style {
        CoordinateStyle::HourAngle => deg_frm_hms(whole, minutes, seconds),
        CoordinateStyle::Degrees => deg_frm_dms(whole, minutes, seconds),
    };
    Some(sign * degrees)
}
