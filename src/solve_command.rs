use std::path::{Path, PathBuf};

use crate::coordinates::ImageCoordinates;
use crate::telescope_config::{OptionValue, TelescopeConfig};

/// Builds the full solve-field command line for one image: executable,
/// image path, then the serialized option set. Pure function; the caller
/// decides whether and how to run it.
pub fn build(image_path: &Path, coords: &ImageCoordinates,
             config: &TelescopeConfig, output_dir: &Path) -> Vec<String> {
    let mut options = config.default_options.clone();
    if let ImageCoordinates::Known{ra_deg, dec_deg, radius_deg} = coords {
        options.set("--ra", OptionValue::Scalar(format!("{:.3}", ra_deg)));
        options.set("--dec", OptionValue::Scalar(format!("{:.3}", dec_deg)));
        options.set("--radius", OptionValue::Scalar(format!("{:.3}", radius_deg)));
    }
    // Scratch files land beside the original image; the solved FITS goes
    // to the output folder under the image's own name.
    let scratch_dir = image_path.parent().unwrap_or(Path::new("."));
    options.set("--dir",
                OptionValue::Scalar(scratch_dir.to_string_lossy().into_owned()));
    let stem = image_path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    options.set("--out", OptionValue::Scalar(stem));
    options.set("--new-fits",
                OptionValue::Scalar(expected_output(image_path, output_dir)
                                    .to_string_lossy().into_owned()));

    let mut argv = vec![config.solver_executable.clone(),
                        image_path.to_string_lossy().into_owned()];
    argv.extend(options.to_argv());
    argv
}

/// Where the solved copy of `image_path` must appear for the solve to
/// count as successful.
pub fn expected_output(image_path: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(image_path.file_name().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use super::*;
    use crate::coordinates::ImageCoordinates;
    use crate::telescope_config::{OptionValue, TelescopeConfig};

    // Inverse of SolveOptionSet::to_argv(), for round-trip checks. Flags
    // start with "--"; a flag followed by a non-flag token is a scalar.
    fn parse_argv(argv: &[String]) -> HashMap<String, OptionValue> {
        let mut parsed = HashMap::new();
        let mut i = 0;
        while i < argv.len() {
            assert!(argv[i].starts_with("--"), "unexpected token {}", argv[i]);
            if i + 1 < argv.len() && !argv[i + 1].starts_with("--") {
                parsed.insert(argv[i].clone(),
                              OptionValue::Scalar(argv[i + 1].clone()));
                i += 2;
            } else {
                parsed.insert(argv[i].clone(), OptionValue::Flag);
                i += 1;
            }
        }
        parsed
    }

    fn known_coords() -> ImageCoordinates {
        // RA 10h, DEC +20d, per-profile 3 degree radius.
        ImageCoordinates::Known{ra_deg: 150.0, dec_deg: 20.0, radius_deg: 3.0}
    }

    #[test]
    fn test_command_shape() {
        let config = TelescopeConfig::suhora();
        let argv = build(Path::new("/data/run1/ngc7000.fits"), &known_coords(),
                         &config, Path::new("/data/run1/astrometry_output"));
        assert_eq!(argv[0], "solve-field");
        assert_eq!(argv[1], "/data/run1/ngc7000.fits");

        let parsed = parse_argv(&argv[2..]);
        assert_eq!(parsed["--ra"], OptionValue::Scalar("150.000".to_string()));
        assert_eq!(parsed["--dec"], OptionValue::Scalar("20.000".to_string()));
        assert_eq!(parsed["--radius"], OptionValue::Scalar("3.000".to_string()));
        assert_eq!(parsed["--scale-low"], OptionValue::Scalar("2.5".to_string()));
        assert_eq!(parsed["--scale-high"], OptionValue::Scalar("2.55".to_string()));
        assert_eq!(parsed["--scale-units"],
                   OptionValue::Scalar("arcsecperpix".to_string()));
        assert_eq!(parsed["--no-plots"], OptionValue::Flag);
        assert_eq!(parsed["--overwrite"], OptionValue::Flag);
        assert_eq!(parsed["--cpulimit"], OptionValue::Scalar("30".to_string()));
        assert_eq!(parsed["--dir"], OptionValue::Scalar("/data/run1".to_string()));
        assert_eq!(parsed["--out"], OptionValue::Scalar("ngc7000".to_string()));
        assert_eq!(parsed["--new-fits"], OptionValue::Scalar(
            "/data/run1/astrometry_output/ngc7000.fits".to_string()));
        // Absent placeholders: suhora leaves these unset.
        assert!(!parsed.contains_key("--downsample"));
        assert!(!parsed.contains_key("--no-background-subtraction"));
    }

    #[test]
    fn test_blind_solve_omits_coordinate_hints() {
        let config = TelescopeConfig::suhora();
        let argv = build(Path::new("/data/run1/blind.fits"),
                         &ImageCoordinates::Unknown,
                         &config, Path::new("/data/run1/astrometry_output"));
        let parsed = parse_argv(&argv[2..]);
        assert!(!parsed.contains_key("--ra"));
        assert!(!parsed.contains_key("--dec"));
        assert!(!parsed.contains_key("--radius"));
        // Scale bounds still constrain the blind search.
        assert!(parsed.contains_key("--scale-low"));
    }

    #[test]
    fn test_coordinate_formatting_three_decimals() {
        let config = TelescopeConfig::suhora();
        let coords = ImageCoordinates::Known{
            ra_deg: 150.123456, dec_deg: -5.5, radius_deg: 3.0};
        let argv = build(Path::new("im.fits"), &coords, &config,
                         Path::new("out"));
        let parsed = parse_argv(&argv[2..]);
        assert_eq!(parsed["--ra"], OptionValue::Scalar("150.123".to_string()));
        assert_eq!(parsed["--dec"], OptionValue::Scalar("-5.500".to_string()));
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = TelescopeConfig::suhora();
        let a = build(Path::new("/d/im.fits"), &known_coords(), &config,
                      Path::new("/d/out"));
        let b = build(Path::new("/d/im.fits"), &known_coords(), &config,
                      Path::new("/d/out"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_defaults_not_mutated_across_images() {
        let config = TelescopeConfig::suhora();
        let first = build(Path::new("/d/first.fits"), &known_coords(), &config,
                          Path::new("/d/out"));
        // A second image without coordinates must not inherit the first
        // image's --ra/--dec through the shared defaults.
        let second = build(Path::new("/d/second.fits"),
                           &ImageCoordinates::Unknown, &config,
                           Path::new("/d/out"));
        assert!(first.contains(&"--ra".to_string()));
        assert!(!second.contains(&"--ra".to_string()));
        assert_eq!(config.default_options.get("--ra"),
                   Some(&OptionValue::Absent));
    }
}
