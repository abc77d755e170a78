use canonical_error::{CanonicalError, not_found_error};

/// Value of a single solver command line option. `Absent` options are
/// omitted from the command line entirely, `Flag` options emit just the
/// flag token, and `Scalar` options emit the flag followed by the value.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    Absent,
    Flag,
    Scalar(String),
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Scalar(value.to_string())
    }
}
impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Scalar(format!("{}", value))
    }
}
impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Scalar(format!("{}", value))
    }
}

/// Insertion-ordered mapping from solver flag to `OptionValue`. Cloned per
/// image so a batch never observes one image's overrides from another.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolveOptionSet {
    entries: Vec<(String, OptionValue)>,
}

impl SolveOptionSet {
    pub fn new() -> Self {
        SolveOptionSet{entries: Vec::new()}
    }

    /// Replaces the value in place if `flag` is already present, keeping
    /// its original position; otherwise appends.
    pub fn set(&mut self, flag: &str, value: OptionValue) {
        match self.entries.iter_mut().find(|(f, _)| f == flag) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((flag.to_string(), value)),
        }
    }

    pub fn get(&self, flag: &str) -> Option<&OptionValue> {
        self.entries.iter().find(|(f, _)| f == flag).map(|(_, v)| v)
    }

    /// Serializes to argv tokens in insertion order.
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = Vec::new();
        for (flag, value) in &self.entries {
            match value {
                OptionValue::Absent => {},
                OptionValue::Flag => argv.push(flag.clone()),
                OptionValue::Scalar(v) => {
                    argv.push(flag.clone());
                    argv.push(v.clone());
                },
            }
        }
        argv
    }
}

/// Per-telescope solve parameters. All behavioral differences between
/// telescopes are expressed as data here; nothing else in the pipeline
/// branches on which telescope is in use.
#[derive(Clone, Debug)]
pub struct TelescopeConfig {
    // FITS header keys holding the approximate pointing coordinates.
    pub ra_key: String,
    pub dec_key: String,

    // Degrees. Search radius around the header coordinates.
    pub default_radius_deg: f64,

    // Arcsec/pixel bounds for the solver's scale search.
    pub pixel_scale_low: f64,
    pub pixel_scale_high: f64,
    pub scale_units: String,

    pub cpu_limit_sec: i32,

    pub solver_executable: String,
    pub output_folder_name: String,
    pub log_file_name: String,
    pub fits_glob_pattern: String,

    // Shared immutably; per-image overlays are cloned from this.
    pub default_options: SolveOptionSet,
}

impl TelescopeConfig {
    /// Looks up a registered telescope profile by name.
    pub fn resolve(name: &str) -> Result<TelescopeConfig, CanonicalError> {
        match name {
            "suhora" => Ok(Self::suhora()),
            "generic" => Ok(Self::generic()),
            _ => Err(not_found_error(format!(
                "No telescope profile {:?}; registered profiles: suhora, generic",
                name).as_str())),
        }
    }

    /// 60cm telescope at Mt. Suhora observatory.
    pub fn suhora() -> TelescopeConfig {
        Self::assemble(
            /*ra_key=*/"OBSRA", /*dec_key=*/"OBSDEC",
            /*default_radius_deg=*/3.0,
            /*pixel_scale_low=*/2.5, /*pixel_scale_high=*/2.55,
            /*cpu_limit_sec=*/30,
            /*downsample=*/OptionValue::Absent)
    }

    /// Wide-open fallback profile for imagery with unknown optics. The
    /// loose scale bounds make solves slower but rarely wrong.
    pub fn generic() -> TelescopeConfig {
        Self::assemble(
            /*ra_key=*/"RA", /*dec_key=*/"DEC",
            /*default_radius_deg=*/5.0,
            /*pixel_scale_low=*/0.1, /*pixel_scale_high=*/10.0,
            /*cpu_limit_sec=*/60,
            /*downsample=*/OptionValue::from(2))
    }

    fn assemble(ra_key: &str, dec_key: &str, default_radius_deg: f64,
                pixel_scale_low: f64, pixel_scale_high: f64,
                cpu_limit_sec: i32, downsample: OptionValue)
                -> TelescopeConfig {
        let scale_units = "arcsecperpix";
        let mut default_options = SolveOptionSet::new();
        // Coordinate placeholders; filled in per image when the header
        // yields usable coordinates.
        default_options.set("--ra", OptionValue::Absent);
        default_options.set("--dec", OptionValue::Absent);
        default_options.set("--radius", OptionValue::Absent);
        default_options.set("--scale-low", OptionValue::from(pixel_scale_low));
        default_options.set("--scale-high", OptionValue::from(pixel_scale_high));
        default_options.set("--scale-units", OptionValue::from(scale_units));
        default_options.set("--no-plots", OptionValue::Flag);
        default_options.set("--no-background-subtraction", OptionValue::Absent);
        default_options.set("--cpulimit", OptionValue::from(cpu_limit_sec));
        default_options.set("--overwrite", OptionValue::Flag);
        default_options.set("--downsample", downsample);
        TelescopeConfig{
            ra_key: ra_key.to_string(),
            dec_key: dec_key.to_string(),
            default_radius_deg,
            pixel_scale_low,
            pixel_scale_high,
            scale_units: scale_units.to_string(),
            cpu_limit_sec,
            solver_executable: "solve-field".to_string(),
            output_folder_name: "astrometry_output".to_string(),
            log_file_name: "solve.log".to_string(),
            fits_glob_pattern: "*.fits".to_string(),
            default_options,
        }
    }
}
