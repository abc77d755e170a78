//! Log capture for tests. Tests in this binary run in parallel, so
//! assertions must filter on a string unique to the asserting test.

use std::sync::{Mutex, Once, OnceLock};

use log::{Level, LevelFilter, Log, Metadata, Record};

struct CapturingLogger;

static LOGGER: CapturingLogger = CapturingLogger;
static INSTALL: Once = Once::new();
static RECORDS: OnceLock<Mutex<Vec<(Level, String)>>> = OnceLock::new();

fn records() -> &'static Mutex<Vec<(Level, String)>> {
    RECORDS.get_or_init(|| Mutex::new(Vec::new()))
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }
    fn log(&self, record: &Record) {
        records().lock().unwrap().push(
            (record.level(), format!("{}", record.args())));
    }
    fn flush(&self) {}
}

/// Installs the capturing logger. Idempotent; call from every test that
/// asserts on log output.
pub fn install() {
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER)
            .expect("no other logger should be installed in tests");
        log::set_max_level(LevelFilter::Info);
    });
}

/// Number of captured records at `level` whose message contains `needle`.
pub fn count_logged(level: Level, needle: &str) -> usize {
    records().lock().unwrap().iter()
        .filter(|(l, message)| *l == level && message.contains(needle))
        .count()
}
