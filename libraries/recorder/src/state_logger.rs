//! CSV state logger for the estimator test harness.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use estimator::{EstimatorQuery, STATE_DIM};

use crate::format::format_g;
use crate::{RecorderError, RecorderResult};

/// Significant digits used for state columns
const STATE_SIG_DIGITS: usize = 3;

/// Open logging session. Created lazily on the first recorded epoch;
/// the header written at that point fixes the column count and the
/// presence of the status column for the lifetime of the file.
struct LogSession {
    writer: BufWriter<Box<dyn Write>>,
    /// Column count fixed by the header row
    columns: usize,
    /// Whether the header included the status column
    status_column: bool,
}

impl LogSession {
    fn write_line(&mut self, fields: &[String]) -> RecorderResult<()> {
        writeln!(self.writer, "{}", fields.join(","))?;
        // one row per epoch; no batching beyond the OS file buffer
        self.writer.flush()?;
        Ok(())
    }
}

/// Diagnostic state recorder.
///
/// Snapshots the estimator's state vector, covariance diagonal and
/// heading diagnostics once per simulated epoch and appends them as one
/// row of a comma-separated table. The estimator handle is shared with
/// the owning harness, which keeps mutating the filter between epochs;
/// the logger only ever reads through it.
///
/// Configuration (destination path, enabled field groups, status label)
/// must be complete before the first call to [`record_epoch`]; changing
/// it afterwards is unsupported and would break the fixed column layout.
///
/// [`record_epoch`]: StateLogger::record_epoch
pub struct StateLogger<E: EstimatorQuery> {
    estimator: Rc<RefCell<E>>,
    file_path: PathBuf,
    state_logging_enabled: bool,
    variance_logging_enabled: bool,
    status_label: String,
    /// Sink injected in place of the file, taken on first record
    sink: Option<Box<dyn Write>>,
    session: Option<LogSession>,
}

impl<E: EstimatorQuery> StateLogger<E> {
    /// Create a logger recording from the given estimator handle.
    ///
    /// State and variance logging default to enabled; the status column
    /// label defaults to `"gps_flag"`.
    pub fn new(estimator: Rc<RefCell<E>>) -> Self {
        Self {
            estimator,
            file_path: PathBuf::new(),
            state_logging_enabled: true,
            variance_logging_enabled: true,
            status_label: "gps_flag".to_string(),
            sink: None,
            session: None,
        }
    }

    /// Create a logger writing to an injected sink instead of a file.
    ///
    /// Used by tests to capture output and to exercise the fatal write
    /// path without touching the filesystem.
    pub fn with_sink(estimator: Rc<RefCell<E>>, sink: Box<dyn Write>) -> Self {
        let mut logger = Self::new(estimator);
        logger.sink = Some(sink);
        logger
    }

    /// Set the destination path. The file is opened (truncating any
    /// existing content) on the first recorded epoch, not here.
    pub fn set_file_path(&mut self, path: impl AsRef<Path>) {
        self.file_path = path.as_ref().to_path_buf();
    }

    /// Enable or disable the 24 state columns. Must not be changed after
    /// the first recorded epoch.
    pub fn set_state_logging(&mut self, enabled: bool) {
        self.state_logging_enabled = enabled;
    }

    /// Enable or disable the 24 variance columns. Must not be changed
    /// after the first recorded epoch.
    pub fn set_variance_logging(&mut self, enabled: bool) {
        self.variance_logging_enabled = enabled;
    }

    /// Set the header label of the optional status column. The semantics
    /// of the flag (fix quality, satellite count, ...) are the caller's
    /// choice; the label just has to stay consistent within one file.
    pub fn set_status_label(&mut self, label: impl Into<String>) {
        self.status_label = label.into();
    }

    /// Whether the first epoch has been recorded and the destination is
    /// open.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Record one epoch.
    ///
    /// A negative `status_flag` is the sentinel for "no status column".
    /// The first call opens the destination, writes the header and fixes
    /// the column layout: the status column exists iff this first call
    /// passed a non-negative flag. Once the column exists, later sentinel
    /// values are still written literally so the column count never
    /// changes.
    ///
    /// Any I/O failure is fatal for the run; the caller is expected to
    /// report it and terminate (see [`RecorderError::is_fatal`]).
    pub fn record_epoch(&mut self, status_flag: i32) -> RecorderResult<()> {
        let status_column = match &self.session {
            Some(session) => session.status_column,
            None => status_flag >= 0,
        };

        let row = self.row_fields(status_flag, status_column);

        if self.session.is_none() {
            let header = self.header_fields(status_column);
            let mut session = LogSession {
                writer: BufWriter::new(self.open_sink()?),
                columns: header.len(),
                status_column,
            };
            session.write_line(&header)?;
            self.session = Some(session);
        }

        if let Some(session) = self.session.as_mut() {
            debug_assert_eq!(row.len(), session.columns);
            session.write_line(&row)?;
        }

        Ok(())
    }

    /// Render the estimator's current tuning-parameter set as a
    /// multi-line `name=value` report, one parameter per line in
    /// canonical category order. No file I/O.
    pub fn dump_parameters(&self) -> String {
        let snapshot = self.estimator.borrow().parameter_snapshot();
        let mut report = String::new();
        for (name, value) in snapshot {
            let _ = writeln!(report, "{}={}", name, value);
        }
        report
    }

    fn open_sink(&mut self) -> RecorderResult<Box<dyn Write>> {
        if let Some(sink) = self.sink.take() {
            return Ok(sink);
        }
        let file = File::create(&self.file_path).map_err(|source| RecorderError::Open {
            path: self.file_path.clone(),
            source,
        })?;
        Ok(Box::new(file))
    }

    fn header_fields(&self, status_column: bool) -> Vec<String> {
        let mut fields = vec!["Timestamp".to_string()];
        if self.state_logging_enabled {
            for i in 0..STATE_DIM {
                fields.push(format!("state[{}]", i));
            }
        }
        if self.variance_logging_enabled {
            for i in 0..STATE_DIM {
                fields.push(format!("variance[{}]", i));
            }
        }
        if status_column {
            fields.push(self.status_label.clone());
        }
        fields.push("estHeading".to_string());
        fields.push("predictedMagHeading".to_string());
        fields
    }

    fn row_fields(&self, status_flag: i32, status_column: bool) -> Vec<String> {
        let estimator = self.estimator.borrow();

        let mut fields = vec![estimator.delayed_imu_timestamp_us().to_string()];
        if self.state_logging_enabled {
            let state = estimator.state_at_fusion_horizon();
            for i in 0..STATE_DIM {
                fields.push(format_g(state[i], STATE_SIG_DIGITS));
            }
        }
        if self.variance_logging_enabled {
            let variance = estimator.covariance_diagonal();
            for i in 0..STATE_DIM {
                fields.push(variance[i].to_string());
            }
        }
        if status_column {
            // sentinel values print literally once the column exists
            fields.push(status_flag.to_string());
        }
        fields.push(estimator.estimated_heading().to_string());
        fields.push(estimator.predicted_mag_heading().to_string());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estimator::{ParameterSnapshot, StateVector, TuningParams};
    use std::io::{self, ErrorKind};

    struct StubEstimator {
        time_us: u64,
        state: StateVector,
        variance: StateVector,
        heading: f32,
        mag_heading: f32,
        params: TuningParams,
    }

    impl StubEstimator {
        fn new() -> Self {
            let mut state = StateVector::zeros();
            state[0] = 1.0;
            let mut variance = StateVector::zeros();
            for i in 0..STATE_DIM {
                variance[i] = 0.25;
            }
            Self {
                time_us: 123_456,
                state,
                variance,
                heading: 0.5,
                mag_heading: 0.75,
                params: TuningParams::default(),
            }
        }
    }

    impl EstimatorQuery for StubEstimator {
        fn delayed_imu_timestamp_us(&self) -> u64 {
            self.time_us
        }
        fn state_at_fusion_horizon(&self) -> StateVector {
            self.state
        }
        fn covariance_diagonal(&self) -> StateVector {
            self.variance
        }
        fn estimated_heading(&self) -> f32 {
            self.heading
        }
        fn predicted_mag_heading(&self) -> f32 {
            self.mag_heading
        }
        fn parameter_snapshot(&self) -> ParameterSnapshot {
            self.params.snapshot()
        }
    }

    /// In-memory sink that stays readable after being boxed into the
    /// logger.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).expect("utf8 output")
        }
    }

    /// Sink whose writes always fail, for the fatal path.
    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logger_with_buf(estimator: StubEstimator) -> (StateLogger<StubEstimator>, SharedBuf) {
        let buf = SharedBuf::default();
        let logger = StateLogger::with_sink(
            Rc::new(RefCell::new(estimator)),
            Box::new(buf.clone()),
        );
        (logger, buf)
    }

    #[test]
    fn test_header_written_once_with_stable_column_count() {
        let (mut logger, buf) = logger_with_buf(StubEstimator::new());

        for _ in 0..3 {
            logger.record_epoch(1).expect("record epoch");
        }

        let output = buf.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4, "one header plus three rows");
        assert!(lines[0].starts_with("Timestamp,"));
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("Timestamp")).count(),
            1,
            "header must be written exactly once"
        );

        // 1 timestamp + 24 state + 24 variance + 1 status + 2 headings
        let header_columns = lines[0].split(',').count();
        assert_eq!(header_columns, 1 + 24 + 24 + 1 + 2);
        for row in &lines[1..] {
            assert_eq!(row.split(',').count(), header_columns);
        }
    }

    #[test]
    fn test_state_only_scenario_with_literal_sentinel() {
        let (mut logger, buf) = logger_with_buf(StubEstimator::new());
        logger.set_variance_logging(false);

        logger.record_epoch(5).expect("record epoch");
        logger.record_epoch(-1).expect("record epoch");

        let output = buf.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);

        let mut expected_header = vec!["Timestamp".to_string()];
        for i in 0..24 {
            expected_header.push(format!("state[{}]", i));
        }
        expected_header.push("gps_flag".to_string());
        expected_header.push("estHeading".to_string());
        expected_header.push("predictedMagHeading".to_string());
        assert_eq!(lines[0], expected_header.join(","));

        let row1: Vec<&str> = lines[1].split(',').collect();
        let row2: Vec<&str> = lines[2].split(',').collect();
        assert_eq!(row1[25], "5");
        // the column exists, so the sentinel is emitted literally
        assert_eq!(row2[25], "-1");
    }

    #[test]
    fn test_sentinel_on_first_call_suppresses_column_permanently() {
        let (mut logger, buf) = logger_with_buf(StubEstimator::new());

        logger.record_epoch(-1).expect("record epoch");
        // a real flag on a later call must not grow the table
        logger.record_epoch(7).expect("record epoch");

        let output = buf.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert!(!lines[0].contains("gps_flag"));

        let columns = 1 + 24 + 24 + 2;
        for line in &lines {
            assert_eq!(line.split(',').count(), columns);
        }
    }

    #[test]
    fn test_precision_contract() {
        let mut estimator = StubEstimator::new();
        estimator.state[0] = 1234.5;
        estimator.state[1] = 0.00012345;
        estimator.variance[0] = 0.123456789;
        let (mut logger, buf) = logger_with_buf(estimator);

        logger.record_epoch(-1).expect("record epoch");

        let output = buf.contents();
        let row: Vec<&str> = output.lines().nth(1).expect("data row").split(',').collect();

        // timestamp is an exact integer
        assert_eq!(row[0], "123456");
        // state values carry 3 significant digits
        assert_eq!(row[1], "1.23e+03");
        assert_eq!(row[2], "0.000123");
        // variance values use default precision
        assert_eq!(row[25], "0.12345679");
        // headings use default precision
        assert_eq!(row[49], "0.5");
        assert_eq!(row[50], "0.75");
    }

    #[test]
    fn test_unwritable_destination_is_fatal() {
        let mut logger = StateLogger::new(Rc::new(RefCell::new(StubEstimator::new())));
        logger.set_file_path("/nonexistent-dir-for-recorder-test/out.csv");

        let err = logger.record_epoch(0).expect_err("open must fail");
        assert!(matches!(err, RecorderError::Open { .. }));
        assert!(err.is_fatal());
        assert!(!logger.is_open(), "no partial header after a failed open");
    }

    #[test]
    fn test_failing_sink_surfaces_write_error() {
        let mut logger = StateLogger::with_sink(
            Rc::new(RefCell::new(StubEstimator::new())),
            Box::new(FailingSink),
        );

        let err = logger.record_epoch(0).expect_err("write must fail");
        assert!(matches!(err, RecorderError::Write(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_dump_parameters_report() {
        let logger = StateLogger::new(Rc::new(RefCell::new(StubEstimator::new())));

        let report = logger.dump_parameters();
        let lines: Vec<&str> = report.lines().collect();

        let snapshot_len = TuningParams::default().snapshot().len();
        assert_eq!(lines.len(), snapshot_len, "one line per parameter");

        assert_eq!(lines[0], "gyro_noise=0.015");
        assert!(lines.contains(&"mag_fusion_type=0"));
        assert!(lines.contains(&"synthesize_mag_z=false"));
        assert!(lines.contains(&"imu_pos_body=[0, 0, 0]"));

        // category order: input noise before magnetometer fusion before
        // GPS quality checks
        let pos = |needle: &str| {
            lines
                .iter()
                .position(|l| l.starts_with(needle))
                .unwrap_or_else(|| panic!("missing line {}", needle))
        };
        assert!(pos("gyro_noise=") < pos("mag_heading_noise="));
        assert!(pos("mag_heading_noise=") < pos("gps_check_mask="));
        assert!(pos("gps_check_mask=") < pos("ekfgsf_reset_delay_us="));
    }
}
