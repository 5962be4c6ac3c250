use chrono::Utc;

/// Buffered log of a single job.
///
/// Lines are kept in memory and emitted as one record when the job ends, so
/// the output of concurrent jobs never interleaves.
#[derive(Debug, Default, Clone)]
pub struct JobLog {
    lines: Vec<String>,
}

impl JobLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, message: impl AsRef<str>) {
        let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        self.lines.push(format!("{} {}", stamp, message.as_ref()));
    }

    /// Record multi-line tool output, one entry per non-empty line.
    pub fn output(&mut self, output: &str) {
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            self.line(format!("| {}", line));
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}
