use log::{debug, trace};

/// Observational progress counter for long loops. Only logs; never affects
/// the work it tracks.
pub struct ProgressRecorder {
    label: String,
    total: usize,
    done: usize,
}

impl ProgressRecorder {
    pub fn new(label: impl Into<String>, total: usize) -> Self {
        Self {
            label: label.into(),
            total,
            done: 0,
        }
    }

    pub fn tick(&mut self, item: &str) {
        self.done += 1;
        trace!("{} {}/{}: {}", self.label, self.done, self.total, item);
    }

    pub fn finish(&self) {
        debug!("{} finished {}/{}", self.label, self.done, self.total);
    }

    pub fn snapshot(&self) -> (usize, usize) {
        (self.done, self.total)
    }
}
