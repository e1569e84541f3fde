use std::path::Path;

use anyhow::Result;

use super::{Ins, Snapshot};
use crate::nav::SessionLog;

/// Backend for running without hardware attached: `start` and `stop` are
/// no-ops, every navigation quantity stays at zero and no frames ever
/// arrive, so the presentation layer shows its no-data state.
#[derive(Debug, Default)]
pub struct StubIns {
    log: SessionLog,
}

impl Ins for StubIns {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            logging: self.log.is_logging(),
            ..Snapshot::default()
        }
    }

    fn start_logging(&mut self) {
        self.log.start_logging();
    }

    fn stop_logging(&mut self) {
        self.log.stop_logging();
    }

    fn is_logging(&self) -> bool {
        self.log.is_logging()
    }

    fn save_log(&self, path: &Path) -> Result<()> {
        Ok(self.log.save(path)?)
    }
}
