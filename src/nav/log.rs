use std::path::Path;

use hdf5_metno::File;
use strum::{AsRefStr, EnumIter, IntoEnumIterator};
use thiserror::Error;

use super::state::NavigationState;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot save the session log while logging is active")]
    SaveWhileLogging,

    #[error(transparent)]
    Hdf5(#[from] hdf5_metno::Error),
}

/// Dataset names of the saved container. The names and shapes are what the
/// offline-analysis tooling expects and must not change.
#[derive(Debug, Clone, Copy, AsRefStr, EnumIter)]
enum LogField {
    #[strum(serialize = "time")]
    Time,
    #[strum(serialize = "qtn")]
    Qtn,
    #[strum(serialize = "acl")]
    Acl,
    #[strum(serialize = "ang")]
    Ang,
    #[strum(serialize = "mag")]
    Mag,
    #[strum(serialize = "dv")]
    Dv,
    #[strum(serialize = "vel")]
    Vel,
    #[strum(serialize = "pos")]
    Pos,
}

/// Frame-indexed record of every quantity the engine derives, one entry per
/// frame processed while logging is active. Stopping retains the entries,
/// resuming appends to the same buffer, and `save` writes one dataset per
/// field with index `i` aligned across all of them.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    logging: bool,
    time: Vec<f64>,
    qtn: Vec<[f64; 4]>,
    acl: Vec<[f64; 3]>,
    ang: Vec<[f64; 3]>,
    mag: Vec<[f64; 3]>,
    dv: Vec<[f64; 3]>,
    vel: Vec<[f64; 3]>,
    pos: Vec<[f64; 3]>,
}

impl SessionLog {
    /// Begin or resume appending. Idempotent while already logging.
    pub fn start_logging(&mut self) {
        self.logging = true;
    }

    /// Stop appending, keeping the accumulated entries.
    pub fn stop_logging(&mut self) {
        self.logging = false;
    }

    pub fn is_logging(&self) -> bool {
        self.logging
    }

    /// Number of recorded frames.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Append a snapshot of the full navigation state. Does nothing while
    /// logging is stopped.
    pub(crate) fn record(&mut self, state: &NavigationState) {
        if !self.logging {
            return;
        }

        self.time.push(state.time);
        self.qtn.push(state.quaternion.into());
        self.acl.push(state.acceleration.into());
        self.ang.push(state.angular_rate.into());
        self.mag.push(state.magnetic.into());
        self.dv.push(state.delta_velocity.into());
        self.vel.push(state.velocity.into());
        self.pos.push(state.position.into());
    }

    /// Serialize every recorded field to `path` as named parallel datasets.
    /// Fails without touching anything if logging is still active, since
    /// the buffer is not a stable snapshot while entries may still arrive.
    pub fn save(&self, path: &Path) -> Result<(), LogError> {
        if self.logging {
            return Err(LogError::SaveWhileLogging);
        }

        let file = File::create(path)?;
        for field in LogField::iter() {
            let (data, width) = self.series(field);
            write_dataset(&file, field.as_ref(), &data, width)?;
        }

        Ok(())
    }

    /// Row-major data of one field plus its per-frame width.
    fn series(&self, field: LogField) -> (Vec<f64>, usize) {
        match field {
            LogField::Time => (self.time.clone(), 1),
            LogField::Qtn => (flatten4(&self.qtn), 4),
            LogField::Acl => (flatten3(&self.acl), 3),
            LogField::Ang => (flatten3(&self.ang), 3),
            LogField::Mag => (flatten3(&self.mag), 3),
            LogField::Dv => (flatten3(&self.dv), 3),
            LogField::Vel => (flatten3(&self.vel), 3),
            LogField::Pos => (flatten3(&self.pos), 3),
        }
    }
}

fn flatten3(rows: &[[f64; 3]]) -> Vec<f64> {
    rows.iter().flatten().copied().collect()
}

fn flatten4(rows: &[[f64; 4]]) -> Vec<f64> {
    rows.iter().flatten().copied().collect()
}

fn write_dataset(file: &File, name: &str, data: &[f64], width: usize) -> Result<(), LogError> {
    let rows = data.len() / width;

    let dataset = if width == 1 {
        file.new_dataset::<f64>().shape([rows]).create(name)?
    } else {
        file.new_dataset::<f64>().shape([rows, width]).create(name)?
    };
    dataset.write_raw(data)?;

    Ok(())
}
