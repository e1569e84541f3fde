use std::{
    io::{self, Write},
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use anyhow::Result;

use crate::ins::{Ins, Snapshot};

/// Terminal presentation loop: rewrites a single status line in place at
/// the configured refresh period until `stop` is set.
pub fn run(ins: &dyn Ins, refresh: Duration, stale_after: Duration, stop: &AtomicBool) -> Result<()> {
    let mut stdout = io::stdout();

    while !stop.load(Ordering::Relaxed) {
        let line = status_line(&ins.snapshot(), stale_after);
        write!(stdout, "\r\x1b[K{line}")?;
        stdout.flush()?;
        thread::sleep(refresh);
    }
    writeln!(stdout)?;

    Ok(())
}

fn status_line(snapshot: &Snapshot, stale_after: Duration) -> String {
    let stale = snapshot.age.is_none_or(|age| age > stale_after);
    if snapshot.frames == 0 || stale {
        return "no data available.".to_string();
    }

    let vel = snapshot.velocity;
    let pos = snapshot.position;
    let ang = snapshot.sensors.angular_rate;

    format!(
        "t:{:9.3}s  vel(x:{:+9.5} y:{:+9.5} z:{:+9.5})  pos(x:{:+9.5} y:{:+9.5} z:{:+9.5})  ang(x:{:+8.4} y:{:+8.4} z:{:+8.4}){}",
        snapshot.time,
        vel.x,
        vel.y,
        vel.z,
        pos.x,
        pos.y,
        pos.z,
        ang.x,
        ang.y,
        ang.z,
        if snapshot.logging { "  [logging]" } else { "" },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const STALE_AFTER: Duration = Duration::from_secs(1);

    #[test]
    fn test_no_frames_shows_no_data() {
        assert_eq!(
            status_line(&Snapshot::default(), STALE_AFTER),
            "no data available."
        );
    }

    #[test]
    fn test_stale_source_shows_no_data() {
        let snapshot = Snapshot {
            frames: 10,
            age: Some(Duration::from_secs(5)),
            ..Snapshot::default()
        };

        assert_eq!(status_line(&snapshot, STALE_AFTER), "no data available.");
    }

    #[test]
    fn test_fresh_snapshot_shows_state_and_logging_flag() {
        let snapshot = Snapshot {
            frames: 10,
            age: Some(Duration::from_millis(10)),
            logging: true,
            ..Snapshot::default()
        };

        let line = status_line(&snapshot, STALE_AFTER);
        assert!(line.contains("vel(x:"));
        assert!(line.contains("[logging]"));
    }
}
