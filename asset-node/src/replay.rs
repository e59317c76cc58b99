//! Event replay files
//!
//! JSON lines, one attribute event per line. `direction` defaults to
//! `northbound`; blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! {"entity_id":"room","attribute_name":"temperature","value":21.5,"timestamp":1000}
//! {"direction":"southbound","entity_id":"room","attribute_name":"setpoint","value":20,"timestamp":1200}
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;

use asset_model::AttributeEvent;
use asset_processing::Direction;

/// One line of a replay file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayEntry {
    #[serde(default = "northbound")]
    pub direction: Direction,
    #[serde(flatten)]
    pub event: AttributeEvent,
}

fn northbound() -> Direction {
    Direction::Northbound
}

/// Parse replay entries from a reader.
pub fn parse_events(reader: impl BufRead) -> anyhow::Result<Vec<ReplayEntry>> {
    let mut entries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let entry = serde_json::from_str(line)
            .with_context(|| format!("invalid event on line {}", index + 1))?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Load replay entries from a file.
pub fn load_events(path: &Path) -> anyhow::Result<Vec<ReplayEntry>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening event file {}", path.display()))?;
    parse_events(std::io::BufReader::new(file))
}
