//! Write sweep output as CSV: `bias,level0..levelN`, one row per bias
//! value. Column `levelK` is engine level K, with level 0 the lowest
//! tier.

use std::path::Path;

use crate::sweep::{SweepError, SweepRow};

/// Header row for a sweep over `levels` tiers.
pub fn sweep_header(levels: usize) -> Vec<String> {
    let mut header = Vec::with_capacity(levels + 1);
    header.push("bias".to_string());
    header.extend((0..levels).map(|level| format!("level{level}")));
    header
}

/// Write rows to `path`. Every row must cover the same level count as the
/// first one.
pub fn write_sweep_csv(path: impl AsRef<Path>, rows: &[SweepRow]) -> Result<(), SweepError> {
    let levels = rows.first().map(|row| row.level_ratios.len()).unwrap_or(0);
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(sweep_header(levels))?;
    for row in rows {
        if row.level_ratios.len() != levels {
            return Err(SweepError::InconsistentRow {
                bias: row.bias,
                expected: levels,
                got: row.level_ratios.len(),
            });
        }
        let mut record = Vec::with_capacity(levels + 1);
        record.push(format!("{:.6}", row.bias));
        record.extend(row.level_ratios.iter().map(|ratio| format!("{ratio:.6}")));
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}
