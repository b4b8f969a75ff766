//! Coordinate offsets embedded as comments in model file headers
//!
//! Two header encodings are recognized:
//!
//! 1. Offsets on the first three lines, one axis per line:
//!    ```text
//!    # x offset: 747594.676221
//!    # y offset: 4407371.835686
//!    # z offset: 225.038274
//!    ```
//!    The first line that does not match its axis stops the scan; the
//!    remaining offsets stay 0.
//! 2. When line 1 is not an x offset, line 8 may carry a coordinate-system
//!    comment whose parameter list holds the offsets after the datum and zone:
//!    ```text
//!    # coordinate_system: {"parameters": ["wgs84", "UTM zone 16N", 747594.67, 4407371.83, 225.03, 0, 0, 0, 0, 0], "type": "EPSG"}
//!    ```
//!
//! Headers matching neither encoding yield a zero offset.

use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Line (1-based) that carries the coordinate-system comment
const COORDINATE_SYSTEM_LINE: usize = 8;

static AXIS_OFFSET_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    ["x", "y", "z"].map(|axis| {
        Regex::new(&format!(
            r"^#\s*{} offset: ([-+]?(\d+(\.\d*)?|\.\d+)([eE][-+]?\d+)?)",
            axis
        ))
        .expect("Invalid axis offset regex")
    })
});

static COORDINATE_SYSTEM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^# coordinate_system: \{.* \[[^,]*, [^,]*, ([^,]*), ([^,]*), ([^,]*), .*\].*\}")
        .expect("Invalid coordinate_system regex")
});

/// X/Y/Z translation applied to local model coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateOffset {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CoordinateOffset {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

/// Parse the offset from header lines (line terminators optional)
pub fn parse_offset<S: AsRef<str>>(header_lines: &[S]) -> CoordinateOffset {
    let mut values = [0.0_f64; 3];
    let mut first_line_matched = false;

    for (axis, pattern) in AXIS_OFFSET_PATTERNS.iter().enumerate() {
        let Some(line) = header_lines.get(axis) else {
            break;
        };
        let parsed = pattern
            .captures(line.as_ref())
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok());
        match parsed {
            Some(value) => {
                values[axis] = value;
                if axis == 0 {
                    first_line_matched = true;
                }
            }
            None => break,
        }
    }

    if !first_line_matched {
        if let Some(offset) = header_lines
            .get(COORDINATE_SYSTEM_LINE - 1)
            .and_then(|line| parse_coordinate_system(line.as_ref()))
        {
            return offset;
        }
    }

    CoordinateOffset::new(values[0], values[1], values[2])
}

fn parse_coordinate_system(line: &str) -> Option<CoordinateOffset> {
    let caps = COORDINATE_SYSTEM_PATTERN.captures(line)?;
    let field = |i: usize| -> Option<f64> {
        let raw = caps.get(i)?.as_str().trim();
        match raw.parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(field = raw, "Unparseable offset in coordinate_system header");
                None
            }
        }
    };
    Some(CoordinateOffset::new(field(1)?, field(2)?, field(3)?))
}

/// Read the offset embedded in the header of a text file
pub fn read_offset(path: &Path) -> Result<CoordinateOffset> {
    let reader = BufReader::new(File::open(path)?);
    let lines = reader
        .lines()
        .take(COORDINATE_SYSTEM_LINE)
        .collect::<std::io::Result<Vec<String>>>()?;
    Ok(parse_offset(&lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CS_LINE: &str = r#"# coordinate_system: {"parameters": ["wgs84", "UTM zone 16N", 747594.6762214857, 4407371.835685772, 225.03827424185408, 0, 0, 0, 0, 0], "type": "EPSG"}"#;

    #[test]
    fn test_three_offset_lines() {
        let header = [
            "# x offset: 747594.676221",
            "# y offset: 4407371.835686",
            "# z offset: 225.038274",
            "v 1 2 3",
        ];
        let offset = parse_offset(&header);
        assert_eq!(offset, CoordinateOffset::new(747594.676221, 4407371.835686, 225.038274));
    }

    #[test]
    fn test_compact_offset_lines_and_exponents() {
        let header = ["#x offset: 1.5e3", "#y offset: -.25", "#z offset: +7"];
        assert_eq!(parse_offset(&header), CoordinateOffset::new(1500.0, -0.25, 7.0));
    }

    #[test]
    fn test_scan_stops_at_first_mismatch() {
        let header = ["# x offset: 10.0", "# z offset: 30.0", "# y offset: 20.0"];
        assert_eq!(parse_offset(&header), CoordinateOffset::new(10.0, 0.0, 0.0));

        let header = ["# x offset: 10.0", "# y offset: 20.0", "v 0 0 0"];
        assert_eq!(parse_offset(&header), CoordinateOffset::new(10.0, 20.0, 0.0));
    }

    #[test]
    fn test_partial_offsets_do_not_fall_back() {
        let mut header = vec!["# x offset: 10.0", "garbage"];
        header.extend(["", "", "", "", ""]);
        header.push(CS_LINE);
        assert_eq!(parse_offset(&header), CoordinateOffset::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_coordinate_system_on_line_eight() {
        let header = [
            "# Generated by building reconstruction",
            "mtllib building_0.mtl",
            "",
            "",
            "",
            "",
            "",
            CS_LINE,
        ];
        let offset = parse_offset(&header);
        assert_eq!(
            offset,
            CoordinateOffset::new(747594.6762214857, 4407371.835685772, 225.03827424185408)
        );
    }

    #[test]
    fn test_coordinate_system_elsewhere_is_ignored() {
        let header = [CS_LINE, "", "", "", "", "", "", "v 0 0 0"];
        assert!(parse_offset(&header).is_zero());
    }

    #[test]
    fn test_no_offsets() {
        assert!(parse_offset(&["v 0 0 0", "v 1 1 1"]).is_zero());
        assert!(parse_offset::<&str>(&[]).is_zero());
    }

    #[test]
    fn test_read_offset_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# x offset: 1.0").unwrap();
        writeln!(file, "# y offset: 2.0").unwrap();
        writeln!(file, "# z offset: 3.0").unwrap();
        writeln!(file, "v 0 0 0").unwrap();
        file.flush().unwrap();

        let offset = read_offset(file.path()).unwrap();
        assert_eq!(offset.to_array(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_read_offset_missing_file() {
        assert!(read_offset(Path::new("/nonexistent/building_0.obj")).is_err());
    }
}
