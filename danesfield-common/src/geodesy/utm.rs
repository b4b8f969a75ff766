//! UTM zone and hemisphere determination

use super::bbox::bounding_box;
use super::crs::Crs;
use crate::raster::Raster;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hemisphere of a UTM zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "S")]
    South,
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hemisphere::North => f.write_str("N"),
            Hemisphere::South => f.write_str("S"),
        }
    }
}

/// UTM zone in `[1, 60]` with its hemisphere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtmZone {
    pub zone: u8,
    pub hemisphere: Hemisphere,
}

impl UtmZone {
    /// EPSG code of the WGS84 UTM definition for this zone
    pub fn epsg(&self) -> u32 {
        match self.hemisphere {
            Hemisphere::North => 32600 + self.zone as u32,
            Hemisphere::South => 32700 + self.zone as u32,
        }
    }

    /// PROJ.4 definition of this zone on WGS84
    pub fn crs(&self) -> Crs {
        let south = match self.hemisphere {
            Hemisphere::North => "",
            Hemisphere::South => " +south",
        };
        Crs::from_proj4(format!(
            "+proj=utm +zone={}{} +datum=WGS84 +units=m +no_defs",
            self.zone, south
        ))
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.zone, self.hemisphere)
    }
}

/// Compute the UTM zone of a longitude/latitude point
///
/// Longitude is reduced to `[-180, 180)`; latitude is reduced by the
/// truncating remainder around 180 degrees. The hemisphere is north only for
/// strictly positive latitude. Zones exist for latitude in `[-80, 84]`, with
/// the Svalbard band (`[72, 84)`, longitude `[0, 42)`) and the south-west
/// Norway band (`[56, 64)`, longitude `[0, 12)`) overriding the regular
/// six-degree zoning.
pub fn utm_zone(longitude: f64, latitude: f64) -> Result<UtmZone> {
    let lon = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    let lat = (latitude + 90.0) % 180.0 - 90.0;

    let hemisphere = if lat > 0.0 {
        Hemisphere::North
    } else {
        Hemisphere::South
    };

    let mut zone: i32 = 0;
    if (-80.0..=84.0).contains(&lat) {
        if (72.0..84.0).contains(&lat) && (0.0..42.0).contains(&lon) {
            zone = if lon < 9.0 {
                31
            } else if lon < 21.0 {
                33
            } else if lon < 33.0 {
                35
            } else {
                37
            };
        } else if (56.0..64.0).contains(&lat) && (0.0..12.0).contains(&lon) {
            zone = if lon < 3.0 { 31 } else { 32 };
        } else {
            zone = ((lon.floor() + 180.0) / 6.0).floor() as i32 + 1;
        }
    }

    if !(1..=60).contains(&zone) {
        return Err(Error::InvalidUtm {
            longitude,
            latitude,
        });
    }

    Ok(UtmZone {
        zone: zone as u8,
        hemisphere,
    })
}

/// UTM zone at the center of a raster's geographic bounding box
pub fn utm_zone_for_raster<R>(raster: &R) -> Result<UtmZone>
where
    R: Raster + ?Sized,
{
    let bbox = bounding_box(raster, Some(&Crs::wgs84()))?;
    let (lon, lat) = bbox.center();
    utm_zone(lon, lat)
}
