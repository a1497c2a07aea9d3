//! Conversions between wire messages and domain types.

use crate::error::SatelliteError;
use crate::geometry::{Area, Location, Pixel};
use crate::proto;

impl From<proto::Location> for Location {
    fn from(loc: proto::Location) -> Self {
        Self::new(loc.x, loc.y)
    }
}

impl From<Location> for proto::Location {
    fn from(loc: Location) -> Self {
        Self { x: loc.x, y: loc.y }
    }
}

impl TryFrom<proto::Area> for Area {
    type Error = SatelliteError;

    fn try_from(area: proto::Area) -> Result<Self, Self::Error> {
        let ll = area
            .ll
            .ok_or_else(|| SatelliteError::malformed("area is missing its lower-left corner"))?;
        let ur = area
            .ur
            .ok_or_else(|| SatelliteError::malformed("area is missing its upper-right corner"))?;
        Ok(Self::new(ll.into(), ur.into()))
    }
}

impl From<Area> for proto::Area {
    fn from(area: Area) -> Self {
        Self {
            ll: Some(area.ll.into()),
            ur: Some(area.ur.into()),
        }
    }
}

impl From<Pixel> for proto::Image {
    fn from(pixel: Pixel) -> Self {
        Self {
            x: pixel.location.x,
            y: pixel.location.y,
            img: vec![pixel.value],
        }
    }
}

impl TryFrom<proto::Image> for Pixel {
    type Error = SatelliteError;

    fn try_from(image: proto::Image) -> Result<Self, Self::Error> {
        match image.img.as_slice() {
            [value] => Ok(Self::new(Location::new(image.x, image.y), *value)),
            other => Err(SatelliteError::malformed(format!(
                "image at ({};{}) carries {} bytes, expected 1",
                image.x,
                image.y,
                other.len()
            ))),
        }
    }
}
