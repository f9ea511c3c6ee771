//! Drone feed document decoding.
//!
//! The feed is an XML report: a `capture` element carrying a
//! `snapshotTimestamp` attribute (RFC 3339) and one `drone` child per
//! sighting with `serialNumber`, `positionX`, and `positionY` elements.
//! Every drone in one document shares the capture timestamp.

use chrono::DateTime;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::types::{DroneObservation, NestError, Point, Result};

#[derive(Clone, Copy)]
enum DroneField {
    Serial,
    PosX,
    PosY,
}

/// Decode a feed document into observations sharing one capture timestamp.
///
/// A well-formed document with no `drone` elements yields an empty vec.
/// Unknown elements (model, manufacturer, etc.) are skipped.
pub fn decode_feed(xml: &str) -> Result<Vec<DroneObservation>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut observations = Vec::new();
    let mut capture_ts: Option<i64> = None;
    let mut in_drone = false;
    let mut field: Option<DroneField> = None;
    let mut serial: Option<String> = None;
    let mut pos_x: Option<f64> = None;
    let mut pos_y: Option<f64> = None;

    loop {
        match reader.read_event() {
            Err(e) => return Err(NestError::FeedDecode(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"capture" => {
                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| NestError::FeedDecode(e.to_string()))?;
                        if attr.key.as_ref() == b"snapshotTimestamp" {
                            let raw = attr
                                .unescape_value()
                                .map_err(|e| NestError::FeedDecode(e.to_string()))?;
                            capture_ts = Some(parse_timestamp(&raw)?);
                        }
                    }
                }
                b"drone" => {
                    in_drone = true;
                    serial = None;
                    pos_x = None;
                    pos_y = None;
                }
                b"serialNumber" if in_drone => field = Some(DroneField::Serial),
                b"positionX" if in_drone => field = Some(DroneField::PosX),
                b"positionY" if in_drone => field = Some(DroneField::PosY),
                _ => field = None,
            },
            Ok(Event::Text(t)) => {
                if let Some(f) = field {
                    let text = t
                        .unescape()
                        .map_err(|e| NestError::FeedDecode(e.to_string()))?;
                    match f {
                        DroneField::Serial => serial = Some(text.into_owned()),
                        DroneField::PosX => pos_x = Some(parse_coordinate(&text)?),
                        DroneField::PosY => pos_y = Some(parse_coordinate(&text)?),
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"drone" {
                    in_drone = false;
                    let observed_at = capture_ts.ok_or_else(|| {
                        NestError::FeedDecode("drone element before capture timestamp".into())
                    })?;
                    let (Some(s), Some(x), Some(y)) = (serial.take(), pos_x.take(), pos_y.take())
                    else {
                        return Err(NestError::FeedDecode(
                            "drone element missing serialNumber or position".into(),
                        ));
                    };
                    observations.push(DroneObservation {
                        serial: s,
                        position: Point::new(x, y),
                        observed_at,
                    });
                }
                field = None;
            }
            _ => {}
        }
    }

    Ok(observations)
}

/// Parse an RFC 3339 capture timestamp into epoch milliseconds.
fn parse_timestamp(raw: &str) -> Result<i64> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| NestError::Timestamp(format!("{raw}: {e}")))
}

fn parse_coordinate(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| NestError::Coordinate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<report>
        <deviceInformation deviceId="GUARDB1RD">
            <deviceStarted>2023-01-09T10:00:00.000Z</deviceStarted>
        </deviceInformation>
        <capture snapshotTimestamp="2023-01-09T12:00:00.000Z">
            <drone>
                <serialNumber>SN-1</serialNumber>
                <model>Mosquito</model>
                <positionY>160000.0</positionY>
                <positionX>250000.0</positionX>
            </drone>
            <drone>
                <serialNumber>SN-2</serialNumber>
                <positionY>28303.8</positionY>
                <positionX>310926.1</positionX>
            </drone>
        </capture>
    </report>"#;

    #[test]
    fn test_decode_sample() {
        let obs = decode_feed(SAMPLE).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].serial, "SN-1");
        assert_eq!(obs[0].position.x, 250_000.0);
        assert_eq!(obs[0].position.y, 160_000.0);
        assert_eq!(obs[1].serial, "SN-2");
    }

    #[test]
    fn test_shared_capture_timestamp() {
        let obs = decode_feed(SAMPLE).unwrap();
        assert_eq!(obs[0].observed_at, obs[1].observed_at);
        // 2023-01-09T12:00:00Z
        assert_eq!(obs[0].observed_at, 1_673_265_600_000);
    }

    #[test]
    fn test_feed_order_preserved() {
        let obs = decode_feed(SAMPLE).unwrap();
        assert_eq!(obs[0].serial, "SN-1");
        assert_eq!(obs[1].serial, "SN-2");
    }

    #[test]
    fn test_empty_capture() {
        let xml = r#"<report><capture snapshotTimestamp="2023-01-09T12:00:00.000Z"></capture></report>"#;
        assert!(decode_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn test_no_capture_element() {
        let xml = "<report></report>";
        assert!(decode_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_document() {
        let err = decode_feed("<report><capture snapshot").unwrap_err();
        assert!(matches!(err, NestError::FeedDecode(_)));
    }

    #[test]
    fn test_bad_timestamp() {
        let xml = r#"<report><capture snapshotTimestamp="yesterday"></capture></report>"#;
        let err = decode_feed(xml).unwrap_err();
        assert!(matches!(err, NestError::Timestamp(_)));
    }

    #[test]
    fn test_drone_missing_position() {
        let xml = r#"<report><capture snapshotTimestamp="2023-01-09T12:00:00.000Z">
            <drone><serialNumber>SN-1</serialNumber></drone>
        </capture></report>"#;
        let err = decode_feed(xml).unwrap_err();
        assert!(matches!(err, NestError::FeedDecode(_)));
    }

    #[test]
    fn test_bad_coordinate() {
        let xml = r#"<report><capture snapshotTimestamp="2023-01-09T12:00:00.000Z">
            <drone><serialNumber>SN-1</serialNumber>
            <positionX>abc</positionX><positionY>1.0</positionY></drone>
        </capture></report>"#;
        let err = decode_feed(xml).unwrap_err();
        assert!(matches!(err, NestError::Coordinate(_)));
    }
}
