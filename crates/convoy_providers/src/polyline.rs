//! Encoded Polyline Algorithm Format.
//! ref: https://developers.google.com/maps/documentation/utilities/polylinealgorithm

/// Encode a sequence of `(lat, lng)` pairs into a polyline string.
pub fn encode(points: &[(f64, f64)]) -> String {
    let mut result = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for &(lat, lng) in points {
        let lat_e5 = (lat * 1e5).round() as i64;
        let lng_e5 = (lng * 1e5).round() as i64;

        encode_value(lat_e5 - prev_lat, &mut result);
        encode_value(lng_e5 - prev_lng, &mut result);

        prev_lat = lat_e5;
        prev_lng = lng_e5;
    }

    result
}

fn encode_value(value: i64, out: &mut String) {
    let mut value = value << 1;
    if value < 0 {
        value = !value;
    }

    while value >= 0x20 {
        out.push(((0x20 | (value & 0x1f)) as u8 + 63) as char);
        value >>= 5;
    }
    out.push((value as u8 + 63) as char);
}
