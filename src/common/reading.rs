// src/common/reading.rs

/// Fixed-point values exactly as the sensor reports them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct RawReading {
    /// 0.01 °C
    pub temperature: i16,
    /// 0.01 %RH
    pub humidity: u16,
    /// lx
    pub illuminance: u16,
    /// 0.001 hPa
    pub pressure: u32,
    /// 0.01 dB
    pub noise: u16,
    /// ppb
    pub etvoc: u16,
    /// ppm
    pub eco2: u16,
    /// 0.01
    pub discomfort: u16,
    /// 0.01 °C
    pub heat_stroke: i16,
}

/// One decoded measurement in engineering units.
///
/// Two readings are equal only if every field is exactly equal; the
/// staleness detector relies on that.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Reading {
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
    pub illuminance_lux: u16,
    pub pressure_hpa: f64,
    pub noise_db: f64,
    pub etvoc_ppb: u16,
    pub eco2_ppm: u16,
    pub discomfort_index: f64,
    pub heat_stroke_celsius: f64,
}

/// Scales a fixed-point integer by `10^-decimals`.
///
/// Dividing by the exact power of ten yields the `f64` nearest to the decimal
/// value, i.e. the value already rounded to `decimals` places.
#[inline]
fn scale(raw: i64, decimals: i32) -> f64 {
    raw as f64 / 10f64.powi(decimals)
}

impl From<RawReading> for Reading {
    fn from(raw: RawReading) -> Self {
        Reading {
            temperature_celsius: scale(raw.temperature.into(), 2),
            humidity_percent: scale(raw.humidity.into(), 2),
            illuminance_lux: raw.illuminance,
            pressure_hpa: scale(raw.pressure.into(), 3),
            noise_db: scale(raw.noise.into(), 2),
            etvoc_ppb: raw.etvoc,
            eco2_ppm: raw.eco2,
            discomfort_index: scale(raw.discomfort.into(), 2),
            heat_stroke_celsius: scale(raw.heat_stroke.into(), 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_matches_resolution() {
        let raw = RawReading {
            temperature: -1234,
            humidity: 4567,
            illuminance: 321,
            pressure: 1_013_250,
            noise: 4012,
            etvoc: 55,
            eco2: 612,
            discomfort: 7001,
            heat_stroke: 2199,
        };
        let reading = Reading::from(raw);

        assert_eq!(reading.temperature_celsius, -12.34);
        assert_eq!(reading.humidity_percent, 45.67);
        assert_eq!(reading.illuminance_lux, 321);
        assert_eq!(reading.pressure_hpa, 1013.25);
        assert_eq!(reading.noise_db, 40.12);
        assert_eq!(reading.etvoc_ppb, 55);
        assert_eq!(reading.eco2_ppm, 612);
        assert_eq!(reading.discomfort_index, 70.01);
        assert_eq!(reading.heat_stroke_celsius, 21.99);
    }

    #[test]
    fn test_pressure_keeps_full_u32_range() {
        let raw = RawReading {
            pressure: u32::MAX,
            ..RawReading::default()
        };
        assert_eq!(Reading::from(raw).pressure_hpa, 4_294_967.295);
    }

    #[test]
    fn test_equality_is_field_exact() {
        let a = Reading::from(RawReading {
            temperature: 2200,
            ..RawReading::default()
        });
        let b = Reading::from(RawReading {
            temperature: 2200,
            ..RawReading::default()
        });
        let c = Reading::from(RawReading {
            temperature: 2201,
            ..RawReading::default()
        });
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
