use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Number of features the fitted artifacts expect.
pub const FEATURE_COUNT: usize = 9;

/// Feature names in the exact order the scaler and model were fitted on.
/// Reordering silently corrupts predictions, so everything that builds a row
/// goes through [`FeatureVector::to_row`].
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Temperature",
    "RelativeHumidity",
    "WindSpeed",
    "Rain",
    "FFMC",
    "DMC",
    "ISI",
    "Classes",
    "Region",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "Bejaia")]
    Bejaia,
    #[serde(rename = "Sidi-Bel Abbes")]
    SidiBelAbbes,
}

impl Region {
    /// Encoding baked into the fitted artifacts.
    pub fn encoded(self) -> f64 {
        match self {
            Region::Bejaia => 0.0,
            Region::SidiBelAbbes => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Region::Bejaia => "Bejaia",
            Region::SidiBelAbbes => "Sidi-Bel Abbes",
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::Bejaia
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classes {
    #[serde(rename = "Not Fire")]
    NotFire,
    #[serde(rename = "Fire")]
    Fire,
}

impl Classes {
    pub fn encoded(self) -> f64 {
        match self {
            Classes::NotFire => 0.0,
            Classes::Fire => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Classes::NotFire => "Not Fire",
            Classes::Fire => "Fire",
        }
    }
}

impl Default for Classes {
    fn default() -> Self {
        Classes::NotFire
    }
}

/// One complete form submission. Built fresh per request, consumed once by
/// the prediction pipeline, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub temperature: i32,
    pub relative_humidity: i32,
    pub wind_speed: i32,
    pub rain: f64,
    pub ffmc: f64,
    pub dmc: f64,
    pub isi: f64,
    pub region: Region,
    pub classes: Classes,
}

impl FeatureVector {
    /// Assemble the row in the fitted feature order.
    pub fn to_row(&self) -> Array1<f64> {
        Array1::from(vec![
            f64::from(self.temperature),
            f64::from(self.relative_humidity),
            f64::from(self.wind_speed),
            self.rain,
            self.ffmc,
            self.dmc,
            self.isi,
            self.classes.encoded(),
            self.region.encoded(),
        ])
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            temperature: TEMPERATURE.default as i32,
            relative_humidity: RELATIVE_HUMIDITY.default as i32,
            wind_speed: WIND_SPEED.default as i32,
            rain: RAIN.default,
            ffmc: FFMC.default,
            dmc: DMC.default,
            isi: ISI.default,
            region: Region::default(),
            classes: Classes::default(),
        }
    }
}

/// Bounds and default for one numeric form control. The bounds are UI hints
/// only; the pipeline passes out-of-range values through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct NumericField {
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: Option<f64>,
    pub default: f64,
    pub step: f64,
}

pub const TEMPERATURE: NumericField = NumericField {
    name: "temperature",
    label: "Temperature (°C)",
    min: 22.0,
    max: Some(42.0),
    default: 32.0,
    step: 1.0,
};

pub const RELATIVE_HUMIDITY: NumericField = NumericField {
    name: "relative_humidity",
    label: "Relative Humidity (%)",
    min: 21.0,
    max: Some(90.0),
    default: 55.0,
    step: 1.0,
};

pub const WIND_SPEED: NumericField = NumericField {
    name: "wind_speed",
    label: "Wind Speed (km/h)",
    min: 6.0,
    max: Some(29.0),
    default: 15.0,
    step: 1.0,
};

pub const RAIN: NumericField = NumericField {
    name: "rain",
    label: "Rain (mm)",
    min: 0.0,
    max: None,
    default: 0.0,
    step: 0.1,
};

pub const FFMC: NumericField = NumericField {
    name: "ffmc",
    label: "FFMC (Fine Fuel Moisture Code)",
    min: 28.6,
    max: None,
    default: 80.5,
    step: 0.1,
};

pub const DMC: NumericField = NumericField {
    name: "dmc",
    label: "DMC (Duff Moisture Code)",
    min: 1.1,
    max: None,
    default: 15.0,
    step: 0.1,
};

pub const ISI: NumericField = NumericField {
    name: "isi",
    label: "ISI (Initial Spread Index)",
    min: 0.0,
    max: None,
    default: 7.0,
    step: 0.1,
};

/// Climatic inputs followed by FWI component inputs, in form order.
pub const NUMERIC_FIELDS: [NumericField; 7] = [
    TEMPERATURE,
    RELATIVE_HUMIDITY,
    WIND_SPEED,
    RAIN,
    FFMC,
    DMC,
    ISI,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorical_encoding() {
        assert_eq!(Region::Bejaia.encoded(), 0.0);
        assert_eq!(Region::SidiBelAbbes.encoded(), 1.0);
        assert_eq!(Classes::NotFire.encoded(), 0.0);
        assert_eq!(Classes::Fire.encoded(), 1.0);
    }

    #[test]
    fn test_categorical_labels_round_trip() {
        let region: Region = serde_json::from_str("\"Sidi-Bel Abbes\"").unwrap();
        assert_eq!(region, Region::SidiBelAbbes);
        let classes: Classes = serde_json::from_str("\"Not Fire\"").unwrap();
        assert_eq!(classes, Classes::NotFire);
        assert_eq!(serde_json::to_string(&Region::Bejaia).unwrap(), "\"Bejaia\"");
        assert_eq!(serde_json::to_string(&Classes::Fire).unwrap(), "\"Fire\"");
    }

    #[test]
    fn test_row_order_matches_fitted_schema() {
        let features = FeatureVector {
            temperature: 32,
            relative_humidity: 55,
            wind_speed: 15,
            rain: 0.0,
            ffmc: 80.5,
            dmc: 15.0,
            isi: 7.0,
            region: Region::Bejaia,
            classes: Classes::NotFire,
        };
        let row = features.to_row();
        assert_eq!(row.len(), FEATURE_COUNT);
        assert_eq!(
            row.to_vec(),
            vec![32.0, 55.0, 15.0, 0.0, 80.5, 15.0, 7.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_defaults_match_form_table() {
        let features = FeatureVector::default();
        assert_eq!(features.temperature, 32);
        assert_eq!(features.relative_humidity, 55);
        assert_eq!(features.wind_speed, 15);
        assert_eq!(features.rain, 0.0);
        assert_eq!(features.ffmc, 80.5);
        assert_eq!(features.dmc, 15.0);
        assert_eq!(features.isi, 7.0);
        assert_eq!(features.region, Region::Bejaia);
        assert_eq!(features.classes, Classes::NotFire);
    }
}
