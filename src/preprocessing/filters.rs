use serde::{Deserialize, Deserializer};

/// Optional pixel adjustments applied to a crop before recognition
///
/// `contrast` and `brightness` are signed magnitudes in `-1.0..=1.0`. In JSON
/// they accept a number, `false` or `null`; anything but a non-zero number
/// disables the step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub greyscale: bool,
    #[serde(deserialize_with = "number_or_false")]
    pub contrast: Option<f32>,
    #[serde(deserialize_with = "number_or_false")]
    pub brightness: Option<f32>,
    pub normalize: bool,
}

impl FilterConfig {
    pub fn is_noop(&self) -> bool {
        !self.greyscale
            && self.contrast.is_none()
            && self.brightness.is_none()
            && !self.normalize
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrFlag {
    Number(f32),
    Flag(bool),
}

fn number_or_false<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrFlag>::deserialize(deserializer)?;
    match value {
        Some(NumberOrFlag::Number(n)) if n != 0.0 => Ok(Some(n)),
        Some(NumberOrFlag::Flag(true)) => Err(serde::de::Error::custom(
            "expected a number or false, got true",
        )),
        _ => Ok(None),
    }
}
