use crate::error::SettingsError;
use crate::host::Settings;
use log::*;
use std::convert::TryFrom;

pub const FACELESS_SECTION: &str = "driver_faceless";
pub const SERIAL_NUMBER_KEY: &str = "serialNumber";
pub const MODEL_NUMBER_KEY: &str = "modelNumber";
pub const RENDER_WIDTH_KEY: &str = "renderWidth";
pub const RENDER_HEIGHT_KEY: &str = "renderHeight";
pub const DISPLAY_FREQUENCY_KEY: &str = "displayFrequency";

pub const STEAMVR_SECTION: &str = "steamvr";
pub const IPD_KEY: &str = "ipd";

/// Static description of the virtual headset, read once when the device is built.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfiguration {
    pub serial_number: String,
    pub model_number: String,
    pub render_width: u32,
    pub render_height: u32,
    pub display_frequency: f32,
    pub ipd: f32,
}

/// Unset or mistyped keys read as the type's zero value, as the host does.
fn or_default<T: Default>(value: Result<T, SettingsError>) -> T {
    value.unwrap_or_else(|error| {
        warn!("{}, using default", error);
        T::default()
    })
}

fn dimension(value: i32, key: &str) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| {
        warn!("{} is negative ({}), clamping to 0", key, value);
        0
    })
}

impl DeviceConfiguration {
    pub fn from_settings(settings: &dyn Settings) -> Self {
        debug!("Using settings values");
        let ipd = or_default(settings.get_float(STEAMVR_SECTION, IPD_KEY));
        let serial_number = or_default(settings.get_string(FACELESS_SECTION, SERIAL_NUMBER_KEY));
        let model_number = or_default(settings.get_string(FACELESS_SECTION, MODEL_NUMBER_KEY));
        let render_width = or_default(settings.get_int32(FACELESS_SECTION, RENDER_WIDTH_KEY));
        let render_height = or_default(settings.get_int32(FACELESS_SECTION, RENDER_HEIGHT_KEY));
        let display_frequency =
            or_default(settings.get_float(FACELESS_SECTION, DISPLAY_FREQUENCY_KEY));

        let config = Self {
            serial_number,
            model_number,
            render_width: dimension(render_width, RENDER_WIDTH_KEY),
            render_height: dimension(render_height, RENDER_HEIGHT_KEY),
            display_frequency,
            ipd,
        };
        info!("Serial Number: {}", config.serial_number);
        info!("Model Number: {}", config.model_number);
        info!(
            "Render Target: {} {}",
            config.render_width, config.render_height
        );
        info!("Display Frequency: {}", config.display_frequency);
        info!("IPD: {}", config.ipd);
        config
    }
}
