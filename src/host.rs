//! Interfaces the host runtime exposes to the driver.
//!
//! All calls arrive on the host's single driver thread, so implementations take
//! `&self` and keep their own interior mutability.

use crate::device::TrackedDeviceServerDriver;
use crate::error::{PropertyError, SettingsError};
use crate::openvr_types::{
    DeviceProperty, DriverPose, PropertyContainerHandle, TrackedDeviceClass, TrackedDeviceIndex,
    TrackedDevicePose, VrEvent,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

pub trait Settings {
    fn get_string(&self, section: &str, key: &str) -> Result<String, SettingsError>;
    fn get_int32(&self, section: &str, key: &str) -> Result<i32, SettingsError>;
    fn get_float(&self, section: &str, key: &str) -> Result<f32, SettingsError>;
}

pub trait Properties {
    fn tracked_device_to_property_container(
        &self,
        index: TrackedDeviceIndex,
    ) -> PropertyContainerHandle;

    fn get_int32_property(
        &self,
        container: PropertyContainerHandle,
        property: DeviceProperty,
    ) -> Result<i32, PropertyError>;

    fn set_string_property(
        &self,
        container: PropertyContainerHandle,
        property: DeviceProperty,
        value: &str,
    ) -> Result<(), PropertyError>;

    fn set_float_property(
        &self,
        container: PropertyContainerHandle,
        property: DeviceProperty,
        value: f32,
    ) -> Result<(), PropertyError>;

    fn set_uint64_property(
        &self,
        container: PropertyContainerHandle,
        property: DeviceProperty,
        value: u64,
    ) -> Result<(), PropertyError>;

    fn set_bool_property(
        &self,
        container: PropertyContainerHandle,
        property: DeviceProperty,
        value: bool,
    ) -> Result<(), PropertyError>;
}

/// Non-owning reference the host keeps to a registered device. The provider owns it.
pub type DeviceHandle = Weak<RefCell<dyn TrackedDeviceServerDriver>>;

pub trait ServerDriverHost {
    /// Registers a device. The host activates it later with the index it assigns.
    fn tracked_device_added(
        &self,
        serial_number: &str,
        class: TrackedDeviceClass,
        device: DeviceHandle,
    ) -> bool;

    fn tracked_device_pose_updated(&self, index: TrackedDeviceIndex, pose: &DriverPose);

    /// Fills `poses` with the latest raw pose of every slot, up to its length.
    fn get_raw_tracked_device_poses(
        &self,
        predicted_seconds_from_now: f32,
        poses: &mut [TrackedDevicePose],
    );

    fn poll_next_event(&self) -> Option<VrEvent>;
}

/// Host log sink. Shared with the global logger, hence `Send + Sync`.
pub trait DriverLog: Send + Sync {
    fn log(&self, message: &str);
}

/// Host accessors handed to the provider on init.
#[derive(Clone)]
pub struct DriverContext {
    pub settings: Rc<dyn Settings>,
    pub properties: Rc<dyn Properties>,
    pub server_host: Rc<dyn ServerDriverHost>,
    pub log: Arc<dyn DriverLog>,
}
