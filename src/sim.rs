//! In-process stand-in for the host runtime.
//!
//! Slot `i` of the tracked-device table uses property container `i + 1`.

use crate::device::TrackedDeviceServerDriver;
use crate::error::{InitError, PropertyError, SettingsError};
use crate::host::{
    DeviceHandle, DriverContext, DriverLog, Properties, ServerDriverHost, Settings,
};
use crate::math::identity_matrix;
use crate::openvr_types::*;
use crate::settings::JsonSettings;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Int32(i32),
    Float(f32),
    Uint64(u64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy)]
struct SimSlot {
    class: TrackedDeviceClass,
    pose: TrackedDevicePose,
}

pub type LiveDevice = Rc<RefCell<dyn TrackedDeviceServerDriver>>;

struct RegisteredDevice {
    serial_number: String,
    index: TrackedDeviceIndex,
    device: DeviceHandle,
}

pub struct SimulatedHost {
    settings: JsonSettings,
    slots: RefCell<Vec<Option<SimSlot>>>,
    properties: RefCell<HashMap<(PropertyContainerHandle, DeviceProperty), PropertyValue>>,
    registered: RefCell<Vec<RegisteredDevice>>,
    reported_poses: RefCell<Vec<(TrackedDeviceIndex, DriverPose)>>,
    events: RefCell<VecDeque<VrEvent>>,
}

fn slot_of(container: PropertyContainerHandle) -> Option<usize> {
    let slot = container.0.checked_sub(1)? as usize;
    if slot < MAX_TRACKED_DEVICE_COUNT {
        Some(slot)
    } else {
        None
    }
}

impl SimulatedHost {
    pub fn new(settings: JsonSettings) -> Self {
        Self {
            settings,
            slots: RefCell::new(vec![None; MAX_TRACKED_DEVICE_COUNT]),
            properties: RefCell::new(HashMap::new()),
            registered: RefCell::new(Vec::new()),
            reported_poses: RefCell::new(Vec::new()),
            events: RefCell::new(VecDeque::new()),
        }
    }

    pub fn context(self: &Rc<Self>, log: Arc<dyn DriverLog>) -> DriverContext {
        DriverContext {
            settings: self.clone(),
            properties: self.clone(),
            server_host: self.clone(),
            log,
        }
    }

    /// Puts a tracked object into `slot`, replacing whatever was there.
    ///
    /// Returns `false` and leaves the table untouched when `slot` is past the last slot.
    pub fn set_device(
        &self,
        slot: usize,
        class: TrackedDeviceClass,
        transform: HmdMatrix34,
    ) -> bool {
        let mut slots = self.slots.borrow_mut();
        let entry = match slots.get_mut(slot) {
            Some(entry) => entry,
            None => return false,
        };
        *entry = Some(SimSlot {
            class,
            pose: TrackedDevicePose {
                device_to_absolute_tracking: transform,
                tracking_result: TrackingResult::RunningOk,
                pose_is_valid: true,
                device_is_connected: true,
                ..Default::default()
            },
        });
        true
    }

    pub fn remove_device(&self, slot: usize) {
        if let Some(entry) = self.slots.borrow_mut().get_mut(slot) {
            *entry = None;
        }
    }

    /// Activates every registered device with the slot it was given.
    pub fn activate_registered(&self) -> Vec<Result<(), InitError>> {
        self.registered_handles()
            .into_iter()
            .map(|(index, device)| device.borrow_mut().activate(index))
            .collect()
    }

    pub fn deactivate_registered(&self) {
        for (_, device) in self.registered_handles() {
            device.borrow_mut().deactivate();
        }
    }

    /// Devices still alive, paired with their slots. Dropped devices are skipped.
    fn registered_handles(&self) -> Vec<(TrackedDeviceIndex, LiveDevice)> {
        self.registered
            .borrow()
            .iter()
            .filter_map(|entry| Some((entry.index, entry.device.upgrade()?)))
            .collect()
    }

    /// Serial numbers and slots of registered devices, in registration order.
    pub fn registered(&self) -> Vec<(String, TrackedDeviceIndex)> {
        self.registered
            .borrow()
            .iter()
            .map(|entry| (entry.serial_number.clone(), entry.index))
            .collect()
    }

    /// The registered device with this serial, if its owner still keeps it alive.
    pub fn device(&self, serial_number: &str) -> Option<LiveDevice> {
        self.registered
            .borrow()
            .iter()
            .find(|entry| entry.serial_number == serial_number)
            .and_then(|entry| entry.device.upgrade())
    }

    pub fn property(
        &self,
        index: TrackedDeviceIndex,
        property: DeviceProperty,
    ) -> Option<PropertyValue> {
        let container = self.tracked_device_to_property_container(index);
        self.properties.borrow().get(&(container, property)).cloned()
    }

    pub fn reported_poses(&self) -> Vec<(TrackedDeviceIndex, DriverPose)> {
        self.reported_poses.borrow().clone()
    }

    pub fn push_event(&self, event: VrEvent) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        self.events.borrow().len()
    }

    fn occupied(&self, container: PropertyContainerHandle) -> Result<SimSlot, PropertyError> {
        slot_of(container)
            .and_then(|slot| self.slots.borrow()[slot])
            .ok_or(PropertyError::InvalidDevice)
    }

    fn set_property(
        &self,
        container: PropertyContainerHandle,
        property: DeviceProperty,
        value: PropertyValue,
    ) -> Result<(), PropertyError> {
        self.occupied(container)?;
        self.properties
            .borrow_mut()
            .insert((container, property), value);
        Ok(())
    }
}

impl Settings for SimulatedHost {
    fn get_string(&self, section: &str, key: &str) -> Result<String, SettingsError> {
        self.settings.get_string(section, key)
    }

    fn get_int32(&self, section: &str, key: &str) -> Result<i32, SettingsError> {
        self.settings.get_int32(section, key)
    }

    fn get_float(&self, section: &str, key: &str) -> Result<f32, SettingsError> {
        self.settings.get_float(section, key)
    }
}

impl Properties for SimulatedHost {
    fn tracked_device_to_property_container(
        &self,
        index: TrackedDeviceIndex,
    ) -> PropertyContainerHandle {
        if (index.0 as usize) < MAX_TRACKED_DEVICE_COUNT {
            PropertyContainerHandle(index.0 as u64 + 1)
        } else {
            PropertyContainerHandle::INVALID
        }
    }

    fn get_int32_property(
        &self,
        container: PropertyContainerHandle,
        property: DeviceProperty,
    ) -> Result<i32, PropertyError> {
        let slot = self.occupied(container)?;
        if property == DeviceProperty::DeviceClass {
            return Ok(slot.class as i32);
        }
        match self.properties.borrow().get(&(container, property)) {
            Some(PropertyValue::Int32(value)) => Ok(*value),
            Some(_) => Err(PropertyError::WrongDataType),
            None => Err(PropertyError::UnknownProperty),
        }
    }

    fn set_string_property(
        &self,
        container: PropertyContainerHandle,
        property: DeviceProperty,
        value: &str,
    ) -> Result<(), PropertyError> {
        self.set_property(container, property, PropertyValue::String(value.to_owned()))
    }

    fn set_float_property(
        &self,
        container: PropertyContainerHandle,
        property: DeviceProperty,
        value: f32,
    ) -> Result<(), PropertyError> {
        self.set_property(container, property, PropertyValue::Float(value))
    }

    fn set_uint64_property(
        &self,
        container: PropertyContainerHandle,
        property: DeviceProperty,
        value: u64,
    ) -> Result<(), PropertyError> {
        self.set_property(container, property, PropertyValue::Uint64(value))
    }

    fn set_bool_property(
        &self,
        container: PropertyContainerHandle,
        property: DeviceProperty,
        value: bool,
    ) -> Result<(), PropertyError> {
        self.set_property(container, property, PropertyValue::Bool(value))
    }
}

impl ServerDriverHost for SimulatedHost {
    fn tracked_device_added(
        &self,
        serial_number: &str,
        class: TrackedDeviceClass,
        device: DeviceHandle,
    ) -> bool {
        let free = self.slots.borrow().iter().position(Option::is_none);
        let slot = match free {
            Some(slot) => slot,
            None => return false,
        };
        self.set_device(slot, class, identity_matrix());
        self.registered.borrow_mut().push(RegisteredDevice {
            serial_number: serial_number.to_owned(),
            index: TrackedDeviceIndex(slot as u32),
            device,
        });
        true
    }

    fn tracked_device_pose_updated(&self, index: TrackedDeviceIndex, pose: &DriverPose) {
        self.reported_poses.borrow_mut().push((index, *pose));
    }

    fn get_raw_tracked_device_poses(
        &self,
        _predicted_seconds_from_now: f32,
        poses: &mut [TrackedDevicePose],
    ) {
        for (slot, pose) in self.slots.borrow().iter().zip(poses.iter_mut()) {
            *pose = slot.map(|slot| slot.pose).unwrap_or_default();
        }
    }

    fn poll_next_event(&self) -> Option<VrEvent> {
        self.events.borrow_mut().pop_front()
    }
}

/// Driver log that keeps every line in memory, optionally echoing to stdout.
#[derive(Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
    echo: bool,
}

impl MemoryLog {
    pub fn echoing() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            echo: true,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DriverLog for MemoryLog {
    fn log(&self, message: &str) {
        if self.echo {
            print!("{}", message);
        }
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(message.to_owned());
        }
    }
}
