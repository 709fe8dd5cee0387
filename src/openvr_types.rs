//! Value types shared with the host tracking runtime.
//!
//! Handles issued by the host are kept opaque: the driver stores and forwards them
//! but never builds or interprets one itself, apart from comparing against the
//! host's invalid sentinels.

/// Number of slots in the host's tracked-device table.
pub const MAX_TRACKED_DEVICE_COUNT: usize = 64;

pub const SERVER_TRACKED_DEVICE_PROVIDER_VERSION: &str = "IServerTrackedDeviceProvider_004";
pub const DISPLAY_COMPONENT_VERSION: &str = "IVRDisplayComponent_002";
pub const VIRTUAL_DISPLAY_VERSION: &str = "IVRVirtualDisplay_002";

/// Interface versions this driver was built against, handed back to the host unmodified.
pub const INTERFACE_VERSIONS: &[&str] = &[
    "IVRSettings_002",
    "ITrackedDeviceServerDriver_005",
    DISPLAY_COMPONENT_VERSION,
    "IVRDriverDirectModeComponent_005",
    "IVRCameraComponent_003",
    SERVER_TRACKED_DEVICE_PROVIDER_VERSION,
    "IVRWatchdogProvider_001",
    VIRTUAL_DISPLAY_VERSION,
    "IVRDriverManager_001",
    "IVRResources_001",
    "IVRCompositorPluginProvider_001",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackedDeviceIndex(pub u32);

impl TrackedDeviceIndex {
    pub const INVALID: TrackedDeviceIndex = TrackedDeviceIndex(0xFFFF_FFFF);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyContainerHandle(pub u64);

impl PropertyContainerHandle {
    pub const INVALID: PropertyContainerHandle = PropertyContainerHandle(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum TrackedDeviceClass {
    Invalid = 0,
    HMD = 1,
    Controller = 2,
    GenericTracker = 3,
    TrackingReference = 4,
    DisplayRedirect = 5,
}

impl TrackedDeviceClass {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(TrackedDeviceClass::Invalid),
            1 => Some(TrackedDeviceClass::HMD),
            2 => Some(TrackedDeviceClass::Controller),
            3 => Some(TrackedDeviceClass::GenericTracker),
            4 => Some(TrackedDeviceClass::TrackingReference),
            5 => Some(TrackedDeviceClass::DisplayRedirect),
            _ => None,
        }
    }
}

/// Host property ids the driver reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DeviceProperty {
    ModelNumber = 1001,
    RenderModelName = 1003,
    DeviceClass = 1029,
    SecondsFromVsyncToPhotons = 2001,
    DisplayFrequency = 2002,
    UserIpdMeters = 2003,
    CurrentUniverseId = 2004,
    IsOnDesktop = 2007,
    UserHeadToEyeDepthMeters = 2056,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingResult {
    Uninitialized = 1,
    CalibratingInProgress = 100,
    CalibratingOutOfRange = 101,
    RunningOk = 200,
    RunningOutOfRange = 201,
    FallbackRotationOnly = 300,
}

impl Default for TrackingResult {
    fn default() -> Self {
        TrackingResult::Uninitialized
    }
}

/// Quaternion in the host's (w, x, y, z) double layout.
///
/// The default is all zeroes, not the identity, like a zero-filled host struct.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HmdQuaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Row-major 3x4 transform, translation in the last column.
pub type HmdMatrix34 = [[f32; 4]; 3];

/// Pose reported by a driver for one of its devices.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriverPose {
    pub pose_time_offset: f64,
    pub q_world_from_driver_rotation: HmdQuaternion,
    pub vec_world_from_driver_translation: [f64; 3],
    pub q_driver_from_head_rotation: HmdQuaternion,
    pub vec_driver_from_head_translation: [f64; 3],
    pub vec_position: [f64; 3],
    pub vec_velocity: [f64; 3],
    pub vec_acceleration: [f64; 3],
    pub q_rotation: HmdQuaternion,
    pub vec_angular_velocity: [f64; 3],
    pub vec_angular_acceleration: [f64; 3],
    pub result: TrackingResult,
    pub pose_is_valid: bool,
    pub will_drift_in_yaw: bool,
    pub should_apply_head_model: bool,
    pub device_is_connected: bool,
}

/// Raw pose of one slot as the host tracks it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackedDevicePose {
    pub device_to_absolute_tracking: HmdMatrix34,
    pub velocity: [f32; 3],
    pub angular_velocity: [f32; 3],
    pub tracking_result: TrackingResult,
    pub pose_is_valid: bool,
    pub device_is_connected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VrEvent {
    pub event_type: u32,
    pub tracked_device_index: TrackedDeviceIndex,
    pub event_age_seconds: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Raw projection bounds as tangents of the half angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionBounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionCoordinates {
    pub red: [f32; 2],
    pub green: [f32; 2],
    pub blue: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentInfo {
    pub back_buffer: u64,
    pub vsync: bool,
    pub frame_id: u64,
    pub vsync_time_in_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VsyncTiming {
    pub seconds_since_last_vsync: f32,
    pub frame_counter: u64,
}
