use crate::config::DeviceConfiguration;
use crate::error::{InitError, PropertyError};
use crate::host::{Properties, ServerDriverHost, Settings};
use crate::math::{quaternion, PoseMatrix};
use crate::openvr_types::*;
use log::*;
use nalgebra as na;
use std::rc::Rc;

/// Height of the synthesized head above the controller midpoint, in meters.
pub const HEAD_HEIGHT_OFFSET: f64 = 0.3;

/// Any constant other than 0 (invalid) and 1 (reserved for Oculus).
pub const UNIVERSE_ID: u64 = 251_235;

pub trait TrackedDeviceServerDriver {
    fn activate(&mut self, object_id: TrackedDeviceIndex) -> Result<(), InitError>;
    fn deactivate(&mut self);
    fn enter_standby(&mut self);
    fn get_component(&self, name_and_version: &str) -> Option<DeviceComponent<'_>>;
    fn debug_request(&mut self, request: &str, response: &mut [u8]);
    fn get_pose(&self) -> DriverPose;
    fn power_off(&mut self);
}

pub trait DisplayComponent {
    fn window_bounds(&self) -> WindowBounds;
    fn is_display_on_desktop(&self) -> bool;
    fn is_display_real_display(&self) -> bool;
    fn recommended_render_target_size(&self) -> (u32, u32);
    fn eye_output_viewport(&self, eye: Eye) -> Viewport;
    fn projection_raw(&self, eye: Eye) -> ProjectionBounds;
    fn compute_distortion(&self, eye: Eye, u: f32, v: f32) -> DistortionCoordinates;
}

pub trait VirtualDisplay {
    fn present(&self, present_info: &PresentInfo);
    fn wait_for_present(&self);
    fn time_since_last_vsync(&self) -> Option<VsyncTiming>;
}

/// Capability resolved by [`TrackedDeviceServerDriver::get_component`].
pub enum DeviceComponent<'a> {
    Display(&'a dyn DisplayComponent),
    VirtualDisplay(&'a dyn VirtualDisplay),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Uninitialized,
    Active,
    Standby,
    Inactive,
}

/// Headset without a display that follows the midpoint of the first two controllers.
pub struct FacelessDevice {
    config: DeviceConfiguration,
    object_id: TrackedDeviceIndex,
    property_container: PropertyContainerHandle,
    state: DeviceState,
    properties: Rc<dyn Properties>,
    server_host: Rc<dyn ServerDriverHost>,
}

impl FacelessDevice {
    pub fn new(
        settings: &dyn Settings,
        properties: Rc<dyn Properties>,
        server_host: Rc<dyn ServerDriverHost>,
    ) -> Self {
        Self {
            config: DeviceConfiguration::from_settings(settings),
            object_id: TrackedDeviceIndex::INVALID,
            property_container: PropertyContainerHandle::INVALID,
            state: DeviceState::Uninitialized,
            properties,
            server_host,
        }
    }

    pub fn serial_number(&self) -> &str {
        &self.config.serial_number
    }

    pub fn config(&self) -> &DeviceConfiguration {
        &self.config
    }

    pub fn object_id(&self) -> TrackedDeviceIndex {
        self.object_id
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Reports a fresh pose while bound to a host slot.
    pub fn run_frame(&self) {
        if self.object_id.is_valid() {
            let pose = self.get_pose();
            trace!("pose update for {:?}: {:?}", self.object_id, pose.vec_position);
            self.server_host.tracked_device_pose_updated(self.object_id, &pose);
        }
    }

    /// Controller slots in host index order.
    fn find_controllers(&self) -> Vec<TrackedDeviceIndex> {
        (0..MAX_TRACKED_DEVICE_COUNT as u32)
            .map(TrackedDeviceIndex)
            .filter(|&index| {
                let container = self.properties.tracked_device_to_property_container(index);
                // slots the host can't describe are simply not controllers
                matches!(
                    self.properties
                        .get_int32_property(container, DeviceProperty::DeviceClass),
                    Ok(class) if class == TrackedDeviceClass::Controller as i32
                )
            })
            .collect()
    }

    fn write_static_properties(&self) {
        let container = self.property_container;
        let properties = &self.properties;
        let config = &self.config;
        let results: [(DeviceProperty, Result<(), PropertyError>); 8] = [
            (
                DeviceProperty::ModelNumber,
                properties.set_string_property(
                    container,
                    DeviceProperty::ModelNumber,
                    &config.model_number,
                ),
            ),
            (
                DeviceProperty::RenderModelName,
                properties.set_string_property(
                    container,
                    DeviceProperty::RenderModelName,
                    &config.model_number,
                ),
            ),
            (
                DeviceProperty::UserIpdMeters,
                properties.set_float_property(container, DeviceProperty::UserIpdMeters, config.ipd),
            ),
            (
                DeviceProperty::UserHeadToEyeDepthMeters,
                properties.set_float_property(
                    container,
                    DeviceProperty::UserHeadToEyeDepthMeters,
                    0.,
                ),
            ),
            (
                DeviceProperty::DisplayFrequency,
                properties.set_float_property(
                    container,
                    DeviceProperty::DisplayFrequency,
                    config.display_frequency,
                ),
            ),
            (
                DeviceProperty::SecondsFromVsyncToPhotons,
                properties.set_float_property(
                    container,
                    DeviceProperty::SecondsFromVsyncToPhotons,
                    0.,
                ),
            ),
            (
                DeviceProperty::CurrentUniverseId,
                properties.set_uint64_property(
                    container,
                    DeviceProperty::CurrentUniverseId,
                    UNIVERSE_ID,
                ),
            ),
            // avoids "not fullscreen" warnings from the host monitor
            (
                DeviceProperty::IsOnDesktop,
                properties.set_bool_property(container, DeviceProperty::IsOnDesktop, false),
            ),
        ];
        for (property, result) in results.iter() {
            if let Err(error) = result {
                warn!("Failed to set {:?} on {:?}: {}", property, container, error);
            }
        }
    }
}

impl TrackedDeviceServerDriver for FacelessDevice {
    fn activate(&mut self, object_id: TrackedDeviceIndex) -> Result<(), InitError> {
        self.object_id = object_id;
        self.property_container = self
            .properties
            .tracked_device_to_property_container(object_id);
        self.state = DeviceState::Active;
        info!(
            "Activated {} as {:?} ({:?})",
            self.config.serial_number, object_id, self.property_container
        );
        self.write_static_properties();
        Ok(())
    }

    fn deactivate(&mut self) {
        info!("Deactivating {}", self.config.serial_number);
        self.object_id = TrackedDeviceIndex::INVALID;
        self.property_container = PropertyContainerHandle::INVALID;
        self.state = DeviceState::Inactive;
    }

    fn enter_standby(&mut self) {
        debug!("Standby requested");
        if self.state == DeviceState::Active {
            self.state = DeviceState::Standby;
        }
    }

    fn get_component(&self, name_and_version: &str) -> Option<DeviceComponent<'_>> {
        if name_and_version.eq_ignore_ascii_case(DISPLAY_COMPONENT_VERSION) {
            Some(DeviceComponent::Display(self))
        } else if name_and_version.eq_ignore_ascii_case(VIRTUAL_DISPLAY_VERSION) {
            Some(DeviceComponent::VirtualDisplay(self))
        } else {
            None
        }
    }

    fn debug_request(&mut self, _request: &str, response: &mut [u8]) {
        if let Some(first) = response.first_mut() {
            *first = 0;
        }
    }

    /// Midpoint of the first two controllers raised by [`HEAD_HEIGHT_OFFSET`],
    /// oriented like the first controller.
    ///
    /// With fewer than two controllers position and rotation stay zeroed but the
    /// pose is still reported as valid and connected.
    fn get_pose(&self) -> DriverPose {
        let mut pose = DriverPose {
            pose_is_valid: true,
            result: TrackingResult::RunningOk,
            device_is_connected: true,
            q_world_from_driver_rotation: quaternion(1., 0., 0., 0.),
            q_driver_from_head_rotation: quaternion(1., 0., 0., 0.),
            ..Default::default()
        };

        let controllers = self.find_controllers();

        let mut raw_poses = [TrackedDevicePose::default(); MAX_TRACKED_DEVICE_COUNT];
        self.server_host.get_raw_tracked_device_poses(0., &mut raw_poses);

        if let [first, second, ..] = controllers.as_slice() {
            let first = &raw_poses[first.0 as usize].device_to_absolute_tracking;
            let second = &raw_poses[second.0 as usize].device_to_absolute_tracking;

            let position = (first.to_position() + second.to_position()) * 0.5
                + na::Vector3::new(0., HEAD_HEIGHT_OFFSET, 0.);
            pose.vec_position = [position.x, position.y, position.z];
            // second controller's rotation is ignored
            pose.q_rotation = first.to_rotation();
        }

        pose
    }

    fn power_off(&mut self) {
        debug!("Power off requested");
        if self.state == DeviceState::Active {
            self.state = DeviceState::Inactive;
        }
    }
}

impl DisplayComponent for FacelessDevice {
    fn window_bounds(&self) -> WindowBounds {
        WindowBounds {
            x: 0,
            y: 0,
            width: self.config.render_width,
            height: self.config.render_height,
        }
    }

    /// Claims the desktop so the host skips fullscreen handling, even though the
    /// activation properties say otherwise.
    fn is_display_on_desktop(&self) -> bool {
        true
    }

    fn is_display_real_display(&self) -> bool {
        false
    }

    fn recommended_render_target_size(&self) -> (u32, u32) {
        (self.config.render_width, self.config.render_height)
    }

    fn eye_output_viewport(&self, eye: Eye) -> Viewport {
        let half_width = self.config.render_width / 2;
        Viewport {
            x: match eye {
                Eye::Left => 0,
                Eye::Right => half_width,
            },
            y: 0,
            width: half_width,
            height: self.config.render_height,
        }
    }

    fn projection_raw(&self, _eye: Eye) -> ProjectionBounds {
        ProjectionBounds {
            left: -1.,
            right: 1.,
            top: -1.,
            bottom: 1.,
        }
    }

    fn compute_distortion(&self, _eye: Eye, u: f32, v: f32) -> DistortionCoordinates {
        DistortionCoordinates {
            red: [u, v],
            green: [u, v],
            blue: [u, v],
        }
    }
}

impl VirtualDisplay for FacelessDevice {
    fn present(&self, _present_info: &PresentInfo) {}

    fn wait_for_present(&self) {}

    fn time_since_last_vsync(&self) -> Option<VsyncTiming> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{identity_matrix, matrix_from_parts};
    use crate::sim::{PropertyValue, SimulatedHost};
    use approx::assert_relative_eq;

    const SETTINGS: &str = r#"{
        "driver_faceless": {
            "serialNumber": "Faceless-0001",
            "modelNumber": "Faceless",
            "renderWidth": 1512,
            "renderHeight": 1680,
            "displayFrequency": 90.0
        },
        "steamvr": { "ipd": 0.063 }
    }"#;

    fn host() -> Rc<SimulatedHost> {
        Rc::new(SimulatedHost::new(SETTINGS.parse().unwrap()))
    }

    fn device(host: &Rc<SimulatedHost>) -> FacelessDevice {
        FacelessDevice::new(&**host, host.clone(), host.clone())
    }

    fn at(x: f64, y: f64, z: f64) -> HmdMatrix34 {
        matrix_from_parts(&na::Vector3::new(x, y, z), &na::UnitQuaternion::identity())
    }

    #[test]
    fn starts_uninitialized() {
        let host = host();
        let device = device(&host);
        assert_eq!(device.state(), DeviceState::Uninitialized);
        assert!(!device.object_id().is_valid());
        assert_eq!(device.serial_number(), "Faceless-0001");
    }

    #[test]
    fn activation_writes_static_properties() {
        let host = host();
        host.set_device(3, TrackedDeviceClass::HMD, identity_matrix());
        let mut device = device(&host);
        assert_eq!(device.activate(TrackedDeviceIndex(3)), Ok(()));
        assert_eq!(device.state(), DeviceState::Active);

        let property = |p| host.property(TrackedDeviceIndex(3), p);
        assert_eq!(
            property(DeviceProperty::ModelNumber),
            Some(PropertyValue::String("Faceless".to_owned()))
        );
        assert_eq!(
            property(DeviceProperty::RenderModelName),
            Some(PropertyValue::String("Faceless".to_owned()))
        );
        assert_eq!(
            property(DeviceProperty::UserIpdMeters),
            Some(PropertyValue::Float(0.063))
        );
        assert_eq!(
            property(DeviceProperty::UserHeadToEyeDepthMeters),
            Some(PropertyValue::Float(0.))
        );
        assert_eq!(
            property(DeviceProperty::DisplayFrequency),
            Some(PropertyValue::Float(90.))
        );
        assert_eq!(
            property(DeviceProperty::CurrentUniverseId),
            Some(PropertyValue::Uint64(UNIVERSE_ID))
        );
        assert_eq!(
            property(DeviceProperty::SecondsFromVsyncToPhotons),
            Some(PropertyValue::Float(0.))
        );
        assert_eq!(
            property(DeviceProperty::IsOnDesktop),
            Some(PropertyValue::Bool(false))
        );
    }

    #[test]
    fn activation_succeeds_even_if_properties_are_rejected() {
        let host = host();
        let mut device = device(&host);
        // nothing lives in slot 9, so every write fails
        assert_eq!(device.activate(TrackedDeviceIndex(9)), Ok(()));
        assert_eq!(host.property(TrackedDeviceIndex(9), DeviceProperty::ModelNumber), None);
    }

    #[test]
    fn no_or_one_controller_reports_default_pose_as_valid() {
        let host = host();
        let device = device(&host);
        for controllers in 0..2 {
            if controllers == 1 {
                host.set_device(0, TrackedDeviceClass::Controller, at(1., 1., 1.));
            }
            let pose = device.get_pose();
            assert!(pose.pose_is_valid);
            assert!(pose.device_is_connected);
            assert_eq!(pose.result, TrackingResult::RunningOk);
            assert_eq!(pose.vec_position, [0.; 3]);
            assert_eq!(pose.q_rotation, HmdQuaternion::default());
            assert_eq!(pose.q_world_from_driver_rotation, quaternion(1., 0., 0., 0.));
            assert_eq!(pose.q_driver_from_head_rotation, quaternion(1., 0., 0., 0.));
        }
    }

    #[test]
    fn two_controllers_average_position_and_raise_head() {
        let host = host();
        host.set_device(1, TrackedDeviceClass::Controller, at(0., 0., 0.));
        host.set_device(4, TrackedDeviceClass::Controller, at(2., 0., 0.));
        let pose = device(&host).get_pose();
        assert_relative_eq!(pose.vec_position[0], 1.);
        assert_relative_eq!(pose.vec_position[1], 0.3);
        assert_relative_eq!(pose.vec_position[2], 0.);
        assert_eq!(pose.q_rotation, quaternion(1., 0., 0., 0.));
    }

    #[test]
    fn rotation_follows_first_controller_only() {
        let host = host();
        let turned = na::UnitQuaternion::from_euler_angles(0., 0.8, 0.);
        host.set_device(
            2,
            TrackedDeviceClass::Controller,
            matrix_from_parts(&na::Vector3::new(0., 1., 0.), &turned),
        );
        host.set_device(
            5,
            TrackedDeviceClass::Controller,
            matrix_from_parts(
                &na::Vector3::new(0., 1., 1.),
                &na::UnitQuaternion::from_euler_angles(1.0, 0., 0.3),
            ),
        );
        let pose = device(&host).get_pose();
        assert_relative_eq!(pose.q_rotation.w, turned.w, epsilon = 1e-6);
        assert_relative_eq!(pose.q_rotation.x, turned.i, epsilon = 1e-6);
        assert_relative_eq!(pose.q_rotation.y, turned.j, epsilon = 1e-6);
        assert_relative_eq!(pose.q_rotation.z, turned.k, epsilon = 1e-6);
        assert_relative_eq!(pose.vec_position[1], 1.3, epsilon = 1e-6);
        assert_relative_eq!(pose.vec_position[2], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn third_controller_is_ignored() {
        let host = host();
        host.set_device(0, TrackedDeviceClass::HMD, at(9., 9., 9.));
        host.set_device(1, TrackedDeviceClass::Controller, at(0., 0., 0.));
        host.set_device(2, TrackedDeviceClass::TrackingReference, at(5., 5., 5.));
        host.set_device(3, TrackedDeviceClass::Controller, at(2., 0., 0.));
        let device = device(&host);
        let before = device.get_pose();

        host.set_device(
            7,
            TrackedDeviceClass::Controller,
            matrix_from_parts(
                &na::Vector3::new(-40., 12., 3.),
                &na::UnitQuaternion::from_euler_angles(0.5, 0.5, 0.5),
            ),
        );
        let after = device.get_pose();
        assert_eq!(before, after);
    }

    #[test]
    fn run_frame_reports_only_while_active() {
        let host = host();
        host.set_device(0, TrackedDeviceClass::HMD, identity_matrix());
        let mut device = device(&host);

        device.run_frame();
        assert!(host.reported_poses().is_empty());

        device.activate(TrackedDeviceIndex(0)).unwrap();
        device.run_frame();
        assert_eq!(host.reported_poses().len(), 1);
        assert_eq!(host.reported_poses()[0].0, TrackedDeviceIndex(0));

        device.deactivate();
        assert_eq!(device.state(), DeviceState::Inactive);
        device.run_frame();
        assert_eq!(host.reported_poses().len(), 1);
    }

    #[test]
    fn standby_and_power_off_keep_reporting() {
        let host = host();
        host.set_device(0, TrackedDeviceClass::HMD, identity_matrix());
        let mut device = device(&host);
        device.activate(TrackedDeviceIndex(0)).unwrap();

        device.enter_standby();
        assert_eq!(device.state(), DeviceState::Standby);
        device.run_frame();
        device.power_off();
        device.run_frame();
        assert_eq!(host.reported_poses().len(), 2);
    }

    #[test]
    fn eye_viewports_partition_render_width() {
        let host = host();
        let device = device(&host);
        let left = device.eye_output_viewport(Eye::Left);
        let right = device.eye_output_viewport(Eye::Right);
        assert_eq!(
            left,
            Viewport {
                x: 0,
                y: 0,
                width: 756,
                height: 1680,
            }
        );
        assert_eq!(
            right,
            Viewport {
                x: 756,
                y: 0,
                width: 756,
                height: 1680,
            }
        );
        assert_eq!(left.x + left.width, right.x);
        assert_eq!(right.x + right.width, 1512);
    }

    #[test]
    fn display_geometry_is_degenerate() {
        let host = host();
        let device = device(&host);
        assert_eq!(device.recommended_render_target_size(), (1512, 1680));
        assert_eq!(
            device.window_bounds(),
            WindowBounds {
                x: 0,
                y: 0,
                width: 1512,
                height: 1680,
            }
        );
        assert!(device.is_display_on_desktop());
        assert!(!device.is_display_real_display());
        for eye in [Eye::Left, Eye::Right].iter() {
            assert_eq!(
                device.projection_raw(*eye),
                ProjectionBounds {
                    left: -1.,
                    right: 1.,
                    top: -1.,
                    bottom: 1.,
                }
            );
            let distortion = device.compute_distortion(*eye, 0.25, 0.75);
            assert_eq!(distortion.red, [0.25, 0.75]);
            assert_eq!(distortion.green, [0.25, 0.75]);
            assert_eq!(distortion.blue, [0.25, 0.75]);
        }
    }

    #[test]
    fn components_resolve_by_name() {
        let host = host();
        let device = device(&host);
        assert!(matches!(
            device.get_component("ivrdisplaycomponent_002"),
            Some(DeviceComponent::Display(_))
        ));
        match device.get_component(VIRTUAL_DISPLAY_VERSION) {
            Some(DeviceComponent::VirtualDisplay(display)) => {
                display.wait_for_present();
                assert_eq!(display.time_since_last_vsync(), None);
            }
            _ => panic!("virtual display not resolved"),
        }
        assert!(device.get_component("IVRCameraComponent_003").is_none());
    }

    #[test]
    fn debug_request_answers_empty() {
        let host = host();
        let mut device = device(&host);
        let mut response = [b'x'; 4];
        device.debug_request("anything", &mut response);
        assert_eq!(response, [0, b'x', b'x', b'x']);
        device.debug_request("anything", &mut []);
    }
}
