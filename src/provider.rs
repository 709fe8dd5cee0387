use crate::device::FacelessDevice;
use crate::driver_log::{cleanup_driver_log, init_driver_log};
use crate::error::InitError;
use crate::host::{DeviceHandle, DriverContext, ServerDriverHost};
use crate::openvr_types::{TrackedDeviceClass, INTERFACE_VERSIONS};
use log::*;
use std::cell::RefCell;
use std::rc::Rc;

pub trait ServerTrackedDeviceProvider {
    fn init(&mut self, context: DriverContext) -> Result<(), InitError>;
    fn cleanup(&mut self);
    fn interface_versions(&self) -> &'static [&'static str];
    fn run_frame(&mut self);
    fn should_block_standby_mode(&self) -> bool;
    fn enter_standby(&mut self);
    fn leave_standby(&mut self);
}

/// Owns the single faceless headset for the lifetime of a host session.
#[derive(Default)]
pub struct FacelessProvider {
    device: Option<Rc<RefCell<FacelessDevice>>>,
    server_host: Option<Rc<dyn ServerDriverHost>>,
}

impl FacelessProvider {
    pub fn device(&self) -> Option<Rc<RefCell<FacelessDevice>>> {
        self.device.clone()
    }
}

impl ServerTrackedDeviceProvider for FacelessProvider {
    fn init(&mut self, context: DriverContext) -> Result<(), InitError> {
        init_driver_log(context.log.clone());

        let device = FacelessDevice::new(
            &*context.settings,
            context.properties.clone(),
            context.server_host.clone(),
        );
        let serial_number = device.serial_number().to_owned();
        let device = Rc::new(RefCell::new(device));
        let weak = Rc::downgrade(&device);
        let handle: DeviceHandle = weak;
        if !context.server_host.tracked_device_added(
            &serial_number,
            TrackedDeviceClass::HMD,
            handle,
        ) {
            warn!("Host refused device {}", serial_number);
        }
        info!("Registered {} as HMD", serial_number);

        self.device = Some(device);
        self.server_host = Some(context.server_host);
        Ok(())
    }

    fn cleanup(&mut self) {
        if self.device.is_some() {
            info!("Cleaning up");
        }
        cleanup_driver_log();
        // last strong reference, the host only holds a weak handle
        self.device = None;
        self.server_host = None;
    }

    fn interface_versions(&self) -> &'static [&'static str] {
        INTERFACE_VERSIONS
    }

    fn run_frame(&mut self) {
        if let Some(device) = &self.device {
            device.borrow().run_frame();
        }

        if let Some(server_host) = &self.server_host {
            // no events to care about
            let mut drained = 0;
            while server_host.poll_next_event().is_some() {
                drained += 1;
            }
            if drained > 0 {
                trace!("Discarded {} host events", drained);
            }
        }
    }

    fn should_block_standby_mode(&self) -> bool {
        false
    }

    fn enter_standby(&mut self) {}

    fn leave_standby(&mut self) {}
}
