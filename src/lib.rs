//! Virtual headset driver that places a display-less HMD between the two tracked
//! controllers, so software that insists on a headset can run without one.

pub mod config;
pub mod device;
pub mod driver_log;
pub mod error;
pub mod host;
pub mod math;
pub mod openvr_types;
pub mod provider;
pub mod settings;
pub mod sim;

pub use device::{
    DeviceComponent, DisplayComponent, FacelessDevice, TrackedDeviceServerDriver, VirtualDisplay,
};
pub use error::InitError;
pub use host::DriverContext;
pub use provider::{FacelessProvider, ServerTrackedDeviceProvider};

use openvr_types::SERVER_TRACKED_DEVICE_PROVIDER_VERSION;
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    static PROVIDER: Rc<RefCell<FacelessProvider>> =
        Rc::new(RefCell::new(FacelessProvider::default()));
}

/// Plugin lookup used by the host loader.
///
/// Hands out the one provider living on the host's driver thread when asked for the
/// server device provider interface.
pub fn hmd_driver_factory(
    interface_name: &str,
) -> Result<Rc<RefCell<FacelessProvider>>, InitError> {
    if interface_name == SERVER_TRACKED_DEVICE_PROVIDER_VERSION {
        Ok(PROVIDER.with(Rc::clone))
    } else {
        Err(InitError::InterfaceNotFound)
    }
}
