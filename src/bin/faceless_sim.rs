use faceless_driver::math::matrix_from_parts;
use faceless_driver::openvr_types::{
    TrackedDeviceClass, MAX_TRACKED_DEVICE_COUNT, SERVER_TRACKED_DEVICE_PROVIDER_VERSION,
};
use faceless_driver::settings::JsonSettings;
use faceless_driver::sim::{MemoryLog, SimulatedHost};
use faceless_driver::{hmd_driver_factory, ServerTrackedDeviceProvider};

use anyhow::{ensure, Context, Result};
use log::*;
use nalgebra as na;
use serde::Deserialize;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_SETTINGS: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/resources/settings/default.vrsettings"
);

#[derive(Deserialize, Debug, Clone, Copy, Default)]
struct Vector {
    x: f64,
    y: f64,
    z: f64,
}

impl From<Vector> for na::Vector3<f64> {
    fn from(v: Vector) -> Self {
        na::Vector3::new(v.x, v.y, v.z)
    }
}

#[derive(Deserialize, Debug, Clone)]
struct Controller {
    slot: usize,
    position: Vector,
    #[serde(default)]
    yaw_degrees: f64,
}

#[derive(Deserialize, Debug, Clone)]
struct Scenario {
    controllers: Vec<Controller>,
    frames: usize,
    /// Added to every controller position each frame.
    #[serde(default)]
    drift: Vector,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            controllers: vec![
                Controller {
                    slot: 1,
                    position: Vector {
                        x: -0.2,
                        y: 1.1,
                        z: -0.3,
                    },
                    yaw_degrees: 15.0,
                },
                Controller {
                    slot: 2,
                    position: Vector {
                        x: 0.2,
                        y: 1.0,
                        z: -0.3,
                    },
                    yaw_degrees: -15.0,
                },
            ],
            frames: 5,
            drift: Vector {
                x: 0.0,
                y: 0.0,
                z: -0.05,
            },
        }
    }
}

impl FromStr for Scenario {
    type Err = anyhow::Error;

    fn from_str(contents: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(contents)?;
        for controller in &scenario.controllers {
            ensure!(
                controller.slot < MAX_TRACKED_DEVICE_COUNT,
                "controller slot {} is out of range, the host has {} slots",
                controller.slot,
                MAX_TRACKED_DEVICE_COUNT
            );
        }
        Ok(scenario)
    }
}

impl Scenario {
    fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path))?;
        contents
            .parse::<Scenario>()
            .with_context(|| format!("Invalid scenario {}", path))
    }

    fn place(&self, host: &SimulatedHost, frame: usize) {
        let drift: na::Vector3<f64> = self.drift.into();
        for controller in &self.controllers {
            let position = na::Vector3::from(controller.position) + drift * frame as f64;
            let rotation = na::UnitQuaternion::from_euler_angles(
                0.0,
                controller.yaw_degrees.to_radians(),
                0.0,
            );
            let placed = host.set_device(
                controller.slot,
                TrackedDeviceClass::Controller,
                matrix_from_parts(&position, &rotation),
            );
            if !placed {
                warn!("No slot {} for controller", controller.slot);
            }
        }
    }
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let settings_path = args.next().unwrap_or_else(|| DEFAULT_SETTINGS.to_owned());
    let settings = JsonSettings::from_path(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path))?;
    let scenario = match args.next() {
        Some(path) => Scenario::load(&path)?,
        None => Scenario::default(),
    };

    let host = Rc::new(SimulatedHost::new(settings));
    // controllers take their slots before the headset is registered
    scenario.place(&host, 0);

    let provider = hmd_driver_factory(SERVER_TRACKED_DEVICE_PROVIDER_VERSION)?;
    provider
        .borrow_mut()
        .init(host.context(Arc::new(MemoryLog::echoing())))?;
    for result in host.activate_registered() {
        result?;
    }

    for frame in 0..scenario.frames {
        scenario.place(&host, frame);
        provider.borrow_mut().run_frame();
        if let Some((index, pose)) = host.reported_poses().last() {
            let q = pose.q_rotation;
            info!(
                "frame {} {:?} position [{:.3}, {:.3}, {:.3}] \
                 rotation [{:.3}, {:.3}, {:.3}, {:.3}]",
                frame,
                index,
                pose.vec_position[0],
                pose.vec_position[1],
                pose.vec_position[2],
                q.w,
                q.x,
                q.y,
                q.z
            );
        }
    }

    host.deactivate_registered();
    provider.borrow_mut().cleanup();
    Ok(())
}
