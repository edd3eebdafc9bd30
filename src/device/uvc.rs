//! UVC-backed sensor implementation
//!
//! The DIGIT-class sensor shows up as an ordinary UVC camera, so capture
//! goes through the nokhwa crate. LED intensity rides on the UVC brightness
//! control.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, ControlValueSetter, FrameFormat, KnownCameraControl,
    RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;

use super::{DeviceError, RawFrame, SensorDevice, SensorInfo, VideoMode};

/// Substring that identifies the sensor among enumerated cameras
const SENSOR_NAME_HINT: &str = "DIGIT";

/// List attached sensors.
///
/// Enumerates all cameras and keeps the ones whose name matches the vendor
/// string. Enumeration failure is logged and reported as no devices.
pub fn list_sensors() -> Vec<SensorInfo> {
    let mut sensors = Vec::new();

    match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
        Ok(camera_list) => {
            for (idx, info) in camera_list.iter().enumerate() {
                let name = info.human_name().to_string();
                if name.to_uppercase().contains(SENSOR_NAME_HINT) {
                    sensors.push(SensorInfo {
                        index: idx as u32,
                        name,
                    });
                }
            }
        }
        Err(e) => {
            log::warn!("Failed to enumerate cameras: {:?}", e);
        }
    }

    sensors
}

/// A connected sensor backed by a UVC camera stream
pub struct UvcSensor {
    camera: Camera,
    index: u32,
    serial: String,
    mode: VideoMode,
    intensity: u8,
    connected: bool,
}

impl UvcSensor {
    /// Connect to the first attached sensor and open its stream in `mode`.
    pub fn connect(mode: VideoMode, intensity: u8) -> Result<Self, DeviceError> {
        let sensors = list_sensors();
        let info = sensors.first().ok_or(DeviceError::Unavailable)?;

        let camera = Self::open_camera(info.index, mode)?;
        log::info!("Connected to sensor: {} ({})", info.name, mode.display_name());

        let mut sensor = Self {
            camera,
            index: info.index,
            serial: info.name.clone(),
            mode,
            intensity,
            connected: true,
        };
        // Some backends reject the brightness control; degrade rather than
        // fail the whole connection.
        if let Err(e) = sensor.apply_intensity(intensity) {
            log::warn!("Failed to apply initial intensity: {}", e);
        }
        Ok(sensor)
    }

    /// Device name reported by the OS backend
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Open a stream, entering QVGA through VGA first.
    ///
    /// The vendor firmware glitches when QVGA is selected cold; passing
    /// through VGA for one open/close cycle clears it.
    fn open_camera(index: u32, mode: VideoMode) -> Result<Camera, DeviceError> {
        if mode == VideoMode::Qvga {
            if let Ok(mut warmup) = Self::open_stream(index, VideoMode::Vga) {
                let _ = warmup.stop_stream();
            }
        }
        Self::open_stream(index, mode)
    }

    fn open_stream(index: u32, mode: VideoMode) -> Result<Camera, DeviceError> {
        let (width, height) = mode.resolution();
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, mode.fps()),
        ));

        let mut camera = match Camera::new(CameraIndex::Index(index), requested) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to open sensor at {}: {:?}", mode.display_name(), e);

                // Fall back to whatever format the backend prefers
                let fallback = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
                Camera::new(CameraIndex::Index(index), fallback)
                    .map_err(|e2| DeviceError::Open(e2.to_string()))?
            }
        };

        camera
            .open_stream()
            .map_err(|e| DeviceError::Open(e.to_string()))?;

        log::info!(
            "Sensor stream open: {}x{}",
            camera.resolution().width(),
            camera.resolution().height()
        );

        Ok(camera)
    }

    fn apply_intensity(&mut self, value: u8) -> Result<(), DeviceError> {
        // The driver reports intensity back as a raw 0-4095 register, so the
        // panel never reads it from the device; preferences stay authoritative.
        self.camera
            .set_camera_control(
                KnownCameraControl::Brightness,
                ControlValueSetter::Integer(i64::from(value)),
            )
            .map_err(|e| DeviceError::Control(e.to_string()))
    }
}

impl SensorDevice for UvcSensor {
    fn set_intensity(&mut self, value: u8) -> Result<(), DeviceError> {
        if !self.connected {
            return Err(DeviceError::Unavailable);
        }
        self.apply_intensity(value)?;
        self.intensity = value;
        Ok(())
    }

    fn set_mode(&mut self, mode: VideoMode) -> Result<(), DeviceError> {
        if !self.connected {
            return Err(DeviceError::Unavailable);
        }
        if mode == self.mode {
            return Ok(());
        }

        let _ = self.camera.stop_stream();
        match Self::open_camera(self.index, mode) {
            Ok(camera) => {
                self.camera = camera;
                self.mode = mode;
                // Reopening the stream resets UVC controls
                if let Err(e) = self.apply_intensity(self.intensity) {
                    log::warn!("Failed to restore intensity after mode switch: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                self.connected = false;
                Err(e)
            }
        }
    }

    fn get_frame(&mut self) -> Result<RawFrame, DeviceError> {
        if !self.connected {
            return Err(DeviceError::Unavailable);
        }

        let buffer = self
            .camera
            .frame()
            .map_err(|e| DeviceError::Acquisition(e.to_string()))?;
        let image = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| DeviceError::Acquisition(e.to_string()))?;

        Ok(RawFrame {
            width: image.width(),
            height: image.height(),
            data: image.into_raw(),
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        if self.connected {
            let _ = self.camera.stop_stream();
            self.connected = false;
            log::info!("Sensor disconnected");
        }
    }
}

impl Drop for UvcSensor {
    fn drop(&mut self) {
        self.disconnect();
    }
}
