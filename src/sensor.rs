/// One reading from the sunlight sensor. The ultraviolet channel is the raw
/// register value; divide by 100 for the UV index.
#[derive(Debug, Clone, Copy)]
pub struct SunlightReading {
    pub visible: i64,
    pub infra_red: i64,
    pub ultra_violet_raw: i64,
}

/// One reading from the combined air/soil climate sensor.
#[derive(Debug, Clone, Copy)]
pub struct ClimateReading {
    pub temperature: i64,
    pub humidity: i64,
    pub soil_temperature: f64,
}

pub trait SoilMoistureSensor: Send {
    fn read(&mut self) -> Result<i64, anyhow::Error>;
}

pub trait SunlightSensor: Send {
    fn read(&mut self) -> Result<SunlightReading, anyhow::Error>;
}

pub trait ClimateSensor: Send {
    fn read(&mut self) -> Result<ClimateReading, anyhow::Error>;
}

pub trait Relay: Send {
    /// Issues the hardware command immediately. The relay needs a settle
    /// period, so callers read the state back on the next capture instead of
    /// right after the command.
    fn set(&mut self, on: bool) -> Result<(), anyhow::Error>;
    fn read(&mut self) -> Result<bool, anyhow::Error>;
}

pub trait ButtonPanel: Send {
    /// Returns `(button1, button2)` pressed states.
    fn read(&mut self) -> Result<(bool, bool), anyhow::Error>;
}

/// The full set of devices on the rig. Built once at startup and handed to
/// the snapshot cache, which owns all hardware access from then on.
pub struct SensorRig {
    pub soil_moisture: Box<dyn SoilMoistureSensor>,
    pub sunlight: Box<dyn SunlightSensor>,
    pub climate: Box<dyn ClimateSensor>,
    pub relay: Box<dyn Relay>,
    pub buttons: Box<dyn ButtonPanel>,
}
