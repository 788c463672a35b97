//! Simulated rig for running the node without the Grove hat attached.
//! Real hardware adapters implement the same `sensor` traits and slot in
//! here unchanged.

use crate::sensor::{
    ButtonPanel, ClimateReading, ClimateSensor, Relay, SensorRig, SoilMoistureSensor,
    SunlightReading, SunlightSensor,
};

pub fn simulated_rig() -> SensorRig {
    SensorRig {
        soil_moisture: Box::new(SimSoilMoisture { step: 0 }),
        sunlight: Box::new(SimSunlight { step: 0 }),
        climate: Box::new(SimClimate { step: 0 }),
        relay: Box::new(SimRelay { on: false }),
        buttons: Box::new(SimButtons),
    }
}

struct SimSoilMoisture {
    step: i64,
}

impl SoilMoistureSensor for SimSoilMoisture {
    fn read(&mut self) -> Result<i64, anyhow::Error> {
        self.step += 1;
        Ok(420 + self.step % 40)
    }
}

struct SimSunlight {
    step: i64,
}

impl SunlightSensor for SimSunlight {
    fn read(&mut self) -> Result<SunlightReading, anyhow::Error> {
        self.step += 1;
        Ok(SunlightReading {
            visible: 260 + self.step % 25,
            infra_red: 120 + self.step % 10,
            ultra_violet_raw: 2 + self.step % 5,
        })
    }
}

struct SimClimate {
    step: i64,
}

impl ClimateSensor for SimClimate {
    fn read(&mut self) -> Result<ClimateReading, anyhow::Error> {
        self.step += 1;
        Ok(ClimateReading {
            temperature: 21 + self.step % 3,
            humidity: 40 + self.step % 8,
            soil_temperature: 18.0 + (self.step % 6) as f64 / 2.0,
        })
    }
}

struct SimRelay {
    on: bool,
}

impl Relay for SimRelay {
    fn set(&mut self, on: bool) -> Result<(), anyhow::Error> {
        self.on = on;
        Ok(())
    }

    fn read(&mut self) -> Result<bool, anyhow::Error> {
        Ok(self.on)
    }
}

struct SimButtons;

impl ButtonPanel for SimButtons {
    fn read(&mut self) -> Result<(bool, bool), anyhow::Error> {
        Ok((false, false))
    }
}
