use chrono::Utc;
use tokio::sync::Mutex;

use crate::sensor::SensorRig;
use crate::snapshot::Snapshot;

/// In-memory holder of the most recent capture. One guard covers both the
/// rig and the snapshot: `refresh` holds it for the whole batch so readers
/// always see a snapshot whose fields come from the same capture cycle.
pub struct SnapshotCache {
    inner: Mutex<Inner>,
}

struct Inner {
    rig: SensorRig,
    snapshot: Snapshot,
}

impl SnapshotCache {
    pub fn new(rig: SensorRig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                rig,
                snapshot: Snapshot::default(),
            }),
        }
    }

    /// Captures every device once and publishes the result as one snapshot.
    /// A device that fails to read keeps its previous value; the failure is
    /// logged and the rest of the batch still goes through.
    pub async fn refresh(&self) {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let mut next = inner.snapshot.clone();

        match inner.rig.soil_moisture.read() {
            Ok(moisture) => next.soil_moisture = Some(moisture),
            Err(e) => log::warn!("soil moisture read failed, keeping last value: {e}"),
        }

        match inner.rig.climate.read() {
            Ok(climate) => {
                next.temperature = Some(climate.temperature);
                next.humidity = Some(climate.humidity);
                next.soil_temperature = Some(climate.soil_temperature);
            }
            Err(e) => log::warn!("climate read failed, keeping last values: {e}"),
        }

        match inner.rig.sunlight.read() {
            Ok(sunlight) => {
                next.visible = Some(sunlight.visible);
                next.infra_red = Some(sunlight.infra_red);
                next.ultra_violet = Some(sunlight.ultra_violet_raw as f64 / 100.0);
            }
            Err(e) => log::warn!("sunlight read failed, keeping last values: {e}"),
        }

        match inner.rig.relay.read() {
            Ok(on) => next.relay = Some(on),
            Err(e) => log::warn!("relay read failed, keeping last value: {e}"),
        }

        match inner.rig.buttons.read() {
            Ok((button1, button2)) => {
                next.button1 = Some(button1);
                next.button2 = Some(button2);
            }
            Err(e) => log::warn!("button read failed, keeping last values: {e}"),
        }

        next.captured_at = Some(Utc::now());
        inner.snapshot = next;
    }

    /// Copies the current snapshot out. Never touches hardware.
    pub async fn read_all(&self) -> Snapshot {
        self.inner.lock().await.snapshot.clone()
    }

    /// Sends the relay command to hardware. The cached relay state is left
    /// alone on purpose: it picks up the new state on the next refresh, once
    /// the relay has settled.
    pub async fn set_relay(&self, on: bool) -> Result<(), anyhow::Error> {
        self.inner.lock().await.rig.relay.set(on)
    }
}
