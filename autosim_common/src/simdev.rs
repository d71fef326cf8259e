//! Simulated device bus.
//!
//! A process-local registry of named simulated devices, each exposing
//! named `f64` fields. Real device handles read their values from here
//! when running in simulation, the binding engine writes into it, and a
//! front-end may inspect it through [`SimDeviceBus::snapshot`].
//!
//! Device names follow `"{category}[{index}]"` (see [`device_name`]).
//! Together with the field names in [`crate::consts`] they form the wire
//! contract with the simulation front-end and must not change.
//!
//! Creating devices and fields takes a lock; reading and writing a field
//! through a [`SimDouble`] handle is a single atomic operation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// Build the full device name from a category and an index.
///
/// `device_name("navX-Sensor", 0)` → `"navX-Sensor[0]"`
pub fn device_name(category: &str, index: i32) -> String {
    format!("{category}[{index}]")
}

// ─── SimDouble ──────────────────────────────────────────────────────

/// Shared handle to one `f64` field of a simulated device.
///
/// Cloning is cheap; all clones observe the same value.
#[derive(Clone, Default)]
pub struct SimDouble {
    bits: Arc<AtomicU64>,
}

impl SimDouble {
    /// Detached field holding `value`.
    pub fn new(value: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(value.to_bits())),
        }
    }

    #[inline]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// `true` when both handles refer to the same field.
    pub fn same_field(&self, other: &SimDouble) -> bool {
        Arc::ptr_eq(&self.bits, &other.bits)
    }
}

impl fmt::Debug for SimDouble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SimDouble").field(&self.get()).finish()
    }
}

// ─── SimDeviceBus ───────────────────────────────────────────────────

type DeviceMap = BTreeMap<String, BTreeMap<String, SimDouble>>;

/// One field value captured by [`SimDeviceBus::snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelValue {
    pub device: String,
    pub field: String,
    pub value: f64,
}

/// Registry of simulated devices. Clones share the same devices.
#[derive(Clone, Default)]
pub struct SimDeviceBus {
    devices: Arc<Mutex<DeviceMap>>,
}

impl SimDeviceBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DeviceMap> {
        // Field handles stay valid even if a writer panicked mid-insert.
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach to a device by category and index, creating it if absent.
    pub fn device(&self, category: &str, index: i32) -> SimDevice {
        let name = device_name(category, index);
        self.lock().entry(name.clone()).or_default();
        SimDevice {
            bus: self.clone(),
            name,
        }
    }

    /// Attach to a field, creating the device and the field (at 0.0) if
    /// either is absent. Never fails.
    pub fn double(&self, device: &str, field: &str) -> SimDouble {
        self.lock()
            .entry(device.to_string())
            .or_default()
            .entry(field.to_string())
            .or_default()
            .clone()
    }

    /// Look up an existing field without creating it.
    pub fn lookup(&self, device: &str, field: &str) -> Option<SimDouble> {
        self.lock().get(device)?.get(field).cloned()
    }

    /// Number of registered devices.
    pub fn device_count(&self) -> usize {
        self.lock().len()
    }

    /// Current value of every field, sorted by device then field.
    pub fn snapshot(&self) -> Vec<ChannelValue> {
        self.lock()
            .iter()
            .flat_map(|(device, fields)| {
                fields.iter().map(move |(field, value)| ChannelValue {
                    device: device.clone(),
                    field: field.clone(),
                    value: value.get(),
                })
            })
            .collect()
    }
}

impl fmt::Debug for SimDeviceBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimDeviceBus")
            .field("devices", &self.device_count())
            .finish()
    }
}

/// A named device on a [`SimDeviceBus`].
#[derive(Debug, Clone)]
pub struct SimDevice {
    bus: SimDeviceBus,
    name: String,
}

impl SimDevice {
    /// Full device name, e.g. `"SPARK MAX [11]"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach to a field of this device (get-or-create).
    pub fn double(&self, field: &str) -> SimDouble {
        self.bus.double(&self.name, field)
    }
}
