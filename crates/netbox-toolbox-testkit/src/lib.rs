// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use netbox_toolbox_app::{
    Device, DeviceId, Interface, InterfaceId, InventoryApi, NestedRef, Rack, RackId,
};
use std::cell::RefCell;

const RACKS: [&str; 3] = ["R1", "R2", "R3"];
const DEVICE_ROLES: [&str; 4] = ["sw-core", "sw-access", "fw-edge", "rtr-wan"];
const DEVICE_MODELS: [&str; 4] = ["7050SX", "C9300-48P", "PA-3220", "MX204"];
const INTERFACES_PER_DEVICE: i64 = 3;

pub const BASE_URL: &str = "https://netbox.example";

pub fn rack(id: i64, name: &str) -> Rack {
    Rack {
        id: RackId::new(id),
        name: name.to_owned(),
        url: Some(format!("{BASE_URL}/api/dcim/racks/{id}/")),
    }
}

pub fn device(id: i64, name: &str, rack: Option<&Rack>, position: Option<f64>) -> Device {
    let model = DEVICE_MODELS[(id.unsigned_abs() as usize) % DEVICE_MODELS.len()];
    Device {
        id: DeviceId::new(id),
        name: Some(name.to_owned()),
        rack: rack.map(|rack| NestedRef::named(rack.id.get(), &rack.name)),
        position,
        device_type: Some(NestedRef {
            id: 100 + id,
            model: Some(model.to_owned()),
            ..NestedRef::default()
        }),
        primary_ip: Some(NestedRef {
            id: 200 + id,
            address: Some(format!("10.0.0.{id}/24")),
            ..NestedRef::default()
        }),
        url: format!("{BASE_URL}/api/dcim/devices/{id}/"),
    }
}

pub fn interface(id: i64, device: &Device, name: &str) -> Interface {
    Interface {
        id: InterfaceId::new(id),
        device: NestedRef::named(device.id.get(), &device.display_name()),
        name: name.to_owned(),
        url: format!("{BASE_URL}/api/dcim/interfaces/{id}/"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListDevices,
    ListInterfaces,
    GetDevice(DeviceId),
    InterfacesForDevice(DeviceId),
    GetRackByName(String),
    DevicesInRack(RackId),
}

/// In-memory inventory that records every call made against it.
#[derive(Debug, Default)]
pub struct FakeInventory {
    pub racks: Vec<Rack>,
    pub devices: Vec<Device>,
    pub interfaces: Vec<Interface>,
    pub fail_with: Option<String>,
    calls: RefCell<Vec<Call>>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Three racks, four devices per rack plus one unracked device, and a
    /// few interfaces on every device.
    pub fn seeded() -> Self {
        let racks: Vec<Rack> = RACKS
            .iter()
            .enumerate()
            .map(|(index, name)| rack(index as i64 + 1, name))
            .collect();

        let mut devices = Vec::new();
        let mut next_id = 1;
        for rack in &racks {
            for (slot, role) in DEVICE_ROLES.iter().enumerate() {
                let name = format!("{role}-{}", rack.name.to_lowercase());
                devices.push(device(
                    next_id,
                    &name,
                    Some(rack),
                    Some((slot as f64 + 1.0) * 2.0),
                ));
                next_id += 1;
            }
        }
        devices.push(device(next_id, "lab-spare", None, None));

        let mut interfaces = Vec::new();
        for device in &devices {
            for port in 0..INTERFACES_PER_DEVICE {
                let id = device.id.get() * 100 + port;
                interfaces.push(interface(id, device, &format!("Ethernet{}", port + 1)));
            }
        }

        Self {
            racks,
            devices,
            interfaces,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_owned()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.borrow_mut().push(call);
        match &self.fail_with {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }
}

impl InventoryApi for FakeInventory {
    fn list_devices(&self) -> Result<Vec<Device>> {
        self.record(Call::ListDevices)?;
        Ok(self.devices.clone())
    }

    fn list_interfaces(&self) -> Result<Vec<Interface>> {
        self.record(Call::ListInterfaces)?;
        Ok(self.interfaces.clone())
    }

    fn get_device(&self, id: DeviceId) -> Result<Option<Device>> {
        self.record(Call::GetDevice(id))?;
        Ok(self.devices.iter().find(|device| device.id == id).cloned())
    }

    fn interfaces_for_device(&self, device: &Device) -> Result<Vec<Interface>> {
        self.record(Call::InterfacesForDevice(device.id))?;
        Ok(self
            .interfaces
            .iter()
            .filter(|interface| interface.device.id == device.id.get())
            .cloned()
            .collect())
    }

    fn get_rack_by_name(&self, name: &str) -> Result<Option<Rack>> {
        self.record(Call::GetRackByName(name.to_owned()))?;
        Ok(self.racks.iter().find(|rack| rack.name == name).cloned())
    }

    fn devices_in_rack(&self, rack: &Rack) -> Result<Vec<Device>> {
        self.record(Call::DevicesInRack(rack.id))?;
        Ok(self
            .devices
            .iter()
            .filter(|device| {
                device
                    .rack
                    .as_ref()
                    .is_some_and(|nested| nested.id == rack.id.get())
            })
            .cloned()
            .collect())
    }
}
