// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use tracing::{info, warn};

use crate::format::{RecordKind, ResultTable, format_devices, format_interfaces};
use crate::ids::DeviceId;
use crate::model::{Device, Interface, Rack};

/// Read-only view of the inventory service. The dispatcher only ever sees
/// this trait, so tests can hand it a double instead of a live client.
pub trait InventoryApi {
    fn list_devices(&self) -> Result<Vec<Device>>;
    fn list_interfaces(&self) -> Result<Vec<Interface>>;
    fn get_device(&self, id: DeviceId) -> Result<Option<Device>>;
    fn interfaces_for_device(&self, device: &Device) -> Result<Vec<Interface>>;
    fn get_rack_by_name(&self, name: &str) -> Result<Option<Rack>>;
    fn devices_in_rack(&self, rack: &Rack) -> Result<Vec<Device>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    AllDevices,
    AllInterfaces,
    DeviceInterfaces,
    RackDevices,
}

impl QueryKind {
    pub const ALL: [Self; 4] = [
        Self::AllDevices,
        Self::AllInterfaces,
        Self::DeviceInterfaces,
        Self::RackDevices,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::AllDevices => "1 - All Devices",
            Self::AllInterfaces => "2 - All Interfaces",
            Self::DeviceInterfaces => "3 - Interfaces on a specific Device",
            Self::RackDevices => "4 - Devices in a specific Rack",
        }
    }

    pub const fn record_kind(self) -> RecordKind {
        match self {
            Self::AllDevices | Self::RackDevices => RecordKind::Devices,
            Self::AllInterfaces | Self::DeviceInterfaces => RecordKind::Interfaces,
        }
    }

    pub const fn parameter(self) -> Option<ParameterKind> {
        match self {
            Self::AllDevices | Self::AllInterfaces => None,
            Self::DeviceInterfaces => Some(ParameterKind::DeviceId),
            Self::RackDevices => Some(ParameterKind::RackName),
        }
    }

    /// Accepts the option number (`"3"`) or the full option label.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|kind| {
            kind.label() == value || kind.label().split(' ').next() == Some(value)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    DeviceId,
    RackName,
}

impl ParameterKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::DeviceId => "Device ID",
            Self::RackName => "Rack Name",
        }
    }

    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::DeviceId => "Type in a Device ID number...",
            Self::RackName => "Type in the name of the rack...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRequest {
    AllDevices,
    AllInterfaces,
    DeviceInterfaces { device_id: DeviceId },
    RackDevices { rack_name: String },
}

impl QueryRequest {
    /// Builds a request for `kind`. `raw` is only consulted for queries that
    /// take a parameter; blank input is rejected with a prompt-style message.
    pub fn from_input(kind: QueryKind, raw: &str) -> std::result::Result<Self, String> {
        let value = raw.trim();
        match kind {
            QueryKind::AllDevices => Ok(Self::AllDevices),
            QueryKind::AllInterfaces => Ok(Self::AllInterfaces),
            QueryKind::DeviceInterfaces => {
                if value.is_empty() {
                    return Err("enter a Device ID".to_owned());
                }
                let id: i64 = value
                    .parse()
                    .map_err(|_| format!("{value} is not a valid Device ID"))?;
                Ok(Self::DeviceInterfaces {
                    device_id: DeviceId::new(id),
                })
            }
            QueryKind::RackDevices => {
                if value.is_empty() {
                    return Err("enter a Rack Name".to_owned());
                }
                Ok(Self::RackDevices {
                    rack_name: value.to_owned(),
                })
            }
        }
    }

    pub const fn kind(&self) -> QueryKind {
        match self {
            Self::AllDevices => QueryKind::AllDevices,
            Self::AllInterfaces => QueryKind::AllInterfaces,
            Self::DeviceInterfaces { .. } => QueryKind::DeviceInterfaces,
            Self::RackDevices { .. } => QueryKind::RackDevices,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Rendered(ResultTable),
    NotFound { message: String },
    Failed { message: String },
}

impl QueryOutcome {
    pub fn table(&self) -> Option<&ResultTable> {
        match self {
            Self::Rendered(table) => Some(table),
            Self::NotFound { .. } | Self::Failed { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Rendered(_) => None,
            Self::NotFound { message } | Self::Failed { message } => Some(message),
        }
    }
}

pub fn device_not_found_message(id: DeviceId) -> String {
    format!("{id} does not have an entry. Please provide a valid Device ID.")
}

pub fn rack_not_found_message(name: &str) -> String {
    format!("{name} does not have an entry. Please provide a valid Rack Name.")
}

/// Runs one query against `api`. Unknown ids/names come back as
/// `NotFound`; any transport or decode error becomes `Failed`.
pub fn run_query<A: InventoryApi + ?Sized>(api: &A, request: &QueryRequest) -> QueryOutcome {
    let kind = request.kind();
    info!(query = kind.label(), "running inventory query");

    let outcome = match execute(api, request) {
        Ok(outcome) => outcome,
        Err(error) => {
            warn!(query = kind.label(), error = %format!("{error:#}"), "inventory query failed");
            QueryOutcome::Failed {
                message: format!("request failed: {error:#}"),
            }
        }
    };

    match &outcome {
        QueryOutcome::Rendered(table) => {
            info!(query = kind.label(), rows = table.row_count(), "query rendered");
        }
        QueryOutcome::NotFound { message } => {
            info!(query = kind.label(), %message, "lookup did not resolve");
        }
        QueryOutcome::Failed { .. } => {}
    }
    outcome
}

fn execute<A: InventoryApi + ?Sized>(api: &A, request: &QueryRequest) -> Result<QueryOutcome> {
    let table = match request {
        QueryRequest::AllDevices => format_devices(&api.list_devices()?),
        QueryRequest::AllInterfaces => format_interfaces(&api.list_interfaces()?),
        QueryRequest::DeviceInterfaces { device_id } => {
            let Some(device) = api.get_device(*device_id)? else {
                return Ok(QueryOutcome::NotFound {
                    message: device_not_found_message(*device_id),
                });
            };
            format_interfaces(&api.interfaces_for_device(&device)?)
        }
        QueryRequest::RackDevices { rack_name } => {
            let Some(rack) = api.get_rack_by_name(rack_name)? else {
                return Ok(QueryOutcome::NotFound {
                    message: rack_not_found_message(rack_name),
                });
            };
            format_devices(&api.devices_in_rack(&rack)?)
        }
    };
    Ok(QueryOutcome::Rendered(table))
}
