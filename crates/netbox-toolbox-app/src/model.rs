// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::*;

/// A brief object NetBox embeds in place of a full related record
/// (`device.rack`, `device.device_type`, `interface.device`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl NestedRef {
    pub fn named(id: i64, name: &str) -> Self {
        Self {
            id,
            name: Some(name.to_owned()),
            ..Self::default()
        }
    }

    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.model.as_deref())
            .or(self.address.as_deref())
            .or(self.display.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rack: Option<NestedRef>,
    #[serde(default)]
    pub position: Option<f64>,
    #[serde(default)]
    pub device_type: Option<NestedRef>,
    #[serde(default)]
    pub primary_ip: Option<NestedRef>,
    pub url: String,
}

impl Device {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("device {}", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub id: InterfaceId,
    pub device: NestedRef,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rack {
    pub id: RackId,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// One page of a NetBox list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub next: Option<String>,
    pub results: Vec<T>,
}
