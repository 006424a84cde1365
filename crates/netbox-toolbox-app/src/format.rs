// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{Device, Interface, NestedRef};

pub const DEVICE_COLUMNS: [&str; 7] = [
    "rack",
    "position",
    "name",
    "device_type",
    "primary_ip",
    "id",
    "url",
];
pub const INTERFACE_COLUMNS: [&str; 4] = ["device", "name", "id", "url"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Devices,
    Interfaces,
}

impl RecordKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Devices => "Devices",
            Self::Interfaces => "Interfaces",
        }
    }

    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Devices => &DEVICE_COLUMNS,
            Self::Interfaces => &INTERFACE_COLUMNS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    pub kind: RecordKind,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    fn empty(kind: RecordKind) -> Self {
        Self {
            kind,
            columns: kind.columns().iter().map(|c| (*c).to_owned()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

pub fn format_devices(devices: &[Device]) -> ResultTable {
    let mut table = ResultTable::empty(RecordKind::Devices);
    table.rows = devices.iter().map(device_row).collect();
    table
}

pub fn format_interfaces(interfaces: &[Interface]) -> ResultTable {
    let mut table = ResultTable::empty(RecordKind::Interfaces);
    table.rows = interfaces.iter().map(interface_row).collect();
    table
}

pub fn device_row(device: &Device) -> Vec<String> {
    vec![
        nested_label(device.rack.as_ref()),
        device.position.map(format_position).unwrap_or_default(),
        device.name.clone().unwrap_or_default(),
        nested_label(device.device_type.as_ref()),
        nested_label(device.primary_ip.as_ref()),
        device.id.to_string(),
        device.url.clone(),
    ]
}

pub fn interface_row(interface: &Interface) -> Vec<String> {
    vec![
        interface.device.label().to_owned(),
        interface.name.clone(),
        interface.id.to_string(),
        interface.url.clone(),
    ]
}

fn nested_label(nested: Option<&NestedRef>) -> String {
    nested.map(|n| n.label().to_owned()).unwrap_or_default()
}

/// NetBox reports rack units as decimals; whole units print without `.0`.
pub fn format_position(position: f64) -> String {
    if position.fract() == 0.0 && position.abs() < i64::MAX as f64 {
        format!("{}", position as i64)
    } else {
        format!("{position}")
    }
}

/// Plain-text rendering for headless output. Columns are padded to the
/// widest cell; an empty table still prints its header.
pub fn render_text_table(table: &ResultTable) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    out.push_str(&join_padded(&table.columns, &widths));
    out.push('\n');
    let separator = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join("-+-");
    out.push_str(&separator);
    out.push('\n');
    for row in &table.rows {
        out.push_str(&join_padded(row, &widths));
        out.push('\n');
    }
    out
}

fn join_padded(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    line.trim_end().to_owned()
}

#[cfg(test)]
mod tests {
    use super::{
        DEVICE_COLUMNS, INTERFACE_COLUMNS, RecordKind, format_devices, format_interfaces,
        format_position, render_text_table,
    };
    use crate::{Device, DeviceId, Interface, InterfaceId, NestedRef};

    fn core_switch() -> Device {
        Device {
            id: DeviceId::new(42),
            name: Some("sw-core-1".to_owned()),
            rack: Some(NestedRef::named(3, "R1")),
            position: Some(3.0),
            device_type: Some(NestedRef {
                id: 7,
                model: Some("switch".to_owned()),
                ..NestedRef::default()
            }),
            primary_ip: Some(NestedRef {
                id: 11,
                address: Some("10.0.0.1".to_owned()),
                ..NestedRef::default()
            }),
            url: "https://x/42".to_owned(),
        }
    }

    #[test]
    fn device_row_projects_columns_in_order() {
        let table = format_devices(&[core_switch()]);
        assert_eq!(table.kind, RecordKind::Devices);
        assert_eq!(table.columns, DEVICE_COLUMNS.to_vec());
        assert_eq!(
            table.rows,
            vec![vec![
                "R1".to_owned(),
                "3".to_owned(),
                "sw-core-1".to_owned(),
                "switch".to_owned(),
                "10.0.0.1".to_owned(),
                "42".to_owned(),
                "https://x/42".to_owned(),
            ]]
        );
    }

    #[test]
    fn unracked_device_renders_blank_cells() {
        let device = Device {
            rack: None,
            position: None,
            device_type: None,
            primary_ip: None,
            name: None,
            ..core_switch()
        };
        let table = format_devices(&[device]);
        assert_eq!(table.rows[0][..5], ["", "", "", "", ""]);
        assert_eq!(table.rows[0][5], "42");
    }

    #[test]
    fn interface_row_projects_columns_in_order() {
        let table = format_interfaces(&[Interface {
            id: InterfaceId::new(900),
            device: NestedRef::named(42, "sw-core-1"),
            name: "Ethernet1".to_owned(),
            url: "https://x/900".to_owned(),
        }]);
        assert_eq!(table.columns, INTERFACE_COLUMNS.to_vec());
        assert_eq!(
            table.rows,
            vec![vec![
                "sw-core-1".to_owned(),
                "Ethernet1".to_owned(),
                "900".to_owned(),
                "https://x/900".to_owned(),
            ]]
        );
    }

    #[test]
    fn empty_input_yields_header_only_table() {
        let devices = format_devices(&[]);
        assert_eq!(devices.row_count(), 0);
        assert_eq!(devices.columns.len(), 7);

        let rendered = render_text_table(&format_interfaces(&[]));
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "device | name | id | url");
    }

    #[test]
    fn position_drops_fraction_only_for_whole_units() {
        assert_eq!(format_position(3.0), "3");
        assert_eq!(format_position(3.5), "3.5");
        assert_eq!(format_position(0.0), "0");
    }

    #[test]
    fn text_table_pads_columns_to_widest_cell() {
        let rendered = render_text_table(&format_devices(&[core_switch()]));
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("rack | position | name      |"));
        assert!(lines[1].starts_with("-----+-"));
        assert!(lines[2].starts_with("R1   | 3        | sw-core-1 |"));
        assert!(lines[2].ends_with("https://x/42"));
    }
}
