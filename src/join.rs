use crate::core::{ClassifiedRecord, InventoryRow, WarrantyRow};

fn identity_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// First warranty row whose name matches `machine_name`, ignoring case and
/// surrounding whitespace.
pub fn find_warranty<'a>(machine_name: &str, warranty: &'a [WarrantyRow]) -> Option<&'a WarrantyRow> {
    let key = identity_key(machine_name);
    warranty.iter().find(|w| identity_key(&w.name) == key)
}

/// Attaches warranty facts to each record. `inventory[i]` is the source row of `records[i]`.
pub fn join(
    inventory: &[InventoryRow],
    records: Vec<ClassifiedRecord>,
    warranty: &[WarrantyRow],
) -> Vec<ClassifiedRecord> {
    inventory
        .iter()
        .zip(records)
        .map(|(row, record)| match find_warranty(&row.machine_name, warranty) {
            Some(found) => ClassifiedRecord {
                serial: found.serial.clone(),
                warranty_expires: if found.expires.is_empty() {
                    "Unknown".to_string()
                } else {
                    found.expires.clone()
                },
                in_scalepad: true,
                ..record
            },
            None => ClassifiedRecord {
                serial: String::new(),
                warranty_expires: "Unknown".to_string(),
                in_scalepad: false,
                ..record
            },
        })
        .collect()
}
