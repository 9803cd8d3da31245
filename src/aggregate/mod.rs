//! Counts and breakdowns over a classified record set.

use crate::core::{
    BreakdownEntry, ClassifiedRecord, Readiness, ReportSummary, SecureBoot, SecureBootStats,
    SiteBreakdown,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub summary: ReportSummary,
    pub secure_boot: SecureBootStats,
    /// In order of first appearance.
    pub sites: Vec<SiteBreakdown>,
    pub os_versions: Vec<BreakdownEntry>,
    pub cpu_generations: Vec<BreakdownEntry>,
    pub ram_sizes: Vec<BreakdownEntry>,
}

pub fn aggregate(records: &[ClassifiedRecord]) -> Aggregate {
    let mut out = Aggregate {
        summary: summarize(records),
        secure_boot: secure_boot_stats(records),
        ..Aggregate::default()
    };

    for r in records {
        let site = if r.site.trim().is_empty() {
            "Unknown"
        } else {
            r.site.as_str()
        };
        let idx = match out.sites.iter().position(|s| s.site == site) {
            Some(idx) => idx,
            None => {
                out.sites.push(SiteBreakdown {
                    site: site.to_string(),
                    ..SiteBreakdown::default()
                });
                out.sites.len() - 1
            }
        };
        let entry = &mut out.sites[idx];
        entry.total += 1;
        match r.win11_ready {
            Readiness::Pass => entry.compatible += 1,
            Readiness::Fail => entry.not_compatible += 1,
            Readiness::Unsupported => entry.unsupported += 1,
            Readiness::Offline | Readiness::Unknown => entry.offline += 1,
        }

        bump(&mut out.os_versions, r.os.as_str());
        bump(&mut out.cpu_generations, r.cpu.as_str());
        bump(&mut out.ram_sizes, r.ram.as_str());
    }

    out
}

pub fn summarize(records: &[ClassifiedRecord]) -> ReportSummary {
    let total = records.len() as u64;
    let count = |want: fn(Readiness) -> bool| {
        records.iter().filter(|r| want(r.win11_ready)).count() as u64
    };
    let compatible = count(|s| s == Readiness::Pass);
    let not_compatible = count(|s| s == Readiness::Fail);
    let unsupported = count(|s| s == Readiness::Unsupported);
    let offline = count(Readiness::is_offline_bucket);

    ReportSummary {
        total,
        compatible,
        not_compatible,
        unsupported,
        offline,
        compatible_percentage: percentage(compatible, total),
        not_compatible_percentage: percentage(not_compatible, total),
        unsupported_percentage: percentage(unsupported, total),
        offline_percentage: percentage(offline, total),
    }
}

pub fn secure_boot_stats(records: &[ClassifiedRecord]) -> SecureBootStats {
    let mut stats = SecureBootStats::default();
    for r in records {
        match r.secure_boot {
            SecureBoot::Enabled => stats.capable_enabled += 1,
            SecureBoot::CapableButDisabled => stats.capable_disabled += 1,
            SecureBoot::NotCapable => stats.not_capable += 1,
            SecureBoot::Offline | SecureBoot::Unknown => stats.offline += 1,
        }
    }
    stats
}

/// `count / total` as a whole percentage, rounded half up; 0 for an empty set.
pub fn percentage(count: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (count * 200 + total) / (total * 2)
}

fn bump(table: &mut Vec<BreakdownEntry>, label: &str) {
    let label = if label.is_empty() { "Unknown" } else { label };
    match table.iter_mut().find(|e| e.label == label) {
        Some(entry) => entry.count += 1,
        None => table.push(BreakdownEntry {
            label: label.to_string(),
            count: 1,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InventoryRow, ParsedDiagnostics, Reading};

    fn record(site: &str, status: Readiness, secure_boot: SecureBoot, ram: &str) -> ClassifiedRecord {
        let row = InventoryRow {
            machine_name: "WS".to_string(),
            site: site.to_string(),
            ..InventoryRow::default()
        };
        let diag = ParsedDiagnostics {
            win11_ready: status,
            secure_boot,
            ram: Reading::value(ram),
            ..ParsedDiagnostics::unknown()
        };
        ClassifiedRecord::from_inventory(&row, diag)
    }

    #[test]
    fn empty_set_has_zero_percentages() {
        let agg = aggregate(&[]);
        assert_eq!(agg.summary, ReportSummary::default());
        assert!(agg.sites.is_empty());
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn percentages_round_half_up() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 200), 1);
        assert_eq!(percentage(1, 201), 0);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn counts_merge_unknown_into_offline() {
        let records = vec![
            record("HQ", Readiness::Pass, SecureBoot::Enabled, "16GB"),
            record("HQ", Readiness::Fail, SecureBoot::NotCapable, "4GB"),
            record("", Readiness::Unsupported, SecureBoot::CapableButDisabled, "16GB"),
            record("Branch", Readiness::Offline, SecureBoot::Offline, "Offline"),
            record("  ", Readiness::Unknown, SecureBoot::Unknown, ""),
        ];
        let agg = aggregate(&records);
        assert_eq!(agg.summary.total, 5);
        assert_eq!(agg.summary.compatible, 1);
        assert_eq!(agg.summary.not_compatible, 1);
        assert_eq!(agg.summary.unsupported, 1);
        assert_eq!(agg.summary.offline, 2);
        assert_eq!(agg.summary.offline_percentage, 40);

        assert_eq!(agg.secure_boot.capable_enabled, 1);
        assert_eq!(agg.secure_boot.capable_disabled, 1);
        assert_eq!(agg.secure_boot.not_capable, 1);
        assert_eq!(agg.secure_boot.offline, 2);

        let sites: Vec<(&str, u64)> = agg.sites.iter().map(|s| (s.site.as_str(), s.total)).collect();
        assert_eq!(sites, vec![("HQ", 2), ("Unknown", 2), ("Branch", 1)]);
        let unknown = &agg.sites[1];
        assert_eq!(unknown.unsupported, 1);
        assert_eq!(unknown.offline, 1);

        let ram: Vec<(&str, u64)> = agg.ram_sizes.iter().map(|e| (e.label.as_str(), e.count)).collect();
        assert_eq!(ram, vec![("16GB", 2), ("4GB", 1), ("Offline", 1), ("Unknown", 1)]);
        assert_eq!(agg.os_versions, vec![BreakdownEntry { label: "Unknown".into(), count: 5 }]);
    }
}
