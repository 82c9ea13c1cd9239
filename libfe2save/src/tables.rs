//! Static label tables for the report output. Purely presentational;
//! the decoder never interprets these.

/// Labels for the first equipment mask byte, one per bit (bit 0 first).
pub const EQUIPMENT_A: [&str; 8] = [
    "atmospheric shielding",
    "fuel scoop",
    "cargo scoop conversion",
    "auto-refueller",
    "ECM system",
    "naval ECM system",
    "radar mapper",
    "hyperspace cloud analyser",
];

/// Labels for the second equipment mask byte.
pub const EQUIPMENT_B: [&str; 8] = [
    "energy booster unit",
    "hull auto-repair system",
    "laser cooling booster",
    "cargo bay life support",
    "automatic pilot",
    "navigation computer",
    "combat computer",
    "escape capsule",
];

/// Labels for the third equipment mask byte.
pub const EQUIPMENT_C: [&str; 8] = [
    "scanner",
    "battle scanner",
    "chaff dispenser",
    "energy bomb",
    "shield generator",
    "mining machine",
    "fuel transfer unit",
    "servicing rig",
];

/// Drive fitted in the drive-type byte, indexed directly.
pub const DRIVE_TYPES: [&str; 13] = [
    "no drive",
    "interplanetary drive",
    "class 1 hyperdrive",
    "class 2 hyperdrive",
    "class 3 hyperdrive",
    "class 4 hyperdrive",
    "class 5 hyperdrive",
    "class 6 hyperdrive",
    "class 7 hyperdrive",
    "class 8 hyperdrive",
    "class 1 military drive",
    "class 2 military drive",
    "class 3 military drive",
];

/// Gun position byte per mount.
pub const GUN_MOUNTS: [&str; 4] = ["front", "rear", "left", "right"];

/// Federal rank by accumulated points; each entry is the lowest score
/// holding the rank.
pub const FEDERAL_RANKS: [(u16, &str); 9] = [
    (0, "none"),
    (2, "ensign"),
    (4, "lieutenant"),
    (8, "lt. commander"),
    (16, "commander"),
    (32, "captain"),
    (64, "rear admiral"),
    (128, "vice admiral"),
    (256, "admiral"),
];

/// Imperial rank by accumulated points.
pub const IMPERIAL_RANKS: [(u16, &str); 9] = [
    (0, "outsider"),
    (2, "serf"),
    (4, "master"),
    (8, "sir"),
    (16, "squire"),
    (32, "knight"),
    (64, "baron"),
    (128, "viscount"),
    (256, "count"),
];

/// Combat rating by kill count.
pub const COMBAT_RATINGS: [(u16, &str); 9] = [
    (0, "harmless"),
    (8, "mostly harmless"),
    (16, "poor"),
    (32, "below average"),
    (64, "average"),
    (128, "above average"),
    (512, "competent"),
    (2560, "dangerous"),
    (6000, "deadly"),
];

/// Look up the label for `points` in a monotonic threshold table: the
/// last entry whose threshold is not above the score wins.
pub fn threshold_label<'a>(points: u16, table: &[(u16, &'a str)]) -> &'a str {
    let mut label = table[0].1;
    for &(threshold, name) in table {
        if points >= threshold {
            label = name;
        } else {
            break;
        }
    }
    label
}

/// Collect the labels of every bit set in `mask`.
pub fn flag_labels(mask: u8, labels: &[&'static str; 8]) -> Vec<&'static str> {
    (0..8)
        .filter(|bit| mask & (1 << bit) != 0)
        .map(|bit| labels[bit])
        .collect()
}

pub fn drive_label(drive: u8) -> &'static str {
    DRIVE_TYPES
        .get(usize::from(drive))
        .copied()
        .unwrap_or("unknown drive")
}

pub fn gun_mount_label(position: u8) -> &'static str {
    GUN_MOUNTS
        .get(usize::from(position))
        .copied()
        .unwrap_or("unknown mount")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_boundaries() {
        assert_eq!(threshold_label(0, &FEDERAL_RANKS), "none");
        assert_eq!(threshold_label(1, &FEDERAL_RANKS), "none");
        assert_eq!(threshold_label(2, &FEDERAL_RANKS), "ensign");
        assert_eq!(threshold_label(255, &FEDERAL_RANKS), "vice admiral");
        assert_eq!(threshold_label(u16::MAX, &FEDERAL_RANKS), "admiral");
    }

    #[test]
    fn ratings_are_monotonic() {
        for window in COMBAT_RATINGS.windows(2) {
            assert!(window[0].0 < window[1].0);
        }
    }

    #[test]
    fn flags_map_bit_by_bit() {
        let labels = flag_labels(0b1000_0001, &EQUIPMENT_A);
        assert_eq!(
            labels,
            vec!["atmospheric shielding", "hyperspace cloud analyser"]
        );
        assert!(flag_labels(0, &EQUIPMENT_A).is_empty());
    }

    #[test]
    fn unknown_drive_and_mount_fall_back() {
        assert_eq!(drive_label(3), "class 2 hyperdrive");
        assert_eq!(drive_label(0xee), "unknown drive");
        assert_eq!(gun_mount_label(0), "front");
        assert_eq!(gun_mount_label(9), "unknown mount");
    }
}
