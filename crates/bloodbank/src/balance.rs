//! Per-group stock balances and the dashboard summary built from them.
//!
//! A balance is donor units minus patient units for one blood group. The
//! engine keeps the signed value so callers can tell a deficit from an empty
//! shelf; anything shown to the user is clamped at zero.

use std::ops::Index;

use serde::Serialize;

use crate::blood_group::BloodGroup;
use crate::record::{Donor, Patient, Record};

/// Signed balance for each of the eight groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balances([i64; 8]);

impl Balances {
    /// Raw balance for `group`; negative means more was issued than donated.
    #[must_use]
    pub fn get(&self, group: BloodGroup) -> i64 {
        self.0[group.index()]
    }

    /// Balance for display, never below zero.
    #[must_use]
    pub fn clamped(&self, group: BloodGroup) -> u64 {
        u64::try_from(self.get(group)).unwrap_or(0)
    }

    /// `(group, raw balance)` pairs in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (BloodGroup, i64)> + '_ {
        BloodGroup::ALL.into_iter().map(move |g| (g, self.get(g)))
    }

    /// Sum of the clamped balances.
    #[must_use]
    pub fn total_clamped(&self) -> u64 {
        BloodGroup::ALL.into_iter().map(|g| self.clamped(g)).sum()
    }

    /// The group holding the most stock.
    ///
    /// Ties go to the group listed first. Returns `None` when no group has a
    /// positive balance.
    #[must_use]
    pub fn most_stocked(&self) -> Option<(BloodGroup, i64)> {
        let mut best: Option<(BloodGroup, i64)> = None;
        for (group, balance) in self.iter() {
            if best.map_or(true, |(_, max)| balance > max) {
                best = Some((group, balance));
            }
        }
        best.filter(|&(_, max)| max > 0)
    }

    fn add(&mut self, label: &str, delta: i64) {
        if let Some(group) = BloodGroup::from_label(label) {
            self.0[group.index()] += delta;
        }
    }
}

impl Index<BloodGroup> for Balances {
    type Output = i64;

    fn index(&self, group: BloodGroup) -> &Self::Output {
        &self.0[group.index()]
    }
}

/// Compute the balance of every group.
///
/// Records with an unrecognised blood-group label are skipped.
#[must_use]
pub fn compute_balances(donors: &[Donor], patients: &[Patient]) -> Balances {
    let mut balances = Balances::default();
    for donor in donors {
        balances.add(donor.blood_group_label(), i64::from(donor.units()));
    }
    for patient in patients {
        balances.add(patient.blood_group_label(), -i64::from(patient.units()));
    }
    balances
}

/// One tile of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupStock {
    /// The blood group.
    pub group: BloodGroup,
    /// Units on hand, clamped at zero.
    pub units: u64,
}

/// Aggregate view of the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    /// Clamped stock per group, in enumeration order.
    pub groups: Vec<GroupStock>,
    /// Sum of the clamped stock.
    pub total_units: u64,
    /// Number of donor records.
    pub total_donors: usize,
    /// Number of patient records.
    pub total_patients: usize,
    /// Best-stocked group and its balance, if any group is positive.
    pub most_stocked: Option<GroupStock>,
}

impl Dashboard {
    /// Build the dashboard from the two collections.
    #[must_use]
    pub fn from_records(donors: &[Donor], patients: &[Patient]) -> Self {
        let balances = compute_balances(donors, patients);
        Self {
            groups: BloodGroup::ALL
                .into_iter()
                .map(|group| GroupStock {
                    group,
                    units: balances.clamped(group),
                })
                .collect(),
            total_units: balances.total_clamped(),
            total_donors: donors.len(),
            total_patients: patients.len(),
            most_stocked: balances.most_stocked().map(|(group, _)| GroupStock {
                group,
                units: balances.clamped(group),
            }),
        }
    }

    /// Text for the most-stocked tile: `"A+ (5)"`, or `"—"` when empty.
    #[must_use]
    pub fn most_stocked_label(&self) -> String {
        match self.most_stocked {
            Some(GroupStock { group, units }) => format!("{group} ({units})"),
            None => "\u{2014}".to_string(),
        }
    }
}
