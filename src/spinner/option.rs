use serde::{Deserialize, Serialize};

/// Smallest and largest weight a stored option may carry
pub const MIN_STORED_WEIGHT: u32 = 1;
pub const MAX_STORED_WEIGHT: u32 = 999;
/// Stored weights are shares out of this many parts
pub const WEIGHT_SCALE: u32 = 1000;

/// One slice of the wheel. Weights are relative and normalized at use time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpinOption {
    pub label: String,
    pub weight: f64,
}

impl SpinOption {
    pub fn new(label: impl Into<String>, weight: f64) -> Self {
        Self {
            label: label.into(),
            weight,
        }
    }
}

/// On-disk form of an option: `{ "title": .., "weight": .. }` where the
/// weight may be left out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOption {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl StoredOption {
    pub fn new(title: impl Into<String>, weight: Option<u32>) -> Self {
        Self {
            title: title.into(),
            weight,
        }
    }
}

/// Wheel used when nothing has been configured
pub fn default_options() -> Vec<SpinOption> {
    ["Sushi", "Beef noodles", "Hot pot", "Burger", "Bento"]
        .into_iter()
        .map(|label| SpinOption::new(label, 1.0))
        .collect()
}

/// Turn stored options into wheel options.
///
/// Blank titles are dropped. Weights are clamped to `[1, 999]` and read as
/// parts of 1000; options without a weight split whatever is left evenly.
/// When nobody carries a weight every option gets the same share.
pub fn from_stored(stored: &[StoredOption]) -> Vec<SpinOption> {
    let valid: Vec<&StoredOption> = stored
        .iter()
        .filter(|s| !s.title.trim().is_empty())
        .collect();

    let explicit: u32 = valid
        .iter()
        .filter_map(|s| s.weight)
        .map(clamp_stored_weight)
        .sum();
    let unweighted = valid.iter().filter(|s| s.weight.is_none()).count();

    if unweighted == valid.len() {
        return valid
            .iter()
            .map(|s| SpinOption::new(s.title.trim(), 1.0))
            .collect();
    }

    let remaining = WEIGHT_SCALE.saturating_sub(explicit);
    let fill = if remaining > 0 && unweighted > 0 {
        f64::from(remaining) / unweighted as f64
    } else {
        f64::from(MIN_STORED_WEIGHT)
    };

    valid
        .iter()
        .map(|s| {
            let weight = s
                .weight
                .map(|w| f64::from(clamp_stored_weight(w)))
                .unwrap_or(fill);
            SpinOption::new(s.title.trim(), weight)
        })
        .collect()
}

/// Turn wheel options back into their stored form, weights as parts of 1000
pub fn to_stored(options: &[SpinOption]) -> Vec<StoredOption> {
    shares(options)
        .into_iter()
        .zip(options)
        .map(|(share, option)| {
            let parts = (share * f64::from(WEIGHT_SCALE)).round() as u32;
            StoredOption::new(option.label.trim(), Some(clamp_stored_weight(parts)))
        })
        .collect()
}

fn clamp_stored_weight(weight: u32) -> u32 {
    weight.clamp(MIN_STORED_WEIGHT, MAX_STORED_WEIGHT)
}

/// Normalized share of each option. All-zero (or empty) totals split evenly.
pub fn shares(options: &[SpinOption]) -> Vec<f64> {
    let total: f64 = options.iter().map(|o| o.weight.max(0.0)).sum();
    if total > 0.0 && total.is_finite() {
        options.iter().map(|o| o.weight.max(0.0) / total).collect()
    } else {
        let even = 1.0 / options.len().max(1) as f64;
        vec![even; options.len()]
    }
}

/// Short percentage label for a share in `[0, 1]`
pub fn percent_label(share: f64) -> String {
    if share >= 0.99 {
        ">99%".to_string()
    } else if share < 0.01 {
        "<1%".to_string()
    } else {
        format!("{}%", (share * 100.0).round() as u32)
    }
}
