use restock_shared::pantry::StockLevel;

/// Maps a days-left estimate onto a discrete stock level relative to the
/// learned cycle length. Monotonic in `days_left` for a fixed mean.
pub fn classify(days_left: f64, cycle_mean_days: f64) -> StockLevel {
    if cycle_mean_days <= 0.0 {
        return StockLevel::Unknown;
    }

    let ratio = days_left / cycle_mean_days;

    if days_left <= 0.0 || ratio < 0.02 {
        StockLevel::Empty
    } else if ratio >= 0.70 {
        StockLevel::Full
    } else if ratio >= 0.30 {
        StockLevel::Medium
    } else {
        StockLevel::Low
    }
}
