/// Amount owed when moving from a plan priced `current_price_minor` to one priced
/// `new_price_minor`. Downgrades and lateral moves cost nothing.
pub fn upgrade_price(current_price_minor: i64, new_price_minor: i64) -> i64 {
    new_price_minor.saturating_sub(current_price_minor).max(0)
}
