pub mod billing_periods;
pub mod enums;
pub mod upgrade_price;
