pub mod affiliate;
pub mod promotion;
#[cfg(test)]
pub mod test_utils;

pub use affiliate::Affiliate;
pub use promotion::Promotion;
