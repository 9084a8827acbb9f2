pub mod affiliate;
pub mod conversion;
pub mod promotion;

pub use promotion::DiscountType;
