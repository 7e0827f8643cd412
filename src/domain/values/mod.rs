pub mod bullet_type;
pub mod caliber;
pub mod caller_tier;
pub mod case_material;
pub mod context_band;
pub mod pressure_rating;
pub mod purpose;
pub mod retailer_tier;
pub mod sort_order;
