pub mod correction;
pub mod observation;
pub mod product;
pub mod resolution_link;
pub mod retailer;
pub mod visible_price;
