mod card;
mod kpis;
pub mod views;

pub use card::build_record_card;
pub use kpis::build_kpis;
pub use views::{RecordCard, StudentKpis};
