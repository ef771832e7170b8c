pub mod counter;
pub mod dispatch;
pub mod epoch;
pub mod history;
pub mod mapping;
pub mod serve;
pub mod shared;
pub mod vehicle;
pub mod zone;
