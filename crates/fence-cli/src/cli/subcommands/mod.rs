mod counter;
mod epoch;
mod vehicle;
mod zone;

pub use counter::CounterCommands;
pub use epoch::EpochCommands;
pub use vehicle::VehicleCommands;
pub use zone::ZoneCommands;
