pub mod cycle;
pub mod single_flight;

pub use cycle::{
    fetch_cycle, CycleFetch, CycleOutcome, CycleReport, FetchPlan, PollLoop, SkipReason,
};
pub use single_flight::{FlightToken, SingleFlight};
