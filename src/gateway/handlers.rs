pub mod health;
pub mod micro_deposits;

pub use health::{HealthResponse, health_check};
pub use micro_deposits::{
    EmptyResponse, InitiateResponse, confirm_micro_deposits, initiate_micro_deposits,
    list_micro_deposits,
};
