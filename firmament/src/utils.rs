mod metrics;
mod sample_elimination;

pub use self::metrics::*;
pub use self::sample_elimination::*;
